use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Admin CLI for the membership gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Session token printed by `login`.
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the session token
    Login {
        #[arg(short, long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Check that the session is still valid
    Session,
    /// Dispatch notification jobs from a JSON file (an array of jobs)
    Notify { jobs: PathBuf },
    /// Show notification switches, or change them with key=true|false pairs
    Settings { updates: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(COOKIE, HeaderValue::from_str(&format!("admin_token={}", token))?);
    }

    match cli.command {
        Commands::Login { password } => {
            let res = client
                .post(format!("{}/api/admin/login", cli.url))
                .json(&json!({ "password": password }))
                .send()
                .await?;
            if let Some(token) = session_token(res.headers()) {
                println!("token: {}", token);
            }
            print_response(res).await?;
        }
        Commands::Logout => {
            let res = client
                .post(format!("{}/api/admin/logout", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Session => {
            let res = client
                .get(format!("{}/api/admin/session", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Notify { jobs } => {
            let jobs: Value = serde_json::from_str(&std::fs::read_to_string(jobs)?)?;
            let res = client
                .post(format!("{}/api/admin/notifications", cli.url))
                .headers(headers)
                .json(&json!({ "jobs": jobs }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Settings { updates } => {
            let url = format!("{}/api/admin/notification-settings", cli.url);
            let res = if updates.is_empty() {
                client.get(url).headers(headers).send().await?
            } else {
                client.post(url).headers(headers).json(&parse_updates(&updates)?).send().await?
            };
            print_response(res).await?;
        }
    }

    Ok(())
}

fn parse_updates(pairs: &[String]) -> Result<Value, Box<dyn std::error::Error>> {
    let mut patch = serde_json::Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=true|false, got '{}'", pair))?;
        patch.insert(key.to_string(), Value::Bool(value.parse()?));
    }
    Ok(Value::Object(patch))
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == "admin_token" && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
