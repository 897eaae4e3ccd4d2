use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::admin::handlers::json_error;
use crate::admin::session::session_token;
use crate::http::server::AppState;

/// Reject requests without a live admin session cookie.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = session_token(request.headers()).is_some_and(|token| state.sessions.is_valid(token));

    if authorized {
        next.run(request).await
    } else {
        json_error(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

/// Compare a submitted password with the configured one in constant time.
pub fn password_matches(submitted: &str, expected: &str) -> bool {
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_comparison() {
        assert!(password_matches("s3cret", "s3cret"));
        assert!(!password_matches("s3cret", "s3cret "));
        assert!(!password_matches("", "s3cret"));
        assert!(!password_matches("S3CRET", "s3cret"));
    }
}
