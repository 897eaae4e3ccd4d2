//! Client identity for rate limiting.
//!
//! Provider headers carrying the connecting IP win over the generic
//! `X-Forwarded-For`. When none is present every request shares the
//! [`UNKNOWN_CLIENT`] bucket.

use axum::http::HeaderMap;

/// Identifier used when no proxy header names the client.
pub const UNKNOWN_CLIENT: &str = "unknown";

const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the rate-limit key for a request.
pub fn client_id(headers: &HeaderMap) -> String {
    header_value(headers, CF_CONNECTING_IP)
        .or_else(|| header_value(headers, X_REAL_IP))
        .or_else(|| {
            header_value(headers, X_FORWARDED_FOR)
                .and_then(|list| list.split(',').next())
                .map(str::trim)
                .filter(|first| !first.is_empty())
        })
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
