//! Per-client request limits for the abuse-prone endpoints.

use axum::http::HeaderMap;
use herlign_core::identity::client_ip;
use herlign_core::{RateLimitConfig, RateLimiter};
use tracing::warn;

use crate::error::ServerError;

/// Counts one hit for the caller in `bucket`, or fails with 429.
///
/// Keys are `"{bucket}:{ip}"` so each endpoint family has its own window.
pub fn enforce(
    limiter: &RateLimiter,
    headers: &HeaderMap,
    bucket: &str,
    config: &RateLimitConfig,
    message: &str,
) -> Result<(), ServerError> {
    let ip = client_ip(headers);
    let decision = limiter.check(&format!("{bucket}:{ip}"), config);
    if decision.allowed {
        return Ok(());
    }
    warn!(bucket, count = decision.count, limit = decision.limit, "rate limit exceeded");
    Err(ServerError::TooManyRequests {
        message: message.to_owned(),
        reset_in: decision.reset_in_secs,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn buckets_are_independent() {
        let limiter = RateLimiter::new();
        let cfg = RateLimitConfig::new(1, 60);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));

        assert!(enforce(&limiter, &headers, "chat", &cfg, "Too many messages").is_ok());
        assert!(enforce(&limiter, &headers, "auth", &cfg, "Too many login attempts").is_ok());
        let err = enforce(&limiter, &headers, "chat", &cfg, "Too many messages").unwrap_err();
        match err {
            ServerError::TooManyRequests { reset_in, .. } => assert!((1..=60).contains(&reset_in)),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
