//! Expiry helpers for query signatures.
use chrono::{DateTime, Duration, Utc};

/// Expiry, in seconds since the epoch, for a query signature that stays valid for `ttl` after `now`.
pub fn expires_at(now: DateTime<Utc>, ttl: Duration) -> i64 {
    (now + ttl).timestamp()
}

/// Expiry, in seconds since the epoch, for a query signature that stays valid for `ttl` from now.
pub fn expires_after(ttl: Duration) -> i64 {
    expires_at(Utc::now(), ttl)
}
