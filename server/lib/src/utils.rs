use std::time::{Duration, SystemTime};

/// Wall clock time as a duration since the unix epoch. Cache expiry is tracked
/// against this value so that tests can inject their own `ct`.
pub fn duration_from_epoch_now() -> Duration {
    #[allow(clippy::expect_used)]
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("invalid duration from epoch now")
}

/// The absolute expiry for something inserted at `ct` with a time to live of
/// `ttl`. A zero `ttl` never expires.
pub(crate) fn expiry_from(ct: Duration, ttl: Duration) -> Option<Duration> {
    if ttl.is_zero() {
        None
    } else {
        Some(ct.saturating_add(ttl))
    }
}

pub(crate) fn is_expired(expires_at: Option<Duration>, ct: Duration) -> bool {
    match expires_at {
        Some(at) => ct > at,
        None => false,
    }
}
