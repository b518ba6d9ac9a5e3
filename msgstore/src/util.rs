use chrono::Utc;

/// Wall-clock time in epoch milli-seconds.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The cut-off before which a group is considered expired. Saturates rather
/// than overflowing for absurd timeouts.
pub(crate) fn expiry_cutoff(now: i64, timeout: std::time::Duration) -> i64 {
    let timeout = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
    now.saturating_sub(timeout)
}
