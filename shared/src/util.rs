/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current UTC timestamp in seconds
///
/// Credential expiries are tracked in epoch seconds because the upstream
/// token API reports lifetimes in seconds.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
