use crate::domain::eth::Timestamp;

/// The current time.
#[cfg(not(test))]
pub fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

/// During tests, the time is fixed.
#[cfg(test)]
pub fn now() -> chrono::DateTime<chrono::Utc> {
    use std::sync::LazyLock;
    static TIME: LazyLock<chrono::DateTime<chrono::Utc>> = LazyLock::new(chrono::Utc::now);
    *TIME
}

/// The current time in seconds since the unix epoch.
pub fn now_unix() -> Timestamp {
    Timestamp::try_from(now().timestamp()).unwrap_or_default()
}
