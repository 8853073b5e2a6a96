use chrono::{DateTime, Local};

/// Vendor timestamps are whole seconds since the Unix epoch.
pub type UnixSeconds = i64;

/// Vendor device identifiers are numeric.
pub type DeviceId = i64;

/// Format used for every human-readable time written to the sheet.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a Unix timestamp in the host's local timezone.
///
/// Timestamps outside chrono's representable range fall back to the raw
/// number so that no record is ever lost to a formatting failure.
pub fn format_local(ts: UnixSeconds) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(utc) => utc.with_timezone(&Local).format(LOCAL_TIME_FORMAT).to_string(),
        None => ts.to_string(),
    }
}
