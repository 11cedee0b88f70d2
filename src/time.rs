use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{EchoError, Result};

/// Format the node uses for timestamps, always UTC and without a zone suffix.
pub const CHAIN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Seconds since the epoch for a node timestamp such as `2019-03-01T10:00:00`.
pub fn parse_chain_time(time: &str) -> Result<i64> {
    NaiveDateTime::parse_from_str(time, CHAIN_TIME_FORMAT)
        .map(|datetime| datetime.and_utc().timestamp())
        .map_err(|error| EchoError::MalformedInput(format!("bad chain time `{}`: {}", time, error)))
}

pub fn format_chain_time(seconds: u32) -> String {
    DateTime::<Utc>::from_timestamp(seconds as i64, 0)
        .map(|datetime| datetime.format(CHAIN_TIME_FORMAT).to_string())
        .unwrap_or_default()
}
