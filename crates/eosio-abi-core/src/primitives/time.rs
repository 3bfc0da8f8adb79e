/// Chain time types. All are UTC and rendered without a zone suffix.
use crate::error::{AbiError, Result};
use chrono::{DateTime, NaiveDateTime};

const FORMAT_MILLIS: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const FORMAT_SECS: &str = "%Y-%m-%dT%H:%M:%S";

/// 2000-01-01T00:00:00.000 in milliseconds since the Unix epoch
const BLOCK_TIMESTAMP_EPOCH_MS: i64 = 946_684_800_000;
const BLOCK_INTERVAL_MS: i64 = 500;

fn parse_datetime(s: &str, type_name: &str) -> Result<NaiveDateTime> {
    let trimmed = s.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| AbiError::invalid(type_name, format!("'{}': {}", s, e)))
}

fn out_of_range(type_name: &str, value: impl std::fmt::Display) -> AbiError {
    AbiError::invalid(type_name, format!("{} is out of range", value))
}

/// Microseconds since the Unix epoch
pub(super) fn parse_time_point(s: &str) -> Result<i64> {
    Ok(parse_datetime(s, "time_point")?.and_utc().timestamp_micros())
}

pub(super) fn format_time_point(micros: i64) -> Result<String> {
    let dt = DateTime::from_timestamp_micros(micros).ok_or_else(|| out_of_range("time_point", micros))?;
    Ok(dt.format(FORMAT_MILLIS).to_string())
}

/// Seconds since the Unix epoch
pub(super) fn parse_time_point_sec(s: &str) -> Result<u32> {
    let secs = parse_datetime(s, "time_point_sec")?.and_utc().timestamp();
    u32::try_from(secs).map_err(|_| out_of_range("time_point_sec", s))
}

pub(super) fn format_time_point_sec(secs: u32) -> Result<String> {
    let dt = DateTime::from_timestamp(i64::from(secs), 0).ok_or_else(|| out_of_range("time_point_sec", secs))?;
    Ok(dt.format(FORMAT_SECS).to_string())
}

/// Half-second block slots since 2000-01-01
pub(super) fn parse_block_timestamp(s: &str) -> Result<u32> {
    let millis = parse_datetime(s, "block_timestamp_type")?.and_utc().timestamp_millis();
    let slot = (millis - BLOCK_TIMESTAMP_EPOCH_MS) / BLOCK_INTERVAL_MS;
    u32::try_from(slot).map_err(|_| out_of_range("block_timestamp_type", s))
}

pub(super) fn format_block_timestamp(slot: u32) -> Result<String> {
    let millis = i64::from(slot) * BLOCK_INTERVAL_MS + BLOCK_TIMESTAMP_EPOCH_MS;
    let dt = DateTime::from_timestamp_millis(millis).ok_or_else(|| out_of_range("block_timestamp_type", slot))?;
    Ok(dt.format(FORMAT_MILLIS).to_string())
}
