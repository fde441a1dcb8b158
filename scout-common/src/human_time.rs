//! Human-readable durations
//!
//! Parsing for the `--max-age` / `--max-time` grammar and the compact
//! display used in session banners and timeout messages.

use crate::{Error, Result};

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;
const WEEK_MS: u64 = 7 * DAY_MS;

/// Parse a duration such as `30m`, `2d`, `1 week`, `12hours` into milliseconds.
///
/// Grammar: `<digits> [whitespace] <unit> [s]`, case-insensitive, where unit is
/// one of `s m h d w second minute hour day week`. Zero is rejected.
///
/// # Examples
///
/// ```
/// use scout_common::human_time::parse_max_age;
///
/// assert_eq!(parse_max_age("2d").unwrap(), 172_800_000);
/// assert_eq!(parse_max_age("30 minutes").unwrap(), 1_800_000);
/// assert!(parse_max_age("bogus").is_err());
/// ```
pub fn parse_max_age(input: &str) -> Result<u64> {
    let invalid = || {
        Error::InvalidInput(format!(
            "Invalid duration '{}'. Use format like: 1h, 30m, 2d, 1w",
            input
        ))
    };

    let trimmed = input.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits_end == 0 {
        return Err(invalid());
    }

    let value: u64 = trimmed[..digits_end].parse().map_err(|_| invalid())?;
    let unit = trimmed[digits_end..].trim_start().to_lowercase();

    // Trailing plural `s` is optional, so `5s` is seconds and `5ss` is too.
    let unit_ms = unit_millis(&unit)
        .or_else(|| unit.strip_suffix('s').and_then(unit_millis))
        .ok_or_else(invalid)?;

    match value.checked_mul(unit_ms) {
        Some(0) | None => Err(invalid()),
        Some(ms) => Ok(ms),
    }
}

fn unit_millis(unit: &str) -> Option<u64> {
    match unit {
        "s" | "second" => Some(SECOND_MS),
        "m" | "minute" => Some(MINUTE_MS),
        "h" | "hour" => Some(HOUR_MS),
        "d" | "day" => Some(DAY_MS),
        "w" | "week" => Some(WEEK_MS),
        _ => None,
    }
}

/// Format milliseconds in the largest fitting unit, rounded.
///
/// ```
/// use scout_common::human_time::format_duration_short;
///
/// assert_eq!(format_duration_short(45_000), "45s");
/// assert_eq!(format_duration_short(5_400_000), "2h");
/// assert_eq!(format_duration_short(172_800_000), "2d");
/// ```
pub fn format_duration_short(ms: u64) -> String {
    let rounded = |unit: u64| ms.saturating_add(unit / 2) / unit;

    if ms < MINUTE_MS {
        format!("{}s", rounded(SECOND_MS))
    } else if ms < HOUR_MS {
        format!("{}m", rounded(MINUTE_MS))
    } else if ms < DAY_MS {
        format!("{}h", rounded(HOUR_MS))
    } else if ms < WEEK_MS {
        format!("{}d", rounded(DAY_MS))
    } else {
        format!("{}w", rounded(WEEK_MS))
    }
}
