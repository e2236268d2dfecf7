// ── Literal parsing and human formatting ──
//
// Parsers return a short reason on failure; the filter parser wraps it
// into `FilterError::InvalidValue` with the field and offset.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::value::{UNKNOWN_DURATION, UNLIMITED, Value, ValueType};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const YEAR: i64 = 31_557_600;

/// Parsed timestamps stay within years 0000 to 9999, the range RFC 3339
/// can write, so every parsed literal renders back to a parseable one.
pub const MIN_TIMESTAMP: i64 = -62_167_219_200;
pub const MAX_TIMESTAMP: i64 = 253_402_300_799;

// ── Parsing ─────────────────────────────────────────────────────────

pub fn parse_int(s: &str) -> Result<i64, String> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| "expected an integer".to_owned())
}

/// Decimal number; `allow_percent` accepts a trailing `%`.
pub fn parse_float(s: &str, allow_percent: bool) -> Result<f64, String> {
    let s = s.trim();
    let s = if allow_percent {
        s.strip_suffix('%').unwrap_or(s)
    } else {
        s
    };
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err("expected a number".to_owned()),
    }
}

/// Byte count or rate: `1.5k`, `10MiB`, `8Mb/s`, `300`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::as_conversions
)]
pub fn parse_bytes(s: &str, allow_unlimited: bool) -> Result<u64, String> {
    let s = s.trim();
    if allow_unlimited
        && ["unlimited", "none", "inf"]
            .iter()
            .any(|w| s.eq_ignore_ascii_case(w))
    {
        return Ok(UNLIMITED);
    }
    let s = s.strip_suffix("/s").unwrap_or(s);
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num, suffix) = s.split_at(split);
    let n: f64 = num
        .parse()
        .map_err(|_| "expected a number with optional unit".to_owned())?;

    let mut rest = suffix;
    let mut multiplier = 1.0_f64;
    if let Some(c) = rest.chars().next() {
        let power = match c.to_ascii_lowercase() {
            'k' => Some(1),
            'm' => Some(2),
            'g' => Some(3),
            't' => Some(4),
            'p' => Some(5),
            _ => None,
        };
        if let Some(power) = power {
            rest = &rest[1..];
            let base = if let Some(r) = rest.strip_prefix('i') {
                rest = r;
                1024.0_f64
            } else {
                1000.0_f64
            };
            multiplier = base.powi(power);
        }
    }
    let bits = match rest {
        "" | "B" => false,
        "b" => true,
        other => return Err(format!("unknown unit {other:?}")),
    };
    let mut value = n * multiplier;
    if bits {
        value /= 8.0;
    }
    if value >= u64::MAX as f64 {
        return Err("value too large".to_owned());
    }
    Ok(value.round() as u64)
}

/// Duration in seconds: `90`, `30s`, `1h30m`, `2.5d`, `1w`, `1y`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::as_conversions
)]
pub fn parse_duration(s: &str) -> Result<i64, String> {
    let s = s.trim().to_ascii_lowercase();
    if s.is_empty() {
        return Err("expected a duration".to_owned());
    }
    if let Ok(secs) = s.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            return Ok(secs.round() as i64);
        }
        return Err("duration must be positive".to_owned());
    }

    let mut total = 0.0_f64;
    let mut rest = s.as_str();
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (num, tail) = rest.split_at(split);
        let n: f64 = num
            .parse()
            .map_err(|_| format!("invalid duration {s:?}"))?;
        let unit_len = tail
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "s" | "" => 1,
            "m" => MINUTE,
            "h" => HOUR,
            "d" => DAY,
            "w" => WEEK,
            "y" => YEAR,
            other => return Err(format!("unknown duration unit {other:?}")),
        };
        total += n * scale as f64;
        rest = tail;
    }
    Ok(total.round() as i64)
}

/// Absolute date/time, or a duration relative to `now` (unix seconds).
/// `future` fields resolve durations forward in time. Results are clamped
/// to `MIN_TIMESTAMP..=MAX_TIMESTAMP`.
pub fn parse_timestamp(s: &str, now: i64, future: bool) -> Result<i64, String> {
    resolve_timestamp(s.trim(), now, future).map(|ts| ts.clamp(MIN_TIMESTAMP, MAX_TIMESTAMP))
}

fn resolve_timestamp(s: &str, now: i64, future: bool) -> Result<i64, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_timestamp(naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return local_timestamp(naive);
        }
    }
    let delta = parse_duration(s).map_err(|_| "expected a date or a duration".to_owned())?;
    Ok(if future {
        now.saturating_add(delta)
    } else {
        now.saturating_sub(delta)
    })
}

fn local_timestamp(naive: NaiveDateTime) -> Result<i64, String> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| "nonexistent local time".to_owned())
}

pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err("expected true/false".to_owned()),
    }
}

// ── Formatting ──────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Unit {
    #[default]
    Byte,
    Bit,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Prefix {
    #[default]
    Metric,
    Binary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitStyle {
    pub unit: Unit,
    pub prefix: Prefix,
}

/// Display preferences for sizes and rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    pub size: UnitStyle,
    pub rate: UnitStyle,
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn format_bytes(n: u64, style: UnitStyle) -> String {
    let (raw, unit) = match style.unit {
        Unit::Byte => (n as f64, "B"),
        Unit::Bit => (n as f64 * 8.0, "b"),
    };
    let (base, prefixes): (f64, [&str; 6]) = match style.prefix {
        Prefix::Metric => (1000.0, ["", "k", "M", "G", "T", "P"]),
        Prefix::Binary => (1024.0, ["", "Ki", "Mi", "Gi", "Ti", "Pi"]),
    };
    let mut v = raw;
    let mut i = 0;
    while v >= base && i < prefixes.len() - 1 {
        v /= base;
        i += 1;
    }
    let prefix = prefixes.get(i).copied().unwrap_or_default();
    if i == 0 {
        format!("{} {unit}", raw as u64)
    } else if v < 10.0 {
        format!("{v:.2} {prefix}{unit}")
    } else if v < 100.0 {
        format!("{v:.1} {prefix}{unit}")
    } else {
        format!("{v:.0} {prefix}{unit}")
    }
}

pub fn format_rate(n: u64, style: UnitStyle) -> String {
    if n == UNLIMITED {
        return "unlimited".to_owned();
    }
    format!("{}/s", format_bytes(n, style))
}

/// Two most significant components: `1h 30m`, `3d 4h`, `45s`.
pub fn format_duration(secs: i64) -> String {
    if secs == UNKNOWN_DURATION {
        return "?".to_owned();
    }
    if secs < 0 {
        return format!("-{}", format_duration(secs.saturating_neg()));
    }
    let units = [
        (YEAR, "y"),
        (DAY, "d"),
        (HOUR, "h"),
        (MINUTE, "m"),
        (1, "s"),
    ];
    let mut parts = Vec::with_capacity(2);
    let mut rest = secs;
    for (size, suffix) in units {
        if rest >= size {
            parts.push(format!("{}{suffix}", rest / size));
            rest %= size;
        }
        if parts.len() == 2 {
            break;
        }
    }
    if parts.is_empty() {
        "0s".to_owned()
    } else {
        parts.join(" ")
    }
}

/// Local time for display; 0 reads as never.
pub fn format_timestamp(ts: i64) -> String {
    if ts == 0 {
        return String::new();
    }
    DateTime::<Utc>::from_timestamp(ts, 0).map_or_else(String::new, |dt| {
        dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
    })
}

pub fn format_ratio(r: f64) -> String {
    if r.is_infinite() {
        "∞".to_owned()
    } else {
        format!("{r:.2}")
    }
}

pub fn format_percent(p: f64) -> String {
    if p > 0.0 && p < 10.0 {
        format!("{p:.1}%")
    } else {
        format!("{:.0}%", p.floor())
    }
}

/// Human-readable rendering of a field value of type `ty`.
pub fn format_value(value: &Value<'_>, ty: ValueType, opts: &FormatOptions) -> String {
    match (value, ty) {
        (Value::Bytes(n), ValueType::Rate) => format_rate(*n, opts.rate),
        (Value::Bytes(n), _) => format_bytes(*n, opts.size),
        (Value::Float(p), ValueType::Percent) => format_percent(*p),
        (Value::Float(r), _) => format_ratio(*r),
        (Value::Duration(d), _) => format_duration(*d),
        (Value::Timestamp(ts), _) => format_timestamp(*ts),
        (Value::Int(i), _) => i.to_string(),
        (Value::Status { name, .. }, _) => (*name).to_owned(),
        (Value::Text(s), _) => s.to_string(),
        (Value::Bool(b), _) => String::from(if *b { "yes" } else { "no" }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bytes_accept_metric_binary_and_bits() {
        assert_eq!(parse_bytes("1500", false).unwrap(), 1500);
        assert_eq!(parse_bytes("1.5k", false).unwrap(), 1500);
        assert_eq!(parse_bytes("2KiB", false).unwrap(), 2048);
        assert_eq!(parse_bytes("10Mb", false).unwrap(), 1_250_000);
        assert_eq!(parse_bytes("5M/s", false).unwrap(), 5_000_000);
        assert!(parse_bytes("5 parsecs", false).is_err());
        assert!(parse_bytes("unlimited", false).is_err());
        assert_eq!(parse_bytes("unlimited", true).unwrap(), UNLIMITED);
    }

    #[test]
    fn durations_accept_compound_forms() {
        assert_eq!(parse_duration("90").unwrap(), 90);
        assert_eq!(parse_duration("1h30m").unwrap(), 5400);
        assert_eq!(parse_duration("2d").unwrap(), 2 * DAY);
        assert_eq!(parse_duration("1.5h").unwrap(), 5400);
        assert!(parse_duration("3 fortnights").is_err());
    }

    #[test]
    fn timestamps_resolve_relative_durations() {
        let now = 1_700_000_000;
        assert_eq!(parse_timestamp("1d", now, false).unwrap(), now - DAY);
        assert_eq!(parse_timestamp("1h", now, true).unwrap(), now + HOUR);
        assert_eq!(
            parse_timestamp("2023-11-14T22:13:20Z", now, false).unwrap(),
            1_700_000_000
        );
    }

    #[test]
    fn timestamps_clamp_to_four_digit_years() {
        let now = 1_700_000_000;
        assert_eq!(parse_timestamp("300000y", now, false).unwrap(), MIN_TIMESTAMP);
        assert_eq!(parse_timestamp("300000y", now, true).unwrap(), MAX_TIMESTAMP);
        let min = DateTime::<Utc>::from_timestamp(MIN_TIMESTAMP, 0).unwrap();
        assert_eq!(min.to_rfc3339(), "0000-01-01T00:00:00+00:00");
        let max = DateTime::<Utc>::from_timestamp(MAX_TIMESTAMP, 0).unwrap();
        assert_eq!(max.to_rfc3339(), "9999-12-31T23:59:59+00:00");
    }

    #[test]
    fn bools() {
        assert!(parse_bool("yes").unwrap());
        assert!(!parse_bool("OFF").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn percent_strips_sign() {
        assert!((parse_float("50%", true).unwrap() - 50.0).abs() < f64::EPSILON);
        assert!(parse_float("50%", false).is_err());
        assert!(parse_float("NaN", false).is_err());
    }

    #[test]
    fn formats_sizes_and_rates() {
        let metric = UnitStyle::default();
        let binary = UnitStyle {
            unit: Unit::Byte,
            prefix: Prefix::Binary,
        };
        let bits = UnitStyle {
            unit: Unit::Bit,
            prefix: Prefix::Metric,
        };
        assert_eq!(format_bytes(999, metric), "999 B");
        assert_eq!(format_bytes(1500, metric), "1.50 kB");
        assert_eq!(format_bytes(2048, binary), "2.00 KiB");
        assert_eq!(format_rate(125_000, bits), "1.00 Mb/s");
        assert_eq!(format_rate(UNLIMITED, metric), "unlimited");
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(5400), "1h 30m");
        assert_eq!(format_duration(DAY + 5), "1d 5s");
        assert_eq!(format_duration(UNKNOWN_DURATION), "?");
    }

    #[test]
    fn formats_ratio_and_percent() {
        assert_eq!(format_ratio(f64::INFINITY), "∞");
        assert_eq!(format_ratio(1.234), "1.23");
        assert_eq!(format_percent(99.9), "99%");
        assert_eq!(format_percent(2.3), "2.3%");
        assert_eq!(format_timestamp(0), "");
    }
}
