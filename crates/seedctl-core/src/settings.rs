// ── Settings registry ──
//
// Typed, validated runtime settings addressed by dotted names. Values
// live in an `ArcSwap` so readers (pollers, formatters, list commands)
// never block writers (`set`, `reset`, rc scripts).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::error::CoreError;
use crate::field::{self, FormatOptions, Prefix, Unit, UnitStyle, units};
use crate::filter::SortOrder;
use crate::model::EntityKind;

// ── Setting specs ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingType {
    Url,
    /// Seconds, at least `min`.
    Seconds { min: f64 },
    Integer { min: i64 },
    Columns(EntityKind),
    Sort(EntityKind),
    Choice(&'static [&'static str]),
}

impl SettingType {
    fn describe(self) -> String {
        match self {
            Self::Url => "URL".into(),
            Self::Seconds { min } => format!("seconds >= {min}"),
            Self::Integer { min } => format!("integer >= {min}"),
            Self::Columns(kind) => format!("list of {kind} fields"),
            Self::Sort(kind) => format!("{kind} sort order"),
            Self::Choice(choices) => choices.join("|"),
        }
    }
}

#[derive(Debug)]
pub struct SettingSpec {
    pub name: &'static str,
    pub ty: SettingType,
    pub default: &'static str,
    pub description: &'static str,
}

const fn spec(
    name: &'static str,
    ty: SettingType,
    default: &'static str,
    description: &'static str,
) -> SettingSpec {
    SettingSpec {
        name,
        ty,
        default,
        description,
    }
}

const UNITS: &[&str] = &["byte", "bit"];
const PREFIXES: &[&str] = &["metric", "binary"];

static SPECS: &[SettingSpec] = &[
    spec(
        "connect.url",
        SettingType::Url,
        "http://localhost:9091/transmission/rpc",
        "Transmission RPC endpoint",
    ),
    spec(
        "connect.timeout",
        SettingType::Seconds { min: 0.0 },
        "10",
        "Seconds before a remote call is abandoned",
    ),
    spec(
        "poll.interval",
        SettingType::Seconds { min: 0.1 },
        "5",
        "Seconds between poll cycles",
    ),
    spec(
        "poll.timeout",
        SettingType::Seconds { min: 0.1 },
        "10",
        "Seconds before a listing request counts as failed",
    ),
    spec(
        "poll.max-failures",
        SettingType::Integer { min: 1 },
        "3",
        "Consecutive failures before the connection is considered lost",
    ),
    spec(
        "poll.backoff-max",
        SettingType::Seconds { min: 0.1 },
        "60",
        "Upper bound for the retry delay after failures",
    ),
    spec(
        "poll.full-every",
        SettingType::Integer { min: 1 },
        "10",
        "Request a full listing every N cycles",
    ),
    spec(
        "tlist.columns",
        SettingType::Columns(EntityKind::Torrent),
        "id, size, downloaded, uploaded, ratio, seeds, peers, status, eta, %downloaded, rate-down, rate-up, name",
        "Columns of torrent lists",
    ),
    spec(
        "tlist.sort",
        SettingType::Sort(EntityKind::Torrent),
        "name",
        "Sort order of torrent lists",
    ),
    spec(
        "flist.columns",
        SettingType::Columns(EntityKind::File),
        "priority, %downloaded, downloaded, size, name",
        "Columns of file lists",
    ),
    spec(
        "flist.sort",
        SettingType::Sort(EntityKind::File),
        "torrent, path, name",
        "Sort order of file lists",
    ),
    spec(
        "plist.columns",
        SettingType::Columns(EntityKind::Peer),
        "host, port, client, %downloaded, rate-down, rate-up, torrent",
        "Columns of peer lists",
    ),
    spec(
        "plist.sort",
        SettingType::Sort(EntityKind::Peer),
        "torrent, host",
        "Sort order of peer lists",
    ),
    spec(
        "trklist.columns",
        SettingType::Columns(EntityKind::Tracker),
        "torrent, tier, domain, status, error, seeds, leeches, downloads, last-announce, next-announce",
        "Columns of tracker lists",
    ),
    spec(
        "trklist.sort",
        SettingType::Sort(EntityKind::Tracker),
        "torrent, tier, domain",
        "Sort order of tracker lists",
    ),
    spec(
        "remove.max-hits",
        SettingType::Integer { min: 0 },
        "10",
        "Refuse to remove more torrents than this without --force",
    ),
    spec(
        "unit.size",
        SettingType::Choice(UNITS),
        "byte",
        "Unit for sizes",
    ),
    spec(
        "unit.rate",
        SettingType::Choice(UNITS),
        "byte",
        "Unit for transfer rates",
    ),
    spec(
        "unitprefix.size",
        SettingType::Choice(PREFIXES),
        "metric",
        "Unit prefix for sizes",
    ),
    spec(
        "unitprefix.rate",
        SettingType::Choice(PREFIXES),
        "metric",
        "Unit prefix for transfer rates",
    ),
];

/// Every known setting.
pub fn specs() -> &'static [SettingSpec] {
    SPECS
}

fn lookup(name: &str) -> Result<&'static SettingSpec, CoreError> {
    SPECS
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| CoreError::UnknownSetting {
            name: name.to_owned(),
        })
}

/// Plain seconds ("0.5") or a duration ("2m").
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn parse_seconds(raw: &str) -> Result<f64, String> {
    units::parse_float(raw, false).or_else(|_| units::parse_duration(raw).map(|d| d as f64))
}

// ── Values ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Text(String),
    Seconds(f64),
    Integer(i64),
    Columns(Vec<&'static str>),
    Sort(SortOrder),
    Choice(&'static str),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Seconds(s) => write!(f, "{s}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Columns(cols) => f.write_str(&cols.join(", ")),
            Self::Sort(order) => write!(f, "{order}"),
            Self::Choice(c) => f.write_str(c),
        }
    }
}

impl SettingSpec {
    /// Validate `raw` against this setting's type.
    pub fn parse(&self, raw: &str) -> Result<SettingValue, CoreError> {
        let invalid = |reason: String| CoreError::Setting {
            name: self.name.to_owned(),
            reason,
        };
        let raw = raw.trim();
        match self.ty {
            SettingType::Url => url::Url::parse(raw)
                .map(|_| SettingValue::Text(raw.to_owned()))
                .map_err(|e| invalid(format!("'{raw}' is not a URL: {e}"))),
            SettingType::Seconds { min } => {
                match parse_seconds(raw) {
                    Ok(s) if s >= min => Ok(SettingValue::Seconds(s)),
                    Ok(s) => Err(invalid(format!("{s} is below the minimum of {min}"))),
                    Err(e) => Err(invalid(e)),
                }
            }
            SettingType::Integer { min } => match units::parse_int(raw) {
                Ok(n) if n >= min => Ok(SettingValue::Integer(n)),
                Ok(n) => Err(invalid(format!("{n} is below the minimum of {min}"))),
                Err(e) => Err(invalid(e)),
            },
            SettingType::Columns(kind) => {
                let mut cols = Vec::new();
                for word in raw.split([',', ' ']).filter(|w| !w.is_empty()) {
                    let name = field::canonical_field(kind, word)
                        .ok_or_else(|| invalid(format!("unknown {kind} field '{word}'")))?;
                    if !cols.contains(&name) {
                        cols.push(name);
                    }
                }
                if cols.is_empty() {
                    return Err(invalid("at least one column is required".into()));
                }
                Ok(SettingValue::Columns(cols))
            }
            SettingType::Sort(kind) => SortOrder::parse_for(kind, raw)
                .map(SettingValue::Sort)
                .map_err(|e| invalid(e.to_string())),
            SettingType::Choice(choices) => choices
                .iter()
                .find(|c| c.eq_ignore_ascii_case(raw))
                .copied()
                .map(SettingValue::Choice)
                .ok_or_else(|| invalid(format!("expected one of {}", choices.join(", ")))),
        }
    }
}

/// One row of `settings` output.
#[derive(Debug, Clone, Serialize)]
pub struct SettingEntry {
    pub name: &'static str,
    pub value: String,
    pub default: &'static str,
    #[serde(rename = "type")]
    pub ty: String,
    pub description: &'static str,
}

// ── Settings ─────────────────────────────────────────────────────────

type Values = BTreeMap<&'static str, SettingValue>;

/// Live settings of one session.
pub struct Settings {
    values: ArcSwap<Values>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.load().iter()).finish()
    }
}

fn defaults() -> Values {
    SPECS
        .iter()
        .filter_map(|s| s.parse(s.default).ok().map(|v| (s.name, v)))
        .collect()
}

impl Settings {
    pub fn new() -> Self {
        Self {
            values: ArcSwap::from_pointee(defaults()),
        }
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Result<SettingValue, CoreError> {
        let spec = lookup(name)?;
        self.values
            .load()
            .get(spec.name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownSetting {
                name: name.to_owned(),
            })
    }

    /// Validate and assign. The previous value stays on error.
    pub fn set(&self, name: &str, raw: &str) -> Result<SettingValue, CoreError> {
        let spec = lookup(name)?;
        let value = spec.parse(raw)?;
        self.store(spec.name, value.clone());
        tracing::debug!(setting = spec.name, value = %value, "setting changed");
        Ok(value)
    }

    /// Restore the default of `name`.
    pub fn reset(&self, name: &str) -> Result<SettingValue, CoreError> {
        let spec = lookup(name)?;
        let value = spec.parse(spec.default)?;
        self.store(spec.name, value.clone());
        Ok(value)
    }

    /// Apply many `name = value` pairs, collecting failures.
    pub fn apply<'a>(
        &self,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Vec<CoreError> {
        pairs
            .into_iter()
            .filter_map(|(name, raw)| self.set(name, raw).err())
            .collect()
    }

    fn store(&self, name: &'static str, value: SettingValue) {
        self.values.rcu(|current| {
            let mut next = Values::clone(current);
            next.insert(name, value.clone());
            Arc::new(next)
        });
    }

    /// All settings, in name order.
    pub fn list(&self) -> Vec<SettingEntry> {
        let values = self.values.load();
        let mut entries: Vec<SettingEntry> = SPECS
            .iter()
            .map(|s| SettingEntry {
                name: s.name,
                value: values.get(s.name).map(ToString::to_string).unwrap_or_default(),
                default: s.default,
                ty: s.ty.describe(),
                description: s.description,
            })
            .collect();
        entries.sort_by_key(|e| e.name);
        entries
    }

    // ── Typed accessors ──────────────────────────────────────────────

    fn value(&self, name: &'static str) -> Option<SettingValue> {
        self.values.load().get(name).cloned()
    }

    /// A seconds-typed setting as a `Duration`.
    pub fn duration(&self, name: &'static str) -> Duration {
        match self.value(name) {
            Some(SettingValue::Seconds(s)) => Duration::from_secs_f64(s),
            _ => Duration::ZERO,
        }
    }

    pub fn integer(&self, name: &'static str) -> i64 {
        match self.value(name) {
            Some(SettingValue::Integer(n)) => n,
            _ => 0,
        }
    }

    pub fn text(&self, name: &'static str) -> String {
        self.value(name).map(|v| v.to_string()).unwrap_or_default()
    }

    /// Default list columns for `kind`.
    pub fn columns(&self, kind: EntityKind) -> Vec<&'static str> {
        let name = match kind {
            EntityKind::Torrent => "tlist.columns",
            EntityKind::File => "flist.columns",
            EntityKind::Peer => "plist.columns",
            EntityKind::Tracker => "trklist.columns",
        };
        match self.value(name) {
            Some(SettingValue::Columns(cols)) => cols,
            _ => Vec::new(),
        }
    }

    /// Default sort order for `kind`.
    pub fn sort(&self, kind: EntityKind) -> SortOrder {
        let name = match kind {
            EntityKind::Torrent => "tlist.sort",
            EntityKind::File => "flist.sort",
            EntityKind::Peer => "plist.sort",
            EntityKind::Tracker => "trklist.sort",
        };
        match self.value(name) {
            Some(SettingValue::Sort(order)) => order,
            _ => SortOrder::by_id(kind),
        }
    }

    /// Unit preferences for formatters.
    pub fn format_options(&self) -> FormatOptions {
        let style = |unit: &'static str, prefix: &'static str| UnitStyle {
            unit: match self.value(unit) {
                Some(SettingValue::Choice("bit")) => Unit::Bit,
                _ => Unit::Byte,
            },
            prefix: match self.value(prefix) {
                Some(SettingValue::Choice("binary")) => Prefix::Binary,
                _ => Prefix::Metric,
            },
        };
        FormatOptions {
            size: style("unit.size", "unitprefix.size"),
            rate: style("unit.rate", "unitprefix.rate"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn every_default_parses() {
        for spec in specs() {
            assert!(spec.parse(spec.default).is_ok(), "{} default", spec.name);
        }
        assert_eq!(Settings::new().list().len(), specs().len());
    }

    #[test]
    fn set_validates_and_keeps_old_value_on_error() {
        let settings = Settings::new();
        assert_eq!(settings.duration("poll.interval"), Duration::from_secs(5));

        settings.set("poll.interval", "0.5").unwrap();
        assert_eq!(settings.duration("poll.interval"), Duration::from_millis(500));

        let err = settings.set("poll.interval", "0.01").unwrap_err();
        assert!(matches!(err, CoreError::Setting { .. }));
        assert_eq!(settings.duration("poll.interval"), Duration::from_millis(500));

        settings.set("poll.backoff-max", "2m").unwrap();
        assert_eq!(settings.duration("poll.backoff-max"), Duration::from_secs(120));
    }

    #[test]
    fn columns_are_canonicalized() {
        let settings = Settings::new();
        settings.set("tlist.columns", "n, sz,rto name").unwrap();
        assert_eq!(
            settings.columns(EntityKind::Torrent),
            vec!["name", "size", "ratio"]
        );
        assert!(settings.set("tlist.columns", "nonsense").is_err());
        assert!(settings.set("tlist.columns", "complete").is_err());
    }

    #[test]
    fn sort_and_units() {
        let settings = Settings::new();
        settings.set("tlist.sort", "!rate-down, name").unwrap();
        assert_eq!(settings.sort(EntityKind::Torrent).to_string(), "!rate-down,name");

        settings.set("unit.rate", "BIT").unwrap();
        settings.set("unitprefix.size", "binary").unwrap();
        let opts = settings.format_options();
        assert_eq!(opts.rate.unit, Unit::Bit);
        assert_eq!(opts.size.prefix, Prefix::Binary);
        assert_eq!(opts.size.unit, Unit::Byte);
    }

    #[test]
    fn unknown_and_reset() {
        let settings = Settings::new();
        assert!(matches!(
            settings.set("no.such", "1"),
            Err(CoreError::UnknownSetting { .. })
        ));
        settings.set("remove.max-hits", "0").unwrap();
        assert_eq!(settings.integer("remove.max-hits"), 0);
        settings.reset("remove.max-hits").unwrap();
        assert_eq!(settings.integer("remove.max-hits"), 10);
    }

    #[test]
    fn apply_collects_failures() {
        let settings = Settings::new();
        let errors = settings.apply([("poll.interval", "2"), ("bogus", "1"), ("unit.size", "x")]);
        assert_eq!(errors.len(), 2);
        assert_eq!(settings.duration("poll.interval"), Duration::from_secs(2));
    }
}
