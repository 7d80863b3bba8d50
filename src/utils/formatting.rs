//! Time formatting utilities
//!
//! Functions for turning second counts and timestamps into German,
//! human-readable text: duration breakdowns ("1 h 1 min 1 s"), uptime
//! strings ("2 Tage 03:04:05") and relative phrases ("vor 3 Minuten").

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_MONTH: u64 = 2_592_000;

/// A unit of the duration breakdown
///
/// Variants are declared largest first so that the derived `Ord`
/// matches the order in which units are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

/// Static description of one unit: its length and German labels
#[derive(Debug, Clone, Copy)]
pub struct IntervalDefinition {
    pub unit: TimeUnit,
    pub seconds: u64,
    pub singular: &'static str,
    pub plural: &'static str,
}

/// Interval table, strictly decreasing in `seconds`.
///
/// Years and months are fixed-length (365 and 30 days).
pub const INTERVALS: [IntervalDefinition; 7] = [
    IntervalDefinition {
        unit: TimeUnit::Year,
        seconds: 31_536_000,
        singular: "Jahr",
        plural: "Jahre",
    },
    IntervalDefinition {
        unit: TimeUnit::Month,
        seconds: SECONDS_PER_MONTH,
        singular: "Monat",
        plural: "Monate",
    },
    IntervalDefinition {
        unit: TimeUnit::Week,
        seconds: 604_800,
        singular: "Woche",
        plural: "Wochen",
    },
    IntervalDefinition {
        unit: TimeUnit::Day,
        seconds: SECONDS_PER_DAY,
        singular: "Tag",
        plural: "Tage",
    },
    IntervalDefinition {
        unit: TimeUnit::Hour,
        seconds: SECONDS_PER_HOUR,
        singular: "h",
        plural: "h",
    },
    IntervalDefinition {
        unit: TimeUnit::Minute,
        seconds: SECONDS_PER_MINUTE,
        singular: "min",
        plural: "min",
    },
    IntervalDefinition {
        unit: TimeUnit::Second,
        seconds: 1,
        singular: "s",
        plural: "s",
    },
];

impl TimeUnit {
    /// The name used in unit filters ("year", "month", ...)
    pub fn name(self) -> &'static str {
        match self {
            TimeUnit::Year => "year",
            TimeUnit::Month => "month",
            TimeUnit::Week => "week",
            TimeUnit::Day => "day",
            TimeUnit::Hour => "hour",
            TimeUnit::Minute => "minute",
            TimeUnit::Second => "second",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        INTERVALS
            .iter()
            .map(|def| def.unit)
            .find(|unit| unit.name() == s)
            .ok_or_else(|| anyhow!("Unknown time unit '{}'", s))
    }
}

/// Restricts which units a duration breakdown may use
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UnitFilter {
    /// Every unit in the interval table
    #[default]
    All,
    /// Only the listed units; an empty set selects nothing
    Only(BTreeSet<TimeUnit>),
}

impl UnitFilter {
    /// Builds a filter from unit names
    ///
    /// No names means no restriction. Unknown names are ignored, so a
    /// list made only of unknown names selects no units at all.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut any = false;
        let mut units = BTreeSet::new();
        for name in names {
            any = true;
            if let Ok(unit) = name.as_ref().parse::<TimeUnit>() {
                units.insert(unit);
            }
        }

        if any {
            UnitFilter::Only(units)
        } else {
            UnitFilter::All
        }
    }

    pub fn includes(&self, unit: TimeUnit) -> bool {
        match self {
            UnitFilter::All => true,
            UnitFilter::Only(units) => units.contains(&unit),
        }
    }
}

impl FromIterator<TimeUnit> for UnitFilter {
    fn from_iter<I: IntoIterator<Item = TimeUnit>>(iter: I) -> Self {
        UnitFilter::Only(iter.into_iter().collect())
    }
}

/// Breaks a duration into `(count, label)` pairs, largest unit first
///
/// Greedy decomposition over the interval table, skipping units the
/// filter excludes and units whose count is zero.
pub fn duration_breakdown(seconds: u64, filter: &UnitFilter) -> Vec<(u64, &'static str)> {
    let mut remaining = seconds;
    let mut parts = Vec::new();

    for def in INTERVALS.iter().filter(|def| filter.includes(def.unit)) {
        let count = remaining / def.seconds;
        if count > 0 {
            let label = if count == 1 { def.singular } else { def.plural };
            parts.push((count, label));
            remaining -= count * def.seconds;
        }
    }

    parts
}

/// Formats a number of seconds as a German duration
///
/// # Arguments
/// - `seconds` - The duration to format
/// - `filter` - Units allowed in the output
///
/// # Returns
/// Space-separated "<count> <label>" tokens, e.g. `"1 h 1 min 1 s"`.
/// Zero seconds produce an empty string.
pub fn seconds_to_human_time(seconds: u64, filter: &UnitFilter) -> String {
    duration_breakdown(seconds, filter)
        .into_iter()
        .map(|(count, label)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats an uptime as `"<d> Tag(e) HH:MM:SS"`
///
/// The day prefix is only present when at least one full day has passed.
pub fn format_uptime(uptime: u64) -> String {
    let days = uptime / SECONDS_PER_DAY;
    let hours = (uptime % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (uptime % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = uptime % SECONDS_PER_MINUTE;

    let mut formatted = String::new();
    if days > 0 {
        let suffix = if days != 1 { "e" } else { "" };
        formatted.push_str(&format!("{} Tag{} ", days, suffix));
    }
    formatted.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    formatted
}

/// Formats elapsed seconds as a German relative phrase
///
/// Below one second the result is `"jetzt"`. Above a minute the largest
/// unit is followed by the next smaller one when it is non-zero, e.g.
/// `"vor 2 Stunden 5 Minuten"`. Only the leading unit is inflected; the
/// trailing remainder always uses the plural word.
pub fn format_elapsed(elapsed_secs: i64) -> String {
    if elapsed_secs < 1 {
        return "jetzt".to_string();
    }

    let elapsed = elapsed_secs as u64;

    if elapsed < SECONDS_PER_MINUTE {
        return format!("vor {} Sekunden", elapsed);
    }

    let (count, singular, plural_suffix, remainder, remainder_word) = if elapsed < SECONDS_PER_HOUR
    {
        (
            elapsed / SECONDS_PER_MINUTE,
            "Minute",
            "n",
            elapsed % SECONDS_PER_MINUTE,
            "Sekunden",
        )
    } else if elapsed < SECONDS_PER_DAY {
        (
            elapsed / SECONDS_PER_HOUR,
            "Stunde",
            "n",
            (elapsed % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            "Minuten",
        )
    } else if elapsed < SECONDS_PER_MONTH {
        (
            elapsed / SECONDS_PER_DAY,
            "Tag",
            "en",
            (elapsed % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            "Stunden",
        )
    } else {
        (
            elapsed / SECONDS_PER_MONTH,
            "Monat",
            "en",
            (elapsed % SECONDS_PER_MONTH) / SECONDS_PER_DAY,
            "Tagen",
        )
    };

    let mut phrase = format!("vor {} {}", count, singular);
    if count != 1 {
        phrase.push_str(plural_suffix);
    }
    if remainder > 0 {
        phrase.push_str(&format!(" {} {}", remainder, remainder_word));
    }
    phrase
}

/// Parses a timestamp as stored by the web application
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD` and integer Unix seconds. Timestamps without an offset
/// are read as UTC, not local time; callers holding Vienna wall-clock
/// values must pass them in UTC or with an explicit offset.
///
/// # Errors
/// Returns an error if none of the formats match.
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>> {
    let trimmed = timestamp.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    if let Ok(secs) = trimmed.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(secs, 0) {
            return Ok(dt);
        }
    }

    Err(anyhow!("Unrecognised timestamp '{}'", timestamp))
}

/// Formats how long ago `timestamp` was, relative to `now`
///
/// Returns an empty string when the timestamp cannot be parsed.
pub fn format_last_communication_at(timestamp: &str, now: DateTime<Utc>) -> String {
    match parse_timestamp(timestamp) {
        Ok(then) => format_elapsed((now - then).num_seconds()),
        Err(e) => {
            tracing::debug!("Cannot format last communication: {}", e);
            String::new()
        }
    }
}

/// Formats how long ago `timestamp` was, relative to the current time
pub fn format_last_communication(timestamp: &str) -> String {
    format_last_communication_at(timestamp, Utc::now())
}
