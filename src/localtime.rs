// Civil-time helpers for the report time zone: schedule matching fields,
// snapshot directory names, and manifest labels. Everything goes through
// timezone-aware conversion so behavior is stable across DST transitions.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

/// Calendar fields of an instant in a civil time zone (12-hour clock).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivilParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// 1..=12
    pub hour12: u32,
    pub minute: u32,
    pub pm: bool,
    /// Weekday abbreviation, "Sun".."Sat".
    pub weekday: String,
}

impl CivilParts {
    pub fn of(instant: DateTime<Utc>, tz: Tz) -> Self {
        let local = instant.with_timezone(&tz);
        let (pm, hour12) = local.hour12();
        Self {
            year: local.year(),
            month: local.month(),
            day: local.day(),
            hour12,
            minute: local.minute(),
            pm,
            weekday: local.format("%a").to_string(),
        }
    }

    /// 0..=23, recovered from the 12-hour clock.
    pub fn hour24(&self) -> u32 {
        let h = if self.hour12 == 12 { 0 } else { self.hour12 };
        h + if self.pm { 12 } else { 0 }
    }
}

/// Deterministic snapshot directory name at minute granularity, e.g.
/// "2025-08-28_06-00-AM". Two runs in the same minute collide on purpose:
/// re-publishing is an idempotent overwrite, not a duplicate.
pub fn snapshot_dir_name(instant: DateTime<Utc>, tz: Tz) -> String {
    let p = CivilParts::of(instant, tz);
    format!(
        "{:04}-{:02}-{:02}_{:02}-{:02}-{}",
        p.year,
        p.month,
        p.day,
        p.hour12,
        p.minute,
        if p.pm { "PM" } else { "AM" }
    )
}

/// Long human label for manifest entries, e.g.
/// "Thursday, August 28, 2025, 6:00 AM".
pub fn human_label(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format("%A, %B %-d, %Y, %-I:%M %p")
        .to_string()
}
