// Schedule gate tests: bucket/trigger matching in the civil zone, including
// behavior across a DST transition.

mod common;

use chrono::{TimeZone, Utc};
use chrono_tz::America::New_York;
use common::{default_schedule, trigger};
use hashreport::config::{ScheduleBucket, ScheduleConfig};
use hashreport::time_gate::should_run;

fn ny_instant(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> chrono::DateTime<Utc> {
    New_York
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn monday_end_of_day_trigger_fires() {
    // 2025-09-01 is a Monday
    let schedule = default_schedule();
    assert!(should_run(ny_instant(2025, 9, 1, 23, 59), &schedule));
}

#[test]
fn monday_one_minute_early_does_not_fire() {
    let schedule = default_schedule();
    assert!(!should_run(ny_instant(2025, 9, 1, 23, 58), &schedule));
}

#[test]
fn friday_evening_trigger_fires() {
    // 2025-09-05 is a Friday; the Fri–Sun bucket triggers at 18:00, not 16:00
    let schedule = default_schedule();
    assert!(should_run(ny_instant(2025, 9, 5, 18, 0), &schedule));
    assert!(!should_run(ny_instant(2025, 9, 5, 16, 0), &schedule));
}

#[test]
fn weekday_afternoon_trigger_fires_only_in_its_bucket() {
    let schedule = default_schedule();
    // Tuesday 16:00 is in the Mon–Thu bucket
    assert!(should_run(ny_instant(2025, 9, 2, 16, 0), &schedule));
    // Sunday 16:00 is not
    assert!(!should_run(ny_instant(2025, 9, 7, 16, 0), &schedule));
    // Sunday 06:00 is
    assert!(should_run(ny_instant(2025, 9, 7, 6, 0), &schedule));
}

#[test]
fn schedule_is_stable_across_dst_transition() {
    // US DST started 2025-03-09. Same civil time, different UTC offsets.
    let schedule = default_schedule();

    // Monday 2025-03-03 23:59 EST == 2025-03-04 04:59 UTC
    let before = Utc.with_ymd_and_hms(2025, 3, 4, 4, 59, 0).unwrap();
    // Monday 2025-03-10 23:59 EDT == 2025-03-11 03:59 UTC
    let after = Utc.with_ymd_and_hms(2025, 3, 11, 3, 59, 0).unwrap();

    assert!(should_run(before, &schedule));
    assert!(should_run(after, &schedule));

    // The UTC wall time that matched before the transition no longer does.
    let stale = Utc.with_ymd_and_hms(2025, 3, 11, 4, 59, 0).unwrap();
    assert!(!should_run(stale, &schedule));
}

#[test]
fn unmatched_time_returns_false_not_error() {
    let schedule = default_schedule();
    assert!(!should_run(ny_instant(2025, 9, 1, 12, 30), &schedule));
}

#[test]
fn invalid_timezone_returns_false() {
    let schedule = ScheduleConfig {
        timezone: "Not/A_Zone".into(),
        buckets: vec![ScheduleBucket {
            days: vec!["Mon".into()],
            triggers: vec![trigger(6, 0)],
        }],
    };
    assert!(!should_run(Utc::now(), &schedule));
}

#[test]
fn unknown_weekday_names_never_match() {
    let schedule = ScheduleConfig {
        timezone: "America/New_York".into(),
        buckets: vec![ScheduleBucket {
            days: vec!["Funday".into()],
            triggers: vec![trigger(23, 59)],
        }],
    };
    assert!(!should_run(ny_instant(2025, 9, 1, 23, 59), &schedule));
}
