// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempo_core::test_support::utc;
use yare::parameterized;

#[parameterized(
    interval = { "interval 5m", "interval" },
    constant = { "constant", "constant" },
    daily = { "daily 04:00:00 MWF", "daily" },
    cron = { "cron */15 0 * * 1-5", "cron" },
    groc_daily = { "groc daily 1st monday of jan at 09:00", "groc daily" },
    groc_alias = { "groc every day at 10:00", "groc daily" },
    bare_groc = { "every monday at 09:00", "groc daily" },
)]
fn keyword_selects_parser(source: &str, kind: &str) {
    assert_eq!(Schedule::parse(source).unwrap().kind(), kind);
}

#[test]
fn unknown_keyword() {
    assert!(matches!(
        Schedule::parse("sometimes 5m"),
        Err(ConfigError::UnknownScheduler(k)) if k == "sometimes"
    ));
}

#[test]
fn parse_errors_propagate() {
    assert!(matches!(Schedule::parse("interval 0s"), Err(ConfigError::InvalidInterval(_))));
    assert!(matches!(Schedule::parse("cron 61 * * * *"), Err(ConfigError::Schedule(_))));
}

#[parameterized(
    interval = { "interval 90s", false, false },
    constant = { "constant", false, true },
    cron = { "cron @daily", true, false },
    daily = { "daily 04:00", true, false },
)]
fn policy_defaults(source: &str, queueing: bool, on_complete: bool) {
    let schedule = Schedule::parse(source).unwrap();
    assert_eq!(schedule.default_queueing(), queueing);
    assert_eq!(schedule.schedule_on_complete(), on_complete);
}

#[parameterized(
    interval = { "interval 300 seconds", "interval 5m" },
    constant = { "constant", "constant" },
    cron = { "cron 0 4 * * *", "cron 0 4 * * *" },
    groc = { "groc daily every day at 09:00", "groc daily every day at 09:00" },
    daily = { "daily 04:00 MWF", "daily 04:00 MWF" },
)]
fn display(source: &str, expected: &str) {
    assert_eq!(Schedule::parse(source).unwrap().to_string(), expected);
}

#[test]
fn structured_forms() {
    let interval = Schedule::from_config(&ScheduleConfig::Interval(IntervalConfig {
        interval: "10m".to_string(),
    }))
    .unwrap();
    assert_eq!(interval, Schedule::parse("interval 10m").unwrap());

    let typed = Schedule::from_config(&ScheduleConfig::Typed(TypedConfig {
        kind: "cron".to_string(),
        value: Some("0 4 * * *".to_string()),
    }))
    .unwrap();
    assert_eq!(typed, Schedule::parse("cron 0 4 * * *").unwrap());

    let daily = Schedule::from_config(&ScheduleConfig::Daily(DailyConfig {
        start_time: Some("04:00:00".to_string()),
        days: Some("MWF".to_string()),
    }))
    .unwrap();
    assert_eq!(daily, Schedule::parse("daily 04:00:00 MWF").unwrap());
}

#[test]
fn deserializes_each_shape_from_toml() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        a: ScheduleConfig,
        b: ScheduleConfig,
        c: ScheduleConfig,
        d: ScheduleConfig,
    }
    let parsed: Wrapper = toml::from_str(
        r#"
        a = "interval 5m"
        b = { interval = "5m" }
        c = { type = "cron", value = "0 * * * *" }
        d = { start_time = "04:00", days = "MWF" }
        "#,
    )
    .unwrap();
    assert_eq!(parsed.a, ScheduleConfig::from("interval 5m"));
    assert!(matches!(parsed.b, ScheduleConfig::Interval(_)));
    assert!(matches!(parsed.c, ScheduleConfig::Typed(_)));
    assert!(matches!(parsed.d, ScheduleConfig::Daily(_)));
}

#[test]
fn interval_next_run_time() {
    let schedule = Schedule::parse("interval 10m").unwrap();
    let now = utc(2024, 1, 1, 12, 0, 0);
    assert_eq!(schedule.next_run_time(None, now), Some(utc(2024, 1, 1, 12, 10, 0)));
    assert_eq!(
        schedule.next_run_time(Some(utc(2024, 1, 1, 11, 55, 0)), now),
        Some(utc(2024, 1, 1, 12, 5, 0))
    );
}

#[test]
fn interval_does_not_catch_up() {
    let schedule = Schedule::parse("interval 10m").unwrap();
    let now = utc(2024, 1, 1, 12, 0, 0);
    let long_ago = utc(2023, 12, 1, 0, 0, 0);
    assert_eq!(schedule.next_run_time(Some(long_ago), now), Some(now));
}

#[test]
fn constant_runs_now() {
    let now = utc(2024, 1, 1, 12, 0, 0);
    assert_eq!(Schedule::Constant.next_run_time(Some(utc(2020, 1, 1, 0, 0, 0)), now), Some(now));
}

#[test]
fn calendar_follows_last_run_time() {
    let schedule = Schedule::parse("cron 0 4 * * *").unwrap();
    let now = utc(2024, 1, 10, 12, 0, 0);
    assert_eq!(schedule.next_run_time(None, now), Some(utc(2024, 1, 11, 4, 0, 0)));
    assert_eq!(
        schedule.next_run_time(Some(utc(2024, 1, 8, 4, 0, 0)), now),
        Some(utc(2024, 1, 9, 4, 0, 0))
    );
}

#[test]
fn calendar_time_zone() {
    let schedule =
        Schedule::parse("daily 04:00").unwrap().with_timezone(Some(chrono_tz::Europe::Berlin));
    // CET is UTC+1 in January.
    assert_eq!(
        schedule.next_run_time(None, utc(2024, 1, 10, 0, 0, 0)),
        Some(utc(2024, 1, 10, 3, 0, 0))
    );
}
