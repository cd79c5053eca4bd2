//! The schedule evaluator (§4.5): given a `Schedule` and an instant,
//! decide whether it fires now, and compute the next firing time.
//!
//! Calendar and timezone arithmetic uses `chrono`/`chrono_tz`, sourced
//! from `preedep-jobweaver-rs` in the retrieval pack (see
//! `SPEC_FULL.md` §4.5 and `DESIGN.md`) since the teacher has no
//! calendar code of its own.

pub mod cron;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::config::policy::{Interval, Schedule};

const WINDOW_MINUTES: i64 = 25;

/// Evaluates `schedule` against `at` (an instant in UTC). Returns
/// whether the schedule "fires now."
pub fn should_run(schedule: &Schedule, at: DateTime<Utc>) -> Result<bool, String> {
    let tz = resolve_timezone(schedule)?;
    let local = at.with_timezone(&tz);

    if schedule.interval == Interval::Cron {
        let expr = schedule
            .cron
            .as_deref()
            .ok_or_else(|| "interval 'cron' requires a 'cron' expression".to_string())?;
        let parsed = cron::CronSchedule::parse(expr)?;
        return Ok(parsed.matches(local.naive_local()));
    }

    if !day_qualifies(schedule, local.date_naive())? {
        return Ok(false);
    }

    Ok(within_time_window(schedule, &local.time())?)
}

/// Computes the earliest instant `>= from` at which `schedule` fires.
pub fn next_fire(schedule: &Schedule, from: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, String> {
    let tz = resolve_timezone(schedule)?;

    if schedule.interval == Interval::Cron {
        let expr = schedule
            .cron
            .as_deref()
            .ok_or_else(|| "interval 'cron' requires a 'cron' expression".to_string())?;
        let parsed = cron::CronSchedule::parse(expr)?;
        let local_from = from.with_timezone(&tz).naive_local();
        return Ok(parsed
            .next_fire(local_from)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .map(|dt| dt.with_timezone(&Utc)));
    }

    // Deterministic calendar arithmetic (§4.5): step day-by-day over the
    // 366-day horizon, since daily/weekly/monthly/.../yearly schedules
    // qualify at most once a day. Only once a qualifying day is found is
    // the configured time-of-day (or day start, absent one) narrowed to
    // an exact instant.
    let configured_time = match &schedule.time {
        Some(time) => parse_time_of_day(time)?,
        None => NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is always valid"),
    };

    let local_from = from.with_timezone(&tz);
    let mut date = local_from.date_naive();
    let horizon_date = date + chrono::Duration::days(366);

    while date <= horizon_date {
        if day_qualifies(schedule, date)? {
            if let Some(candidate_local) = tz.from_local_datetime(&date.and_time(configured_time)).earliest() {
                let candidate_utc = candidate_local.with_timezone(&Utc);
                if candidate_utc >= from {
                    return Ok(Some(candidate_utc));
                }
            }
        }
        date += chrono::Duration::days(1);
    }
    Ok(None)
}

/// The interval-specific calendar test (§4.5), independent of
/// time-of-day. Shared by `should_run` (against `at`'s local date) and
/// `next_fire` (scanning forward date-by-date). Never called for
/// `Interval::Cron`, which has its own field-based matcher.
fn day_qualifies(schedule: &Schedule, date: NaiveDate) -> Result<bool, String> {
    Ok(match schedule.interval {
        Interval::Daily => true,
        Interval::Weekly => {
            let expected = schedule
                .day
                .unwrap_or(crate::config::policy::Weekday::Monday);
            crate::config::policy::Weekday::from_chrono(date.weekday()) == expected
        }
        Interval::Monthly => date.day() == 1,
        Interval::Quarterly => date.day() == 1 && matches!(date.month(), 1 | 4 | 7 | 10),
        Interval::Semiannually => date.day() == 1 && matches!(date.month(), 1 | 7),
        Interval::Yearly => date.day() == 1 && date.month() == 1,
        Interval::Cron => {
            return Err("day_qualifies does not handle interval 'cron'".to_string());
        }
    })
}

fn resolve_timezone(schedule: &Schedule) -> Result<Tz, String> {
    match &schedule.timezone {
        Some(tz) => tz.parse::<Tz>().map_err(|_| format!("unknown timezone: {tz}")),
        None => Ok(chrono_tz::UTC),
    }
}

fn parse_time_of_day(time: &str) -> Result<NaiveTime, String> {
    let (h, m) = time
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)))
        .ok_or_else(|| format!("invalid time-of-day: {time}"))?;

    NaiveTime::from_hms_opt(h, m, 0).ok_or_else(|| format!("invalid time-of-day: {time}"))
}

fn within_time_window(schedule: &Schedule, actual: &NaiveTime) -> Result<bool, String> {
    let Some(time) = &schedule.time else {
        return Ok(true);
    };

    let configured = parse_time_of_day(time)?;
    let configured_minutes = configured.num_seconds_from_midnight() as i64 / 60;
    let actual_minutes = actual.num_seconds_from_midnight() as i64 / 60;

    Ok((actual_minutes - configured_minutes).abs() <= WINDOW_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::policy::{Interval, Schedule};
    use chrono::TimeZone;

    fn schedule(interval: Interval, time: Option<&str>, cron: Option<&str>) -> Schedule {
        Schedule {
            interval,
            day: None,
            time: time.map(str::to_string),
            timezone: None,
            cron: cron.map(str::to_string),
        }
    }

    #[test]
    fn cron_noon_fires_within_window() {
        let s = schedule(Interval::Cron, None, Some("0 12 * * *"));
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 1, 0).unwrap();
        assert!(should_run(&s, at).unwrap());
    }

    #[test]
    fn weekly_friday_fires_only_on_friday() {
        let mut s = schedule(Interval::Weekly, None, None);
        s.day = Some(crate::config::policy::Weekday::Friday);
        // 2026-07-31 is a Friday.
        let friday = Utc.with_ymd_and_hms(2026, 7, 31, 9, 0, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2026, 7, 27, 9, 0, 0).unwrap();
        assert!(should_run(&s, friday).unwrap());
        assert!(!should_run(&s, monday).unwrap());
    }

    #[test]
    fn next_fire_from_monday_lands_on_friday() {
        let mut s = schedule(Interval::Weekly, Some("09:00"), None);
        s.day = Some(crate::config::policy::Weekday::Friday);
        let monday = Utc.with_ymd_and_hms(2026, 7, 27, 0, 0, 0).unwrap();
        let fired = next_fire(&s, monday).unwrap().unwrap();
        assert_eq!(fired.date_naive(), chrono::NaiveDate::from_ymd_opt(2026, 7, 31).unwrap());
        // Day-by-day scanning should still land on the exact configured
        // time-of-day, not just the right date.
        assert_eq!(fired, Utc.with_ymd_and_hms(2026, 7, 31, 9, 0, 0).unwrap());
    }

    #[test]
    fn next_fire_skips_same_day_when_time_already_passed() {
        let mut s = schedule(Interval::Weekly, Some("09:00"), None);
        s.day = Some(crate::config::policy::Weekday::Friday);
        // 2026-07-31 is a Friday; asking from 10:00 (past the 09:00 slot,
        // and past its ±25 minute window) should land on the following
        // Friday, not re-fire later the same day.
        let friday_after_slot = Utc.with_ymd_and_hms(2026, 7, 31, 10, 0, 0).unwrap();
        let fired = next_fire(&s, friday_after_slot).unwrap().unwrap();
        assert_eq!(fired, Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 0).unwrap());
    }

    #[test]
    fn quarterly_only_on_quarter_starts() {
        let s = schedule(Interval::Quarterly, None, None);
        let jan1 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let feb1 = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert!(should_run(&s, jan1).unwrap());
        assert!(!should_run(&s, feb1).unwrap());
    }
}
