//! A hand-rolled classic 5-field cron parser/evaluator (§4.5), since no
//! crate in the retrieval pack implements 5-field POSIX cron and the
//! spec's matching semantics are precise enough to hand-roll directly.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// One of the five cron fields, represented as a fixed-size membership
/// table rather than re-parsing the source string on every check.
#[derive(Debug, Clone)]
struct Field {
    allowed: Vec<bool>,
    /// Whether this field was the literal `*` wildcard, as opposed to a
    /// list/range/step expression that merely spans the full range.
    /// Classic cron's day-of-month/day-of-week OR rule keys off this
    /// distinction, not off which values end up allowed.
    is_unrestricted: bool,
}

impl Field {
    fn parse(spec: &str, min: u32, max: u32) -> Result<Self, String> {
        let is_unrestricted = spec.trim() == "*";
        let mut allowed = vec![false; max as usize + 1];

        for part in spec.split(',') {
            let (range_part, step) = match part.split_once('/') {
                Some((r, s)) => (
                    r,
                    s.parse::<u32>()
                        .map_err(|_| format!("invalid step in cron field: {part}"))?,
                ),
                None => (part, 1),
            };

            let (lo, hi) = if range_part == "*" {
                (min, max)
            } else if let Some((a, b)) = range_part.split_once('-') {
                let a: u32 = a
                    .parse()
                    .map_err(|_| format!("invalid range start in cron field: {part}"))?;
                let b: u32 = b
                    .parse()
                    .map_err(|_| format!("invalid range end in cron field: {part}"))?;
                (a, b)
            } else {
                let v: u32 = range_part
                    .parse()
                    .map_err(|_| format!("invalid value in cron field: {part}"))?;
                (v, v)
            };

            if lo < min || hi > max || lo > hi {
                return Err(format!("cron field value out of range: {part}"));
            }

            if step == 0 {
                return Err(format!("cron step must be > 0: {part}"));
            }

            let mut v = lo;
            while v <= hi {
                allowed[v as usize] = true;
                v += step;
            }
        }

        Ok(Self {
            allowed,
            is_unrestricted,
        })
    }

    fn contains(&self, value: u32) -> bool {
        self.allowed.get(value as usize).copied().unwrap_or(false)
    }
}

/// A parsed classic 5-field cron expression.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl CronSchedule {
    /// Parses `minute hour day-of-month month day-of-week`. Day of
    /// week runs `0`–`7` with both `0` and `7` meaning Sunday.
    pub fn parse(expr: &str) -> Result<Self, String> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(format!(
                "cron expression must have 5 fields, got {}: {expr}",
                fields.len()
            ));
        }

        Ok(Self {
            minute: Field::parse(fields[0], 0, 59)?,
            hour: Field::parse(fields[1], 0, 23)?,
            day_of_month: Field::parse(fields[2], 1, 31)?,
            month: Field::parse(fields[3], 1, 12)?,
            day_of_week: Field::parse(fields[4], 0, 7)?,
        })
    }

    /// Returns whether this schedule fires at `at` (in whatever
    /// timezone the caller already normalized `at` to).
    ///
    /// Day-of-month and day-of-week combine with classic cron's
    /// restricted-field OR rule: if both fields are restricted (neither
    /// is the literal `*`), the day matches when either field matches;
    /// otherwise the (at most one) restricted field governs alone.
    pub fn matches(&self, at: NaiveDateTime) -> bool {
        let dow = at.weekday().num_days_from_sunday();
        let dom_matches = self.day_of_month.contains(at.day());
        let dow_matches = self.day_of_week.contains(dow) || (dow == 0 && self.day_of_week.contains(7));

        let day_matches = if self.day_of_month.is_unrestricted || self.day_of_week.is_unrestricted {
            dom_matches && dow_matches
        } else {
            dom_matches || dow_matches
        };

        self.minute.contains(at.minute())
            && self.hour.contains(at.hour())
            && self.month.contains(at.month())
            && day_matches
    }

    /// Scans minute-by-minute from `from` (exclusive) up to a 366-day
    /// horizon and returns the first matching instant, per §4.5.
    pub fn next_fire(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        let horizon = from + chrono::Duration::days(366);
        let mut candidate = from + chrono::Duration::minutes(1);
        // Align to the start of the minute.
        candidate -= chrono::Duration::seconds(candidate.second() as i64);

        while candidate <= horizon {
            if self.matches(candidate) {
                return Some(candidate);
            }
            candidate += chrono::Duration::minutes(1);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn scenario_7_step_field() {
        let cron = CronSchedule::parse("*/15 * * * *").unwrap();
        assert!(cron.matches(dt(2026, 1, 5, 10, 30)));
        assert!(!cron.matches(dt(2026, 1, 5, 10, 17)));
    }

    #[test]
    fn daily_noon_every_day() {
        let cron = CronSchedule::parse("0 12 * * *").unwrap();
        assert!(cron.matches(dt(2026, 3, 1, 12, 0)));
        assert!(cron.matches(dt(2026, 3, 2, 12, 0)));
        assert!(!cron.matches(dt(2026, 3, 1, 12, 1)));
    }

    #[test]
    fn range_and_list_fields() {
        let cron = CronSchedule::parse("0 9-17 * * 1,3,5").unwrap();
        // 2026-07-27 is a Monday.
        assert!(cron.matches(dt(2026, 7, 27, 9, 0)));
        assert!(cron.matches(dt(2026, 7, 27, 17, 0)));
        assert!(!cron.matches(dt(2026, 7, 27, 18, 0)));
        // 2026-07-28 is a Tuesday, not in {1,3,5}.
        assert!(!cron.matches(dt(2026, 7, 28, 9, 0)));
    }

    #[test]
    fn restricted_day_of_month_and_day_of_week_combine_with_or() {
        let cron = CronSchedule::parse("0 0 1 * 1").unwrap();
        // 2026-07-01 is a Wednesday: day-of-month matches, day-of-week doesn't.
        assert!(cron.matches(dt(2026, 7, 1, 0, 0)));
        // 2026-07-06 is a Monday: day-of-week matches, day-of-month doesn't.
        assert!(cron.matches(dt(2026, 7, 6, 0, 0)));
        // 2026-07-02 is a Thursday and not the 1st: neither matches.
        assert!(!cron.matches(dt(2026, 7, 2, 0, 0)));
    }

    #[test]
    fn next_fire_scans_forward() {
        let cron = CronSchedule::parse("0 0 1 * *").unwrap();
        let from = dt(2026, 1, 5, 0, 0);
        let next = cron.next_fire(from).unwrap();
        assert_eq!(next, dt(2026, 2, 1, 0, 0));
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(CronSchedule::parse("* * *").is_err());
        assert!(CronSchedule::parse("60 * * * *").is_err());
    }
}
