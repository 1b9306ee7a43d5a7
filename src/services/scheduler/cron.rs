// Start of file: /src/services/scheduler/cron.rs

// * Five-field cron expressions: minute hour day-of-month month day-of-week.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};

/// How far ahead `next_after` looks before giving up.
const SEARCH_HORIZON_DAYS: i64 = 4 * 366;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    dom_restricted: bool,
    dow_restricted: bool,
}

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59 };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23 };
const DAY_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31 };
const MONTH: FieldSpec = FieldSpec { name: "month", min: 1, max: 12 };
// 7 is folded onto 0 (Sunday) after parsing
const DAY_OF_WEEK: FieldSpec = FieldSpec { name: "day-of-week", min: 0, max: 7 };

fn parse_number(raw: &str, spec: &FieldSpec) -> Result<u32, String> {
    let value: u32 = raw
        .parse()
        .map_err(|_| format!("invalid {} value '{raw}'", spec.name))?;
    if value < spec.min || value > spec.max {
        return Err(format!(
            "{} value {value} out of range {}-{}",
            spec.name, spec.min, spec.max
        ));
    }
    Ok(value)
}

/// Parses one field into a bitmask. Returns the mask and whether the field
/// was restricted (did not start with `*`).
fn parse_field(raw: &str, spec: &FieldSpec) -> Result<(u64, bool), String> {
    let mut mask: u64 = 0;

    for part in raw.split(',') {
        if part.is_empty() {
            return Err(format!("empty entry in {} field", spec.name));
        }

        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("invalid step '{step}' in {} field", spec.name))?;
                if step == 0 || step > spec.max {
                    return Err(format!(
                        "step must be between 1 and {} in {} field",
                        spec.max, spec.name
                    ));
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (start, end) = if range == "*" {
            (spec.min, spec.max)
        } else if let Some((lo, hi)) = range.split_once('-') {
            let lo: u32 = parse_number(lo, spec)?;
            let hi: u32 = parse_number(hi, spec)?;
            if lo > hi {
                return Err(format!("descending range '{range}' in {} field", spec.name));
            }
            (lo, hi)
        } else {
            let value: u32 = parse_number(range, spec)?;
            // `5/15` means every 15 starting at 5
            if part.contains('/') { (value, spec.max) } else { (value, value) }
        };

        let mut value: u32 = start;
        while value <= end {
            mask |= 1 << value;
            match value.checked_add(step) {
                Some(next) => value = next,
                None => break,
            }
        }
    }

    Ok((mask, !raw.starts_with('*')))
}

impl FromStr for CronExpression {
    type Err = String;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let [minute, hour, dom, month, dow] = fields.as_slice() else {
            return Err(format!(
                "cron expression must have 5 fields, got {}",
                fields.len()
            ));
        };

        let (minutes, _) = parse_field(minute, &MINUTE)?;
        let (hours, _) = parse_field(hour, &HOUR)?;
        let (days_of_month, dom_restricted) = parse_field(dom, &DAY_OF_MONTH)?;
        let (months, _) = parse_field(month, &MONTH)?;
        let (mut days_of_week, dow_restricted) = parse_field(dow, &DAY_OF_WEEK)?;

        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            minutes,
            hours,
            days_of_month,
            months,
            days_of_week,
            dom_restricted,
            dow_restricted,
        })
    }
}

fn has(mask: u64, value: u32) -> bool {
    mask & (1 << value) != 0
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

impl CronExpression {
    fn day_matches(&self, at: &DateTime<Utc>) -> bool {
        let dom: bool = has(self.days_of_month, at.day());
        let dow: bool = has(self.days_of_week, at.weekday().num_days_from_sunday());

        // Both restricted: either may match
        match (self.dom_restricted, self.dow_restricted) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }

    pub fn matches(&self, at: &DateTime<Utc>) -> bool {
        has(self.months, at.month())
            && self.day_matches(at)
            && has(self.hours, at.hour())
            && has(self.minutes, at.minute())
    }

    /// First matching minute strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let truncated: DateTime<Utc> = after.with_second(0)?.with_nanosecond(0)?;
        let limit: DateTime<Utc> = truncated + Duration::days(SEARCH_HORIZON_DAYS);
        let mut t: DateTime<Utc> = truncated + Duration::minutes(1);

        while t <= limit {
            if !has(self.months, t.month()) {
                let (year, month) = if t.month() == 12 { (t.year() + 1, 1) } else { (t.year(), t.month() + 1) };
                t = start_of_day(NaiveDate::from_ymd_opt(year, month, 1)?)?;
                continue;
            }
            if !self.day_matches(&t) {
                t = start_of_day(t.date_naive().succ_opt()?)?;
                continue;
            }
            if !has(self.hours, t.hour()) {
                t = t.with_minute(0)? + Duration::hours(1);
                continue;
            }
            if !has(self.minutes, t.minute()) {
                t += Duration::minutes(1);
                continue;
            }
            return Some(t);
        }

        None
    }
}

// End of file: /src/services/scheduler/cron.rs
