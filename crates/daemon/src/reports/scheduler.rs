use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Longest DST gap searched for the first valid local instant.
const MAX_GAP_MINUTES: i64 = 180;

pub fn parse_report_time(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
}

/// Next instant strictly after `now` at which the local clock in `timezone`
/// reads `at`. A time skipped by a DST change fires at the first valid
/// instant after it.
pub fn next_run(now: DateTime<Utc>, at: NaiveTime, timezone: Tz) -> DateTime<Utc> {
    let today = now.with_timezone(&timezone).date_naive();
    for offset in 0..=2 {
        let Some(day) = today.checked_add_days(Days::new(offset)) else {
            break;
        };
        if let Some(candidate) = local_instant(day, at, timezone) {
            if candidate > now {
                return candidate;
            }
        }
    }
    now + Duration::days(1)
}

fn local_instant(day: NaiveDate, at: NaiveTime, timezone: Tz) -> Option<DateTime<Utc>> {
    (0..=MAX_GAP_MINUTES).find_map(|minutes| {
        let local = day.and_time(at) + Duration::minutes(minutes);
        // ambiguous times fire on their first occurrence
        timezone
            .from_local_datetime(&local)
            .earliest()
            .map(|instant| instant.with_timezone(&Utc))
    })
}

/// Calendar day in `timezone`, shifted by `day_offset` days.
pub fn local_day(
    now: DateTime<Utc>,
    timezone: Tz,
    day_offset: i64,
) -> Result<time::Date, time::error::ComponentRange> {
    let day = now.with_timezone(&timezone).date_naive() + Duration::days(day_offset);
    time::Date::from_calendar_date(
        day.year(),
        time::Month::try_from(day.month() as u8)?,
        day.day() as u8,
    )
}

pub fn local_hour(now: DateTime<Utc>, timezone: Tz) -> u8 {
    now.with_timezone(&timezone).hour() as u8
}
