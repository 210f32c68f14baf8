// libs/scheduling-cell/src/services/slots.rs
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc, Weekday};
use std::collections::HashSet;

/// First bookable hour of a business day.
pub const OPENING_HOUR: u32 = 8;
/// Last bookable hour of a business day, inclusive.
pub const CLOSING_HOUR: u32 = 15;

/// Drop minutes and below so hour-granularity equality works against the
/// calendar's booked set.
pub fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

fn is_business_day(day: NaiveDate) -> bool {
    !matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Enumerate the free hourly slots for one doctor over the rolling scheduling
/// horizon.
///
/// The horizon starts on `now`'s calendar date and ends just before the next
/// day sharing `now`'s weekday, i.e. seven calendar days. Only Monday-Friday
/// days contribute, each at hours `OPENING_HOUR..=CLOSING_HOUR`. A candidate
/// is dropped when it lies strictly before `now` or matches a booked
/// timestamp exactly.
///
/// Pure function of its inputs; the result is ascending and finite.
pub fn enumerate_free_slots(
    booked: &HashSet<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let start_date = now.date_naive();
    let anchor_weekday = start_date.weekday();

    let mut slots = Vec::new();
    let mut day = start_date;

    loop {
        // The horizon closes once the starting weekday comes around again.
        if day != start_date && day.weekday() == anchor_weekday {
            break;
        }

        if is_business_day(day) {
            for hour in OPENING_HOUR..=CLOSING_HOUR {
                let slot = day.and_hms_opt(hour, 0, 0).unwrap().and_utc();

                if slot < now || booked.contains(&slot) {
                    continue;
                }

                slots.push(slot);
            }
        }

        day += Duration::days(1);
    }

    slots
}
