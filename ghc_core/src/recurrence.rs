//! This module finds the concrete dates of the recurring meetup and picks the next one.
//!
//! All functions are pure: the reference instant is always passed in, nothing is cached.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use log::debug;
use serde::Serialize;

use crate::{cancellation::CancellationSet, config::RecurrenceRule};

/// A concrete meetup produced by a rule for a specific month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence<'a> {
    pub rule: &'a RecurrenceRule,
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl<'a> Occurrence<'a> {
    fn new(rule: &'a RecurrenceRule, date: NaiveDate) -> Self {
        Occurrence {
            rule,
            date,
            start: date.and_time(rule.start_time),
            end: date.and_time(rule.end_time),
        }
    }
}

/// The outcome of looking for the next meetup.
///
/// `cancelled` is only set when the nearest meetup has been called off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Resolution<'a> {
    pub cancelled: Option<Occurrence<'a>>,
    pub next: Option<Occurrence<'a>>,
}

/// Get the `occurrence`-th `weekday` of a month.
///
/// `month0` starts at `0` for January. Returns `None` when the month has no such day, e.g. for a
/// fifth Saturday, instead of spilling into the following month.
pub fn nth_weekday_of_month(
    year: i32,
    month0: u32,
    weekday: Weekday,
    occurrence: u32,
) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month0.checked_add(1)?, 1)?;
    let offset = (weekday.num_days_from_sunday() + 7 - first.weekday().num_days_from_sunday()) % 7;
    let weeks = occurrence.checked_sub(1)?.checked_mul(7)?;
    first.with_day(weeks.checked_add(1 + offset)?)
}

/// Get the occurrences of all rules in `month_window` months starting with the month of `now`.
///
/// Only occurrences starting strictly after `now` are kept. The result is ordered month by month
/// and rule by rule, not by start.
pub fn generate_candidates<'a>(
    now: NaiveDateTime,
    rules: &'a [RecurrenceRule],
    month_window: u32,
) -> Vec<Occurrence<'a>> {
    let first_month = now.year() * 12 + now.month0() as i32;
    (0..month_window)
        .map_while(|offset| first_month.checked_add(i32::try_from(offset).ok()?))
        .flat_map(|month| {
            let (year, month0) = (month.div_euclid(12), month.rem_euclid(12) as u32);
            rules.iter().filter_map(move |rule| {
                let Some(date) =
                    nth_weekday_of_month(year, month0, rule.weekday, rule.occurrence)
                else {
                    debug!("rule {} has no occurrence in {year}-{:02}", rule.id, month0 + 1);
                    return None;
                };
                Some(Occurrence::new(rule, date))
            })
        })
        .filter(|occurrence| occurrence.start > now)
        .collect()
}

/// Find the next meetup after `now`, skipping cancelled dates.
///
/// If the nearest meetup is cancelled it is reported as such and the next one that is not
/// cancelled is searched for in the rest of the window.
pub fn resolve_next<'a>(
    now: NaiveDateTime,
    rules: &'a [RecurrenceRule],
    cancellations: &CancellationSet,
    month_window: u32,
) -> Resolution<'a> {
    let candidates = sorted_candidates(now, rules, month_window);
    let Some(earliest) = candidates.first().copied() else {
        return Resolution::default();
    };
    if !cancellations.contains(&earliest.date) {
        return Resolution {
            cancelled: None,
            next: Some(earliest),
        };
    }
    let next = candidates
        .iter()
        .skip(1)
        .find(|occurrence| !cancellations.contains(&occurrence.date))
        .copied();
    Resolution {
        cancelled: Some(earliest),
        next,
    }
}

/// Get all meetups after `now` in the window which are not cancelled, earliest first.
pub fn upcoming<'a>(
    now: NaiveDateTime,
    rules: &'a [RecurrenceRule],
    cancellations: &CancellationSet,
    month_window: u32,
) -> Vec<Occurrence<'a>> {
    let mut candidates = sorted_candidates(now, rules, month_window);
    candidates.retain(|occurrence| !cancellations.contains(&occurrence.date));
    candidates
}

fn sorted_candidates<'a>(
    now: NaiveDateTime,
    rules: &'a [RecurrenceRule],
    month_window: u32,
) -> Vec<Occurrence<'a>> {
    let mut candidates = generate_candidates(now, rules, month_window);
    candidates.sort_by_key(|occurrence| occurrence.start);
    candidates
}
