//! This module builds the iCalendar files of the meetup.
//!
//! There are two kinds: a download for a single occurrence, and a feed with one recurring event per
//! rule which calendar applications can subscribe to.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use ical::{
    generator::{IcalCalendar, IcalCalendarBuilder, IcalEvent, IcalEventBuilder, Property},
    ical_param, ical_property,
};

use crate::{
    cancellation::CancellationSet,
    config::{MeetupConfig, RecurrenceRule},
    recurrence::{generate_candidates, nth_weekday_of_month, Occurrence},
};

static FORMAT: &str = "%Y%m%dT%H%M%S";
static STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
static STATUS: &str = "CONFIRMED";

/// The file name offered for the download of a single occurrence.
pub static OCCURRENCE_FILE_NAME: &str = "guys-having-coffee-meetup.ics";
/// The file name of the recurring feed.
pub static RECURRING_FILE_NAME: &str = "guys-having-coffee.ics";

/// Build a calendar containing just the given occurrence.
pub fn occurrence_calendar(
    config: &MeetupConfig,
    occurrence: &Occurrence,
    stamp: DateTime<Utc>,
) -> IcalCalendar {
    let mut calendar = new_calendar(config);
    let uid = uid(
        config,
        &format!("{}-{}", occurrence.rule.id, occurrence.date.format("%Y%m%d")),
    );
    calendar
        .events
        .push(get_event(config, occurrence, uid, stamp, vec![]));
    calendar
}

/// Build a calendar with one monthly recurring event per rule.
///
/// Each event starts with the rule's first occurrence after `now`, cancelled dates of the rule
/// become exception dates. Rules without an occurrence in the search window are left out.
pub fn recurring_calendar(
    config: &MeetupConfig,
    now: NaiveDateTime,
    cancellations: &CancellationSet,
    stamp: DateTime<Utc>,
) -> IcalCalendar {
    let mut calendar = new_calendar(config);
    let candidates = generate_candidates(now, &config.rules, config.month_window);
    for rule in &config.rules {
        let Some(first) = candidates.iter().find(|occurrence| occurrence.rule == rule) else {
            continue;
        };
        let mut properties = vec![ical_property!("RRULE", rrule(rule))];
        let exception_dates: Vec<String> = cancellations
            .iter()
            .filter(|date| **date >= first.date && is_occurrence_of(rule, date))
            .map(|date| date.and_time(rule.start_time).format(FORMAT).to_string())
            .collect();
        if !exception_dates.is_empty() {
            properties.push(ical_property!(
                "EXDATE",
                exception_dates.join(","),
                ical_param!("TZID", &config.timezone_id)
            ));
        }
        calendar
            .events
            .push(get_event(config, first, uid(config, &rule.id), stamp, properties));
    }
    calendar
}

/// The recurrence rule of a meetup rule, e.g. `FREQ=MONTHLY;BYDAY=1SA` for the first Saturday.
pub fn rrule(rule: &RecurrenceRule) -> String {
    format!(
        "FREQ=MONTHLY;BYDAY={}{}",
        rule.occurrence,
        weekday_code(rule.weekday)
    )
}

fn new_calendar(config: &MeetupConfig) -> IcalCalendar {
    IcalCalendarBuilder::version("2.0")
        .gregorian()
        .prodid(config.prod_id())
        .build()
}

/// Build an event for an occurrence with the fixed meetup texts.
fn get_event(
    config: &MeetupConfig,
    occurrence: &Occurrence,
    uid: String,
    stamp: DateTime<Utc>,
    properties: Vec<Property>,
) -> IcalEvent {
    let mut builder = IcalEventBuilder::tzid(&config.timezone_id)
        .uid(uid)
        .changed(stamp.format(STAMP_FORMAT).to_string())
        .start(occurrence.start.format(FORMAT).to_string())
        .end(occurrence.end.format(FORMAT).to_string())
        .set(ical_property!("SUMMARY", escape_text(&config.title)))
        .set(ical_property!(
            "DESCRIPTION",
            escape_text(&config.description)
        ))
        .set(ical_property!("LOCATION", escape_text(&config.location)))
        .set(ical_property!("STATUS", STATUS));
    for property in properties {
        builder = builder.set(property);
    }
    builder.build()
}

/// Check whether a date is one the rule produces.
fn is_occurrence_of(rule: &RecurrenceRule, date: &NaiveDate) -> bool {
    nth_weekday_of_month(date.year(), date.month0(), rule.weekday, rule.occurrence)
        .is_some_and(|occurrence_date| occurrence_date == *date)
}

/// Get a unique id for an event of the meetup.
///
/// Changing this function is a breaking change!
fn uid(config: &MeetupConfig, name: &str) -> String {
    format!("{name}@{}", config.uid_domain)
}

fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Escape a value of the iCalendar `TEXT` type.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(character),
        }
    }
    escaped
}
