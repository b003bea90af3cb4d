//! Text for the slots of the meetup page.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use crate::recurrence::{Occurrence, Resolution};

/// The texts describing a single meetup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySlots {
    /// e.g. `Feb`
    pub month_abbrev: String,
    /// e.g. `3`
    pub day: String,
    /// e.g. `Saturday`
    pub weekday: String,
    /// e.g. `8:00 AM - 10:00 AM`
    pub time_range: String,
    /// e.g. `Saturday, February 3, 2024 at 8:00 AM`
    pub long: String,
}

impl From<&Occurrence<'_>> for DisplaySlots {
    fn from(occurrence: &Occurrence) -> Self {
        let start = occurrence.start;
        DisplaySlots {
            month_abbrev: start.format("%b").to_string(),
            day: start.format("%-d").to_string(),
            weekday: start.format("%A").to_string(),
            time_range: format!(
                "{} - {}",
                format_time(start),
                format_time(occurrence.end)
            ),
            long: format!("{} at {}", start.format("%A, %B %-d, %Y"), format_time(start)),
        }
    }
}

/// Everything the page shows about the schedule.
///
/// The `cancelled` slots are only filled when the nearest meetup has been called off. Both are
/// empty when no meetup could be found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub next: Option<DisplaySlots>,
    pub cancelled: Option<DisplaySlots>,
}

impl From<&Resolution<'_>> for PageView {
    fn from(resolution: &Resolution) -> Self {
        PageView {
            next: resolution.next.as_ref().map(DisplaySlots::from),
            cancelled: resolution.cancelled.as_ref().map(DisplaySlots::from),
        }
    }
}

/// Format the time on a 12-hour clock, e.g. `7:30 AM`.
pub fn format_time(date_time: NaiveDateTime) -> String {
    let (pm, hour) = date_time.hour12();
    let period = if pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {period}", date_time.minute())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use crate::{
        cancellation::CancellationSet,
        config::MeetupConfig,
        display::{format_time, DisplaySlots, PageView},
        recurrence::{resolve_next, Resolution},
    };

    fn date_time(date_time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date_time, "%Y-%m-%dT%H:%M").unwrap()
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(date_time("2024-02-03T08:00")), "8:00 AM");
        assert_eq!(format_time(date_time("2024-02-20T07:30")), "7:30 AM");
        assert_eq!(format_time(date_time("2024-02-20T00:05")), "12:05 AM");
        assert_eq!(format_time(date_time("2024-02-20T12:00")), "12:00 PM");
        assert_eq!(format_time(date_time("2024-02-20T18:45")), "6:45 PM");
    }

    #[test]
    fn test_display_slots() {
        let config = MeetupConfig::default();
        let next = resolve_next(
            date_time("2024-01-20T12:00"),
            &config.rules,
            &CancellationSet::default(),
            3,
        )
        .next
        .unwrap();
        assert_eq!(
            DisplaySlots::from(&next),
            DisplaySlots {
                month_abbrev: String::from("Feb"),
                day: String::from("3"),
                weekday: String::from("Saturday"),
                time_range: String::from("8:00 AM - 10:00 AM"),
                long: String::from("Saturday, February 3, 2024 at 8:00 AM"),
            }
        );
    }

    #[test]
    fn test_page_view() {
        let config = MeetupConfig::default();
        let cancellations = [date_time("2024-02-03T00:00").date()].into_iter().collect();
        let resolution = resolve_next(
            date_time("2024-01-20T12:00"),
            &config.rules,
            &cancellations,
            3,
        );
        let view = PageView::from(&resolution);
        let cancelled = view.cancelled.unwrap();
        assert_eq!(cancelled.day, "3");
        assert_eq!(cancelled.weekday, "Saturday");
        let next = view.next.unwrap();
        assert_eq!(next.month_abbrev, "Feb");
        assert_eq!(next.day, "20");
        assert_eq!(next.weekday, "Tuesday");
        assert_eq!(next.time_range, "7:30 AM - 9:00 AM");

        let view = PageView::from(&resolve_next(
            date_time("2024-01-20T12:00"),
            &config.rules,
            &CancellationSet::default(),
            3,
        ));
        assert!(view.next.is_some());
        assert_eq!(view.cancelled, None);

        assert_eq!(PageView::from(&Resolution::default()), PageView::default());
    }
}
