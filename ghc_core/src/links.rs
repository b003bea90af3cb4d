//! Links which open the meetup in the web interfaces of calendar services.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use reqwest::Url;
use serde::Serialize;

use crate::{calendar::rrule, config::MeetupConfig, recurrence::Occurrence};

static GOOGLE_URL: &str = "https://calendar.google.com/calendar/render";
static OUTLOOK_URL: &str = "https://outlook.live.com/calendar/0/deeplink/compose";
static OFFICE365_URL: &str = "https://outlook.office.com/calendar/0/deeplink/compose";
static GOOGLE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarLinks {
    pub google: String,
    pub outlook: String,
    pub office365: String,
}

/// Build the links for an occurrence whose wall clock is read in `timezone`.
pub fn calendar_links<Tz: TimeZone>(
    config: &MeetupConfig,
    occurrence: &Occurrence,
    timezone: &Tz,
) -> CalendarLinks {
    let start = to_utc(occurrence.start, timezone);
    let end = to_utc(occurrence.end, timezone);
    CalendarLinks {
        google: google_url(config, occurrence, start, end),
        outlook: outlook_url(OUTLOOK_URL, config, start, end),
        office365: outlook_url(OFFICE365_URL, config, start, end),
    }
}

fn google_url(
    config: &MeetupConfig,
    occurrence: &Occurrence,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    let dates = format!(
        "{}/{}",
        start.format(GOOGLE_FORMAT),
        end.format(GOOGLE_FORMAT)
    );
    let recur = format!("RRULE:{}", rrule(occurrence.rule));
    with_params(
        GOOGLE_URL,
        &[
            ("action", "TEMPLATE"),
            ("text", config.title.as_str()),
            ("dates", dates.as_str()),
            ("details", config.description.as_str()),
            ("location", config.location.as_str()),
            ("recur", recur.as_str()),
        ],
    )
}

fn outlook_url(
    base: &str,
    config: &MeetupConfig,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    let start = start.to_rfc3339_opts(SecondsFormat::Millis, true);
    let end = end.to_rfc3339_opts(SecondsFormat::Millis, true);
    with_params(
        base,
        &[
            ("subject", config.title.as_str()),
            ("startdt", start.as_str()),
            ("enddt", end.as_str()),
            ("body", config.description.as_str()),
            ("location", config.location.as_str()),
        ],
    )
}

fn with_params(base: &str, params: &[(&str, &str)]) -> String {
    let mut url = Url::parse(base).expect("the calendar service URLs are valid");
    url.query_pairs_mut().extend_pairs(params);
    url.to_string()
}

/// Convert a wall clock time to UTC.
///
/// A time which is ambiguous in `timezone` resolves to its earlier instant. A time which does not
/// exist there is taken as UTC.
pub fn to_utc<Tz: TimeZone>(local: NaiveDateTime, timezone: &Tz) -> DateTime<Utc> {
    timezone
        .from_local_datetime(&local)
        .earliest()
        .map(|date_time| date_time.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}
