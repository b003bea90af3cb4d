use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use ghc_core::{
    cancellation::CancellationSet,
    config::MeetupConfig,
    display::PageView,
    links::{calendar_links, CalendarLinks},
    recurrence::{resolve_next, Occurrence},
};
use log::warn;
use serde::Serialize;

use crate::state::AppState;

/// The next meetup as shown on the page.
#[derive(Debug, Serialize)]
pub struct NextMeetup<'a> {
    pub next: Option<Occurrence<'a>>,
    pub cancelled: Option<Occurrence<'a>>,
    pub display: PageView,
    pub links: Option<CalendarLinks>,
}

/// Resolve the next meetup, with the links read in the meetup's `timezone`.
pub fn handle<'a>(
    config: &'a MeetupConfig,
    timezone: Tz,
    now: NaiveDateTime,
    cancellations: &CancellationSet,
) -> NextMeetup<'a> {
    let resolution = resolve_next(now, &config.rules, cancellations, config.month_window);
    if resolution.next.is_none() {
        warn!("no meetup after {now} within {} months", config.month_window);
    }
    NextMeetup {
        next: resolution.next,
        cancelled: resolution.cancelled,
        display: PageView::from(&resolution),
        links: resolution
            .next
            .map(|next| calendar_links(config, &next, &timezone)),
    }
}

/// Handle requests for the next meetup.
///
/// Fields are `null` when there is no upcoming meetup.
pub async fn handler(State(state): State<AppState>) -> Response {
    let cancellations = state.cancellations().await;
    Json(handle(
        &state.config,
        state.timezone,
        state.now(),
        &cancellations,
    ))
    .into_response()
}
