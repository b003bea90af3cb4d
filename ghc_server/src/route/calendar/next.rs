use axum::{
    extract::State,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
};
use chrono::{NaiveDateTime, Utc};
use ghc_core::{
    calendar::{self, OCCURRENCE_FILE_NAME},
    cancellation::CancellationSet,
    config::MeetupConfig,
    ical::generator::Emitter,
    recurrence::resolve_next,
};
use log::warn;

use crate::state::AppState;

/// Build the download of the next meetup.
pub fn handle(
    config: &MeetupConfig,
    now: NaiveDateTime,
    cancellations: &CancellationSet,
) -> Result<String, (StatusCode, String)> {
    let resolution = resolve_next(now, &config.rules, cancellations, config.month_window);
    let Some(next) = resolution.next else {
        warn!("no meetup after {now} within {} months", config.month_window);
        return Err((StatusCode::NOT_FOUND, String::from("no upcoming meetup")));
    };
    Ok(calendar::occurrence_calendar(config, &next, Utc::now()).generate())
}

/// Handle download requests for the next meetup.
pub async fn handler(State(state): State<AppState>) -> Result<Response, (StatusCode, String)> {
    let cancellations = state.cancellations().await;
    let ics = handle(&state.config, state.now(), &cancellations)?;
    let disposition = format!("attachment; filename=\"{OCCURRENCE_FILE_NAME}\"");
    let response = (
        [
            (CONTENT_TYPE, "text/calendar"),
            (CONTENT_DISPOSITION, disposition.as_str()),
        ],
        ics,
    )
        .into_response();
    Ok(response)
}
