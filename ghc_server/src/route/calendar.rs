pub mod next;

use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{NaiveDateTime, Utc};
use ghc_core::{
    calendar, cancellation::CancellationSet, config::MeetupConfig, ical::generator::Emitter,
};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    /// comma separated ids of the rules to leave out
    #[serde(default)]
    exclude: Option<String>,
}

impl QueryParams {
    fn excluded_rules(&self) -> Vec<&str> {
        self.exclude
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect()
    }
}

/// Get the configuration with the excluded rules removed.
fn without_rules(
    config: &MeetupConfig,
    excluded_rules: &[&str],
) -> Result<MeetupConfig, (StatusCode, String)> {
    if let Some(unknown) = excluded_rules.iter().find(|id| config.rule(id).is_none()) {
        return Err((StatusCode::BAD_REQUEST, format!("unknown rule {unknown:?}")));
    }
    let mut config = config.clone();
    config
        .rules
        .retain(|rule| !excluded_rules.contains(&rule.id.as_str()));
    Ok(config)
}

/// Build the recurring feed.
pub fn handle(
    config: &MeetupConfig,
    query_params: &QueryParams,
    now: NaiveDateTime,
    cancellations: &CancellationSet,
) -> Result<String, (StatusCode, String)> {
    let config = without_rules(config, &query_params.excluded_rules())?;
    let ical_calendar = calendar::recurring_calendar(&config, now, cancellations, Utc::now());
    Ok(ical_calendar.generate())
}

/// Handle calendar feed requests.
///
/// Rules can be left out by giving their ids as `exclude` in the query string.
pub async fn handler(
    State(state): State<AppState>,
    Query(query_params): Query<QueryParams>,
) -> Result<Response, (StatusCode, String)> {
    let cancellations = state.cancellations().await;
    let ics = handle(
        &state.config,
        &query_params,
        state.now(),
        &cancellations,
    )?;
    let response = ([(CONTENT_TYPE, "text/calendar")], ics).into_response();
    Ok(response)
}
