use std::sync::Arc;

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use ghc_core::{
    cancellation::{self, CancellationSet, CancellationSource},
    config::{now_in, MeetupConfig},
    Result,
};

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<MeetupConfig>,
    pub timezone: Tz,
    cancellations: Option<CancellationSource>,
}

impl AppState {
    pub fn new(config: MeetupConfig, cancellations: Option<&str>) -> Result<Self> {
        let timezone = config.timezone()?;
        let cancellations = cancellations
            .or(config.cancellations.as_deref())
            .map(CancellationSource::from);
        Ok(AppState {
            config: Arc::new(config),
            timezone,
            cancellations,
        })
    }

    /// The current wall-clock time of the meetup.
    pub fn now(&self) -> NaiveDateTime {
        now_in(self.timezone)
    }

    /// Read the cancellation list, once per request.
    pub async fn cancellations(&self) -> CancellationSet {
        cancellation::load(self.cancellations.as_ref()).await
    }
}
