//! This module reads the list of cancelled meetup dates.
//!
//! The list is a plain-text file with one `YYYY-MM-DD` date per line. Blank lines and lines
//! starting with `#` are ignored, anything else that is not a valid date is dropped.

use std::{
    collections::{btree_set, BTreeSet},
    path::PathBuf,
    sync::OnceLock,
};

use chrono::NaiveDate;
use log::{debug, warn};
use regex::Regex;
use tokio::fs::read_to_string;

use crate::{Error, Result};

static FORMAT: &str = "%Y-%m-%d";

/// The dates on which the meetup does not happen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancellationSet {
    dates: BTreeSet<NaiveDate>,
}

impl CancellationSet {
    /// Parse the cancellation list, dropping every line which is not a date.
    pub fn parse(text: &str) -> Self {
        let date_regex = date_regex();
        text.trim_start_matches('\u{feff}')
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let date = date_regex
                    .is_match(line)
                    .then(|| NaiveDate::parse_from_str(line, FORMAT).ok())
                    .flatten();
                if date.is_none() {
                    debug!("dropping malformed cancellation line {line:?}");
                }
                date
            })
            .collect()
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Iterate over the dates, earliest first.
    pub fn iter(&self) -> btree_set::Iter<'_, NaiveDate> {
        self.dates.iter()
    }
}

impl FromIterator<NaiveDate> for CancellationSet {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        CancellationSet {
            dates: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CancellationSet {
    type Item = &'a NaiveDate;
    type IntoIter = btree_set::Iter<'a, NaiveDate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Where the cancellation list is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationSource {
    Url(String),
    File(PathBuf),
}

impl From<&str> for CancellationSource {
    fn from(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            CancellationSource::Url(String::from(value))
        } else {
            CancellationSource::File(PathBuf::from(value))
        }
    }
}

/// Read and parse the cancellation list.
pub async fn fetch(source: &CancellationSource) -> Result<CancellationSet> {
    let text = match source {
        CancellationSource::Url(url) => get_response(url).await?,
        CancellationSource::File(path) => read_to_string(path).await?,
    };
    Ok(CancellationSet::parse(&text))
}

/// Read the cancellation list, falling back to an empty list on any error.
pub async fn load(source: Option<&CancellationSource>) -> CancellationSet {
    let Some(source) = source else {
        return CancellationSet::default();
    };
    match fetch(source).await {
        Ok(cancellations) => {
            debug!("{} cancelled dates read from {source:?}", cancellations.len());
            cancellations
        }
        Err(err) => {
            warn!("ignoring cancellations from {source:?}: {err}");
            CancellationSet::default()
        }
    }
}

/// Get the cancellation list from a web server.
async fn get_response(url: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(Error::Status(response.status()));
    }
    Ok(response.text().await?)
}

fn date_regex() -> &'static Regex {
    static DATE_REGEX: OnceLock<Regex> = OnceLock::new();
    DATE_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("the date pattern is valid")
    })
}
