//! The immutable meetup configuration.
//!
//! Every field has a default, so a configuration file only needs to name what differs from the
//! regular "Guys Having Coffee" schedule.

use std::{collections::HashSet, fs::read_to_string, path::Path};

use chrono::{NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

static TITLE: &str = "Guys Having Coffee";
static DESCRIPTION: &str =
    "Casual coffee meetup for men. Low effort, no commitment, no expectations.";
static LOCATION: &str = "Black & Brew @ the Library, 100 Lake Morton Dr, Lakeland, FL 33801";
static UID_DOMAIN: &str = "guyshavingcoffee.com";
static TIMEZONE: &str = "America/New_York";
static TIME_FORMAT: &str = "%H:%M";

/// The number of months searched for the next occurrence, starting with the current one.
pub const DEFAULT_MONTH_WINDOW: u32 = 3;
/// The largest accepted month window, ten years.
pub const MAX_MONTH_WINDOW: u32 = 120;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeetupConfig {
    pub title: String,
    pub description: String,
    pub location: String,
    /// the domain appended to the ICS UIDs
    pub uid_domain: String,
    /// the IANA timezone the meetup times are written in, used as the ICS `TZID`
    pub timezone_id: String,
    pub month_window: u32,
    pub rules: Vec<RecurrenceRule>,
    /// a URL or file path of the cancellation list
    pub cancellations: Option<String>,
}

impl Default for MeetupConfig {
    fn default() -> Self {
        MeetupConfig {
            title: String::from(TITLE),
            description: String::from(DESCRIPTION),
            location: String::from(LOCATION),
            uid_domain: String::from(UID_DOMAIN),
            timezone_id: String::from(TIMEZONE),
            month_window: DEFAULT_MONTH_WINDOW,
            rules: vec![
                RecurrenceRule {
                    id: String::from("first-saturday"),
                    weekday: Weekday::Sat,
                    occurrence: 1,
                    start_time: hm(8, 0),
                    end_time: hm(10, 0),
                },
                RecurrenceRule {
                    id: String::from("third-tuesday"),
                    weekday: Weekday::Tue,
                    occurrence: 3,
                    start_time: hm(7, 30),
                    end_time: hm(9, 0),
                },
            ],
            cancellations: None,
        }
    }
}

impl MeetupConfig {
    /// Parse a TOML configuration, filling everything missing with the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: MeetupConfig = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&read_to_string(path)?)
    }

    /// The `PRODID` of the generated calendars.
    pub fn prod_id(&self) -> String {
        format!("-//{}//Event//EN", self.title)
    }

    /// The timezone the meetup times are read in.
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone_id
            .parse()
            .map_err(|_| Error::Config(format!("unknown timezone {:?}", self.timezone_id)))
    }

    /// Find a rule by its id.
    pub fn rule(&self, id: &str) -> Option<&RecurrenceRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_MONTH_WINDOW).contains(&self.month_window) {
            return Err(Error::Config(format!(
                "month_window must be 1 to {MAX_MONTH_WINDOW}, got {}",
                self.month_window
            )));
        }
        self.timezone()?;
        let mut ids = HashSet::new();
        for rule in &self.rules {
            if !ids.insert(rule.id.as_str()) {
                return Err(Error::Config(format!("duplicate rule id {:?}", rule.id)));
            }
        }
        Ok(())
    }
}

/// A monthly schedule: the `occurrence`-th `weekday` of every month between two times of day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RuleDefinition", into = "RuleDefinition")]
pub struct RecurrenceRule {
    /// a stable slug, part of the ICS UID
    pub id: String,
    pub weekday: Weekday,
    pub occurrence: u32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// The shape of a rule in the configuration file.
///
/// The weekday is a number with Sunday being `0` and Saturday being `6`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDefinition {
    id: String,
    weekday: u8,
    occurrence: u32,
    start: String,
    end: String,
}

impl TryFrom<RuleDefinition> for RecurrenceRule {
    type Error = Error;

    fn try_from(definition: RuleDefinition) -> Result<Self> {
        let id = definition.id.trim();
        if id.is_empty() || id.contains(char::is_whitespace) {
            return Err(Error::Config(format!("invalid rule id {:?}", definition.id)));
        }
        let weekday = weekday_from_sunday(definition.weekday).ok_or_else(|| {
            Error::Config(format!(
                "rule {id}: weekday must be 0 (Sunday) to 6 (Saturday), got {}",
                definition.weekday
            ))
        })?;
        if !(1..=5).contains(&definition.occurrence) {
            return Err(Error::Config(format!(
                "rule {id}: occurrence must be 1 to 5, got {}",
                definition.occurrence
            )));
        }
        let parse_time = |time: &str| {
            NaiveTime::parse_from_str(time.trim(), TIME_FORMAT).map_err(|_| {
                Error::Config(format!("rule {id}: time {time:?} is not in HH:MM format"))
            })
        };
        let start_time = parse_time(&definition.start)?;
        let end_time = parse_time(&definition.end)?;
        if end_time <= start_time {
            return Err(Error::Config(format!(
                "rule {id}: end {end_time} is not after start {start_time}"
            )));
        }
        Ok(RecurrenceRule {
            id: String::from(id),
            weekday,
            occurrence: definition.occurrence,
            start_time,
            end_time,
        })
    }
}

impl From<RecurrenceRule> for RuleDefinition {
    fn from(rule: RecurrenceRule) -> Self {
        RuleDefinition {
            weekday: rule.weekday.num_days_from_sunday() as u8,
            occurrence: rule.occurrence,
            start: rule.start_time.format(TIME_FORMAT).to_string(),
            end: rule.end_time.format(TIME_FORMAT).to_string(),
            id: rule.id,
        }
    }
}

/// The current wall-clock time in `timezone`.
pub fn now_in(timezone: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&timezone).naive_local()
}

/// Map `0` (Sunday) to `6` (Saturday) to a weekday.
pub fn weekday_from_sunday(number: u8) -> Option<Weekday> {
    match number {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("the default times are valid")
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveTime, Utc, Weekday};
    use chrono_tz::Tz;

    use crate::{
        config::{
            now_in, weekday_from_sunday, MeetupConfig, DEFAULT_MONTH_WINDOW, MAX_MONTH_WINDOW,
        },
        Error,
    };

    #[test]
    fn test_default() {
        let config = MeetupConfig::default();
        assert_eq!(config.month_window, DEFAULT_MONTH_WINDOW);
        assert_eq!(config.rules.len(), 2);
        let saturday = config.rule("first-saturday").unwrap();
        assert_eq!(saturday.weekday, Weekday::Sat);
        assert_eq!(saturday.occurrence, 1);
        assert_eq!(saturday.start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(saturday.end_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        let tuesday = config.rule("third-tuesday").unwrap();
        assert_eq!(tuesday.weekday, Weekday::Tue);
        assert_eq!(tuesday.occurrence, 3);
        assert_eq!(tuesday.start_time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(config.prod_id(), "-//Guys Having Coffee//Event//EN");
        assert_eq!(config.timezone().unwrap(), Tz::America__New_York);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = MeetupConfig::from_toml_str("").unwrap();
        assert_eq!(config, MeetupConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        let config = MeetupConfig::from_toml_str(
            r#"
            title = "Coffee"
            month_window = 6
            cancellations = "https://example.org/cancellations.txt"

            [[rules]]
            id = "second-friday"
            weekday = 5
            occurrence = 2
            start = "18:15"
            end = "20:00"
            "#,
        )
        .unwrap();
        assert_eq!(config.title, "Coffee");
        assert_eq!(config.location, MeetupConfig::default().location);
        assert_eq!(config.month_window, 6);
        assert_eq!(
            config.cancellations.as_deref(),
            Some("https://example.org/cancellations.txt")
        );
        assert_eq!(config.rules.len(), 1);
        let rule = &config.rules[0];
        assert_eq!(rule.weekday, Weekday::Fri);
        assert_eq!(rule.occurrence, 2);
        assert_eq!(rule.start_time, NaiveTime::from_hms_opt(18, 15, 0).unwrap());
        assert_eq!(rule.end_time, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
    }

    fn rule_error(rule: &str) -> String {
        let toml = format!("[[rules]]\n{rule}");
        match MeetupConfig::from_toml_str(&toml) {
            Err(Error::Toml(err)) => err.to_string(),
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_rules() {
        let error = rule_error(r#"id = "a"
weekday = 7
occurrence = 1
start = "08:00"
end = "09:00""#);
        assert!(error.contains("weekday must be 0 (Sunday) to 6 (Saturday)"));
        let error = rule_error(r#"id = "a"
weekday = 6
occurrence = 0
start = "08:00"
end = "09:00""#);
        assert!(error.contains("occurrence must be 1 to 5"));
        let error = rule_error(r#"id = "a"
weekday = 6
occurrence = 6
start = "08:00"
end = "09:00""#);
        assert!(error.contains("occurrence must be 1 to 5"));
        let error = rule_error(r#"id = "a"
weekday = 6
occurrence = 1
start = "8 o'clock"
end = "09:00""#);
        assert!(error.contains("HH:MM"));
        let error = rule_error(r#"id = "a"
weekday = 6
occurrence = 1
start = "09:00"
end = "09:00""#);
        assert!(error.contains("is not after start"));
        let error = rule_error(r#"id = "two words"
weekday = 6
occurrence = 1
start = "08:00"
end = "09:00""#);
        assert!(error.contains("invalid rule id"));
    }

    #[test]
    fn test_duplicate_rule_ids() {
        let rule = r#"
            [[rules]]
            id = "same"
            weekday = 6
            occurrence = 1
            start = "08:00"
            end = "10:00"
        "#;
        let result = MeetupConfig::from_toml_str(&format!("{rule}{rule}"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_month_window_bounds() {
        for window in ["0", "121", "4294967295"] {
            let result = MeetupConfig::from_toml_str(&format!("month_window = {window}"));
            assert!(
                matches!(result, Err(Error::Config(_))),
                "month_window = {window} was accepted"
            );
        }
        let config = MeetupConfig::from_toml_str("month_window = 1").unwrap();
        assert_eq!(config.month_window, 1);
        let config =
            MeetupConfig::from_toml_str(&format!("month_window = {MAX_MONTH_WINDOW}")).unwrap();
        assert_eq!(config.month_window, MAX_MONTH_WINDOW);
    }

    #[test]
    fn test_timezone() {
        let config = MeetupConfig::from_toml_str("timezone_id = \"Europe/Berlin\"").unwrap();
        assert_eq!(config.timezone().unwrap(), Tz::Europe__Berlin);
        let result = MeetupConfig::from_toml_str("timezone_id = \"Mars/Olympus_Mons\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_now_in() {
        let utc = Utc::now().naive_utc();
        assert!((now_in(Tz::UTC) - utc).abs() < Duration::minutes(1));
        // Kolkata has no daylight saving time.
        let kolkata = now_in(Tz::Asia__Kolkata) - utc;
        assert!((kolkata - Duration::minutes(330)).abs() < Duration::minutes(1));
    }

    #[test]
    fn test_example_file() {
        let config = MeetupConfig::from_toml_str(include_str!("../../ghc.example.toml")).unwrap();
        assert_eq!(
            config,
            MeetupConfig {
                cancellations: Some(String::from("public/cancellations.txt")),
                ..MeetupConfig::default()
            }
        );
    }

    #[test]
    fn test_unknown_field() {
        let result = MeetupConfig::from_toml_str("colour = \"brown\"");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_weekday_from_sunday() {
        assert_eq!(weekday_from_sunday(0), Some(Weekday::Sun));
        assert_eq!(weekday_from_sunday(2), Some(Weekday::Tue));
        assert_eq!(weekday_from_sunday(6), Some(Weekday::Sat));
        assert_eq!(weekday_from_sunday(7), None);
    }
}
