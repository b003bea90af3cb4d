use std::{env::current_dir, fs::write, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::{builder::RangedU64ValueParser, Parser, Subcommand};
use ghc_core::{
    calendar::{self, OCCURRENCE_FILE_NAME, RECURRING_FILE_NAME},
    cancellation::{self, CancellationSet, CancellationSource},
    config::{now_in, MeetupConfig},
    display::{DisplaySlots, PageView},
    ical::generator::Emitter,
    links::calendar_links,
    recurrence::{resolve_next, upcoming, Resolution},
};
use log::{info, warn};
use tracing_subscriber::EnvFilter;

static NOW_FORMAT: &str = "%Y-%m-%dT%H:%M";
static NOTHING_FOUND: &str = "No upcoming meetup found.";

/// Find the next "Guys Having Coffee" meetup and add it to your calendar.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Arguments {
    /// the TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// the URL or file of the cancellation list, overriding the configuration
    #[arg(long, global = true)]
    pub cancellations: Option<String>,
    /// look for meetups after this wall-clock time (YYYY-MM-DDTHH:MM) instead of now
    #[arg(long, global = true, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// print the next meetup
    Next {
        /// the number of meetups to list
        #[arg(
            long,
            default_value_t = 1,
            value_parser = RangedU64ValueParser::<usize>::new().range(1..)
        )]
        count: usize,
    },
    /// write an iCalendar file
    Ics {
        /// write the recurring feed instead of the next meetup only
        #[arg(long)]
        recurring: bool,
        /// the file to write, defaults to the current directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// print links adding the next meetup to web calendars
    Links,
}

fn parse_now(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, NOW_FORMAT)
        .map_err(|err| format!("expected YYYY-MM-DDTHH:MM: {err}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Arguments::parse();
    let config = match &args.config {
        Some(path) => MeetupConfig::load(path)
            .with_context(|| format!("could not load configuration {}", path.display()))?,
        None => MeetupConfig::default(),
    };
    let source = args
        .cancellations
        .as_deref()
        .or(config.cancellations.as_deref())
        .map(CancellationSource::from);
    let timezone = config.timezone()?;
    let cancellations = cancellation::load(source.as_ref()).await;
    let now = args.now.unwrap_or_else(|| now_in(timezone));
    match args.command {
        Command::Next { count } => {
            println!("{}", describe(&config, now, &cancellations, count))
        }
        Command::Ics { recurring, output } => {
            write_ics(&config, now, &cancellations, recurring, output)?
        }
        Command::Links => println!(
            "{}",
            describe_links(&config, timezone, now, &cancellations)
        ),
    };
    Ok(())
}

/// Describe the next `count` meetups, mentioning a cancelled one first.
fn describe(
    config: &MeetupConfig,
    now: NaiveDateTime,
    cancellations: &CancellationSet,
    count: usize,
) -> String {
    let resolution = resolve_next(now, &config.rules, cancellations, config.month_window);
    let view = PageView::from(&resolution);
    let mut lines = vec![];
    if let Some(cancelled) = &view.cancelled {
        lines.push(format!("Cancelled: {}", cancelled.long));
    }
    let Some(next) = &view.next else {
        warn!("no meetup after {now} within {} months", config.month_window);
        lines.push(String::from(NOTHING_FOUND));
        return lines.join("\n");
    };
    if count == 1 {
        lines.push(format!("Next meetup: {}", describe_slots(next)));
    } else {
        lines.push(String::from("Upcoming meetups:"));
        lines.extend(
            upcoming(now, &config.rules, cancellations, config.month_window)
                .iter()
                .take(count)
                .map(|occurrence| format!("  {}", describe_slots(&DisplaySlots::from(occurrence)))),
        );
    }
    lines.push(format!("Location: {}", config.location));
    lines.join("\n")
}

fn describe_slots(slots: &DisplaySlots) -> String {
    format!(
        "{} {} {} ({}, {})",
        slots.weekday, slots.month_abbrev, slots.day, slots.time_range, slots.long
    )
}

fn describe_links(
    config: &MeetupConfig,
    timezone: Tz,
    now: NaiveDateTime,
    cancellations: &CancellationSet,
) -> String {
    let Resolution { next, .. } =
        resolve_next(now, &config.rules, cancellations, config.month_window);
    let Some(next) = next else {
        warn!("no meetup after {now} to link to");
        return String::from(NOTHING_FOUND);
    };
    let links = calendar_links(config, &next, &timezone);
    format!(
        "Google Calendar: {}\nOutlook.com: {}\nOffice 365: {}",
        links.google, links.outlook, links.office365
    )
}

/// Write the next meetup or the recurring feed to an iCalendar file.
fn write_ics(
    config: &MeetupConfig,
    now: NaiveDateTime,
    cancellations: &CancellationSet,
    recurring: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let stamp = Utc::now();
    let (calendar, file_name) = if recurring {
        (
            calendar::recurring_calendar(config, now, cancellations, stamp),
            RECURRING_FILE_NAME,
        )
    } else {
        let Some(next) =
            resolve_next(now, &config.rules, cancellations, config.month_window).next
        else {
            warn!("no meetup after {now}, nothing written");
            println!("{NOTHING_FOUND}");
            return Ok(());
        };
        (
            calendar::occurrence_calendar(config, &next, stamp),
            OCCURRENCE_FILE_NAME,
        )
    };
    let path = match output {
        Some(path) => path,
        None => {
            let mut path = current_dir()?;
            path.push(file_name);
            path
        }
    };
    write(&path, calendar.generate())?;
    info!("calendar written to {}", path.display());
    Ok(())
}
