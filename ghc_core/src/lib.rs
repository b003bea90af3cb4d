//! This crate computes the next "Guys Having Coffee" meetup and builds the calendar artifacts for it.
//!
//! The meetup happens on the 1st Saturday and the 3rd Tuesday of every month.
//! Single dates can be called off through a plain-text cancellation list.

pub use ical;

pub mod calendar;
pub mod cancellation;
pub mod config;
pub mod display;
pub mod error;
pub mod links;
pub mod recurrence;

pub use error::{Error, Result};
