pub mod calendar;
pub mod next;
