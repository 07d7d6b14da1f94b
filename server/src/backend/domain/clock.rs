//! Resolution of "today" for time-relative views.
//!
//! Aggregation functions never read the clock themselves; the REST layer asks
//! the configured [`CalendarTimezone`] for today's date and passes it down.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which wall clock decides where a calendar month starts and ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarTimezone {
    /// The server's local time zone
    #[default]
    Local,
    Utc,
}

impl CalendarTimezone {
    pub fn today(&self) -> NaiveDate {
        match self {
            CalendarTimezone::Local => chrono::Local::now().date_naive(),
            CalendarTimezone::Utc => chrono::Utc::now().date_naive(),
        }
    }
}
