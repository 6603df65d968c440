use chrono::{Datelike, NaiveDate};

use crate::config::ConfigError;
use crate::types::FiscalMonth;

/// Articles published after this day of the month count towards the next
/// month's bucket.
pub const DEFAULT_CUTOFF_DAY: u32 = 15;

/// Month boundaries shifted to a fixed cutoff day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalCalendar {
    cutoff_day: u32,
}

impl FiscalCalendar {
    /// A cutoff of 31 never rolls over and so yields plain calendar months.
    pub fn new(cutoff_day: u32) -> Result<Self, ConfigError> {
        if !(1..=31).contains(&cutoff_day) {
            return Err(ConfigError::CutoffDay(cutoff_day));
        }
        Ok(Self { cutoff_day })
    }

    pub fn cutoff_day(&self) -> u32 {
        self.cutoff_day
    }

    pub fn bucket_for(&self, date: NaiveDate) -> FiscalMonth {
        bucket_for(date, self.cutoff_day)
    }
}

impl Default for FiscalCalendar {
    fn default() -> Self {
        Self {
            cutoff_day: DEFAULT_CUTOFF_DAY,
        }
    }
}

pub fn bucket_for(date: NaiveDate, cutoff_day: u32) -> FiscalMonth {
    let month = FiscalMonth::of(date);
    if date.day() > cutoff_day {
        month.next()
    } else {
        month
    }
}
