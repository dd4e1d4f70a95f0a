use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Image-search calls made on `date`. Stored as `{"date": "YYYY-MM-DD", "count": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub date: NaiveDate,
    pub count: u32,
}

impl UsageRecord {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            date: today,
            count: 0,
        }
    }

    /// The record as it applies to `today`: a record from another day counts as zero.
    pub fn for_day(self, today: NaiveDate) -> Self {
        if self.date == today {
            self
        } else {
            Self::fresh(today)
        }
    }
}
