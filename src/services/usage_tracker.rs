//! Daily quota for outbound image-search calls.
//!
//! The counter lives in a small JSON file so it survives restarts. Reads fail
//! open: a missing or broken file means "nothing used today". Checks and
//! commits go through one async gate, and reservations that have not been
//! committed yet count against the ceiling, so concurrent requests in this
//! process cannot push the count past the limit.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU32, Ordering},
};

use chrono::{Local, NaiveDate};
use log::{debug, error, info};
use tokio::sync::Mutex;

use crate::{error::UsageError, models::usage::UsageRecord};

/// Returned when today's ceiling has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaExceeded {
    pub limit: u32,
}

pub struct UsageTracker {
    path: PathBuf,
    daily_limit: u32,
    gate: Mutex<()>,
    in_flight: AtomicU32,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl UsageTracker {
    pub fn new(path: impl Into<PathBuf>, daily_limit: u32) -> Self {
        Self::with_clock(path, daily_limit, local_today)
    }

    pub fn with_clock(path: impl Into<PathBuf>, daily_limit: u32, today: fn() -> NaiveDate) -> Self {
        Self {
            path: path.into(),
            daily_limit,
            gate: Mutex::new(()),
            in_flight: AtomicU32::new(0),
            today,
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored record. Never fails; unreadable storage reads as a fresh day.
    pub async fn read(&self) -> UsageRecord {
        let today = (self.today)();
        match load(&self.path).await {
            Ok(record) => record,
            Err(e) => {
                debug!("Usage record unavailable ({}), starting fresh", e);
                UsageRecord::fresh(today)
            }
        }
    }

    /// Today's effective usage, with stale records treated as zero.
    pub async fn current(&self) -> UsageRecord {
        self.read().await.for_day((self.today)())
    }

    /// Claims one slot of today's quota. Storage is only written on `commit`.
    pub async fn check_and_reserve(&self) -> Result<UsageReservation<'_>, QuotaExceeded> {
        let _gate = self.gate.lock().await;

        let record = self.current().await;
        let pending = self.in_flight.load(Ordering::SeqCst);
        if record.count.saturating_add(pending) >= self.daily_limit {
            info!("Daily image search limit of {} reached.", self.daily_limit);
            return Err(QuotaExceeded {
                limit: self.daily_limit,
            });
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Ok(UsageReservation {
            tracker: self,
            committed: false,
        })
    }

    async fn commit_one(&self) -> UsageRecord {
        let _gate = self.gate.lock().await;

        let mut record = self.current().await;
        record.count += 1;
        if let Err(e) = store(&self.path, &record).await {
            error!(
                "Failed to persist usage record to {}: {}",
                self.path.display(),
                e
            );
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        record
    }
}

/// A claimed quota slot. Dropping it without `commit` gives the slot back.
pub struct UsageReservation<'a> {
    tracker: &'a UsageTracker,
    committed: bool,
}

impl UsageReservation<'_> {
    /// Charges the slot: bumps today's count and rewrites the record.
    pub async fn commit(mut self) -> UsageRecord {
        let record = self.tracker.commit_one().await;
        self.committed = true;
        info!(
            "Google Search API call count for today: {}/{}",
            record.count, self.tracker.daily_limit
        );
        record
    }
}

impl Drop for UsageReservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

async fn load(path: &Path) -> Result<UsageRecord, UsageError> {
    let data = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&data)?)
}

async fn store(path: &Path, record: &UsageRecord) -> Result<(), UsageError> {
    let data = serde_json::to_string_pretty(record)?;
    tokio::fs::write(path, data).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_2() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn tracker(dir: &tempfile::TempDir, limit: u32) -> UsageTracker {
        UsageTracker::with_clock(dir.path().join("api_usage.json"), limit, jan_2)
    }

    async fn seed(tracker: &UsageTracker, date: &str, count: u32) {
        let json = format!(r#"{{"date": "{}", "count": {}}}"#, date, count);
        tokio::fs::write(tracker.path(), json).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_file_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, 5);
        assert_eq!(tracker.read().await, UsageRecord::fresh(jan_2()));
    }

    #[tokio::test]
    async fn test_read_corrupt_file_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, 5);
        tokio::fs::write(tracker.path(), "{not json").await.unwrap();
        assert_eq!(tracker.read().await, UsageRecord::fresh(jan_2()));
    }

    #[tokio::test]
    async fn test_rollover_treats_count_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, 50);
        seed(&tracker, "2024-01-01", 50).await;

        assert_eq!(tracker.current().await.count, 0);
        let reservation = tracker.check_and_reserve().await;
        assert!(reservation.is_ok());
    }

    #[tokio::test]
    async fn test_limit_reached_does_not_touch_storage() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, 3);
        seed(&tracker, "2024-01-02", 3).await;
        let before = tokio::fs::read_to_string(tracker.path()).await.unwrap();

        let result = tracker.check_and_reserve().await;
        assert_eq!(result.err(), Some(QuotaExceeded { limit: 3 }));

        let after = tokio::fs::read_to_string(tracker.path()).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_commit_increments_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, 3);
        seed(&tracker, "2024-01-01", 2).await;

        let record = tracker.check_and_reserve().await.unwrap().commit().await;
        assert_eq!(record, UsageRecord { date: jan_2(), count: 1 });

        let stored = tracker.read().await;
        assert_eq!(stored, UsageRecord { date: jan_2(), count: 1 });
    }

    #[tokio::test]
    async fn test_open_reservations_count_against_limit() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir, 2);
        seed(&tracker, "2024-01-02", 1).await;

        let first = tracker.check_and_reserve().await.unwrap();
        assert!(tracker.check_and_reserve().await.is_err());

        drop(first);
        assert!(tracker.check_and_reserve().await.is_ok());
        assert_eq!(tracker.read().await.count, 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::with_clock(
            dir.path().join("missing-dir").join("api_usage.json"),
            3,
            jan_2,
        );

        let record = tracker.check_and_reserve().await.unwrap().commit().await;
        assert_eq!(record.count, 1);
        assert_eq!(tracker.in_flight.load(Ordering::SeqCst), 0);
    }
}
