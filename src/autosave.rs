//! Periodic snapshot into the crash-recovery slot.
//!
//! This slot is separate from explicit backups: it lives in storage under
//! [`AUTOSAVE_KEY`] and is read back when a workspace is opened.

use crate::error::StorageError;
use crate::snapshot::Snapshot;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

pub const AUTOSAVE_KEY: &str = "dz-orientations-auto-save";

/// Intervals offered by the settings page, in minutes.
pub const INTERVAL_CHOICES_MINUTES: [u64; 4] = [1, 5, 15, 30];
pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;

/// Longest interval the schedule accepts; longer ones are capped.
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub fn is_interval_choice(minutes: u64) -> bool {
    INTERVAL_CHOICES_MINUTES.contains(&minutes)
}

fn minutes_to_interval(minutes: u64) -> Duration {
    minutes
        .checked_mul(60)
        .map_or(MAX_INTERVAL, Duration::from_secs)
        .min(MAX_INTERVAL)
}

#[derive(Debug, Clone)]
pub struct AutoSave {
    interval: Duration,
    next_due: Instant,
    last_saved_at: Option<DateTime<Utc>>,
}

impl AutoSave {
    pub fn new(interval: Duration, now: Instant) -> Self {
        let interval = interval.min(MAX_INTERVAL);
        Self {
            interval,
            next_due: now + interval,
            last_saved_at: None,
        }
    }

    pub fn from_minutes(minutes: u64, now: Instant) -> Self {
        Self::new(minutes_to_interval(minutes), now)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval_minutes(&mut self, minutes: u64, now: Instant) {
        self.set_interval(minutes_to_interval(minutes), now);
    }

    /// Change the interval and restart the countdown from `now`.
    pub fn set_interval(&mut self, interval: Duration, now: Instant) {
        self.interval = interval.min(MAX_INTERVAL);
        self.next_due = now + interval;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// Record a run. The next one is scheduled a full interval after `now`
    /// whether or not the write succeeded.
    pub fn mark_run(&mut self, now: Instant, saved_at: Option<DateTime<Utc>>) {
        self.next_due = now + self.interval;
        if saved_at.is_some() {
            self.last_saved_at = saved_at;
        }
    }
}

pub fn write_slot(storage: &dyn Storage, snapshot: &Snapshot) -> Result<(), StorageError> {
    let text = serde_json::to_string(snapshot).map_err(|source| StorageError::Encode {
        key: AUTOSAVE_KEY.to_string(),
        source,
    })?;
    storage.set_item(AUTOSAVE_KEY, &text)
}

/// Read the recovery slot.
///
/// Unlike an explicit import, the slot is trusted: `version` and
/// `exportDate` are not required.
pub fn read_slot(storage: &dyn Storage) -> Result<Option<Snapshot>, StorageError> {
    let Some(text) = storage.get_item(AUTOSAVE_KEY)? else {
        return Ok(None);
    };

    #[derive(serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Slot {
        #[serde(default)]
        students: Option<Vec<crate::model::Student>>,
        #[serde(default)]
        groups: Option<Vec<crate::model::Group>>,
        #[serde(default)]
        tests: Option<Vec<crate::model::Test>>,
        #[serde(default)]
        reports: Option<Vec<crate::model::Report>>,
        #[serde(default)]
        export_date: Option<String>,
        #[serde(default)]
        version: Option<String>,
    }

    let slot: Slot = serde_json::from_str(&text).map_err(|source| StorageError::Decode {
        key: AUTOSAVE_KEY.to_string(),
        source,
    })?;
    Ok(Some(Snapshot {
        students: slot.students,
        groups: slot.groups,
        tests: slot.tests,
        reports: slot.reports,
        export_date: slot.export_date.unwrap_or_default(),
        version: slot.version.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::students::default_students;

    #[test]
    fn schedule_fires_after_interval_and_restarts() {
        let t0 = Instant::now();
        let mut a = AutoSave::from_minutes(5, t0);
        assert!(!a.is_due(t0));
        assert_eq!(a.time_until_due(t0), Duration::from_secs(300));
        assert!(a.is_due(t0 + Duration::from_secs(300)));

        let t1 = t0 + Duration::from_secs(301);
        a.mark_run(t1, Some(Utc::now()));
        assert!(!a.is_due(t1));
        assert!(a.last_saved_at().is_some());
    }

    #[test]
    fn changing_interval_restarts_countdown() {
        let t0 = Instant::now();
        let mut a = AutoSave::from_minutes(30, t0);
        let t1 = t0 + Duration::from_secs(120);
        a.set_interval(Duration::from_secs(60), t1);
        assert!(!a.is_due(t1 + Duration::from_secs(59)));
        assert!(a.is_due(t1 + Duration::from_secs(60)));
    }

    #[test]
    fn huge_intervals_are_capped() {
        let t0 = Instant::now();
        let mut a = AutoSave::from_minutes(1 << 60, t0);
        assert_eq!(a.interval(), MAX_INTERVAL);
        a.set_interval_minutes(u64::MAX, t0);
        assert_eq!(a.interval(), MAX_INTERVAL);
        a.mark_run(t0, None);
        assert!(!a.is_due(t0 + Duration::from_secs(60 * 60)));
    }

    #[test]
    fn only_offered_intervals_are_choices() {
        assert!(is_interval_choice(1));
        assert!(is_interval_choice(30));
        assert!(!is_interval_choice(0));
        assert!(!is_interval_choice(7));
        assert!(!is_interval_choice(1 << 60));
    }

    #[test]
    fn failed_run_keeps_previous_save_time() {
        let t0 = Instant::now();
        let mut a = AutoSave::from_minutes(1, t0);
        a.mark_run(t0, None);
        assert_eq!(a.last_saved_at(), None);
    }

    #[test]
    fn slot_round_trip_and_tolerates_missing_header() {
        let storage = MemoryStorage::new();
        assert!(read_slot(&storage).expect("read").is_none());

        let snap = Snapshot::new(default_students(), vec![], vec![], vec![], Utc::now());
        write_slot(&storage, &snap).expect("write");
        assert_eq!(read_slot(&storage).expect("read"), Some(snap));

        storage
            .set_item(AUTOSAVE_KEY, r#"{"groups":[]}"#)
            .expect("set");
        let bare = read_slot(&storage).expect("read").expect("present");
        assert!(bare.students.is_none());
        assert_eq!(bare.groups, Some(vec![]));
    }
}
