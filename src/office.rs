//! The office: every store of one workspace behind a single handle.

use crate::autosave::{self, AutoSave};
use crate::config::Config;
use crate::dashboard::DashboardStore;
use crate::error::{ImportError, StorageError};
use crate::snapshot::Snapshot;
use crate::storage::Storage;
use crate::store::{ChangeBus, ChangeEvent, PersistPolicy};
use crate::students::{default_students, StudentStore, STUDENTS_KEY};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Which collections a restore replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSummary {
    pub students: bool,
    pub groups: bool,
    pub tests: bool,
    pub reports: bool,
}

pub struct Office {
    storage: Rc<dyn Storage>,
    config: Config,
    bus: ChangeBus,
    autosave: AutoSave,
    pub students: StudentStore,
    pub dashboard: DashboardStore,
}

impl std::fmt::Debug for Office {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Office")
            .field("config", &self.config)
            .field("students", &self.students)
            .field("dashboard", &self.dashboard)
            .finish()
    }
}

impl Office {
    /// Load every collection, then apply the auto-save slot if enabled.
    pub fn open(storage: Rc<dyn Storage>, config: Config) -> Result<Self, StorageError> {
        Self::open_at(storage, config, Instant::now())
    }

    pub fn open_at(
        storage: Rc<dyn Storage>,
        config: Config,
        now: Instant,
    ) -> Result<Self, StorageError> {
        let bus = ChangeBus::new();
        let policy = config.persist_policy;
        let seed = config.seed_defaults;

        let students = StudentStore::load(
            STUDENTS_KEY,
            storage.clone(),
            policy,
            bus.clone(),
            || if seed { default_students() } else { Vec::new() },
        )?;
        let dashboard = DashboardStore::load(storage.clone(), policy, &bus, seed)?;
        let autosave = AutoSave::from_minutes(config.autosave_interval_minutes, now);

        let mut office = Self {
            storage,
            config,
            bus,
            autosave,
            students,
            dashboard,
        };

        if office.config.recover_autosave {
            office.recover_autosave()?;
        }
        tracing::info!(
            students = office.students.len(),
            groups = office.dashboard.groups.len(),
            tests = office.dashboard.tests.len(),
            reports = office.dashboard.reports.len(),
            "office opened"
        );
        Ok(office)
    }

    fn recover_autosave(&mut self) -> Result<(), StorageError> {
        match autosave::read_slot(self.storage.as_ref()) {
            Ok(Some(slot)) => {
                let applied = self.restore(slot)?;
                tracing::info!(?applied, "recovered auto-saved data");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to read auto-save slot"),
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.bus.subscribe()
    }

    pub fn set_persist_policy(&mut self, policy: PersistPolicy) {
        self.config.persist_policy = policy;
        self.students.set_policy(policy);
        self.dashboard.set_policy(policy);
    }

    pub fn set_autosave_interval(&mut self, minutes: u64, now: Instant) {
        self.config.autosave_interval_minutes = minutes;
        self.autosave.set_interval_minutes(minutes, now);
    }

    pub fn autosave(&self) -> &AutoSave {
        &self.autosave
    }

    pub fn snapshot(&self, at: DateTime<Utc>) -> Snapshot {
        Snapshot::new(
            self.students.list().to_vec(),
            self.dashboard.groups.list().to_vec(),
            self.dashboard.tests.list().to_vec(),
            self.dashboard.reports.list().to_vec(),
            at,
        )
    }

    /// Replace each collection present in `snapshot`; leave the rest alone.
    ///
    /// Every present collection is applied even if an earlier write fails;
    /// the first failure is returned.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<RestoreSummary, StorageError> {
        let mut summary = RestoreSummary::default();
        let mut first_err: Option<StorageError> = None;
        let mut note = |r: Result<(), StorageError>| {
            if let Err(e) = r {
                first_err.get_or_insert(e);
            }
        };

        if let Some(students) = snapshot.students {
            note(self.students.replace_all(students));
            summary.students = true;
        }
        if let Some(groups) = snapshot.groups {
            note(self.dashboard.groups.replace_all(groups));
            summary.groups = true;
        }
        if let Some(tests) = snapshot.tests {
            note(self.dashboard.tests.replace_all(tests));
            summary.tests = true;
        }
        if let Some(reports) = snapshot.reports {
            note(self.dashboard.reports.replace_all(reports));
            summary.reports = true;
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Validate and apply an exported document. Nothing changes on a format error.
    pub fn import_document(&mut self, text: &str) -> Result<RestoreSummary, RestoreError> {
        let snapshot = Snapshot::parse(text)?;
        Ok(self.restore(snapshot)?)
    }

    pub fn autosave_wait(&self, now: Instant) -> Duration {
        self.autosave.time_until_due(now)
    }

    /// Run the auto-save if it is due. Returns whether it ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.autosave.is_due(now) {
            return false;
        }
        if let Err(e) = self.run_autosave(now) {
            tracing::error!(error = %e, "auto-save failed");
        }
        true
    }

    /// Write the recovery slot now, regardless of the schedule.
    pub fn run_autosave(&mut self, now: Instant) -> Result<DateTime<Utc>, StorageError> {
        let at = Utc::now();
        let result = autosave::write_slot(self.storage.as_ref(), &self.snapshot(at));
        match result {
            Ok(()) => {
                self.autosave.mark_run(now, Some(at));
                tracing::debug!(at = %at, "auto-saved");
                Ok(at)
            }
            Err(e) => {
                self.autosave.mark_run(now, None);
                Err(e)
            }
        }
    }

    /// Teardown: rewrite every collection and the recovery slot.
    ///
    /// Every write is attempted even after a failure. Failures are logged;
    /// under [`PersistPolicy::Propagate`] the first one is returned.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        let results = [
            self.students.persist(),
            self.dashboard.groups.persist(),
            self.dashboard.tests.persist(),
            self.dashboard.reports.persist(),
            self.run_autosave(Instant::now()).map(|_| ()),
        ];

        let mut first_err = None;
        for e in results.into_iter().filter_map(Result::err) {
            tracing::error!(key = e.key(), error = %e, "flush write failed");
            first_err.get_or_insert(e);
        }
        match first_err {
            Some(e) if self.config.persist_policy == PersistPolicy::Propagate => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::AUTOSAVE_KEY;
    use crate::dashboard::{default_groups, default_reports, default_tests};
    use crate::storage::MemoryStorage;
    use crate::store::ChangeKind;

    fn bare_config() -> Config {
        Config {
            seed_defaults: false,
            ..Config::default()
        }
    }

    fn full_office(storage: Rc<dyn Storage>) -> Office {
        let mut office = Office::open(storage, bare_config()).expect("open");
        office
            .restore(Snapshot::new(
                default_students(),
                default_groups(),
                default_tests(),
                default_reports(),
                Utc::now(),
            ))
            .expect("restore");
        office
    }

    #[test]
    fn export_then_import_restores_identical_collections() {
        let source = full_office(Rc::new(MemoryStorage::new()));
        let text = source
            .snapshot(Utc::now())
            .to_json_pretty()
            .expect("serialize");

        let mut target = Office::open(Rc::new(MemoryStorage::new()), bare_config()).expect("open");
        let summary = target.import_document(&text).expect("import");
        assert_eq!(
            summary,
            RestoreSummary {
                students: true,
                groups: true,
                tests: true,
                reports: true
            }
        );
        assert_eq!(target.students.list(), source.students.list());
        assert_eq!(target.dashboard.groups.list(), source.dashboard.groups.list());
        assert_eq!(target.dashboard.tests.list(), source.dashboard.tests.list());
        assert_eq!(target.dashboard.reports.list(), source.dashboard.reports.list());
    }

    #[test]
    fn import_without_version_leaves_state_unchanged() {
        let mut office = full_office(Rc::new(MemoryStorage::new()));
        let before = office.snapshot(Utc::now());
        let err = office
            .import_document(r#"{"exportDate":"2024-01-01T00:00:00.000Z","students":[]}"#)
            .expect_err("rejected");
        assert!(matches!(
            err,
            RestoreError::Import(ImportError::MissingField("version"))
        ));
        let after = office.snapshot(Utc::now());
        assert_eq!(after.students, before.students);
        assert_eq!(after.groups, before.groups);
    }

    #[test]
    fn students_only_document_leaves_aggregates_alone() {
        let mut office = full_office(Rc::new(MemoryStorage::new()));
        let summary = office
            .import_document(
                r#"{"version":"1.0","exportDate":"2024-01-01T00:00:00.000Z","students":[]}"#,
            )
            .expect("import");
        assert!(summary.students && !summary.groups && !summary.tests && !summary.reports);
        assert!(office.students.is_empty());
        assert_eq!(office.dashboard.groups.len(), 2);
        assert_eq!(office.dashboard.tests.len(), 2);
        assert_eq!(office.dashboard.reports.len(), 1);
    }

    #[test]
    fn reopen_over_same_storage_reproduces_state() {
        let storage: Rc<dyn Storage> = Rc::new(MemoryStorage::new());
        {
            let mut office = full_office(storage.clone());
            office.students.delete("12345678901234").expect("delete");
        }
        let office = Office::open(storage, bare_config()).expect("reopen");
        assert_eq!(office.students.len(), 1);
        assert_eq!(office.dashboard.reports.len(), 1);
    }

    #[test]
    fn seeding_fills_never_written_collections() {
        let office = Office::open(Rc::new(MemoryStorage::new()), Config::default()).expect("open");
        assert_eq!(office.students.len(), 2);
        assert_eq!(office.dashboard.stats(office.students.len()).completed_tests, 2);
    }

    #[test]
    fn autosave_slot_is_recovered_on_open() {
        let storage: Rc<dyn Storage> = Rc::new(MemoryStorage::new());
        {
            let mut office = full_office(storage.clone());
            office.run_autosave(Instant::now()).expect("autosave");
            // Diverge the live collection from the slot.
            office.students.replace_all(Vec::new()).expect("clear");
        }
        assert!(storage.get_item(AUTOSAVE_KEY).expect("get").is_some());

        let office = Office::open(storage.clone(), bare_config()).expect("reopen");
        assert_eq!(office.students.len(), 2, "slot wins over the live key");

        let no_recover = Config {
            recover_autosave: false,
            ..bare_config()
        };
        let office = Office::open(storage, no_recover).expect("reopen");
        assert_eq!(office.students.len(), 2, "recovery above rewrote the live key");
    }

    #[test]
    fn tick_runs_only_when_due() {
        let t0 = Instant::now();
        let mut office =
            Office::open_at(Rc::new(MemoryStorage::new()), bare_config(), t0).expect("open");
        assert!(!office.tick(t0));
        assert!(office.autosave().last_saved_at().is_none());
        assert!(office.tick(t0 + Duration::from_secs(5 * 60)));
        assert!(office.autosave().last_saved_at().is_some());
        assert_eq!(
            office.autosave_wait(t0 + Duration::from_secs(5 * 60)),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn subscribers_see_restore_as_replacements() {
        let mut office = Office::open(Rc::new(MemoryStorage::new()), bare_config()).expect("open");
        let rx = office.subscribe();
        office
            .import_document(r#"{"version":"1.0","exportDate":"x","groups":[],"tests":[]}"#)
            .expect("import");
        let events: Vec<ChangeEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == ChangeKind::Replaced));
        assert_eq!(events[0].collection, "groups");
        assert_eq!(events[1].collection, "tests");
    }

    /// Refuses writes to one key and delegates everything else.
    struct RefusingKey {
        inner: MemoryStorage,
        refused: &'static str,
    }

    impl Storage for RefusingKey {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get_item(key)
        }
        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.refused {
                return Err(StorageError::Write {
                    key: key.to_string(),
                    message: "refused".into(),
                });
            }
            self.inner.set_item(key, value)
        }
        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn flush_attempts_every_write_after_a_failure() {
        let storage = Rc::new(RefusingKey {
            inner: MemoryStorage::new(),
            refused: STUDENTS_KEY,
        });
        let mut office = Office::open(storage.clone(), Config::default()).expect("open");
        office.flush().expect("logged, not surfaced");
        assert!(storage.get_item(STUDENTS_KEY).expect("get").is_none());
        assert!(storage.get_item("groups").expect("get").is_some());
        assert!(storage.get_item("reports").expect("get").is_some());
        let slot = storage.get_item(AUTOSAVE_KEY).expect("get").expect("slot written");
        assert!(slot.contains("12345678901234"));

        storage.inner.remove_item(AUTOSAVE_KEY).expect("remove");
        office.set_persist_policy(PersistPolicy::Propagate);
        let err = office.flush().expect_err("surfaced");
        assert_eq!(err.key(), STUDENTS_KEY);
        assert!(storage.get_item(AUTOSAVE_KEY).expect("get").is_some());
    }

    #[test]
    fn quota_failure_is_silent_by_default_and_loud_when_propagating() {
        let storage: Rc<dyn Storage> = Rc::new(MemoryStorage::with_quota(64));
        let mut office = Office::open(storage, bare_config()).expect("open");
        office
            .students
            .replace_all(default_students())
            .expect("silently degraded");
        assert_eq!(office.students.len(), 2);

        office.set_persist_policy(PersistPolicy::Propagate);
        let err = office
            .students
            .replace_all(default_students())
            .expect_err("quota surfaced");
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    }
}
