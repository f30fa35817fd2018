//! Activity store use-case service.
//!
//! # Responsibility
//! - Enforce identity-pair uniqueness on create.
//! - Apply create/update/delete/clear through the repository and keep an
//!   in-memory snapshot the UI renders.
//! - Provide the existence predicates callers use to pre-validate actions.
//!
//! # Invariants
//! - Every operation normalizes the identity pair before touching storage.
//! - A storage fault never panics and never clears the snapshot; the
//!   snapshot stays at its last successfully loaded state.
//! - Identity fields are never rewritten by `update`.

use crate::model::activity::{
    day_bounds, ActivityKey, ActivityPatch, ActivityRecord, NewActivity,
};
use crate::repo::activity_repo::{ActivityRepository, RepoError, RepoResult};
use chrono::NaiveDate;
use log::{debug, error, info, warn};

/// Result of a store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The change was persisted and the snapshot reloaded.
    Applied,
    /// Create rejected: the identity pair is already taken.
    Duplicate,
    /// Update/delete rejected: no record has the identity pair.
    NotFound,
    /// The backing store failed; nothing changed.
    StorageFailed,
}

impl StoreOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }

    /// User-facing explanation for the outcome.
    pub fn message(self) -> &'static str {
        match self {
            Self::Applied => "Saved.",
            Self::Duplicate => {
                "No duplicate entries are allowed. Start date and start time have to be unique."
            }
            Self::NotFound => "Start date and start time have to match an existing record.",
            Self::StorageFailed => "The activity store could not be updated. Please try again.",
        }
    }
}

/// Activity manager owning the in-memory snapshot of records.
pub struct ActivityStore<R: ActivityRepository> {
    repo: R,
    records: Vec<ActivityRecord>,
}

impl<R: ActivityRepository> ActivityStore<R> {
    /// Loads the initial snapshot from `repo`.
    ///
    /// # Errors
    /// - Returns the repository error when the initial load fails. Callers
    ///   treat this as a fatal startup failure.
    pub fn open(repo: R) -> RepoResult<Self> {
        let records = repo.list_all().map_err(|err| {
            error!(
                "event=store_open module=store status=error error_code=initial_load_failed error={}",
                err
            );
            err
        })?;
        info!(
            "event=store_open module=store status=ok records={}",
            records.len()
        );
        Ok(Self { repo, records })
    }

    /// Current in-memory records, as last loaded from storage.
    pub fn snapshot(&self) -> &[ActivityRecord] {
        &self.records
    }

    /// Reloads the whole snapshot from storage.
    pub fn refresh(&mut self) -> StoreOutcome {
        match self.repo.list_all() {
            Ok(records) => {
                self.records = records;
                StoreOutcome::Applied
            }
            Err(err) => {
                log_storage_fault("activity_refresh", None, &err);
                StoreOutcome::StorageFailed
            }
        }
    }

    /// Creates a new activity unless its identity pair is taken.
    pub fn create(&mut self, request: NewActivity) -> StoreOutcome {
        let key = request.key();
        match self.repo.find(key) {
            Ok(Some(_)) => {
                info!(
                    "event=activity_create module=store status=rejected reason=duplicate key={}",
                    key
                );
                return StoreOutcome::Duplicate;
            }
            Ok(None) => {}
            Err(err) => {
                log_storage_fault("activity_create", Some(key), &err);
                return StoreOutcome::StorageFailed;
            }
        }

        match self.repo.insert(&request.into_record()) {
            Ok(()) => self.finish_mutation("activity_create", key),
            Err(RepoError::Duplicate(_)) => {
                info!(
                    "event=activity_create module=store status=rejected reason=duplicate key={}",
                    key
                );
                StoreOutcome::Duplicate
            }
            Err(err) => {
                log_storage_fault("activity_create", Some(key), &err);
                StoreOutcome::StorageFailed
            }
        }
    }

    /// Overwrites the fields present in `patch` on the record at `key`.
    pub fn update(&mut self, key: ActivityKey, patch: &ActivityPatch) -> StoreOutcome {
        let mut record = match self.repo.find(key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!(
                    "event=activity_update module=store status=rejected reason=not_found key={}",
                    key
                );
                return StoreOutcome::NotFound;
            }
            Err(err) => {
                log_storage_fault("activity_update", Some(key), &err);
                return StoreOutcome::StorageFailed;
            }
        };

        patch.apply_to(&mut record);
        match self.repo.update(&record) {
            Ok(()) => self.finish_mutation("activity_update", key),
            Err(RepoError::NotFound(_)) => StoreOutcome::NotFound,
            Err(err) => {
                log_storage_fault("activity_update", Some(key), &err);
                StoreOutcome::StorageFailed
            }
        }
    }

    /// Removes the record at `key`.
    pub fn delete(&mut self, key: ActivityKey) -> StoreOutcome {
        match self.repo.delete(key) {
            Ok(()) => self.finish_mutation("activity_delete", key),
            Err(RepoError::NotFound(_)) => {
                info!(
                    "event=activity_delete module=store status=rejected reason=not_found key={}",
                    key
                );
                StoreOutcome::NotFound
            }
            Err(err) => {
                log_storage_fault("activity_delete", Some(key), &err);
                StoreOutcome::StorageFailed
            }
        }
    }

    /// Removes every record. There is no confirmation step.
    pub fn delete_all(&mut self) -> StoreOutcome {
        match self.repo.delete_all() {
            Ok(removed) => {
                info!(
                    "event=activity_delete_all module=store status=ok removed={}",
                    removed
                );
                self.refresh();
                StoreOutcome::Applied
            }
            Err(err) => {
                log_storage_fault("activity_delete_all", None, &err);
                StoreOutcome::StorageFailed
            }
        }
    }

    /// Replaces the snapshot with the records of calendar day `day`.
    ///
    /// On storage failure the previous snapshot is returned unchanged.
    pub fn query_by_date(&mut self, day: NaiveDate) -> &[ActivityRecord] {
        self.load_day(day);
        &self.records
    }

    /// Same as `query_by_date`, reporting whether the day was actually loaded.
    pub fn load_day(&mut self, day: NaiveDate) -> StoreOutcome {
        let (start, end) = day_bounds(day);
        match self.repo.list_between(start, end) {
            Ok(records) => {
                debug!(
                    "event=activity_query module=store status=ok day={} records={}",
                    day,
                    records.len()
                );
                self.records = records;
                StoreOutcome::Applied
            }
            Err(err) => {
                log_storage_fault("activity_query", None, &err);
                StoreOutcome::StorageFailed
            }
        }
    }

    /// Point read of one record.
    pub fn get(&self, key: ActivityKey) -> Option<ActivityRecord> {
        self.repo.find(key).unwrap_or_else(|err| {
            log_storage_fault("activity_get", Some(key), &err);
            None
        })
    }

    /// Returns whether a record with identity `key` exists.
    ///
    /// A storage read failure is logged and reported as `false`.
    pub fn is_duplicate(&self, key: ActivityKey) -> bool {
        match self.repo.find(key) {
            Ok(found) => found.is_some(),
            Err(err) => {
                log_storage_fault("activity_exists", Some(key), &err);
                false
            }
        }
    }

    /// Update precondition: the record must already exist.
    pub fn is_valid_for_update(&self, key: ActivityKey) -> bool {
        self.is_duplicate(key)
    }

    /// Delete precondition: the record must already exist.
    pub fn is_valid_for_delete(&self, key: ActivityKey) -> bool {
        self.is_duplicate(key)
    }

    fn finish_mutation(&mut self, event: &'static str, key: ActivityKey) -> StoreOutcome {
        info!("event={} module=store status=ok key={}", event, key);
        // Write already landed; a failed reload only leaves the snapshot stale.
        self.refresh();
        StoreOutcome::Applied
    }
}

fn log_storage_fault(event: &'static str, key: Option<ActivityKey>, err: &RepoError) {
    match key {
        Some(key) => warn!(
            "event={} module=store status=error error_code=storage_fault key={} error={}",
            event, key, err
        ),
        None => warn!(
            "event={} module=store status=error error_code=storage_fault error={}",
            event, err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityStore, StoreOutcome};
    use crate::model::activity::{ActivityKey, ActivityRecord, ActivityType, NewActivity};
    use crate::repo::activity_repo::{ActivityRepository, RepoError, RepoResult};
    use chrono::{NaiveDate, NaiveTime};
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    /// Map-backed repository whose calls can be switched to fail.
    #[derive(Default)]
    struct FlakyRepository {
        rows: RefCell<BTreeMap<ActivityKey, ActivityRecord>>,
        failing: Cell<bool>,
    }

    impl FlakyRepository {
        fn check(&self) -> RepoResult<()> {
            if self.failing.get() {
                return Err(RepoError::InvalidData("simulated fault".to_string()));
            }
            Ok(())
        }
    }

    impl ActivityRepository for &FlakyRepository {
        fn find(&self, key: ActivityKey) -> RepoResult<Option<ActivityRecord>> {
            self.check()?;
            Ok(self.rows.borrow().get(&key).cloned())
        }

        fn insert(&self, record: &ActivityRecord) -> RepoResult<()> {
            self.check()?;
            let mut rows = self.rows.borrow_mut();
            if rows.contains_key(&record.key()) {
                return Err(RepoError::Duplicate(record.key()));
            }
            rows.insert(record.key(), record.clone());
            Ok(())
        }

        fn update(&self, record: &ActivityRecord) -> RepoResult<()> {
            self.check()?;
            match self.rows.borrow_mut().get_mut(&record.key()) {
                Some(row) => {
                    *row = record.clone();
                    Ok(())
                }
                None => Err(RepoError::NotFound(record.key())),
            }
        }

        fn delete(&self, key: ActivityKey) -> RepoResult<()> {
            self.check()?;
            self.rows
                .borrow_mut()
                .remove(&key)
                .map(|_| ())
                .ok_or(RepoError::NotFound(key))
        }

        fn delete_all(&self) -> RepoResult<usize> {
            self.check()?;
            let mut rows = self.rows.borrow_mut();
            let removed = rows.len();
            rows.clear();
            Ok(removed)
        }

        fn list_all(&self) -> RepoResult<Vec<ActivityRecord>> {
            self.check()?;
            Ok(self.rows.borrow().values().cloned().collect())
        }

        fn list_between(
            &self,
            start: NaiveDate,
            end: Option<NaiveDate>,
        ) -> RepoResult<Vec<ActivityRecord>> {
            self.check()?;
            Ok(self
                .rows
                .borrow()
                .values()
                .filter(|r| r.activity_date >= start && end.map_or(true, |e| r.activity_date < e))
                .cloned()
                .collect())
        }
    }

    fn walk(day: u32, hour: u32) -> NewActivity {
        NewActivity {
            activity_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            city: "Columbus".to_string(),
            important_place: "Park".to_string(),
            activity_info: "Walk".to_string(),
            activity_type: ActivityType::Outdoor,
        }
    }

    #[test]
    fn storage_fault_keeps_last_snapshot() {
        let repo = FlakyRepository::default();
        let mut store = ActivityStore::open(&repo).unwrap();
        assert_eq!(store.create(walk(1, 9)), StoreOutcome::Applied);
        assert_eq!(store.snapshot().len(), 1);

        repo.failing.set(true);
        assert_eq!(store.create(walk(1, 11)), StoreOutcome::StorageFailed);
        assert_eq!(store.delete(walk(1, 9).key()), StoreOutcome::StorageFailed);
        assert_eq!(store.delete_all(), StoreOutcome::StorageFailed);
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(store.load_day(day), StoreOutcome::StorageFailed);
        assert_eq!(store.query_by_date(day).len(), 1);
        assert!(!store.is_duplicate(walk(1, 9).key()));

        repo.failing.set(false);
        assert!(store.is_duplicate(walk(1, 9).key()));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn open_fails_when_initial_load_fails() {
        let repo = FlakyRepository::default();
        repo.failing.set(true);
        assert!(ActivityStore::open(&repo).is_err());
    }

    #[test]
    fn outcome_messages_are_distinct() {
        assert!(StoreOutcome::Applied.is_applied());
        assert!(!StoreOutcome::Duplicate.is_applied());
        assert_ne!(
            StoreOutcome::Duplicate.message(),
            StoreOutcome::NotFound.message()
        );
    }
}
