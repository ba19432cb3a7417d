//! The run registry: in-memory mapping mirrored to a persisted JSON file.
//!
//! Maps composition → ordered list of [`RunRecord`] (insertion order =
//! scheduling order). Every mutation rewrites the persisted file in full;
//! there is no incremental persistence and no durability guarantee beyond
//! "write succeeded". A single mutex guards both the map and the file
//! rewrite so the in-memory and on-disk copies never diverge within one
//! process. Cross-process writers still race last-writer-wins.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{Duration, Utc};
use indexmap::IndexMap;

use matpack_core::observability::registry_span;
use matpack_core::DataPaths;

use crate::error::{DataError, Result};
use crate::record::{RunRecord, StatusReport, INITIAL_SUB_RUN};

/// Seconds after which a scheduled phase reports DONE.
pub const DEFAULT_STATUS_THRESHOLD_SECS: i64 = 300;

/// Highest sub-run identifier added by augmentation (inclusive).
pub const AUGMENT_SUB_RUN_MAX: u64 = 14;

/// The registry mapping: composition → ordered run records.
pub type RegistryMap = IndexMap<String, Vec<RunRecord>>;

/// Tracks which (composition, run, sub-run) triples are declared available
/// and answers membership/status queries.
///
/// Scheduling does not create simulation output; it only discovers
/// pre-existing directories under the data root and records them.
pub struct RunRegistry {
    store_path: PathBuf,
    data_paths: DataPaths,
    status_threshold: Duration,
    inner: Mutex<RegistryMap>,
}

impl std::fmt::Debug for RunRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRegistry")
            .field("store_path", &self.store_path)
            .field("data_paths", &self.data_paths)
            .field("status_threshold", &self.status_threshold)
            .finish_non_exhaustive()
    }
}

impl RunRegistry {
    /// Loads the registry from `store_path`, starting empty if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// fails record validation (malformed entries fail fast at startup).
    pub fn load(store_path: impl Into<PathBuf>, data_paths: DataPaths) -> Result<Self> {
        let store_path = store_path.into();
        let map = read_store(&store_path)?;
        Ok(Self {
            store_path,
            data_paths,
            status_threshold: Duration::seconds(DEFAULT_STATUS_THRESHOLD_SECS),
            inner: Mutex::new(map),
        })
    }

    /// Overrides the DONE threshold (seconds). Mostly for tests and demos.
    #[must_use]
    pub fn with_status_threshold_secs(mut self, secs: i64) -> Self {
        self.status_threshold = Duration::seconds(secs);
        self
    }

    /// Schedules a new generation run for `composition`.
    ///
    /// Assigns `run_id = max(existing) + 1` (starting at "1") and records
    /// sub-run "0" as available.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if the composition's data directory,
    /// or the run/sub-run-0 directory for the computed run id, does not
    /// exist under the data root. Returns [`DataError::Storage`] if the
    /// registry file cannot be rewritten.
    pub fn schedule(&self, composition: &str) -> Result<RunRecord> {
        let span = registry_span("schedule", composition);
        let _guard = span.enter();

        let composition_dir = self.data_paths.composition_dir(composition)?;
        if !composition_dir.is_dir() {
            return Err(DataError::not_found(format!(
                "no data for composition {composition}"
            )));
        }

        let mut map = self.lock();

        let existing = map.get(composition).map(Vec::as_slice).unwrap_or_default();
        let next_run_id = next_run_id(existing);
        let sub_run_dir =
            self.data_paths
                .sub_run_dir(composition, &next_run_id, INITIAL_SUB_RUN)?;
        if !sub_run_dir.is_dir() {
            return Err(DataError::not_found(format!(
                "no run data for composition {composition} run {next_run_id}"
            )));
        }

        let record = RunRecord::scheduled(composition, next_run_id);
        map.entry(composition.to_string())
            .or_default()
            .push(record.clone());
        self.persist(&map)?;

        tracing::info!(run_id = %record.run_id, "Run scheduled");
        Ok(record)
    }

    /// Schedules augmentation sub-runs `{1..=14}` for an existing run.
    ///
    /// Idempotent on the sub-run set: the union is re-applied and the
    /// augmentation timestamp refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if no record matches
    /// `(composition, run_id)` or the sub-run container directory does not
    /// exist. Returns [`DataError::Storage`] on persistence failure.
    pub fn augment(&self, composition: &str, run_id: &str) -> Result<RunRecord> {
        let span = registry_span("augment", composition);
        let _guard = span.enter();

        let run_dir = self.data_paths.run_dir(composition, run_id)?;

        let mut map = self.lock();
        let record = find_record_mut(&mut map, composition, run_id)?;

        if !run_dir.is_dir() {
            return Err(DataError::not_found(format!(
                "no sub-run data for composition {composition} run {run_id}"
            )));
        }

        record.add_sub_runs((1..=AUGMENT_SUB_RUN_MAX).map(|n| n.to_string()));
        record.sub_runs_scheduled_at = Some(Utc::now());
        let updated = record.clone();
        self.persist(&map)?;

        tracing::info!(run_id = %updated.run_id, sub_runs = updated.sub_runs.len(), "Run augmented");
        Ok(updated)
    }

    /// Derives the synthetic status for `(composition, run_id)` at the
    /// current time.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if no record matches.
    pub fn status(&self, composition: &str, run_id: &str) -> Result<StatusReport> {
        let map = self.lock();
        let record = find_record(&map, composition, run_id)?;
        Ok(record.status_at(Utc::now(), self.status_threshold))
    }

    /// Returns true iff a record exists for `(composition, run_id)` and
    /// `sub_run` is a member of its sub-run set.
    #[must_use]
    pub fn is_available(&self, composition: &str, run_id: &str, sub_run: &str) -> bool {
        let map = self.lock();
        find_record(&map, composition, run_id)
            .map(|record| record.contains_sub_run(sub_run))
            .unwrap_or(false)
    }

    /// Returns the full mapping verbatim (no pagination, no filtering).
    #[must_use]
    pub fn list_all(&self) -> RegistryMap {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, map: &RegistryMap) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(map)
            .map_err(|e| DataError::serialization(format!("encode registry: {e}")))?;
        std::fs::write(&self.store_path, bytes).map_err(|e| {
            DataError::storage(format!(
                "write registry file {}: {e}",
                self.store_path.display()
            ))
        })
    }
}

fn next_run_id(existing: &[RunRecord]) -> String {
    let max = existing
        .iter()
        .filter_map(|r| r.run_id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}

fn find_record<'a>(
    map: &'a RegistryMap,
    composition: &str,
    run_id: &str,
) -> Result<&'a RunRecord> {
    map.get(composition)
        .and_then(|runs| runs.iter().find(|r| r.run_id == run_id))
        .ok_or_else(|| {
            DataError::not_found(format!(
                "run {run_id} not scheduled for composition {composition}"
            ))
        })
}

fn find_record_mut<'a>(
    map: &'a mut RegistryMap,
    composition: &str,
    run_id: &str,
) -> Result<&'a mut RunRecord> {
    map.get_mut(composition)
        .and_then(|runs| runs.iter_mut().find(|r| r.run_id == run_id))
        .ok_or_else(|| {
            DataError::not_found(format!(
                "run {run_id} not scheduled for composition {composition}"
            ))
        })
}

fn read_store(path: &Path) -> Result<RegistryMap> {
    if !path.exists() {
        return Ok(RegistryMap::new());
    }
    let bytes = std::fs::read(path)
        .map_err(|e| DataError::storage(format!("read registry file {}: {e}", path.display())))?;
    let mut map: RegistryMap = serde_json::from_slice(&bytes)
        .map_err(|e| DataError::serialization(format!("decode registry file: {e}")))?;

    // Fail fast on malformed entries; normalize sub-run order.
    for (composition, runs) in &mut map {
        for record in runs {
            record.validate()?;
            if record.composition != *composition {
                return Err(DataError::validation(format!(
                    "record for run {} claims composition {:?} but is filed under {composition:?}",
                    record.run_id, record.composition
                )));
            }
            record.sort_sub_runs();
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a data root with run/sub-run directories for a composition.
    fn data_root(composition: &str, runs: &[(&str, &[&str])]) -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("create tempdir");
        for (run_id, sub_runs) in runs {
            for sub_run in *sub_runs {
                let dir = DataPaths::new(root.path())
                    .sub_run_dir(composition, run_id, sub_run)
                    .unwrap();
                std::fs::create_dir_all(dir).expect("create sub-run dir");
            }
        }
        root
    }

    fn registry_at(root: &Path) -> (RunRegistry, tempfile::TempDir) {
        let store_dir = tempfile::tempdir().expect("create store dir");
        let registry = RunRegistry::load(
            store_dir.path().join("registry.json"),
            DataPaths::new(root),
        )
        .expect("load empty registry");
        (registry, store_dir)
    }

    #[test]
    fn test_first_schedule_assigns_run_id_one_then_two() {
        let root = data_root("ZrCuAl", &[("1", &["0"]), ("2", &["0"])]);
        let (registry, _store) = registry_at(root.path());

        let first = registry.schedule("ZrCuAl").unwrap();
        assert_eq!(first.run_id, "1");
        assert_eq!(first.sub_runs, vec!["0"]);

        let second = registry.schedule("ZrCuAl").unwrap();
        assert_eq!(second.run_id, "2");
    }

    #[test]
    fn test_schedule_unknown_composition_is_not_found() {
        let root = data_root("ZrCuAl", &[("1", &["0"])]);
        let (registry, _store) = registry_at(root.path());

        let err = registry.schedule("FeNiCr").unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }), "{err}");
    }

    #[test]
    fn test_schedule_fails_when_next_run_dir_missing() {
        // Only run 1 exists on disk; the second schedule would need run 2.
        let root = data_root("ZrCuAl", &[("1", &["0"])]);
        let (registry, _store) = registry_at(root.path());

        registry.schedule("ZrCuAl").unwrap();
        let err = registry.schedule("ZrCuAl").unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }), "{err}");
    }

    #[test]
    fn test_augment_unions_and_is_idempotent() {
        let root = data_root("ZrCuAl", &[("1", &["0"])]);
        let (registry, _store) = registry_at(root.path());

        registry.schedule("ZrCuAl").unwrap();
        let first = registry.augment("ZrCuAl", "1").unwrap();
        let expected: Vec<String> = (0..=14).map(|n| n.to_string()).collect();
        assert_eq!(first.sub_runs, expected);
        assert!(first.sub_runs_scheduled_at.is_some());

        let second = registry.augment("ZrCuAl", "1").unwrap();
        assert_eq!(second.sub_runs, first.sub_runs);
    }

    #[test]
    fn test_augment_unscheduled_run_is_not_found() {
        let root = data_root("ZrCuAl", &[("1", &["0"])]);
        let (registry, _store) = registry_at(root.path());

        let err = registry.augment("ZrCuAl", "1").unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }), "{err}");
    }

    #[test]
    fn test_is_available_requires_membership() {
        let root = data_root("ZrCuAl", &[("1", &["0"])]);
        let (registry, _store) = registry_at(root.path());

        registry.schedule("ZrCuAl").unwrap();
        assert!(registry.is_available("ZrCuAl", "1", "0"));
        assert!(!registry.is_available("ZrCuAl", "1", "5"));
        assert!(!registry.is_available("ZrCuAl", "2", "0"));
        assert!(!registry.is_available("FeNiCr", "1", "0"));

        registry.augment("ZrCuAl", "1").unwrap();
        assert!(registry.is_available("ZrCuAl", "1", "5"));
        assert!(!registry.is_available("ZrCuAl", "1", "15"));
    }

    #[test]
    fn test_status_of_fresh_run_is_running() {
        let root = data_root("ZrCuAl", &[("1", &["0"])]);
        let (registry, _store) = registry_at(root.path());

        registry.schedule("ZrCuAl").unwrap();
        let report = registry.status("ZrCuAl", "1").unwrap();
        assert_eq!(report.run_status, crate::record::JobStatus::Running);
        assert!(report.sub_runs_status.is_none());
    }

    #[test]
    fn test_status_unknown_run_is_not_found() {
        let root = data_root("ZrCuAl", &[("1", &["0"])]);
        let (registry, _store) = registry_at(root.path());

        let err = registry.status("ZrCuAl", "9").unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }), "{err}");
    }

    #[test]
    fn test_next_run_id_ignores_gaps() {
        let records = vec![
            RunRecord::scheduled("X", "1"),
            RunRecord::scheduled("X", "7"),
        ];
        assert_eq!(next_run_id(&records), "8");
        assert_eq!(next_run_id(&[]), "1");
    }
}
