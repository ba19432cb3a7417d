//! Archive production: collects a sub-run's files into a ZIP archive.
//!
//! Stateless. Callers are expected to have confirmed registry membership via
//! [`crate::RunRegistry::is_available`] first; the producer only validates
//! filesystem existence.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use matpack_core::observability::archive_span;
use matpack_core::DataPaths;

use crate::error::{DataError, Result};

/// Produces per-sub-run ZIP archives from the read-only data root.
///
/// Staging directories and archives are named deterministically from the
/// (composition, run, sub-run) triple, so distinct triples never collide.
/// Concurrent requests for the *same* triple race on the same staging
/// directory, last writer wins; acceptable for a prototype with no
/// concurrency guarantee.
#[derive(Debug, Clone)]
pub struct ArchiveProducer {
    data_paths: DataPaths,
    staging_root: PathBuf,
}

impl ArchiveProducer {
    /// Creates a producer staging archives under `staging_root`.
    #[must_use]
    pub fn new(data_paths: DataPaths, staging_root: impl Into<PathBuf>) -> Self {
        Self {
            data_paths,
            staging_root: staging_root.into(),
        }
    }

    /// Collects the files of `(composition, run_id, sub_run)` into a ZIP
    /// archive and returns its path.
    ///
    /// Copies every file from the sub-run directory, then opportunistically
    /// the per-composition dump file and the per-sub-run descriptor file if
    /// they exist (absence is not an error). Any stale staging contents from
    /// a prior request for the same triple are cleared first.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if the sub-run directory does not
    /// exist, [`DataError::Storage`] on copy or compression failures.
    pub fn produce(&self, composition: &str, run_id: &str, sub_run: &str) -> Result<PathBuf> {
        let span = archive_span("produce", composition, run_id, sub_run);
        let _guard = span.enter();

        let source_dir = self.data_paths.sub_run_dir(composition, run_id, sub_run)?;
        if !source_dir.is_dir() {
            return Err(DataError::not_found(format!(
                "no data for composition {composition} run {run_id} sub-run {sub_run}"
            )));
        }

        let staging_dir = self
            .staging_root
            .join(format!("{composition}_{run_id}_{sub_run}"));
        reset_dir(&staging_dir)?;

        copy_dir_files(&source_dir, &staging_dir)?;

        // Optional extras: per-composition dump and per-sub-run descriptors.
        let dump_file = self.data_paths.dump_file(composition)?;
        copy_if_exists(&dump_file, &staging_dir)?;
        let descriptor_file = self
            .data_paths
            .descriptor_file(composition, run_id, sub_run)?;
        copy_if_exists(&descriptor_file, &staging_dir)?;

        // Append rather than with_extension: compositions may contain dots
        // (e.g. "Zr49.5Cu") and must keep the full triple in the name.
        let archive_path = self
            .staging_root
            .join(format!("{composition}_{run_id}_{sub_run}.zip"));
        zip_dir(&staging_dir, &archive_path)?;

        tracing::info!(archive = %archive_path.display(), "Archive produced");
        Ok(archive_path)
    }
}

/// Clears any stale prior contents and recreates the directory.
fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .map_err(|e| DataError::storage(format!("clear staging {}: {e}", dir.display())))?;
    }
    fs::create_dir_all(dir)
        .map_err(|e| DataError::storage(format!("create staging {}: {e}", dir.display())))
}

/// Copies every regular file in `from` (non-recursive) into `to`.
fn copy_dir_files(from: &Path, to: &Path) -> Result<()> {
    let entries = fs::read_dir(from)
        .map_err(|e| DataError::storage(format!("read {}: {e}", from.display())))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| DataError::storage(format!("read {}: {e}", from.display())))?;
        let path = entry.path();
        if path.is_file() {
            copy_into(&path, to)?;
        }
    }
    Ok(())
}

fn copy_if_exists(file: &Path, to: &Path) -> Result<()> {
    if file.is_file() {
        copy_into(file, to)?;
    }
    Ok(())
}

fn copy_into(file: &Path, dir: &Path) -> Result<()> {
    let Some(name) = file.file_name() else {
        return Err(DataError::storage(format!(
            "file has no name: {}",
            file.display()
        )));
    };
    fs::copy(file, dir.join(name))
        .map_err(|e| DataError::storage(format!("copy {}: {e}", file.display())))?;
    Ok(())
}

/// Compresses the flat contents of `dir` into a ZIP archive at `archive`.
fn zip_dir(dir: &Path, archive: &Path) -> Result<()> {
    let file = File::create(archive)
        .map_err(|e| DataError::storage(format!("create archive {}: {e}", archive.display())))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| DataError::storage(format!("read staging {}: {e}", dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                DataError::storage(format!("non-UTF-8 file name in staging: {}", path.display()))
            })?
            .to_string();
        writer
            .start_file(&name, options)
            .map_err(|e| DataError::storage(format!("add {name} to archive: {e}")))?;
        let bytes = fs::read(&path)
            .map_err(|e| DataError::storage(format!("read {}: {e}", path.display())))?;
        writer
            .write_all(&bytes)
            .map_err(|e| DataError::storage(format!("write {name} to archive: {e}")))?;
    }

    writer
        .finish()
        .map_err(|e| DataError::storage(format!("finish archive: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Read;

    fn write_file(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn archive_names(archive: &Path) -> BTreeSet<String> {
        let file = File::open(archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_produce_packages_sub_run_files() {
        let root = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(root.path());
        let sub_run = paths.sub_run_dir("ZrCuAl", "1", "0").unwrap();
        write_file(&sub_run.join("zca.scf.in"), "dft input");
        write_file(&sub_run.join("ICOHPLIST.lobster"), "bond labels");

        let producer = ArchiveProducer::new(paths, staging.path());
        let archive = producer.produce("ZrCuAl", "1", "0").unwrap();

        assert_eq!(archive, staging.path().join("ZrCuAl_1_0.zip"));
        let names = archive_names(&archive);
        assert_eq!(
            names,
            ["zca.scf.in", "ICOHPLIST.lobster"]
                .map(str::to_string)
                .into_iter()
                .collect()
        );
    }

    #[test]
    fn test_produce_includes_optional_extras_when_present() {
        let root = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(root.path());
        let sub_run = paths.sub_run_dir("ZrCuAl", "1", "0").unwrap();
        write_file(&sub_run.join("zca.scf.out"), "dft output");
        write_file(&paths.dump_file("ZrCuAl").unwrap(), "lammps dump");
        write_file(
            &paths.descriptor_file("ZrCuAl", "1", "0").unwrap(),
            "soap vectors",
        );

        let producer = ArchiveProducer::new(paths, staging.path());
        let archive = producer.produce("ZrCuAl", "1", "0").unwrap();

        let names = archive_names(&archive);
        assert!(names.contains("zca.scf.out"));
        assert!(names.contains("zca-th300.dump"));
        assert!(names.contains("SOAPS.vec"));
    }

    #[test]
    fn test_dotted_composition_keeps_full_triple_in_archive_name() {
        let root = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(root.path());
        let sub_run = paths.sub_run_dir("Zr49.5Cu", "1", "0").unwrap();
        write_file(&sub_run.join("zca.scf.in"), "dft input");

        let producer = ArchiveProducer::new(paths, staging.path());
        let archive = producer.produce("Zr49.5Cu", "1", "0").unwrap();

        assert_eq!(archive, staging.path().join("Zr49.5Cu_1_0.zip"));
    }

    #[test]
    fn test_dotted_compositions_get_distinct_archives() {
        let root = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(root.path());
        for composition in ["A.1", "A.2"] {
            let sub_run = paths.sub_run_dir(composition, "1", "0").unwrap();
            write_file(&sub_run.join("zca.scf.in"), composition);
        }

        let producer = ArchiveProducer::new(paths, staging.path());
        let first = producer.produce("A.1", "1", "0").unwrap();
        let second = producer.produce("A.2", "1", "0").unwrap();

        assert_ne!(first, second);
        assert_eq!(first, staging.path().join("A.1_1_0.zip"));
        assert_eq!(second, staging.path().join("A.2_1_0.zip"));
    }

    #[test]
    fn test_produce_missing_dir_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let producer = ArchiveProducer::new(DataPaths::new(root.path()), staging.path());

        let err = producer.produce("ZrCuAl", "1", "0").unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }), "{err}");
    }

    #[test]
    fn test_produce_clears_stale_staging() {
        let root = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(root.path());
        let sub_run = paths.sub_run_dir("ZrCuAl", "1", "0").unwrap();
        write_file(&sub_run.join("keep.txt"), "fresh");

        // Simulate leftovers from an earlier request for the same triple.
        write_file(&staging.path().join("ZrCuAl_1_0/stale.txt"), "stale");

        let producer = ArchiveProducer::new(paths, staging.path());
        let archive = producer.produce("ZrCuAl", "1", "0").unwrap();

        let names = archive_names(&archive);
        assert!(names.contains("keep.txt"));
        assert!(!names.contains("stale.txt"));
    }

    #[test]
    fn test_archive_contents_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(root.path());
        let sub_run = paths.sub_run_dir("ZrCuAl", "1", "0").unwrap();
        write_file(&sub_run.join("zca.scf.in"), "dft input");

        let producer = ArchiveProducer::new(paths, staging.path());
        let archive = producer.produce("ZrCuAl", "1", "0").unwrap();

        let file = File::open(archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let mut entry = zip.by_name("zca.scf.in").unwrap();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "dft input");
    }
}
