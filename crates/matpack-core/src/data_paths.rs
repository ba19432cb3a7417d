//! Typed path helpers for the read-only simulation data root.
//!
//! The data root is a pre-existing directory tree keyed by
//! composition/run/sub-run. Matpack never creates or modifies it; the mere
//! existence of these paths gates registry mutations and downloads.
//!
//! Layout for a composition `nc`, run `r`, sub-run `s`:
//!
//! ```text
//! <root>/<nc>/c/md/lammps/100/<r>/2000/<s>/   raw DFT/bond files
//! <root>/<nc>/zca-th300.dump                  per-composition LAMMPS dump
//! <root>/<nc>-SOAPS/c/md/lammps/100/<r>/2000/<s>/SOAPS.vec   descriptors
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Fixed subtree between the composition directory and the run directory.
pub const LAMMPS_SUBTREE: &str = "c/md/lammps/100";

/// Snapshot step directory nested under every run directory.
pub const SNAPSHOT_STEP: &str = "2000";

/// File name of the per-composition LAMMPS dump.
pub const DUMP_FILE_NAME: &str = "zca-th300.dump";

/// File name of the per-sub-run SOAP descriptor vector.
pub const DESCRIPTOR_FILE_NAME: &str = "SOAPS.vec";

/// Directory-name suffix of the descriptor sibling tree.
pub const DESCRIPTOR_TREE_SUFFIX: &str = "-SOAPS";

/// Typed paths into the simulation data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Creates typed paths rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the data root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding all data for a composition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the identifier is not a valid path
    /// component.
    pub fn composition_dir(&self, composition: &str) -> Result<PathBuf> {
        let nc = validate_component(composition)?;
        Ok(self.root.join(nc))
    }

    /// Returns the sub-run container directory for a run, i.e. the directory
    /// whose children are the sub-run directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any identifier is not a valid path
    /// component.
    pub fn run_dir(&self, composition: &str, run_id: &str) -> Result<PathBuf> {
        let dir = self
            .composition_dir(composition)?
            .join(LAMMPS_SUBTREE)
            .join(validate_component(run_id)?)
            .join(SNAPSHOT_STEP);
        Ok(dir)
    }

    /// Returns the directory holding the raw files of one sub-run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any identifier is not a valid path
    /// component.
    pub fn sub_run_dir(&self, composition: &str, run_id: &str, sub_run: &str) -> Result<PathBuf> {
        Ok(self
            .run_dir(composition, run_id)?
            .join(validate_component(sub_run)?))
    }

    /// Returns the per-composition LAMMPS dump file path. The file is
    /// optional; callers must tolerate its absence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the identifier is not a valid path
    /// component.
    pub fn dump_file(&self, composition: &str) -> Result<PathBuf> {
        Ok(self.composition_dir(composition)?.join(DUMP_FILE_NAME))
    }

    /// Returns the per-sub-run SOAP descriptor file path, which lives in a
    /// sibling `<nc>-SOAPS` tree. The file is optional; callers must tolerate
    /// its absence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any identifier is not a valid path
    /// component.
    pub fn descriptor_file(
        &self,
        composition: &str,
        run_id: &str,
        sub_run: &str,
    ) -> Result<PathBuf> {
        let nc = validate_component(composition)?;
        Ok(self
            .root
            .join(format!("{nc}{DESCRIPTOR_TREE_SUFFIX}"))
            .join(LAMMPS_SUBTREE)
            .join(validate_component(run_id)?)
            .join(SNAPSHOT_STEP)
            .join(validate_component(sub_run)?)
            .join(DESCRIPTOR_FILE_NAME))
    }
}

/// Validates an identifier used as a single path component.
///
/// Identifiers come straight from URL path segments, so anything that could
/// escape the data root is rejected.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for empty strings, separators, traversal
/// segments, or control characters.
pub fn validate_component(value: &str) -> Result<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "identifier must not be empty".to_string(),
        ));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(Error::InvalidInput(format!(
            "identifier must not contain path separators: {trimmed}"
        )));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(Error::InvalidInput(
            "path traversal is not allowed".to_string(),
        ));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(Error::InvalidInput(
            "control characters are not allowed in identifiers".to_string(),
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> DataPaths {
        DataPaths::new("/data/ML/big-data-full")
    }

    #[test]
    fn test_sub_run_dir_layout() {
        let dir = paths().sub_run_dir("Zr49Cu49Al2", "21", "0").unwrap();
        assert_eq!(
            dir,
            PathBuf::from("/data/ML/big-data-full/Zr49Cu49Al2/c/md/lammps/100/21/2000/0")
        );
    }

    #[test]
    fn test_run_dir_is_sub_run_container() {
        let run = paths().run_dir("ZrCuAl", "3").unwrap();
        let sub = paths().sub_run_dir("ZrCuAl", "3", "7").unwrap();
        assert_eq!(sub.parent().unwrap(), run);
    }

    #[test]
    fn test_dump_file_lives_under_composition() {
        let dump = paths().dump_file("ZrCuAl").unwrap();
        assert_eq!(
            dump,
            PathBuf::from("/data/ML/big-data-full/ZrCuAl/zca-th300.dump")
        );
    }

    #[test]
    fn test_descriptor_file_uses_sibling_tree() {
        let vec = paths().descriptor_file("ZrCuAl", "1", "0").unwrap();
        assert_eq!(
            vec,
            PathBuf::from("/data/ML/big-data-full/ZrCuAl-SOAPS/c/md/lammps/100/1/2000/0/SOAPS.vec")
        );
    }

    #[test]
    fn test_rejects_traversal_and_separators() {
        assert!(paths().composition_dir("..").is_err());
        assert!(paths().composition_dir("a/b").is_err());
        assert!(paths().composition_dir("a\\b").is_err());
        assert!(paths().composition_dir("").is_err());
        assert!(paths().sub_run_dir("ZrCuAl", "1", "../0").is_err());
    }

    #[test]
    fn test_identifier_is_trimmed() {
        assert_eq!(validate_component(" ZrCuAl ").unwrap(), "ZrCuAl");
    }
}
