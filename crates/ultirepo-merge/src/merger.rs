//! Docs directory merging.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use ultirepo_nav::{NAV_FILE_NAMES, Provenance};

use crate::error::MergeError;

/// Marker file identifying a directory written by [`Merger`].
pub const MERGE_MARKER: &str = ".ultirepo-merged";

/// A destination path provided by more than one source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DuplicateFile {
    /// Path relative to the destination.
    pub path: PathBuf,
    /// Source directory whose copy was kept.
    pub kept_from: PathBuf,
    /// Source directory whose copy was skipped.
    pub skipped_from: PathBuf,
}

/// Outcome of a merge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Destination directory.
    pub destination: PathBuf,
    /// Copied files, relative to the destination, mapped to the source
    /// directory they came from.
    pub files: BTreeMap<PathBuf, PathBuf>,
    /// Files skipped because an earlier source already provided them.
    pub duplicates: Vec<DuplicateFile>,
}

/// Copies documentation sources into one destination directory.
#[derive(Clone, Debug)]
pub struct Merger {
    destination: PathBuf,
}

impl Merger {
    /// Create a merger writing into `destination`.
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// Destination directory.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Merge the host docs directory and every included source.
    ///
    /// The host docs are copied into the destination root first, then each
    /// provenance record's source directory into `<destination>/<alias>`, in
    /// order. Missing sources are skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`MergeError::InvalidAlias`] if an alias is absolute or contains
    ///   `..`; nothing is written in that case
    /// - [`MergeError::DestinationNotEmpty`] if the destination holds files
    ///   from somewhere other than a previous merge
    /// - [`MergeError::Io`] if reading a source or writing the destination
    ///   fails
    pub fn merge(
        &self,
        host_docs_dir: Option<&Path>,
        provenance: &[Provenance],
    ) -> Result<MergeReport, MergeError> {
        if let Some(record) = provenance.iter().find(|r| !is_relative_alias(&r.alias)) {
            return Err(MergeError::InvalidAlias(record.alias.clone()));
        }
        self.prepare_destination()?;

        let mut report = MergeReport {
            destination: self.destination.clone(),
            files: BTreeMap::new(),
            duplicates: Vec::new(),
        };

        if let Some(host_docs_dir) = host_docs_dir {
            self.copy_source(host_docs_dir, Path::new(""), &mut report)?;
        }
        for record in provenance {
            self.copy_source(&record.source_dir(), &record.alias, &mut report)?;
        }

        tracing::info!(
            destination = %self.destination.display(),
            files = report.files.len(),
            duplicates = report.duplicates.len(),
            "Merged documentation sources"
        );
        Ok(report)
    }

    /// Create or clear the destination.
    fn prepare_destination(&self) -> Result<(), MergeError> {
        let dest = &self.destination;
        if dest.exists() {
            let entries = fs::read_dir(dest)
                .map_err(MergeError::io(dest))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(MergeError::io(dest))?;

            if !entries.is_empty() {
                if !dest.join(MERGE_MARKER).is_file() {
                    return Err(MergeError::DestinationNotEmpty(dest.clone()));
                }
                tracing::debug!(destination = %dest.display(), "Clearing previous merge");
                for entry in entries {
                    let path = entry.path();
                    let result = if entry.file_type().is_ok_and(|t| t.is_dir()) {
                        fs::remove_dir_all(&path)
                    } else {
                        fs::remove_file(&path)
                    };
                    result.map_err(MergeError::io(&path))?;
                }
            }
        } else {
            fs::create_dir_all(dest).map_err(MergeError::io(dest))?;
        }

        let marker = dest.join(MERGE_MARKER);
        fs::write(&marker, "").map_err(MergeError::io(&marker))
    }

    fn copy_source(
        &self,
        source: &Path,
        alias: &Path,
        report: &mut MergeReport,
    ) -> Result<(), MergeError> {
        if !source.is_dir() {
            tracing::warn!(
                source = %source.display(),
                "Documentation source not found, skipping"
            );
            return Ok(());
        }
        tracing::debug!(
            source = %source.display(),
            alias = %alias.display(),
            "Copying documentation source"
        );
        self.copy_dir(source, source, alias, report)
    }

    fn copy_dir(
        &self,
        source: &Path,
        dir: &Path,
        rel: &Path,
        report: &mut MergeReport,
    ) -> Result<(), MergeError> {
        let mut entries = fs::read_dir(dir)
            .map_err(MergeError::io(dir))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(MergeError::io(dir))?;
        entries.sort_by_key(fs::DirEntry::file_name);

        for entry in entries {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.starts_with('.') {
                continue;
            }

            let path = entry.path();
            let rel_path = rel.join(&name);
            if path.is_dir() {
                self.copy_dir(source, &path, &rel_path, report)?;
                continue;
            }
            if NAV_FILE_NAMES.contains(&name_str.as_ref()) {
                continue;
            }

            if let Some(kept_from) = report.files.get(&rel_path) {
                tracing::warn!(
                    path = %rel_path.display(),
                    kept_from = %kept_from.display(),
                    skipped_from = %source.display(),
                    "Duplicate file, keeping first copy"
                );
                report.duplicates.push(DuplicateFile {
                    path: rel_path,
                    kept_from: kept_from.clone(),
                    skipped_from: source.to_path_buf(),
                });
                continue;
            }

            let target = self.destination.join(&rel_path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(MergeError::io(parent))?;
            }
            fs::copy(&path, &target).map_err(MergeError::io(&path))?;
            report.files.insert(rel_path, source.to_path_buf());
        }
        Ok(())
    }
}

/// Whether `alias` stays under the directory it is joined onto.
fn is_relative_alias(alias: &Path) -> bool {
    alias
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}
