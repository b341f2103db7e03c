//! Navigation file lookup and loading shared by the built-in handlers.
//!
//! An included navigation lives in a `nav.yml` (or `nav.yaml`) file:
//!
//! ```yaml
//! docs_dir: docs          # optional
//! nav:
//!   - intro.md
//!   - Usage: usage.md
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;

use crate::context::{Provenance, ResolveContext, Resolved};
use crate::error::{LoadErrorKind, NavError};
use crate::node::NavNode;
use crate::resolver::Resolver;

/// Navigation file names, in probe order.
pub const NAV_FILE_NAMES: [&str; 2] = ["nav.yml", "nav.yaml"];

/// Docs directory assumed when neither the nav file nor the nav path name one.
const DEFAULT_DOCS_DIR: &str = "docs";

#[derive(Debug, Deserialize)]
struct NavFile {
    nav: Value,
    #[serde(default)]
    docs_dir: Option<String>,
}

/// Check that `nav_path` is a relative path that stays inside its root.
///
/// `.` components are dropped; the result may be empty (the root itself).
pub(crate) fn validate_nav_path(nav_path: &str) -> Result<PathBuf, NavError> {
    let mut normalized = PathBuf::new();
    for component in Path::new(nav_path).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(NavError::InvalidNavPath(nav_path.to_owned()));
            }
        }
    }
    Ok(normalized)
}

fn is_nav_file_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| NAV_FILE_NAMES.contains(&name))
}

/// Directory holding the navigation file named by `nav_path`.
fn nav_dir(nav_path: &Path) -> &Path {
    if is_nav_file_name(nav_path) {
        nav_path.parent().unwrap_or(Path::new(""))
    } else {
        nav_path
    }
}

/// Find the navigation file for `nav_path` under `content_dir`.
///
/// A path ending in a navigation file name is used as is; anything else is
/// treated as a directory and probed for each of [`NAV_FILE_NAMES`].
pub(crate) fn locate_nav_file(content_dir: &Path, nav_path: &Path) -> Result<PathBuf, NavError> {
    let target = content_dir.join(nav_path);
    if is_nav_file_name(nav_path) {
        return if target.exists() {
            Ok(target)
        } else {
            Err(NavError::NavFileNotFound(target))
        };
    }

    NAV_FILE_NAMES
        .iter()
        .map(|name| target.join(name))
        .find(|candidate| candidate.exists())
        .ok_or_else(|| NavError::NavFileNotFound(target.join(NAV_FILE_NAMES[0])))
}

fn load_error(path: &Path, kind: LoadErrorKind, message: impl Into<String>) -> NavError {
    NavError::NavFileLoad {
        path: path.to_path_buf(),
        kind,
        message: message.into(),
    }
}

fn load_nav_file(path: &Path) -> Result<NavFile, NavError> {
    let metadata =
        fs::metadata(path).map_err(|e| load_error(path, LoadErrorKind::from_io(&e), e.to_string()))?;
    if !metadata.is_file() {
        return Err(load_error(path, LoadErrorKind::NotAFile, "path is a directory"));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| load_error(path, LoadErrorKind::from_io(&e), e.to_string()))?;
    serde_yaml::from_str(&content).map_err(|e| load_error(path, LoadErrorKind::Decode, e.to_string()))
}

/// Documents root and sub-directory of an included navigation.
///
/// - An explicit `docs_dir` is the root; the sub-directory is the nav
///   directory relative to it (empty when the nav file lives outside).
/// - Otherwise a nav file in a sub-directory uses the content root with that
///   directory as sub-directory.
/// - A nav file at the content root falls back to `docs/`.
fn docs_location(
    content_dir: &Path,
    nav_dir: &Path,
    docs_dir: Option<&str>,
) -> Result<(PathBuf, PathBuf), NavError> {
    match docs_dir {
        Some(docs_dir) => {
            let docs_dir = validate_nav_path(docs_dir)?;
            let sub_dir = nav_dir
                .strip_prefix(&docs_dir)
                .map(Path::to_path_buf)
                .unwrap_or_default();
            Ok((content_dir.join(docs_dir), sub_dir))
        }
        None if nav_dir.as_os_str().is_empty() => {
            Ok((content_dir.join(DEFAULT_DOCS_DIR), PathBuf::new()))
        }
        None => Ok((content_dir.to_path_buf(), nav_dir.to_path_buf())),
    }
}

/// Load, resolve, and record the navigation at `nav_path` inside `content_dir`.
///
/// `context` is the include's child context. The nested navigation is
/// resolved under it and its provenance record is appended after the
/// records of any nested includes.
pub(crate) fn include_nav(
    content_dir: &Path,
    nav_path: &Path,
    context: &ResolveContext,
    resolver: &Resolver<'_>,
) -> Result<Resolved, NavError> {
    let path = locate_nav_file(content_dir, nav_path)?;
    let NavFile { nav, docs_dir } = load_nav_file(&path)?;
    tracing::debug!(path = %path.display(), docs_dir = ?docs_dir, "Loaded navigation file");

    let nodes = NavNode::root_from_yaml(nav)?;
    let mut resolved = resolver.resolve(&nodes, &context.nested())?;

    let (orig_docs_dir, orig_docs_sub_dir) =
        docs_location(content_dir, nav_dir(nav_path), docs_dir.as_deref())?;
    resolved.provenance.push(Provenance {
        orig_docs_dir,
        orig_docs_sub_dir,
        alias: context.parent_path.clone(),
    });
    Ok(resolved)
}
