//! Resolution state and results.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::node::NavNode;

/// Default maximum include depth.
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Traversal state for one resolution pass.
///
/// Contexts are values: every recursive step derives its own copy, so
/// sibling branches of a sequence never observe each other's parent path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveContext {
    /// Current include depth (0 for the root navigation).
    pub depth: usize,
    /// Includes that would exceed this depth are left unresolved.
    pub max_depth: usize,
    /// Section path derived from enclosing mapping labels (e.g., `team/guide`).
    pub parent_path: PathBuf,
    /// Directory that plain leaves of an included navigation are placed under.
    pub base_dir: Option<PathBuf>,
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ResolveContext {
    /// Create a root context.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
            parent_path: PathBuf::new(),
            base_dir: None,
        }
    }

    /// Context handed to an include handler found under `parent_path`.
    #[must_use]
    pub fn child(&self, parent_path: &Path) -> Self {
        Self {
            depth: self.depth + 1,
            max_depth: self.max_depth,
            parent_path: parent_path.to_path_buf(),
            base_dir: self.base_dir.clone(),
        }
    }

    /// Context for resolving the navigation of an include.
    ///
    /// The include's own parent path seeds both the tracked parent path and
    /// the base directory for plain leaves.
    #[must_use]
    pub fn nested(&self) -> Self {
        Self {
            depth: self.depth,
            max_depth: self.max_depth,
            parent_path: self.parent_path.clone(),
            base_dir: Some(self.parent_path.clone()),
        }
    }

    /// Same context with a different parent path.
    #[must_use]
    pub fn with_parent_path(&self, parent_path: PathBuf) -> Self {
        Self {
            parent_path,
            ..self.clone()
        }
    }

    /// Whether this context is past the depth ceiling.
    #[must_use]
    pub fn exceeds_max_depth(&self) -> bool {
        self.depth > self.max_depth
    }
}

/// Where the files backing a resolved include live.
///
/// The merge stage copies `orig_docs_dir/orig_docs_sub_dir` into
/// `<destination>/alias`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Documents root of the included content.
    pub orig_docs_dir: PathBuf,
    /// Directory under `orig_docs_dir` that holds the included pages.
    pub orig_docs_sub_dir: PathBuf,
    /// Destination directory relative to the merged docs root.
    pub alias: PathBuf,
}

impl Provenance {
    /// Absolute source directory of the included pages.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.orig_docs_dir.join(&self.orig_docs_sub_dir)
    }
}

/// Resolved navigation fragment plus the provenance it depends on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Resolved {
    /// Resolved nodes, in input order.
    pub nav: Vec<NavNode>,
    /// Provenance records, in resolution order.
    pub provenance: Vec<Provenance>,
}

impl Resolved {
    /// A fragment without provenance.
    #[must_use]
    pub fn nodes(nav: Vec<NavNode>) -> Self {
        Self {
            nav,
            provenance: Vec::new(),
        }
    }

    /// Append another fragment, keeping order.
    pub fn extend(&mut self, other: Resolved) {
        self.nav.extend(other.nav);
        self.provenance.extend(other.provenance);
    }
}
