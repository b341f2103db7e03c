//! Local include handler (`%include`).

use std::path::{Path, PathBuf};

use super::nav_file::{include_nav, validate_nav_path};
use crate::context::Resolved;
use crate::error::NavError;
use crate::registry::{IncludeHandler, IncludeRequest};
use crate::resolver::Resolver;

/// Includes a navigation file from a directory of the project.
///
/// The payload is a navigation file or a directory holding one, relative to
/// the project root.
///
/// The root is fixed when the handler is created. A `%include` found inside
/// a fetched repository's `nav.yml` therefore reads from the host project,
/// never from the fetched checkout.
#[derive(Debug)]
pub struct LocalInclude {
    root: PathBuf,
}

impl LocalInclude {
    /// Create a handler that reads from `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Project root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl IncludeHandler for LocalInclude {
    fn name(&self) -> &str {
        "local"
    }

    fn execute(
        &self,
        request: IncludeRequest<'_>,
        resolver: &Resolver<'_>,
    ) -> Result<Resolved, NavError> {
        let nav_path = validate_nav_path(request.payload)?;
        tracing::debug!(
            root = %self.root.display(),
            nav_path = %nav_path.display(),
            "Including local navigation"
        );
        include_nav(&self.root, &nav_path, &request.context, resolver)
    }
}
