//! Include handler trait and marker registry.

use std::path::PathBuf;
use std::sync::Arc;

use crate::context::{ResolveContext, Resolved};
use crate::error::{NavError, RegistryError};
use crate::fetch::SourceFetcher;
use crate::handler::{GitInclude, LocalInclude};
use crate::resolver::Resolver;

/// Marker for fetch-based includes.
pub const GIT_MARKER: &str = "!include";

/// Marker for local filesystem includes.
pub const LOCAL_MARKER: &str = "%include";

/// An include directive ready to be executed.
#[derive(Debug)]
pub struct IncludeRequest<'a> {
    /// Marker that matched (e.g., `!include`).
    pub marker: &'a str,
    /// Directive payload with the marker and separating space removed.
    pub payload: &'a str,
    /// Context for the include: depth already incremented, parent path set
    /// to the section the include appears under.
    pub context: ResolveContext,
}

/// Handler for one include marker.
///
/// Handlers turn a directive payload into a resolved navigation fragment.
/// A handler that loads another navigation tree resolves it through the
/// `resolver` it is given, which keeps depth accounting in one place.
///
/// # Example
///
/// ```
/// use ultirepo_nav::{IncludeHandler, IncludeRequest, NavError, NavNode, Resolved, Resolver};
///
/// struct EchoInclude;
///
/// impl IncludeHandler for EchoInclude {
///     fn name(&self) -> &str { "echo" }
///
///     fn execute(&self, request: IncludeRequest<'_>, _resolver: &Resolver<'_>) -> Result<Resolved, NavError> {
///         Ok(Resolved::nodes(vec![NavNode::leaf(request.payload)]))
///     }
/// }
/// ```
pub trait IncludeHandler: Send + Sync {
    /// Handler kind name, used by [`HandlerRegistry::register_named`].
    fn name(&self) -> &str;

    /// Execute the include.
    ///
    /// # Errors
    ///
    /// Returns any error raised while fetching, loading, or resolving the
    /// included navigation.
    fn execute(
        &self,
        request: IncludeRequest<'_>,
        resolver: &Resolver<'_>,
    ) -> Result<Resolved, NavError>;
}

struct RegistryEntry {
    marker: String,
    handler: Arc<dyn IncludeHandler>,
}

/// Maps include markers to handlers.
///
/// Markers are kept in registration order; [`all_markers`](Self::all_markers)
/// returns them in that order.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Vec<RegistryEntry>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (&e.marker, e.handler.name())))
            .finish()
    }
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in handlers.
    ///
    /// - `!include` fetches a repository through `fetcher`
    /// - `%include` reads navigation from `project_root`
    #[must_use]
    pub fn with_defaults(fetcher: Arc<dyn SourceFetcher>, project_root: PathBuf) -> Self {
        let mut registry = Self::new();
        registry.insert(GIT_MARKER, Arc::new(GitInclude::new(fetcher)));
        registry.insert(LOCAL_MARKER, Arc::new(LocalInclude::new(project_root)));
        registry
    }

    /// Bind `marker` to `handler`.
    ///
    /// Re-registering a marker replaces its handler in place.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidMarker`] if the marker is empty or
    /// contains whitespace.
    pub fn register<H: IncludeHandler + 'static>(
        &mut self,
        marker: &str,
        handler: H,
    ) -> Result<(), RegistryError> {
        validate_marker(marker)?;
        self.insert(marker, Arc::new(handler));
        Ok(())
    }

    /// Bind `marker` to an already registered handler kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::TypeMismatch`] if no registered handler has
    /// the name `handler_name`, or [`RegistryError::InvalidMarker`] for a
    /// malformed marker.
    pub fn register_named(&mut self, marker: &str, handler_name: &str) -> Result<(), RegistryError> {
        validate_marker(marker)?;
        let handler = self
            .entries
            .iter()
            .find(|e| e.handler.name() == handler_name)
            .map(|e| Arc::clone(&e.handler))
            .ok_or_else(|| RegistryError::TypeMismatch {
                marker: marker.to_owned(),
                handler: handler_name.to_owned(),
            })?;
        self.insert(marker, handler);
        Ok(())
    }

    fn insert(&mut self, marker: &str, handler: Arc<dyn IncludeHandler>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.marker == marker) {
            entry.handler = handler;
        } else {
            self.entries.push(RegistryEntry {
                marker: marker.to_owned(),
                handler,
            });
        }
    }

    /// Handler bound to `marker`.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::HandlerNotRegistered`] for unknown markers.
    pub fn lookup(&self, marker: &str) -> Result<&dyn IncludeHandler, NavError> {
        self.entries
            .iter()
            .find(|e| e.marker == marker)
            .map(|e| e.handler.as_ref())
            .ok_or_else(|| NavError::HandlerNotRegistered(marker.to_owned()))
    }

    /// All registered markers, in registration order.
    #[must_use]
    pub fn all_markers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.marker.as_str()).collect()
    }

    /// Marker that `value` starts with, if any.
    ///
    /// The marker must be followed by a space or end the string. Markers
    /// cannot contain whitespace, so at most one marker matches; the scan
    /// runs newest-first.
    #[must_use]
    pub fn match_marker(&self, value: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .map(|e| e.marker.as_str())
            .find(|marker| {
                value
                    .strip_prefix(marker)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
            })
    }
}

fn validate_marker(marker: &str) -> Result<(), RegistryError> {
    if marker.is_empty() || marker.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidMarker(marker.to_owned()));
    }
    Ok(())
}
