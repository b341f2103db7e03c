//! Navigation include resolution for multi-repository MkDocs sites.
//!
//! A site's `nav` may contain include directives that pull navigation
//! fragments from other places:
//!
//! ```yaml
//! nav:
//!   - index.md
//!   - Guide: "!include https://example.com/org/guide.git?ref=v1&nav_path=site/nav.yml"
//!   - Runbooks: "%include ops/runbooks"
//! ```
//!
//! [`Resolver`] walks the tree, hands every directive to the
//! [`IncludeHandler`] registered for its marker, and splices the result back
//! in. Alongside the resolved tree it returns one [`Provenance`] record per
//! include, which tells the merge stage where the included pages live.
//!
//! # Architecture
//!
//! - [`NavNode`]: navigation tree with YAML conversion
//! - [`Resolver`]: depth-bounded recursive resolution
//! - [`HandlerRegistry`]: marker to handler bindings
//! - [`GitInclude`] and [`LocalInclude`]: built-in handlers
//! - [`SourceFetcher`]: repository fetch abstraction used by [`GitInclude`]
//! - [`MockFetcher`]: in-memory fetcher for tests (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ultirepo_nav::{HandlerRegistry, NavNode, ResolveContext, Resolver};
//!
//! let registry = HandlerRegistry::with_defaults(Arc::new(fetcher), project_root);
//! let nav = NavNode::root_from_yaml(site["nav"].clone())?;
//! let resolved = Resolver::new(&registry).resolve(&nav, &ResolveContext::new(1))?;
//! ```

mod context;
mod error;
mod fetch;
mod handler;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod node;
mod registry;
mod resolver;

pub use context::{DEFAULT_MAX_DEPTH, Provenance, ResolveContext, Resolved};
pub use error::{FetchError, LoadErrorKind, NavError, RegistryError};
pub use fetch::SourceFetcher;
pub use handler::{GitInclude, LocalInclude, Locator, NAV_FILE_NAMES};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockFetcher;
pub use node::{NavNode, nav_to_yaml};
pub use registry::{GIT_MARKER, HandlerRegistry, IncludeHandler, IncludeRequest, LOCAL_MARKER};
pub use resolver::{Resolver, section_segment};
