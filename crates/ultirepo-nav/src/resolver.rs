//! Recursive navigation resolution.
//!
//! The resolver walks a navigation tree depth-first, left to right. Plain
//! leaves pass through (placed under the enclosing include's base directory
//! when there is one), mappings and sequences are rebuilt from their resolved
//! children, and leaves that start with a registered marker are handed to the
//! marker's [`IncludeHandler`](crate::IncludeHandler).

use std::path::{Component, Path, PathBuf};

use crate::context::{ResolveContext, Resolved};
use crate::error::NavError;
use crate::node::NavNode;
use crate::registry::{HandlerRegistry, IncludeRequest};

/// Navigation resolution engine.
///
/// # Example
///
/// ```
/// use ultirepo_nav::{HandlerRegistry, NavNode, ResolveContext, Resolver};
///
/// let registry = HandlerRegistry::new();
/// let resolver = Resolver::new(&registry);
///
/// let nav = vec![NavNode::leaf("index.md")];
/// let resolved = resolver.resolve(&nav, &ResolveContext::default()).unwrap();
/// assert_eq!(resolved.nav, nav);
/// assert!(resolved.provenance.is_empty());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    registry: &'a HandlerRegistry,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a handler registry.
    #[must_use]
    pub fn new(registry: &'a HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Handler registry used for include dispatch.
    #[must_use]
    pub fn registry(&self) -> &'a HandlerRegistry {
        self.registry
    }

    /// Resolve a navigation list.
    ///
    /// If `ctx` is already past its depth ceiling the input is returned
    /// unchanged. That is a stop condition, not an error.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an include handler.
    pub fn resolve(&self, nav: &[NavNode], ctx: &ResolveContext) -> Result<Resolved, NavError> {
        if ctx.exceeds_max_depth() {
            tracing::info!(
                depth = ctx.depth,
                max_depth = ctx.max_depth,
                "Maximum include depth reached, leaving navigation unresolved"
            );
            return Ok(Resolved::nodes(nav.to_vec()));
        }

        let mut resolved = Resolved::default();
        for node in nav {
            resolved.extend(self.resolve_node(node, ctx)?);
        }
        Ok(resolved)
    }

    /// Resolve a single node.
    ///
    /// Sequences flatten into their resolved elements; mappings and leaves
    /// usually resolve to one node, includes to any number.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an include handler.
    pub fn resolve_node(&self, node: &NavNode, ctx: &ResolveContext) -> Result<Resolved, NavError> {
        match node {
            NavNode::Mapping(key, value) => self.resolve_mapping(key, value, ctx),
            NavNode::Sequence(items) => {
                let mut resolved = Resolved::default();
                for item in items {
                    resolved.extend(self.resolve_node(item, ctx)?);
                }
                Ok(resolved)
            }
            NavNode::Leaf(value) => self.resolve_leaf(value, ctx),
        }
    }

    fn resolve_mapping(
        &self,
        key: &str,
        value: &NavNode,
        ctx: &ResolveContext,
    ) -> Result<Resolved, NavError> {
        let inner = ctx.with_parent_path(self.section_path(key, value, &ctx.parent_path));
        let Resolved {
            mut nav,
            provenance,
        } = self.resolve_node(value, &inner)?;

        let value = if nav.len() == 1 {
            nav.swap_remove(0)
        } else {
            NavNode::Sequence(nav)
        };

        Ok(Resolved {
            nav: vec![NavNode::mapping(key, value)],
            provenance,
        })
    }

    /// Parent path for the children of a mapping labelled `key`.
    ///
    /// The label's segment is appended unless the parent already ends with it
    /// or the value is a plain page (no directory is implied for it). Labels
    /// that are not a single plain path segment (`..`, `a/b`, `/x`) never
    /// extend the path.
    fn section_path(&self, key: &str, value: &NavNode, parent: &Path) -> PathBuf {
        let segment = section_segment(key);
        let repeats_parent = parent
            .file_name()
            .is_some_and(|last| last == segment.as_str());
        let is_plain_page = value
            .as_leaf()
            .is_some_and(|leaf| self.registry.match_marker(leaf).is_none());

        if !is_single_segment(&segment) || repeats_parent || is_plain_page {
            parent.to_path_buf()
        } else {
            parent.join(segment)
        }
    }

    fn resolve_leaf(&self, value: &str, ctx: &ResolveContext) -> Result<Resolved, NavError> {
        let Some(marker) = self.registry.match_marker(value) else {
            let leaf = match &ctx.base_dir {
                Some(base) => place_under(base, value),
                None => value.to_owned(),
            };
            return Ok(Resolved::nodes(vec![NavNode::Leaf(leaf)]));
        };

        let child = ctx.child(&ctx.parent_path);
        if child.exceeds_max_depth() {
            tracing::info!(
                marker,
                depth = child.depth,
                max_depth = child.max_depth,
                "Maximum include depth reached, leaving directive unresolved"
            );
            return Ok(Resolved::nodes(vec![NavNode::leaf(value)]));
        }

        let payload = strip_marker(value, marker);
        let handler = self.registry.lookup(marker)?;
        tracing::debug!(
            marker,
            handler = handler.name(),
            payload,
            parent = %child.parent_path.display(),
            depth = child.depth,
            "Resolving include"
        );

        handler.execute(
            IncludeRequest {
                marker,
                payload,
                context: child,
            },
            self,
        )
    }
}

/// Directory segment for a section label: lowercase, spaces become hyphens.
#[must_use]
pub fn section_segment(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "-")
}

fn is_single_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Remove the marker and the separating space from a directive.
fn strip_marker<'v>(value: &'v str, marker: &str) -> &'v str {
    let rest = value.strip_prefix(marker).unwrap_or(value);
    rest.strip_prefix(' ').unwrap_or(rest).trim()
}

/// Place a page path from an included navigation under `base`.
///
/// External links, absolute paths, and paths already under `base` are kept.
fn place_under(base: &Path, leaf: &str) -> String {
    let base_str = base.to_string_lossy();
    let base_str = base_str.trim_end_matches('/');
    if base_str.is_empty() || leaf.contains("://") || leaf.starts_with('/') {
        return leaf.to_owned();
    }
    if Path::new(leaf).starts_with(base) {
        return leaf.to_owned();
    }
    format!("{base_str}/{leaf}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_section_segment() {
        assert_eq!(section_segment("Getting Started"), "getting-started");
        assert_eq!(section_segment("API"), "api");
        assert_eq!(section_segment("  Guide "), "guide");
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(
            strip_marker("!include https://x/y.git?ref=a", "!include"),
            "https://x/y.git?ref=a"
        );
        assert_eq!(strip_marker("!include", "!include"), "");
    }

    #[test]
    fn test_place_under() {
        let base = Path::new("guide");
        assert_eq!(place_under(base, "intro.md"), "guide/intro.md");
        assert_eq!(place_under(base, "api/ref.md"), "guide/api/ref.md");
        assert_eq!(place_under(base, "guide/intro.md"), "guide/intro.md");
        assert_eq!(place_under(base, "guides/intro.md"), "guide/guides/intro.md");
        assert_eq!(
            place_under(base, "https://example.com/page"),
            "https://example.com/page"
        );
        assert_eq!(place_under(base, "/abs/page.md"), "/abs/page.md");
        assert_eq!(place_under(Path::new(""), "intro.md"), "intro.md");
    }

    #[test]
    fn test_section_path_rules() {
        let registry = HandlerRegistry::new();
        let resolver = Resolver::new(&registry);
        let list = NavNode::Sequence(vec![NavNode::leaf("a.md")]);

        assert_eq!(
            resolver.section_path("User Guide", &list, Path::new("")),
            PathBuf::from("user-guide")
        );
        assert_eq!(
            resolver.section_path("Guide", &list, Path::new("team/guide")),
            PathBuf::from("team/guide")
        );
        assert_eq!(
            resolver.section_path("Usage", &NavNode::leaf("usage.md"), Path::new("guide")),
            PathBuf::from("guide")
        );
    }

    #[test]
    fn test_section_path_ignores_non_segment_labels() {
        let registry = HandlerRegistry::new();
        let resolver = Resolver::new(&registry);
        let list = NavNode::Sequence(vec![NavNode::leaf("a.md")]);

        for label in ["..", ".", "../../x", "a/b", "/etc", "  "] {
            assert_eq!(
                resolver.section_path(label, &list, Path::new("team")),
                PathBuf::from("team"),
                "label {label:?}"
            );
        }
        assert_eq!(
            resolver.section_path("..", &list, Path::new("")),
            PathBuf::new()
        );
    }
}
