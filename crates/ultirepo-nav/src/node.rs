//! Navigation tree model.
//!
//! A navigation tree is what MkDocs reads from the `nav` key of a site
//! configuration: a list whose entries are page paths, nested lists, or
//! single-key mappings from a section label to another entry.
//!
//! ```yaml
//! nav:
//!   - index.md
//!   - Guide:
//!       - guide/intro.md
//!       - Usage: guide/usage.md
//! ```

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_yaml::Value;
use serde_yaml::value::TaggedValue;

use crate::error::NavError;

/// A single node of a navigation tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavNode {
    /// Page path, external link, or include directive.
    Leaf(String),
    /// Ordered list of nodes.
    Sequence(Vec<NavNode>),
    /// Section label mapped to its content.
    Mapping(String, Box<NavNode>),
}

impl NavNode {
    /// Create a leaf node.
    #[must_use]
    pub fn leaf(path: impl Into<String>) -> Self {
        Self::Leaf(path.into())
    }

    /// Create a single-key mapping node.
    #[must_use]
    pub fn mapping(key: impl Into<String>, value: NavNode) -> Self {
        Self::Mapping(key.into(), Box::new(value))
    }

    /// Returns the leaf string, if this node is a leaf.
    #[must_use]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a YAML value into a navigation node.
    ///
    /// Returns `Ok(None)` for shapes a navigation tree cannot hold (null,
    /// booleans, numbers, non-string tagged values). Those are dropped from
    /// sequences and become an empty list when used as a mapping value.
    ///
    /// Unquoted include directives are parsed by YAML as tagged scalars
    /// (`Guide: !include https://...`); they are turned back into the leaf
    /// `"!include https://..."`.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::MalformedNode`] for mappings that do not have
    /// exactly one string key.
    pub fn from_yaml(value: Value) -> Result<Option<Self>, NavError> {
        match value {
            Value::String(s) => Ok(Some(Self::Leaf(s))),
            Value::Sequence(items) => Ok(Some(Self::Sequence(Self::list_from_yaml(items)?))),
            Value::Mapping(mapping) => {
                if mapping.len() != 1 {
                    return Err(NavError::MalformedNode(format!(
                        "mapping must have exactly one key, found {}",
                        mapping.len()
                    )));
                }
                let Some((key, value)) = mapping.into_iter().next() else {
                    return Err(NavError::MalformedNode("empty mapping".to_owned()));
                };
                let Value::String(key) = key else {
                    return Err(NavError::MalformedNode(format!(
                        "mapping key must be a string, found {key:?}"
                    )));
                };
                let value = Self::from_yaml(value)?.unwrap_or(Self::Sequence(Vec::new()));
                Ok(Some(Self::mapping(key, value)))
            }
            Value::Tagged(tagged) => {
                let TaggedValue { tag, value } = *tagged;
                let tag = tag.to_string();
                match value {
                    Value::String(payload) if is_local_tag(&tag) => {
                        Ok(Some(Self::Leaf(format!("{tag} {payload}"))))
                    }
                    other => {
                        tracing::debug!(%tag, value = ?other, "Skipping unsupported tagged nav entry");
                        Ok(None)
                    }
                }
            }
            other => {
                tracing::debug!(value = ?other, "Skipping unsupported nav entry");
                Ok(None)
            }
        }
    }

    /// Convert a YAML `nav` value into the root list of a navigation tree.
    ///
    /// A scalar root is treated as a one-element list.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::MalformedNode`] if any nested mapping is malformed.
    pub fn root_from_yaml(value: Value) -> Result<Vec<Self>, NavError> {
        match value {
            Value::Sequence(items) => Self::list_from_yaml(items),
            other => Ok(Self::from_yaml(other)?.into_iter().collect()),
        }
    }

    fn list_from_yaml(items: Vec<Value>) -> Result<Vec<Self>, NavError> {
        let mut nodes = Vec::with_capacity(items.len());
        for item in items {
            if let Some(node) = Self::from_yaml(item)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    /// Convert this node to a YAML value.
    #[must_use]
    pub fn to_yaml(&self) -> Value {
        match self {
            Self::Leaf(s) => Value::String(s.clone()),
            Self::Sequence(items) => Value::Sequence(items.iter().map(Self::to_yaml).collect()),
            Self::Mapping(key, value) => {
                let mut mapping = serde_yaml::Mapping::new();
                mapping.insert(Value::String(key.clone()), value.to_yaml());
                Value::Mapping(mapping)
            }
        }
    }
}

/// Convert a navigation root list to a YAML sequence.
#[must_use]
pub fn nav_to_yaml(nav: &[NavNode]) -> Value {
    Value::Sequence(nav.iter().map(NavNode::to_yaml).collect())
}

/// `!include` style tags, not the `!!` core schema tags.
fn is_local_tag(tag: &str) -> bool {
    tag.starts_with('!') && !tag.starts_with("!!")
}

impl Serialize for NavNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(s) => serializer.serialize_str(s),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(key, value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(key, value.as_ref())?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(yaml: &str) -> Vec<NavNode> {
        NavNode::root_from_yaml(serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_from_yaml_mixed_tree() {
        let nav = parse(
            r"
- index.md
- Guide:
    - guide/intro.md
    - Usage: guide/usage.md
",
        );

        assert_eq!(
            nav,
            vec![
                NavNode::leaf("index.md"),
                NavNode::mapping(
                    "Guide",
                    NavNode::Sequence(vec![
                        NavNode::leaf("guide/intro.md"),
                        NavNode::mapping("Usage", NavNode::leaf("guide/usage.md")),
                    ])
                ),
            ]
        );
    }

    #[test]
    fn test_from_yaml_multi_key_mapping_is_malformed() {
        let value: Value = serde_yaml::from_str("- {A: a.md, B: b.md}").unwrap();
        let err = NavNode::root_from_yaml(value).unwrap_err();
        assert!(matches!(err, NavError::MalformedNode(_)), "got {err:?}");
        assert!(err.to_string().contains("exactly one key"));
    }

    #[test]
    fn test_from_yaml_non_string_key_is_malformed() {
        let value: Value = serde_yaml::from_str("- {1: a.md}").unwrap();
        let err = NavNode::root_from_yaml(value).unwrap_err();
        assert!(matches!(err, NavError::MalformedNode(_)));
    }

    #[test]
    fn test_from_yaml_skips_unsupported_scalars() {
        let nav = parse("- a.md\n- 42\n- null\n- true\n- Empty:\n");
        assert_eq!(
            nav,
            vec![
                NavNode::leaf("a.md"),
                NavNode::mapping("Empty", NavNode::Sequence(Vec::new())),
            ]
        );
    }

    #[test]
    fn test_from_yaml_unquoted_include_tag() {
        let nav = parse("- Guide: !include https://example.com/org/repo.git?ref=main&nav_path=docs");
        assert_eq!(
            nav,
            vec![NavNode::mapping(
                "Guide",
                NavNode::leaf("!include https://example.com/org/repo.git?ref=main&nav_path=docs")
            )]
        );
    }

    #[test]
    fn test_from_yaml_scalar_root() {
        assert_eq!(parse("index.md"), vec![NavNode::leaf("index.md")]);
    }

    #[test]
    fn test_to_yaml_matches_source() {
        let source = "- index.md\n- Guide:\n  - intro.md\n  - Usage: usage.md\n";
        let nav = parse(source);
        let value = nav_to_yaml(&nav);
        let original: Value = serde_yaml::from_str(source).unwrap();
        assert_eq!(value, original);
    }

    #[test]
    fn test_serialize_as_plain_yaml() {
        let nav = vec![NavNode::mapping("Usage", NavNode::leaf("usage.md"))];
        let yaml = serde_yaml::to_string(&nav).unwrap();
        assert_eq!(yaml, "- Usage: usage.md\n");
    }

    #[test]
    fn test_serialize_as_json() {
        let node = NavNode::mapping(
            "Guide",
            NavNode::Sequence(vec![NavNode::leaf("a.md"), NavNode::leaf("b.md")]),
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, serde_json::json!({"Guide": ["a.md", "b.md"]}));
    }
}
