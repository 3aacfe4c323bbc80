//! Diff tree model.
//!
//! The structural difference between two API descriptions, as produced by an
//! external diff engine. Schema differences live in a [`SchemaGraph`] arena and
//! refer to each other by [`NodeId`], so one node may be shared between several
//! parents and a composition branch may point back at an ancestor.
//!
//! The analysis only reads this structure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Vendor extension values attached to the revision of a schema node.
pub type Metadata = BTreeMap<String, Value>;

/// Index of a node in a [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the `deprecated` flag changed between base and revision.
///
/// `None` on either side means the flag was absent in that version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecatedTransition {
    #[serde(default)]
    pub from: Option<bool>,
    #[serde(default)]
    pub to: Option<bool>,
}

impl DeprecatedTransition {
    pub fn new(from: Option<bool>, to: Option<bool>) -> Self {
        Self { from, to }
    }

    /// `false`/absent to `true`.
    pub fn is_newly_deprecated(&self) -> bool {
        self.to == Some(true) && self.from != Some(true)
    }

    /// `true` to `false`/absent.
    pub fn is_reactivated(&self) -> bool {
        self.from == Some(true) && self.to != Some(true)
    }
}

/// Composition keyword of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositionKind {
    AllOf,
    OneOf,
    AnyOf,
}

impl CompositionKind {
    pub const ALL: [CompositionKind; 3] = [Self::AllOf, Self::OneOf, Self::AnyOf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllOf => "allOf",
            Self::OneOf => "oneOf",
            Self::AnyOf => "anyOf",
        }
    }
}

/// Comparison of one schema fragment between the base and revision documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDiffNode {
    /// Object properties that differ.
    pub properties: BTreeMap<String, NodeId>,
    pub all_of: Vec<NodeId>,
    pub one_of: Vec<NodeId>,
    pub any_of: Vec<NodeId>,
    /// Change of the `deprecated` flag, if any.
    pub deprecated: Option<DeprecatedTransition>,
    /// Extensions of the revision, e.g. `x-stability-level` and `x-sunset`.
    pub metadata: Metadata,
}

impl SchemaDiffNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, node: NodeId) -> Self {
        self.properties.insert(name.into(), node);
        self
    }

    pub fn with_branch(mut self, kind: CompositionKind, node: NodeId) -> Self {
        match kind {
            CompositionKind::AllOf => self.all_of.push(node),
            CompositionKind::OneOf => self.one_of.push(node),
            CompositionKind::AnyOf => self.any_of.push(node),
        }
        self
    }

    pub fn with_deprecated(mut self, from: Option<bool>, to: Option<bool>) -> Self {
        self.deprecated = Some(DeprecatedTransition::new(from, to));
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Branches of one composition keyword.
    pub fn branches(&self, kind: CompositionKind) -> &[NodeId] {
        match kind {
            CompositionKind::AllOf => &self.all_of,
            CompositionKind::OneOf => &self.one_of,
            CompositionKind::AnyOf => &self.any_of,
        }
    }
}

static EMPTY_NODE: SchemaDiffNode = SchemaDiffNode {
    properties: BTreeMap::new(),
    all_of: Vec::new(),
    one_of: Vec::new(),
    any_of: Vec::new(),
    deprecated: None,
    metadata: BTreeMap::new(),
};

/// Arena holding every schema difference node of one diff.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    nodes: Vec<SchemaDiffNode>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: SchemaDiffNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Allocate an empty slot to be filled later with [`replace`](Self::replace).
    ///
    /// Lets producers wire references to nodes that are not built yet,
    /// including references back to an ancestor.
    pub fn reserve(&mut self) -> NodeId {
        self.push(SchemaDiffNode::default())
    }

    /// Overwrite a node. Returns false if `id` is not part of this graph.
    pub fn replace(&mut self, id: NodeId, node: SchemaDiffNode) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(slot) => {
                *slot = node;
                true
            }
            None => false,
        }
    }

    /// Look up a node. Unknown ids read as an empty node.
    pub fn node(&self, id: NodeId) -> &SchemaDiffNode {
        self.nodes.get(id.0).unwrap_or(&EMPTY_NODE)
    }

}

/// Content of a request body or of one response, keyed by media type.
///
/// A `None` entry is a media type that changed without a schema difference.
#[derive(Debug, Clone, Default)]
pub struct ContentDiff {
    pub media_types: BTreeMap<String, Option<NodeId>>,
}

impl ContentDiff {
    /// Schema roots of all media types that carry a schema difference.
    pub fn schema_roots(&self) -> Vec<NodeId> {
        self.media_types.values().filter_map(|root| *root).collect()
    }
}

/// A modified operation.
#[derive(Debug, Clone, Default)]
pub struct OperationDiff {
    pub operation_id: Option<String>,
    pub request_body: Option<ContentDiff>,
    /// Modified responses keyed by status code.
    pub responses: BTreeMap<String, ContentDiff>,
}

/// A modified path item, keyed by HTTP method.
#[derive(Debug, Clone, Default)]
pub struct PathDiff {
    pub operations: BTreeMap<String, OperationDiff>,
}

/// The complete diff of two API descriptions.
#[derive(Debug, Clone, Default)]
pub struct DiffReport {
    pub graph: SchemaGraph,
    /// Modified paths.
    pub paths: BTreeMap<String, PathDiff>,
    /// Modified shared component schemas.
    pub components: BTreeMap<String, NodeId>,
}

impl DiffReport {
    pub fn new(graph: SchemaGraph) -> Self {
        Self {
            graph,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_classification() {
        assert!(DeprecatedTransition::new(None, Some(true)).is_newly_deprecated());
        assert!(DeprecatedTransition::new(Some(false), Some(true)).is_newly_deprecated());
        assert!(!DeprecatedTransition::new(Some(true), Some(true)).is_newly_deprecated());
        assert!(!DeprecatedTransition::new(Some(false), None).is_newly_deprecated());

        assert!(DeprecatedTransition::new(Some(true), Some(false)).is_reactivated());
        assert!(DeprecatedTransition::new(Some(true), None).is_reactivated());
        assert!(!DeprecatedTransition::new(None, Some(true)).is_reactivated());
    }

    #[test]
    fn test_reserve_and_replace_allows_cycles() {
        let mut graph = SchemaGraph::new();
        let root = graph.reserve();
        let node = SchemaDiffNode::new().with_branch(CompositionKind::AllOf, root);
        assert!(graph.replace(root, node));

        assert_eq!(graph.node(root).all_of, vec![root]);
        assert!(!graph.replace(NodeId(7), SchemaDiffNode::new()));
    }

    #[test]
    fn test_unknown_node_reads_as_empty() {
        let graph = SchemaGraph::new();
        let node = graph.node(NodeId(3));
        assert!(node.properties.is_empty());
        assert!(node.deprecated.is_none());
    }

    #[test]
    fn test_schema_roots_skip_media_types_without_schema() {
        let mut content = ContentDiff::default();
        content
            .media_types
            .insert("application/json".to_string(), Some(NodeId(0)));
        content.media_types.insert("text/plain".to_string(), None);
        assert_eq!(content.schema_roots(), vec![NodeId(0)]);
    }
}
