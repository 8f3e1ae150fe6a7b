//! Immutable document hierarchy used by tree traversal.
//!
//! A hierarchy is assembled once through [`DocumentHierarchyBuilder`], which
//! validates its shape, and is read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{LecternError, Result};

/// A node of the document hierarchy (course, unit, topic, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Unique node id.
    pub id: String,
    /// Embedding summarising the subtree.
    pub embedding: Vec<f32>,
    /// Ids of child nodes, in visitation order.
    #[serde(default)]
    pub children: Vec<String>,
    /// Level in the tree as assigned by whoever built it (0 for roots).
    #[serde(default)]
    pub level: usize,
    /// Material ids of the leaves below this node.
    #[serde(default)]
    pub material_ids: BTreeSet<String>,
}

impl HierarchyNode {
    /// Create a node with no children or materials.
    pub fn new(id: impl Into<String>, embedding: Vec<f32>, level: usize) -> Self {
        Self {
            id: id.into(),
            embedding,
            children: Vec::new(),
            level,
            material_ids: BTreeSet::new(),
        }
    }

    /// Set the child ids.
    #[must_use]
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Set the leaf material ids.
    #[must_use]
    pub fn with_materials<I, S>(mut self, material_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.material_ids = material_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A validated, immutable tree (or forest) of [`HierarchyNode`]s.
#[derive(Debug, Clone)]
pub struct DocumentHierarchy {
    nodes: HashMap<String, HierarchyNode>,
    roots: Vec<String>,
    dimension: usize,
}

impl DocumentHierarchy {
    /// Start building a hierarchy.
    pub fn builder() -> DocumentHierarchyBuilder {
        DocumentHierarchyBuilder::default()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&HierarchyNode> {
        self.nodes.get(id)
    }

    /// Root ids, in insertion order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the hierarchy has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Embedding dimension shared by every node (0 when empty).
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Builder for [`DocumentHierarchy`].
#[derive(Debug, Default)]
pub struct DocumentHierarchyBuilder {
    nodes: Vec<HierarchyNode>,
    roots: Vec<String>,
}

impl DocumentHierarchyBuilder {
    /// Add a node.
    #[must_use]
    pub fn node(mut self, node: HierarchyNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a node and mark it as a root.
    #[must_use]
    pub fn root(mut self, node: HierarchyNode) -> Self {
        self.roots.push(node.id.clone());
        self.nodes.push(node);
        self
    }

    /// Validate and freeze the hierarchy.
    ///
    /// Fails on duplicate ids, unknown child or root ids, and embeddings of
    /// differing dimension.
    pub fn build(self) -> Result<DocumentHierarchy> {
        let mut nodes = HashMap::with_capacity(self.nodes.len());
        let mut dimension = None;

        for node in self.nodes {
            match dimension {
                None => dimension = Some(node.embedding.len()),
                Some(expected) if expected != node.embedding.len() => {
                    return Err(LecternError::dimension_mismatch(
                        expected,
                        node.embedding.len(),
                    ));
                }
                Some(_) => {}
            }
            if nodes.contains_key(&node.id) {
                return Err(LecternError::configuration(format!(
                    "Duplicate hierarchy node id: {}",
                    node.id
                )));
            }
            nodes.insert(node.id.clone(), node);
        }

        for node in nodes.values() {
            if let Some(missing) = node.children.iter().find(|c| !nodes.contains_key(*c)) {
                return Err(LecternError::configuration(format!(
                    "Hierarchy node {} references unknown child {missing}",
                    node.id
                )));
            }
        }

        let mut seen_roots = HashSet::new();
        for root in &self.roots {
            if !seen_roots.insert(root) {
                return Err(LecternError::configuration(format!(
                    "Root {root} listed twice"
                )));
            }
        }

        Ok(DocumentHierarchy {
            nodes,
            roots: self.roots,
            dimension: dimension.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_valid_tree() {
        let hierarchy = DocumentHierarchy::builder()
            .root(HierarchyNode::new("course", vec![1.0, 0.0], 0).with_children(["unit"]))
            .node(HierarchyNode::new("unit", vec![0.0, 1.0], 1).with_materials(["m1"]))
            .build()
            .unwrap();

        assert_eq!(hierarchy.len(), 2);
        assert_eq!(hierarchy.roots(), ["course".to_string()]);
        assert_eq!(hierarchy.dimension(), 2);
        assert!(hierarchy.node("unit").unwrap().is_leaf());
    }

    #[test]
    fn test_unknown_child_rejected() {
        let err = DocumentHierarchy::builder()
            .root(HierarchyNode::new("course", vec![1.0], 0).with_children(["ghost"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, LecternError::Configuration { .. }));
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let err = DocumentHierarchy::builder()
            .root(HierarchyNode::new("a", vec![1.0, 0.0], 0))
            .root(HierarchyNode::new("b", vec![1.0], 0))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            LecternError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = DocumentHierarchy::builder()
            .root(HierarchyNode::new("a", vec![1.0], 0))
            .node(HierarchyNode::new("a", vec![1.0], 1))
            .build();
        assert!(result.is_err());
    }
}
