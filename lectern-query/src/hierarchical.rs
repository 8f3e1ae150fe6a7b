//! Similarity-guided traversal of a document hierarchy.
//!
//! Traversal is iterative: breadth-first uses a queue, depth-first an
//! explicit stack, and the adaptive strategy a queue that dives into
//! strongly matching subtrees with a stack before resuming. A `visited` set
//! guards every strategy against revisiting shared children.

use lectern_core::{
    DocumentHierarchy, HierarchyNode, LecternError, Result,
    config::{TraversalConfig, TraversalStrategy},
    utils::cosine_similarity,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// A node selected by traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversedNode {
    /// Node id.
    pub id: String,
    /// Level recorded on the node.
    pub level: usize,
    /// Cosine similarity to the query.
    pub similarity: f32,
    /// Leaf material ids below the node, sorted.
    pub material_ids: Vec<String>,
}

/// Statistics about one traversal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalMetrics {
    /// Wall-clock time spent traversing.
    pub elapsed: Duration,
    /// Nodes whose similarity was computed.
    pub nodes_visited: usize,
    /// Nodes in the result.
    pub nodes_returned: usize,
    /// Deepest traversal depth visited (roots are depth 0).
    pub max_depth_reached: usize,
    /// Mean similarity of the returned nodes, 0 when none.
    pub average_similarity: f32,
}

/// Outcome of a traversal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalResult {
    /// Selected nodes, most similar first.
    pub nodes: Vec<TraversedNode>,
    /// Sorted union of material ids under the selected nodes.
    pub material_ids: Vec<String>,
    /// Every visited node id, in visitation order.
    pub path: Vec<String>,
    /// Similarity of every visited node.
    pub similarities: HashMap<String, f32>,
    /// Traversal statistics.
    pub metrics: TraversalMetrics,
}

enum Visit {
    /// Already visited, or the candidate cap was reached.
    Skipped,
    /// Below the similarity floor.
    Rejected,
    /// Selected as a candidate.
    Selected(f32),
}

/// Mutable state of one traversal.
struct Walk<'a> {
    query: &'a [f32],
    config: &'a TraversalConfig,
    cap: usize,
    visited: HashSet<String>,
    path: Vec<String>,
    similarities: HashMap<String, f32>,
    candidates: Vec<(&'a HierarchyNode, f32)>,
    max_depth_reached: usize,
}

impl<'a> Walk<'a> {
    fn new(query: &'a [f32], config: &'a TraversalConfig) -> Self {
        Self {
            query,
            config,
            cap: config.max_nodes.saturating_mul(2),
            visited: HashSet::new(),
            path: Vec::new(),
            similarities: HashMap::new(),
            candidates: Vec::new(),
            max_depth_reached: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.candidates.len() >= self.cap
    }

    fn can_expand(&self, depth: usize) -> bool {
        self.config.max_depth.is_none_or(|max| depth < max)
    }

    fn visit(&mut self, node: &'a HierarchyNode, depth: usize) -> Result<Visit> {
        if self.is_full() || !self.visited.insert(node.id.clone()) {
            return Ok(Visit::Skipped);
        }

        let similarity = cosine_similarity(self.query, &node.embedding)?;
        self.path.push(node.id.clone());
        self.similarities.insert(node.id.clone(), similarity);
        self.max_depth_reached = self.max_depth_reached.max(depth);

        if similarity < self.config.min_similarity {
            return Ok(Visit::Rejected);
        }
        self.candidates.push((node, similarity));
        Ok(Visit::Selected(similarity))
    }

    /// Pre-order walk from `start`, children pushed in reverse.
    fn dive(
        &mut self,
        hierarchy: &'a DocumentHierarchy,
        start: Vec<(&'a str, usize)>,
    ) -> Result<()> {
        let mut stack: Vec<(&'a str, usize)> = start;
        stack.reverse();

        while let Some((id, depth)) = stack.pop() {
            if self.is_full() {
                break;
            }
            let Some(node) = hierarchy.node(id) else {
                continue;
            };
            if let Visit::Selected(_) = self.visit(node, depth)? {
                if self.can_expand(depth) {
                    stack.extend(node.children.iter().rev().map(|c| (c.as_str(), depth + 1)));
                }
            }
        }
        Ok(())
    }

    fn breadth_first(&mut self, hierarchy: &'a DocumentHierarchy, adaptive: bool) -> Result<()> {
        let mut queue: VecDeque<(&'a str, usize)> =
            hierarchy.roots().iter().map(|r| (r.as_str(), 0)).collect();

        while let Some((id, depth)) = queue.pop_front() {
            if self.is_full() {
                break;
            }
            let Some(node) = hierarchy.node(id) else {
                continue;
            };
            let Visit::Selected(similarity) = self.visit(node, depth)? else {
                continue;
            };
            if !self.can_expand(depth) {
                continue;
            }

            let children = node.children.iter().map(|c| (c.as_str(), depth + 1));
            if adaptive && similarity > self.config.adaptive_switch_threshold {
                debug!("Diving into subtree of {} (similarity {:.3})", node.id, similarity);
                self.dive(hierarchy, children.collect())?;
            } else {
                queue.extend(children);
            }
        }
        Ok(())
    }

    fn finish(self, started: Instant) -> TraversalResult {
        let mut candidates = self.candidates;
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        candidates.truncate(self.config.max_nodes);

        let mut material_ids = BTreeSet::new();
        let nodes: Vec<TraversedNode> = candidates
            .into_iter()
            .map(|(node, similarity)| {
                material_ids.extend(node.material_ids.iter().cloned());
                TraversedNode {
                    id: node.id.clone(),
                    level: node.level,
                    similarity,
                    material_ids: node.material_ids.iter().cloned().collect(),
                }
            })
            .collect();

        let average_similarity = if nodes.is_empty() {
            0.0
        } else {
            nodes.iter().map(|n| n.similarity).sum::<f32>() / nodes.len() as f32
        };

        TraversalResult {
            metrics: TraversalMetrics {
                elapsed: started.elapsed(),
                nodes_visited: self.path.len(),
                nodes_returned: nodes.len(),
                max_depth_reached: self.max_depth_reached,
                average_similarity,
            },
            nodes,
            material_ids: material_ids.into_iter().collect(),
            path: self.path,
            similarities: self.similarities,
        }
    }
}

/// Traverses a [`DocumentHierarchy`] to find the sections most similar to a
/// query embedding.
///
/// # Examples
///
/// ```rust
/// use lectern_core::{DocumentHierarchy, HierarchyNode, config::TraversalConfig};
/// use lectern_query::hierarchical::HierarchyTraverser;
///
/// let hierarchy = DocumentHierarchy::builder()
///     .root(HierarchyNode::new("course", vec![1.0, 0.0], 0).with_children(["unit"]))
///     .node(HierarchyNode::new("unit", vec![0.9, 0.1], 1).with_materials(["m1"]))
///     .build()
///     .unwrap();
///
/// let traverser = HierarchyTraverser::new(TraversalConfig::default()).unwrap();
/// let result = traverser.traverse(&hierarchy, &[1.0, 0.0]).unwrap();
/// assert_eq!(result.material_ids, vec!["m1".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct HierarchyTraverser {
    config: TraversalConfig,
}

impl HierarchyTraverser {
    /// Create a traverser. Fails if `config` is invalid.
    pub fn new(config: TraversalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Traversal configuration.
    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Traverse `hierarchy` from its roots.
    #[instrument(skip_all, fields(strategy = %self.config.strategy, nodes = hierarchy.len()))]
    pub fn traverse(
        &self,
        hierarchy: &DocumentHierarchy,
        query_embedding: &[f32],
    ) -> Result<TraversalResult> {
        let started = Instant::now();
        if !hierarchy.is_empty() && hierarchy.dimension() != query_embedding.len() {
            return Err(LecternError::dimension_mismatch(
                hierarchy.dimension(),
                query_embedding.len(),
            ));
        }

        let mut walk = Walk::new(query_embedding, &self.config);
        match self.config.strategy {
            TraversalStrategy::BreadthFirst => walk.breadth_first(hierarchy, false)?,
            TraversalStrategy::Adaptive => walk.breadth_first(hierarchy, true)?,
            TraversalStrategy::DepthFirst => {
                let roots = hierarchy.roots().iter().map(|r| (r.as_str(), 0)).collect();
                walk.dive(hierarchy, roots)?;
            }
        }

        let result = walk.finish(started);
        info!(
            "Traversal visited {} nodes, returned {} (max depth {})",
            result.metrics.nodes_visited,
            result.metrics.nodes_returned,
            result.metrics.max_depth_reached
        );
        Ok(result)
    }
}
