//! Site structure graph.
//!
//! This module owns the raw, possibly cyclic page structure of a website:
//! - [`SiteStructure`]: already-parsed structure input (pages and cross-links)
//! - [`SiteGraph`]: arena of [`Node`]s with raw child/parent adjacency
//! - [`DistanceIndex`]: all-pairs hop counts over the raw graph
//! - [`LevelGraph`]: the acyclic BFS-layered subgraph used by all shortest-path reasoning
//!
//! # Architecture
//!
//! ```text
//! SiteStructure → SiteGraph (raw edges) → DistanceIndex
//!                         ↓
//!                    LevelGraph (depths, level edges, degree, leaves)
//! ```

mod distance;
mod level;


use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, GraphResult};

pub use distance::{Distance, DistanceIndex};
pub use level::LevelGraph;

// ============================================================================
// Identifiers
// ============================================================================

/// Immutable identifier of a page, as assigned by the structure source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// ============================================================================
// Structure Input
// ============================================================================

/// A page declared by the structure source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    /// Page identifier
    pub id: NodeId,
    /// Display label
    pub label: String,
}

/// One entry beneath the root of the structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructureEntry {
    /// A regular page placed below `parent`
    Page {
        /// Page identifier
        id: NodeId,
        /// Display label
        label: String,
        /// Enclosing page
        parent: NodeId,
    },
    /// A cross-link from `parent` to an already declared page
    Link {
        /// Page that shows the link
        parent: NodeId,
        /// Page the link resolves to
        target: NodeId,
    },
}

/// Already-parsed hierarchical description of a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStructure {
    /// The start page
    pub root: PageSpec,
    /// Pages and cross-links, in document order
    #[serde(default)]
    pub entries: Vec<StructureEntry>,
}

impl SiteStructure {
    /// Create a structure containing only the root page.
    pub fn new(root: u32, label: impl Into<String>) -> Self {
        Self {
            root: PageSpec {
                id: NodeId(root),
                label: label.into(),
            },
            entries: Vec::new(),
        }
    }

    /// Append a page below `parent`.
    pub fn page(mut self, id: u32, label: impl Into<String>, parent: u32) -> Self {
        self.entries.push(StructureEntry::Page {
            id: NodeId(id),
            label: label.into(),
            parent: NodeId(parent),
        });
        self
    }

    /// Append a cross-link from `parent` to `target`.
    pub fn link(mut self, parent: u32, target: u32) -> Self {
        self.entries.push(StructureEntry::Link {
            parent: NodeId(parent),
            target: NodeId(target),
        });
        self
    }
}

// ============================================================================
// Node
// ============================================================================

/// A page in the raw structure graph.
///
/// Adjacency is stored as arena indices into the owning [`SiteGraph`].
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    label: String,
    children: Vec<usize>,
    parents: Vec<usize>,
}

impl Node {
    fn new(id: NodeId, label: String) -> Self {
        Self {
            id,
            label,
            children: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Page identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Raw outgoing links, in structure order.
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Raw incoming links, in structure order.
    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    /// True if more than one page links here.
    pub fn is_multiply_linked(&self) -> bool {
        self.parents.len() > 1
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

// ============================================================================
// SiteGraph
// ============================================================================

/// Assumed reading speed for link labels.
const WORDS_PER_SECOND: u64 = 2;

/// The raw site structure together with its all-pairs distance index.
#[derive(Debug, Clone)]
pub struct SiteGraph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    root: usize,
    distances: DistanceIndex,
}

impl SiteGraph {
    /// Build the graph from structure input and compute the distance index.
    ///
    /// Fails on duplicate ids and on entries referencing undeclared pages.
    pub fn build(structure: &SiteStructure) -> GraphResult<Self> {
        let mut nodes = Vec::with_capacity(structure.entries.len() + 1);
        let mut index = HashMap::with_capacity(structure.entries.len() + 1);

        index.insert(structure.root.id, 0);
        nodes.push(Node::new(structure.root.id, structure.root.label.clone()));

        for entry in &structure.entries {
            if let StructureEntry::Page { id, label, .. } = entry {
                if index.contains_key(id) {
                    return Err(GraphError::DuplicateNode { id: *id });
                }
                index.insert(*id, nodes.len());
                nodes.push(Node::new(*id, label.clone()));
            }
        }

        let mut graph = Self {
            nodes,
            index,
            root: 0,
            distances: DistanceIndex::default(),
        };

        for entry in &structure.entries {
            let (parent, child) = match entry {
                StructureEntry::Page { id, parent, .. } => (*parent, *id),
                StructureEntry::Link { parent, target } => (*parent, *target),
            };
            let from = graph.require(parent)?;
            let to = graph.require(child)?;
            graph.add_edge(from, to);
        }

        let adjacency: Vec<&[usize]> = graph.nodes.iter().map(|n| n.children()).collect();
        graph.distances = DistanceIndex::compute(&adjacency);

        debug!(
            nodes = graph.nodes.len(),
            links = graph.link_count(),
            "Site graph built"
        );

        Ok(graph)
    }

    fn require(&self, id: NodeId) -> GraphResult<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownNode { id })
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        if self.nodes[from].children.contains(&to) {
            return;
        }
        self.nodes[from].children.push(to);
        self.nodes[to].parents.push(from);
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no pages. A built graph always has its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of raw links.
    pub fn link_count(&self) -> usize {
        self.nodes.iter().map(|n| n.children.len()).sum()
    }

    /// Look up a page by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).map(|ix| &self.nodes[ix])
    }

    /// Arena index of a page id.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Page at an arena index.
    ///
    /// # Panics
    ///
    /// Panics if `ix` did not come from this graph.
    pub fn node_at(&self, ix: usize) -> &Node {
        &self.nodes[ix]
    }

    /// All pages in arena order (root first, then declaration order).
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// The start page.
    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    /// Arena index of the start page.
    pub fn root_index(&self) -> usize {
        self.root
    }

    /// Directed hop distance between two page ids.
    ///
    /// Ids not present in the graph are reported as unreachable.
    pub fn distance(&self, source: NodeId, target: NodeId) -> Distance {
        match (self.index_of(source), self.index_of(target)) {
            (Some(from), Some(to)) => self.distances.get(from, to),
            _ => Distance::Unreachable,
        }
    }

    /// Directed hop distance between two arena indices.
    pub fn distance_between(&self, from: usize, to: usize) -> Distance {
        self.distances.get(from, to)
    }

    /// Estimated fastest plausible decision time at a page, in milliseconds.
    ///
    /// Reading all raw child labels at two words per second plus
    /// `time_to_think_ms` per offered link.
    pub fn minimal_latency_ms(&self, ix: usize, time_to_think_ms: u64) -> u64 {
        let node = &self.nodes[ix];
        let words: u64 = node
            .children
            .iter()
            .map(|&child| label_word_count(&self.nodes[child].label))
            .sum();
        let links = node.children.len() as u64;

        let reading = words.saturating_mul(1000) / WORDS_PER_SECOND;
        reading.saturating_add(time_to_think_ms.saturating_mul(links))
    }
}

/// Count whitespace- or underscore-delimited words in a label.
pub fn label_word_count(label: &str) -> u64 {
    label
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .count() as u64
}
