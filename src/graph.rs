use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Project,
    Directory,
    File,
    Module,
    Symbol,
    Dependency,
    #[default]
    #[serde(other)]
    Other,
}

impl NodeCategory {
    pub const ALL: [Self; 7] = [
        Self::Project,
        Self::Directory,
        Self::File,
        Self::Module,
        Self::Symbol,
        Self::Dependency,
        Self::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Directory => "directory",
            Self::File => "file",
            Self::Module => "module",
            Self::Symbol => "symbol",
            Self::Dependency => "dependency",
            Self::Other => "other",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Ready,
    Loading,
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    Outbound,
    Inbound,
    Undirected,
}

/// A node as delivered by the data layer. `depth` is the only field the
/// layout core writes back.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    pub category: NodeCategory,
    pub depth: Option<usize>,
    pub expanded: bool,
    pub state: LoadState,
    pub children: Vec<String>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category: NodeCategory::Other,
            depth: None,
            expanded: true,
            state: LoadState::Ready,
            children: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: NodeCategory) -> Self {
        self.category = category;
        self
    }

    pub fn collapsed(mut self) -> Self {
        self.expanded = false;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: Option<String>,
    pub direction: Option<EdgeDirection>,
}

impl EdgeRecord {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            relation: None,
            direction: None,
        }
    }

    pub fn directed(mut self, direction: EdgeDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    /// True when the edge should carry an arrowhead at all.
    pub fn has_explicit_direction(&self) -> bool {
        matches!(
            self.direction,
            Some(EdgeDirection::Outbound | EdgeDirection::Inbound)
        )
    }
}

/// The partial graph currently known to the data layer. Treated as an
/// eventually-consistent view: edges and child lists may name nodes that
/// have not arrived yet.
#[derive(Clone, Debug, Default)]
pub struct GraphSnapshot {
    pub nodes: HashMap<String, NodeRecord>,
    pub edges: HashMap<String, EdgeRecord>,
}

impl GraphSnapshot {
    pub fn insert_node(&mut self, node: NodeRecord) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn insert_edge(&mut self, edge: EdgeRecord) {
        self.edges.insert(edge.id.clone(), edge);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn label_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.nodes
            .get(id)
            .map(|node| node.label.as_str())
            .unwrap_or(id)
    }

    /// Writes the depths computed by a topology pass back onto the records.
    pub fn apply_depths(&mut self, depth_by_id: &HashMap<String, usize>) {
        for (id, node) in &mut self.nodes {
            node.depth = depth_by_id.get(id).copied();
        }
    }
}

/// Direction-agnostic neighbor index over every edge whose endpoints both
/// exist in the snapshot. Neighbor lists are sorted by id.
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
    neighbors: HashMap<String, Vec<String>>,
}

impl Adjacency {
    pub fn from_graph(graph: &GraphSnapshot) -> Self {
        let mut sets: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for edge in graph.edges.values() {
            if edge.source == edge.target
                || !graph.nodes.contains_key(&edge.source)
                || !graph.nodes.contains_key(&edge.target)
            {
                continue;
            }
            sets.entry(edge.source.as_str())
                .or_default()
                .insert(edge.target.as_str());
            sets.entry(edge.target.as_str())
                .or_default()
                .insert(edge.source.as_str());
        }

        let neighbors = sets
            .into_iter()
            .map(|(id, set)| {
                (
                    id.to_owned(),
                    set.into_iter().map(str::to_owned).collect::<Vec<_>>(),
                )
            })
            .collect();

        Self { neighbors }
    }

    pub fn neighbors(&self, id: &str) -> &[String] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_entry(&self, id: &str) -> bool {
        self.neighbors.contains_key(id)
    }

    pub fn degree(&self, id: &str) -> usize {
        self.neighbors(id).len()
    }
}
