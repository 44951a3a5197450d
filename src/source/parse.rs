use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::graph::{
    EdgeDirection, EdgeRecord, GraphSnapshot, LoadState, NodeCategory, NodeRecord,
};

use super::LoadedGraph;

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawDocument {
    #[serde(default)]
    pub(super) root: Option<String>,
    #[serde(default)]
    pub(super) nodes: Vec<RawNode>,
    #[serde(default)]
    pub(super) edges: Vec<RawEdge>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNode {
    pub(super) id: String,
    #[serde(default)]
    pub(super) label: Option<String>,
    #[serde(default)]
    pub(super) category: NodeCategory,
    #[serde(default = "expanded_by_default")]
    pub(super) expanded: bool,
    #[serde(default)]
    pub(super) state: LoadState,
    #[serde(default)]
    pub(super) children: Vec<String>,
}

fn expanded_by_default() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawEdge {
    #[serde(default)]
    pub(super) id: Option<String>,
    pub(super) source: String,
    pub(super) target: String,
    #[serde(default)]
    pub(super) relation: Option<String>,
    #[serde(default)]
    pub(super) direction: Option<EdgeDirection>,
}

pub(super) fn parse_document(raw: &str) -> Result<LoadedGraph> {
    let document: RawDocument =
        serde_json::from_str(raw).context("invalid graph document JSON")?;

    let mut graph = GraphSnapshot::default();
    let mut first_id = None;

    for raw_node in document.nodes {
        let id = raw_node.id.trim().to_owned();
        if id.is_empty() {
            continue;
        }
        if graph.nodes.contains_key(&id) {
            debug!(id = %id, "duplicate node id; keeping the first record");
            continue;
        }
        first_id.get_or_insert_with(|| id.clone());

        let mut children = raw_node
            .children
            .into_iter()
            .map(|child| child.trim().to_owned())
            .filter(|child| !child.is_empty() && child != &id)
            .collect::<Vec<_>>();
        let mut seen = HashSet::new();
        children.retain(|child| seen.insert(child.clone()));

        graph.insert_node(NodeRecord {
            label: raw_node.label.unwrap_or_else(|| id.clone()),
            id,
            category: raw_node.category,
            depth: None,
            expanded: raw_node.expanded,
            state: raw_node.state,
            children,
        });
    }

    for raw_edge in document.edges {
        let source = raw_edge.source.trim().to_owned();
        let target = raw_edge.target.trim().to_owned();
        if source.is_empty() || target.is_empty() {
            debug!(source = %source, target = %target, "edge with an empty endpoint skipped");
            continue;
        }
        let id = raw_edge
            .id
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("{source}->{target}"));
        if graph.edges.contains_key(&id) {
            debug!(id = %id, "duplicate edge id; keeping the first record");
            continue;
        }

        graph.insert_edge(EdgeRecord {
            id,
            source,
            target,
            relation: raw_edge.relation,
            direction: raw_edge.direction,
        });
    }

    let root_id = match document.root.map(|root| root.trim().to_owned()) {
        Some(root) if !root.is_empty() => root,
        _ => first_id.ok_or_else(|| anyhow!("graph document contains no nodes"))?,
    };
    if !graph.nodes.contains_key(&root_id) {
        warn!(root = %root_id, "root node is not present in the document");
    }

    Ok(LoadedGraph { root_id, graph })
}
