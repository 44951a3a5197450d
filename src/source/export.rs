use serde::Serialize;

use crate::config::LayoutConfig;
use crate::edges::EdgeGeometry;
use crate::graph::{GraphSnapshot, NodeCategory};
use crate::layout::LayoutPositions;
use crate::layout::footprint::Footprint;
use crate::layout::topology::Topology;

/// Positioned nodes and routed edges, as written by `--export`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportDocument {
    pub root: String,
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportNode {
    pub id: String,
    pub label: String,
    pub category: NodeCategory,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    pub is_line: bool,
    /// Start, two control points, end.
    pub points: [[f32; 2]; 4],
    pub label: [f32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrow_tip: Option<[f32; 2]>,
}

impl ExportDocument {
    pub fn build(
        graph: &GraphSnapshot,
        topology: &Topology,
        positions: &LayoutPositions,
        edges: &[EdgeGeometry],
        config: &LayoutConfig,
    ) -> Self {
        let nodes = topology
            .visible
            .iter()
            .filter_map(|id| {
                let node = graph.nodes.get(id)?;
                let position = positions.get(id)?;
                let depth = topology.depth_of(id).unwrap_or(0);
                let size = Footprint::for_node(node, depth, config).half_size * 2.0;
                Some(ExportNode {
                    id: id.clone(),
                    label: node.label.clone(),
                    category: node.category,
                    depth,
                    x: position.x,
                    y: position.y,
                    width: size.x,
                    height: size.y,
                })
            })
            .collect();

        let edges = edges
            .iter()
            .map(|edge| ExportEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                relation: edge.relation.clone(),
                is_line: edge.is_line(),
                points: edge.points().map(|point| [point.x, point.y]),
                label: [edge.label.x, edge.label.y],
                arrow_tip: edge.arrow.map(|arrow| [arrow.tip.x, arrow.tip.y]),
            })
            .collect();

        Self {
            root: topology.root_id.clone(),
            nodes,
            edges,
        }
    }
}
