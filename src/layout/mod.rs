//! Layout pipeline: topology → angle and ring allocation → force relaxation.

pub mod angles;
pub mod footprint;
pub mod physics;
pub mod rings;
pub mod topology;
pub mod worker;

use std::collections::HashMap;

use eframe::egui::Pos2;

use crate::config::LayoutConfig;
use crate::graph::{GraphSnapshot, NodeRecord};

use physics::ForceSimulation;
use topology::Topology;

/// World-space position per node id.
pub type LayoutPositions = HashMap<String, Pos2>;

/// Everything the relaxation context needs; owned so it can cross threads.
#[derive(Clone, Debug)]
pub struct LayoutRequest {
    pub sequence: u64,
    pub topology: Topology,
    pub nodes: Vec<NodeRecord>,
    pub config: LayoutConfig,
}

impl LayoutRequest {
    pub fn new(
        sequence: u64,
        graph: &GraphSnapshot,
        topology: &Topology,
        config: &LayoutConfig,
    ) -> Self {
        let nodes = topology
            .visible
            .iter()
            .filter_map(|id| graph.nodes.get(id).cloned())
            .collect();

        Self {
            sequence,
            topology: topology.clone(),
            nodes,
            config: config.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResponse {
    pub sequence: u64,
    pub positions: LayoutPositions,
}

/// Runs the whole relaxation synchronously. This is what the worker thread
/// executes for each request.
pub fn relax(request: LayoutRequest) -> LayoutResponse {
    let mut graph = GraphSnapshot::default();
    for node in request.nodes {
        graph.insert_node(node);
    }

    let positions = ForceSimulation::seed(&graph, &request.topology, &request.config).run();
    LayoutResponse {
        sequence: request.sequence,
        positions,
    }
}
