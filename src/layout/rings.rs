use crate::config::{LayoutConfig, RingConfig};
use crate::graph::GraphSnapshot;

use super::footprint::Footprint;
use super::topology::Topology;

fn density_boost(count: usize, config: &RingConfig) -> f32 {
    (count as f32 * config.density_step).min(config.density_cap)
}

/// Ring radius per BFS depth, index 0 being the root at the center.
///
/// Each ring clears the largest scaled footprint on its own level and the
/// level inside it, plus a base gap and a capped allowance for crowding.
pub fn ring_radii(graph: &GraphSnapshot, topology: &Topology, config: &LayoutConfig) -> Vec<f32> {
    let levels = topology.max_depth() + 1;
    let mut node_radius = vec![0.0_f32; levels];
    let mut counts = vec![0usize; levels];

    for id in &topology.visible {
        let (Some(depth), Some(node)) = (topology.depth_of(id), graph.nodes.get(id)) else {
            continue;
        };
        let half_extent = Footprint::for_node(node, depth, config).half_extent();
        node_radius[depth] = node_radius[depth].max(half_extent);
        counts[depth] += 1;
    }

    let mut rings = vec![0.0_f32; levels];
    for depth in 1..levels {
        rings[depth] = rings[depth - 1]
            + node_radius[depth - 1]
            + node_radius[depth]
            + config.rings.base_gap
            + density_boost(counts[depth], &config.rings);
    }
    rings
}
