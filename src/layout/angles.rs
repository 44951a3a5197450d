use std::collections::{HashMap, HashSet};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use super::topology::Topology;

/// The root's slice is centered straight up.
pub const ROOT_CENTER_ANGLE: f32 = -FRAC_PI_2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngleSlice {
    pub start: f32,
    pub span: f32,
}

impl AngleSlice {
    pub fn full_circle() -> Self {
        Self {
            start: ROOT_CENTER_ANGLE - PI,
            span: TAU,
        }
    }

    /// Polar angle assigned to the node owning this slice.
    pub fn angle(&self) -> f32 {
        self.start + self.span * 0.5
    }

    pub fn end(&self) -> f32 {
        self.start + self.span
    }
}

/// `1 + Σ weight(child)`. A node met again on the current recursion path
/// counts as a leaf.
fn subtree_weight<'a>(topology: &'a Topology, id: &'a str, path: &mut HashSet<&'a str>) -> f32 {
    if !path.insert(id) {
        return 1.0;
    }

    let weight = 1.0
        + topology
            .children_of(id)
            .iter()
            .map(|child| subtree_weight(topology, child, path))
            .sum::<f32>();

    path.remove(id);
    weight
}

fn partition<'a>(
    topology: &'a Topology,
    id: &'a str,
    slice: AngleSlice,
    path: &mut HashSet<&'a str>,
    slices: &mut HashMap<String, AngleSlice>,
) {
    if !path.insert(id) {
        return;
    }
    slices.entry(id.to_owned()).or_insert(slice);

    let children = topology.children_of(id);
    if !children.is_empty() {
        let weights = children
            .iter()
            .map(|child| subtree_weight(topology, child, path))
            .collect::<Vec<_>>();
        let total = weights.iter().sum::<f32>();

        let mut cursor = slice.start;
        for (child, weight) in children.iter().zip(weights) {
            let child_slice = AngleSlice {
                start: cursor,
                span: slice.span * (weight / total),
            };
            cursor += child_slice.span;

            if !slices.contains_key(child) {
                partition(topology, child, child_slice, path, slices);
            }
        }
    }

    path.remove(id);
}

/// Sunburst partition of the full circle: every visible node gets a slice
/// proportional to its subtree size inside its parent's slice.
pub fn allocate_angles(topology: &Topology) -> HashMap<String, AngleSlice> {
    let mut slices = HashMap::with_capacity(topology.node_count());
    let mut path = HashSet::new();
    partition(
        topology,
        &topology.root_id,
        AngleSlice::full_circle(),
        &mut path,
        &mut slices,
    );
    slices
}
