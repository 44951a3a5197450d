//! Edge geometry: boundary anchors on node rectangles, straight-or-cubic
//! routing, label anchors and arrowheads.

use std::collections::HashSet;

use eframe::egui::{Pos2, Vec2, vec2};

use crate::config::{EdgeConfig, LayoutConfig};
use crate::graph::{EdgeDirection, EdgeRecord, GraphSnapshot};
use crate::layout::LayoutPositions;
use crate::layout::footprint::Footprint;
use crate::layout::topology::Topology;

const DEGENERATE_EPSILON: f32 = 1e-4;

/// Where an edge leaves a node's rectangle, and the outward face normal there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub point: Pos2,
    pub normal: Vec2,
}

/// Clips the ray from `center` toward `toward` against the rectangle of
/// half-size `half_size`. A degenerate ray lands on the right-center point.
pub fn boundary_anchor(center: Pos2, half_size: Vec2, toward: Pos2) -> Anchor {
    let ray = toward - center;
    if ray.length_sq() < DEGENERATE_EPSILON || half_size.x <= 0.0 || half_size.y <= 0.0 {
        return Anchor {
            point: center + vec2(half_size.x.max(0.0), 0.0),
            normal: Vec2::X,
        };
    }

    let scale_x = if ray.x.abs() > f32::EPSILON {
        half_size.x / ray.x.abs()
    } else {
        f32::INFINITY
    };
    let scale_y = if ray.y.abs() > f32::EPSILON {
        half_size.y / ray.y.abs()
    } else {
        f32::INFINITY
    };

    if scale_x <= scale_y {
        Anchor {
            point: center + ray * scale_x,
            normal: vec2(ray.x.signum(), 0.0),
        }
    } else {
        Anchor {
            point: center + ray * scale_y,
            normal: vec2(0.0, ray.y.signum()),
        }
    }
}

/// Open arrowhead. `direction` points from the shaft into the tip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrowhead {
    pub tip: Pos2,
    pub direction: Vec2,
}

impl Arrowhead {
    pub fn wings(&self, length: f32, spread: f32) -> [Pos2; 2] {
        let back = -self.direction * length;
        let side = self.direction.rot90() * (length * spread);
        [self.tip + back + side, self.tip + back - side]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeGeometry {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: Option<String>,
    pub from: Pos2,
    pub to: Pos2,
    /// Cubic control points; `None` for a straight segment.
    pub controls: Option<[Pos2; 2]>,
    pub label: Pos2,
    pub arrow: Option<Arrowhead>,
}

impl EdgeGeometry {
    pub fn is_line(&self) -> bool {
        self.controls.is_none()
    }

    /// `[from, c1, c2, to]`, with the controls collapsed onto the ends for a line.
    pub fn points(&self) -> [Pos2; 4] {
        match self.controls {
            Some([c1, c2]) => [self.from, c1, c2, self.to],
            None => [self.from, self.from, self.to, self.to],
        }
    }
}

/// Keeps the part of an outward normal that points toward the other end, so
/// the handle never doubles back behind its own anchor.
fn handle_direction(normal: Vec2, toward: Vec2) -> Vec2 {
    let along = normal.dot(toward);
    let direction = if along < 0.0 {
        normal - toward * along
    } else {
        normal
    };
    if direction.length_sq() < DEGENERATE_EPSILON {
        toward
    } else {
        direction.normalized()
    }
}

fn handle_length(distance: f32, projection: f32, config: &EdgeConfig) -> f32 {
    let alignment = 0.5 + 0.5 * projection.clamp(0.0, 1.0);
    (distance * config.handle_ratio * alignment)
        .max(config.min_handle)
        .min(config.max_handle)
        .min(distance * 0.5)
}

pub struct EdgeEndpoints {
    pub source_center: Pos2,
    pub source_half_size: Vec2,
    pub target_center: Pos2,
    pub target_half_size: Vec2,
}

/// Route for a single edge. `directional` is false when the edge has no
/// explicit direction or its reverse is also visible.
pub fn edge_geometry(
    edge: &EdgeRecord,
    ends: &EdgeEndpoints,
    directional: bool,
    config: &EdgeConfig,
) -> EdgeGeometry {
    let start = boundary_anchor(ends.source_center, ends.source_half_size, ends.target_center);
    let end = boundary_anchor(ends.target_center, ends.target_half_size, ends.source_center);

    let center_distance = (ends.target_center - ends.source_center).length();
    let chord = end.point - start.point;
    let distance = chord.length();

    let controls = if center_distance < config.straight_threshold || distance < DEGENERATE_EPSILON {
        None
    } else {
        let forward = chord / distance;
        let bow = forward.rot90() * (config.curvature * distance);

        let out_start = handle_direction(start.normal, forward);
        let out_end = handle_direction(end.normal, -forward);
        let handle_start = handle_length(distance, out_start.dot(forward), config);
        let handle_end = handle_length(distance, out_end.dot(-forward), config);

        Some([
            start.point + out_start * handle_start + bow,
            end.point + out_end * handle_end + bow,
        ])
    };

    let label = match controls {
        Some([c1, c2]) => {
            let sum = start.point.to_vec2() + c1.to_vec2() * 3.0 + c2.to_vec2() * 3.0 + end.point.to_vec2();
            (sum / 8.0).to_pos2()
        }
        None => start.point + chord * 0.5,
    };

    let arrow = if directional {
        let (near, tip) = match (edge.direction, controls) {
            (Some(EdgeDirection::Inbound), Some([c1, _])) => (c1, start.point),
            (Some(EdgeDirection::Inbound), None) => (end.point, start.point),
            (_, Some([_, c2])) => (c2, end.point),
            (_, None) => (start.point, end.point),
        };
        let shaft = tip - near;
        let direction = if shaft.length_sq() < DEGENERATE_EPSILON {
            Vec2::X
        } else {
            shaft.normalized()
        };
        Some(Arrowhead { tip, direction })
    } else {
        None
    };

    EdgeGeometry {
        id: edge.id.clone(),
        source: edge.source.clone(),
        target: edge.target.clone(),
        relation: edge.relation.clone(),
        from: start.point,
        to: end.point,
        controls,
        label,
        arrow,
    }
}

/// Geometry for every visible edge whose endpoints both have positions.
pub fn layout_edges(
    graph: &GraphSnapshot,
    topology: &Topology,
    positions: &LayoutPositions,
    config: &LayoutConfig,
) -> Vec<EdgeGeometry> {
    let pairs = topology
        .edges
        .iter()
        .map(|edge| (edge.source.as_str(), edge.target.as_str()))
        .collect::<HashSet<_>>();

    let footprint = |id: &str| {
        let depth = topology.depth_of(id).unwrap_or(0);
        graph
            .nodes
            .get(id)
            .map(|node| Footprint::for_node(node, depth, config))
    };

    topology
        .edges
        .iter()
        .filter(|edge| edge.source != edge.target)
        .filter_map(|edge| {
            let source_center = *positions.get(&edge.source)?;
            let target_center = *positions.get(&edge.target)?;
            let ends = EdgeEndpoints {
                source_center,
                source_half_size: footprint(&edge.source)?.half_size,
                target_center,
                target_half_size: footprint(&edge.target)?.half_size,
            };
            let reciprocal = pairs.contains(&(edge.target.as_str(), edge.source.as_str()));
            let directional = edge.has_explicit_direction() && !reciprocal;
            Some(edge_geometry(edge, &ends, directional, &config.edges))
        })
        .collect()
}
