//! Live drag propagation: moving one node tugs its graph neighborhood along
//! with a falloff that depends on canvas distance, hop count and depth.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use eframe::egui::{Pos2, Vec2};

use crate::config::DragConfig;
use crate::error::LayoutError;
use crate::graph::Adjacency;
use crate::layout::LayoutPositions;

/// Positions set by dragging. They win over computed layout positions until
/// the next full layout pass replaces them.
pub type ManualOverrides = HashMap<String, Pos2>;

pub fn validate_override(id: &str, position: Pos2) -> Result<(), LayoutError> {
    if position.x.is_finite() && position.y.is_finite() {
        Ok(())
    } else {
        Err(LayoutError::NonFiniteOverride {
            id: id.to_owned(),
            x: position.x,
            y: position.y,
        })
    }
}

pub fn validate_overrides(overrides: &ManualOverrides) -> Result<(), LayoutError> {
    let mut ids = overrides.keys().collect::<Vec<_>>();
    ids.sort();
    for id in ids {
        validate_override(id, overrides[id])?;
    }
    Ok(())
}

/// Layout positions with manual overrides laid on top.
pub fn resolve_positions(layout: &LayoutPositions, overrides: &ManualOverrides) -> LayoutPositions {
    layout
        .iter()
        .map(|(id, position)| {
            let position = overrides.get(id).copied().unwrap_or(*position);
            (id.clone(), position)
        })
        .collect()
}

struct Hop<'a> {
    id: &'a str,
    transmission: f32,
    hops: usize,
}

/// One press-drag-release gesture. Base positions are captured once at
/// press time so every pointer move within the gesture is computed from
/// the same starting state.
#[derive(Clone, Debug)]
pub struct DragSession {
    node_id: String,
    base: LayoutPositions,
}

impl DragSession {
    /// Returns `None` when the node is not currently rendered.
    pub fn begin(
        node_id: &str,
        rendered: &LayoutPositions,
        overrides: &ManualOverrides,
    ) -> Option<Self> {
        if !rendered.contains_key(node_id) {
            return None;
        }

        Some(Self {
            node_id: node_id.to_owned(),
            base: resolve_positions(rendered, overrides),
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn base_position(&self, id: &str) -> Option<Pos2> {
        self.base.get(id).copied()
    }

    /// Positions for the dragged node and every neighbor it pulls along,
    /// given the total pointer displacement since the gesture started.
    pub fn propagate(
        &self,
        delta: Vec2,
        zoom: f32,
        adjacency: &Adjacency,
        depths: &HashMap<String, usize>,
        config: &DragConfig,
    ) -> ManualOverrides {
        let Some(origin) = self.base_position(&self.node_id) else {
            return ManualOverrides::new();
        };

        let mut updates = ManualOverrides::from([(self.node_id.clone(), origin + delta)]);
        if delta == Vec2::ZERO {
            return updates;
        }

        let zoom = zoom.max(config.min_zoom).min(config.max_zoom);
        let origin_depth = depths.get(&self.node_id).copied().unwrap_or(0);
        let mut visited = HashSet::from([self.node_id.as_str()]);
        let mut queue = VecDeque::from([Hop {
            id: self.node_id.as_str(),
            transmission: 1.0,
            hops: 0,
        }]);

        while let Some(hop) = queue.pop_front() {
            if hop.hops >= config.max_hops {
                continue;
            }

            let current_depth = depths.get(hop.id).copied().unwrap_or(origin_depth);
            let hop_reach = (1.0 + config.reach_per_hop * hop.hops as f32).min(config.reach_hop_cap);
            let reach = config.reach / zoom * hop_reach;

            for neighbor in adjacency.neighbors(hop.id) {
                if visited.contains(neighbor.as_str()) {
                    continue;
                }
                let Some(base) = self.base_position(neighbor) else {
                    continue;
                };

                let normalized = (base - origin).length() / reach;
                if normalized >= 1.0 {
                    continue;
                }

                let depth = depths.get(neighbor).copied().unwrap_or(current_depth);
                let origin_gap = depth.abs_diff(origin_depth) as f32;
                let depth_boost = 1.0 + (origin_gap * config.depth_boost_step).min(config.depth_boost_cap);
                let (bias, decay) = match depth.cmp(&current_depth) {
                    Ordering::Greater => (config.deeper_bias, config.deeper_transmission),
                    Ordering::Less => (config.shallower_bias, config.shallower_transmission),
                    Ordering::Equal => (1.0, config.same_depth_transmission),
                };

                let influence =
                    (1.0 - normalized).powi(2) * hop.transmission * depth_boost * bias;
                if influence < config.min_influence {
                    continue;
                }

                let smoothing =
                    (config.smoothing_base + config.smoothing_step * origin_gap).min(1.0);
                let share = (influence * smoothing).min(1.0);

                visited.insert(neighbor.as_str());
                updates.insert(neighbor.clone(), base + delta * share);
                queue.push_back(Hop {
                    id: neighbor.as_str(),
                    transmission: hop.transmission * decay,
                    hops: hop.hops + 1,
                });
            }
        }

        updates
    }
}
