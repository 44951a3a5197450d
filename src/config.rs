use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::graph::NodeCategory;

/// Every tunable constant the layout core reads. Groups deserialize with
/// defaults so a partial JSON file overrides only the values it names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub canvas: CanvasConfig,
    pub topology: TopologyConfig,
    pub seed: u64,
    pub depth_scale: DepthScaleConfig,
    pub footprints: FootprintConfig,
    pub rings: RingConfig,
    pub forces: ForceConfig,
    pub drag: DragConfig,
    pub edges: EdgeConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 4000.0,
            height: 4000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub max_depth: usize,
    pub page_size: usize,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            page_size: 20,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthScaleConfig {
    pub min_scale: f32,
    pub scale_step: f32,
}

impl Default for DepthScaleConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.55,
            scale_step: 0.12,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FootprintSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintConfig {
    pub overrides: HashMap<NodeCategory, FootprintSize>,
    /// Collision radius grows by this fraction per child, up to `child_cap` children.
    pub child_spacing_step: f32,
    pub child_cap: usize,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            child_spacing_step: 0.02,
            child_cap: 24,
        }
    }
}

impl FootprintConfig {
    pub fn size_for(&self, category: NodeCategory) -> FootprintSize {
        if let Some(size) = self.overrides.get(&category) {
            return *size;
        }

        let (width, height) = match category {
            NodeCategory::Project => (220.0, 72.0),
            NodeCategory::Directory => (180.0, 56.0),
            NodeCategory::File => (160.0, 48.0),
            NodeCategory::Module => (170.0, 52.0),
            NodeCategory::Symbol => (140.0, 40.0),
            NodeCategory::Dependency => (150.0, 44.0),
            NodeCategory::Other => (140.0, 44.0),
        };
        FootprintSize { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub base_gap: f32,
    /// Extra ring spacing per node on the level.
    pub density_step: f32,
    pub density_cap: f32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            base_gap: 64.0,
            density_step: 6.0,
            density_cap: 180.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub pin_root: bool,
    pub center_strength: f32,
    pub repulsion_strength: f32,
    pub repulsion_softening: f32,
    pub repulsion_range: f32,
    pub barnes_hut_theta: f32,
    pub target_strength: f32,
    pub root_target_strength: f32,
    pub radial_strength: f32,
    pub root_radial_strength: f32,
    pub same_depth_link_distance: f32,
    pub same_depth_link_strength: f32,
    pub cross_depth_link_distance: f32,
    pub cross_depth_link_distance_step: f32,
    pub cross_depth_link_strength: f32,
    pub cross_depth_link_strength_step: f32,
    pub link_strength_cap: f32,
    pub collision_strength: f32,
    pub collision_padding: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub max_speed: f32,
    pub ticks_per_node: usize,
    pub min_ticks: usize,
    pub max_ticks: usize,
    pub seed_jitter: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            pin_root: true,
            center_strength: 0.02,
            repulsion_strength: 15_000.0,
            repulsion_softening: 400.0,
            repulsion_range: 720.0,
            barnes_hut_theta: 0.72,
            target_strength: 0.3,
            root_target_strength: 1.0,
            radial_strength: 0.86,
            root_radial_strength: 1.0,
            same_depth_link_distance: 112.0,
            same_depth_link_strength: 0.28,
            cross_depth_link_distance: 150.0,
            cross_depth_link_distance_step: 36.0,
            cross_depth_link_strength: 0.4,
            cross_depth_link_strength_step: 0.08,
            link_strength_cap: 0.85,
            collision_strength: 0.7,
            collision_padding: 6.0,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            max_speed: 36.0,
            ticks_per_node: 6,
            min_ticks: 120,
            max_ticks: 240,
            seed_jitter: 0.5,
        }
    }
}

impl ForceConfig {
    pub fn tick_budget(&self, node_count: usize) -> usize {
        // An inverted range resolves to `max_ticks`.
        node_count
            .saturating_mul(self.ticks_per_node)
            .max(self.min_ticks)
            .min(self.max_ticks)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Canvas distance a one-hop neighbor may sit from the dragged node at zoom 1.
    pub reach: f32,
    pub reach_per_hop: f32,
    pub reach_hop_cap: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub min_influence: f32,
    pub deeper_bias: f32,
    pub shallower_bias: f32,
    pub deeper_transmission: f32,
    pub shallower_transmission: f32,
    pub same_depth_transmission: f32,
    pub depth_boost_step: f32,
    pub depth_boost_cap: f32,
    pub smoothing_base: f32,
    pub smoothing_step: f32,
    pub max_hops: usize,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            reach: 420.0,
            reach_per_hop: 0.25,
            reach_hop_cap: 1.75,
            min_zoom: 0.35,
            max_zoom: 3.0,
            min_influence: 0.02,
            deeper_bias: 1.12,
            shallower_bias: 0.82,
            deeper_transmission: 0.95,
            shallower_transmission: 0.86,
            same_depth_transmission: 0.9,
            depth_boost_step: 0.08,
            depth_boost_cap: 0.24,
            smoothing_base: 0.88,
            smoothing_step: 0.04,
            max_hops: 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Center-to-center distance below which edges are drawn straight.
    pub straight_threshold: f32,
    pub handle_ratio: f32,
    pub min_handle: f32,
    pub max_handle: f32,
    /// Sideways bow as a fraction of the anchor distance.
    pub curvature: f32,
    pub arrow_length: f32,
    pub arrow_spread: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            straight_threshold: 48.0,
            handle_ratio: 0.42,
            min_handle: 18.0,
            max_handle: 180.0,
            curvature: 0.12,
            arrow_length: 10.0,
            arrow_spread: 0.45,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        let canvas = self.canvas;
        if !(canvas.width.is_finite() && canvas.height.is_finite())
            || canvas.width <= 0.0
            || canvas.height <= 0.0
        {
            return Err(LayoutError::InvalidConfig(format!(
                "canvas must be positive and finite, got {}x{}",
                canvas.width, canvas.height
            )));
        }

        if self.topology.page_size == 0 {
            return Err(LayoutError::InvalidConfig(
                "topology.page_size must be at least 1".to_owned(),
            ));
        }

        for category in NodeCategory::ALL {
            let size = self.footprints.size_for(category);
            if !(size.width.is_finite() && size.height.is_finite())
                || size.width <= 0.0
                || size.height <= 0.0
            {
                return Err(LayoutError::InvalidConfig(format!(
                    "footprint for {} must be positive and finite, got {}x{}",
                    category.label(),
                    size.width,
                    size.height
                )));
            }
        }

        let scale = self.depth_scale;
        if !(scale.min_scale > 0.0 && scale.min_scale <= 1.0) || scale.scale_step < 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "depth_scale.min_scale must be in (0, 1] and scale_step non-negative, got {} / {}",
                scale.min_scale, scale.scale_step
            )));
        }

        let forces = self.forces;
        if forces.min_ticks > forces.max_ticks {
            return Err(LayoutError::InvalidConfig(format!(
                "forces.min_ticks ({}) exceeds forces.max_ticks ({})",
                forces.min_ticks, forces.max_ticks
            )));
        }
        if !(0.0..1.0).contains(&forces.velocity_decay) {
            return Err(LayoutError::InvalidConfig(format!(
                "forces.velocity_decay must be in [0, 1), got {}",
                forces.velocity_decay
            )));
        }
        if !(forces.alpha_min > 0.0 && forces.alpha_min < 1.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "forces.alpha_min must be in (0, 1), got {}",
                forces.alpha_min
            )));
        }

        let drag = self.drag;
        if drag.min_zoom <= 0.0 || drag.min_zoom > drag.max_zoom || drag.reach <= 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "drag reach/zoom bounds are invalid: reach {}, zoom [{}, {}]",
                drag.reach, drag.min_zoom, drag.max_zoom
            )));
        }

        let edges = self.edges;
        if edges.min_handle > edges.max_handle {
            return Err(LayoutError::InvalidConfig(format!(
                "edges.min_handle ({}) exceeds edges.max_handle ({})",
                edges.min_handle, edges.max_handle
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{ "topology": { "page_size": 5 }, "seed": 9 }"#).unwrap();
        assert_eq!(config.topology.page_size, 5);
        assert_eq!(config.topology.max_depth, 3);
        assert_eq!(config.seed, 9);
        assert_eq!(config.forces, ForceConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn footprint_overrides_are_keyed_by_category() {
        let config: LayoutConfig = serde_json::from_str(
            r#"{ "footprints": { "overrides": { "symbol": { "width": 90.0, "height": 30.0 } } } }"#,
        )
        .unwrap();
        let size = config.footprints.size_for(NodeCategory::Symbol);
        assert_eq!(size.width, 90.0);
        assert_eq!(config.footprints.size_for(NodeCategory::File).width, 160.0);
    }

    #[test]
    fn tick_budget_is_clamped() {
        let forces = ForceConfig::default();
        assert_eq!(forces.tick_budget(1), 120);
        assert_eq!(forces.tick_budget(30), 180);
        assert_eq!(forces.tick_budget(1000), 240);
    }

    #[test]
    fn inverted_tick_range_does_not_panic() {
        let forces = ForceConfig {
            min_ticks: 300,
            max_ticks: 10,
            ..ForceConfig::default()
        };
        assert_eq!(forces.tick_budget(50), 10);

        let config = LayoutConfig {
            forces,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LayoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn degenerate_footprint_override_is_rejected() {
        let config: LayoutConfig = serde_json::from_str(
            r#"{ "footprints": { "overrides": { "module": { "width": 0.0, "height": 30.0 } } } }"#,
        )
        .unwrap();
        let Err(LayoutError::InvalidConfig(message)) = config.validate() else {
            panic!("zero-width footprint should be rejected");
        };
        assert!(message.contains("module"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut config = LayoutConfig::default();
        config.topology.page_size = 0;
        assert!(matches!(
            config.validate(),
            Err(LayoutError::InvalidConfig(_))
        ));
    }
}
