use eframe::egui::{Pos2, Rect, Vec2, vec2};

use crate::config::{DepthScaleConfig, FootprintConfig, LayoutConfig};
use crate::graph::NodeRecord;

/// Visual shrink factor applied to nodes further from the root.
pub fn depth_scale(depth: usize, config: &DepthScaleConfig) -> f32 {
    (1.0 - depth as f32 * config.scale_step).max(config.min_scale)
}

/// On-screen rectangular extent of a node, centered on its position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    pub half_size: Vec2,
}

impl Footprint {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            half_size: vec2(width * 0.5, height * 0.5),
        }
    }

    pub fn for_node(node: &NodeRecord, depth: usize, config: &LayoutConfig) -> Self {
        let size = config.footprints.size_for(node.category);
        let scale = depth_scale(depth, &config.depth_scale);
        Self::new(size.width * scale, size.height * scale)
    }

    pub fn half_extent(&self) -> f32 {
        self.half_size.x.max(self.half_size.y)
    }

    /// Personal space used by collision avoidance; busy parents reserve more.
    pub fn collision_radius(&self, child_count: usize, config: &FootprintConfig) -> f32 {
        let crowding = child_count.min(config.child_cap) as f32 * config.child_spacing_step;
        self.half_extent() * (1.0 + crowding)
    }

    pub fn rect(&self, center: Pos2) -> Rect {
        Rect::from_center_size(center, self.half_size * 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeCategory;

    #[test]
    fn scale_shrinks_then_floors() {
        let config = DepthScaleConfig {
            min_scale: 0.5,
            scale_step: 0.2,
        };
        assert_eq!(depth_scale(0, &config), 1.0);
        assert!((depth_scale(1, &config) - 0.8).abs() < 1e-6);
        assert_eq!(depth_scale(10, &config), 0.5);
    }

    #[test]
    fn collision_radius_grows_with_children_up_to_cap() {
        let config = FootprintConfig::default();
        let footprint = Footprint::new(100.0, 40.0);
        assert_eq!(footprint.collision_radius(0, &config), 50.0);
        let busy = footprint.collision_radius(config.child_cap, &config);
        assert!(busy > 50.0);
        assert_eq!(footprint.collision_radius(config.child_cap * 10, &config), busy);
    }

    #[test]
    fn node_footprint_follows_category_and_depth() {
        let config = LayoutConfig::default();
        let node = NodeRecord::new("s", "sym").with_category(NodeCategory::Symbol);
        let shallow = Footprint::for_node(&node, 0, &config);
        let deep = Footprint::for_node(&node, 3, &config);
        assert_eq!(shallow.half_size, vec2(70.0, 20.0));
        assert!(deep.half_extent() < shallow.half_extent());
    }
}
