//! Property-based invariant tests for the layout core.
//!
//! Verifies:
//! 1. Every visible edge has both endpoints visible
//! 2. A child sits exactly one hop deeper than the parent it was reached from
//! 3. The root is always visible at depth 0 and never exceeds the depth limit
//! 4. No parent shows more children than the page size
//! 5. Child angle slices exactly partition their parent's slice
//! 6. Each child's polar angle lies strictly inside its parent's slice
//! 7. Relaxation is deterministic for a fixed seed and keeps the root centered
//! 8. A zero drag delta overrides only the dragged node, at its base position
//! 9. Drag propagation never moves a node further than the pointer moved
//! 10. Close centers give a straight edge; distant ones give a curve whose
//!     handles stay between the two anchors

use std::collections::HashMap;
use std::f32::consts::TAU;

use eframe::egui::{Pos2, Vec2, pos2, vec2};
use orbitview::config::EdgeConfig;
use orbitview::edges::{EdgeEndpoints, edge_geometry};
use orbitview::layout::angles::allocate_angles;
use orbitview::{
    Adjacency, DragSession, EdgeRecord, GraphSnapshot, LayoutConfig, LayoutPositions,
    LayoutRequest, ManualOverrides, NodeRecord, SiblingPages, Topology, TopologyParams,
    build_topology, relax,
};
use proptest::prelude::*;

// ── Strategy helpers ──────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct GraphCase {
    graph: GraphSnapshot,
    max_depth: usize,
    page_size: usize,
}

fn node_id(index: usize) -> String {
    format!("n{index:02}")
}

fn arb_graph_case(max_nodes: usize) -> impl Strategy<Value = GraphCase> {
    (2usize..=max_nodes).prop_flat_map(|node_count| {
        (
            prop::collection::vec((0..node_count, 0..node_count), 0..node_count * 3),
            prop::collection::vec(any::<bool>(), node_count),
            prop::collection::vec(0u8..26, node_count),
            0usize..5,
            1usize..6,
        )
            .prop_map(move |(links, collapsed, initials, max_depth, page_size)| {
                let mut graph = GraphSnapshot::default();
                for index in 0..node_count {
                    let label = format!("{}-{index}", char::from(b'a' + initials[index]));
                    let mut node = NodeRecord::new(node_id(index), label);
                    // Root stays expanded so most cases reach past depth 0.
                    if index > 0 && collapsed[index] {
                        node = node.collapsed();
                    }
                    graph.insert_node(node);
                }
                for (position, (source, target)) in links.into_iter().enumerate() {
                    graph.insert_edge(EdgeRecord::new(
                        format!("e{position:03}"),
                        node_id(source),
                        node_id(target),
                    ));
                }
                GraphCase {
                    graph,
                    max_depth,
                    page_size,
                }
            })
    })
}

fn arb_point(extent: f32) -> impl Strategy<Value = Pos2> {
    (-extent..extent, -extent..extent).prop_map(|(x, y)| pos2(x, y))
}

fn topology_for(case: &GraphCase) -> Topology {
    let adjacency = Adjacency::from_graph(&case.graph);
    let pages = SiblingPages::new();
    build_topology(
        &case.graph,
        &adjacency,
        TopologyParams {
            root_id: "n00",
            max_depth: case.max_depth,
            page_size: case.page_size,
            pages: &pages,
        },
    )
    .expect("root is always generated")
}

fn position_bits(positions: &LayoutPositions) -> Vec<(String, u32, u32)> {
    let mut bits = positions
        .iter()
        .map(|(id, point)| (id.clone(), point.x.to_bits(), point.y.to_bits()))
        .collect::<Vec<_>>();
    bits.sort();
    bits
}

// ── Topology ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn visible_edges_have_visible_endpoints(case in arb_graph_case(24)) {
        let topology = topology_for(&case);
        for edge in &topology.edges {
            prop_assert!(topology.contains(&edge.source), "{} missing", edge.source);
            prop_assert!(topology.contains(&edge.target), "{} missing", edge.target);
        }
    }

    #[test]
    fn children_are_one_hop_deeper(case in arb_graph_case(24)) {
        let topology = topology_for(&case);
        for (child, parent) in &topology.parent_by_id {
            let parent_depth = topology.depth_of(parent).expect("parent visible");
            prop_assert_eq!(topology.depth_of(child), Some(parent_depth + 1));
        }
    }

    #[test]
    fn root_is_shallowest_and_depth_is_bounded(case in arb_graph_case(24)) {
        let topology = topology_for(&case);
        prop_assert_eq!(topology.visible.first().map(String::as_str), Some("n00"));
        prop_assert_eq!(topology.depth_of("n00"), Some(0));
        prop_assert!(topology.max_depth() <= case.max_depth);
        prop_assert_eq!(topology.visible.len(), topology.visible_ids.len());
    }

    #[test]
    fn no_parent_exceeds_the_page_size(case in arb_graph_case(24)) {
        let topology = topology_for(&case);
        for children in topology.children_by_parent.values() {
            prop_assert!(children.len() <= case.page_size);
        }
    }
}

// ── Angles ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn child_slices_partition_the_parent(case in arb_graph_case(24)) {
        let topology = topology_for(&case);
        let slices = allocate_angles(&topology);
        prop_assert_eq!(slices.len(), topology.node_count());

        let tolerance = 1e-4 * TAU;
        for id in &topology.visible {
            let children = topology.children_of(id);
            if children.is_empty() {
                continue;
            }
            let parent = slices[id];
            let total = children.iter().map(|child| slices[child].span).sum::<f32>();
            prop_assert!((total - parent.span).abs() <= tolerance, "{total} vs {}", parent.span);
        }
    }

    #[test]
    fn child_angle_lies_inside_parent_slice(case in arb_graph_case(24)) {
        let topology = topology_for(&case);
        let slices = allocate_angles(&topology);
        for (child, parent) in &topology.parent_by_id {
            let outer = slices[parent];
            let angle = slices[child].angle();
            prop_assert!(angle > outer.start && angle < outer.end());
        }
    }
}

// ── Relaxation ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn relaxation_is_deterministic_and_root_centered(
        case in arb_graph_case(12),
        seed in any::<u64>(),
    ) {
        let topology = topology_for(&case);
        let mut config = LayoutConfig::default();
        config.seed = seed;

        let first = relax(LayoutRequest::new(1, &case.graph, &topology, &config));
        let second = relax(LayoutRequest::new(1, &case.graph, &topology, &config));
        prop_assert_eq!(position_bits(&first.positions), position_bits(&second.positions));

        let center = pos2(config.canvas.width * 0.5, config.canvas.height * 0.5);
        prop_assert_eq!(first.positions.get("n00").copied(), Some(center));
        for point in first.positions.values() {
            prop_assert!(point.x.is_finite() && point.y.is_finite());
        }
    }
}

// ── Drag ─────────────────────────────────────────────────────────────

fn drag_fixture(
    case: &GraphCase,
    points: &[Pos2],
) -> (Adjacency, LayoutPositions, HashMap<String, usize>) {
    let adjacency = Adjacency::from_graph(&case.graph);
    let rendered = (0..case.graph.node_count())
        .map(|index| (node_id(index), points[index % points.len()]))
        .collect::<LayoutPositions>();
    let topology = topology_for(case);
    (adjacency, rendered, topology.depth_by_id)
}

proptest! {
    #[test]
    fn zero_delta_touches_only_the_dragged_node(
        case in arb_graph_case(16),
        points in prop::collection::vec(arb_point(600.0), 1..16),
        zoom in 0.2f32..4.0,
    ) {
        let (adjacency, rendered, depths) = drag_fixture(&case, &points);
        let session = DragSession::begin("n00", &rendered, &ManualOverrides::new())
            .expect("dragged node is rendered");
        let overrides = session.propagate(
            Vec2::ZERO,
            zoom,
            &adjacency,
            &depths,
            &LayoutConfig::default().drag,
        );
        prop_assert_eq!(overrides, ManualOverrides::from([("n00".to_owned(), rendered["n00"])]));
    }

    #[test]
    fn no_node_outruns_the_pointer(
        case in arb_graph_case(16),
        points in prop::collection::vec(arb_point(600.0), 1..16),
        delta in (-200.0f32..200.0, -200.0f32..200.0).prop_map(|(x, y)| vec2(x, y)),
        zoom in 0.2f32..4.0,
    ) {
        let (adjacency, rendered, depths) = drag_fixture(&case, &points);
        let session = DragSession::begin("n00", &rendered, &ManualOverrides::new())
            .expect("dragged node is rendered");
        let overrides = session.propagate(
            delta,
            zoom,
            &adjacency,
            &depths,
            &LayoutConfig::default().drag,
        );

        prop_assert_eq!(overrides.get("n00").copied(), Some(rendered["n00"] + delta));
        for (id, moved) in &overrides {
            let base = session.base_position(id).expect("moved nodes have a base");
            prop_assert!((*moved - base).length() <= delta.length() + 1e-3);
        }
    }
}

// ── Edges ────────────────────────────────────────────────────────────

const HALF_SIZE: Vec2 = Vec2::new(40.0, 15.0);

fn pair(source: Pos2, angle: f32, distance: f32) -> EdgeEndpoints {
    EdgeEndpoints {
        source_center: source,
        source_half_size: HALF_SIZE,
        target_center: source + Vec2::angled(angle) * distance,
        target_half_size: HALF_SIZE,
    }
}

proptest! {
    #[test]
    fn close_centers_draw_a_straight_edge(
        source in arb_point(1000.0),
        angle in 0.0f32..TAU,
        fraction in 0.0f32..0.99,
    ) {
        let config = EdgeConfig::default();
        let edge = EdgeRecord::new("e", "a", "b");
        let ends = pair(source, angle, config.straight_threshold * fraction);
        let geometry = edge_geometry(&edge, &ends, false, &config);
        prop_assert!(geometry.is_line());
    }

    #[test]
    fn distant_centers_curve_between_anchors(
        source in arb_point(1000.0),
        angle in 0.0f32..TAU,
        extra in 1.0f32..2000.0,
    ) {
        let config = EdgeConfig::default();
        let edge = EdgeRecord::new("e", "a", "b");
        // Far enough apart that the two boxes never overlap.
        let distance = config.straight_threshold + 2.0 * HALF_SIZE.length() + extra;
        let geometry = edge_geometry(&edge, &pair(source, angle, distance), false, &config);

        let controls = geometry.controls;
        prop_assert!(controls.is_some());
        let chord = geometry.to - geometry.from;
        let length_sq = chord.length_sq();
        for control in controls.into_iter().flatten() {
            let projection = (control - geometry.from).dot(chord) / length_sq;
            prop_assert!((-1e-3..=1.0 + 1e-3).contains(&projection), "projection {projection}");
        }
    }
}
