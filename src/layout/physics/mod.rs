mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, pos2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::config::{ForceConfig, LayoutConfig};
use crate::graph::GraphSnapshot;

use super::LayoutPositions;
use super::angles::{AngleSlice, ROOT_CENTER_ANGLE, allocate_angles};
use super::footprint::Footprint;
use super::rings::ring_radii;
use super::topology::Topology;
use forces::{CollisionParams, RepulsionParams, repulsion_on, resolve_collisions};
use quadtree::QuadTree;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
    Seeded,
    Relaxing,
    Settled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationEntity {
    pub id: String,
    pub depth: usize,
    pub radius: f32,
    pub child_count: usize,
    pub target: Pos2,
    pub ring: f32,
    pub position: Pos2,
    pub velocity: Vec2,
    pub pinned: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationLink {
    pub source: usize,
    pub target: usize,
    pub rest_length: f32,
    pub strength: f32,
}

impl SimulationLink {
    /// Same-level links are short and soft; links that cross levels grow
    /// longer and stiffer with the depth gap.
    pub fn between(
        source: usize,
        target: usize,
        depth_delta: usize,
        config: &ForceConfig,
    ) -> Self {
        let (rest_length, strength) = if depth_delta == 0 {
            (
                config.same_depth_link_distance,
                config.same_depth_link_strength,
            )
        } else {
            let extra = (depth_delta - 1) as f32;
            (
                config.cross_depth_link_distance + config.cross_depth_link_distance_step * extra,
                (config.cross_depth_link_strength + config.cross_depth_link_strength_step * extra)
                    .min(config.link_strength_cap),
            )
        };

        Self {
            source,
            target,
            rest_length,
            strength,
        }
    }
}

struct PhysicsScratch {
    deltas: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
}

/// Constrained relaxation of the radial seed layout. Always stops after a
/// fixed tick budget so latency stays bounded on large graphs.
pub struct ForceSimulation {
    entities: Vec<SimulationEntity>,
    links: Vec<SimulationLink>,
    center: Pos2,
    config: ForceConfig,
    alpha: f32,
    alpha_decay: f32,
    tick_budget: usize,
    ticks_run: usize,
    phase: SimulationPhase,
    scratch: PhysicsScratch,
}

impl ForceSimulation {
    pub fn seed(graph: &GraphSnapshot, topology: &Topology, config: &LayoutConfig) -> Self {
        let center = pos2(config.canvas.width * 0.5, config.canvas.height * 0.5);
        let slices = allocate_angles(topology);
        let rings = ring_radii(graph, topology, config);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let jitter = config.forces.seed_jitter;

        let mut entities = Vec::with_capacity(topology.node_count());
        for id in &topology.visible {
            let (Some(node), Some(depth)) = (graph.nodes.get(id), topology.depth_of(id)) else {
                continue;
            };

            let ring = rings.get(depth).copied().unwrap_or(0.0);
            let angle = slices
                .get(id)
                .map(AngleSlice::angle)
                .unwrap_or(ROOT_CENTER_ANGLE);
            let target = center + Vec2::angled(angle) * ring;
            let is_root = *id == topology.root_id;
            let pinned = is_root && config.forces.pin_root;
            let child_count = topology.children_of(id).len();
            let footprint = Footprint::for_node(node, depth, config);

            let offset = if pinned || jitter <= 0.0 {
                Vec2::ZERO
            } else {
                Vec2::new(
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                )
            };

            entities.push(SimulationEntity {
                id: id.clone(),
                depth,
                radius: footprint.collision_radius(child_count, &config.footprints),
                child_count,
                target,
                ring,
                position: target + offset,
                velocity: Vec2::ZERO,
                pinned,
            });
        }

        let index_by_id = entities
            .iter()
            .enumerate()
            .map(|(index, entity)| (entity.id.as_str(), index))
            .collect::<HashMap<_, _>>();
        let links = topology
            .edges
            .iter()
            .filter_map(|edge| {
                let source = *index_by_id.get(edge.source.as_str())?;
                let target = *index_by_id.get(edge.target.as_str())?;
                if source == target {
                    return None;
                }
                let depth_delta = entities[source].depth.abs_diff(entities[target].depth);
                Some(SimulationLink::between(
                    source,
                    target,
                    depth_delta,
                    &config.forces,
                ))
            })
            .collect::<Vec<_>>();

        Self::from_parts(entities, links, center, config.forces)
    }

    pub fn from_parts(
        entities: Vec<SimulationEntity>,
        links: Vec<SimulationLink>,
        center: Pos2,
        config: ForceConfig,
    ) -> Self {
        let tick_budget = config.tick_budget(entities.len());
        let alpha_decay = 1.0 - config.alpha_min.powf(1.0 / tick_budget.max(1) as f32);
        let node_count = entities.len();

        Self {
            entities,
            links,
            center,
            config,
            alpha: 1.0,
            alpha_decay,
            tick_budget,
            ticks_run: 0,
            phase: SimulationPhase::Seeded,
            scratch: PhysicsScratch {
                deltas: Vec::with_capacity(node_count),
                positions: Vec::with_capacity(node_count),
                radii: Vec::with_capacity(node_count),
            },
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn tick_budget(&self) -> usize {
        self.tick_budget
    }

    pub fn ticks_run(&self) -> usize {
        self.ticks_run
    }

    pub fn entities(&self) -> &[SimulationEntity] {
        &self.entities
    }

    pub fn links(&self) -> &[SimulationLink] {
        &self.links
    }

    pub fn positions(&self) -> LayoutPositions {
        self.entities
            .iter()
            .map(|entity| (entity.id.clone(), entity.position))
            .collect()
    }

    /// Runs every remaining tick and returns the settled positions.
    pub fn run(mut self) -> LayoutPositions {
        while self.step() != SimulationPhase::Settled {}
        debug!(
            nodes = self.entities.len(),
            links = self.links.len(),
            ticks = self.ticks_run,
            "relaxation settled"
        );
        self.positions()
    }

    pub fn step(&mut self) -> SimulationPhase {
        if self.phase == SimulationPhase::Settled {
            return self.phase;
        }
        if self.ticks_run >= self.tick_budget || self.entities.is_empty() {
            self.phase = SimulationPhase::Settled;
            return self.phase;
        }

        self.phase = SimulationPhase::Relaxing;
        self.alpha += (0.0 - self.alpha) * self.alpha_decay;
        self.apply_forces();
        self.integrate();
        self.ticks_run += 1;
        trace!(tick = self.ticks_run, alpha = self.alpha, "relaxation tick");

        if self.ticks_run >= self.tick_budget {
            self.phase = SimulationPhase::Settled;
        }
        self.phase
    }

    fn apply_forces(&mut self) {
        let config = self.config;
        let alpha = self.alpha;
        let node_count = self.entities.len();

        let scratch = &mut self.scratch;
        scratch.deltas.clear();
        scratch.deltas.resize(node_count, Vec2::ZERO);
        scratch.positions.clear();
        scratch.radii.clear();
        for entity in &self.entities {
            scratch.positions.push(entity.position.to_vec2());
            scratch.radii.push(entity.radius);
        }

        let deltas = &mut scratch.deltas;
        let positions = &scratch.positions;
        let radii = &scratch.radii;

        if let Some(tree) = QuadTree::build(positions, radii) {
            let repulsion = RepulsionParams {
                strength: config.repulsion_strength * alpha,
                softening: config.repulsion_softening,
                range_sq: config.repulsion_range * config.repulsion_range,
                theta: config.barnes_hut_theta,
            };
            for (index, (entity, delta)) in self.entities.iter().zip(deltas.iter_mut()).enumerate() {
                if !entity.pinned {
                    *delta += repulsion_on(&tree, index, positions, repulsion);
                }
            }

            resolve_collisions(
                &tree,
                positions,
                radii,
                CollisionParams {
                    strength: config.collision_strength,
                    padding: config.collision_padding,
                },
                deltas,
            );
        }

        let center = self.center.to_vec2();
        for (entity, delta) in self.entities.iter().zip(deltas.iter_mut()) {
            if entity.pinned {
                continue;
            }

            let is_root = entity.depth == 0;
            let position = entity.position.to_vec2();
            *delta += (center - position) * config.center_strength * alpha;

            let target_strength = if is_root {
                config.root_target_strength
            } else {
                config.target_strength
            };
            *delta += (entity.target.to_vec2() - position) * target_strength * alpha;

            let radial_strength = if is_root {
                config.root_radial_strength
            } else {
                config.radial_strength
            };
            let offset = position - center;
            let radius = offset.length();
            if radius > 0.0001 {
                *delta += (offset / radius) * (entity.ring - radius) * radial_strength * alpha;
            }
        }

        for link in &self.links {
            let source = &self.entities[link.source];
            let target = &self.entities[link.target];
            let mut span = (target.position + target.velocity) - (source.position + source.velocity);
            let mut length = span.length();
            if length <= 0.0001 {
                span = Vec2::angled((link.source as f32 * 0.618_034) * std::f32::consts::TAU);
                length = 1.0;
            }

            let stretch = (length - link.rest_length) / length * alpha * link.strength;
            let correction = span * stretch;
            let (source_share, target_share) = match (source.pinned, target.pinned) {
                (true, true) => continue,
                (true, false) => (0.0, 1.0),
                (false, true) => (1.0, 0.0),
                (false, false) => (0.5, 0.5),
            };
            deltas[link.target] -= correction * target_share;
            deltas[link.source] += correction * source_share;
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        let max_speed = self.config.max_speed;
        let max_speed_sq = max_speed * max_speed;

        for (entity, delta) in self.entities.iter_mut().zip(&self.scratch.deltas) {
            if entity.pinned {
                entity.position = entity.target;
                entity.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = (entity.velocity + *delta) * keep;
            let speed_sq = velocity.length_sq();
            if speed_sq > max_speed_sq {
                velocity *= max_speed / speed_sq.sqrt();
            }

            let next = entity.position + velocity;
            if next.x.is_finite() && next.y.is_finite() {
                entity.velocity = velocity;
                entity.position = next;
            } else {
                entity.velocity = Vec2::ZERO;
                entity.position = entity.target;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Adjacency, EdgeRecord, NodeRecord};
    use crate::layout::topology::{SiblingPages, TopologyParams, build_topology};

    fn sample() -> (GraphSnapshot, Topology) {
        let mut graph = GraphSnapshot::default();
        graph.insert_node(NodeRecord::new("root", "root"));
        for parent in 0..3 {
            let parent_id = format!("p{parent}");
            graph.insert_node(NodeRecord::new(&parent_id, &parent_id));
            graph.insert_edge(EdgeRecord::new(format!("r{parent}"), "root", &parent_id));
            for child in 0..4 {
                let child_id = format!("p{parent}c{child}");
                graph.insert_node(NodeRecord::new(&child_id, &child_id));
                graph.insert_edge(EdgeRecord::new(
                    format!("e{parent}{child}"),
                    &parent_id,
                    &child_id,
                ));
            }
        }
        let adjacency = Adjacency::from_graph(&graph);
        let pages = SiblingPages::new();
        let topology = build_topology(
            &graph,
            &adjacency,
            TopologyParams {
                root_id: "root",
                max_depth: 2,
                page_size: 20,
                pages: &pages,
            },
        )
        .unwrap();
        (graph, topology)
    }

    #[test]
    fn seeds_on_rings_and_pins_root_at_center() {
        let (graph, topology) = sample();
        let config = LayoutConfig::default();
        let simulation = ForceSimulation::seed(&graph, &topology, &config);
        assert_eq!(simulation.phase(), SimulationPhase::Seeded);

        let center = pos2(config.canvas.width * 0.5, config.canvas.height * 0.5);
        for entity in simulation.entities() {
            let radius = (entity.target - center).length();
            assert!((radius - entity.ring).abs() < 0.01, "{} off its ring", entity.id);
            assert_eq!(entity.pinned, entity.id == "root");
        }
        assert_eq!(simulation.links().len(), 15);
    }

    #[test]
    fn runs_exactly_the_tick_budget() {
        let (graph, topology) = sample();
        let config = LayoutConfig::default();
        let mut simulation = ForceSimulation::seed(&graph, &topology, &config);
        assert_eq!(simulation.tick_budget(), 120);

        let mut ticks = 0;
        while simulation.step() != SimulationPhase::Settled {
            ticks += 1;
        }
        assert_eq!(ticks + 1, simulation.tick_budget());
        assert_eq!(simulation.ticks_run(), simulation.tick_budget());
        assert_eq!(simulation.step(), SimulationPhase::Settled);
        assert_eq!(simulation.ticks_run(), simulation.tick_budget());
    }

    #[test]
    fn root_stays_at_center_and_output_is_finite() {
        let (graph, topology) = sample();
        let config = LayoutConfig::default();
        let positions = ForceSimulation::seed(&graph, &topology, &config).run();
        assert_eq!(positions.len(), topology.node_count());
        assert_eq!(
            positions["root"],
            pos2(config.canvas.width * 0.5, config.canvas.height * 0.5)
        );
        assert!(
            positions
                .values()
                .all(|position| position.x.is_finite() && position.y.is_finite())
        );
    }

    #[test]
    fn same_seed_is_bit_identical() {
        let (graph, topology) = sample();
        let config = LayoutConfig {
            seed: 42,
            ..LayoutConfig::default()
        };
        let first = ForceSimulation::seed(&graph, &topology, &config).run();
        let second = ForceSimulation::seed(&graph, &topology, &config).run();
        for (id, position) in &first {
            let other = second[id];
            assert_eq!(position.x.to_bits(), other.x.to_bits());
            assert_eq!(position.y.to_bits(), other.y.to_bits());
        }
    }

    #[test]
    fn link_springs_depend_on_depth_gap() {
        let config = ForceConfig::default();
        let flat = SimulationLink::between(0, 1, 0, &config);
        let one = SimulationLink::between(0, 1, 1, &config);
        let three = SimulationLink::between(0, 1, 3, &config);
        assert_eq!(flat.rest_length, 112.0);
        assert_eq!(flat.strength, 0.28);
        assert!(one.rest_length > flat.rest_length && one.strength > flat.strength);
        assert!(three.rest_length > one.rest_length && three.strength > one.strength);
    }
}
