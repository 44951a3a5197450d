use eframe::egui::Vec2;

use super::quadtree::{CellId, QuadTree};

const COINCIDENT_DISTANCE: f32 = 0.0001;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) range_sq: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) padding: f32,
}

/// Unit vector pointing from `b` toward `a`. Coincident entities get a
/// fixed direction derived from the pair so reruns stay bit-identical.
fn separation_direction(delta: Vec2, distance: f32, a: usize, b: usize) -> Vec2 {
    if distance > COINCIDENT_DISTANCE {
        delta / distance
    } else {
        let turns = (a as f32) * 0.618_034 + (b as f32) * 0.414_214;
        Vec2::angled(turns * std::f32::consts::TAU)
    }
}

fn inverse_square(delta: Vec2, distance_sq: f32, mass: f32, params: RepulsionParams) -> Vec2 {
    let distance = distance_sq.sqrt().max(COINCIDENT_DISTANCE);
    delta / distance * (params.strength * mass / (distance_sq + params.softening))
}

/// Capped-range n-body push on one entity. Cells far enough away relative
/// to their size act as a single body at their centroid.
pub(super) fn repulsion_on(
    tree: &QuadTree,
    index: usize,
    positions: &[Vec2],
    params: RepulsionParams,
) -> Vec2 {
    let point = positions[index];
    let mut force = Vec2::ZERO;
    let mut pending = vec![QuadTree::ROOT];

    while let Some(id) = pending.pop() {
        let cell = tree.cell(id);
        if cell.mass <= 0.0 || cell.square.gap_sq_to_point(point) > params.range_sq {
            continue;
        }

        if cell.is_leaf() {
            for &other in tree.members(id) {
                if other == index {
                    continue;
                }
                let delta = point - positions[other];
                let distance_sq = delta.length_sq();
                if distance_sq > params.range_sq {
                    continue;
                }
                let direction = separation_direction(delta, distance_sq.sqrt(), index, other);
                force += direction * (params.strength / (distance_sq + params.softening));
            }
            continue;
        }

        let delta = point - cell.centroid;
        let distance_sq = delta.length_sq();
        let far_enough = cell.mass > 1.0
            && !cell.square.contains(point)
            && cell.square.side() < params.theta * distance_sq.sqrt();
        if far_enough {
            if distance_sq <= params.range_sq {
                force += inverse_square(delta, distance_sq, cell.mass, params);
            }
        } else {
            pending.extend(tree.children(id));
        }
    }

    force
}

fn separate(
    a: usize,
    b: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let delta = positions[a] - positions[b];
    let distance = delta.length();
    let clearance = radii[a] + radii[b] + params.padding;
    if distance >= clearance {
        return;
    }

    let push = separation_direction(delta, distance, a, b) * (clearance - distance) * 0.5;
    deltas[a] += push * params.strength;
    deltas[b] -= push * params.strength;
}

/// Pushes overlapping footprints apart. Pairs of cells are skipped when
/// their gap exceeds the largest footprints they could hold.
pub(super) fn resolve_collisions(
    tree: &QuadTree,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let mut pending: Vec<(CellId, CellId)> = vec![(QuadTree::ROOT, QuadTree::ROOT)];

    while let Some((a, b)) = pending.pop() {
        let (cell_a, cell_b) = (tree.cell(a), tree.cell(b));
        let reach = cell_a.max_radius + cell_b.max_radius + params.padding;
        if cell_a.square.gap_sq(cell_b.square) > reach * reach {
            continue;
        }

        match (a == b, cell_a.is_leaf(), cell_b.is_leaf()) {
            (true, true, _) => {
                let members = tree.members(a);
                for (offset, &first) in members.iter().enumerate() {
                    for &second in &members[offset + 1..] {
                        separate(first, second, positions, radii, params, deltas);
                    }
                }
            }
            (true, false, _) => {
                let children = tree.children(a).collect::<Vec<_>>();
                for (offset, &first) in children.iter().enumerate() {
                    pending.push((first, first));
                    pending.extend(children[offset + 1..].iter().map(|&second| (first, second)));
                }
            }
            (false, true, true) => {
                for &first in tree.members(a) {
                    for &second in tree.members(b) {
                        separate(first, second, positions, radii, params, deltas);
                    }
                }
            }
            (false, leaf_a, leaf_b) => {
                let split_a = !leaf_a && (leaf_b || cell_a.square.half >= cell_b.square.half);
                if split_a {
                    pending.extend(tree.children(a).map(|child| (child, b)));
                } else {
                    pending.extend(tree.children(b).map(|child| (a, child)));
                }
            }
        }
    }
}
