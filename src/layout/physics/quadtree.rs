use std::ops::Range;

use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_SPLITS: usize = 10;

pub(super) type CellId = usize;

/// Axis-aligned square region of the canvas.
#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half: f32,
}

impl Square {
    /// Smallest padded square around every point; `None` when a point is
    /// non-finite or there are no points.
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }

        let extent = max - min;
        Some(Self {
            center: (min + max) * 0.5,
            half: extent.max_elem().max(1.0) * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half && offset.y <= self.half
    }

    pub(super) fn side(self) -> f32 {
        self.half * 2.0
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half * 0.5;
        let sign = |bit: usize| if quadrant & bit == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign(1), sign(2)) * quarter,
            half: quarter,
        }
    }

    /// Squared gap between the two squares; zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let gap = ((self.center - other.center).abs() - Vec2::splat(self.half + other.half))
            .max(Vec2::ZERO);
        gap.length_sq()
    }

    pub(super) fn gap_sq_to_point(self, point: Vec2) -> f32 {
        let gap = ((point - self.center).abs() - Vec2::splat(self.half)).max(Vec2::ZERO);
        gap.length_sq()
    }
}

#[derive(Debug)]
pub(super) struct Cell {
    pub(super) square: Square,
    pub(super) centroid: Vec2,
    pub(super) mass: f32,
    /// Largest collision radius of any entity in the cell.
    pub(super) max_radius: f32,
    members: Range<usize>,
    pub(super) children: [Option<CellId>; 4],
}

impl Cell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Barnes-Hut quadtree over the simulation entities, stored as a flat
/// arena. Every cell owns a contiguous run of `order`, so a cell's members
/// include all of its descendants' members.
#[derive(Debug)]
pub(super) struct QuadTree {
    cells: Vec<Cell>,
    order: Vec<usize>,
}

impl QuadTree {
    pub(super) const ROOT: CellId = 0;

    pub(super) fn build(positions: &[Vec2], radii: &[f32]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        let mut tree = Self {
            cells: Vec::with_capacity(positions.len() / LEAF_CAPACITY * 4 + 1),
            order: (0..positions.len()).collect(),
        };
        tree.subdivide(square, 0..positions.len(), positions, radii, 0);
        Some(tree)
    }

    fn subdivide(
        &mut self,
        square: Square,
        members: Range<usize>,
        positions: &[Vec2],
        radii: &[f32],
        splits: usize,
    ) -> CellId {
        let run = &mut self.order[members.clone()];
        let mass = run.len() as f32;
        let centroid = run
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
            / mass.max(1.0);
        let max_radius = run
            .iter()
            .map(|&index| radii.get(index).copied().unwrap_or(0.0))
            .fold(0.0, f32::max);

        let id = self.cells.len();
        self.cells.push(Cell {
            square,
            centroid,
            mass,
            max_radius,
            members: members.clone(),
            children: [None; 4],
        });

        if splits >= MAX_SPLITS || run.len() <= LEAF_CAPACITY {
            return id;
        }

        run.sort_by_key(|&index| square.quadrant_of(positions[index]));
        let mut counts = [0usize; 4];
        for &index in run.iter() {
            counts[square.quadrant_of(positions[index])] += 1;
        }
        if counts.iter().filter(|count| **count > 0).count() <= 1 {
            return id;
        }

        let mut start = members.start;
        for (quadrant, count) in counts.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            let child = self.subdivide(
                square.quadrant(quadrant),
                start..start + count,
                positions,
                radii,
                splits + 1,
            );
            self.cells[id].children[quadrant] = Some(child);
            start += count;
        }
        id
    }

    pub(super) fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id]
    }

    pub(super) fn members(&self, id: CellId) -> &[usize] {
        &self.order[self.cells[id].members.clone()]
    }

    pub(super) fn children(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.cells[id].children.iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spiral(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| Vec2::angled(index as f32 * 0.37) * (index as f32 * 3.0))
            .collect()
    }

    fn leaf_members(tree: &QuadTree, id: CellId, out: &mut Vec<usize>) {
        if tree.cell(id).is_leaf() {
            out.extend_from_slice(tree.members(id));
        }
        for child in tree.children(id) {
            leaf_members(tree, child, out);
        }
    }

    #[test]
    fn every_entity_lands_in_exactly_one_leaf() {
        let positions = spiral(200);
        let radii = vec![4.0; positions.len()];
        let tree = QuadTree::build(&positions, &radii).unwrap();
        let root = tree.cell(QuadTree::ROOT);
        assert!(!root.is_leaf());
        assert_eq!(root.mass, 200.0);

        let mut seen = Vec::new();
        leaf_members(&tree, QuadTree::ROOT, &mut seen);
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn cells_track_their_largest_radius() {
        let positions = spiral(64);
        let mut radii = vec![2.0; positions.len()];
        radii[63] = 30.0;
        let tree = QuadTree::build(&positions, &radii).unwrap();

        assert_eq!(tree.cell(QuadTree::ROOT).max_radius, 30.0);
        let holder = tree
            .children(QuadTree::ROOT)
            .find(|child| tree.members(*child).contains(&63))
            .unwrap();
        assert_eq!(tree.cell(holder).max_radius, 30.0);
        assert!(
            tree.children(QuadTree::ROOT)
                .filter(|child| *child != holder)
                .all(|child| tree.cell(child).max_radius == 2.0)
        );
    }

    #[test]
    fn non_finite_or_empty_input_builds_nothing() {
        assert!(QuadTree::build(&[vec2(f32::NAN, 0.0)], &[1.0]).is_none());
        assert!(QuadTree::build(&[], &[]).is_none());
    }
}
