use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

pub(super) const ROOT: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    fn quadrant(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign_x = if quadrant & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if quadrant & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half_extent: quarter,
        }
    }
}

#[derive(Clone, Debug)]
pub(super) struct QuadCell {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) count: usize,
    pub(super) depth: usize,
    /// Point indices, populated on leaves only.
    pub(super) points: Vec<usize>,
    pub(super) children: [Option<usize>; 4],
}

impl QuadCell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Bucketed quadtree over a snapshot of node positions, stored as a flat arena.
#[derive(Clone, Debug, Default)]
pub(super) struct Quadtree {
    pub(super) cells: Vec<QuadCell>,
}

impl Quadtree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(positions)?;
        let mut tree = Self { cells: Vec::new() };
        let all = (0..positions.len()).collect::<Vec<_>>();
        let mut pending = vec![(None::<(usize, usize)>, bounds, all, 0)];

        while let Some((slot, bounds, indices, depth)) = pending.pop() {
            let cell_index = tree.cells.len();
            if let Some((parent, quadrant)) = slot {
                tree.cells[parent].children[quadrant] = Some(cell_index);
            }

            let count = indices.len();
            let mut center_of_mass = Vec2::ZERO;
            for &index in &indices {
                center_of_mass += positions[index];
            }
            if count > 0 {
                center_of_mass /= count as f32;
            }

            let split = depth < MAX_DEPTH && count > LEAF_CAPACITY;
            let mut buckets: [Vec<usize>; 4] = Default::default();
            if split {
                for &index in &indices {
                    buckets[bounds.quadrant(positions[index])].push(index);
                }
            }

            tree.cells.push(QuadCell {
                bounds,
                center_of_mass,
                count,
                depth,
                points: if split { Vec::new() } else { indices },
                children: [None; 4],
            });

            for (quadrant, bucket) in buckets.into_iter().enumerate() {
                if !bucket.is_empty() {
                    pending.push((
                        Some((cell_index, quadrant)),
                        bounds.child(quadrant),
                        bucket,
                        depth + 1,
                    ));
                }
            }
        }

        Some(tree)
    }

    pub(super) fn cell(&self, index: usize) -> &QuadCell {
        &self.cells[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Lcg;

    fn scattered(count: usize, spread: f32) -> Vec<Vec2> {
        let mut lcg = Lcg::default();
        (0..count)
            .map(|_| vec2(lcg.next_unit() * spread, lcg.next_unit() * spread))
            .collect()
    }

    #[test]
    fn every_point_lands_in_exactly_one_leaf() {
        let positions = scattered(500, 1000.0);
        let tree = Quadtree::build(&positions).expect("finite points");

        let mut seen = vec![0usize; positions.len()];
        for cell in &tree.cells {
            if cell.is_leaf() {
                assert!(cell.points.len() <= LEAF_CAPACITY || cell.depth == MAX_DEPTH);
                for &index in &cell.points {
                    seen[index] += 1;
                    assert!(cell.bounds.contains(positions[index]));
                }
            } else {
                assert!(cell.points.is_empty());
            }
        }
        assert!(seen.iter().all(|&hits| hits == 1));
        assert_eq!(tree.cell(ROOT).count, positions.len());
    }

    #[test]
    fn children_counts_sum_to_parent() {
        let positions = scattered(200, 300.0);
        let tree = Quadtree::build(&positions).expect("finite points");

        for cell in tree.cells.iter().filter(|cell| !cell.is_leaf()) {
            let total = cell
                .children
                .iter()
                .flatten()
                .map(|&child| tree.cell(child).count)
                .sum::<usize>();
            assert_eq!(total, cell.count);
        }
    }

    #[test]
    fn coincident_points_bottom_out_at_max_depth() {
        let positions = vec![vec2(5.0, 5.0); 40];
        let tree = Quadtree::build(&positions).expect("finite points");

        let leaves = tree
            .cells
            .iter()
            .filter(|cell| cell.is_leaf())
            .collect::<Vec<_>>();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].depth, MAX_DEPTH);
        assert_eq!(leaves[0].points.len(), 40);
        assert_eq!(tree.cell(ROOT).center_of_mass, vec2(5.0, 5.0));
    }

    #[test]
    fn non_finite_positions_yield_no_tree() {
        assert!(Quadtree::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(Quadtree::build(&[]).is_none());
    }
}
