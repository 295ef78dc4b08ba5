use nalgebra::Vector2;

const QUADTREE_LEAF_CAPACITY: usize = 8;
const QUADTREE_MAX_DEPTH: usize = 16;

#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    pub(super) center: Vector2<f64>,
    pub(super) half_extent: f64,
}

impl QuadBounds {
    fn from_points(points: &[Vector2<f64>]) -> Option<Self> {
        let mut min = Vector2::repeat(f64::INFINITY);
        let mut max = Vector2::repeat(f64::NEG_INFINITY);

        for point in points {
            min = min.inf(point);
            max = max.sup(point);
        }

        if !min.iter().chain(max.iter()).all(|value| value.is_finite()) {
            return None;
        }

        let center = (min + max) * 0.5;
        let span = (max - min).max().max(1.0);

        Some(Self {
            center,
            half_extent: (span * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vector2<f64>) -> bool {
        let offset = point - self.center;
        offset.x.abs() <= self.half_extent && offset.y.abs() <= self.half_extent
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => Vector2::new(-quarter, -quarter),
            1 => Vector2::new(quarter, -quarter),
            2 => Vector2::new(-quarter, quarter),
            _ => Vector2::new(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vector2<f64>) -> usize {
        let right = point.x >= self.center.x;
        let lower = point.y >= self.center.y;
        match (right, lower) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    pub(super) fn side_length(self) -> f64 {
        self.half_extent * 2.0
    }

    pub(super) fn distance_sq_to(self, other: Self) -> f64 {
        let reach = self.half_extent + other.half_extent;
        let gap = (self.center - other.center).abs().add_scalar(-reach);
        gap.map(|value| value.max(0.0)).norm_squared()
    }
}

/// Region of the plane with the aggregates the forces need: point count and centroid for
/// many-body, largest collision radius for overlap pruning.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vector2<f64>,
    pub(super) mass: f64,
    pub(super) max_radius: f64,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vector2<f64>], radii: &[f64]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, radii, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vector2<f64>],
        radii: &[f64],
        depth: usize,
    ) -> Self {
        let mut center_of_mass = Vector2::zeros();
        let mut max_radius = 0.0_f64;
        for &index in &indices {
            center_of_mass += positions[index];
            max_radius = max_radius.max(radii.get(index).copied().unwrap_or(0.0));
        }

        let mass = indices.len() as f64;
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            max_radius,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || node.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            let quadrant = bounds.quadrant_for(positions[index]);
            buckets[quadrant].push(index);
        }

        let non_empty = buckets.iter().filter(|bucket| !bucket.is_empty()).count();
        if non_empty <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            node.children[quadrant] = Some(Box::new(Self::build_node(
                bounds.child(quadrant),
                bucket,
                positions,
                radii,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadNode> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(side: usize, spacing: f64) -> Vec<Vector2<f64>> {
        (0..side * side)
            .map(|index| {
                Vector2::new(
                    (index % side) as f64 * spacing,
                    (index / side) as f64 * spacing,
                )
            })
            .collect()
    }

    fn leaf_indices(node: &QuadNode, out: &mut Vec<usize>) {
        out.extend(&node.indices);
        for child in node.children() {
            leaf_indices(child, out);
        }
    }

    #[test]
    fn every_point_lands_in_exactly_one_leaf() {
        let positions = grid(10, 7.5);
        let radii = vec![3.0; positions.len()];
        let tree = QuadNode::build(&positions, &radii).unwrap();

        let mut seen = Vec::new();
        leaf_indices(&tree, &mut seen);
        seen.sort_unstable();
        assert_eq!(seen, (0..positions.len()).collect::<Vec<_>>());
        assert!(!tree.is_leaf());
    }

    #[test]
    fn aggregates_mass_centroid_and_radius() {
        let positions = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(0.0, 10.0),
            Vector2::new(10.0, 10.0),
        ];
        let radii = vec![1.0, 4.0, 2.0, 3.0];
        let tree = QuadNode::build(&positions, &radii).unwrap();

        assert_eq!(tree.mass, 4.0);
        assert_eq!(tree.center_of_mass, Vector2::new(5.0, 5.0));
        assert_eq!(tree.max_radius, 4.0);
        assert!(positions.iter().all(|point| tree.bounds.contains(*point)));
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![Vector2::new(3.0, 3.0); 40];
        let radii = vec![1.0; 40];
        let tree = QuadNode::build(&positions, &radii).unwrap();

        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 40);
    }

    #[test]
    fn non_finite_positions_build_nothing() {
        let positions = vec![Vector2::new(f64::NAN, 0.0)];
        assert!(QuadNode::build(&positions, &[1.0]).is_none());
        assert!(QuadNode::build(&[], &[]).is_none());
    }

    #[test]
    fn bounds_distance_is_zero_when_touching() {
        let a = QuadBounds {
            center: Vector2::new(0.0, 0.0),
            half_extent: 1.0,
        };
        let b = QuadBounds {
            center: Vector2::new(2.0, 0.0),
            half_extent: 1.0,
        };
        let c = QuadBounds {
            center: Vector2::new(5.0, 4.0),
            half_extent: 1.0,
        };

        assert_eq!(a.distance_sq_to(b), 0.0);
        assert_eq!(a.distance_sq_to(c), 3.0 * 3.0 + 2.0 * 2.0);
    }
}
