//! Spatial subdivision used to approximate the many-body force (Barnes-Hut).

use super::super::types::Point;

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Axis-aligned square cell.
#[derive(Clone, Copy, Debug)]
pub(super) struct Bounds {
	pub(super) center: Point,
	pub(super) half_extent: f64,
}

impl Bounds {
	fn enclosing(points: &[Point]) -> Option<Self> {
		let mut min = Point::new(f64::INFINITY, f64::INFINITY);
		let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
		for p in points {
			min.x = min.x.min(p.x);
			min.y = min.y.min(p.y);
			max.x = max.x.max(p.x);
			max.y = max.y.max(p.y);
		}

		if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
			return None;
		}

		let span = (max.x - min.x).max(max.y - min.y).max(1.0);
		Some(Self {
			center: Point::new((min.x + max.x) * 0.5, (min.y + max.y) * 0.5),
			half_extent: span * 0.5 + 1.0,
		})
	}

	pub(super) fn contains(self, p: Point) -> bool {
		(p.x - self.center.x).abs() <= self.half_extent
			&& (p.y - self.center.y).abs() <= self.half_extent
	}

	pub(super) fn side(self) -> f64 {
		self.half_extent * 2.0
	}

	fn quadrant_of(self, p: Point) -> usize {
		match (p.x >= self.center.x, p.y >= self.center.y) {
			(false, false) => 0,
			(true, false) => 1,
			(false, true) => 2,
			(true, true) => 3,
		}
	}

	fn child(self, quadrant: usize) -> Self {
		let quarter = self.half_extent * 0.5;
		let (dx, dy) = match quadrant {
			0 => (-quarter, -quarter),
			1 => (quarter, -quarter),
			2 => (-quarter, quarter),
			_ => (quarter, quarter),
		};
		Self {
			center: Point::new(self.center.x + dx, self.center.y + dy),
			half_extent: quarter,
		}
	}
}

/// A cell holding either point indices (leaf) or up to four children.
pub(super) struct QuadNode {
	pub(super) bounds: Bounds,
	pub(super) center_of_mass: Point,
	/// Number of points below this cell.
	pub(super) mass: f64,
	pub(super) indices: Vec<usize>,
	pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
	pub(super) fn build(points: &[Point]) -> Option<Self> {
		let bounds = Bounds::enclosing(points)?;
		Some(Self::build_node(bounds, (0..points.len()).collect(), points, 0))
	}

	fn build_node(bounds: Bounds, indices: Vec<usize>, points: &[Point], depth: usize) -> Self {
		let mass = indices.len() as f64;
		let mut center_of_mass = Point::default();
		for &i in &indices {
			center_of_mass.x += points[i].x;
			center_of_mass.y += points[i].y;
		}
		if mass > 0.0 {
			center_of_mass.x /= mass;
			center_of_mass.y /= mass;
		}

		let mut node = Self {
			bounds,
			center_of_mass,
			mass,
			indices,
			children: std::array::from_fn(|_| None),
		};

		if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
			return node;
		}

		let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
		for &i in &node.indices {
			buckets[bounds.quadrant_of(points[i])].push(i);
		}
		// All points in one quadrant (stacked nodes): splitting would only recurse.
		if buckets.iter().filter(|b| !b.is_empty()).count() <= 1 {
			return node;
		}

		for (quadrant, bucket) in buckets.into_iter().enumerate() {
			if bucket.is_empty() {
				continue;
			}
			node.children[quadrant] = Some(Box::new(Self::build_node(
				bounds.child(quadrant),
				bucket,
				points,
				depth + 1,
			)));
		}
		node.indices.clear();
		node
	}

	pub(super) fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn grid(n: usize) -> Vec<Point> {
		(0..n * n)
			.map(|i| Point::new((i % n) as f64 * 10.0, (i / n) as f64 * 10.0))
			.collect()
	}

	fn count_points(node: &QuadNode) -> usize {
		node.indices.len()
			+ node
				.children
				.iter()
				.flatten()
				.map(|c| count_points(c))
				.sum::<usize>()
	}

	#[test]
	fn small_sets_stay_in_one_leaf() {
		let tree = QuadNode::build(&grid(2)).unwrap();
		assert!(tree.is_leaf());
		assert_eq!(tree.indices.len(), 4);
	}

	#[test]
	fn every_point_lands_in_exactly_one_leaf() {
		let points = grid(10);
		let tree = QuadNode::build(&points).unwrap();
		assert!(!tree.is_leaf());
		assert_eq!(count_points(&tree), points.len());
		assert_eq!(tree.mass, 100.0);
		assert!((tree.center_of_mass.x - 45.0).abs() < 1e-9);
		assert!((tree.center_of_mass.y - 45.0).abs() < 1e-9);
	}

	#[test]
	fn stacked_points_do_not_recurse_forever() {
		let points = vec![Point::new(5.0, 5.0); 50];
		let tree = QuadNode::build(&points).unwrap();
		assert_eq!(count_points(&tree), 50);
	}

	#[test]
	fn empty_and_non_finite_inputs_build_nothing() {
		assert!(QuadNode::build(&[]).is_none());
		assert!(QuadNode::build(&[Point::new(f64::NAN, 0.0)]).is_none());
	}
}
