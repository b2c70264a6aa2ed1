//! Force accumulators. Each adds into node velocities; integration happens later.

use rand::{Rng, RngCore};

use super::config::{CenterConfig, ChargeConfig, LinkForceConfig};
use super::quadtree::QuadNode;
use super::{SimLink, SimNode};
use crate::components::force_graph::types::Point;

/// Tiny random offset used to separate coincident points.
pub(super) fn jiggle(rng: &mut dyn RngCore) -> f64 {
	(rng.random::<f64>() - 0.5) * 1e-6
}

#[derive(Clone, Copy)]
struct ChargeParams {
	/// `strength * alpha`.
	weight: f64,
	distance_min_sq: f64,
	distance_max_sq: f64,
	theta: f64,
}

/// Velocity change on a body at `from` caused by `mass` units of charge at `to`.
fn charge_between(
	from: Point,
	to: Point,
	mass: f64,
	params: ChargeParams,
	rng: &mut dyn RngCore,
) -> Option<(f64, f64)> {
	let (mut dx, mut dy) = (to.x - from.x, to.y - from.y);
	let mut l = dx * dx + dy * dy;
	if l >= params.distance_max_sq {
		return None;
	}
	if l == 0.0 {
		dx = jiggle(rng);
		dy = jiggle(rng);
		l = dx * dx + dy * dy;
	}
	if l < params.distance_min_sq {
		l = (params.distance_min_sq * l).sqrt();
	}
	let w = params.weight * mass / l;
	Some((dx * w, dy * w))
}

fn accumulate_from_tree(
	cell: &QuadNode,
	index: usize,
	points: &[Point],
	params: ChargeParams,
	rng: &mut dyn RngCore,
	force: &mut (f64, f64),
) {
	if cell.mass <= 0.0 {
		return;
	}
	let point = points[index];

	if cell.is_leaf() {
		for &other in &cell.indices {
			if other == index {
				continue;
			}
			if let Some((fx, fy)) = charge_between(point, points[other], 1.0, params, rng) {
				force.0 += fx;
				force.1 += fy;
			}
		}
		return;
	}

	let distance = point.distance(cell.center_of_mass).max(f64::EPSILON);
	if !cell.bounds.contains(point) && cell.bounds.side() / distance < params.theta {
		if let Some((fx, fy)) = charge_between(point, cell.center_of_mass, cell.mass, params, rng) {
			force.0 += fx;
			force.1 += fy;
		}
		return;
	}

	for child in cell.children.iter().flatten() {
		accumulate_from_tree(child, index, points, params, rng, force);
	}
}

/// Many-body force: every node is pushed away from every other node
/// (or pulled, for positive strength) by `strength * alpha / distance`.
pub(super) fn apply_charge(
	nodes: &mut [SimNode],
	config: &ChargeConfig,
	alpha: f64,
	rng: &mut dyn RngCore,
) {
	if nodes.len() < 2 || config.strength == 0.0 {
		return;
	}
	let params = ChargeParams {
		weight: config.strength * alpha,
		distance_min_sq: config.distance_min * config.distance_min,
		distance_max_sq: config.distance_max.map_or(f64::INFINITY, |d| d * d),
		theta: config.theta,
	};
	let points: Vec<Point> = nodes.iter().map(SimNode::position).collect();

	let tree = if params.theta > 0.0 {
		QuadNode::build(&points)
	} else {
		None
	};

	match tree {
		Some(tree) => {
			for (index, node) in nodes.iter_mut().enumerate() {
				let mut force = (0.0, 0.0);
				accumulate_from_tree(&tree, index, &points, params, rng, &mut force);
				node.vx += force.0;
				node.vy += force.1;
			}
		}
		None => {
			for i in 0..points.len() {
				for j in (i + 1)..points.len() {
					if let Some((fx, fy)) = charge_between(points[i], points[j], 1.0, params, rng) {
						nodes[i].vx += fx;
						nodes[i].vy += fy;
						nodes[j].vx -= fx;
						nodes[j].vy -= fy;
					}
				}
			}
		}
	}
}

/// Spring force pulling each link toward `config.distance`. Parallel links
/// between the same pair each contribute.
pub(super) fn apply_links(
	nodes: &mut [SimNode],
	links: &[SimLink],
	config: &LinkForceConfig,
	alpha: f64,
	rng: &mut dyn RngCore,
) {
	for _ in 0..config.iterations.max(1) {
		for link in links {
			let (s, t) = (link.source, link.target);
			if s == t {
				continue;
			}
			let mut dx = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
			let mut dy = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
			if dx == 0.0 {
				dx = jiggle(rng);
			}
			if dy == 0.0 {
				dy = jiggle(rng);
			}
			let l = (dx * dx + dy * dy).sqrt();
			let k = (l - config.distance) / l * alpha * link.strength;
			dx *= k;
			dy *= k;

			nodes[t].vx -= dx * link.bias;
			nodes[t].vy -= dy * link.bias;
			nodes[s].vx += dx * (1.0 - link.bias);
			nodes[s].vy += dy * (1.0 - link.bias);
		}
	}
}

/// Uniform nudge moving the centroid toward the configured origin.
pub(super) fn apply_center(nodes: &mut [SimNode], config: &CenterConfig) {
	if nodes.is_empty() || config.strength == 0.0 {
		return;
	}
	let n = nodes.len() as f64;
	let (sx, sy) = nodes
		.iter()
		.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
	let (px, py) = (
		(config.x - sx / n) * config.strength,
		(config.y - sy / n) * config.strength,
	);
	for node in nodes {
		node.vx += px;
		node.vy += py;
	}
}
