//! Force simulation engine.
//!
//! Owns node positions and velocities and advances them one physics step at
//! a time. It keeps no timer: the host calls [`Simulation::step`] once per
//! frame while [`Simulation::is_running`] holds. Each step applies, in order,
//! the many-body force, the link springs and the centering pull, integrates
//! velocities (pinned nodes snap to their `fx`/`fy` instead), cools `alpha`
//! toward `alpha_target` and finally notifies tick subscribers in
//! registration order.

mod config;
mod forces;
mod quadtree;

use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

pub use config::{
	CenterConfig, ChargeConfig, LinkForceConfig, LinkPolicy, Placement, SimulationConfig,
};

use super::error::GraphError;
use super::types::{GraphLink, GraphNode, Point};

/// Per-node physics state.
#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Fixed x; while set the node is not integrated on this axis.
	pub fx: Option<f64>,
	/// Fixed y; while set the node is not integrated on this axis.
	pub fy: Option<f64>,
}

impl SimNode {
	pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
		Self {
			id: id.into(),
			x,
			y,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
		}
	}

	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}

	pub fn speed(&self) -> f64 {
		self.vx.hypot(self.vy)
	}

	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// A link whose endpoints have been resolved to node indices.
#[derive(Clone, Debug, PartialEq)]
pub struct SimLink {
	/// Position of the link in the input list.
	pub index: usize,
	pub source: usize,
	pub target: usize,
	pub value: Option<f64>,
	/// Share of the correction applied to the target.
	bias: f64,
	strength: f64,
}

impl SimLink {
	fn resolved(index: usize, source: usize, target: usize, value: Option<f64>) -> Self {
		Self {
			index,
			source,
			target,
			value,
			bias: 0.5,
			strength: 1.0,
		}
	}
}

/// Degree-based bias and default stiffness, as computed once at start.
fn prepare_links(links: &mut [SimLink], node_count: usize, config: &LinkForceConfig) {
	let mut degree = vec![0usize; node_count];
	for link in links.iter() {
		degree[link.source] += 1;
		degree[link.target] += 1;
	}
	for link in links.iter_mut() {
		let (ds, dt) = (degree[link.source] as f64, degree[link.target] as f64);
		link.bias = ds / (ds + dt);
		link.strength = config.strength.unwrap_or(1.0 / ds.min(dt));
	}
}

/// Snapshot handed to tick subscribers.
pub struct Tick<'a> {
	pub alpha: f64,
	pub nodes: &'a [SimNode],
	pub links: &'a [SimLink],
}

/// Callback invoked after every step.
pub type TickListener = Box<dyn FnMut(&Tick<'_>)>;

/// Handle returned by [`Simulation::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The physics engine.
pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	index: HashMap<String, usize>,
	rejected: Vec<GraphError>,
	config: SimulationConfig,
	alpha: f64,
	alpha_target: f64,
	running: bool,
	rng: Box<dyn RngCore>,
	listeners: Vec<(SubscriptionId, TickListener)>,
	next_subscription: u64,
}

impl Simulation {
	/// Builds a simulation seeded from `config.seed`.
	pub fn initialize(
		nodes: &[GraphNode],
		links: &[GraphLink],
		config: SimulationConfig,
	) -> Result<Self, GraphError> {
		let rng = StdRng::seed_from_u64(config.seed);
		Self::with_rng(nodes, links, config, rng)
	}

	/// Builds a simulation drawing placement and jiggle from `rng`.
	///
	/// Links naming an unknown node are handled per `config.link_policy`.
	/// Nodes repeating an earlier id are dropped.
	pub fn with_rng(
		nodes: &[GraphNode],
		links: &[GraphLink],
		config: SimulationConfig,
		rng: impl RngCore + 'static,
	) -> Result<Self, GraphError> {
		let mut rng: Box<dyn RngCore> = Box::new(rng);
		let mut sim_nodes = Vec::with_capacity(nodes.len());
		let mut index = HashMap::with_capacity(nodes.len());

		for node in nodes {
			if index.contains_key(&node.id) {
				warn!("force-graph: dropping duplicate node id `{}`", node.id);
				continue;
			}
			let i = sim_nodes.len();
			let (px, py) = initial_position(i, &config, rng.as_mut());
			index.insert(node.id.clone(), i);
			sim_nodes.push(SimNode::new(
				node.id.clone(),
				node.x.unwrap_or(px),
				node.y.unwrap_or(py),
			));
		}

		let mut sim_links = Vec::with_capacity(links.len());
		let mut rejected = Vec::new();
		for (i, link) in links.iter().enumerate() {
			let resolve = |id: &String| {
				index.get(id).copied().ok_or_else(|| GraphError::UnresolvedLink {
					index: i,
					id: id.clone(),
				})
			};
			match resolve(&link.source).and_then(|s| resolve(&link.target).map(|t| (s, t))) {
				Ok((s, t)) => sim_links.push(SimLink::resolved(i, s, t, link.value)),
				Err(err) => match config.link_policy {
					LinkPolicy::Reject => return Err(err),
					LinkPolicy::Skip => {
						warn!("force-graph: skipping link: {err}");
						rejected.push(err);
					}
				},
			}
		}
		prepare_links(&mut sim_links, sim_nodes.len(), &config.link);

		debug!(
			"force-graph: simulation ready with {} nodes, {} links",
			sim_nodes.len(),
			sim_links.len()
		);

		Ok(Self {
			nodes: sim_nodes,
			links: sim_links,
			index,
			rejected,
			alpha: config.alpha,
			alpha_target: config.alpha_target,
			running: true,
			rng,
			listeners: Vec::new(),
			next_subscription: 0,
			config,
		})
	}

	/// Advances the layout by one tick and notifies subscribers.
	pub fn step(&mut self) {
		let alpha = self.alpha;
		forces::apply_charge(&mut self.nodes, &self.config.charge, alpha, self.rng.as_mut());
		forces::apply_links(
			&mut self.nodes,
			&self.links,
			&self.config.link,
			alpha,
			self.rng.as_mut(),
		);
		forces::apply_center(&mut self.nodes, &self.config.center);

		let decay = self.config.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= decay;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= decay;
					node.y += node.vy;
				}
			}
		}

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		if self.alpha < self.config.alpha_min {
			self.running = false;
		}

		let tick = Tick {
			alpha: self.alpha,
			nodes: &self.nodes,
			links: &self.links,
		};
		for (_, listener) in self.listeners.iter_mut() {
			listener(&tick);
		}
	}

	/// Reactivates stepping.
	pub fn restart(&mut self) {
		self.running = true;
	}

	/// Halts stepping. Safe to call repeatedly.
	pub fn stop(&mut self) {
		self.running = false;
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn set_alpha(&mut self, alpha: f64) {
		self.alpha = alpha.clamp(0.0, 1.0);
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	/// Moves the centering origin, e.g. after the mount surface resized.
	pub fn set_center(&mut self, center: Point) {
		self.config.center.x = center.x;
		self.config.center.y = center.y;
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn node(&self, id: &str) -> Option<&SimNode> {
		self.index_of(id).map(|i| &self.nodes[i])
	}

	/// Links dropped at initialization under [`LinkPolicy::Skip`].
	pub fn rejected_links(&self) -> &[GraphError] {
		&self.rejected
	}

	/// Fixes node `index` at `at` until [`Simulation::unpin`].
	pub fn pin(&mut self, index: usize, at: Point) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = Some(at.x);
			node.fy = Some(at.y);
		}
	}

	/// Returns node `index` to free integration.
	pub fn unpin(&mut self, index: usize) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = None;
			node.fy = None;
		}
	}

	/// Registers a tick listener. Listeners run in registration order.
	pub fn subscribe(&mut self, listener: TickListener) -> SubscriptionId {
		let id = SubscriptionId(self.next_subscription);
		self.next_subscription += 1;
		self.listeners.push((id, listener));
		id
	}

	/// Removes a listener; `false` if it was not registered.
	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(sub, _)| *sub != id);
		self.listeners.len() != before
	}

	pub fn subscriber_count(&self) -> usize {
		self.listeners.len()
	}
}

fn initial_position(i: usize, config: &SimulationConfig, rng: &mut dyn RngCore) -> (f64, f64) {
	let (cx, cy) = (config.center.x, config.center.y);
	match config.placement {
		Placement::Phyllotaxis => {
			let radius = 10.0 * (0.5 + i as f64).sqrt();
			let angle = i as f64 * PI * (3.0 - 5.0_f64.sqrt());
			(cx + radius * angle.cos(), cy + radius * angle.sin())
		}
		Placement::Scatter { radius } => {
			let r = radius * rng.random::<f64>().sqrt();
			let angle = rng.random::<f64>() * 2.0 * PI;
			(cx + r * angle.cos(), cy + r * angle.sin())
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	fn chain(n: usize) -> (Vec<GraphNode>, Vec<GraphLink>) {
		let nodes = (0..n).map(|i| GraphNode::new(format!("n{i}"))).collect();
		let links = (1..n)
			.map(|i| GraphLink::new(format!("n{}", i - 1), format!("n{i}")))
			.collect();
		(nodes, links)
	}

	fn run_until_settled(sim: &mut Simulation) -> usize {
		let mut steps = 0;
		while sim.is_running() && steps < 2_000 {
			sim.step();
			steps += 1;
		}
		steps
	}

	#[test]
	fn unresolved_link_is_skipped_by_default() {
		let nodes = vec![GraphNode::new("a"), GraphNode::new("b")];
		let links = vec![GraphLink::new("a", "b"), GraphLink::new("a", "ghost")];
		let sim = Simulation::initialize(&nodes, &links, SimulationConfig::default()).unwrap();
		assert_eq!(sim.links().len(), 1);
		assert_eq!(
			sim.rejected_links(),
			&[GraphError::UnresolvedLink {
				index: 1,
				id: "ghost".into()
			}]
		);
	}

	#[test]
	fn unresolved_link_fails_under_reject_policy() {
		let nodes = vec![GraphNode::new("a")];
		let links = vec![GraphLink::new("ghost", "a")];
		let config = SimulationConfig {
			link_policy: LinkPolicy::Reject,
			..SimulationConfig::default()
		};
		let err = Simulation::initialize(&nodes, &links, config).err().unwrap();
		assert_eq!(
			err,
			GraphError::UnresolvedLink {
				index: 0,
				id: "ghost".into()
			}
		);
	}

	#[test]
	fn duplicate_ids_keep_first_node() {
		let nodes = vec![GraphNode::new("a").at(1.0, 2.0), GraphNode::new("a").at(9.0, 9.0)];
		let sim = Simulation::initialize(&nodes, &[], SimulationConfig::default()).unwrap();
		assert_eq!(sim.nodes().len(), 1);
		assert_eq!(sim.node("a").unwrap().position(), Point::new(1.0, 2.0));
	}

	#[test]
	fn empty_graph_steps_as_no_op() {
		let mut sim = Simulation::initialize(&[], &[], SimulationConfig::default()).unwrap();
		let steps = run_until_settled(&mut sim);
		assert!(sim.nodes().is_empty());
		assert!(!sim.is_running());
		assert!(steps > 0);
	}

	#[test]
	fn settles_to_rest() {
		let (nodes, links) = chain(8);
		let mut sim = Simulation::initialize(&nodes, &links, SimulationConfig::default()).unwrap();
		run_until_settled(&mut sim);
		assert!(!sim.is_running());
		assert!(sim.alpha() < sim.config().alpha_min);
		for node in sim.nodes() {
			assert!(node.speed() < 0.01, "{} still moving at {}", node.id, node.speed());
		}
	}

	#[test]
	fn identical_setups_produce_identical_layouts() {
		let (nodes, links) = chain(12);
		let config = SimulationConfig {
			placement: Placement::Scatter { radius: 100.0 },
			..SimulationConfig::canvas()
		};
		let mut a = Simulation::initialize(&nodes, &links, config.clone()).unwrap();
		let mut b = Simulation::initialize(&nodes, &links, config).unwrap();
		for _ in 0..50 {
			a.step();
			b.step();
		}
		assert_eq!(a.nodes(), b.nodes());
	}

	#[test]
	fn different_seeds_scatter_differently() {
		let (nodes, _) = chain(4);
		let scatter = |seed| SimulationConfig {
			seed,
			placement: Placement::Scatter { radius: 100.0 },
			..SimulationConfig::default()
		};
		let a = Simulation::initialize(&nodes, &[], scatter(1)).unwrap();
		let b = Simulation::initialize(&nodes, &[], scatter(2)).unwrap();
		assert_ne!(a.nodes(), b.nodes());
	}

	#[test]
	fn given_positions_are_kept() {
		let nodes = vec![GraphNode::new("a").at(3.0, 4.0), GraphNode::new("b")];
		let sim = Simulation::initialize(&nodes, &[], SimulationConfig::default()).unwrap();
		assert_eq!(sim.node("a").unwrap().position(), Point::new(3.0, 4.0));
		assert_ne!(sim.node("b").unwrap().position(), Point::new(0.0, 0.0));
	}

	#[test]
	fn pinned_node_snaps_to_fixed_position() {
		let (nodes, links) = chain(3);
		let mut sim = Simulation::initialize(&nodes, &links, SimulationConfig::default()).unwrap();
		sim.pin(1, Point::new(40.0, -20.0));
		for _ in 0..10 {
			sim.step();
			let pinned = &sim.nodes()[1];
			assert_eq!(pinned.position(), Point::new(40.0, -20.0));
			assert_eq!((pinned.vx, pinned.vy), (0.0, 0.0));
		}
		sim.unpin(1);
		assert!(!sim.nodes()[1].is_pinned());
	}

	#[test]
	fn alpha_cools_toward_target() {
		let (nodes, links) = chain(3);
		let mut sim = Simulation::initialize(&nodes, &links, SimulationConfig::default()).unwrap();
		sim.set_alpha_target(0.3);
		for _ in 0..1_000 {
			sim.step();
		}
		assert!((sim.alpha() - 0.3).abs() < 1e-6);
		assert!(sim.is_running());
	}

	#[test]
	fn stop_is_idempotent_and_restart_wakes() {
		let mut sim = Simulation::initialize(&[], &[], SimulationConfig::default()).unwrap();
		sim.stop();
		sim.stop();
		assert!(!sim.is_running());
		sim.restart();
		assert!(sim.is_running());
	}

	#[test]
	fn listeners_run_in_registration_order_until_unsubscribed() {
		let (nodes, links) = chain(2);
		let mut sim = Simulation::initialize(&nodes, &links, SimulationConfig::default()).unwrap();
		let log = Rc::new(RefCell::new(Vec::new()));
		let first = {
			let log = log.clone();
			sim.subscribe(Box::new(move |tick: &Tick<'_>| {
				log.borrow_mut().push(("first", tick.nodes.len()))
			}))
		};
		{
			let log = log.clone();
			sim.subscribe(Box::new(move |_: &Tick<'_>| {
				log.borrow_mut().push(("second", 0))
			}));
		}
		sim.step();
		assert!(sim.unsubscribe(first));
		assert!(!sim.unsubscribe(first));
		sim.step();
		assert_eq!(
			*log.borrow(),
			vec![("first", 2), ("second", 0), ("second", 0)]
		);
	}
}
