//! Projection of simulation state onto visual primitives.
//!
//! Visual handles live in a side table keyed by node id; simulation records
//! never hold them. No transform is applied here: positions are written in
//! simulation space and the viewport transform is applied once at the scene
//! root when painting.

use std::collections::HashMap;

use super::simulation::{SimLink, SimNode, Tick};
use super::types::{NodeAttributes, Point};

/// The rendering backend, reduced to "put a node here, draw a line there".
pub trait Scene {
	type Handle;

	/// Allocates the visual primitive for one node.
	fn create_node(&mut self, id: &str, attributes: &NodeAttributes) -> Self::Handle;
	fn move_node(&mut self, handle: &Self::Handle, at: Point);
	fn release_node(&mut self, handle: Self::Handle);
	/// Drops every line drawn so far.
	fn clear_links(&mut self);
	fn draw_link(&mut self, from: Point, to: Point, width: f64);
}

/// Line width for a link weight. Non-decreasing in `value`; missing weights count as 1.
pub fn link_width(base: f64, value: Option<f64>) -> f64 {
	base * value.unwrap_or(1.0).max(0.0).sqrt()
}

pub struct RenderSynchronizer<S: Scene> {
	scene: S,
	handles: HashMap<String, S::Handle>,
	base_link_width: f64,
}

impl<S: Scene> RenderSynchronizer<S> {
	pub fn new(scene: S, base_link_width: f64) -> Self {
		Self {
			scene,
			handles: HashMap::new(),
			base_link_width,
		}
	}

	/// Creates one primitive per node not seen before.
	pub fn attach<'a>(&mut self, nodes: impl IntoIterator<Item = (&'a str, &'a NodeAttributes)>) {
		for (id, attributes) in nodes {
			if !self.handles.contains_key(id) {
				let handle = self.scene.create_node(id, attributes);
				self.handles.insert(id.to_owned(), handle);
			}
		}
	}

	/// Writes node positions and redraws every link.
	pub fn project(&mut self, nodes: &[SimNode], links: &[SimLink]) {
		for node in nodes {
			if let Some(handle) = self.handles.get(&node.id) {
				self.scene.move_node(handle, node.position());
			}
		}

		self.scene.clear_links();
		for link in links {
			let (from, to) = (&nodes[link.source], &nodes[link.target]);
			self.scene.draw_link(
				from.position(),
				to.position(),
				link_width(self.base_link_width, link.value),
			);
		}
	}

	pub fn on_tick(&mut self, tick: &Tick<'_>) {
		self.project(tick.nodes, tick.links);
	}

	/// Releases every primitive once. Returns how many were released.
	pub fn release_all(&mut self) -> usize {
		let count = self.handles.len();
		for (_, handle) in self.handles.drain() {
			self.scene.release_node(handle);
		}
		self.scene.clear_links();
		count
	}

	pub fn handle(&self, id: &str) -> Option<&S::Handle> {
		self.handles.get(id)
	}

	pub fn handle_count(&self) -> usize {
		self.handles.len()
	}

	pub fn scene(&self) -> &S {
		&self.scene
	}

	pub fn scene_mut(&mut self) -> &mut S {
		&mut self.scene
	}
}
