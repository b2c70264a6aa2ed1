//! Node drag state machine.
//!
//! Each node is either idle or dragged by exactly one pointer. A drag session
//! exists only between pointer-down and pointer-up (or leave) and, while it
//! lives, the controller is the only writer of that node's `fx`/`fy`:
//!
//! - down: pause viewport panning, raise `alpha_target` and restart the
//!   simulation, pin the node where it currently is
//! - move: map the pointer through the viewport and pin the node there
//! - up / leave: unpin, let the layout cool once no drag remains, resume
//!   panning
//!
//! A release that never moved beyond the click threshold is reported as a
//! click and leaves the node where it was.

use std::collections::HashMap;

use log::debug;
use serde::Deserialize;

use super::simulation::Simulation;
use super::types::Point;
use super::viewport::Viewport;

/// Identifies a mouse or touch contact.
pub type PointerId = i32;

/// Pointer id used for the mouse.
pub const MOUSE_POINTER: PointerId = -1;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DragConfig {
	/// Screen pixels a pointer may wander before a press becomes a drag.
	pub click_threshold: f64,
}

impl Default for DragConfig {
	fn default() -> Self {
		Self {
			click_threshold: 3.0,
		}
	}
}

/// Per-node drag state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragState {
	Idle,
	Dragging,
}

/// One active drag.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
	pub node_index: usize,
	pub pointer: PointerId,
	/// Node position minus pointer position, in simulation space, at grab time.
	pub grab_offset: Point,
	/// Screen position of the press.
	pub origin: Point,
	/// Whether the pointer left the click threshold.
	pub moved: bool,
}

/// How a drag session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Release {
	/// Pressed and released in place.
	Click(String),
	/// Moved the node.
	Drag(String),
}

/// Owns every [`DragSession`], keyed by node id.
#[derive(Default)]
pub struct DragController {
	config: DragConfig,
	sessions: HashMap<String, DragSession>,
}

impl DragController {
	pub fn new(config: DragConfig) -> Self {
		Self {
			config,
			sessions: HashMap::new(),
		}
	}

	pub fn state_of(&self, node_id: &str) -> DragState {
		if self.sessions.contains_key(node_id) {
			DragState::Dragging
		} else {
			DragState::Idle
		}
	}

	pub fn session(&self, node_id: &str) -> Option<&DragSession> {
		self.sessions.get(node_id)
	}

	pub fn active_count(&self) -> usize {
		self.sessions.len()
	}

	pub fn owns_pointer(&self, pointer: PointerId) -> bool {
		self.sessions.values().any(|s| s.pointer == pointer)
	}

	fn session_for(&self, pointer: PointerId) -> Option<String> {
		self.sessions
			.iter()
			.find(|(_, s)| s.pointer == pointer)
			.map(|(id, _)| id.clone())
	}

	/// Idle -> Dragging. Ignored if the node is already dragged or the
	/// pointer already holds another node.
	pub fn pointer_down(
		&mut self,
		simulation: &mut Simulation,
		viewport: &mut Viewport,
		node_index: usize,
		pointer: PointerId,
		at: Point,
	) -> bool {
		let Some(node) = simulation.nodes().get(node_index) else {
			return false;
		};
		if self.sessions.contains_key(&node.id) || self.owns_pointer(pointer) {
			return false;
		}
		let id = node.id.clone();
		let position = node.position();
		let grab = viewport.screen_to_world(at);

		viewport.pause_pan();
		let drag_target = simulation.config().drag_alpha_target;
		simulation.set_alpha_target(drag_target);
		simulation.restart();
		simulation.pin(node_index, position);

		debug!("force-graph: drag start on `{id}`");
		self.sessions.insert(
			id,
			DragSession {
				node_index,
				pointer,
				grab_offset: Point::new(position.x - grab.x, position.y - grab.y),
				origin: at,
				moved: false,
			},
		);
		true
	}

	/// Dragging -> Dragging. Returns whether a node was moved.
	pub fn pointer_move(
		&mut self,
		simulation: &mut Simulation,
		viewport: &Viewport,
		pointer: PointerId,
		at: Point,
	) -> bool {
		let threshold = self.config.click_threshold;
		let Some(session) = self.sessions.values_mut().find(|s| s.pointer == pointer) else {
			return false;
		};
		if !session.moved && at.distance(session.origin) <= threshold {
			return false;
		}
		session.moved = true;
		let world = viewport.screen_to_world(at);
		simulation.pin(
			session.node_index,
			Point::new(world.x + session.grab_offset.x, world.y + session.grab_offset.y),
		);
		true
	}

	/// Dragging -> Idle, on pointer-up or the pointer leaving while pressed.
	pub fn pointer_up(
		&mut self,
		simulation: &mut Simulation,
		viewport: &mut Viewport,
		pointer: PointerId,
	) -> Option<Release> {
		let id = self.session_for(pointer)?;
		self.end(simulation, viewport, id)
	}

	fn end(
		&mut self,
		simulation: &mut Simulation,
		viewport: &mut Viewport,
		id: String,
	) -> Option<Release> {
		let session = self.sessions.remove(&id)?;
		simulation.unpin(session.node_index);
		if self.sessions.is_empty() {
			let resting = simulation.config().alpha_target;
			simulation.set_alpha_target(resting);
		}
		viewport.resume_pan();
		debug!("force-graph: drag end on `{id}`");
		Some(if session.moved {
			Release::Drag(id)
		} else {
			Release::Click(id)
		})
	}

	/// Ends every session, leaving all nodes idle.
	pub fn cancel_all(&mut self, simulation: &mut Simulation, viewport: &mut Viewport) -> usize {
		let ids: Vec<String> = self.sessions.keys().cloned().collect();
		let count = ids.len();
		for id in ids {
			self.end(simulation, viewport, id);
		}
		count
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::simulation::SimulationConfig;
	use crate::components::force_graph::types::{GraphLink, GraphNode};
	use crate::components::force_graph::viewport::ViewportConfig;

	fn setup() -> (Simulation, Viewport, DragController) {
		let nodes = vec![
			GraphNode::new("a").at(0.0, 0.0),
			GraphNode::new("b").at(40.0, 0.0),
			GraphNode::new("c").at(0.0, 40.0),
		];
		let links = vec![GraphLink::new("a", "b"), GraphLink::new("a", "c")];
		let sim = Simulation::initialize(&nodes, &links, SimulationConfig::default()).unwrap();
		(
			sim,
			Viewport::new(800.0, 600.0, ViewportConfig::default()),
			DragController::default(),
		)
	}

	#[test]
	fn press_pins_wakes_and_pauses() {
		let (mut sim, mut view, mut drag) = setup();
		sim.stop();
		assert!(drag.pointer_down(&mut sim, &mut view, 0, MOUSE_POINTER, Point::new(0.0, 0.0)));
		assert_eq!(drag.state_of("a"), DragState::Dragging);
		assert_eq!(drag.state_of("b"), DragState::Idle);
		assert!(sim.is_running());
		assert_eq!(sim.alpha_target(), 0.3);
		assert_eq!(sim.nodes()[0].fx, Some(0.0));
		assert!(view.is_pan_suspended());
	}

	#[test]
	fn move_follows_pointer_through_viewport() {
		let (mut sim, mut view, mut drag) = setup();
		view.zoom_at(Point::new(0.0, 0.0), 2.0);
		drag.pointer_down(&mut sim, &mut view, 1, 7, Point::new(80.0, 0.0));
		assert!(drag.pointer_move(&mut sim, &view, 7, Point::new(200.0, 100.0)));
		assert_eq!(sim.nodes()[1].fx, Some(100.0));
		assert_eq!(sim.nodes()[1].fy, Some(50.0));
	}

	#[test]
	fn grab_offset_avoids_jump() {
		let (mut sim, mut view, mut drag) = setup();
		// Grab node b 5px left of its center.
		drag.pointer_down(&mut sim, &mut view, 1, 1, Point::new(35.0, 0.0));
		drag.pointer_move(&mut sim, &view, 1, Point::new(45.0, 10.0));
		assert_eq!(sim.nodes()[1].fx, Some(50.0));
		assert_eq!(sim.nodes()[1].fy, Some(10.0));
	}

	#[test]
	fn release_in_place_is_a_click() {
		let (mut sim, mut view, mut drag) = setup();
		drag.pointer_down(&mut sim, &mut view, 0, 1, Point::new(0.0, 0.0));
		assert!(!drag.pointer_move(&mut sim, &view, 1, Point::new(1.0, 1.0)));
		assert_eq!(sim.nodes()[0].fx, Some(0.0));
		let release = drag.pointer_up(&mut sim, &mut view, 1);
		assert_eq!(release, Some(Release::Click("a".into())));
		assert!(!sim.nodes()[0].is_pinned());
	}

	#[test]
	fn release_after_move_is_a_drag_and_cools() {
		let (mut sim, mut view, mut drag) = setup();
		drag.pointer_down(&mut sim, &mut view, 0, 1, Point::new(0.0, 0.0));
		drag.pointer_move(&mut sim, &view, 1, Point::new(30.0, 0.0));
		let release = drag.pointer_up(&mut sim, &mut view, 1);
		assert_eq!(release, Some(Release::Drag("a".into())));
		assert_eq!(sim.alpha_target(), 0.0);
		assert!(!view.is_pan_suspended());
		assert_eq!(drag.active_count(), 0);
	}

	#[test]
	fn overlapping_drags_keep_panning_paused_until_last() {
		let (mut sim, mut view, mut drag) = setup();
		drag.pointer_down(&mut sim, &mut view, 0, 1, Point::new(0.0, 0.0));
		drag.pointer_down(&mut sim, &mut view, 1, 2, Point::new(40.0, 0.0));
		assert_eq!(drag.active_count(), 2);

		drag.pointer_up(&mut sim, &mut view, 1);
		assert!(view.is_pan_suspended());
		assert_eq!(sim.alpha_target(), 0.3);
		assert_eq!(drag.state_of("a"), DragState::Idle);

		drag.pointer_up(&mut sim, &mut view, 2);
		assert!(!view.is_pan_suspended());
		assert_eq!(sim.alpha_target(), 0.0);
	}

	#[test]
	fn same_node_or_pointer_cannot_start_twice() {
		let (mut sim, mut view, mut drag) = setup();
		assert!(drag.pointer_down(&mut sim, &mut view, 0, 1, Point::new(0.0, 0.0)));
		assert!(!drag.pointer_down(&mut sim, &mut view, 0, 2, Point::new(0.0, 0.0)));
		assert!(!drag.pointer_down(&mut sim, &mut view, 1, 1, Point::new(40.0, 0.0)));
		drag.pointer_up(&mut sim, &mut view, 1);
		assert!(!view.is_pan_suspended());
	}

	#[test]
	fn up_without_session_is_ignored() {
		let (mut sim, mut view, mut drag) = setup();
		assert_eq!(drag.pointer_up(&mut sim, &mut view, 9), None);
		assert!(!view.is_pan_suspended());
	}

	#[test]
	fn cancel_all_restores_idle() {
		let (mut sim, mut view, mut drag) = setup();
		drag.pointer_down(&mut sim, &mut view, 0, 1, Point::new(0.0, 0.0));
		drag.pointer_down(&mut sim, &mut view, 2, 2, Point::new(0.0, 40.0));
		assert_eq!(drag.cancel_all(&mut sim, &mut view), 2);
		assert_eq!(drag.active_count(), 0);
		assert!(sim.nodes().iter().all(|n| !n.is_pinned()));
		assert!(!view.is_pan_suspended());
		assert_eq!(sim.alpha_target(), 0.0);
	}
}
