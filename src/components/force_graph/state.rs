//! Graph context: one mounted graph and everything it owns.
//!
//! [`ForceGraphState::create`] wires the simulation, render synchronizer,
//! viewport, drag controller and tooltip together and returns the handle
//! the host threads through its event handlers. [`ForceGraphState::destroy`]
//! ends that lifecycle; afterwards every entry point is a no-op.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use log::{info, warn};

use super::config::GraphConfig;
use super::error::GraphError;
use super::interaction::{DragController, PointerId, Release};
use super::simulation::{Simulation, SubscriptionId, Tick};
use super::sync::{RenderSynchronizer, Scene};
use super::theme::Theme;
use super::tooltip::{TooltipController, TooltipFormatter, TooltipSurface};
use super::types::{GraphData, NodeAttributes, Point};
use super::viewport::Viewport;

/// Pixel size of the mount surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Container {
	pub width: f64,
	pub height: f64,
}

impl Container {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn center(self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	pub fn is_empty(self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}
}

pub struct ForceGraphState<S: Scene + 'static, T: TooltipSurface> {
	simulation: Simulation,
	sync: Rc<RefCell<RenderSynchronizer<S>>>,
	subscription: Option<SubscriptionId>,
	viewport: Viewport,
	drag: DragController,
	tooltip: TooltipController<T>,
	formatter: Option<TooltipFormatter>,
	attributes: HashMap<String, NodeAttributes>,
	hovered: Option<usize>,
	theme: Theme,
	destroyed: bool,
}

impl<S: Scene + 'static, T: TooltipSurface> ForceGraphState<S, T> {
	/// Builds the layout centered in `container` and draws its first frame
	/// into `scene`.
	pub fn create(
		container: Container,
		data: &GraphData,
		scene: S,
		tooltip_surface: T,
		formatter: TooltipFormatter,
		config: GraphConfig,
	) -> Result<Self, GraphError> {
		if container.is_empty() {
			warn!(
				"force-graph: container is {}x{}, layout will collapse to a point",
				container.width, container.height
			);
		}
		let GraphConfig {
			simulation: sim_config,
			viewport,
			drag,
			tooltip,
			theme,
		} = config;

		let center = container.center();
		let mut simulation = Simulation::initialize(
			&data.nodes,
			&data.links,
			sim_config.centered_at(center.x, center.y),
		)?;

		let mut attributes = HashMap::with_capacity(data.nodes.len());
		for node in &data.nodes {
			attributes
				.entry(node.id.clone())
				.or_insert_with(|| node.attributes.clone());
		}

		let mut sync = RenderSynchronizer::new(scene, theme.link.base_width);
		let empty = NodeAttributes::new();
		sync.attach(simulation.nodes().iter().map(|n| {
			let attrs = attributes.get(&n.id).unwrap_or(&empty);
			(n.id.as_str(), attrs)
		}));
		sync.project(simulation.nodes(), simulation.links());

		let sync = Rc::new(RefCell::new(sync));
		let listener = sync.clone();
		let subscription = simulation.subscribe(Box::new(move |tick: &Tick<'_>| {
			listener.borrow_mut().on_tick(tick);
		}));

		info!(
			"force-graph: created with {} nodes, {} links",
			simulation.nodes().len(),
			simulation.links().len()
		);

		Ok(Self {
			simulation,
			sync,
			subscription: Some(subscription),
			viewport: Viewport::new(container.width, container.height, viewport),
			drag: DragController::new(drag),
			tooltip: TooltipController::new(tooltip_surface, tooltip),
			formatter: Some(formatter),
			attributes,
			hovered: None,
			theme,
			destroyed: false,
		})
	}

	/// Per-frame driver. Returns whether anything moved.
	pub fn frame(&mut self, dt_ms: f64) -> bool {
		if self.destroyed {
			return false;
		}
		let stepped = self.simulation.is_running();
		if stepped {
			self.simulation.step();
		}
		let glided = self.viewport.tick(dt_ms);
		self.tooltip.tick(dt_ms);
		stepped || glided
	}

	/// Topmost node whose circle contains the screen point.
	pub fn node_at(&self, at: Point) -> Option<usize> {
		let world = self.viewport.screen_to_world(at);
		let radius = self.theme.node.radius;
		self.simulation
			.nodes()
			.iter()
			.rposition(|n| n.position().distance(world) <= radius)
	}

	/// Grabs the node under `at`, or starts panning the background.
	/// Returns whether a node was grabbed.
	pub fn pointer_down(&mut self, pointer: PointerId, at: Point, time_ms: f64) -> bool {
		if self.destroyed {
			return false;
		}
		match self.node_at(at) {
			Some(index) => {
				self.drag
					.pointer_down(&mut self.simulation, &mut self.viewport, index, pointer, at)
			}
			None => {
				self.viewport.pan_start(at, time_ms);
				false
			}
		}
	}

	pub fn pointer_move(&mut self, pointer: PointerId, at: Point, time_ms: f64) {
		if self.destroyed {
			return;
		}
		if self.drag.owns_pointer(pointer) {
			self.drag
				.pointer_move(&mut self.simulation, &self.viewport, pointer, at);
		} else {
			self.viewport.pan_move(at, time_ms);
		}
	}

	/// Ends whatever `pointer` was doing.
	pub fn pointer_up(&mut self, pointer: PointerId, time_ms: f64) -> Option<Release> {
		if self.destroyed {
			return None;
		}
		if self.drag.owns_pointer(pointer) {
			self.drag
				.pointer_up(&mut self.simulation, &mut self.viewport, pointer)
		} else {
			self.viewport.pan_end(time_ms);
			None
		}
	}

	/// The pointer left the surface: ends its gesture and clears hover.
	pub fn pointer_leave(&mut self, pointer: PointerId, time_ms: f64) {
		self.pointer_up(pointer, time_ms);
		self.clear_hover();
	}

	/// Hit-tests `at` and shows or hides the tooltip. The overlay is placed
	/// at `anchor`, which is usually the pointer in page coordinates.
	pub fn hover(&mut self, at: Point, anchor: Point) -> Option<&str> {
		if self.destroyed {
			return None;
		}
		let Some(index) = self.node_at(at) else {
			self.clear_hover();
			return None;
		};
		let content = if self.hovered == Some(index) {
			self.tooltip.content().to_owned()
		} else {
			let id = &self.simulation.nodes()[index].id;
			match (&self.formatter, self.attributes.get(id)) {
				(Some(format), Some(attrs)) => format(attrs),
				(Some(format), None) => format(&NodeAttributes::new()),
				(None, _) => String::new(),
			}
		};
		self.tooltip.show(&content, anchor.x, anchor.y);
		self.hovered = Some(index);
		Some(self.simulation.nodes()[index].id.as_str())
	}

	pub fn clear_hover(&mut self) {
		if self.hovered.take().is_some() {
			self.tooltip.hide();
		}
	}

	pub fn wheel(&mut self, at: Point, delta_y: f64, line_mode: bool) {
		if !self.destroyed {
			self.viewport.wheel(at, delta_y, line_mode);
		}
	}

	pub fn pinch(&mut self, before: (Point, Point), after: (Point, Point)) {
		if !self.destroyed {
			self.viewport.pinch(before, after);
		}
	}

	/// Adopts a new container size and re-centers the layout.
	pub fn resize(&mut self, container: Container) {
		if self.destroyed {
			return;
		}
		self.viewport.resize(container.width, container.height);
		self.simulation.set_center(container.center());
		let wake = self.simulation.config().drag_alpha_target;
		if self.simulation.alpha() < wake {
			self.simulation.set_alpha(wake);
		}
		self.simulation.restart();
	}

	/// Tears the graph down. Only the first call does anything.
	pub fn destroy(&mut self) -> bool {
		if self.destroyed {
			return false;
		}
		self.destroyed = true;

		let cancelled = self.drag.cancel_all(&mut self.simulation, &mut self.viewport);
		self.simulation.stop();
		if let Some(subscription) = self.subscription.take() {
			self.simulation.unsubscribe(subscription);
		}
		let released = self.sync.borrow_mut().release_all();
		self.hovered = None;
		self.tooltip.detach();
		self.formatter = None;

		info!("force-graph: destroyed, released {released} nodes, cancelled {cancelled} drags");
		true
	}

	pub fn is_destroyed(&self) -> bool {
		self.destroyed
	}

	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	pub fn drag(&self) -> &DragController {
		&self.drag
	}

	pub fn tooltip(&self) -> &TooltipController<T> {
		&self.tooltip
	}

	pub fn theme(&self) -> &Theme {
		&self.theme
	}

	/// Id of the node under the pointer, if any.
	pub fn hovered(&self) -> Option<&str> {
		self.hovered
			.and_then(|i| self.simulation.nodes().get(i))
			.map(|n| n.id.as_str())
	}

	/// Borrow of the scene, e.g. for painting.
	pub fn scene(&self) -> Ref<'_, S> {
		Ref::map(self.sync.borrow(), |sync| sync.scene())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::interaction::{DragState, MOUSE_POINTER};
	use crate::components::force_graph::tooltip::attribute_formatter;
	use crate::components::force_graph::types::{GraphLink, GraphNode};

	#[derive(Default)]
	struct Counting {
		live: usize,
		released: usize,
		moves: usize,
	}

	impl Scene for Counting {
		type Handle = ();

		fn create_node(&mut self, _id: &str, _attributes: &NodeAttributes) {
			self.live += 1;
		}

		fn move_node(&mut self, _handle: &(), _at: Point) {
			self.moves += 1;
		}

		fn release_node(&mut self, _handle: ()) {
			self.live -= 1;
			self.released += 1;
		}

		fn clear_links(&mut self) {}

		fn draw_link(&mut self, _from: Point, _to: Point, _width: f64) {}
	}

	#[derive(Default)]
	struct Silent {
		opacity: f64,
	}

	impl TooltipSurface for Silent {
		fn set_content(&mut self, _markup: &str) {}
		fn set_position(&mut self, _left: f64, _top: f64) {}
		fn set_opacity(&mut self, opacity: f64) {
			self.opacity = opacity;
		}
	}

	fn graph() -> ForceGraphState<Counting, Silent> {
		let data = GraphData {
			nodes: vec![
				GraphNode::new("a").at(100.0, 100.0).with_attr("name", "A"),
				GraphNode::new("b").at(300.0, 100.0).with_attr("name", "B"),
			],
			links: vec![GraphLink::new("a", "b")],
		};
		ForceGraphState::create(
			Container::new(400.0, 200.0),
			&data,
			Counting::default(),
			Silent::default(),
			attribute_formatter("name"),
			GraphConfig::default(),
		)
		.unwrap()
	}

	#[test]
	fn create_attaches_and_centers() {
		let g = graph();
		assert_eq!(g.scene().live, 2);
		assert_eq!(g.scene().moves, 2);
		assert_eq!(g.simulation().config().center.x, 200.0);
		assert_eq!(g.simulation().config().center.y, 100.0);
	}

	#[test]
	fn frames_project_until_settled() {
		let mut g = graph();
		assert!(g.frame(16.0));
		assert_eq!(g.scene().moves, 4);
		let mut frames = 0;
		while g.frame(16.0) {
			frames += 1;
			assert!(frames < 2_000);
		}
		assert!(!g.simulation().is_running());
	}

	#[test]
	fn hit_test_uses_node_radius() {
		let g = graph();
		assert_eq!(g.node_at(Point::new(110.0, 110.0)), Some(0));
		assert_eq!(g.node_at(Point::new(300.0, 124.0)), Some(1));
		assert_eq!(g.node_at(Point::new(200.0, 100.0)), None);
	}

	#[test]
	fn background_press_pans_instead_of_dragging() {
		let mut g = graph();
		assert!(!g.pointer_down(MOUSE_POINTER, Point::new(200.0, 190.0), 0.0));
		g.pointer_move(MOUSE_POINTER, Point::new(220.0, 190.0), 16.0);
		assert_eq!(g.viewport().offset(), Point::new(20.0, 0.0));
		assert_eq!(g.pointer_up(MOUSE_POINTER, 20.0), None);
	}

	#[test]
	fn press_and_release_on_node_is_a_click() {
		let mut g = graph();
		assert!(g.pointer_down(MOUSE_POINTER, Point::new(100.0, 100.0), 0.0));
		assert_eq!(g.drag().state_of("a"), DragState::Dragging);
		assert_eq!(
			g.pointer_up(MOUSE_POINTER, 10.0),
			Some(Release::Click("a".into()))
		);
	}

	#[test]
	fn hover_tracks_node_and_clears() {
		let mut g = graph();
		assert_eq!(g.hover(Point::new(300.0, 100.0), Point::new(0.0, 0.0)), Some("b"));
		assert_eq!(g.tooltip().content(), "B");
		assert!(g.tooltip().is_shown());
		assert_eq!(g.hover(Point::new(200.0, 100.0), Point::new(0.0, 0.0)), None);
		assert!(!g.tooltip().is_shown());
		assert_eq!(g.hovered(), None);
	}

	#[test]
	fn leave_during_drag_returns_to_idle() {
		let mut g = graph();
		g.pointer_down(MOUSE_POINTER, Point::new(100.0, 100.0), 0.0);
		g.pointer_leave(MOUSE_POINTER, 5.0);
		assert_eq!(g.drag().active_count(), 0);
		assert!(!g.viewport().is_pan_suspended());
	}

	#[test]
	fn resize_recenters_and_wakes() {
		let mut g = graph();
		while g.frame(16.0) {}
		g.resize(Container::new(800.0, 600.0));
		assert!(g.simulation().is_running());
		assert_eq!(g.simulation().config().center.x, 400.0);
		assert_eq!(g.viewport().size(), (800.0, 600.0));
	}

	#[test]
	fn destroy_mid_drag_releases_once() {
		let mut g = graph();
		g.pointer_down(MOUSE_POINTER, Point::new(100.0, 100.0), 0.0);
		assert!(g.destroy());
		assert!(!g.destroy());
		assert_eq!(g.scene().released, 2);
		assert_eq!(g.scene().live, 0);
		assert_eq!(g.drag().active_count(), 0);
		assert!(!g.simulation().is_running());
		assert_eq!(g.simulation().subscriber_count(), 0);
		assert!(!g.frame(16.0));
		assert!(!g.pointer_down(MOUSE_POINTER, Point::new(300.0, 100.0), 0.0));
	}
}
