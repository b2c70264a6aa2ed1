//! Leptos component wrapping the force-directed graph canvas.
//!
//! The component creates an HTML canvas element and wires mouse, wheel and
//! touch handlers into the [`ForceGraphState`] it mounts. An animation loop
//! runs via `requestAnimationFrame`, driving `frame` and repainting each
//! tick. Unmounting the component destroys the graph and stops the loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, TouchList, WheelEvent,
	Window,
};

use super::config::GraphConfig;
use super::error::HostError;
use super::interaction::{MOUSE_POINTER, PointerId, Release};
use super::render::CanvasScene;
use super::state::{Container, ForceGraphState};
use super::tooltip::{DomTooltip, TooltipFormatter, attribute_formatter};
use super::types::{GraphData, NodeAttributes, Point};

/// Tooltip markup for a hovered node.
pub type TooltipFn = Rc<dyn Fn(&NodeAttributes) -> String>;
/// Called with the id of a node that was clicked rather than dragged.
pub type NodeClickFn = Rc<dyn Fn(String)>;

const FRAME_MS: f64 = 1000.0 / 60.0;
/// Longest step fed to inertia and fades, e.g. after a background tab wakes.
const MAX_FRAME_MS: f64 = 100.0;

/// A graph mounted on a live canvas.
struct Mounted {
	graph: ForceGraphState<CanvasScene, DomTooltip>,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	last_frame: Option<f64>,
	/// Finger positions at the previous two-finger move.
	pinch: Option<(Point, Point)>,
}

impl Mounted {
	fn local(&self, client_x: i32, client_y: i32) -> Point {
		let rect = self.canvas.get_bounding_client_rect();
		Point::new(client_x as f64 - rect.left(), client_y as f64 - rect.top())
	}

	fn touches(&self, list: &TouchList) -> Vec<(PointerId, Point)> {
		(0..list.length())
			.filter_map(|i| list.get(i))
			.map(|t| (t.identifier(), self.local(t.client_x(), t.client_y())))
			.collect()
	}

	fn paint(&self) {
		self.graph
			.scene()
			.paint(&self.ctx, self.graph.viewport(), self.graph.theme());
	}
}

type Shared = Rc<RefCell<Option<Mounted>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn mount(
	canvas: HtmlCanvasElement,
	data: &GraphData,
	config: GraphConfig,
	formatter: TooltipFormatter,
	size: Container,
) -> Result<Mounted, HostError> {
	let window = web_sys::window().ok_or(HostError::NoWindow)?;
	let document = window.document().ok_or(HostError::NoDocument)?;

	canvas.set_width(size.width as u32);
	canvas.set_height(size.height as u32);
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")?
		.ok_or(HostError::NoContext)?
		.dyn_into()
		.map_err(|_| HostError::NoContext)?;

	let tooltip = DomTooltip::attach(&document)?;
	let scene = CanvasScene::new(config.theme.node.label_key.clone());
	let graph = ForceGraphState::create(size, data, scene, tooltip, formatter, config)?;

	Ok(Mounted {
		graph,
		canvas,
		ctx,
		last_frame: None,
		pinch: None,
	})
}

fn window_size(window: &Window) -> Container {
	let read = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
	Container::new(
		read(window.inner_width()).unwrap_or(800.0),
		read(window.inner_height()).unwrap_or(600.0),
	)
}

fn request_frame(callback: &FrameCallback) -> Option<i32> {
	let callback = callback.borrow();
	web_sys::window()?
		.request_animation_frame(callback.as_ref()?.as_ref().unchecked_ref())
		.ok()
}

/// Cancels the pending frame and destroys the mounted graph, if any.
fn unmount(mounted: &Shared, pending: &Cell<Option<i32>>) {
	if let (Some(id), Some(window)) = (pending.take(), web_sys::window()) {
		let _ = window.cancel_animation_frame(id);
	}
	if let Some(mut m) = mounted.borrow_mut().take() {
		m.graph.destroy();
	}
}

/// Renders an interactive force-directed graph on a canvas element.
///
/// Pass graph data via the reactive `data` signal; a new value re-creates
/// the layout. The component sizes itself to its parent container by
/// default; set `fullscreen = true` to fill the viewport and resize with the
/// window. Explicit `width`/`height` override automatic sizing.
///
/// Hovering a node shows `tooltip(attributes)` in a shared overlay (by
/// default the node's label attribute). Clicking a node without dragging it
/// calls `on_node_click` with its id.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional)] config: Option<GraphConfig>,
	#[prop(optional)] tooltip: Option<TooltipFn>,
	#[prop(optional)] on_node_click: Option<NodeClickFn>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let mounted: Shared = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let config = config.unwrap_or_default();

	let (mounted_init, animate_init, pending_init, resize_init) = (
		mounted.clone(),
		animate.clone(),
		pending.clone(),
		resize_cb.clone(),
	);
	Effect::new(move |_| {
		let graph_data = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("force-graph: {}", HostError::NoWindow);
			return;
		};
		unmount(&mounted_init, &pending_init);

		let size = if fullscreen {
			window_size(&window)
		} else {
			let parent = canvas.parent_element();
			Container::new(
				width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
				height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
			)
		};
		let formatter: TooltipFormatter = match &tooltip {
			Some(format) => {
				let format = format.clone();
				Box::new(move |attributes| format(attributes))
			}
			None => attribute_formatter(config.theme.node.label_key.clone()),
		};

		match mount(canvas, &graph_data, config.clone(), formatter, size) {
			Ok(m) => *mounted_init.borrow_mut() = Some(m),
			Err(err) => {
				error!("force-graph: failed to mount: {err}");
				return;
			}
		}

		if fullscreen && resize_init.borrow().is_none() {
			let mounted_resize = mounted_init.clone();
			*resize_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let size = window_size(&win);
				if let Some(m) = mounted_resize.borrow_mut().as_mut() {
					m.canvas.set_width(size.width as u32);
					m.canvas.set_height(size.height as u32);
					m.graph.resize(size);
				}
			}));
			if let Some(cb) = resize_init.borrow().as_ref() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_none() {
			let (mounted_anim, animate_inner, pending_inner) =
				(mounted_init.clone(), animate_init.clone(), pending_init.clone());
			*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
				pending_inner.set(None);
				let alive = match mounted_anim.borrow_mut().as_mut() {
					Some(m) if !m.graph.is_destroyed() => {
						let dt = m
							.last_frame
							.map_or(FRAME_MS, |last| (now - last).clamp(0.0, MAX_FRAME_MS));
						m.last_frame = Some(now);
						m.graph.frame(dt);
						m.paint();
						true
					}
					_ => false,
				};
				if alive {
					pending_inner.set(request_frame(&animate_inner));
				}
			}));
		}
		pending_init.set(request_frame(&animate_init));
	});

	let cleanup = StoredValue::new_local((mounted.clone(), animate, pending, resize_cb));
	on_cleanup(move || {
		cleanup.try_with_value(|(mounted, animate, pending, resize_cb)| {
			unmount(mounted, pending);
			if let (Some(cb), Some(window)) = (resize_cb.borrow_mut().take(), web_sys::window()) {
				let _ = window
					.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			animate.borrow_mut().take();
		});
	});

	let mounted_md = mounted.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(m) = mounted_md.borrow_mut().as_mut() {
			let at = m.local(ev.client_x(), ev.client_y());
			m.graph.pointer_down(MOUSE_POINTER, at, ev.time_stamp());
		}
	};

	let mounted_mm = mounted.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(m) = mounted_mm.borrow_mut().as_mut() {
			let at = m.local(ev.client_x(), ev.client_y());
			if m.graph.drag().owns_pointer(MOUSE_POINTER) || m.graph.viewport().is_panning() {
				m.graph.pointer_move(MOUSE_POINTER, at, ev.time_stamp());
			} else {
				let page = Point::new(ev.page_x() as f64, ev.page_y() as f64);
				m.graph.hover(at, page);
			}
		}
	};

	let (mounted_mu, click_mu) = (mounted.clone(), on_node_click.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let release = mounted_mu
			.borrow_mut()
			.as_mut()
			.and_then(|m| m.graph.pointer_up(MOUSE_POINTER, ev.time_stamp()));
		if let (Some(Release::Click(id)), Some(click)) = (release, &click_mu) {
			click(id);
		}
	};

	let mounted_ml = mounted.clone();
	let on_mouseleave = move |ev: MouseEvent| {
		if let Some(m) = mounted_ml.borrow_mut().as_mut() {
			m.graph.pointer_leave(MOUSE_POINTER, ev.time_stamp());
		}
	};

	let mounted_wh = mounted.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(m) = mounted_wh.borrow_mut().as_mut() {
			let at = m.local(ev.client_x(), ev.client_y());
			let line_mode = ev.delta_mode() == WheelEvent::DOM_DELTA_LINE;
			m.graph.wheel(at, ev.delta_y(), line_mode);
		}
	};

	let mounted_ts = mounted.clone();
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		if let Some(m) = mounted_ts.borrow_mut().as_mut() {
			let touches = m.touches(&ev.touches());
			match touches.as_slice() {
				[(id, at)] => {
					m.pinch = None;
					m.graph.pointer_down(*id, *at, ev.time_stamp());
				}
				[(first, a), (_, b), ..] => {
					m.graph.pointer_up(*first, ev.time_stamp());
					m.pinch = Some((*a, *b));
				}
				[] => {}
			}
		}
	};

	let mounted_tm = mounted.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		if let Some(m) = mounted_tm.borrow_mut().as_mut() {
			let touches = m.touches(&ev.touches());
			match touches.as_slice() {
				[(id, at)] => m.graph.pointer_move(*id, *at, ev.time_stamp()),
				[(_, a), (_, b), ..] => {
					if let Some(before) = m.pinch {
						m.graph.pinch(before, (*a, *b));
					}
					m.pinch = Some((*a, *b));
				}
				[] => {}
			}
		}
	};

	let (mounted_te, click_te) = (mounted.clone(), on_node_click);
	let on_touchend = move |ev: TouchEvent| {
		let clicks: Vec<String> = match mounted_te.borrow_mut().as_mut() {
			Some(m) => {
				if ev.touches().length() < 2 {
					m.pinch = None;
				}
				m.touches(&ev.changed_touches())
					.into_iter()
					.filter_map(|(id, _)| match m.graph.pointer_up(id, ev.time_stamp()) {
						Some(Release::Click(node)) => Some(node),
						_ => None,
					})
					.collect()
			}
			None => Vec::new(),
		};
		if let Some(click) = &click_te {
			for id in clicks {
				click(id);
			}
		}
	};
	let on_touchcancel = on_touchend.clone();

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			on:touchcancel=on_touchcancel
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}
