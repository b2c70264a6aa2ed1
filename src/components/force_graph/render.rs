//! Canvas 2D backend for the render synchronizer.
//!
//! [`CanvasScene`] keeps a retained list of circles and lines in simulation
//! space. [`CanvasScene::paint`] sets the viewport transform once on the
//! context and draws everything under it:
//! 1. Background (screen space)
//! 2. Link lines
//! 3. Node circles, then their labels on top

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::sync::Scene;
use super::theme::Theme;
use super::types::{NodeAttributes, Point};
use super::viewport::Viewport;

#[derive(Clone, Debug)]
struct Circle {
	at: Point,
	label: Option<String>,
}

#[derive(Clone, Copy, Debug)]
struct Line {
	from: Point,
	to: Point,
	width: f64,
}

/// Retained circles and lines, painted onto a canvas each frame.
pub struct CanvasScene {
	label_key: String,
	circles: Vec<Option<Circle>>,
	lines: Vec<Line>,
}

impl CanvasScene {
	/// Labels are read from the `label_key` attribute of each node.
	pub fn new(label_key: impl Into<String>) -> Self {
		Self {
			label_key: label_key.into(),
			circles: Vec::new(),
			lines: Vec::new(),
		}
	}

	pub fn live_circles(&self) -> usize {
		self.circles.iter().flatten().count()
	}

	pub fn line_count(&self) -> usize {
		self.lines.len()
	}

	fn label_of(&self, attributes: &NodeAttributes) -> Option<String> {
		match attributes.get(&self.label_key)? {
			serde_json::Value::String(s) => Some(s.clone()),
			serde_json::Value::Null => None,
			other => Some(other.to_string()),
		}
	}

	/// Draws the whole scene for the current viewport.
	pub fn paint(&self, ctx: &CanvasRenderingContext2d, viewport: &Viewport, theme: &Theme) {
		let (width, height) = viewport.size();
		let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
		ctx.clear_rect(0.0, 0.0, width, height);
		if let Some(background) = theme.background {
			ctx.set_fill_style_str(&background.to_css());
			ctx.fill_rect(0.0, 0.0, width, height);
		}

		let (k, offset) = (viewport.scale(), viewport.offset());
		let _ = ctx.set_transform(k, 0.0, 0.0, k, offset.x, offset.y);

		ctx.set_stroke_style_str(&theme.link.color.to_css());
		for line in &self.lines {
			ctx.set_line_width(line.width);
			ctx.begin_path();
			ctx.move_to(line.from.x, line.from.y);
			ctx.line_to(line.to.x, line.to.y);
			ctx.stroke();
		}

		let node = &theme.node;
		ctx.set_fill_style_str(&node.fill.to_css());
		ctx.set_stroke_style_str(&node.stroke.to_css());
		ctx.set_line_width(node.stroke_width);
		for circle in self.circles.iter().flatten() {
			ctx.begin_path();
			let _ = ctx.arc(circle.at.x, circle.at.y, node.radius, 0.0, 2.0 * PI);
			ctx.fill();
			ctx.stroke();
		}

		ctx.set_fill_style_str(&node.label_color.to_css());
		ctx.set_font(&format!("{}px sans-serif", node.font_size));
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		for circle in self.circles.iter().flatten() {
			if let Some(label) = &circle.label {
				let _ = ctx.fill_text(label, circle.at.x, circle.at.y);
			}
		}
	}
}

impl Scene for CanvasScene {
	type Handle = usize;

	fn create_node(&mut self, _id: &str, attributes: &NodeAttributes) -> usize {
		let label = self.label_of(attributes);
		self.circles.push(Some(Circle {
			at: Point::default(),
			label,
		}));
		self.circles.len() - 1
	}

	fn move_node(&mut self, handle: &usize, at: Point) {
		if let Some(Some(circle)) = self.circles.get_mut(*handle) {
			circle.at = at;
		}
	}

	fn release_node(&mut self, handle: usize) {
		if let Some(slot) = self.circles.get_mut(handle) {
			*slot = None;
		}
	}

	fn clear_links(&mut self) {
		self.lines.clear();
	}

	fn draw_link(&mut self, from: Point, to: Point, width: f64) {
		self.lines.push(Line { from, to, width });
	}
}
