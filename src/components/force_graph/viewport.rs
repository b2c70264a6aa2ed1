//! Pan, zoom and inertia of the visible window.
//!
//! The viewport maps simulation space to screen pixels with a uniform scale
//! and a translation: `screen = world * scale + offset`. It is independent of
//! the simulation; node drags only suspend panning through
//! [`Viewport::pause_pan`] / [`Viewport::resume_pan`], which are counted so
//! overlapping drags resume panning once the last one ends.

use serde::Deserialize;

use super::types::Point;

/// Milliseconds per frame the friction constant is expressed against.
const FRAME_MS: f64 = 1000.0 / 60.0;
/// A release this long after the last move carries no inertia.
const REST_BEFORE_RELEASE_MS: f64 = 100.0;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
	/// Largest visible world extent as a multiple of the screen size.
	pub world_scale: f64,
	/// Smallest visible world extent as a fraction of the screen size.
	pub min_extent_ratio: f64,
	/// Wheel sensitivity.
	pub wheel_percent: f64,
	/// Pixels per wheel "line" when the browser reports line deltas.
	pub line_height: f64,
	/// Velocity retained per frame after release.
	pub friction: f64,
	/// Inertia stops below this speed (px/ms).
	pub min_speed: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			world_scale: 4.0,
			min_extent_ratio: 0.25,
			wheel_percent: 0.1,
			line_height: 20.0,
			friction: 0.95,
			min_speed: 0.01,
		}
	}
}

#[derive(Clone, Copy, Debug)]
struct PanGesture {
	last: Point,
	last_time: f64,
}

pub struct Viewport {
	config: ViewportConfig,
	width: f64,
	height: f64,
	scale: f64,
	offset: Point,
	min_scale: f64,
	max_scale: f64,
	/// Inertia velocity in px/ms.
	velocity: Point,
	pan: Option<PanGesture>,
	suspended: usize,
}

impl Viewport {
	pub fn new(width: f64, height: f64, config: ViewportConfig) -> Self {
		let mut viewport = Self {
			config,
			width,
			height,
			scale: 1.0,
			offset: Point::default(),
			min_scale: 0.0,
			max_scale: f64::INFINITY,
			velocity: Point::default(),
			pan: None,
			suspended: 0,
		};
		viewport.update_bounds();
		viewport
	}

	fn update_bounds(&mut self) {
		let (w, h) = (self.width, self.height);
		if w > 0.0 && h > 0.0 {
			let ratio = self.config.min_extent_ratio;
			let world = self.config.world_scale;
			self.max_scale = (w / (w * ratio)).min(h / (h * ratio));
			self.min_scale = (w / (w * world)).max(h / (h * world));
		} else {
			self.max_scale = 1.0 / self.config.min_extent_ratio;
			self.min_scale = 1.0 / self.config.world_scale;
		}
		self.scale = self.scale.clamp(self.min_scale, self.max_scale);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.update_bounds();
	}

	pub fn scale(&self) -> f64 {
		self.scale
	}

	pub fn offset(&self) -> Point {
		self.offset
	}

	pub fn scale_bounds(&self) -> (f64, f64) {
		(self.min_scale, self.max_scale)
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn velocity(&self) -> Point {
		self.velocity
	}

	pub fn screen_to_world(&self, p: Point) -> Point {
		Point::new(
			(p.x - self.offset.x) / self.scale,
			(p.y - self.offset.y) / self.scale,
		)
	}

	pub fn world_to_screen(&self, p: Point) -> Point {
		Point::new(
			p.x * self.scale + self.offset.x,
			p.y * self.scale + self.offset.y,
		)
	}

	/// Suspends panning; any pan in progress is dropped.
	pub fn pause_pan(&mut self) {
		self.suspended += 1;
		self.pan = None;
		self.velocity = Point::default();
	}

	/// Undoes one [`Viewport::pause_pan`].
	pub fn resume_pan(&mut self) {
		self.suspended = self.suspended.saturating_sub(1);
	}

	pub fn is_pan_suspended(&self) -> bool {
		self.suspended > 0
	}

	pub fn is_panning(&self) -> bool {
		self.pan.is_some()
	}

	/// Starts a background pan. Returns `false` while panning is suspended.
	pub fn pan_start(&mut self, at: Point, time_ms: f64) -> bool {
		if self.is_pan_suspended() {
			return false;
		}
		self.velocity = Point::default();
		self.pan = Some(PanGesture {
			last: at,
			last_time: time_ms,
		});
		true
	}

	pub fn pan_move(&mut self, at: Point, time_ms: f64) {
		if self.is_pan_suspended() {
			return;
		}
		let Some(gesture) = self.pan.as_mut() else {
			return;
		};
		let (dx, dy) = (at.x - gesture.last.x, at.y - gesture.last.y);
		let dt = (time_ms - gesture.last_time).max(1.0);
		self.offset.x += dx;
		self.offset.y += dy;
		self.velocity = Point::new(dx / dt, dy / dt);
		gesture.last = at;
		gesture.last_time = time_ms;
	}

	/// Ends the pan; the view keeps gliding with the release velocity.
	pub fn pan_end(&mut self, time_ms: f64) {
		if let Some(gesture) = self.pan.take() {
			if time_ms - gesture.last_time > REST_BEFORE_RELEASE_MS {
				self.velocity = Point::default();
			}
		}
	}

	/// Scales by `factor` (clamped) keeping the world point under `at` fixed.
	pub fn zoom_at(&mut self, at: Point, factor: f64) {
		if !factor.is_finite() || factor <= 0.0 {
			return;
		}
		let anchor = self.screen_to_world(at);
		self.scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
		self.offset = Point::new(at.x - anchor.x * self.scale, at.y - anchor.y * self.scale);
	}

	/// Wheel zoom. Positive `delta_y` (scrolling down) zooms out.
	pub fn wheel(&mut self, at: Point, delta_y: f64, line_mode: bool) {
		let unit = if line_mode { self.config.line_height } else { 1.0 };
		let step = -delta_y * unit / 500.0;
		self.zoom_at(at, 2f64.powf((1.0 + self.config.wheel_percent) * step));
	}

	/// Two-finger gesture: zoom by the change in finger spread around its
	/// midpoint, then follow the midpoint.
	pub fn pinch(&mut self, before: (Point, Point), after: (Point, Point)) {
		let spread_before = before.0.distance(before.1);
		let spread_after = after.0.distance(after.1);
		if spread_before <= f64::EPSILON {
			return;
		}
		let mid_before = Point::new((before.0.x + before.1.x) / 2.0, (before.0.y + before.1.y) / 2.0);
		let mid_after = Point::new((after.0.x + after.1.x) / 2.0, (after.0.y + after.1.y) / 2.0);
		self.zoom_at(mid_before, spread_after / spread_before);
		if !self.is_pan_suspended() {
			self.offset.x += mid_after.x - mid_before.x;
			self.offset.y += mid_after.y - mid_before.y;
		}
	}

	/// Advances inertia. Returns whether the view moved.
	pub fn tick(&mut self, dt_ms: f64) -> bool {
		if self.pan.is_some() || dt_ms <= 0.0 {
			return false;
		}
		let speed = self.velocity.x.hypot(self.velocity.y);
		if speed < self.config.min_speed {
			self.velocity = Point::default();
			return false;
		}
		self.offset.x += self.velocity.x * dt_ms;
		self.offset.y += self.velocity.y * dt_ms;
		let retain = self.config.friction.powf(dt_ms / FRAME_MS);
		self.velocity.x *= retain;
		self.velocity.y *= retain;
		true
	}
}
