//! Hover tooltip: one shared overlay, faded in and out.
//!
//! The overlay is never removed between hovers, only made transparent, so
//! repeated show/hide cycles cost a style write each.

use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use super::error::HostError;
use super::types::NodeAttributes;

/// DOM id of the shared overlay element.
pub const TOOLTIP_ID: &str = "graph-tooltip";

/// Caller-supplied markup for a hovered node.
pub type TooltipFormatter = Box<dyn Fn(&NodeAttributes) -> String>;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
	/// Opacity when fully shown.
	pub opacity: f64,
	pub duration_ms: f64,
	/// Pixels the overlay sits above the pointer.
	pub offset_y: f64,
}

impl Default for TooltipConfig {
	fn default() -> Self {
		Self {
			opacity: 0.9,
			duration_ms: 200.0,
			offset_y: 28.0,
		}
	}
}

/// Whatever actually displays the tooltip.
pub trait TooltipSurface {
	fn set_content(&mut self, markup: &str);
	fn set_position(&mut self, left: f64, top: f64);
	fn set_opacity(&mut self, opacity: f64);
}

/// Shows `attributes[key]` as text, escaped.
pub fn attribute_formatter(key: impl Into<String>) -> TooltipFormatter {
	let key = key.into();
	Box::new(move |attributes| {
		let text = match attributes.get(&key) {
			Some(serde_json::Value::String(s)) => s.clone(),
			Some(other) => other.to_string(),
			None => String::new(),
		};
		escape_html(&text)
	})
}

fn escape_html(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}

/// Cubic ease-in-out.
fn ease_cubic(t: f64) -> f64 {
	let t = t.clamp(0.0, 1.0) * 2.0;
	if t <= 1.0 {
		t * t * t / 2.0
	} else {
		let t = t - 2.0;
		(t * t * t + 2.0) / 2.0
	}
}

#[derive(Clone, Copy, Debug)]
struct Fade {
	from: f64,
	to: f64,
	elapsed: f64,
}

pub struct TooltipController<S: TooltipSurface> {
	surface: S,
	config: TooltipConfig,
	opacity: f64,
	target: f64,
	fade: Option<Fade>,
	content: String,
	attached: bool,
}

impl<S: TooltipSurface> TooltipController<S> {
	pub fn new(mut surface: S, config: TooltipConfig) -> Self {
		surface.set_opacity(0.0);
		Self {
			surface,
			config,
			opacity: 0.0,
			target: 0.0,
			fade: None,
			content: String::new(),
			attached: true,
		}
	}

	/// Sets content and position and starts fading in.
	pub fn show(&mut self, content: &str, x: f64, y: f64) {
		if !self.attached {
			return;
		}
		if self.content != content {
			self.content = content.to_owned();
			self.surface.set_content(content);
		}
		self.surface.set_position(x, y - self.config.offset_y);
		self.fade_to(self.config.opacity);
	}

	/// Starts fading out. The overlay stays in place.
	pub fn hide(&mut self) {
		self.fade_to(0.0);
	}

	fn fade_to(&mut self, to: f64) {
		if self.target == to {
			return;
		}
		self.target = to;
		self.fade = Some(Fade {
			from: self.opacity,
			to,
			elapsed: 0.0,
		});
	}

	/// Advances the running fade.
	pub fn tick(&mut self, dt_ms: f64) {
		let Some(fade) = self.fade.as_mut() else {
			return;
		};
		fade.elapsed += dt_ms.max(0.0);
		let t = if self.config.duration_ms > 0.0 {
			fade.elapsed / self.config.duration_ms
		} else {
			1.0
		};
		let (from, to) = (fade.from, fade.to);
		if t >= 1.0 {
			self.opacity = to;
			self.fade = None;
		} else {
			self.opacity = from + (to - from) * ease_cubic(t);
		}
		self.surface.set_opacity(self.opacity);
	}

	/// Hides immediately and ignores further `show` calls.
	pub fn detach(&mut self) -> bool {
		if !self.attached {
			return false;
		}
		self.attached = false;
		self.target = 0.0;
		self.opacity = 0.0;
		self.fade = None;
		self.surface.set_opacity(0.0);
		true
	}

	pub fn opacity(&self) -> f64 {
		self.opacity
	}

	pub fn content(&self) -> &str {
		&self.content
	}

	pub fn is_shown(&self) -> bool {
		self.target > 0.0
	}

	pub fn surface(&self) -> &S {
		&self.surface
	}
}

/// The `#graph-tooltip` element, created on first use and shared afterwards.
pub struct DomTooltip {
	element: HtmlElement,
}

impl DomTooltip {
	pub fn attach(document: &Document) -> Result<Self, HostError> {
		if let Some(existing) = document.get_element_by_id(TOOLTIP_ID) {
			let element = existing
				.dyn_into::<HtmlElement>()
				.map_err(|_| HostError::Dom(format!("#{TOOLTIP_ID} is not an HTML element")))?;
			return Ok(Self { element });
		}

		let element: HtmlElement = document.create_element("div")?.dyn_into().map_err(|_| {
			HostError::Dom("created tooltip is not an HTML element".into())
		})?;
		element.set_id(TOOLTIP_ID);
		element.set_class_name("graph-tooltip");
		let style = element.style();
		style.set_property("position", "absolute")?;
		style.set_property("pointer-events", "none")?;
		style.set_property("opacity", "0")?;
		document
			.body()
			.ok_or(HostError::NoDocument)?
			.append_child(&element)?;
		Ok(Self { element })
	}
}

impl TooltipSurface for DomTooltip {
	fn set_content(&mut self, markup: &str) {
		self.element.set_inner_html(markup);
	}

	fn set_position(&mut self, left: f64, top: f64) {
		let style = self.element.style();
		let _ = style.set_property("left", &format!("{left}px"));
		let _ = style.set_property("top", &format!("{top}px"));
	}

	fn set_opacity(&mut self, opacity: f64) {
		let _ = self.element.style().set_property("opacity", &opacity.to_string());
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[derive(Default)]
	struct Recorder {
		content: String,
		position: (f64, f64),
		opacity: f64,
		content_writes: usize,
	}

	impl TooltipSurface for Recorder {
		fn set_content(&mut self, markup: &str) {
			self.content = markup.to_owned();
			self.content_writes += 1;
		}

		fn set_position(&mut self, left: f64, top: f64) {
			self.position = (left, top);
		}

		fn set_opacity(&mut self, opacity: f64) {
			self.opacity = opacity;
		}
	}

	fn controller() -> TooltipController<Recorder> {
		TooltipController::new(Recorder::default(), TooltipConfig::default())
	}

	#[test]
	fn show_fades_in_above_pointer() {
		let mut tip = controller();
		tip.show("<b>B</b>", 100.0, 100.0);
		assert_eq!(tip.surface().content, "<b>B</b>");
		assert_eq!(tip.surface().position, (100.0, 72.0));
		assert_eq!(tip.opacity(), 0.0);

		tip.tick(100.0);
		assert!(tip.opacity() > 0.0 && tip.opacity() < 0.9);
		tip.tick(100.0);
		assert_eq!(tip.opacity(), 0.9);
		assert_eq!(tip.surface().opacity, 0.9);
	}

	#[test]
	fn hide_fades_out_from_current_opacity() {
		let mut tip = controller();
		tip.show("x", 0.0, 0.0);
		tip.tick(100.0);
		let midway = tip.opacity();
		tip.hide();
		tip.tick(1.0);
		assert!(tip.opacity() <= midway);
		tip.tick(250.0);
		assert_eq!(tip.opacity(), 0.0);
		assert!(!tip.is_shown());
	}

	#[test]
	fn repeated_show_reuses_content() {
		let mut tip = controller();
		tip.show("same", 0.0, 0.0);
		tip.hide();
		tip.show("same", 5.0, 5.0);
		assert_eq!(tip.surface().content_writes, 1);
		assert_eq!(tip.surface().position, (5.0, -23.0));
	}

	#[test]
	fn detached_tooltip_ignores_show() {
		let mut tip = controller();
		tip.show("x", 0.0, 0.0);
		tip.tick(200.0);
		assert!(tip.detach());
		assert!(!tip.detach());
		assert_eq!(tip.surface().opacity, 0.0);
		tip.show("y", 0.0, 0.0);
		tip.tick(200.0);
		assert_eq!(tip.opacity(), 0.0);
		assert_eq!(tip.content(), "x");
	}

	#[test]
	fn attribute_formatter_escapes() {
		let format = attribute_formatter("name");
		let mut attributes = NodeAttributes::new();
		attributes.insert("name".into(), json!("<Ada & Bob>"));
		assert_eq!(format(&attributes), "&lt;Ada &amp; Bob&gt;");
		assert_eq!(format(&NodeAttributes::new()), "");
	}

	#[test]
	fn easing_hits_endpoints() {
		assert_eq!(ease_cubic(0.0), 0.0);
		assert_eq!(ease_cubic(0.5), 0.5);
		assert_eq!(ease_cubic(1.0), 1.0);
	}
}
