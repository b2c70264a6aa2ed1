//! Visual theming for the force graph.
//!
//! Colors deserialize from CSS hex strings (`"#rgb"`, `"#rrggbb"`), so a
//! theme can be overridden from the page's JSON config.

use serde::Deserialize;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Parses `#rgb` or `#rrggbb`.
	pub fn from_hex(hex: &str) -> Option<Self> {
		let digits = hex.strip_prefix('#')?;
		let channel = |s: &str| u8::from_str_radix(s, 16).ok();
		match digits.len() {
			3 => {
				let mut out = [0u8; 3];
				for (i, slot) in out.iter_mut().enumerate() {
					*slot = channel(digits.get(i..=i)?)? * 17;
				}
				Some(Self::rgb(out[0], out[1], out[2]))
			}
			6 => Some(Self::rgb(
				channel(digits.get(0..2)?)?,
				channel(digits.get(2..4)?)?,
				channel(digits.get(4..6)?)?,
			)),
			_ => None,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

impl TryFrom<String> for Color {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::from_hex(value.trim()).ok_or_else(|| format!("invalid color `{value}`"))
	}
}

/// Node circle and label style.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
	/// Circle radius in simulation units; also the hit-test radius.
	pub radius: f64,
	pub fill: Color,
	pub stroke: Color,
	pub stroke_width: f64,
	pub label_color: Color,
	pub font_size: f64,
	/// Attribute whose value is drawn as the node label.
	pub label_key: String,
}

impl Default for NodeStyle {
	fn default() -> Self {
		Self {
			radius: 24.0,
			fill: Color::rgb(0xf0, 0xf8, 0xff),
			stroke: Color::rgb(0xd3, 0xd3, 0xd3),
			stroke_width: 1.5,
			label_color: Color::rgb(0, 0, 0),
			font_size: 12.0,
			label_key: "name".into(),
		}
	}
}

/// Link line style.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LinkStyle {
	pub color: Color,
	/// Width of a link with weight 1.
	pub base_width: f64,
}

impl Default for LinkStyle {
	fn default() -> Self {
		Self {
			color: Color::rgba(0x99, 0x99, 0x99, 0.6),
			base_width: 1.0,
		}
	}
}

/// Complete visual theme.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Theme {
	/// Canvas fill; transparent when unset.
	pub background: Option<Color>,
	pub node: NodeStyle,
	pub link: LinkStyle,
}

impl Theme {
	/// Smaller nodes on a dark background, for dense graphs.
	pub fn compact() -> Self {
		Self {
			background: Some(Color::rgb(22, 27, 34)),
			node: NodeStyle {
				radius: 12.0,
				fill: Color::rgb(94, 129, 172),
				stroke: Color::rgb(143, 163, 180),
				label_color: Color::rgb(255, 255, 255),
				font_size: 10.0,
				..NodeStyle::default()
			},
			link: LinkStyle {
				color: Color::rgba(140, 160, 180, 0.5),
				base_width: 1.0,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_short_and_long_hex() {
		assert_eq!(Color::from_hex("#999"), Some(Color::rgb(0x99, 0x99, 0x99)));
		assert_eq!(Color::from_hex("#f0f8ff"), Some(Color::rgb(0xf0, 0xf8, 0xff)));
		assert_eq!(Color::from_hex("999"), None);
		assert_eq!(Color::from_hex("#12345"), None);
		assert_eq!(Color::from_hex("#zzzzzz"), None);
	}

	#[test]
	fn css_uses_rgba_only_when_translucent() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(
			Color::rgb(1, 2, 3).with_alpha(0.5).to_css(),
			"rgba(1, 2, 3, 0.5)"
		);
	}

	#[test]
	fn theme_overrides_merge_with_defaults() {
		let theme: Theme =
			serde_json::from_str(r##"{ "node": { "fill": "#000" }, "background": "#fff" }"##).unwrap();
		assert_eq!(theme.node.fill, Color::rgb(0, 0, 0));
		assert_eq!(theme.node.radius, 24.0);
		assert_eq!(theme.background, Some(Color::rgb(255, 255, 255)));
		assert_eq!(theme.link.color.a, 0.6);
	}

	#[test]
	fn invalid_color_is_a_deserialize_error() {
		assert!(serde_json::from_str::<Theme>(r#"{ "background": "red" }"#).is_err());
	}
}
