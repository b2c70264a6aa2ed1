//! Graph data structures for input to the force graph component.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Opaque per-node domain data (display name, category, ...).
///
/// Passed through untouched to the tooltip formatter and label lookup; the
/// simulation never reads it.
pub type NodeAttributes = Map<String, Value>;

/// A node in the graph.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphNode {
	/// Unique identifier for this node. Used to reference nodes in links.
	pub id: String,
	/// Optional initial x position in simulation space.
	#[serde(default)]
	pub x: Option<f64>,
	/// Optional initial y position in simulation space.
	#[serde(default)]
	pub y: Option<f64>,
	/// Every other field of the input record.
	#[serde(flatten)]
	pub attributes: NodeAttributes,
}

impl GraphNode {
	/// Node with no position and no attributes.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Self::default()
		}
	}

	/// Sets the initial position.
	pub fn at(mut self, x: f64, y: f64) -> Self {
		self.x = Some(x);
		self.y = Some(y);
		self
	}

	/// Adds one opaque attribute.
	pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attributes.insert(key.into(), value.into());
		self
	}
}

/// An edge between two nodes, referenced by id.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphLink {
	/// Source node ID.
	pub source: String,
	/// Target node ID.
	pub target: String,
	/// Weight; drives the rendered line thickness.
	#[serde(default)]
	pub value: Option<f64>,
}

impl GraphLink {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			value: None,
		}
	}

	pub fn with_value(mut self, value: f64) -> Self {
		self.value = Some(value);
		self
	}
}

/// Complete graph data: nodes and links.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

/// A 2D coordinate, in either screen or simulation space depending on context.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}
