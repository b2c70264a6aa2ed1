//! Error kinds reported by the graph core and its browser host.

use thiserror::Error;

/// Structural problems in the input graph.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GraphError {
	/// A link endpoint names a node id that is not in the node set.
	#[error("link #{index} references unknown node `{id}`")]
	UnresolvedLink { index: usize, id: String },
}

/// Failures while wiring the graph into the browser.
#[derive(Debug, Error)]
pub enum HostError {
	#[error("no browser window")]
	NoWindow,
	#[error("no document on window")]
	NoDocument,
	#[error("canvas has no 2d rendering context")]
	NoContext,
	#[error("DOM call failed: {0}")]
	Dom(String),
	#[error(transparent)]
	Graph(#[from] GraphError),
}

impl From<wasm_bindgen::JsValue> for HostError {
	fn from(value: wasm_bindgen::JsValue) -> Self {
		HostError::Dom(format!("{value:?}"))
	}
}
