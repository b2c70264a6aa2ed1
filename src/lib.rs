//! force-graph-view: interactive force-directed node-link graphs for the browser.
//!
//! This crate provides a WASM-based graph component that lays nodes out with
//! a force simulation and lets users drag nodes, pan and zoom the canvas and
//! hover nodes for tooltips.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::force_graph::{
	Container, ForceGraphCanvas, ForceGraphState, GraphConfig, GraphData, GraphError, GraphLink,
	GraphNode, NodeAttributes, Point, Release, Scene, TooltipSurface,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("force-graph: logging initialized");
}

/// Parse the JSON body of the `<script id="{id}">` element, if present.
fn load_script_json<T: DeserializeOwned>(id: &str) -> Option<T> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<T>(&json_text) {
		Ok(value) => Some(value),
		Err(e) => {
			warn!("force-graph: failed to parse #{id}: {e}");
			None
		}
	}
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], links: [...] }
fn load_graph_data() -> Option<GraphData> {
	let data: GraphData = load_script_json("graph-data")?;
	info!(
		"force-graph: loaded {} nodes, {} links",
		data.nodes.len(),
		data.links.len()
	);
	Some(data)
}

/// Main application component.
/// Loads graph data and optional config from the DOM and renders the graph.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_default();
	let config: GraphConfig = load_script_json("graph-config").unwrap_or_default();
	let graph_signal = Signal::derive(move || graph_data.clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Force-Directed Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<ForceGraphCanvas data=graph_signal config=config fullscreen=true />
			<div class="graph-overlay">
				<h1>"Force-Directed Graph"</h1>
				<p class="subtitle">"Drag nodes to reposition. Scroll or pinch to zoom. Drag background to pan."</p>
			</div>
		</div>
	}
}
