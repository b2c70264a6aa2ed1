//! Force-directed graph visualization component.
//!
//! Renders an interactive node-link graph on an HTML canvas with:
//! - A d3-style force simulation (many-body, link springs, centering)
//! - Node dragging that pins the node and re-heats the layout
//! - Pan, wheel/pinch zoom and release inertia
//! - A shared hover tooltip fed by a caller-supplied formatter
//!
//! Everything except [`ForceGraphCanvas`], [`CanvasScene`] painting and
//! [`DomTooltip`] is plain Rust and runs without a browser; hosts other than
//! the canvas component can drive [`ForceGraphState`] with their own
//! [`Scene`] and [`TooltipSurface`].
//!
//! # Example
//!
//! ```ignore
//! use force_graph_view::{ForceGraphCanvas, GraphData, GraphLink, GraphNode};
//!
//! let data = GraphData {
//!     nodes: vec![
//!         GraphNode::new("a").with_attr("name", "Node A"),
//!         GraphNode::new("b").with_attr("name", "Node B"),
//!     ],
//!     links: vec![GraphLink::new("a", "b").with_value(2.0)],
//! };
//!
//! view! { <ForceGraphCanvas data=data fullscreen=true /> }
//! ```

mod component;
pub mod config;
mod error;
pub mod interaction;
mod render;
pub mod simulation;
mod state;
pub mod sync;
pub mod theme;
pub mod tooltip;
mod types;
pub mod viewport;

pub use component::{ForceGraphCanvas, NodeClickFn, TooltipFn};
pub use config::GraphConfig;
pub use error::{GraphError, HostError};
pub use interaction::{DragController, DragState, MOUSE_POINTER, PointerId, Release};
pub use render::CanvasScene;
pub use simulation::{Simulation, SimulationConfig};
pub use state::{Container, ForceGraphState};
pub use sync::{RenderSynchronizer, Scene, link_width};
pub use theme::Theme;
pub use tooltip::{DomTooltip, TooltipController, TooltipFormatter, TooltipSurface};
pub use types::{GraphData, GraphLink, GraphNode, NodeAttributes, Point};
pub use viewport::Viewport;
