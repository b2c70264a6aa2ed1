//! Tunable parameters of the force simulation.
//!
//! Every struct deserializes with `#[serde(default)]`, so a host can override
//! a single field (say `charge.strength`) from JSON and keep the rest.

use serde::Deserialize;

/// What to do with a link whose endpoint id is not in the node set.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkPolicy {
	/// Drop the link, log it and keep it in `rejected_links`.
	#[default]
	Skip,
	/// Fail initialization with the first unresolved link.
	Reject,
}

/// Initial placement for nodes that arrive without coordinates.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Placement {
	/// Deterministic sunflower spiral around the center.
	#[default]
	Phyllotaxis,
	/// Uniform in a disc of `radius` around the center, drawn from the seeded RNG.
	Scatter { radius: f64 },
}

/// Many-body (charge) force.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChargeConfig {
	/// Negative values repel.
	pub strength: f64,
	/// Barnes-Hut opening criterion. `0.0` computes every pair exactly.
	pub theta: f64,
	/// Distances below this are softened to avoid blow-ups.
	pub distance_min: f64,
	/// Pairs farther apart than this ignore each other.
	pub distance_max: Option<f64>,
}

impl Default for ChargeConfig {
	fn default() -> Self {
		Self {
			strength: -150.0,
			theta: 0.9,
			distance_min: 1.0,
			distance_max: None,
		}
	}
}

/// Spring force along links.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LinkForceConfig {
	/// Rest length.
	pub distance: f64,
	/// Spring stiffness. `None` uses `1 / min(degree(source), degree(target))`.
	pub strength: Option<f64>,
	/// Relaxation passes per step.
	pub iterations: usize,
}

impl Default for LinkForceConfig {
	fn default() -> Self {
		Self {
			distance: 30.0,
			strength: None,
			iterations: 1,
		}
	}
}

/// Pull of the layout centroid toward `(x, y)`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CenterConfig {
	pub x: f64,
	pub y: f64,
	pub strength: f64,
}

impl Default for CenterConfig {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			strength: 0.1,
		}
	}
}

/// Full simulation configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	/// Starting energy.
	pub alpha: f64,
	/// Stepping stops once alpha drops below this.
	pub alpha_min: f64,
	/// Fraction of the gap to `alpha_target` closed per step.
	pub alpha_decay: f64,
	/// Resting energy when nothing is being dragged.
	pub alpha_target: f64,
	/// Resting energy while at least one node is dragged.
	pub drag_alpha_target: f64,
	/// Fraction of velocity retained per step, in (0, 1).
	pub velocity_decay: f64,
	pub charge: ChargeConfig,
	pub link: LinkForceConfig,
	pub center: CenterConfig,
	/// Seed for scatter placement and coincident-node jiggle.
	pub seed: u64,
	pub placement: Placement,
	pub link_policy: LinkPolicy,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			alpha: 1.0,
			alpha_min: 0.001,
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			alpha_target: 0.0,
			drag_alpha_target: 0.3,
			velocity_decay: 0.6,
			charge: ChargeConfig::default(),
			link: LinkForceConfig::default(),
			center: CenterConfig::default(),
			seed: 0x5eed,
			placement: Placement::default(),
			link_policy: LinkPolicy::default(),
		}
	}
}

impl SimulationConfig {
	/// Tuning of the SVG flavour: mild repulsion, default spacing.
	pub fn svg() -> Self {
		Self::default()
	}

	/// Tuning of the canvas flavour: strong repulsion, 50 unit links, light friction.
	pub fn canvas() -> Self {
		Self {
			velocity_decay: 0.8,
			charge: ChargeConfig {
				strength: -500.0,
				..ChargeConfig::default()
			},
			link: LinkForceConfig {
				distance: 50.0,
				..LinkForceConfig::default()
			},
			..Self::default()
		}
	}

	/// Same parameters, centered on `(x, y)`.
	pub fn centered_at(mut self, x: f64, y: f64) -> Self {
		self.center.x = x;
		self.center.y = y;
		self
	}
}
