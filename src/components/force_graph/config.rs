//! Top-level graph configuration, as read from the page.

use serde::Deserialize;

use super::interaction::DragConfig;
use super::simulation::SimulationConfig;
use super::theme::Theme;
use super::tooltip::TooltipConfig;
use super::viewport::ViewportConfig;

/// Everything a host can tune. Any subset may be given; the rest defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	pub simulation: SimulationConfig,
	pub viewport: ViewportConfig,
	pub drag: DragConfig,
	pub tooltip: TooltipConfig,
	pub theme: Theme,
}

impl GraphConfig {
	/// Light theme, large nodes, gentle forces.
	pub fn svg() -> Self {
		Self {
			simulation: SimulationConfig::svg(),
			..Self::default()
		}
	}

	/// Compact theme with stronger repulsion and longer links.
	pub fn canvas() -> Self {
		Self {
			simulation: SimulationConfig::canvas(),
			theme: Theme::compact(),
			..Self::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::simulation::LinkPolicy;

	#[test]
	fn partial_json_keeps_defaults() {
		let config: GraphConfig = serde_json::from_str(
			r#"{
				"simulation": { "charge": { "strength": -300 }, "link_policy": "reject" },
				"drag": { "click_threshold": 5 }
			}"#,
		)
		.unwrap();
		assert_eq!(config.simulation.charge.strength, -300.0);
		assert_eq!(config.simulation.charge.theta, 0.9);
		assert_eq!(config.simulation.link_policy, LinkPolicy::Reject);
		assert_eq!(config.drag.click_threshold, 5.0);
		assert_eq!(config.tooltip.opacity, 0.9);
		assert_eq!(config.viewport.world_scale, 4.0);
	}

	#[test]
	fn empty_object_is_default() {
		let config: GraphConfig = serde_json::from_str("{}").unwrap();
		assert_eq!(config.simulation.velocity_decay, 0.6);
		assert_eq!(config.theme.node.label_key, "name");
	}

	#[test]
	fn presets_differ_in_forces() {
		assert_eq!(GraphConfig::svg().simulation.charge.strength, -150.0);
		assert_eq!(GraphConfig::canvas().simulation.charge.strength, -500.0);
		assert_eq!(GraphConfig::canvas().theme.node.radius, 12.0);
	}
}
