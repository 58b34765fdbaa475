//! Application configuration.
//!
//! Everything here has a sensible [`Default`]; the app builds one at mount and
//! hands the relevant parts to the loader and the canvas component.

use force_graph::SimulationParameters;

/// Bounds and default of the repulsion slider.
///
/// Strength follows the usual many-body convention: negative values repel,
/// zero disables repulsion.
#[derive(Clone, Debug, PartialEq)]
pub struct RepulsionRange {
	/// Strongest repulsion the slider offers.
	pub min: f64,
	/// Weakest setting; zero turns repulsion off.
	pub max: f64,
	/// Slider increment.
	pub step: f64,
	/// Strength used before the user touches the slider.
	pub default: f64,
}

impl RepulsionRange {
	/// Clamp a raw slider value into range. Non-numeric input falls back to
	/// the default.
	pub fn clamp(&self, value: f64) -> f64 {
		if value.is_nan() {
			return self.default;
		}
		value.clamp(self.min, self.max)
	}

	/// Parse the string value of a range input.
	pub fn parse(&self, raw: &str) -> f64 {
		self.clamp(raw.trim().parse().unwrap_or(f64::NAN))
	}
}

impl Default for RepulsionRange {
	fn default() -> Self {
		Self {
			min: -600.0,
			max: 0.0,
			step: 10.0,
			default: -100.0,
		}
	}
}

/// Physics parameters other than repulsion, which comes from the slider.
#[derive(Clone, Debug)]
pub struct LayoutConfig {
	/// Spring stiffness along edges.
	pub spring: f32,
	/// Upper bound of any single force.
	pub force_max: f32,
	/// Velocity scale applied to the net force.
	pub node_speed: f32,
	/// Fraction of velocity kept between steps.
	pub damping: f32,
	/// Mass of every service node.
	pub node_mass: f32,
	/// Multiplier from slider strength to simulation charge.
	pub charge_scale: f32,
	/// Radius of the circle nodes start on, per node.
	pub initial_spacing: f64,
	/// Fraction of the centroid offset removed each step.
	pub centering: f32,
}

impl LayoutConfig {
	/// Simulation parameters for a slider strength in `-600..=0`.
	pub fn simulation(&self, repulsion: f64) -> SimulationParameters {
		SimulationParameters {
			force_charge: (-repulsion as f32).max(0.0) * self.charge_scale,
			force_spring: self.spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping,
		}
	}
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping: 0.9,
			node_mass: 10.0,
			charge_scale: 1.5,
			initial_spacing: 40.0,
			centering: 1.0,
		}
	}
}

/// Top-level configuration.
#[derive(Clone, Debug)]
pub struct GraphConfig {
	/// Location of the service document.
	pub data_url: String,
	/// Directory holding `<type>.svg` / `<type>.png` icons.
	pub icon_base: String,
	/// Repulsion slider bounds and starting value.
	pub repulsion: RepulsionRange,
	/// Remaining simulation parameters.
	pub layout: LayoutConfig,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			data_url: "/serviceGraphData.json".to_string(),
			icon_base: "/icons".to_string(),
			repulsion: RepulsionRange::default(),
			layout: LayoutConfig::default(),
		}
	}
}
