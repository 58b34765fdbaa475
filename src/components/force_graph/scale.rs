//! Zoom-dependent scaling configuration for graph visuals.
//!
//! This module centralizes all zoom-dependent visual parameters, making it easy to
//! understand and tune how elements behave at different zoom levels.
//!
//! # Coordinate Spaces
//!
//! - **World-space**: The coordinate system of the graph. Values in world-space
//!   scale proportionally with zoom (appear larger when zoomed in).
//! - **Screen-space**: Pixel coordinates on the canvas. Values in screen-space
//!   remain constant regardless of zoom level.
//!
//! Node circles, icons and label text live in world-space so that label hit
//! testing can be done without a canvas. Hover rings are screen-space.

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant world-space size. Appears larger when zoomed in.
	World,
	/// World-space scaling, clamped to min/max screen-space bounds.
	/// `(min_screen_px, max_screen_px)` - use `f64::NEG_INFINITY` or `f64::INFINITY` for unbounded.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// Compute the world-space value for a given base value and zoom level.
	///
	/// The returned value should be used directly in world-space drawing commands
	/// (after the canvas transform has been applied).
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => {
				// screen_size = world_size * k
				let min_world = min_screen / k;
				let max_world = max_screen / k;
				base.clamp(min_world, max_world)
			}
		}
	}
}

/// Defines how alpha/opacity scales with zoom level.
#[derive(Clone, Debug)]
pub enum AlphaBehavior {
	/// Alpha fades based on zoom thresholds.
	/// Fully visible at `full_alpha_k`, fades to zero at `zero_alpha_k`.
	Fade {
		zero_alpha_k: f64,
		full_alpha_k: f64,
	},
}

impl AlphaBehavior {
	/// Compute alpha multiplier for a given zoom level.
	pub fn apply(&self, k: f64) -> f64 {
		match self {
			AlphaBehavior::Fade {
				zero_alpha_k,
				full_alpha_k,
			} => {
				if zero_alpha_k == full_alpha_k {
					return 1.0;
				}
				let t = (k - zero_alpha_k) / (full_alpha_k - zero_alpha_k);
				t.clamp(0.0, 1.0)
			}
		}
	}
}

/// Configuration for node visual scaling.
#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	/// Base node radius in world units.
	pub radius: f64,
	/// How the node radius scales with zoom.
	pub radius_behavior: ScaleBehavior,
	/// Icon edge length as a fraction of the node diameter.
	pub icon_fraction: f64,
}

/// Configuration for the multi-line node labels.
#[derive(Clone, Debug)]
pub struct LabelScaleConfig {
	/// Font size in world units.
	pub font_size: f64,
	/// Distance between baselines, in multiples of the font size.
	pub line_height: f64,
	/// Horizontal gap between the node outline and the label.
	pub gap: f64,
	/// Approximate glyph advance as a fraction of the font size. Used for
	/// hit testing label lines.
	pub char_width: f64,
	/// How label visibility scales with zoom.
	pub alpha_behavior: AlphaBehavior,
}

/// Configuration for edge visual scaling.
#[derive(Clone, Debug)]
pub struct EdgeScaleConfig {
	/// Lower bound for the traffic-derived line width, in screen pixels.
	pub min_line_width: f64,
	/// Edge label font size in world units.
	pub label_size: f64,
	/// How edge label visibility scales with zoom.
	pub label_alpha_behavior: AlphaBehavior,
}

/// Configuration for arrow visual scaling.
#[derive(Clone, Debug)]
pub struct ArrowScaleConfig {
	/// Base arrow size in world units.
	pub size: f64,
	/// How arrow size scales with zoom.
	pub size_behavior: ScaleBehavior,
}

/// Configuration for the hover ring.
#[derive(Clone, Debug)]
pub struct RingScaleConfig {
	/// Stroke width for hover ring in screen pixels.
	pub width: f64,
	/// Ring offset from node edge in screen pixels.
	pub offset: f64,
}

/// Complete scale configuration for all graph elements.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Node circles and icons.
	pub node: NodeScaleConfig,
	/// Node label lines.
	pub label: LabelScaleConfig,
	/// Edge lines and captions.
	pub edge: EdgeScaleConfig,
	/// Arrow heads.
	pub arrow: ArrowScaleConfig,
	/// Hover ring.
	pub ring: RingScaleConfig,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				radius: 30.0,
				radius_behavior: ScaleBehavior::Clamped {
					min_screen: 4.0,
					max_screen: f64::INFINITY,
				},
				icon_fraction: 2.0 / 3.0,
			},
			label: LabelScaleConfig {
				font_size: 12.0,
				line_height: 1.5,
				gap: 5.0,
				char_width: 0.6,
				alpha_behavior: AlphaBehavior::Fade {
					zero_alpha_k: 0.3,
					full_alpha_k: 0.6,
				},
			},
			edge: EdgeScaleConfig {
				min_line_width: 0.5,
				label_size: 10.0,
				label_alpha_behavior: AlphaBehavior::Fade {
					zero_alpha_k: 0.4,
					full_alpha_k: 0.8,
				},
			},
			arrow: ArrowScaleConfig {
				size: 10.0,
				size_behavior: ScaleBehavior::World,
			},
			ring: RingScaleConfig {
				width: 1.5,
				offset: 3.0,
			},
		}
	}
}

/// Pre-computed scale values for a specific zoom level.
///
/// Create this once per frame and pass it to rendering functions.
/// All sizes are in world-space (ready to use after canvas transform).
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Current zoom level.
	pub k: f64,
	/// Node radius in world-space.
	pub node_radius: f64,
	/// Icon edge length in world-space.
	pub icon_size: f64,
	/// Label font size in world-space.
	pub label_size: f64,
	/// Label font string (e.g., "12px sans-serif").
	pub label_font: String,
	/// Baseline spacing of label lines in world-space.
	pub label_line_height: f64,
	/// Distance from node center to the left edge of the label.
	pub label_offset: f64,
	/// Label alpha multiplier [0, 1].
	pub label_alpha: f64,
	/// Minimum edge line width in world-space.
	pub min_edge_width: f64,
	/// Edge label font string.
	pub edge_label_font: String,
	/// Edge label alpha multiplier [0, 1].
	pub edge_label_alpha: f64,
	/// Arrow size in world-space.
	pub arrow_size: f64,
	/// Hover ring width in world-space.
	pub ring_width: f64,
	/// Hover ring offset in world-space.
	pub ring_offset: f64,
}

impl ScaledValues {
	/// Compute scaled values from configuration and current zoom level.
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let node_radius = config.node.radius_behavior.apply(config.node.radius, k);
		let label_size = config.label.font_size;

		Self {
			k,
			node_radius,
			icon_size: node_radius * 2.0 * config.node.icon_fraction,
			label_size,
			label_font: format!("{}px sans-serif", label_size),
			label_line_height: label_size * config.label.line_height,
			label_offset: node_radius + config.label.gap,
			label_alpha: config.label.alpha_behavior.apply(k),
			min_edge_width: config.edge.min_line_width / k,
			edge_label_font: format!("{}px sans-serif", config.edge.label_size),
			edge_label_alpha: config.edge.label_alpha_behavior.apply(k),
			arrow_size: config.arrow.size_behavior.apply(config.arrow.size, k),
			ring_width: config.ring.width / k,
			ring_offset: config.ring.offset / k,
		}
	}

	/// Baseline y offset of label line `line` relative to the node center.
	pub fn label_baseline(&self, line: usize) -> f64 {
		self.label_line_height * (line as f64 + 1.0)
	}
}
