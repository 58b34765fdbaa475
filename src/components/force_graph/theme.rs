//! Visual theming for the service graph.
//!
//! Provides the category palette, health colors for node outlines and label
//! line colors.

use std::collections::HashMap;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Opacity in `0.0..=1.0`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Same color at a different opacity.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// CSS color string, hex when opaque.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Ordinal color scale over a fixed palette.
///
/// Categories receive palette entries in order of first appearance and keep
/// them for the lifetime of the scale. Past the end of the palette, colors
/// repeat.
#[derive(Clone, Debug)]
pub struct CategoryPalette {
	colors: Vec<Color>,
	assigned: HashMap<String, usize>,
}

impl CategoryPalette {
	/// The ten-color categorical palette familiar from most charting tools.
	pub fn category10() -> Self {
		Self {
			colors: vec![
				Color::rgb(31, 119, 180),  // Blue
				Color::rgb(255, 127, 14),  // Orange
				Color::rgb(44, 160, 44),   // Green
				Color::rgb(214, 39, 40),   // Red
				Color::rgb(148, 103, 189), // Purple
				Color::rgb(140, 86, 75),   // Brown
				Color::rgb(227, 119, 194), // Pink
				Color::rgb(127, 127, 127), // Gray
				Color::rgb(188, 189, 34),  // Olive
				Color::rgb(23, 190, 207),  // Cyan
			],
			assigned: HashMap::new(),
		}
	}

	/// Color for a category, assigning the next palette entry on first use.
	pub fn color_for(&mut self, category: &str) -> Color {
		let next = self.assigned.len();
		let slot = *self.assigned.entry(category.to_string()).or_insert(next);
		self.colors[slot % self.colors.len()]
	}
}

/// Colors of the two-stop node outline gradient.
#[derive(Clone, Debug)]
pub struct HealthStyle {
	/// Share of the outline covering successful invocations.
	pub success: Color,
	/// Share of the outline covering failed invocations.
	pub error: Color,
	/// Outline width in world units.
	pub outline_width: f64,
}

/// Colors of each node label line.
#[derive(Clone, Debug)]
pub struct LabelStyle {
	/// Service name line.
	pub service: Color,
	/// Port line.
	pub port: Color,
	/// Namespace line.
	pub namespace: Color,
	/// Cluster line.
	pub cluster: Color,
	/// Invocations line.
	pub invocations: Color,
	/// Errors line.
	pub errors: Color,
	/// Success percentage line.
	pub success: Color,
	/// Text color of the midpoint edge labels.
	pub edge: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Canvas fill behind the graph.
	pub background: Color,
	/// Node outline colors.
	pub health: HealthStyle,
	/// Label line and edge caption colors.
	pub labels: LabelStyle,
}

impl Theme {
	/// White canvas with saturated label colors (default)
	pub fn light() -> Self {
		Self {
			background: Color::rgb(255, 255, 255),
			health: HealthStyle {
				success: Color::rgb(0, 128, 0),
				error: Color::rgb(255, 0, 0),
				outline_width: 2.0,
			},
			labels: LabelStyle {
				service: Color::rgb(0, 0, 0),
				port: Color::rgb(0, 0, 255),
				namespace: Color::rgb(128, 0, 128),
				cluster: Color::rgb(255, 165, 0),
				invocations: Color::rgb(0, 100, 0),
				errors: Color::rgb(220, 20, 60),
				success: Color::rgb(0, 128, 128),
				edge: Color::rgb(68, 68, 68),
			},
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::light()
	}
}
