//! Canvas rendering for the service graph.
//!
//! Rendering uses multiple passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Edge lines, arrows and midpoint labels (world space)
//! 3. Non-highlighted nodes, then highlighted nodes on top

use std::f64::consts::{FRAC_PI_4, PI};

use force_graph::DefaultNodeIdx;
use web_sys::CanvasRenderingContext2d;

use super::icons::IconCache;
use super::scale::{ScaleConfig, ScaledValues};
use super::state::{EdgeInfo, ForceGraphState, NodeInfo};
use super::theme::{Color, HealthStyle, Theme};

/// Attempt to smooth values that would otherwise cause abrupt visual changes.
fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// Gradient stops for a node outline: success color up to the success ratio,
/// error color after it, with a hard edge between the two.
pub fn health_stops(success_ratio: f64, style: &HealthStyle) -> [(f64, Color); 4] {
	let split = (success_ratio / 100.0).clamp(0.0, 1.0);
	[
		(0.0, style.success),
		(split, style.success),
		(split, style.error),
		(1.0, style.error),
	]
}

/// Fill color of a node body: its category color, unmodified.
pub fn node_fill(info: &NodeInfo) -> Color {
	info.color
}

/// Geometry of the loop drawn for a service that calls itself.
///
/// The loop is a circle centered on the node's outline, up and to the right
/// of the node. The arrow tip sits where the loop re-enters the node, pointing
/// at the node center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelfLoop {
	/// Loop center.
	pub cx: f64,
	/// Loop center.
	pub cy: f64,
	/// Loop radius.
	pub radius: f64,
	/// Arrow tip on the node outline.
	pub tip_x: f64,
	/// Arrow tip on the node outline.
	pub tip_y: f64,
	/// Unit direction the arrow points in.
	pub ux: f64,
	/// Unit direction the arrow points in.
	pub uy: f64,
}

impl SelfLoop {
	/// Loop for a node at `(x, y)` drawn with `node_radius`.
	pub fn around(x: f64, y: f64, node_radius: f64) -> Self {
		let radius = node_radius * 0.6;
		let (cx, cy) = (
			x + node_radius * FRAC_PI_4.cos(),
			y - node_radius * FRAC_PI_4.sin(),
		);
		// Angle between loop center and intersection, seen from the node center.
		let spread = ((2.0 * node_radius * node_radius - radius * radius)
			/ (2.0 * node_radius * node_radius))
			.clamp(-1.0, 1.0)
			.acos();
		let angle = -FRAC_PI_4 + spread;
		let (cos, sin) = (angle.cos(), angle.sin());
		Self {
			cx,
			cy,
			radius,
			tip_x: x + node_radius * cos,
			tip_y: y + node_radius * sin,
			ux: -cos,
			uy: -sin,
		}
	}
}

/// Renders the complete graph to the canvas.
pub fn render(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	config: &ScaleConfig,
	theme: &Theme,
	icons: &IconCache,
) {
	let scale = ScaledValues::new(config, state.transform.k);

	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	draw_edges(state, ctx, &scale, theme);
	draw_nodes(state, ctx, &scale, theme, icons);

	ctx.restore();
}

/// Clears the canvas while no dataset has been loaded yet.
pub fn render_empty(ctx: &CanvasRenderingContext2d, width: f64, height: f64, theme: &Theme) {
	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, width, height);
}

fn draw_edges(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let max_t = smooth_step(state.highlight.max_intensity());

	let edge_alpha = |idx1: DefaultNodeIdx, idx2: DefaultNodeIdx| {
		let edge_t = smooth_step(state.highlight.edge_intensity(idx1, idx2));
		if edge_t > 0.01 {
			0.7 + 0.3 * edge_t
		} else if max_t > 0.01 {
			0.7 - 0.5 * max_t
		} else {
			0.7
		}
	};

	state.graph.visit_edges(|n1, n2, edge| {
		let alpha = edge_alpha(n1.index(), n2.index());
		draw_edge(ctx, scale, theme, n1, n2, &edge.user_data, alpha);
	});

	if state.self_calls.is_empty() {
		return;
	}
	state.graph.visit_nodes(|node| {
		let idx = node.index();
		for (_, info) in state.self_calls.iter().filter(|(caller, _)| *caller == idx) {
			draw_self_call(ctx, scale, theme, node, info, edge_alpha(idx, idx));
		}
	});
}

fn draw_edge(
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	n1: &force_graph::Node<NodeInfo>,
	n2: &force_graph::Node<NodeInfo>,
	info: &EdgeInfo,
	alpha: f64,
) {
	let (x1, y1, x2, y2) = (n1.x() as f64, n1.y() as f64, n2.x() as f64, n2.y() as f64);
	let (dx, dy) = (x2 - x1, y2 - y1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}

	let (ux, uy) = (dx / dist, dy / dist);
	let width = info.width.max(scale.min_edge_width);
	// Arrow head scales with line width.
	let arrow = scale.arrow_size + width * 1.5;

	ctx.set_stroke_style_str(&info.color.with_alpha(alpha).to_css());
	ctx.set_line_width(width);
	ctx.begin_path();
	ctx.move_to(x1 + ux * scale.node_radius, y1 + uy * scale.node_radius);
	ctx.line_to(
		x2 - ux * (scale.node_radius + arrow),
		y2 - uy * (scale.node_radius + arrow),
	);
	ctx.stroke();

	let (tip_x, tip_y) = (x2 - ux * scale.node_radius, y2 - uy * scale.node_radius);
	draw_arrow(ctx, tip_x, tip_y, ux, uy, arrow, info.color.with_alpha(alpha));
	draw_edge_label(
		ctx,
		scale,
		theme,
		&info.label,
		(x1 + x2) / 2.0,
		(y1 + y2) / 2.0 - width,
		alpha,
	);
}

fn draw_self_call(
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	node: &force_graph::Node<NodeInfo>,
	info: &EdgeInfo,
	alpha: f64,
) {
	let geometry = SelfLoop::around(node.x() as f64, node.y() as f64, scale.node_radius);
	let width = info.width.max(scale.min_edge_width);
	let arrow = scale.arrow_size + width * 1.5;
	let color = info.color.with_alpha(alpha);

	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(width);
	ctx.begin_path();
	let _ = ctx.arc(geometry.cx, geometry.cy, geometry.radius, 0.0, 2.0 * PI);
	ctx.stroke();

	draw_arrow(
		ctx,
		geometry.tip_x,
		geometry.tip_y,
		geometry.ux,
		geometry.uy,
		arrow,
		color,
	);
	draw_edge_label(
		ctx,
		scale,
		theme,
		&info.label,
		geometry.cx,
		geometry.cy - geometry.radius - width,
		alpha,
	);
}

/// Filled arrow head with its tip at `(tip_x, tip_y)`, pointing along `(ux, uy)`.
fn draw_arrow(
	ctx: &CanvasRenderingContext2d,
	tip_x: f64,
	tip_y: f64,
	ux: f64,
	uy: f64,
	size: f64,
	color: Color,
) {
	let (back_x, back_y) = (tip_x - ux * size, tip_y - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
	ctx.set_fill_style_str(&color.to_css());
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_edge_label(
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	text: &str,
	x: f64,
	y: f64,
	alpha: f64,
) {
	if scale.edge_label_alpha <= 0.0 {
		return;
	}
	ctx.set_global_alpha(scale.edge_label_alpha * alpha);
	ctx.set_fill_style_str(&theme.labels.edge.to_css());
	ctx.set_font(&scale.edge_label_font);
	ctx.set_text_align("center");
	let _ = ctx.fill_text(text, x, y);
	ctx.set_text_align("start");
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	icons: &IconCache,
) {
	let max_t = smooth_step(state.highlight.max_intensity());
	let has_highlight = max_t > 0.01;
	let (dim_alpha, dim_radius) = if has_highlight {
		(1.0 - 0.6 * max_t, 1.0 - 0.1 * max_t)
	} else {
		(1.0, 1.0)
	};

	// Pass 1: non-highlighted nodes
	state.graph.visit_nodes(|node| {
		if state.highlight.node_intensity(node.index()) > 0.001 {
			return;
		}
		draw_node(ctx, node, scale, theme, icons, dim_alpha, dim_radius);
	});

	// Pass 2: highlighted/transitioning nodes on top
	state.graph.visit_nodes(|node| {
		let idx = node.index();
		let node_t = state.highlight.node_intensity(idx);
		if node_t <= 0.001 {
			return;
		}

		let eased_t = smooth_step(node_t);
		let hover_t = smooth_step(state.highlight.hover_ring_intensity(idx));
		let highlight_radius = 1.0 + 0.1 * eased_t + 0.05 * hover_t;

		let alpha = dim_alpha + (1.0 - dim_alpha) * eased_t;
		let radius_mult = dim_radius + (highlight_radius - dim_radius) * eased_t;

		draw_node(ctx, node, scale, theme, icons, alpha, radius_mult);

		if hover_t > 0.01 {
			let (x, y) = (node.x() as f64, node.y() as f64);
			let radius = scale.node_radius * radius_mult;
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + scale.ring_offset, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(
				&node
					.data
					.user_data
					.color
					.with_alpha(0.8 * hover_t)
					.to_css(),
			);
			ctx.set_line_width(scale.ring_width);
			ctx.stroke();
		}
	});
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &force_graph::Node<NodeInfo>,
	scale: &ScaledValues,
	theme: &Theme,
	icons: &IconCache,
	alpha: f64,
	radius_mult: f64,
) {
	let (x, y) = (node.x() as f64, node.y() as f64);
	let info = &node.data.user_data;
	let radius = scale.node_radius * radius_mult;

	ctx.set_global_alpha(alpha);

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&node_fill(info).to_css());
	ctx.fill();

	let outline = ctx.create_linear_gradient(x - radius, y, x + radius, y);
	for (offset, color) in health_stops(info.success_ratio, &theme.health) {
		let _ = outline.add_color_stop(offset as f32, &color.to_css());
	}
	#[allow(deprecated)]
	ctx.set_stroke_style(&outline);
	ctx.set_line_width(theme.health.outline_width);
	ctx.stroke();

	if let Some(img) = icons.get(&info.kind) {
		let size = scale.icon_size * radius_mult;
		let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
			img,
			x - size / 2.0,
			y - size / 2.0,
			size,
			size,
		);
	}

	if scale.label_alpha > 0.0 {
		ctx.set_global_alpha(alpha * scale.label_alpha);
		ctx.set_font(&scale.label_font);
		let left = x + scale.label_offset;
		for (line, label) in info.lines.iter().enumerate() {
			ctx.set_fill_style_str(&label.color.to_css());
			let _ = ctx.fill_text(&label.text, left, y + scale.label_baseline(line));
		}
	}

	ctx.set_global_alpha(1.0);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn health_split_follows_success_ratio() {
		let style = Theme::default().health;
		let stops = health_stops(80.0, &style);
		assert_eq!(stops[1], (0.8, style.success));
		assert_eq!(stops[2], (0.8, style.error));
	}

	#[test]
	fn fully_healthy_outline_has_no_error_share() {
		let style = Theme::default().health;
		let stops = health_stops(100.0, &style);
		assert_eq!(stops[2].0, 1.0);
		assert_eq!(health_stops(-5.0, &style)[1].0, 0.0);
	}

	#[test]
	fn node_body_uses_the_category_color() {
		let info = NodeInfo {
			name: "A".into(),
			kind: "api".into(),
			color: Color::rgb(31, 119, 180),
			success_ratio: 100.0,
			lines: Vec::new(),
		};
		assert_eq!(node_fill(&info), Color::rgb(31, 119, 180));
	}

	#[test]
	fn self_loop_meets_the_node_outline() {
		let (x, y, r) = (10.0, -20.0, 30.0);
		let l = SelfLoop::around(x, y, r);
		let from_node = ((l.tip_x - x).powi(2) + (l.tip_y - y).powi(2)).sqrt();
		let from_loop = ((l.tip_x - l.cx).powi(2) + (l.tip_y - l.cy).powi(2)).sqrt();
		assert!((from_node - r).abs() < 1e-9);
		assert!((from_loop - l.radius).abs() < 1e-9);
		// Points back towards the node center.
		assert!((l.tip_x + l.ux * r - x).abs() < 1e-9);
		assert!((l.tip_y + l.uy * r - y).abs() < 1e-9);
		// Sits above the node.
		assert!(l.cy < y);
	}

	#[test]
	fn smooth_step_is_pinned_at_ends() {
		assert_eq!(smooth_step(0.0), 0.0);
		assert_eq!(smooth_step(1.0), 1.0);
		assert_eq!(smooth_step(0.5), 0.5);
	}
}
