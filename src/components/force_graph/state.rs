//! Graph simulation state and interaction tracking.
//!
//! Wraps the `force_graph` physics simulation with per-service metadata, view
//! transforms for pan/zoom, and highlight state for hover effects with smooth
//! intensity transitions.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};

use super::labels::{DetailKind, LabelLine, label_lines};
use super::scale::{ScaleConfig, ScaledValues};
use super::theme::{CategoryPalette, Color, Theme};
use super::types::ServiceGraph;
use crate::config::LayoutConfig;

/// Per-node display metadata attached to each node in the simulation.
#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub name: String,
	/// Service category, used to pick the icon.
	pub kind: String,
	pub color: Color,
	/// Percentage of successful invocations, drives the outline gradient.
	pub success_ratio: f64,
	pub lines: Vec<LabelLine>,
}

/// Per-edge display metadata.
#[derive(Clone, Debug)]
pub struct EdgeInfo {
	/// Stroke width in world units.
	pub width: f64,
	pub label: String,
	/// Inherited from the source node's category.
	pub color: Color,
}

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.1..10.0).
	pub k: f64,
}

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Manages smooth highlight transitions with per-node intensity tracking.
///
/// Each node has its own intensity value (0.0 to 1.0) that animates towards 1
/// while the node is hovered or adjacent to the hovered node, and decays
/// towards 0 afterwards. A short hold time keeps a highlight from flashing
/// when the pointer only grazes a node.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	/// Currently hovered node (if any)
	pub hovered_node: Option<DefaultNodeIdx>,
	/// Hovered node plus its neighbors
	target_set: HashSet<DefaultNodeIdx>,
	/// Nodes not in this map have intensity 0.
	node_intensity: HashMap<DefaultNodeIdx, f64>,
	hover_ring_intensity: HashMap<DefaultNodeIdx, f64>,
	/// Time remaining before fade-out can begin
	hold_timer: HashMap<DefaultNodeIdx, f64>,
	cached_max: f64,
}

/// Minimum time (seconds) a highlight is held before it can fade out.
const MIN_HOLD_TIME: f64 = 0.12;

impl HighlightState {
	/// Update the hovered node and recompute the target highlight set.
	pub fn set_hover(
		&mut self,
		node: Option<DefaultNodeIdx>,
		edges: &[(DefaultNodeIdx, DefaultNodeIdx)],
	) {
		if self.hovered_node == node {
			return;
		}

		self.hovered_node = node;
		self.target_set.clear();

		if let Some(idx) = node {
			self.target_set.insert(idx);
			for &(src, tgt) in edges {
				if src == idx {
					self.target_set.insert(tgt);
				} else if tgt == idx {
					self.target_set.insert(src);
				}
			}

			for &idx in &self.target_set {
				self.hold_timer.insert(idx, MIN_HOLD_TIME);
			}
		}
	}

	/// Animate all node intensities towards their targets using exponential smoothing.
	///
	/// value += (target - value) * (1 - e^(-speed * dt))
	pub fn tick(&mut self, dt: f64) {
		const FADE_IN_SPEED: f64 = 6.0; // ~150ms to 95%
		const FADE_OUT_SPEED: f64 = 4.0; // ~250ms to 95%

		let fade_in_factor = 1.0 - (-FADE_IN_SPEED * dt).exp();
		let fade_out_decay = (-FADE_OUT_SPEED * dt).exp();

		for &idx in &self.target_set {
			let intensity = self.node_intensity.entry(idx).or_insert(0.0);
			*intensity += (1.0 - *intensity) * fade_in_factor;
		}

		if let Some(idx) = self.hovered_node {
			let intensity = self.hover_ring_intensity.entry(idx).or_insert(0.0);
			*intensity += (1.0 - *intensity) * fade_in_factor;
		}

		let mut new_max: f64 = 0.0;

		self.hold_timer.retain(|idx, timer| {
			if self.target_set.contains(idx) {
				true
			} else {
				*timer -= dt;
				*timer > 0.0
			}
		});

		self.node_intensity.retain(|idx, intensity| {
			if self.target_set.contains(idx) {
				new_max = new_max.max(*intensity);
				true
			} else {
				let hold_remaining = self.hold_timer.get(idx).copied().unwrap_or(0.0);
				if hold_remaining <= 0.0 {
					*intensity *= fade_out_decay;
				}
				new_max = new_max.max(*intensity);
				*intensity > 0.005
			}
		});

		self.hover_ring_intensity.retain(|idx, intensity| {
			if self.hovered_node == Some(*idx) {
				true
			} else {
				let hold_remaining = self.hold_timer.get(idx).copied().unwrap_or(0.0);
				if hold_remaining <= 0.0 {
					*intensity *= fade_out_decay;
				}
				*intensity > 0.005
			}
		});

		self.cached_max = new_max;
	}

	pub fn node_intensity(&self, idx: DefaultNodeIdx) -> f64 {
		self.node_intensity.get(&idx).copied().unwrap_or(0.0)
	}

	pub fn hover_ring_intensity(&self, idx: DefaultNodeIdx) -> f64 {
		self.hover_ring_intensity.get(&idx).copied().unwrap_or(0.0)
	}

	/// Geometric mean of the endpoint intensities.
	pub fn edge_intensity(&self, idx1: DefaultNodeIdx, idx2: DefaultNodeIdx) -> f64 {
		(self.node_intensity(idx1) * self.node_intensity(idx2)).sqrt()
	}

	/// Maximum intensity of any node, used to dim everything else.
	pub fn max_intensity(&self) -> f64 {
		self.cached_max
	}
}

/// A label line under the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelHit {
	pub node: DefaultNodeIdx,
	pub line: usize,
}

/// Content of the floating detail card.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverDetail {
	/// Owning service.
	pub service: String,
	/// The hovered line, verbatim.
	pub text: String,
	/// Whether the line describes the service or its metrics.
	pub kind: DetailKind,
	/// Pointer x, relative to the canvas.
	pub x: f64,
	/// Pointer y, relative to the canvas.
	pub y: f64,
}

/// Core graph state combining physics simulation with interaction and highlight tracking.
///
/// Built from scratch for every loaded dataset, then mutated each frame by the
/// animation loop. The `tick` method advances the physics simulation, pulls
/// the layout back to the origin and animates highlight intensities.
pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, EdgeInfo>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub highlight: HighlightState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	/// Repulsion strength this layout was started with.
	pub repulsion: f64,
	/// Calls from a service to itself. `force_graph` cannot hold an edge
	/// whose endpoints coincide, so these are drawn but never simulated.
	pub self_calls: Vec<(DefaultNodeIdx, EdgeInfo)>,
	centering: f32,
	edges: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
}

impl ForceGraphState {
	pub fn new(
		data: &ServiceGraph,
		width: f64,
		height: f64,
		repulsion: f64,
		layout: &LayoutConfig,
		theme: &Theme,
	) -> Self {
		let mut graph = ForceGraph::new(layout.simulation(repulsion));
		let mut palette = CategoryPalette::category10();
		let mut indices = Vec::with_capacity(data.nodes.len());
		let mut edges = Vec::with_capacity(data.edges.len());
		let mut self_calls = Vec::new();

		let ring = layout.initial_spacing * data.nodes.len().max(1) as f64 / PI;
		for (i, node) in data.nodes.iter().enumerate() {
			let angle = (i as f64) * 2.0 * PI / data.nodes.len() as f64;
			let idx = graph.add_node(NodeData {
				x: (ring * angle.cos()) as f32,
				y: (ring * angle.sin()) as f32,
				mass: layout.node_mass,
				is_anchor: false,
				user_data: NodeInfo {
					name: node.name.clone(),
					kind: node.kind.clone(),
					color: palette.color_for(&node.kind),
					success_ratio: node.success_ratio,
					lines: label_lines(node, &theme.labels),
				},
			});
			indices.push(idx);
		}

		for edge in &data.edges {
			let (src, tgt) = (indices[edge.source], indices[edge.target]);
			let info = EdgeInfo {
				width: edge.line_width(),
				label: edge.label(),
				color: palette.color_for(&data.nodes[edge.source].kind),
			};
			if edge.is_self_call() {
				self_calls.push((src, info));
			} else {
				graph.add_edge(src, tgt, EdgeData { user_data: info });
			}
			edges.push((src, tgt));
		}

		Self {
			graph,
			edges,
			self_calls,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			highlight: HighlightState::default(),
			width,
			height,
			animation_running: true,
			repulsion,
			centering: layout.centering,
		}
	}

	/// Number of services in the simulation.
	pub fn node_count(&self) -> usize {
		let mut count = 0;
		self.graph.visit_nodes(|_| count += 1);
		count
	}

	/// Number of calls, self-calls included.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(
		&self,
		sx: f64,
		sy: f64,
		config: &ScaleConfig,
	) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let scale = ScaledValues::new(config, self.transform.k);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if (dx * dx + dy * dy).sqrt() < scale.node_radius {
				found = Some(node.index());
			}
		});
		found
	}

	/// Find the label line under a screen position.
	///
	/// Line boxes span from one font size above the baseline to a quarter
	/// below it; widths are estimated from the character count. Hidden labels
	/// (zoomed far out) are never hit.
	pub fn label_line_at_position(
		&self,
		sx: f64,
		sy: f64,
		config: &ScaleConfig,
	) -> Option<LabelHit> {
		let scale = ScaledValues::new(config, self.transform.k);
		if scale.label_alpha <= 0.0 {
			return None;
		}
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let advance = scale.label_size * config.label.char_width;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let left = node.x() as f64 + scale.label_offset;
			if gx < left {
				return;
			}
			for (line, label) in node.data.user_data.lines.iter().enumerate() {
				let baseline = node.y() as f64 + scale.label_baseline(line);
				let right = left + label.text.chars().count() as f64 * advance;
				if gx <= right
					&& gy >= baseline - scale.label_size
					&& gy <= baseline + scale.label_size * 0.25
				{
					found = Some(LabelHit {
						node: node.index(),
						line,
					});
				}
			}
		});
		found
	}

	/// Card content for a label hit, positioned at the given screen point.
	pub fn hover_detail(&self, hit: &LabelHit, sx: f64, sy: f64) -> Option<HoverDetail> {
		let mut detail = None;
		self.graph.visit_nodes(|node| {
			if node.index() != hit.node {
				return;
			}
			let info = &node.data.user_data;
			detail = info.lines.get(hit.line).map(|line| HoverDetail {
				service: info.name.clone(),
				text: line.text.clone(),
				kind: line.kind,
				x: sx,
				y: sy,
			});
		});
		detail
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		self.highlight.set_hover(node, &self.edges);
	}

	/// Advance physics, recentering and highlight fades by `dt` seconds.
	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.recenter();
		self.highlight.tick(dt as f64);
	}

	/// Move the centroid of the free nodes towards the world origin.
	fn recenter(&mut self) {
		let (mut sum_x, mut sum_y, mut free) = (0.0f32, 0.0f32, 0usize);
		self.graph.visit_nodes(|node| {
			if !node.data.is_anchor {
				sum_x += node.x();
				sum_y += node.y();
				free += 1;
			}
		});
		if free == 0 {
			return;
		}
		let (shift_x, shift_y) = (
			sum_x / free as f32 * self.centering,
			sum_y / free as f32 * self.centering,
		);
		self.graph.visit_nodes_mut(|node| {
			if !node.data.is_anchor {
				node.data.x -= shift_x;
				node.data.y -= shift_y;
			}
		});
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		// Keep the origin at the viewport center.
		self.transform.x += (width - self.width) / 2.0;
		self.transform.y += (height - self.height) / 2.0;
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::ServiceRecord;

	fn sample() -> ServiceGraph {
		let records: Vec<ServiceRecord> = serde_json::from_str(
			r#"[
				{"name": "A", "type": "api", "port": 80, "namespace": "n", "cluster": "c",
				 "invocations": 10, "errors": 2,
				 "edges": [{"target": "B", "invocations": 5, "latency": 20}]},
				{"name": "B", "type": "db", "port": 5432, "namespace": "n", "cluster": "c",
				 "invocations": 0},
				{"name": "C", "type": "api", "port": 81, "namespace": "n", "cluster": "c",
				 "invocations": 4, "edges": [{"target": "A", "invocations": 1, "latency": 3}]}
			]"#,
		)
		.unwrap();
		ServiceGraph::from_records(&records).0
	}

	fn state() -> ForceGraphState {
		ForceGraphState::new(
			&sample(),
			800.0,
			600.0,
			-100.0,
			&LayoutConfig::default(),
			&Theme::default(),
		)
	}

	fn position_of(state: &ForceGraphState, name: &str) -> (f64, f64) {
		let mut pos = None;
		state.graph.visit_nodes(|node| {
			if node.data.user_data.name == name {
				pos = Some((node.x() as f64, node.y() as f64));
			}
		});
		pos.unwrap()
	}

	fn index_of(state: &ForceGraphState, name: &str) -> DefaultNodeIdx {
		let mut idx = None;
		state.graph.visit_nodes(|node| {
			if node.data.user_data.name == name {
				idx = Some(node.index());
			}
		});
		idx.unwrap()
	}

	/// Spread nodes far apart so label boxes cannot overlap.
	fn spread(state: &mut ForceGraphState) {
		let spots = [("A", 0.0, 0.0), ("B", -400.0, 0.0), ("C", 400.0, 300.0)];
		state.graph.visit_nodes_mut(|node| {
			for (name, x, y) in spots {
				if node.data.user_data.name == name {
					node.data.x = x;
					node.data.y = y;
				}
			}
		});
	}

	/// Screen position of a world point under the current transform.
	fn to_screen(state: &ForceGraphState, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * state.transform.k + state.transform.x,
			gy * state.transform.k + state.transform.y,
		)
	}

	fn with_self_call() -> ServiceGraph {
		let records: Vec<ServiceRecord> = serde_json::from_str(
			r#"[
				{"name": "A", "type": "api", "invocations": 6,
				 "edges": [{"target": "A", "invocations": 4, "latency": 1},
				           {"target": "B", "invocations": 2, "latency": 5}]},
				{"name": "B", "type": "db"}
			]"#,
		)
		.unwrap();
		let (graph, report) = ServiceGraph::from_records(&records);
		assert!(report.is_clean());
		graph
	}

	#[test]
	fn self_calling_service_can_be_simulated() {
		let mut s = ForceGraphState::new(
			&with_self_call(),
			800.0,
			600.0,
			-100.0,
			&LayoutConfig::default(),
			&Theme::default(),
		);
		for _ in 0..5 {
			s.tick(0.016);
		}
		assert_eq!(s.edge_count(), 2);
		assert_eq!(s.self_calls.len(), 1);
		let (idx, info) = &s.self_calls[0];
		assert_eq!(*idx, index_of(&s, "A"));
		assert_eq!(info.label, "Invocations: 4, Latency: 1ms");

		let mut simulated = 0;
		s.graph.visit_edges(|n1, n2, _| {
			assert_ne!(n1.index(), n2.index());
			simulated += 1;
		});
		assert_eq!(simulated, 1);
	}

	#[test]
	fn hovering_a_self_caller_highlights_its_neighbors() {
		let mut s = ForceGraphState::new(
			&with_self_call(),
			800.0,
			600.0,
			-100.0,
			&LayoutConfig::default(),
			&Theme::default(),
		);
		s.set_hover(Some(index_of(&s, "A")));
		s.tick(0.1);
		assert!(s.highlight.node_intensity(index_of(&s, "A")) > 0.0);
		assert!(s.highlight.node_intensity(index_of(&s, "B")) > 0.0);
	}

	#[test]
	fn builds_one_simulation_node_per_service() {
		let s = state();
		assert_eq!(s.node_count(), 3);
		assert_eq!(s.edge_count(), 2);
		assert_eq!(s.repulsion, -100.0);
	}

	#[test]
	fn edges_carry_source_category_color_and_width() {
		let s = state();
		let mut seen = Vec::new();
		s.graph.visit_edges(|n1, _, edge| {
			seen.push((
				n1.data.user_data.color,
				edge.user_data.color,
				edge.user_data.width,
			));
		});
		for (source_color, edge_color, width) in seen {
			assert_eq!(source_color, edge_color);
			assert!(width > 0.0);
		}
	}

	#[test]
	fn same_category_shares_a_color() {
		let s = state();
		let mut colors = HashMap::new();
		s.graph.visit_nodes(|node| {
			colors.insert(node.data.user_data.name.clone(), node.data.user_data.color);
		});
		assert_eq!(colors["A"], colors["C"]);
		assert_ne!(colors["A"], colors["B"]);
	}

	#[test]
	fn layout_stays_centered_on_origin() {
		let mut s = state();
		for _ in 0..30 {
			s.tick(0.016);
		}
		let (mut cx, mut cy) = (0.0, 0.0);
		for name in ["A", "B", "C"] {
			let (x, y) = position_of(&s, name);
			cx += x / 3.0;
			cy += y / 3.0;
		}
		assert!(cx.abs() < 1e-2, "centroid x drifted to {cx}");
		assert!(cy.abs() < 1e-2, "centroid y drifted to {cy}");
	}

	#[test]
	fn node_hit_uses_circle_radius() {
		let mut s = state();
		spread(&mut s);
		let (x, y) = position_of(&s, "B");
		let (sx, sy) = to_screen(&s, x, y);
		let config = ScaleConfig::default();
		assert_eq!(s.node_at_position(sx + 10.0, sy, &config), Some(index_of(&s, "B")));
	}

	#[test]
	fn label_hit_finds_line_and_detail() {
		let mut s = state();
		spread(&mut s);
		let config = ScaleConfig::default();
		let scale = ScaledValues::new(&config, s.transform.k);
		let (x, y) = position_of(&s, "A");

		// Just above the baseline of the fifth line ("Invocations: 10").
		let gx = x + scale.label_offset + 4.0;
		let gy = y + scale.label_baseline(4) - 2.0;
		let (sx, sy) = to_screen(&s, gx, gy);

		let hit = s.label_line_at_position(sx, sy, &config).unwrap();
		assert_eq!(hit, LabelHit { node: index_of(&s, "A"), line: 4 });

		let detail = s.hover_detail(&hit, sx, sy).unwrap();
		assert_eq!(detail.service, "A");
		assert_eq!(detail.text, "Invocations: 10");
		assert_eq!(detail.kind, DetailKind::Metrics);
	}

	#[test]
	fn label_hit_misses_left_of_label() {
		let mut s = state();
		spread(&mut s);
		let config = ScaleConfig::default();
		let (x, y) = position_of(&s, "A");
		let (sx, sy) = to_screen(&s, x, y + 18.0);
		assert_eq!(s.label_line_at_position(sx, sy, &config), None);
	}

	#[test]
	fn hidden_labels_cannot_be_hovered() {
		let mut s = state();
		spread(&mut s);
		s.transform.k = 0.1;
		let config = ScaleConfig::default();
		let scale = ScaledValues::new(&config, s.transform.k);
		let (x, y) = position_of(&s, "A");
		let (sx, sy) = to_screen(&s, x + scale.label_offset + 1.0, y + scale.label_baseline(0) - 1.0);
		assert_eq!(s.label_line_at_position(sx, sy, &config), None);
	}

	#[test]
	fn hover_highlights_neighbors_only() {
		let mut s = state();
		let (a, b, c) = (index_of(&s, "A"), index_of(&s, "B"), index_of(&s, "C"));
		s.set_hover(Some(b));
		s.tick(0.1);
		assert!(s.highlight.node_intensity(b) > 0.0);
		assert!(s.highlight.node_intensity(a) > 0.0);
		assert_eq!(s.highlight.node_intensity(c), 0.0);
	}

	#[test]
	fn highlight_fades_after_hold_time() {
		let mut s = state();
		let b = index_of(&s, "B");
		s.set_hover(Some(b));
		s.tick(0.1);
		s.set_hover(None);
		for _ in 0..200 {
			s.tick(0.016);
		}
		assert_eq!(s.highlight.node_intensity(b), 0.0);
		assert_eq!(s.highlight.max_intensity(), 0.0);
	}

	#[test]
	fn resize_keeps_origin_centered() {
		let mut s = state();
		s.transform.x += 15.0;
		s.resize(1000.0, 700.0);
		assert_eq!(s.transform.x, 515.0);
		assert_eq!(s.transform.y, 350.0);
	}
}
