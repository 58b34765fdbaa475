//! Leptos component wrapping the service graph canvas.
//!
//! The component creates an HTML canvas element and wires up mouse/wheel event
//! handlers for node dragging, panning, zooming and label hovering. A single
//! animation loop runs via `requestAnimationFrame` for the lifetime of the
//! canvas; every new dataset replaces the simulation state it draws.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::hover_card::HoverCard;
use super::icons::IconCache;
use super::render;
use super::scale::ScaleConfig;
use super::state::{ForceGraphState, HoverDetail};
use super::theme::Theme;
use super::types::LayoutRequest;
use crate::config::LayoutConfig;
use crate::loader::AppliedLoad;

/// Bundles graph simulation state with visual configuration (scaling, theme, icons).
struct GraphContext {
	state: Option<ForceGraphState>,
	scale: ScaleConfig,
	theme: Theme,
	icons: IconCache,
	layout: LayoutConfig,
	applied: AppliedLoad,
	width: f64,
	height: f64,
}

impl GraphContext {
	/// Replace the running simulation with a fresh one for `request`, unless
	/// that load has already been laid out.
	fn apply(&mut self, request: &LayoutRequest) {
		if !self.applied.accept(request.load) {
			return;
		}
		let graph = &request.graph;
		self.icons
			.preload(graph.nodes.iter().map(|n| n.kind.as_str()));
		let state = ForceGraphState::new(
			graph,
			self.width,
			self.height,
			request.repulsion,
			&self.layout,
			&self.theme,
		);
		info!(
			"service-graph: layout {} started with {} nodes, {} edges, repulsion {}",
			request.load,
			state.node_count(),
			state.edge_count(),
			state.repulsion
		);
		self.state = Some(state);
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Pointer position relative to the canvas' top-left corner.
fn canvas_position(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	ev: &MouseEvent,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Renders an interactive service graph on a canvas element.
///
/// `data` starts out `None` until the first load completes; each new load
/// restarts the layout with the repulsion it was requested for. The component sizes
/// itself to its parent container by default; set `fullscreen = true` to fill
/// the viewport and resize automatically with the window.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<Option<LayoutRequest>>,
	#[prop(optional)] layout: LayoutConfig,
	#[prop(into, default = "/icons".to_string())] icon_base: String,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let hover = RwSignal::new(None::<HoverDetail>);
	let context: Rc<RefCell<Option<GraphContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if context_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			return;
		};

		let mut graph_context = GraphContext {
			state: None,
			scale: ScaleConfig::default(),
			theme: Theme::default(),
			icons: IconCache::new(icon_base.clone()),
			layout: layout.clone(),
			applied: AppliedLoad::default(),
			width: w,
			height: h,
		};
		// A load may have finished before the canvas was mounted.
		if let Some(request) = data.get_untracked() {
			graph_context.apply(&request);
		}
		*context_init.borrow_mut() = Some(graph_context);

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.width = nw;
					c.height = nh;
					if let Some(ref mut s) = c.state {
						s.resize(nw, nh);
					}
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				match c.state {
					Some(ref mut s) => {
						if s.animation_running {
							s.tick(0.016);
						}
						render::render(s, &ctx, &c.scale, &c.theme, &c.icons);
					}
					None => render::render_empty(&ctx, c.width, c.height, &c.theme),
				}
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Restart the layout whenever a new dataset arrives.
	let context_data = context.clone();
	Effect::new(move |_| {
		let Some(request) = data.get() else {
			return;
		};
		match *context_data.borrow_mut() {
			Some(ref mut c) => {
				c.apply(&request);
				hover.set(None);
			}
			None => debug!("service-graph: canvas not mounted yet, deferring layout"),
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_position(canvas_ref, &ev) else {
			return;
		};

		if let Some(GraphContext {
			state: Some(ref mut s),
			ref scale,
			..
		}) = *context_md.borrow_mut()
		{
			if let Some(idx) = s.node_at_position(x, y, scale) {
				s.drag.active = true;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_position(canvas_ref, &ev) else {
			return;
		};

		if let Some(GraphContext {
			state: Some(ref mut s),
			ref scale,
			..
		}) = *context_mm.borrow_mut()
		{
			// Update hover state when not dragging
			if !s.drag.active && !s.pan.active {
				let label = s.label_line_at_position(x, y, scale);
				let detail = label.as_ref().and_then(|hit| s.hover_detail(hit, x, y));
				let hovered = label
					.map(|hit| hit.node)
					.or_else(|| s.node_at_position(x, y, scale));
				s.set_hover(hovered);
				if detail.is_some() || hover.with_untracked(Option::is_some) {
					hover.set(detail);
				}
			}

			if s.drag.active {
				if let Some(idx) = s.drag.node_idx {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					let (nx, ny) = (
						s.drag.node_start_x + dx as f32,
						s.drag.node_start_y + dy as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(GraphContext {
			state: Some(ref mut s),
			..
		}) = *context_mu.borrow_mut()
		{
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(GraphContext {
			state: Some(ref mut s),
			..
		}) = *context_ml.borrow_mut()
		{
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.set_hover(None);
		}
		hover.set(None);
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_position(canvas_ref, &ev) else {
			return;
		};

		if let Some(GraphContext {
			state: Some(ref mut s),
			..
		}) = *context_wh.borrow_mut()
		{
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
		hover.set(None);
	};

	view! {
		<div class="force-graph" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<HoverCard detail=hover />
		</div>
	}
}
