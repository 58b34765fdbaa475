//! service-graph: Interactive force-directed visualization of services.
//!
//! This crate provides a WASM-based view of services and the calls between
//! them: physics-based layout, health-colored nodes, traffic-weighted edges,
//! adjustable repulsion and hover cards for label details.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use log::{Level, debug, error, info};

/// UI components.
pub mod components;
/// Application configuration.
pub mod config;
/// Fetching and load bookkeeping.
pub mod loader;

pub use components::controls::RepulsionSlider;
pub use components::force_graph::{
	ForceGraphCanvas, LayoutRequest, ServiceEdge, ServiceGraph, ServiceNode, ServiceRecord,
};
pub use config::GraphConfig;
pub use loader::{AppliedLoad, LoadError, ReloadTracker};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("service-graph: logging initialized");
}

/// Main application component.
///
/// Fetches the service document on mount and again for every committed
/// repulsion change, then hands the latest result to the canvas.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = GraphConfig::default();
	let repulsion = RwSignal::new(config.repulsion.default);
	let layout = RwSignal::new(None::<LayoutRequest>);
	let load_error = RwSignal::new(None::<String>);
	let tracker = StoredValue::new(ReloadTracker::default());

	let data_url = config.data_url.clone();
	Effect::new(move |_| {
		let strength = repulsion.get();
		let mut started = None;
		tracker.update_value(|t| started = Some(t.begin()));
		let Some(ticket) = started else {
			return;
		};
		let url = data_url.clone();
		debug!("service-graph: load {} for repulsion {}", ticket.id(), strength);

		spawn_local(async move {
			let result = loader::fetch_service_graph(&url).await;
			if !tracker.with_value(|t| t.is_current(ticket)) {
				debug!("service-graph: discarding stale load {}", ticket.id());
				return;
			}
			match result {
				Ok(graph) => {
					load_error.set(None);
					layout.set(Some(LayoutRequest {
						graph,
						repulsion: strength,
						load: ticket.id(),
					}));
				}
				Err(e) => {
					error!("service-graph: failed to load {}: {}", url, e);
					load_error.set(Some(e.to_string()));
				}
			}
		});
	});

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />
		<Title text="Service Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<ForceGraphCanvas
				data=layout
				layout=config.layout.clone()
				icon_base=config.icon_base.clone()
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>"Service Graph"</h1>
				<p class="subtitle">"Hover a label for details. Drag nodes to reposition. Scroll to zoom."</p>
				<RepulsionSlider value=repulsion range=config.repulsion.clone() />
				{move || load_error.get().map(|e| view! { <p class="load-error">{e}</p> })}
			</div>
		</div>
	}
}
