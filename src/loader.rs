//! Fetching the service document and keeping only the latest result.

use log::{info, warn};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::components::force_graph::{ServiceGraph, ServiceRecord};

/// Errors that can occur while loading the service document.
#[derive(Error, Debug)]
pub enum LoadError {
	/// Not running in a browser.
	#[error("no browser window available")]
	NoWindow,

	/// The request or body read was rejected.
	#[error("request failed: {0}")]
	Fetch(String),

	/// Non-2xx response.
	#[error("server answered with status {0}")]
	Status(u16),

	/// Body is not a valid service document.
	#[error("invalid service document: {0}")]
	Parse(#[from] serde_json::Error),
}

impl From<JsValue> for LoadError {
	fn from(value: JsValue) -> Self {
		LoadError::Fetch(
			value
				.as_string()
				.unwrap_or_else(|| format!("{:?}", value)),
		)
	}
}

/// Parse and shape a service document. Unresolved edges and duplicate names
/// are logged and otherwise ignored.
pub fn parse_service_graph(json: &str) -> Result<ServiceGraph, LoadError> {
	let records: Vec<ServiceRecord> = serde_json::from_str(json)?;
	let (graph, report) = ServiceGraph::from_records(&records);

	for (source, target) in &report.unresolved {
		warn!(
			"service-graph: dropping edge {} -> {}: unknown target",
			source, target
		);
	}
	for name in &report.duplicates {
		warn!("service-graph: duplicate service name {}", name);
	}
	info!(
		"service-graph: loaded {} services, {} edges",
		graph.nodes.len(),
		graph.edges.len()
	);
	Ok(graph)
}

/// Fetch the service document at `url` and shape it into a graph.
pub async fn fetch_service_graph(url: &str) -> Result<ServiceGraph, LoadError> {
	let window = web_sys::window().ok_or(LoadError::NoWindow)?;
	let response: Response = JsFuture::from(window.fetch_with_str(url))
		.await?
		.dyn_into()?;

	if !response.ok() {
		return Err(LoadError::Status(response.status()));
	}

	let body = JsFuture::from(response.text()?).await?;
	let text = body
		.as_string()
		.ok_or_else(|| LoadError::Fetch("response body is not text".to_string()))?;
	parse_service_graph(&text)
}

/// Hands out a ticket per load so that only the most recent load is applied.
///
/// A slow response for an older repulsion value must not replace the layout
/// started for a newer one.
#[derive(Clone, Debug, Default)]
pub struct ReloadTracker {
	latest: u64,
}

/// Identifies one load started by [`ReloadTracker::begin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
	/// Load id, carried into [`LayoutRequest::load`](crate::LayoutRequest).
	pub fn id(self) -> u64 {
		self.0
	}
}

impl ReloadTracker {
	/// Register a new load, superseding all earlier ones.
	pub fn begin(&mut self) -> Ticket {
		self.latest += 1;
		Ticket(self.latest)
	}

	/// Whether no load has started since `ticket`.
	pub fn is_current(&self, ticket: Ticket) -> bool {
		ticket.0 == self.latest
	}

	/// Number of loads started so far.
	pub fn loads(&self) -> u64 {
		self.latest
	}
}

/// Remembers the last load id that was laid out.
///
/// The canvas asks [`AppliedLoad::accept`] before restarting the simulation,
/// so a load delivered twice only restarts the layout once and an older load
/// never replaces a newer one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppliedLoad(Option<u64>);

impl AppliedLoad {
	/// Record `load` as applied. Returns `false` if it (or a newer one) was
	/// applied already.
	pub fn accept(&mut self, load: u64) -> bool {
		match self.0 {
			Some(last) if load <= last => false,
			_ => {
				self.0 = Some(load);
				true
			}
		}
	}

	/// Id of the load currently laid out.
	pub fn current(&self) -> Option<u64> {
		self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn each_change_starts_exactly_one_load() {
		let mut tracker = ReloadTracker::default();
		for i in 1..=3 {
			let ticket = tracker.begin();
			assert_eq!(tracker.loads(), i);
			assert_eq!(ticket.id(), i);
		}
	}

	#[test]
	fn only_latest_ticket_is_applied() {
		let mut tracker = ReloadTracker::default();
		let first = tracker.begin();
		assert!(tracker.is_current(first));
		let second = tracker.begin();
		assert!(!tracker.is_current(first));
		assert!(tracker.is_current(second));
	}

	#[test]
	fn same_load_restarts_the_layout_once() {
		let mut tracker = ReloadTracker::default();
		let mut applied = AppliedLoad::default();
		let mut restarts = 0;

		let first = tracker.begin();
		for _ in 0..2 {
			if applied.accept(first.id()) {
				restarts += 1;
			}
		}
		assert_eq!(restarts, 1);

		let second = tracker.begin();
		assert!(applied.accept(second.id()));
		assert_eq!(applied.current(), Some(second.id()));
		assert!(!applied.accept(first.id()));
	}

	#[test]
	fn repulsion_changes_yield_one_layout_each() {
		let mut tracker = ReloadTracker::default();
		let mut applied = AppliedLoad::default();
		let mut layouts = Vec::new();

		// Each response arrives before the next change; the data effect may
		// fire more than once per delivered load.
		for _ in 0..3 {
			let ticket = tracker.begin();
			for _ in 0..2 {
				if tracker.is_current(ticket) && applied.accept(ticket.id()) {
					layouts.push(ticket.id());
				}
			}
		}
		assert_eq!(layouts, vec![1, 2, 3]);
	}

	#[test]
	fn stale_responses_are_not_laid_out() {
		let mut tracker = ReloadTracker::default();
		let mut applied = AppliedLoad::default();
		let mut layouts = Vec::new();

		// Three quick commits; responses arrive out of order.
		let tickets: Vec<Ticket> = (0..3).map(|_| tracker.begin()).collect();
		for ticket in [tickets[0], tickets[2], tickets[1]] {
			if tracker.is_current(ticket) && applied.accept(ticket.id()) {
				layouts.push(ticket.id());
			}
		}
		assert_eq!(tracker.loads(), 3);
		assert_eq!(layouts, vec![3]);
	}

	#[test]
	fn parse_rejects_invalid_documents() {
		assert!(matches!(
			parse_service_graph("{\"name\": 1}"),
			Err(LoadError::Parse(_))
		));
		assert!(matches!(parse_service_graph("not json"), Err(LoadError::Parse(_))));
	}

	#[test]
	fn parse_drops_unknown_targets() {
		let graph = parse_service_graph(
			r#"[{"name": "A", "type": "api", "invocations": 1,
				"edges": [{"target": "B", "invocations": 1, "latency": 2}]}]"#,
		)
		.unwrap();
		assert_eq!(graph.nodes.len(), 1);
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn errors_read_well() {
		assert_eq!(
			LoadError::Status(404).to_string(),
			"server answered with status 404"
		);
	}
}
