//! Service graph data: raw records as served by the data endpoint, and the
//! shaped graph the force graph component consumes.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// An outbound call edge as it appears in the source document.
#[derive(Clone, Debug, Deserialize)]
pub struct EdgeRecord {
	/// Name of the called service.
	pub target: String,
	/// Calls made along this edge.
	#[serde(default)]
	pub invocations: u64,
	/// Mean latency in milliseconds.
	#[serde(default)]
	pub latency: f64,
}

/// A service as it appears in the source document.
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceRecord {
	/// Unique service name. Edges refer to services by this name.
	pub name: String,
	/// Service category (e.g. "database"). Selects color and icon.
	#[serde(rename = "type")]
	pub kind: String,
	/// Listening port. Accepts either a JSON number or a string.
	#[serde(default, deserialize_with = "string_or_number")]
	pub port: String,
	/// Deployment namespace.
	#[serde(default)]
	pub namespace: String,
	/// Cluster the service runs in.
	#[serde(default)]
	pub cluster: String,
	/// Calls received.
	#[serde(default)]
	pub invocations: u64,
	/// Failed invocations.
	#[serde(default)]
	pub errors: Option<u64>,
	/// Older spelling of `errors`, used only when `errors` is absent.
	#[serde(default)]
	pub error: Option<u64>,
	/// Outbound calls.
	#[serde(default)]
	pub edges: Vec<EdgeRecord>,
}

impl ServiceRecord {
	/// Failed invocations, preferring `errors` over the legacy `error` key.
	pub fn error_count(&self) -> u64 {
		self.errors.or(self.error).unwrap_or(0)
	}
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(deserializer)? {
		Value::String(s) => s,
		Value::Null => String::new(),
		other => other.to_string(),
	})
}

/// Percentage of invocations that did not fail, in `[0, 100]`.
///
/// A service that was never invoked counts as fully successful.
pub fn success_ratio(invocations: u64, errors: u64) -> f64 {
	if invocations == 0 {
		return 100.0;
	}
	let ok = invocations.saturating_sub(errors) as f64;
	(ok / invocations as f64 * 100.0).clamp(0.0, 100.0)
}

/// A service node with derived metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceNode {
	/// Unique service name.
	pub name: String,
	/// Service category.
	pub kind: String,
	/// Listening port as text, empty when unknown.
	pub port: String,
	/// Deployment namespace.
	pub namespace: String,
	/// Cluster the service runs in.
	pub cluster: String,
	/// Calls received.
	pub invocations: u64,
	/// Failed calls.
	pub errors: u64,
	/// See [`success_ratio`].
	pub success_ratio: f64,
}

impl ServiceNode {
	fn from_record(record: &ServiceRecord) -> Self {
		Self {
			name: record.name.clone(),
			kind: record.kind.clone(),
			port: record.port.clone(),
			namespace: record.namespace.clone(),
			cluster: record.cluster.clone(),
			invocations: record.invocations,
			errors: record.error_count(),
			success_ratio: success_ratio(record.invocations, record.error_count()),
		}
	}
}

/// A directed call between two nodes, endpoints given as indices into
/// [`ServiceGraph::nodes`].
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceEdge {
	/// Calling node.
	pub source: usize,
	/// Called node.
	pub target: usize,
	/// Calls made along this edge.
	pub invocations: u64,
	/// Mean latency in milliseconds.
	pub latency_ms: f64,
}

impl ServiceEdge {
	/// Stroke width in world units, the square root of the invocation count.
	pub fn line_width(&self) -> f64 {
		(self.invocations as f64).sqrt()
	}

	/// Whether the service calls itself.
	pub fn is_self_call(&self) -> bool {
		self.source == self.target
	}

	/// Midpoint caption, e.g. `Invocations: 5, Latency: 20ms`.
	pub fn label(&self) -> String {
		format!(
			"Invocations: {}, Latency: {}ms",
			self.invocations, self.latency_ms
		)
	}
}

/// Problems found while shaping records into a graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeReport {
	/// `(source, target)` names of edges whose target is not a known service.
	pub unresolved: Vec<(String, String)>,
	/// Names that appeared more than once. The first occurrence wins.
	pub duplicates: Vec<String>,
}

impl ShapeReport {
	/// True when nothing had to be dropped.
	pub fn is_clean(&self) -> bool {
		self.unresolved.is_empty() && self.duplicates.is_empty()
	}
}

/// Complete shaped graph: nodes and resolved edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceGraph {
	/// One node per distinct service name.
	pub nodes: Vec<ServiceNode>,
	/// Calls whose target resolved.
	pub edges: Vec<ServiceEdge>,
}

impl ServiceGraph {
	/// Derive node metrics and resolve every edge target by name.
	pub fn from_records(records: &[ServiceRecord]) -> (Self, ShapeReport) {
		let mut report = ShapeReport::default();
		let mut nodes = Vec::with_capacity(records.len());
		// Records that became a node, paired with that node's index.
		let mut kept = Vec::with_capacity(records.len());
		let mut index: HashMap<&str, usize> = HashMap::with_capacity(records.len());
		for record in records {
			if index.contains_key(record.name.as_str()) {
				report.duplicates.push(record.name.clone());
				continue;
			}
			index.insert(record.name.as_str(), nodes.len());
			kept.push((record, nodes.len()));
			nodes.push(ServiceNode::from_record(record));
		}

		let mut edges = Vec::new();
		for (record, source) in kept {
			for edge in &record.edges {
				match index.get(edge.target.as_str()) {
					Some(&target) => edges.push(ServiceEdge {
						source,
						target,
						invocations: edge.invocations,
						latency_ms: edge.latency,
					}),
					None => report
						.unresolved
						.push((record.name.clone(), edge.target.clone())),
				}
			}
		}

		(Self { nodes, edges }, report)
	}

	/// Calling service of `edge`.
	pub fn source_of(&self, edge: &ServiceEdge) -> &ServiceNode {
		&self.nodes[edge.source]
	}

	/// Called service of `edge`.
	pub fn target_of(&self, edge: &ServiceEdge) -> &ServiceNode {
		&self.nodes[edge.target]
	}
}

/// A shaped graph together with the layout parameters it was loaded for.
///
/// `load` identifies the fetch that produced it; the canvas lays out each
/// load exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutRequest {
	/// The shaped graph.
	pub graph: ServiceGraph,
	/// Many-body strength, negative repels.
	pub repulsion: f64,
	/// Id of the load that produced this request.
	pub load: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(json: &str) -> Vec<ServiceRecord> {
		serde_json::from_str(json).unwrap()
	}

	const SAMPLE: &str = r#"[
		{"name": "A", "type": "api", "port": 8080, "namespace": "default",
		 "cluster": "east", "invocations": 10, "errors": 2,
		 "edges": [{"target": "B", "invocations": 5, "latency": 20}]},
		{"name": "B", "type": "database", "port": "5432", "namespace": "data",
		 "cluster": "east", "invocations": 0, "edges": []}
	]"#;

	#[test]
	fn sample_graph_matches_expected_metrics() {
		let (graph, report) = ServiceGraph::from_records(&parse(SAMPLE));
		assert!(report.is_clean());
		assert_eq!(graph.nodes[0].success_ratio, 80.0);
		assert_eq!(graph.nodes[1].success_ratio, 100.0);

		let edge = &graph.edges[0];
		assert!((edge.line_width() - 2.236).abs() < 1e-3);
		assert_eq!(edge.label(), "Invocations: 5, Latency: 20ms");
	}

	#[test]
	fn edge_endpoints_resolve_to_declared_names() {
		let records = parse(SAMPLE);
		let (graph, _) = ServiceGraph::from_records(&records);
		for edge in &graph.edges {
			assert_eq!(graph.source_of(edge).name, records[edge.source].name);
			let declared: Vec<&str> = records[edge.source]
				.edges
				.iter()
				.map(|e| e.target.as_str())
				.collect();
			assert!(declared.contains(&graph.target_of(edge).name.as_str()));
		}
	}

	#[test]
	fn port_accepts_numbers_and_strings() {
		let (graph, _) = ServiceGraph::from_records(&parse(SAMPLE));
		assert_eq!(graph.nodes[0].port, "8080");
		assert_eq!(graph.nodes[1].port, "5432");
	}

	#[test]
	fn error_alias_is_accepted() {
		let records = parse(r#"[{"name": "A", "type": "api", "invocations": 4, "error": 1}]"#);
		assert_eq!(records[0].error_count(), 1);
		let (graph, _) = ServiceGraph::from_records(&records);
		assert_eq!(graph.nodes[0].success_ratio, 75.0);
	}

	#[test]
	fn errors_key_wins_over_legacy_error_key() {
		let records = parse(
			r#"[{"name": "A", "type": "api", "invocations": 10, "errors": 4, "error": 1}]"#,
		);
		let (graph, _) = ServiceGraph::from_records(&records);
		assert_eq!(graph.nodes[0].errors, 4);
		assert_eq!(graph.nodes[0].success_ratio, 60.0);
	}

	#[test]
	fn missing_error_keys_count_as_zero() {
		let records = parse(r#"[{"name": "A", "type": "api", "invocations": 3}]"#);
		assert_eq!(records[0].error_count(), 0);
	}

	#[test]
	fn success_ratio_stays_in_range() {
		assert_eq!(success_ratio(0, 0), 100.0);
		assert_eq!(success_ratio(0, 7), 100.0);
		assert_eq!(success_ratio(5, 9), 0.0);
		assert_eq!(success_ratio(3, 3), 0.0);
		assert_eq!(success_ratio(200, 50), 75.0);
	}

	#[test]
	fn unresolved_targets_are_dropped_and_reported() {
		let records = parse(
			r#"[{"name": "A", "type": "api", "edges": [
				{"target": "ghost", "invocations": 1, "latency": 1},
				{"target": "A", "invocations": 2, "latency": 3}
			]}]"#,
		);
		let (graph, report) = ServiceGraph::from_records(&records);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(
			report.unresolved,
			vec![("A".to_string(), "ghost".to_string())]
		);
	}

	#[test]
	fn first_duplicate_wins() {
		let records = parse(
			r#"[
				{"name": "A", "type": "api", "edges": [{"target": "B"}]},
				{"name": "B", "type": "api"},
				{"name": "B", "type": "cache"}
			]"#,
		);
		let (graph, report) = ServiceGraph::from_records(&records);
		assert_eq!(report.duplicates, vec!["B".to_string()]);
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[1].kind, "api");
		assert_eq!(graph.edges[0].target, 1);
	}

	#[test]
	fn self_calls_resolve_to_the_caller() {
		let records = parse(
			r#"[{"name": "A", "type": "api", "edges": [{"target": "A", "invocations": 2}]}]"#,
		);
		let (graph, report) = ServiceGraph::from_records(&records);
		assert!(report.is_clean());
		assert!(graph.edges[0].is_self_call());
	}

	#[test]
	fn line_width_grows_with_traffic() {
		let widths: Vec<f64> = [0, 1, 4, 9, 100]
			.into_iter()
			.map(|n| {
				ServiceEdge {
					source: 0,
					target: 0,
					invocations: n,
					latency_ms: 0.0,
				}
				.line_width()
			})
			.collect();
		assert!(widths.windows(2).all(|w| w[0] < w[1]));
		assert_eq!(widths[3], 3.0);
	}

	#[test]
	fn fractional_latency_is_kept() {
		let edge = ServiceEdge {
			source: 0,
			target: 0,
			invocations: 3,
			latency_ms: 12.5,
		};
		assert_eq!(edge.label(), "Invocations: 3, Latency: 12.5ms");
	}
}
