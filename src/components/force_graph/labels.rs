//! Text lines drawn next to each service node.

use std::fmt;

use super::theme::{Color, LabelStyle};
use super::types::ServiceNode;

/// What a label line describes. Shown as the heading of the hover card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailKind {
	/// Identity and placement: name, port, namespace, cluster.
	Service,
	/// Traffic counters and derived ratios.
	Metrics,
}

impl DetailKind {
	/// Lowercase name, used in CSS classes and the card heading.
	pub fn as_str(self) -> &'static str {
		match self {
			DetailKind::Service => "service",
			DetailKind::Metrics => "metrics",
		}
	}
}

impl fmt::Display for DetailKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One line of a node label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelLine {
	/// Rendered text.
	pub text: String,
	/// Fill color.
	pub color: Color,
	/// Category shown in the hover card.
	pub kind: DetailKind,
}

impl LabelLine {
	fn new(text: String, color: Color, kind: DetailKind) -> Self {
		Self { text, color, kind }
	}
}

/// Build the label lines for a node, top to bottom.
pub fn label_lines(node: &ServiceNode, style: &LabelStyle) -> Vec<LabelLine> {
	use DetailKind::{Metrics, Service};

	vec![
		LabelLine::new(format!("Service: {}", node.name), style.service, Service),
		LabelLine::new(format!("Port: {}", node.port), style.port, Service),
		LabelLine::new(
			format!("Namespace: {}", node.namespace),
			style.namespace,
			Service,
		),
		LabelLine::new(format!("Cluster: {}", node.cluster), style.cluster, Service),
		LabelLine::new(
			format!("Invocations: {}", node.invocations),
			style.invocations,
			Metrics,
		),
		LabelLine::new(format!("Errors: {}", node.errors), style.errors, Metrics),
		LabelLine::new(
			format!("Success: {:.1}%", node.success_ratio),
			style.success,
			Metrics,
		),
	]
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::theme::Theme;

	fn node() -> ServiceNode {
		ServiceNode {
			name: "checkout".into(),
			kind: "api".into(),
			port: "8080".into(),
			namespace: "shop".into(),
			cluster: "eu-west".into(),
			invocations: 10,
			errors: 2,
			success_ratio: 80.0,
		}
	}

	#[test]
	fn lines_cover_identity_then_metrics() {
		let lines = label_lines(&node(), &Theme::default().labels);
		let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
		assert_eq!(
			texts,
			[
				"Service: checkout",
				"Port: 8080",
				"Namespace: shop",
				"Cluster: eu-west",
				"Invocations: 10",
				"Errors: 2",
				"Success: 80.0%",
			]
		);
		assert!(lines[..4].iter().all(|l| l.kind == DetailKind::Service));
		assert!(lines[4..].iter().all(|l| l.kind == DetailKind::Metrics));
	}

	#[test]
	fn kinds_render_lowercase() {
		assert_eq!(DetailKind::Service.to_string(), "service");
		assert_eq!(DetailKind::Metrics.to_string(), "metrics");
	}
}
