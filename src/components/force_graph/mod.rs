//! Force-directed service graph component.
//!
//! Renders services and their calls on an HTML canvas with:
//! - Physics-based node positioning via force simulation, re-centered each step
//! - Health outlines, category icons and multi-line labels per service
//! - Traffic-weighted edges with arrow heads and latency labels
//! - Hover cards for label lines, pan, zoom and node dragging
//!
//! # Example
//!
//! ```ignore
//! use service_graph::{ForceGraphCanvas, LayoutRequest, ServiceGraph};
//!
//! let records = serde_json::from_str(json)?;
//! let (graph, _report) = ServiceGraph::from_records(&records);
//! let request = LayoutRequest { graph, repulsion: -100.0, load: 1 };
//!
//! view! { <ForceGraphCanvas data=Signal::derive(move || Some(request.clone())) fullscreen=true /> }
//! ```

mod component;
mod hover_card;
mod icons;
/// Node label lines.
pub mod labels;
mod render;
/// Zoom-dependent sizes.
pub mod scale;
mod state;
/// Colors.
pub mod theme;
mod types;

pub use component::ForceGraphCanvas;
pub use labels::DetailKind;
pub use state::HoverDetail;
pub use theme::Theme;
pub use types::{
	EdgeRecord, LayoutRequest, ServiceEdge, ServiceGraph, ServiceNode, ServiceRecord, ShapeReport,
	success_ratio,
};
