//! UI components.

/// Layout controls.
pub mod controls;
/// The service graph canvas.
pub mod force_graph;
