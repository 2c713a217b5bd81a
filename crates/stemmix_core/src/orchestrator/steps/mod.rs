//! Pipeline step implementations.
//!
//! One step per phase of a mix job: validate, (optionally) inspect,
//! build the graph, render.

mod build_graph;
mod inspect;
mod render;
mod validate;

pub use build_graph::BuildGraphStep;
pub use inspect::InspectStep;
pub use render::RenderStep;
pub use validate::ValidateStep;
