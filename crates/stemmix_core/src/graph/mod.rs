//! Filter graph generation for the render engine.
//!
//! Turns an ordered list of stems into a single `-filter_complex` description:
//!
//! ```text
//! [0:a] volume → aformat(stereo) → pan → effects ─[s0]─┐
//! [1:a] volume → aformat(stereo) → pan → effects ─[s1]─┼─ amix(longest) ─[out]
//! [2:a] ...                                       ─[s2]─┘
//! ```
//!
//! A single stem skips the mixing node and writes its chain straight to `[out]`.
//! Building is pure and deterministic: identical stems give byte-identical text.

mod builder;
mod pan;
mod types;

pub use builder::{build_filter_graph, FilterGraphBuilder, OUTPUT_LABEL};
pub use pan::pan_gains;
pub use types::{FilterGraph, GraphError, GraphResult};
