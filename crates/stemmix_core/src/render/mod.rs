//! Render engine invocation.
//!
//! Owns the lifecycle of the external render subprocess:
//!
//! 1. Assemble arguments in the order the engine requires
//!    (inputs, graph, map, sample rate, codec flags, destination)
//! 2. Spawn the engine with stderr piped and stdout discarded
//! 3. Accumulate stderr while waiting for exit, cancellation or timeout
//! 4. Classify the result and verify the output file
//!
//! No retries happen here: a failed render is deterministic for the same
//! binary and arguments.

mod args;
mod cancel;
mod invoker;
mod types;

pub use args::{format_args_pretty, RenderArgsBuilder, DEFAULT_MP3_BITRATE};
pub use cancel::CancelHandle;
pub use invoker::RenderInvoker;
pub use types::{RenderError, RenderOutput, RenderResult};
