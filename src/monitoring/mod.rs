/*!
 * Monitoring Module
 * Structured tracing for guarded execution
 */

pub mod tracer;

pub use tracer::{init_tracing, init_tracing_with, UnitSpan};
