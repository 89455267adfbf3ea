/*!
 * Monitoring
 * Tracing setup and wait spans for handoff consumers
 */

mod tracer;

pub use tracer::{init_tracing, WaitSpan};
