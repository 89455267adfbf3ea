/*!
 * Core Module
 * Handoff primitives, error types, and limits
 */

pub mod errors;
pub mod limits;
pub mod sync;

// Re-export for convenience
pub use errors::*;
