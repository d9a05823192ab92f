//! Mode engines.
//!
//! Three strategies over the same primitives: ECO (constant memory, pure
//! scalar), SPORT (scalar with a √N intermediate buffer), TURBO (fused
//! SIMD + scalar pipeline, parallel above a size threshold). All three
//! produce byte-identical output for identical input.

pub(crate) mod eco;
pub(crate) mod pipeline;
#[cfg(feature = "parallel")]
pub(crate) mod pool;
pub(crate) mod sport;
pub(crate) mod turbo;
