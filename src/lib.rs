//! # jsonmin
//!
//! High-throughput streaming JSON minifier.
//!
//! jsonmin consumes syntactically valid JSON bytes and emits the
//! semantically equivalent byte stream with all insignificant whitespace
//! removed. String literals (including escapes) and number literals pass
//! through byte-for-byte; only structural whitespace is dropped. It never
//! builds a tree, reformats numbers, reorders keys, or normalizes Unicode.
//!
//! ## Modes
//!
//! Three interchangeable execution strategies trade memory for throughput,
//! all guaranteed to produce identical output for identical input:
//!
//! - [`Mode::Eco`] - pure scalar state machine, constant memory (≤ 128 KiB
//!   regardless of input size).
//! - [`Mode::Sport`] - scalar machine with a √N intermediate buffer for
//!   fewer writer syscalls and hotter caches.
//! - [`Mode::Turbo`] - SIMD whitespace elimination (SSE2/AVX2/AVX-512/NEON,
//!   selected at runtime) plus a parallel chunk dispatcher on inputs above
//!   1 MiB. Needs the whole input as one contiguous buffer.
//!
//! ## Quick start
//!
//! ```
//! use jsonmin::{minify, Mode};
//!
//! let out = minify(br#"{ "a" : [ 1 , 2 ] }"#, Mode::Turbo).unwrap();
//! assert_eq!(out, br#"{"a":[1,2]}"#);
//! ```
//!
//! For repeated calls, keep a [`JsonMinifier`] around: it retains the probed
//! hardware capabilities, the worker pool, and scratch buffers across calls.
//!
//! ```
//! use jsonmin::{JsonMinifier, Mode};
//!
//! let mut minifier = JsonMinifier::new();
//! let mut out = Vec::new();
//! let stats = minifier
//!     .minify_stream(Mode::Eco, &mut &b"[ 1 , 2 ]"[..], &mut out)
//!     .unwrap();
//! assert_eq!(out, b"[1,2]");
//! assert_eq!(stats.bytes_out, 5);
//! ```
//!
//! ## Features
//!
//! - `simd` (default) - explicit vector intrinsics for whitespace
//!   elimination; without it the portable SWAR kernel runs everywhere.
//! - `parallel` (default) - the TURBO worker pool (rayon); without it TURBO
//!   degrades to a single-threaded SIMD pass.
//! - `cli` - the `jsonmin` command-line binary.

/// Chunk boundary resolution for parallel execution.
pub mod boundary;

/// Adaptive chunking policy.
pub mod chunk;

/// Byte classification tables.
pub mod classify;

/// Mode engines (ECO / SPORT / TURBO).
pub(crate) mod engine;

/// Typed failures with byte offsets.
pub mod error;

/// The mode dispatch facade.
pub mod facade;

/// Hardware capability probe.
pub mod probe;

/// The scalar minifying state machine, the correctness reference.
pub mod scalar;

/// SIMD whitespace elimination kernels.
pub mod simd;

// =============================================================================
// Public re-exports
// =============================================================================

pub use error::{Error, ErrorKind};
pub use facade::{minify, JsonMinifier, MinifyOptions, Mode, Stats};
pub use probe::{probe, Capabilities, SimdLevel};
pub use scalar::{ScalarMinifier, MAX_DEPTH};
pub use simd::Stripper;
