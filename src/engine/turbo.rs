//! TURBO mode: fused SIMD + scalar pipeline, parallel on large inputs.
//!
//! Requires the whole input as one contiguous buffer. Small inputs (or
//! machines without a usable pool) run a single pipeline pass; large inputs
//! are split at resolved boundaries and fanned out to the worker pool, then
//! the per-chunk outputs concatenate in input order. No stitching is needed
//! because every chunk starts and ends at a neutral parse position.

#[cfg(feature = "parallel")]
use crate::boundary;
#[cfg(feature = "parallel")]
use crate::chunk::{chunk_size, worker_count};
use crate::error::Error;
use crate::probe::Capabilities;
use crate::simd::Stripper;

use super::pipeline::Pipeline;
#[cfg(feature = "parallel")]
use super::pool::WorkerPool;

/// Inputs below this size are not worth splitting.
pub(crate) const PARALLEL_THRESHOLD: usize = 1024 * 1024;

/// Minify a contiguous buffer.
#[cfg(feature = "parallel")]
pub(crate) fn run_bytes(
    input: &[u8],
    stripper: &Stripper,
    pool: Option<&WorkerPool>,
    caps: Capabilities,
    out: &mut Vec<u8>,
) -> Result<(), Error> {
    if input.len() < PARALLEL_THRESHOLD {
        return run_serial(input, stripper, out);
    }
    let Some(pool) = pool else {
        // Pool init failed earlier: degrade to the single-threaded pass.
        return run_serial(input, stripper, out);
    };
    let workers = worker_count(input.len(), caps.logical_cpus);
    if workers < 2 {
        return run_serial(input, stripper, out);
    }

    let scan = boundary::scan(input);
    let Some(root) = scan.root() else {
        // Scalar root: nothing to split on.
        return run_serial(input, stripper, out);
    };

    let size = chunk_size(input.len(), workers);
    let mut cuts = vec![0usize];
    let mut last_cut = 0usize;
    let mut target = size;
    while target < input.len() {
        let cut = scan.resolve(target);
        if cut > last_cut {
            cuts.push(cut);
            last_cut = cut;
        }
        target += size;
    }
    cuts.push(input.len());

    if cuts.len() <= 2 {
        // No usable interior boundary (for instance one huge element).
        return run_serial(input, stripper, out);
    }

    let spans: Vec<_> = cuts.windows(2).map(|w| w[0]..w[1]).collect();
    let outputs = pool.dispatch(input, &spans, root, stripper)?;

    let total: usize = outputs.iter().map(Vec::len).sum();
    out.try_reserve(total).map_err(|_| Error::oom(0))?;
    for buf in &outputs {
        out.extend_from_slice(buf);
    }
    Ok(())
}

/// Without the `parallel` feature TURBO is the single-threaded SIMD pass.
#[cfg(not(feature = "parallel"))]
pub(crate) fn run_bytes(
    input: &[u8],
    stripper: &Stripper,
    _caps: Capabilities,
    out: &mut Vec<u8>,
) -> Result<(), Error> {
    run_serial(input, stripper, out)
}

fn run_serial(input: &[u8], stripper: &Stripper, out: &mut Vec<u8>) -> Result<(), Error> {
    out.try_reserve(input.len()).map_err(|_| Error::oom(0))?;
    let mut pipeline = Pipeline::new(stripper);
    pipeline.run(input, out)?;
    pipeline.finish()
}
