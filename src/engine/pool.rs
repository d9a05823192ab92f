//! Parallel chunk dispatch for TURBO.
//!
//! A fixed-size worker pool built lazily at the first TURBO call and
//! retained by the facade for its lifetime. Dispatch is scoped: the calling
//! thread blocks at the scope barrier, workers pull tasks from the pool's
//! queue (work stealing comes with the pool and chunk oversubscription
//! absorbs imbalance). Workers only ever read the shared input slice and own
//! their output buffer; the barrier is the only synchronization.
//!
//! Cancellation is cooperative: the first worker to fail flips a shared
//! flag, chunks that have not started return immediately, and in-flight
//! chunks run to completion. Output order is chunk-index order regardless of
//! completion order.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Error;
use crate::scalar::Container;
use crate::simd::Stripper;

use super::pipeline::Pipeline;

/// Retained worker pool.
pub(crate) struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `threads` workers. `None` on pool-init failure; the
    /// caller degrades to a serial pass.
    pub fn build(threads: usize) -> Option<Self> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("jsonmin-worker-{i}"))
            .build()
            .ok()
            .map(|pool| Self { pool })
    }

    /// Run one pipeline per span and return the per-chunk outputs in span
    /// order. The first failing chunk (lowest index) decides the error.
    pub fn dispatch(
        &self,
        input: &[u8],
        spans: &[Range<usize>],
        root: Container,
        stripper: &Stripper,
    ) -> Result<Vec<Vec<u8>>, Error> {
        let last = spans.len() - 1;
        let cancelled = AtomicBool::new(false);
        let mut slots: Vec<Result<Vec<u8>, Error>> =
            spans.iter().map(|_| Ok(Vec::new())).collect();

        self.pool.scope(|scope| {
            for (index, (span, slot)) in spans.iter().zip(slots.iter_mut()).enumerate() {
                let cancelled = &cancelled;
                scope.spawn(move |_| {
                    if cancelled.load(Ordering::Relaxed) {
                        // Drained without execution after another chunk
                        // failed; the slot keeps its empty placeholder.
                        return;
                    }
                    let result =
                        run_chunk(input, span.clone(), index == 0, index == last, root, stripper);
                    if result.is_err() {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    *slot = result;
                });
            }
        });

        let mut outputs = Vec::with_capacity(slots.len());
        for slot in slots {
            outputs.push(slot?);
        }
        Ok(outputs)
    }
}

/// Minify one chunk into a freshly owned buffer. Chunk 0 starts at the
/// document root; later chunks resume one level inside the outermost
/// container, so their error offsets come out absolute.
fn run_chunk(
    input: &[u8],
    span: Range<usize>,
    first: bool,
    last: bool,
    root: Container,
    stripper: &Stripper,
) -> Result<Vec<u8>, Error> {
    let slice = &input[span.clone()];
    let mut out = Vec::new();
    // Output is never larger than the span.
    out.try_reserve(slice.len())
        .map_err(|_| Error::oom(span.start))?;

    let mut pipeline = if first {
        Pipeline::new(stripper)
    } else {
        Pipeline::resume(stripper, root, span.start)
    };
    pipeline.run(slice, &mut out)?;
    if last {
        pipeline.finish()?;
    } else {
        pipeline.finish_chunk()?;
    }
    Ok(out)
}
