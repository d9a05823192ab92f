//! Adaptive chunking policy for parallel execution.
//!
//! Chooses a chunk size that oversubscribes the worker pool enough to absorb
//! imbalance while keeping each chunk large enough to amortize per-chunk
//! overhead and small enough to stay cache-friendly.

/// Minimum chunk size; smaller chunks pay more in dispatch overhead than the
/// parallelism returns.
pub const MIN_CHUNK: usize = 256 * 1024;

/// Maximum chunk size, keeping per-worker working sets L2/L3-friendly.
pub const MAX_CHUNK: usize = 16 * 1024 * 1024;

/// How many chunks to aim for per worker.
pub const OVERSUBSCRIPTION: usize = 3;

/// Pick a chunk size for `input_len` bytes across `workers` workers.
pub fn chunk_size(input_len: usize, workers: usize) -> usize {
    if input_len <= MIN_CHUNK {
        return input_len.max(1);
    }
    (input_len / (OVERSUBSCRIPTION * workers.max(1))).clamp(MIN_CHUNK, MAX_CHUNK)
}

/// Pick a worker count for `input_len` bytes given the machine's logical CPU
/// count. Never exceeds one worker per minimum-sized chunk.
pub fn worker_count(input_len: usize, logical_cpus: u32) -> usize {
    let by_size = input_len.div_ceil(MIN_CHUNK).max(1);
    (logical_cpus as usize).min(by_size).max(1)
}
