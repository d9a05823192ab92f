//! x86_64 whitespace classification kernels.
//!
//! Three widths: SSE2 (16 bytes), AVX2 (32 bytes), and AVX-512BW (64 bytes
//! with native byte-compress via VBMI2). Each kernel compares the block
//! against the four whitespace bytes and against `"`/`\`, then collapses the
//! comparison results to bitmasks with `movemask` (or gets them natively as
//! `__mmask64` on AVX-512).
//!
//! # Safety
//!
//! Every function here is `#[target_feature]`-gated; callers must have
//! verified the feature at stripper construction time.

use core::arch::x86_64::*;

use super::BlockMasks;

/// Classify one 16-byte block with SSE2.
#[target_feature(enable = "sse2")]
pub(crate) unsafe fn classify_block_sse2(block: &[u8]) -> BlockMasks {
    debug_assert_eq!(block.len(), 16);
    let v = _mm_loadu_si128(block.as_ptr().cast());

    let ws = _mm_or_si128(
        _mm_or_si128(
            _mm_cmpeq_epi8(v, _mm_set1_epi8(b' ' as i8)),
            _mm_cmpeq_epi8(v, _mm_set1_epi8(b'\t' as i8)),
        ),
        _mm_or_si128(
            _mm_cmpeq_epi8(v, _mm_set1_epi8(b'\n' as i8)),
            _mm_cmpeq_epi8(v, _mm_set1_epi8(b'\r' as i8)),
        ),
    );
    let special = _mm_or_si128(
        _mm_cmpeq_epi8(v, _mm_set1_epi8(b'"' as i8)),
        _mm_cmpeq_epi8(v, _mm_set1_epi8(b'\\' as i8)),
    );

    BlockMasks {
        ws: _mm_movemask_epi8(ws) as u32 as u64,
        special: _mm_movemask_epi8(special) as u32 as u64,
    }
}

/// Classify one 32-byte block with AVX2.
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn classify_block_avx2(block: &[u8]) -> BlockMasks {
    debug_assert_eq!(block.len(), 32);
    let v = _mm256_loadu_si256(block.as_ptr().cast());

    let ws = _mm256_or_si256(
        _mm256_or_si256(
            _mm256_cmpeq_epi8(v, _mm256_set1_epi8(b' ' as i8)),
            _mm256_cmpeq_epi8(v, _mm256_set1_epi8(b'\t' as i8)),
        ),
        _mm256_or_si256(
            _mm256_cmpeq_epi8(v, _mm256_set1_epi8(b'\n' as i8)),
            _mm256_cmpeq_epi8(v, _mm256_set1_epi8(b'\r' as i8)),
        ),
    );
    let special = _mm256_or_si256(
        _mm256_cmpeq_epi8(v, _mm256_set1_epi8(b'"' as i8)),
        _mm256_cmpeq_epi8(v, _mm256_set1_epi8(b'\\' as i8)),
    );

    BlockMasks {
        ws: _mm256_movemask_epi8(ws) as u32 as u64,
        special: _mm256_movemask_epi8(special) as u32 as u64,
    }
}

/// Classify one 64-byte block with AVX-512BW. Comparison results come back
/// as `__mmask64` directly, no movemask needed.
#[target_feature(enable = "avx512f,avx512bw")]
pub(crate) unsafe fn classify_block_avx512(block: &[u8]) -> BlockMasks {
    debug_assert_eq!(block.len(), 64);
    let v = _mm512_loadu_epi8(block.as_ptr().cast());

    let ws = _mm512_cmpeq_epi8_mask(v, _mm512_set1_epi8(b' ' as i8))
        | _mm512_cmpeq_epi8_mask(v, _mm512_set1_epi8(b'\t' as i8))
        | _mm512_cmpeq_epi8_mask(v, _mm512_set1_epi8(b'\n' as i8))
        | _mm512_cmpeq_epi8_mask(v, _mm512_set1_epi8(b'\r' as i8));
    let special = _mm512_cmpeq_epi8_mask(v, _mm512_set1_epi8(b'"' as i8))
        | _mm512_cmpeq_epi8_mask(v, _mm512_set1_epi8(b'\\' as i8));

    BlockMasks { ws, special }
}

/// Append the bytes of `block` selected by `keep` to `out`, in order, using
/// the VBMI2 byte-compress store.
#[target_feature(enable = "avx512f,avx512bw,avx512vbmi2")]
pub(crate) unsafe fn compact_block_avx512(block: &[u8], keep: u64, out: &mut Vec<u8>) {
    debug_assert_eq!(block.len(), 64);
    let v = _mm512_loadu_epi8(block.as_ptr().cast());
    let kept = keep.count_ones() as usize;
    out.reserve(64);
    let len = out.len();
    // SAFETY: reserve guarantees 64 spare bytes; the compress store writes
    // exactly `kept` ≤ 64 bytes starting at the spare region.
    _mm512_mask_compressstoreu_epi8(out.as_mut_ptr().add(len).cast(), keep, v);
    out.set_len(len + kept);
}
