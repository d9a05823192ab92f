//! aarch64 NEON whitespace classification kernel.
//!
//! NEON has no movemask; the 16-lane comparison result is viewed as two u64
//! halves and each half collapses to bits with the shared broadword helper.

use core::arch::aarch64::*;

use super::{swar, BlockMasks};

/// Classify one 16-byte block with NEON.
#[target_feature(enable = "neon")]
pub(crate) unsafe fn classify_block_neon(block: &[u8]) -> BlockMasks {
    debug_assert_eq!(block.len(), 16);
    let v = vld1q_u8(block.as_ptr());

    let ws = vorrq_u8(
        vorrq_u8(
            vceqq_u8(v, vdupq_n_u8(b' ')),
            vceqq_u8(v, vdupq_n_u8(b'\t')),
        ),
        vorrq_u8(
            vceqq_u8(v, vdupq_n_u8(b'\n')),
            vceqq_u8(v, vdupq_n_u8(b'\r')),
        ),
    );
    let special = vorrq_u8(
        vceqq_u8(v, vdupq_n_u8(b'"')),
        vceqq_u8(v, vdupq_n_u8(b'\\')),
    );

    BlockMasks {
        ws: mask_bits(ws),
        special: mask_bits(special),
    }
}

/// Collapse a 0xFF-per-matching-lane vector to one bit per byte.
#[target_feature(enable = "neon")]
#[inline]
unsafe fn mask_bits(mask: uint8x16_t) -> u64 {
    let halves = vreinterpretq_u64_u8(mask);
    let low = vgetq_lane_u64(halves, 0);
    let high = vgetq_lane_u64(halves, 1);
    swar::lane_mask_to_bits(low) | swar::lane_mask_to_bits(high) << 8
}
