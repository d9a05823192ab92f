//! SIMD-accelerated whitespace elimination.
//!
//! The stripper processes runs of bytes known to be *outside* any string
//! literal. Per block it builds two masks: whitespace bytes, and the
//! special bytes `"`/`\`. It then compacts the non-whitespace bytes to the
//! output. A block containing a special byte is cut short: the stripper
//! consumes and emits only the prefix before the earliest special byte, and
//! the caller resumes with the scalar machine so string and escape context
//! stays tracked.
//!
//! Kernel selection happens once at construction from the probed
//! [`SimdLevel`]; there is no per-byte dispatch. On hardware (or builds)
//! without vector intrinsics the portable SWAR kernel is used.
//!
//! Invariant, checked by the tests below: on input free of `"` and `\`, the
//! stripper's output equals the scalar machine's output byte for byte.

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub(crate) mod neon;
pub(crate) mod swar;
#[cfg(all(target_arch = "x86_64", feature = "simd"))]
pub(crate) mod x86;

use crate::probe::SimdLevel;

/// Per-block classification masks, bit `i` describing byte `i`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockMasks {
    /// Bytes that are insignificant whitespace.
    pub ws: u64,
    /// Bytes that are `"` or `\`; the stripper must stop before these.
    pub special: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kernel {
    Swar,
    #[cfg(all(target_arch = "x86_64", feature = "simd"))]
    Sse2,
    #[cfg(all(target_arch = "x86_64", feature = "simd"))]
    Avx2,
    #[cfg(all(target_arch = "x86_64", feature = "simd"))]
    Avx512,
    #[cfg(all(target_arch = "aarch64", feature = "simd"))]
    Neon,
}

/// Block-wise whitespace eliminator.
#[derive(Debug, Clone, Copy)]
pub struct Stripper {
    kernel: Kernel,
    width: usize,
}

impl Stripper {
    /// Select a kernel for the probed vector level. Levels the build cannot
    /// use fall back to SWAR.
    pub fn new(level: SimdLevel) -> Self {
        match level {
            #[cfg(all(target_arch = "x86_64", feature = "simd"))]
            SimdLevel::V128 => Self {
                kernel: Kernel::Sse2,
                width: 16,
            },
            #[cfg(all(target_arch = "x86_64", feature = "simd"))]
            SimdLevel::V256 => Self {
                kernel: Kernel::Avx2,
                width: 32,
            },
            #[cfg(all(target_arch = "x86_64", feature = "simd"))]
            SimdLevel::V512 => Self {
                kernel: Kernel::Avx512,
                width: 64,
            },
            #[cfg(all(target_arch = "aarch64", feature = "simd"))]
            SimdLevel::Neon => Self {
                kernel: Kernel::Neon,
                width: 16,
            },
            _ => Self {
                kernel: Kernel::Swar,
                width: swar::WIDTH,
            },
        }
    }

    /// Block width in bytes of the selected kernel.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Classify one block of exactly [`width`](Self::width) bytes.
    #[inline]
    pub(crate) fn classify_block(&self, block: &[u8]) -> BlockMasks {
        match self.kernel {
            Kernel::Swar => swar::classify_block(block),
            // SAFETY: kernel selection verified the feature at construction.
            #[cfg(all(target_arch = "x86_64", feature = "simd"))]
            Kernel::Sse2 => unsafe { x86::classify_block_sse2(block) },
            #[cfg(all(target_arch = "x86_64", feature = "simd"))]
            Kernel::Avx2 => unsafe { x86::classify_block_avx2(block) },
            #[cfg(all(target_arch = "x86_64", feature = "simd"))]
            Kernel::Avx512 => unsafe { x86::classify_block_avx512(block) },
            #[cfg(all(target_arch = "aarch64", feature = "simd"))]
            Kernel::Neon => unsafe { neon::classify_block_neon(block) },
        }
    }

    /// Append the bytes of `block` selected by `keep` to `out`, in input
    /// order.
    #[inline]
    pub(crate) fn compact_block(&self, block: &[u8], keep: u64, out: &mut Vec<u8>) {
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        if self.kernel == Kernel::Avx512 {
            // SAFETY: kernel selection verified avx512bw + vbmi2.
            unsafe { x86::compact_block_avx512(block, keep, out) };
            return;
        }
        let mut bits = keep;
        while bits != 0 {
            let i = bits.trailing_zeros() as usize;
            out.push(block[i]);
            bits &= bits - 1;
        }
    }

    /// Strip whitespace from a run of bytes outside any string context,
    /// appending kept bytes to `out`.
    ///
    /// Returns the number of input bytes consumed. The run stops before the
    /// first `"` or `\`, and before a tail shorter than one block; the
    /// caller finishes those with the scalar machine.
    pub fn strip_run(&self, input: &[u8], out: &mut Vec<u8>) -> usize {
        let w = self.width;
        let full = ones(w);
        let mut pos = 0;
        while pos + w <= input.len() {
            let block = &input[pos..pos + w];
            let m = self.classify_block(block);
            if m.special != 0 {
                let stop = m.special.trailing_zeros() as usize;
                let keep = !m.ws & below(stop);
                self.compact_block(block, keep, out);
                return pos + stop;
            }
            let keep = !m.ws & full;
            if keep == full {
                out.extend_from_slice(block);
            } else {
                self.compact_block(block, keep, out);
            }
            pos += w;
        }
        pos
    }
}

/// The low `width` bits set.
#[inline]
pub(crate) fn ones(width: usize) -> u64 {
    u64::MAX >> (64 - width)
}

/// Bits below position `stop` set.
#[inline]
pub(crate) fn below(stop: usize) -> u64 {
    (1u64 << stop) - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::is_whitespace;
    use crate::scalar::ScalarMinifier;

    fn available_levels() -> Vec<SimdLevel> {
        #[allow(unused_mut)]
        let mut levels = vec![SimdLevel::None];
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        {
            if is_x86_feature_detected!("sse2") {
                levels.push(SimdLevel::V128);
            }
            if is_x86_feature_detected!("avx2") {
                levels.push(SimdLevel::V256);
            }
            if is_x86_feature_detected!("avx512bw") && is_x86_feature_detected!("avx512vbmi2") {
                levels.push(SimdLevel::V512);
            }
        }
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        levels.push(SimdLevel::Neon);
        levels
    }

    /// Strip to completion, finishing specials and tails byte by byte.
    fn strip_all(stripper: &Stripper, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut pos = 0;
        while pos < input.len() {
            let consumed = stripper.strip_run(&input[pos..], &mut out);
            if consumed == 0 {
                let b = input[pos];
                if !is_whitespace(b) {
                    out.push(b);
                }
                pos += 1;
            } else {
                pos += consumed;
            }
        }
        out
    }

    #[test]
    fn test_output_matches_scalar_machine_without_strings() {
        // The testable eliminator invariant: on quote-free, backslash-free
        // valid input, stripper output equals the scalar reference output.
        let inputs: &[&[u8]] = &[
            b"[ 1 , 2.5 ,\t[ true , null ] ,\r\n -3e8 , false ]",
            b"[[[ 1 ], [ 2 ]], 3,    4,5  ,  6 ]",
            b"   [ 10 ]   ",
        ];
        for level in available_levels() {
            let stripper = Stripper::new(level);
            for input in inputs {
                let mut machine = ScalarMinifier::new();
                let mut want = Vec::new();
                machine.feed(input, &mut want).unwrap();
                machine.finish().unwrap();
                assert_eq!(
                    strip_all(&stripper, input),
                    want,
                    "level {:?} on {:?}",
                    level,
                    String::from_utf8_lossy(input)
                );
            }
        }
    }

    #[test]
    fn test_stops_before_quote() {
        for level in available_levels() {
            let stripper = Stripper::new(level);
            let input = b"[ 12345 , \"abcdefghijklmnopqrstuvwxyz0123456789\" ]";
            let mut out = Vec::new();
            let consumed = stripper.strip_run(input, &mut out);
            // Never consumes the quote at index 10 or anything after it.
            assert!(consumed <= 10, "level {:?} consumed {}", level, consumed);
            assert!(!out.contains(&b'"'));
            // Whatever was consumed kept only non-whitespace bytes.
            let want: Vec<u8> = input[..consumed]
                .iter()
                .copied()
                .filter(|&b| !is_whitespace(b))
                .collect();
            assert_eq!(out, want);
        }
    }

    #[test]
    fn test_stops_before_backslash() {
        for level in available_levels() {
            let stripper = Stripper::new(level);
            let mut input = vec![b'1'; 3 * stripper.width()];
            let cut = 2 * stripper.width() + 3;
            input[cut] = b'\\';
            let mut out = Vec::new();
            let consumed = stripper.strip_run(&input, &mut out);
            assert_eq!(consumed, cut);
            assert_eq!(out.len(), cut);
        }
    }

    #[test]
    fn test_special_at_block_start() {
        for level in available_levels() {
            let stripper = Stripper::new(level);
            let input = vec![b'"'; stripper.width()];
            let mut out = Vec::new();
            assert_eq!(stripper.strip_run(&input, &mut out), 0);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_short_tail_left_to_scalar() {
        for level in available_levels() {
            let stripper = Stripper::new(level);
            let input = vec![b' '; stripper.width() - 1];
            let mut out = Vec::new();
            assert_eq!(stripper.strip_run(&input, &mut out), 0);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_all_whitespace_blocks_drop_everything() {
        for level in available_levels() {
            let stripper = Stripper::new(level);
            let input = vec![b' '; 4 * stripper.width()];
            let mut out = Vec::new();
            assert_eq!(stripper.strip_run(&input, &mut out), input.len());
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_kernels_agree() {
        let pattern = b"{ 17 ,\t-2.5e19 :\r\nnull true , }  [ ]   98765 ,,";
        let input: Vec<u8> = pattern.iter().copied().cycle().take(4096 + 7).collect();
        let reference = strip_all(&Stripper::new(SimdLevel::None), &input);
        for level in available_levels() {
            let got = strip_all(&Stripper::new(level), &input);
            assert_eq!(got, reference, "level {:?}", level);
        }
    }

    #[test]
    fn test_width_by_level() {
        assert_eq!(Stripper::new(SimdLevel::None).width(), 8);
        for level in available_levels() {
            let w = Stripper::new(level).width();
            assert!(w == 8 || w == 16 || w == 32 || w == 64);
        }
    }
}
