//! Fused SIMD + scalar minification pass.
//!
//! The pipeline drives the scalar machine with two bulk fast paths layered
//! on top of it:
//!
//! - **String interiors** are copied wholesale up to the next `"` or `\`
//!   landmark (memchr); the machine's state does not change between
//!   landmarks, so no per-byte work is needed.
//! - **Runs outside strings** go through the whitespace stripper one block
//!   at a time. Kept bytes are compacted to the output in bulk, then
//!   grammar-checked without re-emission. One synthetic whitespace step per
//!   dropped whitespace run preserves the token-separator role whitespace
//!   plays between numbers and keywords.
//!
//! When a grammar check fails inside a compacted block, the block is
//! replayed byte by byte from a checkpoint so the error carries the exact
//! input offset, the same recover-the-position-on-the-slow-path trick the
//! scalar-vs-SIMD split uses everywhere else in this crate.
//!
//! Output is byte-identical to the scalar machine's on every input.

use memchr::memchr2;

use crate::error::Error;
use crate::scalar::{Container, ScalarMinifier};
use crate::simd::{below, ones, Stripper};

/// A SIMD-accelerated minification pass over one contiguous span.
pub(crate) struct Pipeline<'s> {
    machine: ScalarMinifier,
    stripper: &'s Stripper,
}

impl<'s> Pipeline<'s> {
    /// Pipeline starting at the root of a document.
    pub fn new(stripper: &'s Stripper) -> Self {
        Self {
            machine: ScalarMinifier::new(),
            stripper,
        }
    }

    /// Pipeline seeded one level inside the outermost container, for worker
    /// chunks. Error offsets come out absolute via `base_offset`.
    pub fn resume(stripper: &'s Stripper, root: Container, base_offset: usize) -> Self {
        Self {
            machine: ScalarMinifier::resume_in_container(root, base_offset),
            stripper,
        }
    }

    /// Minify `input`, appending kept bytes to `out`.
    pub fn run(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), Error> {
        let width = self.stripper.width();
        let mut pos = 0;
        while pos < input.len() {
            if self.machine.in_plain_string() {
                pos += self.copy_string(&input[pos..], out)?;
                continue;
            }
            if self.machine.outside_string() && pos + width <= input.len() {
                let consumed = self.run_block(&input[pos..pos + width], out)?;
                if consumed > 0 {
                    pos += consumed;
                    continue;
                }
                // First byte of the block is `"` or `\`; take the scalar path.
            }
            let byte = input[pos];
            if self.machine.transition(byte)? {
                out.push(byte);
            }
            pos += 1;
        }
        Ok(())
    }

    /// End of the whole document.
    pub fn finish(&mut self) -> Result<(), Error> {
        self.machine.finish()
    }

    /// End of a non-final chunk.
    pub fn finish_chunk(&mut self) -> Result<(), Error> {
        self.machine.finish_chunk()
    }

    /// Bulk-copy string content up to the next `"` or `\`, then put that
    /// landmark byte through the machine. Returns bytes consumed.
    fn copy_string(&mut self, rest: &[u8], out: &mut Vec<u8>) -> Result<usize, Error> {
        match memchr2(b'"', b'\\', rest) {
            Some(k) => {
                out.extend_from_slice(&rest[..k]);
                self.machine.advance_bulk(k);
                let byte = rest[k];
                if self.machine.transition(byte)? {
                    out.push(byte);
                }
                Ok(k + 1)
            }
            None => {
                // String continues past this span; everything is content.
                out.extend_from_slice(rest);
                self.machine.advance_bulk(rest.len());
                Ok(rest.len())
            }
        }
    }

    /// Process one block outside string context: compact whitespace out in
    /// bulk, then grammar-check the kept bytes. Returns bytes consumed
    /// (0 when the block starts with `"` or `\`).
    fn run_block(&mut self, block: &[u8], out: &mut Vec<u8>) -> Result<usize, Error> {
        let width = block.len();
        let masks = self.stripper.classify_block(block);
        let limit = if masks.special != 0 {
            masks.special.trailing_zeros() as usize
        } else {
            width
        };
        if limit == 0 {
            return Ok(0);
        }

        let keep = !masks.ws
            & if limit == width {
                ones(width)
            } else {
                below(limit)
            };
        let checkpoint = self.machine.clone();
        let out_start = out.len();
        self.stripper.compact_block(block, keep, out);

        let scan = self.scan_block(block, masks.ws, limit, out_start, out);
        match scan {
            Ok(()) => {
                self.machine.advance_bulk(limit);
                Ok(limit)
            }
            Err(_) => {
                // Replay byte by byte for the exact error offset.
                out.truncate(out_start);
                self.machine = checkpoint;
                for &byte in &block[..limit] {
                    if self.machine.transition(byte)? {
                        out.push(byte);
                    }
                }
                Ok(limit)
            }
        }
    }

    /// Grammar-check a compacted block: kept bytes come back out of `out`,
    /// and each dropped whitespace run contributes one step with the run's
    /// first byte so value termination stays identical to the scalar
    /// reference. The real byte matters: a keyword split by `\t` must report
    /// `\t`, not a stand-in.
    fn scan_block(
        &mut self,
        block: &[u8],
        ws: u64,
        limit: usize,
        out_start: usize,
        out: &[u8],
    ) -> Result<(), Error> {
        let mut kept_idx = out_start;
        let mut in_ws_run = false;
        for i in 0..limit {
            if ws >> i & 1 == 1 {
                if !in_ws_run {
                    self.machine.apply(block[i])?;
                    in_ws_run = true;
                }
            } else {
                in_ws_run = false;
                self.machine.apply(out[kept_idx])?;
                kept_idx += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::SimdLevel;
    use crate::scalar::ScalarMinifier;

    fn scalar_reference(input: &[u8]) -> Result<Vec<u8>, Error> {
        let mut machine = ScalarMinifier::new();
        let mut out = Vec::new();
        machine.feed(input, &mut out)?;
        machine.finish()?;
        Ok(out)
    }

    fn pipeline_run(input: &[u8]) -> Result<Vec<u8>, Error> {
        let stripper = Stripper::new(crate::probe::probe().simd_level);
        let mut pipeline = Pipeline::new(&stripper);
        let mut out = Vec::new();
        pipeline.run(input, &mut out)?;
        pipeline.finish()?;
        Ok(out)
    }

    #[test]
    fn test_matches_scalar_on_valid_inputs() {
        let inputs: &[&[u8]] = &[
            b"{}",
            b"[ 1 , 2 , 3 ]",
            b"{ \"a\" : 1 }",
            br#"{ "k" : "v with spaces" }"#,
            br#""hello\nworld""#,
            b"  [ true ,   false, null,\t-1.5e10 ]  ",
            br#"{"users":[{"name":"a b c","tags":["x","y"]},{"name":"d"}], "n": 42}"#,
        ];
        for input in inputs {
            assert_eq!(
                pipeline_run(input).unwrap(),
                scalar_reference(input).unwrap(),
                "on {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_matches_scalar_on_long_inputs() {
        // Long enough that every kernel runs full blocks, with strings
        // crossing block boundaries and heavy interstitial whitespace.
        let mut input = Vec::from(&b"[\n"[..]);
        for i in 0..500 {
            if i > 0 {
                input.extend_from_slice(b" ,\r\n\t ");
            }
            input.extend_from_slice(
                format!(
                    "{{ \"key {i}\" : [ {i} ,  {} , \"some longer string value with   spaces\" ] }}",
                    i * 31
                )
                .as_bytes(),
            );
        }
        input.extend_from_slice(b"\n]\n");
        assert_eq!(
            pipeline_run(&input).unwrap(),
            scalar_reference(&input).unwrap()
        );
    }

    #[test]
    fn test_matches_scalar_on_escape_heavy_strings() {
        let input = r#"["a\\b", "日本\n\t", "\"quoted\"", "tail"]"#.as_bytes();
        assert_eq!(
            pipeline_run(input).unwrap(),
            scalar_reference(input).unwrap()
        );
    }

    #[test]
    fn test_error_offsets_match_scalar() {
        let inputs: &[&[u8]] = &[
            b"{\"a\":1,}",
            b"[1,2,]",
            b"[1 2]",
            b"[tru e]",
            b"{\"a\" 1}",
            b"null extra",
            br#"["ok", "bad\q"]"#,
            b"{\"unterminated",
        ];
        for input in inputs {
            let want = scalar_reference(input).unwrap_err();
            let got = pipeline_run(input).unwrap_err();
            assert_eq!(got, want, "on {:?}", String::from_utf8_lossy(input));
        }
    }

    #[test]
    fn test_keyword_split_by_tab_reports_the_tab() {
        // The splitting byte must surface in the error exactly as the
        // scalar reference reports it, for every whitespace kind.
        let inputs: &[&[u8]] = &[b"[tru\te]", b"[tru\ne]", b"[tru\re]", b"[fals e]"];
        for input in inputs {
            let want = scalar_reference(input).unwrap_err();
            let got = pipeline_run(input).unwrap_err();
            assert_eq!(got, want, "on {:?}", String::from_utf8_lossy(input));
            if let crate::error::ErrorKind::UnexpectedByte { byte, .. } = got.kind {
                assert_eq!(byte, input[got.offset]);
            } else {
                panic!("expected UnexpectedByte, got {got}");
            }
        }
    }

    #[test]
    fn test_keyword_split_by_tab_deep_inside_block() {
        // Pad so the split keyword sits inside a full block for every
        // kernel width, keeping the bulk scan (not the scalar tail) on the
        // hook for the error.
        let mut input = Vec::from(&b"[ 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12"[..]);
        input.extend_from_slice(b", tru\te, 13, 14, 15, 16, 17, 18, 19, 20]");
        let want = scalar_reference(&input).unwrap_err();
        let got = pipeline_run(&input).unwrap_err();
        assert_eq!(got, want);
        assert!(matches!(
            got.kind,
            crate::error::ErrorKind::UnexpectedByte { byte: b'\t', .. }
        ));
    }

    #[test]
    fn test_error_inside_bulk_block_gets_exact_offset() {
        // Pad so the offending byte sits deep inside a full block for every
        // kernel width, exercising the checkpoint-and-replay path.
        let mut input = Vec::from(&b"[ 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13"[..]);
        let bad_at = input.len() + 2;
        input.extend_from_slice(b", x, 14]");
        let err = pipeline_run(&input).unwrap_err();
        assert_eq!(err.offset, bad_at);
    }

    #[test]
    fn test_resumed_pipeline_chunk() {
        let stripper = Stripper::new(SimdLevel::None);
        let mut pipeline = Pipeline::resume(&stripper, Container::Array, 64);
        let mut out = Vec::new();
        pipeline
            .run(b" { \"a\" : [ 1 , 2 ] } , 5 ,", &mut out)
            .unwrap();
        pipeline.finish_chunk().unwrap();
        assert_eq!(out, b"{\"a\":[1,2]},5,");
    }
}
