//! SPORT mode: scalar engine with a size-adapted intermediate buffer.
//!
//! Still single-threaded, but the buffer between machine and writer grows
//! with the input (√N, clamped) so writer syscalls amortize and the working
//! set stays cache-warm. Streaming calls with an unsized reader use a fixed
//! 1 MiB chunk.

use std::io::{Read, Write};

use crate::error::Error;
use crate::scalar::ScalarMinifier;

pub(crate) const SPORT_MIN_BUFFER: usize = 64 * 1024;
pub(crate) const SPORT_MAX_BUFFER: usize = 16 * 1024 * 1024;
pub(crate) const SPORT_STREAM_BUFFER: usize = 1024 * 1024;

/// Intermediate buffer size for a known input length: ⌈√N⌉ clamped to
/// [64 KiB, 16 MiB]. The floor keeps small-but-not-tiny inputs from
/// degenerating into per-kilobyte flushes.
pub(crate) fn buffer_size(input_len: usize) -> usize {
    let root = input_len.isqrt();
    let ceil = if root * root < input_len {
        root + 1
    } else {
        root
    };
    ceil.clamp(SPORT_MIN_BUFFER, SPORT_MAX_BUFFER)
}

/// Stream-minify `reader` into `writer`. Returns (bytes in, bytes out).
pub(crate) fn run_stream<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    scratch: &mut Vec<u8>,
    outbuf: &mut Vec<u8>,
) -> Result<(u64, u64), Error> {
    scratch.clear();
    scratch.resize(SPORT_STREAM_BUFFER, 0);
    outbuf.clear();
    outbuf.reserve(SPORT_STREAM_BUFFER);

    let mut machine = ScalarMinifier::new();
    let mut bytes_in = 0u64;
    let mut bytes_out = 0u64;

    loop {
        let n = reader
            .read(scratch)
            .map_err(|e| Error::writer(&e, machine.offset()))?;
        if n == 0 {
            break;
        }
        bytes_in += n as u64;
        machine.feed(&scratch[..n], outbuf)?;
        // Flush between chunks, not between reads of a chunk.
        writer
            .write_all(outbuf)
            .map_err(|e| Error::writer(&e, machine.offset()))?;
        bytes_out += outbuf.len() as u64;
        outbuf.clear();
    }

    machine.finish()?;
    Ok((bytes_in, bytes_out))
}

/// In-memory variant: the input length is known, so the chunk size follows
/// the √N rule and output batches into `out` directly.
pub(crate) fn run_bytes(input: &[u8], out: &mut Vec<u8>) -> Result<(), Error> {
    out.try_reserve(input.len()).map_err(|_| Error::oom(0))?;
    let chunk = buffer_size(input.len());
    let mut machine = ScalarMinifier::new();
    for piece in input.chunks(chunk) {
        machine.feed(piece, out)?;
    }
    machine.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_rule() {
        // Below the floor: clamped up.
        assert_eq!(buffer_size(1000), SPORT_MIN_BUFFER);
        assert_eq!(buffer_size(SPORT_MIN_BUFFER), SPORT_MIN_BUFFER);
        // √(16 GiB) = 128 KiB: inside the clamp window.
        assert_eq!(buffer_size(16 * 1024 * 1024 * 1024), 128 * 1024);
        // Ceiling behavior.
        assert_eq!(buffer_size(128 * 1024 * 128 * 1024 + 1), 128 * 1024 + 1);
    }

    #[test]
    fn test_bytes_matches_eco() {
        let input = b"[ { \"k\" : \"a b\" } , 2 ,\t3 ]";
        let mut sport = Vec::new();
        run_bytes(input, &mut sport).unwrap();
        let mut eco = Vec::new();
        super::super::eco::run_bytes(input, &mut eco).unwrap();
        assert_eq!(sport, eco);
    }

    #[test]
    fn test_stream_matches_bytes() {
        let mut input = Vec::from(&b"["[..]);
        for i in 0..10_000 {
            if i > 0 {
                input.push(b',');
            }
            input.extend_from_slice(format!(" \"s{i}\" ").as_bytes());
        }
        input.push(b']');

        let mut streamed = Vec::new();
        let mut scratch = Vec::new();
        let mut outbuf = Vec::new();
        run_stream(&mut &input[..], &mut streamed, &mut scratch, &mut outbuf).unwrap();

        let mut batch = Vec::new();
        run_bytes(&input, &mut batch).unwrap();
        assert_eq!(streamed, batch);
    }
}
