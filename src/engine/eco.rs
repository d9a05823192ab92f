//! ECO mode: constant-memory scalar engine.
//!
//! One scalar machine, one fixed 64 KiB input scratch, one fixed 64 KiB
//! output buffer flushed to the writer between reads. Memory use is O(1) in
//! input size.

use std::io::{Read, Write};

use crate::error::Error;
use crate::scalar::ScalarMinifier;

/// Fixed scratch and output buffer size.
pub(crate) const ECO_BUFFER: usize = 64 * 1024;

/// Stream-minify `reader` into `writer`. Returns (bytes in, bytes out).
pub(crate) fn run_stream<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    scratch: &mut Vec<u8>,
    outbuf: &mut Vec<u8>,
) -> Result<(u64, u64), Error> {
    scratch.clear();
    scratch.resize(ECO_BUFFER, 0);
    outbuf.clear();
    outbuf.reserve(ECO_BUFFER);

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
        writer
            .write_all(outbuf)
            .map_err(|e| Error::writer(&e, machine.offset()))?;
        bytes_out += outbuf.len() as u64;
        outbuf.clear();
    }

    machine.finish()?;
    Ok((bytes_in, bytes_out))
}

/// In-memory variant; output goes straight into `out`.
pub(crate) fn run_bytes(input: &[u8], out: &mut Vec<u8>) -> Result<(), Error> {
    out.try_reserve(input.len()).map_err(|_| Error::oom(0))?;
    let mut machine = ScalarMinifier::new();
    for piece in input.chunks(ECO_BUFFER) {
        machine.feed(piece, out)?;
    }
    machine.finish()
}
