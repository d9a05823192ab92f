//! Mode dispatch facade.
//!
//! [`JsonMinifier`] is the public entry point: it owns the probed
//! capabilities, the selected stripper kernel, the lazily built worker pool,
//! and the reusable scratch buffers. Modes are a closed enum matched here;
//! there is no open engine interface.
//!
//! A minifier instance serializes calls (methods take `&mut self`) and may
//! be reused: state is reset between calls, buffers are retained. Callers
//! needing concurrency use one instance per thread.
//!
//! # Example
//!
//! ```
//! use jsonmin::{JsonMinifier, Mode};
//!
//! let mut minifier = JsonMinifier::new();
//! let out = minifier.minify_bytes(Mode::Sport, b"[ 1 , 2 , 3 ]").unwrap();
//! assert_eq!(out, b"[1,2,3]");
//! ```

use core::fmt;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use crate::engine::{eco, sport, turbo};
use crate::error::{Error, ErrorKind};
use crate::probe::{probe, Capabilities, SimdLevel};
use crate::scalar::ScalarMinifier;
use crate::simd::Stripper;

#[cfg(feature = "parallel")]
use crate::engine::pool::WorkerPool;
#[cfg(feature = "parallel")]
use std::sync::OnceLock;

/// Execution strategy: memory footprint vs. throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Pure scalar machine, constant memory (≤ 128 KiB).
    Eco,
    /// Scalar machine with a √N intermediate buffer.
    Sport,
    /// SIMD whitespace elimination plus parallel chunk dispatch.
    Turbo,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eco => "eco",
            Self::Sport => "sport",
            Self::Turbo => "turbo",
        })
    }
}

/// Facade configuration.
#[derive(Debug, Clone, Default)]
pub struct MinifyOptions {
    /// Run SPORT instead of failing when TURBO is requested on a machine
    /// that cannot run it. The demotion is visible in [`Stats::degraded`].
    pub fallback: bool,
}

impl MinifyOptions {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt into mode fallback.
    pub fn with_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }
}

/// Per-call report from [`JsonMinifier::minify_stream`].
#[derive(Debug, Clone, Copy)]
pub struct Stats {
    /// Bytes consumed from the reader.
    pub bytes_in: u64,
    /// Bytes written to the writer.
    pub bytes_out: u64,
    /// Wall-clock time for the call.
    pub elapsed: Duration,
    /// The mode that actually ran.
    pub mode_used: Mode,
    /// True when the mode that ran is not the mode that was requested.
    pub degraded: bool,
}

/// The minifier facade. See the [module docs](self) for usage.
pub struct JsonMinifier {
    caps: Capabilities,
    opts: MinifyOptions,
    stripper: Stripper,
    #[cfg(feature = "parallel")]
    pool: OnceLock<Option<WorkerPool>>,
    scratch: Vec<u8>,
    outbuf: Vec<u8>,
}

impl Default for JsonMinifier {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonMinifier {
    /// Create a minifier with default options.
    pub fn new() -> Self {
        Self::with_options(MinifyOptions::default())
    }

    /// Create a minifier with explicit options.
    pub fn with_options(opts: MinifyOptions) -> Self {
        let caps = probe();
        Self {
            caps,
            opts,
            stripper: Stripper::new(caps.simd_level),
            #[cfg(feature = "parallel")]
            pool: OnceLock::new(),
            scratch: Vec::new(),
            outbuf: Vec::new(),
        }
    }

    /// What the probe found at construction.
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Whether `mode` can run on this machine and build.
    ///
    /// ECO and SPORT are always supported; TURBO needs a vector ISA or at
    /// least two logical CPUs.
    pub fn is_supported(&self, mode: Mode) -> bool {
        match mode {
            Mode::Eco | Mode::Sport => true,
            Mode::Turbo => self.caps.simd_level != SimdLevel::None || self.caps.logical_cpus >= 2,
        }
    }

    /// Minify an in-memory buffer.
    pub fn minify_bytes(&mut self, mode: Mode, input: &[u8]) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.minify_into(mode, input, &mut out)?;
        Ok(out)
    }

    /// Minify from a reader into a writer.
    ///
    /// ECO and SPORT stream; TURBO needs a contiguous buffer, so the reader
    /// is drained first and the result written in one piece (the
    /// output-ordering guarantee is then trivial).
    pub fn minify_stream<R: Read + ?Sized, W: Write + ?Sized>(
        &mut self,
        mode: Mode,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<Stats, Error> {
        let start = Instant::now();
        let (bytes_in, bytes_out, mode_used) = match mode {
            Mode::Eco => {
                let (i, o) =
                    eco::run_stream(reader, writer, &mut self.scratch, &mut self.outbuf)?;
                (i, o, Mode::Eco)
            }
            Mode::Sport => {
                let (i, o) =
                    sport::run_stream(reader, writer, &mut self.scratch, &mut self.outbuf)?;
                (i, o, Mode::Sport)
            }
            Mode::Turbo => {
                // Contiguous-buffer requirement: drain the reader into the
                // retained scratch, minify in memory, write in one piece.
                let mut input = std::mem::take(&mut self.scratch);
                input.clear();
                let result = match reader.read_to_end(&mut input) {
                    Ok(_) => {
                        let mut out = Vec::new();
                        self.minify_into(Mode::Turbo, &input, &mut out)
                            .map(|used| (out, used))
                    }
                    Err(e) => Err(Error::writer(&e, input.len())),
                };
                let bytes_in = input.len() as u64;
                self.scratch = input;
                let (out, used) = result?;

                writer
                    .write_all(&out)
                    .map_err(|e| Error::writer(&e, bytes_in as usize))?;
                (bytes_in, out.len() as u64, used)
            }
        };
        Ok(Stats {
            bytes_in,
            bytes_out,
            elapsed: start.elapsed(),
            mode_used,
            degraded: mode_used != mode,
        })
    }

    /// Run the scalar machine with the writer discarded: full grammar check,
    /// no output.
    pub fn validate(&mut self, input: &[u8]) -> Result<(), Error> {
        let mut machine = ScalarMinifier::new();
        self.outbuf.clear();
        for piece in input.chunks(64 * 1024) {
            machine.feed(piece, &mut self.outbuf)?;
            self.outbuf.clear();
        }
        machine.finish()
    }

    /// Dispatch to an engine; returns the mode that actually ran.
    fn minify_into(&mut self, mode: Mode, input: &[u8], out: &mut Vec<u8>) -> Result<Mode, Error> {
        match mode {
            Mode::Eco => {
                eco::run_bytes(input, out)?;
                Ok(Mode::Eco)
            }
            Mode::Sport => {
                sport::run_bytes(input, out)?;
                Ok(Mode::Sport)
            }
            Mode::Turbo => {
                if !self.is_supported(Mode::Turbo) {
                    if self.opts.fallback {
                        sport::run_bytes(input, out)?;
                        return Ok(Mode::Sport);
                    }
                    return Err(Error::new(
                        ErrorKind::ModeUnavailable { mode: Mode::Turbo },
                        0,
                    ));
                }
                let turbo_result = self.run_turbo(input, out);
                match turbo_result {
                    Ok(()) => Ok(Mode::Turbo),
                    Err(e) if e.kind == ErrorKind::OutOfMemory => {
                        // Resource failure demotes to SPORT once; parse
                        // errors are never swallowed.
                        out.clear();
                        sport::run_bytes(input, out)?;
                        Ok(Mode::Sport)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn run_turbo(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), Error> {
        let pool = self
            .pool
            .get_or_init(|| WorkerPool::build(self.caps.logical_cpus as usize));
        turbo::run_bytes(input, &self.stripper, pool.as_ref(), self.caps, out)
    }

    #[cfg(not(feature = "parallel"))]
    fn run_turbo(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), Error> {
        turbo::run_bytes(input, &self.stripper, self.caps, out)
    }
}

/// One-shot convenience: minify `input` with a throwaway instance.
///
/// # Example
///
/// ```
/// use jsonmin::{minify, Mode};
///
/// assert_eq!(minify(b"{ \"a\" : 1 }", Mode::Eco).unwrap(), b"{\"a\":1}");
/// ```
pub fn minify(input: &[u8], mode: Mode) -> Result<Vec<u8>, Error> {
    JsonMinifier::new().minify_bytes(mode, input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [Mode; 3] = [Mode::Eco, Mode::Sport, Mode::Turbo];

    #[test]
    fn test_scalar_modes_always_supported() {
        let minifier = JsonMinifier::new();
        assert!(minifier.is_supported(Mode::Eco));
        assert!(minifier.is_supported(Mode::Sport));
    }

    #[test]
    fn test_modes_agree_on_small_inputs() {
        let inputs: &[&[u8]] = &[
            b"{}",
            b"[ 1 , 2 , 3 ]",
            br#"{ "k" : "v with spaces" }"#,
            b"  null  ",
        ];
        let mut minifier = JsonMinifier::new();
        for input in inputs {
            let reference = minifier.minify_bytes(Mode::Eco, input).unwrap();
            for mode in MODES {
                if !minifier.is_supported(mode) {
                    continue;
                }
                assert_eq!(
                    minifier.minify_bytes(mode, input).unwrap(),
                    reference,
                    "mode {mode} on {:?}",
                    String::from_utf8_lossy(input)
                );
            }
        }
    }

    #[test]
    fn test_instance_reusable_after_parse_error() {
        let mut minifier = JsonMinifier::new();
        assert!(minifier.minify_bytes(Mode::Eco, b"{\"a\":1,}").is_err());
        assert_eq!(
            minifier.minify_bytes(Mode::Eco, b"{\"a\":1}").unwrap(),
            b"{\"a\":1}"
        );
    }

    #[test]
    fn test_validate() {
        let mut minifier = JsonMinifier::new();
        assert!(minifier.validate(br#"{"name": "Alice", "age": 30}"#).is_ok());
        let err = minifier.validate(br#"{"name": "Alice",}"#).unwrap_err();
        assert_eq!(err.offset, 17);
        // Empty input validates (empty output, no error).
        assert!(minifier.validate(b"").is_ok());
    }

    #[test]
    fn test_stream_stats() {
        let mut minifier = JsonMinifier::new();
        let input = b"[ 1 , 2 , 3 ]";
        for mode in MODES {
            if !minifier.is_supported(mode) {
                continue;
            }
            let mut out = Vec::new();
            let stats = minifier
                .minify_stream(mode, &mut &input[..], &mut out)
                .unwrap();
            assert_eq!(out, b"[1,2,3]");
            assert_eq!(stats.bytes_in, input.len() as u64);
            assert_eq!(stats.bytes_out, out.len() as u64);
            assert_eq!(stats.mode_used, mode);
            assert!(!stats.degraded);
        }
    }

    #[test]
    fn test_stream_parse_error_offset() {
        let mut minifier = JsonMinifier::new();
        let mut out = Vec::new();
        let err = minifier
            .minify_stream(Mode::Turbo, &mut &b"{\"a\":1,}"[..], &mut out)
            .unwrap_err();
        assert_eq!(err.offset, 7);
    }

    #[test]
    fn test_convenience_minify() {
        assert_eq!(minify(b"[ true ]", Mode::Sport).unwrap(), b"[true]");
    }

    #[test]
    fn test_writer_failure_is_reported() {
        struct FailWriter;
        impl std::io::Write for FailWriter {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "sink full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let mut minifier = JsonMinifier::new();
        let err = minifier
            .minify_stream(Mode::Eco, &mut &b"[1,2]"[..], &mut FailWriter)
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::WriterFailed { .. }));
        assert!(!err.is_parse());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Eco.to_string(), "eco");
        assert_eq!(Mode::Sport.to_string(), "sport");
        assert_eq!(Mode::Turbo.to_string(), "turbo");
    }
}
