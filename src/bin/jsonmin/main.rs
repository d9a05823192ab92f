//! jsonmin CLI front-end.
//!
//! A thin shell over the library facade: pick a mode, point it at a file or
//! stdin, write to a file or stdout. All minification semantics live in the
//! library.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use jsonmin::{JsonMinifier, MinifyOptions, Mode};

#[derive(Debug, Parser)]
#[command(name = "jsonmin")]
#[command(about = "High-throughput JSON minifier", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Minify a JSON document
    Minify(MinifyArgs),
    /// Check that a document is valid JSON without writing output
    Validate(ValidateArgs),
}

#[derive(Debug, Parser)]
struct MinifyArgs {
    /// Input file, or `-` for stdin
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Execution mode
    #[arg(short, long, default_value = "turbo")]
    mode: ModeArg,

    /// Demote turbo to sport instead of failing when it is unsupported
    #[arg(long)]
    fallback: bool,

    /// Print bytes in/out and throughput to stderr
    #[arg(long)]
    stats: bool,
}

#[derive(Debug, Parser)]
struct ValidateArgs {
    /// Input file, or `-` for stdin
    #[arg(default_value = "-")]
    input: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Constant memory, scalar
    Eco,
    /// Larger buffers, scalar
    Sport,
    /// SIMD + parallel (default)
    Turbo,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Eco => Mode::Eco,
            ModeArg::Sport => Mode::Sport,
            ModeArg::Turbo => Mode::Turbo,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Minify(args) => run_minify(args),
        Command::Validate(args) => run_validate(args),
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn run_minify(args: MinifyArgs) -> Result<()> {
    let mode = Mode::from(args.mode);
    let mut opts = MinifyOptions::new();
    if args.fallback {
        opts = opts.with_fallback();
    }
    let mut minifier = JsonMinifier::with_options(opts);

    let start = Instant::now();
    let stats = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let stats = minify_from(&mut minifier, mode, &args.input, &mut writer)?;
            writer.flush().context("flushing output")?;
            stats
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            let stats = minify_from(&mut minifier, mode, &args.input, &mut writer)?;
            writer.flush().context("flushing stdout")?;
            stats
        }
    };

    if args.stats {
        let elapsed = start.elapsed();
        let saved = 100.0 * (1.0 - stats.bytes_out as f64 / stats.bytes_in.max(1) as f64);
        let mbps = stats.bytes_in as f64 / 1_048_576.0 / elapsed.as_secs_f64().max(1e-9);
        eprintln!(
            "✓ {} → {} bytes ({:.1}% smaller) in {:.2?} [{}{}] {:.0} MB/s",
            stats.bytes_in,
            stats.bytes_out,
            saved,
            elapsed,
            stats.mode_used,
            if stats.degraded { ", degraded" } else { "" },
            mbps,
        );
    }
    Ok(())
}

/// Route the input to the facade: memory-map files for turbo (contiguous
/// buffer without a copy, fed straight to the in-memory entry point),
/// stream otherwise.
fn minify_from<W: Write>(
    minifier: &mut JsonMinifier,
    mode: Mode,
    input: &Path,
    writer: &mut W,
) -> Result<jsonmin::Stats> {
    if is_stdin(input) {
        let mut stdin = io::stdin().lock();
        return Ok(minifier.minify_stream(mode, &mut stdin, writer)?);
    }

    if mode == Mode::Turbo {
        let file = File::open(input).with_context(|| format!("cannot open {}", input.display()))?;
        // SAFETY: the mapping is read-only and dropped before return; the
        // usual caveat about concurrent truncation of the underlying file
        // applies to every mmap consumer.
        let map = unsafe { memmap2::Mmap::map(&file) }
            .with_context(|| format!("cannot map {}", input.display()))?;
        let start = Instant::now();
        let out = minifier.minify_bytes(mode, &map[..])?;
        writer.write_all(&out).context("writing output")?;
        let degraded = !minifier.is_supported(Mode::Turbo);
        return Ok(jsonmin::Stats {
            bytes_in: map.len() as u64,
            bytes_out: out.len() as u64,
            elapsed: start.elapsed(),
            mode_used: if degraded { Mode::Sport } else { Mode::Turbo },
            degraded,
        });
    }

    let mut file =
        File::open(input).with_context(|| format!("cannot open {}", input.display()))?;
    Ok(minifier.minify_stream(mode, &mut file, writer)?)
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let mut data = Vec::new();
    if is_stdin(&args.input) {
        io::stdin()
            .lock()
            .read_to_end(&mut data)
            .context("reading stdin")?;
    } else {
        File::open(&args.input)
            .with_context(|| format!("cannot open {}", args.input.display()))?
            .read_to_end(&mut data)
            .with_context(|| format!("reading {}", args.input.display()))?;
    }

    let mut minifier = JsonMinifier::new();
    minifier
        .validate(&data)
        .with_context(|| format!("{} is not valid JSON", args.input.display()))?;
    eprintln!("✓ valid JSON ({} bytes)", data.len());
    Ok(())
}
