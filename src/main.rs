use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clipcall::{
    open_alignments, BreakpointCaller, CallerConfig, InputFormat, MalformedPolicy,
    DEFAULT_THRESHOLD, DEFAULT_WINDOW,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clipcall", about = "Find soft-clipped breakpoints in alignments")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// SAM text, BAM or CRAM alignment file.
    #[arg(short, long)]
    input: PathBuf,
    /// Input encoding.
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    format: InputFormat,
    /// What to do with records whose CIGAR cannot be decoded.
    #[arg(long, value_enum, default_value_t = MalformedPolicy::Skip)]
    on_malformed: MalformedPolicy,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count soft-clip breakpoints and split them into hits and rejects.
    Call {
        #[command(flatten)]
        input: InputArgs,
        /// Output prefix; `_hits.bed` and `_rejects.bed` are appended.
        #[arg(short, long)]
        output: PathBuf,
        /// Minimum windowed average for a position to be reported as a hit.
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD, allow_negative_numbers = true)]
        threshold: i64,
        /// Sliding window size used for averaging (must be odd).
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
    },
    /// Print every raw breakpoint without aggregation.
    Extract {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Call {
            input,
            output,
            threshold,
            window,
        } => run_call(input, output, threshold, window),
        Commands::Extract { input } => run_extract(input),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn config_for(input: &InputArgs) -> CallerConfig {
    CallerConfig::default()
        .with_format(input.format)
        .with_malformed_policy(input.on_malformed)
}

fn run_call(input: InputArgs, output: PathBuf, threshold: i64, window: usize) -> Result<()> {
    let config = config_for(&input)
        .with_threshold(threshold)
        .with_window(window);
    let caller = BreakpointCaller::new(config).context("invalid --window")?;

    let summary = caller.run(&input.input, &output).with_context(|| {
        format!(
            "breakpoint calling failed for {}",
            input.input.display()
        )
    })?;

    println!(
        "{}\t{} hits\n{}\t{} rejects",
        summary.hits_path.display(),
        summary.hits,
        summary.rejects_path.display(),
        summary.rejects
    );
    Ok(())
}

fn run_extract(input: InputArgs) -> Result<()> {
    let caller = BreakpointCaller::new(config_for(&input))?;
    let lines = open_alignments(&input.input, input.format)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let stats = caller
        .for_each_breakpoint(lines, |line, breakpoint| {
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                breakpoint.chrom,
                breakpoint.position,
                breakpoint.side.as_str(),
                line
            )
            .map_err(|source| clipcall::CallerError::OutputAccess {
                path: PathBuf::from("<stdout>"),
                source,
            })
        })
        .with_context(|| format!("failed to extract breakpoints from {}", input.input.display()))?;
    out.flush().context("failed to flush stdout")?;

    tracing::info!(
        records = stats.records,
        breakpoints = stats.breakpoints,
        malformed = stats.malformed,
        "extraction finished"
    );
    Ok(())
}
