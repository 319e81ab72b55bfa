use std::io;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use tracing::info;
use tracing_subscriber::EnvFilter;

use magtrack::{
    constants::{DEFAULT_BASENAME, DEFAULT_LEVELING_TOL, DEFAULT_MAX_ITER},
    lsd::converter::convert_directory,
    segmentation::splitter::split_directory,
    ConverterParams, CrossoverFiles, LevelingParams, LwtCorrector, OffsetSource, SegmenterParams,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Marine magnetic track segmentation and crossover leveling", long_about = None)]
struct Cli {
    /// Enable debug logging (dropped rows, per-file details)
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split every raw track of a directory into straight segments
    Split(SplitArgs),
    /// Convert per-line files into one merged line-survey file
    Lsd(LsdArgs),
    /// Apply crossover leveling offsets to a merged line-survey file
    Level(LevelArgs),
}

#[derive(Parser, Debug)]
struct SplitArgs {
    /// Directory holding the raw tracks
    #[arg(value_hint = ValueHint::DirPath)]
    input_dir: Utf8PathBuf,

    /// RDP tolerance [deg]
    #[arg(long, default_value_t = 0.001)]
    epsilon: f64,

    /// Shortest segment kept as a survey line [km]
    #[arg(long, default_value_t = 2.0)]
    min_length_km: f64,

    /// Extension of the raw track files
    #[arg(long, default_value = "trk")]
    extension: String,
}

#[derive(Parser, Debug)]
struct LsdArgs {
    /// Directory holding the per-line files
    #[arg(value_hint = ValueHint::DirPath)]
    input_dir: Utf8PathBuf,

    /// Merged line-survey output
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Utf8PathBuf,

    /// Line number → filename mapping CSV
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    mapping: Utf8PathBuf,

    /// Extension of the per-line files
    #[arg(long, default_value = "lla")]
    extension: String,
}

#[derive(Parser, Debug)]
struct LevelArgs {
    /// Directory holding the crossover solver files
    #[arg(long, value_hint = ValueHint::DirPath)]
    output_dir: Utf8PathBuf,

    /// Basename of the solver files (`<basename>.lsd`, `<basename>.lwt`)
    #[arg(long, default_value = DEFAULT_BASENAME)]
    basename: String,

    /// Corrected output (defaults to `<basename>.lncor` in the output directory)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<Utf8PathBuf>,

    /// Run the iterative pass
    #[arg(long, action = ArgAction::SetTrue)]
    iterative: bool,

    #[arg(long, default_value_t = DEFAULT_MAX_ITER)]
    max_iter: usize,

    #[arg(long, default_value_t = DEFAULT_LEVELING_TOL)]
    tol: f64,

    /// `.lwt` column averaged into the offset (offset | mag2)
    #[arg(long, default_value = "offset")]
    offset_source: OffsetSource,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Split(args) => handle_split(args),
        Command::Lsd(args) => handle_lsd(args),
        Command::Level(args) => handle_level(args),
    }
}

fn handle_split(args: SplitArgs) -> Result<()> {
    let params = SegmenterParams::builder()
        .epsilon(args.epsilon)
        .min_length_km(args.min_length_km)
        .extension(args.extension)
        .build()?;
    info!("{params:#}");

    let report = split_directory(&args.input_dir, &params)
        .with_context(|| format!("splitting tracks in {}", args.input_dir))?;
    info!(
        "{} track(s) split, {} skipped; main segments in {}",
        report.outputs.len(),
        report.failed.len(),
        report.main_dir()
    );
    Ok(())
}

fn handle_lsd(args: LsdArgs) -> Result<()> {
    let params = ConverterParams::builder().extension(args.extension).build()?;
    info!("{params:#}");
    let merged = convert_directory(&args.input_dir, &args.output, &args.mapping, &params)
        .with_context(|| format!("converting line files in {}", args.input_dir))?;
    info!(
        "{} record(s) from {} line file(s)",
        merged.records.len(),
        merged.mapping.len()
    );
    Ok(())
}

fn handle_level(args: LevelArgs) -> Result<()> {
    let params = LevelingParams::builder()
        .max_iter(args.max_iter)
        .tol(args.tol)
        .offset_source(args.offset_source)
        .build()?;
    info!("{params:#}");

    let corrector = LwtCorrector::new(CrossoverFiles::new(&args.output_dir, &args.basename), params);
    let output = args.output.as_deref();
    let report = if args.iterative {
        corrector.run_iterative(output)
    } else {
        corrector.run(output)
    }
    .context("leveling")?;

    if !report.unmatched_lines.is_empty() {
        info!(
            "{} line(s) without crossover offsets written uncorrected: {:?}",
            report.unmatched_lines.len(),
            report.unmatched_lines
        );
    }
    Ok(())
}
