use std::process::ExitCode;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ena_submission_tools::config::{ConfigLoader, ResolvedConfig};
use ena_submission_tools::domain::{StudyAccession, parse_hold_date};
use ena_submission_tools::error::EnaError;
use ena_submission_tools::receipt;
use ena_submission_tools::runs;
use ena_submission_tools::samples;
use ena_submission_tools::table::Table;

#[derive(Parser)]
#[command(name = "ena-sub")]
#[command(about = "Build ENA submission XML from TSV metadata and extract accessions from registration receipts")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Build a SAMPLE_SET document plus submission envelope")]
    Samples(SamplesArgs),
    #[command(about = "Build EXPERIMENT_SET and RUN_SET documents plus submission envelope")]
    Runs(RunsArgs),
    #[command(about = "Select, reorder, and rename columns of a TSV table")]
    Select(SelectArgs),
    #[command(about = "Extract sample accessions from a registration receipt into TSV")]
    SampleIds(ExtractArgs),
    #[command(about = "Extract experiment/run accessions from a registration receipt into TSV")]
    RunIds(ExtractArgs),
}

#[derive(Args)]
struct SamplesArgs {
    #[arg(short = 'i', long = "input-file")]
    input: Utf8PathBuf,

    #[arg(short = 'o', long = "output-file")]
    output: Utf8PathBuf,

    #[arg(short = 'c', long)]
    checklist: Option<String>,

    #[arg(long)]
    hold_until: Option<String>,
}

#[derive(Args)]
struct RunsArgs {
    #[arg(short = 'i', long = "input-file")]
    input: Utf8PathBuf,

    #[arg(long)]
    study: Option<String>,

    #[arg(long)]
    reads: Utf8PathBuf,

    #[arg(short = 'o', long = "output-prefix")]
    output_prefix: String,

    #[arg(long)]
    validate_reads: bool,

    #[arg(long)]
    hold_until: Option<String>,
}

#[derive(Args)]
struct SelectArgs {
    #[arg(short = 'i', long = "input-file")]
    input: Utf8PathBuf,

    #[arg(short = 'o', long = "output-file")]
    output: Utf8PathBuf,

    #[arg(long, num_args = 1.., required = true)]
    columns: Vec<String>,

    #[arg(long, num_args = 1..)]
    order: Option<Vec<String>>,

    #[arg(long, num_args = 1..)]
    names: Option<Vec<String>>,
}

#[derive(Args)]
struct ExtractArgs {
    #[arg(short = 'i', long = "input-file")]
    input: Utf8PathBuf,

    #[arg(short = 'o', long = "output-file")]
    output: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<EnaError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &EnaError) -> u8 {
    match error {
        EnaError::MalformedTable(_)
        | EnaError::Parse(_)
        | EnaError::InvalidStudyAccession(_)
        | EnaError::InvalidSampleAccession(_)
        | EnaError::InvalidTaxonId(_)
        | EnaError::UnknownPlatform(_)
        | EnaError::InvalidHoldDate(_)
        | EnaError::ConfigRead(_)
        | EnaError::ConfigParse(_)
        | EnaError::MissingStudy => 2,
        EnaError::FileResolution { .. }
        | EnaError::Checksum { .. }
        | EnaError::Serialization(_)
        | EnaError::Filesystem(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Samples(args) => run_samples(args, config),
        Commands::Runs(args) => run_runs(args, config),
        Commands::Select(args) => run_select(args),
        Commands::SampleIds(args) => run_sample_ids(args),
        Commands::RunIds(args) => run_run_ids(args),
    }
}

fn resolve_hold_date(
    flag: Option<&str>,
    config: &ResolvedConfig,
) -> Result<Option<NaiveDate>, EnaError> {
    match flag {
        Some(value) => parse_hold_date(value).map(Some),
        None => Ok(config.hold_until),
    }
}

fn run_samples(args: SamplesArgs, config: ResolvedConfig) -> miette::Result<()> {
    let hold_until = resolve_hold_date(args.hold_until.as_deref(), &config)?;
    let checklist = args.checklist.or(config.checklist);

    let outputs = samples::write_sample_submission(
        &args.input,
        &args.output,
        checklist.as_deref(),
        hold_until,
    )?;

    println!("wrote {}", outputs.samples);
    println!("wrote {}", outputs.submission);
    Ok(())
}

fn run_runs(args: RunsArgs, config: ResolvedConfig) -> miette::Result<()> {
    let hold_until = resolve_hold_date(args.hold_until.as_deref(), &config)?;
    let study = match args.study {
        Some(value) => value.parse::<StudyAccession>()?,
        None => config.study.ok_or(EnaError::MissingStudy)?,
    };

    let outputs = runs::write_run_submission(
        &args.input,
        &study,
        &args.reads,
        &args.output_prefix,
        args.validate_reads,
        hold_until,
    )?;

    println!("wrote {}", outputs.experiments);
    println!("wrote {}", outputs.runs);
    println!("wrote {}", outputs.submission);
    Ok(())
}

fn run_select(args: SelectArgs) -> miette::Result<()> {
    let table = Table::load(&args.input)?;
    let mut selected = table.select(&args.columns)?;
    if let Some(order) = &args.order {
        selected = selected.reorder(order)?;
    }
    if let Some(names) = &args.names {
        selected = selected.rename(names)?;
    }
    selected.write(&args.output)?;

    println!("wrote {} ({} rows)", args.output, selected.len());
    Ok(())
}

fn run_sample_ids(args: ExtractArgs) -> miette::Result<()> {
    let count = receipt::write_sample_ids(&args.input, &args.output)?;
    println!("wrote {} ({count} samples)", args.output);
    Ok(())
}

fn run_run_ids(args: ExtractArgs) -> miette::Result<()> {
    let count = receipt::write_run_ids(&args.input, &args.output)?;
    println!("wrote {} ({count} runs)", args.output);
    Ok(())
}
