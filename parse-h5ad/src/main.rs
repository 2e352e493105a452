use clap::{Args, Parser, Subcommand, ValueEnum};
use h5ad_samples::{extract_columns, extract_samples, list_columns, split_h5ad, ConsistencyPolicy};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(version, about = "Parse H5AD files: extract sample IDs, column values or per-sample files", long_about = None)]
struct Cli {
    /// Only report warnings and errors (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all available columns in anndata.obs
    ListColumns(ListColumnsArgs),
    /// Extract sample IDs from a multi-sample H5AD file
    #[command(alias = "parse-file")]
    ExtractSamples(ExtractSamplesArgs),
    /// Extract specified column values for each sample
    ExtractColumns(ExtractColumnsArgs),
    /// Split a multi-sample H5AD file into a per-sample H5AD file
    SplitSample(SplitSampleArgs),
}

#[derive(Args)]
struct ListColumnsArgs {
    /// Path to the H5AD file to read
    #[arg(long)]
    input: PathBuf,
    /// Path to the output CSV file with one column name per row
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args)]
struct ExtractSamplesArgs {
    /// Path to the H5AD file to parse
    #[arg(long)]
    input: PathBuf,
    /// Path to the output CSV file with sample IDs
    #[arg(long)]
    sample_output: PathBuf,
    /// Path to the output CSV file with available columns
    #[arg(long)]
    column_output: Option<PathBuf>,
    /// Name of the column to use for sample IDs
    #[arg(long, default_value = "sample")]
    column: String,
    /// List all available columns in anndata.obs to the sample output and exit
    #[arg(long)]
    list_columns: bool,
}

#[derive(Args)]
struct ExtractColumnsArgs {
    /// Path to the H5AD file to read
    #[arg(long)]
    input: PathBuf,
    /// Path to the output CSV file
    #[arg(long)]
    output: PathBuf,
    /// Name of the column to use for sample identification
    #[arg(long)]
    column: String,
    /// Names of columns to extract from anndata.obs (space-separated)
    #[arg(long, num_args = 1.., required = true)]
    column_names: Vec<String>,
    /// How to treat samples whose observations disagree on a column
    #[arg(long, value_enum, default_value_t = Consistency::First)]
    consistency: Consistency,
}

#[derive(Args)]
struct SplitSampleArgs {
    /// Path to the input H5AD file
    #[arg(long)]
    input: PathBuf,
    /// Path to the output H5AD file for the selected sample
    #[arg(long)]
    output: PathBuf,
    /// Name of the sample to extract
    #[arg(long)]
    sample_name: String,
    /// Name of the column in anndata.obs containing sample IDs
    #[arg(long, default_value = "sample")]
    sample_column: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Consistency {
    /// Use the first observation's value
    First,
    /// Use the first value and warn about samples with differing values
    Warn,
    /// Fail if any sample has differing values
    Strict,
}

impl From<Consistency> for ConsistencyPolicy {
    fn from(c: Consistency) -> Self {
        match c {
            Consistency::First => ConsistencyPolicy::FirstValue,
            Consistency::Warn => ConsistencyPolicy::Warn,
            Consistency::Strict => ConsistencyPolicy::Strict,
        }
    }
}

fn run(command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::ListColumns(args) => {
            list_columns(&args.input, &args.output)?;
        }
        Commands::ExtractSamples(args) if args.list_columns => {
            list_columns(&args.input, &args.sample_output)?;
        }
        Commands::ExtractSamples(args) => {
            extract_samples(
                &args.input,
                &args.sample_output,
                args.column_output.as_ref(),
                Some(args.column.as_str()),
            )?;
        }
        Commands::ExtractColumns(args) => {
            extract_columns(
                &args.input,
                &args.output,
                &args.column,
                &args.column_names,
                args.consistency.into(),
            )?;
        }
        Commands::SplitSample(args) => {
            split_h5ad(
                &args.input,
                &args.output,
                &args.sample_column,
                &args.sample_name,
            )?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    fmt::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            // the splitter also reports the full chain and any captured backtrace
            if matches!(cli.command, Commands::SplitSample(_)) {
                eprintln!("{:?}", e);
            }
            ExitCode::from(1)
        }
    }
}
