use clap::{Args, Parser, Subcommand};
use peak_alloc::PeakAlloc;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};
use txwrangle::options::{
    DuplicatePolicy, ExtractOptions, ResolveOptions, DEFAULT_FILTER_COLUMN,
    DEFAULT_ORTHOLOG_TABLE, DEFAULT_REPRESENTATIVE_TRANSCRIPTS,
};
use txwrangle::{extract, resolver};

#[global_allocator]
static PEAK_ALLOC: PeakAlloc = PeakAlloc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the GTF records whose attribute matches the given value(s)
    Extract(ExtractArgs),
    /// Resolve an Ensembl ortholog table to a JSON list of representative transcripts
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// GTF file to read, plain or gzipped
    #[arg(long = "gtf_file", alias = "gtf-file")]
    gtf_file: PathBuf,

    /// transcript BED file (accepted, not read)
    #[arg(long = "transcript_bed", alias = "transcript-bed")]
    transcript_bed: Option<PathBuf>,

    /// column to filter on
    #[arg(short, long, default_value = DEFAULT_FILTER_COLUMN)]
    column: String,

    /// value(s) the column must equal; a record matching any of them is kept
    #[arg(short, long = "value", required = true, num_args = 1..)]
    values: Vec<String>,

    /// match records whose column contains a value instead of equalling it
    #[arg(long)]
    contains: bool,

    /// only keep records of this feature type (gene, transcript, exon, CDS, start_codon, ...)
    #[arg(short, long)]
    feature_type: Option<String>,

    /// only load gene_id, gene_name, transcript_id and exon_number as attribute columns
    #[arg(long)]
    only_essential: bool,

    /// maximum number of rows to print, all rows by default
    #[arg(long)]
    max_rows: Option<usize>,

    /// maximum number of columns to print, all columns by default
    #[arg(long)]
    max_cols: Option<usize>,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// tab-separated ortholog table with a header line
    #[arg(short, long, default_value = DEFAULT_ORTHOLOG_TABLE)]
    input: PathBuf,

    /// where to write the JSON array of transcript IDs
    #[arg(short, long, default_value = DEFAULT_REPRESENTATIVE_TRANSCRIPTS)]
    output: PathBuf,

    /// which transcript a protein ID keeps if it occurs on several rows
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::LastWins)]
    duplicate_policy: DuplicatePolicy,

    /// write indented JSON
    #[arg(long)]
    pretty: bool,
}

impl From<&ExtractArgs> for ExtractOptions {
    fn from(args: &ExtractArgs) -> ExtractOptions {
        ExtractOptions {
            gtf_file: args.gtf_file.clone(),
            transcript_bed: args.transcript_bed.clone(),
            column: args.column.clone(),
            values: args.values.clone(),
            contains: args.contains,
            feature_type: args.feature_type.clone(),
            only_essential: args.only_essential,
        }
    }
}

impl From<&ResolveArgs> for ResolveOptions {
    fn from(args: &ResolveArgs) -> ResolveOptions {
        ResolveOptions {
            input: args.input.clone(),
            output: args.output.clone(),
            duplicate_policy: args.duplicate_policy,
            pretty: args.pretty,
        }
    }
}

/// Polars reads its table display limits from the environment when formatting.
/// A negative limit means unlimited.
fn set_table_display(max_rows: Option<usize>, max_cols: Option<usize>) {
    let limit = |n: Option<usize>| n.map_or(String::from("-1"), |n| n.to_string());
    std::env::set_var("POLARS_FMT_MAX_ROWS", limit(max_rows));
    std::env::set_var("POLARS_FMT_MAX_COLS", limit(max_cols));
    std::env::set_var("POLARS_FMT_STR_LEN", "100");
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    let start = Instant::now();
    match &cli.command {
        Commands::Extract(args) => {
            let filtered = extract::run_extractor(&ExtractOptions::from(args))?;
            set_table_display(args.max_rows, args.max_cols);
            println!("{}", filtered);
            println!("--");
        }
        Commands::Resolve(args) => {
            resolver::run_resolver(&ResolveOptions::from(args))?;
        }
    }

    debug!(
        "Finished in {:?}. Peak memory usage was {} MB",
        start.elapsed(),
        PEAK_ALLOC.peak_usage_as_mb()
    );
    Ok(())
}
