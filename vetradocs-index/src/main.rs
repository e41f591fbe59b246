use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use vetradocs_index::indexing::{DEFAULT_DOCS_DIR, DEFAULT_OUTPUT_PATH, Indexer, IndexerConfig};

/// Build the vetradocs search index from a tree of markdown files.
#[derive(Parser, Debug)]
#[command(name = "vetradocs-build", author, version, about, long_about = None)]
struct Args {
    /// Path to your docs directory
    #[arg(long, default_value = DEFAULT_DOCS_DIR)]
    docs: PathBuf,

    /// Output path for the index
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Log every indexed file
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = run(args).await {
        eprintln!("Build failed: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(args: &Args) {
    let default_level = if args.verbose {
        "vetradocs_index=debug"
    } else if args.quiet {
        "warn"
    } else {
        "vetradocs_index=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = IndexerConfig::new(args.docs, args.output).resolve(&cwd);

    println!("Building search index...");
    println!("Scanning: {}", config.docs_dir.display());

    let report = Indexer::new(config).build().await?;

    if report.indexed == 0 {
        println!("No markdown files found in the docs directory.");
    }
    println!("Indexed {} documents.", report.indexed);
    println!("Index saved to: {}", report.output_path.display());
    Ok(())
}
