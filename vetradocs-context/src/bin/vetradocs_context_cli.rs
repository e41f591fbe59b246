use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use vetradocs_context::DocRecord;

/// A CLI tool to show the search record vetradocs builds for a markdown file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the markdown file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Documentation root the URL is derived against.
    #[arg(short, long, default_value = "./docs")]
    docs: PathBuf,

    /// Path used for title fallback and URL derivation when reading stdin.
    #[arg(short, long, default_value = "./docs/stdin.md")]
    path: PathBuf,

    /// Omit the document body from the output.
    #[arg(long)]
    no_content: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (path, file_content) = if let Some(input_path) = args.input {
        let content = fs::read_to_string(&input_path)?;
        (input_path, content)
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        (args.path, buffer)
    };

    let mut record = DocRecord::from_markdown(&args.docs, &path, &file_content)?;
    if args.no_content {
        record.content.clear();
    }

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
