//! SanMar Inventory - command line entry point
//!
//! Reads credentials from the environment (or a `.env` file), resolves the
//! requested styles and exports their warehouse inventory.

use clap::{ArgGroup, Parser};
use sanmar_inventory::runner::DEFAULT_OUTPUT;
use sanmar_inventory::{run, Backend, OutputFormat, RunOptions, RunOutcome, Settings};
use std::path::PathBuf;

/// Look up SanMar warehouse inventory for a set of styles
#[derive(Parser, Debug)]
#[command(name = "sanmar_inventory")]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("source").args(["url", "styles", "styles_file", "search"])))]
struct Args {
    /// Category or search page to scrape style codes from
    #[arg(long)]
    url: Option<String>,

    /// Find styles through the storefront product search, e.g. "pique polo"
    #[arg(long)]
    search: Option<String>,

    /// Comma or space separated style codes, e.g. "K420,PC61"
    #[arg(long)]
    styles: Option<String>,

    /// File with style codes; lines starting with '#' are ignored
    #[arg(long)]
    styles_file: Option<PathBuf>,

    /// Inventory service to query (defaults to SANMAR_BACKEND or promostandards)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Output file; the format's extension is appended when missing
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Output format (defaults to the output extension, then OUTPUT_FORMAT, then xlsx)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Only resolve and print the styles, no inventory lookup
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Only query this color
    #[arg(long)]
    color: Option<String>,

    /// Only query this size
    #[arg(long)]
    size: Option<String>,

    /// Print a warehouse by size table per style after exporting
    #[arg(long, default_value_t = false)]
    summary: bool,
}

impl From<Args> for RunOptions {
    fn from(args: Args) -> Self {
        RunOptions {
            styles: args.styles,
            styles_file: args.styles_file,
            url: args.url,
            search: args.search,
            backend: args.backend,
            output: args.output,
            format: args.format,
            dry_run: args.dry_run,
            color: args.color,
            size: args.size,
            summary: args.summary,
        }
    }
}

fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            eprintln!("Error: configuration: {e}");
            std::process::exit(3);
        }
    };

    match run(&args.into(), &settings) {
        Ok(RunOutcome::DryRun(styles)) => {
            println!("Discovered styles:");
            for style in &styles {
                println!("- {style}");
            }
        }
        Ok(RunOutcome::Exported(summary)) => {
            if !summary.failed_styles.is_empty() {
                println!("Skipped styles: {}", summary.failed_styles.join(", "));
            }
            for matrix in &summary.matrices {
                println!();
                print!("{}", matrix.render());
            }
            println!("Saved {} rows to {}", summary.rows, summary.path.display());
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
