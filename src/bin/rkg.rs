//! rkg CLI: research a topic and write the knowledge graph as markdown.
//!
//! Usage:
//!   rkg <topic> [--output-dir DIR] [--config FILE] [--verbose]

use clap::Parser;
use rkg::{Pipeline, ResearchState, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rkg",
    version,
    about = "Research knowledge-graph generator"
)]
struct Cli {
    /// Research topic, e.g. "graph neural networks"
    topic: String,
    /// Directory for the generated markdown pages
    #[arg(long, short)]
    output_dir: Option<PathBuf>,
    /// Path to a YAML settings file
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report(state: &ResearchState) {
    match &state.output_path {
        Some(path) => println!("Knowledge graph written to {}", path.display()),
        None => println!("No output written"),
    }
    println!(
        "Steps: {}, concepts: {}, relationships: {}",
        state.step_count,
        state.concepts.len(),
        state.relationships.len()
    );
    if !state.errors.is_empty() {
        eprintln!("Warnings ({}):", state.errors.len());
        for error in &state.errors {
            eprintln!("  - {}", error);
        }
    }
}

async fn cmd_research(cli: Cli) -> i32 {
    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // logging is not up yet
            eprintln!("Error: {}", e);
            return 2;
        }
    };
    init_logging(&settings.log_level, cli.verbose);

    if let Some(dir) = cli.output_dir {
        settings.output.dir = dir;
    }

    let pipeline = match Pipeline::from_settings(settings) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };

    match pipeline.run(&cli.topic).await {
        Ok(state) => {
            report(&state);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = cmd_research(cli).await;
    std::process::exit(code);
}
