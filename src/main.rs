use anyhow::Result;
use chrono::Local;
use clap::Parser;
use claude_costs::logging::init_logging;
use claude_costs::{ClaudeCostAnalyzer, Config};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "claude-costs")]
#[command(about = "Estimate the API value of your Claude Code usage from local session logs")]
#[command(version)]
struct Cli {
    /// Number of days to analyze
    #[arg(long)]
    days: Option<u32>,
    /// Claude directory (defaults to ~/.claude)
    #[arg(long)]
    claude_dir: Option<PathBuf>,
    /// Show every project instead of the top N
    #[arg(short, long)]
    verbose: bool,
    /// Show the token and cache breakdown
    #[arg(long)]
    cache: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
    /// Number of projects in the project table
    #[arg(long)]
    top: Option<usize>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(days) = self.days {
            config.analysis.days = days;
        }
        if let Some(dir) = &self.claude_dir {
            config.paths.claude_home = dir.clone();
        }
        if let Some(top) = self.top {
            config.analysis.top_projects = top;
        }
        config.output.verbose |= self.verbose;
        config.output.show_cache |= self.cache;
        config.output.json |= self.json;
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        handle_error(e, cli.json);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::load()?;
    cli.apply(&mut config);
    config.validate()?;

    let _guard = init_logging(&config.logging, &config.paths.log_directory);

    ClaudeCostAnalyzer::new(&config.paths.claude_home).run(&config, Local::now())
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        let message = serde_json::Value::String(format!("{:#}", e));
        println!("{{\"error\": {}}}", message);
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
