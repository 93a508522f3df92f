//! Usage Analysis Engine
//!
//! This module coordinates the cost analysis pipeline. It is the entry point used by the
//! binary and by integration tests.
//!
//! ## Pipeline
//!
//! 1. **Discovery**: [`FileDiscovery`] finds session logs under `<claude_dir>/projects`
//! 2. **Aggregation**: [`Aggregator`] decodes, correlates and folds each file in order
//! 3. **Statistics**: derived figures are computed on demand from the finished
//!    [`CostAnalysis`] by [`crate::statistics::Statistics`]
//! 4. **Reporting**: [`DisplayManager`] renders the terminal or JSON report
//!
//! Processing is single-threaded and synchronous. An empty input set is the only
//! condition that aborts a run ([`CostsError::NoJsonlFiles`]); unreadable files are
//! skipped with a warning.
//!
//! ## Usage Example
//!
//! ```no_run
//! use claude_costs::analyzer::ClaudeCostAnalyzer;
//! use chrono::{Duration, Local};
//!
//! # fn example() -> anyhow::Result<()> {
//! let analyzer = ClaudeCostAnalyzer::new("/home/me/.claude");
//! let analysis = analyzer.analyze(Local::now() - Duration::days(30))?;
//! println!("Total: ${:.2}", analysis.total_cost);
//! # Ok(())
//! # }
//! ```

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::display::DisplayManager;
use crate::error::CostsError;
use crate::file_discovery::FileDiscovery;
use crate::models::CostAnalysis;
use crate::session_utils::ProjectNameCache;
use anyhow::Result;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ClaudeCostAnalyzer {
    claude_dir: PathBuf,
    discovery: FileDiscovery,
    home: Option<PathBuf>,
}

impl ClaudeCostAnalyzer {
    pub fn new(claude_dir: impl Into<PathBuf>) -> Self {
        Self {
            claude_dir: claude_dir.into(),
            discovery: FileDiscovery::new(),
            home: dirs::home_dir(),
        }
    }

    /// Override the home directory used to shorten decoded project names.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn claude_dir(&self) -> &Path {
        &self.claude_dir
    }

    /// Discover session logs and aggregate everything newer than `cutoff`.
    pub fn analyze(&self, cutoff: DateTime<Local>) -> Result<CostAnalysis> {
        let files = self.discovery.find_jsonl_files(&self.claude_dir)?;
        self.analyze_files(&files, cutoff)
    }

    /// Aggregate an explicit list of session logs.
    ///
    /// Each call starts from an empty aggregate and a fresh project-name cache, so the
    /// same input always yields the same totals.
    pub fn analyze_files(&self, files: &[PathBuf], cutoff: DateTime<Local>) -> Result<CostAnalysis> {
        if files.is_empty() {
            return Err(CostsError::NoJsonlFiles(self.claude_dir.join("projects")).into());
        }

        info!(files = files.len(), cutoff = %cutoff, "Analyzing session files");

        let mut aggregator =
            Aggregator::with_project_names(cutoff, ProjectNameCache::with_home(self.home.clone()));
        aggregator.process_files(files);
        Ok(aggregator.finish())
    }

    /// Analyze with the configured window and print the report.
    pub fn run(&self, config: &Config, now: DateTime<Local>) -> Result<()> {
        let analysis = self.analyze(config.cutoff(now)?)?;
        let display = DisplayManager::from_config(config);
        display.show(&analysis, &self.claude_dir)
    }
}
