//! Claude Costs Library
//!
//! Analyzes Claude Code session logs (JSONL) to estimate the API-equivalent value of the
//! usage they record, along with tokens, response times, activity patterns, model mix and
//! tool acceptance.
//!
//! ## Architecture Overview
//!
//! - [`models`] - Log entry schema, running counters and the [`CostAnalysis`] aggregate
//! - [`timestamp_parser`] - RFC 3339 timestamps to local time
//! - [`parser`] - Line-oriented JSONL decoding with a pluggable processor
//! - [`correlator`] - Parent/child lookup within one session file
//! - [`pricing`] - Per-model rates and per-entry cost calculation
//! - [`session_utils`] - Session ids and decoded project names
//! - [`aggregator`] - Folds entries into the aggregate
//! - [`statistics`] - Averages, percentiles and rankings over a finished aggregate
//! - [`file_discovery`] - Locates session logs under the Claude directory
//! - [`analyzer`] - Orchestrates discovery, aggregation and reporting
//! - [`display`] - Terminal and JSON reports
//! - [`config`] - Configuration with file and environment overrides
//! - [`logging`] - Structured logging setup
//!
//! ## Main Entry Point
//!
//! ```no_run
//! use claude_costs::{ClaudeCostAnalyzer, Statistics};
//! use chrono::{Duration, Local};
//!
//! # fn example() -> anyhow::Result<()> {
//! let analysis = ClaudeCostAnalyzer::new("/home/me/.claude")
//!     .analyze(Local::now() - Duration::days(30))?;
//! let stats = Statistics::new(&analysis);
//! println!("${:.2} over {} sessions", analysis.total_cost, analysis.sessions.len());
//! println!("p90 response: {:.1}s", stats.response_time_stats().p90);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod correlator;
pub mod display;
pub mod error;
pub mod file_discovery;
pub mod logging;
pub mod models;
pub mod parser;
pub mod pricing;
pub mod session_utils;
pub mod statistics;
pub mod timestamp_parser;

pub use aggregator::Aggregator;
pub use analyzer::ClaudeCostAnalyzer;
pub use config::Config;
pub use error::CostsError;
pub use models::*;
pub use statistics::Statistics;
