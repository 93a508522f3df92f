//! Aggregation Engine
//!
//! Folds decoded session logs into a single [`CostAnalysis`]. Files are processed one at
//! a time, in the order given; each file is read completely, indexed by the
//! [`Correlator`], and then its entries are folded in file order.
//!
//! ## Processing Rules
//!
//! ### User entries
//! Every `tool_result` content item is counted exactly once, either as accepted or as
//! rejected. An item is rejected when the first matching check in [`REJECTION_CHECKS`]
//! fires: the entry's tool result reports an interruption, the item text contains a
//! rejection phrase, or the item carries an error flag.
//!
//! ### Assistant entries
//! 1. **Response time**: when the parent is a user entry, the elapsed time is recorded
//!    globally, for the project and for the session, but only inside `(0, 5 min)`.
//!    Anything else is treated as clock skew or an idle gap and dropped.
//! 2. **Session and project tracking**: message count, time bounds, distinct sessions
//!    and distinct active days.
//! 3. **Cost**: via [`PricingManager::entry_cost`]. Entries with no cost and no model stop
//!    here. Otherwise the model counter, hourly and daily buckets, and the session and
//!    project totals are updated.
//!
//! Entries older than the lookback cutoff never reach any counter.
//!
//! ## Failure Handling
//!
//! A file that cannot be read is logged with `warn!` and skipped; the remaining files
//! are still processed. Malformed lines inside a readable file are skipped silently.

use crate::correlator::Correlator;
use crate::models::*;
use crate::parser::{FileParser, ProcessedEntry};
use crate::pricing::{EntryCost, PricingManager};
use crate::session_utils::{ProjectNameCache, SessionUtils};
use crate::statistics;
use crate::timestamp_parser::TimestampParser;
use anyhow::Result;
use chrono::{DateTime, Duration, Local, Timelike};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Upper bound (exclusive) for a response time to count.
pub const MAX_RESPONSE_SECONDS: i64 = 300;

pub const REJECTION_PHRASES: &[&str] = &["user doesn't want to proceed", "tool use was rejected"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Interrupted,
    RejectionPhrase,
    ErrorFlag,
}

type RejectionCheck = (Rejection, fn(&LogEntry, &ContentItem) -> bool);

fn interrupted(entry: &LogEntry, _item: &ContentItem) -> bool {
    entry.was_interrupted()
}

fn contains_rejection_phrase(_entry: &LogEntry, item: &ContentItem) -> bool {
    item.text
        .as_deref()
        .is_some_and(|text| REJECTION_PHRASES.iter().any(|phrase| text.contains(phrase)))
}

fn error_flag(_entry: &LogEntry, item: &ContentItem) -> bool {
    item.is_error
}

/// Checked in order; the first match decides.
pub const REJECTION_CHECKS: [RejectionCheck; 3] = [
    (Rejection::Interrupted, interrupted),
    (Rejection::RejectionPhrase, contains_rejection_phrase),
    (Rejection::ErrorFlag, error_flag),
];

pub fn classify_tool_result(entry: &LogEntry, item: &ContentItem) -> Option<Rejection> {
    REJECTION_CHECKS
        .iter()
        .find(|(_, check)| check(entry, item))
        .map(|(rejection, _)| *rejection)
}

pub fn is_countable_response_time(response_time: Duration) -> bool {
    response_time > Duration::zero() && response_time < Duration::seconds(MAX_RESPONSE_SECONDS)
}

pub struct Aggregator {
    analysis: CostAnalysis,
    project_names: ProjectNameCache,
    parser: FileParser,
    cutoff: DateTime<Local>,
    files_processed: usize,
    files_failed: usize,
}

impl Aggregator {
    pub fn new(cutoff: DateTime<Local>) -> Self {
        Self::with_project_names(cutoff, ProjectNameCache::new())
    }

    pub fn with_project_names(cutoff: DateTime<Local>, project_names: ProjectNameCache) -> Self {
        Self {
            analysis: CostAnalysis::new(),
            project_names,
            parser: FileParser::new(),
            cutoff,
            files_processed: 0,
            files_failed: 0,
        }
    }

    pub fn analysis(&self) -> &CostAnalysis {
        &self.analysis
    }

    pub fn files_processed(&self) -> usize {
        self.files_processed
    }

    pub fn files_failed(&self) -> usize {
        self.files_failed
    }

    /// Process every file, skipping (with a warning) the ones that fail.
    pub fn process_files(&mut self, files: &[PathBuf]) {
        for file in files {
            if let Err(e) = self.process_file(file) {
                self.files_failed += 1;
                warn!(file = %file.display(), error = %format!("{:#}", e), "Failed to parse session file, skipping");
            }
        }
    }

    pub fn process_file(&mut self, file_path: &Path) -> Result<()> {
        let entries = self.parser.read_window(file_path, self.cutoff)?;
        let project_name = self.project_names.resolve(file_path);
        let session_id = SessionUtils::session_id(file_path);

        self.fold_entries(&entries, &project_name, &session_id);
        self.files_processed += 1;
        Ok(())
    }

    fn fold_entries(&mut self, entries: &[ProcessedEntry], project_name: &str, session_id: &str) {
        let correlator = Correlator::build(entries);

        // `read_window` has already dropped entries before the cutoff.
        for processed in entries {
            self.analysis.observe_timestamp(processed.timestamp);

            match processed.entry.kind {
                EntryKind::User => self.process_user_entry(&processed.entry),
                EntryKind::Assistant => {
                    self.process_assistant_entry(processed, &correlator, project_name, session_id)
                }
                _ => {}
            }
        }
    }

    fn process_user_entry(&mut self, entry: &LogEntry) {
        let Some(content) = entry.message.as_ref().and_then(|m| m.content.as_ref()) else {
            return;
        };

        for item in content.items().iter().filter(|item| item.is_tool_result()) {
            match classify_tool_result(entry, item) {
                Some(reason) => {
                    debug!(reason = ?reason, "Tool use rejected");
                    self.analysis.tool_use.rejected += 1;
                }
                None => self.analysis.tool_use.accepted += 1,
            }
        }
    }

    fn process_assistant_entry(
        &mut self,
        processed: &ProcessedEntry,
        correlator: &Correlator<'_>,
        project_name: &str,
        session_id: &str,
    ) {
        let timestamp = processed.timestamp;
        let day_key = TimestampParser::day_key(&timestamp);

        self.analysis
            .sessions
            .entry(session_id.to_string())
            .or_default()
            .observe(timestamp);

        let project = self
            .analysis
            .projects
            .entry(project_name.to_string())
            .or_default();
        project.session_ids.insert(session_id.to_string());
        project.active_days.insert(day_key.clone());

        if let Some(parent) = correlator.user_parent_of(processed) {
            self.record_response_time(timestamp - parent.timestamp, project_name, session_id);
        }

        let cost = PricingManager::entry_cost(&processed.entry);
        if cost.is_empty() {
            debug!(line = processed.line_number, session = session_id, "Assistant entry has nothing to bill");
            return;
        }
        self.add_cost(&cost, timestamp, &day_key, project_name, session_id);
    }

    fn record_response_time(&mut self, response_time: Duration, project_name: &str, session_id: &str) {
        if !is_countable_response_time(response_time) {
            debug!(
                response_ms = response_time.num_milliseconds(),
                "Discarding response time outside (0s, 300s)"
            );
            return;
        }

        self.analysis.response_times.push(response_time);
        if let Some(project) = self.analysis.projects.get_mut(project_name) {
            project.response_times.push(response_time);
        }
        if let Some(session) = self.analysis.sessions.get_mut(session_id) {
            session.response_times.push(response_time);
        }
    }

    fn add_cost(
        &mut self,
        cost: &EntryCost,
        timestamp: DateTime<Local>,
        day_key: &str,
        project_name: &str,
        session_id: &str,
    ) {
        if let Some(model) = &cost.model {
            *self.analysis.model_usage.entry(model.clone()).or_insert(0) += 1;
        }

        let hourly = self
            .analysis
            .hourly_activity
            .entry(timestamp.hour())
            .or_default();
        hourly.message_count += 1;
        hourly.cost += cost.usd;

        let daily = self
            .analysis
            .daily_activity
            .entry(day_key.to_string())
            .or_default();
        daily.message_count += 1;
        daily.cost += cost.usd;

        if let Some(session) = self.analysis.sessions.get_mut(session_id) {
            session.add_cost(cost.usd, &cost.tokens);
        }
        if let Some(project) = self.analysis.projects.get_mut(project_name) {
            project.add_cost(cost.usd, &cost.tokens);
        }
    }

    /// Compute global totals and the cache-savings estimate, and hand over the aggregate.
    pub fn finish(self) -> CostAnalysis {
        let mut analysis = self.analysis;

        for session in analysis.sessions.values() {
            analysis.total_cost += session.cost;
            analysis.total_input_tokens += session.input_tokens;
            analysis.total_output_tokens += session.output_tokens;
            analysis.total_cache_read += session.cache_read_tokens;
            analysis.total_cache_write += session.cache_write_tokens;
        }
        analysis.cache_savings = statistics::estimate_cache_savings(analysis.total_cache_read);

        info!(
            files_processed = self.files_processed,
            files_failed = self.files_failed,
            sessions = analysis.sessions.len(),
            projects = analysis.projects.len(),
            total_cost = analysis.total_cost,
            "Aggregation complete"
        );

        analysis
    }
}
