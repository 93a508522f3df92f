//! Statistics Engine
//!
//! Pure functions over a finished [`CostAnalysis`]. Nothing here mutates the aggregate.
//!
//! ## Percentiles
//!
//! [`percentile`] uses linear interpolation between the two samples surrounding the
//! fractional rank `p/100 * (n-1)`, so `percentile([1,2,3,4], 50) == 2.5`.
//!
//! ## Cache Savings
//!
//! [`estimate_cache_savings`] is an approximation. It prices every cache-read token at
//! fixed reference rates ($3.00 full input vs $0.30 cache read per million tokens)
//! regardless of which model actually served it, so it is only indicative for
//! non-Sonnet models.

use crate::models::*;
use chrono::Duration;
use serde::Serialize;

/// Reference full input rate for the savings estimate, USD per million tokens.
pub const REFERENCE_INPUT_RATE: f64 = 3.0;
/// Reference cache-read rate for the savings estimate, USD per million tokens.
pub const REFERENCE_CACHE_READ_RATE: f64 = 0.30;

/// Linear-interpolation percentile over samples sorted ascending.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let index = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = lower + 1;

    if upper >= sorted.len() {
        return sorted[sorted.len() - 1];
    }

    let weight = index - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Savings from cache reads compared with paying the full input rate.
pub fn estimate_cache_savings(cache_read_tokens: u64) -> f64 {
    cache_read_tokens as f64 * (REFERENCE_INPUT_RATE - REFERENCE_CACHE_READ_RATE) / 1_000_000.0
}

fn to_seconds(duration: &Duration) -> f64 {
    duration.num_microseconds().map_or_else(
        || duration.num_milliseconds() as f64 / 1_000.0,
        |micros| micros as f64 / 1_000_000.0,
    )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseTimeStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub cost: f64,
    pub sessions: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
    pub active_days: usize,
    /// Seconds; `None` when the project has no response-time samples.
    pub avg_response_time: Option<f64>,
}

impl ProjectSummary {
    pub fn all_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_read_tokens + self.cache_write_tokens
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyData {
    pub hour: u32,
    pub messages: usize,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyData {
    pub date: String,
    pub messages: usize,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelShare {
    pub model: String,
    pub count: usize,
    pub percentage: f64,
}

pub struct Statistics<'a> {
    analysis: &'a CostAnalysis,
}

impl<'a> Statistics<'a> {
    pub fn new(analysis: &'a CostAnalysis) -> Self {
        Self { analysis }
    }

    pub fn average_cost_per_session(&self) -> f64 {
        match self.analysis.sessions.len() {
            0 => 0.0,
            n => self.analysis.total_cost / n as f64,
        }
    }

    pub fn average_tokens_per_session(&self) -> u64 {
        match self.analysis.sessions.len() {
            0 => 0,
            n => (self.analysis.total_input_tokens + self.analysis.total_output_tokens) / n as u64,
        }
    }

    pub fn average_cost_per_active_day(&self) -> f64 {
        match self.analysis.active_days() {
            0 => 0.0,
            n => self.analysis.total_cost / n as f64,
        }
    }

    /// Cache reads as a percentage of input tokens; zero when there were no input tokens.
    pub fn cache_hit_rate(&self) -> f64 {
        if self.analysis.total_input_tokens == 0 {
            return 0.0;
        }
        self.analysis.total_cache_read as f64 / self.analysis.total_input_tokens as f64 * 100.0
    }

    /// Percentage of tool results accepted; `None` when no tool results were seen.
    pub fn tool_acceptance_rate(&self) -> Option<f64> {
        let tool_use = &self.analysis.tool_use;
        match tool_use.total() {
            0 => None,
            total => Some(tool_use.accepted as f64 / total as f64 * 100.0),
        }
    }

    pub fn response_time_stats(&self) -> ResponseTimeStats {
        let mut times: Vec<f64> = self.analysis.response_times.iter().map(to_seconds).collect();
        if times.is_empty() {
            return ResponseTimeStats::default();
        }
        times.sort_by(f64::total_cmp);

        ResponseTimeStats {
            count: times.len(),
            min: times[0],
            max: times[times.len() - 1],
            average: times.iter().sum::<f64>() / times.len() as f64,
            p50: percentile(&times, 50.0),
            p90: percentile(&times, 90.0),
            p95: percentile(&times, 95.0),
            p99: percentile(&times, 99.0),
        }
    }

    /// Projects by cost, highest first. Equal costs keep first-seen order.
    /// A `limit` of zero returns every project.
    pub fn top_projects(&self, limit: usize) -> Vec<ProjectSummary> {
        let mut projects: Vec<ProjectSummary> = self
            .analysis
            .projects
            .iter()
            .map(|(name, project)| ProjectSummary {
                name: name.clone(),
                cost: project.cost,
                sessions: project.sessions(),
                input_tokens: project.input_tokens,
                output_tokens: project.output_tokens,
                cache_read_tokens: project.cache_read_tokens,
                cache_write_tokens: project.cache_write_tokens,
                active_days: project.active_days.len(),
                avg_response_time: (!project.response_times.is_empty()).then(|| {
                    project.response_times.iter().map(to_seconds).sum::<f64>()
                        / project.response_times.len() as f64
                }),
            })
            .collect();

        // sort_by is stable
        projects.sort_by(|a, b| b.cost.total_cmp(&a.cost));

        if limit > 0 {
            projects.truncate(limit);
        }
        projects
    }

    /// One slot per hour of day, zero-filled.
    pub fn hourly_distribution(&self) -> Vec<HourlyData> {
        (0..24)
            .map(|hour| {
                let activity = self
                    .analysis
                    .hourly_activity
                    .get(&hour)
                    .copied()
                    .unwrap_or_default();
                HourlyData {
                    hour,
                    messages: activity.message_count,
                    cost: activity.cost,
                }
            })
            .collect()
    }

    /// Days with activity in chronological order.
    pub fn daily_trend(&self) -> Vec<DailyData> {
        self.analysis
            .daily_activity
            .iter()
            .map(|(date, activity)| DailyData {
                date: date.clone(),
                messages: activity.message_count,
                cost: activity.cost,
            })
            .collect()
    }

    /// Models by occurrence count, highest first.
    pub fn model_distribution(&self) -> Vec<ModelShare> {
        let total: usize = self.analysis.model_usage.values().sum();

        let mut models: Vec<ModelShare> = self
            .analysis
            .model_usage
            .iter()
            .map(|(model, &count)| ModelShare {
                model: model.clone(),
                count,
                percentage: if total > 0 {
                    count as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        models.sort_by(|a, b| b.count.cmp(&a.count));
        models
    }
}
