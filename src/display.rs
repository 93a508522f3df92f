//! Output Formatting and Display Management
//!
//! Renders a finished [`CostAnalysis`] either as a colored terminal report or as a
//! structured JSON document.
//!
//! ## Report Sections
//!
//! - **Cost summary**: API-equivalent value, period length, active days, per-session and
//!   per-day averages
//! - **Tokens**: grand total, with an optional breakdown table including cache hit rate
//!   and the estimated cache savings
//! - **Projects**: top projects by cost (all of them in verbose mode)
//! - **Activity patterns**: hourly bar chart and a daily sparkline
//! - **Models**: occurrence counts and shares
//! - **Tool use**: accepted vs rejected tool results
//! - **Response times**: min, average, percentiles and max
//!
//! ## JSON Output
//!
//! With `--json` the same data is emitted as a single [`Report`] object:
//! ```json
//! {
//!   "claude_dir": "/home/me/.claude",
//!   "total_cost": 12.5,
//!   "sessions": 4,
//!   "projects": [{ "name": "src/app", "cost": 10.0, "sessions": 3, ... }],
//!   "response_times": { "count": 20, "p50": 6.2, ... }
//! }
//! ```

use crate::config::Config;
use crate::models::*;
use crate::statistics::*;
use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

const DEFAULT_TOP_PROJECTS: usize = 10;
const PROJECT_NAME_WIDTH: usize = 40;
const BAR_WIDTH: usize = 20;
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Serialize)]
pub struct TokenTotals {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
    pub total: u64,
    pub cache_hit_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolUseSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub acceptance_rate: Option<f64>,
}

/// Everything the report shows, in serializable form.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub claude_dir: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period_days: i64,
    pub active_days: usize,
    pub total_cost: f64,
    /// Approximation at fixed reference rates.
    pub estimated_cache_savings: f64,
    pub sessions: usize,
    pub average_cost_per_session: f64,
    pub average_cost_per_day: f64,
    pub average_tokens_per_session: u64,
    pub tokens: TokenTotals,
    pub projects: Vec<ProjectSummary>,
    pub total_projects: usize,
    pub hourly: Vec<HourlyData>,
    pub daily: Vec<DailyData>,
    pub models: Vec<ModelShare>,
    pub tool_use: ToolUseSummary,
    pub response_times: ResponseTimeStats,
}

impl Report {
    pub fn build(analysis: &CostAnalysis, claude_dir: &Path, top_projects: usize) -> Self {
        let stats = Statistics::new(analysis);

        Self {
            claude_dir: claude_dir.display().to_string(),
            start_date: analysis.start_date.map(|d| d.format("%Y-%m-%d").to_string()),
            end_date: analysis.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
            period_days: analysis.period_days(),
            active_days: analysis.active_days(),
            total_cost: analysis.total_cost,
            estimated_cache_savings: analysis.cache_savings,
            sessions: analysis.sessions.len(),
            average_cost_per_session: stats.average_cost_per_session(),
            average_cost_per_day: stats.average_cost_per_active_day(),
            average_tokens_per_session: stats.average_tokens_per_session(),
            tokens: TokenTotals {
                input: analysis.total_input_tokens,
                output: analysis.total_output_tokens,
                cache_read: analysis.total_cache_read,
                cache_write: analysis.total_cache_write,
                total: analysis.all_tokens(),
                cache_hit_rate: stats.cache_hit_rate(),
            },
            projects: stats.top_projects(top_projects),
            total_projects: analysis.projects.len(),
            hourly: stats.hourly_distribution(),
            daily: stats.daily_trend(),
            models: stats.model_distribution(),
            tool_use: ToolUseSummary {
                accepted: analysis.tool_use.accepted,
                rejected: analysis.tool_use.rejected,
                acceptance_rate: stats.tool_acceptance_rate(),
            },
            response_times: stats.response_time_stats(),
        }
    }
}

pub struct DisplayManager {
    pub verbose: bool,
    pub show_cache: bool,
    pub json_output: bool,
    pub json_pretty: bool,
    pub top_projects: usize,
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self {
            verbose: false,
            show_cache: false,
            json_output: false,
            json_pretty: true,
            top_projects: DEFAULT_TOP_PROJECTS,
        }
    }
}

impl DisplayManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            verbose: config.output.verbose,
            show_cache: config.output.show_cache,
            json_output: config.output.json,
            json_pretty: config.output.json_pretty,
            top_projects: config.analysis.top_projects,
        }
    }

    fn project_limit(&self) -> usize {
        if self.verbose {
            0
        } else {
            self.top_projects
        }
    }

    pub fn show(&self, analysis: &CostAnalysis, claude_dir: &Path) -> Result<()> {
        if self.json_output {
            println!("{}", self.render_json(analysis, claude_dir)?);
        } else {
            print!("{}", self.render_text(analysis, claude_dir));
        }
        Ok(())
    }

    pub fn render_json(&self, analysis: &CostAnalysis, claude_dir: &Path) -> Result<String> {
        let report = Report::build(analysis, claude_dir, self.project_limit());
        let json = if self.json_pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };
        json.context("Failed to serialize report to JSON")
    }

    pub fn render_text(&self, analysis: &CostAnalysis, claude_dir: &Path) -> String {
        let report = Report::build(analysis, claude_dir, self.project_limit());
        let mut out = String::new();

        let _ = writeln!(out, "Analyzing: {}\n", report.claude_dir);
        self.write_cost_summary(&mut out, &report);
        self.write_token_summary(&mut out, &report);
        self.write_project_costs(&mut out, &report);
        self.write_activity_patterns(&mut out, &report);
        self.write_model_usage(&mut out, &report);
        self.write_tool_use(&mut out, &report);
        self.write_response_times(&mut out, &report);

        out
    }

    fn write_cost_summary(&self, out: &mut String, report: &Report) {
        let _ = writeln!(
            out,
            "💰 {} API value (last {} days, {} with activity)",
            format_currency(report.total_cost).bold(),
            report.period_days,
            report.active_days
        );
        let _ = writeln!(
            out,
            "📊 {} sessions • {}/session • {}/day",
            report.sessions,
            format_currency(report.average_cost_per_session),
            format_currency(report.average_cost_per_day)
        );
        let _ = writeln!(
            out,
            "{}",
            "Note: This shows API value, not your actual subscription cost".dimmed()
        );
        let _ = writeln!(out);
    }

    fn write_token_summary(&self, out: &mut String, report: &Report) {
        let tokens = &report.tokens;
        let _ = writeln!(
            out,
            "{}",
            format!("🔤 {} tokens total", format_tokens_with_suffix(tokens.total)).bold()
        );

        if self.show_cache {
            let rows = vec![
                vec!["Input Tokens".to_string(), format_number(tokens.input)],
                vec!["Output Tokens".to_string(), format_number(tokens.output)],
                vec!["Cache Read Tokens".to_string(), format_number(tokens.cache_read)],
                vec!["Cache Write Tokens".to_string(), format_number(tokens.cache_write)],
                vec!["Cache Hit Rate".to_string(), format!("{:.1}%", tokens.cache_hit_rate)],
                vec![
                    "Est. Cache Savings".to_string(),
                    format_currency(report.estimated_cache_savings),
                ],
                vec!["Total Tokens".to_string(), format_number(tokens.total)],
            ];
            out.push_str(&render_table(&[], rows));
        }
        let _ = writeln!(out);
    }

    fn write_project_costs(&self, out: &mut String, report: &Report) {
        let _ = writeln!(out, "{}", "📁 Project Costs".bold());

        let rows: Vec<Vec<String>> = report
            .projects
            .iter()
            .map(|project| {
                vec![
                    truncate_string(&project.name, PROJECT_NAME_WIDTH),
                    format_currency(project.cost),
                    project.sessions.to_string(),
                    format_tokens_with_suffix(project.all_tokens()),
                    project.active_days.to_string(),
                    project
                        .avg_response_time
                        .map_or_else(|| "N/A".to_string(), format_seconds),
                ]
            })
            .collect();
        out.push_str(&render_table(
            &["Project", "Cost", "Sessions", "Tokens", "Days", "Avg Response"],
            rows,
        ));

        if report.projects.len() < report.total_projects {
            let _ = writeln!(
                out,
                "\nShowing top {} of {} projects. Use -v to see all.",
                report.projects.len(),
                report.total_projects
            );
        }
        let _ = writeln!(out);
    }

    fn write_activity_patterns(&self, out: &mut String, report: &Report) {
        let _ = writeln!(out, "{}", "⏰ Activity Patterns".bold());

        let _ = writeln!(out, "\nHourly Distribution:");
        let max_hourly = report.hourly.iter().map(|h| h.messages).max().unwrap_or(0);
        for hour in &report.hourly {
            let _ = writeln!(
                out,
                "{:02}:00 {} {}",
                hour.hour,
                create_bar(hour.messages, max_hourly, BAR_WIDTH).cyan(),
                hour.messages
            );
        }

        let _ = writeln!(out, "\nDaily Activity:");
        let values: Vec<usize> = report.daily.iter().map(|d| d.messages).collect();
        if !values.is_empty() {
            let _ = writeln!(out, "{}", create_sparkline(&values).green());
        }
        let _ = writeln!(out);
    }

    fn write_model_usage(&self, out: &mut String, report: &Report) {
        let _ = writeln!(out, "{}", "🤖 Model Usage".bold());

        let rows: Vec<Vec<String>> = report
            .models
            .iter()
            .map(|m| {
                vec![
                    m.model.clone(),
                    m.count.to_string(),
                    format!("{:.1}%", m.percentage),
                ]
            })
            .collect();
        out.push_str(&render_table(&["Model", "Count", "Percentage"], rows));
        let _ = writeln!(out);
    }

    fn write_tool_use(&self, out: &mut String, report: &Report) {
        let Some(rate) = report.tool_use.acceptance_rate else {
            return;
        };

        let _ = writeln!(out, "{}", "🔧 Tool Use".bold());
        let _ = writeln!(
            out,
            "Accepted: {} ({:.1}%)",
            report.tool_use.accepted.to_string().green(),
            rate
        );
        let _ = writeln!(
            out,
            "Rejected: {} ({:.1}%)",
            report.tool_use.rejected.to_string().red(),
            100.0 - rate
        );
        let _ = writeln!(out);
    }

    fn write_response_times(&self, out: &mut String, report: &Report) {
        let stats = &report.response_times;
        if stats.count == 0 {
            return;
        }

        let _ = writeln!(out, "{}", "⏱️  Response Times".bold());
        let rows: Vec<Vec<String>> = [
            ("Min", stats.min),
            ("Average", stats.average),
            ("P50", stats.p50),
            ("P90", stats.p90),
            ("P95", stats.p95),
            ("P99", stats.p99),
            ("Max", stats.max),
        ]
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), format_seconds(value)])
        .collect();
        out.push_str(&render_table(&[], rows));
        let _ = writeln!(out);
    }
}

// Formatting helpers

pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Thousands separators: 1234567 -> "1,234,567".
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

pub fn format_tokens_with_suffix(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

pub fn format_seconds(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else {
        format!("{:.1}s", seconds)
    }
}

pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn create_bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let mut filled = value * width / max;
    if filled == 0 && value > 0 {
        filled = 1;
    }
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn create_sparkline(values: &[usize]) -> String {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return String::new();
    };

    if max == min {
        return SPARKS[3].to_string().repeat(values.len());
    }

    values
        .iter()
        .map(|&v| SPARKS[(v - min) * (SPARKS.len() - 1) / (max - min)])
        .collect()
}

fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Disabled);
    // Follow the same NO_COLOR / override decision as the rest of the report.
    if !colored::control::SHOULD_COLORIZE.should_colorize() {
        table.force_no_tty();
    }

    if !headers.is_empty() {
        table.set_header(headers.iter().map(|h| Cell::new(h).add_attribute(Attribute::Bold)));
    }
    for row in rows {
        table.add_row(row);
    }

    format!("{}\n", table)
}
