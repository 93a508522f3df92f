//! Core Data Models
//!
//! This module defines the data structures that flow through the cost analysis pipeline,
//! from a single decoded JSONL line up to the finished [`CostAnalysis`] aggregate.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`LogEntry`] - One line of a Claude Code session log
//! 2. **Pricing**: [`PricingTier`] - Per-million-token rates for one model
//! 3. **Aggregation**: [`SessionStats`], [`ProjectStats`], [`HourlyActivity`],
//!    [`DailyActivity`], [`ToolUseStats`] - Running counters
//! 4. **Aggregate**: [`CostAnalysis`] - Owns every counter plus global totals
//!
//! ## Schema Tolerance
//!
//! Log lines are written by several generations of the client, so every field of
//! [`LogEntry`] is optional and unknown fields are ignored. The `message.content`
//! field is either a plain string or a list of heterogeneous objects; it is decoded
//! into the [`Content`] tagged union. `toolUseResult` is an object in some records and
//! a bare string in others; only the object form carries the `interrupted` flag.

use chrono::{DateTime, Duration, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Record discriminator taken from the `type` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum EntryKind {
    User,
    Assistant,
    #[default]
    Unknown,
    Other(String),
}

impl From<Option<String>> for EntryKind {
    fn from(kind: Option<String>) -> Self {
        match kind.as_deref() {
            Some("user") => EntryKind::User,
            Some("assistant") => EntryKind::Assistant,
            Some(other) => EntryKind::Other(other.to_string()),
            None => EntryKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogEntry {
    #[serde(default, rename = "uuid")]
    pub id: Option<String>,
    #[serde(default, rename = "parentUuid")]
    pub parent_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
    #[serde(default, rename = "costUSD")]
    pub legacy_cost_usd: Option<f64>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default, rename = "toolUseResult", deserialize_with = "lenient_tool_result")]
    pub tool_result: Option<ToolUseResult>,
}

impl LogEntry {
    /// Identifier usable as a correlation key, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.message.as_ref().and_then(|m| m.usage.as_ref())
    }

    pub fn model(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.model.as_deref())
    }

    pub fn was_interrupted(&self) -> bool {
        self.tool_result.as_ref().is_some_and(|r| r.interrupted)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Token counts reported for one assistant reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub output_tokens: u64,
    #[serde(default, rename = "cache_creation_input_tokens", deserialize_with = "null_as_zero")]
    pub cache_write_tokens: u64,
    #[serde(default, rename = "cache_read_input_tokens", deserialize_with = "null_as_zero")]
    pub cache_read_tokens: u64,
}

/// Token counts are sometimes written as `null`; treat them like a missing key.
fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolUseResult {
    pub interrupted: bool,
}

fn lenient_tool_result<'de, D>(deserializer: D) -> Result<Option<ToolUseResult>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_object().map(|obj| ToolUseResult {
            interrupted: obj
                .get("interrupted")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }))
}

/// Message body: either plain text or a list of typed items.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    PlainText(String),
    Items(Vec<ContentItem>),
}

impl Content {
    pub fn items(&self) -> &[ContentItem] {
        match self {
            Content::PlainText(_) => &[],
            Content::Items(items) => items,
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Content::PlainText(text),
            Value::Array(values) => {
                Content::Items(values.iter().filter_map(ContentItem::from_value).collect())
            }
            // Any other shape carries nothing the pipeline reads.
            _ => Content::Items(Vec::new()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentItem {
    pub kind: String,
    /// The item's `content` field when it is a string.
    pub text: Option<String>,
    pub is_error: bool,
}

impl ContentItem {
    pub const TOOL_RESULT: &'static str = "tool_result";

    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            kind: obj
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            text: obj
                .get("content")
                .and_then(Value::as_str)
                .map(str::to_string),
            is_error: obj.get("is_error").and_then(Value::as_bool).unwrap_or(false),
        })
    }

    pub fn is_tool_result(&self) -> bool {
        self.kind == Self::TOOL_RESULT
    }
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    pub input: f64,
    pub output: f64,
    pub cache_write: f64,
    pub cache_read: f64,
}

/// Token breakdown attributed to one costed entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenBreakdown {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
}

impl From<&Usage> for TokenBreakdown {
    fn from(usage: &Usage) -> Self {
        Self {
            input: usage.input_tokens,
            output: usage.output_tokens,
            cache_read: usage.cache_read_tokens,
            cache_write: usage.cache_write_tokens,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub start_time: Option<DateTime<Local>>,
    pub end_time: Option<DateTime<Local>>,
    pub response_times: Vec<Duration>,
    pub cost: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
    /// Input plus output only; cache tokens are tracked in their own fields.
    pub total_tokens: u64,
    pub message_count: usize,
}

impl SessionStats {
    pub fn observe(&mut self, timestamp: DateTime<Local>) {
        self.message_count += 1;
        if self.start_time.map_or(true, |start| timestamp < start) {
            self.start_time = Some(timestamp);
        }
        if self.end_time.map_or(true, |end| timestamp > end) {
            self.end_time = Some(timestamp);
        }
    }

    pub fn add_cost(&mut self, cost: f64, tokens: &TokenBreakdown) {
        self.cost += cost;
        self.input_tokens += tokens.input;
        self.output_tokens += tokens.output;
        self.cache_read_tokens += tokens.cache_read;
        self.cache_write_tokens += tokens.cache_write;
        self.total_tokens += tokens.input + tokens.output;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectStats {
    pub active_days: BTreeSet<String>,
    pub session_ids: BTreeSet<String>,
    pub response_times: Vec<Duration>,
    pub cost: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
    pub total_tokens: u64,
}

impl ProjectStats {
    pub fn sessions(&self) -> usize {
        self.session_ids.len()
    }

    pub fn add_cost(&mut self, cost: f64, tokens: &TokenBreakdown) {
        self.cost += cost;
        self.input_tokens += tokens.input;
        self.output_tokens += tokens.output;
        self.cache_read_tokens += tokens.cache_read;
        self.cache_write_tokens += tokens.cache_write;
        self.total_tokens += tokens.input + tokens.output;
    }

    pub fn all_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_read_tokens + self.cache_write_tokens
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HourlyActivity {
    pub message_count: usize,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailyActivity {
    pub message_count: usize,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ToolUseStats {
    pub accepted: usize,
    pub rejected: usize,
}

impl ToolUseStats {
    pub fn total(&self) -> usize {
        self.accepted + self.rejected
    }
}

/// The complete aggregate.
///
/// Sessions and projects keep first-seen order so that ranking ties and summed
/// totals come out the same on every run over the same input.
#[derive(Debug, Clone, Default)]
pub struct CostAnalysis {
    pub start_date: Option<DateTime<Local>>,
    pub end_date: Option<DateTime<Local>>,
    pub response_times: Vec<Duration>,
    pub sessions: IndexMap<String, SessionStats>,
    pub projects: IndexMap<String, ProjectStats>,
    pub hourly_activity: BTreeMap<u32, HourlyActivity>,
    pub daily_activity: BTreeMap<String, DailyActivity>,
    pub model_usage: BTreeMap<String, usize>,
    pub tool_use: ToolUseStats,
    pub total_cost: f64,
    /// Estimate only, see [`crate::statistics::estimate_cache_savings`].
    pub cache_savings: f64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cache_read: u64,
    pub total_cache_write: u64,
}

impl CostAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_timestamp(&mut self, timestamp: DateTime<Local>) {
        if self.start_date.map_or(true, |start| timestamp < start) {
            self.start_date = Some(timestamp);
        }
        if self.end_date.map_or(true, |end| timestamp > end) {
            self.end_date = Some(timestamp);
        }
    }

    /// Inclusive length of the observed period in days.
    pub fn period_days(&self) -> i64 {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (end - start).num_hours() / 24 + 1,
            _ => 0,
        }
    }

    /// Days with at least one costed message.
    pub fn active_days(&self) -> usize {
        self.daily_activity
            .values()
            .filter(|day| day.message_count > 0)
            .count()
    }

    pub fn all_tokens(&self) -> u64 {
        self.total_input_tokens
            + self.total_output_tokens
            + self.total_cache_read
            + self.total_cache_write
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_full_assistant_entry() {
        let line = r#"{"uuid":"a1","parentUuid":"u1","type":"assistant","timestamp":"2025-06-13T14:30:45.123Z","sessionId":"s1","message":{"role":"assistant","model":"claude-sonnet-4-20250514","content":[{"type":"text","text":"hi"}],"usage":{"input_tokens":10,"output_tokens":20,"cache_creation_input_tokens":30,"cache_read_input_tokens":40}},"extra":{"ignored":true}}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();

        assert_eq!(entry.kind, EntryKind::Assistant);
        assert_eq!(entry.id(), Some("a1"));
        assert_eq!(entry.parent_id(), Some("u1"));
        assert_eq!(entry.model(), Some("claude-sonnet-4-20250514"));
        assert_eq!(
            entry.usage().copied(),
            Some(Usage {
                input_tokens: 10,
                output_tokens: 20,
                cache_write_tokens: 30,
                cache_read_tokens: 40,
            })
        );
    }

    #[test]
    fn test_decode_plain_text_content() {
        let line = r#"{"type":"user","timestamp":"2025-06-13T14:30:45Z","message":{"role":"user","content":"hello"}}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();
        let content = entry.message.unwrap().content.unwrap();

        assert_eq!(content, Content::PlainText("hello".to_string()));
        assert!(content.items().is_empty());
    }

    #[test]
    fn test_decode_heterogeneous_items() {
        let line = r#"{"type":"user","message":{"content":[
            {"type":"tool_result","content":"ok","is_error":false},
            {"type":"tool_result","content":[{"type":"text","text":"nested"}],"is_error":true},
            "stray string",
            {"type":"text","text":"plain"}
        ]}}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();
        let content = entry.message.unwrap().content.unwrap();
        let items = content.items();

        assert_eq!(items.len(), 3);
        assert!(items[0].is_tool_result());
        assert_eq!(items[0].text.as_deref(), Some("ok"));
        assert!(items[1].is_error);
        assert_eq!(items[1].text, None);
        assert!(!items[2].is_tool_result());
    }

    #[test]
    fn test_null_and_missing_fields() {
        let line = r#"{"parentUuid":null,"type":null,"costUSD":null,"toolUseResult":"Error: denied"}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();

        assert_eq!(entry.kind, EntryKind::Unknown);
        assert_eq!(entry.parent_id(), None);
        assert_eq!(entry.legacy_cost_usd, None);
        assert!(entry.tool_result.is_none());
        assert!(!entry.was_interrupted());
    }

    #[test]
    fn test_null_token_counts_default_to_zero() {
        let line = r#"{"type":"assistant","timestamp":"2025-06-13T14:30:45Z","message":{"model":"claude-opus-4-20250514","usage":{"input_tokens":1000,"output_tokens":500,"cache_creation_input_tokens":null,"cache_read_input_tokens":null}}}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();

        assert_eq!(
            entry.usage().copied(),
            Some(Usage {
                input_tokens: 1000,
                output_tokens: 500,
                cache_write_tokens: 0,
                cache_read_tokens: 0,
            })
        );
    }

    #[test]
    fn test_empty_ids_are_not_keys() {
        let line = r#"{"uuid":"","parentUuid":"","type":"summary"}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();

        assert_eq!(entry.id(), None);
        assert_eq!(entry.parent_id(), None);
        assert_eq!(entry.kind, EntryKind::Other("summary".to_string()));
    }

    #[test]
    fn test_interrupted_tool_result() {
        let line = r#"{"type":"user","toolUseResult":{"interrupted":true,"stdout":""}}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();
        assert!(entry.was_interrupted());
    }

    #[test]
    fn test_session_bounds_are_order_independent() {
        let late = Local.with_ymd_and_hms(2025, 6, 13, 15, 0, 0).unwrap();
        let early = Local.with_ymd_and_hms(2025, 6, 13, 9, 0, 0).unwrap();
        let mid = Local.with_ymd_and_hms(2025, 6, 13, 12, 0, 0).unwrap();

        let mut session = SessionStats::default();
        session.observe(late);
        session.observe(early);
        session.observe(mid);

        assert_eq!(session.message_count, 3);
        assert_eq!(session.start_time, Some(early));
        assert_eq!(session.end_time, Some(late));
    }

    #[test]
    fn test_total_tokens_excludes_cache() {
        let mut session = SessionStats::default();
        session.add_cost(
            1.0,
            &TokenBreakdown {
                input: 100,
                output: 50,
                cache_read: 1000,
                cache_write: 500,
            },
        );

        assert_eq!(session.total_tokens, 150);
        assert_eq!(session.cache_read_tokens, 1000);
        assert_eq!(session.cache_write_tokens, 500);
    }
}
