//! Shared fixtures: a throwaway Claude directory and JSONL line builders.
#![allow(dead_code)]

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SONNET: &str = "claude-sonnet-4-20250514";
pub const OPUS: &str = "claude-opus-4-20250514";

/// A `.claude` directory inside a temp dir.
pub struct ClaudeHome {
    dir: TempDir,
}

impl ClaudeHome {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".claude").join("projects")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn claude_dir(&self) -> PathBuf {
        self.dir.path().join(".claude")
    }

    /// Write `projects/<project>/<session>.jsonl` and return its path.
    pub fn session(&self, project: &str, session: &str, lines: &[String]) -> PathBuf {
        let project_dir = self.claude_dir().join("projects").join(project);
        fs::create_dir_all(&project_dir).unwrap();
        let path = project_dir.join(format!("{}.jsonl", session));
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&path, content).unwrap();
        path
    }
}

pub fn ts(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A fixed instant well inside any test window built around it.
pub fn base_time() -> DateTime<Utc> {
    Utc::now() - Duration::hours(2)
}

pub fn user_line(uuid: &str, time: DateTime<Utc>) -> String {
    json!({
        "uuid": uuid,
        "parentUuid": null,
        "type": "user",
        "timestamp": ts(time),
        "message": {"role": "user", "content": "please help"}
    })
    .to_string()
}

pub fn assistant_line(
    uuid: &str,
    parent: &str,
    time: DateTime<Utc>,
    model: &str,
    input: u64,
    output: u64,
) -> String {
    assistant_line_with_cache(uuid, parent, time, model, input, output, 0, 0)
}

#[allow(clippy::too_many_arguments)]
pub fn assistant_line_with_cache(
    uuid: &str,
    parent: &str,
    time: DateTime<Utc>,
    model: &str,
    input: u64,
    output: u64,
    cache_write: u64,
    cache_read: u64,
) -> String {
    json!({
        "uuid": uuid,
        "parentUuid": parent,
        "type": "assistant",
        "timestamp": ts(time),
        "message": {
            "role": "assistant",
            "model": model,
            "content": [{"type": "text", "text": "done"}],
            "usage": {
                "input_tokens": input,
                "output_tokens": output,
                "cache_creation_input_tokens": cache_write,
                "cache_read_input_tokens": cache_read
            }
        }
    })
    .to_string()
}

pub fn legacy_cost_line(uuid: &str, parent: &str, time: DateTime<Utc>, cost: f64) -> String {
    json!({
        "uuid": uuid,
        "parentUuid": parent,
        "type": "assistant",
        "timestamp": ts(time),
        "costUSD": cost
    })
    .to_string()
}

pub fn tool_result_line(uuid: &str, time: DateTime<Utc>, content: &str, is_error: bool) -> String {
    json!({
        "uuid": uuid,
        "type": "user",
        "timestamp": ts(time),
        "message": {
            "role": "user",
            "content": [{"type": "tool_result", "tool_use_id": "t1", "content": content, "is_error": is_error}]
        }
    })
    .to_string()
}

pub fn interrupted_line(uuid: &str, time: DateTime<Utc>) -> String {
    json!({
        "uuid": uuid,
        "type": "user",
        "timestamp": ts(time),
        "toolUseResult": {"interrupted": true},
        "message": {
            "role": "user",
            "content": [{"type": "tool_result", "content": "partial output", "is_error": false}]
        }
    })
    .to_string()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
