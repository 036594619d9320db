//! Markdown status board generation.
//!
//! This module renders a sorted [`StatusBoard`] into the Markdown document
//! written to the output file, plus the reduced error board written when a
//! run fails.

use crate::analysis::{active_records, records_with_status};
use crate::models::{AgentStatus, AgentStatusRecord, BoardStatistics, LaneStats, StatusBoard};
use anyhow::{Context, Result};
use chrono::format::{self, Parsed, StrftimeItems};
use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::path::Path;

const BOARD_TITLE: &str = "# 🤖 Agent Status Board\n";

const TASK_WIDTH: usize = 30;
const BRANCH_WIDTH: usize = 20;
const TIMESTAMP_WIDTH: usize = 16;
const REASON_WIDTH: usize = 40;

/// Generate the complete status board.
pub fn generate_markdown_board(board: &StatusBoard) -> String {
    let mut output = String::new();

    output.push_str(&generate_header(board));
    output.push_str(&generate_active_section(&board.records, board.generated_at));
    output.push_str(&generate_blocked_section(&board.records));
    output.push_str(&generate_idle_section(&board.records));
    output.push_str(&generate_completions_section(&board.records, board.recent_limit));
    output.push_str(&generate_statistics_section(&board.statistics));
    output.push_str(&generate_lane_section(&board.lanes));

    output
}

/// Generate the board written in place of the normal one after a failed run.
pub fn generate_error_board(error: &str, attempted_at: DateTime<Utc>) -> String {
    let mut output = String::new();

    output.push_str(BOARD_TITLE);
    output.push_str(&format!(
        "**Error:** Could not aggregate status - {}\n",
        error
    ));
    output.push_str(&format!(
        "**Last Attempt:** {}\n",
        format_timestamp(attempted_at)
    ));

    output
}

/// Write a rendered board, replacing any previous content.
pub fn write_board(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write status board to {}", path.display()))
}

/// ISO-8601 UTC with a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Cut `value` to at most `width` characters. No ellipsis is added.
pub fn truncate(value: &str, width: usize) -> String {
    value.chars().take(width).collect()
}

/// Elapsed time since `started`, or `-` when it cannot be parsed.
pub fn started_duration(started: Option<&str>, now: DateTime<Utc>) -> String {
    started
        .and_then(parse_timestamp)
        .and_then(|start| format_elapsed(now.signed_duration_since(start)))
        .unwrap_or_else(|| "-".to_string())
}

/// ISO-8601 layouts tried after RFC 3339, extended and basic, down to
/// hour precision. Missing minutes and seconds default to zero.
const ISO_8601_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H%z",
    "%Y%m%dT%H%M%S%.f%z",
    "%Y%m%dT%H%M%z",
    "%Y%m%dT%H%z",
];

/// Parse an ISO-8601 timestamp that carries an offset.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = match value.strip_suffix('Z') {
        Some(rest) => format!("{}+00:00", rest),
        None => value.to_string(),
    };

    ISO_8601_FORMATS
        .iter()
        .find_map(|fmt| parse_with_format(&normalized, fmt))
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_with_format(value: &str, fmt: &str) -> Option<DateTime<FixedOffset>> {
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, value, StrftimeItems::new(fmt)).ok()?;

    // chrono requires a minute; hour-only input means :00. A minute that
    // was already parsed is left alone.
    let _ = parsed.set_minute(0);

    parsed.to_datetime().ok()
}

/// Render as `H:MM:SS`, prefixed with a day count once the span reaches a
/// day. Sub-second remainders are dropped; negative spans floor to whole
/// days with a positive clock part.
pub fn format_elapsed(elapsed: Duration) -> Option<String> {
    const DAY_MICROS: i64 = 86_400_000_000;

    let micros = elapsed.num_microseconds()?;
    let days = micros.div_euclid(DAY_MICROS);
    let secs = micros.rem_euclid(DAY_MICROS) / 1_000_000;

    let clock = format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60);

    if days == 0 {
        Some(clock)
    } else {
        let plural = if days.abs() == 1 { "" } else { "s" };
        Some(format!("{} day{}, {}", days, plural, clock))
    }
}

fn generate_header(board: &StatusBoard) -> String {
    let mut section = String::new();

    section.push_str(BOARD_TITLE);
    section.push_str(&format!(
        "**Last Updated:** {}\n",
        format_timestamp(board.generated_at)
    ));
    section.push_str(&format!("**Total Agents:** {}\n\n", board.statistics.total));

    section
}

fn generate_active_section(records: &[AgentStatusRecord], now: DateTime<Utc>) -> String {
    let active = active_records(records);
    if active.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## 🚀 Active Work\n\n");
    section.push_str("| Agent | Status | Task | Branch | Started | Duration |\n");
    section.push_str("|-------|--------|------|--------|---------|----------|\n");

    for record in active {
        section.push_str(&format!(
            "| {} | {} {} | {} | `{}` | {} | {} |\n",
            record.agent_id(),
            record.status_kind().marker(),
            record.status_label(),
            truncate(AgentStatusRecord::field(&record.task), TASK_WIDTH),
            truncate(AgentStatusRecord::field(&record.branch), BRANCH_WIDTH),
            truncate(AgentStatusRecord::field(&record.started), TIMESTAMP_WIDTH),
            started_duration(record.started.as_deref(), now),
        ));
    }

    section
}

fn generate_blocked_section(records: &[AgentStatusRecord]) -> String {
    let blocked = records_with_status(records, AgentStatus::Blocked);
    if blocked.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("\n## 🚫 Blocked Agents\n\n");
    section.push_str("| Agent | Blocked By | Reason | Duration |\n");
    section.push_str("|-------|------------|--------|----------|\n");

    for record in blocked {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            record.agent_id(),
            AgentStatusRecord::field(&record.blocked_by),
            truncate(AgentStatusRecord::field(&record.reason), REASON_WIDTH),
            AgentStatusRecord::field(&record.blocked_duration),
        ));
    }

    section
}

fn generate_idle_section(records: &[AgentStatusRecord]) -> String {
    let idle = records_with_status(records, AgentStatus::Idle);
    if idle.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("\n## 💤 Idle Agents\n\n");
    section.push_str("| Agent | Last Active | Ready For |\n");
    section.push_str("|-------|-------------|----------|\n");

    for record in idle {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            record.agent_id(),
            truncate(AgentStatusRecord::field(&record.last_update), TIMESTAMP_WIDTH),
            record.ready_for(),
        ));
    }

    section
}

fn generate_completions_section(records: &[AgentStatusRecord], limit: usize) -> String {
    let completed = records_with_status(records, AgentStatus::Completed);
    if completed.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("\n## ✅ Recent Completions\n\n");
    section.push_str("| Agent | Task | Completed | Duration |\n");
    section.push_str("|-------|------|-----------|----------|\n");

    for record in completed.into_iter().take(limit) {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            record.agent_id(),
            truncate(AgentStatusRecord::field(&record.task), TASK_WIDTH),
            truncate(AgentStatusRecord::field(&record.completed), TIMESTAMP_WIDTH),
            AgentStatusRecord::field(&record.duration),
        ));
    }

    section
}

fn generate_statistics_section(stats: &BoardStatistics) -> String {
    let mut section = String::new();

    section.push_str("\n## 📊 Statistics\n\n");
    section.push_str(&format!("- **Active:** {}\n", stats.active));
    section.push_str(&format!("- **Blocked:** {}\n", stats.blocked));
    section.push_str(&format!("- **Idle:** {}\n", stats.idle));
    section.push_str(&format!("- **Completed (recent):** {}\n", stats.completed));

    section
}

fn generate_lane_section(lanes: &BTreeMap<String, LaneStats>) -> String {
    if lanes.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("\n### Lane Utilization\n\n");
    section.push_str("| Lane | Active | Blocked | Idle | Total |\n");
    section.push_str("|------|--------|---------|------|-------|\n");

    for (lane, stats) in lanes {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            lane,
            stats.active,
            stats.blocked,
            stats.idle,
            stats.total()
        ));
    }

    section
}
