//! Data models for the status board.
//!
//! This module contains the agent status record read from disk, the
//! closed status classification, and the aggregate structures the
//! report generator renders.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder rendered for absent optional fields.
pub const PLACEHOLDER: &str = "-";

/// Identifier used when a record carries no `agentId`.
pub const UNKNOWN_AGENT: &str = "unknown";

/// Lane used when a record carries no `lane`.
pub const UNKNOWN_LANE: &str = "unknown";

/// Default value of the `readyFor` column.
pub const DEFAULT_READY_FOR: &str = "Any task";

/// Message stored in the synthetic `system` record.
pub const SYSTEM_MESSAGE: &str = "System initialized. Waiting for first coordinator run.";

/// Status category of an agent, derived from the raw `status` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentStatus {
    /// Agent is actively working a task.
    InProgress,
    /// Agent cannot proceed until something else finishes.
    Blocked,
    /// Agent is waiting on input, but not blocked.
    Waiting,
    /// Agent has nothing assigned.
    Idle,
    /// Agent finished its task.
    Completed,
    /// Missing or unrecognized status.
    Unknown,
}

impl AgentStatus {
    /// Sort rank, lower sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            AgentStatus::InProgress => 0,
            AgentStatus::Blocked => 1,
            AgentStatus::Waiting => 2,
            AgentStatus::Idle => 3,
            AgentStatus::Completed => 4,
            AgentStatus::Unknown => 5,
        }
    }

    /// Returns an emoji marker for the Active Work table.
    pub fn marker(&self) -> &'static str {
        match self {
            AgentStatus::InProgress => "🔄",
            AgentStatus::Blocked => "🚫",
            AgentStatus::Waiting => "⏳",
            _ => "❓",
        }
    }

    /// Whether the record belongs in the Active Work section.
    pub fn is_active(&self) -> bool {
        !matches!(self, AgentStatus::Idle | AgentStatus::Completed)
    }
}

impl From<Option<&str>> for AgentStatus {
    fn from(s: Option<&str>) -> Self {
        match s {
            Some("in_progress") => AgentStatus::InProgress,
            Some("blocked") => AgentStatus::Blocked,
            Some("waiting") => AgentStatus::Waiting,
            Some("idle") => AgentStatus::Idle,
            Some("completed") => AgentStatus::Completed,
            _ => AgentStatus::Unknown,
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::InProgress => write!(f, "in_progress"),
            AgentStatus::Blocked => write!(f, "blocked"),
            AgentStatus::Waiting => write!(f, "waiting"),
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Completed => write!(f, "completed"),
            AgentStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One agent's status snapshot, read from one status file.
///
/// Every key is optional. Accessors apply the display defaults so the
/// renderer never sees a missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatusRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub blocked_duration: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub ready_for: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub lane: Option<String>,
}

/// Accept any JSON scalar as text; `null` counts as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl AgentStatusRecord {
    /// Creates the synthetic `system` record used when no status files exist.
    pub fn system_placeholder(now: DateTime<Utc>) -> Self {
        Self {
            agent_id: Some("system".to_string()),
            kind: Some("system".to_string()),
            status: Some("idle".to_string()),
            last_update: Some(now.to_rfc3339_opts(SecondsFormat::Micros, true)),
            message: Some(SYSTEM_MESSAGE.to_string()),
            ..Self::default()
        }
    }

    /// Classified status.
    pub fn status_kind(&self) -> AgentStatus {
        AgentStatus::from(self.status.as_deref())
    }

    pub fn agent_id(&self) -> &str {
        self.agent_id.as_deref().unwrap_or(UNKNOWN_AGENT)
    }

    /// Raw status text, `unknown` when absent.
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }

    pub fn lane(&self) -> &str {
        self.lane.as_deref().unwrap_or(UNKNOWN_LANE)
    }

    pub fn ready_for(&self) -> &str {
        self.ready_for.as_deref().unwrap_or(DEFAULT_READY_FOR)
    }

    /// Value of an optional text field, or the `-` placeholder.
    pub fn field<'a>(value: &'a Option<String>) -> &'a str {
        value.as_deref().unwrap_or(PLACEHOLDER)
    }
}

/// Per-lane counters for the utilization table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneStats {
    /// `in_progress` or `waiting`.
    pub active: usize,
    pub blocked: usize,
    /// Everything else, `completed` included.
    pub idle: usize,
}

impl LaneStats {
    pub fn total(&self) -> usize {
        self.active + self.blocked + self.idle
    }
}

/// Section counts for the Statistics block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardStatistics {
    pub total: usize,
    pub active: usize,
    pub blocked: usize,
    pub idle: usize,
    pub completed: usize,
}

impl BoardStatistics {
    /// Counts records per board section.
    pub fn from_records(records: &[AgentStatusRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            let status = record.status_kind();
            if status.is_active() {
                stats.active += 1;
            }
            match status {
                AgentStatus::Blocked => stats.blocked += 1,
                AgentStatus::Idle => stats.idle += 1,
                AgentStatus::Completed => stats.completed += 1,
                _ => {}
            }
        }

        stats
    }
}

/// A sorted snapshot ready for rendering.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    /// Render time, shared by the header and all duration math.
    pub generated_at: DateTime<Utc>,
    /// Records in board order.
    pub records: Vec<AgentStatusRecord>,
    pub statistics: BoardStatistics,
    /// Lane utilization keyed by lane name.
    pub lanes: BTreeMap<String, LaneStats>,
    /// Maximum rows in the Recent Completions table.
    pub recent_limit: usize,
}
