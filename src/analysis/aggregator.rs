//! Record classification, sorting and lane statistics.
//!
//! This module orders status records for the board and derives the
//! per-section views and per-lane counters the report renders.

use crate::models::{AgentStatus, AgentStatusRecord, BoardStatistics, LaneStats, StatusBoard};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Sort records by status rank, then agent id. The sort is stable.
pub fn sort_records(records: &mut [AgentStatusRecord]) {
    records.sort_by(|a, b| {
        a.status_kind()
            .rank()
            .cmp(&b.status_kind().rank())
            .then_with(|| a.agent_id().cmp(b.agent_id()))
    });
}

/// Records that appear in the Active Work section.
pub fn active_records(records: &[AgentStatusRecord]) -> Vec<&AgentStatusRecord> {
    records
        .iter()
        .filter(|r| r.status_kind().is_active())
        .collect()
}

/// Records with the given status, in board order.
pub fn records_with_status(
    records: &[AgentStatusRecord],
    status: AgentStatus,
) -> Vec<&AgentStatusRecord> {
    records
        .iter()
        .filter(|r| r.status_kind() == status)
        .collect()
}

/// Group records by lane and count them.
///
/// `waiting` counts as active here, and every status other than
/// `in_progress`, `waiting` and `blocked` lands in the idle bucket.
pub fn lane_utilization(records: &[AgentStatusRecord]) -> BTreeMap<String, LaneStats> {
    let mut lanes: BTreeMap<String, LaneStats> = BTreeMap::new();

    for record in records {
        let stats = lanes.entry(record.lane().to_string()).or_default();

        match record.status_kind() {
            AgentStatus::InProgress | AgentStatus::Waiting => stats.active += 1,
            AgentStatus::Blocked => stats.blocked += 1,
            _ => stats.idle += 1,
        }
    }

    lanes
}

/// Sort the records and compute everything the board needs.
pub fn build_board(
    mut records: Vec<AgentStatusRecord>,
    generated_at: DateTime<Utc>,
    recent_limit: usize,
) -> StatusBoard {
    sort_records(&mut records);

    let statistics = BoardStatistics::from_records(&records);
    let lanes = lane_utilization(&records);

    StatusBoard {
        generated_at,
        records,
        statistics,
        lanes,
        recent_limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: Option<&str>, status: Option<&str>) -> AgentStatusRecord {
        AgentStatusRecord {
            agent_id: id.map(String::from),
            status: status.map(String::from),
            ..Default::default()
        }
    }

    fn lane_record(lane: &str, status: &str) -> AgentStatusRecord {
        AgentStatusRecord {
            lane: Some(lane.to_string()),
            ..record(Some("agent"), Some(status))
        }
    }

    #[test]
    fn test_sort_by_priority_then_id() {
        let mut records = vec![
            record(Some("zeta"), Some("completed")),
            record(Some("beta"), Some("idle")),
            record(Some("alpha"), Some("idle")),
            record(Some("gamma"), Some("paused")),
            record(Some("delta"), Some("waiting")),
            record(Some("omega"), Some("in_progress")),
            record(Some("eta"), Some("blocked")),
        ];

        sort_records(&mut records);

        let ids: Vec<_> = records.iter().map(|r| r.agent_id()).collect();
        assert_eq!(
            ids,
            vec!["omega", "eta", "delta", "alpha", "beta", "zeta", "gamma"]
        );
    }

    #[test]
    fn test_missing_status_sorts_last_and_missing_id_as_unknown() {
        let mut records = vec![
            record(Some("a"), None),
            record(None, Some("idle")),
            record(Some("zz"), Some("idle")),
            record(Some("tango"), Some("idle")),
        ];

        sort_records(&mut records);

        let ids: Vec<_> = records.iter().map(|r| r.agent_id()).collect();
        assert_eq!(ids, vec!["tango", "unknown", "zz", "a"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut first = record(Some("same"), Some("blocked"));
        first.task = Some("first".to_string());
        let mut second = record(Some("same"), Some("blocked"));
        second.task = Some("second".to_string());
        let mut third = record(None, Some("blocked"));
        third.task = Some("third".to_string());
        let mut fourth = record(Some("unknown"), Some("blocked"));
        fourth.task = Some("fourth".to_string());

        let mut records = vec![first, third, second, fourth];
        sort_records(&mut records);

        let tasks: Vec<_> = records.iter().map(|r| r.task.as_deref().unwrap()).collect();
        assert_eq!(tasks, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn test_active_records_exclude_idle_and_completed() {
        let records = vec![
            record(Some("a"), Some("in_progress")),
            record(Some("b"), Some("idle")),
            record(Some("c"), Some("completed")),
            record(Some("d"), Some("custom")),
            record(Some("e"), None),
            record(Some("f"), Some("blocked")),
        ];

        let ids: Vec<_> = active_records(&records)
            .iter()
            .map(|r| r.agent_id())
            .collect();
        assert_eq!(ids, vec!["a", "d", "e", "f"]);

        assert_eq!(records_with_status(&records, AgentStatus::Blocked).len(), 1);
        assert_eq!(records_with_status(&records, AgentStatus::Idle).len(), 1);
    }

    #[test]
    fn test_lane_utilization_waiting_and_blocked() {
        let records = vec![lane_record("x", "waiting"), lane_record("x", "blocked")];

        let lanes = lane_utilization(&records);
        let x = lanes.get("x").unwrap();

        assert_eq!(x.active, 1);
        assert_eq!(x.blocked, 1);
        assert_eq!(x.idle, 0);
        assert_eq!(x.total(), 2);
    }

    #[test]
    fn test_lane_utilization_folds_completed_into_idle() {
        let records = vec![
            lane_record("frontend", "completed"),
            lane_record("frontend", "idle"),
            lane_record("frontend", "in_progress"),
            record(Some("no-lane"), Some("mystery")),
        ];

        let lanes = lane_utilization(&records);

        assert_eq!(
            lanes.get("frontend"),
            Some(&LaneStats {
                active: 1,
                blocked: 0,
                idle: 2
            })
        );
        assert_eq!(lanes.get("unknown").map(|s| s.idle), Some(1));

        let names: Vec<_> = lanes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["frontend", "unknown"]);
    }

    #[test]
    fn test_build_board() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let records = vec![
            record(Some("b"), Some("completed")),
            record(Some("a"), Some("in_progress")),
        ];

        let board = build_board(records, now, 5);

        assert_eq!(board.generated_at, now);
        assert_eq!(board.records[0].agent_id(), "a");
        assert_eq!(board.statistics.total, 2);
        assert_eq!(board.statistics.active, 1);
        assert_eq!(board.statistics.completed, 1);
        assert_eq!(board.lanes.get("unknown").map(|s| s.total()), Some(2));
    }
}
