//! RoundTrace — A recorded sequence of round events
//!
//! A trace captures the full timeline of one or more rounds as seen by a
//! listener on the event stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{RoundEvent, StageEvent};
use crate::stage::GameStage;

/// A complete trace of round events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrace {
    /// Unique identifier for this trace
    pub trace_id: String,

    /// Game identifier
    pub game_id: String,

    /// All events in the order they were observed
    pub events: Vec<StageEvent>,

    /// When recording started
    pub recorded_at: DateTime<Utc>,

    /// Custom metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RoundTrace {
    /// Create a new empty trace
    pub fn new(trace_id: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            game_id: game_id.into(),
            events: Vec::new(),
            recorded_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Record an event at `timestamp_ms`
    pub fn record(&mut self, event: RoundEvent, timestamp_ms: f64) {
        self.events.push(StageEvent::new(event, timestamp_ms));
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Time between the first and last event (ms)
    pub fn duration_ms(&self) -> f64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0.0,
        }
    }

    /// Stages entered, in order
    pub fn stage_path(&self) -> Vec<GameStage> {
        self.events.iter().filter_map(|e| e.event.stage()).collect()
    }

    /// Number of events of a given type name
    pub fn count(&self, type_name: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.type_name() == type_name)
            .count()
    }

    /// Rounds that reached a final outcome
    pub fn rounds_completed(&self) -> usize {
        self.count("spin_complete")
    }

    /// Sum of all completed round wins
    pub fn total_won(&self) -> u64 {
        self.events
            .iter()
            .filter_map(|e| e.event.win_amount())
            .fold(0, u64::saturating_add)
    }

    /// Last snapshot published, if any
    pub fn last_snapshot(&self) -> Option<crate::event::RoundSnapshot> {
        self.events.iter().rev().find_map(|e| match &e.event {
            RoundEvent::Update(snapshot) => Some(*snapshot),
            _ => None,
        })
    }

    /// Export to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Import from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RoundSnapshot;

    fn one_round() -> RoundTrace {
        let mut trace = RoundTrace::new("t-1", "classic_5x3");
        trace.record(RoundEvent::SpinStart { round_id: 1, bet: 1 }, 0.0);
        trace.record(RoundEvent::StageChange { stage: GameStage::Spinning }, 0.0);
        trace.record(RoundEvent::SpinStop { round_id: 1, manual: false }, 1000.0);
        trace.record(RoundEvent::StageChange { stage: GameStage::ShowingWin }, 1500.0);
        trace.record(
            RoundEvent::SpinComplete {
                round_id: 1,
                matrix: vec![vec![0, 0, 0]; 5],
                win_amount: 30,
            },
            1500.0,
        );
        trace.record(RoundEvent::StageChange { stage: GameStage::Idle }, 3800.0);
        trace.record(
            RoundEvent::Update(RoundSnapshot {
                balance: 1029,
                bet: 1,
                last_win: 30,
                ..Default::default()
            }),
            3800.0,
        );
        trace
    }

    #[test]
    fn test_stage_path() {
        assert_eq!(
            one_round().stage_path(),
            vec![GameStage::Spinning, GameStage::ShowingWin, GameStage::Idle]
        );
    }

    #[test]
    fn test_totals() {
        let trace = one_round();
        assert_eq!(trace.rounds_completed(), 1);
        assert_eq!(trace.total_won(), 30);
        assert_eq!(trace.duration_ms(), 3800.0);
        assert_eq!(trace.count("stage_change"), 3);
        assert_eq!(trace.count("auto_spin_start"), 0);
        assert_eq!(trace.last_snapshot().map(|s| s.balance), Some(1029));
    }

    #[test]
    fn test_json_round_trip() {
        let trace = one_round().with_metadata("seed", serde_json::json!(42));
        let json = trace.to_json().unwrap();
        let back = RoundTrace::from_json(&json).unwrap();
        assert_eq!(back, trace);
    }

    #[test]
    fn test_empty_trace() {
        let trace = RoundTrace::new("t-0", "classic_5x3");
        assert_eq!(trace.duration_ms(), 0.0);
        assert!(trace.stage_path().is_empty());
        assert!(trace.last_snapshot().is_none());
    }
}
