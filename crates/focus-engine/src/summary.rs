//! Per-session summaries for the stats subsystem

use crate::analysis::TickOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregate of one monitoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    /// First processed tick
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub ticks: u64,
    /// Ticks that carried a face
    pub face_ticks: u64,
    /// Mean focus over face ticks, rounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_focus_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_focus_score: Option<u8>,
    pub attention_shift_count: u32,
    pub alerts_emitted: u32,
}

impl SessionSummary {
    /// Duration between the first tick and the end of the session
    pub fn duration_seconds(&self) -> i64 {
        self.started_at
            .map(|start| (self.ended_at - start).num_seconds().max(0))
            .unwrap_or(0)
    }
}

/// Running totals for the current session
#[derive(Debug, Clone)]
pub struct SummaryAccumulator {
    session_id: Uuid,
    started_at: Option<DateTime<Utc>>,
    ticks: u64,
    face_ticks: u64,
    focus_sum: u64,
    min_focus: Option<u8>,
    alerts_emitted: u32,
}

impl SummaryAccumulator {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: None,
            ticks: 0,
            face_ticks: 0,
            focus_sum: 0,
            min_focus: None,
            alerts_emitted: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Fold one tick into the totals
    pub fn record(&mut self, outcome: &TickOutcome, face_tick: bool) {
        self.started_at.get_or_insert(outcome.at);
        self.ticks += 1;
        if face_tick {
            let score = outcome.result.focus_score;
            self.face_ticks += 1;
            self.focus_sum += u64::from(score);
            self.min_focus = Some(self.min_focus.map_or(score, |m| m.min(score)));
        }
        if outcome.has_alert() {
            self.alerts_emitted += 1;
        }
    }

    /// Snapshot the totals as a summary ending at `ended_at`
    pub fn summarize(&self, attention_shift_count: u32, ended_at: DateTime<Utc>) -> SessionSummary {
        let average_focus_score = (self.face_ticks > 0)
            .then(|| (self.focus_sum as f64 / self.face_ticks as f64).round() as u8);

        SessionSummary {
            session_id: self.session_id,
            started_at: self.started_at,
            ended_at,
            ticks: self.ticks,
            face_ticks: self.face_ticks,
            average_focus_score,
            min_focus_score: self.min_focus,
            attention_shift_count,
            alerts_emitted: self.alerts_emitted,
        }
    }
}

impl Default for SummaryAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
