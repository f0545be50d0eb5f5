//! Focus replay
//!
//! Feeds recorded observations (one JSON record per line) through a
//! [`FocusEngine`] and writes one tick outcome per line.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use focus_engine::{FocusEngine, FrameObservation, TimerContext};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging; output goes to stderr so stdout stays machine-readable
pub fn init_logging(level: Level, json: bool) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("failed to set tracing subscriber")
}

/// One recorded tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Capture time, milliseconds since the Unix epoch
    pub at_ms: u64,
    pub observation: FrameObservation,
    /// Timer state at capture; carried over from the previous record when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<TimerContext>,
}

impl ReplayRecord {
    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        i64::try_from(self.at_ms)
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| anyhow!("timestamp out of range: {}", self.at_ms))
    }
}

/// Totals of one replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub records: u64,
    pub alerts: u64,
    /// Time of the last record
    pub last_at: Option<DateTime<Utc>>,
}

/// Replay every record from `input`, writing outcomes to `output`.
///
/// Records without a context reuse the previous one; the first defaults to an
/// active work interval.
pub fn replay<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    engine: &mut FocusEngine,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();
    let mut context = TimerContext::working();

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: ReplayRecord = serde_json::from_str(&line)
            .with_context(|| format!("invalid record on line {}", line_no))?;
        let at = record
            .timestamp()
            .with_context(|| format!("invalid record on line {}", line_no))?;
        if let Some(ctx) = record.context {
            context = ctx;
        }

        let outcome = engine.process(&record.observation, context, at);
        debug!(line = line_no, focus = outcome.result.focus_score, "Replayed tick");

        stats.records += 1;
        stats.last_at = Some(at);
        if outcome.has_alert() {
            stats.alerts += 1;
        }

        serde_json::to_writer(&mut output, &outcome).context("failed to write outcome")?;
        writeln!(output).context("failed to write outcome")?;
    }

    output.flush().context("failed to flush output")?;
    info!(records = stats.records, alerts = stats.alerts, "Replay finished");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_engine::{EngineConfig, TickOutcome};
    use std::io::Cursor;

    const FACE: &str = r#"{"kind":"face","bounding_box":{"x":60,"y":60,"width":180,"height":200},"left_eye":[[80,100],[93,94],[107,94],[120,100],[107,106],[93,106]],"right_eye":[[180,100],[193,94],[207,94],[220,100],[207,106],[193,106]],"nose_tip":[150,140],"expressions":{"neutral":0.9},"frame_width":640}"#;

    fn engine() -> FocusEngine {
        FocusEngine::with_seed(EngineConfig::default(), 7).unwrap()
    }

    fn run(input: &str) -> (ReplayStats, Vec<TickOutcome>) {
        let mut engine = engine();
        let mut out = Vec::new();
        let stats = replay(Cursor::new(input), &mut out, &mut engine).unwrap();
        let outcomes = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (stats, outcomes)
    }

    #[test]
    fn test_replay_writes_one_outcome_per_record() {
        let input = format!(
            "{{\"at_ms\":1700000000000,\"observation\":{}}}\n\n{{\"at_ms\":1700000000016,\"observation\":{{\"kind\":\"no_face\"}}}}\n",
            FACE
        );
        let (stats, outcomes) = run(&input);

        assert_eq!(stats.records, 2);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].result.focus_score, 98);
        assert!(outcomes[0].breakdown.is_some());
        assert!(outcomes[1].breakdown.is_none());
        assert_eq!(
            stats.last_at,
            Some(Utc.timestamp_millis_opt(1_700_000_000_016).unwrap())
        );
    }

    #[test]
    fn test_context_carries_over() {
        // Missed frames alone keep the initial score of 100, so nothing alerts
        let input = "{\"at_ms\":0,\"observation\":{\"kind\":\"no_face\"},\"context\":{\"is_active\":false,\"mode\":\"work\"}}\n\
                     {\"at_ms\":1000,\"observation\":{\"kind\":\"no_face\"}}\n";
        let (stats, outcomes) = run(input);

        assert_eq!(stats.records, 2);
        assert_eq!(stats.alerts, 0);
        assert!(outcomes.iter().all(|o| o.alert.is_none()));
    }

    #[test]
    fn test_second_logging_init_is_an_error() {
        // Whichever call runs first installs the subscriber
        let _ = init_logging(Level::WARN, false);
        let second = init_logging(Level::WARN, true);
        assert!(second.is_err());
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let input = "{\"at_ms\":0,\"observation\":{\"kind\":\"no_face\"}}\nnot json\n";
        let mut engine = engine();
        let err = replay(Cursor::new(input), Vec::new(), &mut engine).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
