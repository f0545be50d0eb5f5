//! Emotion classification and volatility tracking

use chrono::{DateTime, Utc};
use ring_buffer::HistoryBuffer;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Expression label reported by the detector.
///
/// Variant order is the tie-break order used when two labels share the
/// maximal probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
    /// Any label outside the known set
    #[serde(other)]
    Unknown,
}

impl EmotionLabel {
    /// Every label in tie-break order
    pub const ALL: [EmotionLabel; 8] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Fearful,
        EmotionLabel::Disgusted,
        EmotionLabel::Surprised,
        EmotionLabel::Unknown,
    ];

    /// Fixed distraction weight of this label
    pub const fn distraction_weight(self) -> u32 {
        match self {
            EmotionLabel::Neutral => 10,
            EmotionLabel::Happy => 20,
            EmotionLabel::Sad => 40,
            EmotionLabel::Angry => 60,
            EmotionLabel::Fearful => 70,
            EmotionLabel::Disgusted => 50,
            EmotionLabel::Surprised => 80,
            EmotionLabel::Unknown => 30,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Disgusted => "disgusted",
            EmotionLabel::Surprised => "surprised",
            EmotionLabel::Unknown => "unknown",
        }
    }

    /// Case-insensitive lookup; anything unrecognised is [`EmotionLabel::Unknown`]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        EmotionLabel::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(EmotionLabel::Unknown)
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = std::convert::Infallible;

    /// Unrecognised labels map to [`EmotionLabel::Unknown`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EmotionLabel::from_label(s))
    }
}

/// Per-expression probabilities for one face.
///
/// Every unrecognised detector label folds into [`EmotionLabel::Unknown`],
/// which keeps the highest probability among them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExpressionScores(BTreeMap<EmotionLabel, f32>);

impl ExpressionScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the probability of `label`; a later call for the same label wins,
    /// except for `Unknown` which keeps the maximum
    pub fn insert(&mut self, label: EmotionLabel, probability: f32) {
        if label == EmotionLabel::Unknown {
            self.0
                .entry(label)
                .and_modify(|p| {
                    if probability > *p || p.is_nan() {
                        *p = probability;
                    }
                })
                .or_insert(probability);
        } else {
            self.0.insert(label, probability);
        }
    }

    pub fn get(&self, label: EmotionLabel) -> Option<f32> {
        self.0.get(&label).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label with the highest probability.
    ///
    /// Ties keep the earlier label in [`EmotionLabel::ALL`]; non-finite
    /// probabilities are ignored and an empty set yields `Neutral`.
    pub fn dominant(&self) -> EmotionLabel {
        let mut best: Option<(EmotionLabel, f32)> = None;
        for label in EmotionLabel::ALL {
            let Some(p) = self.get(label).filter(|p| p.is_finite()) else {
                continue;
            };
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((label, p)),
            }
        }
        best.map(|(label, _)| label).unwrap_or_default()
    }
}

impl FromIterator<(EmotionLabel, f32)> for ExpressionScores {
    fn from_iter<I: IntoIterator<Item = (EmotionLabel, f32)>>(iter: I) -> Self {
        let mut scores = Self::new();
        for (label, probability) in iter {
            scores.insert(label, probability);
        }
        scores
    }
}

impl<'de> Deserialize<'de> for ExpressionScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, f32>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(label, probability)| (EmotionLabel::from_label(&label), probability))
            .collect())
    }
}

/// One classified tick in the emotion history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionHistoryEntry {
    pub emotion: EmotionLabel,
    pub observed_at: DateTime<Utc>,
}

/// Output of classifying one face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionReading {
    pub label: EmotionLabel,
    /// Fixed weight of `label`
    pub weight: u32,
    /// Extra weight for rapid emotional switching (0 when calm)
    pub volatility_bonus: u32,
}

impl EmotionReading {
    /// Emotion-derived distraction
    pub fn distraction(&self) -> u32 {
        self.weight + self.volatility_bonus
    }
}

/// Dominant-emotion classifier with volatility detection
#[derive(Debug, Clone)]
pub struct EmotionClassifier {
    /// Number of recent history entries inspected
    window: usize,
    /// Distinct labels in the window that count as volatile
    min_distinct: usize,
    /// Bonus weight when volatile
    bonus: u32,
}

impl EmotionClassifier {
    pub fn new(window: usize, min_distinct: usize, bonus: u32) -> Self {
        Self {
            window,
            min_distinct,
            bonus,
        }
    }

    /// Classify `scores` and append the result to `history`.
    ///
    /// Volatility is judged on the history as it stood before this tick.
    pub fn classify(
        &self,
        scores: &ExpressionScores,
        history: &mut HistoryBuffer<EmotionHistoryEntry>,
        now: DateTime<Utc>,
    ) -> EmotionReading {
        let label = scores.dominant();
        let volatility_bonus = if self.is_volatile(history) {
            self.bonus
        } else {
            0
        };

        history.push(EmotionHistoryEntry {
            emotion: label,
            observed_at: now,
        });

        EmotionReading {
            label,
            weight: label.distraction_weight(),
            volatility_bonus,
        }
    }

    /// Recent window holds at least `min_distinct` different labels
    pub fn is_volatile(&self, history: &HistoryBuffer<EmotionHistoryEntry>) -> bool {
        let distinct: BTreeSet<EmotionLabel> =
            history.recent(self.window).map(|e| e.emotion).collect();
        distinct.len() >= self.min_distinct
    }
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self::new(5, 4, 15)
    }
}
