//! Memory data structures.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MemoryError;

/// Kind of memory, as chosen by whoever records it.
///
/// Unrecognized kinds are kept in `Other` (trimmed and lower-cased) and
/// score with the default weights.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemoryType {
    Insight,
    Observation,
    Question,
    Reflection,
    Event,
    Other(String),
}

impl MemoryType {
    pub fn as_str(&self) -> &str {
        match self {
            MemoryType::Insight => "insight",
            MemoryType::Observation => "observation",
            MemoryType::Question => "question",
            MemoryType::Reflection => "reflection",
            MemoryType::Event => "event",
            MemoryType::Other(s) => s,
        }
    }
}

impl From<&str> for MemoryType {
    fn from(s: &str) -> Self {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "insight" => MemoryType::Insight,
            "observation" => MemoryType::Observation,
            "question" => MemoryType::Question,
            "reflection" => MemoryType::Reflection,
            "event" => MemoryType::Event,
            _ => MemoryType::Other(normalized),
        }
    }
}

impl From<String> for MemoryType {
    fn from(s: String) -> Self {
        MemoryType::from(s.as_str())
    }
}

impl From<MemoryType> for String {
    fn from(t: MemoryType) -> Self {
        t.as_str().to_string()
    }
}

impl FromStr for MemoryType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MemoryType::from(s))
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse emotional tone of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Positive,
    Negative,
    Neutral,
    Complex,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Positive => "positive",
            Emotion::Negative => "negative",
            Emotion::Neutral => "neutral",
            Emotion::Complex => "complex",
        }
    }

    pub fn all() -> &'static [Emotion] {
        &[
            Emotion::Positive,
            Emotion::Negative,
            Emotion::Neutral,
            Emotion::Complex,
        ]
    }
}

impl FromStr for Emotion {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positive" => Ok(Emotion::Positive),
            "negative" => Ok(Emotion::Negative),
            "neutral" => Ok(Emotion::Neutral),
            "complex" => Ok(Emotion::Complex),
            _ => Err(MemoryError::Validation(format!("Unknown emotion: {}", s))),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowest pitch a scored memory can carry.
pub const MIN_PITCH: f64 = 0.1;
/// Highest pitch a scored memory can carry.
pub const MAX_PITCH: f64 = 1.0;

/// Lowest dissonance.
pub const MIN_DISSONANCE: f64 = 0.1;
/// Highest dissonance.
pub const MAX_DISSONANCE: f64 = 0.9;

pub const MIN_TEMPO: f64 = 0.0;
pub const MAX_TEMPO: f64 = 1.0;

/// The four heuristic attributes assigned to a memory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    /// Relevance / salience.
    pub pitch: f64,
    /// Contradiction / tension.
    pub dissonance: f64,
    /// Recall affinity.
    pub tempo: f64,
    pub emotion: Emotion,
}

impl AttributeSet {
    /// Check that every numeric attribute is finite and within its range:
    /// pitch `[0.1, 1.0]`, dissonance `[0.1, 0.9]`, tempo `[0.0, 1.0]`.
    pub fn validate(&self) -> Result<(), MemoryError> {
        for (name, value, min, max) in [
            ("pitch", self.pitch, MIN_PITCH, MAX_PITCH),
            ("dissonance", self.dissonance, MIN_DISSONANCE, MAX_DISSONANCE),
            ("tempo", self.tempo, MIN_TEMPO, MAX_TEMPO),
        ] {
            if !value.is_finite() || !(min..=max).contains(&value) {
                return Err(MemoryError::Validation(format!(
                    "{} must be within [{}, {}] (got {})",
                    name, min, max, value
                )));
            }
        }
        Ok(())
    }
}

/// A scored memory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    pub created_at: DateTime<Utc>,
    pub attributes: AttributeSet,
}

/// Generate an identifier: `<prefix>_<unix millis>_<random suffix>`.
///
/// The random suffix keeps ids distinct when several are drawn within the
/// same millisecond.
pub(crate) fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, millis, &suffix[..8])
}

/// Number of memories per emotion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmotionDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub complex: usize,
}

impl EmotionDistribution {
    pub fn record(&mut self, emotion: Emotion) {
        match emotion {
            Emotion::Positive => self.positive += 1,
            Emotion::Negative => self.negative += 1,
            Emotion::Neutral => self.neutral += 1,
            Emotion::Complex => self.complex += 1,
        }
    }

    pub fn get(&self, emotion: Emotion) -> usize {
        match emotion {
            Emotion::Positive => self.positive,
            Emotion::Negative => self.negative,
            Emotion::Neutral => self.neutral,
            Emotion::Complex => self.complex,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral + self.complex
    }
}

/// Aggregate statistics for a store.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub memory_count: usize,
    pub connection_count: usize,
    pub emotions: EmotionDistribution,
    pub avg_pitch: Option<f64>,
    pub avg_dissonance: Option<f64>,
    pub avg_tempo: Option<f64>,
    /// Connection counts keyed by connection type, in type order.
    pub connection_types: Vec<(String, usize)>,
}

/// Emotions recorded on a single calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineBucket {
    /// UTC date as `YYYY-MM-DD`.
    pub date: String,
    pub count: usize,
    pub emotions: EmotionDistribution,
}

/// Emotion counts bucketed by day, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub buckets: Vec<TimelineBucket>,
}
