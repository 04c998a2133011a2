//! Heuristic attribute scoring for a single memory.
//!
//! Each memory gets four attributes:
//!
//! - **pitch**: `0.4 * length_factor + 0.6 * type_factor`, where
//!   `length_factor = clamp(words / 100, 0.1, 1.0)`.
//! - **dissonance**: `0.15` per contradiction signal (capped at `0.8`), plus
//!   `0.2` for each of the last five history memories sharing a word with the
//!   text when the text itself carries a signal. Clamped to `[0.1, 0.9]`.
//! - **tempo**: `0.3 * question_factor + 0.3 * emotion_factor + 0.4 * type_factor`.
//! - **emotion**: the lexicon's dominant emotion.
//!
//! Numeric attributes are rounded to two decimals.

use crate::lexicon::{self, Classification, token_set};
use crate::memory::{AttributeSet, MAX_DISSONANCE, MIN_DISSONANCE, Memory, MemoryType};

/// Number of most recent history memories compared against.
pub const HISTORY_WINDOW: usize = 5;

/// Pitch weight used for unrecognized memory types.
const DEFAULT_PITCH_WEIGHT: f64 = 0.5;

/// Tempo weight used for unrecognized memory types.
const DEFAULT_TEMPO_WEIGHT: f64 = 0.5;

/// Dissonance added per contradiction signal.
const SIGNAL_WEIGHT: f64 = 0.15;

/// Cap on the signal part of dissonance.
const SIGNAL_CAP: f64 = 0.8;

/// Dissonance added per overlapping history memory.
const HISTORY_WEIGHT: f64 = 0.2;


/// Relevance weight per memory type.
fn pitch_weight(memory_type: &MemoryType) -> f64 {
    match memory_type {
        MemoryType::Insight => 0.8,
        MemoryType::Question => 0.7,
        MemoryType::Observation => 0.6,
        MemoryType::Event => 0.5,
        MemoryType::Reflection => 0.7,
        MemoryType::Other(_) => DEFAULT_PITCH_WEIGHT,
    }
}

/// Recall weight per memory type.
fn tempo_weight(memory_type: &MemoryType) -> f64 {
    match memory_type {
        MemoryType::Insight => 0.7,
        MemoryType::Question => 0.8,
        MemoryType::Observation => 0.5,
        MemoryType::Event => 0.4,
        MemoryType::Reflection => 0.6,
        MemoryType::Other(_) => DEFAULT_TEMPO_WEIGHT,
    }
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stateless scorer turning text and type into an [`AttributeSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer;

impl Scorer {
    pub fn new() -> Self {
        Self
    }

    /// Score `content` of the given type.
    ///
    /// `history` is the collection as it stood before this memory, oldest
    /// first. Only the last [`HISTORY_WINDOW`] entries are consulted.
    pub fn score(
        &self,
        content: &str,
        memory_type: &MemoryType,
        history: &[Memory],
    ) -> AttributeSet {
        let text = content.to_lowercase();
        let classification = lexicon::classify(&text);

        let pitch = self.pitch(&text, memory_type);
        let dissonance = self.dissonance(&text, &classification, history);
        let tempo = self.tempo(&text, &classification, memory_type);

        AttributeSet {
            pitch: round2(pitch),
            dissonance: round2(dissonance),
            tempo: round2(tempo),
            emotion: classification.emotions.dominant(),
        }
    }

    fn pitch(&self, text: &str, memory_type: &MemoryType) -> f64 {
        let word_count = text.split_whitespace().count();
        let length_factor = (word_count as f64 / 100.0).clamp(0.1, 1.0);
        0.4 * length_factor + 0.6 * pitch_weight(memory_type)
    }

    fn dissonance(
        &self,
        text: &str,
        classification: &Classification,
        history: &[Memory],
    ) -> f64 {
        let signal_score =
            (SIGNAL_WEIGHT * classification.contradiction_signals as f64).min(SIGNAL_CAP);

        let mut comparison = 0.0;
        if classification.has_contradiction() && !history.is_empty() {
            let words = token_set(text);
            let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
            for memory in recent {
                let other = token_set(&memory.content);
                if !words.is_disjoint(&other) {
                    comparison += HISTORY_WEIGHT;
                }
            }
        }

        (signal_score + comparison).clamp(MIN_DISSONANCE, MAX_DISSONANCE)
    }

    fn tempo(
        &self,
        text: &str,
        classification: &Classification,
        memory_type: &MemoryType,
    ) -> f64 {
        let question_factor = (0.2 * text.matches('?').count() as f64).min(0.8);
        let emotion_factor = (0.05 * classification.emotions.total() as f64).min(0.8);
        0.3 * question_factor + 0.3 * emotion_factor + 0.4 * tempo_weight(memory_type)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::memory::Emotion;

    fn memory(content: &str) -> Memory {
        Memory {
            id: format!("mem_{}", content.len()),
            content: content.to_string(),
            memory_type: MemoryType::Observation,
            created_at: Utc::now(),
            attributes: AttributeSet {
                pitch: 0.5,
                dissonance: 0.1,
                tempo: 0.5,
                emotion: Emotion::Neutral,
            },
        }
    }

    #[test]
    fn test_empty_event() {
        let attrs = Scorer::new().score("", &MemoryType::Event, &[]);
        assert_eq!(attrs.pitch, 0.34);
        assert_eq!(attrs.dissonance, 0.1);
        assert_eq!(attrs.tempo, 0.16);
        assert_eq!(attrs.emotion, Emotion::Neutral);
    }

    #[test]
    fn test_mixed_feelings_insight() {
        let attrs = Scorer::new().score(
            "I love this but I also feel anxious",
            &MemoryType::Insight,
            &[],
        );
        assert_eq!(attrs.emotion, Emotion::Complex);
        assert_eq!(attrs.dissonance, 0.15);
        // 8 words -> length 0.1; pitch = 0.04 + 0.48
        assert_eq!(attrs.pitch, 0.52);
        // love, anxious and feel all add emotional charge
        let flat = Scorer::new().score("", &MemoryType::Insight, &[]);
        assert!(attrs.tempo > flat.tempo);
    }

    #[test]
    fn test_unknown_type_uses_default_weight() {
        let other = Scorer::new().score("", &MemoryType::from("dream"), &[]);
        // 0.04 + 0.6 * 0.5
        assert_eq!(other.pitch, 0.34);
        // 0.4 * 0.5
        assert_eq!(other.tempo, 0.2);
    }

    #[test]
    fn test_pitch_length_factor_caps() {
        let long = vec!["word"; 250].join(" ");
        let attrs = Scorer::new().score(&long, &MemoryType::Insight, &[]);
        // 0.4 * 1.0 + 0.6 * 0.8
        assert_eq!(attrs.pitch, 0.88);
    }

    #[test]
    fn test_question_marks_raise_tempo() {
        let plain = Scorer::new().score("where now", &MemoryType::Question, &[]);
        let asked = Scorer::new().score("where now???", &MemoryType::Question, &[]);
        assert!(asked.tempo > plain.tempo);
        // 0.3 * 0.6 + 0.4 * 0.8
        assert_eq!(asked.tempo, 0.5);
    }

    #[test]
    fn test_history_comparison() {
        let history = vec![
            memory("jazz is wonderful"),
            memory("rain all day"),
            memory("jazz clubs at night"),
        ];
        let attrs =
            Scorer::new().score("Jazz is loud but fine", &MemoryType::Observation, &history);
        // one signal (0.15) + two overlapping history memories (0.4)
        assert_eq!(attrs.dissonance, 0.55);

        // Overlap alone adds nothing without a signal in the text
        let calm = Scorer::new().score("jazz is fine", &MemoryType::Observation, &history);
        assert_eq!(calm.dissonance, 0.1);
    }

    #[test]
    fn test_history_window_is_last_five() {
        let mut history = vec![memory("jazz forever")];
        for i in 0..5 {
            history.push(memory(&format!("unrelated entry {}", i)));
        }
        let attrs = Scorer::new().score("jazz but", &MemoryType::Event, &history);
        // Only the signal counts: the jazz memory is outside the window
        assert_eq!(attrs.dissonance, 0.15);
    }

    #[test]
    fn test_dissonance_ceiling() {
        let text = "but however nevertheless conversely yet although despite whereas instead";
        let history: Vec<Memory> = (0..5).map(|_| memory("however")).collect();
        let attrs = Scorer::new().score(text, &MemoryType::Insight, &history);
        assert_eq!(attrs.dissonance, 0.9);
    }

    #[test]
    fn test_ranges_and_determinism() {
        let scorer = Scorer::new();
        let long = "long ".repeat(400);
        let texts: [&str; 4] = [
            "",
            "happy sad torn but yet??? ?",
            "I think I know, however I am not sure",
            &long,
        ];
        let types = [
            MemoryType::Insight,
            MemoryType::Observation,
            MemoryType::Question,
            MemoryType::Reflection,
            MemoryType::Event,
            MemoryType::from("misc"),
        ];
        for text in texts {
            for t in &types {
                let a = scorer.score(text, t, &[]);
                let b = scorer.score(text, t, &[]);
                assert_eq!(a, b);
                assert!((0.1..=1.0).contains(&a.pitch));
                assert!((0.1..=0.9).contains(&a.dissonance));
                assert!((0.0..=1.0).contains(&a.tempo));
            }
        }
    }
}
