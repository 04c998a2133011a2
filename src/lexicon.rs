//! Lexicon-based emotion and contradiction detection.
//!
//! Matching is plain substring containment against fixed word lists. There is
//! no tokenization or word-boundary check, so "like" also matches "unlikely".
//! Callers lower-case the text before classifying it.

use std::collections::HashSet;

use crate::memory::Emotion;

/// Words signalling a positive tone.
pub const POSITIVE_WORDS: &[&str] = &[
    "happy", "joy", "glad", "delight", "pleased", "cheerful", "content", "satisfied", "excited",
    "thrilled", "optimistic", "enthusiastic", "hopeful", "confident", "proud", "love", "adore",
    "enjoy", "like",
];

/// Words signalling a negative tone.
pub const NEGATIVE_WORDS: &[&str] = &[
    "sad", "unhappy", "depressed", "gloomy", "miserable", "disappointed", "frustrated",
    "annoyed", "angry", "furious", "outraged", "irritated", "upset", "worried", "anxious",
    "afraid", "fearful", "scared",
];

/// Cognitive, emotionally flat words.
pub const NEUTRAL_WORDS: &[&str] = &[
    "think", "consider", "believe", "understand", "know", "recognize", "observe", "notice",
    "perceive", "feel", "sense", "experience",
];

/// Words signalling a mixed or layered tone.
pub const COMPLEX_WORDS: &[&str] = &[
    "bittersweet", "ambivalent", "conflicted", "torn", "mixed feelings", "nostalgic",
    "melancholy", "sentimental", "wistful", "longing",
];

/// Phrases that mark a contradiction or contrast.
pub const CONTRADICTION_SIGNALS: &[&str] = &[
    "but",
    "however",
    "nevertheless",
    "conversely",
    "on the other hand",
    "in contrast",
    "contrary",
    "opposite",
    "unlike",
    "instead",
    "while",
    "whereas",
    "yet",
    "although",
    "despite",
    "in spite",
];

/// Positive and negative counts closer than this are read as mixed feelings.
const MIXED_SIGNAL_GAP: usize = 3;

/// Number of lexicon entries found per emotion category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmotionCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub complex: usize,
}

impl EmotionCounts {
    /// Total matches across all four categories.
    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral + self.complex
    }

    /// Dominant emotion for these counts.
    ///
    /// The strictly highest count wins and ties fall back to neutral. When both
    /// positive and negative words are present and either a complex word was
    /// seen or the two counts are close, the result is forced to complex.
    pub fn dominant(&self) -> Emotion {
        if self.positive > 0
            && self.negative > 0
            && (self.complex > 0 || self.positive.abs_diff(self.negative) < MIXED_SIGNAL_GAP)
        {
            return Emotion::Complex;
        }

        let ranked = [
            (Emotion::Positive, self.positive),
            (Emotion::Negative, self.negative),
            (Emotion::Neutral, self.neutral),
            (Emotion::Complex, self.complex),
        ];
        let max = ranked.iter().map(|(_, c)| *c).max().unwrap_or(0);
        if max == 0 {
            return Emotion::Neutral;
        }

        let mut leaders = ranked.iter().filter(|(_, c)| *c == max);
        match (leaders.next(), leaders.next()) {
            (Some((emotion, _)), None) => *emotion,
            _ => Emotion::Neutral,
        }
    }
}

/// Result of classifying one piece of lower-cased text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub emotions: EmotionCounts,
    /// Number of distinct contradiction signals found.
    pub contradiction_signals: usize,
}

impl Classification {
    pub fn has_contradiction(&self) -> bool {
        self.contradiction_signals > 0
    }
}

fn count_matches(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| text.contains(*w)).count()
}

/// Count lexicon matches per emotion category.
pub fn emotion_counts(text: &str) -> EmotionCounts {
    EmotionCounts {
        positive: count_matches(text, POSITIVE_WORDS),
        negative: count_matches(text, NEGATIVE_WORDS),
        neutral: count_matches(text, NEUTRAL_WORDS),
        complex: count_matches(text, COMPLEX_WORDS),
    }
}

/// Count the contradiction signals present in the text.
pub fn contradiction_signals(text: &str) -> usize {
    count_matches(text, CONTRADICTION_SIGNALS)
}

/// Classify lower-cased text against every lexicon.
pub fn classify(text: &str) -> Classification {
    Classification {
        emotions: emotion_counts(text),
        contradiction_signals: contradiction_signals(text),
    }
}

/// Lower-case the text and split it into a set of whitespace-separated tokens.
pub(crate) fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
