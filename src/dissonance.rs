//! Pairwise dissonance between memories.
//!
//! The score of a pair combines three symmetric, non-negative terms:
//!
//! ```text
//! score = 0.4 * overlap + 0.3 * signal + 0.3 * divergence
//! ```
//!
//! - `overlap`: shared tokens divided by the smaller token count.
//! - `signal`: `min(1, 0.5 * (signals(a) + signals(b)))`.
//! - `divergence`: distance between the two stored emotions.
//!
//! Each term only grows with more shared vocabulary, more contradiction
//! signals or more emotional distance, so the score never decreases when any
//! of them does.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::PairParams;
use crate::lexicon::{contradiction_signals, token_set};
use crate::memory::{Emotion, Memory};
use crate::scorer::round2;

const OVERLAP_WEIGHT: f64 = 0.4;
const SIGNAL_WEIGHT: f64 = 0.3;
const DIVERGENCE_WEIGHT: f64 = 0.3;

/// Signal term contributed by each contradiction signal in either text.
const SIGNAL_STEP: f64 = 0.5;

/// A pair of memories with their dissonance score.
#[derive(Debug, Clone, Serialize)]
pub struct DissonantPair<'a> {
    pub first: &'a Memory,
    pub second: &'a Memory,
    pub score: f64,
}

/// Pairwise scores over the leading memories of a collection.
#[derive(Debug, Clone, Serialize)]
pub struct DissonanceMatrix {
    /// Memory ids in row/column order.
    pub ids: Vec<String>,
    /// `scores[i][j]` is the score between `ids[i]` and `ids[j]`; the diagonal is zero.
    pub scores: Vec<Vec<f64>>,
}

/// Text features of a memory needed for pairwise comparison.
struct Profile {
    tokens: HashSet<String>,
    signals: usize,
    emotion: Emotion,
}

impl Profile {
    fn of(memory: &Memory) -> Self {
        Self {
            tokens: token_set(&memory.content),
            signals: contradiction_signals(&memory.content.to_lowercase()),
            emotion: memory.attributes.emotion,
        }
    }

    fn shares_token(&self, other: &Profile) -> bool {
        !self.tokens.is_disjoint(&other.tokens)
    }
}

/// Distance between two emotions in `[0, 1]`.
///
/// Opposite poles are furthest apart, complex sits halfway from either pole,
/// and neutral is distant from nothing.
pub fn emotional_divergence(a: Emotion, b: Emotion) -> f64 {
    use Emotion::*;
    match (a, b) {
        (Positive, Negative) | (Negative, Positive) => 1.0,
        (Complex, Positive) | (Complex, Negative) | (Positive, Complex) | (Negative, Complex) => {
            0.5
        }
        _ => 0.0,
    }
}

fn score_profiles(a: &Profile, b: &Profile) -> f64 {
    let smaller = a.tokens.len().min(b.tokens.len());
    let overlap = if smaller == 0 {
        0.0
    } else {
        a.tokens.intersection(&b.tokens).count() as f64 / smaller as f64
    };
    let signal = (SIGNAL_STEP * (a.signals + b.signals) as f64).min(1.0);
    let divergence = emotional_divergence(a.emotion, b.emotion);

    round2(OVERLAP_WEIGHT * overlap + SIGNAL_WEIGHT * signal + DIVERGENCE_WEIGHT * divergence)
}

/// Dissonance between two scored memories, in `[0, 1]`.
///
/// Symmetric: `pairwise_score(a, b) == pairwise_score(b, a)`.
pub fn pairwise_score(a: &Memory, b: &Memory) -> f64 {
    score_profiles(&Profile::of(a), &Profile::of(b))
}

/// The `limit` most dissonant pairs using the default threshold.
pub fn top_dissonant_pairs(memories: &[Memory], limit: usize) -> Vec<DissonantPair<'_>> {
    find_dissonant_pairs(
        memories,
        &PairParams {
            limit,
            ..PairParams::default()
        },
    )
}

/// Rank unordered pairs of `memories` by dissonance, highest first.
///
/// Pairs sharing no token are skipped before scoring; remaining pairs must
/// score above `params.threshold`. Ties keep collection order.
pub fn find_dissonant_pairs<'a>(
    memories: &'a [Memory],
    params: &PairParams,
) -> Vec<DissonantPair<'a>> {
    let profiles: Vec<Profile> = memories.iter().map(Profile::of).collect();

    let mut pairs = Vec::new();
    for i in 0..memories.len() {
        for j in (i + 1)..memories.len() {
            if !profiles[i].shares_token(&profiles[j]) {
                continue;
            }
            let score = score_profiles(&profiles[i], &profiles[j]);
            if score > params.threshold {
                pairs.push(DissonantPair {
                    first: &memories[i],
                    second: &memories[j],
                    score,
                });
            }
        }
    }

    pairs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    pairs.truncate(params.limit);
    pairs
}

/// Pairwise scores between the first `n` memories.
pub fn dissonance_matrix(memories: &[Memory], n: usize) -> DissonanceMatrix {
    let leading = &memories[..n.min(memories.len())];
    let profiles: Vec<Profile> = leading.iter().map(Profile::of).collect();

    let scores = (0..leading.len())
        .map(|i| {
            (0..leading.len())
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        score_profiles(&profiles[i], &profiles[j])
                    }
                })
                .collect()
        })
        .collect();

    DissonanceMatrix {
        ids: leading.iter().map(|m| m.id.clone()).collect(),
        scores,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::memory::{AttributeSet, MemoryType};

    fn memory(id: &str, content: &str, emotion: Emotion) -> Memory {
        Memory {
            id: id.to_string(),
            content: content.to_string(),
            memory_type: MemoryType::Observation,
            created_at: Utc::now(),
            attributes: AttributeSet {
                pitch: 0.5,
                dissonance: 0.1,
                tempo: 0.5,
                emotion,
            },
        }
    }

    #[test]
    fn test_divergence_table() {
        assert_eq!(emotional_divergence(Emotion::Positive, Emotion::Negative), 1.0);
        assert_eq!(emotional_divergence(Emotion::Complex, Emotion::Negative), 0.5);
        assert_eq!(emotional_divergence(Emotion::Neutral, Emotion::Positive), 0.0);
        assert_eq!(emotional_divergence(Emotion::Positive, Emotion::Positive), 0.0);
        for a in Emotion::all() {
            for b in Emotion::all() {
                assert_eq!(emotional_divergence(*a, *b), emotional_divergence(*b, *a));
            }
        }
    }

    #[test]
    fn test_pairwise_symmetric_and_bounded() {
        let memories = vec![
            memory("1", "I love jazz", Emotion::Positive),
            memory("2", "jazz is noise however", Emotion::Neutral),
            memory("3", "but yet although jazz", Emotion::Negative),
            memory("4", "", Emotion::Complex),
        ];
        for a in &memories {
            for b in &memories {
                let ab = pairwise_score(a, b);
                assert_eq!(ab, pairwise_score(b, a));
                assert!((0.0..=1.0).contains(&ab));
            }
        }
    }

    #[test]
    fn test_pairwise_components() {
        // 1 of 3 tokens shared, one signal, no divergence
        let a = memory("1", "I love jazz", Emotion::Positive);
        let b = memory("2", "jazz is noise however", Emotion::Neutral);
        assert_eq!(pairwise_score(&a, &b), 0.28);

        // Identical vocabulary, saturated signals, opposite emotions
        let c = memory("3", "but however", Emotion::Positive);
        let d = memory("4", "but however", Emotion::Negative);
        assert_eq!(pairwise_score(&c, &d), 1.0);

        // Nothing in common
        let e = memory("5", "calm sea", Emotion::Neutral);
        let f = memory("6", "green hills", Emotion::Neutral);
        assert_eq!(pairwise_score(&e, &f), 0.0);
    }

    #[test]
    fn test_pairwise_monotonic() {
        let base_a = memory("1", "red house", Emotion::Neutral);
        let base_b = memory("2", "red car", Emotion::Neutral);
        let base = pairwise_score(&base_a, &base_b);

        let more_overlap = memory("3", "red house car", Emotion::Neutral);
        assert!(pairwise_score(&base_a, &more_overlap) >= base);

        let with_signal = memory("4", "red car however", Emotion::Neutral);
        assert!(pairwise_score(&base_a, &with_signal) >= base);

        let positive = memory("5", "red house", Emotion::Positive);
        let negative = memory("6", "red car", Emotion::Negative);
        assert!(pairwise_score(&positive, &negative) >= base);
    }

    #[test]
    fn test_top_pairs_shared_token_ranks_first() {
        let memories = vec![
            memory("1", "I love jazz", Emotion::Positive),
            memory("2", "jazz is noise however", Emotion::Neutral),
            memory("3", "the weather turned cold", Emotion::Negative),
        ];
        let pairs = top_dissonant_pairs(&memories, 5);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first.id, "1");
        assert_eq!(pairs[0].second.id, "2");
        assert_eq!(pairs[0].score, 0.28);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let memories = vec![
            memory("1", "I love jazz", Emotion::Positive),
            memory("2", "jazz is noise however", Emotion::Neutral),
        ];
        let at = |threshold: f64| {
            find_dissonant_pairs(
                &memories,
                &PairParams {
                    limit: 5,
                    threshold,
                },
            )
            .len()
        };
        // The pair scores exactly 0.28
        assert_eq!(at(0.28), 0);
        assert_eq!(at(0.27), 1);
    }

    #[test]
    fn test_top_pairs_ordering_and_limit() {
        let memories = vec![
            memory("a", "jazz but", Emotion::Positive),
            memory("b", "jazz however", Emotion::Negative),
            memory("c", "jazz tonight", Emotion::Neutral),
            memory("d", "jazz", Emotion::Neutral),
        ];
        let all = find_dissonant_pairs(
            &memories,
            &PairParams {
                limit: 10,
                threshold: 0.0,
            },
        );
        assert_eq!(all.len(), 6);
        for window in all.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
        assert_eq!((all[0].first.id.as_str(), all[0].second.id.as_str()), ("a", "b"));

        let limited = top_dissonant_pairs(&memories, 2);
        assert!(limited.len() <= 2);
        assert_eq!(limited[0].score, all[0].score);
    }

    #[test]
    fn test_top_pairs_empty() {
        assert!(top_dissonant_pairs(&[], 5).is_empty());
        let single = vec![memory("1", "alone but here", Emotion::Complex)];
        assert!(top_dissonant_pairs(&single, 5).is_empty());
    }

    #[test]
    fn test_dissonance_matrix() {
        let memories = vec![
            memory("1", "I love jazz", Emotion::Positive),
            memory("2", "jazz is noise however", Emotion::Neutral),
            memory("3", "the weather turned cold", Emotion::Negative),
        ];
        let matrix = dissonance_matrix(&memories, 10);
        assert_eq!(matrix.ids, vec!["1", "2", "3"]);
        assert_eq!(matrix.scores.len(), 3);
        for i in 0..3 {
            assert_eq!(matrix.scores[i][i], 0.0);
            for j in 0..3 {
                assert_eq!(matrix.scores[i][j], matrix.scores[j][i]);
            }
        }
        assert_eq!(matrix.scores[0][1], 0.28);

        let small = dissonance_matrix(&memories, 2);
        assert_eq!(small.ids.len(), 2);
    }
}
