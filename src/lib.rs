//! LoopChamber memory scoring
//!
//! Scores free-text memories with four heuristic attributes (pitch,
//! dissonance, tempo, emotion) and surfaces contradictory or emotionally
//! opposed pairs across the collection.
//!
//! # Example
//!
//! ```no_run
//! use loopchamber::{ConnectionType, MemoryError, MemoryStore, MemoryType, PairParams, Scorer};
//!
//! fn main() -> Result<(), MemoryError> {
//!     let scorer = Scorer::new();
//!     let mut store = MemoryStore::new();
//!
//!     // Score and add memories
//!     let a = store.ingest(&scorer, "I love late-night jazz", MemoryType::Insight)?;
//!     let b = store.ingest(&scorer, "jazz keeps me awake, however", MemoryType::Observation)?;
//!
//!     // Relate them explicitly
//!     store.create_connection(&a.memory.id, &b.memory.id, ConnectionType::Questions, 0.6)?;
//!
//!     // Find tension across the collection
//!     for pair in store.dissonant_pairs(&PairParams::default()) {
//!         println!("{} <-> {} ({:.2})", pair.first.id, pair.second.id, pair.score);
//!     }
//!
//!     // Re-score everything against the full history
//!     store.refresh_tempo(&scorer);
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod dissonance;
pub mod error;
pub mod lexicon;
pub mod memory;
pub mod relationship;
pub mod scorer;
pub mod store;

use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration Constants
// ============================================================================
//
// ### DEFAULT_PAIR_LIMIT (5)
// Number of dissonant pairs reported by default.
//
// ### DEFAULT_PAIR_THRESHOLD (0.25)
// A pair must score strictly above this to count as dissonant. A single
// shared word plus one contradiction signal between short texts clears it;
// shared vocabulary alone rarely does.
//
// ### DEFAULT_MATRIX_SIZE (10)
// Leading memories included in the pairwise dissonance matrix.

/// Default number of dissonant pairs to return.
pub const DEFAULT_PAIR_LIMIT: usize = 5;

/// Default minimum score for a pair to count as dissonant (exclusive).
pub const DEFAULT_PAIR_THRESHOLD: f64 = 0.25;

/// Default number of memories in the dissonance matrix.
pub const DEFAULT_MATRIX_SIZE: usize = 10;

/// Default number of memories listed by intrinsic dissonance.
pub const DEFAULT_TOP_LIMIT: usize = 5;

// ============================================================================
// Runtime Configuration
// ============================================================================

/// Runtime parameters for dissonant pair discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairParams {
    /// Maximum number of pairs to return.
    pub limit: usize,
    /// Pairs must score strictly above this.
    pub threshold: f64,
}

impl Default for PairParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAIR_LIMIT,
            threshold: DEFAULT_PAIR_THRESHOLD,
        }
    }
}

/// Order in which [`MemoryStore::list`] returns memories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Highest pitch first.
    Pitch,
    /// Highest dissonance first.
    Dissonance,
    /// Highest tempo first.
    Tempo,
}

/// Filters and ordering for browsing the collection.
///
/// Empty `types` or `emotions` match everything. Within each list any value
/// may match; both lists must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    pub types: Vec<MemoryType>,
    pub emotions: Vec<Emotion>,
    pub sort: SortBy,
    /// Maximum number of memories to return. If None, returns all matches.
    pub limit: Option<usize>,
}

// ============================================================================
// Re-exports
// ============================================================================

pub use db::default_db_path;
pub use dissonance::{
    DissonanceMatrix, DissonantPair, dissonance_matrix, find_dissonant_pairs, pairwise_score,
    top_dissonant_pairs,
};
pub use error::MemoryError;
pub use lexicon::{Classification, EmotionCounts};
pub use memory::{
    AttributeSet, Emotion, EmotionDistribution, Memory, MemoryType, Stats, Timeline,
    TimelineBucket,
};
pub use relationship::{ConnectResult, Connection, ConnectionType};
pub use scorer::Scorer;
pub use store::{AddMemoryResult, MemoryStore, RefreshResult};
