//! MemoryStore - the main API for the memory scoring system.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::{ListParams, PairParams, SortBy};
use crate::dissonance::{self, DissonanceMatrix, DissonantPair};
use crate::error::MemoryError;
use crate::memory::{
    AttributeSet, EmotionDistribution, Memory, MemoryType, Stats, Timeline, TimelineBucket,
    generate_id,
};
use crate::relationship::{
    ConnectResult, Connection, ConnectionType, strength_from_score, validate_strength,
};
use crate::scorer::{Scorer, round2};

/// Result of adding a scored memory.
#[derive(Debug, Serialize)]
pub struct AddMemoryResult {
    pub memory: Memory,
}

/// Result of a refresh pass.
#[derive(Debug, Serialize)]
pub struct RefreshResult {
    /// Number of memories re-scored.
    pub refreshed: usize,
    /// Number of memories whose attributes changed.
    pub changed: usize,
}

/// The main interface for the memory scoring system.
///
/// Owns the ordered collection of memories and the connections between them.
/// Mutations take `&mut self`; callers sharing a store across threads wrap it
/// in a single `Mutex` so an insert and a connection referencing it observe
/// the same state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    memories: Vec<Memory>,
    connections: Vec<Connection>,
    /// Memory id -> position in `memories`.
    index: HashMap<String, usize>,
    connection_ids: HashSet<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously saved memories and connections.
    ///
    /// Every invariant is checked again: unique ids, attributes in range,
    /// connections referencing known memories, no self-loops, strength in range.
    pub fn from_parts(
        memories: Vec<Memory>,
        connections: Vec<Connection>,
    ) -> Result<Self, MemoryError> {
        let mut store = Self::new();

        for memory in memories {
            memory.attributes.validate()?;
            if store.index.contains_key(&memory.id) {
                return Err(MemoryError::Validation(format!(
                    "Duplicate memory id: {}",
                    memory.id
                )));
            }
            store.index.insert(memory.id.clone(), store.memories.len());
            store.memories.push(memory);
        }

        for connection in connections {
            store.check_edge(&connection.source, &connection.target, connection.strength)?;
            if !store.connection_ids.insert(connection.id.clone()) {
                return Err(MemoryError::Validation(format!(
                    "Duplicate connection id: {}",
                    connection.id
                )));
            }
            store.connections.push(connection);
        }

        debug!(
            "Restored store with {} memories and {} connections",
            store.memories.len(),
            store.connections.len()
        );
        Ok(store)
    }

    /// Number of memories in the store.
    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    /// Append a memory with pre-computed attributes and return its id.
    ///
    /// Existing entries are never touched.
    pub fn add_memory(
        &mut self,
        content: &str,
        memory_type: MemoryType,
        attributes: AttributeSet,
    ) -> Result<String, MemoryError> {
        attributes.validate()?;

        let id = self.unused_id("mem", |store, id| store.index.contains_key(id));
        let memory = Memory {
            id: id.clone(),
            content: content.to_string(),
            memory_type,
            created_at: Utc::now(),
            attributes,
        };

        self.index.insert(id.clone(), self.memories.len());
        self.memories.push(memory);

        debug!("Added memory {}", id);
        Ok(id)
    }

    /// Score `content` against the current collection and add it.
    pub fn ingest(
        &mut self,
        scorer: &Scorer,
        content: &str,
        memory_type: MemoryType,
    ) -> Result<AddMemoryResult, MemoryError> {
        let attributes = scorer.score(content, &memory_type, &self.memories);
        let id = self.add_memory(content, memory_type, attributes)?;
        let memory = self.memories[self.index[&id]].clone();
        Ok(AddMemoryResult { memory })
    }

    /// Get a memory by id.
    pub fn get(&self, id: &str) -> Option<&Memory> {
        self.index.get(id).map(|&pos| &self.memories[pos])
    }

    /// All memories in insertion order.
    pub fn get_all_memories(&self) -> &[Memory] {
        &self.memories
    }

    /// The latest `n` memories, most recent first.
    pub fn tail(&self, n: usize) -> Vec<&Memory> {
        self.memories.iter().rev().take(n).collect()
    }

    /// Create a directed connection between two stored memories.
    pub fn create_connection(
        &mut self,
        source_id: &str,
        target_id: &str,
        connection_type: ConnectionType,
        strength: f64,
    ) -> Result<String, MemoryError> {
        self.check_edge(source_id, target_id, strength)?;

        let id = self.unused_id("conn", |store, id| store.connection_ids.contains(id));
        self.connection_ids.insert(id.clone());
        self.connections.push(Connection {
            id: id.clone(),
            source: source_id.to_string(),
            target: target_id.to_string(),
            connection_type,
            strength,
            created_at: Utc::now(),
        });

        debug!(
            "Connected {} -> {} ({}, strength {:.2})",
            source_id, target_id, connection_type, strength
        );
        Ok(id)
    }

    /// All connections in creation order.
    pub fn get_connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Check if any connection joins `a` and `b`, in either direction.
    pub fn is_connected(&self, a: &str, b: &str) -> bool {
        self.connections.iter().any(|c| c.joins(a, b))
    }

    /// Re-score every memory in collection order.
    ///
    /// Each memory is scored with the memories preceding it as history, so
    /// the result matches scoring the collection from scratch. Running it
    /// twice without inserting in between changes nothing.
    pub fn refresh_tempo(&mut self, scorer: &Scorer) -> RefreshResult {
        let rescored: Vec<AttributeSet> = (0..self.memories.len())
            .map(|i| {
                let memory = &self.memories[i];
                scorer.score(&memory.content, &memory.memory_type, &self.memories[..i])
            })
            .collect();

        let mut changed = 0;
        for (memory, attributes) in self.memories.iter_mut().zip(rescored) {
            if memory.attributes != attributes {
                memory.attributes = attributes;
                changed += 1;
            }
        }

        info!(
            "Refreshed {} memories ({} changed)",
            self.memories.len(),
            changed
        );
        RefreshResult {
            refreshed: self.memories.len(),
            changed,
        }
    }

    /// Most dissonant memory pairs in the collection.
    pub fn dissonant_pairs(&self, params: &PairParams) -> Vec<DissonantPair<'_>> {
        dissonance::find_dissonant_pairs(&self.memories, params)
    }

    /// Connect the most dissonant pairs with `contradicts` edges.
    ///
    /// Pairs already joined by any connection are skipped. The new edge runs
    /// from the earlier memory to the later one, with the pair score as its
    /// strength.
    pub fn connect_dissonant_pairs(
        &mut self,
        params: &PairParams,
    ) -> Result<ConnectResult, MemoryError> {
        let candidates: Vec<(String, String, f64)> = self
            .dissonant_pairs(params)
            .into_iter()
            .map(|p| (p.first.id.clone(), p.second.id.clone(), p.score))
            .collect();

        let mut created = Vec::new();
        let mut skipped = Vec::new();

        for (source, target, score) in candidates {
            if self.is_connected(&source, &target) {
                skipped.push((source, target));
                continue;
            }
            self.create_connection(
                &source,
                &target,
                ConnectionType::Contradicts,
                strength_from_score(score),
            )?;
            if let Some(conn) = self.connections.last() {
                created.push(conn.clone());
            }
        }

        info!(
            "Discovered {} dissonant connections ({} already connected)",
            created.len(),
            skipped.len()
        );
        Ok(ConnectResult { created, skipped })
    }

    /// Browse the collection: filter by type and emotion, then sort.
    ///
    /// Ties keep collection order (newest-first keeps reverse order).
    pub fn list(&self, params: &ListParams) -> Vec<&Memory> {
        let mut memories: Vec<&Memory> = self
            .memories
            .iter()
            .filter(|m| params.types.is_empty() || params.types.contains(&m.memory_type))
            .filter(|m| {
                params.emotions.is_empty() || params.emotions.contains(&m.attributes.emotion)
            })
            .collect();

        match params.sort {
            SortBy::Newest => {
                memories.reverse();
                memories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            SortBy::Oldest => memories.sort_by_key(|m| m.created_at),
            SortBy::Pitch => highest_first(&mut memories, |a| a.pitch),
            SortBy::Dissonance => highest_first(&mut memories, |a| a.dissonance),
            SortBy::Tempo => highest_first(&mut memories, |a| a.tempo),
        }

        if let Some(limit) = params.limit {
            memories.truncate(limit);
        }
        memories
    }

    /// Memories ordered by their own dissonance, highest first.
    pub fn top_dissonant_memories(&self, limit: usize) -> Vec<&Memory> {
        self.list(&ListParams {
            sort: SortBy::Dissonance,
            limit: Some(limit),
            ..ListParams::default()
        })
    }

    /// Pairwise scores between the first `n` memories.
    pub fn dissonance_matrix(&self, n: usize) -> DissonanceMatrix {
        dissonance::dissonance_matrix(&self.memories, n)
    }

    /// Aggregate statistics over the whole store.
    pub fn stats(&self) -> Stats {
        let mut emotions = EmotionDistribution::default();
        for memory in &self.memories {
            emotions.record(memory.attributes.emotion);
        }

        let mean = |f: fn(&AttributeSet) -> f64| -> Option<f64> {
            if self.memories.is_empty() {
                None
            } else {
                let sum: f64 = self.memories.iter().map(|m| f(&m.attributes)).sum();
                Some(round2(sum / self.memories.len() as f64))
            }
        };

        let connection_types = ConnectionType::all()
            .iter()
            .map(|t| {
                let count = self
                    .connections
                    .iter()
                    .filter(|c| c.connection_type == *t)
                    .count();
                (t.to_string(), count)
            })
            .collect();

        Stats {
            memory_count: self.memories.len(),
            connection_count: self.connections.len(),
            emotions,
            avg_pitch: mean(|a| a.pitch),
            avg_dissonance: mean(|a| a.dissonance),
            avg_tempo: mean(|a| a.tempo),
            connection_types,
        }
    }

    /// Emotion counts per UTC day, oldest day first.
    pub fn timeline(&self) -> Timeline {
        let mut days: BTreeMap<String, EmotionDistribution> = BTreeMap::new();
        for memory in &self.memories {
            let date = memory.created_at.format("%Y-%m-%d").to_string();
            days.entry(date).or_default().record(memory.attributes.emotion);
        }

        let buckets = days
            .into_iter()
            .map(|(date, emotions)| TimelineBucket {
                date,
                count: emotions.total(),
                emotions,
            })
            .collect();

        Timeline { buckets }
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Validate a prospective edge against the stored memories.
    fn check_edge(
        &self,
        source_id: &str,
        target_id: &str,
        strength: f64,
    ) -> Result<(), MemoryError> {
        if source_id == target_id {
            return Err(MemoryError::InvalidEdge(format!(
                "Memory {} cannot connect to itself",
                source_id
            )));
        }
        for id in [source_id, target_id] {
            if !self.index.contains_key(id) {
                return Err(MemoryError::Reference(id.to_string()));
            }
        }
        validate_strength(strength)
    }

    /// Draw ids until one is not yet taken.
    fn unused_id(&self, prefix: &str, taken: impl Fn(&Self, &str) -> bool) -> String {
        loop {
            let id = generate_id(prefix);
            if !taken(self, &id) {
                return id;
            }
        }
    }
}

/// Stable sort, highest attribute value first.
fn highest_first(memories: &mut [&Memory], key: impl Fn(&AttributeSet) -> f64) {
    memories.sort_by(|a, b| {
        key(&b.attributes)
            .partial_cmp(&key(&a.attributes))
            .unwrap_or(Ordering::Equal)
    });
}
