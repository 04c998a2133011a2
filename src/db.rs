//! SQLite snapshots of a memory store.
//!
//! The store itself lives in memory; this module lets an outer layer load it
//! at startup and save it after each mutation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::error::MemoryError;
use crate::memory::{AttributeSet, Emotion, Memory, MemoryType};
use crate::relationship::{Connection as Edge, ConnectionType};
use crate::store::MemoryStore;

/// Get the default database path (~/.loopchamber.db).
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".loopchamber.db")
}

/// Open or create a snapshot database at the given path.
pub fn open(path: impl AsRef<Path>) -> Result<Connection, MemoryError> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Create an in-memory snapshot database (useful for testing).
pub fn open_in_memory() -> Result<Connection, MemoryError> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Initialize the database schema.
pub(crate) fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // seq preserves insertion order across save/load cycles
    conn.execute(
        "CREATE TABLE IF NOT EXISTS memories (
            seq INTEGER PRIMARY KEY,
            id TEXT NOT NULL UNIQUE,
            content TEXT NOT NULL,
            type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            pitch REAL NOT NULL,
            dissonance REAL NOT NULL,
            tempo REAL NOT NULL,
            emotion TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS connections (
            seq INTEGER PRIMARY KEY,
            id TEXT NOT NULL UNIQUE,
            source TEXT NOT NULL,
            target TEXT NOT NULL,
            type TEXT NOT NULL,
            strength REAL NOT NULL,
            created_at TEXT NOT NULL,
            CHECK (source <> target),
            FOREIGN KEY (source) REFERENCES memories(id),
            FOREIGN KEY (target) REFERENCES memories(id)
        )",
        [],
    )?;

    Ok(())
}

/// Write every memory and connection of `store`.
///
/// Memories are upserted so refreshed attributes replace the stored ones;
/// connections are insert-only. Runs in a single transaction.
pub fn save(conn: &mut Connection, store: &MemoryStore) -> Result<(), MemoryError> {
    let tx = conn.transaction()?;

    {
        let mut insert_memory = tx.prepare(
            "INSERT INTO memories
                (id, content, type, created_at, pitch, dissonance, tempo, emotion)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                pitch = excluded.pitch,
                dissonance = excluded.dissonance,
                tempo = excluded.tempo,
                emotion = excluded.emotion",
        )?;
        for m in store.get_all_memories() {
            insert_memory.execute(params![
                m.id,
                m.content,
                m.memory_type.as_str(),
                m.created_at.to_rfc3339(),
                m.attributes.pitch,
                m.attributes.dissonance,
                m.attributes.tempo,
                m.attributes.emotion.as_str(),
            ])?;
        }

        let mut insert_connection = tx.prepare(
            "INSERT OR IGNORE INTO connections
                (id, source, target, type, strength, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for c in store.get_connections() {
            insert_connection.execute(params![
                c.id,
                c.source,
                c.target,
                c.connection_type.as_str(),
                c.strength,
                c.created_at.to_rfc3339(),
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Load a store from the snapshot, in original insertion order.
pub fn load(conn: &Connection) -> Result<MemoryStore, MemoryError> {
    let mut stmt = conn.prepare(
        "SELECT id, content, type, created_at, pitch, dissonance, tempo, emotion
         FROM memories ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut memories = Vec::with_capacity(rows.len());
    for (id, content, kind, created_at, pitch, dissonance, tempo, emotion) in rows {
        memories.push(Memory {
            id,
            content,
            memory_type: MemoryType::from(kind),
            created_at: parse_datetime(&created_at)?,
            attributes: AttributeSet {
                pitch,
                dissonance,
                tempo,
                emotion: emotion.parse::<Emotion>()?,
            },
        });
    }

    let mut stmt = conn.prepare(
        "SELECT id, source, target, type, strength, created_at
         FROM connections ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut connections = Vec::with_capacity(rows.len());
    for (id, source, target, kind, strength, created_at) in rows {
        connections.push(Edge {
            id,
            source,
            target,
            connection_type: kind.parse::<ConnectionType>()?,
            strength,
            created_at: parse_datetime(&created_at)?,
        });
    }

    MemoryStore::from_parts(memories, connections)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, MemoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MemoryError::Validation(format!("Invalid stored datetime '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::Scorer;

    fn sample_store() -> MemoryStore {
        let scorer = Scorer::new();
        let mut store = MemoryStore::new();
        let a = store
            .ingest(&scorer, "I love jazz", MemoryType::Insight)
            .unwrap()
            .memory
            .id;
        let b = store
            .ingest(&scorer, "jazz is noise however", MemoryType::from("hunch"))
            .unwrap()
            .memory
            .id;
        store
            .create_connection(&a, &b, ConnectionType::Contradicts, 0.6)
            .unwrap();
        store
    }

    #[test]
    fn test_round_trip_in_memory() {
        let mut conn = open_in_memory().unwrap();
        let store = sample_store();
        save(&mut conn, &store).unwrap();

        let loaded = load(&conn).unwrap();
        assert_eq!(loaded.get_all_memories(), store.get_all_memories());
        assert_eq!(loaded.get_connections(), store.get_connections());
        assert_eq!(
            loaded.get_all_memories()[1].memory_type,
            MemoryType::Other("hunch".to_string())
        );
    }

    #[test]
    fn test_save_is_repeatable_and_updates_attributes() {
        let mut conn = open_in_memory().unwrap();
        let mut store = sample_store();
        save(&mut conn, &store).unwrap();

        let scorer = Scorer::new();
        store
            .ingest(&scorer, "jazz again but softer", MemoryType::Reflection)
            .unwrap();
        store.refresh_tempo(&scorer);
        save(&mut conn, &store).unwrap();

        let loaded = load(&conn).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.get_connections().len(), 1);
        assert_eq!(loaded.get_all_memories(), store.get_all_memories());
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.db");

        {
            let mut conn = open(&path).unwrap();
            save(&mut conn, &sample_store()).unwrap();
        }

        let conn = open(&path).unwrap();
        let loaded = load(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_load_empty() {
        let conn = open_in_memory().unwrap();
        let store = load(&conn).unwrap();
        assert!(store.is_empty());
        assert!(store.get_connections().is_empty());
    }
}
