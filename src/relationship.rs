//! Typed, weighted connections between memories.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// Minimum allowed connection strength.
pub const MIN_STRENGTH: f64 = 0.1;

/// Maximum allowed connection strength.
pub const MAX_STRENGTH: f64 = 1.0;

/// Kind of relation asserted between two memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Related,
    Contradicts,
    Supports,
    Questions,
    Expands,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Related => "related",
            ConnectionType::Contradicts => "contradicts",
            ConnectionType::Supports => "supports",
            ConnectionType::Questions => "questions",
            ConnectionType::Expands => "expands",
        }
    }

    pub fn all() -> &'static [ConnectionType] {
        &[
            ConnectionType::Related,
            ConnectionType::Contradicts,
            ConnectionType::Supports,
            ConnectionType::Questions,
            ConnectionType::Expands,
        ]
    }
}

impl FromStr for ConnectionType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "related" => Ok(ConnectionType::Related),
            "contradicts" => Ok(ConnectionType::Contradicts),
            "supports" => Ok(ConnectionType::Supports),
            "questions" => Ok(ConnectionType::Questions),
            "expands" => Ok(ConnectionType::Expands),
            _ => Err(MemoryError::Validation(format!(
                "Unknown connection type: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed, weighted edge between two memories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    pub strength: f64,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    /// True if this edge joins `a` and `b` in either direction.
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Result of connecting dissonant pairs (only creates where no edge exists).
#[derive(Debug, Serialize)]
pub struct ConnectResult {
    /// Connections that were created.
    pub created: Vec<Connection>,
    /// Pairs that were skipped because they were already connected.
    pub skipped: Vec<(String, String)>,
}

/// Check that a strength lies within `[MIN_STRENGTH, MAX_STRENGTH]`.
pub(crate) fn validate_strength(strength: f64) -> Result<(), MemoryError> {
    if strength.is_finite() && (MIN_STRENGTH..=MAX_STRENGTH).contains(&strength) {
        Ok(())
    } else {
        Err(MemoryError::Validation(format!(
            "Connection strength must be within [{}, {}] (got {})",
            MIN_STRENGTH, MAX_STRENGTH, strength
        )))
    }
}

/// Map a dissonance score onto the allowed strength range.
pub(crate) fn strength_from_score(score: f64) -> f64 {
    score.clamp(MIN_STRENGTH, MAX_STRENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_strength() {
        assert!(validate_strength(0.1).is_ok());
        assert!(validate_strength(1.0).is_ok());
        assert!(validate_strength(0.55).is_ok());

        for bad in [0.0, 0.09, 1.01, f64::NAN, f64::INFINITY] {
            let err = validate_strength(bad).unwrap_err();
            assert!(matches!(err, MemoryError::Validation(_)));
        }
    }

    #[test]
    fn test_connection_type_parsing() {
        assert_eq!(
            "Contradicts".parse::<ConnectionType>().unwrap(),
            ConnectionType::Contradicts
        );
        for t in ConnectionType::all() {
            assert_eq!(t.as_str().parse::<ConnectionType>().unwrap(), *t);
        }
        let err = "rhymes_with".parse::<ConnectionType>().unwrap_err();
        assert!(matches!(err, MemoryError::Validation(_)));
    }

    #[test]
    fn test_strength_from_score() {
        assert_eq!(strength_from_score(0.05), 0.1);
        assert_eq!(strength_from_score(0.42), 0.42);
        assert_eq!(strength_from_score(3.0), 1.0);
    }

    #[test]
    fn test_joins() {
        let conn = Connection {
            id: "conn_1".to_string(),
            source: "a".to_string(),
            target: "b".to_string(),
            connection_type: ConnectionType::Related,
            strength: 0.5,
            created_at: Utc::now(),
        };
        assert!(conn.joins("a", "b"));
        assert!(conn.joins("b", "a"));
        assert!(!conn.joins("a", "c"));
    }
}
