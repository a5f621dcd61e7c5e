//! Arena configuration
//!
//! Everything an embedding application may want to tune without recompiling:
//! play-volume size, memory pool shape, and the simulation seed. Defaults
//! come from [`crate::consts`]; a JSON file can override any subset.

use serde::{Deserialize, Serialize};

use crate::consts;

/// Construction parameters for a [`crate::sim::GameArena`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Half-extent of the cubic play volume
    pub bounds: f64,
    /// Memory pool page size in bytes
    pub page_size: u32,
    /// Pages batch-allocated up front
    pub initial_pages: u32,
    /// Seed for the arena's deterministic RNG
    pub seed: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            bounds: consts::ARENA_BOUNDS,
            page_size: consts::PAGE_SIZE,
            initial_pages: consts::INITIAL_PAGES,
            seed: 0,
        }
    }
}

impl ArenaConfig {
    /// Parse a config from JSON; absent fields keep their defaults
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = ArenaConfig::default();
        assert_eq!(config.bounds, consts::ARENA_BOUNDS);
        assert_eq!(config.page_size, consts::PAGE_SIZE);
        assert_eq!(config.initial_pages, consts::INITIAL_PAGES);
        assert_eq!(config.seed, 0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ArenaConfig::from_json(r#"{"seed": 99, "bounds": 1000.0}"#).unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.bounds, 1000.0);
        assert_eq!(config.page_size, consts::PAGE_SIZE);
    }

    #[test]
    fn test_json_round_trip() {
        let config = ArenaConfig {
            bounds: 512.0,
            page_size: 1024,
            initial_pages: 2,
            seed: 7,
        };
        let text = config.to_json().unwrap();
        assert_eq!(ArenaConfig::from_json(&text).unwrap(), config);
    }
}
