//! Single-player high score
//!
//! The best per-round token tally ever reached. Persisted under a fixed key
//! and never decreases.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError};

/// Storage key for the high score
pub const HIGH_SCORE_KEY: &str = "tronHighScore";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    best: u32,
}

impl HighScore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: u32) -> Self {
        Self { best }
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    /// Offer a round total. Returns true if it raised the high score.
    pub fn record(&mut self, total: u32) -> bool {
        if total > self.best {
            self.best = total;
            true
        } else {
            false
        }
    }

    /// Whether a finished round matched or beat the high score
    pub fn is_best(&self, total: u32) -> bool {
        self.best > 0 && total >= self.best
    }

    /// Load from a store. Missing or unreadable values start at zero.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(HIGH_SCORE_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<u32>() {
                Ok(best) => {
                    log::info!("Loaded high score {}", best);
                    Self { best }
                }
                Err(_) => {
                    log::warn!("Ignoring malformed high score {:?}", raw);
                    Self::new()
                }
            },
            Ok(None) => {
                log::info!("No high score found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("Could not read high score: {}", e);
                Self::new()
            }
        }
    }

    /// Persist, keeping whichever of the stored and current values is larger
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let stored = store
            .get(HIGH_SCORE_KEY)?
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(0);
        if stored >= self.best {
            return Ok(());
        }
        store.set(HIGH_SCORE_KEY, &self.best.to_string())?;
        log::info!("High score saved ({})", self.best);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_record_only_increases() {
        let mut high = HighScore::new();
        assert!(!high.record(0));
        assert!(high.record(3));
        assert!(!high.record(2));
        assert!(!high.record(3));
        assert!(high.record(4));
        assert_eq!(high.best(), 4);
    }

    #[test]
    fn test_is_best() {
        let high = HighScore::with_best(5);
        assert!(high.is_best(5));
        assert!(!high.is_best(4));
        assert!(!HighScore::new().is_best(0));
    }

    #[test]
    fn test_load_and_save() {
        let mut store = MemoryStore::new();
        assert_eq!(HighScore::load(&store).best(), 0);

        HighScore::with_best(7).save(&mut store).unwrap();
        assert_eq!(store.get(HIGH_SCORE_KEY).unwrap().as_deref(), Some("7"));
        assert_eq!(HighScore::load(&store).best(), 7);
    }

    #[test]
    fn test_save_never_lowers_stored_value() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, "20").unwrap();
        HighScore::with_best(8).save(&mut store).unwrap();
        assert_eq!(store.get(HIGH_SCORE_KEY).unwrap().as_deref(), Some("20"));
    }

    #[test]
    fn test_malformed_value_starts_fresh() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, "lots").unwrap();
        assert_eq!(HighScore::load(&store).best(), 0);
    }
}
