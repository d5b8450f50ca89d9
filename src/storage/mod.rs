//! Best-score persistence.
//!
//! The only state that outlives a session is a single best-score value,
//! stored under [`BEST_SCORE_KEY`]. On WASM it lives in localStorage; on
//! native builds in a small JSON file. Storage failures never reach the
//! game: [`BestScore`] logs them and carries on with the in-memory value.

#[cfg(target_arch = "wasm32")]
mod local;

#[cfg(target_arch = "wasm32")]
pub use local::LocalScoreStore;

#[cfg(not(target_arch = "wasm32"))]
pub use native::FileScoreStore;

use std::sync::{Arc, RwLock};

/// Fixed key the best score is stored under.
pub const BEST_SCORE_KEY: &str = "world-outline-map.best-score";

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The storage backend is not available.
    Unavailable,
    /// The stored value could not be serialized or deserialized.
    Serialization(String),
    /// Reading or writing the backend failed.
    Io(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "Storage unavailable"),
            StorageError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::Io(msg) => write!(f, "Storage I/O error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Backend for the persisted best score.
pub trait ScoreStore {
    /// Reads the stored best score, `Ok(None)` if nothing has been stored.
    fn load_best_score(&self) -> Result<Option<u32>, StorageError>;

    fn save_best_score(&self, score: u32) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same value.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    value: Arc<RwLock<Option<u32>>>,
    failing: bool,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(score: u32) -> Self {
        Self {
            value: Arc::new(RwLock::new(Some(score))),
            failing: false,
        }
    }

    /// A store whose every operation fails, as when storage is disabled.
    pub fn failing() -> Self {
        Self {
            value: Arc::default(),
            failing: true,
        }
    }

    pub fn stored(&self) -> Option<u32> {
        self.value.read().ok().and_then(|v| *v)
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load_best_score(&self) -> Result<Option<u32>, StorageError> {
        if self.failing {
            return Err(StorageError::Unavailable);
        }
        self.value
            .read()
            .map(|v| *v)
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    fn save_best_score(&self, score: u32) -> Result<(), StorageError> {
        if self.failing {
            return Err(StorageError::Unavailable);
        }
        *self
            .value
            .write()
            .map_err(|e| StorageError::Io(e.to_string()))? = Some(score);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    /// Stores the best score in a JSON object file keyed by [`BEST_SCORE_KEY`].
    pub struct FileScoreStore {
        path: PathBuf,
    }

    impl FileScoreStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        fn read_entries(&self) -> Result<BTreeMap<String, u32>, StorageError> {
            if !self.path.exists() {
                return Ok(BTreeMap::new());
            }
            let json = std::fs::read_to_string(&self.path)
                .map_err(|e| StorageError::Io(e.to_string()))?;
            serde_json::from_str(&json).map_err(|e| StorageError::Serialization(e.to_string()))
        }
    }

    impl ScoreStore for FileScoreStore {
        fn load_best_score(&self) -> Result<Option<u32>, StorageError> {
            Ok(self.read_entries()?.get(BEST_SCORE_KEY).copied())
        }

        fn save_best_score(&self, score: u32) -> Result<(), StorageError> {
            // A corrupt file is replaced rather than blocking the write.
            let mut entries = self.read_entries().unwrap_or_default();
            entries.insert(BEST_SCORE_KEY.to_string(), score);
            let json = serde_json::to_string_pretty(&entries)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
                }
            }
            std::fs::write(&self.path, json).map_err(|e| StorageError::Io(e.to_string()))
        }
    }
}

/// The best score seen so far, written through to a store.
pub struct BestScore {
    value: u32,
    store: Box<dyn ScoreStore>,
}

impl BestScore {
    /// Reads the stored value; read failures start from zero.
    pub fn load(store: Box<dyn ScoreStore>) -> Self {
        let value = match store.load_best_score() {
            Ok(value) => value.unwrap_or(0),
            Err(e) => {
                log::warn!("Could not read best score, starting from 0: {}", e);
                0
            }
        };
        Self { value, store }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Records `score` if it beats the best; returns whether it did.
    pub fn observe(&mut self, score: u32) -> bool {
        if score <= self.value {
            return false;
        }
        self.value = score;
        if let Err(e) = self.store.save_best_score(score) {
            log::warn!("Could not persist best score {}: {}", score, e);
        }
        true
    }
}

impl std::fmt::Debug for BestScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestScore").field("value", &self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_score_only_increases() {
        let store = MemoryScoreStore::with_value(20);
        let mut best = BestScore::load(Box::new(store.clone()));
        assert_eq!(best.value(), 20);
        assert!(!best.observe(10));
        assert!(!best.observe(20));
        assert!(best.observe(35));
        assert_eq!(best.value(), 35);
        assert_eq!(store.stored(), Some(35));
    }

    #[test]
    fn test_failing_store_is_session_only() {
        let mut best = BestScore::load(Box::new(MemoryScoreStore::failing()));
        assert_eq!(best.value(), 0);
        assert!(best.observe(12));
        assert_eq!(best.value(), 12);
    }

    #[test]
    fn test_empty_store_starts_at_zero() {
        let best = BestScore::load(Box::new(MemoryScoreStore::new()));
        assert_eq!(best.value(), 0);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "world-outline-map-test-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let store = FileScoreStore::new(&path);
        assert_eq!(store.load_best_score(), Ok(None));
        store.save_best_score(42).unwrap();
        assert_eq!(FileScoreStore::new(&path).load_best_score(), Ok(Some(42)));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            store.load_best_score(),
            Err(StorageError::Serialization(_))
        ));
        store.save_best_score(7).unwrap();
        assert_eq!(store.load_best_score(), Ok(Some(7)));

        let _ = std::fs::remove_file(&path);
    }
}
