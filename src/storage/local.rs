//! localStorage-backed best score for the web build.

use super::{ScoreStore, StorageError, BEST_SCORE_KEY};

#[derive(Default)]
pub struct LocalScoreStore;

impl LocalScoreStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        match window.local_storage() {
            Ok(Some(storage)) => Ok(storage),
            _ => Err(StorageError::Unavailable),
        }
    }
}

impl ScoreStore for LocalScoreStore {
    fn load_best_score(&self) -> Result<Option<u32>, StorageError> {
        let storage = Self::storage()?;
        let raw = storage
            .get_item(BEST_SCORE_KEY)
            .map_err(|e| StorageError::Io(format!("{:?}", e)))?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn save_best_score(&self, score: u32) -> Result<(), StorageError> {
        let storage = Self::storage()?;
        let json =
            serde_json::to_string(&score).map_err(|e| StorageError::Serialization(e.to_string()))?;
        storage
            .set_item(BEST_SCORE_KEY, &json)
            .map_err(|e| StorageError::Io(format!("{:?}", e)))
    }
}
