//! Persistence of `TradeState` between cycles.
//!
//! The record lives in a single pretty-printed JSON file. Saves go through a
//! sibling temp file and a rename so readers never observe a partial write.

use crate::errors::{AppError, Result};
use crate::models::TradeState;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last persisted state.
    ///
    /// A missing or unparseable file yields zero defaults. Any other read
    /// failure is returned: the record may still be intact on disk, so the
    /// caller must not trade or save over it.
    pub async fn load(&self) -> Result<TradeState> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "[STATE] no saved state, starting fresh");
                return Ok(TradeState::default());
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "[STATE] failed to read state file");
                return Err(e.into());
            }
        };
        match serde_json::from_str::<TradeState>(&raw) {
            Ok(state) => {
                debug!(path = %self.path.display(), ?state, "[STATE] loaded");
                Ok(state)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "[STATE] failed to parse state file");
                Ok(TradeState::default())
            }
        }
    }

    /// Atomically replace the state file with `state`.
    pub async fn save(&self, state: &TradeState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.temp_path();
        self.write_temp(&tmp, json.as_bytes())
            .await
            .map_err(|e| persist_error(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(persist_error(&self.path, e));
        }
        debug!(path = %self.path.display(), "[STATE] saved");
        Ok(())
    }

    async fn write_temp(&self, tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(bytes).await?;
        file.write_all(b"\n").await?;
        file.sync_all().await
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn persist_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::Persist(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;

    fn sample() -> TradeState {
        TradeState {
            last_buy_amount: U256::from(2_000_000_000_000_000u64),
            last_sell_amount: U256::from(7u64),
            last_reserve_token: U256::from(1000u64),
            last_reserve_native: U256::from(10u64),
        }
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("tradeState.json"));
        assert_eq!(store.load().await.unwrap(), TradeState::default());
    }

    #[tokio::test]
    async fn save_then_load_and_no_temp_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tradeState.json");
        let store = StateStore::new(&path);
        store.save(&sample()).await.unwrap();

        assert_eq!(store.load().await.unwrap(), sample());
        assert!(!dir.path().join("tradeState.json.tmp").exists());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"lastReserveToken\": \"1000\""));
    }

    #[tokio::test]
    async fn save_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("s.json"));
        store.save(&sample()).await.unwrap();
        store.save(&TradeState::default()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), TradeState::default());
    }

    #[tokio::test]
    async fn corrupt_file_falls_back_to_defaults_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = StateStore::new(&path);
        assert_eq!(store.load().await.unwrap(), TradeState::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn unreadable_file_is_an_error_not_defaults() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file fails the read without being NotFound.
        let path = dir.path().join("s.json");
        std::fs::create_dir(&path).unwrap();
        let store = StateStore::new(&path);
        assert!(matches!(store.load().await, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn unwritable_location_is_a_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("missing-dir").join("s.json"));
        let err = store.save(&sample()).await.unwrap_err();
        assert!(matches!(err, AppError::Persist(_)));
    }
}
