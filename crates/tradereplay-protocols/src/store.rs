//! Persistent local store protocol.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;

/// Well-known keys in the extension-scoped store.
pub mod keys {
    /// `Vec<TradeRecord>`, append-only log.
    pub const TRADES: &str = "trades";
    /// `Vec<ScreenshotRecord>`, capped ring.
    pub const SCREENSHOTS: &str = "screenshots";
    /// `bool` recording flag.
    pub const IS_RECORDING: &str = "isRecording";
    /// Free-form settings object.
    pub const SETTINGS: &str = "settings";
    /// Remote backend session blob.
    pub const SESSION: &str = "supabase_session";
}

/// Key-value storage scoped to the extension.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read a raw value.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write a raw value.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed read of a stored value.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn LocalStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Typed write of a value.
pub async fn set_typed<T: Serialize + Sync>(
    store: &dyn LocalStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value)?;
    store.set(key, value).await
}
