//! Durable key/value slots the session store persists into.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tower_sessions::Session;

use super::SessionError;

/// Storage the [`SessionStore`](super::SessionStore) reads and writes.
///
/// Values are JSON so that both the raw token and the display profile fit
/// the same slot.
pub trait TokenSlot: Send + Sync {
    /// Read the value under `key`.
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<Value>, SessionError>> + Send;

    /// Write `value` under `key`, replacing any previous value.
    fn store(&self, key: &str, value: Value)
    -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Delete the value under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), SessionError>> + Send;
}

impl TokenSlot for Session {
    async fn load(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(self.get::<Value>(key).await?)
    }

    async fn store(&self, key: &str, value: Value) -> Result<(), SessionError> {
        Ok(self.insert(key, value).await?)
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.remove::<Value>(key).await?;
        Ok(())
    }
}

/// In-process slot.
///
/// Clones share the same storage, so a clone handed to one
/// [`SessionStore`](super::SessionStore) is visible to a store rehydrated
/// later from another clone.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a value is present under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl TokenSlot for MemorySlot {
    async fn load(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    async fn store(&self, key: &str, value: Value) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}
