//! Persisted enabled flag.
//!
//! The flag lives in the local store. An absent flag means enabled, and so
//! does a store that cannot be read: a broken settings read must not
//! silently stop sync.

use shelfsync_storage::{KvStore, StoreResult};
use serde_json::Value;

/// Writes `true` under `key` if no flag is stored yet.
pub async fn ensure_default_enabled<S>(store: &S, key: &str) -> StoreResult<()>
where
    S: KvStore + ?Sized,
{
    if store.get(key).await?.is_none() {
        store.set(key, Value::Bool(true)).await?;
    }
    Ok(())
}

/// Reads the flag. Only an explicit `false` disables sync.
pub async fn read_enabled<S>(store: &S, key: &str) -> bool
where
    S: KvStore + ?Sized,
{
    match store.get(key).await {
        Ok(value) => value != Some(Value::Bool(false)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read sync flag, assuming enabled");
            true
        }
    }
}

/// Persists the flag.
pub async fn write_enabled<S>(store: &S, key: &str, enabled: bool) -> StoreResult<()>
where
    S: KvStore + ?Sized,
{
    store.set(key, Value::Bool(enabled)).await
}
