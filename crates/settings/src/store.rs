//! SQLite-backed settings store.
//!
//! Values are serialized with serde_json, so any `Serialize` type can be
//! stored and read back with its own shape.

use {
    buran_common::now_ms,
    serde::{Serialize, de::DeserializeOwned},
    sqlx::SqlitePool,
    tracing::{debug, warn},
};

use crate::{Error, Result};

/// Key to JSON document store.
#[derive(Clone)]
pub struct SettingsStore {
    pool: SqlitePool,
}

impl SettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Raw JSON text for `key`.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// Typed value for `key`, if present.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| Error::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Typed value for `key`, or `default` when unset or undecodable.
    ///
    /// A stored document that no longer matches `T` is logged and ignored
    /// rather than breaking the reader.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Ok(default),
            Err(Error::Decode { key, source }) => {
                warn!(%key, error = %source, "stored setting does not decode, using default");
                Ok(default)
            },
            Err(e) => Err(e),
        }
    }

    /// Insert or replace `key`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        sqlx::query(
            r#"INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(&raw)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        debug!(key, "setting saved");
        Ok(())
    }

    /// Remove `key`. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::BTreeMap};

    async fn test_store() -> SettingsStore {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::run_migrations(&pool).await.unwrap();
        SettingsStore::new(pool)
    }

    #[tokio::test]
    async fn missing_key_yields_default() {
        let store = test_store().await;
        let v: Vec<String> = store.get_or("nothing", vec!["d".into()]).await.unwrap();
        assert_eq!(v, vec!["d".to_string()]);
    }

    #[tokio::test]
    async fn set_then_get_roundtrips_map() {
        let store = test_store().await;
        let map = BTreeMap::from([("a".to_string(), "1".to_string())]);
        store.set("quickReplies", &map).await.unwrap();
        let back: BTreeMap<String, String> = store.get("quickReplies").await.unwrap().unwrap();
        assert_eq!(back, map);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = test_store().await;
        store.set("k", &1u32).await.unwrap();
        store.set("k", &2u32).await.unwrap();
        assert_eq!(store.get_or("k", 0u32).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn mismatched_document_falls_back_to_default() {
        let store = test_store().await;
        store.set("k", "not a number").await.unwrap();
        assert!(matches!(
            store.get::<u32>("k").await,
            Err(Error::Decode { .. })
        ));
        assert_eq!(store.get_or("k", 7u32).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = test_store().await;
        store.set("k", &true).await.unwrap();
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }
}
