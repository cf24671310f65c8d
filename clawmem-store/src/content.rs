use sha2::{Digest, Sha256};

use clawmem_core::Result;

use crate::store::{store_err, Store};

/// Compute the content-addressable hash for a body (§3: "documents reference
/// their body by content hash, not inline").
#[must_use]
pub fn hash_body(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Store {
    /// Insert `body` into the content table if its hash isn't already
    /// present, and return the hash. Idempotent: re-inserting identical
    /// content is a no-op.
    pub async fn insert_content(&self, body: &str) -> Result<String> {
        let hash = hash_body(body);
        let conn = self.conn().await?;
        conn.execute(
            "INSERT OR IGNORE INTO content (hash, body, created_at) VALUES (?1, ?2, ?3)",
            libsql::params![hash.clone(), body, now_secs()],
        )
        .await
        .map_err(store_err)?;
        Ok(hash)
    }

    /// Fetch a content body by hash.
    pub async fn get_content(&self, hash: &str) -> Result<Option<String>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query("SELECT body FROM content WHERE hash = ?1", libsql::params![hash])
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(row.get(0).map_err(store_err)?)),
            None => Ok(None),
        }
    }

    /// Delete content blobs with no referencing document and no embeddings
    /// (§4.10 Consolidation / maintenance). Returns the number removed.
    pub async fn cleanup_orphaned_content(&self) -> Result<u64> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "DELETE FROM content WHERE hash NOT IN (SELECT hash FROM documents) \
                 AND hash NOT IN (SELECT hash FROM embeddings)",
                (),
            )
            .await
            .map_err(store_err)?;
        Ok(changed)
    }
}

pub(crate) fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable() {
        assert_eq!(hash_body("hello"), hash_body("hello"));
        assert_ne!(hash_body("hello"), hash_body("world"));
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let store = Store::open_in_memory().await.unwrap();
        let hash = store.insert_content("hello world").await.unwrap();
        let fetched = store.get_content(&hash).await.unwrap();
        assert_eq!(fetched.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn duplicate_insert_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        let h1 = store.insert_content("same").await.unwrap();
        let h2 = store.insert_content("same").await.unwrap();
        assert_eq!(h1, h2);
    }

    #[tokio::test]
    async fn cleanup_removes_unreferenced_content() {
        let store = Store::open_in_memory().await.unwrap();
        store.insert_content("orphan").await.unwrap();
        let removed = store.cleanup_orphaned_content().await.unwrap();
        assert_eq!(removed, 1);
    }
}
