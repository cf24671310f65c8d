use chrono::Utc;

use clawmem_core::constants::INTENT_CACHE_TTL_SECS;
use clawmem_core::types::{Intent, IntentClassification};
use clawmem_core::Result;

use crate::content::{hash_body, now_secs};
use crate::store::{store_err, Store};

impl Store {
    /// Look up a cached classification for `query_text`, ignoring entries
    /// older than [`INTENT_CACHE_TTL_SECS`] (§3: "entries older than the TTL
    /// are ignored by the cache lookup, not eagerly swept").
    pub async fn get_cached_intent(&self, query_text: &str) -> Result<Option<IntentClassification>> {
        let hash = hash_body(query_text);
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT query_hash, query_text, intent, confidence, temporal_start, temporal_end, cached_at \
                 FROM intent_cache WHERE query_hash = ?1",
                libsql::params![hash],
            )
            .await
            .map_err(store_err)?;

        let Some(row) = rows.next().await.map_err(store_err)? else {
            return Ok(None);
        };
        let record = row_to_classification(&row)?;
        if record.is_expired(Utc::now(), INTENT_CACHE_TTL_SECS) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Cache a classification result, replacing any prior entry for the
    /// same query text.
    pub async fn put_cached_intent(
        &self,
        query_text: &str,
        intent: Intent,
        confidence: f64,
        temporal_start: Option<i64>,
        temporal_end: Option<i64>,
    ) -> Result<()> {
        let hash = hash_body(query_text);
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO intent_cache \
             (query_hash, query_text, intent, confidence, temporal_start, temporal_end, cached_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(query_hash) DO UPDATE SET \
               intent = excluded.intent, confidence = excluded.confidence, \
               temporal_start = excluded.temporal_start, temporal_end = excluded.temporal_end, \
               cached_at = excluded.cached_at",
            libsql::params![
                hash,
                query_text,
                intent.as_str(),
                confidence,
                temporal_start,
                temporal_end,
                now_secs(),
            ],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

fn row_to_classification(row: &libsql::Row) -> Result<IntentClassification> {
    use chrono::{TimeZone, Utc};

    let intent_raw: String = row.get(2).map_err(store_err)?;
    let cached_secs: i64 = row.get(6).map_err(store_err)?;
    let temporal_start: Option<i64> = row.get(4).map_err(store_err)?;
    let temporal_end: Option<i64> = row.get(5).map_err(store_err)?;

    Ok(IntentClassification {
        query_hash: row.get(0).map_err(store_err)?,
        query_text: row.get(1).map_err(store_err)?,
        intent: Intent::parse_strict(&intent_raw).unwrap_or(Intent::What),
        confidence: row.get(3).map_err(store_err)?,
        temporal_start: temporal_start.and_then(|s| Utc.timestamp_opt(s, 0).single()),
        temporal_end: temporal_end.and_then(|s| Utc.timestamp_opt(s, 0).single()),
        cached_at: Utc.timestamp_opt(cached_secs, 0).single().unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn caches_and_retrieves_intent() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .put_cached_intent("why did this fail", Intent::Why, 0.9, None, None)
            .await
            .unwrap();
        let cached = store.get_cached_intent("why did this fail").await.unwrap();
        assert_eq!(cached.unwrap().intent, Intent::Why);
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let store = Store::open_in_memory().await.unwrap();
        let cached = store.get_cached_intent("never seen").await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn put_replaces_prior_entry() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .put_cached_intent("q", Intent::What, 0.5, None, None)
            .await
            .unwrap();
        store
            .put_cached_intent("q", Intent::Entity, 0.8, None, None)
            .await
            .unwrap();
        let cached = store.get_cached_intent("q").await.unwrap().unwrap();
        assert_eq!(cached.intent, Intent::Entity);
    }
}
