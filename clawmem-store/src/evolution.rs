use clawmem_core::types::Evolution;
use clawmem_core::Result;

use crate::content::now_secs;
use crate::store::{store_err, Store};

impl Store {
    /// Apply an A-MEM evolution: update the target document's enrichment
    /// fields and append an immutable evolution record, in one transaction
    /// (§4.4, §8 invariant 11: "evolution is transactional — the document
    /// update and its history entry succeed or fail together").
    pub async fn apply_evolution(
        &self,
        memory_id: i64,
        triggered_by: i64,
        new_keywords: &[String],
        new_context: &str,
        reasoning: &str,
    ) -> Result<u32> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(store_err)?;

        let (prev_keywords_json, prev_context): (String, String) = {
            let mut rows = tx
                .query(
                    "SELECT amem_keywords, amem_context FROM documents WHERE id = ?1",
                    libsql::params![memory_id],
                )
                .await
                .map_err(store_err)?;
            match rows.next().await.map_err(store_err)? {
                Some(row) => {
                    let kw: Option<String> = row.get(0).map_err(store_err)?;
                    let ctx: Option<String> = row.get(1).map_err(store_err)?;
                    (kw.unwrap_or_else(|| "[]".to_string()), ctx.unwrap_or_default())
                }
                None => {
                    return Err(clawmem_core::Error::not_found(
                        format!("document {memory_id} not found"),
                        Vec::new(),
                    ))
                }
            }
        };

        let next_version: u32 = {
            let mut rows = tx
                .query(
                    "SELECT COALESCE(MAX(version), 0) + 1 FROM evolutions WHERE memory_id = ?1",
                    libsql::params![memory_id],
                )
                .await
                .map_err(store_err)?;
            let row = rows.next().await.map_err(store_err)?;
            match row {
                Some(r) => {
                    let v: i64 = r.get(0).map_err(store_err)?;
                    v as u32
                }
                None => 1,
            }
        };

        let new_keywords_json = serde_json::to_string(new_keywords).map_err(store_err)?;

        tx.execute(
            "UPDATE documents SET amem_keywords = ?1, amem_context = ?2 WHERE id = ?3",
            libsql::params![new_keywords_json.clone(), new_context, memory_id],
        )
        .await
        .map_err(store_err)?;

        tx.execute(
            "INSERT INTO evolutions \
             (memory_id, triggered_by, version, previous_keywords, previous_context, \
              new_keywords, new_context, reasoning, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            libsql::params![
                memory_id,
                triggered_by,
                next_version,
                prev_keywords_json,
                prev_context,
                new_keywords_json,
                new_context,
                reasoning,
                now_secs(),
            ],
        )
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(next_version)
    }

    /// Full evolution history for a document, oldest first.
    pub async fn evolution_history(&self, memory_id: i64) -> Result<Vec<Evolution>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT memory_id, triggered_by, version, previous_keywords, previous_context, \
                 new_keywords, new_context, reasoning, created_at \
                 FROM evolutions WHERE memory_id = ?1 ORDER BY version ASC",
                libsql::params![memory_id],
            )
            .await
            .map_err(store_err)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            out.push(row_to_evolution(&row)?);
        }
        Ok(out)
    }
}

fn row_to_evolution(row: &libsql::Row) -> Result<Evolution> {
    use chrono::{TimeZone, Utc};

    let created_secs: i64 = row.get(8).map_err(store_err)?;
    let prev_kw: String = row.get(3).map_err(store_err)?;
    let new_kw: String = row.get(5).map_err(store_err)?;

    Ok(Evolution {
        memory_id: row.get(0).map_err(store_err)?,
        triggered_by: row.get(1).map_err(store_err)?,
        version: {
            let v: i64 = row.get(2).map_err(store_err)?;
            v as u32
        },
        previous_keywords: serde_json::from_str(&prev_kw).unwrap_or_default(),
        previous_context: row.get(4).map_err(store_err)?,
        new_keywords: serde_json::from_str(&new_kw).unwrap_or_default(),
        new_context: row.get(6).map_err(store_err)?,
        reasoning: row.get(7).map_err(store_err)?,
        created_at: Utc.timestamp_opt(created_secs, 0).single().unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::UpsertRequest;
    use clawmem_core::types::ContentType;

    async fn doc() -> (Store, i64) {
        let store = Store::open_in_memory().await.unwrap();
        let (id, _) = store
            .upsert_document(UpsertRequest {
                collection: "notes",
                path: "a.md",
                title: "A",
                hash: "h1",
                content_hash: "c1",
                content_type: ContentType::Note,
                domain: None,
                workstream: None,
                tags: &[],
            })
            .await
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn first_evolution_is_version_one() {
        let (store, id) = doc().await;
        let version = store
            .apply_evolution(id, id, &["foo".to_string()], "ctx", "because")
            .await
            .unwrap();
        assert_eq!(version, 1);
        let fetched = store.get_document(id).await.unwrap().unwrap();
        assert_eq!(fetched.amem_keywords, Some(vec!["foo".to_string()]));
    }

    #[tokio::test]
    async fn evolutions_are_monotone_and_append_only() {
        let (store, id) = doc().await;
        store
            .apply_evolution(id, id, &["a".to_string()], "ctx1", "r1")
            .await
            .unwrap();
        store
            .apply_evolution(id, id, &["b".to_string()], "ctx2", "r2")
            .await
            .unwrap();
        let history = store.evolution_history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].version, 1);
        assert_eq!(history[1].version, 2);
        assert_eq!(history[1].previous_context, "ctx1");
    }
}
