use clawmem_core::types::{HookDedupeRecord, Session, UsageRecord};
use clawmem_core::Result;

use crate::content::now_secs;
use crate::store::{store_err, Store};

impl Store {
    /// Start (or restart) a session row.
    pub async fn start_session(&self, session_id: &str, machine: &str) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO sessions (session_id, started_at, machine, files_changed) \
             VALUES (?1, ?2, ?3, '[]') \
             ON CONFLICT(session_id) DO NOTHING",
            libsql::params![session_id, now_secs(), machine],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }

    /// Close a session, recording its handoff summary and touched files.
    pub async fn end_session(
        &self,
        session_id: &str,
        handoff_path: Option<&str>,
        files_changed: &[String],
        summary: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn().await?;
        let files_json = serde_json::to_string(files_changed).map_err(store_err)?;
        conn.execute(
            "UPDATE sessions SET ended_at = ?1, handoff_path = ?2, files_changed = ?3, summary = ?4 \
             WHERE session_id = ?5",
            libsql::params![now_secs(), handoff_path, files_json, summary, session_id],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT session_id, started_at, ended_at, handoff_path, machine, files_changed, summary \
                 FROM sessions WHERE session_id = ?1",
                libsql::params![session_id],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(row_to_session(&row)?)),
            None => Ok(None),
        }
    }

    /// Record one hook injection event (§4.11 feedback loop input).
    pub async fn insert_usage_record(
        &self,
        session_id: &str,
        hook_name: &str,
        injected_paths: &[String],
        estimated_tokens: u64,
    ) -> Result<i64> {
        let conn = self.conn().await?;
        let paths_json = serde_json::to_string(injected_paths).map_err(store_err)?;
        conn.execute(
            "INSERT INTO usage_records (session_id, timestamp, hook_name, injected_paths, estimated_tokens) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            libsql::params![session_id, now_secs(), hook_name, paths_json, estimated_tokens as i64],
        )
        .await
        .map_err(store_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// Usage records for a session not yet marked referenced, oldest first;
    /// the feedback loop scans these against transcript mentions.
    pub async fn unreferenced_usage_records(&self, session_id: &str) -> Result<Vec<UsageRecord>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, session_id, timestamp, hook_name, injected_paths, estimated_tokens, was_referenced \
                 FROM usage_records WHERE session_id = ?1 AND was_referenced = 0 ORDER BY timestamp ASC",
                libsql::params![session_id],
            )
            .await
            .map_err(store_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            out.push(row_to_usage_record(&row)?);
        }
        Ok(out)
    }

    pub async fn mark_usage_referenced(&self, id: i64) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE usage_records SET was_referenced = 1 WHERE id = ?1",
            libsql::params![id],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }

    /// Look up the last time `(hook_name, prompt_hash)` fired, for
    /// heartbeat/dedupe suppression (§6).
    pub async fn get_hook_dedupe(&self, hook_name: &str, prompt_hash: &str) -> Result<Option<HookDedupeRecord>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT hook_name, prompt_hash, last_seen_at, preview FROM hook_dedupe \
                 WHERE hook_name = ?1 AND prompt_hash = ?2",
                libsql::params![hook_name, prompt_hash],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(row_to_dedupe(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn put_hook_dedupe(&self, hook_name: &str, prompt_hash: &str, preview: &str) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO hook_dedupe (hook_name, prompt_hash, last_seen_at, preview) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(hook_name, prompt_hash) DO UPDATE SET \
               last_seen_at = excluded.last_seen_at, preview = excluded.preview",
            libsql::params![hook_name, prompt_hash, now_secs(), preview],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

fn row_to_session(row: &libsql::Row) -> Result<Session> {
    use chrono::{TimeZone, Utc};

    let started: i64 = row.get(1).map_err(store_err)?;
    let ended: Option<i64> = row.get(2).map_err(store_err)?;
    let files_json: String = row.get(5).map_err(store_err)?;

    Ok(Session {
        session_id: row.get(0).map_err(store_err)?,
        started_at: Utc.timestamp_opt(started, 0).single().unwrap_or_else(Utc::now),
        ended_at: ended.and_then(|s| Utc.timestamp_opt(s, 0).single()),
        handoff_path: row.get(3).map_err(store_err)?,
        machine: row.get(4).map_err(store_err)?,
        files_changed: serde_json::from_str(&files_json).unwrap_or_default(),
        summary: row.get(6).map_err(store_err)?,
    })
}

fn row_to_usage_record(row: &libsql::Row) -> Result<UsageRecord> {
    use chrono::{TimeZone, Utc};

    let ts: i64 = row.get(2).map_err(store_err)?;
    let paths_json: String = row.get(4).map_err(store_err)?;
    let tokens: i64 = row.get(5).map_err(store_err)?;
    let was_referenced: i64 = row.get(6).map_err(store_err)?;

    Ok(UsageRecord {
        id: row.get(0).map_err(store_err)?,
        session_id: row.get(1).map_err(store_err)?,
        timestamp: Utc.timestamp_opt(ts, 0).single().unwrap_or_else(Utc::now),
        hook_name: row.get(3).map_err(store_err)?,
        injected_paths: serde_json::from_str(&paths_json).unwrap_or_default(),
        estimated_tokens: tokens.max(0) as u64,
        was_referenced: was_referenced != 0,
    })
}

fn row_to_dedupe(row: &libsql::Row) -> Result<HookDedupeRecord> {
    use chrono::{TimeZone, Utc};

    let last_seen: i64 = row.get(2).map_err(store_err)?;
    Ok(HookDedupeRecord {
        hook_name: row.get(0).map_err(store_err)?,
        prompt_hash: row.get(1).map_err(store_err)?,
        last_seen_at: Utc.timestamp_opt(last_seen, 0).single().unwrap_or_else(Utc::now),
        preview: row.get(3).map_err(store_err)?,
    })
}
