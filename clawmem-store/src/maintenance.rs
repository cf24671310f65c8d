use clawmem_core::Result;

use crate::store::{store_err, Store};

/// Summary of one maintenance pass (§4.10 consolidation / cleanup).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CleanupReport {
    pub orphaned_content_removed: u64,
    pub orphaned_vectors_removed: u64,
}

impl Store {
    /// Run both orphan-cleanup passes in sequence: vectors first, since a
    /// content row can only be reclaimed once nothing (document or
    /// embedding) still references its hash.
    pub async fn cleanup_orphans(&self) -> Result<CleanupReport> {
        let orphaned_vectors_removed = self.cleanup_orphaned_vectors().await?;
        let orphaned_content_removed = self.cleanup_orphaned_content().await?;
        Ok(CleanupReport {
            orphaned_content_removed,
            orphaned_vectors_removed,
        })
    }

    /// Reclaim disk space after a cleanup pass. Not run automatically: the
    /// CLI exposes it as an explicit `vacuum` command (§6) since `VACUUM`
    /// briefly locks the whole database.
    pub async fn vacuum(&self) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute("VACUUM", ()).await.map_err(store_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cleanup_orphans_removes_unreferenced_rows() {
        let store = Store::open_in_memory().await.unwrap();
        store.insert_content("orphan").await.unwrap();
        let report = store.cleanup_orphans().await.unwrap();
        assert_eq!(report.orphaned_content_removed, 1);
    }

    #[tokio::test]
    async fn vacuum_runs_without_error() {
        let store = Store::open_in_memory().await.unwrap();
        store.vacuum().await.unwrap();
    }
}
