use std::path::Path;

use clawmem_core::error::Error;
use clawmem_core::Result;
use libsql::{Builder, Connection, Database};
use tracing::{debug, warn};

use crate::schema;

/// A handle to the embedded database. Cheap to clone-by-reference: every
/// operation opens a fresh [`Connection`] via [`Store::conn`], following the
/// teacher's `TursoStorage::get_connection()` pattern rather than holding one
/// connection behind a lock for the process lifetime.
pub struct Store {
    db: Database,
    vector_dim: parking_lot::RwLock<Option<usize>>,
}

impl Store {
    /// Open (creating if necessary) the database at `path` and apply the
    /// idempotent schema bootstrap (§4.1).
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Internal(e.into()))?;
        }
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| Error::Internal(anyhow::anyhow!("failed to open store: {e}")))?;

        let store = Store {
            db,
            vector_dim: parking_lot::RwLock::new(None),
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Open an in-memory database, used by tests and the CLI's dry-run mode.
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| Error::Internal(anyhow::anyhow!("failed to open in-memory store: {e}")))?;
        let store = Store {
            db,
            vector_dim: parking_lot::RwLock::new(None),
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Open a fresh connection. libSQL connections are cheap and not meant
    /// to be shared across concurrent callers.
    pub async fn conn(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| Error::Internal(anyhow::anyhow!("failed to open connection: {e}")))
    }

    async fn migrate(&self) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(store_err)?;
        conn.execute("PRAGMA journal_mode = WAL", ())
            .await
            .map_err(store_err)?;

        for stmt in schema::BOOTSTRAP_STATEMENTS {
            conn.execute(stmt, ()).await.map_err(store_err)?;
        }

        debug!("store schema bootstrap complete");
        Ok(())
    }

    /// Ensure the vector table exists with the given dimension. If a table
    /// already exists with a different declared width, it is dropped and
    /// rebuilt (§4.1: "a mismatch drops and rebuilds the table") — all
    /// existing embeddings are lost, which is expected since changing the
    /// embedder also invalidates every previously computed vector.
    pub async fn ensure_vector_table(&self, dim: usize) -> Result<()> {
        {
            let cached = *self.vector_dim.read();
            if cached == Some(dim) {
                return Ok(());
            }
        }

        let conn = self.conn().await?;
        let existing_dim = self.declared_vector_dim(&conn).await?;

        if let Some(existing) = existing_dim {
            if existing != dim {
                warn!(
                    existing,
                    new = dim,
                    "embedder dimension changed; dropping and rebuilding vector table"
                );
                conn.execute("DROP TABLE IF EXISTS embeddings", ())
                    .await
                    .map_err(store_err)?;
            }
        }

        conn.execute(&schema::create_embeddings_table_sql(dim), ())
            .await
            .map_err(store_err)?;
        conn.execute(schema::create_embeddings_vector_index_sql(), ())
            .await
            .map_err(store_err)?;

        *self.vector_dim.write() = Some(dim);
        Ok(())
    }

    async fn declared_vector_dim(&self, conn: &Connection) -> Result<Option<usize>> {
        let mut rows = conn
            .query(
                "SELECT sql FROM sqlite_master WHERE type='table' AND name='embeddings'",
                (),
            )
            .await
            .map_err(store_err)?;
        let Some(row) = rows.next().await.map_err(store_err)? else {
            return Ok(None);
        };
        let sql: String = row.get(0).map_err(store_err)?;
        Ok(parse_declared_dim(&sql))
    }
}

fn parse_declared_dim(create_sql: &str) -> Option<usize> {
    let marker = "F32_BLOB(";
    let start = create_sql.find(marker)? + marker.len();
    let end = create_sql[start..].find(')')? + start;
    create_sql[start..end].trim().parse().ok()
}

pub(crate) fn store_err(e: impl std::fmt::Display) -> Error {
    Error::Internal(anyhow::anyhow!("store error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declared_dimension() {
        let sql = "CREATE TABLE embeddings (hash TEXT, vector F32_BLOB(768) NOT NULL)";
        assert_eq!(parse_declared_dim(sql), Some(768));
    }

    #[test]
    fn missing_marker_is_none() {
        assert_eq!(parse_declared_dim("CREATE TABLE documents (id INTEGER)"), None);
    }

    #[tokio::test]
    async fn open_in_memory_bootstraps_schema() {
        let store = Store::open_in_memory().await.unwrap();
        let conn = store.conn().await.unwrap();
        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name='documents'",
                (),
            )
            .await
            .unwrap();
        assert!(rows.next().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ensure_vector_table_rebuilds_on_dimension_change() {
        let store = Store::open_in_memory().await.unwrap();
        store.ensure_vector_table(4).await.unwrap();
        store.ensure_vector_table(8).await.unwrap();

        let conn = store.conn().await.unwrap();
        let dim = store.declared_vector_dim(&conn).await.unwrap();
        assert_eq!(dim, Some(8));
    }
}
