//! Database schema definitions, mirroring the teacher's `schema.rs` module:
//! one `const &str` per DDL statement, applied idempotently on open.

pub const CREATE_CONTENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS content (
    hash TEXT PRIMARY KEY NOT NULL,
    body TEXT NOT NULL,
    created_at INTEGER NOT NULL
)
"#;

pub const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    path TEXT NOT NULL,
    title TEXT NOT NULL,
    hash TEXT NOT NULL REFERENCES content(hash),
    created_at INTEGER NOT NULL,
    modified_at INTEGER NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    content_type TEXT NOT NULL DEFAULT 'other',
    domain TEXT,
    workstream TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    review_by INTEGER,
    confidence REAL NOT NULL DEFAULT 0.5,
    access_count INTEGER NOT NULL DEFAULT 0,
    content_hash TEXT NOT NULL,
    amem_keywords TEXT,
    amem_tags TEXT,
    amem_context TEXT,
    observation_type TEXT,
    observation_facts TEXT,
    observation_narrative TEXT,
    observation_concepts TEXT,
    files_read TEXT NOT NULL DEFAULT '[]',
    files_modified TEXT NOT NULL DEFAULT '[]',
    UNIQUE(collection, path)
)
"#;

pub const CREATE_DOCUMENTS_ACTIVE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_documents_active ON documents(active, collection)
"#;

pub const CREATE_DOCUMENTS_CREATED_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_documents_created ON documents(created_at)
"#;

pub const CREATE_DOCUMENTS_UNENRICHED_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_documents_unenriched ON documents(active, amem_keywords, id)
"#;

pub const CREATE_FTS_TABLE: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
    path, title, body,
    content=''
)
"#;

pub const CREATE_FTS_INSERT_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS documents_fts_ai AFTER INSERT ON documents BEGIN
    INSERT INTO documents_fts(rowid, path, title, body)
    VALUES (new.id, new.path, new.title, (SELECT body FROM content WHERE hash = new.hash));
END
"#;

pub const CREATE_FTS_UPDATE_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS documents_fts_au AFTER UPDATE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, path, title, body)
    VALUES ('delete', old.id, old.path, old.title, (SELECT body FROM content WHERE hash = old.hash));
    INSERT INTO documents_fts(rowid, path, title, body)
    VALUES (new.id, new.path, new.title, (SELECT body FROM content WHERE hash = new.hash));
END
"#;

pub const CREATE_FTS_DELETE_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS documents_fts_ad AFTER DELETE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, path, title, body)
    VALUES ('delete', old.id, old.path, old.title, (SELECT body FROM content WHERE hash = old.hash));
END
"#;

/// Vector table DDL is dimension-parametric (the declared column width must
/// equal the embedder's output dimension, §3); built at runtime by
/// [`crate::store::Store::ensure_vector_table`], not a fixed constant.
pub fn create_embeddings_table_sql(dim: usize) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS embeddings (
    hash TEXT NOT NULL,
    seq INTEGER NOT NULL,
    pos INTEGER NOT NULL,
    model TEXT NOT NULL,
    embedded_at INTEGER NOT NULL,
    fragment_type TEXT NOT NULL,
    fragment_label TEXT,
    vector F32_BLOB({dim}) NOT NULL,
    PRIMARY KEY (hash, seq)
)
"#
    )
}

pub fn create_embeddings_vector_index_sql() -> &'static str {
    "CREATE INDEX IF NOT EXISTS embeddings_vec_idx ON embeddings(libsql_vector_idx(vector))"
}

pub const CREATE_RELATION_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS relation_edges (
    source_id INTEGER NOT NULL,
    target_id INTEGER NOT NULL,
    relation_type TEXT NOT NULL,
    weight REAL NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at INTEGER NOT NULL,
    PRIMARY KEY (source_id, target_id, relation_type)
)
"#;

pub const CREATE_RELATION_EDGES_SOURCE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_relation_edges_source ON relation_edges(source_id, relation_type)
"#;

pub const CREATE_RELATION_EDGES_TARGET_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_relation_edges_target ON relation_edges(target_id, relation_type)
"#;

pub const CREATE_EVOLUTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS evolutions (
    memory_id INTEGER NOT NULL,
    triggered_by INTEGER NOT NULL,
    version INTEGER NOT NULL,
    previous_keywords TEXT NOT NULL,
    previous_context TEXT NOT NULL,
    new_keywords TEXT NOT NULL,
    new_context TEXT NOT NULL,
    reasoning TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (memory_id, version)
)
"#;

pub const CREATE_INTENT_CACHE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS intent_cache (
    query_hash TEXT PRIMARY KEY NOT NULL,
    query_text TEXT NOT NULL,
    intent TEXT NOT NULL,
    confidence REAL NOT NULL,
    temporal_start INTEGER,
    temporal_end INTEGER,
    cached_at INTEGER NOT NULL
)
"#;

pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY NOT NULL,
    started_at INTEGER NOT NULL,
    ended_at INTEGER,
    handoff_path TEXT,
    machine TEXT NOT NULL,
    files_changed TEXT NOT NULL DEFAULT '[]',
    summary TEXT
)
"#;

pub const CREATE_USAGE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS usage_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    hook_name TEXT NOT NULL,
    injected_paths TEXT NOT NULL DEFAULT '[]',
    estimated_tokens INTEGER NOT NULL DEFAULT 0,
    was_referenced INTEGER NOT NULL DEFAULT 0
)
"#;

pub const CREATE_USAGE_RECORDS_SESSION_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_usage_records_session ON usage_records(session_id)
"#;

pub const CREATE_HOOK_DEDUPE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS hook_dedupe (
    hook_name TEXT NOT NULL,
    prompt_hash TEXT NOT NULL,
    last_seen_at INTEGER NOT NULL,
    preview TEXT NOT NULL,
    PRIMARY KEY (hook_name, prompt_hash)
)
"#;

/// All DDL statements applied on bootstrap, in dependency order. Additive
/// only: re-running this list against an already-migrated database is a
/// no-op (§4.1 "Schema bootstrap is idempotent").
pub const BOOTSTRAP_STATEMENTS: &[&str] = &[
    CREATE_CONTENT_TABLE,
    CREATE_DOCUMENTS_TABLE,
    CREATE_DOCUMENTS_ACTIVE_INDEX,
    CREATE_DOCUMENTS_CREATED_INDEX,
    CREATE_DOCUMENTS_UNENRICHED_INDEX,
    CREATE_FTS_TABLE,
    CREATE_FTS_INSERT_TRIGGER,
    CREATE_FTS_UPDATE_TRIGGER,
    CREATE_FTS_DELETE_TRIGGER,
    CREATE_RELATION_EDGES_TABLE,
    CREATE_RELATION_EDGES_SOURCE_INDEX,
    CREATE_RELATION_EDGES_TARGET_INDEX,
    CREATE_EVOLUTIONS_TABLE,
    CREATE_INTENT_CACHE_TABLE,
    CREATE_SESSIONS_TABLE,
    CREATE_USAGE_RECORDS_TABLE,
    CREATE_USAGE_RECORDS_SESSION_INDEX,
    CREATE_HOOK_DEDUPE_TABLE,
];
