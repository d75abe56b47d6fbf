//! SQLite durable store.
//!
//! All entries live here regardless of hot-tier membership. A single
//! connection behind a mutex is enough: soft mutations funnel through the
//! one queue consumer, and request-path writes are short upserts.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::info;

use aula_core::errors::{AulaResult, StorageError};
use aula_core::memory::{Confidence, ContextType, EntryDetails, Importance, MemoryEntry};
use aula_core::traits::{CleanupCriteria, EntryFilter, FeedbackAudit, IDurableStore, StoreStats};
use aula_embeddings::codec;

fn sql_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Sqlite {
        message: e.to_string(),
    }
}

fn json_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Serialization {
        message: e.to_string(),
    }
}

/// Fixed-width UTC timestamp so string comparison in SQL matches time order.
fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_ts(s: &str) -> AulaResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| sql_err(format!("bad timestamp '{s}': {e}")).into())
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the durable store at the given path.
    pub fn open(path: &Path) -> AulaResult<Self> {
        info!(?path, "opening durable store");
        let conn = Connection::open(path).map_err(sql_err)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store (for tests).
    pub fn open_in_memory() -> AulaResult<Self> {
        let conn = Connection::open_in_memory().map_err(sql_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> AulaResult<Self> {
        apply_pragmas(&conn)?;
        create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            id: row.get(0)?,
            content: row.get(1)?,
            context_type: row.get(2)?,
            category: row.get(3)?,
            subcategory: row.get(4)?,
            owner: row.get(5)?,
            embedding: row.get(6)?,
            importance: row.get(7)?,
            access_count: row.get::<_, i64>(8)? as u64,
            created_at: row.get(9)?,
            last_accessed: row.get(10)?,
            details: row.get(11)?,
            extra: row.get(12)?,
            related: row.get(13)?,
            confidence: row.get(14)?,
            source: row.get(15)?,
        })
    }
}

/// Column tuple as read from SQLite, before decoding blobs and JSON.
struct RawRow {
    id: String,
    content: String,
    context_type: String,
    category: String,
    subcategory: Option<String>,
    owner: Option<String>,
    embedding: Vec<u8>,
    importance: f64,
    access_count: u64,
    created_at: String,
    last_accessed: String,
    details: String,
    extra: String,
    related: String,
    confidence: f64,
    source: String,
}

impl RawRow {
    fn decode(self) -> AulaResult<MemoryEntry> {
        Ok(MemoryEntry {
            embedding: codec::decode(&self.embedding)?,
            context_type: ContextType::parse(&self.context_type)
                .unwrap_or(ContextType::General),
            details: serde_json::from_str::<EntryDetails>(&self.details).map_err(json_err)?,
            extra: serde_json::from_str(&self.extra).map_err(json_err)?,
            related_ids: serde_json::from_str(&self.related).map_err(json_err)?,
            created_at: decode_ts(&self.created_at)?,
            last_accessed: decode_ts(&self.last_accessed)?,
            importance: Importance::new(self.importance),
            confidence: Confidence::new(self.confidence),
            id: self.id,
            content: self.content,
            category: self.category,
            subcategory: self.subcategory,
            owner: self.owner,
            access_count: self.access_count,
            source: self.source,
        })
    }
}

const ENTRY_COLUMNS: &str = "id, content, context_type, category, subcategory, owner, embedding, \
     importance, access_count, created_at, last_accessed, details, extra, related, confidence, source";

fn apply_pragmas(conn: &Connection) -> AulaResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .map_err(sql_err)?;
    Ok(())
}

fn create_schema(conn: &Connection) -> AulaResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            context_type TEXT NOT NULL,
            category TEXT NOT NULL,
            subcategory TEXT,
            owner TEXT,
            embedding BLOB NOT NULL,
            importance REAL NOT NULL,
            access_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            last_accessed TEXT NOT NULL,
            details TEXT NOT NULL,
            extra TEXT NOT NULL DEFAULT '{}',
            related TEXT NOT NULL DEFAULT '[]',
            confidence REAL NOT NULL DEFAULT 1.0,
            source TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_entries_category ON entries(category);
        CREATE INDEX IF NOT EXISTS idx_entries_context ON entries(context_type);
        CREATE INDEX IF NOT EXISTS idx_entries_owner ON entries(owner);
        CREATE INDEX IF NOT EXISTS idx_entries_last_accessed ON entries(last_accessed);

        CREATE TABLE IF NOT EXISTS feedback_audit (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            query TEXT NOT NULL,
            score INTEGER NOT NULL,
            kind TEXT NOT NULL,
            needs_improvement INTEGER NOT NULL,
            owner TEXT,
            category TEXT,
            comment TEXT,
            matched_concepts TEXT NOT NULL DEFAULT '[]',
            received_at TEXT NOT NULL
        );
        ",
    )
    .map_err(sql_err)?;
    Ok(())
}

impl IDurableStore for SqliteStore {
    fn upsert(&self, entry: &MemoryEntry) -> AulaResult<()> {
        let details = serde_json::to_string(&entry.details).map_err(json_err)?;
        let extra = serde_json::to_string(&entry.extra).map_err(json_err)?;
        let related = serde_json::to_string(&entry.related_ids).map_err(json_err)?;
        let conn = self.conn.lock().expect("sqlite lock poisoned");
        conn.execute(
            "INSERT INTO entries (id, content, context_type, category, subcategory, owner, \
             embedding, importance, access_count, created_at, last_accessed, details, extra, \
             related, confidence, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                context_type = excluded.context_type,
                category = excluded.category,
                subcategory = excluded.subcategory,
                owner = excluded.owner,
                embedding = excluded.embedding,
                importance = excluded.importance,
                access_count = excluded.access_count,
                last_accessed = excluded.last_accessed,
                details = excluded.details,
                extra = excluded.extra,
                related = excluded.related,
                confidence = excluded.confidence,
                source = excluded.source",
            rusqlite::params![
                entry.id,
                entry.content,
                entry.context_type.as_str(),
                entry.category,
                entry.subcategory,
                entry.owner,
                codec::encode(&entry.embedding),
                entry.importance.value(),
                entry.access_count as i64,
                encode_ts(entry.created_at),
                encode_ts(entry.last_accessed),
                details,
                extra,
                related,
                entry.confidence.value(),
                entry.source,
            ],
        )
        .map_err(sql_err)?;
        Ok(())
    }

    fn get(&self, id: &str) -> AulaResult<Option<MemoryEntry>> {
        let conn = self.conn.lock().expect("sqlite lock poisoned");
        let mut stmt = conn
            .prepare(&format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"))
            .map_err(sql_err)?;
        let raw = stmt
            .query_row(rusqlite::params![id], Self::row_to_entry)
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(sql_err(other)),
            })?;
        raw.map(RawRow::decode).transpose()
    }

    fn scan(&self, filter: &EntryFilter, limit: usize) -> AulaResult<Vec<MemoryEntry>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<String> = Vec::new();
        if let Some(ct) = filter.context_type {
            conditions.push("context_type = ?");
            params.push(ct.as_str().to_string());
        }
        if let Some(cat) = &filter.category {
            conditions.push("category = ?");
            params.push(cat.clone());
        }
        if let Some(owner) = &filter.owner {
            conditions.push("owner = ?");
            params.push(owner.clone());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries {where_clause} \
             ORDER BY last_accessed DESC LIMIT {limit}"
        );

        let conn = self.conn.lock().expect("sqlite lock poisoned");
        let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), Self::row_to_entry)
            .map_err(sql_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_err)?;
        drop(stmt);
        drop(conn);

        rows.into_iter().map(RawRow::decode).collect()
    }

    fn delete_matching(&self, criteria: &CleanupCriteria) -> AulaResult<Vec<String>> {
        let cutoff = encode_ts(criteria.last_accessed_before);
        let conn = self.conn.lock().expect("sqlite lock poisoned");

        let mut stmt = conn
            .prepare(
                "SELECT id FROM entries \
                 WHERE last_accessed < ?1 AND access_count < ?2 AND importance < ?3",
            )
            .map_err(sql_err)?;
        let ids: Vec<String> = stmt
            .query_map(
                rusqlite::params![
                    cutoff,
                    criteria.access_count_below as i64,
                    criteria.importance_below
                ],
                |row| row.get(0),
            )
            .map_err(sql_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_err)?;
        drop(stmt);

        conn.execute(
            "DELETE FROM entries \
             WHERE last_accessed < ?1 AND access_count < ?2 AND importance < ?3",
            rusqlite::params![
                cutoff,
                criteria.access_count_below as i64,
                criteria.importance_below
            ],
        )
        .map_err(sql_err)?;

        Ok(ids)
    }

    fn apply_access(&self, id: &str, at: DateTime<Utc>) -> AulaResult<()> {
        let conn = self.conn.lock().expect("sqlite lock poisoned");
        conn.execute(
            "UPDATE entries SET access_count = access_count + 1, last_accessed = ?2 \
             WHERE id = ?1",
            rusqlite::params![id, encode_ts(at)],
        )
        .map_err(sql_err)?;
        Ok(())
    }

    fn record_feedback_audit(&self, audit: &FeedbackAudit) -> AulaResult<()> {
        let kind = format!("{:?}", audit.event.kind()).to_lowercase();
        let concepts = serde_json::to_string(&audit.matched_concepts).map_err(json_err)?;
        let conn = self.conn.lock().expect("sqlite lock poisoned");
        conn.execute(
            "INSERT INTO feedback_audit \
             (query, score, kind, needs_improvement, owner, category, comment, matched_concepts, received_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                audit.event.query,
                audit.event.score as i64,
                kind,
                audit.needs_improvement as i64,
                audit.event.owner,
                audit.event.category,
                audit.event.comment,
                concepts,
                encode_ts(audit.event.received_at),
            ],
        )
        .map_err(sql_err)?;
        Ok(())
    }

    fn stats(&self, most_accessed_limit: usize) -> AulaResult<StoreStats> {
        let conn = self.conn.lock().expect("sqlite lock poisoned");
        let mut stats = StoreStats::default();

        stats.total_entries = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(sql_err)? as usize;

        let mut stmt = conn
            .prepare("SELECT category, COUNT(*) FROM entries GROUP BY category")
            .map_err(sql_err)?;
        let by_category = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })
            .map_err(sql_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_err)?;
        stats.counts_by_category = by_category.into_iter().collect();
        drop(stmt);

        let mut stmt = conn
            .prepare("SELECT context_type, COUNT(*) FROM entries GROUP BY context_type")
            .map_err(sql_err)?;
        let by_context = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })
            .map_err(sql_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_err)?;
        stats.counts_by_context = by_context.into_iter().collect();
        drop(stmt);

        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, access_count FROM entries \
                 ORDER BY access_count DESC, id ASC LIMIT {most_accessed_limit}"
            ))
            .map_err(sql_err)?;
        stats.most_accessed = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })
            .map_err(sql_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_err)?;

        Ok(stats)
    }
}
