//! SQLite-backed article cache
//!
//! One row per article: the denormalized `title`/`last_modified` columns serve
//! listings, the `payload` column holds the full JSON record for detail reads.
//! `modified_ms` is the modification time in epoch milliseconds and drives
//! list ordering; `last_modified` keeps the server's text untouched.

use chrono::DateTime;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::client::Article;
use crate::error::CacheError;

/// Database file name inside the data directory
pub const DB_FILE: &str = "cache.sqlite";

/// Current schema version (stored in `PRAGMA user_version`)
const SCHEMA_VERSION: i32 = 3;

type Result<T> = std::result::Result<T, CacheError>;

/// Listing projection of a cached article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedSummary {
    pub id: i64,
    pub title: String,
    pub last_modified: String,
}

/// Durable article cache
///
/// The connection sits behind a mutex, so a reader never observes a
/// half-applied `upsert_many` transaction.
pub struct CacheStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl CacheStore {
    /// Open or create the cache inside `data_dir`
    pub fn open_at(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create data dir: {}", e)))?;

        let path = data_dir.join(DB_FILE);
        let conn = Connection::open(&path)?;
        migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Insert or fully replace every record in one transaction.
    ///
    /// Last write wins: there is no `ModifiedDate` comparison, so callers must
    /// apply records in the order they were fetched.
    pub fn upsert_many(&self, articles: &[Article]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO articles (id, title, last_modified, modified_ms, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    last_modified = excluded.last_modified,
                    modified_ms = excluded.modified_ms,
                    payload = excluded.payload",
            )?;

            for article in articles {
                let payload = serde_json::to_string(article).map_err(|e| CacheError::Corrupt {
                    id: article.id,
                    reason: e.to_string(),
                })?;
                stmt.execute(params![
                    article.id,
                    article.subject,
                    article.modified_date,
                    modified_millis(&article.modified_date),
                    payload
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("Cached {} articles", articles.len());
        Ok(articles.len())
    }

    /// Insert or replace a single record.
    pub fn upsert(&self, article: &Article) -> Result<()> {
        self.upsert_many(std::slice::from_ref(article)).map(|_| ())
    }

    /// All cached articles, most recently modified first.
    ///
    /// Rows whose timestamp could not be parsed follow the dated ones, ordered
    /// by their raw text.
    pub fn list_summaries(&self) -> Result<Vec<CachedSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, last_modified FROM articles
             ORDER BY modified_ms IS NULL, modified_ms DESC, last_modified DESC, id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CachedSummary {
                id: row.get(0)?,
                title: as_text(row.get(1)?),
                last_modified: as_text(row.get(2)?),
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Full record for `id`, with `ID`/`Subject`/`ModifiedDate` taken from the row.
    pub fn get_full(&self, id: i64) -> Result<Option<Article>> {
        let conn = self.conn()?;
        let row: Option<(SqlValue, SqlValue, Option<String>)> = conn
            .query_row(
                "SELECT title, last_modified, payload FROM articles WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((title, last_modified, payload)) = row else {
            return Ok(None);
        };

        let mut extra = match payload.as_deref().map(str::trim) {
            None | Some("") => Map::new(),
            Some(json) => serde_json::from_str::<Map<String, Value>>(json).map_err(|e| {
                CacheError::Corrupt {
                    id,
                    reason: e.to_string(),
                }
            })?,
        };
        for key in ["ID", "Subject", "ModifiedDate"] {
            extra.remove(key);
        }

        Ok(Some(Article {
            id,
            subject: as_text(title),
            modified_date: as_text(last_modified),
            extra,
        }))
    }

    /// Number of cached articles
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    /// Remove every cached article, returning how many were removed
    pub fn clear(&self) -> Result<usize> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM articles", [])?)
    }
}

/// Create the table, or bring an older one up to the current schema.
fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL DEFAULT '',
            last_modified TEXT NOT NULL DEFAULT '',
            modified_ms INTEGER,
            payload TEXT
        );
        "#,
    )?;

    if !has_column(conn, "articles", "payload")? {
        log::info!("Adding payload column to cache written by an older version");
        conn.execute_batch("ALTER TABLE articles ADD COLUMN payload TEXT")?;
    }

    if !has_column(conn, "articles", "modified_ms")? {
        log::info!("Adding modified_ms column to cache written by an older version");
        conn.execute_batch("ALTER TABLE articles ADD COLUMN modified_ms INTEGER")?;
    }

    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        backfill_modified_ms(conn)?;
    }

    conn.execute_batch(
        "DROP INDEX IF EXISTS idx_articles_last_modified;
         CREATE INDEX IF NOT EXISTS idx_articles_modified_ms ON articles(modified_ms)",
    )?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Compute `modified_ms` for rows written before the column existed.
fn backfill_modified_ms(conn: &Connection) -> Result<()> {
    let rows: Vec<(i64, SqlValue)> = {
        let mut stmt = conn.prepare("SELECT id, last_modified FROM articles")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<std::result::Result<_, _>>()?
    };

    let mut stmt = conn.prepare("UPDATE articles SET modified_ms = ?1 WHERE id = ?2")?;
    for (id, last_modified) in rows {
        stmt.execute(params![modified_millis(&as_text(last_modified)), id])?;
    }
    Ok(())
}

/// Epoch milliseconds for an RFC 3339 timestamp or a legacy epoch-ms value.
fn modified_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.timestamp_millis())
        .ok()
        .or_else(|| raw.parse::<i64>().ok())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Older caches stored `last_modified` as epoch milliseconds and allowed NULL titles.
fn as_text(value: SqlValue) -> String {
    match value {
        SqlValue::Text(s) => s,
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Null => String::new(),
        SqlValue::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}
