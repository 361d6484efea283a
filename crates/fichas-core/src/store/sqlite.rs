//! SQLite-backed ficha store.
//!
//! One connection guarded by a mutex. Updates run inside an IMMEDIATE
//! transaction: the row is read, patched in Rust via `Ficha::apply`, and
//! written back before the lock is released. Aggregates are computed by a
//! single `SELECT` so every count comes from the same snapshot.
//!
//! Rows may be written by other tools with legacy labels (`pendiente`,
//! `Alta`), so every SQL filter matches state and priority through the
//! same label sets that `FichaState::normalize` and `Priority::normalize`
//! accept.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::error::{FichaError, Result};
use crate::ficha::{Ficha, FichaPatch};
use crate::summary::{PriorityBreakdown, Stats, Summary};
use crate::types::{FichaState, Priority};

use super::FichaStore;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS fichas (
    id                  TEXT PRIMARY KEY,
    url                 TEXT NOT NULL UNIQUE,
    kind                TEXT,
    keyword             TEXT,
    title               TEXT,
    snippet             TEXT,
    domain              TEXT,
    institution         TEXT,
    email               TEXT,
    phone               TEXT,
    has_contact_form    INTEGER,
    social_platform     TEXT,
    username            TEXT,
    subreddit           TEXT,
    facebook_group      TEXT,
    detected_at         TEXT,
    priority            TEXT,
    recommended_channel TEXT,
    proposal_text       TEXT,
    state               TEXT NOT NULL DEFAULT 'pending',
    processed           INTEGER NOT NULL DEFAULT 0,
    contacted_at        TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_fichas_state ON fichas(state);
";

const COLUMNS: &str = "id, url, kind, keyword, title, snippet, domain, institution, email, phone, \
     has_contact_form, social_platform, username, subreddit, facebook_group, detected_at, \
     priority, recommended_channel, proposal_text, state, processed, contacted_at, \
     created_at, updated_at";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Timestamp helpers
// ---------------------------------------------------------------------------

fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn ts_from_sql(column: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| FichaError::InvalidRecord(format!("bad {column} timestamp '{raw}': {e}")))
}

fn opt_ts_from_sql(column: &str, raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|r| ts_from_sql(column, &r)).transpose()
}

// ---------------------------------------------------------------------------
// Label matching
// ---------------------------------------------------------------------------

/// SQL predicate true when `column`, trimmed and lowercased, is one of `labels`.
/// Labels are static lowercase ASCII, so they are inlined as literals.
fn label_match(column: &str, labels: &[&str]) -> String {
    let quoted: Vec<String> = labels.iter().map(|l| format!("'{l}'")).collect();
    format!(
        "LOWER(TRIM({column}, ' ' || char(9) || char(10) || char(13))) IN ({})",
        quoted.join(", ")
    )
}

fn state_match(state: FichaState) -> String {
    label_match("state", state.labels())
}

fn priority_match(priority: Priority) -> String {
    label_match("priority", priority.labels())
}

fn count_where(predicate: &str) -> String {
    format!("COALESCE(SUM(CASE WHEN {predicate} THEN 1 ELSE 0 END), 0)")
}

fn stats_sql() -> String {
    let known: Vec<&str> = Priority::all()
        .iter()
        .flat_map(|p| p.labels().iter().copied())
        .collect();
    let unranked = format!(
        "priority IS NULL OR NOT ({})",
        label_match("priority", &known)
    );
    let columns = [
        "COUNT(*)".to_string(),
        count_where(&state_match(FichaState::Pending)),
        count_where(&state_match(FichaState::Contacted)),
        count_where(&state_match(FichaState::Discarded)),
        count_where("processed = 1"),
        count_where("processed = 0"),
        count_where(&priority_match(Priority::High)),
        count_where(&priority_match(Priority::Medium)),
        count_where(&priority_match(Priority::Low)),
        count_where(&unranked),
    ];
    format!("SELECT {} FROM fichas", columns.join(", "))
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Row exactly as SQLite returns it, before normalization.
struct RawRow {
    id: String,
    url: String,
    kind: Option<String>,
    keyword: Option<String>,
    title: Option<String>,
    snippet: Option<String>,
    domain: Option<String>,
    institution: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    has_contact_form: Option<bool>,
    social_platform: Option<String>,
    username: Option<String>,
    subreddit: Option<String>,
    facebook_group: Option<String>,
    detected_at: Option<String>,
    priority: Option<String>,
    recommended_channel: Option<String>,
    proposal_text: Option<String>,
    state: String,
    processed: bool,
    contacted_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            kind: row.get(2)?,
            keyword: row.get(3)?,
            title: row.get(4)?,
            snippet: row.get(5)?,
            domain: row.get(6)?,
            institution: row.get(7)?,
            email: row.get(8)?,
            phone: row.get(9)?,
            has_contact_form: row.get(10)?,
            social_platform: row.get(11)?,
            username: row.get(12)?,
            subreddit: row.get(13)?,
            facebook_group: row.get(14)?,
            detected_at: row.get(15)?,
            priority: row.get(16)?,
            recommended_channel: row.get(17)?,
            proposal_text: row.get(18)?,
            state: row.get(19)?,
            processed: row.get(20)?,
            contacted_at: row.get(21)?,
            created_at: row.get(22)?,
            updated_at: row.get(23)?,
        })
    }

    fn into_ficha(self) -> Result<Ficha> {
        let state = FichaState::normalize(&self.state).ok_or_else(|| {
            FichaError::InvalidRecord(format!("ficha {} has unknown state '{}'", self.id, self.state))
        })?;
        Ok(Ficha {
            kind: self.kind,
            keyword: self.keyword,
            title: self.title,
            snippet: self.snippet,
            domain: self.domain,
            institution: self.institution,
            email: self.email,
            phone: self.phone,
            has_contact_form: self.has_contact_form,
            social_platform: self.social_platform,
            username: self.username,
            subreddit: self.subreddit,
            facebook_group: self.facebook_group,
            detected_at: opt_ts_from_sql("detected_at", self.detected_at)?,
            priority: self.priority.as_deref().and_then(Priority::normalize),
            recommended_channel: self.recommended_channel,
            proposal_text: self.proposal_text,
            state,
            processed: self.processed,
            contacted_at: opt_ts_from_sql("contacted_at", self.contacted_at)?,
            created_at: ts_from_sql("created_at", &self.created_at)?,
            updated_at: ts_from_sql("updated_at", &self.updated_at)?,
            id: self.id,
            url: self.url,
        })
    }
}

fn collect_rows(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Ficha>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, RawRow::read)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_ficha()?);
    }
    Ok(out)
}

fn fetch(conn: &Connection, id: &str) -> Result<Ficha> {
    let sql = format!("SELECT {COLUMNS} FROM fichas WHERE id = ?1");
    conn.query_row(&sql, params![id], RawRow::read)
        .optional()?
        .ok_or_else(|| FichaError::NotFound(id.to_string()))?
        .into_ficha()
}

fn write_back(conn: &Connection, f: &Ficha) -> Result<()> {
    conn.execute(
        "UPDATE fichas SET
            institution = ?2, email = ?3, phone = ?4, has_contact_form = ?5,
            username = ?6, priority = ?7, recommended_channel = ?8, proposal_text = ?9,
            state = ?10, processed = ?11, contacted_at = ?12, updated_at = ?13
         WHERE id = ?1",
        params![
            f.id,
            f.institution,
            f.email,
            f.phone,
            f.has_contact_form,
            f.username,
            f.priority.map(Priority::as_str),
            f.recommended_channel,
            f.proposal_text,
            f.state.as_str(),
            f.processed,
            f.contacted_at.map(ts_to_sql),
            ts_to_sql(f.updated_at),
        ],
    )?;
    Ok(())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ---------------------------------------------------------------------------
// SqliteFichaStore
// ---------------------------------------------------------------------------

pub struct SqliteFichaStore {
    conn: Mutex<Connection>,
}

impl SqliteFichaStore {
    /// Open or create the database at `path` and bootstrap the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened ficha store");
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Close the underlying connection, surfacing any error SQLite reports.
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| FichaError::StorageUnavailable("connection lock poisoned".into()))?;
        conn.close().map_err(|(_, e)| e.into())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| FichaError::StorageUnavailable("connection lock poisoned".into()))
    }
}

impl FichaStore for SqliteFichaStore {
    fn get(&self, id: &str) -> Result<Ficha> {
        let conn = self.lock()?;
        fetch(&conn, id)
    }

    fn list_by_state(&self, state: FichaState) -> Result<Vec<Ficha>> {
        let sql = format!("SELECT {COLUMNS} FROM fichas WHERE {}", state_match(state));
        let conn = self.lock()?;
        collect_rows(&conn, &sql, params![])
    }

    fn list_all(&self) -> Result<Vec<Ficha>> {
        let sql = format!("SELECT {COLUMNS} FROM fichas");
        let conn = self.lock()?;
        collect_rows(&conn, &sql, params![])
    }

    fn insert(&self, f: &Ficha) -> Result<()> {
        let conn = self.lock()?;

        let existing: Option<(String, String)> = conn
            .query_row(
                "SELECT id, url FROM fichas WHERE id = ?1 OR url = ?2 LIMIT 1",
                params![f.id, f.url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        if let Some((id, _)) = existing {
            return Err(if id == f.id {
                FichaError::Conflict(format!("id {}", f.id))
            } else {
                FichaError::Conflict(format!("url {}", f.url))
            });
        }

        let sql = format!(
            "INSERT INTO fichas ({COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, \
              ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)"
        );
        conn.execute(
            &sql,
            params![
                f.id,
                f.url,
                f.kind,
                f.keyword,
                f.title,
                f.snippet,
                f.domain,
                f.institution,
                f.email,
                f.phone,
                f.has_contact_form,
                f.social_platform,
                f.username,
                f.subreddit,
                f.facebook_group,
                f.detected_at.map(ts_to_sql),
                f.priority.map(Priority::as_str),
                f.recommended_channel,
                f.proposal_text,
                f.state.as_str(),
                f.processed,
                f.contacted_at.map(ts_to_sql),
                ts_to_sql(f.created_at),
                ts_to_sql(f.updated_at),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                FichaError::Conflict(format!("id {} or url {}", f.id, f.url))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    fn update(&self, id: &str, patch: &FichaPatch) -> Result<Ficha> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut ficha = fetch(&tx, id)?;
        ficha.apply(patch, Utc::now())?;
        write_back(&tx, &ficha)?;
        tx.commit()?;
        Ok(ficha)
    }

    fn stats(&self) -> Result<Stats> {
        let conn = self.lock()?;
        let row = conn.query_row(&stats_sql(), params![], |row| {
            let mut counts = [0u64; 10];
            for (i, n) in counts.iter_mut().enumerate() {
                *n = row.get::<_, i64>(i)? as u64;
            }
            Ok(counts)
        })?;
        let [total, pending, contacted, discarded, processed, unprocessed, high, medium, low, unranked] =
            row;
        Ok(Stats {
            summary: Summary {
                total,
                pending,
                contacted,
                discarded,
                processed,
                unprocessed,
            },
            priorities: PriorityBreakdown {
                high,
                medium,
                low,
                unranked,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
