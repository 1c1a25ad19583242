#[cfg(test)]
mod tests;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::record::MeetingRecord;

/// Default result bound for [`MeetingHistory::recent`].
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Default result bound for [`MeetingHistory::search`].
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Authoritative store for meeting records plus a synchronized FTS5 index.
///
/// Every public operation traps internal failures (I/O, malformed persisted
/// JSON, datastore errors), logs them, and degrades to a safe default —
/// `false`, `None`, or an empty vec. Callers check return values instead of
/// handling errors; the `*_inner` functions keep the full error chain for
/// the log.
#[derive(Clone)]
pub struct MeetingHistory {
    conn: Arc<Mutex<Connection>>,
}

impl MeetingHistory {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        // Enable WAL mode for concurrent reads
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA cache_size=10000;
            PRAGMA temp_store=MEMORY;
        ",
        )?;

        let history = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        history.init_schema()?;

        Ok(history)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meetings (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                date TEXT NOT NULL,
                participants TEXT NOT NULL,
                transcript TEXT NOT NULL,
                summary TEXT NOT NULL,
                sentiment_analysis TEXT NOT NULL,
                coach_feedback TEXT NOT NULL,
                duration_minutes INTEGER,
                meeting_type TEXT,
                tags TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_meetings_date ON meetings(date DESC);

            -- Full-text index over title, transcript, the derived summary
            -- projection, and tags. Kept in lockstep with the meetings table
            -- inside each store/delete transaction.
            CREATE VIRTUAL TABLE IF NOT EXISTS meetings_fts USING fts5(
                id UNINDEXED, title, transcript, summary_text, tags
            );
        "#,
        )?;

        Ok(())
    }

    // =========================================================================
    // Public contract — never raises; check the return value
    // =========================================================================

    /// Write or overwrite a record by id, rebuilding its index entry in the
    /// same transaction. Returns false (and logs) on any internal failure.
    pub fn store(&self, record: &MeetingRecord) -> bool {
        match self.store_inner(record) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Error storing meeting {}: {:#}", record.id, e);
                false
            }
        }
    }

    /// Point lookup. Absent is a normal outcome; internal failures also
    /// surface as `None` (logged).
    pub fn get(&self, meeting_id: &str) -> Option<MeetingRecord> {
        match self.get_inner(meeting_id) {
            Ok(record) => record,
            Err(e) => {
                log::error!("Error retrieving meeting {}: {:#}", meeting_id, e);
                None
            }
        }
    }

    /// Most recent meetings by meeting `date` descending. Defaults to
    /// [`DEFAULT_RECENT_LIMIT`].
    pub fn recent(&self, limit: Option<usize>) -> Vec<MeetingRecord> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        match self.recent_inner(limit) {
            Ok(records) => records,
            Err(e) => {
                log::error!("Error retrieving recent meetings: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Ranked full-text search (FTS5 MATCH, bm25, best match first).
    /// Defaults to [`DEFAULT_SEARCH_LIMIT`]. Malformed queries fail softly
    /// with an empty result.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<MeetingRecord> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        match self.search_inner(query, limit) {
            Ok(records) => records,
            Err(e) => {
                log::error!("Error searching meetings for {:?}: {:#}", query, e);
                Vec::new()
            }
        }
    }

    /// Meetings with `date` in `[start, end]`, inclusive on both ends,
    /// ordered by `date` descending.
    pub fn by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<MeetingRecord> {
        match self.by_date_range_inner(start, end) {
            Ok(records) => records,
            Err(e) => {
                log::error!("Error retrieving meetings by date range: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Remove a record from the table and the index atomically. True only if
    /// a row existed; false on no match or internal error (logged).
    pub fn delete(&self, meeting_id: &str) -> bool {
        match self.delete_inner(meeting_id) {
            Ok(existed) => existed,
            Err(e) => {
                log::error!("Error deleting meeting {}: {:#}", meeting_id, e);
                false
            }
        }
    }

    // =========================================================================
    // Internal operations — full error chains, trapped by the wrappers above
    // =========================================================================

    fn store_inner(&self, record: &MeetingRecord) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let participants_json = serde_json::to_string(&record.participants)?;
        let summary_json = serde_json::to_string(&record.summary)?;
        let sentiment_json = serde_json::to_string(&record.sentiment_analysis)?;
        let coach_json = serde_json::to_string(&record.coach_feedback)?;
        let tags_json = serde_json::to_string(&record.tags)?;
        let created_at = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT OR REPLACE INTO meetings (
                id, title, date, participants, transcript, summary,
                sentiment_analysis, coach_feedback, duration_minutes,
                meeting_type, tags, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.id,
                record.title,
                record.date.to_rfc3339(),
                participants_json,
                record.transcript,
                summary_json,
                sentiment_json,
                coach_json,
                record.duration_minutes,
                record.meeting_type,
                tags_json,
                created_at,
            ],
        )?;

        // Rebuild the index entry from scratch — FTS5 has no primary key, so
        // replace is modeled as delete + insert.
        let summary_text = extract_summary_text(&record.summary);
        tx.execute(
            "DELETE FROM meetings_fts WHERE id = ?1",
            params![record.id],
        )?;
        tx.execute(
            "INSERT INTO meetings_fts (id, title, transcript, summary_text, tags)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.title,
                record.transcript,
                summary_text,
                record.tags.join(" "),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get_inner(&self, meeting_id: &str) -> Result<Option<MeetingRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meetings WHERE id = ?1",
            RECORD_COLUMNS
        ))?;

        let record = stmt
            .query_map(params![meeting_id], row_to_record)?
            .next()
            .transpose()?;

        Ok(record)
    }

    fn recent_inner(&self, limit: usize) -> Result<Vec<MeetingRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meetings ORDER BY date DESC LIMIT ?1",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![limit as i64], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn search_inner(&self, query: &str, limit: usize) -> Result<Vec<MeetingRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meetings
             JOIN meetings_fts ON meetings.id = meetings_fts.id
             WHERE meetings_fts MATCH ?1
             ORDER BY bm25(meetings_fts)
             LIMIT ?2",
            QUALIFIED_RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![query, limit as i64], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn by_date_range_inner(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MeetingRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meetings
             WHERE date BETWEEN ?1 AND ?2
             ORDER BY date DESC",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(
                params![start.to_rfc3339(), end.to_rfc3339()],
                row_to_record,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn delete_inner(&self, meeting_id: &str) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let deleted = tx.execute("DELETE FROM meetings WHERE id = ?1", params![meeting_id])?;
        tx.execute(
            "DELETE FROM meetings_fts WHERE id = ?1",
            params![meeting_id],
        )?;

        tx.commit()?;
        Ok(deleted > 0)
    }
}

const RECORD_COLUMNS: &str = "id, title, date, participants, transcript, summary, \
     sentiment_analysis, coach_feedback, duration_minutes, meeting_type, tags, created_at";

const QUALIFIED_RECORD_COLUMNS: &str = "meetings.id, meetings.title, meetings.date, \
     meetings.participants, meetings.transcript, meetings.summary, \
     meetings.sentiment_analysis, meetings.coach_feedback, meetings.duration_minutes, \
     meetings.meeting_type, meetings.tags, meetings.created_at";

/// Convert a database row to a MeetingRecord. Parse failures in stored JSON
/// or timestamps surface as conversion errors so the public wrappers can
/// trap and log them.
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MeetingRecord> {
    let date = parse_timestamp(row.get::<_, String>(2)?, 2)?;
    let participants: Vec<String> =
        serde_json::from_str(&row.get::<_, String>(3)?).map_err(|e| conversion_err(3, e))?;
    let summary: Value =
        serde_json::from_str(&row.get::<_, String>(5)?).map_err(|e| conversion_err(5, e))?;
    let sentiment_analysis: Value =
        serde_json::from_str(&row.get::<_, String>(6)?).map_err(|e| conversion_err(6, e))?;
    let coach_feedback: Value =
        serde_json::from_str(&row.get::<_, String>(7)?).map_err(|e| conversion_err(7, e))?;
    let tags: Vec<String> = match row.get::<_, Option<String>>(10)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| conversion_err(10, e))?,
        None => Vec::new(),
    };
    let created_at = parse_timestamp(row.get::<_, String>(11)?, 11)?;

    Ok(MeetingRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        date,
        participants,
        transcript: row.get(4)?,
        summary,
        sentiment_analysis,
        coach_feedback,
        duration_minutes: row.get(8)?,
        meeting_type: row.get(9)?,
        tags,
        created_at: Some(created_at),
    })
}

fn parse_timestamp(raw: String, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

/// Build the searchable text projection from a summary document: key points,
/// action-item tasks and assignees, then decision text. Missing keys
/// contribute nothing.
fn extract_summary_text(summary: &Value) -> String {
    let mut parts: Vec<&str> = Vec::new();

    if let Some(points) = summary.get("key_points").and_then(Value::as_array) {
        parts.extend(
            points
                .iter()
                .filter_map(|p| p.get("point").and_then(Value::as_str)),
        );
    }

    if let Some(items) = summary.get("action_items").and_then(Value::as_array) {
        parts.extend(
            items
                .iter()
                .filter_map(|i| i.get("task").and_then(Value::as_str)),
        );
        parts.extend(
            items
                .iter()
                .filter_map(|i| i.get("assignee").and_then(Value::as_str)),
        );
    }

    if let Some(decisions) = summary.get("decisions").and_then(Value::as_array) {
        parts.extend(
            decisions
                .iter()
                .filter_map(|d| d.get("decision").and_then(Value::as_str)),
        );
    }

    parts.join(" ")
}
