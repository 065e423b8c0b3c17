use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::path::Path;
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::attempt::AttemptMode;
use crate::error::HistoryError;
use crate::exam::{ScoredResult, TestDefinition};

pub type Result<T> = std::result::Result<T, HistoryError>;

/// One scored attempt as kept locally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub attempt_id: String,
    pub test_id: String,
    pub title: String,
    pub subject: String,
    pub mode: String,
    pub score: f64,
    pub obtained_marks: i32,
    pub total_marks: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
    pub accuracy: f64,
    pub time_taken_secs: u32,
    pub recorded_at: DateTime<Local>,
}

impl HistoryEntry {
    pub fn from_result(
        definition: &TestDefinition,
        result: &ScoredResult,
        mode: AttemptMode,
        recorded_at: DateTime<Local>,
    ) -> Self {
        Self {
            attempt_id: result.attempt_id.clone(),
            test_id: result.test_id.clone(),
            title: definition.title.clone(),
            subject: definition.subject.clone(),
            mode: match mode {
                AttemptMode::Timed => "timed".to_string(),
                AttemptMode::Practice => "practice".to_string(),
            },
            score: result.score,
            obtained_marks: result.obtained_marks,
            total_marks: result.total_marks,
            correct: result.correct_answers,
            incorrect: result.incorrect_answers,
            skipped: result.skipped_questions,
            accuracy: result.accuracy,
            time_taken_secs: result.time_taken,
            recorded_at,
        }
    }

    /// "3 hours ago" style label for list views.
    pub fn age(&self, now: DateTime<Local>) -> String {
        let secs = (now - self.recorded_at).num_seconds().max(0);
        HumanTime::from_seconds(secs).to_text_en(Accuracy::Rough, Tense::Past)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let recorded_at: String = row.get(13)?;
        let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
            .map(|dt| dt.with_timezone(&Local))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    13,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(Self {
            attempt_id: row.get(0)?,
            test_id: row.get(1)?,
            title: row.get(2)?,
            subject: row.get(3)?,
            mode: row.get(4)?,
            score: row.get(5)?,
            obtained_marks: row.get(6)?,
            total_marks: row.get(7)?,
            correct: row.get(8)?,
            incorrect: row.get(9)?,
            skipped: row.get(10)?,
            accuracy: row.get(11)?,
            time_taken_secs: row.get(12)?,
            recorded_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubjectSummary {
    pub subject: String,
    pub attempts: u32,
    pub average_score: f64,
    pub best_score: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySummary {
    pub attempts: u32,
    pub average_score: f64,
    pub best_score: f64,
    pub subjects: Vec<SubjectSummary>,
}

/// UTC with a fixed number of fractional digits, so text order is time order
/// regardless of the local offset at the time of recording.
fn stored_timestamp(at: DateTime<Local>) -> String {
    at.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

const COLUMNS: &str = "attempt_id, test_id, title, subject, mode, score, obtained_marks, \
    total_marks, correct, incorrect, skipped, accuracy, time_taken_secs, recorded_at";

/// Database of past scored attempts
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS attempt_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                attempt_id TEXT NOT NULL UNIQUE,
                test_id TEXT NOT NULL,
                title TEXT NOT NULL,
                subject TEXT NOT NULL,
                mode TEXT NOT NULL,
                score REAL NOT NULL,
                obtained_marks INTEGER NOT NULL,
                total_marks INTEGER NOT NULL,
                correct INTEGER NOT NULL,
                incorrect INTEGER NOT NULL,
                skipped INTEGER NOT NULL,
                accuracy REAL NOT NULL,
                time_taken_secs INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attempt_history_recorded ON attempt_history(recorded_at)",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Stores a scored attempt. Re-recording the same attempt replaces it.
    pub fn record(&self, entry: &HistoryEntry) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO attempt_history ({COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                entry.attempt_id,
                entry.test_id,
                entry.title,
                entry.subject,
                entry.mode,
                entry.score,
                entry.obtained_marks,
                entry.total_marks,
                entry.correct,
                entry.incorrect,
                entry.skipped,
                entry.accuracy,
                entry.time_taken_secs,
                stored_timestamp(entry.recorded_at),
            ],
        )?;
        tracing::debug!(attempt_id = %entry.attempt_id, "history entry recorded");
        Ok(())
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM attempt_history ORDER BY recorded_at DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map([limit as i64], HistoryEntry::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn all(&self) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM attempt_history ORDER BY recorded_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], HistoryEntry::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn summary(&self) -> Result<HistorySummary> {
        let (attempts, average_score, best_score) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(AVG(score), 0.0), COALESCE(MAX(score), 0.0) FROM attempt_history",
            [],
            |row| Ok((row.get::<_, u32>(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT subject, COUNT(*), AVG(score), MAX(score)
            FROM attempt_history
            GROUP BY subject
            ORDER BY subject
            "#,
        )?;
        let subjects = stmt
            .query_map([], |row| {
                Ok(SubjectSummary {
                    subject: row.get(0)?,
                    attempts: row.get(1)?,
                    average_score: row.get(2)?,
                    best_score: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(HistorySummary {
            attempts,
            average_score,
            best_score,
            subjects,
        })
    }

    /// Writes every entry, oldest first. Returns the number of rows written.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let entries = self.all()?;
        let mut writer = csv::Writer::from_path(path)?;
        for entry in &entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(entries.len())
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM attempt_history", [])?;
        Ok(())
    }
}
