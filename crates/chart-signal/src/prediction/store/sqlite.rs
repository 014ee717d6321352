//! SQLite-backed prediction history.
//!
//! Rows mirror the record shape exposed over HTTP: the chart feature tuple is kept as a
//! JSON blob and every label is stored as its display string.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{HistoryStore, StoreError};
use crate::prediction::domain::{
    ChartFeatures, NewPrediction, Outcome, PredictionId, PredictionRecord,
};

const SELECT_COLUMNS: &str = "id, chart_features, direction, confidence, risk_level, reason,
     created_at, outcome, outcome_updated_at";

pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref()).map_err(unavailable)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!(path = %path.as_ref().display(), "sqlite history store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(unavailable)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("in-memory sqlite history store opened");
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS predictions (
                id TEXT PRIMARY KEY,
                chart_features TEXT NOT NULL,
                direction TEXT NOT NULL,
                confidence TEXT NOT NULL,
                risk_level TEXT NOT NULL,
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL,
                outcome TEXT,
                outcome_updated_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_predictions_created_at
                ON predictions(created_at DESC);",
        )
        .map_err(unavailable)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection mutex poisoned".to_string()))
    }

    fn fetch_with(
        conn: &Connection,
        id: &PredictionId,
    ) -> Result<Option<PredictionRecord>, StoreError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM predictions WHERE id = ?1");
        let row = conn
            .query_row(&query, params![id.as_str()], StoredRow::read)
            .optional()
            .map_err(unavailable)?;
        row.map(StoredRow::into_record).transpose()
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn insert(&self, prediction: NewPrediction) -> Result<PredictionRecord, StoreError> {
        let created_at = Utc::now().trunc_subsecs(6);
        let record = PredictionRecord::from_new(PredictionId::generate(), prediction, created_at);
        let features = serde_json::to_string(&record.chart_features)
            .map_err(|err| StoreError::Malformed(err.to_string()))?;

        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO predictions
                (id, chart_features, direction, confidence, risk_level, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.as_str(),
                features,
                record.direction.to_string(),
                record.confidence.to_string(),
                record.risk_level.to_string(),
                record.reason,
                format_timestamp(record.created_at),
            ],
        )
        .map_err(unavailable)?;

        Ok(record)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        let conn = self.connection()?;
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM predictions
             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        );
        let mut stmt = conn.prepare(&query).map_err(unavailable)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], StoredRow::read)
            .map_err(unavailable)?;

        rows.map(|row| row.map_err(unavailable).and_then(StoredRow::into_record))
            .collect()
    }

    fn fetch(&self, id: &PredictionId) -> Result<Option<PredictionRecord>, StoreError> {
        let conn = self.connection()?;
        Self::fetch_with(&conn, id)
    }

    fn update_outcome(
        &self,
        id: &PredictionId,
        outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "UPDATE predictions SET outcome = ?1, outcome_updated_at = ?2 WHERE id = ?3",
                params![
                    outcome.to_string(),
                    format_timestamp(Utc::now()),
                    id.as_str()
                ],
            )
            .map_err(unavailable)?;

        if changed == 0 {
            return Err(StoreError::NotFound);
        }

        Self::fetch_with(&conn, id)?.ok_or(StoreError::NotFound)
    }

    fn record_outcome_once(
        &self,
        id: &PredictionId,
        outcome: Outcome,
    ) -> Result<PredictionRecord, StoreError> {
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "UPDATE predictions SET outcome = ?1, outcome_updated_at = ?2
                 WHERE id = ?3 AND outcome IS NULL",
                params![
                    outcome.to_string(),
                    format_timestamp(Utc::now()),
                    id.as_str()
                ],
            )
            .map_err(unavailable)?;

        let record = Self::fetch_with(&conn, id)?.ok_or(StoreError::NotFound)?;
        if changed == 0 {
            return Err(StoreError::AlreadyResolved);
        }
        Ok(record)
    }
}

/// Raw column values; parsing happens outside the rusqlite row callback.
struct StoredRow {
    id: String,
    chart_features: String,
    direction: String,
    confidence: String,
    risk_level: String,
    reason: String,
    created_at: String,
    outcome: Option<String>,
    outcome_updated_at: Option<String>,
}

impl StoredRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            chart_features: row.get(1)?,
            direction: row.get(2)?,
            confidence: row.get(3)?,
            risk_level: row.get(4)?,
            reason: row.get(5)?,
            created_at: row.get(6)?,
            outcome: row.get(7)?,
            outcome_updated_at: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<PredictionRecord, StoreError> {
        let chart_features: ChartFeatures = serde_json::from_str(&self.chart_features)
            .map_err(|err| StoreError::Malformed(format!("chart_features: {err}")))?;

        Ok(PredictionRecord {
            id: PredictionId(self.id),
            chart_features,
            direction: self.direction.parse().map_err(malformed)?,
            confidence: self.confidence.parse().map_err(malformed)?,
            risk_level: self.risk_level.parse().map_err(malformed)?,
            reason: self.reason,
            created_at: parse_timestamp(&self.created_at)?,
            outcome: self
                .outcome
                .map(|value| value.parse::<Outcome>().map_err(malformed))
                .transpose()?,
            outcome_updated_at: self
                .outcome_updated_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

// Fixed precision keeps lexical order equal to chronological order.
fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| StoreError::Malformed(format!("timestamp '{raw}': {err}")))
}

fn unavailable(err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn malformed(err: impl std::fmt::Display) -> StoreError {
    StoreError::Malformed(err.to_string())
}
