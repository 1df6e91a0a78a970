//! Append-only storage for modification events.
//!
//! # Responsibility
//! - Define the storage contract the modification log writes through.
//! - Provide a durable SQLite implementation and a volatile in-memory one.
//!
//! # Invariants
//! - `append` returns `Ok` only after the event is committed.
//! - `load_all` returns events in append order.
//! - Stored rows are never updated or deleted (enforced by table triggers).

use crate::db::migrations::latest_version;
use crate::db::{open_db, DbError};
use crate::model::event::{EventId, ModificationEvent, SemanticAttributes};
use rusqlite::{params, Connection, Row};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by event storage.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Connection schema is not at the version this binary writes.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// An event with this id was already stored.
    DuplicateEvent(EventId),
    /// Event payload could not be encoded for storage.
    Serialization(serde_json::Error),
    /// Persisted row cannot be decoded into an event.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "event store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::DuplicateEvent(id) => write!(f, "event already stored: {id}"),
            Self::Serialization(err) => write!(f, "failed to encode event: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored event: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::UninitializedConnection { .. } | Self::DuplicateEvent(_) | Self::InvalidData(_) => {
                None
            }
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Durable append-only event storage.
pub trait EventStore {
    /// Persists one event; must not return before the write is durable.
    fn append(&mut self, event: &ModificationEvent) -> StoreResult<()>;
    /// Every stored event in append order.
    fn load_all(&self) -> StoreResult<Vec<ModificationEvent>>;
}

/// Volatile store; events vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: Vec<ModificationEvent>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&mut self, event: &ModificationEvent) -> StoreResult<()> {
        if self.events.iter().any(|stored| stored.id == event.id) {
            return Err(StoreError::DuplicateEvent(event.id));
        }
        self.events.push(event.clone());
        Ok(())
    }

    fn load_all(&self) -> StoreResult<Vec<ModificationEvent>> {
        Ok(self.events.clone())
    }
}

/// SQLite-backed store over the `modification_events` table.
pub struct SqliteEventStore {
    conn: Connection,
}

impl SqliteEventStore {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_event_table_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (or creates) a log database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl EventStore for SqliteEventStore {
    fn append(&mut self, event: &ModificationEvent) -> StoreResult<()> {
        let old_value = serde_json::to_string(&event.old_value)?;
        let new_value = serde_json::to_string(&event.new_value)?;
        let attributes = serde_json::to_string(&event.semantic_attributes)?;
        let context = event
            .context
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let tx = self.conn.transaction()?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM modification_events WHERE event_uuid = ?1);",
            [event.id.to_string()],
            |row| row.get(0),
        )?;
        if exists == 1 {
            return Err(StoreError::DuplicateEvent(event.id));
        }
        tx.execute(
            "INSERT INTO modification_events (
                event_uuid,
                timestamp_ms,
                path,
                property,
                old_value,
                new_value,
                semantic_attributes,
                context
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                event.id.to_string(),
                event.timestamp,
                event.path.as_str(),
                event.property.as_str(),
                old_value,
                new_value,
                attributes,
                context,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_all(&self) -> StoreResult<Vec<ModificationEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                event_uuid,
                timestamp_ms,
                path,
                property,
                old_value,
                new_value,
                semantic_attributes,
                context
             FROM modification_events
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }
}

fn parse_event_row(row: &Row<'_>) -> StoreResult<ModificationEvent> {
    let id_text: String = row.get("event_uuid")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid uuid `{id_text}` in modification_events.event_uuid"
        ))
    })?;

    let semantic_attributes: SemanticAttributes =
        parse_json_column(row, "semantic_attributes", &id_text)?;
    let context = row
        .get::<_, Option<String>>("context")?
        .map(|raw| decode_json::<Value>(&raw, "context", &id_text))
        .transpose()?;

    Ok(ModificationEvent {
        id,
        timestamp: row.get("timestamp_ms")?,
        path: row.get("path")?,
        property: row.get("property")?,
        old_value: parse_json_column(row, "old_value", &id_text)?,
        new_value: parse_json_column(row, "new_value", &id_text)?,
        semantic_attributes,
        context,
    })
}

fn parse_json_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    column: &'static str,
    event_id: &str,
) -> StoreResult<T> {
    let raw: String = row.get(column)?;
    decode_json(&raw, column, event_id)
}

fn decode_json<T: serde::de::DeserializeOwned>(
    raw: &str,
    column: &'static str,
    event_id: &str,
) -> StoreResult<T> {
    serde_json::from_str(raw).map_err(|err| {
        StoreError::InvalidData(format!(
            "undecodable json in modification_events.{column} for event {event_id}: {err}"
        ))
    })
}

fn ensure_event_table_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
