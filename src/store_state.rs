//! The record store: a redb-backed single-key list of obstacle records.
//!
//! The whole obstacle list lives under one key (`"obstacles"`) as a
//! JSON-encoded array, matching the layout the mobile app has always used
//! for its local storage. Writes replace the value in a single committed
//! transaction; a failed write leaves the previous list untouched. Reads
//! fail soft: a missing table or key is an empty list, and a malformed
//! stored value is logged and treated as empty rather than propagated.
//!
//! The store is not safe for concurrent writers. [`AppStoreState::append`]
//! and [`AppStoreState::delete_by_id`] serialize the load-modify-save
//! sequence for a single handle; two handles racing on the same path are
//! last-write-wins.

use std::path::Path;

use log::{info, warn};
use redb::{Database, ReadableTable, TableDefinition, TableError};

use crate::app_response::AppResponse;
use crate::obstacle::{ObstacleRecord, SEED_OBSTACLE_ID};

/// The one storage key. No other keys exist, no schema version field.
pub const OBSTACLES_KEY: &str = "obstacles";

pub(crate) const TABLE: TableDefinition<&str, &str> = TableDefinition::new("app_storage");

/// The write seam the editor submits through. Lets the submit lifecycle be
/// exercised against a store whose persistence fails, without a real disk
/// failure.
pub trait ObstacleStore {
    /// Appends one record and persists the result, returning the new list.
    fn append(&self, record: ObstacleRecord) -> Result<Vec<ObstacleRecord>, AppResponse>;
}

pub struct AppStoreState {
    pub db: Database,
}

impl ObstacleStore for AppStoreState {
    fn append(&self, record: ObstacleRecord) -> Result<Vec<ObstacleRecord>, AppResponse> {
        AppStoreState::append(self, record)
    }
}

impl AppStoreState {
    /// Opens (or creates) the store file at `path`.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, AppResponse> {
        let db = Database::create(path)?;
        Ok(Self { db })
    }

    /// Loads the stored obstacle list.
    ///
    /// Returns an empty list when nothing has been stored yet. A stored
    /// value that no longer parses is logged and also returned as empty -
    /// the screens degrade to an empty list instead of erroring out.
    pub fn load(&self) -> Result<Vec<ObstacleRecord>, AppResponse> {
        let read_txn = self.db.begin_read()?;

        let table = match read_txn.open_table(TABLE) {
            Ok(table) => table,
            // Fresh store: no write transaction has created the table yet.
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let raw = match table.get(OBSTACLES_KEY)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(Vec::new()),
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!("Stored obstacle list is malformed, treating as empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// Serializes `records` and overwrites the stored value atomically.
    pub fn save(&self, records: &[ObstacleRecord]) -> Result<(), AppResponse> {
        let json = serde_json::to_string(records)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE)?;
            table.insert(OBSTACLES_KEY, json.as_str())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Ensures the fixed example record is present exactly once.
    ///
    /// When no element carries the seed id, the seed is prepended and the
    /// result persisted; otherwise `records` comes back unchanged and no
    /// write happens. Calling this twice in a row writes at most once.
    pub fn ensure_seed(
        &self,
        records: Vec<ObstacleRecord>,
    ) -> Result<Vec<ObstacleRecord>, AppResponse> {
        if records.iter().any(|r| r.id == SEED_OBSTACLE_ID) {
            return Ok(records);
        }

        info!("Seeding example obstacle into a fresh store");
        let mut seeded = Vec::with_capacity(records.len() + 1);
        seeded.push(ObstacleRecord::seed());
        seeded.extend(records);
        self.save(&seeded)?;

        Ok(seeded)
    }

    /// Appends one record and persists the result, returning the new list.
    ///
    /// Nothing is stored if persistence fails; the caller's form state
    /// stays valid for a retry.
    pub fn append(&self, record: ObstacleRecord) -> Result<Vec<ObstacleRecord>, AppResponse> {
        let mut records = self.load()?;
        records.push(record);
        self.save(&records)?;
        Ok(records)
    }

    /// Deletes the record with the given id, preserving the relative order
    /// of the rest. Returns `None` (and performs no write) when no record
    /// matches.
    pub fn delete_by_id(&self, id: &str) -> Result<Option<Vec<ObstacleRecord>>, AppResponse> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            return Ok(None);
        }

        self.save(&records)?;
        Ok(Some(records))
    }
}
