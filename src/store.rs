//! # Reconciliation Store
//!
//! SQLite-backed persistence for stage records. One `sync` call brings the
//! table into exact correspondence with the latest snapshot: rows whose date
//! vanished from the snapshot are deleted, unknown dates are inserted, and
//! rows whose fields changed are updated in place. Identical rows are left
//! untouched, which makes the operation idempotent.

use crate::error::Result;
use crate::normalize;
use crate::EventRecord;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// Non-key columns follow the normalized attribute set; the UNIQUE tuple
// spans every column except the surrogate id.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stages (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    start_label TEXT NOT NULL,
    start_lat REAL NOT NULL,
    start_lon REAL NOT NULL,
    end_label TEXT NOT NULL,
    end_lat REAL,
    end_lon REAL,
    distance_km REAL NOT NULL,
    elevation_gain_m REAL,
    duration TEXT NOT NULL,
    notes TEXT NOT NULL,
    color TEXT NOT NULL,
    narrative_link TEXT NOT NULL,
    photo_ref TEXT NOT NULL,
    track_ref TEXT,
    UNIQUE(date, title, category, start_label, start_lat, start_lon,
           end_label, end_lat, end_lon, distance_km, elevation_gain_m,
           duration, notes, color, narrative_link, photo_ref, track_ref)
);
"#;

const COLUMNS: &str = "date, title, category, start_label, start_lat, start_lon, \
                       end_label, end_lat, end_lon, distance_km, elevation_gain_m, \
                       duration, notes, color, narrative_link, photo_ref, track_ref";

/// Counts of the mutations one sync applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SyncReport {
    /// True when the sync applied no mutations at all.
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// Table shape reported by the inspect command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub rows: usize,
    pub columns: usize,
}

/// Persistent set of stage records, keyed by date across syncs.
pub struct ReconciliationStore {
    conn: Connection,
}

impl ReconciliationStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        log::info!("[Store] Opened {}", path.display());
        Ok(store)
    }

    /// Open a fresh in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Drop and recreate the stage table, discarding every persisted record.
    pub fn rebuild(&self) -> Result<()> {
        self.conn.execute_batch("DROP TABLE IF EXISTS stages;")?;
        self.init_schema()?;
        log::info!("[Store] Rebuilt stage table");
        Ok(())
    }

    /// Bring the persisted set into 1:1 correspondence with `records`.
    ///
    /// The whole sync runs inside one transaction; on error it rolls back
    /// and the store stays fully pre-sync. Syncing the same snapshot twice
    /// applies no mutations on the second call.
    pub fn sync(&mut self, records: &[EventRecord]) -> Result<SyncReport> {
        let tx = self.conn.transaction()?;
        let mut report = SyncReport::default();

        let snapshot_dates: HashSet<&str> = records.iter().map(|r| r.date.as_str()).collect();
        let persisted_dates: Vec<String> = {
            let mut stmt = tx.prepare("SELECT date FROM stages")?;
            let dates: Vec<String> = stmt
                .query_map([], |row| row.get(0))?
                .filter_map(|r| r.ok())
                .collect();
            dates
        };

        for date in &persisted_dates {
            if !snapshot_dates.contains(date.as_str()) {
                tx.execute("DELETE FROM stages WHERE date = ?1", params![date])?;
                report.deleted += 1;
                log::info!("[Store] Deleted stage dated {}: gone from snapshot", date);
            }
        }

        for record in records {
            match load_by_date(&tx, &record.date)? {
                Some(existing) => {
                    if existing != *record {
                        update_record(&tx, record)?;
                        report.updated += 1;
                        log::info!(
                            "[Store] Updated stage dated {}: snapshot changed",
                            record.date
                        );
                    }
                }
                None => {
                    insert_record(&tx, record)?;
                    report.inserted += 1;
                    log::info!("[Store] Inserted stage dated {}", record.date);
                }
            }
        }

        tx.commit()?;
        log::info!(
            "[Store] Sync complete: {} inserted, {} updated, {} deleted",
            report.inserted,
            report.updated,
            report.deleted
        );
        Ok(report)
    }

    /// All persisted records, in insertion order.
    pub fn load_all(&self) -> Result<Vec<EventRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM stages ORDER BY id", COLUMNS))?;
        let records: Vec<EventRecord> = stmt
            .query_map([], record_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    /// Number of persisted records.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM stages", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Row and column counts for the inspect command.
    pub fn stats(&self) -> Result<StoreStats> {
        let rows = self.count()?;
        let mut stmt = self.conn.prepare("PRAGMA table_info(stages)")?;
        let columns = stmt.query_map([], |_| Ok(()))?.count();
        Ok(StoreStats { rows, columns })
    }
}

fn load_by_date(conn: &Connection, date: &str) -> Result<Option<EventRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM stages WHERE date = ?1", COLUMNS),
        params![date],
        record_from_row,
    )
    .optional()
    .map_err(Into::into)
}

fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<EventRecord> {
    let date: String = row.get(0)?;
    // The display form is derived, not stored; recompute it on the way out.
    let date_display = normalize::format_date(&date).unwrap_or_else(|_| date.clone());
    let track_ref: Option<String> = row.get(16)?;
    Ok(EventRecord {
        date_display,
        date,
        title: row.get(1)?,
        category: row.get(2)?,
        start_label: row.get(3)?,
        start_lat: row.get(4)?,
        start_lon: row.get(5)?,
        end_label: row.get(6)?,
        end_lat: row.get(7)?,
        end_lon: row.get(8)?,
        distance_km: row.get(9)?,
        elevation_gain_m: row.get(10)?,
        duration: row.get(11)?,
        notes: row.get(12)?,
        color: row.get(13)?,
        narrative_link: row.get(14)?,
        photo_ref: row.get(15)?,
        track_ref: track_ref.map(PathBuf::from),
    })
}

fn insert_record(conn: &Connection, r: &EventRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO stages ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            COLUMNS
        ),
        params![
            r.date,
            r.title,
            r.category,
            r.start_label,
            r.start_lat,
            r.start_lon,
            r.end_label,
            r.end_lat,
            r.end_lon,
            r.distance_km,
            r.elevation_gain_m,
            r.duration,
            r.notes,
            r.color,
            r.narrative_link,
            r.photo_ref,
            track_param(r),
        ],
    )?;
    Ok(())
}

fn update_record(conn: &Connection, r: &EventRecord) -> Result<()> {
    conn.execute(
        "UPDATE stages SET title = ?2, category = ?3, start_label = ?4, start_lat = ?5, \
         start_lon = ?6, end_label = ?7, end_lat = ?8, end_lon = ?9, distance_km = ?10, \
         elevation_gain_m = ?11, duration = ?12, notes = ?13, color = ?14, \
         narrative_link = ?15, photo_ref = ?16, track_ref = ?17 WHERE date = ?1",
        params![
            r.date,
            r.title,
            r.category,
            r.start_label,
            r.start_lat,
            r.start_lon,
            r.end_label,
            r.end_lat,
            r.end_lon,
            r.distance_km,
            r.elevation_gain_m,
            r.duration,
            r.notes,
            r.color,
            r.narrative_link,
            r.photo_ref,
            track_param(r),
        ],
    )?;
    Ok(())
}

fn track_param(r: &EventRecord) -> Option<String> {
    r.track_ref
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
}
