//! # Stagemap
//!
//! Pipeline for turning a spreadsheet of travel stages into a published map.
//!
//! This library provides:
//! - Normalization of raw CSV snapshots into typed stage records
//! - Diff-based reconciliation against a persistent SQLite store
//!   (insert/update/delete, never duplicate)
//! - GPX track parsing with fixed-stride down-sampling
//! - Map assembly (bounding-box centering, color-coded category groups,
//!   markers, popups, polylines) rendered as a self-contained Leaflet page
//! - An HTML stage table with year separators and a counter summary fragment
//!
//! ## Quick Start
//!
//! ```rust
//! use stagemap::{normalize, Bounds, GpsPoint};
//!
//! let date = normalize::format_date("5.3.2023").unwrap();
//! assert_eq!(date, "5 March 2023");
//!
//! let endpoints = vec![
//!     GpsPoint::new(42.8806, -8.5449), // Santiago de Compostela
//!     GpsPoint::new(43.0097, -7.5567), // Lugo
//! ];
//! if let Some(bounds) = Bounds::from_points(&endpoints) {
//!     let center = bounds.center();
//!     println!("map centered at {:.4}, {:.4}", center.latitude, center.longitude);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Unified error handling
pub mod error;
pub use error::{Result, StageMapError};

// Settings file (paths, styling, tile layers)
pub mod config;
pub use config::{Settings, TileLayer};

// Snapshot normalization (CSV rows -> typed records)
pub mod normalize;
pub use normalize::{normalize_stages, normalize_stamps, read_stage_rows, read_stamp_rows};

// Persistent record store with diff-based sync
pub mod store;
pub use store::{ReconciliationStore, StoreStats, SyncReport};

// GPX track parsing and down-sampling
pub mod track;
pub use track::sample_track;

// Map assembly (groups, markers, polylines, totals)
pub mod map;
pub use map::{assemble_map, FeatureGroup, MapDocument, Marker, MarkerIcon, TrackLine};

// Stage table and summary fragment rendering
pub mod table;
pub use table::{render_summary, render_table, TABLE_MARKER};

// Leaflet document writer and template substitution
pub mod render;
pub use render::{write_map_html, PopupTemplates};

// Pipeline orchestration and artifact publishing
pub mod pipeline;
pub use pipeline::{Artifact, DirPublisher, Pipeline, Publisher, RunReport};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use stagemap::GpsPoint;
/// let point = GpsPoint::new(42.8806, -8.5449); // Santiago de Compostela
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters (present when the track file carries it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl GpsPoint {
    /// Create a new GPS point without elevation.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
        }
    }

    /// Create a new GPS point with elevation.
    pub fn with_elevation(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: Some(elevation),
        }
    }
}

/// Bounding box over a set of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points. Returns `None` for an empty slice.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Midpoint of the bounding box (not the centroid of the points).
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// One normalized stage entry: a day of walking or one race.
///
/// Produced by [`normalize::normalize_stages`] from a snapshot row; persisted
/// and diffed by [`store::ReconciliationStore`]. The full field tuple is the
/// natural identity of the record; `date` doubles as the sync key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Raw source date, `day.month.year` (sync key, unique per snapshot)
    pub date: String,
    /// Display form of the date, e.g. "5 March 2023" (derived, never persisted)
    pub date_display: String,
    pub title: String,
    /// Route/type label used for map grouping (may be empty)
    pub category: String,
    pub start_label: String,
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_label: String,
    /// End coordinates are absent for single-point stages
    pub end_lat: Option<f64>,
    pub end_lon: Option<f64>,
    pub distance_km: f64,
    /// Elevation gain in meters (D+), when recorded
    pub elevation_gain_m: Option<f64>,
    /// Formatted duration ("4h 15min 30sec"), or the raw value passed through
    pub duration: String,
    pub notes: String,
    /// Marker/polyline color; empty means "use the category default"
    pub color: String,
    /// Narrative link (blog post); empty means none
    pub narrative_link: String,
    /// Photo URL, already prefixed with the media base URL
    pub photo_ref: String,
    /// Resolved path to the GPX track, when the row references one
    pub track_ref: Option<PathBuf>,
}

/// A pilgrim stamp: a single point of interest, rebuilt fully each run and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampRecord {
    pub date: String,
    pub date_display: String,
    pub place: String,
    pub location: String,
    pub category: String,
    pub lat: f64,
    pub lon: f64,
    pub note: String,
    pub link: String,
    /// Photo URL, already prefixed with the media base URL
    pub photo_ref: String,
}

/// Aggregate counters accumulated over one map assembly pass.
///
/// Returned from [`map::assemble_map`] as an explicit value; nothing in the
/// pipeline holds these on shared state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Sum of stage distances in km
    pub distance_km: f64,
    /// Sum of recorded elevation gains in meters (absent gains count as zero)
    pub elevation_gain_m: f64,
    pub stages: usize,
    pub stamps: usize,
}
