//! # Settings
//!
//! Run configuration loaded from a JSON file. Every field has a default, so a
//! partial settings file only needs to override what differs from the stock
//! layout (`data/`, `templates/`, `output/`).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One base tile layer offered in the map's layer control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    /// Display name in the layer control
    pub name: String,
    /// Tile URL template with `{z}/{x}/{y}` placeholders
    pub url: String,
    /// Attribution HTML required by the tile provider
    pub attribution: String,
}

/// All knobs for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Stage snapshot CSV. Default: `data/stages.csv`
    pub events_csv: PathBuf,

    /// Stamp snapshot CSV; `null` disables the stamps layer.
    /// Default: none
    pub stamps_csv: Option<PathBuf>,

    /// SQLite store path. Default: `stages.db`
    pub db_path: PathBuf,

    /// Rendered map document. Default: `output/stage_map.html`
    pub map_html: PathBuf,

    /// Stage table template carrying the insertion marker.
    /// Default: `templates/stage_table.html`
    pub table_template: PathBuf,

    /// Rendered stage table. Default: `output/stage_table.html`
    pub table_html: PathBuf,

    /// Stylesheet published unchanged next to the table.
    /// Default: `templates/stage_table.css`
    pub table_css: PathBuf,

    /// Summary fragment template; `null` uses the built-in one.
    /// Default: none
    pub summary_template: Option<PathBuf>,

    /// Rendered summary fragment. Default: `output/summary.html`
    pub summary_html: PathBuf,

    /// Stage popup template; `null` uses the built-in one. Default: none
    pub popup_template: Option<PathBuf>,

    /// Stamp popup template; `null` uses the built-in one. Default: none
    pub stamp_popup_template: Option<PathBuf>,

    /// Base URL prefixed onto every photo and icon reference.
    /// Default: empty
    pub media_prefix: String,

    /// Photo shown when a stage row has no photo of its own.
    /// Default: `stage_default.jpg`
    pub photo_default: String,

    /// Photo shown when a stamp row has no photo of its own.
    /// Default: `stamp_default.jpg`
    pub stamp_photo_default: String,

    /// Marker icon for stages, resolved against `media_prefix`.
    /// Default: `stage_marker.png`
    pub stage_icon: String,

    /// Marker icon for stamps, resolved against `media_prefix`.
    /// Default: `stamp_marker.png`
    pub stamp_icon: String,

    /// Directory holding the GPX track files. Default: `gpx`
    pub track_dir: PathBuf,

    /// Down-sampling stride for track points (keep every Nth point).
    /// Values below 1 are treated as 1. Default: 5
    pub track_stride: usize,

    /// Polyline stroke weight. Default: 4.0
    pub track_weight: f64,

    /// Polyline opacity (0..1). Default: 0.8
    pub track_opacity: f64,

    /// Initial map zoom level. Default: 7
    pub zoom_start: u32,

    /// Stage popup iframe width in pixels. Default: 320
    pub popup_width: u32,

    /// Stage popup iframe height in pixels. Default: 360
    pub popup_height: u32,

    /// Stamp popup iframe width in pixels. Default: 260
    pub stamp_popup_width: u32,

    /// Stamp popup iframe height in pixels. Default: 320
    pub stamp_popup_height: u32,

    /// Color for categories that never declare one. Default: `blue`
    pub default_color: String,

    /// Base tile layers, first one active initially.
    /// Default: five well-known public layers
    pub tile_layers: Vec<TileLayer>,

    /// Directory the bundled publisher writes artifacts into.
    /// Default: `public`
    pub publish_dir: PathBuf,

    /// Page announced after a successful publish. Default: empty
    pub blog_page: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            events_csv: PathBuf::from("data/stages.csv"),
            stamps_csv: None,
            db_path: PathBuf::from("stages.db"),
            map_html: PathBuf::from("output/stage_map.html"),
            table_template: PathBuf::from("templates/stage_table.html"),
            table_html: PathBuf::from("output/stage_table.html"),
            table_css: PathBuf::from("templates/stage_table.css"),
            summary_template: None,
            summary_html: PathBuf::from("output/summary.html"),
            popup_template: None,
            stamp_popup_template: None,
            media_prefix: String::new(),
            photo_default: "stage_default.jpg".to_string(),
            stamp_photo_default: "stamp_default.jpg".to_string(),
            stage_icon: "stage_marker.png".to_string(),
            stamp_icon: "stamp_marker.png".to_string(),
            track_dir: PathBuf::from("gpx"),
            track_stride: 5,
            track_weight: 4.0,
            track_opacity: 0.8,
            zoom_start: 7,
            popup_width: 320,
            popup_height: 360,
            stamp_popup_width: 260,
            stamp_popup_height: 320,
            default_color: "blue".to_string(),
            tile_layers: default_tile_layers(),
            publish_dir: PathBuf::from("public"),
            blog_page: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        log::info!("[Settings] Loaded {}", path.display());
        Ok(settings)
    }
}

fn default_tile_layers() -> Vec<TileLayer> {
    vec![
        TileLayer {
            name: "Nat Geo Map".to_string(),
            url: "https://server.arcgisonline.com/ArcGIS/rest/services/NatGeo_World_Map/MapServer/tile/{z}/{y}/{x}".to_string(),
            attribution: "Tiles &copy; Esri &mdash; National Geographic, Esri, DeLorme, NAVTEQ, UNEP-WCMC, USGS, NASA, ESA, METI, NRCAN, GEBCO, NOAA, iPC".to_string(),
        },
        TileLayer {
            name: "OpenTopoMap".to_string(),
            url: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "Map data: &copy; OpenStreetMap contributors, SRTM | Map style: &copy; OpenTopoMap (CC-BY-SA)".to_string(),
        },
        TileLayer {
            name: "Satellite".to_string(),
            url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}".to_string(),
            attribution: "Tiles &copy; Esri &mdash; Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community".to_string(),
        },
        TileLayer {
            name: "CartoDB Positron".to_string(),
            url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors &copy; CARTO".to_string(),
        },
        TileLayer {
            name: "OpenStreet Map".to_string(),
            url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
        },
    ]
}
