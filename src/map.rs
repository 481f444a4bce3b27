//! # Map Assembly
//!
//! Derives the map view from the reconciled records: bounding-box center,
//! one color-coded feature group per category, a marker per stage (with
//! popup and tooltip), a polyline per sampled track, and a separate stamps
//! group. The result is a plain [`MapDocument`] plus the run totals; all
//! markup lives in the `render` module.

use crate::config::{Settings, TileLayer};
use crate::error::{Result, StageMapError};
use crate::render::{self, PopupTemplates};
use crate::{Bounds, EventRecord, GpsPoint, RunTotals, StampRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Document Types
// ============================================================================

/// Marker icon, 32x32 with a centered anchor and the popup opening above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerIcon {
    pub image_url: String,
    pub size: (u32, u32),
    pub anchor: (u32, u32),
    pub popup_anchor: (i32, i32),
}

impl MarkerIcon {
    fn new(image_url: String) -> Self {
        Self {
            image_url,
            size: (32, 32),
            anchor: (16, 16),
            popup_anchor: (0, -16),
        }
    }
}

/// One map marker with its popup content and hover tooltip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub tooltip: String,
    pub popup_html: String,
    pub popup_width: u32,
    pub popup_height: u32,
    pub icon: MarkerIcon,
}

/// One track polyline, carrying the same popup and tooltip as its marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackLine {
    pub points: Vec<GpsPoint>,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub tooltip: String,
    pub popup_html: String,
    pub popup_width: u32,
    pub popup_height: u32,
}

/// A named, colored layer bucket shown in the layer control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGroup {
    pub name: String,
    pub color: String,
    pub markers: Vec<Marker>,
    pub lines: Vec<TrackLine>,
}

/// Complete description of one rendered map.
///
/// Groups are ordered by category name; stamps, when present, come last as
/// their own group. Features whose category matches no group attach at the
/// map root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub center: GpsPoint,
    pub zoom_start: u32,
    pub tile_layers: Vec<TileLayer>,
    pub groups: Vec<FeatureGroup>,
    pub ungrouped_markers: Vec<Marker>,
    pub ungrouped_lines: Vec<TrackLine>,
}

// ============================================================================
// Assembly
// ============================================================================

/// Assemble the map document and run totals from the reconciled records.
///
/// `tracks` is parallel to `records`: the sampled point sequence for each
/// stage, `None` where the stage has no usable track. Fails only when there
/// is not a single coordinate to center the map on.
pub fn assemble_map(
    records: &[EventRecord],
    tracks: &[Option<Vec<GpsPoint>>],
    stamps: &[StampRecord],
    templates: &PopupTemplates,
    settings: &Settings,
) -> Result<(MapDocument, RunTotals)> {
    let center = map_center(records, stamps)?;

    // Category -> color, first non-empty color wins, sorted by category.
    let mut group_colors: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    for record in records {
        if record.category.is_empty() {
            continue;
        }
        let slot = group_colors.entry(record.category.as_str()).or_insert(None);
        if slot.is_none() && !record.color.is_empty() {
            *slot = Some(record.color.as_str());
        }
    }

    let group_index: BTreeMap<String, usize> = group_colors
        .keys()
        .enumerate()
        .map(|(i, name)| ((*name).to_string(), i))
        .collect();

    let mut groups: Vec<FeatureGroup> = group_colors
        .iter()
        .map(|(name, color)| FeatureGroup {
            name: (*name).to_string(),
            color: color.unwrap_or(&settings.default_color).to_string(),
            markers: Vec::new(),
            lines: Vec::new(),
        })
        .collect();

    let mut totals = RunTotals::default();
    let mut ungrouped_markers = Vec::new();
    let mut ungrouped_lines = Vec::new();

    for (record, track) in records.iter().zip(tracks) {
        log::debug!("[Map] Loading {}", record.title);

        totals.distance_km += record.distance_km;
        if let Some(gain) = record.elevation_gain_m.filter(|g| *g != 0.0) {
            totals.elevation_gain_m += gain;
        }
        totals.stages += 1;

        let color = effective_color(record, settings);
        let dist_label = render::distance_label(record.distance_km, record.elevation_gain_m, "D+");
        let popup_html = render::stage_popup(&templates.stage, record, &dist_label);
        let tooltip = format!(
            "{}: {} → {}",
            record.title, record.start_label, record.end_label
        );

        let marker = Marker {
            lat: record.start_lat,
            lon: record.start_lon,
            tooltip: tooltip.clone(),
            popup_html: popup_html.clone(),
            popup_width: settings.popup_width,
            popup_height: settings.popup_height,
            icon: MarkerIcon::new(format!("{}{}", settings.media_prefix, settings.stage_icon)),
        };

        let line = track
            .as_ref()
            .filter(|points| !points.is_empty())
            .map(|points| TrackLine {
                points: points.clone(),
                color,
                weight: settings.track_weight,
                opacity: settings.track_opacity,
                tooltip,
                popup_html,
                popup_width: settings.popup_width,
                popup_height: settings.popup_height,
            });

        match group_index.get(record.category.as_str()) {
            Some(&i) => {
                groups[i].markers.push(marker);
                if let Some(line) = line {
                    groups[i].lines.push(line);
                }
            }
            None => {
                ungrouped_markers.push(marker);
                if let Some(line) = line {
                    ungrouped_lines.push(line);
                }
            }
        }
    }

    if !stamps.is_empty() {
        let mut stamp_group = FeatureGroup {
            name: "Stamps".to_string(),
            color: "black".to_string(),
            markers: Vec::new(),
            lines: Vec::new(),
        };
        for stamp in stamps {
            log::debug!("[Map] Loading stamp: {}", stamp.place);
            totals.stamps += 1;
            stamp_group.markers.push(Marker {
                lat: stamp.lat,
                lon: stamp.lon,
                tooltip: stamp.place.clone(),
                popup_html: render::stamp_popup(&templates.stamp, stamp),
                popup_width: settings.stamp_popup_width,
                popup_height: settings.stamp_popup_height,
                icon: MarkerIcon::new(format!("{}{}", settings.media_prefix, settings.stamp_icon)),
            });
        }
        groups.push(stamp_group);
    }

    log::info!(
        "[Map] Assembled {} groups ({} stages, {} stamps), centered at {:.4}, {:.4}",
        groups.len(),
        totals.stages,
        totals.stamps,
        center.latitude,
        center.longitude
    );

    let document = MapDocument {
        center,
        zoom_start: settings.zoom_start,
        tile_layers: settings.tile_layers.clone(),
        groups,
        ungrouped_markers,
        ungrouped_lines,
    };
    Ok((document, totals))
}

/// Midpoint of the bounding box over every start, end and stamp coordinate.
fn map_center(records: &[EventRecord], stamps: &[StampRecord]) -> Result<GpsPoint> {
    let mut extent: Vec<GpsPoint> = Vec::new();
    for record in records {
        extent.push(GpsPoint::new(record.start_lat, record.start_lon));
        if let (Some(lat), Some(lon)) = (record.end_lat, record.end_lon) {
            extent.push(GpsPoint::new(lat, lon));
        }
    }
    for stamp in stamps {
        extent.push(GpsPoint::new(stamp.lat, stamp.lon));
    }

    Bounds::from_points(&extent)
        .map(|bounds| bounds.center())
        .ok_or(StageMapError::EmptyMapExtent)
}

fn effective_color(record: &EventRecord, settings: &Settings) -> String {
    if record.color.is_empty() {
        settings.default_color.clone()
    } else {
        record.color.clone()
    }
}
