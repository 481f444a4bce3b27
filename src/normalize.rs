//! # Record Normalization
//!
//! Converts the raw CSV snapshot into typed records. All parsing rules live
//! here: date and duration reformatting, decimal-comma distances, photo
//! defaulting against the media prefix, and track path resolution. Rows past
//! this boundary are fully typed; nothing downstream touches raw cells.

use crate::config::Settings;
use crate::error::{Result, StageMapError};
use crate::{EventRecord, StampRecord};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ============================================================================
// Raw Snapshot Rows
// ============================================================================

/// One stage row exactly as it appears in the snapshot CSV.
///
/// Every field is defaulted so a snapshot missing an optional column still
/// deserializes; the normalization rules decide what absence means.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStageRow {
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Category", default)]
    pub category: String,
    #[serde(rename = "Start", default)]
    pub start: String,
    #[serde(rename = "Start Lat", default)]
    pub start_lat: Option<f64>,
    #[serde(rename = "Start Lon", default)]
    pub start_lon: Option<f64>,
    #[serde(rename = "End", default)]
    pub end: String,
    #[serde(rename = "End Lat", default)]
    pub end_lat: Option<f64>,
    #[serde(rename = "End Lon", default)]
    pub end_lon: Option<f64>,
    #[serde(rename = "Distance", default)]
    pub distance: String,
    #[serde(rename = "D+", default)]
    pub elevation: Option<f64>,
    #[serde(rename = "Time", default)]
    pub time: String,
    #[serde(rename = "Notes", default)]
    pub notes: String,
    #[serde(rename = "Color", default)]
    pub color: String,
    #[serde(rename = "Post", default)]
    pub post: String,
    #[serde(rename = "Jpg", default)]
    pub jpg: String,
    #[serde(rename = "Gpx", default)]
    pub gpx: String,
}

/// One stamp row exactly as it appears in the stamps CSV.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStampRow {
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Place", default)]
    pub place: String,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Category", default)]
    pub category: String,
    #[serde(rename = "Lat", default)]
    pub lat: Option<f64>,
    #[serde(rename = "Lon", default)]
    pub lon: Option<f64>,
    #[serde(rename = "Note", default)]
    pub note: String,
    #[serde(rename = "Link", default)]
    pub link: String,
    #[serde(rename = "Jpg", default)]
    pub jpg: String,
}

/// Read all stage rows from a snapshot CSV.
pub fn read_stage_rows(path: &Path) -> Result<Vec<RawStageRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    log::info!(
        "[Normalize] Read {} stage rows from {}",
        rows.len(),
        path.display()
    );
    Ok(rows)
}

/// Read all stamp rows from a stamps CSV.
pub fn read_stamp_rows(path: &Path) -> Result<Vec<RawStampRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    log::info!(
        "[Normalize] Read {} stamp rows from {}",
        rows.len(),
        path.display()
    );
    Ok(rows)
}

// ============================================================================
// Parsing Rules
// ============================================================================

/// Reformat a `day.month.year` date as `"<day> <FullMonthName> <year>"`.
///
/// Fails when the value does not split into exactly three numeric tokens or
/// the month lies outside 1-12. The day is deliberately not range-checked.
///
/// # Example
/// ```
/// assert_eq!(stagemap::normalize::format_date("5.3.2023").unwrap(), "5 March 2023");
/// ```
pub fn format_date(raw: &str) -> Result<String> {
    let tokens: Vec<&str> = raw.split('.').collect();
    if tokens.len() != 3 {
        return Err(StageMapError::MalformedDate {
            raw: raw.to_string(),
            reason: format!("expected day.month.year, found {} tokens", tokens.len()),
        });
    }

    let day = parse_date_token(tokens[0], raw)?;
    let month = parse_date_token(tokens[1], raw)?;
    let year = parse_date_token(tokens[2], raw)?;

    if !(1..=12).contains(&month) {
        return Err(StageMapError::MalformedDate {
            raw: raw.to_string(),
            reason: format!("month {} outside 1-12", month),
        });
    }

    let month_name = NaiveDate::from_ymd_opt(year, month as u32, 1)
        .ok_or_else(|| StageMapError::MalformedDate {
            raw: raw.to_string(),
            reason: format!("year {} out of range", year),
        })?
        .format("%B");

    Ok(format!("{} {} {}", day, month_name, year))
}

fn parse_date_token(token: &str, raw: &str) -> Result<i32> {
    token
        .trim()
        .parse()
        .map_err(|_| StageMapError::MalformedDate {
            raw: raw.to_string(),
            reason: format!("non-numeric token '{}'", token),
        })
}

/// Reformat an `h:m:s` duration as `"<h>h <m>min <s>sec"`.
///
/// Anything that does not split into exactly three colon-separated tokens
/// (empty cells, partial times) passes through unchanged.
pub fn format_duration(raw: &str) -> String {
    let tokens: Vec<&str> = raw.split(':').collect();
    if tokens.len() == 3 {
        format!("{}h {}min {}sec", tokens[0], tokens[1], tokens[2])
    } else {
        raw.to_string()
    }
}

/// Parse a distance cell, accepting comma or dot as the decimal separator.
///
/// An empty cell is 0.0; a non-empty, non-numeric cell is an input error.
pub fn parse_distance(raw: &str) -> Result<f64> {
    let cleaned = raw.trim().replace(',', ".");
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    cleaned
        .parse()
        .map_err(|_| StageMapError::MalformedDistance {
            raw: raw.to_string(),
        })
}

fn resolve_photo(raw: &str, default: &str, prefix: &str) -> String {
    if raw.is_empty() {
        format!("{}{}", prefix, default)
    } else {
        format!("{}{}", prefix, raw)
    }
}

fn resolve_track(raw: &str, track_dir: &Path) -> Option<PathBuf> {
    if raw.is_empty() {
        None
    } else {
        Some(track_dir.join(raw))
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize raw stage rows into [`EventRecord`]s, in row order.
///
/// Every row yields exactly one record or fails the whole call; nothing is
/// silently dropped. Since the date doubles as the sync key, a snapshot
/// carrying the same date twice is rejected here instead of being merged
/// later by the store.
pub fn normalize_stages(rows: &[RawStageRow], settings: &Settings) -> Result<Vec<EventRecord>> {
    let mut seen_dates: HashSet<&str> = HashSet::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let date_display = format_date(&row.date)?;
        if !seen_dates.insert(row.date.as_str()) {
            return Err(StageMapError::DuplicateDate {
                date: row.date.clone(),
            });
        }

        let (start_lat, start_lon) = match (row.start_lat, row.start_lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(StageMapError::MissingCoordinates {
                    row: idx + 1,
                    label: row.title.clone(),
                })
            }
        };

        records.push(EventRecord {
            date: row.date.clone(),
            date_display,
            title: row.title.clone(),
            category: row.category.clone(),
            start_label: row.start.clone(),
            start_lat,
            start_lon,
            end_label: row.end.clone(),
            end_lat: row.end_lat,
            end_lon: row.end_lon,
            distance_km: parse_distance(&row.distance)?,
            elevation_gain_m: row.elevation,
            duration: format_duration(&row.time),
            notes: row.notes.clone(),
            color: row.color.clone(),
            narrative_link: row.post.clone(),
            photo_ref: resolve_photo(&row.jpg, &settings.photo_default, &settings.media_prefix),
            track_ref: resolve_track(&row.gpx, &settings.track_dir),
        });
    }

    log::info!("[Normalize] {} stage records normalized", records.len());
    Ok(records)
}

/// Normalize raw stamp rows into [`StampRecord`]s, in row order.
///
/// Stamps are rebuilt from scratch each run and carry no sync key, so
/// duplicate dates are fine here.
pub fn normalize_stamps(rows: &[RawStampRow], settings: &Settings) -> Result<Vec<StampRecord>> {
    let mut records = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let date_display = format_date(&row.date)?;

        let (lat, lon) = match (row.lat, row.lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(StageMapError::MissingCoordinates {
                    row: idx + 1,
                    label: row.place.clone(),
                })
            }
        };

        records.push(StampRecord {
            date: row.date.clone(),
            date_display,
            place: row.place.clone(),
            location: row.location.clone(),
            category: row.category.clone(),
            lat,
            lon,
            note: row.note.clone(),
            link: row.link.clone(),
            photo_ref: resolve_photo(
                &row.jpg,
                &settings.stamp_photo_default,
                &settings.media_prefix,
            ),
        });
    }

    log::info!("[Normalize] {} stamp records normalized", records.len());
    Ok(records)
}
