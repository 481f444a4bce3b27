//! # Track Sampling
//!
//! Reads a GPX file into an ordered `(lat, lon)` sequence, thinned with a
//! fixed stride so long tracks do not bloat the rendered map. A missing or
//! non-GPX path is "no data" rather than an error: the stage simply renders
//! without a polyline.

use crate::error::Result;
use crate::GpsPoint;
use gpx::read;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Parse a GPX file into a down-sampled, ordered point sequence.
///
/// Returns `Ok(None)` when the path does not exist or does not carry a
/// `.gpx` extension (case-insensitive); a file that exists but fails to
/// parse degrades the same way with a warning. All tracks and segments are
/// flattened into one sequence in document order, then every `stride`-th
/// point is kept, starting with the first. Points are never reordered or
/// deduplicated. An empty track yields an empty sequence, not an error.
pub fn sample_track(path: &Path, stride: usize) -> Result<Option<Vec<GpsPoint>>> {
    if !path.is_file() || !has_gpx_extension(path) {
        log::warn!("[Track] Invalid track file {}", path.display());
        return Ok(None);
    }

    let file = File::open(path)?;
    let gpx = match read(BufReader::new(file)) {
        Ok(gpx) => gpx,
        Err(err) => {
            log::warn!("[Track] Failed to parse {}: {}", path.display(), err);
            return Ok(None);
        }
    };

    let mut points = Vec::new();
    for track in &gpx.tracks {
        for segment in &track.segments {
            for pt in &segment.points {
                let point = match pt.elevation {
                    Some(ele) => GpsPoint::with_elevation(pt.point().y(), pt.point().x(), ele),
                    None => GpsPoint::new(pt.point().y(), pt.point().x()),
                };
                points.push(point);
            }
        }
    }

    let stride = stride.max(1);
    let sampled: Vec<GpsPoint> = points.into_iter().step_by(stride).collect();
    log::debug!(
        "[Track] {}: {} points kept (stride {})",
        path.display(),
        sampled.len(),
        stride
    );

    Ok(Some(sampled))
}

fn has_gpx_extension(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gpx"))
}
