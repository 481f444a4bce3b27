//! # HTML Rendering
//!
//! All markup lives here: the popup templates and their placeholder
//! substitution, the shared display helpers, and the writer that turns a
//! [`MapDocument`] into a self-contained Leaflet page. Nothing outside this
//! module and the table renderer emits HTML.

use crate::config::Settings;
use crate::error::Result;
use crate::map::{MapDocument, Marker, TrackLine};
use crate::{EventRecord, StampRecord};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Blog link line removed from stage popups when the record has no usable
/// absolute URL.
pub const BLOG_LINK_HTML: &str = r#"<a href="{post}" target="_blank">Blog Post</a>"#;

/// Built-in stage popup, used when no template file is configured.
pub const DEFAULT_STAGE_POPUP: &str = r#"<html>
<head><meta charset="utf-8" /></head>
<body style="font-family: sans-serif; margin: 8px;">
<h3>{title}</h3>
<p><b>{date}</b> &middot; {category}</p>
<img src="{pic}" width="100%" />
<p>{start} → {end}</p>
<p>{dist} | {time}</p>
<p>{notes}</p>
<p><a href="{post}" target="_blank">Blog Post</a></p>
</body>
</html>"#;

/// Built-in stamp popup, used when no template file is configured.
pub const DEFAULT_STAMP_POPUP: &str = r#"<html>
<head><meta charset="utf-8" /></head>
<body style="font-family: sans-serif; margin: 8px;">
<h3>{place}</h3>
<p><b>{date}</b> &middot; {category}</p>
<img src="{pic}" width="100%" />
<p>{location}</p>
<p>{note}</p>
<p><a href="{link}" target="_blank">More</a></p>
</body>
</html>"#;

/// Built-in summary fragment, used when no template file is configured.
pub const DEFAULT_SUMMARY_TEMPLATE: &str = "<p><b><!--dist--></b> km and <b><!--dplus--></b> \
vertical km over <b><!--stages--></b> stages with <b><!--stamps--></b> stamps.</p>\n";

// ============================================================================
// Templates
// ============================================================================

/// The two popup templates used while assembling a map.
#[derive(Debug, Clone)]
pub struct PopupTemplates {
    pub stage: String,
    pub stamp: String,
}

impl PopupTemplates {
    /// Load the configured template files, falling back to the built-ins.
    pub fn load(settings: &Settings) -> Result<Self> {
        Ok(Self {
            stage: load_template(settings.popup_template.as_deref(), DEFAULT_STAGE_POPUP)?,
            stamp: load_template(settings.stamp_popup_template.as_deref(), DEFAULT_STAMP_POPUP)?,
        })
    }
}

/// Read a template file, or return the fallback when no path is configured.
pub fn load_template(path: Option<&Path>, fallback: &str) -> Result<String> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            log::debug!("[Render] Loaded template {}", path.display());
            Ok(text)
        }
        None => Ok(fallback.to_string()),
    }
}

/// Replace every `{name}` placeholder with its value.
pub fn substitute(template: &str, fields: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in fields {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}

/// Fill the stage popup template for one record.
///
/// The blog link line is stripped before substitution when the record's
/// narrative link is not an absolute URL.
pub fn stage_popup(template: &str, record: &EventRecord, dist_label: &str) -> String {
    let mut html = template.to_string();
    if !is_absolute_url(&record.narrative_link) {
        html = html.replace(BLOG_LINK_HTML, "");
    }
    substitute(
        &html,
        &[
            ("title", &record.title),
            ("date", &record.date_display),
            ("category", &record.category),
            ("start", &record.start_label),
            ("end", &record.end_label),
            ("dist", dist_label),
            ("time", &record.duration),
            ("notes", &record.notes),
            ("post", &record.narrative_link),
            ("pic", &record.photo_ref),
        ],
    )
}

/// Fill the stamp popup template for one stamp.
pub fn stamp_popup(template: &str, stamp: &StampRecord) -> String {
    substitute(
        template,
        &[
            ("place", &stamp.place),
            ("date", &stamp.date_display),
            ("location", &stamp.location),
            ("category", &stamp.category),
            ("note", &stamp.note),
            ("link", &stamp.link),
            ("pic", &stamp.photo_ref),
        ],
    )
}

/// Distance display string: decimal comma, `km` unit, and an optional
/// elevation-gain suffix when the gain is present and non-zero.
pub fn distance_label(distance_km: f64, elevation_gain_m: Option<f64>, gain_unit: &str) -> String {
    let mut label = format!("{} km", format!("{}", distance_km).replace('.', ","));
    if let Some(gain) = elevation_gain_m.filter(|g| *g != 0.0) {
        label.push_str(&format!(" | {} {}", gain as i64, gain_unit));
    }
    label
}

/// Whether a link is a usable absolute URL (case-insensitive scheme check).
pub fn is_absolute_url(link: &str) -> bool {
    let lower = link.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

// ============================================================================
// Map Page Writer
// ============================================================================

/// Write a [`MapDocument`] as a self-contained Leaflet page.
pub fn write_map_html<W: Write>(document: &MapDocument, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>Stage Map</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>
html, body {{ height: 100%; margin: 0; }}
#map {{ height: 100%; width: 100%; }}
.leaflet-interactive:focus {{ outline: none; }}
</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView([{}, {}], {});"#,
        document.center.latitude,
        document.center.longitude,
        document.zoom_start
    )?;

    // Base tile layers, first one active.
    writeln!(writer, "var baseLayers = {{}};")?;
    for (i, layer) in document.tile_layers.iter().enumerate() {
        writeln!(
            writer,
            "var base{} = L.tileLayer({}, {{ attribution: {} }});",
            i,
            js_string(&layer.url),
            js_string(&layer.attribution)
        )?;
        if i == 0 {
            writeln!(writer, "base{}.addTo(map);", i)?;
        }
        writeln!(writer, "baseLayers[{}] = base{};", js_string(&layer.name), i)?;
    }

    // Overlay groups, keyed by a color-coded legend span.
    writeln!(writer, "var overlays = {{}};")?;
    for (i, group) in document.groups.iter().enumerate() {
        let legend = format!(
            r#"<span style="color: {};">{}</span>"#,
            group.color,
            escape_html(&group.name)
        );
        writeln!(writer, "var group{} = L.featureGroup().addTo(map);", i)?;
        writeln!(writer, "overlays[{}] = group{};", js_string(&legend), i)?;
    }

    let mut marker_count = 0;
    let mut line_count = 0;
    for (i, group) in document.groups.iter().enumerate() {
        let parent = format!("group{}", i);
        for marker in &group.markers {
            write_marker(writer, marker_count, marker, &parent)?;
            marker_count += 1;
        }
        for line in &group.lines {
            write_line(writer, line_count, line, &parent)?;
            line_count += 1;
        }
    }
    for marker in &document.ungrouped_markers {
        write_marker(writer, marker_count, marker, "map")?;
        marker_count += 1;
    }
    for line in &document.ungrouped_lines {
        write_line(writer, line_count, line, "map")?;
        line_count += 1;
    }

    writeln!(
        writer,
        r#"L.control.layers(baseLayers, overlays, {{ position: "topright", collapsed: true }}).addTo(map);
</script>
</body>
</html>"#
    )?;

    log::info!(
        "[Render] Wrote map page ({} markers, {} tracks)",
        marker_count,
        line_count
    );
    Ok(())
}

fn write_marker<W: Write>(writer: &mut W, index: usize, marker: &Marker, parent: &str) -> Result<()> {
    writeln!(
        writer,
        "var icon{} = L.icon({{ iconUrl: {}, iconSize: [{}, {}], iconAnchor: [{}, {}], popupAnchor: [{}, {}] }});",
        index,
        js_string(&marker.icon.image_url),
        marker.icon.size.0,
        marker.icon.size.1,
        marker.icon.anchor.0,
        marker.icon.anchor.1,
        marker.icon.popup_anchor.0,
        marker.icon.popup_anchor.1
    )?;
    writeln!(
        writer,
        "var marker{} = L.marker([{}, {}], {{ icon: icon{} }}).addTo({});",
        index, marker.lat, marker.lon, index, parent
    )?;
    write_bindings(
        writer,
        &format!("marker{}", index),
        &marker.popup_html,
        marker.popup_width,
        marker.popup_height,
        &marker.tooltip,
    )
}

fn write_line<W: Write>(writer: &mut W, index: usize, line: &TrackLine, parent: &str) -> Result<()> {
    let coords: Vec<[f64; 2]> = line
        .points
        .iter()
        .map(|p| [p.latitude, p.longitude])
        .collect();
    writeln!(
        writer,
        "var line{} = L.polyline({}, {{ color: {}, weight: {}, opacity: {} }}).addTo({});",
        index,
        serde_json::to_string(&coords).unwrap_or_else(|_| "[]".to_string()),
        js_string(&line.color),
        line.weight,
        line.opacity,
        parent
    )?;
    write_bindings(
        writer,
        &format!("line{}", index),
        &line.popup_html,
        line.popup_width,
        line.popup_height,
        &line.tooltip,
    )
}

/// Bind the iframe popup and hover tooltip onto one feature variable.
fn write_bindings<W: Write>(
    writer: &mut W,
    var: &str,
    popup_html: &str,
    width: u32,
    height: u32,
    tooltip: &str,
) -> Result<()> {
    let iframe = format!(
        r#"<iframe srcdoc="{}" width="{}" height="{}" style="border: none;"></iframe>"#,
        escape_html(popup_html),
        width,
        height
    );
    writeln!(
        writer,
        "{}.bindPopup({}, {{ maxWidth: {} }});",
        var,
        js_string(&iframe),
        width + 20
    )?;
    writeln!(writer, "{}.bindTooltip({});", var, js_string(tooltip))?;
    Ok(())
}

/// Escape text for embedding in HTML content or attribute values.
fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Encode a string as a JavaScript string literal.
fn js_string(raw: &str) -> String {
    serde_json::to_string(raw).unwrap_or_else(|_| String::from("\"\""))
}
