//! Tests for render module

use stagemap::render::{
    distance_label, is_absolute_url, load_template, stage_popup, stamp_popup, substitute,
    BLOG_LINK_HTML, DEFAULT_STAGE_POPUP, DEFAULT_STAMP_POPUP,
};
use stagemap::{
    write_map_html, EventRecord, FeatureGroup, GpsPoint, MapDocument, Marker, MarkerIcon,
    StampRecord, TileLayer, TrackLine,
};

fn record() -> EventRecord {
    EventRecord {
        date: "5.3.2023".to_string(),
        date_display: "5 March 2023".to_string(),
        title: "Day 1".to_string(),
        category: "Frances".to_string(),
        start_label: "Sarria".to_string(),
        start_lat: 42.7797,
        start_lon: -7.4143,
        end_label: "Portomarin".to_string(),
        end_lat: None,
        end_lon: None,
        distance_km: 22.2,
        elevation_gain_m: Some(420.0),
        duration: "5h 45min 00sec".to_string(),
        notes: "Rainy".to_string(),
        color: "red".to_string(),
        narrative_link: "https://example.com/day-1".to_string(),
        photo_ref: "https://media.example.com/day1.jpg".to_string(),
        track_ref: None,
    }
}

fn marker(lat: f64, lon: f64, tooltip: &str, popup: &str) -> Marker {
    Marker {
        lat,
        lon,
        tooltip: tooltip.to_string(),
        popup_html: popup.to_string(),
        popup_width: 320,
        popup_height: 360,
        icon: MarkerIcon {
            image_url: "https://media.example.com/stage.png".to_string(),
            size: (32, 32),
            anchor: (16, 16),
            popup_anchor: (0, -16),
        },
    }
}

fn document() -> MapDocument {
    let line = TrackLine {
        points: vec![GpsPoint::new(42.0, -4.0), GpsPoint::new(42.1, -4.1)],
        color: "red".to_string(),
        weight: 4.0,
        opacity: 0.8,
        tooltip: "Day 1: Sarria → Portomarin".to_string(),
        popup_html: "<b>popup</b>".to_string(),
        popup_width: 320,
        popup_height: 360,
    };
    MapDocument {
        center: GpsPoint::new(20.0, 5.0),
        zoom_start: 7,
        tile_layers: vec![TileLayer {
            name: "Base".to_string(),
            url: "https://tiles.example.com/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; Test".to_string(),
        }],
        groups: vec![FeatureGroup {
            name: "Frances".to_string(),
            color: "red".to_string(),
            markers: vec![marker(42.5, -3.5, "Day 1: Sarria → Portomarin", "<b>popup</b>")],
            lines: vec![line],
        }],
        ungrouped_markers: vec![marker(41.0, -2.0, "loose", "<i>loose</i>")],
        ungrouped_lines: Vec::new(),
    }
}

#[test]
fn test_substitute_replaces_placeholders() {
    let out = substitute("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x and y and x");
}

#[test]
fn test_substitute_leaves_unknown_placeholders() {
    assert_eq!(substitute("{a} {c}", &[("a", "x")]), "x {c}");
}

#[test]
fn test_is_absolute_url() {
    assert!(is_absolute_url("https://example.com"));
    assert!(is_absolute_url("http://example.com"));
    assert!(is_absolute_url("HTTPS://EXAMPLE.COM"));
    assert!(is_absolute_url("  https://example.com  "));
    assert!(!is_absolute_url(""));
    assert!(!is_absolute_url("example.com"));
    assert!(!is_absolute_url("httpx://example.com"));
    assert!(!is_absolute_url("ftp://example.com"));
    assert!(!is_absolute_url("coming soon"));
}

#[test]
fn test_distance_label() {
    assert_eq!(distance_label(22.2, Some(420.0), "D+"), "22,2 km | 420 D+");
    assert_eq!(distance_label(22.2, Some(420.9), "m"), "22,2 km | 420 m");
    assert_eq!(distance_label(12.0, None, "D+"), "12 km");
    assert_eq!(distance_label(12.0, Some(0.0), "D+"), "12 km");
    assert_eq!(distance_label(0.0, None, "D+"), "0 km");
}

#[test]
fn test_stage_popup_fills_every_field() {
    let html = stage_popup(DEFAULT_STAGE_POPUP, &record(), "22,2 km | 420 D+");
    assert!(html.contains("Day 1"));
    assert!(html.contains("5 March 2023"));
    assert!(html.contains("Frances"));
    assert!(html.contains("Sarria"));
    assert!(html.contains("Portomarin"));
    assert!(html.contains("22,2 km | 420 D+"));
    assert!(html.contains("5h 45min 00sec"));
    assert!(html.contains("Rainy"));
    assert!(html.contains("https://example.com/day-1"));
    assert!(html.contains("https://media.example.com/day1.jpg"));
    assert!(!html.contains('{'));
}

#[test]
fn test_stage_popup_strips_blog_link_line() {
    let mut unlinked = record();
    unlinked.narrative_link = "draft".to_string();

    let html = stage_popup(DEFAULT_STAGE_POPUP, &unlinked, "22,2 km");
    assert!(!html.contains("Blog Post"));
    assert!(!html.contains("draft"));

    // The stripped line matches the template constant verbatim
    assert!(DEFAULT_STAGE_POPUP.contains(BLOG_LINK_HTML));
}

#[test]
fn test_stamp_popup_substitution() {
    let stamp = StampRecord {
        date: "7.4.2023".to_string(),
        date_display: "7 April 2023".to_string(),
        place: "Melide".to_string(),
        location: "Albergue".to_string(),
        category: "Frances".to_string(),
        lat: 42.9147,
        lon: -8.0156,
        note: "Octopus for lunch".to_string(),
        link: "https://example.com/melide".to_string(),
        photo_ref: "https://media.example.com/melide.jpg".to_string(),
    };
    let html = stamp_popup(DEFAULT_STAMP_POPUP, &stamp);
    assert!(html.contains("Melide"));
    assert!(html.contains("7 April 2023"));
    assert!(html.contains("Albergue"));
    assert!(html.contains("Octopus for lunch"));
    assert!(html.contains("https://example.com/melide"));
    assert!(!html.contains('{'));
}

#[test]
fn test_load_template_falls_back() {
    assert_eq!(load_template(None, "fallback").unwrap(), "fallback");
}

#[test]
fn test_load_template_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("popup.html");
    std::fs::write(&path, "<p>{title}</p>").unwrap();
    assert_eq!(
        load_template(Some(&path), "fallback").unwrap(),
        "<p>{title}</p>"
    );
}

#[test]
fn test_map_page_structure() {
    let mut bytes = Vec::new();
    write_map_html(&document(), &mut bytes).unwrap();
    let html = String::from_utf8(bytes).unwrap();

    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("leaflet@1.9.4"));
    assert!(html.contains(".leaflet-interactive:focus { outline: none; }"));
    assert!(html.contains("L.map(\"map\").setView([20, 5], 7);"));
    assert!(html.contains("base0.addTo(map);"));
    assert!(html.contains("https://tiles.example.com/{z}/{x}/{y}.png"));
    assert!(html.contains("L.control.layers(baseLayers, overlays, { position: \"topright\", collapsed: true })"));
}

#[test]
fn test_map_page_legend_span_carries_group_color() {
    let mut bytes = Vec::new();
    write_map_html(&document(), &mut bytes).unwrap();
    let html = String::from_utf8(bytes).unwrap();

    assert!(html.contains("color: red;"));
    assert!(html.contains("Frances"));
    assert!(html.contains("group0 = L.featureGroup().addTo(map);"));
}

#[test]
fn test_map_page_features() {
    let mut bytes = Vec::new();
    write_map_html(&document(), &mut bytes).unwrap();
    let html = String::from_utf8(bytes).unwrap();

    // Marker with custom icon, attached to its group
    assert!(html.contains("L.marker([42.5, -3.5], { icon: icon0 }).addTo(group0);"));
    assert!(html.contains("iconSize: [32, 32]"));
    assert!(html.contains("popupAnchor: [0, -16]"));

    // Polyline with styling
    assert!(html.contains("L.polyline([[42.0,-4.0],[42.1,-4.1]]"));
    assert!(html.contains("weight: 4"));

    // Ungrouped marker lands on the map root
    assert!(html.contains("L.marker([41, -2], { icon: icon1 }).addTo(map);"));
}

#[test]
fn test_map_page_popup_is_escaped_into_iframe() {
    let mut bytes = Vec::new();
    write_map_html(&document(), &mut bytes).unwrap();
    let html = String::from_utf8(bytes).unwrap();

    // Popup HTML never appears raw, only escaped inside the iframe srcdoc
    assert!(html.contains("&lt;b&gt;popup&lt;/b&gt;"));
    assert!(html.contains("bindTooltip"));
    assert!(html.contains("srcdoc"));
}
