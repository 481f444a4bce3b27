//! # Stage Table
//!
//! Renders the stage overview fragment by inserting one table row per record
//! at a marker inside the page template, plus the totals summary fragment.
//! The marker survives in the output so the rendered page can serve as the
//! next template.

use crate::render;
use crate::{EventRecord, RunTotals};

/// Insertion point the table template must carry.
pub const TABLE_MARKER: &str = "<!--InsertNewStage-->";

/// Render the stage table into the template.
///
/// Rows keep snapshot order. A full-width separator row is inserted whenever
/// the year changes between consecutive records, never before the first one.
/// Returns `None` when the template has no insertion marker.
pub fn render_table(template: &str, records: &[EventRecord]) -> Option<String> {
    if !template.contains(TABLE_MARKER) {
        log::warn!("[Table] Insertion marker not found in template, skipping table");
        return None;
    }

    let mut rows = String::new();
    let mut current_year: Option<&str> = None;

    for record in records {
        let year = record.date.split('.').last().unwrap_or_default();
        if let Some(previous) = current_year {
            if previous != year {
                rows.push_str("    <tr>\n");
                rows.push_str("        <td class=\"tg-d1kj\" colspan=\"5\"></td>\n");
                rows.push_str("    </tr>\n");
            }
        }
        current_year = Some(year);

        rows.push_str("    <tr>\n");
        rows.push_str(&format!(
            "        <td class=\"tg-yw4l\">{}<br />\n",
            record.date
        ));
        if render::is_absolute_url(&record.narrative_link) {
            rows.push_str(&format!(
                "        <a href=\"{}\" target=\"_blank\"><i><u>Review</u></i></a></td>\n",
                record.narrative_link
            ));
        } else {
            rows.push_str("        </td>\n");
        }
        rows.push_str(&format!(
            "        <td class=\"tg-9hbo\">{}</td>\n",
            record.category
        ));
        rows.push_str(&format!(
            "        <td class=\"tg-yw4l\">{} → {}</td>\n",
            record.start_label, record.end_label
        ));
        rows.push_str(&format!(
            "        <td class=\"tg-yw4l\">{}</td>\n",
            render::distance_label(record.distance_km, record.elevation_gain_m, "m")
        ));
        rows.push_str(&format!(
            "        <td class=\"tg-yw4l\">{}</td>\n",
            record.duration
        ));
        rows.push_str("    </tr>\n");
    }

    log::info!("[Table] Rendered {} rows", records.len());
    rows.push_str(TABLE_MARKER);
    Some(template.replace(TABLE_MARKER, &rows))
}

/// Fill the summary fragment tokens from the run totals.
///
/// Distance is truncated to whole kilometers; elevation gain becomes
/// vertical kilometers rounded to two decimals with a decimal comma.
pub fn render_summary(template: &str, totals: &RunTotals) -> String {
    let vertical_km = (totals.elevation_gain_m / 1000.0 * 100.0).round() / 100.0;
    template
        .replace("<!--dist-->", &format!("{}", totals.distance_km as i64))
        .replace("<!--dplus-->", &format!("{}", vertical_km).replace('.', ","))
        .replace("<!--stages-->", &totals.stages.to_string())
        .replace("<!--stamps-->", &totals.stamps.to_string())
}
