//! # Pipeline
//!
//! End-to-end run: read the snapshot, reconcile the store, sample the
//! tracks, assemble and render the artifacts, then hand them to a
//! [`Publisher`]. Rendering failures abort the run; a failing publisher
//! does not, it only clears the `published` flag in the report.

use crate::config::Settings;
use crate::error::Result;
use crate::map;
use crate::normalize;
use crate::render::{self, PopupTemplates};
use crate::store::{ReconciliationStore, SyncReport};
use crate::table;
use crate::track;
use crate::{EventRecord, GpsPoint, RunTotals, StampRecord};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Publishing
// ============================================================================

/// One rendered output, ready to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    fn new(path: &Path, bytes: Vec<u8>) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, bytes }
    }
}

/// Destination for rendered artifacts.
pub trait Publisher {
    fn publish(&mut self, artifact: &Artifact) -> Result<()>;
}

/// Publisher that copies artifacts into a local directory.
pub struct DirPublisher {
    root: PathBuf,
}

impl DirPublisher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Publisher for DirPublisher {
    fn publish(&mut self, artifact: &Artifact) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let target = self.root.join(&artifact.name);
        fs::write(&target, &artifact.bytes)?;
        log::info!("[Pipeline] Published {}", target.display());
        Ok(())
    }
}

// ============================================================================
// Run Report
// ============================================================================

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Store changes applied by the snapshot sync.
    pub sync: SyncReport,
    /// Totals accumulated while assembling the map.
    pub totals: RunTotals,
    /// Names of the artifacts written this run.
    pub artifacts: Vec<String>,
    /// Whether the stage table could be rendered.
    pub table_rendered: bool,
    /// Whether every artifact reached the publisher.
    pub published: bool,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Drives one full snapshot-to-site run from a [`Settings`] value.
pub struct Pipeline {
    settings: Settings,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Reconcile the store against the snapshot without rendering anything.
    pub fn sync(&self, rebuild: bool) -> Result<SyncReport> {
        let records = self.load_stages()?;
        let mut store = self.open_store(rebuild)?;
        store.sync(&records)
    }

    /// Full run: sync, render every artifact, write the local outputs and
    /// hand them to the publisher when one is given.
    pub fn run(&self, rebuild: bool, publisher: Option<&mut dyn Publisher>) -> Result<RunReport> {
        let settings = &self.settings;

        let records = self.load_stages()?;
        let stamps = self.load_stamps()?;

        let mut store = self.open_store(rebuild)?;
        let sync = store.sync(&records)?;

        let tracks = self.sample_tracks(&records)?;
        let templates = PopupTemplates::load(settings)?;
        let (document, totals) = map::assemble_map(&records, &tracks, &stamps, &templates, settings)?;

        let mut artifacts: Vec<Artifact> = Vec::new();

        let mut map_bytes = Vec::new();
        render::write_map_html(&document, &mut map_bytes)?;
        write_output(&settings.map_html, &map_bytes)?;
        artifacts.push(Artifact::new(&settings.map_html, map_bytes));

        let table_html = self.render_table(&records);
        let table_rendered = table_html.is_some();
        if let Some(html) = table_html {
            write_output(&settings.table_html, html.as_bytes())?;
            artifacts.push(Artifact::new(&settings.table_html, html.into_bytes()));
        }

        let summary_template =
            render::load_template(settings.summary_template.as_deref(), render::DEFAULT_SUMMARY_TEMPLATE)?;
        let summary = table::render_summary(&summary_template, &totals);
        write_output(&settings.summary_html, summary.as_bytes())?;
        artifacts.push(Artifact::new(&settings.summary_html, summary.into_bytes()));

        // The stylesheet is published as-is next to the table.
        match fs::read(&settings.table_css) {
            Ok(css) => artifacts.push(Artifact::new(&settings.table_css, css)),
            Err(err) => log::warn!(
                "[Pipeline] Cannot read stylesheet {}: {}. Skipping it.",
                settings.table_css.display(),
                err
            ),
        }

        let published = match publisher {
            Some(publisher) => publish_all(publisher, &artifacts),
            None => false,
        };
        if published {
            if settings.blog_page.is_empty() {
                log::info!("[Pipeline] All artifacts published");
            } else {
                log::info!("[Pipeline] All artifacts published, page at {}", settings.blog_page);
            }
        }

        Ok(RunReport {
            sync,
            totals,
            artifacts: artifacts.into_iter().map(|a| a.name).collect(),
            table_rendered,
            published,
        })
    }

    fn load_stages(&self) -> Result<Vec<EventRecord>> {
        let rows = normalize::read_stage_rows(&self.settings.events_csv)?;
        normalize::normalize_stages(&rows, &self.settings)
    }

    fn load_stamps(&self) -> Result<Vec<StampRecord>> {
        match &self.settings.stamps_csv {
            Some(path) => {
                let rows = normalize::read_stamp_rows(path)?;
                normalize::normalize_stamps(&rows, &self.settings)
            }
            None => Ok(Vec::new()),
        }
    }

    fn open_store(&self, rebuild: bool) -> Result<ReconciliationStore> {
        let store = ReconciliationStore::open(&self.settings.db_path)?;
        if rebuild {
            store.rebuild()?;
        }
        Ok(store)
    }

    /// Sampled point sequence per record, parallel to the input slice.
    fn sample_tracks(&self, records: &[EventRecord]) -> Result<Vec<Option<Vec<GpsPoint>>>> {
        records
            .iter()
            .map(|record| match &record.track_ref {
                Some(path) => track::sample_track(path, self.settings.track_stride),
                None => Ok(None),
            })
            .collect()
    }

    fn render_table(&self, records: &[EventRecord]) -> Option<String> {
        let template = match fs::read_to_string(&self.settings.table_template) {
            Ok(template) => template,
            Err(err) => {
                log::warn!(
                    "[Pipeline] Cannot read table template {}: {}. Skipping table.",
                    self.settings.table_template.display(),
                    err
                );
                return None;
            }
        };
        table::render_table(&template, records)
    }
}

/// Write one rendered output, creating its parent directory when needed.
fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    log::info!("[Pipeline] Wrote {}", path.display());
    Ok(())
}

fn publish_all(publisher: &mut dyn Publisher, artifacts: &[Artifact]) -> bool {
    let mut all_ok = true;
    for artifact in artifacts {
        if let Err(err) = publisher.publish(artifact) {
            log::warn!("[Pipeline] Publishing {} failed: {}", artifact.name, err);
            all_ok = false;
        }
    }
    all_ok
}
