//! stagemap CLI - Snapshot-driven stage map and table generator
//!
//! Usage:
//!   stagemap-cli run [--rebuild] [--no-publish]
//!   stagemap-cli sync [--rebuild]
//!   stagemap-cli inspect
//!
//! Reads the stage snapshot named by the settings file, reconciles the
//! SQLite store against it and renders the map, table and summary
//! artifacts. `sync` stops after the store reconciliation; `inspect`
//! prints what the store currently holds.

use clap::{Parser, Subcommand};
use stagemap::{DirPublisher, Pipeline, Publisher, ReconciliationStore, Settings};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "stagemap-cli")]
#[command(about = "Stage map and table generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file for this run
    #[arg(short, long, global = true, default_value = "settings.json")]
    settings: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Full run: sync the store, render and publish every artifact
    Run {
        /// Drop and recreate the store before syncing
        #[arg(long)]
        rebuild: bool,

        /// Render locally without handing artifacts to the publisher
        #[arg(long)]
        no_publish: bool,
    },

    /// Reconcile the store against the snapshot, nothing else
    Sync {
        /// Drop and recreate the store before syncing
        #[arg(long)]
        rebuild: bool,
    },

    /// Show what the store currently holds
    Inspect,
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            rebuild,
            no_publish,
        } => run_pipeline(&cli.settings, rebuild, no_publish),
        Commands::Sync { rebuild } => run_sync(&cli.settings, rebuild),
        Commands::Inspect => run_inspect(&cli.settings),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Full pipeline run
fn run_pipeline(settings_path: &Path, rebuild: bool, no_publish: bool) -> stagemap::Result<()> {
    let settings = Settings::load(settings_path)?;
    let blog_page = settings.blog_page.clone();
    let mut publisher = DirPublisher::new(settings.publish_dir.clone());
    let publisher_opt: Option<&mut dyn Publisher> = if no_publish {
        None
    } else {
        Some(&mut publisher)
    };

    let pipeline = Pipeline::new(settings);
    let report = pipeline.run(rebuild, publisher_opt)?;

    println!(
        "\nSync: {} inserted, {} updated, {} deleted",
        report.sync.inserted, report.sync.updated, report.sync.deleted
    );
    println!(
        "Totals: {} stages, {} stamps, {:.1} km, {:.0} m D+",
        report.totals.stages,
        report.totals.stamps,
        report.totals.distance_km,
        report.totals.elevation_gain_m
    );
    println!("Artifacts: {}", report.artifacts.join(", "));
    if !report.table_rendered {
        println!("Table was skipped (template missing or without marker)");
    }

    if no_publish {
        println!("Publishing skipped");
    } else if report.published {
        if blog_page.is_empty() {
            println!("Published.");
        } else {
            println!("Published. Check the results at {}", blog_page);
        }
    } else {
        println!("Skipping page announcement, publishing failed.");
    }
    Ok(())
}

/// Store reconciliation only
fn run_sync(settings_path: &Path, rebuild: bool) -> stagemap::Result<()> {
    let settings = Settings::load(settings_path)?;
    let pipeline = Pipeline::new(settings);
    let report = pipeline.sync(rebuild)?;

    if report.is_noop() {
        println!("Store already matches the snapshot");
    } else {
        println!(
            "Sync: {} inserted, {} updated, {} deleted",
            report.inserted, report.updated, report.deleted
        );
    }
    Ok(())
}

/// Print the store contents
fn run_inspect(settings_path: &Path) -> stagemap::Result<()> {
    let settings = Settings::load(settings_path)?;
    let store = ReconciliationStore::open(&settings.db_path)?;
    let stats = store.stats()?;
    println!(
        "Store: {} ({} rows, {} columns)",
        settings.db_path.display(),
        stats.rows,
        stats.columns
    );

    for record in store.load_all()? {
        let track = record
            .track_ref
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<12} {:<28} {:<14} {:>7.1} km  {}",
            record.date, record.title, record.category, record.distance_km, track
        );
    }
    Ok(())
}
