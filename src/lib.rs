//! Check-in/check-out desk for travel groups.
//!
//! Segment records (arrival, departure and cruise legs) are stored in SQLite
//! and reconciled into a per-person roster. [`Desk`] wires the store, the
//! settings file and the [`DeskController`] together for one data directory.

pub mod db;
pub mod desk;
pub mod error;
pub mod roster;
pub mod settings;
pub mod utils;

use std::{path::Path, sync::Arc};

use anyhow::Context;

pub use db::{
    Database, FlagChange, FlagGroup, Person, SegmentKind, SegmentPatch, SegmentRecord,
    SegmentSnapshot, SegmentStore, TravelSegment,
};
pub use desk::{DeskController, MatchOutcome, MatchedBy, NewIndividual, PhotoSync, RefreshOutcome};
pub use error::{Error, Result};
pub use roster::{
    filter_departures_for_display, group_by_flight, reconcile, reconcile_with, roster_stats,
    Roster, RosterConfig, RosterStats,
};
pub use settings::{DeskSettings, SettingsStore};

pub const DB_FILE_NAME: &str = "tripdesk.sqlite3";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Install the process-wide logger (reads `RUST_LOG`). Safe to call twice.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

pub struct Desk {
    db: Database,
    controller: DeskController<Database>,
    settings: SettingsStore,
}

impl Desk {
    /// Open (or create) the database and settings under `data_dir` and load
    /// the roster.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let db_path = data_dir.join(DB_FILE_NAME);
        let database = tokio::task::spawn_blocking(move || Database::new(db_path))
            .await
            .context("database open task panicked")??;

        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))
            .map_err(|err| Error::Config(format!("{err:#}")))?;

        let controller = DeskController::new(Arc::new(database.clone()), settings.roster_config());
        controller.refresh().await?;

        log::info!("Desk opened at {}", data_dir.display());

        Ok(Self {
            db: database,
            controller,
            settings,
        })
    }

    pub fn controller(&self) -> &DeskController<Database> {
        &self.controller
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Persist new reconciliation switches and re-derive the roster with them.
    pub async fn set_roster_config(&self, config: RosterConfig) -> Result<()> {
        self.settings
            .update_roster_config(config.clone())
            .map_err(|err| Error::Config(format!("{err:#}")))?;
        self.controller.set_config(config).await;
        Ok(())
    }
}
