//! Schema detection and upgrade
//!
//! A store is in exactly one of three states when it is opened:
//!
//! - `Uninitialized`: no tables at all (new file)
//! - `LegacyUnversioned`: a `paths` table but no `settings` table
//! - `Versioned(v)`: a `settings` table carrying `schema_version = v`
//!
//! Every transition ends at [`CURRENT_SCHEMA_VERSION`] and may be re-run
//! against an already migrated store without changing it.

use std::fmt;
use std::path::Path;
use crate::confirm::Confirm;
use crate::settings::{CURRENT_SCHEMA_VERSION, SettingKey};
use crate::{Error, Result};
use super::schema;
use super::sqlite::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    Uninitialized,
    LegacyUnversioned,
    Versioned(i64),
}

impl fmt::Display for SchemaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaState::Uninitialized => f.write_str("uninitialized"),
            SchemaState::LegacyUnversioned => f.write_str("legacy (unversioned)"),
            SchemaState::Versioned(v) => write!(f, "version {v}"),
        }
    }
}

pub const LEGACY_UPGRADE_PROMPT: &str = "Database schema update required.\n\
This will add category support and settings to your existing data.\n\
Existing paths will be assigned to 'Uncategorized'.\n\
Proceed with migration?";

/// Open a database file and bring its schema up to date.
///
/// Returns the state the file was in before migration. When the user
/// declines a legacy upgrade the connection is closed and the file is left
/// exactly as it was.
pub fn open_and_migrate(path: &Path, confirm: &mut dyn Confirm) -> Result<(SqliteStore, SchemaState)> {
    let mut store = SqliteStore::connect(path)?;
    let state = SchemaMigrator::new(&mut store).run(confirm)?;
    Ok((store, state))
}

pub struct SchemaMigrator<'a> {
    store: &'a mut SqliteStore,
}

impl<'a> SchemaMigrator<'a> {
    pub fn new(store: &'a mut SqliteStore) -> Self {
        Self { store }
    }

    /// Inspect the store without modifying it
    pub fn detect(&self) -> Result<SchemaState> {
        if self.store.table_exists("settings")? {
            let version = self.store.get_int_setting(SettingKey::SchemaVersion.as_str(), 0)?;
            return Ok(SchemaState::Versioned(version));
        }
        if self.store.table_exists("paths")? {
            return Ok(SchemaState::LegacyUnversioned);
        }
        Ok(SchemaState::Uninitialized)
    }

    /// Detect the current state and apply the matching transition
    pub fn run(&mut self, confirm: &mut dyn Confirm) -> Result<SchemaState> {
        let state = self.detect()?;
        tracing::debug!(%state, "detected schema state");

        match state {
            SchemaState::Uninitialized => self.initialize()?,
            SchemaState::LegacyUnversioned => {
                if !confirm.confirm(LEGACY_UPGRADE_PROMPT) {
                    tracing::info!("legacy upgrade declined");
                    return Err(Error::MigrationDeclined);
                }
                self.upgrade_legacy()?;
            }
            SchemaState::Versioned(v) if v > CURRENT_SCHEMA_VERSION => {
                return Err(Error::UnsupportedSchemaVersion {
                    found: v,
                    supported: CURRENT_SCHEMA_VERSION,
                });
            }
            SchemaState::Versioned(v) if v < CURRENT_SCHEMA_VERSION => {
                // A settings table without a usable version: finish the v1 layout.
                tracing::info!(from = v, "completing schema");
                self.initialize()?;
            }
            SchemaState::Versioned(_) => {}
        }

        Ok(state)
    }

    /// `Uninitialized -> Versioned(1)`
    fn initialize(&mut self) -> Result<()> {
        tracing::info!("initializing schema version {}", CURRENT_SCHEMA_VERSION);
        self.in_transaction(|store| {
            store.create_schema()?;
            store.seed_defaults()?;
            store.set_int_setting(SettingKey::SchemaVersion.as_str(), CURRENT_SCHEMA_VERSION)
        })
    }

    /// `LegacyUnversioned -> Versioned(1)`
    fn upgrade_legacy(&mut self) -> Result<()> {
        tracing::info!("upgrading legacy database");
        self.in_transaction(|store| {
            store.create_schema()?;
            store.seed_defaults()?;
            let assigned = store.assign_all_paths(schema::UNCATEGORIZED)?;
            tracing::info!(assigned, "legacy paths assigned to {}", schema::UNCATEGORIZED);
            store.set_int_setting(SettingKey::SchemaVersion.as_str(), CURRENT_SCHEMA_VERSION)
        })
    }

    fn in_transaction(&mut self, work: impl FnOnce(&SqliteStore) -> Result<()>) -> Result<()> {
        self.store.begin_transaction()?;
        match work(&*self.store) {
            Ok(()) => self.store.commit(),
            Err(e) => {
                if let Err(rollback) = self.store.rollback() {
                    tracing::warn!("rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }
}
