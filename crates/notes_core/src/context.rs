//! Host-supplied context and database settings.
//!
//! # Responsibility
//! - Carry the long-lived location the host grants for storage and logs.
//! - Hold tunables for opening the note database.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Database file name used inside the host data directory.
pub const DEFAULT_DB_FILE_NAME: &str = "note_database";
/// Schema version of `note_table` understood by this build.
pub const NOTE_SCHEMA_VERSION: u32 = 1;

const LOG_DIR_NAME: &str = "logs";

/// Long-lived application context handed in by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    data_dir: PathBuf,
}

impl AppContext {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolves the database file path for the given config.
    pub fn database_path(&self, config: &DatabaseConfig) -> PathBuf {
        self.data_dir.join(&config.file_name)
    }

    /// Directory suggested for `init_logging`.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

/// What to do when the stored schema version differs from the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MigrationPolicy {
    /// Drop `note_table` and recreate it empty.
    #[default]
    Destructive,
    /// Refuse to open and report `DbError::SchemaVersionMismatch`.
    FailOnMismatch,
}

/// Settings used when opening a `NoteDatabase`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub file_name: String,
    pub schema_version: u32,
    pub migration_policy: MigrationPolicy,
    /// Populate example rows when the table is created for the first time.
    pub seed_on_create: bool,
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_DB_FILE_NAME.to_string(),
            schema_version: NOTE_SCHEMA_VERSION,
            migration_policy: MigrationPolicy::Destructive,
            seed_on_create: true,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppContext, DatabaseConfig, MigrationPolicy, NOTE_SCHEMA_VERSION};
    use std::path::Path;

    #[test]
    fn context_resolves_paths_under_data_dir() {
        let context = AppContext::new("/data/app");
        let config = DatabaseConfig::default();
        assert_eq!(
            context.database_path(&config),
            Path::new("/data/app/note_database")
        );
        assert_eq!(context.log_dir(), Path::new("/data/app/logs"));
    }

    #[test]
    fn default_config_is_destructive_and_seeds() {
        let config = DatabaseConfig::default();
        assert_eq!(config.schema_version, NOTE_SCHEMA_VERSION);
        assert_eq!(config.migration_policy, MigrationPolicy::Destructive);
        assert!(config.seed_on_create);
    }
}
