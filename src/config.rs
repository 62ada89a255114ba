//! Configuration file handling.
//!
//! The configuration file is stored at `$FINNY_HOME/config.json`. It holds the settings that shape
//! the statistics commands, such as the default time range and how often `finny watch` re-reads the
//! store, and optionally where the SQLite file lives.

use crate::db::Db;
use crate::model::TimeRange;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "finny";
const CONFIG_VERSION: u8 = 1;
const POLL_INTERVAL_SECS: u64 = 15;
const CONFIG_JSON: &str = "config.json";
const FINNY_SQLITE: &str = "finny.sqlite";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINNY_HOME` and from there it loads `$FINNY_HOME/config.json` and opens the
/// database.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the data directory, writes an initial `config.json` with default settings and
    /// creates an empty database.
    ///
    /// # Errors
    /// - Returns an error if `dir` already holds a `config.json`.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the finny home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "finny is already set up here, the config file exists at '{}'",
                config_path.display()
            );
        }
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let sqlite_path = config_file.sqlite_path(&root);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that `finny_home` exists and that the config file exists
    /// - load the config file
    /// - open the database, migrating it if needed
    pub async fn load(finny_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = finny_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The finny home directory is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = config_file.sqlite_path(&root);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    /// How long `finny watch` waits between reads when nothing has told it about a change.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config_file.poll_interval_secs)
    }

    /// The range used when a command is not given one.
    pub fn default_range(&self) -> TimeRange {
        self.config_file.default_range
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "finny",
///   "config_version": 1,
///   "poll_interval_secs": 15,
///   "default_range": "6months",
///   "sqlite_path": "data/finny.sqlite"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "finny"
    app_name: String,

    config_version: u8,

    #[serde(default = "default_poll_interval_secs")]
    poll_interval_secs: u64,

    #[serde(default)]
    default_range: TimeRange,

    /// Where the SQLite file lives, relative to `$FINNY_HOME` or absolute. Defaults to
    /// `$FINNY_HOME/finny.sqlite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sqlite_path: Option<PathBuf>,
}

fn default_poll_interval_secs() -> u64 {
    POLL_INTERVAL_SECS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            poll_interval_secs: POLL_INTERVAL_SECS,
            default_range: TimeRange::default(),
            sqlite_path: None,
        }
    }
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version <= CONFIG_VERSION,
            "The config file has version {} but this program only understands up to version {}",
            config.config_version,
            CONFIG_VERSION
        );
        ensure!(
            config.poll_interval_secs > 0,
            "poll_interval_secs must be at least 1"
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    fn sqlite_path(&self, root: &Path) -> PathBuf {
        match &self.sqlite_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(FINNY_SQLITE),
        }
    }
}
