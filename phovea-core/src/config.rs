use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "phovea.toml";
/// Environment variable pointing at a config file, bypassing the lookup.
pub const CONFIG_PATH_ENV: &str = "PHOVEA_CONFIG_PATH";
pub const DEFAULT_DATA_DIR: &str = "_data";
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Where assigned identifiers are kept.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssignerKind {
    /// In-process only, lost on exit.
    #[default]
    Memory,
    /// JSON document in the data directory.
    File,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory for persisted state, relative paths are resolved against
    /// the directory holding the config file
    data_dir: PathBuf,
    assigner: AssignerKind,
    /// Default maximum number of hits returned by an id search
    search_limit: usize,
    #[serde(skip)]
    root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            assigner: AssignerKind::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            root: None,
        }
    }
}

/// Walks up from `start_dir` until a directory containing the config file is found.
fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir;
    log::debug!("Searching for {} starting from {}", CONFIG_FILE_NAME, dir.display());

    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

impl Config {
    pub fn new(data_dir: impl AsRef<Path>, assigner: AssignerKind) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            assigner,
            ..Self::default()
        }
    }

    pub fn save(&self, directory: impl AsRef<Path>) -> Result<()> {
        let config_path = directory.as_ref().join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(&self)?;
        fs::write(&config_path, content)?;
        log::info!("Configuration saved to {}", config_path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.root = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Locate and load the config for `current_directory`.
    ///
    /// `PHOVEA_CONFIG_PATH` wins over the directory walk. Returns `None` when
    /// no config file exists.
    pub fn find(current_directory: impl AsRef<Path>) -> Option<Result<Self>> {
        let from_env = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::find_with_override(current_directory, from_env)
    }

    fn find_with_override(
        current_directory: impl AsRef<Path>,
        override_path: Option<PathBuf>,
    ) -> Option<Result<Self>> {
        let config_path = match override_path {
            Some(path) => path,
            None => find_config_file(current_directory.as_ref())?,
        };
        log::debug!("Loading config from {}", config_path.display());
        Some(Self::load(&config_path))
    }

    pub fn assigner(&self) -> AssignerKind {
        self.assigner
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit
    }

    pub fn data_dir(&self) -> PathBuf {
        match &self.root {
            Some(root) if self.data_dir.is_relative() => root.join(&self.data_dir),
            _ => self.data_dir.clone(),
        }
    }
}
