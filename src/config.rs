// ⚙️ Run configuration
// Defaults < TOML file < environment (PBA_*) < command-line flags.
// The last two layers are applied by clap in the binary; this module owns the
// defaults and the TOML layer.

use crate::error::{Error, Result};
use crate::registry::HistoryLookup;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_PLAYER_STAT_DIR: &str = "data/pba_team_csv";
pub const DEFAULT_TEAM_STAT_DIR: &str = "data/pba_season_csv";
pub const DEFAULT_PLAYER_DESC_PATH: &str = "data/player_desc.csv";
pub const DEFAULT_DATABASE_PATH: &str = "pba.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidatorConfig {
    /// Directory of `<year>_<conf>_<team>_<AVG|TOT>.csv` files
    pub player_stat_dir: PathBuf,
    /// Directory of `<year>_<conf>_<AVG|TOT>.csv` files
    pub team_stat_dir: PathBuf,
    /// Player description CSV; `None` means every player attribute stays empty
    pub player_desc_path: Option<PathBuf>,
    pub database_path: PathBuf,
    pub history_lookup: HistoryLookup,
}

impl Default for ConsolidatorConfig {
    fn default() -> Self {
        ConsolidatorConfig {
            player_stat_dir: PathBuf::from(DEFAULT_PLAYER_STAT_DIR),
            team_stat_dir: PathBuf::from(DEFAULT_TEAM_STAT_DIR),
            player_desc_path: Some(PathBuf::from(DEFAULT_PLAYER_DESC_PATH)),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            history_lookup: HistoryLookup::default(),
        }
    }
}

impl ConsolidatorConfig {
    /// Defaults, overlaid with a TOML file when one is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                let config = Self::from_toml_str(&text)?;
                debug!(path = %path.display(), "Loaded config file");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}
