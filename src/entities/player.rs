// Player dimension + player-description reference
//
// Descriptive attributes are copied from the description source when the
// player is first resolved and are never updated afterwards.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

// ============================================================================
// PLAYER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub jersey_number: Option<String>,
    pub height: Option<String>,
    pub position: Option<String>,
}

impl Player {
    /// Player with attributes taken from an optional description
    pub fn new(id: i64, name: impl Into<String>, description: Option<&PlayerDescription>) -> Self {
        Player {
            id,
            name: name.into(),
            jersey_number: description.and_then(|d| d.jersey_number.clone()),
            height: description.and_then(|d| d.height.clone()),
            position: description.and_then(|d| d.position.clone()),
        }
    }
}

// ============================================================================
// DESCRIPTION SOURCE
// ============================================================================

/// One row of the player-description CSV (`Name,j_number,height,pos`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerDescription {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "j_number", default)]
    pub jersey_number: Option<String>,

    #[serde(default)]
    pub height: Option<String>,

    #[serde(rename = "pos", default)]
    pub position: Option<String>,
}

impl PlayerDescription {
    fn cleaned(mut self) -> Self {
        self.jersey_number = non_blank(self.jersey_number);
        self.height = non_blank(self.height);
        self.position = non_blank(self.position);
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Name-keyed lookup over the description source, loaded once per run
#[derive(Debug, Default, Clone)]
pub struct PlayerDirectory {
    entries: HashMap<String, PlayerDescription>,
}

impl PlayerDirectory {
    /// Directory with no descriptions: every player resolves with null attributes
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let directory = Self::from_reader(file)?;
        debug!(
            path = %path.display(),
            players = directory.len(),
            "Loaded player descriptions"
        );
        Ok(directory)
    }

    /// Parse description rows; the first row for a given name wins
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut entries = HashMap::new();
        for result in rdr.deserialize() {
            let description: PlayerDescription = result?;
            entries
                .entry(description.name.clone())
                .or_insert_with(|| description.cleaned());
        }

        Ok(PlayerDirectory { entries })
    }

    /// Exact-name lookup
    pub fn describe(&self, name: &str) -> Option<&PlayerDescription> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
