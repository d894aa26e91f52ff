//! Merge configuration file

use crate::error::{Error, Result};
use crate::names::{NameException, NameNormalizer};
use crate::profile::ProfileKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TABLE: &str = "pokemon.stats.txt";
pub const DEFAULT_ABILITIES: &str = "abilities.names.txt";
pub const DEFAULT_OVERRIDES: &str = "custom_pokemon.json";
pub const DEFAULT_OUTPUT: &str = "balance_patch.tfl";

/// Inputs, output, and format settings for one merge run.
///
/// Every field is optional in the JSON file; missing fields take the
/// defaults, which name files in the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Format profile of the reference table
    pub profile: ProfileKind,
    /// Reference table (pokemon.stats)
    pub table: PathBuf,
    /// Ability enumeration file
    pub abilities: PathBuf,
    /// Override source (JSON)
    pub overrides: PathBuf,
    /// Destination script
    pub output: PathBuf,
    /// Name substitutions applied after the built-in ones
    pub name_exceptions: Vec<NameException>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            profile: ProfileKind::default(),
            table: PathBuf::from(DEFAULT_TABLE),
            abilities: PathBuf::from(DEFAULT_ABILITIES),
            overrides: PathBuf::from(DEFAULT_OVERRIDES),
            output: PathBuf::from(DEFAULT_OUTPUT),
            name_exceptions: Vec::new(),
        }
    }
}

impl MergeConfig {
    /// Load a config file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save the config file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Name normalizer with the configured extra exceptions
    pub fn name_normalizer(&self) -> NameNormalizer {
        NameNormalizer::default().with_exceptions(self.name_exceptions.iter().cloned())
    }
}
