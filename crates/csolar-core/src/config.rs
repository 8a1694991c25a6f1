// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::aggregate::{StatePolicy, YearRange};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("first_year {first} is after last_year {last}")]
    InvalidYears { first: i32, last: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub installations_path: PathBuf,
    pub lookup_path: PathBuf,
    pub first_year: i32,
    pub last_year: i32,
    pub state_policy: StatePolicy,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        let years = YearRange::default();
        Self {
            installations_path: PathBuf::from("./PowerData/FY2024.csv"),
            lookup_path: PathBuf::from("./PowerData/CityLatLng.csv"),
            first_year: years.first,
            last_year: years.last,
            state_policy: StatePolicy::default(),
        }
    }
}

impl AtlasConfig {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join(SETTINGS_FILE)
    }

    /// Missing file gives defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.year_range()?;
        Ok(config)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(io_err)
    }

    /// Command-line values win over whatever the settings file held.
    pub fn with_overrides(
        mut self,
        installations: Option<PathBuf>,
        lookup: Option<PathBuf>,
        all_states: bool,
    ) -> Self {
        if let Some(path) = installations {
            self.installations_path = path;
        }
        if let Some(path) = lookup {
            self.lookup_path = path;
        }
        if all_states {
            self.state_policy = StatePolicy::AllStates;
        }
        self
    }

    pub fn year_range(&self) -> Result<YearRange, ConfigError> {
        YearRange::new(self.first_year, self.last_year).map_err(|_| ConfigError::InvalidYears {
            first: self.first_year,
            last: self.last_year,
        })
    }
}
