pub mod aggregate;
pub mod config;
pub mod loader;
pub mod matcher;
pub mod record;

use aggregate::{AggregateError, DisplayFrame, StatePolicy, YearIndex, YearRange};
use config::{AtlasConfig, ConfigError};
use loader::{LoadError, RawTable};
use matcher::{LocationIndex, MatchError, MatchReport};
use record::{InstallationRecord, NormalizeError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Directory holding `settings.json`.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "csolar", "Community Solar Atlas")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".csolar"))
}

/// Installation records joined to coordinates once, ready to be framed by year.
#[derive(Debug, Clone)]
pub struct Atlas {
    index: YearIndex,
    policy: StatePolicy,
    report: MatchReport,
}

impl Atlas {
    /// Loads both tables named by `config` and runs normalization and matching.
    pub fn load(config: &AtlasConfig) -> Result<Self, AtlasError> {
        let range = config.year_range()?;
        let installations = loader::load_installations(&config.installations_path)?;
        let lookup = loader::load_lookup(&config.lookup_path)?;
        Self::from_tables(&installations, &lookup, range, config.state_policy)
    }

    pub fn from_tables(
        installations: &RawTable,
        lookup: &RawTable,
        range: YearRange,
        policy: StatePolicy,
    ) -> Result<Self, AtlasError> {
        let mut records = record::normalize(installations)?;
        let locations = LocationIndex::build(lookup)?;
        let report = matcher::match_coordinates(&mut records, &locations);

        Ok(Self {
            index: YearIndex::new(records, range),
            policy,
            report,
        })
    }

    pub fn frame(&self, year: i32) -> Result<DisplayFrame, AtlasError> {
        Ok(self.index.frame(year, self.policy)?)
    }

    pub fn timeline(&self) -> Result<Vec<DisplayFrame>, AtlasError> {
        Ok(self.index.timeline(self.policy)?)
    }

    /// Records sorted by year.
    pub fn records(&self) -> &[InstallationRecord] {
        self.index.records()
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &InstallationRecord> {
        self.records().iter().filter(|r| r.coordinates().is_none())
    }

    pub fn match_report(&self) -> MatchReport {
        self.report
    }

    pub fn year_range(&self) -> YearRange {
        self.index.range()
    }

    pub fn policy(&self) -> StatePolicy {
        self.policy
    }
}
