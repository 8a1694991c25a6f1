// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use log::info;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const COL_PROJECT_NAME: &str = "Project Name";
pub const COL_UTILITY: &str = "Utility";
pub const COL_CITY: &str = "City";
pub const COL_STATE: &str = "State";
pub const COL_SYSTEM_SIZE: &str = "System Size (kW-AC)";
pub const COL_INTERCONNECTION_YEAR: &str = "Year of Interconnection";
pub const COL_DATASET_YEAR: &str = "Year";
pub const COL_LAT: &str = "lat";
pub const COL_LNG: &str = "lng";

pub const INSTALLATION_COLUMNS: [&str; 4] = [
    COL_CITY,
    COL_STATE,
    COL_SYSTEM_SIZE,
    COL_INTERCONNECTION_YEAR,
];
pub const LOOKUP_COLUMNS: [&str; 4] = [COL_STATE, COL_CITY, COL_LAT, COL_LNG];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse CSV {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path:?} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },
}

/// A CSV table as read from disk: header names and string cells, untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of the first header named exactly `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reads a headed CSV stream, decoding every byte as ISO-8859-1.
    ///
    /// `origin` only labels errors; nothing is read from it.
    pub fn read<R: Read>(reader: R, origin: &Path) -> Result<Self, LoadError> {
        let csv_err = |source| LoadError::Csv {
            path: origin.to_path_buf(),
            source,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = rdr
            .byte_headers()
            .map_err(csv_err)?
            .iter()
            .map(latin1)
            .collect();

        let mut rows = Vec::new();
        for result in rdr.byte_records() {
            let record = result.map_err(csv_err)?;
            rows.push(record.iter().map(latin1).collect());
        }

        Ok(Self { headers, rows })
    }

    fn read_file(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read(file, path)
    }

    fn require_columns(&self, columns: &[&str], path: &Path) -> Result<(), LoadError> {
        match columns.iter().find(|c| self.column(c).is_none()) {
            Some(missing) => Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: missing.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// ISO-8859-1 maps each byte to the code point of the same value.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Loads the installation table (one row per community solar project).
pub fn load_installations<P: AsRef<Path>>(path: P) -> Result<RawTable, LoadError> {
    let path = path.as_ref();
    let table = RawTable::read_file(path)?;
    table.require_columns(&INSTALLATION_COLUMNS, path)?;
    info!(
        "Loaded installation table — rows={} path={}",
        table.len(),
        path.display()
    );
    Ok(table)
}

/// Loads the (State, City) -> (lat, lng) lookup table.
pub fn load_lookup<P: AsRef<Path>>(path: P) -> Result<RawTable, LoadError> {
    let path = path.as_ref();
    let table = RawTable::read_file(path)?;
    table.require_columns(&LOOKUP_COLUMNS, path)?;
    info!(
        "Loaded coordinate lookup — rows={} path={}",
        table.len(),
        path.display()
    );
    Ok(table)
}
