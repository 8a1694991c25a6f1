// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::loader::{
    RawTable, COL_CITY, COL_DATASET_YEAR, COL_INTERCONNECTION_YEAR, COL_PROJECT_NAME, COL_STATE,
    COL_SYSTEM_SIZE, COL_UTILITY,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallationRecord {
    pub project_name: Option<String>,
    pub utility: Option<String>,
    /// Year of interconnection.
    pub year: i32,
    /// Vintage of the dataset the row came from.
    pub dataset_year: Option<i32>,
    pub state: String,
    pub city: String,
    pub capacity_kw: f64,
    coordinates: Option<Coordinates>,
}

impl InstallationRecord {
    pub fn new(year: i32, state: &str, city: &str, capacity_kw: f64) -> Self {
        Self {
            project_name: None,
            utility: None,
            year,
            dataset_year: None,
            state: state.to_string(),
            city: city.to_string(),
            capacity_kw,
            coordinates: None,
        }
    }

    pub fn capacity_kw(&self) -> f64 {
        self.capacity_kw
    }

    pub fn capacity_mw(&self) -> f64 {
        self.capacity_kw / 1000.0
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn lat(&self) -> Option<f64> {
        self.coordinates.map(|c| c.lat)
    }

    pub fn lng(&self) -> Option<f64> {
        self.coordinates.map(|c| c.lng)
    }

    pub(crate) fn attach_coordinates(&mut self, coordinates: Coordinates) {
        self.coordinates = Some(coordinates);
    }
}

fn or_none<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "None".to_string())
}

impl fmt::Display for InstallationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, Year: {}, State: {}, City: {}, Capacity: {}, DS Year: {}, Lat: {}, Lng: {}",
            or_none(&self.project_name),
            self.year,
            self.state,
            self.city,
            self.capacity_kw,
            or_none(&self.dataset_year),
            or_none(&self.lat()),
            or_none(&self.lng()),
        )
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("Installation table has no '{0}' column")]
    MissingColumn(String),
    #[error("Row {row}: invalid {column} value '{value}'")]
    InvalidField {
        row: usize,
        column: String,
        value: String,
    },
}

struct Columns {
    city: usize,
    state: usize,
    size: usize,
    year: usize,
    project_name: Option<usize>,
    utility: Option<usize>,
    dataset_year: Option<usize>,
}

impl Columns {
    fn locate(table: &RawTable) -> Result<Self, NormalizeError> {
        let required = |name: &str| {
            table
                .column(name)
                .ok_or_else(|| NormalizeError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            city: required(COL_CITY)?,
            state: required(COL_STATE)?,
            size: required(COL_SYSTEM_SIZE)?,
            year: required(COL_INTERCONNECTION_YEAR)?,
            project_name: table.column(COL_PROJECT_NAME),
            utility: table.column(COL_UTILITY),
            dataset_year: table.column(COL_DATASET_YEAR),
        })
    }
}

/// Accepts "2015" and integral floats such as "2015.0".
pub fn parse_year(raw: &str) -> Option<i32> {
    let t = raw.trim();
    if let Ok(y) = t.parse::<i32>() {
        return Some(y);
    }
    let f = t.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Finite decimal number; "nan" and "inf" are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn optional_text(row: &[String], idx: Option<usize>) -> Option<String> {
    idx.map(|i| cell(row, i))
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}

/// Maps every installation row to a typed record, keeping input order.
///
/// State and city are copied as-is; they are join keys and must stay byte-exact.
/// Any unparsable year or capacity fails the whole table.
pub fn normalize(table: &RawTable) -> Result<Vec<InstallationRecord>, NormalizeError> {
    let cols = Columns::locate(table)?;
    let mut records = Vec::with_capacity(table.len());

    for (i, row) in table.rows.iter().enumerate() {
        let invalid = |column: &str, value: &str| NormalizeError::InvalidField {
            row: i + 1,
            column: column.to_string(),
            value: value.to_string(),
        };

        let year_raw = cell(row, cols.year);
        let year = parse_year(year_raw).ok_or_else(|| invalid(COL_INTERCONNECTION_YEAR, year_raw))?;

        let size_raw = cell(row, cols.size);
        let capacity_kw = parse_number(size_raw).ok_or_else(|| invalid(COL_SYSTEM_SIZE, size_raw))?;

        let dataset_year = match optional_text(row, cols.dataset_year) {
            Some(raw) => Some(parse_year(&raw).ok_or_else(|| invalid(COL_DATASET_YEAR, &raw))?),
            None => None,
        };

        records.push(InstallationRecord {
            project_name: optional_text(row, cols.project_name),
            utility: optional_text(row, cols.utility),
            year,
            dataset_year,
            state: cell(row, cols.state).to_string(),
            city: cell(row, cols.city).to_string(),
            capacity_kw,
            coordinates: None,
        });
    }

    Ok(records)
}
