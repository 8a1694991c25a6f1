// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::loader::{RawTable, COL_CITY, COL_LAT, COL_LNG, COL_STATE};
use crate::record::{parse_number, Coordinates, InstallationRecord};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MatchError {
    #[error("Coordinate lookup has no '{0}' column")]
    MissingColumn(String),
    #[error("Lookup row {row}: invalid {column} value '{value}'")]
    InvalidCoordinate {
        row: usize,
        column: String,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationLookupRow {
    pub state: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
}

/// (state, city) -> coordinates, built once from the lookup table.
///
/// Keys compare exactly: case-sensitive and untrimmed. When the lookup holds
/// the same key more than once, the row that appears first in the file wins.
#[derive(Debug, Clone, Default)]
pub struct LocationIndex {
    // state -> city -> coordinates; nested so lookups borrow &str keys
    by_state: HashMap<String, HashMap<String, Coordinates>>,
    len: usize,
    duplicates: usize,
    blank_keys: usize,
}

impl LocationIndex {
    pub fn build(table: &RawTable) -> Result<Self, MatchError> {
        let required = |name: &str| {
            table
                .column(name)
                .ok_or_else(|| MatchError::MissingColumn(name.to_string()))
        };
        let (state_idx, city_idx, lat_idx, lng_idx) = (
            required(COL_STATE)?,
            required(COL_CITY)?,
            required(COL_LAT)?,
            required(COL_LNG)?,
        );

        let mut rows = Vec::with_capacity(table.len());
        for (i, row) in table.rows.iter().enumerate() {
            let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
            let coord = |column: &str, idx: usize| {
                parse_number(cell(idx)).ok_or_else(|| MatchError::InvalidCoordinate {
                    row: i + 1,
                    column: column.to_string(),
                    value: cell(idx).to_string(),
                })
            };
            rows.push(LocationLookupRow {
                state: cell(state_idx).to_string(),
                city: cell(city_idx).to_string(),
                lat: coord(COL_LAT, lat_idx)?,
                lng: coord(COL_LNG, lng_idx)?,
            });
        }

        Ok(Self::from_rows(rows))
    }

    pub fn from_rows<I: IntoIterator<Item = LocationLookupRow>>(rows: I) -> Self {
        let mut index = Self::default();
        for row in rows {
            if row.state.is_empty() || row.city.is_empty() {
                debug!(
                    "Lookup row with empty key ignored — state={:?} city={:?}",
                    row.state, row.city
                );
                index.blank_keys += 1;
                continue;
            }
            if index.get(&row.state, &row.city).is_some() {
                debug!(
                    "Duplicate lookup key ignored — state={} city={} lat={} lng={}",
                    row.state, row.city, row.lat, row.lng
                );
                index.duplicates += 1;
                continue;
            }
            index.by_state.entry(row.state).or_default().insert(
                row.city,
                Coordinates {
                    lat: row.lat,
                    lng: row.lng,
                },
            );
            index.len += 1;
        }
        if index.duplicates > 0 || index.blank_keys > 0 {
            debug!(
                "Lookup index built — keys={} duplicates_ignored={} blank_keys_ignored={}",
                index.len, index.duplicates, index.blank_keys
            );
        }
        index
    }

    /// An empty state or city never matches, even against an empty lookup cell.
    pub fn get(&self, state: &str, city: &str) -> Option<Coordinates> {
        if state.is_empty() || city.is_empty() {
            return None;
        }
        self.by_state.get(state)?.get(city).copied()
    }

    /// Number of distinct (state, city) keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lookup rows shadowed by an earlier row with the same key.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Lookup rows dropped because the state or city cell was empty.
    pub fn blank_keys(&self) -> usize {
        self.blank_keys
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub matched: usize,
    pub unmatched: usize,
}

/// Left outer join of records against the index. Misses keep no coordinates.
pub fn match_coordinates(records: &mut [InstallationRecord], index: &LocationIndex) -> MatchReport {
    let mut report = MatchReport::default();

    for record in records.iter_mut() {
        match index.get(&record.state, &record.city) {
            Some(coords) => {
                record.attach_coordinates(coords);
                report.matched += 1;
            }
            None => {
                debug!(
                    "No coordinates for installation — state={:?} city={:?} year={}",
                    record.state, record.city, record.year
                );
                report.unmatched += 1;
            }
        }
    }

    info!(
        "Coordinate matching done — matched={} unmatched={} lookup_keys={}",
        report.matched,
        report.unmatched,
        index.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(state: &str, city: &str, lat: f64, lng: f64) -> LocationLookupRow {
        LocationLookupRow {
            state: state.into(),
            city: city.into(),
            lat,
            lng,
        }
    }

    #[test]
    fn test_first_match_wins() {
        let index = LocationIndex::from_rows(vec![
            row("CA", "Fresno", 36.75, -119.77),
            row("CA", "Fresno", 0.0, 0.0),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.duplicates(), 1);
        assert_eq!(
            index.get("CA", "Fresno"),
            Some(Coordinates {
                lat: 36.75,
                lng: -119.77
            })
        );
    }

    #[test]
    fn test_exact_key_comparison() {
        let index = LocationIndex::from_rows(vec![row("CA", "Fresno", 36.75, -119.77)]);
        assert!(index.get("CA", "fresno").is_none());
        assert!(index.get("CA", "Fresno ").is_none());
        assert!(index.get("ca", "Fresno").is_none());
        // Same city name in another state is a different key
        assert!(index.get("TX", "Fresno").is_none());
    }

    #[test]
    fn test_match_sets_both_or_neither() {
        let index = LocationIndex::from_rows(vec![row("CA", "Fresno", 36.75, -119.77)]);
        let mut records = vec![
            InstallationRecord::new(2015, "CA", "Fresno", 500.0),
            InstallationRecord::new(2016, "CA", "Nowhere", 10.0),
        ];
        let report = match_coordinates(&mut records, &index);

        assert_eq!(
            report,
            MatchReport {
                matched: 1,
                unmatched: 1
            }
        );
        assert_eq!(records[0].lat(), Some(36.75));
        assert_eq!(records[0].lng(), Some(-119.77));
        assert_eq!(records[1].lat(), None);
        assert_eq!(records[1].lng(), None);
    }

    #[test]
    fn test_empty_keys_never_match() {
        let index = LocationIndex::from_rows(vec![
            row("CA", "", 1.0, 2.0),
            row("", "Fresno", 3.0, 4.0),
            row("CA", "Fresno", 36.75, -119.77),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.blank_keys(), 2);
        assert!(index.get("CA", "").is_none());
        assert!(index.get("", "Fresno").is_none());

        let mut records = vec![
            InstallationRecord::new(2015, "CA", "", 500.0),
            InstallationRecord::new(2015, "", "Fresno", 500.0),
        ];
        let report = match_coordinates(&mut records, &index);
        assert_eq!(
            report,
            MatchReport {
                matched: 0,
                unmatched: 2
            }
        );
        assert!(records.iter().all(|r| r.coordinates().is_none()));
    }

    #[test]
    fn test_build_rejects_bad_coordinate() {
        let table = RawTable {
            headers: vec!["State".into(), "City".into(), "lat".into(), "lng".into()],
            rows: vec![
                vec!["CA".into(), "Fresno".into(), "36.75".into(), "-119.77".into()],
                vec!["MA".into(), "Boston".into(), "".into(), "-71.06".into()],
            ],
        };
        assert_eq!(
            LocationIndex::build(&table).unwrap_err(),
            MatchError::InvalidCoordinate {
                row: 2,
                column: "lat".into(),
                value: "".into(),
            }
        );
    }
}
