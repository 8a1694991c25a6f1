// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::record::InstallationRecord;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Upper end of the capacity color scale, in kW-AC.
pub const CAPACITY_SCALE_MAX_KW: f64 = 2_000_000.0;

#[derive(Error, Debug, PartialEq)]
pub enum AggregateError {
    #[error("Year {year} is outside {first}..={last}")]
    YearOutOfRange { year: i32, first: i32, last: i32 },
    #[error("Empty year range: first year {first} is after last year {last}")]
    EmptyRange { first: i32, last: i32 },
    #[error("{city}, {state} ({year}) has non-positive capacity {capacity_kw} kW-AC")]
    NonPositiveCapacity {
        city: String,
        state: String,
        year: i32,
        capacity_kw: f64,
    },
}

/// Which states contribute points and capacity to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatePolicy {
    /// Drop Alaska and Hawaii, which fall outside the lower-48 map.
    #[default]
    ContiguousOnly,
    AllStates,
}

impl StatePolicy {
    pub const NON_CONTIGUOUS: [&'static str; 2] = ["AK", "HI"];

    pub fn admits(&self, state: &str) -> bool {
        match self {
            StatePolicy::AllStates => true,
            StatePolicy::ContiguousOnly => !Self::NON_CONTIGUOUS.contains(&state),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            first: 2006,
            last: 2024,
        }
    }
}

impl YearRange {
    pub fn new(first: i32, last: i32) -> Result<Self, AggregateError> {
        if first > last {
            return Err(AggregateError::EmptyRange { first, last });
        }
        Ok(Self { first, last })
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.first..=self.last
    }

    fn check(&self, year: i32) -> Result<(), AggregateError> {
        if self.contains(year) {
            Ok(())
        } else {
            Err(AggregateError::YearOutOfRange {
                year,
                first: self.first,
                last: self.last,
            })
        }
    }
}

/// Latitude/longitude window a renderer draws; points beyond it are clipped.
#[derive(Debug, Clone, PartialEq)]
pub struct MapExtent {
    pub lat: RangeInclusive<f64>,
    pub lng: RangeInclusive<f64>,
}

impl MapExtent {
    /// The lower 48 states.
    pub fn contiguous_us() -> Self {
        Self {
            lat: 24.0..=50.0,
            lng: -125.0..=-65.0,
        }
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.lat.contains(&lat) && self.lng.contains(&lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayPoint {
    pub lat: f64,
    pub lng: f64,
    pub label: String,
    pub log_capacity_kw: f64,
    /// `log_capacity_kw` scaled into [0, 1] against [0, log10(2,000,000)].
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFrame {
    pub year: i32,
    pub points: Vec<DisplayPoint>,
    pub total_capacity_mw: f64,
    pub location_count: usize,
}

impl DisplayFrame {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Year: {}\nLocations: {}\nTotal MW-AC: {:.1}",
            self.year, self.location_count, self.total_capacity_mw
        )
    }

    /// Points a renderer limited to `extent` would clip.
    pub fn outside(&self, extent: &MapExtent) -> usize {
        self.points
            .iter()
            .filter(|p| !extent.contains(p.lat, p.lng))
            .count()
    }
}

pub fn display_label(record: &InstallationRecord) -> String {
    format!(
        "{}, {}, {:.3}(MW-AC)",
        record.city,
        record.state,
        record.capacity_mw()
    )
}

pub fn intensity(log_capacity_kw: f64) -> f64 {
    (log_capacity_kw / CAPACITY_SCALE_MAX_KW.log10()).clamp(0.0, 1.0)
}

/// Matched records ordered by interconnection year.
///
/// The sort is stable, so records sharing a year keep their input order and
/// every frame is a prefix of the same slice.
#[derive(Debug, Clone)]
pub struct YearIndex {
    records: Vec<InstallationRecord>,
    range: YearRange,
}

impl YearIndex {
    pub fn new(mut records: Vec<InstallationRecord>, range: YearRange) -> Self {
        records.sort_by_key(|r| r.year);
        Self { records, range }
    }

    pub fn records(&self) -> &[InstallationRecord] {
        &self.records
    }

    pub fn range(&self) -> YearRange {
        self.range
    }

    /// Records interconnected in or before `year`.
    pub fn up_to(&self, year: i32) -> &[InstallationRecord] {
        let end = self.records.partition_point(|r| r.year <= year);
        &self.records[..end]
    }

    /// Everything connected by `selected_year` that has coordinates and a
    /// state the policy admits.
    pub fn frame(
        &self,
        selected_year: i32,
        policy: StatePolicy,
    ) -> Result<DisplayFrame, AggregateError> {
        self.range.check(selected_year)?;

        let mut points = Vec::new();
        let mut total_kw = 0.0;

        for record in self.up_to(selected_year) {
            let Some(coords) = record.coordinates() else {
                continue;
            };
            if !policy.admits(&record.state) {
                continue;
            }
            // `!(x > 0)` also catches NaN
            if !(record.capacity_kw > 0.0) {
                return Err(AggregateError::NonPositiveCapacity {
                    city: record.city.clone(),
                    state: record.state.clone(),
                    year: record.year,
                    capacity_kw: record.capacity_kw,
                });
            }

            let log_capacity_kw = record.capacity_kw.log10();
            total_kw += record.capacity_kw;
            points.push(DisplayPoint {
                lat: coords.lat,
                lng: coords.lng,
                label: display_label(record),
                log_capacity_kw,
                intensity: intensity(log_capacity_kw),
            });
        }

        Ok(DisplayFrame {
            year: selected_year,
            location_count: points.len(),
            total_capacity_mw: total_kw / 1000.0,
            points,
        })
    }

    pub fn timeline(&self, policy: StatePolicy) -> Result<Vec<DisplayFrame>, AggregateError> {
        self.range
            .years()
            .map(|year| self.frame(year, policy))
            .collect()
    }
}

/// Forward/back year control. Stepping past either end wraps to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearCursor {
    range: YearRange,
    year: i32,
}

impl YearCursor {
    /// Starts on the last year of the range.
    pub fn new(range: YearRange) -> Self {
        Self {
            range,
            year: range.last,
        }
    }

    pub fn at(range: YearRange, year: i32) -> Result<Self, AggregateError> {
        range.check(year)?;
        Ok(Self { range, year })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn step(&mut self, delta: i32) -> i32 {
        let next = self.year.saturating_add(delta);
        self.year = if next < self.range.first {
            self.range.last
        } else if next > self.range.last {
            self.range.first
        } else {
            next
        };
        self.year
    }

    pub fn forward(&mut self) -> i32 {
        self.step(1)
    }

    pub fn back(&mut self) -> i32 {
        self.step(-1)
    }
}
