// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// Year aggregation behaviour: cumulative frames, totals and capacity guards.

use csolar_core::aggregate::{AggregateError, MapExtent, StatePolicy, YearIndex, YearRange};
use csolar_core::matcher::{match_coordinates, LocationIndex, LocationLookupRow};
use csolar_core::record::InstallationRecord;

fn lookup(rows: &[(&str, &str, f64, f64)]) -> LocationIndex {
    LocationIndex::from_rows(rows.iter().map(|&(state, city, lat, lng)| LocationLookupRow {
        state: state.to_string(),
        city: city.to_string(),
        lat,
        lng,
    }))
}

fn matched(mut records: Vec<InstallationRecord>) -> YearIndex {
    let index = lookup(&[
        ("CA", "Fresno", 36.75, -119.77),
        ("MA", "Boston", 42.36, -71.06),
        ("MN", "Duluth", 46.79, -92.10),
        ("HI", "Honolulu", 21.31, -157.86),
    ]);
    match_coordinates(&mut records, &index);
    YearIndex::new(records, YearRange::default())
}

fn sample() -> YearIndex {
    matched(vec![
        InstallationRecord::new(2015, "CA", "Fresno", 500.0),
        InstallationRecord::new(2008, "MA", "Boston", 120.0),
        InstallationRecord::new(2019, "MN", "Duluth", 1000.0),
        InstallationRecord::new(2012, "HI", "Honolulu", 75.0),
        InstallationRecord::new(2010, "MN", "Nowhere", 42.0),
        InstallationRecord::new(2015, "MA", "Boston", 60.0),
    ])
}

// =====================================================================
// Worked examples
// =====================================================================

#[test]
fn test_fresno_example() {
    let index = matched(vec![InstallationRecord::new(2015, "CA", "Fresno", 500.0)]);
    let rec = &index.records()[0];
    assert_eq!(rec.lat(), Some(36.75));
    assert_eq!(rec.lng(), Some(-119.77));

    let frame = index.frame(2015, StatePolicy::ContiguousOnly).unwrap();
    assert_eq!(frame.points.len(), 1);
    let point = &frame.points[0];
    assert_eq!(point.label, "Fresno, CA, 0.500(MW-AC)");
    assert_eq!(point.log_capacity_kw, 500f64.log10());
    assert!((point.log_capacity_kw - 2.699).abs() < 1e-3);
    assert_eq!((point.lat, point.lng), (36.75, -119.77));
}

#[test]
fn test_selected_year_before_any_record() {
    let index = matched(vec![InstallationRecord::new(2010, "CA", "Fresno", 500.0)]);
    let frame = index.frame(2006, StatePolicy::ContiguousOnly).unwrap();
    assert!(frame.is_empty());
    assert_eq!(frame.total_capacity_mw, 0.0);
    assert_eq!(frame.location_count, 0);
}

#[test]
fn test_zero_capacity_is_an_error() {
    let index = matched(vec![InstallationRecord::new(2015, "CA", "Fresno", 0.0)]);
    assert_eq!(
        index.frame(2024, StatePolicy::ContiguousOnly).unwrap_err(),
        AggregateError::NonPositiveCapacity {
            city: "Fresno".into(),
            state: "CA".into(),
            year: 2015,
            capacity_kw: 0.0,
        }
    );
    // Not yet connected in 2010, so log10 is never taken
    assert!(index.frame(2010, StatePolicy::ContiguousOnly).is_ok());
}

#[test]
fn test_negative_capacity_is_an_error() {
    let index = matched(vec![InstallationRecord::new(2015, "CA", "Fresno", -5.0)]);
    assert!(matches!(
        index.frame(2015, StatePolicy::AllStates),
        Err(AggregateError::NonPositiveCapacity { .. })
    ));
}

// =====================================================================
// Properties
// =====================================================================

#[test]
fn test_frames_are_monotonic() {
    let index = sample();
    for policy in [StatePolicy::ContiguousOnly, StatePolicy::AllStates] {
        let frames = index.timeline(policy).unwrap();
        for pair in frames.windows(2) {
            let (earlier, later) = (&pair[0], &pair[1]);
            assert!(earlier.total_capacity_mw <= later.total_capacity_mw);
            assert!(earlier.location_count <= later.location_count);
            // Each frame is a prefix of the next
            assert_eq!(
                &later.points[..earlier.points.len()],
                earlier.points.as_slice()
            );
        }
    }
}

#[test]
fn test_location_count_matches_points() {
    let index = sample();
    for frame in index.timeline(StatePolicy::AllStates).unwrap() {
        assert_eq!(frame.location_count, frame.points.len());
    }
}

#[test]
fn test_frame_is_idempotent() {
    let index = sample();
    let a = index.frame(2016, StatePolicy::ContiguousOnly).unwrap();
    let b = index.frame(2016, StatePolicy::ContiguousOnly).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_order_and_totals() {
    let index = sample();
    let frame = index.frame(2024, StatePolicy::ContiguousOnly).unwrap();
    let labels: Vec<&str> = frame.points.iter().map(|p| p.label.as_str()).collect();
    // Ascending year, input order within a year; Honolulu and the unmatched row are gone
    assert_eq!(
        labels,
        vec![
            "Boston, MA, 0.120(MW-AC)",
            "Fresno, CA, 0.500(MW-AC)",
            "Boston, MA, 0.060(MW-AC)",
            "Duluth, MN, 1.000(MW-AC)",
        ]
    );
    assert!((frame.total_capacity_mw - 1.68).abs() < 1e-12);
    assert_eq!(
        frame.summary(),
        "Year: 2024\nLocations: 4\nTotal MW-AC: 1.7"
    );
}

#[test]
fn test_hawaii_counts_only_under_all_states() {
    let index = sample();
    let contiguous = index.frame(2012, StatePolicy::ContiguousOnly).unwrap();
    let all = index.frame(2012, StatePolicy::AllStates).unwrap();
    assert_eq!(contiguous.location_count, 1);
    assert_eq!(all.location_count, 2);
    assert!((all.total_capacity_mw - contiguous.total_capacity_mw - 0.075).abs() < 1e-12);
}

#[test]
fn test_out_of_range_year() {
    let index = sample();
    assert_eq!(
        index.frame(2005, StatePolicy::AllStates).unwrap_err(),
        AggregateError::YearOutOfRange {
            year: 2005,
            first: 2006,
            last: 2024,
        }
    );
    assert!(index.frame(2025, StatePolicy::AllStates).is_err());
}

#[test]
fn test_outside_contiguous_view() {
    let index = sample();
    let frame = index.frame(2024, StatePolicy::AllStates).unwrap();
    assert_eq!(frame.outside(&MapExtent::contiguous_us()), 1);
}
