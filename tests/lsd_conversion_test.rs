mod common;

use std::collections::BTreeSet;

use approx::assert_relative_eq;

use common::{data_dir, read_lines, Workspace};
use magtrack::{
    haversine,
    lsd::{
        converter::{
            convert_and_merge_all, convert_directory, read_line_mapping, LineMapping,
        },
        read_lsd,
    },
    ConverterParams, DistanceUnit, LineRecord, MagTrackError,
};

const LLA_FIXTURES: [&str; 3] = ["lla/211_001.lla", "lla/211_002.lla", "lla/211_003.lla"];

fn records_of(records: &[LineRecord], line_number: u32) -> Vec<LineRecord> {
    records
        .iter()
        .filter(|r| r.line_number == line_number)
        .copied()
        .collect()
}

#[test]
fn test_convert_directory_writes_lsd_and_mapping() {
    let ws = Workspace::new();
    let input = ws.copy_fixtures("lla", &LLA_FIXTURES);
    let lsd = ws.root.join("merged.lsd");
    let mapping_csv = ws.root.join("line_index_map.csv");

    let merged =
        convert_directory(&input, &lsd, &mapping_csv, &ConverterParams::default()).unwrap();

    // 211_003 keeps a single valid row: no record, but it is still numbered
    assert_eq!(merged.records.len(), 10);
    assert_eq!(
        merged.mapping,
        vec![
            LineMapping {
                line_number: 1,
                filename: "211_001.lla".into()
            },
            LineMapping {
                line_number: 2,
                filename: "211_002.lla".into()
            },
            LineMapping {
                line_number: 3,
                filename: "211_003.lla".into()
            },
        ]
    );

    let lines = read_lines(&lsd);
    assert_eq!(lines.len(), 10);
    assert_eq!(
        lines[0],
        " 211     1 2024  162.5000000  142.00000  38.03000  -100.00       0.00"
    );
    assert!(std::fs::read_to_string(&lsd).unwrap().ends_with('\n'));

    assert_eq!(
        read_lines(&mapping_csv),
        vec![
            "line_number,filename",
            "1,211_001.lla",
            "2,211_002.lla",
            "3,211_003.lla"
        ]
    );
    assert_eq!(read_line_mapping(&mapping_csv).unwrap(), merged.mapping);
}

#[test]
fn test_lsd_round_trips_through_reader() {
    let ws = Workspace::new();
    let input = ws.copy_fixtures("lla", &LLA_FIXTURES);
    let lsd = ws.root.join("merged.lsd");
    let merged = convert_directory(
        &input,
        &lsd,
        &ws.root.join("map.csv"),
        &ConverterParams::default(),
    )
    .unwrap();

    let reread = read_lsd(&lsd).unwrap();
    assert_eq!(reread.len(), merged.records.len());
    for (a, b) in reread.iter().zip(&merged.records) {
        assert_eq!(a.key(), b.key());
        assert_relative_eq!(a.doy_time, b.doy_time, epsilon = 1e-7);
        assert_relative_eq!(a.distance_km, b.distance_km, epsilon = 5e-3);
    }
}

#[test]
fn test_distance_is_cumulative_and_restarts_per_line() {
    let files: Vec<_> = LLA_FIXTURES.iter().map(|f| data_dir().join(f)).collect();
    let merged = convert_and_merge_all(&files, &ConverterParams::default()).unwrap();

    let line1 = records_of(&merged.records, 1);
    let line2 = records_of(&merged.records, 2);
    assert_eq!(line1.len(), 5);
    assert_eq!(line2.len(), 5);
    assert!(records_of(&merged.records, 3).is_empty());

    for line in [&line1, &line2] {
        assert_eq!(line[0].distance_km, 0.0);
        assert!(line.windows(2).all(|w| w[1].distance_km > w[0].distance_km));
    }

    let step = haversine(142.0, 38.03, 142.015, 38.03, DistanceUnit::Kilometers);
    assert_relative_eq!(line1[1].distance_km, step, max_relative = 1e-12);
    assert_relative_eq!(line1[4].distance_km, 4.0 * step, max_relative = 1e-9);

    // 0.06° of latitude along a meridian
    assert_relative_eq!(line2[4].distance_km, 6.6717, epsilon = 1e-3);
}

#[test]
fn test_short_hhmmss_is_right_padded() {
    let files = vec![data_dir().join("lla/211_002.lla")];
    let merged = convert_and_merge_all(&files, &ConverterParams::default()).unwrap();

    // "1300" reads as 13:00:00, "1304" as 13:04:00
    assert_relative_eq!(merged.records[0].doy_time, 162.0 + 13.0 / 24.0, epsilon = 1e-12);
    assert_relative_eq!(
        merged.records[4].doy_time,
        162.0 + (13.0 + 4.0 / 60.0) / 24.0,
        epsilon = 1e-12
    );
}

#[test]
fn test_line_numbers_follow_file_name_order() {
    // numbering does not depend on the order the caller passes files in
    let files: Vec<_> = LLA_FIXTURES
        .iter()
        .rev()
        .map(|f| data_dir().join(f))
        .collect();
    let merged = convert_and_merge_all(&files, &ConverterParams::default()).unwrap();

    let numbers: Vec<u32> = merged.mapping.iter().map(|m| m.line_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    let names: BTreeSet<&str> = merged.mapping.iter().map(|m| m.filename.as_str()).collect();
    assert_eq!(names.len(), merged.mapping.len());
    assert_eq!(merged.mapping[0].filename, "211_001.lla");
    assert!(merged.records.windows(2).all(|w| w[0].line_number <= w[1].line_number));
}

#[test]
fn test_west_longitudes_are_normalized() {
    let ws = Workspace::new();
    let file = ws.write(
        "lla/300_001.lla",
        "300 20240101 000000 359.50000 -10.00000 12.0\n\
         300 20240101 000100 180.00000 -10.00000 13.0\n",
    );

    let merged = convert_and_merge_all(&[file], &ConverterParams::default()).unwrap();
    assert_relative_eq!(merged.records[0].lon_west, -0.5);
    assert_eq!(merged.records[1].lon_west, 180.0);
    assert_relative_eq!(merged.records[0].doy_time, 1.0);
}

#[test]
fn test_unreadable_file_keeps_its_line_number() {
    let ws = Workspace::new();
    ws.write(
        "lla/a.lla",
        "211 20240610 120000 142.00000 38.03000 -100.0\n\
         211 20240610 120100 142.01500 38.03000 -101.5\n",
    );
    let unreadable = ws.root.join("lla/b.lla");
    std::fs::write(&unreadable, [0xff, 0xfe, 0x00, 0x41]).unwrap();
    ws.write(
        "lla/c.lla",
        "212 20240611 080000 142.03000 38.00000 -95.0\n\
         212 20240611 080100 142.03000 38.01500 -96.0\n",
    );
    let lsd = ws.root.join("merged.lsd");
    let mapping_csv = ws.root.join("map.csv");

    let merged = convert_directory(
        &ws.root.join("lla"),
        &lsd,
        &mapping_csv,
        &ConverterParams::default(),
    )
    .unwrap();

    let lines: Vec<u32> = merged.records.iter().map(|r| r.line_number).collect();
    assert_eq!(lines, vec![1, 1, 3, 3]);
    assert_eq!(
        merged.mapping[1],
        LineMapping {
            line_number: 2,
            filename: "b.lla".into()
        }
    );
    assert_eq!(read_line_mapping(&mapping_csv).unwrap().len(), 3);

    let written = read_lsd(&lsd).unwrap();
    assert_eq!(written.len(), 4);
    assert_eq!(written[2].key(), (212, 3));
}

#[test]
fn test_empty_file_list_and_empty_directory() {
    let merged = convert_and_merge_all(&[], &ConverterParams::default()).unwrap();
    assert!(merged.records.is_empty());
    assert!(merged.mapping.is_empty());

    let ws = Workspace::new();
    ws.write("lla/readme.txt", "nothing here\n");
    let err = convert_directory(
        &ws.root.join("lla"),
        &ws.root.join("merged.lsd"),
        &ws.root.join("map.csv"),
        &ConverterParams::default(),
    )
    .unwrap_err();
    assert!(matches!(err, MagTrackError::NoInputError(_, ref ext) if ext == "lla"));
    assert!(!ws.root.join("merged.lsd").exists());
}
