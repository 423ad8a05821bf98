//! Round-trip tests for the shape codec
//!
//! These tests encode geometries with the shape writer and index builder and
//! decode them back with the shape reader.

use super::consts::*;
use super::index::RecordIndex;
use super::reader::ShapeReader;
use super::shape_type::ShapeType;
use super::writer::ShapeWriter;
use crate::common::error::Error;
use crate::geometry::{
    Coord, Envelope, Geometry, GeometryKind, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
use std::io::Cursor;

fn encode(shape_type: ShapeType, geometries: &[Option<Geometry>]) -> (Vec<u8>, Vec<u8>) {
    let refs: Vec<Option<&Geometry>> = geometries.iter().map(Option::as_ref).collect();
    let index = RecordIndex::build(shape_type, refs.iter().copied()).unwrap();

    let mut shx = Cursor::new(Vec::new());
    index.write(&mut shx, shape_type, Envelope::WHOLE_EARTH).unwrap();

    let mut writer = ShapeWriter::new(Vec::new());
    writer
        .write(shape_type, &index, &refs, Envelope::WHOLE_EARTH)
        .unwrap();
    (writer.into_inner(), shx.into_inner())
}

fn decode(shp: Vec<u8>, shx: Vec<u8>) -> Vec<Option<Geometry>> {
    let (_, index) = RecordIndex::read(Cursor::new(shx)).unwrap();
    ShapeReader::new(Cursor::new(shp), index.len())
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn square(x: f64, y: f64, size: f64) -> Polygon {
    Polygon::closed(vec![
        Coord::new(x, y),
        Coord::new(x + size, y),
        Coord::new(x + size, y + size),
        Coord::new(x, y + size),
    ])
}

#[test]
fn test_point_round_trip() {
    let geometries: Vec<Option<Geometry>> = (0..5)
        .map(|i| Some(Geometry::point(i as f64 * 1.5, -(i as f64))))
        .collect();
    let (shp, shx) = encode(ShapeType::Point, &geometries);
    let decoded = decode(shp, shx);

    assert_eq!(decoded, geometries);
    for (i, g) in decoded.iter().enumerate() {
        assert_eq!(g.as_ref().unwrap().origin_index(), Some(i));
    }
}

#[test]
fn test_polygon_round_trip_keeps_part_grouping() {
    let geometries = vec![
        Some(Geometry::from(square(0.0, 0.0, 1.0))),
        Some(Geometry::from(MultiPolygon(vec![
            square(10.0, 10.0, 5.0),
            square(11.0, 11.0, 1.0),
            square(20.0, 20.0, 2.0),
        ]))),
    ];
    let (shp, shx) = encode(ShapeType::Polygon, &geometries);
    let decoded = decode(shp, shx);

    assert_eq!(decoded, geometries);
    assert!(matches!(
        decoded[1].as_ref().unwrap().kind(),
        GeometryKind::MultiPolygon(mp) if mp.0.len() == 3
    ));
}

#[test]
fn test_polyline_round_trip() {
    let geometries = vec![
        Some(Geometry::line_string([(0.0, 0.0), (1.0, 2.0), (3.0, 1.0)])),
        Some(Geometry::from(MultiLineString(vec![
            LineString::new(vec![Coord::new(-1.0, -1.0), Coord::new(-2.0, -2.0)]),
            LineString::new(vec![
                Coord::new(4.0, 4.0),
                Coord::new(5.0, 4.0),
                Coord::new(6.0, 5.0),
                Coord::new(7.0, 7.0),
            ]),
        ]))),
    ];
    let (shp, shx) = encode(ShapeType::Polyline, &geometries);
    assert_eq!(decode(shp, shx), geometries);
}

#[test]
fn test_multipoint_round_trip() {
    let geometries = vec![
        Some(Geometry::from(MultiPoint(vec![
            Point::new(1.0, 1.0),
            Point::new(2.0, 4.0),
            Point::new(-3.0, 9.0),
        ]))),
        Some(Geometry::from(MultiPoint(vec![Point::new(0.5, 0.25)]))),
    ];
    let (shp, shx) = encode(ShapeType::MultiPoint, &geometries);
    assert_eq!(decode(shp, shx), geometries);
}

#[test]
fn test_null_shapes_keep_positions() {
    let geometries = vec![
        Some(Geometry::line_string([(0.0, 0.0), (1.0, 1.0)])),
        None,
        Some(Geometry::line_string([(2.0, 2.0), (3.0, 3.0)])),
    ];
    let (shp, shx) = encode(ShapeType::Polyline, &geometries);

    // The null record occupies exactly its two content words
    let (_, index) = RecordIndex::read(Cursor::new(shx.clone())).unwrap();
    assert_eq!(index.get(1).unwrap().content_length, 2);

    let decoded = decode(shp, shx);
    assert_eq!(decoded, geometries);
    assert_eq!(decoded[2].as_ref().unwrap().origin_index(), Some(2));
}

#[test]
fn test_null_record_with_padding_is_skipped() {
    // Some writers pad null records; the reader must still honor the
    // content length from the record header
    let mut shp = super::header::FileHeader::new(1, 50 + 8 + 14, Envelope::WHOLE_EARTH)
        .to_bytes()
        .to_vec();
    shp.extend_from_slice(&1i32.to_be_bytes());
    shp.extend_from_slice(&4i32.to_be_bytes());
    shp.extend_from_slice(&0i32.to_le_bytes());
    shp.extend_from_slice(&[0xAB; 4]);
    shp.extend_from_slice(&2i32.to_be_bytes());
    shp.extend_from_slice(&10i32.to_be_bytes());
    shp.extend_from_slice(&1i32.to_le_bytes());
    shp.extend_from_slice(&7.0f64.to_le_bytes());
    shp.extend_from_slice(&8.0f64.to_le_bytes());

    let decoded: Vec<_> = ShapeReader::new(Cursor::new(shp), 2)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(decoded, vec![None, Some(Geometry::point(7.0, 8.0))]);
}

#[test]
fn test_unsupported_shape_type_fails_before_reading() {
    // PointZ
    let shp = super::header::FileHeader::new(11, 50, Envelope::WHOLE_EARTH).to_bytes();
    let result = ShapeReader::new(Cursor::new(shp.to_vec()), 3);
    assert!(matches!(result, Err(Error::UnsupportedShapeType(11))));
}

#[test]
fn test_reader_closes_on_exhaustion() {
    let geometries = vec![Some(Geometry::point(1.0, 1.0)), Some(Geometry::point(2.0, 2.0))];
    let (shp, _) = encode(ShapeType::Point, &geometries);

    let mut reader = ShapeReader::new(Cursor::new(shp), 2).unwrap();
    assert!(!reader.is_closed());
    assert!(reader.next().is_some());
    assert!(!reader.is_closed());
    assert!(reader.next().is_some());
    assert!(reader.is_closed());
    assert!(reader.next().is_none());
    assert_eq!(reader.position(), 2);
}

#[test]
fn test_reader_closes_on_error() {
    let geometries = vec![Some(Geometry::point(1.0, 1.0))];
    let (mut shp, _) = encode(ShapeType::Point, &geometries);
    shp.truncate(HEADER_BYTES + RECORD_HEADER_BYTES + 6);

    let mut reader = ShapeReader::new(Cursor::new(shp), 1).unwrap();
    assert!(matches!(reader.next(), Some(Err(Error::InvalidData(_)))));
    assert!(reader.is_closed());
    assert!(reader.next().is_none());
}

#[test]
fn test_truncated_record_header_is_io_error() {
    let geometries = vec![Some(Geometry::point(1.0, 1.0))];
    let (mut shp, _) = encode(ShapeType::Point, &geometries);
    shp.truncate(HEADER_BYTES + 4);

    let mut reader = ShapeReader::new(Cursor::new(shp), 1).unwrap();
    assert!(matches!(reader.next(), Some(Err(Error::Io(_)))));
    assert!(reader.is_closed());
}

#[test]
fn test_out_of_range_record_number_is_rejected() {
    let geometries = vec![Some(Geometry::point(1.0, 1.0))];
    for number in [i32::MIN, 0, -7] {
        let (mut shp, _) = encode(ShapeType::Point, &geometries);
        shp[HEADER_BYTES..HEADER_BYTES + 4].copy_from_slice(&number.to_be_bytes());

        let mut reader = ShapeReader::new(Cursor::new(shp), 1).unwrap();
        assert!(matches!(reader.next(), Some(Err(Error::InvalidData(_)))));
        assert!(reader.is_closed());
    }
}

#[test]
fn test_oversized_content_length_is_rejected() {
    let geometries = vec![Some(Geometry::point(1.0, 1.0)), Some(Geometry::point(2.0, 2.0))];
    let (mut shp, _) = encode(ShapeType::Point, &geometries);
    shp[HEADER_BYTES + 4..HEADER_BYTES + 8].copy_from_slice(&i32::MAX.to_be_bytes());
    let available = shp.len() - HEADER_BYTES - RECORD_HEADER_BYTES;

    let mut reader = ShapeReader::new(Cursor::new(shp), 2).unwrap();
    match reader.next() {
        Some(Err(Error::InvalidData(msg))) => {
            assert!(msg.contains(&format!("only {} remain", available)), "{}", msg)
        },
        other => panic!("expected InvalidData, got {:?}", other),
    }
    assert!(reader.is_closed());
}

#[test]
fn test_partial_results_survive_a_later_error() {
    let geometries = vec![Some(Geometry::point(1.0, 1.0)), Some(Geometry::point(2.0, 2.0))];
    let (mut shp, _) = encode(ShapeType::Point, &geometries);
    shp.truncate(shp.len() - 4);

    let mut reader = ShapeReader::new(Cursor::new(shp), 2).unwrap();
    let first = reader.next().unwrap().unwrap();
    assert_eq!(first, Some(Geometry::point(1.0, 1.0)));
    assert!(reader.next().unwrap().is_err());
}

#[test]
fn test_file_length_matches_bytes_written() {
    let geometries = vec![
        Some(Geometry::from(square(0.0, 0.0, 1.0))),
        None,
        Some(Geometry::from(square(3.0, 3.0, 1.0))),
    ];
    let (shp, shx) = encode(ShapeType::Polygon, &geometries);

    let header = super::header::FileHeader::parse(&shp).unwrap();
    assert_eq!(header.file_length_bytes(), shp.len() as u64);
    assert_eq!(header.envelope, Envelope::WHOLE_EARTH);

    let shx_header = super::header::FileHeader::parse(&shx).unwrap();
    assert_eq!(shx_header.file_length_bytes(), shx.len() as u64);
    assert_eq!(shx_header.shape_type, ShapeType::Polygon.code());
}

#[test]
fn test_index_offsets_locate_records() {
    let geometries = vec![
        Some(Geometry::line_string([(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)])),
        Some(Geometry::line_string([(5.0, 5.0), (6.0, 6.0)])),
    ];
    let (shp, shx) = encode(ShapeType::Polyline, &geometries);
    let (_, index) = RecordIndex::read(Cursor::new(shx)).unwrap();

    for (i, entry) in index.entries().iter().enumerate() {
        let at = entry.offset_bytes() as usize;
        let record_number = crate::common::binary::read_i32_be(&shp, at).unwrap();
        let content_length = crate::common::binary::read_i32_be(&shp, at + 4).unwrap();
        assert_eq!(record_number, i as i32 + 1);
        assert_eq!(content_length, entry.content_length);
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn coord_strategy() -> impl Strategy<Value = Coord> {
        (-1.0e6f64..1.0e6, -1.0e6f64..1.0e6).prop_map(|(x, y)| Coord::new(x, y))
    }

    fn line_strategy() -> impl Strategy<Value = LineString> {
        prop::collection::vec(coord_strategy(), 2..12).prop_map(LineString::new)
    }

    fn polyline_strategy() -> impl Strategy<Value = Option<Geometry>> {
        prop_oneof![
            1 => Just(None),
            4 => line_strategy().prop_map(|ls| Some(Geometry::from(ls))),
            4 => prop::collection::vec(line_strategy(), 2..5)
                .prop_map(|lines| Some(Geometry::from(MultiLineString(lines)))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_polyline_round_trip(geometries in prop::collection::vec(polyline_strategy(), 0..20)) {
            let (shp, shx) = encode(ShapeType::Polyline, &geometries);
            let decoded = decode(shp, shx);
            prop_assert_eq!(decoded, geometries);
        }

        #[test]
        fn prop_index_is_contiguous(geometries in prop::collection::vec(polyline_strategy(), 1..20)) {
            let refs: Vec<Option<&Geometry>> = geometries.iter().map(Option::as_ref).collect();
            let index = RecordIndex::build(ShapeType::Polyline, refs).unwrap();

            prop_assert_eq!(index.entries()[0].offset, HEADER_WORDS);
            for pair in index.entries().windows(2) {
                prop_assert_eq!(
                    pair[0].offset + pair[0].content_length + RECORD_HEADER_WORDS,
                    pair[1].offset
                );
            }
        }
    }
}
