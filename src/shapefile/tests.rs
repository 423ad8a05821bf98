//! On-disk tests for the shapefile facade.

use super::*;
use crate::common::error::{Error, Result};
use crate::dbf::{DbfColumn, DbfFieldType, TableSchema};
use crate::geometry::{Coord, Geometry, MultiPolygon, Polygon};
use crate::record::{Field, GEOMETRY_FIELD, MemoryRows, Record, Value};
use std::fs;
use std::path::Path;

fn road(name: &str, lanes: i64, coords: [(f64, f64); 2]) -> Record {
    Record::new(vec![
        Field::new("name", name),
        Field::new("lanes", lanes),
        Field::new("geom", Geometry::line_string(coords)),
    ])
}

fn save_roads(dir: &Path) -> Shapefile {
    let mut file = Shapefile::new();
    file.append(road("Main St", 4, [(0.0, 0.0), (1.0, 1.0)])).unwrap();
    file.append(road("Elm St", 2, [(1.0, 1.0), (2.0, 0.5)])).unwrap();
    file.append(road("Oak Ave", 1, [(5.0, 5.0), (6.0, 7.0)])).unwrap();
    file.save_as("roads", dir).unwrap();
    file
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_save_and_open() {
    let dir = tempfile::tempdir().unwrap();
    let saved = save_roads(dir.path());
    assert_eq!(saved.record_count(), 3);
    assert_eq!(
        listing(dir.path()),
        vec!["roads.cpg", "roads.dbf", "roads.shp", "roads.shx"]
    );

    let file = Shapefile::open(dir.path().join("roads.shp")).unwrap();
    assert_eq!(file.record_count(), 3);
    assert_eq!(file.columns().unwrap(), vec!["name", "lanes"]);

    let records: Vec<Record> = file.records().unwrap().collect::<Result<_>>().unwrap();
    let ids: Vec<i64> = records.iter().map(|r| r.get_by_name("id").as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    assert_eq!(records[1].get_by_name("NAME"), &Value::from("Elm St"));
    assert_eq!(records[1].get_by_name("lanes"), &Value::Integer(2));
    assert_eq!(
        records[2].get_by_name("geom").as_geometry(),
        Some(&Geometry::line_string([(5.0, 5.0), (6.0, 7.0)]))
    );
}

#[test]
fn test_open_from_any_sibling() {
    let dir = tempfile::tempdir().unwrap();
    save_roads(dir.path());

    for ext in ["shx", "dbf"] {
        let file = Shapefile::open(dir.path().join(format!("roads.{}", ext))).unwrap();
        assert_eq!(file.record_count(), 3);
        assert_eq!(file.geometries().unwrap().count(), 3);
    }
}

#[test]
fn test_round_trip_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    save_roads(dir.path());

    let first = Shapefile::open(dir.path().join("roads.shp")).unwrap();
    let decoded: Vec<Record> = first.records().unwrap().collect::<Result<_>>().unwrap();

    let mut copy = Shapefile::new();
    for record in &decoded {
        copy.append(record.clone()).unwrap();
    }
    copy.save_as("copy", dir.path()).unwrap();

    let second = Shapefile::open(dir.path().join("copy.shp")).unwrap();
    let redecoded: Vec<Record> = second.records().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(redecoded, decoded);
}

#[test]
fn test_polygons_with_null_shapes() {
    let dir = tempfile::tempdir().unwrap();
    let square = |x: f64| {
        Polygon::closed(vec![
            Coord::new(x, 0.0),
            Coord::new(x + 1.0, 0.0),
            Coord::new(x + 1.0, 1.0),
            Coord::new(x, 1.0),
        ])
    };

    let mut file = Shapefile::new();
    file.append_values([Value::from("a"), Value::from(Geometry::from(square(0.0)))]).unwrap();
    file.append_values([Value::from("b"), Value::Null]).unwrap();
    file.append_values([
        Value::from("c"),
        Value::from(Geometry::from(MultiPolygon(vec![square(2.0), square(4.0)]))),
    ])
    .unwrap();
    file.save_as("parcels", dir.path()).unwrap();

    let opened = Shapefile::open(dir.path().join("parcels.shp")).unwrap();
    assert_eq!(opened.columns().unwrap(), vec!["FIELD_1"]);

    let geometries: Vec<Option<Geometry>> =
        opened.geometries().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(geometries.len(), 3);
    assert!(geometries[1].is_none());
    assert_eq!(geometries[2].as_ref().unwrap().num_parts(), 2);

    let records: Vec<Record> = opened.records().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(records[1].get_by_name("field_1"), &Value::from("b"));
    assert!(records[1].get_by_name(GEOMETRY_FIELD).is_null());
}

#[test]
fn test_missing_geometry_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out");

    let mut file = Shapefile::new();
    file.append_values([Value::from("no"), Value::from(1)]).unwrap();
    assert!(matches!(file.save_as("x", &target), Err(Error::MissingGeometry)));
    assert!(!target.exists());
}

#[test]
fn test_nothing_to_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = Shapefile::new();
    assert!(matches!(file.save_as("x", dir.path()), Err(Error::NothingToSave)));
    assert!(listing(dir.path()).is_empty());
}

#[test]
fn test_mismatched_shape_type_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = Shapefile::new();
    file.append_values([Geometry::point(0.0, 0.0)]).unwrap();
    file.append_values([Geometry::line_string([(0.0, 0.0), (1.0, 0.0)])]).unwrap();
    assert!(matches!(
        file.save_as("x", dir.path()),
        Err(Error::ShapeTypeMismatch { record: 1, .. })
    ));
    assert!(listing(dir.path()).is_empty());
}

#[test]
fn test_append_to_opened_file() {
    let dir = tempfile::tempdir().unwrap();
    save_roads(dir.path());

    let mut file = Shapefile::open(dir.path().join("roads.shp")).unwrap();
    assert!(file.buffered().is_none());
    file.append(Record::new(vec![
        Field::new("lanes", 3),
        Field::new("name", "Pine Rd"),
        Field::new("geom*", Geometry::line_string([(9.0, 9.0), (9.5, 9.5)])),
    ]))
    .unwrap();
    assert_eq!(file.buffered().map(|b| b.len()), Some(4));
    assert_eq!(file.record_count(), 4);

    file.save_as("roads2", dir.path()).unwrap();
    let reopened = Shapefile::open(dir.path().join("roads2.dbf")).unwrap();
    let last = reopened.records().unwrap().last().unwrap().unwrap();
    assert_eq!(last.get_by_name("id"), &Value::Integer(4));
    assert_eq!(last.get_by_name("name"), &Value::from("Pine Rd"));
    assert_eq!(last.get_by_name("lanes"), &Value::Integer(3));
}

#[test]
fn test_projection_passthrough() {
    let dir = tempfile::tempdir().unwrap();
    let wkt = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",SPHEROID[\"WGS_1984\",6378137,298.257223563]]]";

    let mut file = Shapefile::new();
    file.set_projection(Some(wkt.to_string()));
    file.append_values([Geometry::point(1.0, 2.0)]).unwrap();
    file.save_as("pt", dir.path()).unwrap();

    let opened = Shapefile::open(dir.path().join("pt.shp")).unwrap();
    assert_eq!(opened.projection(), Some(wkt));
}

#[test]
fn test_delete_removes_siblings() {
    let dir = tempfile::tempdir().unwrap();
    save_roads(dir.path());
    fs::write(dir.path().join("roads.prj"), "GEOGCS[]").unwrap();
    fs::write(dir.path().join("notes.txt"), "keep").unwrap();

    let mut file = Shapefile::open(dir.path().join("roads.shp")).unwrap();
    file.delete().unwrap();
    assert_eq!(listing(dir.path()), vec!["notes.txt"]);
    assert!(matches!(file.geometries(), Err(Error::MissingFile(_))));
}

#[test]
fn test_external_attribute_source() {
    let dir = tempfile::tempdir().unwrap();
    save_roads(dir.path());
    let file = Shapefile::open(dir.path().join("roads.shp")).unwrap();

    let rows = MemoryRows::new(
        ["surface"],
        vec![vec![Value::from("asphalt")], vec![Value::from("gravel")]],
    );
    let mut records = file.records_with(rows).unwrap();
    assert_eq!(records.next().unwrap().unwrap().get_by_name("surface"), &Value::from("asphalt"));
    assert!(records.next().unwrap().is_ok());
    assert!(matches!(records.next(), Some(Err(Error::Desynchronized { record: 3, .. }))));
}

#[test]
fn test_schema_override() {
    let dir = tempfile::tempdir().unwrap();
    save_roads(dir.path());

    let mut file = Shapefile::open(dir.path().join("roads.shp")).unwrap();
    let mut schema = file.schema().unwrap();
    assert_eq!(schema.names(), vec!["name", "lanes"]);
    assert!(schema.set_type_token(1, "numeric"));
    schema.set_length(1, 3).unwrap();
    assert!(!schema.set_type_token(1, "nonsense"));
    file.set_schema(Some(schema));
    file.save_as("narrow", dir.path()).unwrap();

    let reopened = Shapefile::open(dir.path().join("narrow.shp")).unwrap();
    let columns: Vec<DbfColumn> = reopened.schema().unwrap().columns().cloned().collect();
    assert_eq!(columns[1], DbfColumn::new("lanes", DbfFieldType::Numeric, 3, 0));

    // A schema that does not describe the attribute fields is rejected
    let mut bad = Shapefile::open(dir.path().join("roads.shp")).unwrap();
    bad.set_schema(Some(TableSchema::new()));
    assert!(matches!(bad.save_as("bad", dir.path()), Err(Error::InvalidAttribute(_))));
}

#[test]
fn test_code_page_file_selects_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = Shapefile::new().with_options(
        ShapefileOptions::new().with_encoding(encoding_rs::WINDOWS_1252),
    );
    file.append(Record::new(vec![
        Field::new("name", "Caf\u{e9}"),
        Field::new("geom", Geometry::point(0.0, 0.0)),
    ]))
    .unwrap();
    file.save_as("cafes", dir.path()).unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("cafes.cpg")).unwrap(), "windows-1252");

    let opened = Shapefile::open(dir.path().join("cafes.shp")).unwrap();
    let record = opened.records().unwrap().next().unwrap().unwrap();
    assert_eq!(record.get_by_name("name"), &Value::from("Caf\u{e9}"));
}

#[test]
fn test_repeated_names_keep_their_columns() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = Shapefile::new();
    file.append(Record::new(vec![
        Field::new("pop", 1),
        Field::new("pop", 2),
        Field::new("geom", Geometry::point(0.0, 0.0)),
    ]))
    .unwrap();
    // Reordered: the n-th "pop" still fills the n-th pop column
    file.append(Record::new(vec![
        Field::new("geom", Geometry::point(1.0, 1.0)),
        Field::new("POP", 3),
        Field::new("pop", 4),
    ]))
    .unwrap();
    file.save_as("towns", dir.path()).unwrap();

    let opened = Shapefile::open(dir.path().join("towns.shp")).unwrap();
    assert_eq!(opened.columns().unwrap(), vec!["pop", "pop_1"]);
    let decoded: Vec<Record> = opened.records().unwrap().collect::<Result<_>>().unwrap();
    let values = |records: &[Record]| -> Vec<(i64, i64)> {
        records
            .iter()
            .map(|r| (r.get(1).unwrap().as_i64().unwrap(), r.get(2).unwrap().as_i64().unwrap()))
            .collect()
    };
    assert_eq!(values(&decoded), vec![(1, 2), (3, 4)]);

    // Decoded records carry id* first and geom* last
    let mut copy = Shapefile::new();
    for record in &decoded {
        copy.append(record.clone()).unwrap();
    }
    copy.save_as("copy", dir.path()).unwrap();
    let reopened = Shapefile::open(dir.path().join("copy.shp")).unwrap();
    let redecoded: Vec<Record> = reopened.records().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(values(&redecoded), vec![(1, 2), (3, 4)]);
    assert_eq!(redecoded, decoded);
}

#[test]
fn test_long_names_survive_resave() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = Shapefile::new();
    file.append(Record::new(vec![
        Field::new("population_a", 10),
        Field::new("population_b", 20),
        Field::new("geom", Geometry::point(0.0, 0.0)),
    ]))
    .unwrap();
    file.save_as("pop", dir.path()).unwrap();

    let mut opened = Shapefile::open(dir.path().join("pop.shp")).unwrap();
    assert_eq!(opened.columns().unwrap(), vec!["population", "populati_1"]);
    opened.save_as("pop2", dir.path()).unwrap();

    let reopened = Shapefile::open(dir.path().join("pop2.shp")).unwrap();
    let record = reopened.records().unwrap().next().unwrap().unwrap();
    assert_eq!(record.get_by_name("population"), &Value::Integer(10));
    assert_eq!(record.get_by_name("populati_1"), &Value::Integer(20));
}

#[test]
fn test_failed_write_removes_partial_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("x.dbf")).unwrap();

    let mut file = Shapefile::new();
    file.append_values([Geometry::point(0.0, 0.0)]).unwrap();
    assert!(matches!(file.save_as("x", dir.path()), Err(Error::Io(_))));
    assert_eq!(listing(dir.path()), vec!["x.dbf"]);
}

#[test]
fn test_resave_drops_stale_projection() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = Shapefile::new();
    file.set_projection(Some("GEOGCS[]".to_string()));
    file.append_values([Geometry::point(1.0, 2.0)]).unwrap();
    file.save_as("pt", dir.path()).unwrap();
    assert!(dir.path().join("pt.prj").is_file());

    file.set_projection(None);
    file.save_as("pt", dir.path()).unwrap();
    assert_eq!(listing(dir.path()), vec!["pt.cpg", "pt.dbf", "pt.shp", "pt.shx"]);
    assert_eq!(Shapefile::open(dir.path().join("pt.shp")).unwrap().projection(), None);
}
