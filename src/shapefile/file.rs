//! The `Shapefile` aggregate.

use super::config::ShapefileOptions;
use super::iter::RecordIter;
use super::paths::{Sibling, SiblingPaths};
use crate::common::encoding;
use crate::common::error::{Error, Result};
use crate::dbf::{DbfReader, DbfWriter, TableSchema};
use crate::geometry::{Envelope, Geometry, GeometryKind};
use crate::record::{AttributeSource, EmptyRows, Field, Record, Value};
use crate::shp::{RecordIndex, ShapeReader, ShapeType, ShapeWriter};
use encoding_rs::Encoding;
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::Path;

static NULL: Value = Value::Null;

/// A shapefile on disk, in memory, or both.
///
/// Opening a shapefile only parses its index; geometries and attributes are
/// decoded lazily by [`Shapefile::records`] and [`Shapefile::geometries`].
/// Appending to an opened shapefile first reads every existing record into
/// memory; [`Shapefile::save_as`] then writes the whole buffer.
#[derive(Debug, Default)]
pub struct Shapefile {
    paths: SiblingPaths,
    options: ShapefileOptions,
    /// Record count of the files on disk
    stored_count: usize,
    /// Records being built, `None` until the first append
    records: Option<Vec<Record>>,
    projection: Option<String>,
    schema: Option<TableSchema>,
    /// Encoding named by the `.cpg` file
    code_page: Option<&'static Encoding>,
}

impl Shapefile {
    /// Create an empty shapefile to be filled with [`Shapefile::append`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the shapefile containing `path`, which may name its `.shp`,
    /// `.shx` or `.dbf` file.
    ///
    /// Only the index is parsed. A `.prj` sibling is read as the projection
    /// and a `.cpg` sibling selects the attribute text encoding.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let paths = SiblingPaths::discover(path)?;

        let (_, index) = RecordIndex::read(io::BufReader::new(File::open(paths.require(Sibling::Shx)?)?))?;

        let projection = match paths.get(Sibling::Prj) {
            Some(prj) => Some(fs::read_to_string(prj)?),
            None => None,
        };

        let code_page = match paths.get(Sibling::Cpg) {
            Some(cpg) => {
                let label = fs::read_to_string(cpg)?;
                let encoding = encoding::encoding_from_cpg(&label);
                if encoding.is_none() {
                    log::warn!("Ignoring unknown code page {:?}", label.trim());
                }
                encoding
            },
            None => None,
        };

        log::debug!(
            "Opened shapefile {:?} with {} records",
            paths.shp.as_deref().or(paths.shx.as_deref()),
            index.len()
        );

        Ok(Self {
            paths,
            stored_count: index.len(),
            projection,
            code_page,
            ..Self::default()
        })
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ShapefileOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn options(&self) -> &ShapefileOptions {
        &self.options
    }

    #[inline]
    pub fn paths(&self) -> &SiblingPaths {
        &self.paths
    }

    /// Number of records, buffered ones included.
    pub fn record_count(&self) -> usize {
        match &self.records {
            Some(records) => records.len(),
            None => self.stored_count,
        }
    }

    /// Add a record to the buffer.
    ///
    /// The first append to an opened shapefile reads every stored record
    /// into memory.
    pub fn append(&mut self, record: Record) -> Result<()> {
        self.buffer()?.push(record);
        Ok(())
    }

    /// Add a record made of unnamed values.
    pub fn append_values<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.append(Record::from_values(values))
    }

    /// Records buffered in memory, if any.
    pub fn buffered(&self) -> Option<&[Record]> {
        self.records.as_deref()
    }

    /// Lazily decode the stored records.
    ///
    /// Each record holds `id*`, the attribute columns, then `geom*`. Without
    /// a `.dbf` file the records only hold the synthetic fields.
    pub fn records(&self) -> Result<RecordIter<File, Box<dyn AttributeSource>>> {
        let attributes: Box<dyn AttributeSource> = match self.open_table()? {
            Some(table) => Box::new(table),
            None => Box::new(EmptyRows::new(self.stored_count)),
        };
        Ok(RecordIter::new(self.geometries()?, attributes))
    }

    /// Lazily decode the stored records, taking attributes from `source`
    /// instead of the `.dbf` file.
    pub fn records_with<A: AttributeSource>(&self, source: A) -> Result<RecordIter<File, A>> {
        Ok(RecordIter::new(self.geometries()?, source))
    }

    /// Lazily decode the stored geometries, `None` standing for null shapes.
    pub fn geometries(&self) -> Result<ShapeReader<File>> {
        let shp = File::open(self.paths.require(Sibling::Shp)?)?;
        ShapeReader::with_capacity(self.options.buffer_capacity, shp, self.stored_count)
    }

    /// Attribute column names of the stored table.
    pub fn columns(&self) -> Result<Vec<String>> {
        Ok(match self.open_table()? {
            Some(table) => AttributeSource::columns(&table).to_vec(),
            None => Vec::new(),
        })
    }

    /// Projection WKT read from or written to the `.prj` file.
    pub fn projection(&self) -> Option<&str> {
        self.projection.as_deref()
    }

    pub fn set_projection(&mut self, wkt: Option<String>) {
        self.projection = wkt;
    }

    /// Column metadata used for the next save.
    ///
    /// Returns the schema set with [`Shapefile::set_schema`], else the
    /// columns of the stored table, else an empty schema.
    pub fn schema(&self) -> Result<TableSchema> {
        if let Some(schema) = &self.schema {
            return Ok(schema.clone());
        }
        Ok(match self.open_table()? {
            Some(table) => TableSchema::from_columns(table.columns().to_vec()),
            None => TableSchema::new(),
        })
    }

    /// Override the column metadata written by [`Shapefile::save_as`].
    ///
    /// The schema must describe every attribute field, synthetic fields and
    /// the geometry field excluded.
    pub fn set_schema(&mut self, schema: Option<TableSchema>) {
        self.schema = schema;
    }

    /// Write `name.shx`, `name.shp`, `name.dbf` and, when set, `name.prj`
    /// into `dir`.
    ///
    /// The geometry field and shape type are taken from the first record
    /// holding a geometry. Records with that record's field names in the
    /// same order are matched by position; others by name, the n-th field of
    /// a repeated name filling the n-th column of that name.
    ///
    /// Every file is encoded in memory before anything is written. If a
    /// write fails, the files already written by this call are removed.
    pub fn save_as(&mut self, name: &str, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        self.buffer()?;
        let records = self.records.as_deref().unwrap_or_default();
        if records.is_empty() {
            return Err(Error::NothingToSave);
        }

        let layout = Layout::classify(records)?;
        let shape_type = layout.shape_type;
        let geometries = records
            .iter()
            .enumerate()
            .map(|(i, record)| layout.geometry_of(record, i))
            .collect::<Result<Vec<_>>>()?;

        let index = RecordIndex::build(shape_type, geometries.iter().copied())?;

        let mut shx = Cursor::new(Vec::new());
        index.write(&mut shx, shape_type, Envelope::WHOLE_EARTH)?;

        let mut shp = ShapeWriter::new(Vec::new());
        shp.write(shape_type, &index, &geometries, Envelope::WHOLE_EARTH)?;

        let text_encoding = self.write_encoding();
        let dbf = encode_table(
            records,
            &layout,
            self.schema.as_ref(),
            self.options.default_text_width,
            text_encoding,
        )?;

        if !dir.exists() && self.options.create_dirs {
            fs::create_dir_all(dir)?;
        }

        let target = SiblingPaths::in_dir(dir, name);
        let mut written = SiblingPaths::default();
        let mut files: Vec<(Sibling, Vec<u8>)> = vec![
            (Sibling::Shx, shx.into_inner()),
            (Sibling::Shp, shp.into_inner()),
            (Sibling::Dbf, dbf),
        ];
        if self.options.write_projection
            && let Some(wkt) = &self.projection
        {
            files.push((Sibling::Prj, wkt.clone().into_bytes()));
        }
        if self.options.write_code_page {
            files.push((Sibling::Cpg, text_encoding.name().as_bytes().to_vec()));
        }

        for (sibling, data) in files {
            let path = target.get(sibling).map(Path::to_path_buf).unwrap_or_default();
            if let Err(e) = fs::write(&path, data) {
                remove_all(&written);
                return Err(e.into());
            }
            *written.slot(sibling) = Some(path);
        }

        // A .prj or .cpg left by an earlier save under this name
        for sibling in [Sibling::Prj, Sibling::Cpg] {
            if written.get(sibling).is_none()
                && let Some(stale) = target.get(sibling)
                && stale.is_file()
            {
                fs::remove_file(stale)?;
                log::debug!("Removed stale {}", stale.display());
            }
        }

        log::debug!(
            "Saved {} {} records to {}",
            records.len(),
            shape_type.name(),
            dir.join(name).display()
        );

        self.stored_count = records.len();
        self.paths = written;
        if self.options.write_code_page {
            self.code_page = Some(text_encoding);
        }
        Ok(())
    }

    /// Remove every sibling file that exists.
    pub fn delete(&mut self) -> Result<()> {
        for path in self.paths.iter() {
            match fs::remove_file(path) {
                Ok(()) => log::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {},
                Err(e) => return Err(e.into()),
            }
        }
        self.paths = SiblingPaths::default();
        self.stored_count = 0;
        Ok(())
    }

    /// The record buffer, filled from disk on first use.
    fn buffer(&mut self) -> Result<&mut Vec<Record>> {
        if self.records.is_none() {
            let records = if self.paths.shp.is_some() {
                log::debug!("Reading {} records into memory", self.stored_count);
                self.records()?.collect::<Result<Vec<_>>>()?
            } else {
                Vec::new()
            };
            self.records = Some(records);
        }
        Ok(self.records.get_or_insert_with(Vec::new))
    }

    fn open_table(&self) -> Result<Option<DbfReader<File>>> {
        let Some(path) = self.paths.get(Sibling::Dbf) else {
            return Ok(None);
        };
        let mut table = DbfReader::with_capacity(self.options.buffer_capacity, File::open(path)?)?;
        if let Some(encoding) = self.options.encoding.or(self.code_page) {
            table = table.with_encoding(encoding);
        }
        Ok(Some(table))
    }

    fn write_encoding(&self) -> &'static Encoding {
        self.options.encoding.or(self.code_page).unwrap_or(encoding_rs::UTF_8)
    }
}

/// A field of the record layout.
#[derive(Debug, Clone, Copy)]
struct Slot<'a> {
    name: Option<&'a str>,
    /// Number of earlier layout fields carrying the same name
    occurrence: usize,
    position: usize,
}

impl<'a> Slot<'a> {
    /// The matching field of `record`.
    ///
    /// Aligned records are matched by position. Otherwise a named slot takes
    /// the field with its name and occurrence, and an unnamed slot falls back
    /// to its position.
    fn value_in<'r>(self, record: &'r Record, aligned: bool) -> &'r Value {
        match self.name {
            Some(name) if !aligned => record
                .fields()
                .iter()
                .filter(|f| f.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
                .nth(self.occurrence)
                .map_or(&NULL, Field::value),
            _ => record.get(self.position).unwrap_or(&NULL),
        }
    }
}

/// Field layout of a record set, taken from the first record holding a
/// geometry.
struct Layout<'a> {
    /// Field names of the layout record, in order
    names: Vec<Option<&'a str>>,
    geometry: Slot<'a>,
    attributes: Vec<Slot<'a>>,
    shape_type: ShapeType,
}

impl<'a> Layout<'a> {
    /// Find the geometry field and the shape type of the file.
    ///
    /// A point column that also holds multipoints is written as a
    /// multipoint file. Attribute columns are the remaining fields,
    /// synthetic ones excluded.
    fn classify(records: &'a [Record]) -> Result<Self> {
        let (record, position, geometry) = records
            .iter()
            .find_map(|r| r.geometry().map(|(i, g)| (r, i, g)))
            .ok_or(Error::MissingGeometry)?;

        let names: Vec<Option<&'a str>> = record.fields().iter().map(Field::name).collect();
        let slot = |position: usize| {
            let name = names[position];
            let occurrence = match name {
                Some(name) => names[..position]
                    .iter()
                    .filter(|n| n.is_some_and(|n| n.eq_ignore_ascii_case(name)))
                    .count(),
                None => 0,
            };
            Slot { name, occurrence, position }
        };

        let geometry_slot = slot(position);
        let attributes = record
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, f)| *i != position && !f.is_synthetic())
            .map(|(i, _)| slot(i))
            .collect();

        let mut layout = Self {
            names,
            geometry: geometry_slot,
            attributes,
            shape_type: ShapeType::of(geometry),
        };

        if layout.shape_type == ShapeType::Point
            && records.iter().any(|r| {
                matches!(
                    layout.geometry_value(r).as_geometry().map(Geometry::kind),
                    Some(GeometryKind::MultiPoint(_))
                )
            })
        {
            layout.shape_type = ShapeType::MultiPoint;
        }
        Ok(layout)
    }

    /// Whether `record` carries the layout's field names in the layout's
    /// order.
    fn is_aligned(&self, record: &Record) -> bool {
        record.len() == self.names.len()
            && record.fields().iter().zip(&self.names).all(|(field, name)| {
                match (field.name(), name) {
                    (None, None) => true,
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    _ => false,
                }
            })
    }

    fn geometry_value<'r>(&self, record: &'r Record) -> &'r Value {
        self.geometry.value_in(record, self.is_aligned(record))
    }

    fn geometry_of<'r>(&self, record: &'r Record, index: usize) -> Result<Option<&'r Geometry>> {
        match self.geometry_value(record) {
            Value::Null => Ok(None),
            Value::Geometry(g) => Ok(Some(g)),
            other => Err(Error::ShapeTypeMismatch {
                record: index,
                expected: self.shape_type.name(),
                found: other.value_type().name(),
            }),
        }
    }

    /// Attribute values of `record` in column order.
    fn attributes_of<'r>(&self, record: &'r Record) -> impl Iterator<Item = &'r Value> {
        let aligned = self.is_aligned(record);
        self.attributes.iter().map(move |slot| slot.value_in(record, aligned))
    }

    /// Column names, unnamed fields numbered from 1.
    fn column_names(&self) -> Vec<String> {
        self.attributes
            .iter()
            .enumerate()
            .map(|(n, slot)| match slot.name {
                Some(name) => name.to_string(),
                None => format!("FIELD_{}", n + 1),
            })
            .collect()
    }
}

/// Remove the files of a partial save.
fn remove_all(written: &SiblingPaths) {
    for path in written.iter() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

/// Encode the attribute fields of `records` as a `.dbf` table.
fn encode_table(
    records: &[Record],
    layout: &Layout<'_>,
    schema: Option<&TableSchema>,
    default_text_width: u8,
    text_encoding: &'static Encoding,
) -> Result<Vec<u8>> {
    let slots = layout.attributes.as_slice();
    let rows = move || records.iter().map(move |r| layout.attributes_of(r));

    let columns = match schema {
        Some(schema) => {
            if schema.len() != slots.len() {
                return Err(Error::InvalidAttribute(format!(
                    "Schema describes {} columns but records hold {} attribute fields",
                    schema.len(),
                    slots.len()
                )));
            }
            schema.columns().cloned().collect()
        },
        None => TableSchema::infer(&layout.column_names(), rows(), default_text_width).into_columns(),
    };

    let mut writer = DbfWriter::new(Vec::new()).with_encoding(text_encoding);
    writer.write(&columns, rows())?;
    Ok(writer.into_inner())
}
