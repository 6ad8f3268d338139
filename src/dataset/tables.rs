//! CSV table readers.
//!
//! Columns are resolved by header name, so column order and extra columns
//! (such as a pandas index) do not matter. Missing required columns or
//! cells fail the load. Text cells are kept verbatim; only numeric and flag
//! cells are trimmed before parsing.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use tracing::info;

use crate::error::LoadError;
use crate::models::{ClusteredListing, Listing, NeighborhoodRow};

pub const LISTINGS: &str = "listings";
pub const NEIGHBORHOODS: &str = "neighborhoods";
pub const CLUSTERED: &str = "clustered listings";

/// Open a table file, transparently decompressing `.gz` files
pub fn open_table(path: &Path, table: &'static str) -> Result<Box<dyn Read>, LoadError> {
    info!("Opening {} table from {}", table, path.display());

    let file = File::open(path).map_err(|source| LoadError::Io { table, source })?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Read the listings table
pub fn read_listings<R: Read>(reader: R) -> Result<Vec<Listing>, LoadError> {
    let mut table = Table::new(reader, LISTINGS)?;

    let latitude = table.required("LATITUDE")?;
    let longitude = table.required("LONGITUDE")?;
    let price = table.required("PRICE")?;
    let area = table.required("CONSTRUCTEDAREA")?;
    let rooms = table.required("ROOMNUMBER")?;
    let neighborhood = table.required("NEIGHBORHOOD")?;
    let build_type = table.optional(&["BUILDTYPE"]);
    let new_flag = table.optional(&["BUILTTYPEID_1", "BUILDTYPEID_1"]);

    let mut listings = Vec::new();
    for (row, record) in table.records() {
        let record = record?;
        let listing = Listing {
            latitude: latitude.finite(&record, row)?,
            longitude: longitude.finite(&record, row)?,
            price: price.positive(&record, row)?,
            constructed_area: area.positive(&record, row)?,
            room_number: rooms.count(&record, row)?,
            build_type: build_type
                .as_ref()
                .map(|c| c.text(&record).to_string())
                .unwrap_or_default(),
            neighborhood_id: neighborhood.non_empty(&record, row)?.to_string(),
            is_new_construction: match &new_flag {
                Some(c) => c.flag(&record, row)?,
                None => false,
            },
        };
        listings.push(listing);
    }

    info!("Read {} listings", listings.len());
    Ok(listings)
}

/// Read the neighborhood polygons table
pub fn read_neighborhoods<R: Read>(reader: R) -> Result<Vec<NeighborhoodRow>, LoadError> {
    let mut table = Table::new(reader, NEIGHBORHOODS)?;

    let name = table.required("NEIGHBORHOOD")?;
    let shape = table.required("GEO_SHAPE")?;
    let total = table.required("REAL_ESTATE_TOTAL")?;
    let price = table.required("PRICE_MEAN")?;
    let quality = table.required("QUALITY_MEAN")?;
    let age = table.required("AGE_MEAN")?;

    let mut rows = Vec::new();
    for (row, record) in table.records() {
        let record = record?;
        rows.push(NeighborhoodRow {
            name: name.non_empty(&record, row)?.to_string(),
            geo_shape: shape.non_empty(&record, row)?.to_string(),
            listing_count: total.optional_count(&record, row)?.map(u64::from),
            mean_price: price.optional_finite(&record, row)?,
            mean_quality: quality.optional_finite(&record, row)?,
            mean_age: age.optional_finite(&record, row)?,
        });
    }

    info!("Read {} neighborhood rows", rows.len());
    Ok(rows)
}

/// Read the pre-clustered listings table; only position and label are kept
pub fn read_clustered<R: Read>(reader: R) -> Result<Vec<ClusteredListing>, LoadError> {
    let mut table = Table::new(reader, CLUSTERED)?;

    let latitude = table.required("LATITUDE")?;
    let longitude = table.required("LONGITUDE")?;
    let cluster = table.required("CLUSTER")?;

    let mut rows = Vec::new();
    for (row, record) in table.records() {
        let record = record?;
        rows.push(ClusteredListing {
            latitude: latitude.finite(&record, row)?,
            longitude: longitude.finite(&record, row)?,
            cluster: cluster.non_empty(&record, row)?.to_string(),
        });
    }

    info!("Read {} clustered listings", rows.len());
    Ok(rows)
}

/// A CSV reader with its header row already resolved
struct Table<R: Read> {
    name: &'static str,
    reader: csv::Reader<R>,
    headers: StringRecord,
}

impl<R: Read> Table<R> {
    fn new(reader: R, name: &'static str) -> Result<Self, LoadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::Headers)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|source| LoadError::Csv { table: name, source })?
            .clone();
        Ok(Self {
            name,
            reader,
            headers,
        })
    }

    fn required(&self, column: &'static str) -> Result<Column, LoadError> {
        self.position(column)
            .map(|index| Column {
                table: self.name,
                name: column,
                index,
            })
            .ok_or(LoadError::MissingColumn {
                table: self.name,
                column,
            })
    }

    /// First present column among `aliases`
    fn optional(&self, aliases: &[&'static str]) -> Option<Column> {
        aliases.iter().find_map(|&column| {
            self.position(column).map(|index| Column {
                table: self.name,
                name: column,
                index,
            })
        })
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Data records numbered from 1
    fn records(
        &mut self,
    ) -> impl Iterator<Item = (usize, Result<StringRecord, LoadError>)> + '_ {
        let table = self.name;
        self.reader.records().enumerate().map(move |(i, record)| {
            (
                i + 1,
                record.map_err(|source| LoadError::Csv { table, source }),
            )
        })
    }
}

/// A resolved column and the typed cell accessors used by the readers
struct Column {
    table: &'static str,
    name: &'static str,
    index: usize,
}

impl Column {
    fn text<'r>(&self, record: &'r StringRecord) -> &'r str {
        record.get(self.index).unwrap_or("")
    }

    /// The raw cell, rejected if blank
    fn non_empty<'r>(&self, record: &'r StringRecord, row: usize) -> Result<&'r str, LoadError> {
        let value = self.text(record);
        if value.trim().is_empty() {
            return Err(LoadError::MissingValue {
                table: self.table,
                row,
                column: self.name,
            });
        }
        Ok(value)
    }

    fn invalid(&self, row: usize, value: &str) -> LoadError {
        LoadError::InvalidValue {
            table: self.table,
            row,
            column: self.name,
            value: value.to_string(),
        }
    }

    fn finite(&self, record: &StringRecord, row: usize) -> Result<f64, LoadError> {
        let value = self.non_empty(record, row)?.trim();
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(row, value))
    }

    fn positive(&self, record: &StringRecord, row: usize) -> Result<f64, LoadError> {
        let parsed = self.finite(record, row)?;
        if parsed <= 0.0 {
            return Err(self.invalid(row, self.text(record).trim()));
        }
        Ok(parsed)
    }

    fn optional_finite(&self, record: &StringRecord, row: usize) -> Result<Option<f64>, LoadError> {
        if self.text(record).trim().is_empty() {
            return Ok(None);
        }
        self.finite(record, row).map(Some)
    }

    /// Non-negative integer; a float cell with no fractional part is accepted
    fn count(&self, record: &StringRecord, row: usize) -> Result<u32, LoadError> {
        let value = self.non_empty(record, row)?.trim();
        if let Ok(n) = value.parse::<u32>() {
            return Ok(n);
        }
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX))
            .map(|v| v as u32)
            .ok_or_else(|| self.invalid(row, value))
    }

    fn optional_count(&self, record: &StringRecord, row: usize) -> Result<Option<u32>, LoadError> {
        if self.text(record).trim().is_empty() {
            return Ok(None);
        }
        self.count(record, row).map(Some)
    }

    /// Boolean flag column; empty cells read as false
    fn flag(&self, record: &StringRecord, row: usize) -> Result<bool, LoadError> {
        match self.text(record).trim() {
            "" | "0" | "0.0" | "False" | "false" => Ok(false),
            "1" | "1.0" | "True" | "true" => Ok(true),
            other => Err(self.invalid(row, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const LISTINGS_CSV: &str = "\
,ASSETID,PRICE,CONSTRUCTEDAREA,ROOMNUMBER,BUILDTYPE,BUILTTYPEID_1,LATITUDE,LONGITUDE,NEIGHBORHOOD
0,A1,100000,60,1,secondhand,0,39.47,-0.37,EL CARME
1,A2,200000.0,90,2.0,newdevelopment,1,39.46,-0.36,RUSSAFA
";

    #[test]
    fn test_read_listings() {
        let listings = read_listings(Cursor::new(LISTINGS_CSV)).unwrap();
        assert_eq!(listings.len(), 2);

        let second = &listings[1];
        assert_eq!(second.price, 200_000.0);
        assert_eq!(second.room_number, 2);
        assert_eq!(second.build_type, "newdevelopment");
        assert_eq!(second.neighborhood_id, "RUSSAFA");
        assert!(second.is_new_construction);
        assert!(!listings[0].is_new_construction);
    }

    #[test]
    fn test_optional_listing_columns() {
        let csv = "LATITUDE,LONGITUDE,PRICE,CONSTRUCTEDAREA,ROOMNUMBER,NEIGHBORHOOD,BUILDTYPEID_1\n\
                   39.47,-0.37,100000,60,1,EL CARME,1\n";
        let listings = read_listings(Cursor::new(csv)).unwrap();
        assert_eq!(listings[0].build_type, "");
        assert!(listings[0].is_new_construction);

        let csv = "LATITUDE,LONGITUDE,PRICE,CONSTRUCTEDAREA,ROOMNUMBER,NEIGHBORHOOD\n\
                   39.47,-0.37,100000,60,1,EL CARME\n";
        let listings = read_listings(Cursor::new(csv)).unwrap();
        assert!(!listings[0].is_new_construction);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "LATITUDE,LONGITUDE,PRICE,ROOMNUMBER,NEIGHBORHOOD\n39.47,-0.37,1,1,X\n";
        let err = read_listings(Cursor::new(csv)).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                column: "CONSTRUCTEDAREA",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_required_cell() {
        let csv = "LATITUDE,LONGITUDE,PRICE,CONSTRUCTEDAREA,ROOMNUMBER,NEIGHBORHOOD\n\
                   39.47,-0.37,100000,60,1,EL CARME\n\
                   39.47,-0.37,,60,1,EL CARME\n";
        let err = read_listings(Cursor::new(csv)).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingValue {
                row: 2,
                column: "PRICE",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let negative_price = "LATITUDE,LONGITUDE,PRICE,CONSTRUCTEDAREA,ROOMNUMBER,NEIGHBORHOOD\n\
                              39.47,-0.37,-5,60,1,EL CARME\n";
        assert!(matches!(
            read_listings(Cursor::new(negative_price)).unwrap_err(),
            LoadError::InvalidValue { column: "PRICE", .. }
        ));

        let fractional_rooms = "LATITUDE,LONGITUDE,PRICE,CONSTRUCTEDAREA,ROOMNUMBER,NEIGHBORHOOD\n\
                                39.47,-0.37,100000,60,1.5,EL CARME\n";
        assert!(matches!(
            read_listings(Cursor::new(fractional_rooms)).unwrap_err(),
            LoadError::InvalidValue {
                column: "ROOMNUMBER",
                ..
            }
        ));
    }

    #[test]
    fn test_read_neighborhoods_with_empty_aggregates() {
        let csv = "NEIGHBORHOOD,GEO_SHAPE,REAL_ESTATE_TOTAL,PRICE_MEAN,QUALITY_MEAN,AGE_MEAN\n\
                   EL CARME,\"POLYGON ((0 0, 1 0, 1 1, 0 0))\",12,250000.5,,40\n";
        let rows = read_neighborhoods(Cursor::new(csv)).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "EL CARME");
        assert_eq!(rows[0].geo_shape, "POLYGON ((0 0, 1 0, 1 1, 0 0))");
        assert_eq!(rows[0].listing_count, Some(12));
        assert_eq!(rows[0].mean_price, Some(250_000.5));
        assert_eq!(rows[0].mean_quality, None);
        assert_eq!(rows[0].mean_age, Some(40.0));
    }

    #[test]
    fn test_neighborhood_names_are_kept_verbatim() {
        let csv = "NEIGHBORHOOD,GEO_SHAPE,REAL_ESTATE_TOTAL,PRICE_MEAN,QUALITY_MEAN,AGE_MEAN\n\
                   \" RUSSAFA \",\"POLYGON ((0 0, 1 0, 1 1, 0 0))\", 12 , 250000 ,,40\n";
        let rows = read_neighborhoods(Cursor::new(csv)).unwrap();

        assert_eq!(rows[0].name, " RUSSAFA ");
        assert_eq!(rows[0].listing_count, Some(12));
        assert_eq!(rows[0].mean_price, Some(250_000.0));

        let csv = "LATITUDE,LONGITUDE,PRICE,CONSTRUCTEDAREA,ROOMNUMBER,NEIGHBORHOOD,BUILTTYPEID_1\n\
                   39.47, -0.37 ,100000, 60 , 2 , RUSSAFA , 1 \n";
        let listings = read_listings(Cursor::new(csv)).unwrap();
        assert_eq!(listings[0].neighborhood_id, " RUSSAFA ");
        assert_eq!(listings[0].longitude, -0.37);
        assert_eq!(listings[0].room_number, 2);
        assert!(listings[0].is_new_construction);
    }

    #[test]
    fn test_blank_name_is_missing() {
        let csv = "LATITUDE,LONGITUDE,PRICE,CONSTRUCTEDAREA,ROOMNUMBER,NEIGHBORHOOD\n\
                   39.47,-0.37,100000,60,1,   \n";
        assert!(matches!(
            read_listings(Cursor::new(csv)).unwrap_err(),
            LoadError::MissingValue {
                column: "NEIGHBORHOOD",
                ..
            }
        ));
    }

    #[test]
    fn test_neighborhoods_require_shape_column() {
        let csv = "NEIGHBORHOOD,REAL_ESTATE_TOTAL,PRICE_MEAN,QUALITY_MEAN,AGE_MEAN\nX,1,1,1,1\n";
        assert!(matches!(
            read_neighborhoods(Cursor::new(csv)).unwrap_err(),
            LoadError::MissingColumn {
                column: "GEO_SHAPE",
                ..
            }
        ));
    }

    #[test]
    fn test_read_clustered_keeps_label_opaque() {
        let csv = "LATITUDE,LONGITUDE,PRICE,CLUSTER\n39.47,-0.37,100000,2\n39.46,-0.36,90000,0\n";
        let rows = read_clustered(Cursor::new(csv)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cluster, "2");
        assert_eq!(rows[1].cluster, "0");
    }

    #[test]
    fn test_open_gzipped_table() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sale.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(LISTINGS_CSV.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let listings = read_listings(open_table(&path, LISTINGS).unwrap()).unwrap();
        assert_eq!(listings.len(), 2);
    }

    #[test]
    fn test_open_missing_table() {
        let opened = open_table(Path::new("/nonexistent/sale.csv"), LISTINGS);
        assert!(matches!(opened, Err(LoadError::Io { .. })));
    }
}
