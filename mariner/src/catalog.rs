//! Provisioning sources.
//!
//! Marine zones come from the NWS marine zone shapefile, downloaded as a zip
//! and read in memory (`ID`, `NAME`, `LON`, `LAT` attributes per polygon). A
//! local CSV export with the same columns can stand in for it. Zip codes are
//! downloaded from the public free_zipcode_data CSV
//! (`code,city,state,county,area_code,lat,lon`). Tide stations come from
//! [`NoaaClient`](crate::noaa::NoaaClient) through `StationSearch`.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use mariner_core::provision::{ZipRecord, ZoneRecord};
use mariner_core::{BoxFuture, GeoPoint, ProvisionError, ZipCatalog, ZoneCatalog};
use serde::Deserialize;
use shapefile::dbase::{FieldValue, Record};
use shapefile::Shape;
use tracing::{debug, info, warn};

/// NWS marine zone boundaries, updated a few times a year.
pub const MARINE_ZONES_URL: &str =
    "https://www.weather.gov/source/gis/Shapefiles/WSOM/mz18mr25.zip";
/// File stem of the `.shp`/`.dbf` pair inside [`MARINE_ZONES_URL`].
pub const MARINE_ZONES_BASE: &str = "mz18mr25";

pub const ZIPCODE_CSV_URL: &str =
    "https://raw.githubusercontent.com/midwire/free_zipcode_data/develop/all_us_zipcodes.csv";

const ZONES: &str = "marine zones";
const ZIPCODES: &str = "zipcodes";

fn catalog_error(catalog: &'static str, reason: impl ToString) -> ProvisionError {
    ProvisionError::Catalog {
        catalog,
        reason: reason.to_string(),
    }
}

// ============================================================================
// Marine zones
// ============================================================================

/// Downloads the NWS marine zone shapefile archive and reads it in memory.
#[derive(Debug, Clone)]
pub struct ShapefileZoneCatalog {
    http: reqwest::Client,
    url: String,
    base: String,
}

impl ShapefileZoneCatalog {
    pub fn new(http: reqwest::Client, url: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            base: base.into(),
        }
    }
}

impl ZoneCatalog for ShapefileZoneCatalog {
    fn marine_zones(&self) -> BoxFuture<'_, Result<Vec<ZoneRecord>, ProvisionError>> {
        Box::pin(async move {
            info!(url = %self.url, "Downloading marine zone shapefile");
            let response = self
                .http
                .get(&self.url)
                .send()
                .await
                .map_err(|err| catalog_error(ZONES, err))?;
            let status = response.status();
            if !status.is_success() {
                return Err(catalog_error(ZONES, format!("server returned status {status}")));
            }
            let body = response
                .bytes()
                .await
                .map_err(|err| catalog_error(ZONES, err))?;
            let base = self.base.clone();
            let zones =
                tokio::task::spawn_blocking(move || parse_zone_archive(&body, &base)).await??;
            info!(count = zones.len(), "Read marine zone shapefile");
            Ok(zones)
        })
    }
}

/// Reads `<base>.shp` and `<base>.dbf` out of a zip archive.
pub fn parse_zone_archive(data: &[u8], base: &str) -> Result<Vec<ZoneRecord>, ProvisionError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).map_err(|err| catalog_error(ZONES, err))?;
    let shp = extract(&mut archive, &format!("{base}.shp"))?;
    let dbf = extract(&mut archive, &format!("{base}.dbf"))?;
    parse_zone_shapefile(shp, dbf)
}

fn extract(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    file_name: &str,
) -> Result<Vec<u8>, ProvisionError> {
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|err| catalog_error(ZONES, err))?;
        // Entries may sit under a directory.
        let matches = Path::new(file.name())
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.eq_ignore_ascii_case(file_name));
        if matches {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)
                .map_err(|err| catalog_error(ZONES, err))?;
            return Ok(contents);
        }
    }
    Err(catalog_error(ZONES, format!("archive has no {file_name}")))
}

/// Polygons only; records without a code or a centroid are skipped.
pub fn parse_zone_shapefile(
    shp: Vec<u8>,
    dbf: Vec<u8>,
) -> Result<Vec<ZoneRecord>, ProvisionError> {
    let shapes =
        shapefile::ShapeReader::new(Cursor::new(shp)).map_err(|err| catalog_error(ZONES, err))?;
    let table = shapefile::dbase::Reader::new(Cursor::new(dbf))
        .map_err(|err| catalog_error(ZONES, err))?;
    let mut reader = shapefile::Reader::new(shapes, table);

    let mut zones = Vec::new();
    let mut skipped = 0usize;
    for item in reader.iter_shapes_and_records() {
        let (shape, record) = item.map_err(|err| catalog_error(ZONES, err))?;
        if !matches!(shape, Shape::Polygon(_)) {
            skipped += 1;
            continue;
        }
        match zone_from_record(&record) {
            Some(zone) => zones.push(zone),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "Skipped marine zone shapes");
    }
    if zones.is_empty() {
        return Err(catalog_error(ZONES, "catalogue has no zones"));
    }
    Ok(zones)
}

fn zone_from_record(record: &Record) -> Option<ZoneRecord> {
    let code = text(record.get("ID"))?;
    let name = text(record.get("NAME")).unwrap_or_default();
    let lon = number(record.get("LON"))?;
    let lat = number(record.get("LAT"))?;
    Some(ZoneRecord {
        code: code.to_ascii_uppercase(),
        name,
        center: GeoPoint::new(lat, lon),
    })
}

fn text(value: Option<&FieldValue>) -> Option<String> {
    let text = match value? {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => s.trim(),
        _ => return None,
    };
    (!text.is_empty()).then(|| text.to_string())
}

fn number(value: Option<&FieldValue>) -> Option<f64> {
    match value? {
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) => Some(*n),
        FieldValue::Float(Some(n)) => Some(f64::from(*n)),
        FieldValue::Character(Some(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct ZoneRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "NAME")]
    name: String,
    #[serde(rename = "LON")]
    lon: f64,
    #[serde(rename = "LAT")]
    lat: f64,
}

#[derive(Debug, Clone)]
pub struct CsvZoneCatalog {
    path: PathBuf,
}

impl CsvZoneCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ZoneCatalog for CsvZoneCatalog {
    fn marine_zones(&self) -> BoxFuture<'_, Result<Vec<ZoneRecord>, ProvisionError>> {
        let path = self.path.clone();
        Box::pin(async move {
            let data = tokio::task::spawn_blocking(move || std::fs::read(&path))
                .await?
                .map_err(|err| catalog_error(ZONES, format!("{}: {err}", self.path.display())))?;
            let zones = parse_zone_csv(&data)?;
            info!(count = zones.len(), path = %self.path.display(), "Read marine zone catalogue");
            Ok(zones)
        })
    }
}

/// Rows that fail to parse are skipped; a header mismatch fails the catalogue.
pub fn parse_zone_csv(data: &[u8]) -> Result<Vec<ZoneRecord>, ProvisionError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(data);
    let headers = reader.headers().map_err(|err| catalog_error(ZONES, err))?;
    for column in ["ID", "NAME", "LON", "LAT"] {
        if !headers.iter().any(|h| h == column) {
            return Err(catalog_error(ZONES, format!("missing column {column}")));
        }
    }

    let mut zones = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<ZoneRow>() {
        match row {
            Ok(row) if !row.id.is_empty() => zones.push(ZoneRecord {
                code: row.id.to_ascii_uppercase(),
                name: row.name,
                center: GeoPoint::new(row.lat, row.lon),
            }),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "Skipped unreadable marine zone rows");
    }
    if zones.is_empty() {
        return Err(catalog_error(ZONES, "catalogue has no zones"));
    }
    Ok(zones)
}

// ============================================================================
// Zip codes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ZipRow {
    code: String,
    city: String,
    state: String,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct HttpZipCatalog {
    http: reqwest::Client,
    url: String,
}

impl HttpZipCatalog {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

impl ZipCatalog for HttpZipCatalog {
    fn zipcodes(&self) -> BoxFuture<'_, Result<Vec<ZipRecord>, ProvisionError>> {
        Box::pin(async move {
            let response = self
                .http
                .get(&self.url)
                .send()
                .await
                .map_err(|err| catalog_error(ZIPCODES, err))?;
            let status = response.status();
            if !status.is_success() {
                return Err(catalog_error(ZIPCODES, format!("server returned status {status}")));
            }
            let body = response
                .bytes()
                .await
                .map_err(|err| catalog_error(ZIPCODES, err))?;
            let records = tokio::task::spawn_blocking(move || parse_zip_csv(&body)).await??;
            info!(count = records.len(), "Downloaded zipcode catalogue");
            Ok(records)
        })
    }
}

/// Rows without coordinates (PO boxes, military codes) are skipped.
pub fn parse_zip_csv(data: &[u8]) -> Result<Vec<ZipRecord>, ProvisionError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);
    let mut records = Vec::new();
    for row in reader.deserialize::<ZipRow>() {
        let row = match row {
            Ok(row) => row,
            Err(err) if err.is_io_error() => return Err(catalog_error(ZIPCODES, err)),
            Err(_) => continue,
        };
        let (Some(lat), Some(lon)) = (row.lat, row.lon) else {
            continue;
        };
        if row.code.len() != 5 || !row.code.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        records.push(ZipRecord {
            zipcode: row.code,
            city: row.city,
            state: row.state.to_ascii_uppercase(),
            point: GeoPoint::new(lat, lon),
        });
    }
    if records.is_empty() {
        return Err(catalog_error(ZIPCODES, "catalogue has no usable rows"));
    }
    Ok(records)
}
