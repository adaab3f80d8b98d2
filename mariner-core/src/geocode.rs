//! Geocoding against the provisioned zip code table.

use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{LookupError, StoreError};
use crate::fetch::{BoxFuture, Geocoder};
use crate::model::Location;

/// Resolves "02633", "02633-1234" or "Chatham, MA" using the local index.
#[derive(Debug, Clone)]
pub struct LocalGeocoder {
    db: Arc<Database>,
}

impl LocalGeocoder {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn lookup(&self, query: &str) -> Result<Location, LookupError> {
        let query = query.trim();
        let location = if let Some(zip) = zip_prefix(query) {
            self.db
                .with_conn(|conn| by_zipcode(conn, zip))?
                .ok_or_else(|| LookupError::ZipNotFound(zip.to_string()))?
        } else {
            let (city, state) = split_city_state(query).ok_or(LookupError::InvalidQuery)?;
            self.db
                .with_conn(|conn| by_city_state(conn, city, state))?
                .ok_or_else(|| LookupError::PlaceNotFound(query.to_string()))?
        };
        debug!(query, name = %location.display_name, "Geocoded");
        Ok(location)
    }
}

impl Geocoder for LocalGeocoder {
    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Location, LookupError>> {
        let this = self.clone();
        let query = query.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || this.lookup(&query))
                .await
                .map_err(StoreError::from)?
        })
    }
}

/// Asks `remote` for any non-zip query the local index cannot answer, which
/// covers place names without a state ("Cape Cod") as well as unknown towns.
///
/// Zip codes are answered by `local` alone.
pub struct FallbackGeocoder {
    local: Arc<dyn Geocoder>,
    remote: Arc<dyn Geocoder>,
}

impl FallbackGeocoder {
    pub fn new(local: Arc<dyn Geocoder>, remote: Arc<dyn Geocoder>) -> Self {
        Self { local, remote }
    }
}

impl Geocoder for FallbackGeocoder {
    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Location, LookupError>> {
        Box::pin(async move {
            match self.local.geocode(query).await {
                Err(LookupError::PlaceNotFound(_) | LookupError::InvalidQuery)
                    if zip_prefix(query.trim()).is_none() =>
                {
                    info!(query, "Not in the zip index, trying the remote geocoder");
                    self.remote.geocode(query).await
                }
                other => other,
            }
        })
    }
}

/// Five-digit zip of a `NNNNN` or `NNNNN-NNNN` query.
fn zip_prefix(query: &str) -> Option<&str> {
    let bytes = query.as_bytes();
    let digits = |s: &[u8]| s.iter().all(u8::is_ascii_digit);
    match bytes.len() {
        5 if digits(bytes) => Some(query),
        10 if digits(&bytes[..5]) && bytes[5] == b'-' && digits(&bytes[6..]) => Some(&query[..5]),
        _ => None,
    }
}

fn split_city_state(query: &str) -> Option<(&str, &str)> {
    let (city, state) = query.split_once(',')?;
    let (city, state) = (city.trim(), state.trim());
    (!city.is_empty() && !state.is_empty()).then_some((city, state))
}

fn by_zipcode(conn: &Connection, zip: &str) -> Result<Option<Location>, LookupError> {
    conn.query_row(
        "SELECT zipcode, city, state, lat, lon FROM zipcodes WHERE zipcode = ?1",
        [zip],
        location_from_row,
    )
    .optional()
    .map_err(LookupError::from)
}

fn by_city_state(
    conn: &Connection,
    city: &str,
    state: &str,
) -> Result<Option<Location>, LookupError> {
    conn.query_row(
        "SELECT zipcode, city, state, lat, lon FROM zipcodes
         WHERE city = ?1 COLLATE NOCASE AND state = ?2 COLLATE NOCASE
         ORDER BY zipcode LIMIT 1",
        [city, state],
        location_from_row,
    )
    .optional()
    .map_err(LookupError::from)
}

fn location_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Location> {
    let zipcode: String = row.get(0)?;
    let city: String = row.get(1)?;
    let state: String = row.get(2)?;
    Ok(Location {
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        display_name: format!("{city}, {state} {zipcode}"),
        city,
        state,
        zipcode,
    })
}
