//! Terminal front end for [`mariner_core`]: NOAA clients, provisioning
//! sources, ratatui views and the event loop that ties them together.

use std::path::Path;
use std::sync::Arc;

use mariner_core::{
    Database, FallbackGeocoder, LocalGeocoder, Provisioner, SavedPortStore, Services,
    StationIndex, ZoneCatalog, ZoneIndex,
};
use thiserror::Error;

pub mod catalog;
pub mod cli;
pub mod components;
pub mod logging;
pub mod noaa;
pub mod nominatim;
pub mod runtime;

use catalog::{
    CsvZoneCatalog, HttpZipCatalog, ShapefileZoneCatalog, MARINE_ZONES_BASE, MARINE_ZONES_URL,
    ZIPCODE_CSV_URL,
};
use noaa::{Endpoints, NoaaClient};
use nominatim::{NominatimGeocoder, NOMINATIM_URL};

#[derive(Debug, Error)]
#[error("could not set up the HTTP client: {0}")]
pub struct SetupError(String);

/// Production wiring: NOAA for live data, the local index for lookups with
/// Nominatim behind it, and the NWS shapefile unless `zones_csv` overrides it.
pub fn build_services(
    db: Arc<Database>,
    endpoints: Endpoints,
    zones_csv: Option<&Path>,
) -> Result<Services, SetupError> {
    let noaa = Arc::new(NoaaClient::new(endpoints).map_err(|e| SetupError(e.to_string()))?);
    let nominatim =
        NominatimGeocoder::new(NOMINATIM_URL).map_err(|e| SetupError(e.to_string()))?;
    let zones: Arc<dyn ZoneCatalog> = match zones_csv {
        Some(path) => Arc::new(CsvZoneCatalog::new(path)),
        None => Arc::new(ShapefileZoneCatalog::new(
            noaa.http().clone(),
            MARINE_ZONES_URL,
            MARINE_ZONES_BASE,
        )),
    };
    let provisioner = Provisioner::new(
        Arc::clone(&db),
        zones,
        noaa.clone(),
        Arc::new(HttpZipCatalog::new(noaa.http().clone(), ZIPCODE_CSV_URL)),
    );

    Ok(Services {
        geocoder: Arc::new(FallbackGeocoder::new(
            Arc::new(LocalGeocoder::new(Arc::clone(&db))),
            Arc::new(nominatim),
        )),
        weather: noaa.clone(),
        tides: noaa.clone(),
        alerts: noaa,
        zones: ZoneIndex::new(Arc::clone(&db)),
        stations: StationIndex::new(Arc::clone(&db)),
        ports: SavedPortStore::new(Arc::clone(&db)),
        provisioner,
    })
}
