//! Test doubles and fixture data.
//!
//! A small Cape Cod neighbourhood: three marine zones, four tide stations
//! and a handful of zip codes, enough to exercise nearest-entity ranking,
//! radius cut-offs and the city/state tie-break.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::params;

use crate::db::{self, Database};
use crate::dispatcher::Services;
use crate::error::{FetchError, ProvisionError, StoreError};
use crate::fetch::{station_matches, AlertSource, BoxFuture, StationSearch, TideSource, WeatherSource};
use crate::geo::GeoPoint;
use crate::geocode::LocalGeocoder;
use crate::index::{StationIndex, ZoneIndex};
use crate::model::{Alert, MarineWeather, StationCandidate, TideEvent};
use crate::ports::SavedPortStore;
use crate::provision::{Provisioner, ZipCatalog, ZipRecord, ZoneCatalog, ZoneRecord};

/// Chatham, MA 02633.
pub const CHATHAM: GeoPoint = GeoPoint::new(41.6885, -69.9511);

pub fn zone_records() -> Vec<ZoneRecord> {
    vec![
        ZoneRecord {
            code: "ANZ254".into(),
            name: "Coastal waters from Provincetown MA to Chatham MA".into(),
            center: GeoPoint::new(41.6885, -69.8911),
        },
        ZoneRecord {
            code: "ANZ237".into(),
            name: "Cape Cod Bay".into(),
            center: GeoPoint::new(42.28, -69.95),
        },
        ZoneRecord {
            code: "ANZ080".into(),
            name: "Georges Bank between Cape Cod and 68W".into(),
            center: GeoPoint::new(40.0, -69.0),
        },
    ]
}

pub fn station_records() -> Vec<StationCandidate> {
    [
        ("8447435", "Chatham, Lydia Cove", "MA", 41.6883, -69.9517),
        ("8447930", "Woods Hole", "MA", 41.5236, -70.6711),
        ("8452660", "Newport", "RI", 41.5050, -71.3267),
        ("8518750", "The Battery", "NY", 40.7006, -74.0142),
    ]
    .into_iter()
    .map(|(id, name, state, latitude, longitude)| StationCandidate {
        id: id.into(),
        name: name.into(),
        state: state.into(),
        latitude,
        longitude,
        distance_miles: 0.0,
    })
    .collect()
}

pub fn zip_records() -> Vec<ZipRecord> {
    [
        ("02633", "Chatham", "MA", 41.6885, -69.9511),
        ("02841", "Newport", "RI", 41.5001, -71.3012),
        ("02840", "Newport", "RI", 41.4901, -71.3128),
        ("02543", "Woods Hole", "MA", 41.5265, -70.6731),
        ("80202", "Denver", "CO", 39.7392, -104.9903),
    ]
    .into_iter()
    .map(|(zipcode, city, state, lat, lon)| ZipRecord {
        zipcode: zipcode.into(),
        city: city.into(),
        state: state.into(),
        point: GeoPoint::new(lat, lon),
    })
    .collect()
}

/// An in-memory database with every index table populated.
pub fn seeded_database() -> Arc<Database> {
    let db = Database::open_in_memory().expect("in-memory database");
    db.with_conn(|conn| {
        conn.execute_batch(db::ZONES_SCHEMA)?;
        conn.execute_batch(db::STATIONS_SCHEMA)?;
        conn.execute_batch(db::ZIPCODES_SCHEMA)?;
        for zone in zone_records() {
            conn.execute(
                "INSERT INTO marine_zones (code, name, center_lat, center_lon) VALUES (?1, ?2, ?3, ?4)",
                params![zone.code, zone.name, zone.center.latitude, zone.center.longitude],
            )?;
        }
        for s in station_records() {
            conn.execute(
                "INSERT INTO tide_stations (id, name, state, lat, lon) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![s.id, s.name, s.state, s.latitude, s.longitude],
            )?;
        }
        for z in zip_records() {
            conn.execute(
                "INSERT INTO zipcodes (zipcode, city, state, lat, lon) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![z.zipcode, z.city, z.state, z.point.latitude, z.point.longitude],
            )?;
        }
        Ok::<_, StoreError>(())
    })
    .expect("seed fixture data");
    Arc::new(db)
}

// ============================================================================
// Catalogues
// ============================================================================

pub struct StaticZones(pub Vec<ZoneRecord>);

impl StaticZones {
    pub fn fixture() -> Self {
        Self(zone_records())
    }
}

impl ZoneCatalog for StaticZones {
    fn marine_zones(&self) -> BoxFuture<'_, Result<Vec<ZoneRecord>, ProvisionError>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

pub struct FailingZoneCatalog;

impl ZoneCatalog for FailingZoneCatalog {
    fn marine_zones(&self) -> BoxFuture<'_, Result<Vec<ZoneRecord>, ProvisionError>> {
        Box::pin(async {
            Err(ProvisionError::Catalog {
                catalog: "marine zones",
                reason: "connection reset".into(),
            })
        })
    }
}

pub struct StaticStations(pub Vec<StationCandidate>);

impl StaticStations {
    pub fn fixture() -> Self {
        Self(station_records())
    }
}

impl StationSearch for StaticStations {
    fn search_stations<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StationCandidate>, FetchError>> {
        Box::pin(async move {
            Ok(self
                .0
                .iter()
                .filter(|s| station_matches(s, query))
                .cloned()
                .collect())
        })
    }
}

pub struct StaticZipcodes(pub Vec<ZipRecord>);

impl StaticZipcodes {
    pub fn fixture() -> Self {
        Self(zip_records())
    }
}

impl ZipCatalog for StaticZipcodes {
    fn zipcodes(&self) -> BoxFuture<'_, Result<Vec<ZipRecord>, ProvisionError>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

pub fn fixture_provisioner(db: Arc<Database>) -> Provisioner {
    Provisioner::new(
        db,
        Arc::new(StaticZones::fixture()),
        Arc::new(StaticStations::fixture()),
        Arc::new(StaticZipcodes::fixture()),
    )
}

// ============================================================================
// Fetch doubles
// ============================================================================

/// A fetch double that answers every call with the same result, optionally
/// after a delay, and counts calls.
pub struct Canned<T> {
    result: Result<T, FetchError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl<T: Clone + Send + Sync> Canned<T> {
    pub fn ok(value: T) -> Self {
        Self {
            result: Ok(value),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn err(error: FetchError) -> Self {
        Self {
            result: Err(error),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self) -> BoxFuture<'_, Result<T, FetchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        })
    }
}

impl WeatherSource for Canned<MarineWeather> {
    fn marine_weather<'a>(
        &'a self,
        _zone_code: &'a str,
    ) -> BoxFuture<'a, Result<MarineWeather, FetchError>> {
        self.answer()
    }
}

impl TideSource for Canned<Vec<TideEvent>> {
    fn tide_predictions<'a>(
        &'a self,
        _station_id: &'a str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> BoxFuture<'a, Result<Vec<TideEvent>, FetchError>> {
        self.answer()
    }
}

impl AlertSource for Canned<Vec<Alert>> {
    fn active_alerts<'a>(&'a self, _zone_code: &'a str) -> BoxFuture<'a, Result<Vec<Alert>, FetchError>> {
        self.answer()
    }
}

/// Services over `db` with the local geocoder and successful fetches.
pub fn fixture_services(db: Arc<Database>) -> Services {
    Services {
        geocoder: Arc::new(LocalGeocoder::new(Arc::clone(&db))),
        weather: Arc::new(Canned::ok(fixtures::weather("ANZ254"))),
        tides: Arc::new(Canned::ok(fixtures::tides())),
        alerts: Arc::new(Canned::ok(vec![fixtures::alert("Small Craft Advisory")])),
        zones: ZoneIndex::new(Arc::clone(&db)),
        stations: StationIndex::new(Arc::clone(&db)),
        ports: SavedPortStore::new(Arc::clone(&db)),
        provisioner: fixture_provisioner(db),
    }
}

/// Ready-made values for state machine tests.
pub mod fixtures {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::{ForecastPeriod, Location, SavedPort, TideKind, WeatherSnapshot, ZoneCandidate};

    pub fn chatham() -> Location {
        Location {
            latitude: CHATHAM.latitude,
            longitude: CHATHAM.longitude,
            display_name: "Chatham, MA 02633".into(),
            city: "Chatham".into(),
            state: "MA".into(),
            zipcode: "02633".into(),
        }
    }

    pub fn zone(code: &str, distance_miles: f64) -> ZoneCandidate {
        let name = zone_records()
            .into_iter()
            .find(|z| z.code == code)
            .map(|z| z.name)
            .unwrap_or_else(|| format!("Zone {code}"));
        ZoneCandidate {
            code: code.into(),
            name,
            distance_miles,
        }
    }

    pub fn station(id: &str, distance_miles: f64) -> StationCandidate {
        let mut station = station_records()
            .into_iter()
            .find(|s| s.id == id)
            .unwrap_or_else(|| StationCandidate {
                id: id.into(),
                name: format!("Station {id}"),
                state: "MA".into(),
                latitude: CHATHAM.latitude,
                longitude: CHATHAM.longitude,
                distance_miles: 0.0,
            });
        station.distance_miles = distance_miles;
        station
    }

    pub fn weather(zone_code: &str) -> MarineWeather {
        MarineWeather {
            current: WeatherSnapshot {
                zone_code: zone_code.into(),
                zone_name: zone(zone_code, 0.0).name,
                issued: Some("345 PM EDT Sat Jul 13 2024".into()),
                period: "TONIGHT".into(),
                summary: "SW winds 10 to 15 kt. Seas 2 to 3 ft.".into(),
                wind: Some("SW winds 10 to 15 kt".into()),
                seas: Some("Seas 2 to 3 ft".into()),
            },
            forecast: vec![
                ForecastPeriod {
                    name: "TONIGHT".into(),
                    text: "SW winds 10 to 15 kt. Seas 2 to 3 ft.".into(),
                },
                ForecastPeriod {
                    name: "SUN".into(),
                    text: "S winds 15 to 20 kt. Seas 3 to 4 ft.".into(),
                },
            ],
        }
    }

    pub fn tides() -> Vec<TideEvent> {
        let day = NaiveDate::from_ymd_opt(2024, 7, 13).expect("valid date");
        [(4, 12, 3.9, TideKind::High), (10, 31, 0.2, TideKind::Low), (16, 40, 4.3, TideKind::High)]
            .into_iter()
            .map(|(h, m, height_ft, kind)| TideEvent {
                time: day.and_hms_opt(h, m, 0).expect("valid time"),
                height_ft,
                kind,
            })
            .collect()
    }

    pub fn alert(event: &str) -> Alert {
        Alert {
            id: format!("urn:oid:{}", event.to_lowercase().replace(' ', "-")),
            event: event.into(),
            headline: format!("{event} issued for coastal waters"),
            severity: "Minor".into(),
            urgency: "Expected".into(),
            area: "Provincetown to Chatham".into(),
            ..Alert::default()
        }
    }

    pub fn port(name: &str) -> SavedPort {
        SavedPort {
            id: 1,
            name: name.into(),
            state: "MA".into(),
            city: "Chatham".into(),
            zipcode: "02633".into(),
            zone_code: "ANZ254".into(),
            station_id: Some("8447435".into()),
            latitude: CHATHAM.latitude,
            longitude: CHATHAM.longitude,
            created_at: Utc.with_ymd_and_hms(2024, 7, 13, 12, 0, 0).single().unwrap_or_default(),
        }
    }
}
