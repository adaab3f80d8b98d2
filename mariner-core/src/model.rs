//! Value types shared by the index, the fetchers and the state machine.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::geo::GeoPoint;

/// A geocoded place.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// "City, ST zip" for zip-index hits.
    pub display_name: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

impl Location {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A marine forecast zone returned by a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneCandidate {
    pub code: String,
    pub name: String,
    /// Zero when the zone was looked up by code.
    pub distance_miles: f64,
}

/// A tide prediction station returned by a lookup or search.
#[derive(Debug, Clone, PartialEq)]
pub struct StationCandidate {
    pub id: String,
    pub name: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Zero when the station was looked up by id.
    pub distance_miles: f64,
}

impl StationCandidate {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A user-named location as stored in `saved_ports`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPort {
    pub id: i64,
    pub name: String,
    pub state: String,
    pub city: String,
    pub zipcode: String,
    pub zone_code: String,
    pub station_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

impl SavedPort {
    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
            display_name: format!("{}, {} {}", self.city, self.state, self.zipcode),
            city: self.city.clone(),
            state: self.state.clone(),
            zipcode: self.zipcode.clone(),
        }
    }
}

/// Fields supplied by the user when saving a port. The store assigns the
/// id and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct PortDraft {
    pub name: String,
    pub state: String,
    pub city: String,
    pub zipcode: String,
    pub zone_code: String,
    pub station_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl PortDraft {
    pub fn new(
        name: impl Into<String>,
        location: &Location,
        zone: &ZoneCandidate,
        station: Option<&StationCandidate>,
    ) -> Self {
        Self {
            name: name.into(),
            state: location.state.clone(),
            city: location.city.clone(),
            zipcode: location.zipcode.clone(),
            zone_code: zone.code.clone(),
            station_id: station.map(|s| s.id.clone()),
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// One named period of a marine text forecast ("TONIGHT", "SAT NIGHT", ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPeriod {
    pub name: String,
    pub text: String,
}

/// Current conditions for a zone, taken from the first forecast period.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherSnapshot {
    pub zone_code: String,
    pub zone_name: String,
    pub issued: Option<String>,
    pub period: String,
    pub summary: String,
    pub wind: Option<String>,
    pub seas: Option<String>,
}

/// Result of one marine weather fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarineWeather {
    pub current: WeatherSnapshot,
    pub forecast: Vec<ForecastPeriod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TideKind {
    High,
    Low,
}

impl TideKind {
    pub fn label(self) -> &'static str {
        match self {
            TideKind::High => "High",
            TideKind::Low => "Low",
        }
    }
}

/// A predicted high or low water, in station local time.
#[derive(Debug, Clone, PartialEq)]
pub struct TideEvent {
    pub time: NaiveDateTime,
    pub height_ft: f64,
    pub kind: TideKind,
}

/// An active marine alert for a zone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alert {
    pub id: String,
    pub event: String,
    pub headline: String,
    pub description: String,
    pub severity: String,
    pub urgency: String,
    pub area: String,
    pub onset: Option<String>,
    pub expires: Option<String>,
    pub instruction: Option<String>,
}
