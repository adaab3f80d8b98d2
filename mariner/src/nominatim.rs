//! OpenStreetMap Nominatim search for places the zip index does not know.

use std::time::Duration;

use mariner_core::{BoxFuture, Geocoder, Location, LookupError};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::noaa::USER_AGENT;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim's usage policy allows one request per second.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    address: Address,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    state: Option<String>,
    #[serde(rename = "ISO3166-2-lvl4")]
    state_code: Option<String>,
    postcode: Option<String>,
}

pub struct NominatimGeocoder {
    http: reqwest::Client,
    url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    pub fn new(url: impl Into<String>) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(service_error)?;
        Ok(Self {
            http,
            url: url.into(),
            min_interval: MIN_INTERVAL,
            last_request: Mutex::new(None),
        })
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub async fn search(&self, query: &str) -> Result<Location, LookupError> {
        let query = query.trim();
        self.wait_turn().await;

        let q = format!("{query}, USA");
        debug!(query = %q, "Nominatim search");
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
                ("q", q.as_str()),
            ])
            .send()
            .await
            .map_err(service_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Service(format!("Nominatim returned status {status}")));
        }
        let places: Vec<Place> = response.json().await.map_err(service_error)?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::PlaceNotFound(query.to_string()))?;
        place_location(place)
    }

    /// Holds the lock across the sleep so concurrent callers queue up.
    async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Location, LookupError>> {
        Box::pin(self.search(query))
    }
}

fn place_location(place: Place) -> Result<Location, LookupError> {
    let coordinate = |value: &str, what: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| LookupError::Service(format!("bad {what} {value:?}")))
    };
    let latitude = coordinate(&place.lat, "latitude")?;
    let longitude = coordinate(&place.lon, "longitude")?;

    let address = place.address;
    let city = address
        .city
        .or(address.town)
        .or(address.village)
        .or(address.hamlet)
        .or_else(|| place.display_name.split(',').next().map(|s| s.trim().to_string()))
        .unwrap_or_default();
    let state = address
        .state_code
        .as_deref()
        .and_then(|code| code.strip_prefix("US-"))
        .map(str::to_string)
        .or(address.state)
        .unwrap_or_default();

    Ok(Location {
        latitude,
        longitude,
        display_name: place.display_name,
        city,
        state,
        zipcode: address.postcode.unwrap_or_default(),
    })
}

fn service_error(err: reqwest::Error) -> LookupError {
    LookupError::Service(err.to_string())
}
