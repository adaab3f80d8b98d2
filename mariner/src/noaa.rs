//! NOAA clients.
//!
//! - Marine text forecasts from the NWS tgftp product tree, split into
//!   named periods.
//! - CO-OPS high/low tide predictions.
//! - api.weather.gov active alerts for a zone, reduced to marine events.
//! - CO-OPS station metadata, fetched once and searched in memory.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use mariner_core::fetch::station_matches;
use mariner_core::{
    Alert, AlertSource, BoxFuture, FetchError, ForecastPeriod, MarineWeather, StationCandidate,
    StationSearch, TideEvent, TideKind, TideSource, WeatherSnapshot, WeatherSource,
};
use regex::Regex;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

pub const USER_AGENT: &str = concat!("mariner/", env!("CARGO_PKG_VERSION"));

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Alert events shown on the dashboard.
pub const MARINE_EVENTS: [&str; 7] = [
    "Small Craft Advisory",
    "Gale Warning",
    "Storm Warning",
    "Hurricane Force Wind Warning",
    "Special Marine Warning",
    "Marine Weather Statement",
    "Hazardous Seas Warning",
];

/// Base URLs of the services. Overridable so tests can point at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub marine_text: String,
    pub tides: String,
    pub alerts: String,
    pub stations: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            marine_text: "https://tgftp.nws.noaa.gov/data/forecasts/marine".into(),
            tides: "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter".into(),
            alerts: "https://api.weather.gov".into(),
            stations: "https://api.tidesandcurrents.noaa.gov/mdapi/prod/webapi".into(),
        }
    }
}

impl Endpoints {
    /// Every service under one host, at `/marine`, `/datagetter`, `/` and `/mdapi`.
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            marine_text: format!("{base}/marine"),
            tides: format!("{base}/datagetter"),
            alerts: base.to_string(),
            stations: format!("{base}/mdapi"),
        }
    }
}

#[derive(Clone)]
pub struct NoaaClient {
    http: reqwest::Client,
    endpoints: Arc<Endpoints>,
    stations: Arc<OnceCell<Vec<StationCandidate>>>,
}

impl NoaaClient {
    pub fn new(endpoints: Endpoints) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(request_error)?;
        Ok(Self::from_reqwest(http, endpoints))
    }

    pub fn from_reqwest(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self {
            http,
            endpoints: Arc::new(endpoints),
            stations: Arc::new(OnceCell::new()),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The configured HTTP client, for other downloads sharing its settings.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, FetchError> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        self.get(url, query)
            .await?
            .json()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }

    pub async fn fetch_marine_weather(&self, zone_code: &str) -> Result<MarineWeather, FetchError> {
        let url = marine_text_url(&self.endpoints.marine_text, zone_code);
        let text = self
            .get(&url, &[])
            .await?
            .text()
            .await
            .map_err(request_error)?;
        parse_marine_text(&text, zone_code)
    }

    pub async fn fetch_tides(
        &self,
        station_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TideEvent>, FetchError> {
        let begin = start.format("%Y%m%d").to_string();
        let end = end.format("%Y%m%d").to_string();
        let response: TideResponse = self
            .get_json(
                &self.endpoints.tides,
                &[
                    ("begin_date", begin.as_str()),
                    ("end_date", end.as_str()),
                    ("station", station_id),
                    ("product", "predictions"),
                    ("datum", "MLLW"),
                    ("time_zone", "lst_ldt"),
                    ("interval", "hilo"),
                    ("units", "english"),
                    ("format", "json"),
                    ("application", "mariner"),
                ],
            )
            .await?;
        tide_events(response)
    }

    pub async fn fetch_alerts(&self, zone_code: &str) -> Result<Vec<Alert>, FetchError> {
        let url = format!("{}/alerts/active", self.endpoints.alerts);
        let response: AlertResponse = self.get_json(&url, &[("zone", zone_code)]).await?;
        Ok(marine_alerts(response))
    }

    /// The full station catalogue, downloaded on first use.
    pub async fn all_stations(&self) -> Result<&[StationCandidate], FetchError> {
        let stations = self
            .stations
            .get_or_try_init(|| async {
                let url = format!("{}/stations.json", self.endpoints.stations);
                let response: StationResponse =
                    self.get_json(&url, &[("type", "tidepredictions")]).await?;
                let stations = response.into_candidates();
                info!(count = stations.len(), "Fetched tide station catalogue");
                Ok::<_, FetchError>(stations)
            })
            .await?;
        Ok(stations)
    }
}

impl WeatherSource for NoaaClient {
    fn marine_weather<'a>(
        &'a self,
        zone_code: &'a str,
    ) -> BoxFuture<'a, Result<MarineWeather, FetchError>> {
        Box::pin(self.fetch_marine_weather(zone_code))
    }
}

impl TideSource for NoaaClient {
    fn tide_predictions<'a>(
        &'a self,
        station_id: &'a str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'a, Result<Vec<TideEvent>, FetchError>> {
        Box::pin(self.fetch_tides(station_id, start, end))
    }
}

impl AlertSource for NoaaClient {
    fn active_alerts<'a>(&'a self, zone_code: &'a str) -> BoxFuture<'a, Result<Vec<Alert>, FetchError>> {
        Box::pin(self.fetch_alerts(zone_code))
    }
}

impl StationSearch for NoaaClient {
    fn search_stations<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StationCandidate>, FetchError>> {
        Box::pin(async move {
            let stations = self.all_stations().await?;
            Ok(stations
                .iter()
                .filter(|station| station_matches(station, query))
                .cloned()
                .collect())
        })
    }
}

fn request_error(err: reqwest::Error) -> FetchError {
    FetchError::Request(err.to_string())
}

// ============================================================================
// Marine text forecasts
// ============================================================================

/// `AN*` and `GM*` zones are coastal products, everything else offshore.
pub fn marine_text_url(base: &str, zone_code: &str) -> String {
    let zone = zone_code.to_ascii_lowercase();
    let kind = if zone.starts_with("an") || zone.starts_with("gm") {
        "coastal"
    } else {
        "offshore"
    };
    let prefix = zone.get(..2).unwrap_or("an");
    format!("{base}/{kind}/{prefix}/{zone}.txt")
}

static WIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:[NESW]{1,3}|variable)\s+(?:winds?\s+)?(?:around\s+|up\s+to\s+)?\d+(?:\s+to\s+\d+)?\s*kt")
        .expect("wind pattern")
});

static GUSTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)gusts?\s+(?:up\s+to\s+)?(\d+)\s*kt").expect("gust pattern"));

static SEAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:seas|waves)\s+(?:around\s+)?\d+(?:\s+to\s+\d+)?\s*(?:ft|feet|foot)(?:\s+or\s+less)?")
        .expect("seas pattern")
});

/// Splits a marine text product into periods.
///
/// The product is a header followed by `.PERIOD...text` paragraphs. Headline
/// paragraphs (`...SMALL CRAFT ADVISORY...`) and periods naming an advisory,
/// warning or watch are skipped. The first remaining period becomes the
/// current conditions.
pub fn parse_marine_text(text: &str, zone_code: &str) -> Result<MarineWeather, FetchError> {
    let text = text.replace("\r\n", "\n");
    let body = text.split("$$").next().unwrap_or_default();

    let mut chunks = body.split("\n.");
    let header = chunks.next().unwrap_or_default();
    let mut forecast = Vec::new();
    for chunk in chunks {
        let Some((name, period_text)) = chunk.split_once("...") else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || name.starts_with('.') || is_headline(name) {
            continue;
        }
        forecast.push(ForecastPeriod {
            name: name.to_string(),
            text: collapse_whitespace(period_text),
        });
    }

    let Some(first) = forecast.first() else {
        return Err(FetchError::Decode(format!(
            "no forecast periods in marine text for {zone_code}"
        )));
    };

    let (zone_name, issued) = parse_header(header, zone_code);
    let current = WeatherSnapshot {
        zone_code: zone_code.to_ascii_uppercase(),
        zone_name,
        issued,
        period: first.name.clone(),
        summary: first.text.clone(),
        wind: extract_wind(&first.text),
        seas: extract_seas(&first.text),
    };
    Ok(MarineWeather { current, forecast })
}

fn is_headline(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    ["ADVISORY", "WARNING", "WATCH"]
        .iter()
        .any(|word| upper.contains(word))
}

/// Zone name and issue time follow the zone's UGC line (`ANZ254-140800-`).
fn parse_header(header: &str, zone_code: &str) -> (String, Option<String>) {
    let zone = zone_code.to_ascii_uppercase();
    let mut lines = header
        .lines()
        .map(str::trim)
        .skip_while(|line| !line.to_ascii_uppercase().starts_with(&zone))
        .skip(1)
        .filter(|line| !line.is_empty());
    let name = lines
        .next()
        .map(|line| line.trim_end_matches('-').trim().to_string())
        .unwrap_or_default();
    let issued = lines.next().map(str::to_string);
    (name, issued)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First wind phrase, with the gust speed appended when one is forecast.
pub fn extract_wind(text: &str) -> Option<String> {
    let wind = WIND.find(text)?.as_str().to_string();
    match GUSTS.captures(text) {
        Some(gusts) => Some(format!("{wind}, gusts to {} kt", &gusts[1])),
        None => Some(wind),
    }
}

pub fn extract_seas(text: &str) -> Option<String> {
    SEAS.find(text).map(|m| m.as_str().to_string())
}

// ============================================================================
// Tides
// ============================================================================

#[derive(Debug, Deserialize)]
struct TideResponse {
    #[serde(default)]
    predictions: Option<Vec<TidePrediction>>,
    #[serde(default)]
    error: Option<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct TidePrediction {
    t: String,
    v: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Rows with an unreadable time or height are dropped.
fn tide_events(response: TideResponse) -> Result<Vec<TideEvent>, FetchError> {
    let predictions = match (response.predictions, response.error) {
        (Some(predictions), _) => predictions,
        (None, Some(error)) => return Err(FetchError::Decode(error.message)),
        (None, None) => Vec::new(),
    };
    Ok(predictions
        .into_iter()
        .filter_map(|p| {
            let time = NaiveDateTime::parse_from_str(&p.t, "%Y-%m-%d %H:%M").ok()?;
            let height_ft = p.v.trim().parse().ok()?;
            let kind = if p.kind.eq_ignore_ascii_case("H") {
                TideKind::High
            } else {
                TideKind::Low
            };
            Some(TideEvent {
                time,
                height_ft,
                kind,
            })
        })
        .collect())
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Deserialize)]
struct AlertResponse {
    #[serde(default)]
    features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
struct AlertFeature {
    properties: AlertProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AlertProperties {
    id: Option<String>,
    event: Option<String>,
    headline: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    urgency: Option<String>,
    area_desc: Option<String>,
    onset: Option<String>,
    expires: Option<String>,
    instruction: Option<String>,
}

pub fn is_marine_event(event: &str) -> bool {
    MARINE_EVENTS.contains(&event)
}

fn marine_alerts(response: AlertResponse) -> Vec<Alert> {
    response
        .features
        .into_iter()
        .map(|feature| feature.properties)
        .filter(|p| p.event.as_deref().is_some_and(is_marine_event))
        .map(|p| Alert {
            id: p.id.unwrap_or_default(),
            event: p.event.unwrap_or_default(),
            headline: p.headline.unwrap_or_default(),
            description: p.description.unwrap_or_default(),
            severity: p.severity.unwrap_or_else(|| "Unknown".into()),
            urgency: p.urgency.unwrap_or_default(),
            area: p.area_desc.unwrap_or_default(),
            onset: p.onset,
            expires: p.expires,
            instruction: p.instruction,
        })
        .collect()
}

// ============================================================================
// Stations
// ============================================================================

#[derive(Debug, Deserialize)]
struct StationResponse {
    #[serde(default)]
    stations: Vec<StationRecord>,
}

#[derive(Debug, Deserialize)]
struct StationRecord {
    id: String,
    name: String,
    #[serde(default)]
    state: Option<String>,
    lat: f64,
    lng: f64,
}

impl StationResponse {
    fn into_candidates(self) -> Vec<StationCandidate> {
        self.stations
            .into_iter()
            .map(|s| StationCandidate {
                id: s.id,
                name: s.name,
                state: s.state.unwrap_or_default(),
                latitude: s.lat,
                longitude: s.lng,
                distance_miles: 0.0,
            })
            .collect()
    }
}
