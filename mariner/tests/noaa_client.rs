//! NOAA, Nominatim and catalogue downloads against a local mock server.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use mariner::catalog::{HttpZipCatalog, ShapefileZoneCatalog, MARINE_ZONES_BASE};
use mariner::noaa::{Endpoints, NoaaClient, USER_AGENT};
use mariner::nominatim::NominatimGeocoder;
use mariner_core::{
    FetchError, Geocoder, LookupError, ProvisionError, StationSearch, TideKind, ZipCatalog,
    ZoneCatalog,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCT: &str = "\
FZUS51 KBOX 131945
CWFBOX

ANZ254-140800-
Provincetown Harbor to Chatham MA out to 20 nm-
345 PM EDT Sat Jul 13 2024

.TONIGHT...SW winds 10 to 15 kt. Seas 2 to 3 ft.
.SUN...S winds 15 to 20 kt. Seas 3 to 5 ft.

$$
";

async fn client(server: &MockServer) -> NoaaClient {
    NoaaClient::new(Endpoints::under(&server.uri())).unwrap()
}

#[tokio::test]
async fn test_marine_weather_from_text_product() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/marine/coastal/an/anz254.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT))
        .mount(&server)
        .await;

    let weather = client(&server).await.fetch_marine_weather("ANZ254").await.unwrap();
    assert_eq!(weather.current.period, "TONIGHT");
    assert_eq!(weather.current.wind.as_deref(), Some("SW winds 10 to 15 kt"));
    assert_eq!(weather.current.seas.as_deref(), Some("Seas 2 to 3 ft"));
    assert_eq!(weather.forecast.len(), 2);
}

#[tokio::test]
async fn test_missing_product_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).await.fetch_marine_weather("ANZ999").await.unwrap_err();
    assert_eq!(err, FetchError::Status(404));
}

#[tokio::test]
async fn test_tide_predictions_query() {
    let server = MockServer::start().await;
    let body = json!({
        "predictions": [
            { "t": "2024-07-13 04:12", "v": "3.912", "type": "H" },
            { "t": "2024-07-13 10:31", "v": "0.154", "type": "L" },
            { "t": "garbage", "v": "1.0", "type": "H" }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/datagetter"))
        .and(query_param("station", "8447435"))
        .and(query_param("begin_date", "20240713"))
        .and(query_param("end_date", "20240715"))
        .and(query_param("interval", "hilo"))
        .and(query_param("datum", "MLLW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let start = NaiveDate::from_ymd_opt(2024, 7, 13).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
    let tides = client(&server)
        .await
        .fetch_tides("8447435", start, end)
        .await
        .unwrap();

    assert_eq!(tides.len(), 2);
    assert_eq!(tides[0].kind, TideKind::High);
    assert!((tides[0].height_ft - 3.912).abs() < 1e-9);
    assert_eq!(tides[1].kind, TideKind::Low);
}

#[tokio::test]
async fn test_tide_api_error_message() {
    let server = MockServer::start().await;
    let body = json!({ "error": { "message": "No Predictions data was found." } });
    Mock::given(method("GET"))
        .and(path("/datagetter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let day = NaiveDate::from_ymd_opt(2024, 7, 13).unwrap();
    let err = client(&server)
        .await
        .fetch_tides("0000000", day, day)
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::Decode("No Predictions data was found.".into()));
}

#[tokio::test]
async fn test_alerts_keep_marine_events_only() {
    let server = MockServer::start().await;
    let body = json!({
        "features": [
            { "properties": {
                "id": "urn:oid:1",
                "event": "Small Craft Advisory",
                "headline": "Small Craft Advisory issued July 13",
                "severity": "Minor",
                "areaDesc": "Provincetown Harbor to Chatham MA",
                "expires": "2024-07-14T20:00:00-04:00"
            } },
            { "properties": { "id": "urn:oid:2", "event": "Heat Advisory" } }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/alerts/active"))
        .and(query_param("zone", "ANZ254"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let alerts = client(&server).await.fetch_alerts("ANZ254").await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].event, "Small Craft Advisory");
    assert_eq!(alerts[0].area, "Provincetown Harbor to Chatham MA");
    assert_eq!(alerts[0].expires.as_deref(), Some("2024-07-14T20:00:00-04:00"));
}

#[tokio::test]
async fn test_station_catalogue_is_fetched_once() {
    let server = MockServer::start().await;
    let body = json!({
        "count": 3,
        "stations": [
            { "id": "8447435", "name": "Chatham, Lydia Cove", "state": "MA", "lat": 41.6883, "lng": -69.9517 },
            { "id": "8452660", "name": "Newport", "state": "RI", "lat": 41.5043, "lng": -71.3261 },
            { "id": "8447930", "name": "Woods Hole", "state": "MA", "lat": 41.5236, "lng": -70.6711 }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/mdapi/stations.json"))
        .and(query_param("type", "tidepredictions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let massachusetts = client.search_stations("ma").await.unwrap();
    assert_eq!(massachusetts.len(), 2);

    let by_name = client.search_stations("newport").await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, "8452660");
}

#[tokio::test]
async fn test_zip_catalogue_download() {
    let server = MockServer::start().await;
    let csv = "code,city,state,county,area_code,lat,lon\n\
               02633,Chatham,MA,Barnstable,508,41.6885,-69.9511\n\
               02634,Centerville,MA,Barnstable,508,,\n";
    Mock::given(method("GET"))
        .and(path("/zipcodes.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv))
        .mount(&server)
        .await;

    let catalog = HttpZipCatalog::new(
        reqwest::Client::new(),
        format!("{}/zipcodes.csv", server.uri()),
    );
    let records = catalog.zipcodes().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].zipcode, "02633");
}

#[tokio::test]
async fn test_zone_shapefile_download_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let catalog = ShapefileZoneCatalog::new(
        reqwest::Client::new(),
        format!("{}/mz18mr25.zip", server.uri()),
        MARINE_ZONES_BASE,
    );
    let err = catalog.marine_zones().await.unwrap_err();
    assert!(matches!(err, ProvisionError::Catalog { catalog: "marine zones", .. }));
    assert!(err.to_string().contains("404"), "{err}");
}

#[tokio::test]
async fn test_nominatim_search_request() {
    let server = MockServer::start().await;
    let body = json!([{
        "lat": "41.3362",
        "lon": "-71.9062",
        "display_name": "Stonington, New London County, Connecticut, United States",
        "address": {"town": "Stonington", "ISO3166-2-lvl4": "US-CT", "postcode": "06378"}
    }]);
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Stonington, CT, USA"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(format!("{}/search", server.uri())).unwrap();
    let loc = geocoder.geocode(" Stonington, CT ").await.unwrap();
    assert_eq!(loc.city, "Stonington");
    assert_eq!(loc.state, "CT");
    assert!((loc.longitude + 71.9062).abs() < 1e-9);
}

#[tokio::test]
async fn test_nominatim_empty_result_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(format!("{}/search", server.uri())).unwrap();
    let err = geocoder.geocode("Atlantis, ZZ").await.unwrap_err();
    assert!(matches!(err, LookupError::PlaceNotFound(q) if q == "Atlantis, ZZ"));
}

#[tokio::test]
async fn test_nominatim_spaces_out_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(format!("{}/search", server.uri()))
        .unwrap()
        .with_min_interval(Duration::from_millis(300));
    let started = Instant::now();
    let _ = geocoder.geocode("Mystic, CT").await;
    let _ = geocoder.geocode("Noank, CT").await;
    assert!(started.elapsed() >= Duration::from_millis(300));
}
