//! Capability traits for everything the core reads from outside.
//!
//! Each trait covers one kind of fetch and returns a boxed future, so the
//! dispatcher can hold production clients and test doubles alike behind
//! `Arc<dyn Trait>`.

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;

use crate::error::{FetchError, LookupError};
use crate::model::{Alert, Location, MarineWeather, StationCandidate, TideEvent};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves a zip code or "City, ST" query to a location.
pub trait Geocoder: Send + Sync {
    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Location, LookupError>>;
}

/// Marine text forecast for a zone: current conditions plus the period list.
pub trait WeatherSource: Send + Sync {
    fn marine_weather<'a>(
        &'a self,
        zone_code: &'a str,
    ) -> BoxFuture<'a, Result<MarineWeather, FetchError>>;
}

/// High/low tide predictions for a station over an inclusive date range.
pub trait TideSource: Send + Sync {
    fn tide_predictions<'a>(
        &'a self,
        station_id: &'a str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'a, Result<Vec<TideEvent>, FetchError>>;
}

/// Active alerts for a zone.
pub trait AlertSource: Send + Sync {
    fn active_alerts<'a>(&'a self, zone_code: &'a str)
        -> BoxFuture<'a, Result<Vec<Alert>, FetchError>>;
}

/// Searches the remote tide station catalogue.
///
/// A two-letter query filters by state, any other non-empty query matches
/// station names case-insensitively, and an empty query returns every
/// station (used to provision the local index).
pub trait StationSearch: Send + Sync {
    fn search_stations<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StationCandidate>, FetchError>>;
}

/// The [`StationSearch`] query rule, shared by every implementation.
pub fn station_matches(station: &StationCandidate, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    if query.len() == 2 && query.chars().all(|c| c.is_ascii_alphabetic()) {
        return station.state.eq_ignore_ascii_case(query);
    }
    station
        .name
        .to_lowercase()
        .contains(&query.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(name: &str, state: &str) -> StationCandidate {
        StationCandidate {
            id: "8447435".into(),
            name: name.into(),
            state: state.into(),
            latitude: 41.688,
            longitude: -69.951,
            distance_miles: 0.0,
        }
    }

    #[test]
    fn test_state_code_query_filters_by_state() {
        let chatham = station("Chatham, Lydia Cove", "MA");
        assert!(station_matches(&chatham, "ma"));
        assert!(!station_matches(&chatham, "RI"));
    }

    #[test]
    fn test_name_query_is_case_insensitive() {
        let chatham = station("Chatham, Lydia Cove", "MA");
        assert!(station_matches(&chatham, "lydia"));
        assert!(!station_matches(&chatham, "Nantucket"));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(station_matches(&station("Boston", "MA"), "  "));
    }
}
