//! Runtime tunables.
//!
//! The binary builds a [`Settings`] from its command line; everything else
//! takes it by value or reference. Defaults match the public NOAA services.

use std::time::Duration;

/// Search radii, task timeouts and channel sizes used by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Radius for the nearby marine zone search.
    pub zone_radius_miles: f64,
    /// Radius for the nearby tide station search. Stations are sparser than zones.
    pub station_radius_miles: f64,
    pub geocode_timeout: Duration,
    pub lookup_timeout: Duration,
    pub tide_timeout: Duration,
    pub weather_timeout: Duration,
    pub alert_timeout: Duration,
    /// Number of days of tide predictions to request, starting today.
    pub tide_window_days: i64,
    /// Depth of the provisioning progress channel.
    pub progress_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zone_radius_miles: 50.0,
            station_radius_miles: 100.0,
            geocode_timeout: Duration::from_secs(10),
            lookup_timeout: Duration::from_secs(15),
            tide_timeout: Duration::from_secs(15),
            weather_timeout: Duration::from_secs(30),
            alert_timeout: Duration::from_secs(30),
            tide_window_days: 3,
            progress_depth: 64,
        }
    }
}
