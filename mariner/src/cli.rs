//! Command line.

use std::path::PathBuf;

use clap::Parser;
use mariner_core::StartupTarget;
use thiserror::Error;

/// Marine weather, tides and alerts in the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "mariner", version, about)]
pub struct Args {
    /// SQLite database holding the local index and saved ports
    #[arg(long, env = "MARINER_DB", default_value = "data/mariner.db")]
    pub db: PathBuf,

    /// Write logs to this file (RUST_LOG sets the filter, default info)
    #[arg(long, env = "MARINER_LOG")]
    pub log: Option<PathBuf>,

    /// Read marine zones from a CSV (ID,NAME,LON,LAT) instead of downloading
    /// the NWS shapefile on first launch
    #[arg(long, env = "MARINER_ZONES_CSV")]
    pub zones_csv: Option<PathBuf>,

    /// Open a saved port by name
    #[arg(long, conflicts_with = "station")]
    pub port: Option<String>,

    /// Open a marine zone by code (e.g. ANZ254); needs --location
    #[arg(long)]
    pub station: Option<String>,

    /// Location for --station: 5-digit zip code or "City, ST"
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--station requires --location to determine the nearest tide station.")]
    StationWithoutLocation,

    #[error("--{0} must not be empty.")]
    Empty(&'static str),
}

impl Args {
    /// Where to go once the local index is ready.
    pub fn startup_target(&self) -> Result<StartupTarget, ConfigError> {
        if let Some(name) = &self.port {
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::Empty("port"));
            }
            return Ok(StartupTarget::Port(name.to_string()));
        }

        match (&self.station, &self.location) {
            (Some(zone), Some(location)) => {
                let zone = zone.trim();
                let location = location.trim();
                if zone.is_empty() {
                    return Err(ConfigError::Empty("station"));
                }
                if location.is_empty() {
                    return Err(ConfigError::Empty("location"));
                }
                Ok(StartupTarget::Zone {
                    zone_code: zone.to_ascii_uppercase(),
                    location_query: location.to_string(),
                })
            }
            (Some(_), None) => Err(ConfigError::StationWithoutLocation),
            (None, _) => Ok(StartupTarget::Default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("mariner").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.zones_csv, None);
        assert_eq!(args.startup_target(), Ok(StartupTarget::Default));
    }

    #[test]
    fn test_zones_csv_override() {
        let args = parse(&["--zones-csv", "data/marine_zones.csv"]);
        assert_eq!(args.zones_csv, Some(PathBuf::from("data/marine_zones.csv")));
    }

    #[test]
    fn test_port_target() {
        let args = parse(&["--port", " Home "]);
        assert_eq!(args.startup_target(), Ok(StartupTarget::Port("Home".into())));
    }

    #[test]
    fn test_station_needs_location() {
        let err = parse(&["--station", "ANZ254"]).startup_target().unwrap_err();
        assert_eq!(
            err.to_string(),
            "--station requires --location to determine the nearest tide station."
        );
    }

    #[test]
    fn test_station_with_location() {
        let args = parse(&["--station", "anz254", "--location", "02633"]);
        assert_eq!(
            args.startup_target(),
            Ok(StartupTarget::Zone {
                zone_code: "ANZ254".into(),
                location_query: "02633".into(),
            })
        );
    }

    #[test]
    fn test_location_alone_is_ignored() {
        let args = parse(&["--location", "02633"]);
        assert_eq!(args.startup_target(), Ok(StartupTarget::Default));
    }

    #[test]
    fn test_port_conflicts_with_station() {
        let result = Args::try_parse_from(["mariner", "--port", "Home", "--station", "ANZ254"]);
        assert!(result.is_err());
    }
}
