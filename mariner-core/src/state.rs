//! Application state, owned by the reducer and read by the UI.

use crate::model::{
    Alert, ForecastPeriod, Location, SavedPort, StationCandidate, TideEvent, WeatherSnapshot,
    ZoneCandidate,
};

/// Provisioning status lines kept for display.
pub const PROVISION_LOG_LINES: usize = 8;

/// The active screen. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Search,
    ZoneList,
    Loading,
    Display,
    Provisioning,
    Error,
    SavedList,
    SavePrompt,
    ConfirmDelete,
}

impl Screen {
    /// Screens whose printable keys go to a text input.
    pub fn takes_text(self) -> bool {
        matches!(self, Screen::Search | Screen::SavePrompt)
    }
}

/// Outstanding fetches of the active session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub weather: bool,
    pub tides: bool,
    pub alerts: bool,
}

impl LoadingFlags {
    pub fn any(self) -> bool {
        self.weather || self.tides || self.alerts
    }
}

/// Where the app goes once the local index is ready.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StartupTarget {
    /// Saved list if any ports exist, otherwise search.
    #[default]
    Default,
    /// Load a saved port by name.
    Port(String),
    /// Geocode a location and load a zone directly by code.
    Zone {
        zone_code: String,
        location_query: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub screen: Screen,
    /// Bumped on every full switch; results tagged with an older session are dropped.
    pub session: u64,
    pub startup: StartupTarget,

    // Search
    pub query: String,
    pub location: Option<Location>,
    pub zones: Vec<ZoneCandidate>,
    pub zone_cursor: usize,
    pub stations: Vec<StationCandidate>,
    pub stations_pending: bool,
    pub pending_zone_code: Option<String>,

    // Active selection and its data
    pub zone: Option<ZoneCandidate>,
    pub station: Option<StationCandidate>,
    pub weather: Option<WeatherSnapshot>,
    pub forecast: Vec<ForecastPeriod>,
    pub tides: Option<Vec<TideEvent>>,
    pub alerts: Option<Vec<Alert>>,
    pub loading: LoadingFlags,
    /// Non-fatal fetch failures of the active session.
    pub warnings: Vec<String>,

    pub error: Option<String>,
    pub provision_log: Vec<String>,

    // Saved ports
    pub ports: Vec<SavedPort>,
    pub port_cursor: usize,
    pub port_name: String,
    pub notice: Option<String>,

    /// Animation frame counter for spinners.
    pub tick: u32,
}

impl AppState {
    pub fn new(startup: StartupTarget) -> Self {
        Self {
            startup,
            ..Self::default()
        }
    }

    pub fn selected_port(&self) -> Option<&SavedPort> {
        self.ports.get(self.port_cursor)
    }

    pub fn selected_zone(&self) -> Option<&ZoneCandidate> {
        self.zones.get(self.zone_cursor)
    }

    /// Something on screen is animating.
    pub fn is_busy(&self) -> bool {
        matches!(self.screen, Screen::Loading | Screen::Provisioning) || self.loading.any()
    }

    /// Drops every transient entity and starts a new session.
    pub(crate) fn reset_session(&mut self) -> u64 {
        self.session += 1;
        self.location = None;
        self.zones.clear();
        self.zone_cursor = 0;
        self.stations.clear();
        self.stations_pending = false;
        self.pending_zone_code = None;
        self.zone = None;
        self.station = None;
        self.clear_data();
        self.notice = None;
        self.session
    }

    /// Drops fetched data and cancels its flags, keeping the selection.
    pub(crate) fn clear_data(&mut self) {
        self.weather = None;
        self.forecast.clear();
        self.tides = None;
        self.alerts = None;
        self.loading = LoadingFlags::default();
        self.warnings.clear();
    }
}
