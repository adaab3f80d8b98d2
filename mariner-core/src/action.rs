//! Messages consumed by the reducer.
//!
//! Naming follows intent/result: `SearchSubmit` is something the user asked
//! for, `GeocodeDidLoad` / `GeocodeDidError` is a background task reporting
//! back. Results of session-scoped work echo the session they were issued
//! for.

use crate::model::{
    Alert, Location, MarineWeather, SavedPort, StationCandidate, TideEvent, ZoneCandidate,
};
use crate::provision::ProvisionSummary;

/// Who asked for the saved port list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrigin {
    /// Launch without a target: pick Saved list or Search from the result.
    Startup,
    User,
}

#[derive(tui_dispatch::Action, Debug, Clone, PartialEq)]
pub enum Action {
    // ===== App =====
    AppStart { needs_provisioning: bool },
    Tick,
    Quit,
    ErrorDismiss,

    // ===== Provisioning =====
    ProvisionStatus(String),
    ProvisionStreamDidClose,
    ProvisionDidFinish(ProvisionSummary),
    ProvisionDidError(String),

    // ===== Search =====
    SearchQueryChange(String),
    SearchSubmit,
    GeocodeDidLoad { session: u64, location: Location },
    GeocodeDidError { session: u64, error: String },
    ZonesDidLoad { session: u64, zones: Vec<ZoneCandidate> },
    ZonesDidError { session: u64, error: String },
    ZoneByCodeDidLoad { session: u64, zone: ZoneCandidate },
    StationsDidLoad { session: u64, stations: Vec<StationCandidate> },
    StationsDidError { session: u64, error: String },

    // ===== Zone list =====
    ZoneSelect(usize),
    ZoneConfirm,

    // ===== Marine data =====
    WeatherDidLoad { session: u64, weather: MarineWeather },
    WeatherDidError { session: u64, error: String },
    TidesDidLoad { session: u64, tides: Vec<TideEvent> },
    TidesDidError { session: u64, error: String },
    AlertsDidLoad { session: u64, alerts: Vec<Alert> },
    AlertsDidError { session: u64, error: String },

    // ===== Display =====
    DisplayRefresh,
    DisplayNewSearch,

    // ===== Saved ports =====
    PortsOpen,
    PortsDidLoad { origin: ListOrigin, ports: Vec<SavedPort> },
    PortsDidError(String),
    PortSelect(usize),
    PortConfirm,
    PortDidResolve {
        session: u64,
        port: SavedPort,
        zone: ZoneCandidate,
        station: Option<StationCandidate>,
    },
    PortDidError { session: u64, error: String },
    PortDeleteRequest,
    PortDeleteConfirm,
    PortDeleteCancel,
    PortDidDelete(String),
    PortDeleteDidError(String),
    SavePromptOpen,
    SaveNameChange(String),
    SaveSubmit,
    SaveCancel,
    PortDidSave(SavedPort),
    PortSaveDidError(String),
}
