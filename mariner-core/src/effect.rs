//! Side effects declared by the reducer and run by the
//! [`Dispatcher`](crate::Dispatcher).

use crate::action::ListOrigin;
use crate::geo::GeoPoint;
use crate::model::{PortDraft, SavedPort};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Begin building the local index in the background.
    StartProvisioning,
    /// Wait for the next provisioning status line.
    AwaitProvisionStatus,
    /// Wait for the provisioning outcome once the status stream has closed.
    AwaitProvisionResult,

    Geocode { session: u64, query: String },
    FindZones { session: u64, point: GeoPoint },
    FindStations { session: u64, point: GeoPoint },
    FindZoneByCode { session: u64, code: String },

    FetchWeather { session: u64, zone_code: String },
    FetchTides { session: u64, station_id: String },
    FetchAlerts { session: u64, zone_code: String },

    ListPorts { origin: ListOrigin },
    /// Look up a saved port by name, then resolve it.
    LoadPort { session: u64, name: String },
    /// Resolve a saved port's zone and station against the index.
    ResolvePort { session: u64, port: SavedPort },
    SavePort(PortDraft),
    DeletePort(String),
}
