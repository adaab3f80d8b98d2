//! Core of the mariner dashboard.
//!
//! Everything the terminal front end needs except the terminal itself:
//!
//! - [`reducer`]: the application state machine. A pure function from
//!   `(&mut AppState, Action)` to a `tui_dispatch::ReducerResult` carrying
//!   the effects it wants run.
//! - [`Dispatcher`]: turns each [`Effect`] into one keyed background task on
//!   a `tui_dispatch::TaskManager` that reports back with exactly one
//!   [`Action`].
//! - [`ZoneIndex`] / [`StationIndex`]: nearest-entity lookups against the
//!   local SQLite cache.
//! - [`Provisioner`]: builds that cache on first launch and streams progress.
//! - [`SavedPortStore`]: user-named locations.
//!
//! Network clients are injected through the capability traits in [`fetch`],
//! so the whole flow can be driven in tests with the doubles from
//! [`testing`].

pub mod action;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod effect;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod geocode;
pub mod index;
pub mod model;
pub mod ports;
pub mod provision;
pub mod reducer;
pub mod state;
pub mod tasks;
pub mod testing;

pub use action::{Action, ListOrigin};
pub use config::Settings;
pub use db::Database;
pub use dispatcher::{Dispatcher, Services};
pub use effect::Effect;
pub use error::{FetchError, LookupError, ProvisionError, StoreError};
pub use fetch::{AlertSource, BoxFuture, Geocoder, StationSearch, TideSource, WeatherSource};
pub use geo::{haversine_miles, BoundingBox, GeoPoint};
pub use geocode::{FallbackGeocoder, LocalGeocoder};
pub use index::{StationIndex, ZoneIndex};
pub use model::{
    Alert, ForecastPeriod, Location, MarineWeather, PortDraft, SavedPort, StationCandidate,
    TideEvent, TideKind, WeatherSnapshot, ZoneCandidate,
};
pub use ports::SavedPortStore;
pub use provision::{ProvisionHandle, ProvisionSummary, Provisioner, ZipCatalog, ZoneCatalog};
pub use reducer::reducer;
pub use state::{AppState, LoadingFlags, Screen, StartupTarget};
pub use tasks::SpawnWithTimeout;
