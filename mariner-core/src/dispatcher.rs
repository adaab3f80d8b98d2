//! Runs effects as keyed background tasks.
//!
//! Every effect becomes at most one task on the runtime's [`TaskManager`] and
//! every task sends exactly one action back, success or failure, including
//! when it times out. Index and store work runs on the blocking pool.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{info, warn};
use tui_dispatch::{TaskKey, TaskManager};

use crate::action::Action;
use crate::config::Settings;
use crate::effect::Effect;
use crate::error::{FetchError, LookupError, ProvisionError, StoreError};
use crate::fetch::{AlertSource, Geocoder, TideSource, WeatherSource};
use crate::index::{StationIndex, ZoneIndex};
use crate::model::{SavedPort, StationCandidate, ZoneCandidate};
use crate::ports::SavedPortStore;
use crate::provision::{ProvisionSummary, Provisioner};
use crate::tasks::SpawnWithTimeout;

/// Everything the dispatcher talks to.
#[derive(Clone)]
pub struct Services {
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherSource>,
    pub tides: Arc<dyn TideSource>,
    pub alerts: Arc<dyn AlertSource>,
    pub zones: ZoneIndex,
    pub stations: StationIndex,
    pub ports: SavedPortStore,
    pub provisioner: Provisioner,
}

type ProgressSlot = Arc<Mutex<Option<mpsc::Receiver<String>>>>;
type OutcomeSlot =
    Arc<Mutex<Option<oneshot::Receiver<Result<ProvisionSummary, ProvisionError>>>>>;

pub struct Dispatcher {
    services: Services,
    settings: Settings,
    progress: ProgressSlot,
    outcome: OutcomeSlot,
}

impl Dispatcher {
    pub fn new(services: Services, settings: Settings) -> Self {
        Self {
            services,
            settings,
            progress: Arc::default(),
            outcome: Arc::default(),
        }
    }

    pub fn handle(&mut self, effect: Effect, tasks: &mut TaskManager<Action>) {
        match effect {
            Effect::StartProvisioning => {
                let handle = self.services.provisioner.start(self.settings.progress_depth);
                self.progress = Arc::new(Mutex::new(Some(handle.progress)));
                self.outcome = Arc::new(Mutex::new(Some(handle.done)));
                info!("Provisioning started");
            }

            Effect::AwaitProvisionStatus => {
                let progress = Arc::clone(&self.progress);
                tasks.spawn("provision-status", async move {
                    let mut slot = progress.lock().await;
                    let line = match slot.as_mut() {
                        Some(rx) => rx.recv().await,
                        None => None,
                    };
                    match line {
                        Some(line) => Action::ProvisionStatus(line),
                        None => Action::ProvisionStreamDidClose,
                    }
                });
            }

            Effect::AwaitProvisionResult => {
                let outcome = Arc::clone(&self.outcome);
                tasks.spawn("provision-result", async move {
                    let rx = outcome.lock().await.take();
                    let result = match rx {
                        Some(rx) => rx.await.unwrap_or(Err(ProvisionError::Interrupted)),
                        None => Err(ProvisionError::Interrupted),
                    };
                    match result {
                        Ok(summary) => Action::ProvisionDidFinish(summary),
                        Err(err) => Action::ProvisionDidError(err.to_string()),
                    }
                });
            }

            Effect::Geocode { session, query } => {
                let geocoder = Arc::clone(&self.services.geocoder);
                tasks.spawn_with_timeout(
                    "geocode",
                    self.settings.geocode_timeout,
                    async move {
                        match geocoder.geocode(&query).await {
                            Ok(location) => Action::GeocodeDidLoad { session, location },
                            Err(err) => Action::GeocodeDidError {
                                session,
                                error: err.to_string(),
                            },
                        }
                    },
                    move |limit| Action::GeocodeDidError {
                        session,
                        error: LookupError::Timeout(limit).to_string(),
                    },
                );
            }

            Effect::FindZones { session, point } => {
                let zones = self.services.zones.clone();
                let radius = self.settings.zone_radius_miles;
                tasks.spawn_with_timeout(
                    "zones",
                    self.settings.lookup_timeout,
                    async move {
                        match blocking(move || zones.find_nearby(point, radius)).await {
                            Ok(zones) => Action::ZonesDidLoad { session, zones },
                            Err(err) => Action::ZonesDidError {
                                session,
                                error: err.to_string(),
                            },
                        }
                    },
                    move |limit| Action::ZonesDidError {
                        session,
                        error: LookupError::Timeout(limit).to_string(),
                    },
                );
            }

            Effect::FindZoneByCode { session, code } => {
                let zones = self.services.zones.clone();
                tasks.spawn_with_timeout(
                    "zones",
                    self.settings.lookup_timeout,
                    async move {
                        match blocking(move || zones.find_by_code(&code)).await {
                            Ok(zone) => Action::ZoneByCodeDidLoad { session, zone },
                            Err(err) => Action::ZonesDidError {
                                session,
                                error: err.to_string(),
                            },
                        }
                    },
                    move |limit| Action::ZonesDidError {
                        session,
                        error: LookupError::Timeout(limit).to_string(),
                    },
                );
            }

            Effect::FindStations { session, point } => {
                let stations = self.services.stations.clone();
                let radius = self.settings.station_radius_miles;
                tasks.spawn_with_timeout(
                    "stations",
                    self.settings.lookup_timeout,
                    async move {
                        match blocking(move || stations.find_nearby(point, radius)).await {
                            Ok(stations) => Action::StationsDidLoad { session, stations },
                            Err(err) => Action::StationsDidError {
                                session,
                                error: err.to_string(),
                            },
                        }
                    },
                    move |limit| Action::StationsDidError {
                        session,
                        error: LookupError::Timeout(limit).to_string(),
                    },
                );
            }

            Effect::FetchWeather { session, zone_code } => {
                let source = Arc::clone(&self.services.weather);
                tasks.spawn_with_timeout(
                    "weather",
                    self.settings.weather_timeout,
                    async move {
                        match source.marine_weather(&zone_code).await {
                            Ok(weather) => Action::WeatherDidLoad { session, weather },
                            Err(err) => {
                                warn!(zone = %zone_code, error = %err, "Weather fetch failed");
                                Action::WeatherDidError {
                                    session,
                                    error: err.to_string(),
                                }
                            }
                        }
                    },
                    move |after| Action::WeatherDidError {
                        session,
                        error: FetchError::Timeout {
                            what: "weather",
                            after,
                        }
                        .to_string(),
                    },
                );
            }

            Effect::FetchTides {
                session,
                station_id,
            } => {
                let source = Arc::clone(&self.services.tides);
                let start = Local::now().date_naive();
                let end = start + chrono::Duration::days(self.settings.tide_window_days.max(1) - 1);
                tasks.spawn_with_timeout(
                    "tides",
                    self.settings.tide_timeout,
                    async move {
                        match source.tide_predictions(&station_id, start, end).await {
                            Ok(tides) => Action::TidesDidLoad { session, tides },
                            Err(err) => {
                                warn!(station = %station_id, error = %err, "Tide fetch failed");
                                Action::TidesDidError {
                                    session,
                                    error: err.to_string(),
                                }
                            }
                        }
                    },
                    move |after| Action::TidesDidError {
                        session,
                        error: FetchError::Timeout {
                            what: "tides",
                            after,
                        }
                        .to_string(),
                    },
                );
            }

            Effect::FetchAlerts { session, zone_code } => {
                let source = Arc::clone(&self.services.alerts);
                tasks.spawn_with_timeout(
                    "alerts",
                    self.settings.alert_timeout,
                    async move {
                        match source.active_alerts(&zone_code).await {
                            Ok(alerts) => Action::AlertsDidLoad { session, alerts },
                            Err(err) => {
                                warn!(zone = %zone_code, error = %err, "Alert fetch failed");
                                Action::AlertsDidError {
                                    session,
                                    error: err.to_string(),
                                }
                            }
                        }
                    },
                    move |after| Action::AlertsDidError {
                        session,
                        error: FetchError::Timeout {
                            what: "alerts",
                            after,
                        }
                        .to_string(),
                    },
                );
            }

            Effect::ListPorts { origin } => {
                let ports = self.services.ports.clone();
                tasks.spawn("ports", async move {
                    match blocking(move || ports.list()).await {
                        Ok(ports) => Action::PortsDidLoad { origin, ports },
                        Err(err) => Action::PortsDidError(err.to_string()),
                    }
                });
            }

            Effect::LoadPort { session, name } => {
                let (ports, zones, stations) = self.port_services();
                tasks.spawn_with_timeout(
                    "port",
                    self.settings.lookup_timeout,
                    async move {
                        let resolved = blocking(move || {
                            let port = ports.get(&name)?;
                            resolve_port(&zones, &stations, port)
                        })
                        .await;
                        port_resolved(session, resolved)
                    },
                    move |limit| Action::PortDidError {
                        session,
                        error: LookupError::Timeout(limit).to_string(),
                    },
                );
            }

            Effect::ResolvePort { session, port } => {
                let (_, zones, stations) = self.port_services();
                tasks.spawn_with_timeout(
                    "port",
                    self.settings.lookup_timeout,
                    async move {
                        let resolved =
                            blocking(move || resolve_port(&zones, &stations, port)).await;
                        port_resolved(session, resolved)
                    },
                    move |limit| Action::PortDidError {
                        session,
                        error: LookupError::Timeout(limit).to_string(),
                    },
                );
            }

            Effect::SavePort(draft) => {
                let ports = self.services.ports.clone();
                tasks.spawn(TaskKey::new(format!("save:{}", draft.name)), async move {
                    match blocking(move || ports.upsert(&draft)).await {
                        Ok(port) => Action::PortDidSave(port),
                        Err(err) => Action::PortSaveDidError(err.to_string()),
                    }
                });
            }

            Effect::DeletePort(name) => {
                let ports = self.services.ports.clone();
                tasks.spawn(TaskKey::new(format!("delete:{name}")), async move {
                    let target = name.clone();
                    match blocking(move || ports.delete(&target)).await {
                        Ok(_) => Action::PortDidDelete(name),
                        Err(err) => Action::PortDeleteDidError(err.to_string()),
                    }
                });
            }
        }
    }

    fn port_services(&self) -> (SavedPortStore, ZoneIndex, StationIndex) {
        (
            self.services.ports.clone(),
            self.services.zones.clone(),
            self.services.stations.clone(),
        )
    }
}

type Resolved = (SavedPort, ZoneCandidate, Option<StationCandidate>);

/// Zone must exist; a station that vanished from the index only costs tides.
fn resolve_port(
    zones: &ZoneIndex,
    stations: &StationIndex,
    port: SavedPort,
) -> Result<Resolved, LookupError> {
    let zone = zones.find_by_code(&port.zone_code)?;
    let station = match port.station_id.as_deref() {
        Some(id) => match stations.find_by_code(id) {
            Ok(station) => Some(station),
            Err(LookupError::StationNotFound(id)) => {
                warn!(port = %port.name, station = %id, "Saved station no longer indexed");
                None
            }
            Err(err) => return Err(err),
        },
        None => None,
    };
    Ok((port, zone, station))
}

fn port_resolved(session: u64, resolved: Result<Resolved, LookupError>) -> Action {
    match resolved {
        Ok((port, zone, station)) => Action::PortDidResolve {
            session,
            port,
            zone,
            station,
        },
        Err(err) => Action::PortDidError {
            session,
            error: err.to_string(),
        },
    }
}

async fn blocking<T, E>(f: impl FnOnce() -> Result<T, E> + Send + 'static) -> Result<T, E>
where
    T: Send + 'static,
    E: From<StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| E::from(StoreError::from(err)))?
}
