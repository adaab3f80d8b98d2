//! The state machine: `(state, action) -> (changed, effects)`.
//!
//! Pure. All I/O is expressed as [`Effect`]s. Results of background work
//! carry the session they were issued for and are ignored once the user has
//! moved on to another search or port.

use tui_dispatch::ReducerResult;

use crate::action::{Action, ListOrigin};
use crate::effect::Effect;
use crate::model::{PortDraft, ZoneCandidate};
use crate::state::{AppState, LoadingFlags, Screen, StartupTarget, PROVISION_LOG_LINES};

pub fn reducer(state: &mut AppState, action: Action) -> ReducerResult<Effect> {
    match action {
        // ===== App =====
        Action::AppStart { needs_provisioning } => {
            if needs_provisioning {
                state.screen = Screen::Provisioning;
                state.provision_log.clear();
                ReducerResult::changed_with_many(vec![
                    Effect::StartProvisioning,
                    Effect::AwaitProvisionStatus,
                ])
            } else {
                begin_startup(state)
            }
        }

        Action::Tick => {
            state.tick = state.tick.wrapping_add(1);
            if state.is_busy() {
                ReducerResult::changed()
            } else {
                ReducerResult::unchanged()
            }
        }

        Action::Quit => ReducerResult::unchanged(),

        Action::ErrorDismiss => {
            if state.screen != Screen::Error {
                return ReducerResult::unchanged();
            }
            state.error = None;
            state.screen = Screen::Search;
            ReducerResult::changed()
        }

        // ===== Provisioning =====
        Action::ProvisionStatus(line) => {
            state.provision_log.push(line);
            let overflow = state.provision_log.len().saturating_sub(PROVISION_LOG_LINES);
            state.provision_log.drain(..overflow);
            ReducerResult::changed_with(Effect::AwaitProvisionStatus)
        }

        Action::ProvisionStreamDidClose => ReducerResult::effect(Effect::AwaitProvisionResult),

        Action::ProvisionDidFinish(_) => begin_startup(state),

        Action::ProvisionDidError(error) => fail(state, format!("Setup failed: {error}")),

        // ===== Search =====
        Action::SearchQueryChange(query) => {
            if state.screen != Screen::Search || state.query == query {
                return ReducerResult::unchanged();
            }
            state.query = query;
            ReducerResult::changed()
        }

        Action::SearchSubmit => {
            let query = state.query.trim().to_string();
            if state.screen != Screen::Search || query.is_empty() {
                return ReducerResult::unchanged();
            }
            let session = state.reset_session();
            state.query = query.clone();
            state.screen = Screen::Loading;
            ReducerResult::changed_with(Effect::Geocode { session, query })
        }

        Action::GeocodeDidLoad { session, location } => {
            if is_stale(state, session) {
                return ReducerResult::unchanged();
            }
            let point = location.point();
            state.location = Some(location);
            state.stations_pending = true;
            let find_zones = match state.pending_zone_code.take() {
                Some(code) => Effect::FindZoneByCode { session, code },
                None => Effect::FindZones { session, point },
            };
            ReducerResult::changed_with_many(vec![
                find_zones,
                Effect::FindStations { session, point },
            ])
        }

        Action::GeocodeDidError { session, error }
        | Action::ZonesDidError { session, error }
        | Action::StationsDidError { session, error }
        | Action::PortDidError { session, error } => {
            if is_stale(state, session) {
                return ReducerResult::unchanged();
            }
            fail(state, error)
        }

        Action::ZonesDidLoad { session, zones } => {
            if is_stale(state, session) {
                return ReducerResult::unchanged();
            }
            if zones.is_empty() {
                let message = format!("No marine forecast zones found near \"{}\"", state.query);
                return fail(state, message);
            }
            state.zones = zones;
            state.zone_cursor = 0;
            state.screen = Screen::ZoneList;
            ReducerResult::changed()
        }

        Action::ZoneByCodeDidLoad { session, zone } => {
            if is_stale(state, session) {
                return ReducerResult::unchanged();
            }
            state.zones = vec![zone.clone()];
            state.zone_cursor = 0;
            select_zone(state, zone)
        }

        Action::StationsDidLoad { session, stations } => {
            if is_stale(state, session) {
                return ReducerResult::unchanged();
            }
            state.stations_pending = false;
            state.station = stations.first().cloned();
            state.stations = stations;

            // A zone was picked before the stations arrived.
            if state.loading.tides {
                if let Some(station) = &state.station {
                    return ReducerResult::changed_with(Effect::FetchTides {
                        session,
                        station_id: station.id.clone(),
                    });
                }
                state.loading.tides = false;
                settle_loading(state);
            }
            ReducerResult::changed()
        }

        // ===== Zone list =====
        Action::ZoneSelect(index) => {
            if state.screen != Screen::ZoneList || state.zones.is_empty() {
                return ReducerResult::unchanged();
            }
            let index = index.min(state.zones.len() - 1);
            if index == state.zone_cursor {
                return ReducerResult::unchanged();
            }
            state.zone_cursor = index;
            ReducerResult::changed()
        }

        Action::ZoneConfirm => {
            if state.screen != Screen::ZoneList {
                return ReducerResult::unchanged();
            }
            match state.selected_zone().cloned() {
                Some(zone) => select_zone(state, zone),
                None => ReducerResult::unchanged(),
            }
        }

        // ===== Marine data =====
        Action::WeatherDidLoad { session, weather } => {
            if is_stale(state, session) {
                return ReducerResult::unchanged();
            }
            state.loading.weather = false;
            state.weather = Some(weather.current);
            state.forecast = weather.forecast;
            settle_loading(state);
            ReducerResult::changed()
        }

        Action::WeatherDidError { session, error } => {
            fetch_failed(state, session, "Weather", error, |f| f.weather = false)
        }

        Action::TidesDidLoad { session, tides } => {
            if is_stale(state, session) {
                return ReducerResult::unchanged();
            }
            state.loading.tides = false;
            state.tides = Some(tides);
            settle_loading(state);
            ReducerResult::changed()
        }

        Action::TidesDidError { session, error } => {
            fetch_failed(state, session, "Tides", error, |f| f.tides = false)
        }

        Action::AlertsDidLoad { session, alerts } => {
            if is_stale(state, session) {
                return ReducerResult::unchanged();
            }
            state.loading.alerts = false;
            state.alerts = Some(alerts);
            settle_loading(state);
            ReducerResult::changed()
        }

        Action::AlertsDidError { session, error } => {
            fetch_failed(state, session, "Alerts", error, |f| f.alerts = false)
        }

        // ===== Display =====
        Action::DisplayRefresh => {
            if state.screen != Screen::Display || state.zone.is_none() {
                return ReducerResult::unchanged();
            }
            state.clear_data();
            state.notice = None;
            ReducerResult::changed_with_many(fetch_batch(state))
        }

        Action::DisplayNewSearch => {
            if !matches!(
                state.screen,
                Screen::Display | Screen::Loading | Screen::ZoneList | Screen::SavedList
            ) {
                return ReducerResult::unchanged();
            }
            state.reset_session();
            state.query.clear();
            state.screen = Screen::Search;
            ReducerResult::changed()
        }

        // ===== Saved ports =====
        Action::PortsOpen => {
            if !matches!(state.screen, Screen::Search | Screen::Display) {
                return ReducerResult::unchanged();
            }
            ReducerResult::effect(Effect::ListPorts {
                origin: ListOrigin::User,
            })
        }

        Action::PortsDidLoad { origin, ports } => {
            state.ports = ports;
            state.port_cursor = state.port_cursor.min(state.ports.len().saturating_sub(1));
            match origin {
                ListOrigin::Startup => {
                    if state.screen == Screen::Search && !state.ports.is_empty() {
                        state.screen = Screen::SavedList;
                    }
                }
                ListOrigin::User => state.screen = Screen::SavedList,
            }
            ReducerResult::changed()
        }

        Action::PortsDidError(error) => fail(state, error),

        Action::PortSelect(index) => {
            if state.screen != Screen::SavedList || state.ports.is_empty() {
                return ReducerResult::unchanged();
            }
            let index = index.min(state.ports.len() - 1);
            if index == state.port_cursor {
                return ReducerResult::unchanged();
            }
            state.port_cursor = index;
            ReducerResult::changed()
        }

        Action::PortConfirm => {
            if state.screen != Screen::SavedList {
                return ReducerResult::unchanged();
            }
            let Some(port) = state.selected_port().cloned() else {
                return ReducerResult::unchanged();
            };
            let session = state.reset_session();
            state.query = port.name.clone();
            state.screen = Screen::Loading;
            ReducerResult::changed_with(Effect::ResolvePort { session, port })
        }

        Action::PortDidResolve {
            session,
            port,
            zone,
            station,
        } => {
            if is_stale(state, session) {
                return ReducerResult::unchanged();
            }
            state.location = Some(port.location());
            state.zones = vec![zone.clone()];
            state.zone_cursor = 0;
            state.stations = station.iter().cloned().collect();
            state.station = station;
            state.stations_pending = false;
            select_zone(state, zone)
        }

        Action::PortDeleteRequest => {
            if state.screen != Screen::SavedList || state.selected_port().is_none() {
                return ReducerResult::unchanged();
            }
            state.screen = Screen::ConfirmDelete;
            ReducerResult::changed()
        }

        Action::PortDeleteConfirm => {
            if state.screen != Screen::ConfirmDelete {
                return ReducerResult::unchanged();
            }
            state.screen = Screen::SavedList;
            match state.selected_port() {
                Some(port) => ReducerResult::changed_with(Effect::DeletePort(port.name.clone())),
                None => ReducerResult::changed(),
            }
        }

        Action::PortDeleteCancel => {
            if state.screen != Screen::ConfirmDelete {
                return ReducerResult::unchanged();
            }
            state.screen = Screen::SavedList;
            ReducerResult::changed()
        }

        Action::PortDidDelete(name) => {
            state.notice = Some(format!("Deleted \"{name}\""));
            ReducerResult::changed_with(Effect::ListPorts {
                origin: ListOrigin::User,
            })
        }

        Action::PortDeleteDidError(error) | Action::PortSaveDidError(error) => fail(state, error),

        Action::SavePromptOpen => {
            if state.screen != Screen::Display {
                return ReducerResult::unchanged();
            }
            let (Some(location), Some(_)) = (&state.location, &state.zone) else {
                return ReducerResult::unchanged();
            };
            state.port_name = location.city.clone();
            state.screen = Screen::SavePrompt;
            ReducerResult::changed()
        }

        Action::SaveNameChange(name) => {
            if state.screen != Screen::SavePrompt {
                return ReducerResult::unchanged();
            }
            state.port_name = name;
            ReducerResult::changed()
        }

        Action::SaveSubmit => {
            if state.screen != Screen::SavePrompt {
                return ReducerResult::unchanged();
            }
            let name = state.port_name.trim();
            let (Some(location), Some(zone)) = (&state.location, &state.zone) else {
                return ReducerResult::unchanged();
            };
            if name.is_empty() {
                return ReducerResult::unchanged();
            }
            let draft = PortDraft::new(name, location, zone, state.station.as_ref());
            state.screen = Screen::Display;
            ReducerResult::changed_with(Effect::SavePort(draft))
        }

        Action::SaveCancel => {
            if state.screen != Screen::SavePrompt {
                return ReducerResult::unchanged();
            }
            state.screen = Screen::Display;
            ReducerResult::changed()
        }

        Action::PortDidSave(port) => {
            state.notice = Some(format!("Saved port \"{}\"", port.name));
            ReducerResult::changed()
        }
    }
}

fn is_stale(state: &AppState, session: u64) -> bool {
    if session != state.session {
        tracing::debug!(session, current = state.session, "Dropping stale result");
        return true;
    }
    false
}

/// Moves to the configured launch target.
fn begin_startup(state: &mut AppState) -> ReducerResult<Effect> {
    match state.startup.clone() {
        StartupTarget::Port(name) => {
            let session = state.reset_session();
            state.query = name.clone();
            state.screen = Screen::Loading;
            ReducerResult::changed_with(Effect::LoadPort { session, name })
        }
        StartupTarget::Zone {
            zone_code,
            location_query,
        } => {
            let session = state.reset_session();
            state.pending_zone_code = Some(zone_code);
            state.query = location_query.clone();
            state.screen = Screen::Loading;
            ReducerResult::changed_with(Effect::Geocode {
                session,
                query: location_query,
            })
        }
        StartupTarget::Default => {
            state.screen = Screen::Search;
            ReducerResult::changed_with(Effect::ListPorts {
                origin: ListOrigin::Startup,
            })
        }
    }
}

fn select_zone(state: &mut AppState, zone: ZoneCandidate) -> ReducerResult<Effect> {
    state.zone = Some(zone);
    state.clear_data();
    state.screen = Screen::Loading;
    ReducerResult::changed_with_many(fetch_batch(state))
}

/// Weather, alerts and (when a station is known) tides for the selected zone.
/// Sets a flag per fetch. If the station lookup is still running the tide
/// flag is set anyway and the fetch goes out when stations arrive.
fn fetch_batch(state: &mut AppState) -> Vec<Effect> {
    let Some(zone) = &state.zone else {
        return Vec::new();
    };
    let session = state.session;
    let mut effects = vec![
        Effect::FetchWeather {
            session,
            zone_code: zone.code.clone(),
        },
        Effect::FetchAlerts {
            session,
            zone_code: zone.code.clone(),
        },
    ];
    state.loading = LoadingFlags {
        weather: true,
        alerts: true,
        tides: state.station.is_some() || state.stations_pending,
    };
    if let Some(station) = &state.station {
        effects.push(Effect::FetchTides {
            session,
            station_id: station.id.clone(),
        });
    }
    effects
}

fn fetch_failed(
    state: &mut AppState,
    session: u64,
    what: &str,
    error: String,
    clear: impl FnOnce(&mut LoadingFlags),
) -> ReducerResult<Effect> {
    if is_stale(state, session) {
        return ReducerResult::unchanged();
    }
    clear(&mut state.loading);
    state.warnings.push(format!("{what} unavailable: {error}"));
    settle_loading(state);
    ReducerResult::changed()
}

/// The single place that decides Loading -> Display: once a zone is selected
/// and no fetch is outstanding, whatever succeeded is shown.
fn settle_loading(state: &mut AppState) {
    if state.screen == Screen::Loading && state.zone.is_some() && !state.loading.any() {
        state.screen = Screen::Display;
    }
}

/// Fatal for the current session: show the error and drop in-flight results.
fn fail(state: &mut AppState, message: String) -> ReducerResult<Effect> {
    state.session += 1;
    state.loading = LoadingFlags::default();
    state.error = Some(message);
    state.screen = Screen::Error;
    ReducerResult::changed()
}
