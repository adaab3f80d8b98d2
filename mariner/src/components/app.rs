//! Root component: routes input and drawing to the active screen.

use crossterm::event::{KeyCode, KeyModifiers};
use mariner_core::{Action, AppState, Screen};
use ratatui::{layout::Rect, Frame};
use tui_dispatch::EventKind;

use super::{
    Component, ConfirmDelete, ConfirmDeleteProps, ErrorView, ErrorViewProps, LoadingView,
    LoadingViewProps, MarineDisplay, MarineDisplayProps, ProvisioningView, ProvisioningViewProps,
    SavePrompt, SavePromptProps, SavedList, SavedListProps, SearchView, SearchViewProps, ZoneList,
    ZoneListProps,
};

pub struct AppProps<'a> {
    pub state: &'a AppState,
}

#[derive(Default)]
pub struct App {
    search: SearchView,
    zones: ZoneList,
    display: MarineDisplay,
    saved: SavedList,
    save_prompt: SavePrompt,
    /// Screen seen on the previous call; entering a screen resets its inputs.
    last_screen: Option<Screen>,
    last_session: u64,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    fn sync(&mut self, state: &AppState) {
        if self.last_screen != Some(state.screen) {
            match state.screen {
                Screen::Search => self.search.reset(&state.query),
                Screen::SavePrompt => self.save_prompt.reset(&state.port_name),
                _ => {}
            }
            self.last_screen = Some(state.screen);
        }
        if self.last_session != state.session {
            self.display.reset_scroll();
            self.last_session = state.session;
        }
    }

    fn display_props(state: &AppState, is_focused: bool) -> MarineDisplayProps<'_> {
        MarineDisplayProps {
            location: state.location.as_ref(),
            zone: state.zone.as_ref(),
            station: state.station.as_ref(),
            weather: state.weather.as_ref(),
            forecast: &state.forecast,
            tides: state.tides.as_deref(),
            alerts: state.alerts.as_deref(),
            loading: state.loading,
            warnings: &state.warnings,
            notice: state.notice.as_deref(),
            tick: state.tick,
            is_focused,
        }
    }

    fn saved_props(state: &AppState, is_focused: bool) -> SavedListProps<'_> {
        SavedListProps {
            ports: &state.ports,
            selected: state.port_cursor,
            notice: state.notice.as_deref(),
            is_focused,
        }
    }

    fn loading_subject(state: &AppState) -> &str {
        state
            .zone
            .as_ref()
            .map(|zone| zone.code.as_str())
            .unwrap_or(state.query.as_str())
    }

    fn save_subject(state: &AppState) -> String {
        match (&state.location, &state.zone) {
            (Some(location), Some(zone)) => format!("{} · {}", location.display_name, zone.code),
            _ => String::new(),
        }
    }
}

impl Component<Action> for App {
    type Props<'a> = AppProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        let state = props.state;
        self.sync(state);

        if let EventKind::Key(key) = event {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return vec![Action::Quit];
            }
        }

        let actions: Vec<Action> = match state.screen {
            Screen::Search => {
                let props = SearchViewProps {
                    query: &state.query,
                    notice: state.notice.as_deref(),
                    is_focused: true,
                };
                self.search.handle_event(event, props).into_iter().collect()
            }
            Screen::ZoneList => {
                let props = ZoneListProps {
                    location: state.location.as_ref(),
                    zones: &state.zones,
                    selected: state.zone_cursor,
                    stations_pending: state.stations_pending,
                    is_focused: true,
                };
                self.zones.handle_event(event, props).into_iter().collect()
            }
            Screen::Loading => {
                let props = LoadingViewProps {
                    subject: Self::loading_subject(state),
                    loading: state.loading,
                    tick: state.tick,
                    is_focused: true,
                };
                LoadingView.handle_event(event, props).into_iter().collect()
            }
            Screen::Display => self
                .display
                .handle_event(event, Self::display_props(state, true))
                .into_iter()
                .collect(),
            Screen::Provisioning => {
                let props = ProvisioningViewProps {
                    log: &state.provision_log,
                    tick: state.tick,
                };
                ProvisioningView.handle_event(event, props).into_iter().collect()
            }
            Screen::Error => {
                let props = ErrorViewProps {
                    message: state.error.as_deref().unwrap_or_default(),
                    is_focused: true,
                };
                ErrorView.handle_event(event, props).into_iter().collect()
            }
            Screen::SavedList => self
                .saved
                .handle_event(event, Self::saved_props(state, true))
                .into_iter()
                .collect(),
            Screen::SavePrompt => {
                let subject = Self::save_subject(state);
                let props = SavePromptProps {
                    name: &state.port_name,
                    subject: &subject,
                    is_focused: true,
                };
                self.save_prompt.handle_event(event, props).into_iter().collect()
            }
            Screen::ConfirmDelete => {
                let props = ConfirmDeleteProps {
                    name: state.selected_port().map(|p| p.name.as_str()).unwrap_or_default(),
                    is_focused: true,
                };
                ConfirmDelete.handle_event(event, props).into_iter().collect()
            }
        };
        actions
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let state = props.state;
        self.sync(state);

        match state.screen {
            Screen::Search => {
                let props = SearchViewProps {
                    query: &state.query,
                    notice: state.notice.as_deref(),
                    is_focused: true,
                };
                self.search.render(frame, area, props);
            }
            Screen::ZoneList => {
                let props = ZoneListProps {
                    location: state.location.as_ref(),
                    zones: &state.zones,
                    selected: state.zone_cursor,
                    stations_pending: state.stations_pending,
                    is_focused: true,
                };
                self.zones.render(frame, area, props);
            }
            Screen::Loading => {
                let props = LoadingViewProps {
                    subject: Self::loading_subject(state),
                    loading: state.loading,
                    tick: state.tick,
                    is_focused: true,
                };
                LoadingView.render(frame, area, props);
            }
            Screen::Display => {
                self.display
                    .render(frame, area, Self::display_props(state, true));
            }
            Screen::Provisioning => {
                let props = ProvisioningViewProps {
                    log: &state.provision_log,
                    tick: state.tick,
                };
                ProvisioningView.render(frame, area, props);
            }
            Screen::Error => {
                let props = ErrorViewProps {
                    message: state.error.as_deref().unwrap_or_default(),
                    is_focused: true,
                };
                ErrorView.render(frame, area, props);
            }
            Screen::SavedList => {
                self.saved.render(frame, area, Self::saved_props(state, true));
            }
            Screen::SavePrompt => {
                self.display
                    .render(frame, area, Self::display_props(state, false));
                let subject = Self::save_subject(state);
                let props = SavePromptProps {
                    name: &state.port_name,
                    subject: &subject,
                    is_focused: true,
                };
                self.save_prompt.render(frame, area, props);
            }
            Screen::ConfirmDelete => {
                self.saved.render(frame, area, Self::saved_props(state, false));
                let props = ConfirmDeleteProps {
                    name: state.selected_port().map(|p| p.name.as_str()).unwrap_or_default(),
                    is_focused: true,
                };
                ConfirmDelete.render(frame, area, props);
            }
        }
    }
}
