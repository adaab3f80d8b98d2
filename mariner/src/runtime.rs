//! The event loop: terminal input and background results in, frames out.
//!
//! [`tui_dispatch::Runtime`] owns the queue, the poller, the task manager and
//! the tick subscription. This module adds the pieces that are ours: the store
//! with its logging middleware, the root view and the effect dispatcher.

use std::cell::RefCell;
use std::io;
use std::time::Duration;

use mariner_core::{reducer, Action, AppState, Dispatcher, Effect, Services, Settings};
use ratatui::{backend::Backend, Terminal};
use tracing::info;
use tui_dispatch::runtime::Direct;
use tui_dispatch::{
    EventKind, EventOutcome, LoggingMiddleware, PollerConfig, Runtime, StoreWithMiddleware,
};

use crate::components::{App, AppProps, Component};

type Store = StoreWithMiddleware<AppState, Action, Effect, LoggingMiddleware>;

/// Spinner frame interval.
pub const TICK_RATE: Duration = Duration::from_millis(120);

pub struct MarinerRuntime {
    runtime: Runtime<AppState, Action, Effect, Direct, Store>,
    dispatcher: Dispatcher,
}

impl MarinerRuntime {
    pub fn new(state: AppState, services: Services, settings: Settings) -> Self {
        let store = StoreWithMiddleware::new(state, reducer, LoggingMiddleware::new());
        Self {
            runtime: Runtime::from_store(store),
            dispatcher: Dispatcher::new(services, settings),
        }
    }

    pub fn with_event_poller(mut self, config: PollerConfig) -> Self {
        self.runtime = self.runtime.with_event_poller(config);
        self
    }

    /// Queues an action behind whatever is already pending.
    pub fn enqueue(&self, action: Action) {
        self.runtime.enqueue(action);
    }

    pub fn state(&self) -> &AppState {
        self.runtime.state()
    }

    /// Runs until an [`Action::Quit`] comes off the queue.
    pub async fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        boot: Action,
    ) -> io::Result<()>
    where
        B::Error: Send + Sync + 'static,
    {
        self.runtime
            .subscriptions()
            .interval("tick", TICK_RATE, || Action::Tick);
        self.runtime.enqueue(boot);

        let app = RefCell::new(App::new());
        let dispatcher = &mut self.dispatcher;

        self.runtime
            .run_with_effects(
                terminal,
                |frame, area, state, _render_ctx| {
                    app.borrow_mut().render(frame, area, AppProps { state });
                },
                |event, state| map_event(&mut app.borrow_mut(), event, state),
                |action| {
                    let quit = matches!(action, Action::Quit);
                    if quit {
                        info!("Quit requested");
                    }
                    quit
                },
                |effect, ctx| dispatcher.handle(effect, ctx.tasks()),
            )
            .await
    }
}

fn map_event(app: &mut App, event: &EventKind, state: &AppState) -> EventOutcome<Action> {
    if let EventKind::Resize(..) = event {
        return EventOutcome::needs_render();
    }
    let actions: Vec<Action> = app
        .handle_event(event, AppProps { state })
        .into_iter()
        .collect();
    // Cursor moves inside inputs don't reach the store.
    if actions.is_empty() {
        EventOutcome::needs_render()
    } else {
        EventOutcome::from_actions(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mariner_core::testing::{fixture_services, seeded_database};
    use mariner_core::{Screen, StartupTarget};
    use ratatui::backend::TestBackend;
    use tui_dispatch::testing::{ctrl_key, key};

    fn runtime() -> MarinerRuntime {
        MarinerRuntime::new(
            AppState::new(StartupTarget::Default),
            fixture_services(seeded_database()),
            Settings::default(),
        )
        .with_event_poller(PollerConfig {
            poll_timeout: Duration::from_millis(1),
            loop_sleep: Duration::from_millis(1),
        })
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_quit_exits_after_first_frame() {
        let mut runtime = runtime();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        runtime.enqueue(Action::Quit);

        runtime
            .run(&mut terminal, Action::AppStart { needs_provisioning: false })
            .await
            .unwrap();

        assert!(buffer_text(&terminal).contains("Mariner"));
    }

    #[tokio::test]
    async fn test_queued_actions_reach_store_and_screen() {
        let mut runtime = runtime();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        runtime.enqueue(Action::SearchQueryChange("02633".into()));
        runtime.enqueue(Action::Quit);

        runtime
            .run(&mut terminal, Action::AppStart { needs_provisioning: false })
            .await
            .unwrap();

        assert_eq!(runtime.state().screen, Screen::Search);
        assert_eq!(runtime.state().query, "02633");
        assert!(buffer_text(&terminal).contains("02633"));
    }

    #[test]
    fn test_ctrl_c_maps_to_quit() {
        let state = AppState::new(StartupTarget::Default);
        let mut app = App::new();
        let outcome = map_event(&mut app, &EventKind::Key(ctrl_key('c')), &state);
        assert_eq!(outcome.actions, vec![Action::Quit]);
    }

    #[test]
    fn test_resize_only_redraws() {
        let state = AppState::new(StartupTarget::Default);
        let mut app = App::new();
        let outcome = map_event(&mut app, &EventKind::Resize(100, 30), &state);
        assert!(outcome.actions.is_empty());
        assert!(outcome.needs_render);
    }

    #[test]
    fn test_typing_becomes_query_change() {
        let mut state = AppState::new(StartupTarget::Default);
        state.screen = Screen::Search;
        let mut app = App::new();
        let outcome = map_event(&mut app, &EventKind::Key(key("0")), &state);
        assert_eq!(outcome.actions, vec![Action::SearchQueryChange("0".into())]);
    }
}
