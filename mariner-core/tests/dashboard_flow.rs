//! End-to-end flows: reducer + dispatcher over the fixture database, with
//! the action channel pumped by hand the way the runtime loop does.

use std::sync::Arc;
use std::time::Duration;

use mariner_core::testing::{fixture_services, seeded_database, Canned};
use mariner_core::{
    reducer, Action, AppState, Database, Dispatcher, Effect, FetchError, MarineWeather, Screen,
    Services, Settings, StartupTarget,
};
use tokio::sync::mpsc;
use tui_dispatch::{Store, TaskManager};

struct Harness {
    store: Store<AppState, Action, Effect>,
    dispatcher: Dispatcher,
    tasks: TaskManager<Action>,
    rx: mpsc::UnboundedReceiver<Action>,
}

impl Harness {
    fn new(services: Services, settings: Settings, startup: StartupTarget) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            store: Store::new(AppState::new(startup), reducer),
            dispatcher: Dispatcher::new(services, settings),
            tasks: TaskManager::new(tx),
            rx,
        }
    }

    fn state(&self) -> &AppState {
        self.store.state()
    }

    fn send(&mut self, action: Action) {
        let result = self.store.dispatch(action);
        for effect in result.effects {
            self.dispatcher.handle(effect, &mut self.tasks);
        }
    }

    async fn run_until(&mut self, done: impl Fn(&AppState) -> bool) {
        while !done(self.store.state()) {
            let action = tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .expect("no action within 5s")
                .expect("action channel closed");
            self.send(action);
        }
    }
}

async fn search(harness: &mut Harness, query: &str) {
    harness.send(Action::SearchQueryChange(query.into()));
    harness.send(Action::SearchSubmit);
    harness
        .run_until(|s| matches!(s.screen, Screen::ZoneList | Screen::Display | Screen::Error))
        .await;
}

#[tokio::test]
async fn test_first_launch_provisions_then_searches_chatham() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let mut harness = Harness::new(
        fixture_services(Arc::clone(&db)),
        Settings::default(),
        StartupTarget::Default,
    );

    harness.send(Action::AppStart {
        needs_provisioning: db.needs_provisioning().unwrap(),
    });
    assert_eq!(harness.state().screen, Screen::Provisioning);
    harness.run_until(|s| s.screen == Screen::Search).await;
    assert_eq!(
        harness.state().provision_log.last().map(String::as_str),
        Some("Setup complete.")
    );

    search(&mut harness, "02633").await;
    let state = harness.state();
    assert_eq!(state.screen, Screen::ZoneList);
    let codes: Vec<_> = state.zones.iter().map(|z| z.code.as_str()).collect();
    assert_eq!(codes, vec!["ANZ254", "ANZ237"]);
    assert!((state.zones[0].distance_miles - 3.1).abs() < 0.2);
    assert!((state.zones[1].distance_miles - 41.0).abs() < 1.0);

    harness.send(Action::ZoneConfirm);
    harness.run_until(|s| s.screen == Screen::Display).await;
    let state = harness.state();
    assert_eq!(state.zone.as_ref().unwrap().code, "ANZ254");
    assert_eq!(state.station.as_ref().unwrap().id, "8447435");
    assert!(state.weather.is_some());
    assert_eq!(state.tides.as_ref().map(Vec::len), Some(3));
    assert_eq!(state.alerts.as_ref().map(Vec::len), Some(1));
    assert!(state.warnings.is_empty());
    assert!(!state.loading.any());
}

#[tokio::test]
async fn test_unknown_zip_shows_error_and_recovers() {
    let mut harness = Harness::new(
        fixture_services(seeded_database()),
        Settings::default(),
        StartupTarget::Default,
    );
    harness.send(Action::AppStart {
        needs_provisioning: false,
    });

    search(&mut harness, "99999").await;
    assert_eq!(harness.state().screen, Screen::Error);
    assert_eq!(
        harness.state().error.as_deref(),
        Some("zipcode 99999 not found")
    );

    harness.send(Action::ErrorDismiss);
    assert_eq!(harness.state().screen, Screen::Search);
}

#[tokio::test]
async fn test_inland_location_has_no_zones() {
    let mut harness = Harness::new(
        fixture_services(seeded_database()),
        Settings::default(),
        StartupTarget::Default,
    );
    search(&mut harness, "80202").await;
    assert_eq!(harness.state().screen, Screen::Error);
    assert!(harness
        .state()
        .error
        .as_deref()
        .unwrap()
        .starts_with("No marine forecast zones found"));
}

#[tokio::test]
async fn test_failed_weather_still_reaches_display() {
    let mut services = fixture_services(seeded_database());
    services.weather = Arc::new(Canned::<MarineWeather>::err(FetchError::Status(503)));
    let mut harness = Harness::new(services, Settings::default(), StartupTarget::Default);

    search(&mut harness, "02633").await;
    harness.send(Action::ZoneConfirm);
    harness.run_until(|s| s.screen == Screen::Display).await;

    let state = harness.state();
    assert!(state.weather.is_none());
    assert!(state.tides.is_some());
    assert_eq!(state.warnings.len(), 1);
    assert!(state.warnings[0].starts_with("Weather unavailable"));
}

#[tokio::test]
async fn test_slow_weather_times_out_into_a_warning() {
    let mut services = fixture_services(seeded_database());
    services.weather = Arc::new(
        Canned::ok(MarineWeather::default()).with_delay(Duration::from_secs(30)),
    );
    let settings = Settings {
        weather_timeout: Duration::from_millis(50),
        ..Settings::default()
    };
    let mut harness = Harness::new(services, settings, StartupTarget::Default);

    search(&mut harness, "02633").await;
    harness.send(Action::ZoneConfirm);
    harness.run_until(|s| s.screen == Screen::Display).await;

    let warnings = &harness.state().warnings;
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("timed out"), "{warnings:?}");
}

#[tokio::test]
async fn test_saved_port_loads_at_startup() {
    let db = seeded_database();
    let mut harness = Harness::new(
        fixture_services(Arc::clone(&db)),
        Settings::default(),
        StartupTarget::Default,
    );
    search(&mut harness, "Chatham, MA").await;
    harness.send(Action::ZoneConfirm);
    harness.run_until(|s| s.screen == Screen::Display).await;

    harness.send(Action::SavePromptOpen);
    assert_eq!(harness.state().port_name, "Chatham");
    harness.send(Action::SaveNameChange("Lydia Cove".into()));
    harness.send(Action::SaveSubmit);
    harness.run_until(|s| s.notice.is_some()).await;
    assert_eq!(
        harness.state().notice.as_deref(),
        Some("Saved port \"Lydia Cove\"")
    );
    harness.tasks.cancel_all();

    let mut relaunch = Harness::new(
        fixture_services(db),
        Settings::default(),
        StartupTarget::Port("Lydia Cove".into()),
    );
    relaunch.send(Action::AppStart {
        needs_provisioning: false,
    });
    relaunch.run_until(|s| s.screen == Screen::Display).await;
    let state = relaunch.state();
    assert_eq!(state.zone.as_ref().unwrap().code, "ANZ254");
    assert_eq!(state.station.as_ref().unwrap().id, "8447435");
    assert_eq!(
        state.location.as_ref().unwrap().display_name,
        "Chatham, MA 02633"
    );
}

#[tokio::test]
async fn test_missing_port_at_startup_is_an_error() {
    let mut harness = Harness::new(
        fixture_services(seeded_database()),
        Settings::default(),
        StartupTarget::Port("Nowhere".into()),
    );
    harness.send(Action::AppStart {
        needs_provisioning: false,
    });
    harness.run_until(|s| s.screen == Screen::Error).await;
    assert_eq!(
        harness.state().error.as_deref(),
        Some("port not found: Nowhere")
    );
}

#[tokio::test]
async fn test_zone_target_skips_zone_list() {
    let mut harness = Harness::new(
        fixture_services(seeded_database()),
        Settings::default(),
        StartupTarget::Zone {
            zone_code: "anz237".into(),
            location_query: "02633".into(),
        },
    );
    harness.send(Action::AppStart {
        needs_provisioning: false,
    });
    harness
        .run_until(|s| matches!(s.screen, Screen::Display | Screen::Error))
        .await;
    let state = harness.state();
    assert_eq!(state.screen, Screen::Display);
    assert_eq!(state.zone.as_ref().unwrap().code, "ANZ237");
    assert_eq!(state.zone.as_ref().unwrap().distance_miles, 0.0);
    assert!(state.tides.is_some());
}

#[tokio::test]
async fn test_delete_port_refreshes_list() {
    let db = seeded_database();
    let services = fixture_services(Arc::clone(&db));
    let location = mariner_core::testing::fixtures::chatham();
    let zone = mariner_core::testing::fixtures::zone("ANZ254", 3.1);
    for name in ["Home", "Stage Harbor"] {
        services
            .ports
            .upsert(&mariner_core::PortDraft::new(name, &location, &zone, None))
            .unwrap();
    }
    let mut harness = Harness::new(services, Settings::default(), StartupTarget::Default);

    harness.send(Action::AppStart {
        needs_provisioning: false,
    });
    harness.run_until(|s| s.screen == Screen::SavedList).await;
    assert_eq!(harness.state().ports.len(), 2);

    harness.send(Action::PortDeleteRequest);
    harness.send(Action::PortDeleteConfirm);
    harness.run_until(|s| s.ports.len() == 1).await;
    assert_eq!(harness.state().ports[0].name, "Stage Harbor");
    assert_eq!(harness.state().notice.as_deref(), Some("Deleted \"Home\""));
}
