//! First-launch build of the local geographic index.
//!
//! Two phases, each skipped when its tables already exist:
//!
//! 1. zones index: `marine_zones` and `tide_stations`
//! 2. locations index: `zipcodes`
//!
//! Each phase downloads its catalogues first and then writes everything in
//! one transaction, so an interrupted run leaves the tables absent and the
//! next launch starts the phase over. Progress is reported as plain status
//! lines on a bounded channel that closes when the run ends; the outcome
//! arrives separately on a oneshot.

use std::sync::Arc;

use rusqlite::params;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{info, warn};

use crate::db::{self, Database};
use crate::error::{ProvisionError, StoreError};
use crate::fetch::{BoxFuture, StationSearch};
use crate::geo::GeoPoint;
use crate::model::StationCandidate;

const STATION_PROGRESS_EVERY: usize = 500;
const ZIPCODE_PROGRESS_EVERY: usize = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRecord {
    pub code: String,
    pub name: String,
    pub center: GeoPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZipRecord {
    pub zipcode: String,
    pub city: String,
    pub state: String,
    pub point: GeoPoint,
}

/// Source of marine forecast zone outlines, reduced to centers.
pub trait ZoneCatalog: Send + Sync {
    fn marine_zones(&self) -> BoxFuture<'_, Result<Vec<ZoneRecord>, ProvisionError>>;
}

/// Source of the zip code gazetteer.
pub trait ZipCatalog: Send + Sync {
    fn zipcodes(&self) -> BoxFuture<'_, Result<Vec<ZipRecord>, ProvisionError>>;
}

/// Row counts written by one run. Zero for skipped phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionSummary {
    pub zones: usize,
    pub stations: usize,
    pub zipcodes: usize,
}

impl ProvisionSummary {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Receiving side of a started run.
#[derive(Debug)]
pub struct ProvisionHandle {
    pub progress: mpsc::Receiver<String>,
    pub done: oneshot::Receiver<Result<ProvisionSummary, ProvisionError>>,
}

#[derive(Clone)]
pub struct Provisioner {
    db: Arc<Database>,
    zones: Arc<dyn ZoneCatalog>,
    stations: Arc<dyn StationSearch>,
    zipcodes: Arc<dyn ZipCatalog>,
    lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner").finish_non_exhaustive()
    }
}

impl Provisioner {
    pub fn new(
        db: Arc<Database>,
        zones: Arc<dyn ZoneCatalog>,
        stations: Arc<dyn StationSearch>,
        zipcodes: Arc<dyn ZipCatalog>,
    ) -> Self {
        Self {
            db,
            zones,
            stations,
            zipcodes,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Launch-time probe. Cheap; does not take the provisioning lock.
    pub fn needs_provisioning(&self) -> Result<bool, StoreError> {
        self.db.needs_provisioning()
    }

    /// Spawns a run in the background.
    pub fn start(&self, progress_depth: usize) -> ProvisionHandle {
        let (progress_tx, progress) = mpsc::channel(progress_depth.max(1));
        let (done_tx, done) = oneshot::channel();
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.run(progress_tx).await;
            if let Err(err) = &result {
                warn!(error = %err, "Provisioning failed");
            }
            let _ = done_tx.send(result);
        });
        ProvisionHandle { progress, done }
    }

    /// Runs both phases. A second concurrent caller waits for the first and
    /// then finds nothing to do.
    pub async fn run(
        &self,
        progress: mpsc::Sender<String>,
    ) -> Result<ProvisionSummary, ProvisionError> {
        let _guard = self.lock.lock().await;
        let mut summary = ProvisionSummary::default();

        if self.phase_missing(&[db::ZONES_TABLE, db::STATIONS_TABLE]).await? {
            let (zones, stations) = self.build_zone_index(&progress).await?;
            summary.zones = zones;
            summary.stations = stations;
        }

        if self.phase_missing(&[db::ZIPCODES_TABLE]).await? {
            summary.zipcodes = self.build_location_index(&progress).await?;
        }

        if summary.is_noop() {
            info!("Local index already provisioned");
        } else {
            report(&progress, "Setup complete.").await;
            info!(?summary, "Provisioning finished");
        }
        Ok(summary)
    }

    async fn phase_missing(&self, tables: &'static [&'static str]) -> Result<bool, ProvisionError> {
        let db = Arc::clone(&self.db);
        let missing = tokio::task::spawn_blocking(move || {
            db.with_conn(|conn| {
                for table in tables {
                    if !db::table_exists(conn, table)? {
                        return Ok(true);
                    }
                }
                Ok::<_, ProvisionError>(false)
            })
        })
        .await??;
        Ok(missing)
    }

    async fn build_zone_index(
        &self,
        progress: &mpsc::Sender<String>,
    ) -> Result<(usize, usize), ProvisionError> {
        report(progress, "Marine zones table not found, provisioning...").await;
        report(progress, "Fetching marine zone catalog...").await;
        let zones = self.zones.marine_zones().await?;
        report(progress, format!("Loaded {} marine zones.", zones.len())).await;

        report(progress, "Tide stations table not found, provisioning...").await;
        let stations = self
            .stations
            .search_stations("")
            .await
            .map_err(|err| ProvisionError::Catalog {
                catalog: "tide stations",
                reason: err.to_string(),
            })?;
        report(progress, format!("Fetched {} tide stations.", stations.len())).await;

        let db = Arc::clone(&self.db);
        let tx = progress.clone();
        let counts = tokio::task::spawn_blocking(move || {
            db.with_conn_mut(|conn| write_zone_index(conn, &zones, &stations, &tx))
        })
        .await??;
        report(
            progress,
            format!("Zone index ready: {} zones, {} tide stations.", counts.0, counts.1),
        )
        .await;
        Ok(counts)
    }

    async fn build_location_index(
        &self,
        progress: &mpsc::Sender<String>,
    ) -> Result<usize, ProvisionError> {
        report(progress, "Zipcodes table not found, provisioning...").await;
        report(progress, "Downloading zipcode data...").await;
        let records = self.zipcodes.zipcodes().await?;

        let db = Arc::clone(&self.db);
        let tx = progress.clone();
        let count = tokio::task::spawn_blocking(move || {
            db.with_conn_mut(|conn| write_location_index(conn, &records, &tx))
        })
        .await??;
        report(progress, format!("Zipcode index ready: {count} zipcodes.")).await;
        Ok(count)
    }
}

fn write_zone_index(
    conn: &mut rusqlite::Connection,
    zones: &[ZoneRecord],
    stations: &[StationCandidate],
    progress: &mpsc::Sender<String>,
) -> Result<(usize, usize), ProvisionError> {
    let tx = conn.transaction()?;
    tx.execute_batch(db::ZONES_SCHEMA)?;
    tx.execute_batch(db::STATIONS_SCHEMA)?;

    let mut zone_count = 0;
    {
        let mut insert = tx.prepare(
            "INSERT OR IGNORE INTO marine_zones (code, name, center_lat, center_lon)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for zone in zones {
            zone_count += insert.execute(params![
                zone.code.to_ascii_uppercase(),
                zone.name,
                zone.center.latitude,
                zone.center.longitude
            ])?;
        }
    }

    let mut station_count = 0;
    {
        let mut insert = tx.prepare(
            "INSERT OR IGNORE INTO tide_stations (id, name, state, lat, lon)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (i, station) in stations.iter().enumerate() {
            station_count += insert.execute(params![
                station.id,
                station.name,
                station.state,
                station.latitude,
                station.longitude
            ])?;
            if (i + 1) % STATION_PROGRESS_EVERY == 0 {
                report_blocking(progress, format!("Inserted {} tide stations...", i + 1));
            }
        }
    }

    tx.commit()?;
    Ok((zone_count, station_count))
}

fn write_location_index(
    conn: &mut rusqlite::Connection,
    records: &[ZipRecord],
    progress: &mpsc::Sender<String>,
) -> Result<usize, ProvisionError> {
    let tx = conn.transaction()?;
    tx.execute_batch(db::ZIPCODES_SCHEMA)?;

    let mut count = 0;
    {
        let mut insert = tx.prepare(
            "INSERT OR IGNORE INTO zipcodes (zipcode, city, state, lat, lon)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (i, record) in records.iter().enumerate() {
            count += insert.execute(params![
                record.zipcode,
                record.city,
                record.state,
                record.point.latitude,
                record.point.longitude
            ])?;
            if (i + 1) % ZIPCODE_PROGRESS_EVERY == 0 {
                report_blocking(progress, format!("Processed {} zipcodes...", i + 1));
            }
        }
    }

    tx.commit()?;
    Ok(count)
}

async fn report(progress: &mpsc::Sender<String>, line: impl Into<String>) {
    let line = line.into();
    info!(status = %line, "Provisioning");
    // A closed channel only means nobody is watching.
    let _ = progress.send(line).await;
}

fn report_blocking(progress: &mpsc::Sender<String>, line: String) {
    info!(status = %line, "Provisioning");
    let _ = progress.blocking_send(line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_provisioner, FailingZoneCatalog, StaticStations, StaticZipcodes};

    async fn drain(mut rx: mpsc::Receiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_start_streams_progress_then_completes() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let provisioner = fixture_provisioner(Arc::clone(&db));
        assert!(provisioner.needs_provisioning().unwrap());

        let handle = provisioner.start(4);
        let lines = drain(handle.progress).await;
        let summary = handle.done.await.unwrap().unwrap();

        assert!(lines[0].contains("Marine zones table not found"));
        assert!(lines.iter().any(|l| l.contains("Zipcodes table not found")));
        assert_eq!(lines.last().map(String::as_str), Some("Setup complete."));
        assert_eq!(summary.zones, 3);
        assert!(summary.stations >= 3);
        assert!(summary.zipcodes >= 2);
        assert!(!provisioner.needs_provisioning().unwrap());
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let provisioner = fixture_provisioner(Arc::clone(&db));
        let (tx, rx) = mpsc::channel(64);
        provisioner.run(tx).await.unwrap();
        drop(rx);

        let before = (
            db.row_count(db::ZONES_TABLE).unwrap(),
            db.row_count(db::STATIONS_TABLE).unwrap(),
            db.row_count(db::ZIPCODES_TABLE).unwrap(),
        );

        let handle = provisioner.start(8);
        let lines = drain(handle.progress).await;
        let summary = handle.done.await.unwrap().unwrap();

        assert!(summary.is_noop());
        assert!(lines.is_empty());
        let after = (
            db.row_count(db::ZONES_TABLE).unwrap(),
            db.row_count(db::STATIONS_TABLE).unwrap(),
            db.row_count(db::ZIPCODES_TABLE).unwrap(),
        );
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_concurrent_runs_provision_once() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let provisioner = fixture_provisioner(Arc::clone(&db));
        let a = provisioner.start(64);
        let b = provisioner.start(64);
        let (_, _) = tokio::join!(drain(a.progress), drain(b.progress));
        let first = a.done.await.unwrap().unwrap();
        let second = b.done.await.unwrap().unwrap();
        assert!(first.is_noop() != second.is_noop());
    }

    #[tokio::test]
    async fn test_failed_phase_leaves_tables_absent() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let provisioner = Provisioner::new(
            Arc::clone(&db),
            Arc::new(FailingZoneCatalog),
            Arc::new(StaticStations::fixture()),
            Arc::new(StaticZipcodes::fixture()),
        );
        let handle = provisioner.start(16);
        drain(handle.progress).await;
        let err = handle.done.await.unwrap().unwrap_err();

        assert!(matches!(err, ProvisionError::Catalog { .. }));
        assert!(!db.table_exists(db::ZONES_TABLE).unwrap());
        assert!(db.needs_provisioning().unwrap());
    }

    #[tokio::test]
    async fn test_existing_zone_phase_is_skipped() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.with_conn(|conn| {
            conn.execute_batch(db::ZONES_SCHEMA)?;
            conn.execute_batch(db::STATIONS_SCHEMA)?;
            Ok::<_, StoreError>(())
        })
        .unwrap();
        let provisioner = Provisioner::new(
            Arc::clone(&db),
            Arc::new(FailingZoneCatalog),
            Arc::new(StaticStations::fixture()),
            Arc::new(StaticZipcodes::fixture()),
        );
        let (tx, _rx) = mpsc::channel(64);
        let summary = provisioner.run(tx).await.unwrap();
        assert_eq!(summary.zones, 0);
        assert!(summary.zipcodes > 0);
    }
}
