//! Nearest-entity lookups over the provisioned zone and station tables.
//!
//! A radius search is two steps: a `BETWEEN` query over the
//! [`BoundingBox`] pulls candidate rows in insertion order, then
//! [`rank_by_distance`] drops rows outside the true radius and sorts the
//! rest nearest-first. Zero results is a valid answer.

use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use crate::db::Database;
use crate::error::LookupError;
use crate::geo::{rank_by_distance, BoundingBox, GeoPoint};
use crate::model::{StationCandidate, ZoneCandidate};

#[derive(Debug, Clone)]
pub struct ZoneIndex {
    db: Arc<Database>,
}

impl ZoneIndex {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Zones whose center lies within `radius_miles` of `point`, nearest first.
    pub fn find_nearby(
        &self,
        point: GeoPoint,
        radius_miles: f64,
    ) -> Result<Vec<ZoneCandidate>, LookupError> {
        let rows = self.db.with_conn(|conn| {
            query_box(
                conn,
                "SELECT code, name, center_lat, center_lon FROM marine_zones
                 WHERE center_lat BETWEEN ?1 AND ?2 AND center_lon BETWEEN ?3 AND ?4
                 ORDER BY rowid",
                BoundingBox::around(point, radius_miles),
                |row| {
                    let zone = ZoneCandidate {
                        code: row.get(0)?,
                        name: row.get(1)?,
                        distance_miles: 0.0,
                    };
                    Ok((zone, GeoPoint::new(row.get(2)?, row.get(3)?)))
                },
            )
        })?;

        let scanned = rows.len();
        let zones: Vec<ZoneCandidate> = rank_by_distance(point, radius_miles, rows)
            .into_iter()
            .map(|(zone, distance_miles)| ZoneCandidate {
                distance_miles,
                ..zone
            })
            .collect();
        debug!(scanned, found = zones.len(), radius_miles, "Nearby zone lookup");
        Ok(zones)
    }

    /// Exact lookup by zone code (case-insensitive). Distance is `0.0`.
    pub fn find_by_code(&self, code: &str) -> Result<ZoneCandidate, LookupError> {
        let code = code.trim().to_ascii_uppercase();
        let found = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT code, name FROM marine_zones WHERE code = ?1",
                [&code],
                |row| {
                    Ok(ZoneCandidate {
                        code: row.get(0)?,
                        name: row.get(1)?,
                        distance_miles: 0.0,
                    })
                },
            )
            .optional()
            .map_err(LookupError::from)
        })?;
        found.ok_or(LookupError::ZoneNotFound(code))
    }
}

#[derive(Debug, Clone)]
pub struct StationIndex {
    db: Arc<Database>,
}

impl StationIndex {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Tide stations within `radius_miles` of `point`, nearest first.
    pub fn find_nearby(
        &self,
        point: GeoPoint,
        radius_miles: f64,
    ) -> Result<Vec<StationCandidate>, LookupError> {
        let rows = self.db.with_conn(|conn| {
            query_box(
                conn,
                "SELECT id, name, state, lat, lon FROM tide_stations
                 WHERE lat BETWEEN ?1 AND ?2 AND lon BETWEEN ?3 AND ?4
                 ORDER BY rowid",
                BoundingBox::around(point, radius_miles),
                |row| {
                    let station = station_from_row(row)?;
                    let at = station.point();
                    Ok((station, at))
                },
            )
        })?;

        let scanned = rows.len();
        let stations: Vec<StationCandidate> = rank_by_distance(point, radius_miles, rows)
            .into_iter()
            .map(|(station, distance_miles)| StationCandidate {
                distance_miles,
                ..station
            })
            .collect();
        debug!(scanned, found = stations.len(), radius_miles, "Nearby station lookup");
        Ok(stations)
    }

    pub fn find_by_code(&self, id: &str) -> Result<StationCandidate, LookupError> {
        let id = id.trim().to_string();
        let found = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, state, lat, lon FROM tide_stations WHERE id = ?1",
                [&id],
                station_from_row,
            )
            .optional()
            .map_err(LookupError::from)
        })?;
        found.ok_or(LookupError::StationNotFound(id))
    }
}

fn station_from_row(row: &Row<'_>) -> rusqlite::Result<StationCandidate> {
    Ok(StationCandidate {
        id: row.get(0)?,
        name: row.get(1)?,
        state: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        distance_miles: 0.0,
    })
}

fn query_box<T>(
    conn: &Connection,
    sql: &str,
    bbox: BoundingBox,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, LookupError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt
        .query_map(
            rusqlite::params![bbox.min_lat, bbox.max_lat, bbox.min_lon, bbox.max_lon],
            map,
        )?
        .collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(rows)
}
