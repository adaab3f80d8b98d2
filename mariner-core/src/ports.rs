//! Saved ports: user-named locations keyed by their unique name.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use crate::db::Database;
use crate::error::StoreError;
use crate::model::{PortDraft, SavedPort};

const SELECT_PORT: &str = "SELECT id, name, state, city, zipcode, zone_code, station_id, lat, lon, created_at
     FROM saved_ports";

#[derive(Debug, Clone)]
pub struct SavedPortStore {
    db: Arc<Database>,
}

impl SavedPortStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Inserts the port, or overwrites every field of the port with the same
    /// name. The original `created_at` survives an overwrite.
    pub fn upsert(&self, draft: &PortDraft) -> Result<SavedPort, StoreError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO saved_ports
                    (name, state, city, zipcode, zone_code, station_id, lat, lon, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(name) DO UPDATE SET
                    state = excluded.state,
                    city = excluded.city,
                    zipcode = excluded.zipcode,
                    zone_code = excluded.zone_code,
                    station_id = excluded.station_id,
                    lat = excluded.lat,
                    lon = excluded.lon",
                params![
                    draft.name,
                    draft.state,
                    draft.city,
                    draft.zipcode,
                    draft.zone_code,
                    draft.station_id,
                    draft.latitude,
                    draft.longitude,
                    Utc::now(),
                ],
            )?;
            Ok::<_, StoreError>(())
        })?;
        info!(name = %draft.name, zone = %draft.zone_code, "Saved port");
        self.get(&draft.name)
    }

    /// All ports ordered by name.
    pub fn list(&self) -> Result<Vec<SavedPort>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!("{SELECT_PORT} ORDER BY name"))?;
            let ports = stmt
                .query_map([], port_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ports)
        })
    }

    pub fn get(&self, name: &str) -> Result<SavedPort, StoreError> {
        self.db
            .with_conn(|conn| {
                conn.query_row(
                    &format!("{SELECT_PORT} WHERE name = ?1"),
                    [name],
                    port_from_row,
                )
                .optional()
                .map_err(StoreError::from)
            })?
            .ok_or_else(|| StoreError::PortNotFound(name.to_string()))
    }

    /// Removes the named port. Returns false when no such port existed.
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let removed = self.db.with_conn(|conn| {
            conn.execute("DELETE FROM saved_ports WHERE name = ?1", [name])
                .map_err(StoreError::from)
        })?;
        info!(name, removed, "Deleted port");
        Ok(removed > 0)
    }
}

fn port_from_row(row: &Row<'_>) -> rusqlite::Result<SavedPort> {
    Ok(SavedPort {
        id: row.get(0)?,
        name: row.get(1)?,
        state: row.get(2)?,
        city: row.get(3)?,
        zipcode: row.get(4)?,
        zone_code: row.get(5)?,
        station_id: row.get(6)?,
        latitude: row.get(7)?,
        longitude: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SavedPortStore {
        SavedPortStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn draft(name: &str, zone: &str) -> PortDraft {
        PortDraft {
            name: name.into(),
            state: "MA".into(),
            city: "Chatham".into(),
            zipcode: "02633".into(),
            zone_code: zone.into(),
            station_id: Some("8447435".into()),
            latitude: 41.6885,
            longitude: -69.9511,
        }
    }

    #[test]
    fn test_upsert_same_name_keeps_one_row_with_latest_fields() {
        let store = store();
        let first = store.upsert(&draft("Home", "ANZ254")).unwrap();

        let mut second = draft("Home", "ANZ237");
        second.station_id = None;
        let saved = store.upsert(&second).unwrap();

        let all = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(saved.zone_code, "ANZ237");
        assert_eq!(saved.station_id, None);
        assert_eq!(saved.id, first.id);
        assert_eq!(saved.created_at, first.created_at);
    }

    #[test]
    fn test_list_is_ordered_by_name() {
        let store = store();
        for name in ["Wellfleet", "Chatham", "Orleans"] {
            store.upsert(&draft(name, "ANZ254")).unwrap();
        }
        let names: Vec<_> = store.list().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Chatham", "Orleans", "Wellfleet"]);
    }

    #[test]
    fn test_get_missing_port() {
        let err = store().get("Nowhere").unwrap_err();
        assert_eq!(err.to_string(), "port not found: Nowhere");
    }

    #[test]
    fn test_delete_by_name() {
        let store = store();
        store.upsert(&draft("Home", "ANZ254")).unwrap();
        assert!(store.delete("Home").unwrap());
        assert!(!store.delete("Home").unwrap());
        assert!(store.list().unwrap().is_empty());
    }
}
