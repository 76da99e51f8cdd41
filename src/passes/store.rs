use chrono::{DateTime, Utc};
use log::error;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use super::pass::{PassError, PassRequest, TrackingPass, Waypoint};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pass not found: {0}")]
    NotFound(String),
    #[error("invalid pass: {0}")]
    Invalid(#[from] PassError),
}

/// Where the executor gets its next upcoming pass from.
pub trait PassSource: Send + Sync {
    /// Earliest stored pass whose start time is not in the past.
    fn next_pass(&self) -> Result<Option<TrackingPass>, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct PassQuery {
    pub spacecraft: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl PassQuery {
    fn matches(&self, pass: &TrackingPass) -> bool {
        if let Some(ref spacecraft) = self.spacecraft {
            if pass.spacecraft() != spacecraft {
                return false;
            }
        }
        if let Some(from) = self.from {
            if pass.start_time() < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if pass.start_time() > to {
                return false;
            }
        }
        true
    }
}

// On-disk form. Files are validated again on load so a hand-edited
// trajectory cannot reach the executor; the id comes from the file
// name, not the document.
#[derive(Deserialize)]
struct PassFile {
    spacecraft: String,
    waypoints: Vec<Waypoint>,
}

/// Flat-file pass storage: one JSON file per pass under a base folder.
pub struct PassStore {
    base: PathBuf,
}

impl PassStore {
    pub fn new(base: PathBuf) -> Self {
        PassStore { base }
    }

    fn pass_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        // Ids land in file names, so anything that could navigate out of
        // the base folder is treated as unknown.
        if !well_formed_id(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(self.base.join(format!("{}.json", id)))
    }

    pub fn insert(&self, request: PassRequest) -> Result<TrackingPass, StoreError> {
        // Empty times fail validation below, so the fallback id is never kept.
        let start = request.times.first().copied().unwrap_or_else(Utc::now);
        let pass = TrackingPass::from_request(generate_id(start), request)?;
        self.save(&pass)?;
        Ok(pass)
    }

    pub fn update(&self, id: &str, request: PassRequest) -> Result<TrackingPass, StoreError> {
        let path = self.pass_path(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let pass = TrackingPass::from_request(id.to_string(), request)?;
        self.save(&pass)?;
        Ok(pass)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.pass_path(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<TrackingPass, StoreError> {
        let path = self.pass_path(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        let file: PassFile = serde_json::from_str(&content)?;
        Ok(TrackingPass::new(
            id.to_string(),
            file.spacecraft,
            file.waypoints,
        )?)
    }

    pub fn all(&self) -> Result<Vec<TrackingPass>, StoreError> {
        if !self.base.exists() {
            return Ok(Vec::new());
        }

        let mut passes = Vec::new();
        for entry in self.base.read_dir()? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            // The file name is authoritative for the id; a stem that could
            // not be fetched back through pass_path is skipped like any
            // other malformed file.
            let id = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if well_formed_id(stem) => stem.to_string(),
                _ => {
                    error!("Ignoring pass file with unusable name {}", path.display());
                    continue;
                }
            };

            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    error!("Failed to read pass file {}: {}", path.display(), e);
                    continue;
                }
            };

            let file: PassFile = match serde_json::from_str(&content) {
                Ok(file) => file,
                Err(e) => {
                    error!("Failed to parse pass file {}: {}", path.display(), e);
                    continue;
                }
            };

            match TrackingPass::new(id, file.spacecraft, file.waypoints) {
                Ok(pass) => passes.push(pass),
                Err(e) => error!("Ignoring invalid pass file {}: {}", path.display(), e),
            }
        }

        passes.sort_by_key(|p| p.start_time());
        Ok(passes)
    }

    pub fn query(&self, query: &PassQuery) -> Result<Vec<TrackingPass>, StoreError> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|pass| query.matches(pass))
            .collect())
    }

    fn save(&self, pass: &TrackingPass) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.base)?;
        let path = self.pass_path(pass.id())?;
        let content = serde_json::to_string_pretty(pass)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl PassSource for PassStore {
    fn next_pass(&self) -> Result<Option<TrackingPass>, StoreError> {
        let now = Utc::now();
        Ok(self.all()?.into_iter().find(|p| p.start_time() >= now))
    }
}

fn generate_id(start: DateTime<Utc>) -> String {
    let uuid = uuid::Uuid::new_v4();
    let timestamp = start.format("%Y%m%dT%H%M%SZ");
    format!("{}_{}", timestamp, uuid)
}

fn well_formed_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotor::AzEl;
    use chrono::Duration;

    struct TempStore {
        store: PassStore,
        dir: PathBuf,
    }

    impl Drop for TempStore {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn temp_store() -> TempStore {
        let dir = std::env::temp_dir().join(format!("trackctl-store-{}", uuid::Uuid::new_v4()));
        TempStore {
            store: PassStore::new(dir.clone()),
            dir,
        }
    }

    fn request(spacecraft: &str, start: DateTime<Utc>) -> PassRequest {
        PassRequest {
            spacecraft: spacecraft.to_string(),
            times: (0..3).map(|i| start + Duration::seconds(5 * i)).collect(),
            states: vec![
                AzEl::new(10.0, 5.0),
                AzEl::new(11.0, 5.0),
                AzEl::new(12.0, 5.0),
            ],
        }
    }

    #[test]
    fn insert_assigns_id_and_get_round_trips() {
        let t = temp_store();
        let inserted = t.store.insert(request("ARMADILLO", Utc::now())).unwrap();
        assert!(!inserted.id().is_empty());

        let fetched = t.store.get(inserted.id()).unwrap();
        assert_eq!(fetched, inserted);
    }

    #[test]
    fn insert_rejects_invalid_request() {
        let t = temp_store();
        let mut req = request("ARMADILLO", Utc::now());
        req.times.truncate(1);
        req.states.truncate(1);
        let err = t.store.insert(req).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(t.store.all().unwrap().is_empty());
    }

    #[test]
    fn update_keeps_id_and_replaces_content() {
        let t = temp_store();
        let inserted = t.store.insert(request("ARMADILLO", Utc::now())).unwrap();

        let updated = t
            .store
            .update(inserted.id(), request("BEVO-2", Utc::now()))
            .unwrap();
        assert_eq!(updated.id(), inserted.id());
        assert_eq!(t.store.get(inserted.id()).unwrap().spacecraft(), "BEVO-2");
    }

    #[test]
    fn update_missing_pass_is_not_found() {
        let t = temp_store();
        let err = t
            .store
            .update("nope", request("ARMADILLO", Utc::now()))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn delete_removes_pass() {
        let t = temp_store();
        let inserted = t.store.insert(request("ARMADILLO", Utc::now())).unwrap();
        t.store.delete(inserted.id()).unwrap();
        assert!(matches!(
            t.store.get(inserted.id()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn traversal_like_id_is_not_found() {
        let t = temp_store();
        let err = t.store.get("../outside").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn all_is_sorted_by_start_time() {
        let t = temp_store();
        let now = Utc::now();
        t.store
            .insert(request("LATER", now + Duration::minutes(30)))
            .unwrap();
        t.store
            .insert(request("SOONER", now + Duration::minutes(5)))
            .unwrap();

        let all = t.store.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].spacecraft(), "SOONER");
        assert_eq!(all[1].spacecraft(), "LATER");
    }

    #[test]
    fn query_filters_by_spacecraft_and_window() {
        let t = temp_store();
        let now = Utc::now();
        t.store
            .insert(request("ARMADILLO", now + Duration::minutes(5)))
            .unwrap();
        t.store
            .insert(request("ARMADILLO", now + Duration::hours(30)))
            .unwrap();
        t.store
            .insert(request("BEVO-2", now + Duration::minutes(10)))
            .unwrap();

        let by_craft = t
            .store
            .query(&PassQuery {
                spacecraft: Some("ARMADILLO".to_string()),
                ..PassQuery::default()
            })
            .unwrap();
        assert_eq!(by_craft.len(), 2);

        let next_day = t
            .store
            .query(&PassQuery {
                from: Some(now),
                to: Some(now + Duration::hours(24)),
                ..PassQuery::default()
            })
            .unwrap();
        assert_eq!(next_day.len(), 2);
    }

    #[test]
    fn next_pass_skips_passes_already_started() {
        let t = temp_store();
        let now = Utc::now();
        t.store
            .insert(request("PAST", now - Duration::minutes(10)))
            .unwrap();
        t.store
            .insert(request("UPCOMING", now + Duration::minutes(10)))
            .unwrap();

        let next = t.store.next_pass().unwrap().unwrap();
        assert_eq!(next.spacecraft(), "UPCOMING");
    }

    #[test]
    fn next_pass_on_empty_store_is_none() {
        let t = temp_store();
        assert!(t.store.next_pass().unwrap().is_none());
    }

    #[test]
    fn scan_skips_malformed_files() {
        let t = temp_store();
        t.store
            .insert(request("ARMADILLO", Utc::now() + Duration::minutes(5)))
            .unwrap();
        std::fs::write(t.dir.join("junk.json"), "{not json").unwrap();

        let all = t.store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].spacecraft(), "ARMADILLO");
    }

    #[test]
    fn loaded_id_comes_from_the_file_name() {
        let t = temp_store();
        let inserted = t.store.insert(request("ARMADILLO", Utc::now())).unwrap();

        // Hand-edit the document so its embedded id diverges from the
        // file name.
        let path = t.dir.join(format!("{}.json", inserted.id()));
        let edited = std::fs::read_to_string(&path)
            .unwrap()
            .replace(inserted.id(), "edited-by-hand");
        std::fs::write(&path, edited).unwrap();

        let fetched = t.store.get(inserted.id()).unwrap();
        assert_eq!(fetched.id(), inserted.id());

        let all = t.store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id(), inserted.id());
    }
}
