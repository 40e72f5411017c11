//! Loading tracker records from a data directory.
//!
//! The directory holds the list endpoints' response bodies as written by
//! the tracker's API:
//!
//! ```text
//! <data-dir>/
//!   events.json      # { "events": [...], "totalCount": n }
//!   catalogs.json    # { "catalogs": [...], "totalCount": n }
//! ```
//!
//! Either file may be missing; it then reads as an empty listing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::{Catalog, CatalogListing, Event, EventListing};

pub const EVENTS_FILE: &str = "events.json";
pub const CATALOGS_FILE: &str = "catalogs.json";

/// Errors that can occur while loading or querying a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no event matching '{0}'")]
    NotFound(String),

    #[error("'{reference}' is ambiguous: matches {} events: {}", ids.len(), ids.join(", "))]
    Ambiguous { reference: String, ids: Vec<String> },
}

pub type Result<T> = core::result::Result<T, DatasetError>;

/// Every record in a data directory.
#[derive(Debug, Default)]
pub struct Dataset {
    pub events: Vec<Event>,
    pub catalogs: Vec<Catalog>,
}

impl Dataset {
    pub fn open(dir: &Path) -> Result<Self> {
        let events: EventListing = read_listing(&dir.join(EVENTS_FILE))?;
        check_total(EVENTS_FILE, events.events.len(), events.total_count);

        let catalogs: CatalogListing = read_listing(&dir.join(CATALOGS_FILE))?;
        check_total(CATALOGS_FILE, catalogs.catalogs.len(), catalogs.total_count);

        debug!(
            dir = %dir.display(),
            events = events.events.len(),
            catalogs = catalogs.catalogs.len(),
            "loaded dataset"
        );
        Ok(Self {
            events: events.events,
            catalogs: catalogs.catalogs,
        })
    }
}

fn read_listing<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no listing file, using an empty one");
            return Ok(T::default());
        }
        Err(source) => {
            return Err(DatasetError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&json).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn check_total(file: &str, actual: usize, declared: u64) {
    if u64::try_from(actual).ok() != Some(declared) {
        warn!(file, actual, declared, "totalCount does not match the records");
    }
}

/// Find one event by full id, unambiguous id prefix or Slack message id.
pub fn find_event<'a>(events: &'a [Event], reference: &str) -> Result<&'a Event> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(DatasetError::NotFound(reference.to_string()));
    }

    // Full UUIDs in any of their spellings.
    if let Ok(id) = reference.parse::<Uuid>() {
        return events
            .iter()
            .find(|e| e.id().and_then(|s| s.parse::<Uuid>().ok()) == Some(id))
            .ok_or_else(|| DatasetError::NotFound(reference.to_string()));
    }

    if let Some(event) = events
        .iter()
        .find(|e| e.id() == Some(reference) || e.slack_id() == Some(reference))
    {
        return Ok(event);
    }

    let needle = reference.to_lowercase();
    let matches: Vec<&Event> = events
        .iter()
        .filter(|e| e.id().is_some_and(|id| id.to_lowercase().starts_with(&needle)))
        .collect();

    match matches.as_slice() {
        [] => Err(DatasetError::NotFound(reference.to_string())),
        [event] => Ok(*event),
        many => Err(DatasetError::Ambiguous {
            reference: reference.to_string(),
            ids: many.iter().filter_map(|e| e.id()).map(short_id).collect(),
        }),
    }
}

/// The first eight characters of an id.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}
