use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Static pipeline configuration.
///
/// Every field has a default, so a config file only needs the keys it
/// wants to change. `manual_name_overrides` is where corpus-specific
/// identity corrections live; keeping them in a data file means the
/// pathological cases never leak into the resolution code itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum number of sent-class records a person needs to be
    /// included in the identity mapping.
    pub min_sent_evidence: usize,
    /// A person whose post-filter event count is at or below this is
    /// dropped from the final series.
    pub min_events_per_person: usize,
    /// Timestamps strictly before this instant are discarded.
    pub floor_date: String,
    /// Folder labels that mark a person's own outbound mail.
    pub sent_folder_labels: BTreeSet<String>,
    /// person id → full replacement name set, applied after the
    /// algorithmic stages.
    pub manual_name_overrides: BTreeMap<String, BTreeSet<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            min_sent_evidence: 0,
            min_events_per_person: 10,
            floor_date: "2000-01-01T00:00:00".to_string(),
            sent_folder_labels: ["sent", "sent_items", "_sent_mail"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            manual_name_overrides: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let json = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// The floor instant as epoch seconds (UTC).
    pub fn floor_epoch(&self) -> Result<i64> {
        let parsed = NaiveDateTime::parse_from_str(&self.floor_date, "%Y-%m-%dT%H:%M:%S")
            .map_err(|_| Error::InvalidFloorDate {
                value: self.floor_date.clone(),
            })?;
        Ok(parsed.and_utc().timestamp())
    }

    /// Whether a record's folder column denotes the owner's outbound mail.
    ///
    /// The column may carry a bare label ("sent_items") or a path
    /// ("smith-j/sent_items/12"); each path component is compared
    /// lowercased against the configured label set.
    pub fn is_sent_folder(&self, folder: &str) -> bool {
        folder
            .split('/')
            .map(|part| part.trim().to_lowercase())
            .any(|part| self.sent_folder_labels.contains(&part))
    }
}
