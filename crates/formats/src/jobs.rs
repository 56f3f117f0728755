use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Career links known for one facility, keyed by the facility id in the
/// companion jobs dataset.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsEntry {
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub career_page: Option<String>,
    /// Named aggregator listings (professional-network, job-board, ...),
    /// ordered by name.
    #[serde(default)]
    pub aggregator_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub open_positions: Option<u32>,
    #[serde(default)]
    pub hiring_status: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl JobsEntry {
    /// The link opened on confirmation: the career page when present,
    /// otherwise the first aggregator in name order.
    pub fn primary_link(&self) -> Option<&str> {
        if let Some(url) = &self.career_page
            && !url.trim().is_empty()
        {
            return Some(url);
        }
        self.aggregator_urls.values().next().map(String::as_str)
    }

    pub fn has_links(&self) -> bool {
        self.primary_link().is_some()
    }
}

/// The companion jobs dataset: facility id -> career links.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobsDataset {
    pub entries: BTreeMap<String, JobsEntry>,
}

#[derive(Debug)]
pub enum JobsDataError {
    Malformed(String),
}

impl std::fmt::Display for JobsDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobsDataError::Malformed(msg) => write!(f, "malformed jobs dataset: {msg}"),
        }
    }
}

impl std::error::Error for JobsDataError {}

impl JobsDataset {
    pub fn from_json_str(payload: &str) -> Result<Self, JobsDataError> {
        serde_json::from_str(payload).map_err(|e| JobsDataError::Malformed(e.to_string()))
    }

    pub fn get(&self, facility_id: &str) -> Option<&JobsEntry> {
        self.entries.get(facility_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
