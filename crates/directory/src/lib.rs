use formats::{JobsDataError, JobsDataset, JobsEntry};

/// Load state of the lazily-fetched jobs dataset.
///
/// The dataset is fetched at most once per attempt: `NotLoaded` until the
/// first lookup needs it, then `Loaded` forever on success. A failed fetch
/// parks the directory in `Failed`; the next user action starts a fresh
/// attempt rather than retrying automatically.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum JobsLoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed(String),
}

/// Result of a jobs lookup for one facility id.
#[derive(Debug, Clone, PartialEq)]
pub enum JobsLookup {
    /// Dataset not fetched yet; caller should fetch and feed it in.
    NotReady,
    /// The id is absent from the dataset (or has no usable links).
    NoData,
    /// Links exist; `primary` is what a confirmation should open.
    Links {
        primary: String,
        career_page: Option<String>,
        aggregators: Vec<(String, String)>,
    },
}

/// The jobs directory: facility id -> career links, populated once from
/// the companion dataset.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JobsDirectory {
    state: JobsLoadState,
    dataset: Option<JobsDataset>,
}

impl JobsDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &JobsLoadState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, JobsLoadState::Loaded)
    }

    /// True when a lookup should trigger a fetch: nothing loaded yet, or
    /// the previous attempt failed.
    pub fn needs_fetch(&self) -> bool {
        matches!(
            self.state,
            JobsLoadState::NotLoaded | JobsLoadState::Failed(_)
        )
    }

    pub fn mark_loading(&mut self) {
        self.state = JobsLoadState::Loading;
    }

    /// Single initialization point for the dataset payload.
    pub fn load_from_json(&mut self, payload: &str) -> Result<usize, JobsDataError> {
        match JobsDataset::from_json_str(payload) {
            Ok(dataset) => {
                let n = dataset.len();
                self.dataset = Some(dataset);
                self.state = JobsLoadState::Loaded;
                Ok(n)
            }
            Err(e) => {
                self.state = JobsLoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.state = JobsLoadState::Failed(reason.into());
    }

    pub fn lookup(&self, facility_id: &str) -> JobsLookup {
        let Some(dataset) = &self.dataset else {
            return JobsLookup::NotReady;
        };
        let Some(entry) = dataset.get(facility_id) else {
            return JobsLookup::NoData;
        };
        lookup_from_entry(entry)
    }
}

fn lookup_from_entry(entry: &JobsEntry) -> JobsLookup {
    let Some(primary) = entry.primary_link() else {
        return JobsLookup::NoData;
    };
    JobsLookup::Links {
        primary: primary.to_string(),
        career_page: entry.career_page.clone(),
        aggregators: entry
            .aggregator_urls
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{JobsDirectory, JobsLoadState, JobsLookup};
    use pretty_assertions::assert_eq;

    const PAYLOAD: &str = r#"{
        "va-001": {
            "career_page": "https://careers.equinix.com/jobs",
            "aggregator_urls": {
                "linkedin": "https://www.linkedin.com/jobs/search/?keywords=Equinix"
            }
        },
        "or-002": {
            "aggregator_urls": {}
        }
    }"#;

    #[test]
    fn lookup_before_load_reports_not_ready() {
        let directory = JobsDirectory::new();
        assert!(directory.needs_fetch());
        assert_eq!(directory.lookup("va-001"), JobsLookup::NotReady);
    }

    #[test]
    fn unknown_id_reports_no_data() {
        let mut directory = JobsDirectory::new();
        directory.load_from_json(PAYLOAD).unwrap();
        assert_eq!(directory.lookup("tx-999"), JobsLookup::NoData);
    }

    #[test]
    fn entry_without_links_reports_no_data() {
        let mut directory = JobsDirectory::new();
        directory.load_from_json(PAYLOAD).unwrap();
        assert_eq!(directory.lookup("or-002"), JobsLookup::NoData);
    }

    #[test]
    fn known_id_reports_links_with_primary() {
        let mut directory = JobsDirectory::new();
        assert_eq!(directory.load_from_json(PAYLOAD).unwrap(), 2);
        match directory.lookup("va-001") {
            JobsLookup::Links {
                primary,
                career_page,
                aggregators,
            } => {
                assert_eq!(primary, "https://careers.equinix.com/jobs");
                assert_eq!(career_page.as_deref(), Some("https://careers.equinix.com/jobs"));
                assert_eq!(aggregators.len(), 1);
            }
            other => panic!("unexpected lookup: {other:?}"),
        }
    }

    #[test]
    fn failed_load_allows_a_later_retry() {
        let mut directory = JobsDirectory::new();
        directory.mark_loading();
        assert!(!directory.needs_fetch());

        assert!(directory.load_from_json("not json").is_err());
        assert!(matches!(directory.state(), JobsLoadState::Failed(_)));
        assert!(directory.needs_fetch());

        directory.load_from_json(PAYLOAD).unwrap();
        assert!(directory.is_loaded());
        assert!(!directory.needs_fetch());
    }
}
