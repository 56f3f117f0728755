use std::collections::BTreeSet;

use formats::FacilityRecord;

/// Current filter criteria. All predicates are conjunctive: a record is
/// visible only when every active criterion admits it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilterCriteria {
    /// Empty set means "no status restriction".
    pub statuses: BTreeSet<String>,
    pub min_capacity_mw: f64,
    /// Exact, case-sensitive match when set.
    pub water_stress: Option<String>,
    /// Case-insensitive substring over name/operator/city/state.
    pub query: String,
}

impl FilterCriteria {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_visible(&self, record: &FacilityRecord) -> bool {
        status_allows(&self.statuses, record)
            && capacity_allows(self.min_capacity_mw, record)
            && water_stress_allows(self.water_stress.as_deref(), record)
            && query_allows(&self.query, record)
    }
}

fn status_allows(statuses: &BTreeSet<String>, record: &FacilityRecord) -> bool {
    if statuses.is_empty() {
        return true;
    }
    match &record.status {
        Some(status) => statuses.contains(status),
        None => false,
    }
}

fn capacity_allows(min_capacity_mw: f64, record: &FacilityRecord) -> bool {
    record.capacity_or_zero() >= min_capacity_mw
}

fn water_stress_allows(filter: Option<&str>, record: &FacilityRecord) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    record.water_stress.as_deref() == Some(filter)
}

fn query_allows(query: &str, record: &FacilityRecord) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    record.search_haystack().contains(&query.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::FilterCriteria;
    use formats::FacilityRecord;
    use std::collections::BTreeSet;

    fn record(
        status: Option<&str>,
        capacity_mw: Option<f64>,
        water_stress: Option<&str>,
        city: Option<&str>,
    ) -> FacilityRecord {
        FacilityRecord {
            lon_deg: -98.0,
            lat_deg: 39.5,
            id: None,
            name: Some("Test Site".to_string()),
            operator: Some("Operator".to_string()),
            status: status.map(str::to_string),
            capacity_mw,
            water_stress: water_stress.map(str::to_string),
            city: city.map(str::to_string),
            state: Some("VA".to_string()),
            url: None,
        }
    }

    fn statuses(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    // Tiny deterministic generator; enough variety to exercise every
    // predicate combination without pulling in a fuzzing dependency.
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        fn pick<'a>(&mut self, options: &[Option<&'a str>]) -> Option<&'a str> {
            options[(self.next() % options.len() as u64) as usize]
        }
    }

    #[test]
    fn visibility_is_the_conjunction_of_every_active_criterion() {
        let status_options = [Some("Existing"), Some("Permitted"), None];
        let stress_options = [Some("High"), Some("Low"), None];
        let city_options = [Some("Ashburn"), Some("Quincy"), None];
        let capacity_options = [Some(0.0), Some(50.0), Some(150.0), None];

        let mut rng = XorShift(0x9E3779B97F4A7C15);
        for _ in 0..512 {
            let rec = record(
                rng.pick(&status_options),
                capacity_options[(rng.next() % 4) as usize],
                rng.pick(&stress_options),
                rng.pick(&city_options),
            );
            let criteria = FilterCriteria {
                statuses: match rng.next() % 3 {
                    0 => BTreeSet::new(),
                    1 => statuses(&["Existing"]),
                    _ => statuses(&["Existing", "Permitted"]),
                },
                min_capacity_mw: [0.0, 100.0][(rng.next() % 2) as usize],
                water_stress: rng.pick(&stress_options).map(str::to_string),
                query: ["", "ashburn", "zzz"][(rng.next() % 3) as usize].to_string(),
            };

            let by_parts = (criteria.statuses.is_empty()
                || rec
                    .status
                    .as_ref()
                    .is_some_and(|s| criteria.statuses.contains(s)))
                && rec.capacity_or_zero() >= criteria.min_capacity_mw
                && (criteria.water_stress.is_none()
                    || rec.water_stress == criteria.water_stress)
                && (criteria.query.is_empty()
                    || rec.search_haystack().contains(&criteria.query));

            assert_eq!(
                criteria.is_visible(&rec),
                by_parts,
                "criteria {criteria:?} disagreed on record {rec:?}"
            );
        }
    }

    #[test]
    fn empty_criteria_admit_everything() {
        let criteria = FilterCriteria::default();
        assert!(criteria.is_visible(&record(None, None, None, None)));
        assert!(criteria.is_visible(&record(Some("Existing"), Some(150.0), Some("High"), None)));
    }

    #[test]
    fn zero_min_capacity_admits_records_without_capacity() {
        let criteria = FilterCriteria {
            min_capacity_mw: 0.0,
            ..FilterCriteria::default()
        };
        assert!(criteria.is_visible(&record(None, None, None, None)));
        assert!(criteria.is_visible(&record(None, Some(0.0), None, None)));
        assert!(criteria.is_visible(&record(None, Some(2000.0), None, None)));
    }

    #[test]
    fn status_and_capacity_combine_conjunctively() {
        let criteria = FilterCriteria {
            statuses: statuses(&["Existing"]),
            min_capacity_mw: 100.0,
            ..FilterCriteria::default()
        };
        assert!(criteria.is_visible(&record(Some("Existing"), Some(150.0), None, None)));
        assert!(!criteria.is_visible(&record(Some("Permitted"), Some(150.0), None, None)));
        assert!(!criteria.is_visible(&record(Some("Existing"), Some(50.0), None, None)));
        // Missing status cannot satisfy a non-empty status set.
        assert!(!criteria.is_visible(&record(None, Some(150.0), None, None)));
    }

    #[test]
    fn water_stress_matches_exactly_and_case_sensitively() {
        let criteria = FilterCriteria {
            water_stress: Some("High".to_string()),
            ..FilterCriteria::default()
        };
        assert!(criteria.is_visible(&record(None, None, Some("High"), None)));
        assert!(!criteria.is_visible(&record(None, None, Some("high"), None)));
        assert!(!criteria.is_visible(&record(None, None, None, None)));
    }

    #[test]
    fn query_matches_city_case_insensitively() {
        let criteria = FilterCriteria {
            query: "ashburn".to_string(),
            ..FilterCriteria::default()
        };
        assert!(criteria.is_visible(&record(None, None, None, Some("Ashburn"))));
        let criteria = FilterCriteria {
            query: "ASHBURN".to_string(),
            ..FilterCriteria::default()
        };
        assert!(criteria.is_visible(&record(None, None, None, Some("Ashburn"))));
        assert!(!criteria.is_visible(&record(None, None, None, Some("Quincy"))));
    }

    #[test]
    fn reset_restores_the_default_criteria() {
        let mut criteria = FilterCriteria {
            statuses: statuses(&["Existing"]),
            min_capacity_mw: 250.0,
            water_stress: Some("High".to_string()),
            query: "ashburn".to_string(),
        };
        criteria.reset();
        assert_eq!(criteria, FilterCriteria::default());
    }
}
