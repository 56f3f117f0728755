use foundation::bounds::LonLatBounds;
use formats::{FacilityRecord, MISSING_FIELD_PLACEHOLDER};

use crate::filter::FilterCriteria;
use crate::layer::{Layer, LayerId};

/// One visible marker. `record_index` points back into the source
/// collection so picking and popups can recover the full record.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub record_index: usize,
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub status: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MarkersSnapshot {
    pub markers: Vec<Marker>,
}

impl MarkersSnapshot {
    /// Extent of the currently visible markers; empty when none survive
    /// the filter.
    pub fn bounds(&self) -> LonLatBounds {
        let mut bounds = LonLatBounds::empty();
        for m in &self.markers {
            bounds.extend(m.lon_deg, m.lat_deg);
        }
        bounds
    }
}

/// The facility marker layer. Extraction is a full recompute: every call
/// re-evaluates every record against the criteria and rebuilds the
/// snapshot from scratch, preserving source order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkersLayer {
    id: LayerId,
}

impl MarkersLayer {
    pub fn new(id: u64) -> Self {
        Self { id: LayerId(id) }
    }

    pub fn extract(
        &self,
        records: &[FacilityRecord],
        criteria: &FilterCriteria,
    ) -> MarkersSnapshot {
        let mut markers = Vec::new();
        for (record_index, record) in records.iter().enumerate() {
            if !criteria.is_visible(record) {
                continue;
            }
            markers.push(Marker {
                record_index,
                lon_deg: record.lon_deg,
                lat_deg: record.lat_deg,
                status: record.status.clone(),
            });
        }
        MarkersSnapshot { markers }
    }
}

impl Layer for MarkersLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

/// Popup description for one facility. Attribute values are escaped;
/// absent values render as the placeholder.
pub fn popup_html(record: &FacilityRecord) -> String {
    let name = escape_html(FacilityRecord::display_or_placeholder(&record.name));
    let operator = escape_html(FacilityRecord::display_or_placeholder(&record.operator));
    let status = escape_html(FacilityRecord::display_or_placeholder(&record.status));
    let stress = escape_html(FacilityRecord::display_or_placeholder(&record.water_stress));
    let city = escape_html(FacilityRecord::display_or_placeholder(&record.city));
    let state = escape_html(FacilityRecord::display_or_placeholder(&record.state));

    let capacity = match record.capacity_mw {
        Some(mw) => format!("{} MW", format_mw(mw)),
        None => MISSING_FIELD_PLACEHOLDER.to_string(),
    };

    let mut out = format!(
        "<strong>{name}</strong><br>\
         Operator: {operator}<br>\
         Status: {status}<br>\
         Capacity: {capacity}<br>\
         Water stress: {stress}<br>\
         {city}, {state}"
    );

    if let Some(url) = &record.url
        && !url.trim().is_empty()
    {
        let href = escape_html(url);
        out.push_str(&format!("<br><a href=\"{href}\" target=\"_blank\">Details</a>"));
    }

    out
}

fn format_mw(mw: f64) -> String {
    if mw.fract() == 0.0 {
        format!("{}", mw as i64)
    } else {
        format!("{mw}")
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{MarkersLayer, popup_html};
    use crate::filter::FilterCriteria;
    use formats::FacilityRecord;
    use std::collections::BTreeSet;

    fn record(name: &str, status: Option<&str>, capacity_mw: Option<f64>) -> FacilityRecord {
        FacilityRecord {
            lon_deg: -77.0,
            lat_deg: 39.0,
            id: None,
            name: Some(name.to_string()),
            operator: None,
            status: status.map(str::to_string),
            capacity_mw,
            water_stress: None,
            city: None,
            state: None,
            url: None,
        }
    }

    #[test]
    fn extract_preserves_source_order() {
        let records = vec![
            record("C", Some("Existing"), Some(10.0)),
            record("A", Some("Permitted"), Some(20.0)),
            record("B", Some("Existing"), Some(30.0)),
        ];
        let layer = MarkersLayer::new(1);
        let snapshot = layer.extract(&records, &FilterCriteria::default());
        let order: Vec<usize> = snapshot.markers.iter().map(|m| m.record_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn extract_is_idempotent_for_unchanged_criteria() {
        let records = vec![
            record("A", Some("Existing"), Some(150.0)),
            record("B", Some("Permitted"), Some(150.0)),
            record("C", Some("Existing"), Some(50.0)),
        ];
        let criteria = FilterCriteria {
            statuses: BTreeSet::from(["Existing".to_string()]),
            min_capacity_mw: 100.0,
            ..FilterCriteria::default()
        };

        let layer = MarkersLayer::new(1);
        let first = layer.extract(&records, &criteria);
        let second = layer.extract(&records, &criteria);
        assert_eq!(first, second);
        assert_eq!(first.markers.len(), 1);
        assert_eq!(first.markers[0].record_index, 0);
    }

    #[test]
    fn snapshot_bounds_cover_only_visible_markers() {
        let mut far_west = record("W", Some("Existing"), None);
        far_west.lon_deg = -120.0;
        let records = vec![record("E", Some("Existing"), None), far_west];

        let layer = MarkersLayer::new(1);
        let all = layer.extract(&records, &FilterCriteria::default());
        assert_eq!(all.bounds().min_lon_deg, -120.0);

        let criteria = FilterCriteria {
            query: "e".to_string(),
            ..FilterCriteria::default()
        };
        let filtered = layer.extract(&records, &criteria);
        assert_eq!(filtered.markers.len(), 1);
        assert_eq!(filtered.bounds().min_lon_deg, -77.0);
    }

    #[test]
    fn empty_extraction_has_empty_bounds() {
        let layer = MarkersLayer::new(1);
        let snapshot = layer.extract(&[], &FilterCriteria::default());
        assert!(snapshot.bounds().is_empty());
    }

    #[test]
    fn popup_fills_missing_fields_with_placeholder() {
        let html = popup_html(&record("Ashburn Campus", None, None));
        assert!(html.contains("<strong>Ashburn Campus</strong>"));
        assert!(html.contains("Status: —"));
        assert!(html.contains("Capacity: —"));
        assert!(!html.contains("<a href"));
    }

    #[test]
    fn popup_escapes_attribute_values() {
        let html = popup_html(&record("<script>alert(1)</script>", None, None));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn popup_formats_capacity_and_link() {
        let mut rec = record("Site", Some("Existing"), Some(150.0));
        rec.url = Some("https://example.com/site".to_string());
        let html = popup_html(&rec);
        assert!(html.contains("Capacity: 150 MW"));
        assert!(html.contains("href=\"https://example.com/site\""));

        rec.capacity_mw = Some(85.5);
        assert!(popup_html(&rec).contains("Capacity: 85.5 MW"));
    }
}
