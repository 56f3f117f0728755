use foundation::bounds::LonLatBounds;
use serde_json::{Map, Value};

/// Placeholder shown for absent attribute values.
pub const MISSING_FIELD_PLACEHOLDER: &str = "—";

/// One data-center facility, validated once at load time.
///
/// Location is required; every attribute is optional. Unknown extra
/// properties in the source feature are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRecord {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub id: Option<String>,
    pub name: Option<String>,
    pub operator: Option<String>,
    pub status: Option<String>,
    pub capacity_mw: Option<f64>,
    pub water_stress: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub url: Option<String>,
}

impl FacilityRecord {
    /// Capacity with the missing-treated-as-zero rule used by filtering.
    pub fn capacity_or_zero(&self) -> f64 {
        self.capacity_mw.unwrap_or(0.0)
    }

    /// Lowercased concatenation of the free-text searchable fields.
    /// Missing fields contribute empty strings.
    pub fn search_haystack(&self) -> String {
        let mut out = String::new();
        for field in [&self.name, &self.operator, &self.city, &self.state] {
            if let Some(v) = field {
                out.push_str(&v.to_lowercase());
                out.push(' ');
            }
        }
        out
    }

    pub fn display_or_placeholder<'a>(field: &'a Option<String>) -> &'a str {
        match field {
            Some(v) if !v.trim().is_empty() => v,
            _ => MISSING_FIELD_PLACEHOLDER,
        }
    }
}

/// An immutable, source-ordered facility dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityCollection {
    pub records: Vec<FacilityRecord>,
    /// blake3 hash of the source payload, for dataset identity.
    pub content_hash: String,
}

#[derive(Debug)]
pub enum FacilityDataError {
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for FacilityDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacilityDataError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            FacilityDataError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for FacilityDataError {}

impl FacilityCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, FacilityDataError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| FacilityDataError::InvalidFeature {
                index: 0,
                reason: format!("JSON parse error: {e}"),
            })?;
        let records = records_from_geojson_value(&value)?;
        Ok(Self {
            records,
            content_hash: blake3::hash(payload.as_bytes()).to_hex().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Extent of every record in the collection.
    pub fn bounds(&self) -> LonLatBounds {
        let mut bounds = LonLatBounds::empty();
        for r in &self.records {
            bounds.extend(r.lon_deg, r.lat_deg);
        }
        bounds
    }

    /// Distinct status values in first-seen order, for building the
    /// status checkbox group.
    pub fn distinct_statuses(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in &self.records {
            if let Some(status) = &r.status
                && !out.iter().any(|s| s == status)
            {
                out.push(status.clone());
            }
        }
        out
    }
}

fn records_from_geojson_value(value: &Value) -> Result<Vec<FacilityRecord>, FacilityDataError> {
    let obj = value
        .as_object()
        .ok_or(FacilityDataError::NotAFeatureCollection)?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or(FacilityDataError::NotAFeatureCollection)?;
    if ty != "FeatureCollection" {
        return Err(FacilityDataError::NotAFeatureCollection);
    }

    let features = obj
        .get("features")
        .and_then(|v| v.as_array())
        .ok_or(FacilityDataError::NotAFeatureCollection)?;

    let mut records = Vec::with_capacity(features.len());
    for (index, feat_val) in features.iter().enumerate() {
        let feat_obj = feat_val
            .as_object()
            .ok_or(FacilityDataError::InvalidFeature {
                index,
                reason: "feature must be an object".to_string(),
            })?;

        let feat_type = feat_obj.get("type").and_then(|v| v.as_str()).ok_or(
            FacilityDataError::InvalidFeature {
                index,
                reason: "feature missing type".to_string(),
            },
        )?;
        if feat_type != "Feature" {
            return Err(FacilityDataError::InvalidFeature {
                index,
                reason: format!("unexpected feature type: {feat_type}"),
            });
        }

        let geometry = feat_obj
            .get("geometry")
            .ok_or(FacilityDataError::InvalidFeature {
                index,
                reason: "feature missing geometry".to_string(),
            })?;
        let (lon_deg, lat_deg) = parse_point_geometry(geometry)
            .map_err(|reason| FacilityDataError::InvalidFeature { index, reason })?;

        let empty = Map::new();
        let props = feat_obj
            .get("properties")
            .and_then(|v| v.as_object())
            .unwrap_or(&empty);

        records.push(FacilityRecord {
            lon_deg,
            lat_deg,
            id: string_prop(props, "id"),
            name: string_prop(props, "name"),
            operator: string_prop(props, "operator"),
            status: string_prop(props, "status"),
            capacity_mw: number_prop(props, "capacity_mw"),
            water_stress: string_prop(props, "water_stress"),
            city: string_prop(props, "city"),
            state: string_prop(props, "state"),
            url: string_prop(props, "url"),
        });
    }

    Ok(records)
}

fn parse_point_geometry(value: &Value) -> Result<(f64, f64), String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;
    if ty != "Point" {
        return Err(format!("unsupported geometry type: {ty}"));
    }

    let coords = obj
        .get("coordinates")
        .and_then(|v| v.as_array())
        .ok_or("Point coordinates must be an array".to_string())?;
    if coords.len() < 2 {
        return Err("Point coordinates must have [lon, lat]".to_string());
    }
    let lon = coords[0]
        .as_f64()
        .ok_or("Point lon must be a number".to_string())?;
    let lat = coords[1]
        .as_f64()
        .ok_or("Point lat must be a number".to_string())?;
    if !lon.is_finite() || !lat.is_finite() {
        return Err("Point coordinates must be finite".to_string());
    }
    Ok((lon, lat))
}

fn string_prop(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// The upstream CSV pipeline emits numeric fields both as JSON numbers and
/// as numeric strings; accept either, reject anything else.
fn number_prop(props: &Map<String, Value>, key: &str) -> Option<f64> {
    match props.get(key) {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
