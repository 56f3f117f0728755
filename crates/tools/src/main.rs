use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use formats::{FacilityCollection, FacilityRecord, JobsDataset, JobsEntry};
use layers::filter::FilterCriteria;
use layers::markers::MarkersLayer;

fn main() {
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "check" => cmd_check(args),
        "filter" => cmd_filter(args),
        "jobs-template" => cmd_jobs_template(args),
        _ => Err(usage()),
    }
}

fn usage() -> String {
    [
        "usage:",
        "  dcmap check <facilities.geojson>",
        "  dcmap filter <facilities.geojson> [--status S]... [--min-capacity MW]",
        "               [--water-stress LEVEL] [--query TEXT]",
        "  dcmap jobs-template <facilities.geojson> <out.json>",
    ]
    .join("\n")
}

fn load_collection(path: &PathBuf) -> Result<FacilityCollection, String> {
    let payload = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    FacilityCollection::from_geojson_str(&payload).map_err(|e| format!("parse {path:?}: {e}"))
}

fn cmd_check(args: Vec<String>) -> Result<(), String> {
    let [path] = args.as_slice() else {
        return Err(usage());
    };
    let path = PathBuf::from(path);
    let collection = load_collection(&path)?;

    println!("facilities: {}", collection.len());
    println!("content hash: {}", collection.content_hash);

    let bounds = collection.bounds();
    if let (Some((clon, clat)), Some((slon, slat))) = (bounds.center(), bounds.span()) {
        println!(
            "extent: lon [{:.4}, {:.4}]  lat [{:.4}, {:.4}]  (center {clon:.4}, {clat:.4}, span {slon:.4} x {slat:.4})",
            bounds.min_lon_deg, bounds.max_lon_deg, bounds.min_lat_deg, bounds.max_lat_deg
        );
    }

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut missing_id = 0usize;
    for r in &collection.records {
        let key = r.status.clone().unwrap_or_else(|| "(none)".to_string());
        *by_status.entry(key).or_default() += 1;
        if r.id.is_none() {
            missing_id += 1;
        }
    }
    println!("statuses:");
    for (status, count) in &by_status {
        println!("  {status}: {count}");
    }
    if missing_id > 0 {
        println!("records without id (no jobs lookup): {missing_id}");
    }

    Ok(())
}

fn cmd_filter(mut args: Vec<String>) -> Result<(), String> {
    if args.is_empty() {
        return Err(usage());
    }
    let path = PathBuf::from(args.remove(0));
    let mut criteria = FilterCriteria::default();

    let mut i = 0;
    while i < args.len() {
        let take_value = |args: &[String], i: usize, flag: &str| -> Result<String, String> {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match args[i].as_str() {
            "--status" => {
                criteria.statuses.insert(take_value(&args, i, "--status")?);
                i += 2;
            }
            "--min-capacity" => {
                let raw = take_value(&args, i, "--min-capacity")?;
                criteria.min_capacity_mw = raw
                    .parse::<f64>()
                    .map_err(|e| format!("invalid --min-capacity {raw}: {e}"))?;
                i += 2;
            }
            "--water-stress" => {
                criteria.water_stress = Some(take_value(&args, i, "--water-stress")?);
                i += 2;
            }
            "--query" => {
                criteria.query = take_value(&args, i, "--query")?;
                i += 2;
            }
            s => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
        }
    }

    let collection = load_collection(&path)?;
    let layer = MarkersLayer::new(1);
    let snapshot = layer.extract(&collection.records, &criteria);

    for marker in &snapshot.markers {
        let r = &collection.records[marker.record_index];
        println!(
            "{}  [{}]  {}, {}  {}",
            FacilityRecord::display_or_placeholder(&r.name),
            FacilityRecord::display_or_placeholder(&r.status),
            FacilityRecord::display_or_placeholder(&r.city),
            FacilityRecord::display_or_placeholder(&r.state),
            match r.capacity_mw {
                Some(mw) => format!("{mw} MW"),
                None => "capacity unknown".to_string(),
            }
        );
    }
    println!(
        "{} of {} facilities match",
        snapshot.markers.len(),
        collection.len()
    );

    Ok(())
}

// Aggregator URL patterns for the jobs skeleton. Filled per facility from
// operator/city/state.
const AGGREGATOR_PATTERNS: &[(&str, &str)] = &[
    (
        "linkedin",
        "https://www.linkedin.com/jobs/search/?keywords={operator}%20{city}&location={city}%2C%20{state}",
    ),
    (
        "indeed",
        "https://www.indeed.com/jobs?q={operator}%20{city}&l={city}%2C%20{state}",
    ),
    (
        "glassdoor",
        "https://www.glassdoor.com/Job/jobs.htm?sc.keyword={operator}%20{city}&locT=C",
    ),
];

fn cmd_jobs_template(args: Vec<String>) -> Result<(), String> {
    let [input, output] = args.as_slice() else {
        return Err(usage());
    };
    let input = PathBuf::from(input);
    let output = PathBuf::from(output);

    let collection = load_collection(&input)?;

    let mut dataset = JobsDataset::default();
    let mut skipped = 0usize;
    for r in &collection.records {
        let (Some(id), Some(operator)) = (&r.id, &r.operator) else {
            skipped += 1;
            continue;
        };

        let mut aggregator_urls = BTreeMap::new();
        if let (Some(city), Some(state)) = (&r.city, &r.state) {
            for (name, pattern) in AGGREGATOR_PATTERNS {
                aggregator_urls.insert(
                    name.to_string(),
                    pattern
                        .replace("{operator}", &quote_plus(operator))
                        .replace("{city}", &quote_plus(city))
                        .replace("{state}", &quote_plus(state)),
                );
            }
        }

        let location = match (&r.city, &r.state) {
            (Some(city), Some(state)) => Some(format!("{city}, {state}")),
            _ => None,
        };

        dataset.entries.insert(
            id.clone(),
            JobsEntry {
                operator: Some(operator.clone()),
                location,
                career_page: None,
                aggregator_urls,
                open_positions: None,
                hiring_status: Some("Unknown".to_string()),
                last_updated: None,
            },
        );
    }

    let payload = serde_json::to_string_pretty(&dataset).map_err(|e| format!("json: {e}"))?;
    fs::write(&output, payload).map_err(|e| format!("write {output:?}: {e}"))?;

    println!(
        "wrote jobs template for {} facilities to {output:?}",
        dataset.len()
    );
    if skipped > 0 {
        println!("skipped {skipped} records without id or operator");
    }

    Ok(())
}

/// Minimal application/x-www-form-urlencoded encoding for URL templates.
fn quote_plus(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
