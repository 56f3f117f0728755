use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use formats::FacilityCollection;

#[derive(Clone)]
struct AppState {
    facilities_path: PathBuf,
    jobs_path: PathBuf,
    http: reqwest::Client,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let facilities_path = env::var("FACILITY_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/datacenters.geojson"));
    let jobs_path = env::var("JOBS_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/jobs.json"));
    let addr: SocketAddr = env::var("FACILITY_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9300".to_string())
        .parse()
        .expect("invalid FACILITY_ADDR");

    let state = AppState {
        facilities_path,
        jobs_path,
        http: reqwest::Client::new(),
    };

    // Validate the dataset once at startup so a bad deploy is loud in the
    // logs rather than a silent empty map.
    match tokio::fs::read_to_string(&state.facilities_path).await {
        Ok(payload) => match FacilityCollection::from_geojson_str(&payload) {
            Ok(collection) => info!(
                "facility dataset ok: {} records, hash {}",
                collection.len(),
                &collection.content_hash[..16]
            ),
            Err(err) => warn!("facility dataset invalid: {err}"),
        },
        Err(err) => warn!(
            "facility dataset unreadable at {:?}: {err}",
            state.facilities_path
        ),
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/facilities", get(get_facilities))
        .route("/api/jobs", get(get_jobs))
        .route("/api/fetch", post(fetch_url))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    info!("facility data server listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

async fn healthz(State(state): State<AppState>) -> Response {
    let body = match tokio::fs::read_to_string(&state.facilities_path).await {
        Ok(payload) => match FacilityCollection::from_geojson_str(&payload) {
            Ok(collection) => json!({
                "status": "ready",
                "facilities": collection.len(),
                "content_hash": collection.content_hash,
            }),
            Err(err) => json!({ "status": "invalid", "error": err.to_string() }),
        },
        Err(err) => json!({ "status": "missing", "error": err.to_string() }),
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn serve_json_file(path: &PathBuf, what: &str) -> Result<Response, (StatusCode, Json<Value>)> {
    let payload = match tokio::fs::read_to_string(path).await {
        Ok(p) => p,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                format!("{what} dataset not found"),
            ));
        }
        Err(e) => {
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read {what} dataset: {e}"),
            ));
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok((StatusCode::OK, headers, Body::from(payload)).into_response())
}

async fn get_facilities(
    State(state): State<AppState>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    serve_json_file(&state.facilities_path, "facility").await
}

async fn get_jobs(State(state): State<AppState>) -> Result<Response, (StatusCode, Json<Value>)> {
    serve_json_file(&state.jobs_path, "jobs").await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchRequest {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchResponse {
    status: u16,
    content_type: String,
    text: String,
}

/// Bounded text proxy so the browser viewer can load CORS-blocked remote
/// datasets through the backend.
async fn fetch_url(
    State(state): State<AppState>,
    Json(req): Json<FetchRequest>,
) -> Result<Json<FetchResponse>, (StatusCode, Json<Value>)> {
    const MAX_BYTES: usize = 8 * 1024 * 1024;

    let url = req.url.trim();
    if url.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "url is required"));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Only http(s) URLs are allowed",
        ));
    }

    let resp = state
        .http
        .get(url)
        .send()
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, format!("Fetch failed: {e}")))?;

    let status = resp.status().as_u16();
    if !resp.status().is_success() {
        return Err(api_error(
            StatusCode::BAD_GATEWAY,
            format!("Upstream HTTP {status}"),
        ));
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, format!("Read failed: {e}")))?;

    if bytes.len() > MAX_BYTES {
        return Err(api_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Payload too large (max {} bytes)", MAX_BYTES),
        ));
    }

    let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
        api_error(
            StatusCode::BAD_GATEWAY,
            "Upstream response was not valid UTF-8",
        )
    })?;

    Ok(Json(FetchResponse {
        status,
        content_type,
        text,
    }))
}
