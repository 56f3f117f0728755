use gloo_net::http::Request;
use std::cell::RefCell;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use directory::{JobsDirectory, JobsLookup};
use foundation::bounds::LonLatBounds;
use foundation::math::{
    Camera2D, MercatorProjector, camera_scale_px_per_m, clamp, clamp_center_y_for_extent,
    inverse_mercator_lat_deg, inverse_mercator_lon_deg, wrap_lon_deg,
};
use formats::FacilityCollection;
use layers::cluster::{DEFAULT_CLUSTER_CELL_PX, cluster_positions};
use layers::filter::FilterCriteria;
use layers::markers::{MarkersLayer, MarkersSnapshot, popup_html};
use layers::symbology::{cluster_radius_px, style_for_status};

// Guard to prevent double-initialization of global state (relevant during hot reload).
static INITIALIZED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

const MARKERS_LAYER_ID: u64 = 1;

#[derive(Debug)]
struct ViewerState {
    canvas_width: f64,
    canvas_height: f64,
    canvas_2d: Option<HtmlCanvasElement>,
    ctx_2d: Option<CanvasRenderingContext2d>,

    // Loaded dataset (single initialization point; no reload).
    collection: Option<FacilityCollection>,
    dataset_loading: bool,
    dataset_error: Option<String>,

    criteria: FilterCriteria,
    markers_layer: MarkersLayer,
    visible: MarkersSnapshot,

    camera: Camera2D,
    clustering_enabled: bool,
    cluster_cell_px: f64,
    marker_pick_radius_px: f64,

    selected_record: Option<usize>,

    jobs_url: String,
    jobs: JobsDirectory,
}

thread_local! {
    static STATE: RefCell<ViewerState> = RefCell::new(ViewerState {
        canvas_width: 1280.0,
        canvas_height: 720.0,
        canvas_2d: None,
        ctx_2d: None,

        collection: None,
        dataset_loading: false,
        dataset_error: None,

        criteria: FilterCriteria::default(),
        markers_layer: MarkersLayer::new(MARKERS_LAYER_ID),
        visible: MarkersSnapshot::default(),

        camera: Camera2D::default(),
        clustering_enabled: true,
        cluster_cell_px: DEFAULT_CLUSTER_CELL_PX,
        marker_pick_radius_px: 10.0,

        selected_record: None,

        jobs_url: "data/jobs.json".to_string(),
        jobs: JobsDirectory::new(),
    });
}

/// Safe TLS access helper that returns a default on teardown instead of panicking.
fn with_state<F, R>(f: F) -> R
where
    F: FnOnce(&RefCell<ViewerState>) -> R,
    R: Default,
{
    STATE.try_with(f).unwrap_or_default()
}

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        console_error_panic_hook::set_once();
    });
}

fn console_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn show_alert(msg: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(msg);
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Avoid double-initialization (can happen during hot-reload edge cases).
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    init_panic_hook();
    Ok(())
}

#[wasm_bindgen]
pub fn init_canvas_2d(canvas_id: &str) {
    if let Err(err) = init_canvas_2d_inner(canvas_id) {
        console_error(&format!("2d canvas init error: {:?}", err));
    }
}

fn init_canvas_2d_inner(canvas_id: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str("missing map canvas"))?
        .dyn_into::<HtmlCanvasElement>()?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    with_state(|state| {
        let mut s = state.borrow_mut();
        s.canvas_2d = Some(canvas);
        s.ctx_2d = Some(ctx);
    });

    render_map()
}

#[wasm_bindgen]
pub fn set_canvas_sizes(width: f64, height: f64) {
    with_state(|state| {
        let mut s = state.borrow_mut();
        s.canvas_width = width;
        s.canvas_height = height;
        if let Some(canvas) = &s.canvas_2d {
            canvas.set_width(width as u32);
            canvas.set_height(height as u32);
        }
    });
    let _ = render_map();
}

// ── Data loading ────────────────────────────────────────────────────────────

/// One-shot startup fetch of the facility dataset. On failure the map is
/// left empty, the user sees a blocking alert, and the rest of the UI
/// stays interactive. Reloading the page is the only retry.
#[wasm_bindgen]
pub fn load_facilities(url: String) {
    let already = with_state(|state| {
        let mut s = state.borrow_mut();
        if s.collection.is_some() || s.dataset_loading {
            return true;
        }
        s.dataset_loading = true;
        false
    });
    if already {
        return;
    }

    spawn_local(async move {
        match fetch_facilities(&url).await {
            Ok(collection) => {
                with_state(|state| {
                    let mut s = state.borrow_mut();
                    s.dataset_loading = false;
                    s.dataset_error = None;
                    s.collection = Some(collection);
                    refresh_markers(&mut s);
                });
                let _ = render_map();
            }
            Err(reason) => {
                let msg = format!("Failed to load facility data: {reason}");
                console_error(&msg);
                with_state(|state| {
                    let mut s = state.borrow_mut();
                    s.dataset_loading = false;
                    s.dataset_error = Some(reason);
                    s.collection = None;
                    s.visible = MarkersSnapshot::default();
                });
                let _ = render_map();
                show_alert(&msg);
            }
        }
    });
}

async fn fetch_facilities(url: &str) -> Result<FacilityCollection, String> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch failed: {e}"))?;
    // gloo-net resolves non-2xx responses as Ok; treat them as load errors.
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    let text = resp.text().await.map_err(|e| format!("read failed: {e}"))?;
    FacilityCollection::from_geojson_str(&text).map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn facility_count() -> usize {
    with_state(|state| {
        state
            .borrow()
            .collection
            .as_ref()
            .map(|c| c.len())
            .unwrap_or(0)
    })
}

#[wasm_bindgen]
pub fn dataset_loaded() -> bool {
    with_state(|state| state.borrow().collection.is_some())
}

/// Load-failure reason, or null while the dataset is healthy.
#[wasm_bindgen]
pub fn dataset_error() -> JsValue {
    with_state(|state| {
        state
            .borrow()
            .dataset_error
            .as_deref()
            .map(JsValue::from_str)
            .unwrap_or(JsValue::NULL)
    })
}

/// Distinct status values in dataset order, for building the status
/// checkbox group.
#[wasm_bindgen]
pub fn list_statuses() -> Result<JsValue, JsValue> {
    let arr = js_sys::Array::new();
    with_state(|state| {
        let s = state.borrow();
        if let Some(collection) = &s.collection {
            for status in collection.distinct_statuses() {
                arr.push(&JsValue::from_str(&status));
            }
        }
    });
    Ok(arr.into())
}

// ── Filter criteria ─────────────────────────────────────────────────────────

fn refresh_markers(s: &mut ViewerState) {
    s.visible = match &s.collection {
        Some(collection) => s.markers_layer.extract(&collection.records, &s.criteria),
        None => MarkersSnapshot::default(),
    };
    if let Some(idx) = s.selected_record
        && !s.visible.markers.iter().any(|m| m.record_index == idx)
    {
        s.selected_record = None;
    }
}

fn criteria_changed() {
    with_state(|state| {
        let mut s = state.borrow_mut();
        refresh_markers(&mut s);
    });
    let _ = render_map();
}

#[wasm_bindgen]
pub fn set_status_filter(status: &str, enabled: bool) {
    with_state(|state| {
        let mut s = state.borrow_mut();
        if enabled {
            s.criteria.statuses.insert(status.to_string());
        } else {
            s.criteria.statuses.remove(status);
        }
    });
    criteria_changed();
}

#[wasm_bindgen]
pub fn clear_status_filters() {
    with_state(|state| state.borrow_mut().criteria.statuses.clear());
    criteria_changed();
}

#[wasm_bindgen]
pub fn set_min_capacity_mw(min_capacity_mw: f64) {
    let value = if min_capacity_mw.is_finite() {
        min_capacity_mw.max(0.0)
    } else {
        0.0
    };
    with_state(|state| state.borrow_mut().criteria.min_capacity_mw = value);
    criteria_changed();
}

/// Empty string clears the water-stress filter.
#[wasm_bindgen]
pub fn set_water_stress(level: &str) {
    with_state(|state| {
        let mut s = state.borrow_mut();
        s.criteria.water_stress = if level.is_empty() {
            None
        } else {
            Some(level.to_string())
        };
    });
    criteria_changed();
}

#[wasm_bindgen]
pub fn set_search_query(query: &str) {
    with_state(|state| state.borrow_mut().criteria.query = query.to_string());
    criteria_changed();
}

#[wasm_bindgen]
pub fn reset_filters() {
    with_state(|state| state.borrow_mut().criteria.reset());
    criteria_changed();
}

#[wasm_bindgen]
pub fn visible_count() -> usize {
    with_state(|state| state.borrow().visible.markers.len())
}

#[wasm_bindgen]
pub fn get_min_capacity_mw() -> f64 {
    with_state(|state| state.borrow().criteria.min_capacity_mw)
}

#[wasm_bindgen]
pub fn set_clustering_enabled(enabled: bool) {
    with_state(|state| state.borrow_mut().clustering_enabled = enabled);
    let _ = render_map();
}

// ── Camera ──────────────────────────────────────────────────────────────────

fn pan_camera(cam: Camera2D, delta_x_px: f64, delta_y_px: f64, w: f64, h: f64) -> Camera2D {
    let projector = MercatorProjector::new(cam, w, h);
    let dx_m = -delta_x_px / projector.scale_px_per_m;
    // Screen Y is inverted relative to Mercator Y, so drag-down moves the
    // center north and the map content follows the cursor.
    let dy_m = delta_y_px / projector.scale_px_per_m;
    let center_x = projector.center_x_m + dx_m;
    let center_y = projector.center_y_m + dy_m;

    let half_h_m = 0.5 * h / projector.scale_px_per_m;
    let clamped_center_y = clamp_center_y_for_extent(center_y, half_h_m);

    Camera2D {
        center_lon_deg: wrap_lon_deg(inverse_mercator_lon_deg(center_x)),
        center_lat_deg: inverse_mercator_lat_deg(clamped_center_y),
        ..cam
    }
}

fn zoom_camera_at(
    cam: Camera2D,
    x_px: f64,
    y_px: f64,
    wheel_delta_y: f64,
    w: f64,
    h: f64,
) -> Camera2D {
    let projector = MercatorProjector::new(cam, w, h);

    // Mercator point under the cursor (in meters).
    let dx_m = (x_px - w * 0.5) / projector.scale_px_per_m;
    let dy_m = (h * 0.5 - y_px) / projector.scale_px_per_m;
    let p_x_m = projector.center_x_m + dx_m;
    let p_y_m = projector.center_y_m + dy_m;

    let zoom_factor = (-wheel_delta_y * 0.0015).exp();
    let next_zoom = clamp(cam.zoom * zoom_factor, 1.0, 200.0);

    // Adjust center so the cursor stays anchored on the same mercator point.
    let next_cam = Camera2D {
        zoom: next_zoom,
        ..cam
    };
    let next_scale = camera_scale_px_per_m(next_cam, w, h);
    let next_center_x = p_x_m - (x_px - w * 0.5) / next_scale;
    let next_center_y = p_y_m - (h * 0.5 - y_px) / next_scale;

    let next_half_h_m = 0.5 * h / next_scale;
    let clamped_center_y = clamp_center_y_for_extent(next_center_y, next_half_h_m);

    Camera2D {
        center_lon_deg: wrap_lon_deg(inverse_mercator_lon_deg(next_center_x)),
        center_lat_deg: inverse_mercator_lat_deg(clamped_center_y),
        zoom: next_zoom,
    }
}

fn fit_camera_to_bounds(bounds: LonLatBounds, w: f64, h: f64) -> Option<Camera2D> {
    let (center_lon, center_lat) = bounds.center()?;
    let (span_lon, span_lat) = bounds.span()?;
    let span_lon = span_lon.max(1e-6);
    let span_lat = span_lat.max(1e-6);

    let base = (w / 360.0).min(h / 180.0).max(1e-6);
    let scale = (w / span_lon).min(h / span_lat) * 0.9;
    let zoom = clamp(scale / base, 1.0, 200.0);

    Some(Camera2D {
        center_lon_deg: wrap_lon_deg(center_lon),
        center_lat_deg: clamp(center_lat, -89.9, 89.9),
        zoom,
    })
}

#[wasm_bindgen]
pub fn camera_pan(delta_x_px: f64, delta_y_px: f64) {
    with_state(|state| {
        let mut s = state.borrow_mut();
        let (w, h) = (s.canvas_width.max(1.0), s.canvas_height.max(1.0));
        s.camera = pan_camera(s.camera, delta_x_px, delta_y_px, w, h);
    });
    let _ = render_map();
}

#[wasm_bindgen]
pub fn camera_zoom_at(x_px: f64, y_px: f64, wheel_delta_y: f64) -> Result<(), JsValue> {
    if !x_px.is_finite() || !y_px.is_finite() || !wheel_delta_y.is_finite() {
        return Err(JsValue::from_str("camera_zoom_at args must be finite"));
    }
    with_state(|state| {
        let mut s = state.borrow_mut();
        let (w, h) = (s.canvas_width.max(1.0), s.canvas_height.max(1.0));
        s.camera = zoom_camera_at(s.camera, x_px, y_px, wheel_delta_y, w, h);
    });
    render_map()
}

#[wasm_bindgen]
pub fn camera_reset() -> Result<(), JsValue> {
    with_state(|state| {
        state.borrow_mut().camera = Camera2D::default();
    });
    render_map()
}

/// Adjusts the view to enclose all currently visible markers. No-op when
/// nothing is visible.
#[wasm_bindgen]
pub fn fit_view() -> Result<(), JsValue> {
    with_state(|state| {
        let mut s = state.borrow_mut();
        let bounds = s.visible.bounds();
        let (w, h) = (s.canvas_width.max(1.0), s.canvas_height.max(1.0));
        if let Some(cam) = fit_camera_to_bounds(bounds, w, h) {
            s.camera = cam;
        }
    });
    render_map()
}

// ── Rendering ───────────────────────────────────────────────────────────────

const CANVAS_CLEAR: &str = "#0b1220";

fn rgba_css(c: [f32; 4]) -> String {
    let r = (c[0].clamp(0.0, 1.0) * 255.0).round() as u32;
    let g = (c[1].clamp(0.0, 1.0) * 255.0).round() as u32;
    let b = (c[2].clamp(0.0, 1.0) * 255.0).round() as u32;
    let a = c[3].clamp(0.0, 1.0);
    format!("rgba({r},{g},{b},{a})")
}

fn ctx_set_fill_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(value),
    );
}

fn ctx_set_stroke_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(value),
    );
}

/// Full clear-and-rebuild of the marker canvas. Idempotent: rendering twice
/// with unchanged state draws the same frame.
fn render_map() -> Result<(), JsValue> {
    STATE
        .try_with(|state_ref| {
            let state = state_ref.borrow();
            let Some(ctx) = state.ctx_2d.as_ref() else {
                return Ok(());
            };

            let w = state.canvas_width.max(1.0);
            let h = state.canvas_height.max(1.0);

            ctx_set_fill_style(ctx, CANVAS_CLEAR);
            ctx.fill_rect(0.0, 0.0, w, h);

            let projector = MercatorProjector::new(state.camera, w, h);
            let positions: Vec<(f64, f64)> = state
                .visible
                .markers
                .iter()
                .map(|m| projector.project_lon_lat(m.lon_deg, m.lat_deg))
                .collect();

            if state.clustering_enabled {
                let clusters = cluster_positions(&positions, state.cluster_cell_px);
                for cluster in &clusters {
                    if cluster.is_single() {
                        let i = cluster.members[0];
                        draw_marker(ctx, &state, i, positions[i]);
                    } else {
                        draw_cluster_badge(ctx, (cluster.x_px, cluster.y_px), cluster.count());
                    }
                }
            } else {
                for i in 0..positions.len() {
                    draw_marker(ctx, &state, i, positions[i]);
                }
            }

            Ok(())
        })
        .unwrap_or(Ok(()))
}

fn draw_marker(
    ctx: &CanvasRenderingContext2d,
    state: &ViewerState,
    marker_index: usize,
    (x, y): (f64, f64),
) {
    let marker = &state.visible.markers[marker_index];
    let style = style_for_status(marker.status.as_deref());
    let selected = state.selected_record == Some(marker.record_index);

    ctx_set_fill_style(ctx, &rgba_css(style.color));
    ctx.begin_path();
    let _ = ctx.arc(x, y, style.radius_px as f64, 0.0, std::f64::consts::TAU);
    ctx.fill();

    ctx_set_stroke_style(ctx, if selected { "#ffffff" } else { "rgba(15,23,42,0.8)" });
    ctx.set_line_width(if selected { 2.5 } else { 1.0 });
    ctx.stroke();
}

fn draw_cluster_badge(ctx: &CanvasRenderingContext2d, (x, y): (f64, f64), count: usize) {
    let radius = cluster_radius_px(count) as f64;

    ctx_set_fill_style(ctx, "rgba(56,132,255,0.85)");
    ctx.begin_path();
    let _ = ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU);
    ctx.fill();
    ctx_set_stroke_style(ctx, "rgba(226,232,240,0.9)");
    ctx.set_line_width(1.5);
    ctx.stroke();

    ctx_set_fill_style(ctx, "#f8fafc");
    ctx.set_font("12px sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(&count.to_string(), x, y);
}

// ── Picking + popups ────────────────────────────────────────────────────────

/// Picks the nearest visible marker within the pick radius and returns
/// `{ picked, recordIndex, lon, lat, popupHtml }` for the host page to
/// place a popup. Clicking empty map clears the selection.
#[wasm_bindgen]
pub fn cursor_click(x_px: f64, y_px: f64) -> Result<JsValue, JsValue> {
    let out = js_sys::Object::new();

    let picked = with_state(|state| {
        let mut s = state.borrow_mut();
        let (w, h) = (s.canvas_width.max(1.0), s.canvas_height.max(1.0));
        let projector = MercatorProjector::new(s.camera, w, h);
        let r2 = s.marker_pick_radius_px * s.marker_pick_radius_px;

        let mut best: Option<usize> = None;
        let mut best_d2 = f64::INFINITY;
        for marker in &s.visible.markers {
            let (sx, sy) = projector.project_lon_lat(marker.lon_deg, marker.lat_deg);
            let dx = sx - x_px;
            let dy = sy - y_px;
            let d2 = dx * dx + dy * dy;
            if d2 < best_d2 {
                best = Some(marker.record_index);
                best_d2 = d2;
            }
        }

        if let Some(record_index) = best
            && best_d2 <= r2
        {
            s.selected_record = Some(record_index);
            Some(record_index)
        } else {
            s.selected_record = None;
            None
        }
    });

    let _ = render_map();

    if let Some(record_index) = picked {
        let popup = with_state(|state| {
            let s = state.borrow();
            s.collection
                .as_ref()
                .and_then(|c| c.records.get(record_index))
                .map(|r| (popup_html(r), r.lon_deg, r.lat_deg))
        });
        if let Some((html, lon, lat)) = popup {
            js_sys::Reflect::set(&out, &JsValue::from_str("picked"), &JsValue::TRUE)?;
            js_sys::Reflect::set(
                &out,
                &JsValue::from_str("recordIndex"),
                &JsValue::from_f64(record_index as f64),
            )?;
            js_sys::Reflect::set(&out, &JsValue::from_str("lon"), &JsValue::from_f64(lon))?;
            js_sys::Reflect::set(&out, &JsValue::from_str("lat"), &JsValue::from_f64(lat))?;
            js_sys::Reflect::set(&out, &JsValue::from_str("popupHtml"), &JsValue::from_str(&html))?;
            return Ok(out.into());
        }
    }

    js_sys::Reflect::set(&out, &JsValue::from_str("picked"), &JsValue::FALSE)?;
    Ok(out.into())
}

// ── Jobs lookup ─────────────────────────────────────────────────────────────

#[wasm_bindgen]
pub fn set_jobs_url(url: String) {
    with_state(|state| state.borrow_mut().jobs_url = url);
}

fn jobs_confirm_message(facility_name: &str, lookup: &JobsLookup) -> Option<String> {
    let JobsLookup::Links {
        primary,
        career_page,
        aggregators,
    } = lookup
    else {
        return None;
    };

    let mut msg = format!("Job listings for {facility_name}:\n");
    if let Some(url) = career_page {
        msg.push_str(&format!("  Careers page: {url}\n"));
    }
    for (name, url) in aggregators {
        msg.push_str(&format!("  {name}: {url}\n"));
    }
    msg.push_str(&format!("\nOpen {primary}?"));
    Some(msg)
}

/// Looks up job listings for the record at `record_index`. Lazily fetches
/// the companion dataset on first use; a failed fetch alerts and leaves
/// the directory retryable. Unknown ids alert "no data" and open nothing.
#[wasm_bindgen]
pub fn open_jobs(record_index: usize) {
    spawn_local(async move {
        open_jobs_inner(record_index).await;
    });
}

async fn open_jobs_inner(record_index: usize) {
    let facility = with_state(|state| {
        let s = state.borrow();
        s.collection
            .as_ref()
            .and_then(|c| c.records.get(record_index))
            .map(|r| {
                (
                    r.id.clone(),
                    formats::FacilityRecord::display_or_placeholder(&r.name).to_string(),
                )
            })
    });
    let Some((facility_id, facility_name)) = facility else {
        return;
    };
    let Some(facility_id) = facility_id else {
        show_alert(&format!("No jobs data available for {facility_name}."));
        return;
    };

    let needs_fetch = with_state(|state| {
        let mut s = state.borrow_mut();
        let needs = s.jobs.needs_fetch();
        if needs {
            s.jobs.mark_loading();
        }
        needs
    });

    if needs_fetch {
        let url = with_state(|state| state.borrow().jobs_url.clone());
        match fetch_jobs_payload(&url).await {
            Ok(payload) => {
                let result = with_state(|state| {
                    Some(
                        state
                            .borrow_mut()
                            .jobs
                            .load_from_json(&payload)
                            .map_err(|e| e.to_string()),
                    )
                })
                .unwrap_or(Ok(0));
                if let Err(reason) = result {
                    let msg = format!("Failed to load jobs data: {reason}");
                    console_error(&msg);
                    show_alert(&msg);
                    return;
                }
            }
            Err(reason) => {
                with_state(|state| state.borrow_mut().jobs.mark_failed(reason.clone()));
                let msg = format!("Failed to load jobs data: {reason}");
                console_error(&msg);
                show_alert(&msg);
                return;
            }
        }
    }

    let lookup = with_state(|state| Some(state.borrow().jobs.lookup(&facility_id)))
        .unwrap_or(JobsLookup::NotReady);
    match &lookup {
        JobsLookup::Links { primary, .. } => {
            let message = jobs_confirm_message(&facility_name, &lookup)
                .unwrap_or_else(|| format!("Open {primary}?"));
            if let Some(window) = web_sys::window()
                && window.confirm_with_message(&message).unwrap_or(false)
            {
                let _ = window.open_with_url_and_target(primary, "_blank");
            }
        }
        _ => {
            show_alert(&format!("No jobs data available for {facility_name}."));
        }
    }
}

async fn fetch_jobs_payload(url: &str) -> Result<String, String> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch failed: {e}"))?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    resp.text().await.map_err(|e| format!("read failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::{fit_camera_to_bounds, jobs_confirm_message, pan_camera, zoom_camera_at};
    use directory::JobsLookup;
    use foundation::bounds::LonLatBounds;
    use foundation::math::Camera2D;

    #[test]
    fn fit_camera_is_none_for_empty_bounds() {
        assert!(fit_camera_to_bounds(LonLatBounds::empty(), 1280.0, 720.0).is_none());
    }

    #[test]
    fn fit_camera_centers_on_the_extent() {
        let mut bounds = LonLatBounds::empty();
        bounds.extend(-122.0, 47.0);
        bounds.extend(-77.0, 39.0);
        let cam = fit_camera_to_bounds(bounds, 1280.0, 720.0).unwrap();
        assert!((cam.center_lon_deg - (-99.5)).abs() < 1e-9);
        assert!((cam.center_lat_deg - 43.0).abs() < 1e-9);
        assert!(cam.zoom > 1.0);
    }

    #[test]
    fn fit_camera_handles_a_single_visible_marker() {
        let mut bounds = LonLatBounds::empty();
        bounds.extend(-77.49, 39.04);
        let cam = fit_camera_to_bounds(bounds, 1280.0, 720.0).unwrap();
        assert!((cam.center_lon_deg - (-77.49)).abs() < 1e-9);
        // Degenerate span clamps to maximum zoom rather than dividing by zero.
        assert_eq!(cam.zoom, 200.0);
    }

    #[test]
    fn pan_moves_the_camera_center() {
        let cam = Camera2D {
            center_lon_deg: -98.0,
            center_lat_deg: 39.0,
            zoom: 8.0,
        };
        let panned = pan_camera(cam, 100.0, 0.0, 1280.0, 720.0);
        assert!(panned.center_lon_deg < cam.center_lon_deg);
        assert_eq!(panned.zoom, cam.zoom);
    }

    #[test]
    fn zoom_clamps_to_the_configured_range() {
        let cam = Camera2D::default();
        let zoomed_out = zoom_camera_at(cam, 640.0, 360.0, 10_000.0, 1280.0, 720.0);
        assert_eq!(zoomed_out.zoom, 1.0);
        let zoomed_in = zoom_camera_at(cam, 640.0, 360.0, -1_000_000.0, 1280.0, 720.0);
        assert_eq!(zoomed_in.zoom, 200.0);
    }

    #[test]
    fn confirm_message_lists_links_and_primary() {
        let lookup = JobsLookup::Links {
            primary: "https://careers.example".to_string(),
            career_page: Some("https://careers.example".to_string()),
            aggregators: vec![(
                "linkedin".to_string(),
                "https://li.example".to_string(),
            )],
        };
        let msg = jobs_confirm_message("Ashburn Campus", &lookup).unwrap();
        assert!(msg.contains("Ashburn Campus"));
        assert!(msg.contains("Careers page: https://careers.example"));
        assert!(msg.contains("linkedin: https://li.example"));
        assert!(msg.ends_with("Open https://careers.example?"));
    }

    #[test]
    fn confirm_message_is_none_without_links() {
        assert!(jobs_confirm_message("X", &JobsLookup::NoData).is_none());
        assert!(jobs_confirm_message("X", &JobsLookup::NotReady).is_none());
    }
}
