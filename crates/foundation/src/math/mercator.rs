use super::{WGS84_A, clamp, wrap_lon_deg};

/// Latitude limit of the Web Mercator projection.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.05112878;

pub fn mercator_x_m(lon_deg: f64) -> f64 {
    WGS84_A * lon_deg.to_radians()
}

pub fn mercator_y_m(lat_deg: f64) -> f64 {
    let lat = clamp(lat_deg, -MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG).to_radians();
    WGS84_A * (0.5 * (std::f64::consts::FRAC_PI_2 + lat)).tan().ln()
}

pub fn inverse_mercator_lon_deg(x_m: f64) -> f64 {
    (x_m / WGS84_A).to_degrees()
}

pub fn inverse_mercator_lat_deg(y_m: f64) -> f64 {
    (2.0 * (y_m / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees()
}

pub fn world_width_m() -> f64 {
    2.0 * std::f64::consts::PI * WGS84_A
}

/// Camera over the 2D map: center point plus a zoom multiplier where 1.0
/// roughly fills the viewport with the world.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera2D {
    pub center_lon_deg: f64,
    pub center_lat_deg: f64,
    pub zoom: f64,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            center_lon_deg: 0.0,
            center_lat_deg: 0.0,
            zoom: 1.0,
        }
    }
}

pub fn camera_scale_px_per_m(cam: Camera2D, w: f64, h: f64) -> f64 {
    let world_height_m = 2.0 * mercator_y_m(MERCATOR_MAX_LAT_DEG);
    // max() so the world fills the viewport with no edges visible at zoom=1.
    let base = (w / world_width_m()).max(h / world_height_m);
    (base * cam.zoom).max(1e-6)
}

/// Projects lon/lat to screen pixels (and back) for a fixed camera and
/// viewport. Longitudes unwrap toward the camera center so markers near the
/// antimeridian land on the visible copy of the world.
#[derive(Debug, Copy, Clone)]
pub struct MercatorProjector {
    pub center_x_m: f64,
    pub center_y_m: f64,
    pub scale_px_per_m: f64,
    pub viewport_w_px: f64,
    pub viewport_h_px: f64,
}

impl MercatorProjector {
    pub fn new(cam: Camera2D, w: f64, h: f64) -> Self {
        Self {
            center_x_m: mercator_x_m(cam.center_lon_deg),
            center_y_m: mercator_y_m(cam.center_lat_deg),
            scale_px_per_m: camera_scale_px_per_m(cam, w, h),
            viewport_w_px: w,
            viewport_h_px: h,
        }
    }

    pub fn project_lon_lat(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let ww = world_width_m();
        let x_m = mercator_x_m(lon_deg);
        let y_m = mercator_y_m(lat_deg);
        let dx = (x_m - self.center_x_m + 0.5 * ww).rem_euclid(ww) - 0.5 * ww;
        let dy = y_m - self.center_y_m;
        let x = self.viewport_w_px * 0.5 + dx * self.scale_px_per_m;
        let y = self.viewport_h_px * 0.5 - dy * self.scale_px_per_m;
        (x, y)
    }

    pub fn screen_to_lon_lat(&self, x_px: f64, y_px: f64) -> (f64, f64) {
        let dx_m = (x_px - self.viewport_w_px * 0.5) / self.scale_px_per_m;
        let dy_m = (self.viewport_h_px * 0.5 - y_px) / self.scale_px_per_m;
        let lon = wrap_lon_deg(inverse_mercator_lon_deg(self.center_x_m + dx_m));
        let lat = clamp(
            inverse_mercator_lat_deg(self.center_y_m + dy_m),
            -MERCATOR_MAX_LAT_DEG,
            MERCATOR_MAX_LAT_DEG,
        );
        (lon, lat)
    }
}

/// Clamp center_y so the visible extent doesn't exceed the Mercator bounds.
pub fn clamp_center_y_for_extent(center_y_m: f64, half_h_m: f64) -> f64 {
    let max_y = mercator_y_m(MERCATOR_MAX_LAT_DEG);
    let max_center = max_y - half_h_m;
    let min_center = -max_y + half_h_m;
    if min_center > max_center {
        // Viewport is taller than the world.
        0.0
    } else {
        clamp(center_y_m, min_center, max_center)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Camera2D, MercatorProjector, inverse_mercator_lat_deg, inverse_mercator_lon_deg,
        mercator_x_m, mercator_y_m,
    };

    #[test]
    fn mercator_round_trips() {
        for &(lon, lat) in &[(0.0, 0.0), (-77.49, 39.04), (139.69, 35.68), (-122.3, 47.6)] {
            assert!((inverse_mercator_lon_deg(mercator_x_m(lon)) - lon).abs() < 1e-9);
            assert!((inverse_mercator_lat_deg(mercator_y_m(lat)) - lat).abs() < 1e-9);
        }
    }

    #[test]
    fn camera_center_projects_to_viewport_center() {
        let cam = Camera2D {
            center_lon_deg: -98.0,
            center_lat_deg: 39.5,
            zoom: 4.0,
        };
        let projector = MercatorProjector::new(cam, 1280.0, 720.0);
        let (x, y) = projector.project_lon_lat(-98.0, 39.5);
        assert!((x - 640.0).abs() < 1e-6);
        assert!((y - 360.0).abs() < 1e-6);
    }

    #[test]
    fn screen_round_trips_through_projection() {
        let cam = Camera2D {
            center_lon_deg: -98.0,
            center_lat_deg: 39.5,
            zoom: 6.0,
        };
        let projector = MercatorProjector::new(cam, 1024.0, 768.0);
        let (x, y) = projector.project_lon_lat(-77.49, 39.04);
        let (lon, lat) = projector.screen_to_lon_lat(x, y);
        assert!((lon - (-77.49)).abs() < 1e-6);
        assert!((lat - 39.04).abs() < 1e-6);
    }
}
