/// Screen style for one marker class.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerStyle {
    pub color: [f32; 4],
    pub radius_px: f32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: [0.58, 0.64, 0.72, 0.95],
            radius_px: 6.0,
        }
    }
}

/// Style keyed on facility status. Unknown or absent statuses get the
/// neutral default so every record stays visible on the map.
pub fn style_for_status(status: Option<&str>) -> MarkerStyle {
    let Some(status) = status else {
        return MarkerStyle::default();
    };
    match status {
        "Existing" => MarkerStyle {
            color: [0.20, 0.78, 0.35, 0.95],
            radius_px: 6.0,
        },
        "Under Construction" => MarkerStyle {
            color: [1.00, 0.72, 0.20, 0.95],
            radius_px: 6.0,
        },
        "Permitted" => MarkerStyle {
            color: [0.30, 0.62, 1.00, 0.95],
            radius_px: 6.0,
        },
        "Planned" | "Proposed" => MarkerStyle {
            color: [0.72, 0.50, 1.00, 0.95],
            radius_px: 6.0,
        },
        "Decommissioned" | "Cancelled" => MarkerStyle {
            color: [0.95, 0.30, 0.30, 0.85],
            radius_px: 5.0,
        },
        _ => MarkerStyle::default(),
    }
}

/// Cluster badges scale gently with member count.
pub fn cluster_radius_px(count: usize) -> f32 {
    let base = 10.0_f32;
    base + (count as f32).log10().max(0.0) * 6.0
}
