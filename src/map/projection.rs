//! Natural Earth I projection and fitting to the screen

use egui::{Pos2, Rect};

/// Projected width of the whole globe at unit scale (2 * 0.8707 * PI)
const WORLD_WIDTH: f64 = 5.4708;
/// Projected height of the whole globe at unit scale
const WORLD_HEIGHT: f64 = 2.8448;
/// Fraction of the map rect the globe may fill
const MARGIN: f64 = 0.96;

/// Natural Earth I at unit scale. Degrees in, y pointing north.
pub fn natural_earth(lon_deg: f64, lat_deg: f64) -> [f64; 2] {
    let lambda = lon_deg.to_radians();
    let phi = lat_deg.clamp(-90.0, 90.0).to_radians();
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    [
        lambda * (0.8707 - 0.131979 * phi2 + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4))),
        phi * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4))),
    ]
}

/// Maps unit-scale projected coordinates onto a screen rect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    scale: f64,
    center: [f64; 2],
}

impl ScreenTransform {
    /// Largest centered scale at which the whole globe fits in `rect`
    pub fn fit(rect: Rect) -> Self {
        let width = rect.width().max(1.0) as f64;
        let height = rect.height().max(1.0) as f64;
        let scale = (width / WORLD_WIDTH).min(height / WORLD_HEIGHT) * MARGIN;
        let center = rect.center();
        Self {
            scale,
            center: [center.x as f64, center.y as f64],
        }
    }

    pub fn to_screen(&self, p: [f64; 2]) -> Pos2 {
        Pos2::new(
            (self.center[0] + p[0] * self.scale) as f32,
            (self.center[1] - p[1] * self.scale) as f32,
        )
    }

    pub fn from_screen(&self, pos: Pos2) -> [f64; 2] {
        [
            (pos.x as f64 - self.center[0]) / self.scale,
            (self.center[1] - pos.y as f64) / self.scale,
        ]
    }
}
