use super::ViewportConfig;

/// Pinch-zoom scale with a baseline tolerance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomState {
    scale: f32,
    min: f32,
    max: f32,
    double_tap: f32,
    epsilon: f32,
}

impl ZoomState {
    pub fn new(config: &ViewportConfig) -> Self {
        let (min, max) = if config.max_zoom < config.min_zoom {
            (config.max_zoom, config.min_zoom)
        } else {
            (config.min_zoom, config.max_zoom)
        };
        Self {
            scale: min,
            min,
            max,
            double_tap: config.double_tap_zoom.clamp(min, max),
            epsilon: config.zoom_epsilon,
        }
    }

    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Zoomed once the scale leaves the baseline by more than epsilon.
    pub fn is_zoomed(&self) -> bool {
        let offset = self.scale - self.min;
        offset > self.epsilon || offset < -self.epsilon
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = if scale.is_nan() {
            self.min
        } else {
            scale.clamp(self.min, self.max)
        };
    }

    pub fn toggle(&mut self) -> f32 {
        let next = if self.is_zoomed() {
            self.min
        } else {
            self.double_tap
        };
        self.set_scale(next);
        self.scale
    }

    pub fn reset(&mut self) {
        self.scale = self.min;
    }
}
