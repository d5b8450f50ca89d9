//! View transform and pan/zoom controller.
//!
//! Geometry is projected once into "view space" (the unzoomed viewport). The
//! view transform maps view space to the screen as `screen = pan + zoom * view`,
//! with both sides measured from the viewport's top-left corner.

use crate::config::ZoomConfig;
use eframe::egui::{Pos2, Vec2};

/// Zoom changes smaller than this are treated as no change.
const ZOOM_EPSILON: f32 = 1e-4;

/// Scale and translation applied on top of the projected geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub pan: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    /// View space to screen space (relative to the viewport origin).
    pub fn apply(&self, point: Pos2) -> Pos2 {
        (self.pan + point.to_vec2() * self.zoom).to_pos2()
    }

    /// Screen space (relative to the viewport origin) to view space.
    pub fn invert(&self, point: Pos2) -> Pos2 {
        ((point.to_vec2() - self.pan) / self.zoom).to_pos2()
    }
}

/// Owns the view transform and keeps it within bounds.
#[derive(Debug, Clone)]
pub struct PanZoomController {
    transform: ViewTransform,
    viewport: Vec2,
    min_zoom: f32,
    max_zoom: f32,
    button_step: f32,
    wheel_step: f32,
    pan_padding: f32,
}

impl PanZoomController {
    pub fn new(config: &ZoomConfig, viewport: Vec2) -> Self {
        let min_zoom = config.min_zoom.max(f32::MIN_POSITIVE);
        let max_zoom = config.max_zoom.max(min_zoom);
        let mut controller = Self {
            transform: ViewTransform {
                zoom: 1.0_f32.clamp(min_zoom, max_zoom),
                pan: Vec2::ZERO,
            },
            viewport,
            min_zoom,
            max_zoom,
            button_step: config.button_step,
            wheel_step: config.wheel_step,
            pan_padding: config.pan_padding,
        };
        controller.transform.pan = controller.clamp_pan(Vec2::ZERO);
        controller
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn zoom(&self) -> f32 {
        self.transform.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.transform.pan
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Updates the viewport size and re-clamps the pan.
    pub fn set_viewport(&mut self, viewport: Vec2) -> bool {
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.transform.pan = self.clamp_pan(self.transform.pan);
        true
    }

    /// Zooms to `target_zoom` keeping `point` (viewport-relative) fixed on screen.
    pub fn zoom_around_point(&mut self, target_zoom: f32, point: Pos2) -> bool {
        if !target_zoom.is_finite() {
            return false;
        }
        let old_zoom = self.transform.zoom;
        let new_zoom = target_zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - old_zoom).abs() < ZOOM_EPSILON {
            return false;
        }

        let ratio = new_zoom / old_zoom;
        let anchor = point.to_vec2();
        let pan = anchor - (anchor - self.transform.pan) * ratio;

        self.transform.zoom = new_zoom;
        self.transform.pan = self.clamp_pan(pan);
        true
    }

    /// Pans by a screen-space delta. Disabled at or below native scale.
    pub fn pan_by(&mut self, delta: Vec2) -> bool {
        if self.transform.zoom <= 1.0 {
            return false;
        }
        let pan = self.clamp_pan(self.transform.pan + delta);
        if pan == self.transform.pan {
            return false;
        }
        self.transform.pan = pan;
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        let center = (self.viewport / 2.0).to_pos2();
        self.zoom_around_point(self.transform.zoom * self.button_step, center)
    }

    pub fn zoom_out(&mut self) -> bool {
        let center = (self.viewport / 2.0).to_pos2();
        self.zoom_around_point(self.transform.zoom / self.button_step, center)
    }

    /// Zooms around the pointer for a wheel event.
    ///
    /// Follows the DOM convention: negative `delta_y` (scrolling up) zooms in.
    pub fn wheel_zoom(&mut self, delta_y: f32, pointer: Pos2) -> bool {
        let target = if delta_y < 0.0 {
            self.transform.zoom * self.wheel_step
        } else if delta_y > 0.0 {
            self.transform.zoom / self.wheel_step
        } else {
            return false;
        };
        self.zoom_around_point(target, pointer)
    }

    /// Returns to native scale with no pan.
    pub fn reset(&mut self) -> bool {
        let reset = ViewTransform {
            zoom: 1.0_f32.clamp(self.min_zoom, self.max_zoom),
            pan: Vec2::ZERO,
        };
        if self.transform == reset {
            return false;
        }
        self.transform = reset;
        self.transform.pan = self.clamp_pan(Vec2::ZERO);
        true
    }

    /// Clamps a pan for the current zoom and viewport.
    ///
    /// At zoom <= 1 the pan is zero; above it each axis stays within
    /// `[size * (1 - zoom) - padding, padding]`.
    pub fn clamp_pan(&self, pan: Vec2) -> Vec2 {
        let zoom = self.transform.zoom;
        if zoom <= 1.0 {
            return Vec2::ZERO;
        }
        let clamp_axis = |value: f32, size: f32| {
            let min = size * (1.0 - zoom) - self.pan_padding;
            let max = self.pan_padding;
            value.clamp(min, max)
        };
        Vec2::new(
            clamp_axis(pan.x, self.viewport.x),
            clamp_axis(pan.y, self.viewport.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn controller() -> PanZoomController {
        let config = ZoomConfig {
            min_zoom: 1.0,
            max_zoom: 8.0,
            button_step: 1.2,
            ..ZoomConfig::default()
        };
        PanZoomController::new(&config, vec2(800.0, 600.0))
    }

    fn assert_clamped(c: &PanZoomController) {
        let zoom = c.zoom();
        let pan = c.pan();
        if zoom <= 1.0 {
            assert_eq!(pan, Vec2::ZERO);
            return;
        }
        let padding = ZoomConfig::default().pan_padding;
        let size = c.viewport();
        assert!(pan.x >= size.x * (1.0 - zoom) - padding - 1e-3, "{:?}", pan);
        assert!(pan.x <= padding + 1e-3, "{:?}", pan);
        assert!(pan.y >= size.y * (1.0 - zoom) - padding - 1e-3, "{:?}", pan);
        assert!(pan.y <= padding + 1e-3, "{:?}", pan);
    }

    #[test]
    fn test_zoom_around_center() {
        let mut c = controller();
        assert!(c.zoom_around_point(1.2, pos2(400.0, 300.0)));
        assert!((c.zoom() - 1.2).abs() < 1e-6);
        assert!((c.pan().x - -80.0).abs() < 1e-3);
        assert!((c.pan().y - -60.0).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_around_point_is_idempotent() {
        let mut c = controller();
        assert!(c.zoom_around_point(1.2, pos2(400.0, 300.0)));
        let before = c.transform();
        assert!(!c.zoom_around_point(1.2, pos2(400.0, 300.0)));
        assert_eq!(c.transform(), before);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut c = controller();
        c.zoom_around_point(2.0, pos2(400.0, 300.0));
        let anchor = pos2(500.0, 350.0);
        let view_point = c.transform().invert(anchor);
        c.zoom_around_point(3.0, anchor);
        let after = c.transform().apply(view_point);
        assert!((after.x - anchor.x).abs() < 1e-3);
        assert!((after.y - anchor.y).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut c = controller();
        assert!(c.zoom_around_point(100.0, pos2(0.0, 0.0)));
        assert_eq!(c.zoom(), 8.0);
        assert!(!c.zoom_around_point(50.0, pos2(0.0, 0.0)));
        assert!(c.zoom_around_point(0.1, pos2(0.0, 0.0)));
        assert_eq!(c.zoom(), 1.0);
        assert_eq!(c.pan(), Vec2::ZERO);
        assert!(!c.zoom_around_point(f32::NAN, pos2(0.0, 0.0)));
    }

    #[test]
    fn test_pan_disabled_at_native_scale() {
        let mut c = controller();
        assert!(!c.pan_by(vec2(10.0, 10.0)));
        assert_eq!(c.pan(), Vec2::ZERO);
    }

    #[test]
    fn test_pan_is_clamped() {
        let mut c = controller();
        c.zoom_around_point(2.0, pos2(400.0, 300.0));
        assert!(c.pan_by(vec2(10_000.0, -10_000.0)));
        let padding = ZoomConfig::default().pan_padding;
        assert_eq!(c.pan().x, padding);
        assert_eq!(c.pan().y, 600.0 * (1.0 - 2.0) - padding);
        // Already at the bound.
        assert!(!c.pan_by(vec2(10.0, 0.0)));
    }

    #[test]
    fn test_wheel_direction() {
        let mut c = controller();
        assert!(!c.wheel_zoom(0.0, pos2(100.0, 100.0)));
        assert!(c.wheel_zoom(-1.0, pos2(100.0, 100.0)));
        let zoomed = c.zoom();
        assert!(zoomed > 1.0);
        assert!(c.wheel_zoom(3.0, pos2(100.0, 100.0)));
        assert!(c.zoom() < zoomed);
    }

    #[test]
    fn test_buttons_and_reset() {
        let mut c = controller();
        assert!(c.zoom_in());
        assert!((c.zoom() - 1.2).abs() < 1e-6);
        assert!(c.zoom_out());
        assert!((c.zoom() - 1.0).abs() < 1e-4);
        assert!(!c.zoom_out());

        c.zoom_in();
        c.zoom_in();
        assert!(c.reset());
        assert_eq!(c.transform(), ViewTransform::default());
        assert!(!c.reset());
    }

    #[test]
    fn test_resize_reclamps() {
        let mut c = controller();
        c.zoom_around_point(2.0, pos2(800.0, 600.0));
        assert!(c.set_viewport(vec2(400.0, 300.0)));
        assert_clamped(&c);
        assert!(!c.set_viewport(vec2(400.0, 300.0)));
    }

    #[test]
    fn test_random_sequences_stay_clamped() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut c = controller();
        for _ in 0..500 {
            let point = pos2(rng.gen_range(-100.0..900.0), rng.gen_range(-100.0..700.0));
            match rng.gen_range(0..5) {
                0 => {
                    c.zoom_around_point(rng.gen_range(0.5..10.0), point);
                }
                1 => {
                    c.pan_by(vec2(rng.gen_range(-300.0..300.0), rng.gen_range(-300.0..300.0)));
                }
                2 => {
                    c.wheel_zoom(rng.gen_range(-2.0..2.0), point);
                }
                3 => {
                    c.zoom_in();
                }
                _ => {
                    c.zoom_out();
                }
            }
            assert_clamped(&c);
        }
    }

    #[test]
    fn test_transform_round_trip() {
        let t = ViewTransform {
            zoom: 2.5,
            pan: vec2(-120.0, 30.0),
        };
        let p = pos2(33.0, 44.0);
        let back = t.invert(t.apply(p));
        assert!((back.x - p.x).abs() < 1e-4);
        assert!((back.y - p.y).abs() < 1e-4);
    }
}
