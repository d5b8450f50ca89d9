//! Drag-to-pan gesture tracking.
//!
//! A press only becomes a drag once the pointer has moved past a small
//! threshold, so a slightly shaky click still selects a country. Crossing the
//! threshold arms a short window during which the next click is ignored: the
//! release at the end of a drag must not count as a selection.

use crate::config::ZoomConfig;
use eframe::egui::{Pos2, Vec2};
use web_time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DragGesture {
    threshold: f32,
    suppress_window: Duration,
    /// Press position while the pointer is down
    origin: Option<Pos2>,
    last: Pos2,
    dragging: bool,
    suppress_until: Option<Instant>,
}

impl DragGesture {
    pub fn new(config: &ZoomConfig) -> Self {
        Self {
            threshold: config.drag_threshold.max(0.0),
            suppress_window: Duration::from_millis(config.click_suppress_ms),
            origin: None,
            last: Pos2::ZERO,
            dragging: false,
            suppress_until: None,
        }
    }

    pub fn press(&mut self, pos: Pos2) {
        self.origin = Some(pos);
        self.last = pos;
        self.dragging = false;
    }

    /// Feeds a pointer move; returns the pan delta once dragging.
    ///
    /// The first delta is measured from the press position so no movement is
    /// lost to the threshold.
    pub fn move_to(&mut self, pos: Pos2, now: Instant) -> Option<Vec2> {
        let origin = self.origin?;

        if !self.dragging {
            if (pos - origin).length() < self.threshold {
                return None;
            }
            self.dragging = true;
            self.suppress_until = Some(now + self.suppress_window);
        }

        let delta = pos - self.last;
        self.last = pos;
        (delta != Vec2::ZERO).then_some(delta)
    }

    /// Ends the gesture; returns true if it was a drag.
    pub fn release(&mut self, now: Instant) -> bool {
        let was_dragging = self.dragging;
        if was_dragging {
            self.suppress_until = Some(now + self.suppress_window);
        }
        self.origin = None;
        self.dragging = false;
        was_dragging
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_pressed(&self) -> bool {
        self.origin.is_some()
    }

    /// True if a click at `now` is the tail end of a drag.
    pub fn should_suppress_click(&self, now: Instant) -> bool {
        self.suppress_until.is_some_and(|until| now < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    fn gesture() -> DragGesture {
        DragGesture::new(&ZoomConfig {
            drag_threshold: 4.0,
            click_suppress_ms: 250,
            ..ZoomConfig::default()
        })
    }

    #[test]
    fn test_small_moves_are_not_drags() {
        let now = Instant::now();
        let mut g = gesture();
        g.press(pos2(10.0, 10.0));
        assert_eq!(g.move_to(pos2(12.0, 11.0), now), None);
        assert!(!g.is_dragging());
        assert!(!g.release(now));
        assert!(!g.should_suppress_click(now));
    }

    #[test]
    fn test_first_delta_is_from_press() {
        let now = Instant::now();
        let mut g = gesture();
        g.press(pos2(10.0, 10.0));
        assert_eq!(g.move_to(pos2(12.0, 10.0), now), None);
        assert_eq!(g.move_to(pos2(16.0, 10.0), now), Some(vec2(6.0, 0.0)));
        assert_eq!(g.move_to(pos2(16.0, 13.0), now), Some(vec2(0.0, 3.0)));
        assert!(g.is_dragging());
    }

    #[test]
    fn test_drag_suppresses_following_click() {
        let now = Instant::now();
        let mut g = gesture();
        g.press(pos2(0.0, 0.0));
        g.move_to(pos2(20.0, 0.0), now);
        assert!(g.release(now));
        assert!(g.should_suppress_click(now + Duration::from_millis(100)));
        assert!(!g.should_suppress_click(now + Duration::from_millis(300)));
    }

    #[test]
    fn test_moves_without_press_are_ignored() {
        let mut g = gesture();
        assert_eq!(g.move_to(pos2(100.0, 100.0), Instant::now()), None);
    }
}
