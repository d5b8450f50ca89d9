//! Frame-coalesced render requests.
//!
//! State changes call [`RenderScheduler::request_render`] as often as they
//! like; the frame loop consumes the request once with
//! [`RenderScheduler::take_pending`] and rebuilds the draw list at most once
//! per frame.

#[derive(Debug, Default, Clone)]
pub struct RenderScheduler {
    pending: bool,
    renders: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a render; returns true only if none was pending.
    pub fn request_render(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consumes the pending request at the start of a frame.
    pub fn take_pending(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.renders += 1;
        true
    }

    /// Number of renders performed.
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}
