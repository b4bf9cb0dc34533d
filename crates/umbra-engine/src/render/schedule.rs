//! Recompute decisions, frame to frame.
//!
//! The SDF and lighting passes are expensive and only depend on the scene and
//! the viewport size, so their output is reused until either changes.

use crate::coords::Viewport;

/// What the current frame has to do before presenting.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FramePlan {
    pub viewport: Viewport,
    /// Viewport-sized resources must be recreated before any pass is recorded.
    pub resize: bool,
    /// SDF + lighting must run.
    pub recompute: bool,
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    last_viewport: Option<Viewport>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans one frame. `None` means the frame is skipped (zero-area viewport);
    /// the previous size is kept so a restore to it does not count as a resize.
    pub fn plan(&mut self, viewport: Viewport, scene_dirty: bool) -> Option<FramePlan> {
        if !viewport.is_valid() {
            return None;
        }

        let resize = self.last_viewport != Some(viewport);
        if resize {
            log::debug!("viewport resized to {}x{}", viewport.width, viewport.height);
            self.last_viewport = Some(viewport);
        }

        Some(FramePlan { viewport, resize, recompute: resize || scene_dirty })
    }

    /// Forces the next frame to recreate viewport-sized resources.
    pub fn invalidate(&mut self) {
        self.last_viewport = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VP: Viewport = Viewport::new(800, 600);

    #[test]
    fn first_frame_resizes_and_recomputes() {
        let mut s = FrameScheduler::new();
        let plan = s.plan(VP, false).unwrap();
        assert!(plan.resize);
        assert!(plan.recompute);
    }

    #[test]
    fn clean_ticks_recompute_exactly_once() {
        let mut s = FrameScheduler::new();
        let recomputes = (0..2).filter(|_| s.plan(VP, false).unwrap().recompute).count();
        assert_eq!(recomputes, 1);
    }

    #[test]
    fn dirty_scene_recomputes_without_resize() {
        let mut s = FrameScheduler::new();
        s.plan(VP, false);
        let plan = s.plan(VP, true).unwrap();
        assert!(!plan.resize);
        assert!(plan.recompute);
    }

    #[test]
    fn resize_forces_recompute_on_clean_scene() {
        let mut s = FrameScheduler::new();
        s.plan(VP, false);
        let plan = s.plan(Viewport::new(1024, 600), false).unwrap();
        assert!(plan.resize);
        assert!(plan.recompute);
    }

    #[test]
    fn zero_area_skips_and_keeps_previous_size() {
        let mut s = FrameScheduler::new();
        s.plan(VP, false);
        assert!(s.plan(Viewport::new(0, 0), true).is_none());

        let plan = s.plan(VP, false).unwrap();
        assert!(!plan.resize);
        assert!(!plan.recompute);
    }

    #[test]
    fn invalidate_forces_resize() {
        let mut s = FrameScheduler::new();
        s.plan(VP, false);
        s.invalidate();
        assert!(s.plan(VP, false).unwrap().resize);
    }
}
