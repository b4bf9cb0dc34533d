use crate::coords::{ColorRgba, Viewport};
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{Scene, ShapeKind};

use super::error::{CapacityError, RenderError};
use super::immediate::ImmediateGeometry;
use super::line::LineRenderer;
use super::marshal::{Marshaler, OverflowPolicy, SlotCapacities};
use super::passes::common::{FrameTargets, SlotBuffers, check_uniforms};
use super::passes::lighting::LightingPass;
use super::passes::present::PresentPass;
use super::passes::sdf::SdfPass;
use super::records::RecordLayouts;
use super::schedule::{FramePlan, FrameScheduler};

/// Scene renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial rect slot capacity, in records.
    pub max_rects: usize,
    /// Initial circle slot capacity, in records.
    pub max_circles: usize,
    /// Initial light slot capacity, in records.
    pub max_lights: usize,
    pub overflow: OverflowPolicy,
    /// Swapchain clear colour behind the present pass.
    pub clear_color: ColorRgba,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_rects: 128,
            max_circles: 128,
            max_lights: 128,
            overflow: OverflowPolicy::Grow,
            clear_color: ColorRgba::black(),
        }
    }
}

/// What a call to [`SceneRenderer::render`] did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    /// SDF and lighting passes were recorded.
    pub recomputed: bool,
    /// Viewport-sized resources were recreated.
    pub resized: bool,
    /// Records currently in each device slot.
    pub rects: usize,
    pub circles: usize,
    pub lights: usize,
    /// Overlay segments drawn.
    pub lines: usize,
}

/// CPU half of a frame, decided before any GPU work.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct FramePrep {
    plan: FramePlan,
    /// The scene was packed into the slots; SDF and lighting must be recorded.
    packed: bool,
}

impl FramePrep {
    /// Marks the scene clean once its passes are recorded.
    fn settle(&self, scene: &mut Scene) {
        if self.packed {
            scene.set_dirty(false);
        }
    }
}

/// Device resources, created on the first frame.
struct GpuState {
    sdf: SdfPass,
    lighting: LightingPass,
    present: PresentPass,

    rects: SlotBuffers,
    circles: SlotBuffers,
    lights: SlotBuffers,

    targets: Option<FrameTargets>,
}

impl GpuState {
    fn new(ctx: &RenderCtx<'_>, marshaler: &Marshaler) -> Self {
        Self {
            sdf: SdfPass::new(ctx.device),
            lighting: LightingPass::new(ctx.device),
            present: PresentPass::new(ctx.device, ctx.surface_format),
            rects: SlotBuffers::new(ctx.device, marshaler.slot(ShapeKind::Rect)),
            circles: SlotBuffers::new(ctx.device, marshaler.slot(ShapeKind::Circle)),
            lights: SlotBuffers::new(ctx.device, marshaler.slot(ShapeKind::Light)),
            targets: None,
        }
    }

    /// Drops every bind group that references viewport-sized buffers.
    fn invalidate_bindings(&mut self) {
        self.sdf.invalidate();
        self.lighting.invalidate();
        self.present.invalidate();
    }

    /// Reallocates slot buffers whose capacity changed and uploads all slots.
    fn upload_slots(&mut self, ctx: &RenderCtx<'_>, marshaler: &Marshaler) {
        for kind in ShapeKind::ALL {
            let slot = marshaler.slot(kind);
            let buffers = match kind {
                ShapeKind::Rect => &mut self.rects,
                ShapeKind::Circle => &mut self.circles,
                ShapeKind::Light => &mut self.lights,
            };
            if !buffers.fits(slot) {
                *buffers = SlotBuffers::new(ctx.device, slot);
                match kind {
                    ShapeKind::Light => self.lighting.invalidate(),
                    ShapeKind::Rect | ShapeKind::Circle => self.sdf.invalidate(),
                }
                log::debug!("{kind} buffer reallocated for {} records", slot.capacity());
            }
            buffers.upload(ctx.queue, slot);
        }
    }
}

/// Renders a [`Scene`] through the SDF → lighting → present → overlay passes.
///
/// The SDF and lighting passes only run when the scene is dirty or the
/// viewport changed; otherwise the previous colour buffer is presented again.
/// All passes of a frame are recorded into the target's single encoder.
pub struct SceneRenderer {
    config: RendererConfig,
    marshaler: Marshaler,
    scheduler: FrameScheduler,
    lines: LineRenderer,
    gpu: Option<GpuState>,

    /// Last capacity failure, logged once until it changes.
    last_capacity_error: Option<CapacityError>,
}

impl SceneRenderer {
    /// Computes record layouts from the shader declarations. No GPU work
    /// happens until the first [`SceneRenderer::render`].
    pub fn new(config: RendererConfig) -> Result<Self, RenderError> {
        let layouts = RecordLayouts::builtin()?;
        check_uniforms(&layouts)?;

        log::debug!(
            "record strides: rect {} / circle {} / light {} bytes",
            layouts.rect.stride,
            layouts.circle.stride,
            layouts.light.stride
        );

        let capacities = SlotCapacities {
            rects: config.max_rects,
            circles: config.max_circles,
            lights: config.max_lights,
        };
        let marshaler = Marshaler::new(layouts, capacities, config.overflow);

        Ok(Self {
            config,
            marshaler,
            scheduler: FrameScheduler::new(),
            lines: LineRenderer::new(),
            gpu: None,
            last_capacity_error: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn marshaler(&self) -> &Marshaler {
        &self.marshaler
    }

    /// Forces the next frame to recreate viewport-sized resources and recompute.
    pub fn invalidate(&mut self) {
        self.scheduler.invalidate();
    }

    /// Records one frame.
    ///
    /// Clears the scene's dirty flag once its SDF and lighting passes are
    /// recorded. `overlay` is always flushed, even for skipped frames.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        scene: &mut Scene,
        overlay: &mut ImmediateGeometry,
    ) -> FrameStats {
        let mut stats = FrameStats::default();

        let Some(prep) = self.prepare(ctx.viewport, scene) else {
            overlay.flush(|_| {});
            return stats;
        };

        self.ensure_gpu(ctx);
        let Some(gpu) = self.gpu.as_mut() else {
            overlay.flush(|_| {});
            return stats;
        };

        // ── resize ────────────────────────────────────────────────────────
        if prep.plan.resize || gpu.targets.is_none() {
            gpu.invalidate_bindings();
            gpu.targets = None;
            match FrameTargets::new(ctx.device, ctx.queue, prep.plan.viewport) {
                Ok(targets) => gpu.targets = Some(targets),
                Err(e) => {
                    log::error!("frame skipped: {e}");
                    self.scheduler.invalidate();
                    overlay.flush(|_| {});
                    return stats;
                }
            }
            stats.resized = true;
        }

        if prep.packed {
            gpu.upload_slots(ctx, &self.marshaler);
        }

        let Some(targets) = gpu.targets.as_ref() else {
            overlay.flush(|_| {});
            return stats;
        };

        // ── sdf + lighting ────────────────────────────────────────────────
        if prep.packed {
            gpu.sdf.ensure_bindings(ctx.device, targets, &gpu.rects, &gpu.circles);
            gpu.lighting.ensure_bindings(ctx.device, targets, &gpu.lights);

            gpu.sdf.record(target.encoder, targets);
            gpu.lighting.record(target.encoder, targets);

            prep.settle(scene);
            stats.recomputed = true;
        }

        // ── present ───────────────────────────────────────────────────────
        gpu.present.ensure_bindings(ctx.device, targets);
        gpu.present.record(target, self.config.clear_color);

        // ── overlay ───────────────────────────────────────────────────────
        stats.lines = self.lines.render(ctx, target, overlay);

        stats.rects = self.marshaler.slot(ShapeKind::Rect).live();
        stats.circles = self.marshaler.slot(ShapeKind::Circle).live();
        stats.lights = self.marshaler.slot(ShapeKind::Light).live();
        stats
    }

    /// Plans the frame and, when a recompute is due, packs the scene.
    /// `None` skips the frame.
    fn prepare(&mut self, viewport: Viewport, scene: &Scene) -> Option<FramePrep> {
        let plan = self.scheduler.plan(viewport, scene.is_dirty())?;
        let packed = plan.recompute && self.pack(scene);
        Some(FramePrep { plan, packed })
    }

    fn pack(&mut self, scene: &Scene) -> bool {
        match self.marshaler.pack(scene) {
            Ok(report) => {
                self.last_capacity_error = None;
                if report.dropped() > 0 {
                    log::debug!("{} objects not rendered this frame", report.dropped());
                }
                true
            }
            Err(e) => {
                // Scene stays dirty; the previous result is presented.
                if self.last_capacity_error != Some(e) {
                    log::error!("scene not rendered: {e}");
                    self.last_capacity_error = Some(e);
                }
                false
            }
        }
    }

    fn ensure_gpu(&mut self, ctx: &RenderCtx<'_>) {
        match self.gpu.as_mut() {
            None => {
                self.gpu = Some(GpuState::new(ctx, &self.marshaler));
                log::info!("scene renderer initialized ({:?})", ctx.surface_format);
            }
            Some(gpu) if gpu.present.format() != ctx.surface_format => {
                gpu.present = PresentPass::new(ctx.device, ctx.surface_format);
                log::debug!("present pipeline rebuilt for {:?}", ctx.surface_format);
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::scene::SceneObject;

    #[test]
    fn default_config() {
        let config = RendererConfig::default();
        assert_eq!((config.max_rects, config.max_circles, config.max_lights), (128, 128, 128));
        assert_eq!(config.overflow, OverflowPolicy::Grow);
    }

    #[test]
    fn new_sizes_slots_from_config() {
        let renderer = SceneRenderer::new(RendererConfig {
            max_rects: 3,
            max_circles: 0,
            max_lights: 16,
            overflow: OverflowPolicy::Reject,
            ..RendererConfig::default()
        })
        .unwrap();

        let m = renderer.marshaler();
        assert_eq!(m.slot(ShapeKind::Rect).capacity(), 3);
        assert_eq!(m.slot(ShapeKind::Circle).capacity(), 1);
        assert_eq!(m.slot(ShapeKind::Light).byte_len(), 16 * 32);
        assert_eq!(m.policy(), OverflowPolicy::Reject);
    }

    const VP: Viewport = Viewport::new(800, 600);

    fn circle(x: f32) -> SceneObject {
        SceneObject::circle(Vec2::new(x, 10.0), 5.0)
    }

    #[test]
    fn recompute_clears_dirty_flag_once() {
        let mut renderer = SceneRenderer::new(RendererConfig::default()).unwrap();
        let mut scene = Scene::new();
        scene.add(circle(1.0)).unwrap();

        let prep = renderer.prepare(VP, &scene).unwrap();
        assert!(prep.plan.resize);
        assert!(prep.packed);
        prep.settle(&mut scene);
        assert!(!scene.is_dirty());
        assert_eq!(renderer.marshaler().slot(ShapeKind::Circle).live(), 1);

        let prep = renderer.prepare(VP, &scene).unwrap();
        assert!(!prep.plan.resize);
        assert!(!prep.packed);
    }

    #[test]
    fn rejected_scene_stays_dirty_until_it_fits() {
        let mut renderer = SceneRenderer::new(RendererConfig {
            max_circles: 1,
            overflow: OverflowPolicy::Reject,
            ..RendererConfig::default()
        })
        .unwrap();
        let mut scene = Scene::new();
        scene.add(circle(1.0)).unwrap();
        let extra = scene.add(circle(2.0)).unwrap();

        for _ in 0..2 {
            let prep = renderer.prepare(VP, &scene).unwrap();
            assert!(prep.plan.recompute);
            assert!(!prep.packed);
            prep.settle(&mut scene);
            assert!(scene.is_dirty());
            assert!(matches!(
                renderer.last_capacity_error,
                Some(CapacityError { kind: ShapeKind::Circle, .. })
            ));
        }

        scene.remove(extra);
        let prep = renderer.prepare(VP, &scene).unwrap();
        assert!(prep.packed);
        assert_eq!(renderer.last_capacity_error, None);
        prep.settle(&mut scene);
        assert!(!scene.is_dirty());
    }

    #[test]
    fn resize_recomputes_a_clean_scene() {
        let mut renderer = SceneRenderer::new(RendererConfig::default()).unwrap();
        let mut scene = Scene::new();
        renderer.prepare(VP, &scene).unwrap().settle(&mut scene);
        assert!(!scene.is_dirty());

        let prep = renderer.prepare(Viewport::new(1024, 768), &scene).unwrap();
        assert!(prep.plan.resize);
        assert!(prep.packed);
    }

    #[test]
    fn zero_area_frame_is_skipped() {
        let mut renderer = SceneRenderer::new(RendererConfig::default()).unwrap();
        let scene = Scene::new();
        assert_eq!(renderer.prepare(Viewport::new(0, 600), &scene), None);
        assert!(scene.is_dirty());
    }
}
