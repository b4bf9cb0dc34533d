use anyhow::Result;
use glam::{Vec2, Vec4};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use umbra_engine::core::{App, AppControl, FrameCtx};
use umbra_engine::device::GpuInit;
use umbra_engine::logging::{LoggingConfig, init_logging};
use umbra_engine::render::{
    ImmediateGeometry, OUTLINE_IDLE, OUTLINE_SELECTED, RendererConfig, SceneRenderer,
};
use umbra_engine::scene::{ObjectId, Scene, SceneHistory, SceneObject, ShapeKind};
use umbra_engine::window::{Runtime, RuntimeConfig};

/// Distance of the seeded lights from the window corners, in pixels.
const LIGHT_INSET: f32 = 90.0;

/// Degrees per frame for the spinning rect.
const SPIN_SPEED: f32 = 0.5;

struct Studio {
    scene: Scene,
    history: SceneHistory,
    renderer: SceneRenderer,
    overlay: ImmediateGeometry,

    spinner: Option<ObjectId>,
    seeded_for: Option<(u32, u32)>,
    paused: bool,
}

impl Studio {
    fn new() -> Result<Self> {
        Ok(Self {
            scene: Scene::new(),
            history: SceneHistory::new(),
            renderer: SceneRenderer::new(RendererConfig::default())?,
            overlay: ImmediateGeometry::new(),
            spinner: None,
            seeded_for: None,
            paused: false,
        })
    }

    /// Four lights in the corners plus a handful of shapes around the centre.
    fn seed(&mut self, width: u32, height: u32) -> Result<()> {
        let (w, h) = (width as f32, height as f32);
        let centre = Vec2::new(w, h) * 0.5;

        self.scene.clear();
        let lights = [
            (Vec2::new(LIGHT_INSET, LIGHT_INSET), Vec4::new(1.0, 0.55, 0.3, 1.0)),
            (Vec2::new(w - LIGHT_INSET, LIGHT_INSET), Vec4::new(0.3, 0.6, 1.0, 1.0)),
            (Vec2::new(LIGHT_INSET, h - LIGHT_INSET), Vec4::new(0.4, 1.0, 0.5, 1.0)),
            (Vec2::new(w - LIGHT_INSET, h - LIGHT_INSET), Vec4::new(1.0, 1.0, 1.0, 1.0)),
        ];
        for (position, color) in lights {
            self.scene.add(SceneObject::light(position, color))?;
        }

        self.scene.add(SceneObject::circle(centre + Vec2::new(-220.0, -40.0), 60.0))?;
        self.scene.add(SceneObject::circle(centre + Vec2::new(180.0, 120.0), 35.0))?;
        self.scene.add(
            SceneObject::rect(centre + Vec2::new(200.0, -110.0), Vec2::new(140.0, 40.0))
                .with_rotation(-15.0),
        )?;
        let spinner = self.scene.add(SceneObject::rect(centre, Vec2::new(90.0, 90.0)))?;
        self.spinner = Some(spinner);

        self.history.clear();
        self.history.record(&self.scene);
        self.seeded_for = Some((width, height));

        log::info!("scene seeded with {} objects for {width}x{height}", self.scene.len());
        Ok(())
    }

    fn draw_overlay(&mut self) {
        for obj in self.scene.iter() {
            let color = if obj.id == self.spinner { OUTLINE_SELECTED } else { OUTLINE_IDLE };
            self.overlay.draw_object_outline(obj, color);
        }
    }

    fn on_key(&mut self, key: KeyCode) -> AppControl {
        match key {
            KeyCode::Escape => return AppControl::Exit,
            KeyCode::Space => self.paused = !self.paused,
            KeyCode::Delete => {
                if let Some(id) = self.spinner.take() {
                    self.history.record(&self.scene);
                    self.scene.remove(id);
                }
            }
            KeyCode::KeyZ => {
                if let Err(e) = self.history.undo(&mut self.scene) {
                    log::error!("undo failed: {e}");
                }
                self.relink_spinner();
            }
            KeyCode::KeyY => {
                if let Err(e) = self.history.redo(&mut self.scene) {
                    log::error!("redo failed: {e}");
                }
                self.relink_spinner();
            }
            KeyCode::KeyS => match self.scene.serialize() {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("serialize failed: {e}"),
            },
            _ => {}
        }
        AppControl::Continue
    }

    /// The last rect added is the one that spins.
    fn relink_spinner(&mut self) {
        self.spinner = self.scene.iter_of_kind(ShapeKind::Rect).last().and_then(|o| o.id);
    }
}

impl App for Studio {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.physical_key {
                    PhysicalKey::Code(code) => self.on_key(code),
                    PhysicalKey::Unidentified(_) => AppControl::Continue,
                }
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let size = ctx.window.physical_size();
        if self.seeded_for.is_none() && size.0 > 0 && size.1 > 0 {
            if let Err(e) = self.seed(size.0, size.1) {
                log::error!("failed to seed scene: {e}");
                return AppControl::Exit;
            }
        }

        if !self.paused
            && let Some(obj) = self.spinner.and_then(|id| self.scene.get_mut(id))
        {
            obj.rotation = (obj.rotation + SPIN_SPEED) % 360.0;
        }

        self.draw_overlay();

        let (scene, renderer, overlay) = (&mut self.scene, &mut self.renderer, &mut self.overlay);
        let control = ctx.render(|rctx, target| {
            let stats = renderer.render(rctx, target, scene, overlay);
            if stats.resized {
                log::debug!("renderer resized to {:?}", rctx.viewport);
            }
        });
        // A skipped frame never reaches the renderer.
        overlay.flush(|_| {});

        if ctx.frame_index % 600 == 0 {
            log::debug!("frame {} ({} objects)", ctx.frame_index, self.scene.len());
        }
        control
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let studio = Studio::new()?;
    Runtime::run(
        RuntimeConfig { title: "umbra studio".to_string(), ..RuntimeConfig::default() },
        GpuInit::default(),
        studio,
    )
}
