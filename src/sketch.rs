use anyhow::{Context, Result};
use glam::{Mat4, Vec3};

use crate::camera::PerspectiveCamera;
use crate::config::SketchSettings;
use crate::controls::OrbitControls;
use crate::core::{handle_resize, Controller, FrameScheduler, RenderHook, RenderSurface, TickReport, Viewport};
use crate::flow::{CurveFlow, FlowView};
use crate::frame::FrameInfo;
use crate::loaders::{AssetEvent, AssetKind, AssetLocation, Model};
use crate::math::CatmullRomCurve;
use crate::overlay::{AssetStatus, StatusBoard};
use crate::scene::{ObjectId, Scene, Transform};

/// Draws a scene; the GPU renderer in the app, a recorder in tests
pub trait SceneRenderer: RenderSurface {
    fn draw(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        status: &StatusBoard,
        frame: &FrameInfo,
    ) -> Result<()>;
}

/// Receives asset failures so they never pass silently
pub trait ErrorReporter {
    fn report(&mut self, kind: AssetKind, location: &AssetLocation, error: &anyhow::Error);
}

/// Logs failures at error level
#[derive(Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&mut self, kind: AssetKind, location: &AssetLocation, error: &anyhow::Error) {
        log::error!("failed to load {} from {}: {:#}", kind, location, error);
    }
}

/// Render-side state: the scheduler's render hook
pub struct Stage<R: SceneRenderer> {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub status: StatusBoard,
    pub renderer: R,
}

impl<R: SceneRenderer> RenderHook for Stage<R> {
    fn render(&mut self, frame: &FrameInfo) -> Result<()> {
        self.status.record_frame(frame);
        self.renderer.draw(&self.scene, &self.camera, &self.status, frame)
    }
}

/// The whole demo: scene setup, asset completion and the fish task
pub struct Sketch<R: SceneRenderer> {
    settings: SketchSettings,
    scheduler: FrameScheduler<Stage<R>>,
    controls: OrbitControls,
    reporter: Box<dyn ErrorReporter>,
    flow: Option<FlowView>,
}

impl<R: SceneRenderer> Sketch<R> {
    pub fn new(settings: SketchSettings, renderer: R, viewport: Viewport, reporter: Box<dyn ErrorReporter>) -> Self {
        let scene = Scene::from_settings(&settings.scene);
        let aspect = if viewport.is_empty() { 1.0 } else { viewport.aspect() };
        let camera = PerspectiveCamera::from_settings(&settings.camera, aspect);
        let controls = OrbitControls::for_camera(&camera);

        let mut stage = Stage {
            scene,
            camera,
            status: StatusBoard::new(),
            renderer,
        };
        handle_resize(viewport, &mut stage.camera, &mut stage.renderer);

        let scheduler = FrameScheduler::new(stage).with_policy(settings.failure_policy);

        Self {
            settings,
            scheduler,
            controls,
            reporter,
            flow: None,
        }
    }

    pub fn start(&mut self) -> bool {
        self.scheduler.start()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// One tick: every task, then one render
    pub fn frame(&mut self, frame: &FrameInfo) -> Result<TickReport> {
        let task_count = self.scheduler.task_count();
        let laps = self.flow.as_ref().map(FlowView::laps);

        let status = &mut self.scheduler.hook_mut().status;
        status.set_task_count(task_count);
        if let Some(laps) = laps {
            status.set_laps(laps);
        }

        self.scheduler.tick(frame)
    }

    pub fn resize(&mut self, viewport: Viewport) -> bool {
        let stage = self.scheduler.hook_mut();
        handle_resize(viewport, &mut stage.camera, &mut stage.renderer)
    }

    /// Feed pointer input to the orbit controls; true if the camera moved
    pub fn update_controls(&mut self, input: &dyn Controller, viewport_height: f32) -> bool {
        let camera = &mut self.scheduler.hook_mut().camera;
        self.controls.update(camera, input, viewport_height)
    }

    /// What to load and from where
    pub fn asset_requests(&self) -> [(AssetKind, AssetLocation); 2] {
        [
            (AssetKind::Fish, AssetLocation::parse(&self.settings.assets.fish)),
            (AssetKind::Landscape, AssetLocation::parse(&self.settings.assets.landscape)),
        ]
    }

    /// Completion of a load. Failures are reported and leave the object out;
    /// nothing here stops the loop.
    pub fn on_asset(&mut self, event: AssetEvent) {
        let AssetEvent {
            kind,
            location,
            outcome,
        } = event;

        let placed = outcome.and_then(|model| match kind {
            AssetKind::Fish => self.add_fish(&model),
            AssetKind::Landscape => self.add_landscape(&model),
        });

        let status = match placed {
            Ok(id) => {
                log::info!("{} ready from {} as object {:?}", kind, location, id);
                AssetStatus::Loaded
            }
            Err(error) => {
                self.reporter.report(kind, &location, &error);
                AssetStatus::Failed(format!("{:#}", error))
            }
        };
        self.scheduler.hook_mut().status.set_asset(kind, status);
    }

    /// Bake the fish into shape, bend it along the loop and register its task
    fn add_fish(&mut self, model: &Model) -> Result<ObjectId> {
        let fish_settings = &self.settings.fish;
        let node = model.first_root().context("Fish model has no top-level node")?;
        let mut mesh = node.mesh.clone().context("Fish model's first node has no mesh")?;

        let matrix = Mat4::from_translation(node.translation)
            * Mat4::from_rotation_x(fish_settings.rotation_x)
            * Mat4::from_scale(Vec3::splat(fish_settings.scale));
        mesh.apply_matrix(matrix);

        let curve = CatmullRomCurve::closed(fish_settings.curve_points()).context("Failed to build the fish's path")?;
        let mut flow = CurveFlow::new(&curve);
        let view = flow.view();

        let stage = self.scheduler.hook_mut();
        let id = stage.scene.add_flow("fish", mesh, view.clone());

        let pacing = fish_settings.pacing;
        let increment = fish_settings.increment;
        self.scheduler.register(move |frame: &FrameInfo| {
            flow.move_along_curve(pacing.step(increment, frame.delta));
            Ok(())
        });

        self.flow = Some(view);
        Ok(id)
    }

    fn add_landscape(&mut self, model: &Model) -> Result<ObjectId> {
        let mesh = model.flatten();
        if let Some(bounds) = mesh.bounds() {
            log::debug!(
                "landscape: {} triangles, model extent {:?}",
                mesh.triangle_count(),
                bounds.size()
            );
        }
        let transform = Transform::from_translation_scale(
            Vec3::from_array(self.settings.landscape.position),
            self.settings.landscape.scale,
        );
        Ok(self.scheduler.hook_mut().scene.add("landscape", mesh, transform))
    }

    pub fn title(&self) -> String {
        self.status().window_title(&self.settings.window.title)
    }

    pub fn settings(&self) -> &SketchSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &FrameScheduler<Stage<R>> {
        &self.scheduler
    }

    /// Extra per-frame work beyond the fish, e.g. from a host application
    pub fn register<F>(&mut self, task: F)
    where
        F: FnMut(&FrameInfo) -> Result<()> + 'static,
    {
        self.scheduler.register(task);
    }

    pub fn scene(&self) -> &Scene {
        &self.scheduler.hook().scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.scheduler.hook().camera
    }

    pub fn status(&self) -> &StatusBoard {
        &self.scheduler.hook().status
    }

    pub fn renderer(&self) -> &R {
        &self.scheduler.hook().renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.scheduler.hook_mut().renderer
    }

    pub fn flow(&self) -> Option<&FlowView> {
        self.flow.as_ref()
    }
}
