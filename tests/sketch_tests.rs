use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use clap::Parser;
use fish_flow::camera::PerspectiveCamera;
use fish_flow::cli::Cli;
use fish_flow::config::{AnimationPacing, SketchSettings};
use fish_flow::core::{RenderSurface, Viewport};
use fish_flow::loaders::{load_model_file, AssetEvent, AssetKind, AssetLocation};
use fish_flow::overlay::{AssetStatus, StatusBoard};
use fish_flow::scene::Scene;
use fish_flow::{ErrorReporter, FrameInfo, SceneRenderer, Sketch};

#[cfg(test)]
mod sketch_tests {
    use super::*;

    /// Remembers what each draw saw instead of touching a GPU
    #[derive(Default)]
    struct RecordingRenderer {
        size: (u32, u32),
        ratio: f64,
        draws: Vec<Vec<String>>,
    }

    impl RenderSurface for RecordingRenderer {
        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn set_pixel_ratio(&mut self, ratio: f64) {
            self.ratio = ratio;
        }
    }

    impl SceneRenderer for RecordingRenderer {
        fn draw(&mut self, scene: &Scene, _camera: &PerspectiveCamera, _status: &StatusBoard, _frame: &FrameInfo) -> Result<()> {
            self.draws.push(scene.objects().iter().map(|o| o.name.clone()).collect());
            Ok(())
        }
    }

    type Reports = Rc<RefCell<Vec<(AssetKind, String)>>>;

    struct RecordingReporter {
        reports: Reports,
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&mut self, kind: AssetKind, _location: &AssetLocation, error: &anyhow::Error) {
            self.reports.borrow_mut().push((kind, format!("{:#}", error)));
        }
    }

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/two_nodes.gltf")
    }

    fn loaded(kind: AssetKind) -> AssetEvent {
        AssetEvent {
            kind,
            location: AssetLocation::Local(fixture()),
            outcome: load_model_file(fixture()),
        }
    }

    fn failed(kind: AssetKind, message: &str) -> AssetEvent {
        AssetEvent {
            kind,
            location: AssetLocation::parse("https://example.invalid/model.glb"),
            outcome: Err(anyhow!("{}", message)),
        }
    }

    fn sketch() -> (Sketch<RecordingRenderer>, Reports) {
        sketch_with(SketchSettings::default())
    }

    fn sketch_with(settings: SketchSettings) -> (Sketch<RecordingRenderer>, Reports) {
        let reports: Reports = Rc::new(RefCell::new(Vec::new()));
        let sketch = Sketch::new(
            settings,
            RecordingRenderer::default(),
            Viewport::new(800, 600, 1.0),
            Box::new(RecordingReporter {
                reports: Rc::clone(&reports),
            }),
        );
        (sketch, reports)
    }

    fn run(sketch: &mut Sketch<RecordingRenderer>, frames: u64) {
        for n in 0..frames {
            let report = sketch.frame(&FrameInfo::new(n, n as f32 / 60.0, 1.0 / 60.0)).unwrap();
            assert!(report.rendered);
            assert_eq!(report.failures, 0);
        }
    }

    #[test]
    fn test_initial_viewport_sets_aspect_and_buffer() {
        let (sketch, _) = sketch();
        assert!((sketch.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(sketch.renderer().size, (800, 600));
        assert_eq!(sketch.renderer().ratio, 1.0);
    }

    #[test]
    fn test_renders_before_any_asset_arrives() {
        let (mut sketch, _) = sketch();
        assert!(sketch.start());
        run(&mut sketch, 3);

        assert_eq!(sketch.renderer().draws.len(), 3);
        assert!(sketch.renderer().draws.iter().all(|names| names.is_empty()));
        assert_eq!(sketch.scheduler().task_count(), 0);
    }

    #[test]
    fn test_fish_failure_leaves_landscape_running() {
        let (mut sketch, reports) = sketch();
        sketch.start();

        sketch.on_asset(failed(AssetKind::Fish, "HTTP 404 Not Found"));
        sketch.on_asset(loaded(AssetKind::Landscape));
        run(&mut sketch, 5);

        assert_eq!(sketch.scheduler().task_count(), 0);
        assert!(sketch.flow().is_none());
        assert!(sketch.scene().find("fish").is_none());
        assert!(sketch.scene().find("landscape").is_some());
        assert_eq!(sketch.renderer().draws.last().unwrap(), &vec!["landscape".to_string()]);

        let reports = reports.borrow();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, AssetKind::Fish);
        assert!(reports[0].1.contains("404"));

        assert!(matches!(sketch.status().asset(AssetKind::Fish), Some(AssetStatus::Failed(_))));
        assert_eq!(sketch.status().asset(AssetKind::Landscape), Some(&AssetStatus::Loaded));
        assert_eq!(sketch.title(), "fish-flow (failed to load: fish)");
    }

    #[test]
    fn test_fish_registers_one_task_that_moves_it() {
        let (mut sketch, reports) = sketch();
        sketch.start();
        sketch.on_asset(loaded(AssetKind::Fish));

        assert_eq!(sketch.scheduler().task_count(), 1);
        let fish = sketch.scene().find("fish").unwrap();
        assert!(fish.is_flow());

        run(&mut sketch, 10);
        let flow = sketch.flow().unwrap();
        assert!((flow.offset() - 0.01).abs() < 1e-9);
        assert_eq!(sketch.status().task_count(), 1);

        assert!(reports.borrow().is_empty());
        assert_eq!(sketch.title(), "fish-flow");
    }

    fn swim_for_one_second(pacing: AnimationPacing, hz: u64) -> f64 {
        let mut settings = SketchSettings::default();
        settings.fish.pacing = pacing;
        let (mut sketch, _) = sketch_with(settings);
        sketch.on_asset(loaded(AssetKind::Fish));
        sketch.start();

        let delta = 1.0 / hz as f32;
        for n in 0..hz {
            let report = sketch.frame(&FrameInfo::new(n, (n + 1) as f32 * delta, delta)).unwrap();
            assert_eq!(report.tasks_run, 1);
        }
        sketch.flow().unwrap().offset()
    }

    #[test]
    fn test_real_time_fish_covers_same_distance_at_any_rate() {
        let at_60 = swim_for_one_second(AnimationPacing::RealTime, 60);
        let at_30 = swim_for_one_second(AnimationPacing::RealTime, 30);
        let at_144 = swim_for_one_second(AnimationPacing::RealTime, 144);

        assert!((at_60 - 0.06).abs() < 1e-6);
        assert!((at_30 - 0.06).abs() < 1e-6);
        assert!((at_144 - 0.06).abs() < 1e-6);
    }

    #[test]
    fn test_per_frame_fish_follows_refresh_rate() {
        let at_60 = swim_for_one_second(AnimationPacing::PerFrame, 60);
        let at_30 = swim_for_one_second(AnimationPacing::PerFrame, 30);

        assert!((at_60 - 0.06).abs() < 1e-9);
        assert!((at_30 - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_real_time_flag_reaches_the_fish_task() {
        let cli = Cli::parse_from(["fish-flow", "--real-time"]);
        let (mut sketch, _) = sketch_with(SketchSettings::from_cli(&cli).unwrap());
        sketch.on_asset(loaded(AssetKind::Fish));
        sketch.start();

        sketch.frame(&FrameInfo::new(0, 0.1, 0.1)).unwrap();
        assert!((sketch.flow().unwrap().offset() - 0.006).abs() < 1e-6);
    }

    #[test]
    fn test_fish_is_baked_from_its_first_node() {
        let (mut sketch, _) = sketch();
        sketch.on_asset(loaded(AssetKind::Fish));

        let fish = sketch.scene().find("fish").unwrap();
        // only the first root's triangle, not the rock under the second root
        assert_eq!(fish.mesh.triangle_count(), 1);

        // scaled by 0.01 and lifted by the node's 0.5 translation
        let bounds = fish.mesh.bounds().unwrap();
        assert!(bounds.size().max_element() <= 0.011);
        assert!((bounds.center().y - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_landscape_gets_every_mesh_in_the_model() {
        let (mut sketch, _) = sketch();
        sketch.on_asset(loaded(AssetKind::Landscape));

        let landscape = sketch.scene().find("landscape").unwrap();
        assert_eq!(landscape.mesh.triangle_count(), 2);
        assert!(!landscape.is_flow());
        assert_eq!(landscape.transform.scale.x, 10.0);
    }

    #[test]
    fn test_both_failures_still_render_the_empty_scene() {
        let (mut sketch, reports) = sketch();
        sketch.start();
        sketch.on_asset(failed(AssetKind::Fish, "timed out"));
        sketch.on_asset(failed(AssetKind::Landscape, "connection refused"));
        run(&mut sketch, 2);

        assert_eq!(reports.borrow().len(), 2);
        assert_eq!(sketch.renderer().draws.len(), 2);
        assert_eq!(sketch.status().errors().len(), 2);
        assert_eq!(sketch.title(), "fish-flow (failed to load: fish, landscape)");
    }

    #[test]
    fn test_resize_ignores_zero_size() {
        let (mut sketch, _) = sketch();
        assert!(sketch.resize(Viewport::new(1024, 768, 2.0)));
        assert_eq!(sketch.renderer().ratio, 2.0);
        assert!(!sketch.resize(Viewport::new(0, 0, 2.0)));
        assert!((sketch.camera().aspect - 1024.0 / 768.0).abs() < 1e-6);
    }
}
