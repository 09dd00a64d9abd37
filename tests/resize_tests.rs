use fish_flow::camera::PerspectiveCamera;
use fish_flow::core::{handle_resize, RenderSurface, Viewport, MAX_PIXEL_RATIO};

#[cfg(test)]
mod resize_tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct RecordingSurface {
        size: (u32, u32),
        ratio: f64,
    }

    impl RenderSurface for RecordingSurface {
        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn set_pixel_ratio(&mut self, ratio: f64) {
            self.ratio = ratio;
        }
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 1.0, 0.01, 200.0)
    }

    #[test]
    fn test_resize_twice_equals_once() {
        let viewport = Viewport::new(1280, 720, 1.5);

        let mut camera_once = camera();
        let mut surface_once = RecordingSurface::default();
        handle_resize(viewport, &mut camera_once, &mut surface_once);

        let mut camera_twice = camera();
        let mut surface_twice = RecordingSurface::default();
        handle_resize(viewport, &mut camera_twice, &mut surface_twice);
        handle_resize(viewport, &mut camera_twice, &mut surface_twice);

        assert_eq!(camera_once, camera_twice);
        assert_eq!(surface_once, surface_twice);
    }

    #[test]
    fn test_resize_updates_aspect_and_projection() {
        let mut camera = camera();
        let mut surface = RecordingSurface::default();

        handle_resize(Viewport::new(800, 600, 1.0), &mut camera, &mut surface);
        handle_resize(Viewport::new(1024, 768, 1.0), &mut camera, &mut surface);

        assert!((camera.aspect - 1024.0 / 768.0).abs() < 1e-6);
        assert_eq!(surface.size, (1024, 768));

        let mut expected = PerspectiveCamera::new(75.0, 1024.0 / 768.0, 0.01, 200.0);
        expected.update_projection_matrix();
        assert_eq!(camera.projection_matrix(), expected.projection_matrix());
    }

    #[test]
    fn test_pixel_ratio_is_clamped() {
        let mut camera = camera();
        let mut surface = RecordingSurface::default();

        handle_resize(Viewport::new(800, 600, 3.0), &mut camera, &mut surface);
        assert_eq!(surface.ratio, MAX_PIXEL_RATIO);

        handle_resize(Viewport::new(800, 600, 1.25), &mut camera, &mut surface);
        assert_eq!(surface.ratio, 1.25);
    }

    #[test]
    fn test_zero_size_is_ignored() {
        let mut camera = camera();
        let mut surface = RecordingSurface::default();
        handle_resize(Viewport::new(800, 600, 1.0), &mut camera, &mut surface);

        assert!(!handle_resize(Viewport::new(0, 600, 1.0), &mut camera, &mut surface));
        assert!(!handle_resize(Viewport::new(800, 0, 1.0), &mut camera, &mut surface));

        assert_eq!(surface.size, (800, 600));
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }
}
