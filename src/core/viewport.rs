use crate::camera::PerspectiveCamera;

/// Upper bound for the device pixel ratio used by the drawing buffer
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Host window size in logical pixels plus its device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Build from a physical size as reported by winit
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self {
            width: (width as f64 / scale).round() as u32,
            height: (height as f64 / scale).round() as u32,
            device_pixel_ratio: scale,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Something that can be resized and drawn into at a given pixel ratio
pub trait RenderSurface {
    /// Resize the drawing area, in logical pixels
    fn set_size(&mut self, width: u32, height: u32);

    fn set_pixel_ratio(&mut self, ratio: f64);
}

pub fn clamp_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    device_pixel_ratio.min(MAX_PIXEL_RATIO)
}

/// Drawing-buffer size for a logical size at a (clamped) pixel ratio
pub fn drawing_buffer_size(width: u32, height: u32, ratio: f64) -> (u32, u32) {
    (
        (width as f64 * ratio).round().max(1.0) as u32,
        (height as f64 * ratio).round().max(1.0) as u32,
    )
}

/// Apply a window resize to the camera and render surface.
///
/// Returns `false` (and changes nothing) for a zero-sized viewport, which is
/// what minimised windows report. Applying the same viewport twice leaves the
/// camera and surface exactly as applying it once.
pub fn handle_resize<S>(viewport: Viewport, camera: &mut PerspectiveCamera, surface: &mut S) -> bool
where
    S: RenderSurface + ?Sized,
{
    if viewport.is_empty() {
        log::debug!("ignoring resize to empty viewport {}x{}", viewport.width, viewport.height);
        return false;
    }

    camera.aspect = viewport.aspect();
    camera.update_projection_matrix();

    surface.set_size(viewport.width, viewport.height);
    surface.set_pixel_ratio(clamp_pixel_ratio(viewport.device_pixel_ratio));

    log::debug!(
        "viewport resized to {}x{} @{:.2}",
        viewport.width,
        viewport.height,
        viewport.device_pixel_ratio
    );
    true
}
