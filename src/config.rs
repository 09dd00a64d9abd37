use std::f32::consts::{FRAC_PI_2, PI};
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use glam::Vec3;
use serde::Deserialize;

use crate::cli::Cli;
use crate::core::FailurePolicy;

pub const FISH_URL: &str = "https://assets.codepen.io/5946/fish.glb";
pub const LANDSCAPE_URL: &str = "https://assets.codepen.io/5946/landscape.glb";

/// Refresh rate the per-frame increment was tuned against
pub const REFERENCE_HZ: f64 = 60.0;

const DEFAULT_FETCH_TIMEOUT_SECS: f64 = 30.0;

/// Every tunable of the sketch. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SketchSettings {
    pub window: WindowSettings,
    pub camera: CameraSettings,
    pub scene: SceneSettings,
    pub assets: AssetSettings,
    pub fish: FishSettings,
    pub landscape: LandscapeSettings,
    pub failure_policy: FailurePolicy,
    pub show_overlay: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub background: u32,
    pub fog_color: u32,
    pub fog_density: f32,
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub fish: String,
    pub landscape: String,
    pub fetch_timeout_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FishSettings {
    pub scale: f32,
    /// Rotation about X baked into the geometry, radians
    pub rotation_x: f32,
    /// Control points on the loop
    pub curve_points: usize,
    pub wobble_frequency: f32,
    pub wobble_amplitude: f32,
    /// Path progress per tick (or per 1/60 s in real-time pacing)
    pub increment: f64,
    pub pacing: AnimationPacing,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LandscapeSettings {
    pub scale: f32,
    pub position: [f32; 3],
}

/// How a flow task turns a frame into path progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPacing {
    /// Fixed increment every tick, speed follows the refresh rate
    #[default]
    PerFrame,
    /// Increment scaled by elapsed time, speed is refresh-rate independent
    RealTime,
}

impl AnimationPacing {
    pub fn step(&self, increment: f64, delta: f32) -> f64 {
        match self {
            AnimationPacing::PerFrame => increment,
            AnimationPacing::RealTime => increment * REFERENCE_HZ * delta as f64,
        }
    }
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            camera: CameraSettings::default(),
            scene: SceneSettings::default(),
            assets: AssetSettings::default(),
            fish: FishSettings::default(),
            landscape: LandscapeSettings::default(),
            failure_policy: FailurePolicy::default(),
            show_overlay: true,
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "fish-flow".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.01,
            far: 200.0,
            position: [0.0, 1.0, 2.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            background: 0x222299,
            fog_color: 0x222277,
            fog_density: 0.2,
            ambient_color: 0xffffff,
            ambient_intensity: 0.6,
            directional_color: 0xffffff,
            directional_intensity: 1.2,
            directional_position: [-3.0, 5.0, -3.0],
        }
    }
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            fish: FISH_URL.to_string(),
            landscape: LANDSCAPE_URL.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl Default for FishSettings {
    fn default() -> Self {
        Self {
            scale: 0.01,
            rotation_x: FRAC_PI_2,
            curve_points: 200,
            wobble_frequency: 10.0,
            wobble_amplitude: 1.0 / 30.0,
            increment: 0.001,
            pacing: AnimationPacing::PerFrame,
        }
    }
}

impl Default for LandscapeSettings {
    fn default() -> Self {
        Self {
            scale: 10.0,
            position: [-1.0, 0.0, -2.0],
        }
    }
}

impl FishSettings {
    /// Control points of the wobbly loop the fish swims along
    pub fn curve_points(&self) -> Vec<Vec3> {
        let step = 2.0 * PI / self.curve_points.max(1) as f32;
        (0..self.curve_points)
            .map(|k| {
                let i = k as f32 * step;
                let dist = 1.0 + (i * self.wobble_frequency).sin() * self.wobble_amplitude;
                Vec3::new(i.sin() * dist, 0.0, i.cos() * dist)
            })
            .collect()
    }
}

impl AssetSettings {
    /// Configured timeout, or the default if the value cannot be one
    pub fn fetch_timeout(&self) -> Duration {
        timeout_from_secs(self.fetch_timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    pub fn validate(&self) -> Result<()> {
        timeout_from_secs(self.fetch_timeout_secs).map(|_| ())
    }
}

fn timeout_from_secs(secs: f64) -> Result<Duration> {
    ensure!(
        secs.is_finite() && secs > 0.0,
        "fetch timeout must be a positive number of seconds, got {}",
        secs
    );
    Duration::try_from_secs_f64(secs).with_context(|| format!("fetch timeout of {} seconds is out of range", secs))
}

impl SketchSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json).context("Failed to parse sketch settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would only blow up once the sketch is running
    pub fn validate(&self) -> Result<()> {
        self.assets.validate().context("Invalid asset settings")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        Self::from_json(&json).with_context(|| format!("Invalid settings file: {:?}", path))
    }

    /// Command line flags override whatever the defaults or file said
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(fish) = &cli.fish {
            self.assets.fish = fish.clone();
        }
        if let Some(landscape) = &cli.landscape {
            self.assets.landscape = landscape.clone();
        }
        if let Some(timeout) = cli.fetch_timeout {
            self.assets.fetch_timeout_secs = timeout;
        }
        if cli.real_time {
            self.fish.pacing = AnimationPacing::RealTime;
        }
        if cli.halt_on_task_error {
            self.failure_policy = FailurePolicy::Halt;
        }
        if cli.no_ui {
            self.show_overlay = false;
        }
    }

    /// Defaults, then the settings file, then command line flags
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.settings {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply_cli(cli);
        settings.validate()?;
        Ok(settings)
    }
}
