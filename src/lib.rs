pub mod camera;
pub mod cli;
pub mod config;
pub mod controls;
pub mod core;
pub mod flow;
pub mod frame;
pub mod loaders;
pub mod math;
pub mod mesh;
pub mod overlay;
pub mod renderer;
pub mod scene;
pub mod sketch;
pub mod types;

pub use crate::core::{FailurePolicy, FrameScheduler, RenderHook, TickReport};
pub use flow::{CurveFlow, FlowView};
pub use frame::{FrameClock, FrameInfo};
pub use sketch::{ErrorReporter, LogReporter, SceneRenderer, Sketch};
