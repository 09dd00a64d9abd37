pub mod controller;
pub mod input_adapter;
pub mod scheduler;
pub mod viewport;

pub use controller::{Button, Controller};
pub use input_adapter::WinitController;
pub use scheduler::{FailurePolicy, FrameScheduler, RenderHook, Task, TickReport};
pub use viewport::{clamp_pixel_ratio, drawing_buffer_size, handle_resize, RenderSurface, Viewport, MAX_PIXEL_RATIO};
