use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use fish_flow::cli::Cli;
use fish_flow::config::SketchSettings;
use fish_flow::core::{Viewport, WinitController};
use fish_flow::frame::FrameClock;
use fish_flow::loaders::{AssetEvent, AssetLoader};
use fish_flow::renderer::GpuRenderer;
use fish_flow::sketch::{LogReporter, Sketch};

// === Application ===

struct App {
    settings: SketchSettings,
    proxy: EventLoopProxy<AssetEvent>,
    window: Option<Arc<Window>>,
    sketch: Option<Sketch<GpuRenderer>>,
    input: WinitController,
    clock: FrameClock,
    occluded: bool,
    title: String,
}

impl App {
    fn new(settings: SketchSettings, proxy: EventLoopProxy<AssetEvent>) -> Self {
        Self {
            title: settings.window.title.clone(),
            settings,
            proxy,
            window: None,
            sketch: None,
            input: WinitController::new(),
            clock: FrameClock::new(),
            occluded: false,
        }
    }

    /// Kick off both model loads; each result comes back as a user event
    fn spawn_loads(&self, sketch: &mut Sketch<GpuRenderer>) {
        let requests = sketch.asset_requests();

        let loader = match AssetLoader::with_timeout(self.settings.assets.fetch_timeout()) {
            Ok(loader) => loader,
            Err(e) => {
                for (kind, location) in requests {
                    sketch.on_asset(AssetEvent {
                        kind,
                        location,
                        outcome: Err(anyhow::anyhow!("{:#}", e)),
                    });
                }
                return;
            }
        };

        for (kind, location) in requests {
            let proxy = self.proxy.clone();
            let spawned = loader.load(kind, location.clone(), move |event| {
                // the loop may already be gone; nothing left to deliver to
                let _ = proxy.send_event(event);
            });
            if let Err(e) = spawned {
                sketch.on_asset(AssetEvent {
                    kind,
                    location,
                    outcome: Err(e),
                });
            }
        }
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        self.input.set_scale_factor(scale_factor);
        if let Some(sketch) = &mut self.sketch {
            sketch.resize(Viewport::from_physical(size.width, size.height, scale_factor));
        }
    }

    fn sync_title(&mut self) {
        if let (Some(sketch), Some(window)) = (&self.sketch, &self.window) {
            let title = sketch.title();
            if title != self.title {
                window.set_title(&title);
                self.title = title;
            }
        }
    }

    fn redraw(&mut self) {
        let (Some(sketch), Some(window)) = (&mut self.sketch, &self.window) else {
            return;
        };

        let frame = self.clock.tick_at(Instant::now());
        let height = window.inner_size().to_logical::<f32>(window.scale_factor()).height;

        sketch.update_controls(&self.input, height);
        self.input.reset_deltas();

        match sketch.frame(&frame) {
            Ok(report) if report.failures > 0 => {
                log::debug!("frame {}: {} task(s) failed", frame.number, report.failures);
            }
            Ok(_) => {}
            Err(e) => log::error!("frame {} failed: {:#}", frame.number, e),
        }
    }
}

impl ApplicationHandler<AssetEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(self.settings.window.title.clone())
                .with_inner_size(winit::dpi::LogicalSize::new(
                    self.settings.window.width,
                    self.settings.window.height,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let renderer = match pollster::block_on(GpuRenderer::new(window.clone(), self.settings.show_overlay)) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Failed to initialize renderer: {:#}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let scale = window.scale_factor();
        self.input.set_scale_factor(scale);

        let mut sketch = Sketch::new(
            self.settings.clone(),
            renderer,
            Viewport::from_physical(size.width, size.height, scale),
            Box::new(LogReporter),
        );
        self.spawn_loads(&mut sketch);
        sketch.start();

        self.clock = FrameClock::new();
        self.window = Some(window);
        self.sketch = Some(sketch);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // Let egui handle the event first; the controls still see releases
        let captured = match &mut self.sketch {
            Some(sketch) => sketch.renderer_mut().handle_event(&event),
            None => false,
        };
        if captured {
            self.input.process_captured_event(&event);
            return;
        }

        self.input.process_event(&event);

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                self.resize(size, scale);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.resize(size, scale_factor);
                }
            }
            WindowEvent::Occluded(occluded) => {
                self.occluded = occluded;
                if !occluded {
                    self.clock.resume_at(Instant::now());
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AssetEvent) {
        if let Some(sketch) = &mut self.sketch {
            sketch.on_asset(event);
        }
        self.sync_title();
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.occluded {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = SketchSettings::from_cli(&cli)?;

    let event_loop = EventLoop::<AssetEvent>::with_user_event().build()?;
    let mut app = App::new(settings, event_loop.create_proxy());

    println!("fish-flow - Controls: drag to orbit, right-drag to pan, wheel to zoom, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
