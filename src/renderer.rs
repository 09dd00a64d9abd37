use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::PerspectiveCamera;
use crate::core::{drawing_buffer_size, RenderSurface};
use crate::frame::FrameInfo;
use crate::overlay::{self, StatusBoard};
use crate::scene::{ObjectId, ObjectKind, Scene, SceneObject};
use crate::sketch::SceneRenderer;
use crate::types::{GlobalsUniform, ObjectUniform, Vertex};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// GPU-side copy of a scene object
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Drawing-buffer sized colour + depth targets the scene is rendered into
struct FrameTargets {
    size: (u32, u32),
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    display_bind_group: wgpu::BindGroup,
}

struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// Forward renderer: scene into an offscreen frame, frame onto the window,
/// optional egui status panel on top
pub struct GpuRenderer {
    window: Arc<Window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    logical_size: (u32, u32),
    pixel_ratio: f64,
    needs_reconfigure: bool,
    scene_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    display_pipeline: wgpu::RenderPipeline,
    display_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    targets: FrameTargets,
    meshes: HashMap<ObjectId, GpuMesh>,
    deformed: Vec<Vertex>,
    overlay: Option<Overlay>,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>, show_overlay: bool) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create window surface")?;
        let adapter = Self::request_adapter(&instance, &surface).await?;
        let (device, queue) = Self::request_device(&adapter).await?;

        let surface_config = Self::create_surface_config(&surface, &adapter, size)?;
        surface.configure(&device, &surface_config);

        let globals_layout = Self::uniform_layout(&device, "globals_layout", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let object_layout = Self::uniform_layout(&device, "object_layout", wgpu::ShaderStages::VERTEX);

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<GlobalsUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
            label: Some("globals_bind_group"),
        });

        let scene_pipeline = Self::create_scene_pipeline(&device, &globals_layout, &object_layout);

        let display_layout = Self::display_layout(&device);
        let display_pipeline = Self::create_display_pipeline(&device, &display_layout, surface_config.format);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let targets = Self::create_targets(&device, &display_layout, &sampler, (surface_config.width, surface_config.height));

        let overlay = if show_overlay {
            let ctx = egui::Context::default();
            let state = egui_winit::State::new(
                ctx.clone(),
                egui::ViewportId::ROOT,
                &window,
                Some(window.scale_factor() as f32),
                None,
                None,
            );
            let renderer = egui_wgpu::Renderer::new(&device, surface_config.format, egui_wgpu::RendererOptions::default());
            Some(Overlay { ctx, state, renderer })
        } else {
            None
        };

        let scale = window.scale_factor();
        log::info!(
            "renderer ready: {:?} on {}, surface {}x{}",
            surface_config.format,
            adapter.get_info().name,
            surface_config.width,
            surface_config.height
        );

        Ok(Self {
            logical_size: (
                (size.width as f64 / scale).round() as u32,
                (size.height as f64 / scale).round() as u32,
            ),
            pixel_ratio: scale,
            needs_reconfigure: false,
            window,
            device,
            queue,
            surface,
            surface_config,
            scene_pipeline,
            globals_buffer,
            globals_bind_group,
            object_layout,
            display_pipeline,
            display_layout,
            sampler,
            targets,
            meshes: HashMap::new(),
            deformed: Vec::new(),
            overlay,
        })
    }

    async fn request_adapter(instance: &wgpu::Instance, surface: &wgpu::Surface<'_>) -> Result<wgpu::Adapter> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find appropriate adapter")
    }

    async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("Failed to create device")
    }

    fn create_surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        size: winit::dpi::PhysicalSize<u32>,
    ) -> Result<wgpu::SurfaceConfiguration> {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface is not supported by the adapter"))?;

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes.first().copied().unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        })
    }

    fn uniform_layout(device: &wgpu::Device, label: &str, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some(label),
        })
    }

    fn display_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("display_bind_group_layout"),
        })
    }

    fn create_scene_pipeline(
        device: &wgpu::Device,
        globals_layout: &wgpu::BindGroupLayout,
        object_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[globals_layout, object_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: FRAME_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // models are not guaranteed closed
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    fn create_display_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Display Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("display.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Display Pipeline Layout"),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Display Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_targets(
        device: &wgpu::Device,
        display_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: (u32, u32),
    ) -> FrameTargets {
        let extent = wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let display_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: display_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("display_bind_group"),
        });

        FrameTargets {
            size: (extent.width, extent.height),
            color_view,
            depth_view,
            display_bind_group,
        }
    }

    /// Let the overlay see an event first; true if it used it
    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        match &mut self.overlay {
            Some(overlay) => overlay.state.on_window_event(&self.window, event).consumed,
            None => false,
        }
    }

    /// Size the scene is rendered at, logical size times the clamped ratio
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        drawing_buffer_size(self.logical_size.0, self.logical_size.1, self.pixel_ratio)
    }

    fn reconfigure(&mut self) {
        let physical = self.window.inner_size();
        if physical.width == 0 || physical.height == 0 {
            return;
        }

        self.surface_config.width = physical.width;
        self.surface_config.height = physical.height;
        self.surface.configure(&self.device, &self.surface_config);

        let buffer = self.drawing_buffer_size();
        if buffer != self.targets.size {
            self.targets = Self::create_targets(&self.device, &self.display_layout, &self.sampler, buffer);
        }

        log::debug!(
            "surface {}x{}, drawing buffer {}x{}",
            physical.width,
            physical.height,
            self.targets.size.0,
            self.targets.size.1
        );
        self.needs_reconfigure = false;
    }

    /// Upload new objects, drop ones the scene no longer has
    fn sync_meshes(&mut self, scene: &Scene) {
        for object in scene.objects() {
            if object.mesh.is_empty() || self.meshes.contains_key(&object.id) {
                continue;
            }
            let gpu = self.upload(object);
            self.meshes.insert(object.id, gpu);
        }
        self.meshes.retain(|id, _| scene.object(*id).is_some());
    }

    fn upload(&self, object: &SceneObject) -> GpuMesh {
        let mut usage = wgpu::BufferUsages::VERTEX;
        if object.is_flow() {
            usage |= wgpu::BufferUsages::COPY_DST;
        }

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertices", object.name)),
            contents: bytemuck::cast_slice(&object.mesh.vertices),
            usage,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} indices", object.name)),
            contents: bytemuck::cast_slice(&object.mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} uniforms", object.name)),
            contents: bytemuck::cast_slice(&[ObjectUniform::from_model(object.transform.matrix())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("object_bind_group"),
        });

        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: object.mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    /// Per-frame buffer writes: object transforms and bent flow geometry
    fn update_objects(&mut self, scene: &Scene) {
        for object in scene.objects() {
            let Some(gpu) = self.meshes.get(&object.id) else {
                continue;
            };

            self.queue.write_buffer(
                &gpu.uniform_buffer,
                0,
                bytemuck::cast_slice(&[ObjectUniform::from_model(object.transform.matrix())]),
            );

            if let ObjectKind::Flow(flow) = &object.kind {
                flow.deform_into(&object.mesh, &mut self.deformed);
                self.queue
                    .write_buffer(&gpu.vertex_buffer, 0, bytemuck::cast_slice(&self.deformed));
            }
        }
    }
}

impl RenderSurface for GpuRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        if self.logical_size != (width, height) {
            self.logical_size = (width, height);
            self.needs_reconfigure = true;
        }
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        if self.pixel_ratio != ratio {
            self.pixel_ratio = ratio;
            self.needs_reconfigure = true;
        }
        // the physical size can change without either value changing (e.g. a
        // monitor switch at the same ratio), so always re-check the surface
        let physical = self.window.inner_size();
        if (physical.width, physical.height) != (self.surface_config.width, self.surface_config.height) {
            self.needs_reconfigure = true;
        }
    }
}

impl SceneRenderer for GpuRenderer {
    fn draw(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        status: &StatusBoard,
        _frame: &FrameInfo,
    ) -> Result<()> {
        if self.needs_reconfigure {
            self.reconfigure();
        }
        let physical = self.window.inner_size();
        if physical.width == 0 || physical.height == 0 {
            return Ok(());
        }

        self.sync_meshes(scene);
        self.update_objects(scene);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[scene.globals(camera)]));

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.needs_reconfigure = true;
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(anyhow!("Failed to acquire surface texture: {}", e)),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Encoder"),
        });

        let [r, g, b] = scene.background;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.scene_pipeline);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            for object in scene.objects() {
                let Some(gpu) = self.meshes.get(&object.id) else {
                    continue;
                };
                render_pass.set_bind_group(1, &gpu.bind_group, &[]);
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..gpu.index_count, 0, 0..1);
            }
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Display Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.display_pipeline);
            render_pass.set_bind_group(0, &self.targets.display_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        let mut extra_commands = Vec::new();
        if let Some(ui) = &mut self.overlay {
            let raw_input = ui.state.take_egui_input(&self.window);
            let full_output = ui.ctx.run(raw_input, |ctx| overlay::draw(ctx, status));
            ui.state.handle_platform_output(&self.window, full_output.platform_output);

            let tris = ui.ctx.tessellate(full_output.shapes, ui.ctx.pixels_per_point());
            for (id, image_delta) in &full_output.textures_delta.set {
                ui.renderer.update_texture(&self.device, &self.queue, *id, image_delta);
            }

            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.surface_config.width, self.surface_config.height],
                pixels_per_point: self.window.scale_factor() as f32,
            };

            extra_commands = ui.renderer.update_buffers(
                &self.device,
                &self.queue,
                &mut encoder,
                &tris,
                &screen_descriptor,
            );

            {
                let mut render_pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: None,
                        occlusion_query_set: None,
                        timestamp_writes: None,
                    })
                    .forget_lifetime();

                ui.renderer.render(&mut render_pass, &tris, &screen_descriptor);
            }

            for id in &full_output.textures_delta.free {
                ui.renderer.free_texture(id);
            }
        }

        self.queue
            .submit(extra_commands.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();
        Ok(())
    }
}
