use std::{iter, sync::Arc};

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraUniform},
    data_structures::{
        color::clear_colour,
        grid::GridMesh,
        model::{DrawModel, Model},
        scene::{Helper, Scene},
        texture::Texture,
    },
    drop_zone::OverlayFlag,
    error::ViewerError,
    pipelines::{
        basic::mk_model_pipeline,
        grid::mk_grid_pipeline,
        light::{LightResources, LightUniform},
        overlay::mk_overlay_pipeline,
    },
    render::SceneRenderer,
    resources::texture::material_layout,
};

pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

pub struct Pipelines {
    pub model: wgpu::RenderPipeline,
    pub grid: wgpu::RenderPipeline,
    pub overlay: wgpu::RenderPipeline,
}

/// Window surface, device and everything the renderer keeps between frames.
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub light: LightResources,
    pub material_layout: wgpu::BindGroupLayout,
    pub pipelines: Pipelines,
    pub clear_colour: wgpu::Color,
    grids: Vec<(Helper, GridMesh)>,
    overlay: OverlayFlag,
    is_surface_configured: bool,
}

impl Context {
    /// Set up the GPU for `window`.
    ///
    /// Fails with [`ViewerError::CapabilityUnavailable`] when no adapter,
    /// surface or device can be obtained.
    pub async fn new(
        window: Arc<Window>,
        background: u32,
        overlay: OverlayFlag,
    ) -> Result<Self, ViewerError> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| ViewerError::CapabilityUnavailable(format!("no surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ViewerError::CapabilityUnavailable(format!("no graphics adapter: {e}")))?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .map_err(|e| ViewerError::CapabilityUnavailable(format!("no device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders output linear colour and rely on an sRGB surface for encoding
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                ViewerError::CapabilityUnavailable("surface reports no formats".to_string())
            })?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        let camera = CameraResources {
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        };

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");
        let light = LightResources::new(&device, LightUniform::from_lights(&[]));
        let material_layout = material_layout(&device);

        let pipelines = Pipelines {
            model: mk_model_pipeline(
                &device,
                &config,
                &material_layout,
                &camera.bind_group_layout,
                &light.bind_group_layout,
            ),
            grid: mk_grid_pipeline(&device, &config, &camera.bind_group_layout),
            overlay: mk_overlay_pipeline(&device, &config),
        };

        let mut ctx = Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            light,
            material_layout,
            pipelines,
            clear_colour: clear_colour(background),
            grids: Vec::new(),
            overlay,
            is_surface_configured: false,
        };
        ctx.resize(size.width, size.height);
        Ok(ctx)
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.is_surface_configured = true;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Texture::create_depth_texture(
                &self.device,
                [self.config.width, self.config.height],
                "depth_texture",
            );
        }
    }

    /// Turn freshly loaded data into a drawable model.
    pub fn upload(
        &self,
        data: &crate::data_structures::model::ModelData,
    ) -> Result<Model, crate::error::LoadError> {
        Model::upload(&self.device, &self.queue, &self.material_layout, data)
    }

    fn sync_helpers(&mut self, helpers: &[Helper]) {
        let current = self.grids.iter().map(|(h, _)| *h);
        if current.eq(helpers.iter().copied()) {
            return;
        }
        self.grids = helpers
            .iter()
            .map(|helper| match *helper {
                Helper::Grid { size, divisions } => {
                    (*helper, GridMesh::new(&self.device, size, divisions))
                }
            })
            .collect();
    }
}

impl SceneRenderer<Model> for Context {
    type Error = wgpu::SurfaceError;

    fn render(&mut self, scene: &Scene<Model>, camera: &Camera) -> Result<(), Self::Error> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.camera.uniform.update_view_proj(camera);
        self.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
        self.light
            .update(&self.queue, LightUniform::from_lights(scene.lights()));
        self.sync_helpers(scene.helpers());

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipelines.grid);
            render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
            for (_, grid) in self.grids.iter() {
                render_pass.set_vertex_buffer(0, grid.vertex_buffer.slice(..));
                render_pass.draw(0..grid.num_vertices, 0..1);
            }

            render_pass.set_pipeline(&self.pipelines.model);
            for model in scene.models() {
                render_pass.draw_model(model, &self.camera.bind_group, &self.light.bind_group);
            }
        }

        if self.overlay.is_visible() {
            let mut overlay_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Drop Overlay Pass"),
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
            });
            overlay_pass.set_pipeline(&self.pipelines.overlay);
            overlay_pass.draw(0..3, 0..1);
        }

        self.queue.submit(iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}
