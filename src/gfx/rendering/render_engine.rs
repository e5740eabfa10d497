//! WGPU-based display of the simulation
//!
//! Draws the current simulation image as a fullscreen triangle, sampled through the
//! viewport camera. Shares the device and queue created by the compute context so the
//! images the kernel writes are the same allocations the fragment shader samples.

use std::sync::Arc;
use wgpu::{BindGroup, BindGroupLayout, Device, Queue, RenderPipeline, ShaderStages, TextureFormat};

use crate::error::Result;
use crate::gfx::{camera::camera_utils::CameraUniform, resources::texture_resource::TextureResource};
use crate::simulation::{ComputeContext, SimulationImageSet, Slot};
use crate::wgpu_utils::{binding_types, ReadbackBuffer, UniformBuffer};

/// Format used for offscreen captures, independent of the surface
pub const CAPTURE_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// A captured frame as tightly packed RGBA8 rows, top row first
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Core rendering engine managing the surface and the display pipeline
///
/// Holds one bind group per simulation slot; each frame picks the one matching the
/// current output, so nothing is rebuilt when the images swap roles.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<Device>,
    queue: Arc<Queue>,
    config: wgpu::SurfaceConfiguration,
    display_pipeline: RenderPipeline,
    capture_pipeline: RenderPipeline,
    camera_buffer: UniformBuffer<CameraUniform>,
    display_bind_groups: [BindGroup; 2],
}

impl RenderEngine {
    /// Configures `surface` on the compute context's device and builds the display
    /// pipeline against both simulation images.
    ///
    /// # Arguments
    /// * `surface` - Window surface the adapter was chosen for
    /// * `context` - Compute context owning the shared device and queue
    /// * `images` - Simulation images to display
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `vsync` - Present with FIFO when set, immediately otherwise
    pub fn new(
        surface: wgpu::Surface<'static>,
        context: &ComputeContext,
        images: &SimulationImageSet,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Self {
        let (device, queue) = context.shared();

        let surface_capabilities = surface.get_capabilities(context.adapter());
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .unwrap_or(TextureFormat::Bgra8Unorm);
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("Surface configured: {:?} {}x{}", format, config.width, config.height);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Display Bind Group Layout"),
            entries: &[
                binding_types::entry(
                    0,
                    ShaderStages::VERTEX_FRAGMENT,
                    binding_types::uniform(),
                ),
                binding_types::entry(1, ShaderStages::FRAGMENT, binding_types::texture_2d()),
                binding_types::entry(
                    2,
                    ShaderStages::FRAGMENT,
                    binding_types::sampler(wgpu::SamplerBindingType::Filtering),
                ),
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Display Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("screen.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Display Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let display_pipeline = create_display_pipeline(&device, &pipeline_layout, &shader, format);
        let capture_pipeline =
            create_display_pipeline(&device, &pipeline_layout, &shader, CAPTURE_FORMAT);

        let camera_buffer = UniformBuffer::new_with_data(&device, &CameraUniform::default());

        let display_bind_groups = [
            create_display_bind_group(&device, &bind_group_layout, &camera_buffer, images, Slot::A),
            create_display_bind_group(&device, &bind_group_layout, &camera_buffer, images, Slot::B),
        ];

        Self {
            surface,
            device,
            queue,
            config,
            display_pipeline,
            capture_pipeline,
            camera_buffer,
            display_bind_groups,
        }
    }

    /// Uploads the camera values used by the next draw
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        self.camera_buffer.update_content(&self.queue, camera_uniform);
    }

    /// Draws the current output image to the window and presents it.
    ///
    /// A lost or outdated surface is reconfigured and the frame dropped; a timeout drops
    /// the frame. Any other surface failure is returned.
    pub fn render_frame(&mut self, images: &SimulationImageSet) -> Result<()> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("Surface texture timed out, skipping frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.encode_display_pass(
            &mut encoder,
            &surface_texture_view,
            &self.display_pipeline,
            images.output_slot(),
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        Ok(())
    }

    /// Renders what the window currently shows into an offscreen target and reads it
    /// back to the host.
    pub fn capture(&self, images: &SimulationImageSet) -> Result<CapturedFrame> {
        let (width, height) = self.get_surface_size();
        let target = TextureResource::create_capture_target(&self.device, width, height, CAPTURE_FORMAT);
        let readback = ReadbackBuffer::new(&self.device, width, height);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });

        self.encode_display_pass(
            &mut encoder,
            &target.view,
            &self.capture_pipeline,
            images.output_slot(),
        );
        readback.copy_from(&mut encoder, &target.texture);

        self.queue.submit(std::iter::once(encoder.finish()));
        let pixels = readback.read(&self.device)?;

        Ok(CapturedFrame {
            width,
            height,
            pixels,
        })
    }

    fn encode_display_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        pipeline: &RenderPipeline,
        slot: Slot,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Display Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.display_bind_groups[slot.index()], &[]);
        render_pass.draw(0..3, 0..1);
    }

    /// Updates surface dimensions, ignoring zero sizes (minimized windows)
    ///
    /// # Arguments
    /// * `width` - New surface width in pixels
    /// * `height` - New surface height in pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Returns current surface dimensions
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

fn create_display_pipeline(
    device: &Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: TextureFormat,
) -> RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("Display Pipeline ({:?})", format)),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_display_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    camera_buffer: &UniformBuffer<CameraUniform>,
    images: &SimulationImageSet,
    slot: Slot,
) -> BindGroup {
    let image = images.image(slot);
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(match slot {
            Slot::A => "Display Bind Group A",
            Slot::B => "Display Bind Group B",
        }),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.binding_resource(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&image.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&image.sampler),
            },
        ],
    })
}
