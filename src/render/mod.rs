pub mod sprite;
pub mod text;

use std::sync::Arc;

use winit::window::Window;

use self::sprite::{SpritePipeline, SpriteUniform};
use self::text::TextPainter;
use crate::error::BuddyError;
use crate::window::{Content, WindowRole};

/// GPU state shared by every window: one device drives all surfaces.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

/// Intermediate frame state returned by `begin_frame`.
pub struct FrameContext {
    pub output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

fn create_instance() -> wgpu::Instance {
    // DX12 only on Windows: Vulkan WSI there can't do transparent composition.
    // DirectComposition presentation gives per-pixel alpha.
    #[cfg(windows)]
    let desc = wgpu::InstanceDescriptor {
        backends: wgpu::Backends::DX12,
        backend_options: wgpu::BackendOptions {
            dx12: wgpu::Dx12BackendOptions {
                presentation_system: wgpu_types::Dx12SwapchainKind::DxgiFromVisual,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    };
    #[cfg(not(windows))]
    let desc = wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    };
    wgpu::Instance::new(&desc)
}

impl GpuContext {
    /// Bring up the device using the first window's surface for adapter
    /// selection. Returns that surface so it isn't created twice.
    pub fn new(window: Arc<Window>) -> Result<(Self, wgpu::Surface<'static>), BuddyError> {
        let instance = create_instance();
        let surface = instance
            .create_surface(window)
            .map_err(|e| BuddyError::Gpu(format!("failed to create surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| BuddyError::Gpu(format!("no suitable GPU adapter: {e}")))?;

        log::info!(
            "GPU adapter: {:?} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("deskbuddy_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .map_err(|e| BuddyError::Gpu(format!("failed to create device: {e}")))?;

        Ok((
            Self {
                instance,
                adapter,
                device,
                queue,
            },
            surface,
        ))
    }

    pub fn create_surface(&self, window: Arc<Window>) -> Result<wgpu::Surface<'static>, BuddyError> {
        self.instance
            .create_surface(window)
            .map_err(|e| BuddyError::Gpu(format!("failed to create surface: {e}")))
    }
}

/// How a window's pixels get made.
pub enum Painter {
    Sprite(SpritePipeline),
    Text(Box<TextPainter>),
}

/// One window's swapchain plus whatever paints into it.
pub struct WindowSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    painter: Painter,
}

impl WindowSurface {
    pub fn new(
        gpu: &GpuContext,
        surface: wgpu::Surface<'static>,
        window: &Window,
        role: WindowRole,
    ) -> Self {
        let size = window.inner_size();
        let caps = surface.get_capabilities(&gpu.adapter);

        let format = caps
            .formats
            .iter()
            .find(|f| **f == wgpu::TextureFormat::Bgra8UnormSrgb)
            .copied()
            .or_else(|| caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let alpha_mode = if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PostMultiplied)
        {
            wgpu::CompositeAlphaMode::PostMultiplied
        } else {
            wgpu::CompositeAlphaMode::Auto
        };

        // Every window presents once per frame; a blocking present per window
        // would divide the frame rate by the window count.
        let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Mailbox) {
            wgpu::PresentMode::Mailbox
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        log::debug!(
            "Surface: format={:?}, alpha_mode={:?}, present_mode={:?}",
            format,
            alpha_mode,
            present_mode
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);

        let painter = match role {
            WindowRole::Companion => Painter::Sprite(SpritePipeline::new(&gpu.device, format)),
            WindowRole::Chatter => {
                Painter::Text(Box::new(TextPainter::new(window, &gpu.device, format)))
            }
        };

        Self {
            surface,
            config,
            painter,
        }
    }

    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&gpu.device, &self.config);
    }

    /// Acquire the next surface texture and create a command encoder.
    /// Returns None if the surface is lost/outdated (caller should skip this frame).
    fn begin_frame(&self, gpu: &GpuContext) -> Option<FrameContext> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&gpu.device, &self.config);
                return None;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                return None;
            }
            Err(e) => {
                log::warn!("Surface error: {e:?}");
                return None;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        Some(FrameContext {
            output,
            view,
            encoder,
        })
    }

    /// Paint `content` and present. Mismatched content is skipped.
    pub fn draw(&mut self, gpu: &GpuContext, window: &Window, content: &Content<'_>) {
        let Some(FrameContext {
            output,
            view,
            mut encoder,
        }) = self.begin_frame(gpu)
        else {
            return;
        };

        let resolution = [self.config.width as f32, self.config.height as f32];
        let extra = match (&mut self.painter, content) {
            (
                Painter::Sprite(pipeline),
                Content::Sprite {
                    frame,
                    look,
                    sprite_size,
                    time,
                },
            ) => {
                let uniform = SpriteUniform::new(frame, look, *sprite_size, *time, resolution);
                pipeline.update(&gpu.queue, &uniform);
                pipeline.draw(&mut encoder, &view);
                Vec::new()
            }
            (Painter::Text(painter), Content::Text { text, font }) => painter.draw(
                gpu,
                window,
                &mut encoder,
                &view,
                text,
                font,
                [self.config.width, self.config.height],
            ),
            _ => {
                log::warn!("Window painter does not match its content, skipping frame");
                Vec::new()
            }
        };

        gpu.queue
            .submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();

        if let Painter::Text(painter) = &mut self.painter {
            painter.end_frame();
        }
    }
}

/// Clear `view` to fully transparent and hand back the pass.
pub fn begin_clear_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    label: &'static str,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            depth_slice: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
