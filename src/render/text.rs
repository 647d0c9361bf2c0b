use winit::window::Window;

use super::GpuContext;
use crate::chatter::PADDING;
use crate::text::FontSpec;

const BUBBLE_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(18, 18, 22, 230);
const TEXT_COLOR: egui::Color32 = egui::Color32::from_rgb(240, 240, 235);
/// Bubble windows are sized in physical pixels by the text layout service,
/// so egui paints one point per pixel whatever the display scale.
const BUBBLE_PIXELS_PER_POINT: f32 = 1.0;

/// Override the scale egui-winit read off the window.
fn pin_pixels_per_point(raw_input: &mut egui::RawInput, size_in_pixels: [u32; 2]) {
    let [w, h] = size_in_pixels;
    raw_input.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(w as f32, h as f32) / BUBBLE_PIXELS_PER_POINT,
    ));
    raw_input
        .viewports
        .entry(raw_input.viewport_id)
        .or_default()
        .native_pixels_per_point = Some(BUBBLE_PIXELS_PER_POINT);
}

/// Paints one chatter bubble with egui.
pub struct TextPainter {
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    /// Textures egui asked us to free once the frame is on screen.
    pending_free: Vec<egui::TextureId>,
}

impl TextPainter {
    pub fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let egui_ctx = egui::Context::default();
        egui_ctx.set_visuals(egui::Visuals {
            panel_fill: egui::Color32::TRANSPARENT,
            ..egui::Visuals::dark()
        });

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(BUBBLE_PIXELS_PER_POINT),
            None,
            Some(device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            pending_free: Vec::new(),
        }
    }

    /// Record the bubble into `encoder`. Returns command buffers egui needs
    /// submitted ahead of it.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        gpu: &GpuContext,
        window: &Window,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        text: &str,
        font: &FontSpec,
        size_in_pixels: [u32; 2],
    ) -> Vec<wgpu::CommandBuffer> {
        let mut raw_input = self.egui_state.take_egui_input(window);
        pin_pixels_per_point(&mut raw_input, size_in_pixels);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let frame = egui::Frame::NONE
                .fill(BUBBLE_FILL)
                .corner_radius(6.0)
                .inner_margin(egui::Margin::same(PADDING as i8));
            egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
                let rich = egui::RichText::new(text)
                    .monospace()
                    .size(font.size)
                    .color(TEXT_COLOR);
                ui.add(egui::Label::new(rich).extend());
            });
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point,
        };

        let textures_delta = full_output.textures_delta;
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let extra = self.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            encoder,
            &primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass =
                super::begin_clear_pass(encoder, view, "chatter_render_pass").forget_lifetime();
            self.egui_renderer
                .render(&mut render_pass, &primitives, &screen_descriptor);
        }

        self.pending_free = textures_delta.free;
        extra
    }

    /// Free textures after present.
    pub fn end_frame(&mut self) {
        for id in self.pending_free.drain(..) {
            self.egui_renderer.free_texture(&id);
        }
    }
}
