//! Per-frame GPU sequence: clear, camera background, primitives.

use glam::Vec2;

use popcorn_core::Frame;

use crate::context::RenderContext;
use crate::pipelines::primitive::PrimitivePipeline;
use crate::pipelines::video::VideoPipeline;
use crate::scene::Scene;
use crate::RenderError;

/// One acquired swapchain image and the encoder recording into it.
pub struct FrameTarget {
    pub output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

pub struct Compositor {
    video: VideoPipeline,
    primitives: PrimitivePipeline,
    /// Logical layout size of the scene, independent of the window size.
    screen: Vec2,
}

impl Compositor {
    pub fn new(ctx: &RenderContext, screen_w: f32, screen_h: f32) -> Self {
        let primitives = PrimitivePipeline::new(ctx);
        primitives.update_screen_size(&ctx.queue, screen_w, screen_h);
        log::info!("Compositor ready ({}x{} layout)", screen_w, screen_h);
        Self {
            video: VideoPipeline::new(ctx),
            primitives,
            screen: Vec2::new(screen_w, screen_h),
        }
    }

    /// Acquire the next surface image and clear it to opaque black.
    pub fn begin_frame(&self, ctx: &RenderContext) -> Result<FrameTarget, RenderError> {
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
        }
        Ok(FrameTarget {
            output,
            view,
            encoder,
        })
    }

    pub fn update_video_texture(&mut self, ctx: &RenderContext, frame: &Frame) {
        self.video.update_texture(&ctx.device, &ctx.queue, frame);
    }

    /// Mirrored camera image, shifted by the shake offset and mixed toward
    /// white by `flash`.
    pub fn render_video_background(&self, ctx: &RenderContext, target: &mut FrameTarget, shake: Vec2, flash: f32) {
        if !self.video.has_texture() {
            return;
        }
        self.video.update_params(&ctx.queue, shake, self.screen, flash);
        let mut pass = load_pass(&mut target.encoder, &target.view, "Video Background");
        self.video.draw(&mut pass);
    }

    /// Game layers and HUD primitives on top of the background.
    pub fn draw_scene(&mut self, ctx: &RenderContext, target: &mut FrameTarget, scene: &Scene) {
        self.primitives.upload(&ctx.device, &ctx.queue, scene);
        let mut pass = load_pass(&mut target.encoder, &target.view, "Primitives");
        self.primitives.draw(&mut pass, scene);
    }

    /// Submit everything recorded for this frame. Presenting is left to the
    /// caller so it can add its own passes first.
    pub fn end_frame(&self, ctx: &RenderContext, target: FrameTarget, mut extra: Vec<wgpu::CommandBuffer>) -> wgpu::SurfaceTexture {
        extra.push(target.encoder.finish());
        ctx.queue.submit(extra);
        target.output
    }
}

/// Render pass that keeps what is already in the target.
pub fn load_pass<'e>(encoder: &'e mut wgpu::CommandEncoder, view: &wgpu::TextureView, label: &str) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    })
}
