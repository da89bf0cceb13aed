//! Camera background: BGR frame upload and a mirrored fullscreen quad.

use glam::Vec2;
use rayon::prelude::*;

use popcorn_core::Frame;

use crate::context::RenderContext;

/// Background pass parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VideoParams {
    /// Shake offset in NDC.
    pub offset: [f32; 2],
    /// Mix toward white, 0..1.
    pub flash: f32,
    /// 1 flips U so the user sees a mirror image.
    pub mirror: f32,
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            flash: 0.0,
            mirror: 1.0,
        }
    }
}

/// Convert a packed BGR frame into RGBA rows, reusing `out`.
pub fn bgr_to_rgba(frame: &Frame, out: &mut Vec<u8>) {
    let pixels = frame.width as usize * frame.height as usize;
    out.resize(pixels * 4, 0);
    out.par_chunks_exact_mut(4)
        .zip(frame.data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = 255;
        });
}

struct VideoTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

pub struct VideoPipeline {
    pipeline: wgpu::RenderPipeline,
    params_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    texture: Option<VideoTexture>,
    staging: Vec<u8>,
}

impl VideoPipeline {
    pub fn new(ctx: &RenderContext) -> Self {
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Video Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/video.wgsl").into()),
        });

        let params_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Video Params"),
            size: std::mem::size_of::<VideoParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Video Bind Group Layout"),
            entries: &[
                // Camera frame
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
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Video Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Video Pipeline"),
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
                    format: ctx.format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Video Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            params_buffer,
            bind_group_layout,
            sampler,
            texture: None,
            staging: Vec::new(),
        }
    }

    fn create_texture(&self, device: &wgpu::Device, width: u32, height: u32) -> VideoTexture {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Camera Frame"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Video Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.params_buffer.as_entire_binding(),
                },
            ],
        });
        log::info!("Video texture created at {}x{}", width, height);
        VideoTexture {
            texture,
            bind_group,
            width,
            height,
        }
    }

    /// Upload a camera frame, recreating the texture when the size changes.
    pub fn update_texture(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &Frame) {
        if frame.width == 0 || frame.height == 0 {
            return;
        }
        let stale = self
            .texture
            .as_ref()
            .map_or(true, |t| t.width != frame.width || t.height != frame.height);
        if stale {
            self.texture = Some(self.create_texture(device, frame.width, frame.height));
        }
        let mut staging = std::mem::take(&mut self.staging);
        bgr_to_rgba(frame, &mut staging);
        if let Some(tex) = &self.texture {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &tex.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &staging,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * tex.width),
                    rows_per_image: Some(tex.height),
                },
                wgpu::Extent3d {
                    width: tex.width,
                    height: tex.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        self.staging = staging;
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Set shake (pixels in a `screen`-sized layout) and flash for the next draw.
    pub fn update_params(&self, queue: &wgpu::Queue, shake_px: Vec2, screen: Vec2, flash: f32) {
        let offset = crate::geometry::pixel_offset_to_ndc(shake_px, screen);
        let params = VideoParams {
            offset: offset.to_array(),
            flash: flash.clamp(0.0, 1.0),
            ..VideoParams::default()
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }

    /// Fullscreen quad. Does nothing until a frame has been uploaded.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(tex) = &self.texture {
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &tex.bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgr_to_rgba_swaps_channels() {
        let frame = Frame::from_bgr(2, 1, vec![10, 20, 30, 40, 50, 60]).unwrap();
        let mut out = Vec::new();
        bgr_to_rgba(&frame, &mut out);
        assert_eq!(out, vec![30, 20, 10, 255, 60, 50, 40, 255]);
    }

    #[test]
    fn test_staging_shrinks_to_frame() {
        let mut out = vec![0u8; 64];
        let frame = Frame::solid(2, 2, [0, 0, 255]);
        bgr_to_rgba(&frame, &mut out);
        assert_eq!(out.len(), 16);
        assert!(out.chunks(4).all(|px| px == [255, 0, 0, 255]));
    }

    #[test]
    fn test_default_params_mirror() {
        let p = VideoParams::default();
        assert_eq!(p.mirror, 1.0);
        assert_eq!(std::mem::size_of::<VideoParams>(), 16);
    }
}
