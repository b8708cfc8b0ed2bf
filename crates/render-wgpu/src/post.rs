//! Bloom and film-grain composite.
//!
//! The scene renders into an HDR target owned here. Each frame runs a
//! bright pass and a separable blur at half resolution, then composites
//! scene + bloom with grain and scanlines onto the output view.

use crate::RenderError;
use crate::gpu::create_module;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use neoleon_common::PostConfig;

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// GPU layout of `PostParams`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PostUniforms {
    /// `(strength, threshold, radius, 0)`.
    pub bloom: [f32; 4],
    /// `(noise, scanlines, scanline count, grayscale)`.
    pub film: [f32; 4],
    /// `(time, 0, blur direction in uv units)`.
    pub pass_info: [f32; 4],
}

impl PostUniforms {
    /// A disabled chain still composites, with every effect at zero.
    pub fn from_config(config: &PostConfig, time: f32, direction: [f32; 2]) -> Self {
        let on = if config.enabled { 1.0 } else { 0.0 };
        Self {
            bloom: [
                config.bloom_strength * on,
                config.bloom_threshold,
                config.bloom_radius,
                0.0,
            ],
            film: [
                config.film_noise * on,
                config.film_scanlines * on,
                config.film_scanline_count,
                if config.film_grayscale && config.enabled { 1.0 } else { 0.0 },
            ],
            pass_info: [time, 0.0, direction[0], direction[1]],
        }
    }
}

const BRIGHT: usize = 0;
const BLUR_H: usize = 1;
const BLUR_V: usize = 2;
const COMPOSITE: usize = 3;

/// Size-dependent textures and the bind groups that reference them.
struct Targets {
    hdr: wgpu::TextureView,
    bright: wgpu::TextureView,
    blur: wgpu::TextureView,
    pass_groups: [wgpu::BindGroup; 4],
    bloom_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

pub struct PostChain {
    sampler: wgpu::Sampler,
    source_layout: wgpu::BindGroupLayout,
    bloom_layout: wgpu::BindGroupLayout,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    uniforms: [wgpu::Buffer; 4],
    targets: Targets,
}

impl PostChain {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let source_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post_source_layout"),
            entries: &[
                texture_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let bloom_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post_bloom_layout"),
            entries: &[texture_entry(0)],
        });

        let single = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post_pass_layout"),
            bind_group_layouts: &[&source_layout],
            push_constant_ranges: &[],
        });
        let composite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post_composite_layout"),
            bind_group_layouts: &[&source_layout, &bloom_layout],
            push_constant_ranges: &[],
        });

        let bright_module = create_module(device, "post_bright", &shaders::bright_shader())?;
        let blur_module = create_module(device, "post_blur", &shaders::blur_shader())?;
        let composite_module =
            create_module(device, "post_composite", &shaders::composite_shader())?;

        let bright_pipeline =
            fullscreen_pipeline(device, "bright", &single, &bright_module, "fs_bright", HDR_FORMAT);
        let blur_pipeline =
            fullscreen_pipeline(device, "blur", &single, &blur_module, "fs_blur", HDR_FORMAT);
        let composite_pipeline = fullscreen_pipeline(
            device,
            "composite",
            &composite_layout,
            &composite_module,
            "fs_composite",
            output_format,
        );

        let uniforms = ["bright", "blur_h", "blur_v", "composite"].map(|name| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("post_{name}_uniforms")),
                size: std::mem::size_of::<PostUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let targets = Targets::new(
            device,
            &sampler,
            &source_layout,
            &bloom_layout,
            &uniforms,
            width,
            height,
        );

        Ok(Self {
            sampler,
            source_layout,
            bloom_layout,
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            uniforms,
            targets,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.targets = Targets::new(
            device,
            &self.sampler,
            &self.source_layout,
            &self.bloom_layout,
            &self.uniforms,
            width,
            height,
        );
    }

    /// View the scene should render into.
    pub fn scene_target(&self) -> &wgpu::TextureView {
        &self.targets.hdr
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, config: &PostConfig, time: f32) {
        let (w, h) = half_size(self.targets.width, self.targets.height);
        let directions = [[0.0, 0.0], [1.0 / w as f32, 0.0], [0.0, 1.0 / h as f32], [0.0, 0.0]];
        for (buffer, direction) in self.uniforms.iter().zip(directions) {
            let block = PostUniforms::from_config(config, time, direction);
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&block));
        }
    }

    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let t = &self.targets;
        fullscreen_pass(
            encoder,
            "post_bright",
            &t.bright,
            &self.bright_pipeline,
            &[&t.pass_groups[BRIGHT]],
        );
        fullscreen_pass(
            encoder,
            "post_blur_h",
            &t.blur,
            &self.blur_pipeline,
            &[&t.pass_groups[BLUR_H]],
        );
        fullscreen_pass(
            encoder,
            "post_blur_v",
            &t.bright,
            &self.blur_pipeline,
            &[&t.pass_groups[BLUR_V]],
        );
        fullscreen_pass(
            encoder,
            "post_composite",
            output,
            &self.composite_pipeline,
            &[&t.pass_groups[COMPOSITE], &t.bloom_group],
        );
    }
}

impl Targets {
    fn new(
        device: &wgpu::Device,
        sampler: &wgpu::Sampler,
        source_layout: &wgpu::BindGroupLayout,
        bloom_layout: &wgpu::BindGroupLayout,
        uniforms: &[wgpu::Buffer; 4],
        width: u32,
        height: u32,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let (half_w, half_h) = half_size(width, height);
        let hdr = color_target(device, "scene_hdr", width, height);
        let bright = color_target(device, "bloom_bright", half_w, half_h);
        let blur = color_target(device, "bloom_blur", half_w, half_h);

        let source_group = |label: &str, view: &wgpu::TextureView, uniforms: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: source_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniforms.as_entire_binding(),
                    },
                ],
            })
        };
        let pass_groups = [
            source_group("post_bright_group", &hdr, &uniforms[BRIGHT]),
            source_group("post_blur_h_group", &bright, &uniforms[BLUR_H]),
            source_group("post_blur_v_group", &blur, &uniforms[BLUR_V]),
            source_group("post_composite_group", &hdr, &uniforms[COMPOSITE]),
        ];
        let bloom_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post_bloom_group"),
            layout: bloom_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&bright),
            }],
        });

        Self {
            hdr,
            bright,
            blur,
            pass_groups,
            bloom_group,
            width,
            height,
        }
    }
}

fn half_size(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

fn color_target(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("post_{label}_pipeline")),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_fullscreen"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    groups: &[&wgpu::BindGroup],
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });
    pass.set_pipeline(pipeline);
    for (index, group) in groups.iter().enumerate() {
        pass.set_bind_group(index as u32, *group, &[]);
    }
    pass.draw(0..3, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<PostUniforms>(), 48);
    }

    #[test]
    fn enabled_chain_carries_config() {
        let block = PostUniforms::from_config(&PostConfig::default(), 2.0, [0.5, 0.0]);
        assert_eq!(block.bloom, [2.9, 0.24, 0.0, 0.0]);
        assert_eq!(block.film, [0.25, 0.4, 640.0, 0.0]);
        assert_eq!(block.pass_info, [2.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn disabled_chain_is_a_passthrough() {
        let config = PostConfig {
            enabled: false,
            film_grayscale: true,
            ..PostConfig::default()
        };
        let block = PostUniforms::from_config(&config, 0.0, [0.0, 0.0]);
        assert_eq!(block.bloom[0], 0.0);
        assert_eq!(block.film[0], 0.0);
        assert_eq!(block.film[1], 0.0);
        assert_eq!(block.film[3], 0.0);
    }

    #[test]
    fn half_size_never_reaches_zero() {
        assert_eq!(half_size(1, 1), (1, 1));
        assert_eq!(half_size(1280, 720), (640, 360));
    }
}
