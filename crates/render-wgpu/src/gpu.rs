use crate::RenderError;
use crate::post::{HDR_FORMAT, PostChain};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use neoleon_material::{MaterialAdapter, ShaderProgram};
use neoleon_render::RenderView;
use neoleon_scene::Scene;
use neoleon_scene::geometry::{self, GridVertex, PositionVertex, Vertex};
use neoleon_scene::{INSTANCE_CAPACITY, Star};
use std::ops::Range;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Floor sits just under the grid lines so they never z-fight.
const FLOOR_HEIGHT: f32 = -0.05;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CityUniforms {
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct TerrainUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

/// Compile WGSL, turning validation failures into [`RenderError::ShaderCompile`].
pub(crate) fn create_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::ShaderCompile {
            label: label.to_string(),
            message: error.to_string(),
        });
    }
    Ok(module)
}

/// Uniform buffer plus its group-1 bind group.
struct Binding {
    buffer: wgpu::Buffer,
    group: wgpu::BindGroup,
}

impl Binding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str, bytes: &[u8]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, group }
    }
}

/// Vertex buffer with an optional index buffer.
struct Mesh {
    vertices: wgpu::Buffer,
    indices: Option<(wgpu::Buffer, wgpu::IndexFormat)>,
    count: u32,
}

impl Mesh {
    fn new<V: Pod>(device: &wgpu::Device, label: &str, vertices: &[V]) -> Self {
        Self {
            vertices: vertex_buffer(device, label, vertices),
            indices: None,
            count: vertices.len() as u32,
        }
    }

    fn indexed<V: Pod, I: Pod>(
        device: &wgpu::Device,
        label: &str,
        vertices: &[V],
        indices: &[I],
        format: wgpu::IndexFormat,
    ) -> Self {
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices: vertex_buffer(device, label, vertices),
            indices: Some((index_buffer, format)),
            count: indices.len() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: Range<u32>) {
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        match &self.indices {
            Some((buffer, format)) => {
                pass.set_index_buffer(buffer.slice(..), *format);
                pass.draw_indexed(0..self.count, 0, instances);
            }
            None => pass.draw(0..self.count, instances),
        }
    }
}

fn vertex_buffer<V: Pod>(device: &wgpu::Device, label: &str, vertices: &[V]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

/// Fixed-function state that differs between scene pipelines.
struct PipelineDesc<'a> {
    label: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    blend: wgpu::BlendState,
    depth_write: bool,
}

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

const GRID_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<GridVertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4, 2 => Float32],
};

const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<PositionVertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
};

const BOX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
};

const INSTANCE_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[[f32; 4]; 4]>() as u64,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
    ],
};

const STAR_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Star>() as u64,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32],
};

/// Compiled modules for both stages of a program. `fragment` is `None`
/// when both entry points live in the vertex module.
struct Modules {
    vertex: wgpu::ShaderModule,
    vertex_entry: &'static str,
    fragment: Option<wgpu::ShaderModule>,
    fragment_entry: &'static str,
}

impl Modules {
    fn from_program(device: &wgpu::Device, program: &ShaderProgram) -> Result<Self, RenderError> {
        let label = program.label();
        Ok(Self {
            vertex: create_module(device, &format!("{label}.vertex"), &program.vertex().source)?,
            vertex_entry: program.vertex().entry_point,
            fragment: Some(create_module(
                device,
                &format!("{label}.fragment"),
                &program.fragment().source,
            )?),
            fragment_entry: program.fragment().entry_point,
        })
    }

    fn single(
        device: &wgpu::Device,
        label: &str,
        source: &str,
        vertex_entry: &'static str,
        fragment_entry: &'static str,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            vertex: create_module(device, label, source)?,
            vertex_entry,
            fragment: None,
            fragment_entry,
        })
    }
}

/// wgpu renderer for the whole scene.
pub struct SceneRenderer {
    view_buffer: wgpu::Buffer,
    view_group: wgpu::BindGroup,

    grid_pipeline: wgpu::RenderPipeline,
    grid_binding: Binding,
    grid_mesh: Mesh,

    floor_pipeline: wgpu::RenderPipeline,
    floor_binding: Binding,
    floor_mesh: Mesh,

    ground_pipeline: wgpu::RenderPipeline,
    ground_binding: Binding,
    ground_mesh: Mesh,

    city_pipeline: wgpu::RenderPipeline,
    city_binding: Binding,
    city_mesh: Mesh,
    city_instances: wgpu::Buffer,

    star_pipeline: wgpu::RenderPipeline,
    star_binding: Binding,
    star_instances: Option<(wgpu::Buffer, u32)>,

    terrain: Option<(wgpu::RenderPipeline, Binding, Mesh)>,

    post: PostChain,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl SceneRenderer {
    /// Upload all static geometry for `scene` and compile every pipeline.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &Scene,
    ) -> Result<Self, RenderError> {
        let config = scene.config();

        let uniform_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let view_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("view_layout"),
            entries: &[uniform_entry],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_layout"),
            entries: &[uniform_entry],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&view_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let view_uniforms = RenderView::from(&config.camera).uniforms(width, height, &config.fog);
        let Binding {
            buffer: view_buffer,
            group: view_group,
        } = Binding::new(device, &view_layout, "view_uniforms", bytemuck::bytes_of(&view_uniforms));

        // Grid
        let grid_pipeline = scene_pipeline(
            device,
            &pipeline_layout,
            &Modules::from_program(device, scene.grid().program())?,
            PipelineDesc {
                label: "grid",
                buffers: &[GRID_LAYOUT],
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );
        let grid_binding =
            Binding::new(device, &material_layout, "grid_uniforms", scene.grid().uniform_bytes());
        let grid_mesh = Mesh::new(device, "grid_vertices", &scene.grid_vertices());

        // Floor
        let floor_pipeline = scene_pipeline(
            device,
            &pipeline_layout,
            &Modules::from_program(device, scene.floor().program())?,
            PipelineDesc {
                label: "floor",
                buffers: &[POSITION_LAYOUT],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );
        let floor_binding =
            Binding::new(device, &material_layout, "floor_uniforms", scene.floor().uniform_bytes());
        let (floor_vertices, floor_indices) = geometry::floor_quad(config.boundary, FLOOR_HEIGHT);
        let floor_mesh = Mesh::indexed(
            device,
            "floor",
            &floor_vertices,
            &floor_indices,
            wgpu::IndexFormat::Uint16,
        );

        // Ground sketch
        let ground_pipeline = scene_pipeline(
            device,
            &pipeline_layout,
            &Modules::from_program(device, scene.ground().program())?,
            PipelineDesc {
                label: "ground",
                buffers: &[POSITION_LAYOUT],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: false,
            },
        );
        let ground_binding = Binding::new(
            device,
            &material_layout,
            "ground_uniforms",
            scene.ground().uniform_bytes(),
        );
        let (ground_vertices, ground_indices) =
            geometry::plane_xy(config.ground.size, config.ground.segments);
        let ground_mesh = Mesh::indexed(
            device,
            "ground",
            &ground_vertices,
            &ground_indices,
            wgpu::IndexFormat::Uint32,
        );

        // City
        let city_pipeline = scene_pipeline(
            device,
            &pipeline_layout,
            &Modules::single(device, "city", &shaders::city_shader(), "vs_city", "fs_city")?,
            PipelineDesc {
                label: "city",
                buffers: &[BOX_LAYOUT, INSTANCE_LAYOUT],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );
        let city_binding = Binding::new(
            device,
            &material_layout,
            "city_uniforms",
            bytemuck::bytes_of(&CityUniforms {
                color: config.city.color.to_linear_rgba(1.0),
            }),
        );
        let (box_vertices, box_indices) = geometry::unit_box();
        let city_mesh = Mesh::indexed(
            device,
            "city_box",
            &box_vertices,
            &box_indices,
            wgpu::IndexFormat::Uint16,
        );
        let city_instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("city_instances"),
            contents: bytemuck::cast_slice(&scene.instances().to_columns()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Stars
        let star_pipeline = scene_pipeline(
            device,
            &pipeline_layout,
            &Modules::from_program(device, scene.stars().program())?,
            PipelineDesc {
                label: "stars",
                buffers: &[STAR_LAYOUT],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                blend: ADDITIVE,
                depth_write: false,
            },
        );
        let star_binding =
            Binding::new(device, &material_layout, "star_uniforms", scene.stars().uniform_bytes());
        let stars = scene.starfield().stars();
        let star_instances = (!stars.is_empty())
            .then(|| (vertex_buffer(device, "star_instances", stars), stars.len() as u32));

        // Terrain
        let terrain = match scene.terrain() {
            Some(mesh) if !mesh.edges.is_empty() => {
                let pipeline = scene_pipeline(
                    device,
                    &pipeline_layout,
                    &Modules::single(
                        device,
                        "terrain",
                        &shaders::terrain_shader(),
                        "vs_terrain",
                        "fs_terrain",
                    )?,
                    PipelineDesc {
                        label: "terrain",
                        buffers: &[POSITION_LAYOUT],
                        topology: wgpu::PrimitiveTopology::LineList,
                        cull_mode: None,
                        blend: wgpu::BlendState::REPLACE,
                        depth_write: true,
                    },
                );
                let c = mesh.color;
                let binding = Binding::new(
                    device,
                    &material_layout,
                    "terrain_uniforms",
                    bytemuck::bytes_of(&TerrainUniforms {
                        model: mesh.model.to_cols_array_2d(),
                        color: [c[0], c[1], c[2], 1.0],
                    }),
                );
                let positions: Vec<PositionVertex> = mesh
                    .positions
                    .iter()
                    .map(|&position| PositionVertex { position })
                    .collect();
                let lines = Mesh::indexed(
                    device,
                    "terrain",
                    &positions,
                    &mesh.edges,
                    wgpu::IndexFormat::Uint32,
                );
                Some((pipeline, binding, lines))
            }
            _ => None,
        };

        let post = PostChain::new(device, surface_format, width, height)?;
        let depth_texture = create_depth_texture(device, width, height);

        tracing::info!(
            "scene renderer ready: {}x{}, {} stars, terrain {}",
            width,
            height,
            star_instances.as_ref().map_or(0, |(_, n)| *n),
            if terrain.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            view_buffer,
            view_group,
            grid_pipeline,
            grid_binding,
            grid_mesh,
            floor_pipeline,
            floor_binding,
            floor_mesh,
            ground_pipeline,
            ground_binding,
            ground_mesh,
            city_pipeline,
            city_binding,
            city_mesh,
            city_instances,
            star_pipeline,
            star_binding,
            star_instances,
            terrain,
            post,
            depth_texture,
            surface_format,
            width: width.max(1),
            height: height.max(1),
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.depth_texture = create_depth_texture(device, self.width, self.height);
        self.post.resize(device, self.width, self.height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame of `scene` as seen from `view` into `target`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        scene: &Scene,
        view: &RenderView,
    ) {
        let config = scene.config();
        let view_uniforms = view.uniforms(self.width, self.height, &config.fog);
        queue.write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&view_uniforms));
        queue.write_buffer(&self.grid_binding.buffer, 0, scene.grid().uniform_bytes());
        queue.write_buffer(&self.floor_binding.buffer, 0, scene.floor().uniform_bytes());
        queue.write_buffer(&self.ground_binding.buffer, 0, scene.ground().uniform_bytes());
        queue.write_buffer(&self.star_binding.buffer, 0, scene.stars().uniform_bytes());
        self.post
            .write_uniforms(queue, &config.post, scene.clock().elapsed() as f32);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let [r, g, b] = config.clear_color.to_linear();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.post.scene_target(),
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
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.view_group, &[]);

            // Opaque first.
            pass.set_pipeline(&self.floor_pipeline);
            pass.set_bind_group(1, &self.floor_binding.group, &[]);
            self.floor_mesh.draw(&mut pass, 0..1);

            pass.set_pipeline(&self.grid_pipeline);
            pass.set_bind_group(1, &self.grid_binding.group, &[]);
            self.grid_mesh.draw(&mut pass, 0..1);

            pass.set_pipeline(&self.city_pipeline);
            pass.set_bind_group(1, &self.city_binding.group, &[]);
            pass.set_vertex_buffer(1, self.city_instances.slice(..));
            self.city_mesh.draw(&mut pass, 0..INSTANCE_CAPACITY as u32);

            if let Some((pipeline, binding, mesh)) = &self.terrain {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &binding.group, &[]);
                mesh.draw(&mut pass, 0..1);
            }

            if config.ground.enabled {
                pass.set_pipeline(&self.ground_pipeline);
                pass.set_bind_group(1, &self.ground_binding.group, &[]);
                self.ground_mesh.draw(&mut pass, 0..1);
            }

            if let Some((buffer, count)) = &self.star_instances {
                pass.set_pipeline(&self.star_pipeline);
                pass.set_bind_group(1, &self.star_binding.group, &[]);
                pass.set_vertex_buffer(0, buffer.slice(..));
                pass.draw(0..6, 0..*count);
            }
        }

        self.post.encode(&mut encoder, target);
        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    modules: &Modules,
    desc: PipelineDesc,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{}_pipeline", desc.label)),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &modules.vertex,
            entry_point: Some(modules.vertex_entry),
            compilation_options: Default::default(),
            buffers: desc.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: modules.fragment.as_ref().unwrap_or(&modules.vertex),
            entry_point: Some(modules.fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            cull_mode: desc.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
