use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec3};
use log::warn;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::assets::{AssetRegistry, ImageData, ImageDraw, PropertyDraw, ShadeBackend, Texture};
use crate::blocks::{binding, BlockBuffer, CAM_BLOCK_SIZE, LIGHT_BLOCK_SIZE};
use crate::camera::Camera;
use crate::lights::LightRegistry;
use crate::obj::{MeshData, VERTEX_FLOATS};

mod shaders;

/// GPU renderer drawing the asset registry through the two shading paths.
///
/// The camera and light blocks live in three uniform buffers attached at
/// the binding points from [`crate::blocks::binding`]; both pipelines share
/// the bind-group layout built from those constants, so the programs agree
/// on the buffers by construction.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    property_pipeline: wgpu::RenderPipeline,
    image_pipeline: wgpu::RenderPipeline,
    globals_group: wgpu::BindGroup,
    cam_buffer: wgpu::Buffer,
    dir_buffer: wgpu::Buffer,
    pnt_buffer: wgpu::Buffer,
    property_object_layout: wgpu::BindGroupLayout,
    image_object_layout: wgpu::BindGroupLayout,
    surface_maps_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    mesh_cache: HashMap<String, MeshBuffers>,
    surface_cache: HashMap<String, wgpu::BindGroup>,
    fallback_maps: wgpu::BindGroup,
}

impl Renderer {
    /// Initializes the GPU renderer for the provided window.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = unsafe { instance.create_surface(window.as_ref()) }?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("renderer-device"),
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        // Fifo keeps presentation vsync-bound; the frame loop has no other
        // pacing.
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals-bind-layout"),
            entries: &[
                uniform_entry(binding::DIR_LIGHTS, LIGHT_BLOCK_SIZE),
                uniform_entry(binding::PNT_LIGHTS, LIGHT_BLOCK_SIZE),
                uniform_entry(binding::CAM_DATA, CAM_BLOCK_SIZE),
            ],
        });

        let property_object_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("property-object-layout"),
                entries: &[uniform_entry(0, std::mem::size_of::<PropertyConstants>())],
            });
        let image_object_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("image-object-layout"),
                entries: &[uniform_entry(0, std::mem::size_of::<ImageConstants>())],
            });

        let surface_maps_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("surface-maps-layout"),
                entries: &[
                    texture_entry(0),
                    texture_entry(1),
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let cam_buffer = block_buffer(&device, "cam-data", CAM_BLOCK_SIZE);
        let dir_buffer = block_buffer(&device, "dir-lights", LIGHT_BLOCK_SIZE);
        let pnt_buffer = block_buffer(&device, "pnt-lights", LIGHT_BLOCK_SIZE);

        let globals_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals-bind-group"),
            layout: &globals_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: binding::DIR_LIGHTS,
                    resource: dir_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: binding::PNT_LIGHTS,
                    resource: pnt_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: binding::CAM_DATA,
                    resource: cam_buffer.as_entire_binding(),
                },
            ],
        });

        let property_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("property-shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::property_shader().into()),
        });
        let image_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("image-shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::image_shader().into()),
        });

        let property_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("property-pipeline-layout"),
                bind_group_layouts: &[&globals_layout, &property_object_layout],
                push_constant_ranges: &[],
            });
        let image_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("image-pipeline-layout"),
                bind_group_layouts: &[&globals_layout, &image_object_layout, &surface_maps_layout],
                push_constant_ranges: &[],
            });

        let property_pipeline = build_pipeline(
            &device,
            "property-pipeline",
            &property_pipeline_layout,
            &property_shader,
            surface_format,
        );
        let image_pipeline = build_pipeline(
            &device,
            "image-pipeline",
            &image_pipeline_layout,
            &image_shader,
            surface_format,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("surface-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = ImageData {
            width: 1,
            height: 1,
            pixels: vec![255, 255, 255, 255],
        };
        let fallback_diffuse = upload_image(&device, &queue, &white, "fallback-diffuse");
        let fallback_specular = upload_image(&device, &queue, &white, "fallback-specular");
        let fallback_maps = surface_maps_group(
            &device,
            &surface_maps_layout,
            &sampler,
            &fallback_diffuse,
            &fallback_specular,
            "fallback-maps",
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth,
            property_pipeline,
            image_pipeline,
            globals_group,
            cam_buffer,
            dir_buffer,
            pnt_buffer,
            property_object_layout,
            image_object_layout,
            surface_maps_layout,
            sampler,
            mesh_cache: HashMap::new(),
            surface_cache: HashMap::new(),
            fallback_maps,
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Uploads every mesh and texture held by the registry to the device.
    /// Runs once after scene setup; assets never change afterwards.
    pub fn upload_assets(&mut self, registry: &AssetRegistry) {
        for (name, mesh) in registry.meshes() {
            self.mesh_cache
                .insert(name.to_string(), MeshBuffers::from_data(&self.device, mesh, name));
        }
        for (name, texture) in registry.textures() {
            let group = self.upload_surface(name, texture);
            self.surface_cache.insert(name.to_string(), group);
        }
    }

    /// Flushes whatever sub-ranges of the camera and light blocks changed
    /// since the previous frame. Clean blocks cost nothing.
    pub fn sync_blocks(&self, camera: &mut Camera, lights: &mut LightRegistry) {
        flush_block(&self.queue, &self.cam_buffer, camera.block_mut());
        flush_block(&self.queue, &self.dir_buffer, lights.dir_block_mut());
        flush_block(&self.queue, &self.pnt_buffer, lights.pnt_block_mut());
    }

    /// Draws every model in the registry in a single forward pass.
    pub fn render(&mut self, registry: &AssetRegistry) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Record the dispatcher's routing decisions, then create the
        // per-object bind groups up front; the pass only replays them.
        let mut list = DrawList::default();
        registry.draw_all(&mut list);
        let prepared: Vec<PreparedDraw> = list
            .commands
            .iter()
            .map(|command| self.prepare(command))
            .collect();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("renderer-encoder"),
            });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("forward-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.3,
                        g: 0.3,
                        b: 0.3,
                        a: 1.0,
                    }),
                    store: true,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: true,
                }),
                stencil_ops: None,
            }),
        });

        pass.set_bind_group(0, &self.globals_group, &[]);

        for draw in &prepared {
            let Some(mesh) = self.mesh_cache.get(draw.mesh()) else {
                warn!("mesh {:?} was never uploaded, skipping draw", draw.mesh());
                continue;
            };
            match draw {
                PreparedDraw::Property { group, .. } => {
                    pass.set_pipeline(&self.property_pipeline);
                    pass.set_bind_group(1, group, &[]);
                }
                PreparedDraw::Image { surface, group, .. } => {
                    pass.set_pipeline(&self.image_pipeline);
                    pass.set_bind_group(1, group, &[]);
                    let maps = self.surface_cache.get(surface).unwrap_or(&self.fallback_maps);
                    pass.set_bind_group(2, maps, &[]);
                }
            }
            pass.set_vertex_buffer(0, mesh.vertex.slice(..));
            pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        drop(pass); // explicit to satisfy lifetimes on some backends
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn prepare(&self, command: &DrawCommand) -> PreparedDraw {
        match command {
            DrawCommand::Property { mesh, constants } => PreparedDraw::Property {
                mesh: mesh.clone(),
                group: self.object_group(
                    &self.property_object_layout,
                    bytemuck::bytes_of(constants),
                ),
            },
            DrawCommand::Image {
                mesh,
                surface,
                constants,
            } => PreparedDraw::Image {
                mesh: mesh.clone(),
                surface: surface.clone(),
                group: self.object_group(&self.image_object_layout, bytemuck::bytes_of(constants)),
            },
        }
    }

    fn object_group(&self, layout: &wgpu::BindGroupLayout, contents: &[u8]) -> wgpu::BindGroup {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("object-uniform"),
                contents,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object-bind-group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn upload_surface(&self, name: &str, texture: &Texture) -> wgpu::BindGroup {
        let diffuse = upload_image(
            &self.device,
            &self.queue,
            &texture.diffuse,
            &format!("{name}-diffuse"),
        );
        let specular = upload_image(
            &self.device,
            &self.queue,
            &texture.specular,
            &format!("{name}-specular"),
        );
        surface_maps_group(
            &self.device,
            &self.surface_maps_layout,
            &self.sampler,
            &diffuse,
            &specular,
            name,
        )
    }
}

/// Draw commands recorded from the shading dispatcher.
#[derive(Default)]
struct DrawList {
    commands: Vec<DrawCommand>,
}

enum DrawCommand {
    Property {
        mesh: String,
        constants: PropertyConstants,
    },
    Image {
        mesh: String,
        surface: String,
        constants: ImageConstants,
    },
}

impl ShadeBackend for DrawList {
    fn draw_property_shaded(&mut self, draw: PropertyDraw<'_>) {
        self.commands.push(DrawCommand::Property {
            mesh: draw.mesh.to_string(),
            constants: PropertyConstants {
                model: draw.model_mat.to_cols_array_2d(),
                normal: mat3_to_3x4(draw.norm_mat),
                ambient: extend(draw.material.ambient),
                diffuse: extend(draw.material.diffuse),
                specular: extend(draw.material.specular),
                gloss: [draw.material.gloss, 0.0, 0.0, 0.0],
            },
        });
    }

    fn draw_image_shaded(&mut self, draw: ImageDraw<'_>) {
        self.commands.push(DrawCommand::Image {
            mesh: draw.mesh.to_string(),
            surface: draw.surface.to_string(),
            constants: ImageConstants {
                model: draw.model_mat.to_cols_array_2d(),
                normal: mat3_to_3x4(draw.norm_mat),
                gloss: [draw.texture.gloss, 0.0, 0.0, 0.0],
            },
        });
    }
}

enum PreparedDraw {
    Property {
        mesh: String,
        group: wgpu::BindGroup,
    },
    Image {
        mesh: String,
        surface: String,
        group: wgpu::BindGroup,
    },
}

impl PreparedDraw {
    fn mesh(&self) -> &str {
        match self {
            PreparedDraw::Property { mesh, .. } | PreparedDraw::Image { mesh, .. } => mesh,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PropertyConstants {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
    gloss: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ImageConstants {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    gloss: [f32; 4],
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_data(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

fn uniform_entry(binding: u32, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn block_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn flush_block(queue: &wgpu::Queue, buffer: &wgpu::Buffer, block: &mut BlockBuffer) {
    if let Some((offset, bytes)) = block.take_dirty() {
        queue.write_buffer(buffer, offset as u64, bytes);
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: (VERTEX_FLOATS * std::mem::size_of::<f32>()) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: (3 * std::mem::size_of::<f32>()) as u64,
                        shader_location: 1,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: (6 * std::mem::size_of::<f32>()) as u64,
                        shader_location: 2,
                    },
                ],
            }],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
    })
}

fn upload_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &ImageData,
    label: &str,
) -> wgpu::TextureView {
    const WHITE: [u8; 4] = [255, 255, 255, 255];
    let (width, height, pixels): (u32, u32, &[u8]) = if image.is_empty() {
        (1, 1, &WHITE)
    } else {
        (image.width, image.height, &image.pixels)
    };

    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn surface_maps_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    diffuse: &wgpu::TextureView,
    specular: &wgpu::TextureView,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(diffuse),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(specular),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

fn extend(v: Vec3) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Material;
    use glam::Mat4;

    #[test]
    fn draw_list_records_routing_and_constants() {
        let material = Material {
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::splat(0.9),
            gloss: 0.25,
        };
        let mut list = DrawList::default();
        list.draw_property_shaded(PropertyDraw {
            mesh: "desk",
            surface: "slv_chrome",
            model_mat: Mat4::IDENTITY,
            norm_mat: Mat3::IDENTITY,
            material: &material,
        });

        assert_eq!(list.commands.len(), 1);
        match &list.commands[0] {
            DrawCommand::Property { mesh, constants } => {
                assert_eq!(mesh, "desk");
                assert_eq!(constants.gloss[0], 0.25);
                assert_eq!(constants.normal[0], [1.0, 0.0, 0.0, 0.0]);
            }
            DrawCommand::Image { .. } => panic!("expected the property path"),
        }
    }

    #[test]
    fn uniform_struct_sizes_match_wgsl_layout() {
        // mat4 (64) + mat3x4 (48) + four vec4s
        assert_eq!(std::mem::size_of::<PropertyConstants>(), 176);
        // mat4 (64) + mat3x4 (48) + one vec4
        assert_eq!(std::mem::size_of::<ImageConstants>(), 128);
    }
}
