//! Model data: CPU-side load results and their GPU counterparts.
//!
//! Loaders produce a [`ModelData`] on a worker thread. The render thread turns
//! it into a [`Model`] with [`Model::upload`], which owns every buffer and
//! texture needed to draw it. Dropping a `Model` releases those resources.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{instance::Instance, texture::Texture},
    error::LoadError,
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// A copy scaled down so neither side exceeds `max_dimension`, keeping
    /// the aspect ratio. `None` when the image already fits or its pixel
    /// buffer does not match its extent.
    pub fn fitted(&self, max_dimension: u32) -> Option<ImageData> {
        let max_dimension = max_dimension.max(1);
        if self.width <= max_dimension && self.height <= max_dimension {
            return None;
        }
        let factor = max_dimension as f64 / self.width.max(self.height) as f64;
        let width = ((self.width as f64 * factor) as u32).clamp(1, max_dimension);
        let height = ((self.height as f64 * factor) as u32).clamp(1, max_dimension);
        let source = image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone())?;
        let resized =
            image::imageops::resize(&source, width, height, image::imageops::FilterType::Triangle);
        Some(ImageData {
            width,
            height,
            rgba: resized.into_raw(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialData {
    pub name: String,
    /// Linear RGBA multiplier applied to the diffuse texture.
    pub diffuse: [f32; 4],
    pub diffuse_texture: Option<ImageData>,
}

impl MaterialData {
    pub fn untextured(name: impl Into<String>, diffuse: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            diffuse,
            diffuse_texture: None,
        }
    }
}

impl Default for MaterialData {
    fn default() -> Self {
        Self::untextured("default", [0.8, 0.8, 0.8, 1.0])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Index into [`ModelData::materials`]; `None` draws with the default material.
    pub material: Option<usize>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Everything a loader extracted from an asset, ready for GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelData {
    pub name: String,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    /// Uniform factor normalising the source units.
    pub scale: f32,
}

impl ModelData {
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }

    /// Axis aligned bounds of all vertices before scaling, if there are any.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut vertices = self.meshes.iter().flat_map(|m| m.vertices.iter());
        let first = vertices.next()?.position;
        Some(vertices.fold((first, first), |(mut min, mut max), v| {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
            (min, max)
        }))
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    diffuse: [f32; 4],
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub diffuse_texture: Texture,
    pub uniform: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse: [f32; 4],
        diffuse_texture: Texture,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} material uniform")),
            contents: bytemuck::cast_slice(&[MaterialUniform { diffuse }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let sampler = diffuse_texture
            .sampler
            .clone()
            .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            diffuse_texture,
            uniform,
            bind_group,
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

/// A model resident on the GPU. The last material is always the fallback
/// used by meshes that reference none.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub instance: Instance,
    pub instance_buffer: wgpu::Buffer,
}

impl Model {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        data: &ModelData,
    ) -> Result<Self, LoadError> {
        let mut materials = Vec::with_capacity(data.materials.len() + 1);
        for m in data.materials.iter() {
            let texture = match &m.diffuse_texture {
                Some(image) => {
                    let resized = image.fitted(device.limits().max_texture_dimension_2d);
                    if let Some(r) = &resized {
                        log::warn!(
                            "Texture of {} is {}x{}, downscaled to {}x{} for this device.",
                            m.name,
                            image.width,
                            image.height,
                            r.width,
                            r.height
                        );
                    }
                    let image = resized.as_ref().unwrap_or(image);
                    Texture::from_rgba8(
                        device,
                        queue,
                        image.width,
                        image.height,
                        &image.rgba,
                        &m.name,
                    )
                    .map_err(|e| LoadError::parse(&data.name, e))?
                }
                None => Texture::create_solid([255; 4], device, queue, &m.name),
            };
            materials.push(Material::new(device, &m.name, m.diffuse, texture, layout));
        }
        let fallback = MaterialData::default();
        materials.push(Material::new(
            device,
            &fallback.name,
            fallback.diffuse,
            Texture::create_solid([255; 4], device, queue, &fallback.name),
            layout,
        ));
        let fallback_index = materials.len() - 1;

        let meshes = data
            .meshes
            .iter()
            .filter(|m| !m.indices.is_empty())
            .map(|m| {
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", m.name)),
                    contents: bytemuck::cast_slice(&m.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", m.name)),
                    contents: bytemuck::cast_slice(&m.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let material = match m.material {
                    Some(idx) if idx < data.materials.len() => idx,
                    Some(idx) => {
                        log::warn!(
                            "Mesh {} references material {} but {} only has {}.",
                            m.name,
                            idx,
                            data.name,
                            data.materials.len()
                        );
                        fallback_index
                    }
                    None => fallback_index,
                };
                Mesh {
                    name: m.name.clone(),
                    vertex_buffer,
                    index_buffer,
                    num_elements: m.indices.len() as u32,
                    material,
                }
            })
            .collect::<Vec<_>>();
        if meshes.is_empty() {
            return Err(LoadError::Empty {
                name: data.name.clone(),
            });
        }

        let instance = Instance::scaled(data.scale);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", data.name)),
            contents: bytemuck::cast_slice(&[instance.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            name: data.name.clone(),
            meshes,
            materials,
            instance,
            instance_buffer,
        })
    }
}

pub trait DrawModel {
    fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );
    fn draw_model(
        &mut self,
        model: &Model,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_model(
        &mut self,
        model: &Model,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(1, model.instance_buffer.slice(..));
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            self.draw_mesh(mesh, material, camera_bind_group, light_bind_group);
        }
    }
}
