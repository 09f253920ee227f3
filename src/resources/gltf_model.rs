//! glTF 2.0 (`.gltf` / `.glb`) through the `gltf` crate.
//!
//! Node transforms of the default scene are baked into the vertices so the
//! viewer can draw every primitive with the single model instance.

use std::path::Path;

use cgmath::{Matrix, SquareMatrix};

use crate::{
    data_structures::model::{ImageData, MaterialData, MeshData, ModelVertex},
    error::LoadError,
    resources::compute_normals,
};

pub fn load(
    name: &str,
    bytes: &[u8],
    base: Option<&Path>,
) -> Result<(Vec<MeshData>, Vec<MaterialData>), LoadError> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(bytes).map_err(|e| LoadError::parse(name, e))?;
    let buffers =
        gltf::import_buffers(&document, base, blob).map_err(|e| LoadError::parse(name, e))?;
    let images = gltf::import_images(&document, base, &buffers).unwrap_or_else(|e| {
        log::warn!("Images of {name} could not be loaded, rendering untextured: {e}");
        Vec::new()
    });

    let materials = document
        .materials()
        .enumerate()
        .map(|(idx, material)| {
            let pbr = material.pbr_metallic_roughness();
            let diffuse_texture = pbr
                .base_color_texture()
                .and_then(|info| images.get(info.texture().source().index()))
                .and_then(|image| to_rgba8(name, image));
            MaterialData {
                name: material
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{name} material {idx}")),
                // Base colour factors are already linear
                diffuse: pbr.base_color_factor(),
                diffuse_texture,
            }
        })
        .collect::<Vec<_>>();

    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        return Err(LoadError::Empty {
            name: name.to_string(),
        });
    };

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_node(name, &node, cgmath::Matrix4::identity(), &buffers, &mut meshes);
    }
    Ok((meshes, materials))
}

fn collect_node(
    file_name: &str,
    node: &gltf::Node,
    parent: cgmath::Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    meshes: &mut Vec<MeshData>,
) {
    let world = parent * cgmath::Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let normal_matrix = normal_matrix(&world);
        for (idx, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of mesh {:?} in {}: only triangles are supported.",
                    idx,
                    mesh.name(),
                    file_name
                );
                continue;
            }
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()].0[..]));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let mut vertices = positions
                .map(|p| {
                    let p = world * cgmath::Vector4::new(p[0], p[1], p[2], 1.0);
                    ModelVertex {
                        position: [p.x, p.y, p.z],
                        ..Default::default()
                    }
                })
                .collect::<Vec<_>>();
            if let Some(tex_coords) = reader.read_tex_coords(0) {
                for (v, uv) in vertices.iter_mut().zip(tex_coords.into_f32()) {
                    v.tex_coords = uv;
                }
            }
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<_>>(),
                None => (0..vertices.len() as u32).collect(),
            };
            match reader.read_normals() {
                Some(normals) => {
                    use cgmath::InnerSpace;
                    for (v, n) in vertices.iter_mut().zip(normals) {
                        let n = normal_matrix * cgmath::Vector3::from(n);
                        v.normal = if n.magnitude2() > 0.0 {
                            n.normalize().into()
                        } else {
                            n.into()
                        };
                    }
                }
                None => compute_normals(&mut vertices, &indices),
            }
            meshes.push(MeshData {
                name: mesh
                    .name()
                    .map(|n| format!("{n}#{idx}"))
                    .unwrap_or_else(|| format!("{file_name} mesh {}#{idx}", mesh.index())),
                vertices,
                indices,
                material: primitive.material().index(),
            });
        }
    }
    for child in node.children() {
        collect_node(file_name, &child, world, buffers, meshes);
    }
}

fn normal_matrix(world: &cgmath::Matrix4<f32>) -> cgmath::Matrix3<f32> {
    let linear = cgmath::Matrix3::from_cols(
        world.x.truncate(),
        world.y.truncate(),
        world.z.truncate(),
    );
    linear
        .invert()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}

fn to_rgba8(name: &str, image: &gltf::image::Data) -> Option<ImageData> {
    use gltf::image::Format;

    let rgba = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => image
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&p| [p, p, p, 255]).collect(),
        other => {
            log::warn!("Texture format {other:?} in {name} is not supported, rendering untextured.");
            return None;
        }
    };
    Some(ImageData {
        width: image.width,
        height: image.height,
        rgba,
    })
}
