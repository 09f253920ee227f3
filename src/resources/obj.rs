//! Wavefront OBJ + MTL through `tobj`.

use std::io::{BufReader, Cursor};

use crate::{
    data_structures::{
        color::srgb_to_linear,
        model::{MaterialData, MeshData, ModelVertex},
    },
    error::LoadError,
    resources::{AssetSource, LoadStage, blocking, compute_normals, fetch, texture::decode_image},
};

/// Parse an OBJ file whose material library has already been fetched.
///
/// The material library is handed to `tobj` no matter which `mtllib` name the
/// OBJ file mentions, since the companion file was resolved by convention.
pub fn load(
    name: &str,
    obj: &[u8],
    mtl: &[u8],
) -> Result<(Vec<MeshData>, Vec<tobj::Material>), LoadError> {
    let mut obj_reader = BufReader::new(Cursor::new(obj));
    let load_mtl = || tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl)));

    let (models, obj_materials) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| load_mtl(),
    )
    .map_err(|e| LoadError::parse(name, e))?;

    let mut materials = obj_materials.map_err(|e| LoadError::Material {
        name: name.to_string(),
        cause: e.to_string(),
    })?;
    if materials.is_empty() {
        // No `mtllib` statement, fall back to the library next to the model
        materials = load_mtl()
            .map_err(|e| LoadError::Material {
                name: name.to_string(),
                cause: e.to_string(),
            })?
            .0;
    }

    let meshes = models.iter().map(|m| to_mesh(name, m)).collect();
    Ok((meshes, materials))
}

fn to_mesh(file_name: &str, m: &tobj::Model) -> MeshData {
    let mut vertices = (0..m.mesh.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                m.mesh.positions[i * 3],
                m.mesh.positions[i * 3 + 1],
                m.mesh.positions[i * 3 + 2],
            ],
            tex_coords: [
                m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        })
        .collect::<Vec<_>>();
    if m.mesh.normals.is_empty() {
        compute_normals(&mut vertices, &m.mesh.indices);
    }
    let name = if m.name.is_empty() {
        file_name.to_string()
    } else {
        m.name.clone()
    };

    MeshData {
        name,
        vertices,
        // The indices are for positions, texels, and normals because `single_index` is set
        indices: m.mesh.indices.clone(),
        material: m.mesh.material_id,
    }
}

/// Convert `tobj` materials, fetching `map_Kd` textures relative to the library.
///
/// A texture that cannot be read or decoded only costs the material its map.
pub async fn load_materials(
    library: &AssetSource,
    materials: Vec<tobj::Material>,
) -> Vec<MaterialData> {
    let mut converted = Vec::with_capacity(materials.len());
    for m in materials {
        let [r, g, b] = m.diffuse.unwrap_or([0.8, 0.8, 0.8]);
        let diffuse = [
            srgb_to_linear(r),
            srgb_to_linear(g),
            srgb_to_linear(b),
            m.dissolve.unwrap_or(1.0),
        ];
        let diffuse_texture = match m.diffuse_texture.as_deref() {
            Some(texture) => load_texture(library, texture).await,
            None => None,
        };
        converted.push(MaterialData {
            name: m.name,
            diffuse,
            diffuse_texture,
        });
    }
    converted
}

async fn load_texture(
    library: &AssetSource,
    texture: &str,
) -> Option<crate::data_structures::model::ImageData> {
    let Some(source) = library.sibling(texture) else {
        log::warn!("Texture {texture} cannot be resolved relative to {library}.");
        return None;
    };
    let bytes = match fetch(&source, LoadStage::Materials, &mut |_, _| {}).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Skipping texture {texture}: {e}");
            return None;
        }
    };
    let label = texture.to_string();
    match blocking(move || decode_image(&label, &bytes)).await {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("Skipping texture {texture}: {e}");
            None
        }
    }
}
