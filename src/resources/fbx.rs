//! Binary FBX through `fbxcel`.
//!
//! Loading happens in two steps. [`read_document`] walks the node tree that
//! `fbxcel` parsed and keeps the objects the viewer cares about in an
//! [`FbxDocument`]. [`assemble`] turns those records into triangle meshes:
//! polygons are fan-triangulated, layer elements are resolved per polygon
//! vertex and the local transform of the owning model is baked in.

use std::{collections::HashMap, io::Cursor};

use cgmath::{InnerSpace, Matrix, SquareMatrix};
use fbxcel::{
    low::v7400::AttributeValue,
    tree::{any::AnyTree, v7400::NodeHandle},
};

use crate::{
    data_structures::{
        color::srgb_to_linear,
        model::{MaterialData, MeshData, ModelVertex},
    },
    error::LoadError,
    resources::compute_normals,
};

/// How a layer element maps onto the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mapping {
    ByPolygonVertex,
    ByControlPoint,
    ByPolygon,
    AllSame,
}

impl Mapping {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ByPolygonVertex" => Some(Mapping::ByPolygonVertex),
            "ByVertice" | "ByVertex" | "ByControlPoint" => Some(Mapping::ByControlPoint),
            "ByPolygon" => Some(Mapping::ByPolygon),
            "AllSame" => Some(Mapping::AllSame),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reference {
    Direct,
    IndexToDirect,
}

impl Reference {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "Direct" => Some(Reference::Direct),
            "IndexToDirect" | "Index" => Some(Reference::IndexToDirect),
            _ => None,
        }
    }
}

/// Per-vertex data such as normals or UVs attached to a geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerElement {
    pub mapping: Mapping,
    pub reference: Reference,
    /// Flattened tuples of `components` values each.
    pub values: Vec<f64>,
    pub index: Vec<i32>,
    pub components: usize,
}

impl LayerElement {
    /// Value tuple for the given polygon vertex, `None` when out of range.
    pub fn get(&self, polygon_vertex: usize, control_point: usize, polygon: usize) -> Option<&[f64]> {
        let element = match self.mapping {
            Mapping::ByPolygonVertex => polygon_vertex,
            Mapping::ByControlPoint => control_point,
            Mapping::ByPolygon => polygon,
            Mapping::AllSame => 0,
        };
        let slot = match self.reference {
            Reference::Direct => element,
            Reference::IndexToDirect => usize::try_from(*self.index.get(element)?).ok()?,
        };
        self.values
            .get(slot * self.components..(slot + 1) * self.components)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub id: i64,
    pub name: String,
    pub control_points: Vec<[f64; 3]>,
    /// Control point indices; the last index of each polygon is stored as `!index`.
    pub polygon_vertex_index: Vec<i32>,
    pub normals: Option<LayerElement>,
    pub uvs: Option<LayerElement>,
}

/// Local transform of a `Model` object. Rotation is XYZ Euler in degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelNode {
    pub id: i64,
    pub name: String,
    pub translation: [f64; 3],
    pub rotation: [f64; 3],
    pub scaling: [f64; 3],
}

impl ModelNode {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scaling: [1.0; 3],
        }
    }

    pub fn matrix(&self) -> cgmath::Matrix4<f32> {
        let [tx, ty, tz] = self.translation.map(|v| v as f32);
        let [rx, ry, rz] = self.rotation.map(|v| v as f32);
        let [sx, sy, sz] = self.scaling.map(|v| v as f32);
        cgmath::Matrix4::from_translation(cgmath::Vector3::new(tx, ty, tz))
            * cgmath::Matrix4::from_angle_z(cgmath::Deg(rz))
            * cgmath::Matrix4::from_angle_y(cgmath::Deg(ry))
            * cgmath::Matrix4::from_angle_x(cgmath::Deg(rx))
            * cgmath::Matrix4::from_nonuniform_scale(sx, sy, sz)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialNode {
    pub id: i64,
    pub name: String,
    /// sRGB diffuse colour.
    pub diffuse: [f64; 3],
}

/// The subset of an FBX file the viewer draws.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FbxDocument {
    pub geometries: Vec<Geometry>,
    pub models: Vec<ModelNode>,
    pub materials: Vec<MaterialNode>,
    /// Object-object connections as `(child, parent)`.
    pub connections: Vec<(i64, i64)>,
}

pub fn load(name: &str, bytes: &[u8]) -> Result<(Vec<MeshData>, Vec<MaterialData>), LoadError> {
    let document = read_document(name, bytes)?;
    assemble(name, &document)
}

pub fn read_document(name: &str, bytes: &[u8]) -> Result<FbxDocument, LoadError> {
    let tree = match AnyTree::from_seekable_reader(Cursor::new(bytes)) {
        Ok(AnyTree::V7400(_, tree, ..)) => tree,
        Ok(_) => return Err(LoadError::parse(name, "unsupported FBX version")),
        Err(e) => return Err(LoadError::parse(name, e)),
    };
    let root = tree.root();
    let mut document = FbxDocument::default();

    if let Some(objects) = child(&root, "Objects") {
        for object in objects.children() {
            match object.name() {
                "Geometry" if class_of(&object) == Some("Mesh") => {
                    document.geometries.push(read_geometry(&object));
                }
                "Model" => document.models.push(read_model(&object)),
                "Material" => document.materials.push(read_material(&object)),
                _ => (),
            }
        }
    }
    if let Some(connections) = child(&root, "Connections") {
        for c in connections.children().filter(|c| c.name() == "C") {
            let attrs = c.attributes();
            if let (Some("OO"), Some(from), Some(to)) =
                (string(attrs, 0), int(attrs, 1), int(attrs, 2))
            {
                document.connections.push((from, to));
            }
        }
    }
    log::debug!(
        "{}: {} geometries, {} models, {} materials, {} connections",
        name,
        document.geometries.len(),
        document.models.len(),
        document.materials.len(),
        document.connections.len()
    );
    Ok(document)
}

fn child<'a>(node: &NodeHandle<'a>, name: &str) -> Option<NodeHandle<'a>> {
    node.children().find(|c| c.name() == name)
}

fn string(attrs: &[AttributeValue], idx: usize) -> Option<&str> {
    match attrs.get(idx)? {
        AttributeValue::String(s) => Some(s.as_str()),
        _ => None,
    }
}

fn int(attrs: &[AttributeValue], idx: usize) -> Option<i64> {
    match attrs.get(idx)? {
        AttributeValue::I64(v) => Some(*v),
        AttributeValue::I32(v) => Some(*v as i64),
        AttributeValue::I16(v) => Some(*v as i64),
        _ => None,
    }
}

fn float(attrs: &[AttributeValue], idx: usize) -> Option<f64> {
    match attrs.get(idx)? {
        AttributeValue::F64(v) => Some(*v),
        AttributeValue::F32(v) => Some(*v as f64),
        AttributeValue::I32(v) => Some(*v as f64),
        AttributeValue::I64(v) => Some(*v as f64),
        _ => None,
    }
}

fn first_attribute<'a>(node: &NodeHandle<'a>, name: &str) -> Option<&'a AttributeValue> {
    let child = child(node, name)?;
    child.attributes().first()
}

fn f64_array(node: &NodeHandle, name: &str) -> Vec<f64> {
    match first_attribute(node, name) {
        Some(AttributeValue::ArrF64(v)) => v.clone(),
        Some(AttributeValue::ArrF32(v)) => v.iter().map(|&f| f as f64).collect(),
        _ => Vec::new(),
    }
}

fn i32_array(node: &NodeHandle, name: &str) -> Vec<i32> {
    match first_attribute(node, name) {
        Some(AttributeValue::ArrI32(v)) => v.clone(),
        Some(AttributeValue::ArrI64(v)) => v.iter().map(|&i| i as i32).collect(),
        _ => Vec::new(),
    }
}

fn child_string(node: &NodeHandle, name: &str) -> Option<String> {
    match first_attribute(node, name)? {
        AttributeValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Object names are stored as `Name\0\x01Class`.
fn object_name(node: &NodeHandle) -> String {
    string(node.attributes(), 1)
        .map(|s| s.split('\u{0}').next().unwrap_or(s).to_string())
        .unwrap_or_default()
}

fn class_of<'a>(node: &NodeHandle<'a>) -> Option<&'a str> {
    string(node.attributes(), 2)
}

fn read_layer(node: &NodeHandle, element: &str, values: &str, index: &str, components: usize) -> Option<LayerElement> {
    let layer = child(node, element)?;
    let mapping = child_string(&layer, "MappingInformationType")
        .and_then(|s| Mapping::parse(&s))?;
    let reference = child_string(&layer, "ReferenceInformationType")
        .and_then(|s| Reference::parse(&s))
        .unwrap_or(Reference::Direct);
    let values = f64_array(&layer, values);
    if values.is_empty() {
        return None;
    }
    Some(LayerElement {
        mapping,
        reference,
        values,
        index: i32_array(&layer, index),
        components,
    })
}

fn read_geometry(node: &NodeHandle) -> Geometry {
    let control_points = f64_array(node, "Vertices")
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    Geometry {
        id: int(node.attributes(), 0).unwrap_or_default(),
        name: object_name(node),
        control_points,
        polygon_vertex_index: i32_array(node, "PolygonVertexIndex"),
        normals: read_layer(node, "LayerElementNormal", "Normals", "NormalsIndex", 3),
        uvs: read_layer(node, "LayerElementUV", "UV", "UVIndex", 2),
    }
}

/// `(name, [x, y, z])` entries of a `Properties70` block.
fn vector_properties(node: &NodeHandle) -> HashMap<String, [f64; 3]> {
    let mut props = HashMap::new();
    if let Some(p70) = child(node, "Properties70") {
        for p in p70.children().filter(|p| p.name() == "P") {
            let attrs = p.attributes();
            if let (Some(name), Some(x), Some(y), Some(z)) =
                (string(attrs, 0), float(attrs, 4), float(attrs, 5), float(attrs, 6))
            {
                props.insert(name.to_string(), [x, y, z]);
            }
        }
    }
    props
}

fn read_model(node: &NodeHandle) -> ModelNode {
    let props = vector_properties(node);
    let mut model = ModelNode::new(int(node.attributes(), 0).unwrap_or_default(), object_name(node));
    if let Some(t) = props.get("Lcl Translation") {
        model.translation = *t;
    }
    if let Some(r) = props.get("Lcl Rotation") {
        model.rotation = *r;
    }
    if let Some(s) = props.get("Lcl Scaling") {
        model.scaling = *s;
    }
    model
}

fn read_material(node: &NodeHandle) -> MaterialNode {
    let props = vector_properties(node);
    MaterialNode {
        id: int(node.attributes(), 0).unwrap_or_default(),
        name: object_name(node),
        diffuse: props
            .get("DiffuseColor")
            .or_else(|| props.get("Diffuse"))
            .copied()
            .unwrap_or([0.8, 0.8, 0.8]),
    }
}

/// Build triangle meshes out of the records of an FBX document.
pub fn assemble(
    name: &str,
    document: &FbxDocument,
) -> Result<(Vec<MeshData>, Vec<MaterialData>), LoadError> {
    let models: HashMap<i64, &ModelNode> = document.models.iter().map(|m| (m.id, m)).collect();
    let material_ids: HashMap<i64, usize> = document
        .materials
        .iter()
        .enumerate()
        .map(|(idx, m)| (m.id, idx))
        .collect();
    let materials = document
        .materials
        .iter()
        .map(|m| {
            let [r, g, b] = m.diffuse.map(|c| srgb_to_linear(c as f32));
            MaterialData::untextured(m.name.clone(), [r, g, b, 1.0])
        })
        .collect::<Vec<_>>();

    let mut meshes = Vec::with_capacity(document.geometries.len());
    for geometry in document.geometries.iter() {
        let owner = document
            .connections
            .iter()
            .find(|(child, _)| *child == geometry.id)
            .and_then(|(_, parent)| models.get(parent));
        let transform = owner.map_or(cgmath::Matrix4::identity(), |m| m.matrix());
        let material = owner.and_then(|m| {
            document
                .connections
                .iter()
                .filter(|(_, parent)| *parent == m.id)
                .find_map(|(child, _)| material_ids.get(child).copied())
        });
        match triangulate(geometry, &transform) {
            Some((vertices, indices)) => meshes.push(MeshData {
                name: owner.map_or_else(|| geometry.name.clone(), |m| m.name.clone()),
                vertices,
                indices,
                material,
            }),
            None => log::warn!(
                "Geometry {} in {} has no triangles and was skipped.",
                geometry.name,
                name
            ),
        }
    }
    if meshes.is_empty() {
        return Err(LoadError::Empty {
            name: name.to_string(),
        });
    }
    Ok((meshes, materials))
}

/// Fan-triangulate every polygon, emitting one vertex per polygon vertex.
///
/// Returns `None` when the geometry yields no triangle at all.
pub fn triangulate(
    geometry: &Geometry,
    transform: &cgmath::Matrix4<f32>,
) -> Option<(Vec<ModelVertex>, Vec<u32>)> {
    let linear = cgmath::Matrix3::from_cols(
        transform.x.truncate(),
        transform.y.truncate(),
        transform.z.truncate(),
    );
    let normal_matrix = linear.invert().map(|m| m.transpose()).unwrap_or(linear);

    let mut vertices = Vec::with_capacity(geometry.polygon_vertex_index.len());
    let mut indices = Vec::new();
    let mut polygon_start = 0usize;
    let mut polygon = 0usize;

    for (pv, &raw) in geometry.polygon_vertex_index.iter().enumerate() {
        let last = raw < 0;
        let cp = if last { !raw } else { raw } as usize;
        let Some(point) = geometry.control_points.get(cp) else {
            log::warn!(
                "Geometry {} references control point {} of {}.",
                geometry.name,
                cp,
                geometry.control_points.len()
            );
            return None;
        };
        let p = transform
            * cgmath::Vector4::new(point[0] as f32, point[1] as f32, point[2] as f32, 1.0);
        let normal = geometry
            .normals
            .as_ref()
            .and_then(|n| n.get(pv, cp, polygon))
            .map(|n| {
                let n = normal_matrix * cgmath::Vector3::new(n[0] as f32, n[1] as f32, n[2] as f32);
                if n.magnitude2() > 0.0 { n.normalize() } else { n }
            });
        let uv = geometry
            .uvs
            .as_ref()
            .and_then(|uv| uv.get(pv, cp, polygon))
            .map_or([0.0, 0.0], |uv| [uv[0] as f32, 1.0 - uv[1] as f32]);
        vertices.push(ModelVertex {
            position: [p.x, p.y, p.z],
            tex_coords: uv,
            normal: normal.map_or([0.0; 3], Into::into),
        });

        if last {
            let count = vertices.len() - polygon_start;
            for i in 1..count.saturating_sub(1) {
                indices.push(polygon_start as u32);
                indices.push((polygon_start + i) as u32);
                indices.push((polygon_start + i + 1) as u32);
            }
            polygon_start = vertices.len();
            polygon += 1;
        }
    }

    if indices.is_empty() {
        return None;
    }
    if geometry.normals.is_none() {
        compute_normals(&mut vertices, &indices);
    }
    Some((vertices, indices))
}
