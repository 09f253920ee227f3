use flow_viewer::{
    LoadError,
    resources::{
        AssetFormat, AssetSource, LoadRequest,
        fbx::{self, FbxDocument, Geometry, LayerElement, Mapping, MaterialNode, ModelNode, Reference},
        load_model_data,
    },
};

use std::io::Cursor;

use fbxcel::{
    low::FbxVersion,
    writer::v7400::binary::{Error as WriteError, FbxFooter, Writer},
};

use crate::common::test_utils::runtime;

mod common;

/// A unit quad in the XY plane as one polygon.
fn quad() -> Geometry {
    Geometry {
        id: 10,
        name: "Quad".to_string(),
        control_points: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        // the last index of a polygon is stored bitwise negated
        polygon_vertex_index: vec![0, 1, 2, !3],
        normals: None,
        uvs: None,
    }
}

#[test]
fn polygons_are_fan_triangulated() {
    let (vertices, indices) = fbx::triangulate(&quad(), &cgmath::Matrix4::from_scale(1.0)).unwrap();
    assert_eq!(vertices.len(), 4);
    assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
    // flat normals are generated when the geometry has none
    assert!(vertices.iter().all(|v| (v.normal[2] - 1.0).abs() < 1e-5));
}

#[test]
fn mixed_polygon_sizes() {
    let geometry = Geometry {
        control_points: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [2.0, 0.0, 0.0],
        ],
        // a quad followed by a triangle
        polygon_vertex_index: vec![0, 1, 2, !3, 1, 4, !2],
        ..quad()
    };
    let (vertices, indices) = fbx::triangulate(&geometry, &cgmath::Matrix4::from_scale(1.0)).unwrap();
    assert_eq!(vertices.len(), 7);
    assert_eq!(indices, vec![0, 1, 2, 0, 2, 3, 4, 5, 6]);
}

#[test]
fn layer_elements_resolve_direct_and_indexed() {
    let by_polygon_vertex = LayerElement {
        mapping: Mapping::ByPolygonVertex,
        reference: Reference::IndexToDirect,
        values: vec![0.0, 0.0, 1.0, 1.0],
        index: vec![1, 0],
        components: 2,
    };
    assert_eq!(by_polygon_vertex.get(0, 7, 0), Some(&[1.0, 1.0][..]));
    assert_eq!(by_polygon_vertex.get(1, 7, 0), Some(&[0.0, 0.0][..]));
    assert_eq!(by_polygon_vertex.get(2, 7, 0), None);

    let by_control_point = LayerElement {
        mapping: Mapping::ByControlPoint,
        reference: Reference::Direct,
        values: vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        index: vec![],
        components: 3,
    };
    assert_eq!(by_control_point.get(5, 1, 0), Some(&[0.0, 0.0, 1.0][..]));

    let all_same = LayerElement {
        mapping: Mapping::AllSame,
        ..by_control_point
    };
    assert_eq!(all_same.get(9, 9, 9), Some(&[0.0, 1.0, 0.0][..]));
}

#[test]
fn uvs_are_flipped_and_normals_kept() {
    let geometry = Geometry {
        normals: Some(LayerElement {
            mapping: Mapping::AllSame,
            reference: Reference::Direct,
            values: vec![0.0, 0.0, 2.0],
            index: vec![],
            components: 3,
        }),
        uvs: Some(LayerElement {
            mapping: Mapping::ByControlPoint,
            reference: Reference::Direct,
            values: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            index: vec![],
            components: 2,
        }),
        ..quad()
    };
    let (vertices, _) = fbx::triangulate(&geometry, &cgmath::Matrix4::from_scale(1.0)).unwrap();
    assert_eq!(vertices[0].tex_coords, [0.0, 1.0]);
    assert_eq!(vertices[2].tex_coords, [1.0, 0.0]);
    // normals are normalised after the transform
    assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
}

#[test]
fn model_transform_and_material_are_applied() {
    let mut model = ModelNode::new(20, "Sculpt");
    model.translation = [0.0, 0.0, 5.0];
    model.scaling = [2.0, 2.0, 2.0];
    let document = FbxDocument {
        geometries: vec![quad()],
        models: vec![model],
        materials: vec![MaterialNode {
            id: 30,
            name: "Skin".to_string(),
            diffuse: [1.0, 0.0, 0.0],
        }],
        connections: vec![(10, 20), (30, 20), (20, 0)],
    };

    let (meshes, materials) = fbx::assemble("sculpt.fbx", &document).unwrap();
    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0].name, "Sculpt");
    assert_eq!(meshes[0].material, Some(0));
    assert_eq!(meshes[0].vertices[2].position, [2.0, 2.0, 5.0]);
    assert_eq!(materials[0].name, "Skin");
    let [r, g, b, a] = materials[0].diffuse;
    assert!((r - 1.0).abs() < 1e-5);
    assert_eq!([g, b, a], [0.0, 0.0, 1.0]);
}

#[test]
fn unconnected_geometry_uses_default_material() {
    let document = FbxDocument {
        geometries: vec![quad()],
        ..Default::default()
    };
    let (meshes, materials) = fbx::assemble("loose.fbx", &document).unwrap();
    assert_eq!(meshes[0].name, "Quad");
    assert_eq!(meshes[0].material, None);
    assert!(materials.is_empty());
}

#[test]
fn document_without_triangles_is_empty() {
    let document = FbxDocument {
        geometries: vec![Geometry {
            polygon_vertex_index: vec![0, !1],
            ..quad()
        }],
        ..Default::default()
    };
    let err = fbx::assemble("lines.fbx", &document).unwrap_err();
    assert!(matches!(err, LoadError::Empty { .. }));
}

#[test]
fn out_of_range_control_point_skips_geometry() {
    let geometry = Geometry {
        polygon_vertex_index: vec![0, 1, !9],
        ..quad()
    };
    assert!(fbx::triangulate(&geometry, &cgmath::Matrix4::from_scale(1.0)).is_none());
}

#[test]
fn garbage_bytes_are_a_parse_error() {
    let err = fbx::load("garbage.fbx", b"definitely not an fbx file").unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }));
}

#[test]
fn fbx_loads_report_parse_errors_through_the_loader() {
    let request = LoadRequest::new(
        AssetSource::Bytes {
            name: "dropped.fbx".to_string(),
            bytes: b"; FBX 7.4.0 project file\n".to_vec(),
        },
        AssetFormat::Fbx,
    );
    let err = runtime()
        .block_on(load_model_data(request, |_, _| {}))
        .unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }), "{err}");
    assert!(err.to_string().contains("dropped.fbx"));
}

type FbxWriter = Writer<Cursor<Vec<u8>>>;

fn string_node(w: &mut FbxWriter, name: &str, value: &str) -> Result<(), WriteError> {
    w.new_node(name)?.append_string_direct(value)?;
    w.close_node()
}

/// A `Properties70` entry: name, type, label, flags, then the three values.
fn vector_property(w: &mut FbxWriter, name: &str, kind: &str, value: [f64; 3]) -> Result<(), WriteError> {
    {
        let mut attrs = w.new_node("P")?;
        attrs.append_string_direct(name)?;
        attrs.append_string_direct(kind)?;
        attrs.append_string_direct("")?;
        attrs.append_string_direct("A")?;
        for v in value {
            attrs.append_f64(v)?;
        }
    }
    w.close_node()
}

fn object(w: &mut FbxWriter, node: &str, id: i64, name: &str, class: &str) -> Result<(), WriteError> {
    let mut attrs = w.new_node(node)?;
    attrs.append_i64(id)?;
    attrs.append_string_direct(&format!("{name}\u{0}\u{1}{node}"))?;
    attrs.append_string_direct(class)
}

fn connect(w: &mut FbxWriter, child: i64, parent: i64) -> Result<(), WriteError> {
    {
        let mut attrs = w.new_node("C")?;
        attrs.append_string_direct("OO")?;
        attrs.append_i64(child)?;
        attrs.append_i64(parent)?;
    }
    w.close_node()
}

/// Binary FBX 7.4 holding the unit quad under a model moved to x = 10 with a red material.
fn binary_quad_scene() -> Result<Vec<u8>, WriteError> {
    let mut w = Writer::new(Cursor::new(Vec::new()), FbxVersion::V7_4)?;
    w.new_node("Objects")?;

    object(&mut w, "Geometry", 10, "Quad", "Mesh")?;
    w.new_node("Vertices")?.append_arr_f64_from_iter(
        None,
        [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
    )?;
    w.close_node()?;
    w.new_node("PolygonVertexIndex")?.append_arr_i32_from_iter(None, [0, 1, 2, !3])?;
    w.close_node()?;
    w.new_node("LayerElementNormal")?.append_i32(0)?;
    string_node(&mut w, "MappingInformationType", "ByPolygonVertex")?;
    string_node(&mut w, "ReferenceInformationType", "Direct")?;
    w.new_node("Normals")?
        .append_arr_f64_from_iter(None, [0.0, 1.0, 0.0].repeat(4))?;
    w.close_node()?;
    w.close_node()?;
    w.close_node()?;

    object(&mut w, "Model", 20, "Panel", "Mesh")?;
    w.new_node("Properties70")?;
    vector_property(&mut w, "Lcl Translation", "Lcl Translation", [10.0, 0.0, 0.0])?;
    w.close_node()?;
    w.close_node()?;

    object(&mut w, "Material", 30, "Red", "")?;
    w.new_node("Properties70")?;
    vector_property(&mut w, "DiffuseColor", "Color", [1.0, 0.0, 0.0])?;
    w.close_node()?;
    w.close_node()?;

    w.close_node()?;

    w.new_node("Connections")?;
    connect(&mut w, 10, 20)?;
    connect(&mut w, 30, 20)?;
    connect(&mut w, 20, 0)?;
    w.close_node()?;

    Ok(w.finalize(&FbxFooter::default())?.into_inner())
}

#[test]
fn binary_document_keeps_objects_and_connections() {
    let bytes = binary_quad_scene().unwrap();
    let document = fbx::read_document("panel.fbx", &bytes).unwrap();

    assert_eq!(document.geometries.len(), 1);
    let geometry = &document.geometries[0];
    assert_eq!((geometry.id, geometry.name.as_str()), (10, "Quad"));
    assert_eq!(geometry.control_points.len(), 4);
    assert_eq!(geometry.polygon_vertex_index, vec![0, 1, 2, !3]);
    let normals = geometry.normals.as_ref().unwrap();
    assert_eq!(normals.mapping, Mapping::ByPolygonVertex);
    assert_eq!(normals.reference, Reference::Direct);
    assert!(geometry.uvs.is_none());

    assert_eq!(document.models.len(), 1);
    assert_eq!(document.models[0].name, "Panel");
    assert_eq!(document.models[0].translation, [10.0, 0.0, 0.0]);
    assert_eq!(document.materials.len(), 1);
    assert_eq!(document.materials[0].name, "Red");
    assert_eq!(document.materials[0].diffuse, [1.0, 0.0, 0.0]);
    assert_eq!(document.connections, vec![(10, 20), (30, 20), (20, 0)]);
}

#[test]
fn binary_quad_is_moved_by_its_model_and_painted() {
    let bytes = binary_quad_scene().unwrap();
    let (meshes, materials) = fbx::load("panel.fbx", &bytes).unwrap();

    assert_eq!(meshes.len(), 1);
    let mesh = &meshes[0];
    assert_eq!(mesh.name, "Panel");
    assert_eq!(mesh.material, Some(0));
    assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.position).collect();
    assert_eq!(
        positions,
        vec![[10.0, 0.0, 0.0], [11.0, 0.0, 0.0], [11.0, 1.0, 0.0], [10.0, 1.0, 0.0]]
    );
    // normals come from the layer element, not from the triangle winding
    assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));

    assert_eq!(materials.len(), 1);
    assert_eq!(materials[0].name, "Red");
    let [r, g, b, a] = materials[0].diffuse;
    assert!((r - 1.0).abs() < 1e-5 && g.abs() < 1e-5 && b.abs() < 1e-5 && a == 1.0);
}
