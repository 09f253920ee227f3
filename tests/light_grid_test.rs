use flow_viewer::{
    ViewerConfig,
    data_structures::{
        color::{linear_from_hex, srgb_from_hex},
        grid::{CENTER_LINE_COLOR, GRID_COLOR, grid_vertices},
        scene::Light,
    },
    pipelines::light::LightUniform,
    resources::{AssetFormat, AssetSource},
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn default_lights_fold_into_one_uniform() {
    let uniform = LightUniform::from_lights(&ViewerConfig::default().lights);

    let ambient = linear_from_hex(0x404040)[0] * 2.0;
    assert!(uniform.ambient[..3].iter().all(|&c| approx(c, ambient)));

    let d = 1.0 / 3.0f32.sqrt();
    assert!(uniform.direction[..3].iter().all(|&c| approx(c, d)));
    assert!(uniform.color[..3].iter().all(|&c| approx(c, 1.0)));
}

#[test]
fn ambient_lights_add_up_and_extra_directionals_are_ignored() {
    let uniform = LightUniform::from_lights(&[
        Light::Ambient {
            color: 0xffffff,
            intensity: 0.25,
        },
        Light::Ambient {
            color: 0xffffff,
            intensity: 0.25,
        },
        Light::Directional {
            color: 0xff0000,
            intensity: 2.0,
            position: [0.0, 5.0, 0.0],
        },
        Light::Directional {
            color: 0x00ff00,
            intensity: 1.0,
            position: [1.0, 0.0, 0.0],
        },
    ]);
    assert!(approx(uniform.ambient[1], 0.5));
    assert_eq!(&uniform.direction[..3], &[0.0, 1.0, 0.0]);
    assert!(approx(uniform.color[0], 2.0));
    assert_eq!(uniform.color[1], 0.0);
}

#[test]
fn no_directional_light_means_no_diffuse_term() {
    let uniform = LightUniform::from_lights(&[]);
    assert_eq!(uniform.color, [0.0; 4]);
    assert_eq!(&uniform.ambient[..3], &[0.0, 0.0, 0.0]);
}

#[test]
fn hex_colours_split_into_channels() {
    assert_eq!(srgb_from_hex(0xff8000), [1.0, 128.0 / 255.0, 0.0]);
    let [r, g, b] = linear_from_hex(0xaaaaaa);
    assert!(r == g && g == b);
    assert!(r < 0xaa as f32 / 255.0);
}

#[test]
fn grid_has_a_line_pair_per_division_and_marks_the_center() {
    let vertices = grid_vertices(100.0, 100);
    assert_eq!(vertices.len(), 101 * 4);

    let center = linear_from_hex(CENTER_LINE_COLOR);
    let regular = linear_from_hex(GRID_COLOR);
    assert!(vertices[200..204].iter().all(|v| v.color == center));
    assert!(vertices[..200].iter().all(|v| v.color == regular));

    // lines span the whole grid on the ground plane
    assert_eq!(vertices[0].position, [-50.0, 0.0, -50.0]);
    assert_eq!(vertices[1].position, [50.0, 0.0, -50.0]);
    assert!(vertices.iter().all(|v| v.position[1] == 0.0));
}

#[test]
fn formats_are_recognised_case_insensitively() {
    assert_eq!(AssetFormat::from_extension("FBX"), Some(AssetFormat::Fbx));
    assert_eq!(AssetFormat::from_extension("obj"), Some(AssetFormat::ObjMtl));
    assert_eq!(AssetFormat::from_extension("Glb"), Some(AssetFormat::Gltf));
    assert_eq!(AssetFormat::from_extension("mtl"), None);
    assert_eq!(AssetFormat::from_path("a/b/Julia_Sculpt.fbx"), Some(AssetFormat::Fbx));

    assert_eq!(AssetFormat::Fbx.default_scale(), 0.01);
    assert_eq!(AssetFormat::Gltf.default_scale(), 1.0);
}

#[test]
fn sources_are_paths_unless_they_are_urls() {
    let url = AssetSource::parse("https://example.com/assets/models/cube.obj").unwrap();
    assert_eq!(url.name(), "cube.obj");
    assert_eq!(url.format(), Some(AssetFormat::ObjMtl));
    let texture = url.sibling("checker.png").unwrap();
    assert_eq!(
        texture,
        AssetSource::parse("https://example.com/assets/models/checker.png").unwrap()
    );

    let path = AssetSource::parse("assets/models/Julia_Sculpt.fbx").unwrap();
    assert!(matches!(path, AssetSource::Path(_)));
    assert_eq!(path.name(), "Julia_Sculpt.fbx");
}
