use std::path::{Path, PathBuf};

use clap::Parser;
use flow_viewer::{
    Cli, ViewerConfig, ViewerError,
    config::{DEFAULT_MODEL, StartupModel},
    data_structures::scene::{Helper, Light},
    resources::{AssetFormat, AssetSource},
};

#[test]
fn defaults_describe_the_stock_viewer() {
    let config = ViewerConfig::default();
    assert_eq!(config.background, 0xaaaaaa);
    assert_eq!(config.camera.position, [0.7, 1.37, 2.5]);
    assert_eq!(config.camera.fov_degrees, 75.0);
    assert_eq!(config.controls.damping_factor, 0.05);
    assert_eq!(config.accepted_drop_extensions, vec!["fbx".to_string()]);
    assert_eq!(
        config.helpers,
        vec![Helper::Grid {
            size: 100.0,
            divisions: 100
        }]
    );
    assert_eq!(config.lights.len(), 2);

    let request = config.startup_request().unwrap().unwrap();
    assert_eq!(request.format, AssetFormat::Fbx);
    assert_eq!(request.source, AssetSource::Path(PathBuf::from(DEFAULT_MODEL)));
    assert_eq!(request.scale, None);
}

#[test]
fn partial_ron_keeps_remaining_defaults() {
    let text = r#"(
        background: 0x202020,
        model: Some((location: "https://example.com/models/robot.glb")),
        lights: [
            Ambient(color: 0xffffff, intensity: 0.5),
        ],
        accepted_drop_extensions: ["fbx", "obj", "gltf", "glb"],
    )"#;
    let config = ViewerConfig::parse(text, Path::new("viewer.ron")).unwrap();

    assert_eq!(config.background, 0x202020);
    assert_eq!(
        config.lights,
        vec![Light::Ambient {
            color: 0xffffff,
            intensity: 0.5
        }]
    );
    assert_eq!(config.accepted_drop_extensions.len(), 4);
    assert_eq!(config.camera, ViewerConfig::default().camera);
    assert_eq!(config.helpers, ViewerConfig::default().helpers);

    let request = config.startup_request().unwrap().unwrap();
    assert_eq!(request.format, AssetFormat::Gltf);
    assert!(matches!(request.source, AssetSource::Url(_)));
    assert_eq!(request.source.name(), "robot.glb");
}

#[test]
fn empty_scene_when_no_model_is_configured() {
    let config = ViewerConfig::parse("(model: None)", Path::new("viewer.ron")).unwrap();
    assert!(config.startup_request().unwrap().is_none());
}

#[test]
fn malformed_ron_names_the_file() {
    let err = ViewerConfig::parse("(background: \"grey\"", Path::new("broken.ron")).unwrap_err();
    assert!(matches!(err, ViewerError::Config { .. }));
    assert!(err.to_string().contains("broken.ron"));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ViewerConfig::load(dir.path().join("absent.ron")).unwrap_err();
    assert!(matches!(err, ViewerError::Config { .. }));
}

#[test]
fn unknown_startup_extension_is_unsupported() {
    let model = StartupModel {
        location: "scene.blend".to_string(),
        format: None,
    };
    let err = model.request(None).unwrap_err();
    assert!(matches!(err, ViewerError::UnsupportedFormat { .. }));
    assert!(err.to_string().contains("scene.blend"));
}

#[test]
fn explicit_format_wins_over_extension() {
    let model = StartupModel {
        location: "download".to_string(),
        format: Some(AssetFormat::ObjMtl),
    };
    let request = model.request(Some(3.0)).unwrap();
    assert_eq!(request.format, AssetFormat::ObjMtl);
    assert_eq!(request.scale, Some(3.0));
}

#[test]
fn command_line_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("viewer.ron");
    std::fs::write(&path, "(title: \"Gallery\", model_scale: Some(0.1))").unwrap();

    let cli = Cli::try_parse_from([
        "flow-viewer",
        "models/statue.bin",
        "--format",
        "obj+mtl",
        "--scale",
        "2",
        "--config",
        path.to_str().unwrap(),
    ])
    .unwrap();
    let config = cli.into_config().unwrap();

    assert_eq!(config.title, "Gallery");
    assert_eq!(config.model_scale, Some(2.0));
    assert_eq!(
        config.model,
        Some(StartupModel {
            location: "models/statue.bin".to_string(),
            format: Some(AssetFormat::ObjMtl),
        })
    );
}

#[test]
fn format_flag_alone_applies_to_configured_model() {
    let cli = Cli::try_parse_from(["flow-viewer", "--format", "GLTF"]).unwrap();
    let config = cli.into_config().unwrap();
    let model = config.model.unwrap();
    assert_eq!(model.location, DEFAULT_MODEL);
    assert_eq!(model.format, Some(AssetFormat::Gltf));
}

#[test]
fn unknown_format_flag_is_rejected() {
    assert!(Cli::try_parse_from(["flow-viewer", "--format", "blend"]).is_err());
}
