use std::path::PathBuf;

use flow_viewer::{
    LoadError,
    resources::{LoadStage, Progress},
    viewer::failure_status,
};

#[test]
fn half_transferred_is_fifty_percent() {
    assert_eq!(Progress::new(50, 100).percent(), 50);
}

#[test]
fn nothing_of_nothing_is_zero_percent() {
    assert_eq!(Progress::new(0, 0).percent(), 0);
}

#[test]
fn unknown_total_counts_as_complete() {
    // servers without Content-Length report a total of zero
    assert_eq!(Progress::new(4096, 0).percent(), 100);
}

#[test]
fn understated_total_never_exceeds_hundred() {
    assert_eq!(Progress::new(150, 100).percent(), 100);
}

#[test]
fn percent_is_rounded() {
    assert_eq!(Progress::new(1, 3).percent(), 33);
    assert_eq!(Progress::new(2, 3).percent(), 67);
}

#[test]
fn stage_status_lines() {
    assert_eq!(LoadStage::Model.status(42), "Loading... 42%");
    assert_eq!(LoadStage::Materials.status(7), "Loading materials... 7%");
}

#[test]
fn material_failures_get_their_own_status() {
    let missing = LoadError::MissingMaterial {
        name: "cube.obj".to_string(),
        expected: "materials/cube.mtl".to_string(),
    };
    assert!(failure_status(&missing).starts_with("Error loading the materials: "));

    let unreadable = LoadError::Read {
        path: PathBuf::from("missing.fbx"),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    };
    let status = failure_status(&unreadable);
    assert!(status.starts_with("Error loading the model: "));
    assert!(status.contains("missing.fbx"));
}
