use std::{cell::RefCell, rc::Rc};

use flow_viewer::{data_structures::scene::Scene, render::RenderLoop};

use crate::common::test_utils::{CallLog, FakeRenderer, FakeViewport};

mod common;

#[test]
fn viewport_updates_once_before_each_draw() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut viewport = FakeViewport::new(log.clone());
    let mut renderer = FakeRenderer::new(log.clone());
    let mut scene = Scene::new();
    scene.add_model("model".to_string());
    let mut render_loop = RenderLoop::new();

    for _ in 0..3 {
        render_loop
            .frame(&mut viewport, &mut renderer, &scene)
            .unwrap();
    }

    assert_eq!(
        *log.borrow(),
        vec!["update", "render", "update", "render", "update", "render"]
    );
    assert_eq!(render_loop.frames(), 3);
    // every draw sees the camera of its own frame
    assert_eq!(renderer.seen, vec![(4.0, 1), (3.0, 1), (2.0, 1)]);
}

#[test]
fn render_errors_are_returned_and_the_loop_continues() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let mut viewport = FakeViewport::new(log.clone());
    let mut renderer = FakeRenderer::new(log.clone());
    let scene: Scene<String> = Scene::new();
    let mut render_loop = RenderLoop::new();

    renderer.fail_next = true;
    assert!(render_loop.frame(&mut viewport, &mut renderer, &scene).is_err());
    assert!(render_loop.frame(&mut viewport, &mut renderer, &scene).is_ok());
    assert_eq!(render_loop.frames(), 2);
    assert_eq!(log.borrow().iter().filter(|c| **c == "update").count(), 2);
}
