//! Frame sequencing.
//!
//! The host calls [`RenderLoop::frame`] once per display refresh. A frame
//! first advances the viewport (damped camera motion) and then draws the
//! scene through the updated camera. There is no fixed timestep and no frame
//! is skipped.

use crate::{camera::Camera, data_structures::scene::Scene};

/// Something that owns the camera and advances it once per frame.
pub trait Viewport {
    fn update(&mut self);
    fn camera(&self) -> &Camera;
}

/// Draws a scene of `M` models through a camera.
pub trait SceneRenderer<M> {
    type Error;

    fn render(&mut self, scene: &Scene<M>, camera: &Camera) -> Result<(), Self::Error>;
}

#[derive(Debug, Default)]
pub struct RenderLoop {
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame: update the viewport, then render.
    pub fn frame<V, R, M>(
        &mut self,
        viewport: &mut V,
        renderer: &mut R,
        scene: &Scene<M>,
    ) -> Result<(), R::Error>
    where
        V: Viewport + ?Sized,
        R: SceneRenderer<M> + ?Sized,
    {
        self.frames += 1;
        viewport.update();
        renderer.render(scene, viewport.camera())
    }

    /// Frames started so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
