//! Scene composition: the models, lights and helpers drawn every frame.
//!
//! The scene is plain bookkeeping. It is generic over the model type so the
//! render thread stores GPU [`Model`](crate::data_structures::model::Model)s
//! while tests can compose scenes without a device.

use serde::{Deserialize, Serialize};

/// Handle of a model added to a [`Scene`]. Ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Light {
    /// Uniform light from every direction.
    Ambient { color: u32, intensity: f32 },
    /// Parallel light shining from `position` towards the origin.
    Directional {
        color: u32,
        intensity: f32,
        position: [f32; 3],
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Helper {
    /// Square grid on the XZ plane centred on the origin.
    Grid { size: f32, divisions: u32 },
}

#[derive(Debug)]
pub struct Scene<M> {
    models: Vec<(ModelId, M)>,
    lights: Vec<Light>,
    helpers: Vec<Helper>,
    next_id: u64,
}

impl<M> Scene<M> {
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            lights: Vec::new(),
            helpers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add_model(&mut self, model: M) -> ModelId {
        let id = ModelId(self.next_id);
        self.next_id += 1;
        self.models.push((id, model));
        id
    }

    /// Removes and returns the model; `None` if the id is not in the scene.
    pub fn remove_model(&mut self, id: ModelId) -> Option<M> {
        let idx = self.models.iter().position(|(i, _)| *i == id)?;
        Some(self.models.remove(idx).1)
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn add_helper(&mut self, helper: Helper) {
        self.helpers.push(helper);
    }

    pub fn model(&self, id: ModelId) -> Option<&M> {
        self.models.iter().find(|(i, _)| *i == id).map(|(_, m)| m)
    }

    pub fn models(&self) -> impl Iterator<Item = &M> {
        self.models.iter().map(|(_, m)| m)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn helpers(&self) -> &[Helper] {
        &self.helpers
    }
}

impl<M> Default for Scene<M> {
    fn default() -> Self {
        Self::new()
    }
}
