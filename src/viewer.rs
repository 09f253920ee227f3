//! Owner of the displayed scene and of the load currently allowed to change it.

use crate::{
    data_structures::scene::{ModelId, Scene},
    error::LoadError,
    resources::{LoadStage, Progress, loader::LoadTicket},
    status::StatusSink,
};

/// What a finished load did to the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The new model is displayed, the previous one (if any) was removed.
    Replaced(ModelId),
    /// The load failed; the previous model stays.
    Failed,
    /// The result belongs to a superseded request and was discarded.
    Stale,
}

pub struct Viewer<M, S: StatusSink> {
    scene: Scene<M>,
    active: Option<ModelId>,
    current: Option<LoadTicket>,
    status: S,
}

impl<M, S: StatusSink> Viewer<M, S> {
    pub fn new(scene: Scene<M>, status: S) -> Self {
        Self {
            scene,
            active: None,
            current: None,
            status,
        }
    }

    pub fn scene(&self) -> &Scene<M> {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene<M> {
        &mut self.scene
    }

    pub fn status(&self) -> &S {
        &self.status
    }

    pub fn active_model(&self) -> Option<ModelId> {
        self.active
    }

    /// Make `ticket` the only load whose result may change the scene.
    pub fn begin_load(&mut self, ticket: LoadTicket) {
        self.current = Some(ticket);
        self.status.show(&LoadStage::Model.status(0));
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.current == Some(ticket)
    }

    pub fn on_progress(&mut self, ticket: LoadTicket, stage: LoadStage, progress: Progress) {
        if self.is_current(ticket) {
            self.status.show(&stage.status(progress.percent()));
        }
    }

    /// Apply the result of a load.
    ///
    /// On success the previous model is removed and the new one added in
    /// this single call, so no frame ever draws an empty scene in between.
    pub fn on_loaded(&mut self, ticket: LoadTicket, result: Result<M, LoadError>) -> LoadOutcome {
        if !self.is_current(ticket) {
            log::debug!("Discarding result of superseded load {}", ticket.0);
            return LoadOutcome::Stale;
        }
        self.current = None;
        match result {
            Ok(model) => {
                if let Some(previous) = self.active.take() {
                    self.scene.remove_model(previous);
                }
                let id = self.scene.add_model(model);
                self.active = Some(id);
                self.status.clear();
                LoadOutcome::Replaced(id)
            }
            Err(e) => {
                log::error!("{e}");
                self.status.show(&failure_status(&e));
                LoadOutcome::Failed
            }
        }
    }
}

/// Terminal status line for a failed load.
pub fn failure_status(error: &LoadError) -> String {
    if error.is_material_error() {
        format!("Error loading the materials: {error}")
    } else {
        format!("Error loading the model: {error}")
    }
}
