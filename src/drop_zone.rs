//! Drag-and-drop model replacement.
//!
//! A drag gesture is tracked with a nesting counter so overlapping
//! enter/leave notifications do not make the indicator flicker: it is shown
//! when the counter goes from 0 to 1 and hidden when it drops back to 0.
//! Only the first file of a drop is considered.

use std::{
    cell::Cell,
    path::{Path, PathBuf},
    rc::Rc,
};

use winit::event::WindowEvent;

use crate::{
    error::ViewerError,
    resources::{
        AssetFormat, AssetSource, LoadRequest,
        loader::{LoadRequests, LoadTicket},
    },
    status::Notifier,
};

/// Visual cue shown while a drag hovers the window.
pub trait DropIndicator {
    fn show(&mut self);
    fn hide(&mut self);
}

/// Indicator backed by a shared flag the renderer reads every frame.
#[derive(Clone, Debug, Default)]
pub struct OverlayFlag(Rc<Cell<bool>>);

impl OverlayFlag {
    pub fn is_visible(&self) -> bool {
        self.0.get()
    }
}

impl DropIndicator for OverlayFlag {
    fn show(&mut self) {
        self.0.set(true);
    }

    fn hide(&mut self) {
        self.0.set(false);
    }
}

pub struct DropZone<I: DropIndicator, N: Notifier> {
    depth: u32,
    /// Set once the first file of the current gesture was handled.
    consumed: bool,
    accepted: Vec<String>,
    scale: Option<f32>,
    indicator: I,
    notifier: N,
}

impl<I: DropIndicator, N: Notifier> DropZone<I, N> {
    /// `accepted` lists file extensions without the dot, compared case-insensitively.
    pub fn new<S: AsRef<str>>(accepted: &[S], indicator: I, notifier: N) -> Self {
        Self {
            depth: 0,
            consumed: false,
            accepted: accepted
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            scale: None,
            indicator,
            notifier,
        }
    }

    /// Scale override forwarded with every accepted drop.
    pub fn with_scale(mut self, scale: Option<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_hovering(&self) -> bool {
        self.depth > 0
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn enter(&mut self) {
        if self.depth == 0 {
            self.consumed = false;
            self.indicator.show();
        }
        self.depth += 1;
    }

    pub fn leave(&mut self) {
        match self.depth {
            0 => log::debug!("Ignoring drag leave without matching enter"),
            1 => {
                self.depth = 0;
                self.indicator.hide();
            }
            _ => self.depth -= 1,
        }
    }

    /// The drag left the window or was aborted.
    pub fn cancel(&mut self) {
        if self.depth > 0 {
            self.depth = 0;
            self.indicator.hide();
        }
    }

    /// Handle a drop of `files`; only the first one is inspected.
    ///
    /// Returns the ticket of the started load, `None` when nothing was loaded.
    pub fn on_drop<L: LoadRequests + ?Sized>(
        &mut self,
        files: &[PathBuf],
        loader: &mut L,
    ) -> Option<LoadTicket> {
        let was_hovering = self.depth > 0;
        self.depth = 0;
        if was_hovering {
            self.indicator.hide();
        }
        if self.consumed {
            log::debug!("Ignoring additional dropped files of the same gesture");
            return None;
        }
        self.consumed = true;

        let file = files.first()?;
        if files.len() > 1 {
            log::info!("{} files dropped, loading only {}", files.len(), file.display());
        }
        match self.accept(file) {
            Ok(format) => {
                let request = LoadRequest::new(AssetSource::Path(file.clone()), format)
                    .with_scale(self.scale);
                Some(loader.request(request))
            }
            Err(e) => {
                self.notifier.alert(&e.to_string());
                None
            }
        }
    }

    fn accept(&self, file: &Path) -> Result<AssetFormat, ViewerError> {
        let unsupported = || ViewerError::UnsupportedFormat {
            name: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string()),
            accepted: self
                .accepted
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", "),
        };
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(unsupported)?;
        if !self.accepted.contains(&ext) {
            return Err(unsupported());
        }
        AssetFormat::from_extension(&ext).ok_or_else(unsupported)
    }

    /// Map winit's file drag events onto the state machine.
    ///
    /// winit reports one `HoveredFile`/`DroppedFile` per file, so every
    /// hovered file counts as one enter and all of them are left on drop.
    pub fn handle_window_event<L: LoadRequests + ?Sized>(
        &mut self,
        event: &WindowEvent,
        loader: &mut L,
    ) -> Option<LoadTicket> {
        match event {
            WindowEvent::HoveredFile(_) => self.enter(),
            WindowEvent::HoveredFileCancelled => self.cancel(),
            WindowEvent::DroppedFile(path) => {
                return self.on_drop(std::slice::from_ref(path), loader);
            }
            _ => (),
        }
        None
    }
}
