//! User facing feedback: the loading status line and modal alerts.

use std::sync::Arc;

use winit::window::Window;

/// Shows the textual loading indicator.
pub trait StatusSink {
    fn show(&mut self, text: &str);
    fn clear(&mut self);
}

/// Synchronous, blocking user notification.
pub trait Notifier {
    fn alert(&mut self, message: &str);
}

/// Status line rendered into the window title, after the application name.
pub struct WindowTitleStatus {
    window: Arc<Window>,
    title: String,
}

impl WindowTitleStatus {
    pub fn new(window: Arc<Window>, title: impl Into<String>) -> Self {
        let title = title.into();
        window.set_title(&title);
        Self { window, title }
    }
}

impl StatusSink for WindowTitleStatus {
    fn show(&mut self, text: &str) {
        self.window.set_title(&format!("{} - {}", self.title, text));
    }

    fn clear(&mut self) {
        self.window.set_title(&self.title);
    }
}

/// Native message box.
#[derive(Debug, Default)]
pub struct DialogNotifier;

impl Notifier for DialogNotifier {
    fn alert(&mut self, message: &str) {
        log::warn!("{message}");
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title("flow-viewer")
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

/// Blocking error dialog for failures that stop the viewer from starting.
pub fn show_fatal(message: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("flow-viewer")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
