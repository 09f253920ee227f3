//! Application shell and event loop.
//!
//! [`run`] opens the window and drives everything from winit callbacks:
//!
//! 1. Window events go to the orbit controls and the drop zone
//! 2. Loader progress and results arrive as [`ViewerEvent`] user events and
//!    are applied to the [`Viewer`] on this thread
//! 3. Every `RedrawRequested` runs one [`RenderLoop::frame`] and requests the
//!    next redraw, so the viewer renders continuously
//!
//! Loads run on a tokio runtime owned by the [`App`]; the GPU upload of a
//! finished load happens here, on the render thread, and only for the
//! current load ticket.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    camera::ViewportController,
    config::ViewerConfig,
    context::Context,
    data_structures::{model::Model, scene::Scene},
    drop_zone::{DropZone, OverlayFlag},
    error::{LoadError, ViewerError},
    render::RenderLoop,
    resources::loader::{AssetLoader, EventSink, LoadRequests, LoaderEvent},
    status::{DialogNotifier, WindowTitleStatus, show_fatal},
    viewer::{LoadOutcome, Viewer},
};

/// Events delivered to the event loop from other threads.
#[derive(Debug)]
pub enum ViewerEvent {
    Loader(LoaderEvent),
}

/// Forwards loader events into the winit event loop.
#[derive(Clone)]
pub struct ProxySink(EventLoopProxy<ViewerEvent>);

impl EventSink for ProxySink {
    fn send(&self, event: LoaderEvent) {
        if let Err(e) = self.0.send_event(ViewerEvent::Loader(event)) {
            log::warn!("Event loop closed before loader event was delivered: {e}");
        }
    }
}

/// Everything that exists once the window and GPU are up.
struct AppState {
    ctx: Context,
    viewport: ViewportController,
    viewer: Viewer<Model, WindowTitleStatus>,
    drop_zone: DropZone<OverlayFlag, DialogNotifier>,
    loader: AssetLoader<ProxySink>,
    render_loop: RenderLoop,
}

impl AppState {
    async fn new(
        window: Arc<Window>,
        config: &ViewerConfig,
        proxy: EventLoopProxy<ViewerEvent>,
        runtime: tokio::runtime::Handle,
    ) -> Result<Self, ViewerError> {
        let overlay = OverlayFlag::default();
        let ctx = Context::new(window.clone(), config.background, overlay.clone()).await?;

        let mut scene = Scene::new();
        config.lights.iter().for_each(|light| scene.add_light(*light));
        config.helpers.iter().for_each(|helper| scene.add_helper(*helper));

        let size = window.inner_size();
        let mut viewport =
            ViewportController::new(config.camera.camera(), config.controls.controls());
        viewport.resize(size.width, size.height);

        let mut state = Self {
            ctx,
            viewport,
            viewer: Viewer::new(scene, WindowTitleStatus::new(window, config.title.clone())),
            drop_zone: DropZone::new(
                config.accepted_drop_extensions.as_slice(),
                overlay,
                DialogNotifier,
            )
            .with_scale(config.model_scale),
            loader: AssetLoader::new(runtime, ProxySink(proxy)),
            render_loop: RenderLoop::new(),
        };

        match config.startup_request() {
            Ok(Some(request)) => {
                let ticket = state.loader.request(request);
                state.viewer.begin_load(ticket);
            }
            Ok(None) => log::info!("No startup model configured"),
            Err(e) => log::error!("Cannot load the startup model: {e}"),
        }
        Ok(state)
    }

    fn on_loader_event(&mut self, event: LoaderEvent) {
        match event {
            LoaderEvent::Progress {
                ticket,
                stage,
                progress,
            } => self.viewer.on_progress(ticket, stage, progress),
            LoaderEvent::Loaded { ticket, result } => {
                // Superseded results are never uploaded
                let result = if self.viewer.is_current(ticket) {
                    result.and_then(|data| self.ctx.upload(&data))
                } else {
                    Err(LoadError::Cancelled)
                };
                if let LoadOutcome::Replaced(id) = self.viewer.on_loaded(ticket, result) {
                    if let Some(model) = self.viewer.scene().model(id) {
                        log::info!(
                            "Displaying {} ({} meshes)",
                            model.name,
                            model.meshes.len()
                        );
                    }
                }
            }
        }
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    state: Option<AppState>,
    /// Set when initialisation failed; returned from [`run`].
    error: Option<ViewerError>,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            config,
            state: None,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ViewerError) {
        log::error!("{error}");
        show_fatal(&error.to_string());
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes().with_title(self.config.title.clone());
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                return self.fail(event_loop, ViewerError::CapabilityUnavailable(e.to_string()));
            }
        };

        let init = AppState::new(
            window.clone(),
            &self.config,
            self.proxy.clone(),
            self.async_runtime.handle().clone(),
        );
        match self.async_runtime.block_on(init) {
            Ok(state) => {
                self.state = Some(state);
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        match event {
            ViewerEvent::Loader(event) => state.on_loader_event(event),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.viewport.handle_window_event(&event);
        if let Some(ticket) = state
            .drop_zone
            .handle_window_event(&event, &mut state.loader)
        {
            state.viewer.begin_load(ticket);
        }

        match event {
            WindowEvent::CloseRequested => {
                state.loader.cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.ctx.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                match state.render_loop.frame(
                    &mut state.viewport,
                    &mut state.ctx,
                    state.viewer.scene(),
                ) {
                    Ok(()) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window().inner_size();
                        state.ctx.resize(size.width, size.height);
                    }
                    Err(e) => log::error!("Unable to render {}", e),
                }
                state.ctx.window().request_redraw();
            }
            _ => {}
        }
    }
}

/// Open the viewer window and block until it is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
