//! Background loading with cancellation.
//!
//! Every request gets a [`LoadTicket`]. Requesting a new load aborts the one
//! in flight; results that still arrive for an older ticket are the
//! receiver's to discard.

use futures::future::{AbortHandle, Abortable};

use crate::{
    data_structures::model::ModelData,
    error::LoadError,
    resources::{LoadRequest, LoadStage, Progress, load_model_data},
};

/// Id of one load request. Tickets increase monotonically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub u64);

#[derive(Debug)]
pub enum LoaderEvent {
    Progress {
        ticket: LoadTicket,
        stage: LoadStage,
        progress: Progress,
    },
    Loaded {
        ticket: LoadTicket,
        result: Result<ModelData, LoadError>,
    },
}

impl LoaderEvent {
    pub fn ticket(&self) -> LoadTicket {
        match self {
            LoaderEvent::Progress { ticket, .. } | LoaderEvent::Loaded { ticket, .. } => *ticket,
        }
    }
}

/// Where the loader reports progress and results; the application shell
/// forwards them to the event loop.
pub trait EventSink: Clone + Send + 'static {
    fn send(&self, event: LoaderEvent);
}

impl EventSink for std::sync::mpsc::Sender<LoaderEvent> {
    fn send(&self, event: LoaderEvent) {
        if std::sync::mpsc::Sender::send(self, event).is_err() {
            log::debug!("Loader event dropped, receiver is gone");
        }
    }
}

/// Anything that can start a model load.
pub trait LoadRequests {
    fn request(&mut self, request: LoadRequest) -> LoadTicket;
}

pub struct AssetLoader<S: EventSink> {
    runtime: tokio::runtime::Handle,
    sink: S,
    in_flight: Option<AbortHandle>,
    last_ticket: u64,
}

impl<S: EventSink> AssetLoader<S> {
    pub fn new(runtime: tokio::runtime::Handle, sink: S) -> Self {
        Self {
            runtime,
            sink,
            in_flight: None,
            last_ticket: 0,
        }
    }

    /// Abort the load in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl<S: EventSink> LoadRequests for AssetLoader<S> {
    fn request(&mut self, request: LoadRequest) -> LoadTicket {
        self.cancel();
        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);

        let (handle, registration) = AbortHandle::new_pair();
        let sink = self.sink.clone();
        let load = Abortable::new(
            async move {
                let progress_sink = sink.clone();
                let result = load_model_data(request, move |stage, progress| {
                    progress_sink.send(LoaderEvent::Progress {
                        ticket,
                        stage,
                        progress,
                    })
                })
                .await;
                if let Err(e) = &result {
                    log::error!("Load {} failed: {}", ticket.0, e);
                }
                sink.send(LoaderEvent::Loaded { ticket, result });
            },
            registration,
        );
        self.runtime.spawn(async move {
            if load.await.is_err() {
                log::debug!("Load {} was superseded", ticket.0);
            }
        });
        self.in_flight = Some(handle);
        ticket
    }
}
