#![allow(dead_code)]

use std::{
    cell::RefCell,
    io::{Read, Write},
    net::TcpListener,
    path::PathBuf,
    rc::Rc,
    sync::mpsc,
    time::Duration,
};

use flow_viewer::{
    camera::Camera,
    data_structures::scene::Scene,
    drop_zone::DropIndicator,
    render::{SceneRenderer, Viewport},
    resources::{
        LoadRequest,
        loader::{LoadRequests, LoadTicket},
    },
    status::{Notifier, StatusSink},
};

/// Absolute path of a file under `tests/fixtures`.
pub fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

/// HTTP server on localhost for a single request. The request is read right
/// away, the response is only written once [`HeldServer::respond`] is called.
pub struct HeldServer {
    pub url: reqwest::Url,
    accepted: mpsc::Receiver<()>,
    release: mpsc::Sender<Vec<u8>>,
}

impl HeldServer {
    pub fn start(file_name: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = reqwest::Url::parse(&format!(
            "http://{}/{}",
            listener.local_addr().unwrap(),
            file_name
        ))
        .unwrap();
        let (accepted_tx, accepted) = mpsc::channel();
        let (release, release_rx) = mpsc::channel::<Vec<u8>>();
        std::thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            let _ = accepted_tx.send(());
            if let Ok(response) = release_rx.recv() {
                let _ = stream.write_all(&response);
            }
        });
        Self {
            url,
            accepted,
            release,
        }
    }

    /// Block until the client has sent its request.
    pub fn wait_for_request(&self) {
        self.accepted
            .recv_timeout(Duration::from_secs(10))
            .expect("no request reached the server");
    }

    /// Write `response` on the held connection and close it.
    pub fn respond(&self, response: Vec<u8>) {
        let _ = self.release.send(response);
    }
}

/// Raw `200 OK` response announcing `content_length` bytes and carrying `body`.
pub fn http_response(content_length: u64, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {content_length}\r\nConnection: close\r\n\r\n"
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

#[derive(Debug, Default)]
pub struct RecordingIndicator {
    pub visible: bool,
    pub shows: u32,
    pub hides: u32,
}

impl DropIndicator for RecordingIndicator {
    fn show(&mut self) {
        self.visible = true;
        self.shows += 1;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.hides += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub alerts: Vec<String>,
}

impl Notifier for RecordingNotifier {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

#[derive(Debug, Default)]
pub struct RecordingStatus {
    pub current: Option<String>,
    pub history: Vec<String>,
}

impl StatusSink for RecordingStatus {
    fn show(&mut self, text: &str) {
        self.current = Some(text.to_string());
        self.history.push(text.to_string());
    }

    fn clear(&mut self) {
        self.current = None;
    }
}

#[derive(Debug, Default)]
pub struct RecordingLoader {
    pub requests: Vec<LoadRequest>,
}

impl LoadRequests for RecordingLoader {
    fn request(&mut self, request: LoadRequest) -> LoadTicket {
        self.requests.push(request);
        LoadTicket(self.requests.len() as u64)
    }
}

/// Shared log of what happened in which order during a frame.
pub type CallLog = Rc<RefCell<Vec<&'static str>>>;

pub struct FakeViewport {
    pub camera: Camera,
    pub log: CallLog,
}

impl FakeViewport {
    pub fn new(log: CallLog) -> Self {
        Self {
            camera: Camera::new((0.0, 0.0, 5.0), (0.0, 0.0, 0.0), cgmath::Deg(75.0), 0.1, 1000.0),
            log,
        }
    }
}

impl Viewport for FakeViewport {
    fn update(&mut self) {
        self.log.borrow_mut().push("update");
        // move a little so the renderer can tell it sees the updated camera
        self.camera.position.z -= 1.0;
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }
}

pub struct FakeRenderer {
    pub log: CallLog,
    /// Camera z positions and model counts seen per frame.
    pub seen: Vec<(f32, usize)>,
    pub fail_next: bool,
}

impl FakeRenderer {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            seen: Vec::new(),
            fail_next: false,
        }
    }
}

impl SceneRenderer<String> for FakeRenderer {
    type Error = String;

    fn render(&mut self, scene: &Scene<String>, camera: &Camera) -> Result<(), String> {
        self.log.borrow_mut().push("render");
        self.seen.push((camera.position.z, scene.model_count()));
        if std::mem::take(&mut self.fail_next) {
            return Err("surface lost".to_string());
        }
        Ok(())
    }
}
