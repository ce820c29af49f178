use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::{Rng, distributions::Alphanumeric};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server};
use url::Url;

use super::page::with_token;
use super::{EmbedContent, EmbedHost, Envelope, Generation, PageOptions, PlayerCommand, placeholder_page};
use crate::error::BridgeError;

/// Largest notification body accepted from the page
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

const TOKEN_LEN: usize = 32;

/// Reply to the page's command poll
#[derive(Debug, Serialize)]
struct CommandBatch {
    /// The polling page is not the mounted one and must re-fetch `/`
    reload: bool,
    commands: Vec<&'static str>,
}

struct MountedPage {
    generation: Generation,
    html: String,
}

/// State shared between the UI thread and the server thread
struct Shared {
    page: Option<MountedPage>,
    queue: Vec<PlayerCommand>,
    placeholder: String,
}

impl Shared {
    fn current_generation(&self) -> Generation {
        self.page.as_ref().map_or(Generation::NONE, |p| p.generation)
    }
}

/// Serves the embedded page to a browser tab over loopback HTTP.
///
/// * `GET /` returns the mounted page, or a placeholder that waits for one
/// * `POST /message?gen=N&token=T` delivers one notification from page `N`
/// * `GET /commands?gen=N&token=T` drains the commands queued for page `N`
///
/// `T` is drawn fresh for every host and only ever written into pages served
/// from `/`, so other sites open in the same browser cannot talk to the player.
pub struct HttpHost {
    shared: Arc<Mutex<Shared>>,
    inbox: Receiver<Envelope>,
    server: Arc<Server>,
    worker: Option<JoinHandle<()>>,
    addr: SocketAddr,
    token: Arc<str>,
}

impl HttpHost {
    /// Bind the server and start answering requests on a background thread.
    /// Use port 0 to let the OS pick one.
    pub fn bind(addr: &str, options: &PageOptions) -> Result<Self, BridgeError> {
        let server = Server::http(addr)
            .map_err(|e| BridgeError::Transport(format!("Failed to bind {}: {}", addr, e)))?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| BridgeError::Transport(format!("{} is not an IP address", addr)))?;
        let server = Arc::new(server);
        let token: Arc<str> = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect::<String>()
            .into();

        let shared = Arc::new(Mutex::new(Shared {
            page: None,
            queue: Vec::new(),
            placeholder: placeholder_page(options, &token),
        }));
        let (outbox, inbox) = mpsc::channel();

        let worker = {
            let server = Arc::clone(&server);
            let shared = Arc::clone(&shared);
            let token = Arc::clone(&token);
            thread::Builder::new()
                .name("bridge-http".to_string())
                .spawn(move || serve(&server, &shared, &outbox, &token))?
        };

        info!("Bridge listening on http://{}/", addr);
        Ok(Self {
            shared,
            inbox,
            server,
            worker: Some(worker),
            addr,
            token,
        })
    }

    /// Address a browser should open to show the player
    pub fn page_url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl EmbedHost for HttpHost {
    fn load(&mut self, content: &EmbedContent) -> Result<(), BridgeError> {
        let mut shared = self.shared.lock();
        shared.queue.clear();
        shared.page = Some(MountedPage {
            generation: content.generation,
            html: with_token(&content.html, &self.token),
        });
        Ok(())
    }

    fn inject(&mut self, generation: Generation, command: PlayerCommand) -> Result<(), BridgeError> {
        let mut shared = self.shared.lock();
        if shared.current_generation() == generation {
            shared.queue.push(command);
        } else {
            debug!("Not queueing {:?} for unmounted page {}", command, generation);
        }
        Ok(())
    }

    fn unload(&mut self, generation: Generation) {
        let mut shared = self.shared.lock();
        if shared.current_generation() == generation {
            shared.page = None;
            shared.queue.clear();
        }
    }

    fn try_recv(&mut self) -> Option<Envelope> {
        self.inbox.try_recv().ok()
    }
}

impl Drop for HttpHost {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Bridge server thread panicked");
            }
        }
    }
}

fn serve(server: &Server, shared: &Mutex<Shared>, outbox: &Sender<Envelope>, token: &str) {
    for request in server.incoming_requests() {
        let method = request.method().clone();
        let target = Target::parse(request.url());
        debug!("Bridge request: {} {}", method, target.path);

        let result = match (method, target.path.as_str()) {
            (Method::Get, "/") | (Method::Get, "/index.html") => {
                let html = {
                    let shared = shared.lock();
                    shared
                        .page
                        .as_ref()
                        .map_or_else(|| shared.placeholder.clone(), |p| p.html.clone())
                };
                request.respond(with_content_type(
                    Response::from_string(html),
                    "text/html; charset=utf-8",
                ))
            }
            (Method::Post, "/message") | (Method::Get, "/commands") if !target.has_token(token) => {
                warn!("Rejected {} without the page token", target.path);
                request.respond(Response::from_string("Forbidden").with_status_code(403))
            }
            (Method::Post, "/message") => receive_message(request, target.generation, outbox),
            (Method::Get, "/commands") => {
                let batch = {
                    let mut shared = shared.lock();
                    let current = shared.current_generation();
                    let requested = target.generation.unwrap_or(Generation::NONE);
                    if requested == current {
                        CommandBatch {
                            reload: false,
                            commands: shared.queue.drain(..).map(PlayerCommand::function_name).collect(),
                        }
                    } else {
                        CommandBatch {
                            reload: true,
                            commands: Vec::new(),
                        }
                    }
                };
                let body = serde_json::to_string(&batch).unwrap_or_default();
                request.respond(with_content_type(Response::from_string(body), "application/json"))
            }
            _ => request.respond(Response::from_string("Not Found").with_status_code(404)),
        };

        if let Err(e) = result {
            warn!("Failed to answer bridge request: {}", e);
        }
    }
    debug!("Bridge server stopped");
}

fn receive_message(
    mut request: Request,
    generation: Option<Generation>,
    outbox: &Sender<Envelope>,
) -> std::io::Result<()> {
    let Some(generation) = generation else {
        return request.respond(Response::from_string("missing gen").with_status_code(400));
    };
    if request.body_length().is_some_and(|len| len > MAX_MESSAGE_BYTES) {
        return request.respond(Response::from_string("message too large").with_status_code(413));
    }

    // Chunked bodies carry no length up front, so stop one byte past the cap
    let mut body = Vec::new();
    if let Err(e) = request
        .as_reader()
        .take(MAX_MESSAGE_BYTES as u64 + 1)
        .read_to_end(&mut body)
    {
        warn!("Unreadable bridge message body: {}", e);
        return request.respond(Response::from_string("unreadable body").with_status_code(400));
    }
    if body.len() > MAX_MESSAGE_BYTES {
        return request.respond(Response::from_string("message too large").with_status_code(413));
    }
    let Ok(payload) = String::from_utf8(body) else {
        return request.respond(Response::from_string("body is not UTF-8").with_status_code(400));
    };

    // The receiver only goes away while the host is shutting down
    let _ = outbox.send(Envelope { generation, payload });
    request.respond(Response::empty(204))
}

/// Path and query parameters of a request target
#[derive(Debug, PartialEq)]
struct Target {
    path: String,
    generation: Option<Generation>,
    token: Option<String>,
}

impl Target {
    fn parse(target: &str) -> Self {
        let Ok(url) = Url::parse("http://bridge.local").and_then(|base| base.join(target)) else {
            return Self {
                path: target.to_string(),
                generation: None,
                token: None,
            };
        };
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };
        Self {
            path: url.path().to_string(),
            generation: param("gen")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Generation::new),
            token: param("token"),
        }
    }

    fn has_token(&self, expected: &str) -> bool {
        self.token.as_deref() == Some(expected)
    }
}

fn with_content_type<R: Read>(mut response: Response<R>, content_type: &str) -> Response<R> {
    for (name, value) in [("Content-Type", content_type), ("Cache-Control", "no-store")] {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => response.add_header(header),
            Err(()) => warn!("Invalid header {}: {}", name, value),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeMessage;
    use crate::link::VideoId;
    use std::time::{Duration, Instant};

    fn content(generation: u64, html: &str) -> EmbedContent {
        EmbedContent {
            generation: Generation::new(generation),
            video_id: VideoId::new("abc123").unwrap(),
            html: html.to_string(),
        }
    }

    fn recv(host: &mut HttpHost) -> Option<Envelope> {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let Some(envelope) = host.try_recv() {
                return Some(envelope);
            }
            thread::sleep(Duration::from_millis(10));
        }
        None
    }

    fn message_url(host: &HttpHost, generation: u64) -> String {
        format!("{}message?gen={}&token={}", host.page_url(), generation, host.token)
    }

    #[test]
    fn test_target_splits_path_and_parameters() {
        let target = Target::parse("/commands?gen=3&token=abc");
        assert_eq!(target.path, "/commands");
        assert_eq!(target.generation, Some(Generation::new(3)));
        assert!(target.has_token("abc"));
        assert!(!target.has_token("abd"));

        let target = Target::parse("/");
        assert_eq!(target.path, "/");
        assert_eq!(target.generation, None);
        assert!(!target.has_token(""));

        assert_eq!(Target::parse("/message?gen=x").generation, None);
    }

    #[test]
    fn test_serves_placeholder_then_mounted_page() {
        let mut host = HttpHost::bind("127.0.0.1:0", &PageOptions::default()).unwrap();
        let client = reqwest::blocking::Client::new();

        let body = client.get(host.page_url()).send().unwrap().text().unwrap();
        assert!(body.contains("Waiting for a link"));
        assert!(body.contains(&*host.token));

        host.load(&content(1, "<p>player one</p>")).unwrap();
        let body = client.get(host.page_url()).send().unwrap().text().unwrap();
        assert_eq!(body, "<p>player one</p>");

        host.load(&content(2, "<script>var TOKEN = \"__BRIDGE_TOKEN__\";</script>")).unwrap();
        let body = client.get(host.page_url()).send().unwrap().text().unwrap();
        assert_eq!(body, format!("<script>var TOKEN = \"{}\";</script>", host.token));
    }

    #[test]
    fn test_every_host_gets_its_own_token() {
        let first = HttpHost::bind("127.0.0.1:0", &PageOptions::default()).unwrap();
        let second = HttpHost::bind("127.0.0.1:0", &PageOptions::default()).unwrap();
        assert_eq!(first.token.len(), TOKEN_LEN);
        assert!(first.token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_messages_are_tagged_with_generation() {
        let mut host = HttpHost::bind("127.0.0.1:0", &PageOptions::default()).unwrap();
        let client = reqwest::blocking::Client::new();
        let payload = BridgeMessage::CurrentTime(30.0).encode();

        let status = client
            .post(message_url(&host, 4))
            .body(payload.clone())
            .send()
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 204);

        let envelope = recv(&mut host).expect("message should arrive");
        assert_eq!(envelope.generation, Generation::new(4));
        assert_eq!(envelope.payload, payload);
    }

    #[test]
    fn test_command_poll_drains_once_and_flags_stale_pages() {
        let mut host = HttpHost::bind("127.0.0.1:0", &PageOptions::default()).unwrap();
        let client = reqwest::blocking::Client::new();
        let base = host.page_url();
        let token = Arc::clone(&host.token);
        let poll = |generation: u64| -> serde_json::Value {
            client
                .get(format!("{}commands?gen={}&token={}", base, generation, token))
                .send()
                .unwrap()
                .json()
                .unwrap()
        };

        // Nothing mounted: generation 0 is current
        assert_eq!(poll(0)["reload"], false);

        host.load(&content(2, "page")).unwrap();
        host.inject(Generation::new(2), PlayerCommand::Play).unwrap();
        host.inject(Generation::new(1), PlayerCommand::Pause).unwrap();

        assert_eq!(poll(0)["reload"], true);
        let batch = poll(2);
        assert_eq!(batch["reload"], false);
        assert_eq!(batch["commands"], serde_json::json!(["playVideo"]));
        assert_eq!(poll(2)["commands"], serde_json::json!([]));

        host.unload(Generation::new(2));
        assert_eq!(poll(2)["reload"], true);
    }

    #[test]
    fn test_unknown_path_is_404() {
        let host = HttpHost::bind("127.0.0.1:0", &PageOptions::default()).unwrap();
        let status = reqwest::blocking::get(format!("{}favicon.ico", host.page_url()))
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 404);
    }

    #[test]
    fn test_requests_without_the_token_are_forbidden() {
        let mut host = HttpHost::bind("127.0.0.1:0", &PageOptions::default()).unwrap();
        let client = reqwest::blocking::Client::new();
        host.load(&content(1, "page")).unwrap();
        host.inject(Generation::new(1), PlayerCommand::Play).unwrap();
        let payload = BridgeMessage::PlayerReady.encode();

        for url in [
            format!("{}message?gen=1", host.page_url()),
            format!("{}message?gen=1&token=wrong", host.page_url()),
        ] {
            let status = client.post(url).body(payload.clone()).send().unwrap().status();
            assert_eq!(status.as_u16(), 403);
        }
        let status = client
            .get(format!("{}commands?gen=1", host.page_url()))
            .send()
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 403);
        assert!(recv(&mut host).is_none());

        // The rejected poll left the queue alone
        let batch: serde_json::Value = client
            .get(format!("{}commands?gen=1&token={}", host.page_url(), host.token))
            .send()
            .unwrap()
            .json()
            .unwrap();
        assert_eq!(batch["commands"], serde_json::json!(["playVideo"]));
    }

    #[test]
    fn test_oversized_message_is_rejected() {
        let mut host = HttpHost::bind("127.0.0.1:0", &PageOptions::default()).unwrap();
        let client = reqwest::blocking::Client::new();

        let status = client
            .post(message_url(&host, 1))
            .body("x".repeat(MAX_MESSAGE_BYTES + 1))
            .send()
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 413);
        assert!(recv(&mut host).is_none());

        let status = client
            .post(message_url(&host, 1))
            .body("x".repeat(MAX_MESSAGE_BYTES))
            .send()
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 204);
        assert_eq!(recv(&mut host).unwrap().payload.len(), MAX_MESSAGE_BYTES);
    }
}
