// In-process registry serving the v2 endpoints the client talks to.

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing, Router};

use crate::reference::{Digest, HashType};
use crate::service_url::{DOCKER_CONFIG_V1, DOCKER_MANIFEST_V2};

#[derive(Default)]
pub(crate) struct FakeRegistry {
    repositories: Vec<String>,
    tags: HashMap<String, Option<Vec<String>>>,
    manifests: HashMap<(String, String), String>,
    blobs: HashMap<String, String>,
    page_size: Option<usize>,
    authorization: Option<String>,
    plain_not_found: bool,
    broken_catalog: bool,
    delete_status: u16,
    deleted: Mutex<Vec<(String, String)>>,
}

fn registry_error(status: StatusCode, code: &str, message: &str) -> Response {
    let body = format!(
        r#"{{"errors":[{{"code":"{}","message":"{}","detail":{{}}}}]}}"#,
        code, message
    );
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn json(body: String, content_type: &str) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type.to_string())], body).into_response()
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            delete_status: 202,
            ..Default::default()
        }
    }

    pub fn repository(mut self, name: &str) -> Self {
        if !self.repositories.iter().any(|r| r == name) {
            self.repositories.push(name.to_string());
        }
        self
    }

    fn push_tag(&mut self, repository: &str, tag: &str) {
        self.tags
            .entry(repository.to_string())
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .push(tag.to_string());
    }

    /// Tag with a manifest, its config blob created at `created`.
    pub fn image(mut self, repository: &str, tag: &str, created: &str, layers: &[u64]) -> Self {
        let config = format!(r#"{{"architecture":"amd64","created":"{}","os":"linux"}}"#, created);
        let config_digest = Digest::of(HashType::Sha256, config.as_bytes());

        let layers = layers
            .iter()
            .enumerate()
            .map(|(i, size)| {
                let digest = Digest::of(HashType::Sha256, format!("{tag} layer {i}").as_bytes());
                format!(
                    r#"{{"mediaType":"application/vnd.docker.image.rootfs.diff.tar.gzip","size":{},"digest":"{}"}}"#,
                    size, digest
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        let manifest = format!(
            r#"{{"schemaVersion":2,"mediaType":"{}","config":{{"mediaType":"{}","size":{},"digest":"{}"}},"layers":[{}]}}"#,
            DOCKER_MANIFEST_V2,
            DOCKER_CONFIG_V1,
            config.len(),
            config_digest,
            layers
        );

        self = self.repository(repository);
        self.push_tag(repository, tag);
        self.manifests.insert((repository.to_string(), tag.to_string()), manifest);
        self.blobs.insert(config_digest.to_string(), config);
        self
    }

    /// Tag listed without a manifest behind it.
    pub fn dangling_tag(mut self, repository: &str, tag: &str) -> Self {
        self = self.repository(repository);
        self.push_tag(repository, tag);
        self
    }

    pub fn null_tags(mut self, repository: &str) -> Self {
        self = self.repository(repository);
        self.tags.insert(repository.to_string(), None);
        self
    }

    pub fn page_size(mut self, n: usize) -> Self {
        self.page_size = Some(n);
        self
    }

    /// Require this exact Authorization header.
    pub fn basic_auth(mut self, authorization: &str) -> Self {
        self.authorization = Some(authorization.to_string());
        self
    }

    /// Answer unknown manifests with a bare 404 instead of an error body.
    pub fn plain_not_found(mut self) -> Self {
        self.plain_not_found = true;
        self
    }

    pub fn broken_catalog(mut self) -> Self {
        self.broken_catalog = true;
        self
    }

    pub fn delete_status(mut self, status: u16) -> Self {
        self.delete_status = status;
        self
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Serves the registry on an ephemeral port, returns its base url.
    pub fn spawn(self) -> (String, Arc<Self>) {
        let registry = Arc::new(self);
        let state = registry.clone();
        let (tx, rx) = mpsc::channel::<SocketAddr>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("test runtime");

            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
                tx.send(listener.local_addr().expect("local address")).expect("report address");

                let app = Router::new()
                    .route("/v2/*path", routing::any(handle))
                    .with_state(state);
                axum::serve(listener, app).await.expect("serve");
            });
        });

        let address = rx.recv().expect("fake registry address");
        (format!("http://{}", address), registry)
    }

    fn manifest_by_reference(&self, repository: &str, reference: &str) -> Option<&String> {
        self.manifests
            .get(&(repository.to_string(), reference.to_string()))
            .or_else(|| {
                self.manifests
                    .iter()
                    .filter(|((repo, _), _)| repo == repository)
                    .map(|(_, body)| body)
                    .find(|body| Digest::of(HashType::Sha256, body.as_bytes()).to_string() == reference)
            })
    }

    fn page(&self, items: &[String], query: &HashMap<String, String>, path: &str) -> (Vec<String>, Option<String>) {
        let start = query
            .get("last")
            .and_then(|last| items.iter().position(|i| i == last).map(|p| p + 1))
            .unwrap_or(0);
        let n = query
            .get("n")
            .and_then(|n| n.parse().ok())
            .or(self.page_size)
            .unwrap_or(items.len());

        let page: Vec<String> = items.iter().skip(start).take(n).cloned().collect();
        let next = (start + n < items.len()).then(|| {
            let last = page.last().cloned().unwrap_or_default();
            format!("</v2/{}?n={}&last={}>; rel=\"next\"", path, n, last)
        });
        (page, next)
    }

    fn catalog(&self, query: &HashMap<String, String>) -> Response {
        if self.broken_catalog {
            return json(r#"{"repositories": ["#.to_string(), "application/json");
        }

        let (page, next) = self.page(&self.repositories, query, "_catalog");
        let body = serde_json::json!({ "repositories": page }).to_string();
        match next {
            Some(link) => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/json".to_string()),
                    (header::LINK, link),
                ],
                body,
            )
                .into_response(),
            None => json(body, "application/json"),
        }
    }

    fn tag_list(&self, repository: &str) -> Response {
        match self.tags.get(repository) {
            Some(tags) => {
                let body = serde_json::json!({ "name": repository, "tags": tags }).to_string();
                json(body, "application/json")
            }
            None => registry_error(StatusCode::NOT_FOUND, "NAME_UNKNOWN", "repository name not known to registry"),
        }
    }

    fn manifest(&self, method: Method, headers: &HeaderMap, repository: &str, reference: &str) -> Response {
        // Manifests are only served in the media type the client asks for.
        let accepted = headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|media_type| media_type.trim() == DOCKER_MANIFEST_V2);
        if !accepted {
            return registry_error(StatusCode::NOT_FOUND, "MANIFEST_UNKNOWN", "manifest unknown");
        }

        let Some(body) = self.manifest_by_reference(repository, reference) else {
            if self.plain_not_found {
                return (StatusCode::NOT_FOUND, "404 page not found").into_response();
            }
            return registry_error(StatusCode::NOT_FOUND, "MANIFEST_UNKNOWN", "manifest unknown");
        };
        let digest = Digest::of(HashType::Sha256, body.as_bytes()).to_string();

        if method == Method::DELETE {
            let status = StatusCode::from_u16(self.delete_status).unwrap_or(StatusCode::ACCEPTED);
            if status != StatusCode::ACCEPTED {
                return registry_error(status, "UNSUPPORTED", "The operation is unsupported.");
            }
            if let Ok(mut deleted) = self.deleted.lock() {
                deleted.push((repository.to_string(), reference.to_string()));
            }
            return StatusCode::ACCEPTED.into_response();
        }

        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, DOCKER_MANIFEST_V2.to_string()),
                (HeaderName::from_static("docker-content-digest"), digest),
            ],
            body.clone(),
        )
            .into_response()
    }

    fn blob(&self, digest: &str) -> Response {
        match self.blobs.get(digest) {
            Some(config) => json(config.clone(), "application/octet-stream"),
            None => registry_error(StatusCode::NOT_FOUND, "BLOB_UNKNOWN", "blob unknown to registry"),
        }
    }
}

async fn handle(
    State(registry): State<Arc<FakeRegistry>>,
    method: Method,
    headers: HeaderMap,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(expected) = &registry.authorization {
        let given = headers.get(header::AUTHORIZATION).and_then(|h| h.to_str().ok());
        if given != Some(expected.as_str()) {
            return registry_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "authentication required");
        }
    }

    if path == "_catalog" {
        return registry.catalog(&query);
    }
    if let Some(repository) = path.strip_suffix("/tags/list") {
        return registry.tag_list(repository);
    }
    if let Some((repository, reference)) = path.rsplit_once("/manifests/") {
        return registry.manifest(method, &headers, repository, reference);
    }
    if let Some((_, digest)) = path.rsplit_once("/blobs/") {
        return registry.blob(digest);
    }

    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}

thread_local! {
    static LOG_LINES: RefCell<Vec<(log::Level, String)>> = RefCell::new(Vec::new());
}

// Keeps records per test thread so parallel tests don't see each other.
struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        LOG_LINES.with(|lines| {
            lines
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Runs `f` and returns what it logged at warn level or above on this thread.
pub(crate) fn loud_log_lines(f: impl FnOnce()) -> Vec<String> {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Trace);
    LOG_LINES.with(|lines| lines.borrow_mut().clear());

    f();

    LOG_LINES.with(|lines| {
        lines
            .borrow()
            .iter()
            .filter(|(level, _)| *level <= log::Level::Warn)
            .map(|(level, line)| format!("{}: {}", level, line))
            .collect()
    })
}
