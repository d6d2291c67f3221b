//! Minimal in-process WebDAV server for client tests.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use base64::Engine;

const MULTISTATUS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:"><d:response><d:href>/</d:href></d:response></d:multistatus>"#;

struct DavInner {
    auth: String,
    dirs: HashSet<String>,
    files: HashMap<String, (Vec<u8>, String)>,
    requests: Vec<(String, String)>,
    put_failure: Option<u16>,
}

impl DavInner {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.dirs.contains(&dir_key(path))
    }
}

fn dir_key(path: &str) -> String {
    format!("{}/", path.trim_end_matches('/'))
}

fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => path[..=i].to_string(),
        None => "/".to_string(),
    }
}

#[derive(Clone)]
pub struct FakeDav {
    addr: SocketAddr,
    inner: Arc<Mutex<DavInner>>,
}

impl FakeDav {
    /// Serve on an ephemeral port; `/dav/` exists up front.
    pub async fn start(username: &str, password: &str) -> Self {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        let inner = Arc::new(Mutex::new(DavInner {
            auth: format!("Basic {}", token),
            dirs: HashSet::from(["/dav/".to_string()]),
            files: HashMap::new(),
            requests: Vec::new(),
            put_failure: None,
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(Arc::clone(&inner));

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, inner }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/dav/", self.addr)
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.inner.lock().unwrap().dirs.contains(path)
    }

    /// Stored bytes and content type
    pub fn file(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.inner.lock().unwrap().files.get(path).cloned()
    }

    /// Place a file directly, creating its directory
    pub fn insert_file(&self, path: &str, data: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.dirs.insert(parent_dir(path));
        inner
            .files
            .insert(path.to_string(), (data, "application/octet-stream".to_string()));
    }

    pub fn count_requests(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    pub fn fail_puts_with(&self, status: u16) {
        self.inner.lock().unwrap().put_failure = Some(status);
    }
}

async fn handle(
    State(inner): State<Arc<Mutex<DavInner>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let mut inner = inner.lock().unwrap();
    inner.requests.push((method.to_string(), path.clone()));

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == inner.auth);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match method.as_str() {
        "PROPFIND" => {
            if inner.exists(&path) {
                (StatusCode::MULTI_STATUS, MULTISTATUS).into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }
        "MKCOL" => {
            if inner.exists(&path) {
                StatusCode::METHOD_NOT_ALLOWED.into_response()
            } else if !inner.dirs.contains(&parent_dir(path.trim_end_matches('/'))) {
                StatusCode::CONFLICT.into_response()
            } else {
                inner.dirs.insert(dir_key(&path));
                StatusCode::CREATED.into_response()
            }
        }
        "GET" => match inner.files.get(&path) {
            Some((data, content_type)) => {
                ([(header::CONTENT_TYPE, content_type.clone())], data.clone()).into_response()
            }
            None => StatusCode::NOT_FOUND.into_response(),
        },
        "PUT" => {
            if let Some(code) = inner.put_failure {
                return StatusCode::from_u16(code)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                    .into_response();
            }
            if !inner.dirs.contains(&parent_dir(&path)) {
                return StatusCode::CONFLICT.into_response();
            }
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let existed = inner
                .files
                .insert(path, (body.to_vec(), content_type))
                .is_some();
            if existed {
                StatusCode::NO_CONTENT.into_response()
            } else {
                StatusCode::CREATED.into_response()
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}
