use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;

use super::gzip;
use super::RemoteStore;
use crate::sync::config::SyncCredentials;

/// WebDAV client for sync operations.
///
/// All files live in one subdirectory (`base_dir`) of the server URL.
pub struct WebDAVClient {
    client: Client,
    base_url: String,
    base_dir: String,
    auth_header: String,
    propfind: Method,
    mkcol: Method,
}

#[derive(Error, Debug)]
pub enum WebDAVError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Authentication failed")]
    AuthFailed,
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Gzip error: {0}")]
    Gzip(std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WebDAVClient {
    /// Create a new WebDAV client
    pub fn new(
        base_url: &str,
        base_dir: &str,
        credentials: &SyncCredentials,
        connect_timeout: Duration,
    ) -> Result<Self, WebDAVError> {
        // Normalize URL - ensure no trailing slash
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(WebDAVError::InvalidUrl("URL must start with http:// or https://".to_string()));
        }

        let base_dir = base_dir.trim_matches('/').to_string();
        if base_dir.is_empty() {
            return Err(WebDAVError::InvalidUrl("remote directory must not be empty".to_string()));
        }

        // No overall request timeout: a slow upload is left to finish.
        let client = Client::builder().connect_timeout(connect_timeout).build()?;

        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", credentials.username, credentials.password));

        Ok(Self {
            client,
            base_url,
            base_dir,
            auth_header: format!("Basic {}", token),
            propfind: dav_method(b"PROPFIND")?,
            mkcol: dav_method(b"MKCOL")?,
        })
    }

    fn root_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    fn dir_url(&self) -> String {
        format!("{}/{}/", self.base_url, self.base_dir)
    }

    fn file_url(&self, name: &str) -> String {
        format!("{}{}", self.dir_url(), name.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, &self.auth_header)
    }

    /// PROPFIND with Depth 0, only the status matters
    async fn probe(&self, url: &str) -> Result<StatusCode, WebDAVError> {
        let response = self
            .request(self.propfind.clone(), url)
            .header("Depth", "0")
            .header(CONTENT_TYPE, "application/xml")
            .body(PROPFIND_BODY)
            .send()
            .await?;
        Ok(response.status())
    }

    /// MKCOL - Create the sync directory
    async fn mkcol(&self, url: &str) -> Result<(), WebDAVError> {
        let response = self.request(self.mkcol.clone(), url).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::METHOD_NOT_ALLOWED => {
                // Directory already exists
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebDAVError::AuthFailed),
            status => Err(WebDAVError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// GET - Download raw file contents, `None` when the file is absent or empty
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, WebDAVError> {
        let response = self.request(Method::GET, &self.file_url(name)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(WebDAVError::AuthFailed);
            }
            status if !status.is_success() => {
                return Err(WebDAVError::Server {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                });
            }
            _ => {}
        }

        let data = response.bytes().await?;
        if data.is_empty() {
            return Ok(None);
        }
        Ok(Some(data.to_vec()))
    }

    /// PUT - Upload file contents
    async fn put(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<(), WebDAVError> {
        let response = self
            .request(Method::PUT, &self.file_url(name))
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebDAVError::AuthFailed),
            status => Err(WebDAVError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl RemoteStore for WebDAVClient {
    async fn check_connection(&self) -> bool {
        match self.probe(&self.root_url()).await {
            Ok(status) => status.as_u16() < 400,
            Err(e) => {
                log::warn!("WebDAV: connection check failed: {}", e);
                false
            }
        }
    }

    async fn ensure_directory(&self) -> Result<(), WebDAVError> {
        let dir_url = self.dir_url();

        match self.probe(&dir_url).await? {
            StatusCode::NOT_FOUND => {
                log::info!("WebDAV: creating remote directory {}", self.base_dir);
                self.mkcol(&dir_url).await
            }
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebDAVError::AuthFailed),
            status => Err(WebDAVError::Server {
                status: status.as_u16(),
                message: format!("cannot access directory {}", self.base_dir),
            }),
        }
    }

    async fn get_file(&self, name: &str) -> Result<Option<Value>, WebDAVError> {
        self.ensure_directory().await?;

        let Some(data) = self.get(name).await? else {
            return Ok(None);
        };

        // Files written before compression was introduced are plain JSON
        let json = if gzip::is_gzip(&data) {
            match gzip::decompress(&data) {
                Ok(json) => json,
                Err(e) => {
                    log::warn!("WebDAV: {} failed to decompress ({}), reading as plain JSON", name, e);
                    data
                }
            }
        } else {
            data
        };

        Ok(Some(serde_json::from_slice(&json)?))
    }

    async fn put_file(&self, name: &str, payload: &Value) -> Result<(), WebDAVError> {
        self.ensure_directory().await?;

        let json = serde_json::to_vec(payload)?;
        let packed = gzip::compress(&json).map_err(WebDAVError::Gzip)?;
        log::debug!(
            "WebDAV: uploading {} ({} bytes, {} compressed)",
            name,
            json.len(),
            packed.len()
        );

        self.put(name, packed, "application/gzip").await
    }

    async fn put_file_json(&self, name: &str, payload: &Value) -> Result<(), WebDAVError> {
        self.ensure_directory().await?;

        let json = serde_json::to_vec(payload)?;
        self.put(name, json, "application/json").await
    }
}

fn dav_method(name: &[u8]) -> Result<Method, WebDAVError> {
    Method::from_bytes(name)
        .map_err(|e| WebDAVError::InvalidUrl(format!("bad method token: {}", e)))
}

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:resourcetype/>
  </D:prop>
</D:propfind>"#;
