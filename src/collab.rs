//! External collaborators: text generation and cloud upload.
//!
//! Both are traits so the editor never knows which service sits behind
//! them; tests substitute in-process fakes. The HTTP implementations here
//! talk to whatever endpoints the deployment configures.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::LienzoError;

/// Produces caption text from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LienzoError>;
}

/// Persists an exported PNG somewhere reachable by URL.
#[async_trait]
pub trait CloudUploader: Send + Sync {
    async fn upload(&self, png: &[u8]) -> Result<String, LienzoError>;
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Text generation over a JSON HTTP endpoint.
///
/// POSTs `{"prompt": ...}` and reads `{"text": ...}` back.
pub struct HttpTextGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTextGenerator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("lienzo/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("failed to build HTTP client"),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LienzoError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| LienzoError::Generate(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LienzoError::Generate(format!(
                "generation endpoint returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LienzoError::Generate(format!("bad response body: {e}")))?;
        Ok(body.text)
    }
}

/// Uploads PNGs with PUT to `{base_url}/{uuid}.png`.
pub struct HttpUploader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUploader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("lienzo/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CloudUploader for HttpUploader {
    async fn upload(&self, png: &[u8]) -> Result<String, LienzoError> {
        let url = format!(
            "{}/{}.png",
            self.base_url.trim_end_matches('/'),
            uuid::Uuid::new_v4()
        );
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(png.to_vec())
            .send()
            .await
            .map_err(|e| LienzoError::Upload(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LienzoError::Upload(format!(
                "upload endpoint returned {}",
                response.status()
            )));
        }
        Ok(url)
    }
}
