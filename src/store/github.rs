// GitHub contents API store: GET yields the blob sha used as the version
// token, PUT submits it back (sha present = update, absent = create).

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{RemoteStore, StoreError, StoredFile};
use crate::config::StoreConfig;

pub struct GithubStore {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    branch: String,
    base_dir: String,
    token: String,
}

impl GithubStore {
    pub fn new(client: Client, config: &StoreConfig, token: String) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            base_dir: config.base_dir.clone(),
            token,
        }
    }

    fn content_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            self.owner,
            self.repo,
            self.repo_path(path)
        )
    }

    /// Joins base_dir and path, trimming stray separators.
    fn repo_path(&self, path: &str) -> String {
        let base = self.base_dir.trim_matches('/');
        let path = path.trim_start_matches('/');
        if base.is_empty() {
            path.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .header("user-agent", crate::version::user_agent())
    }
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[async_trait]
impl RemoteStore for GithubStore {
    async fn read(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let response = self
            .request(self.client.get(self.content_url(path)))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let body: serde_json::Value = response.json().await?;
        if body.is_array() {
            return Err(StoreError::InvalidResponse(format!(
                "{path} is a directory"
            )));
        }
        let file: ContentResponse =
            serde_json::from_value(body).map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        if file.encoding.as_deref() != Some("base64") {
            return Err(StoreError::InvalidResponse(format!(
                "unsupported content encoding {:?} for {path}",
                file.encoding
            )));
        }
        // The API wraps base64 bodies in newlines.
        let compact: String = file
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let content = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| StoreError::InvalidResponse(format!("bad base64 content: {e}")))?;
        Ok(Some(StoredFile {
            content,
            version: file.sha,
        }))
    }

    async fn cas_write(
        &self,
        path: &str,
        expected: Option<&str>,
        content: &[u8],
        message: &str,
    ) -> Result<(), StoreError> {
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": self.branch,
        });
        if let Some(sha) = expected {
            body["sha"] = json!(sha);
        }
        let response = self
            .request(self.client.put(self.content_url(path)))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::VersionConflict(format!("{path}: {message}")));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
