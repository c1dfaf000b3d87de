//! GitHub REST client.

use std::path::Path;
use std::time::Duration;

use cadence_plugin::{PluginError, PluginResult};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use crate::api::{CreatedRelease, HostingApi, ReleaseRequest};

const API_VERSION: &str = "2022-11-28";

#[derive(Deserialize)]
struct UploadedAsset {
    browser_download_url: String,
}

/// Blocking GitHub API client.
pub struct GithubClient {
    http: Client,
    api_url: String,
    token: String,
}

impl GithubClient {
    /// Creates a client for `api_url` authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::RemoteApi`] if the HTTP client cannot be built.
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> PluginResult<Self> {
        let http = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .build()
            .map_err(|e| transport("failed to build HTTP client", &e))?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl HostingApi for GithubClient {
    fn create_release(&self, request: &ReleaseRequest) -> PluginResult<CreatedRelease> {
        let url = format!("{}/repos/{}/releases", self.api_url, request.repository);
        debug!(%url, tag = %request.tag_name, "creating release");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(request)
            .send()
            .map_err(|e| transport("failed to create release", &e))?;

        check(response)?
            .json()
            .map_err(|e| transport("invalid release response", &e))
    }

    fn upload_asset(&self, release: &CreatedRelease, path: &Path) -> PluginResult<String> {
        let url = upload_url(release)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PluginError::Config(format!("{} is not a file", path.display())))?;
        let bytes = std::fs::read(path).map_err(|e| PluginError::filesystem(path, e))?;
        debug!(%url, %name, size = bytes.len(), "uploading asset");

        let response = self
            .http
            .post(url)
            .query(&[("name", name.as_str())])
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .map_err(|e| transport("failed to upload asset", &e))?;

        let asset: UploadedAsset = check(response)?
            .json()
            .map_err(|e| transport("invalid upload response", &e))?;
        Ok(asset.browser_download_url)
    }
}

fn upload_url(release: &CreatedRelease) -> PluginResult<&str> {
    let url = release
        .upload_url
        .split_once('{')
        .map_or(release.upload_url.as_str(), |(base, _)| base);
    if url.is_empty() {
        return Err(PluginError::RemoteApi {
            status: None,
            message: format!("release {} has no upload URL", release.id),
        });
    }
    Ok(url)
}

fn check(response: Response) -> PluginResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(PluginError::RemoteApi {
        status: Some(status.as_u16()),
        message: error_message(&body),
    })
}

/// Extracts GitHub's `message` field, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn transport(context: &str, err: &reqwest::Error) -> PluginError {
    PluginError::RemoteApi {
        status: err.status().map(|s| s.as_u16()),
        message: format!("{context}: {err}"),
    }
}
