//! Hosting API seam.

use std::path::Path;

use cadence_plugin::PluginResult;
use serde::{Deserialize, Serialize};

/// A release to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRequest {
    /// `owner/name`.
    #[serde(skip)]
    pub repository: String,
    /// The tag the release points at.
    pub tag_name: String,
    /// Branch the tag was created from.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_commitish: String,
    /// Release title.
    pub name: String,
    /// Release notes.
    pub body: String,
    /// Create as draft.
    pub draft: bool,
    /// Mark as prerelease.
    pub prerelease: bool,
}

/// A release created on the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedRelease {
    /// Host identifier.
    pub id: u64,
    /// Browsable URL.
    pub html_url: String,
    /// Asset upload URL, possibly with a `{?name,label}` suffix.
    #[serde(default)]
    pub upload_url: String,
}

/// Creates releases and uploads their assets.
pub trait HostingApi: Send + Sync {
    /// Creates a release.
    ///
    /// # Errors
    ///
    /// Returns [`cadence_plugin::PluginError::RemoteApi`] if the host rejects
    /// the request or cannot be reached.
    fn create_release(&self, request: &ReleaseRequest) -> PluginResult<CreatedRelease>;

    /// Uploads a file to a release and returns its download URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the upload fails.
    fn upload_asset(&self, release: &CreatedRelease, path: &Path) -> PluginResult<String>;
}
