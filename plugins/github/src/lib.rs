//! GitHub release plugin.
//!
//! Creates a GitHub release carrying the release notes and uploads asset
//! files during publish. API calls go through [`HostingApi`], implemented by
//! the blocking [`GithubClient`].

mod api;
mod client;
mod plugin;

pub use api::{CreatedRelease, HostingApi, ReleaseRequest};
pub use client::GithubClient;
pub use plugin::{GithubPlugin, repository_from_url};
