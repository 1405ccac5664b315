//! Blocking REST clients implementing [`wfs_core::CiClient`].

pub mod github;
pub mod gitlab;
mod http;

pub use github::{GitHubClient, GITHUB_API, GITHUB_TOKEN_VAR};
pub use gitlab::{GitLabClient, GITLAB_TOKEN_VAR};
