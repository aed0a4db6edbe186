//! Rendering reference snippets.
//!
//! A snippet is inserted after each diagram block and embeds an image served
//! by a PlantUML proxy. The proxy fetches the artifact from the repository's
//! raw-content host:
//!
//! ```text
//!
//!
//! **Rendered Diagram:**
//!
//! ![Notes](https://www.plantuml.com/plantuml/proxy?cache=no&src=https://raw.githubusercontent.com/alice/docs/main/notes_58.puml)
//!
//! ```

use std::path::{Component, Path};

use crate::consts::{CAPTION, DEFAULT_BRANCH, DEFAULT_PROXY_URL, DEFAULT_RAW_BASE_URL};
use crate::naming::title_case;

/// Repository coordinates embedded in raw-content URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch serving the artifacts.
    pub branch: String,
}

impl HostIdentity {
    /// Identity on the default branch.
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: DEFAULT_BRANCH.to_owned(),
        }
    }

    /// Set the branch.
    #[must_use]
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

/// Builds reference snippets for extracted artifacts.
#[derive(Debug, Clone)]
pub struct ReferenceRenderer {
    host: HostIdentity,
    proxy_url: String,
    raw_base_url: String,
    cache: bool,
}

impl ReferenceRenderer {
    /// Create a renderer using the public PlantUML proxy and GitHub raw host.
    #[must_use]
    pub fn new(host: HostIdentity) -> Self {
        Self {
            host,
            proxy_url: DEFAULT_PROXY_URL.to_owned(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_owned(),
            cache: false,
        }
    }

    /// Set the PlantUML proxy endpoint.
    #[must_use]
    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = url.into();
        self
    }

    /// Set the raw-content base URL.
    #[must_use]
    pub fn raw_base_url(mut self, url: impl Into<String>) -> Self {
        self.raw_base_url = url.into();
        self
    }

    /// Allow the proxy to cache rendered images (default: `false`).
    #[must_use]
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Raw-content URL for a repository-relative artifact path.
    #[must_use]
    pub fn raw_url(&self, artifact_path: &Path) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base_url.trim_end_matches('/'),
            self.host.owner,
            self.host.repo,
            self.host.branch,
            url_path(artifact_path)
        )
    }

    /// Proxy URL that renders the artifact as an image.
    #[must_use]
    pub fn image_url(&self, artifact_path: &Path) -> String {
        let cache = if self.cache { "yes" } else { "no" };
        format!(
            "{}?cache={cache}&src={}",
            self.proxy_url.trim_end_matches('/'),
            self.raw_url(artifact_path)
        )
    }

    /// Build the snippet inserted after a block.
    ///
    /// `artifact_path` is relative to the repository root.
    #[must_use]
    pub fn render(&self, diagram_id: &str, artifact_path: &Path) -> String {
        format!(
            "\n\n{CAPTION}\n\n![{}]({})\n\n",
            title_case(diagram_id),
            self.image_url(artifact_path)
        )
    }
}

/// Join path components with `/`, whatever the platform separator.
fn url_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/")
}
