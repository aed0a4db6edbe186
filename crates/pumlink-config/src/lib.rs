//! Configuration management for pumlink.
//!
//! Parses `pumlink.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `repository.owner`
//! - `repository.name`
//! - `repository.branch`
//! - `repository.root`
//! - `render.proxy_url`
//! - `render.raw_base_url`

mod expand;

use pumlink_diagrams::{
    DEFAULT_ARTIFACT_EXTENSION, DEFAULT_BRANCH, DEFAULT_FENCE, DEFAULT_KIND, DEFAULT_PROXY_URL,
    DEFAULT_RAW_BASE_URL,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override repository owner (GitHub user or organization).
    pub owner: Option<String>,
    /// Override repository name.
    pub repo: Option<String>,
    /// Override branch used in raw-content URLs.
    pub branch: Option<String>,
    /// Override repository root directory.
    pub root: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "pumlink.toml";


/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository identity (paths are relative strings from TOML).
    repository: RepositoryConfigRaw,
    /// Rendering reference configuration.
    pub render: RenderConfig,
    /// Diagram block matching configuration.
    pub blocks: BlocksConfig,
    /// Document selection configuration.
    pub documents: DocumentsConfig,

    /// Resolved repository configuration (set after loading).
    #[serde(skip)]
    pub repository_resolved: RepositoryConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw repository configuration as parsed from TOML (root as string).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RepositoryConfigRaw {
    owner: Option<String>,
    name: Option<String>,
    branch: Option<String>,
    root: Option<String>,
}

/// Resolved repository configuration.
#[derive(Debug)]
pub struct RepositoryConfig {
    /// Repository owner (GitHub user or organization).
    pub owner: Option<String>,
    /// Repository name.
    pub name: Option<String>,
    /// Branch embedded in raw-content URLs.
    pub branch: String,
    /// Repository root on disk; artifact URLs are relative to it.
    pub root: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: None,
            name: None,
            branch: DEFAULT_BRANCH.to_owned(),
            root: PathBuf::from("."),
        }
    }
}

/// Validated repository identity borrowed from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryIdentity<'a> {
    /// Repository owner.
    pub owner: &'a str,
    /// Repository name.
    pub name: &'a str,
    /// Branch name.
    pub branch: &'a str,
}

/// Rendering reference configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// PlantUML proxy endpoint that fetches and renders a remote source.
    pub proxy_url: String,
    /// Base URL serving raw repository files.
    pub raw_base_url: String,
    /// Whether the proxy may cache rendered images.
    pub cache: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_owned(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_owned(),
            cache: false,
        }
    }
}

/// Diagram block matching configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BlocksConfig {
    /// Code fence info strings that open a diagram block.
    pub fences: Vec<String>,
    /// Diagram kinds accepted after `@start` / `@end`.
    pub kinds: Vec<String>,
    /// Extension of generated artifact files.
    pub artifact_extension: String,
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            fences: vec![DEFAULT_FENCE.to_owned()],
            kinds: vec![DEFAULT_KIND.to_owned()],
            artifact_extension: DEFAULT_ARTIFACT_EXTENSION.to_owned(),
        }
    }
}

/// Document selection configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// File extensions (without dot) treated as documents.
    pub extensions: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_owned(), "markdown".to_owned()],
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`repository.owner`").
        field: String,
        /// Error message (e.g., "${`GITHUB_OWNER`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a list of tokens that are non-empty and free of the rejected characters.
fn require_tokens(
    values: &[String],
    field: &str,
    rejected: impl Fn(char) -> bool,
) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{field} must contain at least one entry"
        )));
    }
    for value in values {
        require_non_empty(value, field)?;
        if value.chars().any(&rejected) {
            return Err(ConfigError::Validation(format!(
                "{field} entry '{value}' contains invalid characters"
            )));
        }
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `pumlink.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged result
    /// is validated once more.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(owner) = &settings.owner {
            self.repository_resolved.owner = Some(owner.clone());
        }
        if let Some(repo) = &settings.repo {
            self.repository_resolved.name = Some(repo.clone());
        }
        if let Some(branch) = &settings.branch {
            self.repository_resolved.branch.clone_from(branch);
        }
        if let Some(root) = &settings.root {
            self.repository_resolved.root.clone_from(root);
        }
    }

    /// Get the validated repository identity.
    ///
    /// Owner and name have no defaults: they must come from the config file
    /// or the command line.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if owner or name is missing or empty.
    pub fn require_repository(&self) -> Result<RepositoryIdentity<'_>, ConfigError> {
        let repo = &self.repository_resolved;
        let owner = repo.owner.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "repository owner required (--username or repository.owner)".to_owned(),
            )
        })?;
        let name = repo.name.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "repository name required (--repo or repository.name)".to_owned(),
            )
        })?;
        require_non_empty(owner, "repository.owner")?;
        require_non_empty(name, "repository.name")?;
        Ok(RepositoryIdentity {
            owner,
            name,
            branch: &repo.branch,
        })
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with the repository root at the current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with the repository root at the given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            repository: RepositoryConfigRaw::default(),
            render: RenderConfig::default(),
            blocks: BlocksConfig::default(),
            documents: DocumentsConfig::default(),
            repository_resolved: RepositoryConfig {
                root: base.to_path_buf(),
                ..RepositoryConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Repository owner and name are only checked when present; use
    /// [`require_repository`](Self::require_repository) when they are needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_repository()?;
        self.validate_render()?;
        self.validate_blocks()?;
        self.validate_documents()?;
        Ok(())
    }

    fn validate_repository(&self) -> Result<(), ConfigError> {
        let repo = &self.repository_resolved;
        if let Some(owner) = &repo.owner {
            require_non_empty(owner, "repository.owner")?;
        }
        if let Some(name) = &repo.name {
            require_non_empty(name, "repository.name")?;
        }
        require_non_empty(&repo.branch, "repository.branch")?;
        Ok(())
    }

    fn validate_render(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.render.proxy_url, "render.proxy_url")?;
        require_http_url(&self.render.proxy_url, "render.proxy_url")?;
        require_non_empty(&self.render.raw_base_url, "render.raw_base_url")?;
        require_http_url(&self.render.raw_base_url, "render.raw_base_url")?;
        Ok(())
    }

    fn validate_blocks(&self) -> Result<(), ConfigError> {
        require_tokens(&self.blocks.fences, "blocks.fences", |c| {
            c == '`' || c.is_whitespace()
        })?;
        require_tokens(&self.blocks.kinds, "blocks.kinds", |c| {
            !(c.is_ascii_alphanumeric() || c == '_')
        })?;

        let ext = &self.blocks.artifact_extension;
        require_non_empty(ext, "blocks.artifact_extension")?;
        if ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::Validation(
                "blocks.artifact_extension must not contain '.' or path separators".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_documents(&self) -> Result<(), ConfigError> {
        require_tokens(&self.documents.extensions, "documents.extensions", |c| {
            c == '.' || c == '/' || c == '\\'
        })
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let repo = &mut self.repository;
        expand::expand_opt(&mut repo.owner, "repository.owner")?;
        expand::expand_opt(&mut repo.name, "repository.name")?;
        expand::expand_opt(&mut repo.branch, "repository.branch")?;
        expand::expand_opt(&mut repo.root, "repository.root")?;

        self.render.proxy_url = expand::expand_env(&self.render.proxy_url, "render.proxy_url")?;
        self.render.raw_base_url =
            expand::expand_env(&self.render.raw_base_url, "render.raw_base_url")?;

        Ok(())
    }

    /// Resolve the repository section against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let raw = &self.repository;
        self.repository_resolved = RepositoryConfig {
            owner: raw.owner.clone(),
            name: raw.name.clone(),
            branch: raw
                .branch
                .clone()
                .unwrap_or_else(|| DEFAULT_BRANCH.to_owned()),
            root: config_dir.join(raw.root.as_deref().unwrap_or(".")),
        };
    }
}
