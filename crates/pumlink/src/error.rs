//! CLI error types.

use pumlink_config::ConfigError;
use pumlink_diagrams::{PatternError, RewriteError};
use pumlink_fs::TargetError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Pattern(#[from] PatternError),

    #[error("{0}")]
    Target(#[from] TargetError),

    #[error("{0}")]
    Rewrite(#[from] RewriteError),

    #[error("{failed} of {total} document(s) failed")]
    Batch { failed: usize, total: usize },
}
