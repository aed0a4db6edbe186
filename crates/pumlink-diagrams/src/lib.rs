//! PlantUML block extraction and rendering-link insertion for pumlink.
//!
//! This crate rewrites markdown documents that embed PlantUML diagrams:
//! - Each fenced diagram block is saved as a sibling `.puml` artifact
//! - A caption and image link are inserted after the block; the image is
//!   rendered by a PlantUML proxy from the artifact's raw repository URL
//!
//! # Architecture
//!
//! The crate is organized into modules:
//! - [`locator`]: Block discovery (`BlockLocator`, `Block`)
//! - [`naming`]: Diagram identifiers and artifact file names
//! - [`artifact`]: Artifact emission (`ArtifactSink`, `FsArtifactSink`, `DryRunSink`)
//! - [`reference`]: Reference snippets (`ReferenceRenderer`, `HostIdentity`)
//! - [`rewriter`]: Per-document orchestration (`DocumentRewriter`)
//!
//! # Example
//!
//! ```
//! use pumlink_diagrams::{
//!     BlockLocator, Document, DocumentRewriter, DryRunSink, HostIdentity, ReferenceRenderer,
//! };
//!
//! let rewriter = DocumentRewriter::new(
//!     BlockLocator::default(),
//!     ReferenceRenderer::new(HostIdentity::new("alice", "docs")),
//! )
//! .with_sink(Box::new(DryRunSink));
//!
//! let text = "```puml\n@startmindmap\n* A\n@endmindmap\n```\n";
//! let outcome = rewriter.rewrite(&Document::new("notes.md", ""), text).unwrap();
//! assert!(outcome.text.contains("**Rendered Diagram:**"));
//! assert!(outcome.text.contains("alice/docs/main/notes_"));
//! ```

mod artifact;
mod consts;
mod document;
mod locator;
mod naming;
mod reference;
mod rewriter;

pub use artifact::{Artifact, ArtifactError, ArtifactSink, DryRunSink, FsArtifactSink};
pub use consts::{
    DEFAULT_ARTIFACT_EXTENSION, DEFAULT_BRANCH, DEFAULT_FENCE, DEFAULT_KIND, DEFAULT_PROXY_URL,
    DEFAULT_RAW_BASE_URL,
};
pub use document::Document;
pub use locator::{Block, BlockLocator, PatternError};
pub use naming::{artifact_file_name, diagram_id, title_case};
pub use reference::{HostIdentity, ReferenceRenderer};
pub use rewriter::{DocumentReport, DocumentRewriter, RewriteError, RewriteOutcome};
