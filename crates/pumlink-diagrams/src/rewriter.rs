//! Document rewriting.
//!
//! [`DocumentRewriter`] extracts every diagram block of a document into a
//! sibling artifact and inserts a rendering reference right after the block.
//!
//! Blocks are located once, against the original text. The output is built
//! into a fresh buffer by copying the original text up to each block end and
//! appending the block's snippet. A running total of inserted snippet bytes
//! (the cumulative offset) translates each original end offset into its
//! position in the rewritten text. That position names the artifact, which
//! matches what splicing into a mutable string one block at a time would
//! produce.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::artifact::{Artifact, ArtifactError, ArtifactSink, DryRunSink, FsArtifactSink};
use crate::consts::DEFAULT_ARTIFACT_EXTENSION;
use crate::document::Document;
use crate::locator::BlockLocator;
use crate::naming::{artifact_file_name, diagram_id};
use crate::reference::ReferenceRenderer;

/// Error processing a single document.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// The document could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// An artifact could not be written.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    /// The rewritten document could not be saved.
    #[error("Failed to write {}: {source}", path.display())]
    WriteBack {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Result of rewriting document text in memory.
#[derive(Debug)]
pub struct RewriteOutcome {
    /// Rewritten document text.
    pub text: String,
    /// Artifact paths in block order.
    pub artifacts: Vec<PathBuf>,
}

impl RewriteOutcome {
    /// Number of blocks found in the document.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.artifacts.len()
    }
}

/// Result of processing a document on disk.
#[derive(Debug)]
pub struct DocumentReport {
    /// Document path.
    pub path: PathBuf,
    /// Artifact paths in block order.
    pub artifacts: Vec<PathBuf>,
    /// Whether the document file was rewritten.
    pub written_back: bool,
}

/// Extracts diagram blocks and inserts rendering references.
///
/// # Example
///
/// ```no_run
/// use pumlink_diagrams::{
///     BlockLocator, Document, DocumentRewriter, HostIdentity, ReferenceRenderer,
/// };
///
/// let rewriter = DocumentRewriter::new(
///     BlockLocator::default(),
///     ReferenceRenderer::new(HostIdentity::new("alice", "docs")),
/// );
/// let report = rewriter.process(&Document::new("notes.md", ""))?;
/// println!("{} artifact(s)", report.artifacts.len());
/// # Ok::<(), pumlink_diagrams::RewriteError>(())
/// ```
pub struct DocumentRewriter {
    locator: BlockLocator,
    renderer: ReferenceRenderer,
    sink: Box<dyn ArtifactSink>,
    extension: String,
    write_back: bool,
}

impl DocumentRewriter {
    /// Create a rewriter that writes artifacts and documents to disk.
    #[must_use]
    pub fn new(locator: BlockLocator, renderer: ReferenceRenderer) -> Self {
        Self {
            locator,
            renderer,
            sink: Box::new(FsArtifactSink),
            extension: DEFAULT_ARTIFACT_EXTENSION.to_owned(),
            write_back: true,
        }
    }

    /// Set the artifact file extension (without dot).
    #[must_use]
    pub fn artifact_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Replace the artifact sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn ArtifactSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Compute everything without writing artifacts or documents.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        if dry_run {
            self.sink = Box::new(DryRunSink);
        }
        self.write_back = !dry_run;
        self
    }

    /// Rewrite document text, emitting one artifact per block.
    ///
    /// The original text is left as-is; the result holds every block
    /// followed by its reference snippet.
    ///
    /// # Errors
    ///
    /// Stops at the first artifact that cannot be written. Artifacts written
    /// before the failure are kept.
    pub fn rewrite(
        &self,
        document: &Document,
        original: &str,
    ) -> Result<RewriteOutcome, ArtifactError> {
        let blocks: Vec<_> = self.locator.locate(original).collect();
        if blocks.is_empty() {
            return Ok(RewriteOutcome {
                text: original.to_owned(),
                artifacts: Vec::new(),
            });
        }

        let id = diagram_id(&document.path);
        let dir = document.dir();
        let mut text = String::with_capacity(original.len() + blocks.len() * 256);
        let mut artifacts = Vec::with_capacity(blocks.len());
        let mut cumulative = 0;
        let mut copied = 0;

        for block in &blocks {
            let effective_end = block.end + cumulative;
            tracing::debug!(
                start = block.start,
                end = block.end,
                effective_end,
                "Located diagram block"
            );

            let artifact = Artifact {
                dir,
                file_name: artifact_file_name(&id, effective_end, &self.extension),
                content: block.payload,
            };
            let written = self.sink.write(&artifact)?;

            let snippet = self
                .renderer
                .render(&id, &document.repo_dir.join(&artifact.file_name));

            text.push_str(&original[copied..block.end]);
            debug_assert_eq!(text.len(), effective_end);
            text.push_str(&snippet);
            copied = block.end;
            cumulative += snippet.len();

            tracing::info!(
                document = %document.path.display(),
                artifact = %written.display(),
                "Added rendering link"
            );
            artifacts.push(written);
        }
        text.push_str(&original[copied..]);

        Ok(RewriteOutcome { text, artifacts })
    }

    /// Read, rewrite and save a document.
    ///
    /// Documents without blocks are not written back.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] on the first I/O failure; the document is left
    /// unchanged on disk unless the final write itself fails part-way.
    pub fn process(&self, document: &Document) -> Result<DocumentReport, RewriteError> {
        let original = fs::read_to_string(&document.path).map_err(|source| RewriteError::Read {
            path: document.path.clone(),
            source,
        })?;

        let outcome = self.rewrite(document, &original)?;

        let written_back = self.write_back && outcome.block_count() > 0;
        if written_back {
            fs::write(&document.path, &outcome.text).map_err(|source| {
                RewriteError::WriteBack {
                    path: document.path.clone(),
                    source,
                }
            })?;
            tracing::info!(
                document = %document.path.display(),
                blocks = outcome.block_count(),
                "Rewrote document"
            );
        } else if outcome.block_count() == 0 {
            tracing::debug!(document = %document.path.display(), "No diagram blocks found");
        }

        Ok(DocumentReport {
            path: document.path.clone(),
            artifacts: outcome.artifacts,
            written_back,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::HostIdentity;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::path::Path;
    use std::rc::Rc;

    const BLOCK_A: &str = "```puml\n@startmindmap\n* A\n@endmindmap\n```";
    const BLOCK_B: &str = "```puml\n@startmindmap\n* B\n** B1\n@endmindmap\n```";

    /// Records artifacts in memory.
    #[derive(Default, Clone)]
    struct RecordingSink {
        written: Rc<RefCell<Vec<(String, String)>>>,
    }

    impl ArtifactSink for RecordingSink {
        fn write(&self, artifact: &Artifact<'_>) -> Result<PathBuf, ArtifactError> {
            self.written
                .borrow_mut()
                .push((artifact.file_name.clone(), artifact.content.to_owned()));
            Ok(artifact.path())
        }
    }

    /// Fails on the n-th write.
    struct FailingSink {
        fail_at: usize,
        calls: RefCell<usize>,
    }

    impl ArtifactSink for FailingSink {
        fn write(&self, artifact: &Artifact<'_>) -> Result<PathBuf, ArtifactError> {
            let mut calls = self.calls.borrow_mut();
            *calls += 1;
            if *calls == self.fail_at {
                return Err(ArtifactError::Io {
                    path: artifact.path(),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            Ok(artifact.path())
        }
    }

    fn renderer() -> ReferenceRenderer {
        ReferenceRenderer::new(HostIdentity::new("alice", "docs"))
    }

    fn recording_rewriter() -> (DocumentRewriter, RecordingSink) {
        let sink = RecordingSink::default();
        let rewriter = DocumentRewriter::new(BlockLocator::default(), renderer())
            .with_sink(Box::new(sink.clone()));
        (rewriter, sink)
    }

    /// Insert snippets by re-scanning the mutated text before every insertion.
    fn rescan_rewrite(document: &Document, original: &str) -> (String, Vec<String>) {
        let locator = BlockLocator::default();
        let renderer = renderer();
        let id = diagram_id(&document.path);
        let count = locator.locate(original).count();

        let mut text = original.to_owned();
        let mut names = Vec::new();
        for index in 0..count {
            let end = locator.locate(&text).nth(index).unwrap().end;
            let name = artifact_file_name(&id, end, "puml");
            let snippet = renderer.render(&id, &document.repo_dir.join(&name));
            text.insert_str(end, &snippet);
            names.push(name);
        }
        (text, names)
    }

    #[test]
    fn test_single_block_scenario() {
        let (rewriter, sink) = recording_rewriter();
        let original = format!("# Notes\n\n{BLOCK_A}\n\nAfter.\n");
        let doc = Document::new("notes.md", "");

        let outcome = rewriter.rewrite(&doc, &original).unwrap();

        let end = original.find(BLOCK_A).unwrap() + BLOCK_A.len();
        let name = format!("notes_{end}.puml");
        let written = sink.written.borrow();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, name);
        assert_eq!(written[0].1, "@startmindmap\n* A\n@endmindmap\n");

        let expected = format!(
            "# Notes\n\n{BLOCK_A}\n\n**Rendered Diagram:**\n\n![Notes](https://www.plantuml.com/plantuml/proxy?cache=no&src=https://raw.githubusercontent.com/alice/docs/main/{name})\n\n\n\nAfter.\n"
        );
        assert_eq!(outcome.text, expected);
        assert_eq!(outcome.artifacts, vec![PathBuf::from(".").join(&name)]);
    }

    #[test]
    fn test_second_offset_shifted_by_first_snippet() {
        let (rewriter, sink) = recording_rewriter();
        let original = format!("{BLOCK_A}\ntext\n{BLOCK_B}\n");
        let doc = Document::new("plan.md", "");

        let outcome = rewriter.rewrite(&doc, &original).unwrap();

        let naive: Vec<_> = BlockLocator::default()
            .locate(&original)
            .map(|b| b.end)
            .collect();
        let first_name = artifact_file_name("plan", naive[0], "puml");
        let first_snippet = renderer().render("plan", Path::new(&first_name));

        let written = sink.written.borrow();
        assert_eq!(written[0].0, first_name);
        assert_eq!(
            written[1].0,
            artifact_file_name("plan", naive[1] + first_snippet.len(), "puml")
        );
        assert_eq!(outcome.block_count(), 2);
    }

    #[test]
    fn test_matches_rescan_algorithm() {
        let documents = [
            BLOCK_A.to_owned(),
            format!("intro\n{BLOCK_A}\n{BLOCK_B}\n"),
            format!("# T\n\n{BLOCK_B}\n\nmid\n\n{BLOCK_A}\n\nmid 2\n{BLOCK_A}\ntrailer"),
            "no diagrams at all\n".to_owned(),
        ];
        for original in &documents {
            let (rewriter, sink) = recording_rewriter();
            let doc = Document::new("docs/Road Map.md", "docs");

            let outcome = rewriter.rewrite(&doc, original).unwrap();
            let (expected_text, expected_names) = rescan_rewrite(&doc, original);

            assert_eq!(outcome.text, expected_text);
            let names: Vec<_> = sink.written.borrow().iter().map(|(n, _)| n.clone()).collect();
            assert_eq!(names, expected_names);
        }
    }

    #[test]
    fn test_order_and_surrounding_text_preserved() {
        let (rewriter, _sink) = recording_rewriter();
        let original = format!("head\n{BLOCK_A}\nbetween\n{BLOCK_B}\ntail\n");
        let doc = Document::new("doc.md", "");

        let outcome = rewriter.rewrite(&doc, &original).unwrap();
        let text = &outcome.text;

        let a = text.find(BLOCK_A).unwrap();
        let b = text.find(BLOCK_B).unwrap();
        assert!(text.starts_with("head\n"));
        assert!(a < b);
        assert!(text[a + BLOCK_A.len()..].starts_with("\n\n**Rendered Diagram:**"));
        assert!(text[b + BLOCK_B.len()..].starts_with("\n\n**Rendered Diagram:**"));
        assert!(text[..b].ends_with("\nbetween\n"));
        assert!(text.ends_with("\n\ntail\n"));
    }

    #[test]
    fn test_artifact_names_distinct() {
        let (rewriter, sink) = recording_rewriter();
        let original = format!("{BLOCK_A}\n{BLOCK_A}\n{BLOCK_A}\n");
        let doc = Document::new("same.md", "");

        rewriter.rewrite(&doc, &original).unwrap();

        let written = sink.written.borrow();
        let names: HashSet<_> = written.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_no_blocks_returns_original() {
        let (rewriter, sink) = recording_rewriter();
        let original = "# Plain\n\n```rust\nfn main() {}\n```\n";

        let outcome = rewriter.rewrite(&Document::new("plain.md", ""), original).unwrap();

        assert_eq!(outcome.text, original);
        assert_eq!(outcome.block_count(), 0);
        assert!(sink.written.borrow().is_empty());
    }

    #[test]
    fn test_crlf_document_linked() {
        let (rewriter, sink) = recording_rewriter();
        let original = "# Notes\r\n\r\n```puml\r\n@startmindmap\r\n* A\r\n@endmindmap\r\n```\r\n";
        let doc = Document::new("notes.md", "");

        let outcome = rewriter.rewrite(&doc, original).unwrap();

        let end = original.len() - 2;
        let name = format!("notes_{end}.puml");
        let written = sink.written.borrow();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, name);
        assert_eq!(written[0].1, "@startmindmap\r\n* A\r\n@endmindmap\r\n");

        let snippet = renderer().render("notes", Path::new(&name));
        assert_eq!(
            outcome.text,
            format!("{}{snippet}\r\n", &original[..end])
        );
    }

    #[test]
    fn test_artifact_failure_aborts() {
        let rewriter = DocumentRewriter::new(BlockLocator::default(), renderer()).with_sink(
            Box::new(FailingSink {
                fail_at: 2,
                calls: RefCell::new(0),
            }),
        );
        let original = format!("{BLOCK_A}\n{BLOCK_B}\n");

        let err = rewriter
            .rewrite(&Document::new("doc.md", ""), &original)
            .unwrap_err();
        assert!(err.to_string().contains("doc_"));
    }

    #[test]
    fn test_process_writes_artifact_and_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        let original = format!("Intro\n{BLOCK_A}\n");
        fs::write(&path, &original).unwrap();

        let rewriter = DocumentRewriter::new(BlockLocator::default(), renderer());
        let report = rewriter.process(&Document::new(&path, "")).unwrap();

        assert!(report.written_back);
        assert_eq!(report.artifacts.len(), 1);
        let artifact = &report.artifacts[0];
        assert_eq!(artifact.parent(), Some(dir.path()));
        assert_eq!(
            fs::read_to_string(artifact).unwrap(),
            "@startmindmap\n* A\n@endmindmap\n"
        );

        let rewritten = fs::read_to_string(&path).unwrap();
        let name = artifact.file_name().unwrap().to_string_lossy();
        assert!(rewritten.starts_with(&format!("Intro\n{BLOCK_A}\n\n**Rendered Diagram:**")));
        assert!(rewritten.contains("alice/docs/main/"));
        assert!(rewritten.contains(&*name));
    }

    #[test]
    fn test_process_without_blocks_skips_write_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.md");
        fs::write(&path, "nothing here\n").unwrap();

        let rewriter = DocumentRewriter::new(BlockLocator::default(), renderer());
        let report = rewriter.process(&Document::new(&path, "")).unwrap();

        assert!(!report.written_back);
        assert!(report.artifacts.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "nothing here\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_process_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        let original = format!("{BLOCK_A}\n");
        fs::write(&path, &original).unwrap();

        let rewriter = DocumentRewriter::new(BlockLocator::default(), renderer()).dry_run(true);
        let report = rewriter.process(&Document::new(&path, "")).unwrap();

        assert!(!report.written_back);
        assert_eq!(report.artifacts.len(), 1);
        assert!(!report.artifacts[0].exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_process_missing_document() {
        let rewriter = DocumentRewriter::new(BlockLocator::default(), renderer());
        let err = rewriter
            .process(&Document::new("/nonexistent/notes.md", ""))
            .unwrap_err();
        assert!(matches!(err, RewriteError::Read { .. }));
    }

    #[test]
    fn test_custom_extension() {
        let sink = RecordingSink::default();
        let rewriter = DocumentRewriter::new(BlockLocator::default(), renderer())
            .artifact_extension("iuml")
            .with_sink(Box::new(sink.clone()));

        let outcome = rewriter
            .rewrite(&Document::new("a.md", ""), BLOCK_A)
            .unwrap();

        assert_eq!(sink.written.borrow()[0].0, format!("a_{}.iuml", BLOCK_A.len()));
        assert!(outcome.text.contains(&format!("a_{}.iuml)", BLOCK_A.len())));
    }
}
