//! Default command: link every PlantUML block in the selected documents.

use std::path::{Path, PathBuf};

use clap::Args;
use pumlink_config::{CliSettings, Config};
use pumlink_diagrams::{
    BlockLocator, Document, DocumentReport, DocumentRewriter, HostIdentity, ReferenceRenderer,
};
use pumlink_fs::{Scanner, Target};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for linking diagrams.
#[derive(Args)]
pub(crate) struct LinkArgs {
    /// Repository owner on the hosting service (overrides config).
    #[arg(long, visible_alias = "owner", env = "PUMLINK_OWNER")]
    username: Option<String>,

    /// Repository name (overrides config).
    #[arg(long, env = "PUMLINK_REPO")]
    repo: Option<String>,

    /// Branch the artifacts are served from (default: main).
    #[arg(long)]
    branch: Option<String>,

    /// Single markdown file to process. Takes priority over --dir.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Directory to process recursively (default: current directory only).
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Repository root used for artifact URLs (overrides config).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover pumlink.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report what would change without writing any file.
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

/// Totals of a batch run.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BatchSummary {
    pub(crate) documents: usize,
    pub(crate) failed: usize,
    pub(crate) artifacts: usize,
}

impl LinkArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            owner: self.username,
            repo: self.repo,
            branch: self.branch,
            root: self.root,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let identity = config.require_repository()?;

        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }

        let locator = BlockLocator::new(
            config.blocks.fences.as_slice(),
            config.blocks.kinds.as_slice(),
        )?;
        let renderer = ReferenceRenderer::new(
            HostIdentity::new(identity.owner, identity.name).branch(identity.branch),
        )
        .proxy_url(config.render.proxy_url.as_str())
        .raw_base_url(config.render.raw_base_url.as_str())
        .cache(config.render.cache);
        let rewriter = DocumentRewriter::new(locator, renderer)
            .artifact_extension(config.blocks.artifact_extension.as_str())
            .dry_run(self.dry_run);

        let scanner = Scanner::new(config.documents.extensions.iter().map(String::as_str));
        let documents = scanner.resolve(&Target::from_args(self.file, self.dir))?;

        if self.dry_run {
            output.warning("Dry run: no files will be written");
        }
        if documents.is_empty() {
            output.warning("No markdown documents found");
        }

        let root = &config.repository_resolved.root;
        let summary = run_batch(&rewriter, &documents, root, self.dry_run, output);

        output.info("");
        output.highlight(&format!(
            "{} document(s), {} diagram(s), {} failed",
            summary.documents, summary.artifacts, summary.failed
        ));

        if summary.failed > 0 {
            return Err(CliError::Batch {
                failed: summary.failed,
                total: summary.documents,
            });
        }

        output.success("Done!");
        Ok(())
    }
}

/// Process every document, continuing past failures.
pub(crate) fn run_batch(
    rewriter: &DocumentRewriter,
    documents: &[PathBuf],
    root: &Path,
    dry_run: bool,
    output: &Output,
) -> BatchSummary {
    let mut summary = BatchSummary {
        documents: documents.len(),
        ..BatchSummary::default()
    };

    for path in documents {
        match process_one(rewriter, path, root) {
            Ok(report) => {
                for artifact in &report.artifacts {
                    output.info(&format!(
                        "Added rendering link for PlantUML block in {}",
                        report.path.display()
                    ));
                    if dry_run {
                        output.info(&format!("Would create PlantUML file: {}", artifact.display()));
                    } else {
                        output.info(&format!("Created PlantUML file: {}", artifact.display()));
                    }
                }
                summary.artifacts += report.artifacts.len();
            }
            Err(err) => {
                output.error(&format!("{}: {err}", path.display()));
                summary.failed += 1;
            }
        }
    }

    summary
}

fn process_one(
    rewriter: &DocumentRewriter,
    path: &Path,
    root: &Path,
) -> Result<DocumentReport, CliError> {
    let document = Document::in_repository(path, root)?;
    Ok(rewriter.process(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const DIAGRAM_DOC: &str = "# Notes\n\n```puml\n@startmindmap\n* Root\n** Child\n@endmindmap\n```\n";

    fn rewriter(dry_run: bool) -> DocumentRewriter {
        DocumentRewriter::new(
            BlockLocator::default(),
            ReferenceRenderer::new(HostIdentity::new("alice", "docs")),
        )
        .dry_run(dry_run)
    }

    fn puml_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".puml"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_batch_links_only_documents_with_blocks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let notes = temp_dir.path().join("notes.md");
        let plain = temp_dir.path().join("plain.md");
        fs::write(&notes, DIAGRAM_DOC).unwrap();
        fs::write(&plain, "# Plain\n\nNo diagrams here.\n").unwrap();

        let summary = run_batch(
            &rewriter(false),
            &[notes.clone(), plain.clone()],
            temp_dir.path(),
            false,
            &Output::new(),
        );

        assert_eq!(
            summary,
            BatchSummary {
                documents: 2,
                failed: 0,
                artifacts: 1,
            }
        );
        assert_eq!(puml_files(temp_dir.path()).len(), 1);
        assert_eq!(
            fs::read_to_string(&plain).unwrap(),
            "# Plain\n\nNo diagrams here.\n"
        );
        let rewritten = fs::read_to_string(&notes).unwrap();
        assert!(rewritten.contains("**Rendered Diagram:**"));
        assert!(rewritten.contains("![Notes]("));
    }

    #[test]
    fn test_batch_artifact_url_is_relative_to_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guide = temp_dir.path().join("docs").join("guide");
        fs::create_dir_all(&guide).unwrap();
        let setup = guide.join("setup.md");
        fs::write(&setup, DIAGRAM_DOC).unwrap();

        run_batch(
            &rewriter(false),
            std::slice::from_ref(&setup),
            temp_dir.path(),
            false,
            &Output::new(),
        );

        let names = puml_files(&guide);
        assert_eq!(names.len(), 1);
        let rewritten = fs::read_to_string(&setup).unwrap();
        assert!(rewritten.contains(&format!("/alice/docs/main/docs/guide/{}", names[0])));
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.md");
        let notes = temp_dir.path().join("notes.md");
        fs::write(&notes, DIAGRAM_DOC).unwrap();

        let summary = run_batch(
            &rewriter(false),
            &[missing, notes],
            temp_dir.path(),
            false,
            &Output::new(),
        );

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.artifacts, 1);
    }

    #[test]
    fn test_batch_dry_run_touches_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let notes = temp_dir.path().join("notes.md");
        fs::write(&notes, DIAGRAM_DOC).unwrap();

        let summary = run_batch(
            &rewriter(true),
            std::slice::from_ref(&notes),
            temp_dir.path(),
            true,
            &Output::new(),
        );

        assert_eq!(summary.artifacts, 1);
        assert!(puml_files(temp_dir.path()).is_empty());
        assert_eq!(fs::read_to_string(&notes).unwrap(), DIAGRAM_DOC);
    }
}
