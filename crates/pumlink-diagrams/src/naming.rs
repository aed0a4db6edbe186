//! Artifact and diagram naming.

use std::path::Path;

/// Derive the diagram identifier from a document path.
///
/// Uses the file stem, lower-cased, with spaces replaced by `_`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use pumlink_diagrams::diagram_id;
///
/// assert_eq!(diagram_id(Path::new("docs/Release Notes.md")), "release_notes");
/// ```
#[must_use]
pub fn diagram_id(document: &Path) -> String {
    document
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase().replace(' ', "_"))
        .unwrap_or_default()
}

/// Build the artifact file name for a block.
///
/// `offset` is the block's end offset in the partially rewritten document.
/// Offsets strictly increase within one pass, so names never collide within
/// a document. Re-running over the same document reuses (and overwrites)
/// names.
#[must_use]
pub fn artifact_file_name(diagram_id: &str, offset: usize, extension: &str) -> String {
    format!("{diagram_id}_{offset}.{extension}")
}

/// Convert a diagram identifier to a human-readable title.
///
/// Underscores become spaces. Each run of letters starts upper-case and
/// continues lower-case; any non-letter starts a new run, so `v2x` becomes `V2X`.
#[must_use]
pub fn title_case(diagram_id: &str) -> String {
    let mut result = String::with_capacity(diagram_id.len());
    let mut in_word = false;
    for ch in diagram_id.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if in_word {
                result.extend(ch.to_lowercase());
            } else {
                result.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            result.push(ch);
            in_word = false;
        }
    }
    result
}
