//! Diagram block discovery.
//!
//! A diagram block is a fenced code block whose info string is one of the
//! configured fences and whose body runs from `@start<kind>` to the first
//! following `@end<kind>` line directly before the closing fence:
//!
//! ````text
//! ```puml
//! @startmindmap
//! * Root
//! @endmindmap
//! ```
//! ````
//!
//! Matching uses the `regex` crate, which runs in linear time, so adversarial
//! input cannot trigger catastrophic backtracking. The body is matched lazily:
//! a block never extends past the first closing marker.
//!
//! Delimiter lines may end in `\n` or `\r\n`. The opening fence line and its
//! terminator are never part of the payload; the payload keeps the original
//! bytes, line endings included.

use std::sync::LazyLock;

use regex::Regex;

use crate::consts::{DEFAULT_FENCE, DEFAULT_KIND};

static DEFAULT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&build_pattern(&[DEFAULT_FENCE], &[DEFAULT_KIND])).unwrap()
});

/// Error building a block pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// No fences or no kinds were given.
    #[error("block pattern needs at least one {0}")]
    Empty(&'static str),
    /// The assembled pattern was rejected by the regex engine.
    #[error("invalid block pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// A diagram block located in a document's original text.
///
/// Offsets are byte offsets into the text passed to [`BlockLocator::locate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Offset of the opening fence.
    pub start: usize,
    /// Offset just past the closing fence.
    pub end: usize,
    /// Matched text including both fence lines.
    pub raw: &'a str,
    /// Text between the opening fence line and the closing fence line.
    pub payload: &'a str,
}

/// Finds diagram blocks in markdown text.
#[derive(Debug, Clone)]
pub struct BlockLocator {
    pattern: Regex,
}

impl Default for BlockLocator {
    /// Locator for ```` ```puml ```` fences holding `@startmindmap` diagrams.
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl BlockLocator {
    /// Create a locator for the given fence info strings and diagram kinds.
    ///
    /// Both lists are matched literally and combined as alternations.
    ///
    /// # Example
    ///
    /// ```
    /// use pumlink_diagrams::BlockLocator;
    ///
    /// let locator = BlockLocator::new(&["puml", "plantuml"], &["mindmap", "uml"]).unwrap();
    /// let text = "```plantuml\n@startuml\nA -> B\n@enduml\n```\n";
    /// assert_eq!(locator.locate(text).count(), 1);
    /// ```
    pub fn new<F, K>(fences: &[F], kinds: &[K]) -> Result<Self, PatternError>
    where
        F: AsRef<str>,
        K: AsRef<str>,
    {
        if fences.is_empty() {
            return Err(PatternError::Empty("fence"));
        }
        if kinds.is_empty() {
            return Err(PatternError::Empty("diagram kind"));
        }
        let pattern = Regex::new(&build_pattern(fences, kinds))?;
        Ok(Self { pattern })
    }

    /// Iterate over blocks in ascending offset order.
    ///
    /// The iterator is lazy; call `locate` again to restart. Text without
    /// blocks yields nothing.
    pub fn locate<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Block<'a>> + 'a {
        self.pattern.captures_iter(text).filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.name("body")?;
            Some(Block {
                start: whole.start(),
                end: whole.end(),
                raw: whole.as_str(),
                payload: body.as_str(),
            })
        })
    }
}

/// Assemble the block regex from literal fences and kinds.
fn build_pattern<F: AsRef<str>, K: AsRef<str>>(fences: &[F], kinds: &[K]) -> String {
    let fences = alternation(fences);
    let kinds = alternation(kinds);
    format!("(?s)```(?:{fences})\r?\n(?P<body>@start(?:{kinds}).*?@end(?:{kinds})\r?\n)```")
}

fn alternation<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| regex::escape(s.as_ref()))
        .collect::<Vec<_>>()
        .join("|")
}
