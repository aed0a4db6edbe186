//! Defaults shared by the locator, namer and reference renderer.

/// Fence info string that opens a diagram block.
pub const DEFAULT_FENCE: &str = "puml";

/// Diagram kind between `@start` / `@end`.
pub const DEFAULT_KIND: &str = "mindmap";

/// Extension of generated artifact files.
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "puml";

/// PlantUML proxy that renders a diagram from a remote source URL.
pub const DEFAULT_PROXY_URL: &str = "https://www.plantuml.com/plantuml/proxy";

/// Host serving raw repository files.
pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";

/// Branch embedded in raw-content URLs.
pub const DEFAULT_BRANCH: &str = "main";

/// Caption line preceding the rendered image.
pub(crate) const CAPTION: &str = "**Rendered Diagram:**";
