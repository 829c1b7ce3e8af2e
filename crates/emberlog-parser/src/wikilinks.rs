//! Wiki-link tokens
//!
//! A wiki-link is a `[[anchor]]` substring of a log entry body. The anchor
//! is either a bare project name or a `Project name/Log title` pair. Links
//! are never stored as entities; they are re-scanned and re-resolved against
//! the live project/log set on every render.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

/// Matches a complete `[[anchor]]` token. Anchors cannot contain `]`.
pub static WIKILINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("wikilink regex"));

/// A wiki-link occurrence in a body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wikilink {
    /// Anchor text between the brackets.
    pub anchor: String,
    /// Byte offset of the opening `[[` in the scanned text.
    pub offset: usize,
}

impl Wikilink {
    /// Split the anchor into its project segment and optional log-title
    /// segment. Only the first `/` separates; a title may itself contain `/`
    /// in display text but resolution treats everything after the first
    /// separator as the title, matching how anchors are produced.
    pub fn segments(&self) -> (&str, Option<&str>) {
        split_anchor(&self.anchor)
    }

    /// The full `[[anchor]]` token text.
    pub fn token(&self) -> String {
        format!("[[{}]]", self.anchor)
    }
}

/// Split an anchor string into `(project, Some(log_title))` or
/// `(project, None)` for bare project anchors.
pub fn split_anchor(anchor: &str) -> (&str, Option<&str>) {
    match anchor.split_once('/') {
        Some((project, title)) => (project, Some(title)),
        None => (anchor, None),
    }
}

/// Extract every wiki-link token from `text`, in document order.
pub fn extract_wikilinks(text: &str) -> Vec<Wikilink> {
    if !text.contains("[[") {
        return Vec::new();
    }

    WIKILINK_REGEX
        .captures_iter(text)
        .map(|cap| {
            let full = cap.get(0).expect("regex match");
            let anchor = cap.get(1).expect("anchor group").as_str();
            Wikilink {
                anchor: anchor.to_string(),
                offset: full.start(),
            }
        })
        .collect()
}

/// Outcome of resolving an anchor against the current project/log set.
///
/// Resolution is exact-match and case-sensitive; it is a pure function of
/// the snapshot it was computed from and must not be cached across renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LinkTarget {
    /// Anchor names a project.
    Project { project_id: Uuid },
    /// Anchor names a log entry within a project.
    Log { project_id: Uuid, log_id: Uuid },
    /// Anchor matches nothing; rendered as an inert broken link.
    Unresolved,
}

impl LinkTarget {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, LinkTarget::Unresolved)
    }
}

/// Anchor resolution capability.
///
/// Implemented by the core's reference index; the render pass only depends
/// on this trait.
pub trait ResolveAnchor {
    fn resolve(&self, anchor: &str) -> LinkTarget;
}

impl<T: ResolveAnchor + ?Sized> ResolveAnchor for &T {
    fn resolve(&self, anchor: &str) -> LinkTarget {
        (**self).resolve(anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_links_in_order() {
        let links = extract_wikilinks("See [[Alpha]] and [[Alpha/Setup]].");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].anchor, "Alpha");
        assert_eq!(links[0].offset, 4);
        assert_eq!(links[1].anchor, "Alpha/Setup");
        assert_eq!(links[1].token(), "[[Alpha/Setup]]");
    }

    #[test]
    fn ignores_text_without_links() {
        assert!(extract_wikilinks("no links here").is_empty());
        assert!(extract_wikilinks("[single] brackets [are] fine").is_empty());
    }

    #[test]
    fn unterminated_token_is_not_a_link() {
        assert!(extract_wikilinks("typing [[Alp").is_empty());
    }

    #[test]
    fn splits_anchor_on_first_separator() {
        assert_eq!(split_anchor("Alpha"), ("Alpha", None));
        assert_eq!(split_anchor("Alpha/Setup"), ("Alpha", Some("Setup")));
        assert_eq!(split_anchor("Alpha/a/b"), ("Alpha", Some("a/b")));
    }

    #[test]
    fn link_target_serializes_with_kind_tag() {
        let json = serde_json::to_string(&LinkTarget::Unresolved).expect("serialize");
        assert_eq!(json, r#"{"kind":"unresolved"}"#);
        assert!(!LinkTarget::Unresolved.is_resolved());
    }
}
