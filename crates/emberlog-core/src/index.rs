//! Reference index
//!
//! Derives, on demand, the set of linkable entities (every project, every
//! log entry qualified by its project) and answers two queries:
//! - substring search for autocomplete suggestions (case-insensitive,
//!   capped at [`MAX_SUGGESTIONS`]),
//! - exact anchor resolution (case-sensitive) for rendering and navigation.
//!
//! The index borrows a snapshot and performs pure reads; it is rebuilt for
//! each input/render pass and never cached beyond one.

use serde::Serialize;
use uuid::Uuid;

use emberlog_parser::{split_anchor, LinkTarget, ResolveAnchor};

use crate::model::{LogEntry, Project};

/// Maximum number of autocomplete suggestions returned by a search.
pub const MAX_SUGGESTIONS: usize = 10;

/// What a suggestion points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Project,
    Log,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSuggestion {
    pub kind: SuggestionKind,
    /// Anchor text the suggestion commits: project name, or
    /// `Project name/Log title` for log entries.
    pub anchor: String,
    pub project_id: Uuid,
    pub log_id: Option<Uuid>,
    /// Owning project's color tag, for suggestion list affordances.
    pub color: String,
}

impl LinkSuggestion {
    /// The complete `[[anchor]]` token inserted on commit.
    pub fn token(&self) -> String {
        format!("[[{}]]", self.anchor)
    }
}

/// Read-only view over one snapshot of projects and logs.
pub struct ReferenceIndex<'a> {
    projects: &'a [Project],
    logs: &'a [LogEntry],
}

impl<'a> ReferenceIndex<'a> {
    pub fn new(projects: &'a [Project], logs: &'a [LogEntry]) -> Self {
        Self { projects, logs }
    }

    /// Case-insensitive substring search over project names and qualified
    /// log paths (a log also matches on its bare title).
    ///
    /// Projects are visited in store iteration order; each matching project
    /// is followed by its matching logs, and the result is truncated to
    /// [`MAX_SUGGESTIONS`].
    pub fn search(&self, query: &str) -> Vec<LinkSuggestion> {
        let query = query.to_lowercase();
        let mut suggestions = Vec::new();

        for project in self.projects {
            if project.name.to_lowercase().contains(&query) {
                suggestions.push(LinkSuggestion {
                    kind: SuggestionKind::Project,
                    anchor: project.name.clone(),
                    project_id: project.id,
                    log_id: None,
                    color: project.color.clone(),
                });
            }

            for log in self.logs.iter().filter(|l| l.project_id == project.id) {
                let path = format!("{}/{}", project.name, log.title);
                if path.to_lowercase().contains(&query)
                    || log.title.to_lowercase().contains(&query)
                {
                    suggestions.push(LinkSuggestion {
                        kind: SuggestionKind::Log,
                        anchor: path,
                        project_id: project.id,
                        log_id: Some(log.id),
                        color: project.color.clone(),
                    });
                }
            }
        }

        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }
}

impl ResolveAnchor for ReferenceIndex<'_> {
    /// Exact-match resolution: the anchor must equal a project name, or a
    /// `Project name/Log title` pair, byte for byte.
    ///
    /// Known limitation: when several logs in one project share a title,
    /// the first match in store iteration order wins; iteration order has
    /// no defined total order beyond what the store yields.
    fn resolve(&self, anchor: &str) -> LinkTarget {
        let (project_name, log_title) = split_anchor(anchor);

        let Some(project) = self.projects.iter().find(|p| p.name == project_name) else {
            return LinkTarget::Unresolved;
        };

        match log_title {
            None => LinkTarget::Project {
                project_id: project.id,
            },
            Some(title) => self
                .logs
                .iter()
                .find(|l| l.project_id == project.id && l.title == title)
                .map(|log| LinkTarget::Log {
                    project_id: project.id,
                    log_id: log.id,
                })
                .unwrap_or(LinkTarget::Unresolved),
        }
    }
}
