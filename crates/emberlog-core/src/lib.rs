//! Emberlog core
//!
//! Data model and storage abstraction for a personal project/log tracker:
//! projects own timestamped markdown log entries with tags. This crate also
//! provides the reference index that backs `[[wiki-link]]` autocomplete and
//! resolution in the editor layer.

pub mod index;
pub mod model;
pub mod store;

pub use index::{LinkSuggestion, ReferenceIndex, SuggestionKind, MAX_SUGGESTIONS};
pub use model::{AppData, LogEntry, Project, ProjectStatus, PROJECT_COLORS};
pub use store::{
    ContentStore, LogPatch, MemoryStore, NewProject, ProjectPatch, StoreError, StoreResult,
};

// The parser crate owns the link-token types; re-export the ones core
// implements or consumers commonly need alongside the index.
pub use emberlog_parser::{LinkTarget, ResolveAnchor};
