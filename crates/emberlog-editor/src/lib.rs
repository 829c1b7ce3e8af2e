//! Markdown log editor
//!
//! State machines behind the editing surface: the editable document and its
//! selection, `[[` autocomplete, paste-to-embed image handling, and the
//! debounced autosave cycle. Everything except the timer driver is
//! synchronous and host-agnostic; the session type composes the pieces and
//! speaks to the host in events.

pub mod autocomplete;
pub mod autosave;
pub mod document;
pub mod driver;
pub mod images;
pub mod session;

pub use autocomplete::{
    ActiveCompletion, AutocompleteState, CommitEdit, KeyOutcome, SuggestionKey,
};
pub use autosave::{AutosaveConfig, AutosaveController, SaveRequest, SaveState, TimerEffect};
pub use document::{splice_text, Document, Selection};
pub use driver::{EditorTick, TimerDriver};
pub use images::{from_display, to_display, Clipboard, ClipboardItem, ImageCodec, IMAGE_STAND_IN};
pub use session::{EditorSession, KeyResponse, SessionEvent};
