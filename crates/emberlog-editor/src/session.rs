//! Editor session
//!
//! One session per open entry. The session owns the document, the
//! autocomplete state, the image codec and the autosave controller, and
//! exposes a synchronous host interface: the host feeds in edits, key
//! presses, pastes and timer fires; the session answers with
//! [`SessionEvent`]s the host executes (update the text surface, schedule a
//! timer, persist, navigate).
//!
//! The host's text surface shows the display form of the body (image
//! payloads replaced by a stand-in glyph); every offset crossing this
//! boundary is a byte offset into that display text. The canonical body is
//! recovered on each edit by matching stand-ins back to payloads by id.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use emberlog_core::index::ReferenceIndex;
use emberlog_core::model::LogEntry;
use emberlog_core::{LinkTarget, ResolveAnchor};

use crate::autocomplete::{AutocompleteState, KeyOutcome, SuggestionKey};
use crate::autosave::{AutosaveConfig, AutosaveController, SaveRequest, SaveState, TimerEffect};
use crate::document::{splice_text, Document, Selection};
use crate::images::{from_display, to_display, Clipboard, ImageCodec};

/// Instructions the session hands back to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session changed the text itself (suggestion commit, image paste);
    /// the host must update its text surface and caret.
    ContentChanged {
        display: String,
        selection: Selection,
    },
    /// Persist the captured document.
    SaveRequested(SaveRequest),
    /// Schedule or cancel a debounce timer.
    Timer(TimerEffect),
    /// A resolved wiki link was activated.
    NavigateToProject { project_id: Uuid },
    NavigateToLog { project_id: Uuid, log_id: Uuid },
}

/// Result of a key press routed through the session.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyResponse {
    /// Whether the session consumed the key. When false the host applies
    /// its default behavior (caret movement, newline insertion).
    pub consumed: bool,
    pub events: Vec<SessionEvent>,
}

impl KeyResponse {
    fn ignored() -> Self {
        Self {
            consumed: false,
            events: Vec::new(),
        }
    }

    fn consumed(events: Vec<SessionEvent>) -> Self {
        Self {
            consumed: true,
            events,
        }
    }
}

/// The active editing session.
#[derive(Debug)]
pub struct EditorSession {
    entry_id: Option<Uuid>,
    doc: Document,
    autocomplete: AutocompleteState,
    codec: ImageCodec,
    autosave: AutosaveController,
}

impl EditorSession {
    pub fn new(config: AutosaveConfig) -> Self {
        Self {
            entry_id: None,
            doc: Document::new(),
            autocomplete: AutocompleteState::new(),
            codec: ImageCodec::new(),
            autosave: AutosaveController::new(config),
        }
    }

    /// Load an entry (or a fresh draft for `None`).
    ///
    /// Cancels any pending debounce from the previous entry and consumes the
    /// autosave load suppression, so populating the editor with the loaded
    /// values does not itself count as an edit.
    pub fn open_entry(&mut self, entry: Option<&LogEntry>) -> Vec<SessionEvent> {
        self.entry_id = entry.map(|e| e.id);
        self.doc = Document::from_entry(entry);
        self.autocomplete.dismiss();

        let mut events = Vec::new();
        if let Some(cancel) = self
            .autosave
            .reset_for_load(entry.map(|e| e.updated_at))
        {
            events.push(SessionEvent::Timer(cancel));
        }
        // The load itself lands in the document exactly once; swallow it.
        let suppressed = self.autosave.document_edited();
        debug_assert!(suppressed.is_empty());
        events
    }

    pub fn entry_id(&self) -> Option<Uuid> {
        self.entry_id
    }

    /// Record the id of a newly created entry after its first save.
    pub fn bind_entry_id(&mut self, id: Uuid) {
        self.entry_id = Some(id);
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn autocomplete(&self) -> &AutocompleteState {
        &self.autocomplete
    }

    /// The text the host's surface should show.
    pub fn display_text(&self) -> String {
        to_display(self.doc.body())
    }

    /// Apply an edit the host's text surface already performed.
    ///
    /// `display` is the full new display text; the canonical body is
    /// recovered by matching image stand-ins back to their payloads.
    pub fn apply_display_edit(
        &mut self,
        display: &str,
        selection: Selection,
        index: &ReferenceIndex<'_>,
    ) -> Vec<SessionEvent> {
        let canonical = from_display(display, self.doc.body());
        self.doc.set_body(canonical, selection);
        self.autocomplete.rescan(display, selection.start, index);
        self.edit_effects()
    }

    /// Caret or selection moved without a text change. Autocomplete follows
    /// the caret; no save is scheduled.
    pub fn selection_changed(&mut self, selection: Selection, index: &ReferenceIndex<'_>) {
        self.doc.set_selection(selection);
        let display = self.display_text();
        self.autocomplete.rescan(&display, selection.start, index);
    }

    /// Title edits participate in autosave like body edits.
    pub fn set_title(&mut self, title: String) -> Vec<SessionEvent> {
        self.doc.title = title;
        self.edit_effects()
    }

    pub fn add_tag(&mut self, tag: &str) -> Vec<SessionEvent> {
        if self.doc.add_tag(tag) {
            self.edit_effects()
        } else {
            Vec::new()
        }
    }

    pub fn remove_tag(&mut self, tag: &str) -> Vec<SessionEvent> {
        if self.doc.remove_tag(tag) {
            self.edit_effects()
        } else {
            Vec::new()
        }
    }

    /// Handle a paste. An image on the clipboard becomes an embedded
    /// placeholder at the selection; otherwise the paste is not consumed and
    /// the host inserts the clipboard text itself.
    pub fn paste(
        &mut self,
        clipboard: &Clipboard,
        index: &ReferenceIndex<'_>,
    ) -> Option<Vec<SessionEvent>> {
        let token = self.codec.encode_paste(clipboard)?;

        // The canonical body gets the full-payload token; the display text
        // gets its stand-in form. Both splices use the same display-space
        // selection, so the caret lands right after the stand-in.
        let display = self.display_text();
        let selection = self.doc.selection();
        let (with_payload, _) = splice_text(&display, selection, &token);
        let canonical = from_display(&with_payload, self.doc.body());
        let (shown, caret) = splice_text(&display, selection, &to_display(&token));

        self.doc.set_body(canonical, Selection::cursor(caret));
        self.autocomplete.rescan(&shown, caret, index);

        let mut events = vec![SessionEvent::ContentChanged {
            display: shown,
            selection: Selection::cursor(caret),
        }];
        events.extend(self.edit_effects());
        Some(events)
    }

    /// Route a key press. Suggestion-list keys are intercepted while the
    /// list is visible; everything else is left to the host.
    pub fn handle_suggestion_key(
        &mut self,
        key: SuggestionKey,
        index: &ReferenceIndex<'_>,
    ) -> KeyResponse {
        match self.autocomplete.handle_key(key, self.doc.caret()) {
            KeyOutcome::Ignored => KeyResponse::ignored(),
            KeyOutcome::Consumed => KeyResponse::consumed(Vec::new()),
            KeyOutcome::Commit(edit) => {
                let display = self.display_text();
                let (new_display, _) =
                    splice_text(&display, Selection::new(edit.start, edit.end), &edit.insert);
                let selection = Selection::cursor(edit.caret_after);

                let canonical = from_display(&new_display, self.doc.body());
                self.doc.set_body(canonical, selection);
                self.autocomplete.rescan(&new_display, selection.start, index);

                let mut events = vec![SessionEvent::ContentChanged {
                    display: new_display,
                    selection,
                }];
                events.extend(self.edit_effects());
                KeyResponse::consumed(events)
            }
        }
    }

    /// Commit the suggestion at a list position (pointer click).
    pub fn click_suggestion(
        &mut self,
        position: usize,
        index: &ReferenceIndex<'_>,
    ) -> Vec<SessionEvent> {
        let Some(edit) = self.autocomplete.commit_at(position, self.doc.caret()) else {
            return Vec::new();
        };
        let display = self.display_text();
        let (new_display, _) =
            splice_text(&display, Selection::new(edit.start, edit.end), &edit.insert);
        let selection = Selection::cursor(edit.caret_after);

        let canonical = from_display(&new_display, self.doc.body());
        self.doc.set_body(canonical, selection);
        self.autocomplete.rescan(&new_display, selection.start, index);

        let mut events = vec![SessionEvent::ContentChanged {
            display: new_display,
            selection,
        }];
        events.extend(self.edit_effects());
        events
    }

    /// A debounce timer fired.
    pub fn timer_fired(&mut self, generation: u64, now: DateTime<Utc>) -> Vec<SessionEvent> {
        match self.autosave.timer_fired(generation, &self.doc, now) {
            Some(request) => vec![SessionEvent::SaveRequested(request)],
            None => Vec::new(),
        }
    }

    /// Explicit save action (keyboard shortcut, button).
    pub fn manual_save(&mut self, now: DateTime<Utc>) -> Vec<SessionEvent> {
        match self.autosave.manual_save(&self.doc, now) {
            Some(request) => vec![SessionEvent::SaveRequested(request)],
            None => Vec::new(),
        }
    }

    /// Flush before the session goes away.
    pub fn close(&mut self, now: DateTime<Utc>) -> Vec<SessionEvent> {
        let (request, cancel) = self.autosave.flush_on_close(&self.doc, now);
        let mut events = Vec::new();
        if let Some(cancel) = cancel {
            events.push(SessionEvent::Timer(cancel));
        }
        if let Some(request) = request {
            events.push(SessionEvent::SaveRequested(request));
        }
        events
    }

    pub fn save_completed(&mut self, at: DateTime<Utc>) {
        self.autosave.save_completed(at);
    }

    pub fn save_failed(&mut self, error: &dyn std::error::Error) {
        self.autosave.save_failed(error);
    }

    pub fn save_state(&self, now: DateTime<Utc>) -> SaveState {
        self.autosave.state(now)
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.autosave.last_saved_at()
    }

    /// A wiki link in the preview was activated. Resolved anchors become
    /// navigation events; broken links do nothing.
    pub fn link_clicked<R: ResolveAnchor>(
        &self,
        anchor: &str,
        resolver: &R,
    ) -> Option<SessionEvent> {
        match resolver.resolve(anchor) {
            LinkTarget::Project { project_id } => {
                Some(SessionEvent::NavigateToProject { project_id })
            }
            LinkTarget::Log { project_id, log_id } => {
                Some(SessionEvent::NavigateToLog { project_id, log_id })
            }
            LinkTarget::Unresolved => None,
        }
    }

    fn edit_effects(&mut self) -> Vec<SessionEvent> {
        self.autosave
            .document_edited()
            .into_iter()
            .map(SessionEvent::Timer)
            .collect()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(AutosaveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{ClipboardItem, IMAGE_STAND_IN};
    use emberlog_core::model::{Project, ProjectStatus};
    use emberlog_parser::images::IMAGE_REGEX;

    fn fixtures() -> (Vec<Project>, Vec<LogEntry>) {
        let projects = vec![
            Project::new("Alpha", "", ProjectStatus::Active, "#00ff9f"),
            Project::new("Beta", "", ProjectStatus::Active, "#00d4ff"),
        ];
        let logs = vec![LogEntry::new(projects[0].id, "Setup", "", vec![])];
        (projects, logs)
    }

    fn save_requests(events: &[SessionEvent]) -> Vec<&SaveRequest> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::SaveRequested(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn opening_an_entry_does_not_schedule_a_save() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let mut session = EditorSession::default();

        let events = session.open_entry(Some(&logs[0]));
        assert!(events.is_empty());
        assert!(!session.is_dirty());

        // Only a real edit arms the debounce.
        let events = session.apply_display_edit("Setup notes", Selection::cursor(11), &index);
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::Timer(TimerEffect::Arm { .. })]
        ));
        assert!(session.is_dirty());
    }

    #[test]
    fn rapid_edits_coalesce_into_one_save() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let mut session = EditorSession::default();
        session.open_entry(None);
        session.set_title("draft".to_string());

        let mut last_generation = 0;
        for (i, text) in ["a", "ab", "abc"].iter().enumerate() {
            let events = session.apply_display_edit(text, Selection::cursor(i + 1), &index);
            for event in events {
                if let SessionEvent::Timer(TimerEffect::Arm { generation, .. }) = event {
                    last_generation = generation;
                }
            }
        }

        let now = Utc::now();
        // Older generations were cancelled; if a fire slips through anyway
        // it is ignored.
        assert!(session.timer_fired(last_generation - 1, now).is_empty());

        let events = session.timer_fired(last_generation, now);
        let requests = save_requests(&events);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].content, "abc");
        assert_eq!(requests[0].title, "draft");
    }

    #[test]
    fn suggestion_commit_rewrites_text_and_schedules_save() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let mut session = EditorSession::default();
        session.open_entry(None);

        session.apply_display_edit("see [[Al", Selection::cursor(8), &index);
        assert!(session.autocomplete().is_visible());

        let response = session.handle_suggestion_key(SuggestionKey::Enter, &index);
        assert!(response.consumed);
        let Some(SessionEvent::ContentChanged { display, selection }) = response.events.first()
        else {
            panic!("expected content change, got {:?}", response.events);
        };
        assert_eq!(display, "see [[Alpha]]");
        assert_eq!(selection.start, "see [[Alpha]]".len());
        assert_eq!(session.document().body(), "see [[Alpha]]");
        assert!(!session.autocomplete().is_visible());
    }

    #[test]
    fn image_paste_embeds_and_shows_stand_in() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let mut session = EditorSession::default();
        session.open_entry(None);
        session.apply_display_edit("before after", Selection::cursor(7), &index);

        let clipboard = Clipboard {
            items: vec![ClipboardItem {
                mime: "image/png".to_string(),
                data: vec![1, 2, 3],
            }],
        };
        let events = session.paste(&clipboard, &index).expect("image consumed");

        let Some(SessionEvent::ContentChanged { display, .. }) = events.first() else {
            panic!("expected content change");
        };
        assert!(display.contains(IMAGE_STAND_IN));
        assert!(!display.contains("base64"));

        // Canonical body keeps the full payload.
        let body = session.document().body();
        let cap = IMAGE_REGEX.captures(body).expect("embedded token");
        assert!(cap[2].starts_with("data:image/png;base64,"));
    }

    #[test]
    fn text_paste_is_left_to_the_host() {
        let mut session = EditorSession::default();
        session.open_entry(None);

        let clipboard = Clipboard {
            items: vec![ClipboardItem {
                mime: "text/plain".to_string(),
                data: b"hello".to_vec(),
            }],
        };
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        assert!(session.paste(&clipboard, &index).is_none());
    }

    #[test]
    fn editing_around_an_image_preserves_the_payload() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let mut session = EditorSession::default();
        session.open_entry(None);
        session.apply_display_edit("x", Selection::cursor(1), &index);

        let clipboard = Clipboard {
            items: vec![ClipboardItem {
                mime: "image/png".to_string(),
                data: vec![42],
            }],
        };
        session.paste(&clipboard, &index).expect("paste");
        let payload_body = session.document().body().to_string();

        // Type more text after the placeholder in the display form.
        let display = session.display_text();
        let edited = format!("{display}tail");
        session.apply_display_edit(&edited, Selection::cursor(edited.len()), &index);

        let body = session.document().body();
        assert!(body.ends_with("tail"));
        let cap = IMAGE_REGEX.captures(body).expect("token survives");
        let original = IMAGE_REGEX.captures(&payload_body).expect("original token");
        assert_eq!(&cap[2], &original[2]);
    }

    #[test]
    fn mid_glyph_caret_from_the_host_is_tolerated() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let mut session = EditorSession::default();
        session.open_entry(None);

        // A host counting UTF-16 units can report an offset inside the
        // 4-byte image stand-in; the edit must land, not panic.
        let text = format!("a{IMAGE_STAND_IN}b");
        let events = session.apply_display_edit(&text, Selection::cursor(2), &index);
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::Timer(TimerEffect::Arm { .. })]
        ));
        assert_eq!(session.document().body(), text);
    }

    #[test]
    fn switching_entries_cancels_pending_save() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let mut session = EditorSession::default();
        session.open_entry(None);
        session.apply_display_edit("unsaved", Selection::cursor(7), &index);

        let events = session.open_entry(Some(&logs[0]));
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::Timer(TimerEffect::Cancel { .. })]
        ));
        assert_eq!(session.entry_id(), Some(logs[0].id));
        assert_eq!(session.document().body(), logs[0].content);
    }

    #[test]
    fn close_flushes_dirty_content() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let mut session = EditorSession::default();
        session.open_entry(None);
        session.set_title("keep me".to_string());
        session.apply_display_edit("body", Selection::cursor(4), &index);

        let events = session.close(Utc::now());
        let requests = save_requests(&events);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].title, "keep me");
    }

    #[test]
    fn link_clicks_navigate_only_when_resolved() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let session = EditorSession::default();

        assert_eq!(
            session.link_clicked("Alpha", &index),
            Some(SessionEvent::NavigateToProject {
                project_id: projects[0].id
            })
        );
        assert_eq!(
            session.link_clicked("Alpha/Setup", &index),
            Some(SessionEvent::NavigateToLog {
                project_id: projects[0].id,
                log_id: logs[0].id
            })
        );
        assert_eq!(session.link_clicked("Nope", &index), None);
    }

    #[test]
    fn empty_draft_never_saves() {
        let (projects, logs) = fixtures();
        let index = ReferenceIndex::new(&projects, &logs);
        let mut session = EditorSession::default();
        session.open_entry(None);

        session.apply_display_edit("   ", Selection::cursor(3), &index);
        assert!(session.manual_save(Utc::now()).is_empty());
        assert!(save_requests(&session.close(Utc::now())).is_empty());
    }
}
