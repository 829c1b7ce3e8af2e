//! Autosave controller
//!
//! A small debounce state machine: edits arm (and re-arm) a delay timer so
//! rapid keystrokes coalesce into one save; a manual save bypasses the
//! timer; loading a different entry suppresses the load itself from
//! triggering a save and cancels any pending timer.
//!
//! The controller owns no clock and spawns no tasks. It emits
//! [`TimerEffect`]s tagged with a generation counter; the host (or the
//! [`crate::driver::TimerDriver`]) schedules real timers and feeds fires
//! back in. A fire whose generation no longer matches the armed one is
//! stale and ignored, which is what makes re-arming race-free.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::document::Document;

/// Tunables for the autosave cycle.
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiet period after the last edit before an automatic save.
    pub debounce: Duration,
    /// Minimum time the saving indicator stays visible.
    pub indicator_hold: Duration,
    /// Title substituted when a document is saved with an empty title.
    pub default_title: String,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1500),
            indicator_hold: Duration::from_millis(500),
            default_title: "Untitled log".to_string(),
        }
    }
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// No pending unsaved change.
    Idle,
    /// A change occurred and the delay timer is armed.
    PendingDebounce,
    /// A save was dispatched recently; the indicator is showing.
    Saving,
}

/// Data captured for one persist call, at invocation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveRequest {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl SaveRequest {
    /// Capture the document, trimming the title and substituting the
    /// default when empty. Returns `None` for a completely empty document,
    /// which is never persisted.
    fn capture(doc: &Document, default_title: &str) -> Option<Self> {
        if doc.is_empty() {
            return None;
        }
        let trimmed = doc.title.trim();
        Some(Self {
            title: if trimmed.is_empty() {
                default_title.to_string()
            } else {
                trimmed.to_string()
            },
            content: doc.body().to_string(),
            tags: doc.tags().to_vec(),
        })
    }
}

/// Timer commands the controller hands to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEffect {
    Arm { generation: u64, delay: Duration },
    Cancel { generation: u64 },
}

/// The debounce/coalescing state machine.
#[derive(Debug)]
pub struct AutosaveController {
    config: AutosaveConfig,
    /// Generation of the currently armed timer, if any.
    armed: Option<u64>,
    next_generation: u64,
    /// One-shot suppression so applying loaded values does not autosave.
    initial_load: bool,
    edit_seq: u64,
    saved_seq: u64,
    /// Edit sequence captured by the save currently in flight.
    inflight_seq: Option<u64>,
    saving_since: Option<DateTime<Utc>>,
    last_saved_at: Option<DateTime<Utc>>,
}

impl AutosaveController {
    pub fn new(config: AutosaveConfig) -> Self {
        Self {
            config,
            armed: None,
            next_generation: 0,
            initial_load: true,
            edit_seq: 0,
            saved_seq: 0,
            inflight_seq: None,
            saving_since: None,
            last_saved_at: None,
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    /// Reset for a newly loaded entry (navigation). Cancels any pending
    /// timer — mandatory, so a stale fire cannot save into the wrong
    /// target — and re-arms the one-shot load suppression.
    pub fn reset_for_load(&mut self, loaded_saved_at: Option<DateTime<Utc>>) -> Option<TimerEffect> {
        let cancel = self.disarm();
        self.initial_load = true;
        self.edit_seq = 0;
        self.saved_seq = 0;
        self.inflight_seq = None;
        self.saving_since = None;
        self.last_saved_at = loaded_saved_at;
        cancel
    }

    /// Record an edit to title, body or tags.
    ///
    /// The first call after a load is the load itself and is suppressed;
    /// afterwards each edit cancels the previous timer and arms a fresh one,
    /// coalescing bursts of keystrokes into a single save.
    pub fn document_edited(&mut self) -> Vec<TimerEffect> {
        if self.initial_load {
            self.initial_load = false;
            return Vec::new();
        }

        self.edit_seq += 1;
        let mut effects = Vec::with_capacity(2);
        if let Some(cancel) = self.disarm() {
            effects.push(cancel);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.armed = Some(generation);
        effects.push(TimerEffect::Arm {
            generation,
            delay: self.config.debounce,
        });
        effects
    }

    /// Handle a debounce timer fire. Stale generations are ignored.
    pub fn timer_fired(
        &mut self,
        generation: u64,
        doc: &Document,
        now: DateTime<Utc>,
    ) -> Option<SaveRequest> {
        if self.armed != Some(generation) {
            debug!(generation, "ignoring stale debounce fire");
            return None;
        }
        self.armed = None;
        self.dispatch(doc, now)
    }

    /// Immediate save on explicit user action, bypassing the timer.
    pub fn manual_save(&mut self, doc: &Document, now: DateTime<Utc>) -> Option<SaveRequest> {
        self.dispatch(doc, now)
    }

    /// Final flush when the editor closes: save unsaved non-empty content
    /// and cancel any pending timer.
    pub fn flush_on_close(
        &mut self,
        doc: &Document,
        now: DateTime<Utc>,
    ) -> (Option<SaveRequest>, Option<TimerEffect>) {
        let cancel = self.disarm();
        let request = if self.is_dirty() { self.dispatch(doc, now) } else { None };
        (request, cancel)
    }

    /// Acknowledge that the persist call finished successfully.
    pub fn save_completed(&mut self, at: DateTime<Utc>) {
        if let Some(seq) = self.inflight_seq.take() {
            self.saved_seq = self.saved_seq.max(seq);
        }
        self.last_saved_at = Some(at);
    }

    /// A persist call failed. The document stays dirty; the next edit or
    /// manual save retries. No automatic backoff.
    pub fn save_failed(&mut self, error: &dyn std::error::Error) {
        warn!(%error, "autosave persist failed");
        self.inflight_seq = None;
    }

    /// Observable state at `now`.
    pub fn state(&self, now: DateTime<Utc>) -> SaveState {
        if let Some(since) = self.saving_since {
            let hold = chrono::Duration::from_std(self.config.indicator_hold)
                .unwrap_or_else(|_| chrono::Duration::milliseconds(500));
            if now < since + hold {
                return SaveState::Saving;
            }
        }
        if self.armed.is_some() {
            SaveState::PendingDebounce
        } else {
            SaveState::Idle
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.edit_seq > self.saved_seq
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    fn disarm(&mut self) -> Option<TimerEffect> {
        self.armed
            .take()
            .map(|generation| TimerEffect::Cancel { generation })
    }

    fn dispatch(&mut self, doc: &Document, now: DateTime<Utc>) -> Option<SaveRequest> {
        let request = SaveRequest::capture(doc, &self.config.default_title)?;
        debug!(title = %request.title, "dispatching save");
        self.inflight_seq = Some(self.edit_seq);
        self.saving_since = Some(now);
        self.last_saved_at = Some(now);
        Some(request)
    }
}

impl Default for AutosaveController {
    fn default() -> Self {
        Self::new(AutosaveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Selection;

    fn controller() -> AutosaveController {
        let mut c = AutosaveController::default();
        // Consume the initial-load suppression the way a session does when
        // it applies freshly loaded values.
        assert!(c.document_edited().is_empty());
        c
    }

    fn doc(title: &str, body: &str) -> Document {
        let mut d = Document::new();
        d.title = title.to_string();
        d.set_body(body.to_string(), Selection::cursor(0));
        d
    }

    #[test]
    fn initial_load_is_suppressed_once() {
        let mut c = AutosaveController::default();
        assert!(c.document_edited().is_empty());
        assert!(!c.document_edited().is_empty());
    }

    #[test]
    fn edits_rearm_and_coalesce() {
        let mut c = controller();

        // Edit 1 arms generation 0.
        let first = c.document_edited();
        assert_eq!(
            first,
            vec![TimerEffect::Arm {
                generation: 0,
                delay: c.config().debounce
            }]
        );

        // Edits 2 and 3 cancel the previous timer and arm a new one.
        let second = c.document_edited();
        assert_eq!(second[0], TimerEffect::Cancel { generation: 0 });
        assert!(matches!(second[1], TimerEffect::Arm { generation: 1, .. }));
        let third = c.document_edited();
        assert_eq!(third[0], TimerEffect::Cancel { generation: 1 });

        // Only the latest generation fires a save; stale fires are no-ops.
        let d = doc("t", "third edit");
        let now = Utc::now();
        assert!(c.timer_fired(0, &d, now).is_none());
        assert!(c.timer_fired(1, &d, now).is_none());
        let request = c.timer_fired(2, &d, now).expect("save");
        assert_eq!(request.content, "third edit");

        // The same generation cannot fire twice.
        assert!(c.timer_fired(2, &d, now).is_none());
    }

    #[test]
    fn empty_document_is_never_saved() {
        let mut c = controller();
        c.document_edited();
        let now = Utc::now();
        assert!(c.timer_fired(0, &doc("  ", "\n"), now).is_none());
        assert!(c.manual_save(&doc("", ""), now).is_none());
    }

    #[test]
    fn empty_title_gets_default_on_save() {
        let mut c = controller();
        let request = c
            .manual_save(&doc("   ", "body"), Utc::now())
            .expect("save");
        assert_eq!(request.title, "Untitled log");
        assert_eq!(request.content, "body");
    }

    #[test]
    fn manual_save_bypasses_timer_without_cancelling_it() {
        let mut c = controller();
        c.document_edited();
        let now = Utc::now();

        let manual = c.manual_save(&doc("t", "b"), now).expect("manual save");
        assert_eq!(manual.title, "t");

        // The armed debounce still fires afterwards; last write wins.
        assert!(c.timer_fired(0, &doc("t", "b2"), now).is_some());
    }

    #[test]
    fn state_reflects_pending_and_saving() {
        let mut c = controller();
        let t0 = Utc::now();
        assert_eq!(c.state(t0), SaveState::Idle);

        c.document_edited();
        assert_eq!(c.state(t0), SaveState::PendingDebounce);

        c.timer_fired(0, &doc("t", "b"), t0);
        assert_eq!(c.state(t0), SaveState::Saving);

        // Indicator holds for its minimum duration, then returns to idle.
        let later = t0 + chrono::Duration::milliseconds(600);
        assert_eq!(c.state(later), SaveState::Idle);
    }

    #[test]
    fn dirty_clears_only_on_completion() {
        let mut c = controller();
        c.document_edited();
        assert!(c.is_dirty());

        let now = Utc::now();
        c.timer_fired(0, &doc("t", "b"), now);
        assert!(c.is_dirty());

        c.save_completed(now);
        assert!(!c.is_dirty());
    }

    #[test]
    fn failed_save_keeps_document_dirty() {
        let mut c = controller();
        c.document_edited();
        let now = Utc::now();
        c.timer_fired(0, &doc("t", "b"), now);

        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        c.save_failed(&err);
        assert!(c.is_dirty());

        // A later save can still succeed.
        assert!(c.manual_save(&doc("t", "b"), now).is_some());
    }

    #[test]
    fn load_reset_cancels_pending_timer() {
        let mut c = controller();
        c.document_edited();

        let cancel = c.reset_for_load(None);
        assert_eq!(cancel, Some(TimerEffect::Cancel { generation: 0 }));
        assert_eq!(c.state(Utc::now()), SaveState::Idle);

        // The fire from the cancelled timer arrives late: ignored.
        assert!(c.timer_fired(0, &doc("t", "b"), Utc::now()).is_none());
    }

    #[test]
    fn close_flushes_unsaved_content() {
        let mut c = controller();
        c.document_edited();

        let (request, cancel) = c.flush_on_close(&doc("t", "b"), Utc::now());
        assert!(request.is_some());
        assert!(cancel.is_some());

        // Nothing dirty: close is a no-op.
        let mut clean = controller();
        let (request, cancel) = clean.flush_on_close(&doc("t", "b"), Utc::now());
        assert!(request.is_none());
        assert!(cancel.is_none());
    }
}
