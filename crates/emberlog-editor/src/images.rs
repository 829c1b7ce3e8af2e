//! Paste-to-embed image codec
//!
//! Pasted images become `{{IMG:id:data-uri}}` tokens spliced into the body.
//! Because full data URIs are unusable in an editable surface, the display
//! layer swaps each payload for a stand-in glyph and swaps it back on write,
//! matching placeholders by id rather than position so edits around them
//! are safe.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::Utc;
use regex::{Captures, Regex};
use tracing::debug;

use emberlog_parser::images::{encode_data_uri, image_placeholder, IMAGE_REGEX};

/// Glyph shown in place of an image payload in the editable text.
pub const IMAGE_STAND_IN: &str = "\u{1F4F7}";

/// Matches a display-form placeholder, `{{IMG:id:📷}}`.
static DISPLAY_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{IMG:([^:}]+):\u{1F4F7}\}\}").expect("display placeholder regex")
});

/// One item read from the clipboard.
#[derive(Debug, Clone)]
pub struct ClipboardItem {
    pub mime: String,
    pub data: Vec<u8>,
}

/// Clipboard contents handed to the paste handler.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    pub items: Vec<ClipboardItem>,
}

impl Clipboard {
    /// First image item, if any. Remaining items are ignored; a clipboard
    /// with no image falls through to the host's plain-text paste.
    pub fn first_image(&self) -> Option<&ClipboardItem> {
        self.items.iter().find(|i| i.mime.starts_with("image/"))
    }
}

/// Session-scoped id generator and paste encoder.
#[derive(Debug, Default)]
pub struct ImageCodec {
    counter: u64,
}

impl ImageCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a session-unique placeholder id. Combining a timestamp with
    /// a monotonic counter prevents collisions between unrelated images.
    pub fn next_id(&mut self) -> String {
        let id = format!("img_{}_{}", Utc::now().timestamp_millis(), self.counter);
        self.counter += 1;
        id
    }

    /// Encode the first image on the clipboard into a placeholder token.
    ///
    /// Returns `None` when the clipboard holds no image, in which case the
    /// paste proceeds as ordinary text with no error surfaced.
    pub fn encode_paste(&mut self, clipboard: &Clipboard) -> Option<String> {
        let item = clipboard.first_image()?;
        let id = self.next_id();
        debug!(%id, mime = %item.mime, bytes = item.data.len(), "embedding pasted image");
        let uri = encode_data_uri(&item.mime, &item.data);
        Some(image_placeholder(&id, &uri))
    }
}

/// Canonical body -> display text: payloads replaced by the stand-in glyph,
/// ids preserved.
pub fn to_display(body: &str) -> String {
    IMAGE_REGEX
        .replace_all(body, |cap: &Captures<'_>| {
            format!("{{{{IMG:{}:{IMAGE_STAND_IN}}}}}", &cap[1])
        })
        .into_owned()
}

/// Display text -> canonical body: stand-ins matched back to payloads by id
/// against the previous canonical text.
///
/// A stand-in whose id has no known payload (for example, a placeholder
/// typed by hand) is left untouched rather than corrupting the document.
pub fn from_display(display: &str, canonical: &str) -> String {
    if !display.contains("{{IMG:") {
        return display.to_string();
    }

    let payloads: HashMap<&str, &str> = IMAGE_REGEX
        .captures_iter(canonical)
        .map(|cap| {
            (
                cap.get(1).expect("id group").as_str(),
                cap.get(2).expect("payload group").as_str(),
            )
        })
        .collect();

    DISPLAY_IMAGE_REGEX
        .replace_all(display, |cap: &Captures<'_>| {
            let id = &cap[1];
            match payloads.get(id) {
                Some(payload) => format!("{{{{IMG:{id}:{payload}}}}}"),
                // Unknown id: keep the literal stand-in text as-is.
                None => cap[0].to_string(),
            }
        })
        .into_owned()
}
