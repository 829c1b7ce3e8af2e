//! Emberlog markdown token layer
//!
//! Log entry bodies are plain markdown plus two inline token formats that
//! must round-trip byte-exactly through storage:
//! - `[[Project]]` / `[[Project/Log title]]` wiki-links
//! - `{{IMG:<id>:<data-uri>}}` inline image placeholders
//!
//! This crate scans and rewrites those tokens and renders the preview HTML.
//! Anchor resolution is injected through [`ResolveAnchor`] so the token
//! layer stays independent of the data model.

pub mod images;
pub mod preview;
pub mod wikilinks;

pub use images::{
    decode_data_uri, encode_data_uri, extract_images, image_placeholder, DataUriError,
    ExtractedImages,
};
pub use preview::{render_preview, LinkRenderPass, RenderedLink, RenderedPreview};
pub use wikilinks::{extract_wikilinks, split_anchor, LinkTarget, ResolveAnchor, Wikilink};
