//! Inline image placeholders
//!
//! Pasted images are stored inside the log body itself as
//! `{{IMG:<id>:<data-uri>}}` tokens. The id is session-unique and must not
//! contain `:` or `}`; base64 data URIs never contain `}` so the closing
//! delimiter is unambiguous. For preview, placeholders are rewritten to
//! standard markdown image syntax addressed by id, with the payloads moved
//! into a side lookup.

use std::collections::HashMap;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::{Captures, Regex};
use thiserror::Error;

/// Matches a complete `{{IMG:id:payload}}` placeholder.
pub static IMAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{IMG:([^:}]+):([^}]+)\}\}").expect("image placeholder regex"));

/// Errors decoding a `data:` URI payload.
#[derive(Debug, Error)]
pub enum DataUriError {
    #[error("payload is not a data URI")]
    MissingScheme,
    #[error("data URI is not base64 encoded")]
    MissingBase64Marker,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Build the block-level placeholder text spliced into a body on paste.
///
/// The surrounding newlines force the image onto its own markdown block.
pub fn image_placeholder(id: &str, data_uri: &str) -> String {
    format!("\n{{{{IMG:{id}:{data_uri}}}}}\n")
}

/// Encode raw image bytes as a `data:` URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decode a `data:` URI back into `(mime, bytes)`.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), DataUriError> {
    let rest = uri.strip_prefix("data:").ok_or(DataUriError::MissingScheme)?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or(DataUriError::MissingBase64Marker)?;
    let bytes = STANDARD.decode(payload)?;
    Ok((mime.to_string(), bytes))
}

/// Result of lifting image payloads out of a body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImages {
    /// Body with every placeholder replaced by `![image](id)`.
    pub markdown: String,
    /// Payload lookup keyed by placeholder id.
    pub images: HashMap<String, String>,
}

/// Extract all image placeholders from `text`.
///
/// The returned markdown references each image by its id; the renderer
/// resolves the address back through the lookup and falls back to
/// placeholder text when an id is unknown.
pub fn extract_images(text: &str) -> ExtractedImages {
    let mut images = HashMap::new();
    for cap in IMAGE_REGEX.captures_iter(text) {
        let id = cap.get(1).expect("id group").as_str();
        let payload = cap.get(2).expect("payload group").as_str();
        images.insert(id.to_string(), payload.to_string());
    }

    let markdown = IMAGE_REGEX
        .replace_all(text, |cap: &Captures<'_>| {
            format!("![image]({})", &cap[1])
        })
        .into_owned();

    ExtractedImages { markdown, images }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_round_trip() {
        let bytes = b"\x89PNG\r\n\x1a\n fake image bytes";
        let uri = encode_data_uri("image/png", bytes);
        assert!(uri.starts_with("data:image/png;base64,"));

        let (mime, decoded) = decode_data_uri(&uri).expect("decode");
        assert_eq!(mime, "image/png");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn rejects_non_data_uri() {
        assert!(matches!(
            decode_data_uri("https://example.com/x.png"),
            Err(DataUriError::MissingScheme)
        ));
        assert!(matches!(
            decode_data_uri("data:image/png,plain"),
            Err(DataUriError::MissingBase64Marker)
        ));
    }

    #[test]
    fn placeholder_is_block_separated() {
        let p = image_placeholder("img_1_0", "data:image/png;base64,AA==");
        assert_eq!(p, "\n{{IMG:img_1_0:data:image/png;base64,AA==}}\n");
    }

    #[test]
    fn extracts_payloads_and_rewrites_addresses() {
        let body = "before\n{{IMG:img_7_0:data:image/png;base64,AA==}}\nafter";
        let extracted = extract_images(body);

        assert_eq!(extracted.markdown, "before\n![image](img_7_0)\nafter");
        assert_eq!(
            extracted.images.get("img_7_0").map(String::as_str),
            Some("data:image/png;base64,AA==")
        );
    }

    #[test]
    fn extraction_round_trips_payload_bytes() {
        let bytes = vec![0u8, 1, 2, 254, 255];
        let uri = encode_data_uri("image/jpeg", &bytes);
        let body = format!("x{}y", image_placeholder("img_9_3", &uri));

        let extracted = extract_images(&body);
        let stored = extracted.images.get("img_9_3").expect("payload");
        let (_, decoded) = decode_data_uri(stored).expect("decode");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn text_without_placeholders_is_untouched() {
        let extracted = extract_images("plain {{not an image}} text");
        assert_eq!(extracted.markdown, "plain {{not an image}} text");
        assert!(extracted.images.is_empty());
    }
}
