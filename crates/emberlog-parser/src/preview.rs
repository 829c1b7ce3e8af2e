//! Preview rendering pipeline
//!
//! Rendering a log body happens in three passes:
//! 1. image placeholders are lifted into a side lookup and replaced with
//!    `![image](id)` markdown,
//! 2. wiki-links are substituted with internal `{{LINK:anchor}}` markers so
//!    the markdown renderer cannot mangle them, and the body is rendered to
//!    HTML with pulldown-cmark,
//! 3. the link render pass resolves each surviving marker against the live
//!    project/log set and emits a navigation control (or an inert broken
//!    link for anchors that resolve to nothing).
//!
//! None of this mutates the stored body; resolution is recomputed from
//! scratch on every render, so renames retarget old links without any
//! migration step.

use std::collections::HashMap;
use std::sync::LazyLock;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::{Captures, Regex};
use serde::Serialize;

use crate::images::extract_images;
use crate::wikilinks::{LinkTarget, ResolveAnchor, WIKILINK_REGEX};

/// Matches an internal `{{LINK:anchor}}` marker in rendered output.
static LINK_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{LINK:([^}]+)\}\}").expect("link marker regex"));

/// Code regions where wiki-links are left as literal text.
static CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^```[\s\S]*?^```|^    .*$|`[^`]+`").expect("code region regex")
});

/// A wiki-link occurrence in rendered output together with its resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLink {
    pub anchor: String,
    pub target: LinkTarget,
}

/// Rendered preview of a log body.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPreview {
    /// HTML with wiki-link markers replaced by navigation controls.
    pub html: String,
    /// Every wiki-link in render order, resolved. Hosts wire click handlers
    /// (navigate-to-project / navigate-to-log) from this list.
    pub links: Vec<RenderedLink>,
    /// Image payload lookup keyed by placeholder id.
    pub images: HashMap<String, String>,
}

/// Replace `[[anchor]]` tokens with `{{LINK:anchor}}` markers, skipping
/// fenced/indented code blocks and inline code spans.
pub fn mark_wikilinks(text: &str) -> String {
    if !text.contains("[[") {
        return text.to_string();
    }

    let code_ranges: Vec<(usize, usize)> = CODE_REGEX
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    WIKILINK_REGEX
        .replace_all(text, |cap: &Captures<'_>| {
            let full = cap.get(0).expect("regex match");
            let inside_code = code_ranges
                .iter()
                .any(|&(start, end)| full.start() >= start && full.start() < end);
            if inside_code {
                full.as_str().to_string()
            } else {
                format!("{{{{LINK:{}}}}}", &cap[1])
            }
        })
        .into_owned()
}

/// Post-processing pass that turns link markers into interactive controls.
pub struct LinkRenderPass<R> {
    resolver: R,
}

impl<R: ResolveAnchor> LinkRenderPass<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Replace every `{{LINK:anchor}}` marker in `html` with a navigation
    /// control, returning the rewritten HTML and the resolved link list.
    pub fn rewrite(&self, html: &str) -> (String, Vec<RenderedLink>) {
        let mut links = Vec::new();
        let rewritten = LINK_MARKER_REGEX
            .replace_all(html, |cap: &Captures<'_>| {
                // The markdown renderer entity-escapes text, so the anchor is
                // unescaped back to what the user typed before resolving.
                let anchor = unescape_html(&cap[1]);
                let target = self.resolver.resolve(&anchor);
                let control = link_control(&anchor, target);
                links.push(RenderedLink { anchor, target });
                control
            })
            .into_owned();
        (rewritten, links)
    }
}

fn link_control(anchor: &str, target: LinkTarget) -> String {
    let label = escape_html(anchor);
    match target {
        LinkTarget::Project { project_id } => format!(
            "<a href=\"#\" class=\"wiki-link\" data-kind=\"project\" data-project-id=\"{project_id}\">{label}</a>"
        ),
        LinkTarget::Log { project_id, log_id } => format!(
            "<a href=\"#\" class=\"wiki-link\" data-kind=\"log\" data-project-id=\"{project_id}\" data-log-id=\"{log_id}\">{label}</a>"
        ),
        LinkTarget::Unresolved => {
            format!("<span class=\"wiki-link wiki-link-broken\">{label}</span>")
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Render a log body to preview HTML.
pub fn render_preview<R: ResolveAnchor>(content: &str, resolver: &R) -> RenderedPreview {
    let extracted = extract_images(content);
    let marked = mark_wikilinks(&extracted.markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut events = Vec::new();
    let mut parser = Parser::new_ext(&marked, options);
    while let Some(event) = parser.next() {
        match event {
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                if let Some(payload) = extracted.images.get(dest_url.as_ref()) {
                    events.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url: CowStr::from(payload.clone()),
                        title,
                        id,
                    }));
                } else if is_external_address(&dest_url) {
                    // A regular markdown image; not ours to resolve.
                    events.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                } else {
                    // Placeholder id with no known payload: swallow the image
                    // and render fallback text instead of a broken <img>.
                    for inner in parser.by_ref() {
                        if matches!(inner, Event::End(TagEnd::Image)) {
                            break;
                        }
                    }
                    events.push(Event::Html(CowStr::from(format!(
                        "<span class=\"image-missing\">[image {} unavailable]</span>",
                        escape_html(&dest_url)
                    ))));
                }
            }
            other => events.push(other),
        }
    }

    let mut rendered = String::new();
    html::push_html(&mut rendered, events.into_iter());

    let (html, links) = LinkRenderPass::new(resolver).rewrite(&rendered);

    RenderedPreview {
        html,
        links,
        images: extracted.images,
    }
}

fn is_external_address(address: &str) -> bool {
    address.starts_with("http://")
        || address.starts_with("https://")
        || address.starts_with("data:")
}
