#![warn(missing_docs)]
//! `md-editor-core-render` - Default preview renderer for `md-editor-core`.
//!
//! Markdown is rendered with `pulldown-cmark`. The output is safe to inject into a preview pane:
//!
//! - raw HTML (block and inline) is emitted as escaped text,
//! - link and image destinations whose scheme is not allowed become `#`,
//! - `[[wiki links]]` outside code are expanded into ordinary links first.
//!
//! ```rust
//! use md_editor_core_render::{MarkdownRenderer, RenderOptions};
//!
//! let renderer = MarkdownRenderer::new(RenderOptions::default()).unwrap();
//! let html = renderer.render_html("see [[Main Page]]").unwrap();
//! assert_eq!(html, "<p>see <a href=\"/wiki/Main%20Page\">Main Page</a></p>\n");
//! ```

use md_editor_core::wiki_link::{self, WikiLink};
use md_editor_core::{RenderError, Renderer};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ops::Range;
use thiserror::Error;

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Prefix for wiki-link hrefs. Default: `/wiki/`.
    pub wiki_link_base: String,
    /// URL schemes links may use. Scheme-less (relative) URLs are always allowed.
    /// Default: `http`, `https`, `mailto`.
    pub allowed_schemes: Vec<String>,
    /// GitHub-style tables. Default: `true`.
    pub tables: bool,
    /// `~~strikethrough~~`. Default: `true`.
    pub strikethrough: bool,
    /// `- [ ]` task list items. Default: `true`.
    pub tasklists: bool,
    /// Refuse inputs larger than this many bytes. Default: no limit.
    pub max_input_bytes: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wiki_link_base: "/wiki/".to_string(),
            allowed_schemes: vec!["http".to_string(), "https".to_string(), "mailto".to_string()],
            tables: true,
            strikethrough: true,
            tasklists: true,
            max_input_bytes: None,
        }
    }
}

/// Errors building a [`MarkdownRenderer`].
#[derive(Debug, Error)]
pub enum RendererBuildError {
    #[error("invalid URL scheme '{0}'")]
    /// An allowed scheme is not a valid URL scheme.
    InvalidScheme(String),

    #[error(transparent)]
    /// Internal pattern failed to compile.
    Regex(#[from] regex::Error),
}

/// Sanitizing markdown → HTML renderer.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: RenderOptions,
    scheme: Regex,
}

impl MarkdownRenderer {
    /// Create a renderer, validating the allowed schemes.
    pub fn new(mut options: RenderOptions) -> Result<Self, RendererBuildError> {
        let scheme_name = Regex::new(r"^[a-z][a-z0-9+.\-]*$")?;
        for scheme in &mut options.allowed_schemes {
            *scheme = scheme.to_ascii_lowercase();
            if !scheme_name.is_match(scheme) {
                return Err(RendererBuildError::InvalidScheme(scheme.clone()));
            }
        }

        Ok(Self {
            options,
            scheme: Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):")?,
        })
    }

    /// Rendering options in effect.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.options.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, self.options.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.options.tasklists);
        options
    }

    /// Render `markdown` into sanitized HTML.
    pub fn render_html(&self, markdown: &str) -> Result<String, RenderError> {
        if let Some(max) = self.options.max_input_bytes
            && markdown.len() > max
        {
            return Err(RenderError::new(format!(
                "input of {} bytes exceeds the {max} byte limit",
                markdown.len()
            )));
        }

        let expanded = self.expand_wiki_links(markdown);
        let events = Parser::new_ext(&expanded, self.parser_options()).map(|event| self.sanitize(event));

        let mut out = String::with_capacity(expanded.len() + expanded.len() / 2);
        html::push_html(&mut out, events);
        Ok(out)
    }

    fn sanitize<'a>(&self, event: Event<'a>) -> Event<'a> {
        match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: self.sanitize_url(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: self.sanitize_url(dest_url),
                title,
                id,
            }),
            other => other,
        }
    }

    /// Keep scheme-less URLs and URLs with an allowed scheme; everything else becomes `#`.
    fn sanitize_url<'a>(&self, url: CowStr<'a>) -> CowStr<'a> {
        // Browsers ignore embedded whitespace and control characters inside a scheme.
        let compact: String = url
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .collect();
        let Some(caps) = self.scheme.captures(&compact) else {
            return url;
        };
        let scheme = caps[1].to_ascii_lowercase();
        if self.options.allowed_schemes.iter().any(|allowed| *allowed == scheme) {
            url
        } else {
            log::debug!("dropping link with disallowed scheme '{scheme}'");
            CowStr::Borrowed("#")
        }
    }

    /// Byte ranges of code blocks and code spans, as the markdown parser sees them.
    fn code_ranges(&self, markdown: &str) -> Vec<Range<usize>> {
        Parser::new_ext(markdown, self.parser_options())
            .into_offset_iter()
            .filter_map(|(event, range)| match event {
                Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
                _ => None,
            })
            .collect()
    }

    /// Rewrite `[[...]]` spans outside code into markdown links.
    fn expand_wiki_links<'a>(&self, markdown: &'a str) -> Cow<'a, str> {
        if !markdown.contains(wiki_link::OPEN) {
            return Cow::Borrowed(markdown);
        }

        let code = self.code_ranges(markdown);
        let mut out = String::with_capacity(markdown.len() + 32);
        let mut copied = 0;
        // Matches come in order, so char offsets convert to bytes in one forward pass.
        let (mut chars_seen, mut bytes_seen) = (0, 0);
        let mut to_byte = |char_offset: usize| {
            bytes_seen += markdown[bytes_seen..]
                .chars()
                .take(char_offset - chars_seen)
                .map(char::len_utf8)
                .sum::<usize>();
            chars_seen = char_offset;
            bytes_seen
        };
        for found in wiki_link::parse(markdown) {
            let start = to_byte(found.start);
            let end = to_byte(found.end);
            if code.iter().any(|range| range.start < end && start < range.end) {
                continue;
            }
            out.push_str(&markdown[copied..start]);
            self.push_link(&found.link, &mut out);
            copied = end;
        }
        out.push_str(&markdown[copied..]);
        Cow::Owned(out)
    }

    fn push_link(&self, link: &WikiLink, out: &mut String) {
        out.push('[');
        for c in link.display.chars() {
            if matches!(c, '\\' | '[' | ']' | '`' | '*' | '_' | '<' | '>') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push_str("](");
        out.push_str(&self.options.wiki_link_base);
        percent_encode(&link.target, out);
        if let Some(section) = &link.section {
            out.push('#');
            percent_encode(section, out);
        }
        out.push(')');
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        self.render_html(markdown)
    }
}

fn percent_encode(text: &str, out: &mut String) {
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~' | b'/') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
}
