//! HTML parser for extracting story text and table-of-contents links
//!
//! `Document` is the only view of markup the crawler needs: select elements,
//! read their text, read an attribute. Parsing is total; malformed or
//! non-HTML input simply yields fewer matches.

use crate::storage::PageRecord;
use crate::ConfigError;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use scraper::{ElementRef, Html, Selector};
use std::borrow::Cow;

/// Paragraph-level elements that make up the story body
const STORY_SELECTOR: &str = "p";

/// Block quotations, which carry the fable's moral
const QUOTE_SELECTOR: &str = "blockquote";

/// How far into a page a `<meta>` charset declaration is looked for
const CHARSET_SNIFF_LIMIT: usize = 1024;

/// A parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses raw page bytes, decoding them with [`decode_html`]
    pub fn parse(content: &[u8]) -> Self {
        let text = decode_html(content);
        Self {
            html: Html::parse_document(&text),
        }
    }

    /// All elements matching `selector`, in document order
    pub fn select_all<'a>(&'a self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.html.select(selector).collect()
    }

    /// Concatenation of every descendant text node, without any markup
    pub fn text_content(element: ElementRef<'_>) -> String {
        element.text().collect()
    }

    pub fn attribute<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
        element.value().attr(name)
    }

    /// Text of every element matching `selector`, in document order
    pub fn texts(&self, selector: &Selector) -> Vec<String> {
        self.select_all(selector)
            .into_iter()
            .map(Self::text_content)
            .collect()
    }
}

/// Decodes page bytes to text
///
/// A byte order mark wins, then a `<meta charset>` or `http-equiv` declaration
/// near the top of the page, then UTF-8. Malformed sequences become U+FFFD.
pub fn decode_html(content: &[u8]) -> Cow<'_, str> {
    let encoding = meta_charset(content).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(content);
    if had_errors {
        tracing::debug!("Page is not valid {}, replaced malformed bytes", used.name());
    }
    text
}

/// Encoding declared by the first `<meta>` tag that names a known charset
fn meta_charset(content: &[u8]) -> Option<&'static Encoding> {
    let head = content[..content.len().min(CHARSET_SNIFF_LIMIT)].to_ascii_lowercase();
    let mut rest = head.as_slice();

    while let Some(start) = find_bytes(rest, b"<meta") {
        let tag = &rest[start..];
        let end = tag.iter().position(|&b| b == b'>').unwrap_or(tag.len());
        if let Some(encoding) = charset_in_tag(&tag[..end]) {
            return Some(encoding);
        }
        rest = &tag[end..];
    }

    None
}

fn charset_in_tag(tag: &[u8]) -> Option<&'static Encoding> {
    let after = &tag[find_bytes(tag, b"charset")? + b"charset".len()..];
    let value = skip_whitespace(skip_whitespace(after).strip_prefix(b"=")?);
    let value = value
        .strip_prefix(b"\"")
        .or_else(|| value.strip_prefix(b"'"))
        .unwrap_or(value);

    let label_end = value
        .iter()
        .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'/') || b.is_ascii_whitespace())
        .unwrap_or(value.len());
    let encoding = Encoding::for_label(&value[..label_end])?;

    // Without a BOM the bytes cannot actually be UTF-16
    if encoding == UTF_16LE || encoding == UTF_16BE {
        Some(UTF_8)
    } else {
        Some(encoding)
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let n = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
    &bytes[n..]
}

/// Compiles a CSS selector, reporting failures as configuration errors
pub fn compile_selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Text extracted from a story page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// One entry per paragraph
    pub story: Vec<String>,

    /// One entry per block quote
    pub quote: Vec<String>,
}

impl ParsedPage {
    /// Assembles the document stored for `link`
    pub fn into_record(self, link: &str, html: Vec<u8>) -> PageRecord {
        PageRecord {
            link: link.to_string(),
            html,
            story: self.story,
            quote: self.quote,
        }
    }
}

/// Extracts story paragraphs and quotes from a page
///
/// # Example
///
/// ```
/// use fable_crawler::crawler::parse_page;
///
/// let parsed = parse_page(b"<p>Once upon a time</p><blockquote>Slow and steady wins the race</blockquote>");
/// assert_eq!(parsed.story, vec!["Once upon a time"]);
/// assert_eq!(parsed.quote, vec!["Slow and steady wins the race"]);
/// ```
pub fn parse_page(content: &[u8]) -> ParsedPage {
    let document = Document::parse(content);

    ParsedPage {
        story: texts_for(&document, STORY_SELECTOR),
        quote: texts_for(&document, QUOTE_SELECTOR),
    }
}

fn texts_for(document: &Document, css: &str) -> Vec<String> {
    match Selector::parse(css) {
        Ok(selector) => document.texts(&selector),
        Err(_) => Vec::new(),
    }
}

/// Resolves every anchor matched by `selector` against `base_url`
///
/// The href is appended to the base verbatim. Anchors without an href are
/// skipped; duplicates are kept.
pub fn extract_toc_links(document: &Document, selector: &Selector, base_url: &str) -> Vec<String> {
    document
        .select_all(selector)
        .into_iter()
        .filter_map(|anchor| Document::attribute(anchor, "href"))
        .map(|href| format!("{}{}", base_url, href))
        .collect()
}
