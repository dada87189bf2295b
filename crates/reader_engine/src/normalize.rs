//! Turns extracted article markup into a self-contained printable document.
//!
//! The fragment is walked node by node and re-serialized. Images get a single
//! absolute `src` chosen from the lazy-loading attributes sites use, links are
//! made absolute, and scripting leftovers are dropped.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Attributes lazy loaders park the real image URL in, by priority.
pub const LAZY_SRC_ATTRS: &[&str] = &[
    "data-src",
    "data-lazy-src",
    "data-original",
    "data-url",
    "data-actualsrc",
];

/// Candidate lists, by priority.
pub const SRCSET_ATTRS: &[&str] = &["srcset", "data-srcset", "data-lazy-srcset"];

const DROPPED_IMG_ATTRS: &[&str] = &["src", "sizes", "loading"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "source", "track", "wbr",
];

const MEDIA_ELEMENTS: &[&str] = &[
    "audio", "canvas", "embed", "iframe", "math", "object", "svg", "video",
];

const PRINT_CSS: &str = "\
body { margin: 0; font-family: Georgia, \"Times New Roman\", serif; font-size: 12pt; line-height: 1.5; color: #111; }
article { max-width: 100%; }
h1 { font-size: 1.8em; line-height: 1.2; margin: 0 0 0.4em; }
.source { font-size: 0.85em; color: #555; margin: 0 0 1.5em; word-break: break-all; }
img, video, svg { max-width: 100%; height: auto; }
figure { margin: 1em 0; }
pre, code { font-family: Menlo, Consolas, monospace; font-size: 0.9em; }
pre { white-space: pre-wrap; word-wrap: break-word; }
table { border-collapse: collapse; max-width: 100%; }
a { color: inherit; }";

/// Output of extraction, tied to the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub content_html: String,
    pub base_url: String,
}

/// Complete HTML document ready to be printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("base url is not absolute: {0}")]
    InvalidBaseUrl(String),
    #[error("content contains NUL bytes")]
    NulByte,
    #[error("content has no renderable nodes")]
    NothingRenderable,
}

/// Normalizes one article. Output is byte-identical for identical input.
pub fn normalize(article: &ExtractedArticle) -> Result<NormalizedDocument, NormalizeError> {
    let base = Url::parse(article.base_url.trim())
        .ok()
        .filter(|url| !url.cannot_be_a_base())
        .ok_or_else(|| NormalizeError::InvalidBaseUrl(article.base_url.clone()))?;
    if article.content_html.contains('\0') {
        return Err(NormalizeError::NulByte);
    }

    let fragment = Html::parse_fragment(&article.content_html);
    let mut ctx = SerializeContext::new(&base);
    for child in fragment.root_element().children() {
        visit_node(child, &mut ctx);
    }

    if ctx.rendered_nodes == 0 && !article.content_html.trim().is_empty() {
        return Err(NormalizeError::NothingRenderable);
    }

    Ok(NormalizedDocument {
        html: wrap_document(&article.title, &base, &ctx.out),
    })
}

struct SerializeContext<'b> {
    out: String,
    base: &'b Url,
    rendered_nodes: usize,
}

impl<'b> SerializeContext<'b> {
    fn new(base: &'b Url) -> Self {
        Self {
            out: String::new(),
            base,
            rendered_nodes: 0,
        }
    }
}

fn visit_node(node: NodeRef<'_, Node>, ctx: &mut SerializeContext<'_>) {
    match node.value() {
        Node::Text(text) => {
            let raw_parent = node
                .parent()
                .and_then(|p| p.value().as_element().map(|el| el.name() == "style"))
                .unwrap_or(false);
            if raw_parent {
                ctx.out.push_str(text);
            } else {
                escape_text_into(text, &mut ctx.out);
            }
            if !text.trim().is_empty() {
                ctx.rendered_nodes += 1;
            }
        }
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, ctx);
            }
        }
        // Comments, doctypes and processing instructions carry nothing printable.
        _ => {}
    }
}

fn visit_element(element: ElementRef<'_>, ctx: &mut SerializeContext<'_>) {
    let tag = element.value().name().to_string();
    match tag.as_str() {
        "script" | "base" => {}
        "noscript" => {
            // Used ones were emitted in place of their image, the rest are dropped.
        }
        "img" => handle_image(element, ctx),
        "a" => {
            let href = element
                .value()
                .attr("href")
                .map(|raw| resolve_link(raw, ctx.base));
            let attrs = rewritten_attrs(element, "href", href);
            write_element(element, &tag, &attrs, ctx);
        }
        "source" => {
            let srcset = element
                .value()
                .attr("srcset")
                .map(|raw| resolve_srcset(raw, ctx.base));
            let mut attrs = rewritten_attrs(element, "srcset", srcset);
            if let Some(src) = element.value().attr("src") {
                let resolved = resolve_media_url(src, ctx.base).unwrap_or_else(|| src.to_string());
                replace_attr(&mut attrs, "src", resolved);
            }
            write_element(element, &tag, &attrs, ctx);
        }
        _ => {
            let attrs = sorted_attrs(element, &[]);
            write_element(element, &tag, &attrs, ctx);
        }
    }
}

fn write_element(
    element: ElementRef<'_>,
    tag: &str,
    attrs: &[(String, String)],
    ctx: &mut SerializeContext<'_>,
) {
    ctx.out.push('<');
    ctx.out.push_str(tag);
    for (name, value) in attrs {
        ctx.out.push(' ');
        ctx.out.push_str(name);
        ctx.out.push_str("=\"");
        escape_attr_into(value, &mut ctx.out);
        ctx.out.push('"');
    }
    ctx.out.push('>');
    if MEDIA_ELEMENTS.contains(&tag) {
        ctx.rendered_nodes += 1;
    }
    if VOID_ELEMENTS.contains(&tag) {
        if matches!(tag, "br" | "hr") {
            ctx.rendered_nodes += 1;
        }
        return;
    }
    for child in element.children() {
        visit_node(child, ctx);
    }
    ctx.out.push_str("</");
    ctx.out.push_str(tag);
    ctx.out.push('>');
}

fn handle_image(element: ElementRef<'_>, ctx: &mut SerializeContext<'_>) {
    if let Some(src) = choose_image_source(element, ctx.base) {
        write_image(element, src, ctx);
        return;
    }

    if let Some(noscript) = next_noscript_sibling(element) {
        let inner = Html::parse_fragment(&noscript_markup(noscript));
        if let Ok(img_sel) = Selector::parse("img") {
            let fallback = inner.select(&img_sel).find_map(|img| {
                choose_image_source(img, ctx.base)
                    .or_else(|| inline_placeholder(img))
                    .map(|src| (img, src))
            });
            if let Some((img, src)) = fallback {
                write_image(img, src, ctx);
                return;
            }
        }
    }

    // An inline placeholder still prints when nothing better exists.
    if let Some(src) = inline_placeholder(element) {
        write_image(element, src, ctx);
    }
}

fn write_image(element: ElementRef<'_>, src: String, ctx: &mut SerializeContext<'_>) {
    let mut attrs = vec![("src".to_string(), src)];
    let mut skipped: Vec<&str> = DROPPED_IMG_ATTRS.to_vec();
    skipped.extend_from_slice(LAZY_SRC_ATTRS);
    skipped.extend_from_slice(SRCSET_ATTRS);
    attrs.extend(sorted_attrs(element, &skipped));

    ctx.out.push_str("<img");
    for (name, value) in &attrs {
        ctx.out.push(' ');
        ctx.out.push_str(name);
        ctx.out.push_str("=\"");
        escape_attr_into(value, &mut ctx.out);
        ctx.out.push('"');
    }
    ctx.out.push('>');
    ctx.rendered_nodes += 1;
}

/// Picks the URL an `<img>` should print with: a real `src`, then lazy
/// attributes, then srcset candidates.
fn choose_image_source(element: ElementRef<'_>, base: &Url) -> Option<String> {
    let value = element.value();
    let src = value.attr("src").map(str::trim).unwrap_or("");

    if !is_placeholder(src) {
        if let Some(url) = resolve_media_url(src, base) {
            return Some(url);
        }
    }
    for attr in LAZY_SRC_ATTRS {
        if let Some(url) = value.attr(attr).and_then(|raw| resolve_media_url(raw, base)) {
            return Some(url);
        }
    }
    for attr in SRCSET_ATTRS {
        if let Some(url) = value
            .attr(attr)
            .and_then(pick_srcset_candidate)
            .and_then(|raw| resolve_media_url(&raw, base))
        {
            return Some(url);
        }
    }
    None
}

fn inline_placeholder(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("src")
        .map(str::trim)
        .filter(|src| is_data_uri(src))
        .map(str::to_string)
}

fn is_placeholder(src: &str) -> bool {
    src.is_empty() || src == "#" || src.eq_ignore_ascii_case("about:blank") || is_data_uri(src)
}

fn is_data_uri(src: &str) -> bool {
    src.len() > 5
        && src
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Largest `w` descriptor wins; without any, the first candidate.
pub fn pick_srcset_candidate(srcset: &str) -> Option<String> {
    let mut first: Option<&str> = None;
    let mut widest: Option<(u32, &str)> = None;
    for candidate in srcset.split(',') {
        let mut parts = candidate.split_whitespace();
        let Some(url) = parts.next() else {
            continue;
        };
        first.get_or_insert(url);
        let width = parts
            .next()
            .and_then(|d| d.strip_suffix('w').or_else(|| d.strip_suffix('W')))
            .and_then(|w| w.parse::<u32>().ok());
        if let Some(width) = width {
            if widest.map_or(true, |(best, _)| width > best) {
                widest = Some((width, url));
            }
        }
    }
    widest.map(|(_, url)| url).or(first).map(str::to_string)
}

fn resolve_media_url(raw: &str, base: &Url) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "#" {
        return None;
    }
    if is_data_uri(trimmed) {
        return Some(trimmed.to_string());
    }
    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => base.join(trimmed).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// Absolute form of an anchor target; fragments, `javascript:` and
/// unparseable targets come back unchanged.
fn resolve_link(raw: &str, base: &Url) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.to_ascii_lowercase().starts_with("javascript:")
    {
        return raw.to_string();
    }
    if Url::parse(trimmed).is_ok() {
        return trimmed.to_string();
    }
    base.join(trimmed)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn resolve_srcset(raw: &str, base: &Url) -> String {
    raw.split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let resolved = resolve_media_url(url, base).unwrap_or_else(|| url.to_string());
            let descriptor: Vec<&str> = parts.collect();
            Some(if descriptor.is_empty() {
                resolved
            } else {
                format!("{resolved} {}", descriptor.join(" "))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn next_noscript_sibling<'a>(element: ElementRef<'a>) -> Option<NodeRef<'a, Node>> {
    let mut sibling = element.next_sibling();
    while let Some(node) = sibling {
        match node.value() {
            Node::Text(text) if text.trim().is_empty() => sibling = node.next_sibling(),
            Node::Comment(_) => sibling = node.next_sibling(),
            Node::Element(el) if el.name() == "noscript" => return Some(node),
            _ => return None,
        }
    }
    None
}

/// With scripting enabled the parser keeps `<noscript>` content as raw text.
fn noscript_markup(noscript: NodeRef<'_, Node>) -> String {
    let all_text = noscript.children().all(|c| c.value().is_text());
    if all_text {
        noscript
            .children()
            .filter_map(|c| c.value().as_text().map(|t| t.to_string()))
            .collect()
    } else {
        ElementRef::wrap(noscript)
            .map(|el| el.inner_html())
            .unwrap_or_default()
    }
}

fn sorted_attrs(element: ElementRef<'_>, skip: &[&str]) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = element
        .value()
        .attrs()
        .filter(|(name, _)| !skip.contains(name))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    attrs.sort();
    attrs
}

fn rewritten_attrs(
    element: ElementRef<'_>,
    name: &str,
    value: Option<String>,
) -> Vec<(String, String)> {
    let mut attrs = sorted_attrs(element, &[]);
    if let Some(value) = value {
        replace_attr(&mut attrs, name, value);
    }
    attrs
}

fn replace_attr(attrs: &mut [(String, String)], name: &str, value: String) {
    if let Some(slot) = attrs.iter_mut().find(|(n, _)| n == name) {
        slot.1 = value;
    }
}

fn wrap_document(title: &str, base: &Url, body: &str) -> String {
    let mut title_text = String::new();
    escape_text_into(title, &mut title_text);
    let mut base_attr = String::new();
    escape_attr_into(base.as_str(), &mut base_attr);
    let mut source_text = String::new();
    escape_text_into(base.as_str(), &mut source_text);

    let mut html = String::with_capacity(body.len() + PRINT_CSS.len() + 512);
    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    html.push_str(&format!("<base href=\"{base_attr}\">"));
    html.push_str(&format!("<title>{title_text}</title>"));
    html.push_str(&format!("<style>\n{PRINT_CSS}\n</style></head>\n"));
    html.push_str("<body><article>");
    html.push_str(&format!("<h1>{title_text}</h1>"));
    html.push_str(&format!(
        "<p class=\"source\"><a href=\"{base_attr}\">{source_text}</a></p>\n"
    ));
    html.push_str(body);
    html.push_str("\n</article></body></html>\n");
    html
}

fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr_into(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
