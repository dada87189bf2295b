use scraper::{ElementRef, Html, Selector};

use crate::render::DomSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub content_html: String,
}

impl ExtractedContent {
    /// True when the markup holds no visible text and no media.
    pub fn is_blank(&self) -> bool {
        if self.content_html.trim().is_empty() {
            return true;
        }
        let fragment = Html::parse_fragment(&self.content_html);
        let has_media = Selector::parse("img, picture, svg, video")
            .ok()
            .is_some_and(|sel| fragment.select(&sel).next().is_some());
        if has_media {
            return false;
        }
        !visible_text(fragment.root_element())
            .chars()
            .any(|c| !c.is_whitespace())
    }
}

pub trait Extractor: Send + Sync {
    /// Returns `None` when the page has nothing that looks like an article.
    fn extract(&self, snapshot: &DomSnapshot) -> Option<ExtractedContent>;
}

const POSITIVE_HINTS: &[&str] = &["article", "content", "entry", "main", "post", "story", "text"];
const NEGATIVE_HINTS: &[&str] = &[
    "comment", "footer", "header", "menu", "nav", "share", "sidebar", "social", "sponsor", "widget",
];

/// Lightweight "readability-like" extractor:
/// - title from `og:title`, then `<title>`, then the first `<h1>`
/// - content from `<article>`, then `<main>`, then the best scoring block
/// - falls back to `<body>`
#[derive(Debug, Default)]
pub struct ReadabilityLikeExtractor;

impl Extractor for ReadabilityLikeExtractor {
    fn extract(&self, snapshot: &DomSnapshot) -> Option<ExtractedContent> {
        let doc = Html::parse_document(&snapshot.html);

        let title = meta_content(&doc, r#"meta[property="og:title"]"#)
            .or_else(|| first_text(&doc, "title"))
            .or_else(|| first_text(&doc, "h1"));

        let root = first_element(&doc, "article")
            .or_else(|| first_element(&doc, "main"))
            .or_else(|| best_scored_block(&doc))
            .or_else(|| first_element(&doc, "body"))?;

        let content = ExtractedContent {
            title,
            content_html: root.inner_html(),
        };
        if content.is_blank() {
            None
        } else {
            Some(content)
        }
    }
}

fn first_element<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next()
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    first_element(doc, selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    first_element(doc, selector)
        .and_then(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| matches!(el.name(), "script" | "style" | "template"))
            });
            if !hidden {
                out.push_str(text);
            }
        }
    }
    out
}

fn best_scored_block(doc: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("section, div").ok()?;
    let mut best: Option<(i64, ElementRef<'_>)> = None;
    for el in doc.select(&selector) {
        let score = score_block(el);
        if score <= 0 {
            continue;
        }
        match &best {
            Some((best_score, _)) if score <= *best_score => {}
            _ => best = Some((score, el)),
        }
    }
    best.map(|(_, el)| el)
}

fn score_block(el: ElementRef<'_>) -> i64 {
    let hints = [el.value().attr("id"), el.value().attr("class")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    let positive = POSITIVE_HINTS.iter().any(|h| hints.contains(h));
    let negative = NEGATIVE_HINTS.iter().any(|h| hints.contains(h));
    if negative && !positive {
        return 0;
    }

    // Only direct paragraphs count, so wrappers do not outscore the block
    // that actually holds the text.
    let paragraphs: i64 = el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "p")
        .map(|p| p.text().map(str::len).sum::<usize>())
        .filter(|len| *len >= 25)
        .map(|len| len as i64)
        .sum();
    if paragraphs == 0 {
        return 0;
    }
    let bonus = if positive { 500 } else { 0 };
    paragraphs + bonus
}
