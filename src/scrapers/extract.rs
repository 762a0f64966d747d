//! Selector-cascade content extraction.
//!
//! Strategy, in order:
//! 1. Each selector for the page's domain: first matching element, noise
//!    removed, normalized. The first one longer than the minimum wins.
//! 2. All `<p>` elements joined with single spaces.
//! 3. The first characters of the body's visible text.
//!
//! Extraction is a pure function of `(markup, url)`.

use super::images::harvest_images;
use super::normalize::normalize_text;
use super::selectors::{ContentSelector, NOISE_SELECTOR, SelectorTable};
use crate::error::ConfigError;
use crate::models::ImageRef;
use crate::utils::take_chars;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static SCRIPT_STYLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script, style, noscript, template").unwrap());

/// Default minimum length, in characters, a selector's text must exceed.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 200;
/// Default cap on the body-text last resort.
pub const DEFAULT_BODY_FALLBACK_CHARS: usize = 1000;

/// Which step of the cascade produced the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// A content selector cleared the threshold.
    Selector(String),
    /// Paragraph aggregation.
    Paragraphs,
    /// Truncated body text.
    BodyText,
    /// Nothing usable on the page.
    Empty,
}

impl ExtractionStrategy {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ExtractionStrategy::Paragraphs)
    }
}

/// Result of extracting one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub content: String,
    pub images: Vec<ImageRef>,
    pub strategy: ExtractionStrategy,
}

/// Locates the main article text of a page.
#[derive(Debug, Clone)]
pub struct Extractor {
    table: SelectorTable,
    noise: Selector,
    min_content_chars: usize,
    body_fallback_chars: usize,
}

impl Extractor {
    pub fn new(
        table: SelectorTable,
        min_content_chars: usize,
        body_fallback_chars: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            table,
            noise: ContentSelector::parse(NOISE_SELECTOR)?.selector,
            min_content_chars,
            body_fallback_chars,
        })
    }

    /// Extract content and images from `markup` fetched from `url`.
    pub fn extract(&self, markup: &str, url: &Url) -> Extraction {
        let document = Html::parse_document(markup);
        let (content, strategy) = self.extract_content(&document, url);
        let images = harvest_images(&document, url);
        debug!(
            %url,
            ?strategy,
            chars = content.chars().count(),
            images = images.len(),
            "Extracted page"
        );
        Extraction {
            content,
            images,
            strategy,
        }
    }

    fn extract_content(&self, document: &Html, url: &Url) -> (String, ExtractionStrategy) {
        for candidate in self.table.selectors_for(url) {
            let Some(element) = document.select(&candidate.selector).next() else {
                continue;
            };
            let noise: Vec<ElementRef<'_>> = element.select(&self.noise).collect();
            let text = normalize_text(&visible_text(element, &noise));
            if text.chars().count() > self.min_content_chars {
                return (text, ExtractionStrategy::Selector(candidate.css.clone()));
            }
        }

        let paragraphs: Vec<String> = document
            .select(&PARAGRAPH)
            .map(|p| normalize_text(&p.text().collect::<Vec<_>>().join(" ")))
            .filter(|t| !t.is_empty())
            .collect();
        if document.select(&PARAGRAPH).next().is_some() {
            return (
                normalize_text(&paragraphs.join(" ")),
                ExtractionStrategy::Paragraphs,
            );
        }

        if let Some(body) = document.select(&BODY).next() {
            let noise: Vec<ElementRef<'_>> = body.select(&SCRIPT_STYLE).collect();
            let text = normalize_text(&visible_text(body, &noise));
            let text = take_chars(&text, self.body_fallback_chars).trim_end().to_string();
            if !text.is_empty() {
                return (text, ExtractionStrategy::BodyText);
            }
        }

        (String::new(), ExtractionStrategy::Empty)
    }
}

/// Text under `element`, skipping the subtrees rooted at `noise`.
fn visible_text<'a>(element: ElementRef<'a>, noise: &[ElementRef<'a>]) -> String {
    let mut out = String::new();
    collect_text(element, noise, &mut out);
    out
}

fn collect_text<'a>(element: ElementRef<'a>, noise: &[ElementRef<'a>], out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !noise.contains(&child_el) {
                collect_text(child_el, noise, out);
            }
        }
    }
}
