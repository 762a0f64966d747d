//! Image harvesting from article pages.

use crate::models::{ImageRef, MAX_IMAGES};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];
const EXCLUDED_KEYWORDS: &[&str] = &["icon", "logo", "avatar", "thumbnail", "1x1", "pixel"];

/// Collect up to [`MAX_IMAGES`] images from `document`, in document order.
///
/// `src` is preferred over the lazy-load `data-src`; relative URLs resolve
/// against `base`.
pub fn harvest_images(document: &Html, base: &Url) -> Vec<ImageRef> {
    document
        .select(&IMG_SELECTOR)
        .filter_map(|img| {
            let el = img.value();
            let src = el
                .attr("src")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| el.attr("data-src"))?
                .trim();
            let url = base.join(src).ok()?;
            if !matches!(url.scheme(), "http" | "https") || !is_content_image(url.as_str()) {
                return None;
            }
            Some(ImageRef {
                url: url.to_string(),
                alt_text: el.attr("alt").unwrap_or_default().trim().to_string(),
                title_text: el.attr("title").unwrap_or_default().trim().to_string(),
            })
        })
        .take(MAX_IMAGES)
        .collect()
}

/// A URL naming a known image extension is always kept; otherwise it is
/// dropped when it looks like an icon, logo or tracking pixel.
fn is_content_image(url: &str) -> bool {
    let lower = url.to_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
        return true;
    }
    !EXCLUDED_KEYWORDS.iter().any(|kw| lower.contains(kw))
}
