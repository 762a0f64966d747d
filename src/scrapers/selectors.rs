//! Per-domain content selector table.
//!
//! Maps a site's domain to the ordered list of CSS selectors that locate its
//! article body. Unknown domains use [`GENERIC_SELECTORS`]. Selectors are
//! compiled when they are registered, so a bad selector is a configuration
//! error raised at startup rather than a per-article failure.

use crate::error::ConfigError;
use scraper::Selector;
use url::Url;

/// Built-in site table, checked after any runtime registrations.
pub const BUILTIN_SITE_SELECTORS: &[(&str, &[&str])] = &[
    ("aitimes.com", &[".article-content", ".news-content", "article"]),
    ("techcrunch.com", &[".entry-content", ".article-content"]),
    ("zdnet.co.kr", &[".view_con", ".article_view", ".news-content"]),
    ("chosun.com", &[".news_text", ".article_view", ".news-content"]),
    ("dt.co.kr", &[".article-content", ".view-con", ".news-content"]),
    ("etnews.com", &[".article_txt", ".news-content", ".article-content"]),
    ("hankyung.com", &[".article-content", ".news-content"]),
    ("mk.co.kr", &[".news_detail_text", ".article-content"]),
];

/// Used when no site entry matches.
pub const GENERIC_SELECTORS: &[&str] = &[
    "article",
    ".article-content",
    ".news-content",
    ".post-content",
    ".entry-content",
    "#content",
    ".article-body",
    ".news-body",
    ".content",
    ".main-content",
    ".article",
    ".post",
];

/// Sub-elements stripped from a content container before its text is read.
pub const NOISE_SELECTOR: &str = "script, style, noscript, nav, header, footer, aside, \
     .advertisement, .ad, .ads, .social-share, .related-articles, .comment, \
     .navigation, .breadcrumb, .tag, .share, .print";

/// A compiled selector that remembers its source text for logging.
#[derive(Debug, Clone)]
pub struct ContentSelector {
    pub css: String,
    pub selector: Selector,
}

impl ContentSelector {
    pub fn parse(css: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(css).map_err(|e| ConfigError::Selector {
            selector: css.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }
}

#[derive(Debug, Clone)]
struct SiteEntry {
    domain: String,
    selectors: Vec<ContentSelector>,
}

/// Ordered domain → selectors table.
#[derive(Debug, Clone)]
pub struct SelectorTable {
    /// Runtime registrations, newest first, then built-ins.
    sites: Vec<SiteEntry>,
    generic: Vec<ContentSelector>,
}

impl SelectorTable {
    /// Table holding only the built-in sites and the generic list.
    pub fn with_builtin() -> Result<Self, ConfigError> {
        let sites = BUILTIN_SITE_SELECTORS
            .iter()
            .map(|(domain, css)| {
                Ok(SiteEntry {
                    domain: domain.to_string(),
                    selectors: compile_all(css.iter().copied())?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self {
            sites,
            generic: compile_all(GENERIC_SELECTORS.iter().copied())?,
        })
    }

    /// Add or replace the selectors for `domain`.
    ///
    /// Registered entries take precedence over built-in ones.
    pub fn register<S: AsRef<str>>(&mut self, domain: &str, selectors: &[S]) -> Result<(), ConfigError> {
        let domain = canonical_domain(domain);
        if domain.is_empty() {
            return Err(ConfigError::Invalid("selector table domain is empty".into()));
        }
        let selectors = compile_all(selectors.iter().map(|s| s.as_ref()))?;
        if selectors.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "no selectors given for domain {domain}"
            )));
        }
        self.sites.retain(|s| s.domain != domain);
        self.sites.insert(0, SiteEntry { domain, selectors });
        Ok(())
    }

    /// The selectors to try, in order, for a page at `url`.
    pub fn selectors_for(&self, url: &Url) -> &[ContentSelector] {
        let Some(host) = url.host_str() else {
            return &self.generic;
        };
        let host = canonical_domain(host);
        self.sites
            .iter()
            .find(|site| domain_matches(&host, &site.domain))
            .map(|site| site.selectors.as_slice())
            .unwrap_or(self.generic.as_slice())
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(|s| s.domain.as_str())
    }
}

fn compile_all<'a>(css: impl Iterator<Item = &'a str>) -> Result<Vec<ContentSelector>, ConfigError> {
    css.map(ContentSelector::parse).collect()
}

fn canonical_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

/// `news.example.com` matches `example.com`; `badexample.com` does not.
fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn css(selectors: &[ContentSelector]) -> Vec<&str> {
        selectors.iter().map(|s| s.css.as_str()).collect()
    }

    #[test]
    fn test_builtin_domain_lookup() {
        let table = SelectorTable::with_builtin().unwrap();
        let url = Url::parse("https://www.techcrunch.com/2025/01/01/story").unwrap();
        assert_eq!(css(table.selectors_for(&url)), vec![".entry-content", ".article-content"]);
    }

    #[test]
    fn test_subdomain_matches_registrable_domain() {
        let table = SelectorTable::with_builtin().unwrap();
        let url = Url::parse("https://biz.chosun.com/it/123").unwrap();
        assert_eq!(css(table.selectors_for(&url))[0], ".news_text");
    }

    #[test]
    fn test_lookalike_domain_uses_generic() {
        let table = SelectorTable::with_builtin().unwrap();
        let url = Url::parse("https://notchosun.com/a").unwrap();
        assert_eq!(css(table.selectors_for(&url)), GENERIC_SELECTORS.to_vec());
    }

    #[test]
    fn test_unknown_domain_uses_generic() {
        let table = SelectorTable::with_builtin().unwrap();
        let url = Url::parse("https://example.com/a").unwrap();
        assert_eq!(css(table.selectors_for(&url))[0], "article");
    }

    #[test]
    fn test_register_overrides_builtin() {
        let mut table = SelectorTable::with_builtin().unwrap();
        table.register("WWW.TechCrunch.com", &[".story-body"]).unwrap();
        let url = Url::parse("https://techcrunch.com/x").unwrap();
        assert_eq!(css(table.selectors_for(&url)), vec![".story-body"]);
        assert_eq!(table.domains().filter(|d| *d == "techcrunch.com").count(), 1);
    }

    #[test]
    fn test_register_rejects_invalid_selector() {
        let mut table = SelectorTable::with_builtin().unwrap();
        let err = table.register("example.com", &["div[["]).unwrap_err();
        assert!(matches!(err, ConfigError::Selector { .. }));
    }

    #[test]
    fn test_noise_selector_compiles() {
        assert!(ContentSelector::parse(NOISE_SELECTOR).is_ok());
    }
}
