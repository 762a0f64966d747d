//! Google News RSS search feed.
//!
//! Builds a search query from the first few query terms, downloads the RSS
//! document and turns its items into validated [`ArticleStub`]s. Items that
//! fail validation or do not mention any relevance term are skipped.

use crate::error::FeedError;
use crate::models::ArticleStub;
use crate::scrapers::PageFetcher;
use crate::scrapers::normalize::strip_markup;
use crate::utils::{take_chars, truncate_for_log};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Number of query terms OR-ed into the search.
pub const QUERY_TERMS: usize = 5;
/// Cap on the feed summary kept on each stub.
pub const RAW_SUMMARY_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(rename = "$text", default)]
    name: String,
}

/// Feed location and filtering settings.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub base_url: String,
    pub language: String,
    pub country: String,
    pub relevance_terms: Vec<String>,
    pub max_articles: usize,
}

/// The search feed, generic over how documents are fetched.
#[derive(Debug)]
pub struct GoogleNewsFeed<F> {
    fetcher: F,
    settings: FeedSettings,
}

impl<F: PageFetcher> GoogleNewsFeed<F> {
    pub fn new(fetcher: F, settings: FeedSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn search_url(&self, terms: &[String]) -> Result<Url, FeedError> {
        let s = &self.settings;
        let raw = format!(
            "{}?q={}&hl={}&gl={}&ceid={}:{}",
            s.base_url,
            urlencoding::encode(&build_query(terms)),
            s.language,
            s.country,
            s.country,
            s.language
        );
        Ok(Url::parse(&raw)?)
    }

    /// Fetch the feed and return at most `max_articles` relevant stubs, in feed order.
    #[instrument(level = "info", skip_all, fields(terms = terms.len()))]
    pub async fn collect(&self, terms: &[String]) -> Result<Vec<ArticleStub>, FeedError> {
        let url = self.search_url(terms)?;
        info!(%url, "Searching news feed");
        let body = self.fetcher.fetch(&url).await?;
        let stubs = self.parse(&body)?;
        info!(count = stubs.len(), "Collected article stubs");
        Ok(stubs)
    }

    /// Turn an RSS document into stubs.
    pub fn parse(&self, body: &str) -> Result<Vec<ArticleStub>, FeedError> {
        let rss: Rss = quick_xml::de::from_str(body)?;
        debug!(items = rss.channel.items.len(), "Parsed feed");

        let stubs = rss
            .channel
            .items
            .into_iter()
            .filter_map(item_to_stub)
            .filter(|stub| self.is_relevant(stub))
            .take(self.settings.max_articles)
            .collect();
        Ok(stubs)
    }

    fn is_relevant(&self, stub: &ArticleStub) -> bool {
        let text = format!("{} {}", stub.title, stub.raw_summary).to_lowercase();
        let relevant = self
            .settings
            .relevance_terms
            .iter()
            .any(|t| text.contains(&t.to_lowercase()));
        if !relevant {
            debug!(title = %truncate_for_log(&stub.title, 50), "Skipping unrelated item");
        }
        relevant
    }
}

/// `"t1" OR "t2" ... when:1d` from the first [`QUERY_TERMS`] terms.
pub fn build_query(terms: &[String]) -> String {
    let parts: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .take(QUERY_TERMS)
        .map(|t| format!("\"{t}\""))
        .collect();
    format!("{} when:1d", parts.join(" OR "))
}

fn item_to_stub(item: Item) -> Option<ArticleStub> {
    let title = item.title.unwrap_or_default();
    let link = original_link(item.link.as_deref().unwrap_or_default());
    let published_at = item
        .pub_date
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
        .map(|d| d.with_timezone(&Utc));
    let source = item.source.map(|s| s.name).unwrap_or_default();
    let summary = strip_markup(item.description.as_deref().unwrap_or_default());

    match ArticleStub::new(
        &title,
        &link,
        published_at,
        &source,
        take_chars(&summary, RAW_SUMMARY_CHARS),
    ) {
        Ok(stub) => Some(stub),
        Err(e) => {
            warn!(error = %e, title = %truncate_for_log(&title, 50), "Dropping feed item");
            None
        }
    }
}

/// Unwrap a `news.google.com` redirect carrying the target in a `url=` parameter.
pub fn original_link(link: &str) -> String {
    let link = link.trim();
    let Ok(parsed) = Url::parse(link) else {
        return link.to_string();
    };
    if !parsed
        .host_str()
        .is_some_and(|h| h.ends_with("news.google.com"))
    {
        return link.to_string();
    }
    parsed
        .query_pairs()
        .find(|(k, _)| k == "url")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::cell::RefCell;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <generator>NFE/5.0</generator>
    <title>"AI" when:1d - Google 뉴스</title>
    <link>https://news.google.com/search?q=AI</link>
    <language>ko</language>
    <item>
      <title>삼성전자, 새로운 AI 반도체 공개 - 전자신문</title>
      <link>https://news.google.com/rss/articles/abc?url=https%3A%2F%2Fwww.etnews.com%2F2025030100001&amp;oc=5</link>
      <guid isPermaLink="false">abc</guid>
      <pubDate>Sat, 01 Mar 2025 07:00:00 GMT</pubDate>
      <description>&lt;a href="https://www.etnews.com/1"&gt;삼성전자, 새로운 AI 반도체 공개&lt;/a&gt;&amp;nbsp;&amp;nbsp;&lt;font color="#6f6f6f"&gt;전자신문&lt;/font&gt;</description>
      <source url="https://www.etnews.com">전자신문</source>
    </item>
    <item>
      <title>Weather outlook for the weekend</title>
      <link>https://example.com/weather</link>
      <pubDate>Sat, 01 Mar 2025 06:00:00 GMT</pubDate>
      <description>Showers expected.</description>
    </item>
    <item>
      <title>   </title>
      <link>https://example.com/ai-blank</link>
      <description>AI</description>
    </item>
    <item>
      <title>OpenAI ships GPT update</title>
      <link>https://example.com/gpt</link>
      <pubDate>not a date</pubDate>
      <description>ChatGPT gets faster</description>
    </item>
  </channel>
</rss>"##;

    struct CannedFeed {
        body: String,
        requested: RefCell<Vec<String>>,
    }

    impl PageFetcher for CannedFeed {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            self.requested.borrow_mut().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    fn settings(max_articles: usize) -> FeedSettings {
        FeedSettings {
            base_url: "https://news.google.com/rss/search".to_string(),
            language: "ko".to_string(),
            country: "KR".to_string(),
            relevance_terms: vec!["ai".into(), "인공지능".into(), "gpt".into()],
            max_articles,
        }
    }

    fn feed(body: &str, max_articles: usize) -> GoogleNewsFeed<CannedFeed> {
        GoogleNewsFeed::new(
            CannedFeed {
                body: body.to_string(),
                requested: RefCell::new(Vec::new()),
            },
            settings(max_articles),
        )
    }

    fn terms(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_query_uses_first_five_terms() {
        let q = build_query(&terms(&[
            "인공지능", "AI", "", "생성형AI", "ChatGPT", "LLM", "머신러닝",
        ]));
        assert_eq!(
            q,
            r#""인공지능" OR "AI" OR "생성형AI" OR "ChatGPT" OR "LLM" when:1d"#
        );
    }

    #[test]
    fn test_search_url_is_encoded() {
        let url = feed("", 5).search_url(&terms(&["AI"])).unwrap();
        assert_eq!(
            url.as_str(),
            "https://news.google.com/rss/search?q=%22AI%22%20when%3A1d&hl=ko&gl=KR&ceid=KR:ko"
        );
    }

    #[test]
    fn test_original_link_unwraps_google_redirect() {
        assert_eq!(
            original_link("https://news.google.com/articles/x?url=https%3A%2F%2Fexample.com%2Fa&oc=5"),
            "https://example.com/a"
        );
        assert_eq!(
            original_link("https://news.google.com/rss/articles/CBMi?oc=5"),
            "https://news.google.com/rss/articles/CBMi?oc=5"
        );
        assert_eq!(
            original_link("https://example.com/?url=https://other.com"),
            "https://example.com/?url=https://other.com"
        );
    }

    #[tokio::test]
    async fn test_collect_filters_and_converts_items() {
        let feed = feed(SAMPLE, 5);
        let stubs = feed.collect(&terms(&["AI"])).await.unwrap();

        assert_eq!(feed.fetcher.requested.borrow().len(), 1);
        assert_eq!(stubs.len(), 2);

        let first = &stubs[0];
        assert_eq!(first.title, "삼성전자, 새로운 AI 반도체 공개 - 전자신문");
        assert_eq!(first.link.as_str(), "https://www.etnews.com/2025030100001");
        assert_eq!(first.source, "전자신문");
        assert_eq!(first.raw_summary, "삼성전자, 새로운 AI 반도체 공개 전자신문");
        assert_eq!(
            first.published_at.map(|d| d.to_rfc3339()),
            Some("2025-03-01T07:00:00+00:00".to_string())
        );

        let second = &stubs[1];
        assert_eq!(second.title, "OpenAI ships GPT update");
        assert_eq!(second.published_at, None);
        assert_eq!(second.source, "Unknown");
    }

    #[tokio::test]
    async fn test_collect_respects_max_articles() {
        let stubs = feed(SAMPLE, 1).collect(&terms(&["AI"])).await.unwrap();
        assert_eq!(stubs.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_channel_is_ok() {
        let body = r#"<rss version="2.0"><channel><title>t</title></channel></rss>"#;
        let stubs = feed(body, 5).collect(&terms(&["AI"])).await.unwrap();
        assert!(stubs.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_feed_is_an_error() {
        let err = feed("<html>not rss", 5).collect(&terms(&["AI"])).await.unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }
}
