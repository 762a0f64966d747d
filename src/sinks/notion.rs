//! Notion database pages.
//!
//! Publishing is three calls against the REST API:
//! 1. read the database schema to see which optional properties exist
//! 2. create the page with its title and those properties
//! 3. append the rendered report blocks, at most 100 per request

use super::{DocumentSink, ensure_success, transport_error};
use crate::error::SinkError;
use crate::models::BatchSummary;
use crate::outputs::{Stamp, published_label, report_title};
use crate::summarizer::lead_summary;
use chrono::FixedOffset;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

pub const NOTION_API: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";
/// Notion rejects larger child lists in one request.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

const SERVICE: &str = "notion";
const NO_CONTENT: &str = "기사 내용을 확인할 수 없습니다.";

#[derive(Debug, Deserialize)]
struct Database {
    #[serde(default)]
    properties: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Page {
    id: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Clone)]
pub struct NotionPublisher {
    client: Client,
    api_base: String,
    api_key: String,
    database_id: String,
    title_prefix: String,
    offset: FixedOffset,
}

impl NotionPublisher {
    pub fn new(
        client: Client,
        api_key: &str,
        database_id: &str,
        title_prefix: &str,
        offset: FixedOffset,
    ) -> Self {
        Self {
            client,
            api_base: NOTION_API.to_string(),
            api_key: api_key.to_string(),
            database_id: database_id.to_string(),
            title_prefix: title_prefix.to_string(),
            offset,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.api_base, path))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Property names of the target database. Empty when the schema cannot be read.
    async fn database_properties(&self) -> HashSet<String> {
        let path = format!("databases/{}", self.database_id);
        let result: Result<Database, SinkError> = async {
            let response = self
                .request(reqwest::Method::GET, &path)
                .send()
                .await
                .map_err(|e| transport_error(SERVICE, e))?;
            let response = ensure_success(SERVICE, response).await?;
            response
                .json::<Database>()
                .await
                .map_err(|e| transport_error(SERVICE, e))
        }
        .await;

        match result {
            Ok(db) => db.properties.into_keys().collect(),
            Err(e) => {
                warn!(error = %e, "Cannot read database schema; optional properties skipped");
                HashSet::new()
            }
        }
    }

    async fn append_blocks(&self, page_id: &str, blocks: &[Value]) {
        let path = format!("blocks/{page_id}/children");
        for (i, chunk) in blocks.chunks(MAX_BLOCKS_PER_REQUEST).enumerate() {
            let first = i * MAX_BLOCKS_PER_REQUEST + 1;
            let last = first + chunk.len() - 1;
            let sent = self
                .request(reqwest::Method::PATCH, &path)
                .json(&json!({ "children": chunk }))
                .send()
                .await
                .map_err(|e| transport_error(SERVICE, e));
            let outcome = match sent {
                Ok(response) => ensure_success(SERVICE, response).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => info!(first, last, "Appended blocks"),
                Err(e) => warn!(first, last, error = %e, "Failed to append blocks"),
            }
        }
    }
}

impl DocumentSink for NotionPublisher {
    #[instrument(level = "info", skip_all, fields(articles = summary.total_articles))]
    async fn publish(&self, summary: &BatchSummary) -> Result<String, SinkError> {
        let stamp = Stamp::of(summary, self.offset);
        let available = self.database_properties().await;
        let page_body = json!({
            "parent": { "database_id": self.database_id },
            "properties": page_properties(
                &report_title(&self.title_prefix, &stamp),
                &stamp.date,
                summary.total_articles,
                &available,
            ),
        });

        let response = self
            .request(reqwest::Method::POST, "pages")
            .json(&page_body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let page: Page = ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        info!(page_id = %page.id, url = %page.url, "Created page");

        let blocks = render_blocks(summary, &stamp, self.offset);
        self.append_blocks(&page.id, &blocks).await;
        Ok(page.url)
    }
}

/// Page properties: the title always, `Date`/`Articles`/`Category` only when
/// the database defines them.
pub fn page_properties(
    title: &str,
    date: &str,
    total_articles: usize,
    available: &HashSet<String>,
) -> Value {
    let mut props = json!({
        "title": { "title": [ { "type": "text", "text": { "content": title } } ] }
    });
    if available.contains("Date") {
        props["Date"] = json!({ "date": { "start": date } });
    }
    if available.contains("Articles") {
        props["Articles"] = json!({ "number": total_articles });
    }
    if available.contains("Category") {
        props["Category"] = json!({ "select": { "name": "AI 뉴스" } });
    }
    props
}

fn text(content: &str) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

fn styled(content: &str, annotations: Value) -> Value {
    json!({ "type": "text", "text": { "content": content }, "annotations": annotations })
}

fn block(kind: &str, rich_text: Vec<Value>) -> Value {
    json!({ "object": "block", "type": kind, kind: { "rich_text": rich_text } })
}

fn divider() -> Value {
    json!({ "object": "block", "type": "divider", "divider": {} })
}

/// The report body as Notion blocks.
pub fn render_blocks(summary: &BatchSummary, stamp: &Stamp, offset: FixedOffset) -> Vec<Value> {
    let mut blocks = vec![block(
        "heading_1",
        vec![text(&format!("📰 주요 AI 뉴스 ({}개)", summary.total_articles))],
    )];

    let count = summary.articles.len();
    for (i, article) in summary.articles.iter().enumerate() {
        let source = &article.stub.source;
        blocks.push(block(
            "heading_3",
            vec![text(&format!("{}. \"{}\" - {}", i + 1, article.stub.title, source))],
        ));
        blocks.push(block(
            "paragraph",
            vec![text(&format!(
                "📍 {} | ⏰ {} | 🏷️ {}",
                source,
                published_label(article, offset),
                article.category
            ))],
        ));

        let lead = lead_summary(article.content())
            .or_else(|| (!article.summary.is_empty()).then(|| article.summary.clone()))
            .unwrap_or_else(|| NO_CONTENT.to_string());
        blocks.push(block(
            "paragraph",
            vec![styled("💡 ", json!({ "bold": true })), text(&lead)],
        ));

        blocks.push(json!({
            "object": "block",
            "type": "bookmark",
            "bookmark": { "url": article.stub.link.as_str() }
        }));

        if !article.keywords().is_empty() {
            let tags: Vec<String> = article.keywords().iter().map(|k| format!("#{k}")).collect();
            blocks.push(block(
                "paragraph",
                vec![styled(&format!("🏷️ {}", tags.join(" ")), json!({ "color": "blue" }))],
            ));
        }
        if i + 1 < count {
            blocks.push(divider());
        }
    }

    blocks.push(block("heading_2", vec![text("🏷️ 주요 키워드")]));
    let tags: Vec<String> = summary.top_keywords.iter().map(|k| format!("#{k}")).collect();
    blocks.push(block(
        "paragraph",
        vec![styled(&tags.join(" "), json!({ "bold": true, "color": "blue" }))],
    ));

    blocks.push(block("heading_2", vec![text("📊 수집 정보")]));
    let info = format!(
        "• 수집 시간: {}\n• 총 기사 수: {}개\n• 언론사 수: {}곳\n• 발견된 키워드: {}개\n• 크롤링 성공률: {:.1}%",
        stamp.full,
        summary.total_articles,
        summary.total_sources,
        summary.keywords_found_count,
        summary.stats.success_rate()
    );
    blocks.push(block("paragraph", vec![text(&info)]));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatchStats;
    use crate::outputs::fixtures;
    use crate::report::summarize;
    use crate::schedule::offset_hours;
    use chrono::Utc;

    fn kinds(blocks: &[Value]) -> Vec<&str> {
        blocks.iter().map(|b| b["type"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_properties_follow_schema() {
        let none = page_properties("T", "2025-03-02", 4, &HashSet::new());
        assert_eq!(none["title"]["title"][0]["text"]["content"], "T");
        assert!(none.get("Date").is_none());

        let all: HashSet<String> = ["Date", "Articles", "Category"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let props = page_properties("T", "2025-03-02", 4, &all);
        assert_eq!(props["Date"]["date"]["start"], "2025-03-02");
        assert_eq!(props["Articles"]["number"], 4);
        assert_eq!(props["Category"]["select"]["name"], "AI 뉴스");
    }

    #[test]
    fn test_block_layout() {
        let offset = offset_hours(9).unwrap();
        let summary = fixtures::summary();
        let stamp = Stamp::of(&summary, offset);
        let blocks = render_blocks(&summary, &stamp, offset);

        assert_eq!(
            kinds(&blocks),
            vec![
                "heading_1",
                "heading_3", "paragraph", "paragraph", "bookmark", "paragraph", "divider",
                "heading_3", "paragraph", "paragraph", "bookmark", "paragraph",
                "heading_2", "paragraph", "heading_2", "paragraph",
            ]
        );
        assert_eq!(
            blocks[1]["heading_3"]["rich_text"][0]["text"]["content"],
            "1. \"OpenAI & GPT news\" - Example"
        );
        assert_eq!(
            blocks[3]["paragraph"]["rich_text"][1]["text"]["content"],
            "Samsung unveiled a new AI chip for phones on Saturday."
        );
    }

    #[test]
    fn test_large_reports_need_several_requests() {
        let offset = offset_hours(9).unwrap();
        let articles = (0..30)
            .map(|i| fixtures::article(&format!("title {i}"), "s", None, &["AI"]))
            .collect();
        let summary = summarize(articles, BatchStats::default(), Utc::now());
        let stamp = Stamp::of(&summary, offset);
        let blocks = render_blocks(&summary, &stamp, offset);
        // Six blocks per article minus the last divider, plus five fixed blocks.
        assert_eq!(blocks.len(), 30 * 6 - 1 + 5);
        let chunks: Vec<usize> = blocks.chunks(MAX_BLOCKS_PER_REQUEST).map(|c| c.len()).collect();
        assert_eq!(chunks, vec![100, 84]);
    }
}
