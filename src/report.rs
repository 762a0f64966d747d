//! Folds a finished batch into a [`BatchSummary`].

use crate::models::{BatchStats, BatchSummary, DateRange, EnrichedArticle};
use crate::summarizer::count_overview;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::collections::HashMap;
use tracing::info;

/// Number of keywords kept in the batch ranking.
pub const TOP_KEYWORDS: usize = 10;

/// Substituted when no article carries a keyword, so the report is never empty.
pub const DEFAULT_TOP_KEYWORDS: [&str; 5] = ["인공지능", "AI", "기술", "뉴스", "혁신"];

/// Build the batch summary. Articles end up ordered most recent first;
/// undated articles go last, keeping their relative order.
pub fn summarize(
    mut articles: Vec<EnrichedArticle>,
    stats: BatchStats,
    generated_at: DateTime<Utc>,
) -> BatchSummary {
    let keywords_found_count = articles.iter().flat_map(|a| a.keywords()).unique().count();
    let mut top_keywords = rank_keywords(&articles, TOP_KEYWORDS);
    if top_keywords.is_empty() {
        top_keywords = DEFAULT_TOP_KEYWORDS.iter().map(|s| s.to_string()).collect();
    }

    let distinct_sources: Vec<String> = articles
        .iter()
        .map(|a| a.stub.source.clone())
        .unique()
        .collect();

    let avg_content_length = if articles.is_empty() {
        0
    } else {
        articles.iter().map(|a| a.content_length()).sum::<usize>() / articles.len()
    };

    // Stable: equal timestamps keep their input order.
    articles.sort_by(|a, b| b.stub.published_at.cmp(&a.stub.published_at));

    let date_range = articles
        .iter()
        .filter_map(|a| a.stub.published_at)
        .minmax()
        .into_option()
        .map(|(earliest, latest)| DateRange { earliest, latest });

    info!(
        articles = articles.len(),
        sources = distinct_sources.len(),
        keywords = keywords_found_count,
        avg_content_length,
        "Built batch summary"
    );

    BatchSummary {
        generated_at,
        overview: count_overview(articles.len()),
        top_keywords,
        total_articles: articles.len(),
        total_sources: distinct_sources.len(),
        distinct_sources,
        keywords_found_count,
        avg_content_length,
        date_range,
        stats,
        articles,
    }
}

/// Keywords across all articles by descending count; ties keep first-seen order.
pub fn rank_keywords(articles: &[EnrichedArticle], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for keyword in articles.iter().flat_map(|a| a.keywords()) {
        let count = counts.entry(keyword.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(keyword.as_str());
        }
        *count += 1;
    }

    first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));
    first_seen
        .into_iter()
        .take(limit)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleStub, CrawlStatus};
    use chrono::TimeZone;

    fn article(
        title: &str,
        source: &str,
        published_at: Option<DateTime<Utc>>,
        content: &str,
        keywords: &[&str],
    ) -> EnrichedArticle {
        let stub = ArticleStub::new(title, "https://example.com/a", published_at, source, "")
            .unwrap();
        let mut a = EnrichedArticle::new(
            stub,
            content.to_string(),
            vec![],
            CrawlStatus::Success,
            Utc::now(),
        );
        a.set_tags(
            keywords.iter().map(|s| s.to_string()).collect(),
            "AI 뉴스".to_string(),
        );
        a
    }

    fn at(hour: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap())
    }

    #[test]
    fn test_rank_ties_keep_first_seen_order() {
        let mut articles = Vec::new();
        // AI and GPT five times each (AI seen first), 인공지능 three times.
        for i in 0..5 {
            let mut kws = vec!["AI", "GPT"];
            if i < 3 {
                kws.insert(0, "인공지능");
            }
            articles.push(article("t", "s", None, "", &kws));
        }
        let ranked = rank_keywords(&articles, TOP_KEYWORDS);
        // 인공지능 is seen first but has a lower count.
        assert_eq!(ranked, vec!["AI", "GPT", "인공지능"]);
    }

    #[test]
    fn test_rank_is_capped() {
        let kws: Vec<String> = (0..12).map(|i| format!("k{i}")).collect();
        let articles: Vec<_> = kws
            .chunks(4)
            .map(|c| {
                let refs: Vec<&str> = c.iter().map(String::as_str).collect();
                article("t", "s", None, "", &refs)
            })
            .collect();
        let ranked = rank_keywords(&articles, TOP_KEYWORDS);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0], "k0");
    }

    #[test]
    fn test_default_keywords_when_none_found() {
        let summary = summarize(
            vec![article("t", "s", None, "abc", &[])],
            BatchStats::default(),
            Utc::now(),
        );
        assert_eq!(summary.top_keywords, DEFAULT_TOP_KEYWORDS);
        assert_eq!(summary.keywords_found_count, 0);
    }

    #[test]
    fn test_totals_and_recency_order() {
        let articles = vec![
            article("old", "A", at(1), "abcd", &["AI"]),
            article("undated", "B", None, "ab", &[]),
            article("new", "A", at(9), "abcdefg", &["AI", "GPT"]),
        ];
        let summary = summarize(articles, BatchStats::default(), Utc::now());

        let titles: Vec<_> = summary.articles.iter().map(|a| a.stub.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "undated"]);
        assert_eq!(summary.total_articles, 3);
        assert_eq!(summary.distinct_sources, vec!["A", "B"]);
        assert_eq!(summary.total_sources, 2);
        // (4 + 2 + 7) / 3 floored
        assert_eq!(summary.avg_content_length, 4);
        assert_eq!(summary.keywords_found_count, 2);
        assert_eq!(summary.top_keywords, vec!["AI", "GPT"]);
        assert_eq!(
            summary.date_range,
            Some(DateRange {
                earliest: at(1).unwrap(),
                latest: at(9).unwrap()
            })
        );
    }

    #[test]
    fn test_found_keywords_are_counted_once() {
        let articles = vec![
            article("a", "s", None, "x", &["AI", "GPT"]),
            article("b", "s", None, "x", &["AI"]),
            article("c", "s", None, "x", &["AI"]),
        ];
        let summary = summarize(articles, BatchStats::default(), Utc::now());
        assert_eq!(summary.keywords_found_count, 2);
    }

    #[test]
    fn test_empty_batch_is_well_formed() {
        let summary = summarize(Vec::new(), BatchStats::default(), Utc::now());
        assert_eq!(summary.total_articles, 0);
        assert_eq!(summary.avg_content_length, 0);
        assert!(summary.date_range.is_none());
        assert_eq!(summary.top_keywords.len(), DEFAULT_TOP_KEYWORDS.len());
    }
}
