//! Chat messages in Telegram's HTML parse mode.
//!
//! All article-derived text is escaped; only the fixed `<b>` markup is raw.

use super::{Stamp, published_label};
use crate::models::BatchSummary;
use crate::utils::{ellipsize, escape_html};
use chrono::{DateTime, FixedOffset};
use std::fmt::Write;

/// Keyword tags shown in a digest.
pub const DIGEST_TAGS: usize = 10;
/// Titles longer than this are cut.
pub const DIGEST_TITLE_CHARS: usize = 80;

/// The post-run digest, linking the published report when there is one.
pub fn digest_html(
    summary: &BatchSummary,
    report_url: Option<&str>,
    stamp: &Stamp,
    offset: FixedOffset,
    top_articles: usize,
) -> String {
    let mut msg = String::new();
    let _ = writeln!(msg, "📰 <b>AI 뉴스 브리핑</b>\n");
    let _ = writeln!(msg, "💬 {}\n", escape_html(&summary.overview));
    if let Some(url) = report_url {
        let _ = writeln!(msg, "🔗 <b>전체 리포트:</b>\n{}\n", escape_html(url));
    }

    let _ = writeln!(msg, "📊 <b>수집 결과:</b>");
    let _ = writeln!(msg, "• 기사 수: {}개", summary.total_articles);
    let _ = writeln!(msg, "• 언론사: {}곳", summary.total_sources);
    let _ = writeln!(msg, "• 수집 시간: {}\n", stamp.full);

    let tags: Vec<String> = summary
        .top_keywords
        .iter()
        .take(DIGEST_TAGS)
        .map(|k| format!("#{}", escape_html(&k.replace(' ', "_"))))
        .collect();
    let _ = writeln!(msg, "🏷️ <b>키워드:</b>\n{}\n", tags.join(" "));

    let _ = write!(msg, "📑 <b>주요 기사:</b>");
    for article in summary.articles.iter().take(top_articles) {
        let title = ellipsize(&article.stub.title, DIGEST_TITLE_CHARS);
        let source = escape_html(&article.stub.source);
        let _ = write!(msg, "\n• \"{}\" - {}", escape_html(&title), source);
        let _ = write!(msg, "\n  📰 {} | ⏰ {}", source, published_label(article, offset));
    }
    if summary.articles.len() > top_articles {
        let _ = write!(msg, "\n... 외 {}개 기사", summary.articles.len() - top_articles);
    }
    msg
}

/// Sent instead of a digest when a run cannot produce or publish a report.
pub fn error_notice(message: &str, at: DateTime<FixedOffset>) -> String {
    format!(
        "❌ <b>뉴스 수집 오류</b>\n\n🚨 <b>오류 내용:</b>\n{}\n\n⏰ <b>발생 시간:</b>\n{}",
        escape_html(message),
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatchStats;
    use crate::outputs::fixtures;
    use crate::report::summarize;
    use crate::schedule::offset_hours;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_digest_escapes_and_lists_articles() {
        let offset = offset_hours(9).unwrap();
        let summary = fixtures::summary();
        let stamp = Stamp::of(&summary, offset);
        let msg = digest_html(&summary, Some("https://notion.so/p?a=1&b=2"), &stamp, offset, 5);

        assert!(msg.contains("https://notion.so/p?a=1&amp;b=2"));
        assert!(msg.contains("💬 오늘 2개의 AI 관련 뉴스가 발표되었습니다."));
        assert!(msg.contains("• 기사 수: 2개"));
        assert!(msg.contains("#AI #GPT"));
        assert!(msg.contains("\"OpenAI &amp; GPT news\" - Example"));
        assert!(msg.contains("\"Samsung &lt;AI&gt; chip\" - 전자신문"));
        assert!(!msg.contains("외"));
    }

    #[test]
    fn test_digest_truncates_titles_and_counts_rest() {
        let offset = offset_hours(9).unwrap();
        let long_title = "가".repeat(90);
        let articles = (0..7)
            .map(|i| fixtures::article(&format!("{long_title}{i}"), "s", Some(i), &[]))
            .collect();
        let summary = summarize(articles, BatchStats::default(), Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        let stamp = Stamp::of(&summary, offset);
        let msg = digest_html(&summary, None, &stamp, offset, 5);

        assert!(msg.contains(&format!("\"{}...\"", "가".repeat(80))));
        assert_eq!(msg.matches("• \"").count(), 5);
        assert!(msg.ends_with("... 외 2개 기사"));
        assert!(!msg.contains("전체 리포트"));
        // Default keywords appear when none were found.
        assert!(msg.contains("#인공지능 #AI #기술 #뉴스 #혁신"));
    }

    #[test]
    fn test_error_notice() {
        let at = offset_hours(9)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 1, 7, 30, 0)
            .unwrap();
        let msg = error_notice("no articles <found>", at);
        assert!(msg.contains("no articles &lt;found&gt;"));
        assert!(msg.contains("2025-03-01 07:30:00"));
    }
}
