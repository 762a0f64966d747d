//! Markdown report rendering.

use super::{Stamp, published_label, report_title};
use crate::models::BatchSummary;
use chrono::FixedOffset;
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Render the full report.
pub fn summary_to_markdown(
    summary: &BatchSummary,
    title_prefix: &str,
    stamp: &Stamp,
    offset: FixedOffset,
) -> String {
    let mut md = String::new();

    // `write!` into a String cannot fail.
    let _ = writeln!(md, "# {}\n", report_title(title_prefix, stamp));
    let _ = writeln!(
        md,
        "> 기사 {}개 · 언론사 {}곳 · 평균 본문 {}자\n",
        summary.total_articles, summary.total_sources, summary.avg_content_length
    );
    let _ = writeln!(md, "💬 {}\n", summary.overview);

    let _ = writeln!(md, "## 주요 키워드\n");
    let tags: Vec<String> = summary.top_keywords.iter().map(|k| format!("`{k}`")).collect();
    let _ = writeln!(md, "{}\n", tags.join(" "));

    let _ = writeln!(md, "## 주요 AI 뉴스 ({}개)\n", summary.total_articles);
    for (i, article) in summary.articles.iter().enumerate() {
        let _ = writeln!(md, "### {}. {}\n", i + 1, article.stub.title);
        let _ = writeln!(
            md,
            "- 출처: {} | 발행: {} | 분류: {}",
            article.stub.source,
            published_label(article, offset),
            article.category
        );
        if !article.summary.is_empty() {
            let _ = writeln!(md, "- 요약: {}", article.summary);
        }
        if !article.keywords().is_empty() {
            let tags: Vec<String> = article.keywords().iter().map(|k| format!("#{k}")).collect();
            let _ = writeln!(md, "- 키워드: {}", tags.join(" "));
        }
        let _ = writeln!(md, "- 원문: <{}>", article.stub.link);
        if let Some(image) = article.images().first() {
            let _ = writeln!(md, "\n![{}]({})", image.alt_text, image.url);
        }
        let _ = writeln!(md);
    }

    let stats = &summary.stats;
    let _ = writeln!(md, "---\n\n## 수집 정보\n");
    let _ = writeln!(md, "- 수집 시간: {}", stamp.full);
    if let Some(range) = &summary.date_range {
        let _ = writeln!(
            md,
            "- 기사 발행 기간: {} ~ {}",
            range.earliest.with_timezone(&offset).format("%Y-%m-%d %H:%M"),
            range.latest.with_timezone(&offset).format("%Y-%m-%d %H:%M")
        );
    }
    let _ = writeln!(
        md,
        "- 크롤링: 시도 {} · 성공 {} · 실패 {} · 대체 추출 {} (성공률 {:.1}%)",
        stats.attempted,
        stats.succeeded,
        stats.failed,
        stats.fallback_used,
        stats.success_rate()
    );
    let _ = writeln!(md, "- 발견된 키워드: {}개", summary.keywords_found_count);
    let _ = writeln!(md, "- 언론사: {}", summary.distinct_sources.join(", "));
    md
}

/// Where the report is written: `{markdown_output_dir}/{YYYY-MM-DD}_{HHMM}.md`.
pub fn report_path(markdown_output_dir: &str, stamp: &Stamp) -> PathBuf {
    Path::new(markdown_output_dir).join(format!("{}_{}.md", stamp.date, stamp.compact_time))
}

#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_report(
    markdown: &str,
    stamp: &Stamp,
    markdown_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = report_path(markdown_output_dir, stamp);
    fs::write(&path, markdown).await?;
    info!(path = %path.display(), "Wrote Markdown report");
    Ok(path)
}
