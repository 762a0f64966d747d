//! JSON output for API consumers.
//!
//! Files are grouped by local date, one file per run:
//! `{json_output_dir}/{YYYY-MM-DD}/{HHMM}.json`.

use super::Stamp;
use crate::models::BatchSummary;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Where a summary stamped `stamp` is written under `json_output_dir`.
pub fn summary_path(json_output_dir: &str, stamp: &Stamp) -> PathBuf {
    Path::new(json_output_dir)
        .join(&stamp.date)
        .join(format!("{}.json", stamp.compact_time))
}

/// Serialize `summary` and write it under `json_output_dir`, creating the
/// date directory when needed. Returns the written path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_summary(
    summary: &BatchSummary,
    stamp: &Stamp,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string(summary)?;
    let path = summary_path(json_output_dir, stamp);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = summary.total_articles, "Wrote JSON file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::fixtures;
    use crate::schedule::offset_hours;

    #[test]
    fn test_summary_path_layout() {
        let stamp = Stamp::of(&fixtures::summary(), offset_hours(9).unwrap());
        assert_eq!(
            summary_path("/data/json", &stamp),
            PathBuf::from("/data/json/2025-03-02/0730.json")
        );
    }

    #[tokio::test]
    async fn test_write_summary_round_trips_fields() {
        let dir = std::env::temp_dir().join(format!("ai_news_digest_json_{}", std::process::id()));
        let dir_str = dir.to_str().unwrap().to_string();
        let summary = fixtures::summary();
        let stamp = Stamp::of(&summary, offset_hours(9).unwrap());

        let path = write_summary(&summary, &stamp, &dir_str).await.unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).await.unwrap()).unwrap();

        assert_eq!(written["total_articles"], 2);
        assert_eq!(written["overview"], "오늘 2개의 AI 관련 뉴스가 발표되었습니다.");
        assert_eq!(written["articles"][0]["crawl_status"], "success");
        assert_eq!(written["articles"][0]["title"], "OpenAI & GPT news");
        assert_eq!(written["stats"]["attempted"], 2);

        let _ = fs::remove_dir_all(&dir).await;
    }
}
