//! # AI News Digest
//!
//! Collects recent AI news from a Google News RSS search, scrapes the full
//! text of each article, summarizes and tags it, and publishes a report.
//!
//! ## Features
//!
//! - Per-domain selector cascade for article bodies, with paragraph and
//!   body-text fallbacks and image harvesting
//! - Extractive or LLM (`awful_aj`) summaries with feed-summary fallback
//! - Keyword tags and a single category per article from a configurable
//!   vocabulary, optionally loaded from a published spreadsheet
//! - JSON and Markdown reports on disk, a Notion page, and a Telegram digest
//! - One-shot runs or a daily schedule in a fixed UTC offset
//!
//! ## Usage
//!
//! ```sh
//! ai_news_digest -j ./json -m ./markdown --once
//! ```
//!
//! ## Architecture
//!
//! 1. **Feed**: search the RSS feed and keep relevant items ([`feed`])
//! 2. **Enrich**: fetch and extract each article in turn ([`enrich`], [`scrapers`])
//! 3. **Summarize / tag**: [`summarizer`], [`tagging`]
//! 4. **Report**: aggregate into a [`models::BatchSummary`] ([`report`])
//! 5. **Output**: local files ([`outputs`]) then Notion and Telegram ([`sinks`])

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use url::Url;

mod api;
mod cli;
mod config;
mod enrich;
mod error;
mod feed;
mod keywords;
mod models;
mod outputs;
mod pipeline;
mod report;
mod schedule;
mod scrapers;
mod sinks;
mod summarizer;
mod tagging;
mod utils;

use cli::Cli;
use config::AppConfig;
use enrich::Enricher;
use keywords::{KeywordBackend, SheetCsvKeywords, StaticKeywords};
use pipeline::{OutputDirs, Pipeline};
use schedule::{Scheduler, offset_hours, parse_daily_at};
use scrapers::{Extractor, HttpFetcher};
use sinks::{NotionPublisher, TelegramNotifier};
use summarizer::{LeadSummarizer, LlmSummarizer, SummarizerBackend, SummarizerKind};
use utils::{ensure_writable_dir, take_chars};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "ai_news_digest starting up");

    let args = Cli::parse();
    debug!(?args.json_output_dir, ?args.markdown_output_dir, ?args.config, "Parsed CLI arguments");

    let config = AppConfig::load(args.config.as_deref()).await?;
    config.validate()?;
    let offset = offset_hours(config.schedule.utc_offset_hours)?;

    let fetcher = HttpFetcher::new(&config.crawl.user_agent, config.crawl.request_timeout())?;
    let table = config.crawl.build_selector_table()?;
    debug!(domains = table.domains().count(), "Selector table built");
    let extractor = Extractor::new(
        table,
        config.crawl.min_content_chars,
        config.crawl.body_fallback_chars,
    )?;

    if let Some(raw) = args.test_url.as_deref() {
        let url = Url::parse(raw)?;
        probe_url(fetcher, extractor, &url).await;
        return Ok(());
    }

    for dir in [&args.json_output_dir, &args.markdown_output_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let summarizer = match config.summarizer.kind {
        SummarizerKind::Lead => SummarizerBackend::Lead(LeadSummarizer),
        SummarizerKind::Llm => SummarizerBackend::Llm(Box::new(
            LlmSummarizer::load(
                &config.summarizer.template,
                args.llm_config.as_deref(),
                config.summarizer.retry,
            )
            .await?,
        )),
    };
    info!(kind = ?config.summarizer.kind, "Summarizer ready");

    let keywords = match config.tagging.sheet_url()? {
        Some(url) => KeywordBackend::SheetCsv(SheetCsvKeywords::new(fetcher.clone(), url)),
        None => KeywordBackend::Static(StaticKeywords::new(config.tagging.vocabulary.clone())),
    };

    let document_sink = args.notion().map(|(key, database)| {
        NotionPublisher::new(
            fetcher.client().clone(),
            key,
            database,
            &config.report.title_prefix,
            offset,
        )
    });
    let notifier = args
        .telegram()
        .map(|(token, chat)| TelegramNotifier::new(fetcher.client().clone(), token, chat));
    info!(
        notion = document_sink.is_some(),
        telegram = notifier.is_some(),
        "Sinks configured"
    );

    let pipeline = Pipeline {
        config: &config,
        outputs: OutputDirs {
            json: args.json_output_dir.clone(),
            markdown: args.markdown_output_dir.clone(),
        },
        offset,
        fetcher,
        extractor,
        keywords,
        summarizer,
        document_sink,
        notifier,
    };

    let daily_at = if args.once {
        None
    } else {
        args.daily_at.as_deref().or(config.schedule.daily_at.as_deref())
    };

    match daily_at {
        None => {
            if let Err(e) = pipeline.run().await {
                error!(error = %e, "Run failed");
                pipeline.notify_failure(&e.to_string()).await;
            }
        }
        Some(at) => {
            let at = parse_daily_at(at)?;
            let mut scheduler = Scheduler::new(
                at,
                offset,
                Duration::from_secs(config.schedule.run_timeout_secs),
            );
            let p = &pipeline;
            scheduler
                .run_daily(
                    move || async move { p.run().await.map(|_| ()) },
                    move |reason| async move {
                        p.notify_failure(&reason).await;
                    },
                )
                .await?;
        }
    }

    Ok(())
}

/// `--test-url`: crawl one page and log what came out of it.
#[instrument(level = "info", skip_all, fields(%url))]
async fn probe_url(fetcher: HttpFetcher, extractor: Extractor, url: &Url) {
    let started = Utc::now();
    let enricher = Enricher::new(fetcher, extractor, Duration::ZERO);
    match enricher.probe(url).await {
        Ok(extraction) => {
            info!(
                chars = extraction.content.chars().count(),
                images = extraction.images.len(),
                strategy = ?extraction.strategy,
                millis = (Utc::now() - started).num_milliseconds(),
                "Extraction finished"
            );
            info!(preview = %take_chars(&extraction.content, 200), "Content preview");
            match extraction.images.first() {
                Some(image) => info!(src = %image.url, alt = %image.alt_text, "First image"),
                None => warn!("No images found"),
            }
        }
        Err(e) => error!(error = %e, "Crawl failed"),
    }
}
