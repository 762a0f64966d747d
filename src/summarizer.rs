//! Per-article summaries.
//!
//! Two interchangeable backends implement [`Summarizer`]:
//! - [`LeadSummarizer`]: extractive, takes the opening sentence of the content
//! - [`LlmSummarizer`]: asks a language model through `awful_aj`
//!
//! [`summarize_all`] runs the chosen backend over a batch and falls back to
//! the feed summary when it fails. [`batch_overview`] asks the same backend
//! for a one-line trend summary of the whole batch.

use crate::api::{RetryPolicy, ask_with_backoff};
use crate::error::SummarizeError;
use crate::models::EnrichedArticle;
use crate::utils::{ellipsize, take_chars, truncate_for_log};
use awful_aj::config::AwfulJadeConfig;
use awful_aj::template::ChatTemplate;
use awful_aj::{config, config_dir, template};
use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::{info, instrument, warn};

/// Cap on extractive and fallback summaries.
pub const SUMMARY_CHARS: usize = 150;
/// Cap on model replies.
pub const LLM_REPLY_CHARS: usize = 200;
/// Cap on the batch overview line.
pub const OVERVIEW_CHARS: usize = 100;
/// A first sentence shorter than this gets the second one appended.
const SHORT_SENTENCE_CHARS: usize = 20;

/// Produces a short summary of one article, and a trend line for a batch.
pub trait Summarizer {
    async fn summarize(&self, article: &EnrichedArticle) -> Result<String, SummarizeError>;

    /// One sentence on what a non-empty batch is about.
    async fn overview(&self, articles: &[EnrichedArticle]) -> Result<String, SummarizeError>;
}

/// Which backend the config selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerKind {
    #[default]
    Lead,
    Llm,
}

/// Extractive summary from the first sentence or two of the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadSummarizer;

impl Summarizer for LeadSummarizer {
    async fn summarize(&self, article: &EnrichedArticle) -> Result<String, SummarizeError> {
        lead_summary(article.content()).ok_or(SummarizeError::NoText)
    }

    async fn overview(&self, articles: &[EnrichedArticle]) -> Result<String, SummarizeError> {
        Ok(count_overview(articles.len()))
    }
}

/// The opening of `text`: its first sentence, plus the second when the first
/// is very short, cut to [`SUMMARY_CHARS`].
pub fn lead_summary(text: &str) -> Option<String> {
    let mut sentences = split_sentences(text);
    let first = sentences.next()?;
    let lead = if first.chars().count() < SHORT_SENTENCE_CHARS {
        match sentences.next() {
            Some(second) => format!("{first} {second}"),
            None => first.to_string(),
        }
    } else {
        first.to_string()
    };
    Some(ellipsize(&lead, SUMMARY_CHARS))
}

/// Sentences end at `.`, `!`, `?` or `。` followed by whitespace or the end of text.
fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text.trim();
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let mut chars = rest.char_indices().peekable();
        let mut end = rest.len();
        while let Some((i, c)) = chars.next() {
            if matches!(c, '.' | '!' | '?' | '。') {
                match chars.peek() {
                    None => break,
                    Some((_, next)) if next.is_whitespace() => {
                        end = i + c.len_utf8();
                        break;
                    }
                    _ => {}
                }
            }
        }
        let sentence = rest[..end].trim();
        rest = rest[end..].trim_start();
        Some(sentence)
    })
    .filter(|s| !s.is_empty())
}

/// Summaries from an OpenAI-compatible model via `awful_aj`.
///
/// The prompt body is the title plus the first [`LlmSummarizer::INPUT_CHARS`]
/// characters of the content; the instructions live in the chat template.
#[derive(Debug)]
pub struct LlmSummarizer {
    config: AwfulJadeConfig,
    template: ChatTemplate,
    policy: RetryPolicy,
}

impl LlmSummarizer {
    pub const INPUT_CHARS: usize = 1000;

    /// Load the model config and chat template.
    ///
    /// Without an explicit path, the config is `config.yaml` in the
    /// `awful_aj` config directory.
    #[instrument(level = "info", skip_all, fields(template = template_name))]
    pub async fn load(
        template_name: &str,
        config_path: Option<&str>,
        policy: RetryPolicy,
    ) -> Result<Self, Box<dyn Error>> {
        let template = template::load_template(template_name).await?;
        let config_path = match config_path {
            Some(p) => p.to_string(),
            None => config_dir()?
                .join("config.yaml")
                .to_str()
                .ok_or("config path is not valid UTF-8")?
                .to_string(),
        };
        let config = config::load_config(&config_path)?;
        info!(%config_path, "Loaded LLM configuration");
        Ok(Self {
            config,
            template,
            policy,
        })
    }

    fn prompt(article: &EnrichedArticle) -> String {
        let body = if article.content().is_empty() {
            article.stub.raw_summary.as_str()
        } else {
            article.content()
        };
        format!(
            "제목: {}\n내용: {}",
            article.stub.title,
            take_chars(body, Self::INPUT_CHARS)
        )
    }

    fn overview_prompt(articles: &[EnrichedArticle]) -> String {
        let titles: Vec<String> = articles.iter().map(|a| format!("- {}", a.stub.title)).collect();
        format!(
            "다음 {}개의 AI 뉴스 제목들을 바탕으로 오늘의 AI 뉴스 트렌드를 한 문장으로 요약해주세요:\n\n{}\n\n조건:\n- 한국어로 작성\n- 50자 내외로 간결하게\n- 주요 트렌드나 키워드 포함",
            articles.len(),
            titles.join("\n")
        )
    }

    async fn ask(&self, prompt: &str, cap: usize) -> Result<String, SummarizeError> {
        let reply = ask_with_backoff(&self.config, &self.template, prompt, self.policy)
            .await
            .map_err(|e| SummarizeError::Backend(e.to_string()))?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(SummarizeError::EmptyReply);
        }
        Ok(take_chars(reply, cap).to_string())
    }
}

impl Summarizer for LlmSummarizer {
    async fn summarize(&self, article: &EnrichedArticle) -> Result<String, SummarizeError> {
        self.ask(&Self::prompt(article), LLM_REPLY_CHARS).await
    }

    async fn overview(&self, articles: &[EnrichedArticle]) -> Result<String, SummarizeError> {
        self.ask(&Self::overview_prompt(articles), OVERVIEW_CHARS).await
    }
}

/// The backend selected at startup.
#[derive(Debug)]
pub enum SummarizerBackend {
    Lead(LeadSummarizer),
    Llm(Box<LlmSummarizer>),
}

impl Summarizer for SummarizerBackend {
    async fn summarize(&self, article: &EnrichedArticle) -> Result<String, SummarizeError> {
        match self {
            SummarizerBackend::Lead(s) => s.summarize(article).await,
            SummarizerBackend::Llm(s) => s.summarize(article).await,
        }
    }

    async fn overview(&self, articles: &[EnrichedArticle]) -> Result<String, SummarizeError> {
        match self {
            SummarizerBackend::Lead(s) => s.overview(articles).await,
            SummarizerBackend::Llm(s) => s.overview(articles).await,
        }
    }
}

/// Summary used when the backend fails: the feed summary, cut and marked with `...`.
pub fn fallback_summary(raw_summary: &str) -> String {
    if raw_summary.is_empty() {
        String::new()
    } else {
        format!("{}...", take_chars(raw_summary, SUMMARY_CHARS))
    }
}

/// Overview used for an empty batch and when the backend fails.
pub fn count_overview(count: usize) -> String {
    if count == 0 {
        "오늘 수집된 AI 뉴스가 없습니다.".to_string()
    } else {
        format!("오늘 {count}개의 AI 관련 뉴스가 발표되었습니다.")
    }
}

/// The batch trend line, falling back to [`count_overview`].
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn batch_overview<S: Summarizer>(summarizer: &S, articles: &[EnrichedArticle]) -> String {
    if articles.is_empty() {
        return count_overview(0);
    }
    match summarizer.overview(articles).await {
        Ok(line) => line,
        Err(e) => {
            warn!(error = %e, "Overview failed; using article count");
            count_overview(articles.len())
        }
    }
}

/// Summarize every article in place, one at a time. Returns how many fell back.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn summarize_all<S: Summarizer>(summarizer: &S, articles: &mut [EnrichedArticle]) -> usize {
    let mut fallbacks = 0;
    for article in articles.iter_mut() {
        article.summary = match summarizer.summarize(article).await {
            Ok(summary) => summary,
            Err(e) => {
                fallbacks += 1;
                warn!(
                    title = %truncate_for_log(&article.stub.title, 50),
                    error = %e,
                    "Summary failed; using feed summary"
                );
                fallback_summary(&article.stub.raw_summary)
            }
        };
    }
    info!(fallbacks, "Summaries complete");
    fallbacks
}
