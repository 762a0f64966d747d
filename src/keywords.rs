//! Keyword vocabulary sources.
//!
//! The tagger and the feed query both use one vocabulary, loaded once per
//! run; its priority terms come first so they lead the search query (unless
//! `feed.query_terms` overrides it). It comes from a [`KeywordSource`]: either the static list in the
//! config, or a spreadsheet published as CSV. A failing or empty primary
//! source falls back to the static list.

use crate::error::KeywordSourceError;
use crate::scrapers::PageFetcher;
use itertools::Itertools;
use tracing::{info, instrument, warn};
use url::Url;

/// Something that yields the keyword vocabulary.
pub trait KeywordSource {
    async fn load(&self) -> Result<Vec<String>, KeywordSourceError>;
}

/// Fixed vocabulary from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticKeywords {
    keywords: Vec<String>,
}

impl StaticKeywords {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }
}

impl KeywordSource for StaticKeywords {
    async fn load(&self) -> Result<Vec<String>, KeywordSourceError> {
        Ok(self.keywords.clone())
    }
}

/// A spreadsheet published as CSV.
///
/// The header row must contain a `keyword` column. An optional `active`
/// column disables a row when it holds `false`, `0`, `n` or `no`.
#[derive(Debug, Clone)]
pub struct SheetCsvKeywords<F> {
    fetcher: F,
    url: Url,
}

impl<F: PageFetcher> SheetCsvKeywords<F> {
    pub fn new(fetcher: F, url: Url) -> Self {
        Self { fetcher, url }
    }
}

impl<F: PageFetcher> KeywordSource for SheetCsvKeywords<F> {
    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn load(&self) -> Result<Vec<String>, KeywordSourceError> {
        let body = self.fetcher.fetch(&self.url).await?;
        let keywords = parse_keyword_csv(&body)?;
        info!(count = keywords.len(), "Loaded keywords from sheet");
        Ok(keywords)
    }
}

/// The vocabulary source chosen by configuration.
#[derive(Debug, Clone)]
pub enum KeywordBackend<F> {
    Static(StaticKeywords),
    SheetCsv(SheetCsvKeywords<F>),
}

impl<F: PageFetcher> KeywordSource for KeywordBackend<F> {
    async fn load(&self) -> Result<Vec<String>, KeywordSourceError> {
        match self {
            KeywordBackend::Static(s) => s.load().await,
            KeywordBackend::SheetCsv(s) => s.load().await,
        }
    }
}

/// Parse the published sheet into active keywords, in row order.
pub fn parse_keyword_csv(body: &str) -> Result<Vec<String>, KeywordSourceError> {
    let mut rows = body.lines().filter(|l| !l.trim().is_empty()).map(split_csv_line);
    let header = rows.next().ok_or(KeywordSourceError::MissingColumn)?;
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    };
    let keyword_col = column("keyword").ok_or(KeywordSourceError::MissingColumn)?;
    let active_col = column("active");

    Ok(rows
        .filter(|row| {
            active_col
                .and_then(|i| row.get(i))
                .is_none_or(|v| !is_disabled(v))
        })
        .filter_map(|row| row.get(keyword_col).map(|k| k.trim().to_string()))
        .filter(|k| !k.is_empty())
        .collect())
}

fn is_disabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "n" | "no"
    )
}

/// Split one CSV record. Handles quoted fields and doubled quotes; a quoted
/// field may not span lines.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Load the vocabulary from `primary`, falling back to `fallback` when it
/// fails or comes back empty.
///
/// The result is trimmed and de-duplicated (first occurrence wins), and the
/// terms listed in `priority` that are present move to the front in
/// `priority` order.
#[instrument(level = "info", skip_all)]
pub async fn load_vocabulary<S: KeywordSource>(
    primary: &S,
    fallback: &[String],
    priority: &[String],
) -> Vec<String> {
    let loaded = match primary.load().await {
        Ok(keywords) if keywords.iter().any(|k| !k.trim().is_empty()) => keywords,
        Ok(_) => {
            warn!("Keyword source returned nothing; using configured vocabulary");
            fallback.to_vec()
        }
        Err(e) => {
            warn!(error = %e, "Keyword source failed; using configured vocabulary");
            fallback.to_vec()
        }
    };

    let vocabulary = prioritize(
        loaded
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .unique()
            .map(str::to_string)
            .collect(),
        priority,
    );
    info!(count = vocabulary.len(), "Keyword vocabulary ready");
    vocabulary
}

fn prioritize(keywords: Vec<String>, priority: &[String]) -> Vec<String> {
    let (mut front, rest): (Vec<String>, Vec<String>) =
        keywords.into_iter().partition(|k| priority.contains(k));
    front.sort_by_key(|k| priority.iter().position(|p| p == k));
    front.extend(rest);
    front
}
