//! Error types for each stage of the pipeline.
//!
//! Every fallible operation returns its own error enum so that callers can
//! pattern-match on the outcome instead of relying on sentinel values. Only
//! [`ConfigError`] is allowed to escape to `main`, and [`PipelineError`] ends
//! a single run. The others are recovered where they occur and show up as
//! degraded content or failure counts.

use thiserror::Error;

/// Failure retrieving a page over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The server answered with a non-success status code.
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Any other transport-level failure (DNS, TLS, connection reset, body decode).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl FetchError {
    /// Classify a `reqwest` error, separating timeouts from other transport failures.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Http(err)
        }
    }
}

/// Failure collecting article stubs from the news feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid feed URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed feed document: {0}")]
    Parse(#[from] quick_xml::DeError),
}

/// A feed item that cannot become an [`crate::models::ArticleStub`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StubError {
    #[error("article title is empty")]
    EmptyTitle,

    #[error("article link {0:?} is not an absolute http(s) URL")]
    InvalidLink(String),
}

/// Invalid or unreadable configuration. Raised at startup only.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid CSS selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure producing an article summary.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("article has no text to summarize")]
    NoText,

    #[error("language model request failed: {0}")]
    Backend(String),

    #[error("language model returned an empty reply")]
    EmptyReply,
}

/// Failure loading the keyword vocabulary from a pluggable source.
#[derive(Debug, Error)]
pub enum KeywordSourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("keyword sheet has no `keyword` column")]
    MissingColumn,
}

/// Failure delivering a report to a document or notification sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{service} rejected the request: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },
}

/// A run that could not produce a report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("news feed unavailable: {0}")]
    Feed(#[from] FeedError),

    #[error("no articles found")]
    NoArticles,
}

/// The daily trigger could not be installed or stopped.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("scheduler failed: {0}")]
    Cron(#[from] tokio_cron_scheduler::JobSchedulerError),
}
