use std::path::PathBuf;

use thiserror::Error;

/// Run-wide precondition failures. These abort before any fetch happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A single source could not be fetched or parsed. Recovered by the fetcher.
#[derive(Debug, Error)]
pub enum SourceFetchError {
    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("feed too large (>{0} bytes)")]
    TooLarge(usize),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// A raw entry that cannot become an Article. The entry is dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryNormalizationError {
    #[error("entry has no title")]
    MissingTitle,

    #[error("entry has no link")]
    MissingLink,

    #[error("entry link is not an absolute http(s) URL: {0}")]
    InvalidLink(String),
}

/// Enrichment did not produce usable output. Fields stay absent.
#[derive(Debug, Error)]
pub enum EnrichmentFailure {
    #[error("api key variable {0} is not set")]
    MissingApiKey(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed completion: {0}")]
    Malformed(String),
}

/// An output artifact could not be produced. Fatal for that artifact only.
#[derive(Debug, Error)]
pub enum RenderWriteError {
    #[error("failed to serialize articles: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid address {address}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("invalid SMTP_PORT: {0}")]
    Port(String),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp transport: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}
