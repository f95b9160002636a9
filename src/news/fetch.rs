use feed_rs::parser;
use futures_util::StreamExt;
use futures_util::stream;
use reqwest::Client;
use std::{path::Path, time::Duration};
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

use super::model::RawEntry;
use crate::config::{FeedSource, FetchConfig};
use crate::error::SourceFetchError;

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;

/// Entries retrieved from one source, already capped at `max_items`.
#[derive(Debug, Default)]
pub struct FetchedFeed {
    pub entries: Vec<RawEntry>,
    /// Feed URL used to resolve relative entry links.
    pub base: Option<Url>,
}

#[derive(Debug)]
pub struct SourceOutcome {
    pub source: FeedSource,
    pub result: Result<FetchedFeed, SourceFetchError>,
}

impl SourceOutcome {
    /// Entries for downstream stages; a failed source contributes none.
    pub fn into_feed(self) -> (FeedSource, FetchedFeed) {
        (self.source, self.result.unwrap_or_default())
    }
}

pub struct Fetcher {
    client: Client,
    timeout: Duration,
    concurrency: usize,
}

impl Fetcher {
    pub fn new(cfg: &FetchConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let client = Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .gzip(true)
            .connect_timeout(Duration::from_secs(5).min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            timeout,
            concurrency: cfg.concurrency.max(1),
        })
    }

    /// Fetch every source with at most `concurrency` requests in flight.
    /// Outcomes come back in registry order regardless of completion order.
    pub async fn fetch_all(&self, sources: &[FeedSource]) -> Vec<SourceOutcome> {
        stream::iter(sources.iter().cloned())
            .map(|source| async move {
                let result = self.fetch_source(&source).await;
                match &result {
                    Ok(feed) => debug!(source = %source.name, entries = feed.entries.len(), "fetched feed"),
                    Err(err) => warn!(source = %source.name, url = %source.url, error = %err, "feed failed; skipping"),
                }
                SourceOutcome { source, result }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    pub async fn fetch_source(&self, source: &FeedSource) -> Result<FetchedFeed, SourceFetchError> {
        let bytes = tokio::time::timeout(self.timeout, self.read_body(&source.url))
            .await
            .map_err(|_| SourceFetchError::Timeout(self.timeout.as_secs()))??;
        let feed = parser::parse(&bytes[..])?;
        let base = Url::parse(&source.url).ok();
        Ok(FetchedFeed {
            entries: raw_entries(feed, source.max_items),
            base,
        })
    }

    async fn read_body(&self, location: &str) -> Result<Vec<u8>, SourceFetchError> {
        if Path::new(location).is_file() {
            let bytes = tokio::fs::read(location)
                .await
                .map_err(|source| SourceFetchError::Read {
                    path: location.to_string(),
                    source,
                })?;
            if bytes.len() > MAX_FEED_BYTES {
                return Err(SourceFetchError::TooLarge(MAX_FEED_BYTES));
            }
            return Ok(bytes);
        }

        let resp = self.client.get(location).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceFetchError::Status(status));
        }
        // Stream with a max size limit
        let mut stream = resp.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let c = chunk?;
            if buf.len() + c.len() > MAX_FEED_BYTES {
                return Err(SourceFetchError::TooLarge(MAX_FEED_BYTES));
            }
            buf.extend_from_slice(&c);
        }
        Ok(buf)
    }
}

/// Flatten feed-rs entries (RSS 0.9/1/2, Atom, JSON Feed) into raw entries.
pub fn raw_entries(feed: feed_rs::model::Feed, max_items: Option<usize>) -> Vec<RawEntry> {
    let limit = max_items.unwrap_or(usize::MAX);
    feed.entries.into_iter().take(limit).map(raw_entry).collect()
}

fn raw_entry(entry: feed_rs::model::Entry) -> RawEntry {
    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().unwrap_or("") == "alternate")
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone());

    let published = entry
        .published
        .or(entry.updated)
        .and_then(|dt| OffsetDateTime::from_unix_timestamp(dt.timestamp()).ok());

    let mut parts: Vec<String> = Vec::new();
    if let Some(summary) = entry.summary {
        parts.push(summary.content);
    }
    if let Some(body) = entry.content.and_then(|c| c.body) {
        parts.push(body);
    }
    let body = if parts.is_empty() { None } else { Some(parts.join(" ")) };

    RawEntry {
        title: entry.title.map(|t| t.content),
        link,
        published,
        body,
    }
}
