use time::Date;
use url::Url;

use super::model::{Article, RawEntry};
use crate::config::FeedSource;
use crate::error::EntryNormalizationError;
use crate::util::sanitize::{plain_body, plain_text, truncate_chars};

const MAX_BODY_CHARS: usize = 4000;

const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid"];

/// Map one raw entry onto the canonical record. `fetched` is the run date.
pub fn normalize_entry(
    entry: RawEntry,
    source: &FeedSource,
    base: Option<&Url>,
    fetched: Date,
) -> Result<Article, EntryNormalizationError> {
    let title = entry.title.as_deref().map(plain_text).unwrap_or_default();
    if title.is_empty() {
        return Err(EntryNormalizationError::MissingTitle);
    }

    let raw_link = entry.link.unwrap_or_default();
    if raw_link.trim().is_empty() {
        return Err(EntryNormalizationError::MissingLink);
    }
    let link = normalize_link(&raw_link, base)
        .ok_or_else(|| EntryNormalizationError::InvalidLink(raw_link.clone()))?;

    let body = entry
        .body
        .as_deref()
        .map(plain_body)
        .filter(|b| !b.is_empty())
        .map(|b| truncate_chars(&b, MAX_BODY_CHARS));

    Ok(Article {
        title,
        link,
        source: source.name.clone(),
        category: source.category,
        published: entry.published,
        fetched,
        summary: None,
        drawbacks: None,
        body,
    })
}

/// Canonical form of an entry link: absolute http(s), no fragment, no
/// tracking parameters. Relative links resolve against the feed URL.
pub fn normalize_link(candidate: &str, base: Option<&Url>) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    let mut resolved = match Url::parse(candidate) {
        Ok(u) => u,
        Err(_) => {
            let b = base?;
            b.join(candidate).ok()?
        }
    };
    match resolved.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    resolved.set_fragment(None);

    if resolved.query().is_some() {
        let kept: Vec<(String, String)> = resolved
            .query_pairs()
            .filter(|(k, _)| !is_tracking_param(k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            resolved.set_query(None);
        } else {
            resolved.query_pairs_mut().clear().extend_pairs(kept);
        }
    }
    Some(resolved.into())
}

fn is_tracking_param(key: &str) -> bool {
    key.to_ascii_lowercase().starts_with("utm_")
        || TRACKING_PARAMS.iter().any(|p| key.eq_ignore_ascii_case(p))
}
