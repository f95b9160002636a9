use std::cmp::Ordering;
use std::collections::HashSet;
use time::{Duration, OffsetDateTime};

use super::model::Article;
use crate::config::RankingConfig;

/// Home bucket and everything else, both in display order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RankedArticles {
    pub recent: Vec<Article>,
    pub older: Vec<Article>,
}

impl RankedArticles {
    pub fn len(&self) -> usize {
        self.recent.len() + self.older.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recent means `published >= now - window` (inclusive). No date is never recent.
pub fn is_recent(published: Option<OffsetDateTime>, now: OffsetDateTime, window: Duration) -> bool {
    published.is_some_and(|p| p >= now - window)
}

/// Bucket and order articles. Category is left as normalized.
///
/// Recent articles are sorted priority sources first, then newest first,
/// and capped at `home_limit`; the overflow joins the older bucket, which
/// is sorted newest first with undated articles last. Sorting is stable,
/// so ties keep the incoming order.
pub fn rank(articles: Vec<Article>, now: OffsetDateTime, cfg: &RankingConfig) -> RankedArticles {
    let window = Duration::days(i64::from(cfg.recency_days));
    let priority: HashSet<&str> = cfg.priority_sources.iter().map(String::as_str).collect();

    let (mut recent, mut older): (Vec<Article>, Vec<Article>) = articles
        .into_iter()
        .partition(|a| is_recent(a.published, now, window));

    recent.sort_by(|a, b| {
        let pa = priority.contains(a.source.as_str());
        let pb = priority.contains(b.source.as_str());
        pb.cmp(&pa).then_with(|| newest_first(a, b))
    });

    if recent.len() > cfg.home_limit {
        let mut overflow = recent.split_off(cfg.home_limit);
        overflow.append(&mut older);
        older = overflow;
    }
    older.sort_by(newest_first);

    RankedArticles { recent, older }
}

fn newest_first(a: &Article, b: &Article) -> Ordering {
    // None < Some, so reversing puts undated articles last.
    b.published.cmp(&a.published)
}
