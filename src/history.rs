use std::{fs, path::Path};
use time::{Date, Duration};
use tracing::{debug, warn};

use crate::news::Article;

/// Articles from a previously written JSON artifact, used to seed
/// deduplication so the archive accumulates across runs.
#[derive(Debug, Clone, Default)]
pub struct PriorRun {
    articles: Vec<Article>,
}

impl PriorRun {
    /// A missing, unreadable or malformed file yields an empty seed.
    pub fn load(path: &Path) -> Self {
        if !path.is_file() {
            debug!(path = %path.display(), "no prior artifact");
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Vec<Article>>(&contents) {
                Ok(articles) => {
                    debug!(path = %path.display(), articles = articles.len(), "loaded prior artifact");
                    Self { articles }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring malformed prior artifact");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable prior artifact");
                Self::default()
            }
        }
    }

    pub fn from_articles(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    /// Drop articles first fetched more than `days` before `today`.
    pub fn retain_recent(mut self, today: Date, days: Option<u32>) -> Self {
        if let Some(days) = days {
            let cutoff = today - Duration::days(i64::from(days));
            self.articles.retain(|a| a.fetched >= cutoff);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn into_articles(self) -> Vec<Article> {
        self.articles
    }
}
