//! Projections of one ranked article list into the output artifacts.
//!
//! Every renderer walks the same [`Report`], so the JSON array, the HTML
//! page and the email digest always agree on membership and order.

mod digest;
mod html;
mod json;

use std::fs;
use std::path::{Path, PathBuf};
use time::Date;
use tracing::{error, info};

use crate::error::RenderWriteError;
use crate::news::{Article, Category, RankedArticles};

pub use digest::{Digest, render_digest};
pub use html::render_html;
pub use json::render_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Latest,
    Vendor,
    Industry,
}

impl SectionKind {
    pub fn heading(self) -> &'static str {
        match self {
            SectionKind::Latest => "Latest",
            SectionKind::Vendor => "Vendor news",
            SectionKind::Industry => "Industry news",
        }
    }

    pub fn anchor(self) -> &'static str {
        match self {
            SectionKind::Latest => "latest",
            SectionKind::Vendor => "vendor",
            SectionKind::Industry => "industry",
        }
    }
}

#[derive(Debug)]
pub struct Section<'a> {
    pub kind: SectionKind,
    pub articles: Vec<&'a Article>,
}

#[derive(Debug)]
pub struct Report<'a> {
    pub title: &'a str,
    pub date: Date,
    pub sections: Vec<Section<'a>>,
}

impl<'a> Report<'a> {
    /// Latest holds the home bucket; older articles split by category.
    pub fn new(title: &'a str, date: Date, ranked: &'a RankedArticles) -> Self {
        let older_in = move |category: Category| {
            ranked
                .older
                .iter()
                .filter(move |a| a.category == category)
                .collect::<Vec<_>>()
        };
        let sections = vec![
            Section {
                kind: SectionKind::Latest,
                articles: ranked.recent.iter().collect(),
            },
            Section {
                kind: SectionKind::Vendor,
                articles: older_in(Category::Vendor),
            },
            Section {
                kind: SectionKind::Industry,
                articles: older_in(Category::Industry),
            },
        ];
        Self {
            title,
            date,
            sections,
        }
    }

    /// Canonical article order shared by all outputs.
    pub fn articles(&self) -> impl Iterator<Item = &'a Article> + '_ {
        self.sections.iter().flat_map(|s| s.articles.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.articles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

#[derive(Debug)]
pub struct WriteOutcome {
    pub path: PathBuf,
    pub result: Result<(), RenderWriteError>,
}

/// Write each requested artifact independently; one failing does not
/// stop the other from being attempted.
pub fn write_artifacts(report: &Report<'_>, outputs: &Outputs) -> Vec<WriteOutcome> {
    let mut done = Vec::new();
    if let Some(path) = &outputs.html {
        let result = write_file(path, &render_html(report));
        done.push(WriteOutcome {
            path: path.clone(),
            result,
        });
    }
    if let Some(path) = &outputs.json {
        let result = render_json(report)
            .map_err(RenderWriteError::from)
            .and_then(|body| write_file(path, &body));
        done.push(WriteOutcome {
            path: path.clone(),
            result,
        });
    }
    for w in &done {
        match &w.result {
            Ok(()) => info!(path = %w.path.display(), articles = report.len(), "wrote artifact"),
            Err(e) => error!(path = %w.path.display(), error = %e, "failed to write artifact"),
        }
    }
    done
}

fn write_file(path: &Path, contents: &str) -> Result<(), RenderWriteError> {
    let io_err = |source| RenderWriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use time::macros::{date, datetime};

    pub(crate) fn sample_ranked() -> RankedArticles {
        let base = Article {
            title: String::new(),
            link: String::new(),
            source: "Snowflake Blog".into(),
            category: Category::Vendor,
            published: Some(datetime!(2025-03-05 09:00 UTC)),
            fetched: date!(2025 - 03 - 05),
            summary: Some("Two sentences. Exactly.".into()),
            drawbacks: Some("May raise security and compliance concerns.".into()),
            body: None,
        };
        let mk = |n: usize, source: &str, category: Category, dated: bool| Article {
            title: format!("Story <{n}> & co"),
            link: format!("https://x.example/{n}?a=1&b=2"),
            source: source.into(),
            category,
            published: dated.then_some(datetime!(2025-03-05 09:00 UTC)),
            ..base.clone()
        };
        RankedArticles {
            recent: vec![
                mk(1, "Snowflake Blog", Category::Vendor, true),
                mk(2, "Snowflake Blog", Category::Vendor, true),
                mk(3, "KDnuggets", Category::Industry, true),
            ],
            older: vec![
                mk(4, "KDnuggets", Category::Industry, true),
                mk(5, "Databricks Blog", Category::Vendor, false),
            ],
        }
    }

    #[test]
    fn sections_follow_buckets_then_category() {
        let ranked = sample_ranked();
        let report = Report::new("Digest", date!(2025 - 03 - 05), &ranked);
        let kinds: Vec<_> = report.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, [SectionKind::Latest, SectionKind::Vendor, SectionKind::Industry]);
        let order: Vec<_> = report.articles().map(|a| a.link.clone()).collect();
        assert_eq!(
            order,
            [1, 2, 3, 5, 4].map(|n| format!("https://x.example/{n}?a=1&b=2"))
        );
        assert_eq!(report.len(), 5);
    }

    #[test]
    fn failed_html_write_still_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is expected makes the HTML write fail.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let outputs = Outputs {
            html: Some(blocker.join("index.html")),
            json: Some(dir.path().join("out/articles.json")),
        };
        let ranked = sample_ranked();
        let report = Report::new("Digest", date!(2025 - 03 - 05), &ranked);
        let done = write_artifacts(&report, &outputs);
        assert_eq!(done.len(), 2);
        assert!(done[0].result.is_err());
        assert!(done[1].result.is_ok());
        let json = fs::read_to_string(dir.path().join("out/articles.json")).unwrap();
        assert!(json.contains("https://x.example/5"));
    }
}
