use std::collections::HashMap;

use super::model::Article;

#[derive(Debug, Default)]
pub struct Deduplicated {
    pub articles: Vec<Article>,
    /// Fresh entries folded into an earlier one with the same link.
    pub merged: usize,
    /// Prior-run articles carried into this run's output.
    pub carried: usize,
}

/// Collapse articles sharing a link. The first-seen instance keeps its
/// position; its absent fields are filled from later duplicates.
pub fn dedupe(articles: Vec<Article>) -> Deduplicated {
    dedupe_with_seed(articles, Vec::new())
}

/// As [`dedupe`], then fold in a prior run's articles. A fresh article
/// wins over its seeded twin but keeps the earlier `fetched` date.
pub fn dedupe_with_seed(fresh: Vec<Article>, seed: Vec<Article>) -> Deduplicated {
    let mut out: Vec<Article> = Vec::with_capacity(fresh.len() + seed.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged = 0;

    for article in fresh {
        match index.get(&article.link) {
            Some(&i) => {
                fill_missing(&mut out[i], article);
                merged += 1;
            }
            None => {
                index.insert(article.link.clone(), out.len());
                out.push(article);
            }
        }
    }

    let fresh_len = out.len();
    let mut carried = 0;
    for prior in seed {
        match index.get(&prior.link) {
            Some(&i) => {
                let kept = &mut out[i];
                if i < fresh_len && prior.fetched < kept.fetched {
                    kept.fetched = prior.fetched;
                }
                fill_missing(kept, prior);
            }
            None => {
                index.insert(prior.link.clone(), out.len());
                out.push(prior);
                carried += 1;
            }
        }
    }

    Deduplicated {
        articles: out,
        merged,
        carried,
    }
}

fn fill_missing(kept: &mut Article, other: Article) {
    if kept.published.is_none() {
        kept.published = other.published;
    }
    if kept.summary.is_none() {
        kept.summary = other.summary;
    }
    if kept.drawbacks.is_none() {
        kept.drawbacks = other.drawbacks;
    }
    if kept.body.is_none() {
        kept.body = other.body;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::Category;
    use std::collections::HashSet;
    use time::macros::{date, datetime};

    fn art(link: &str, title: &str) -> Article {
        Article {
            title: title.into(),
            link: link.into(),
            source: "Snowflake Blog".into(),
            category: Category::Vendor,
            published: None,
            fetched: date!(2025 - 03 - 05),
            summary: None,
            drawbacks: None,
            body: None,
        }
    }

    #[test]
    fn same_link_keeps_first_seen_fields() {
        let mut a = art("https://s.example/x", "First title");
        a.published = Some(datetime!(2025-03-04 09:00 UTC));
        let mut b = art("https://s.example/x", "Second title");
        b.published = Some(datetime!(2025-03-03 09:00 UTC));
        b.summary = Some("from the duplicate".into());

        let out = dedupe(vec![a, art("https://s.example/y", "Other"), b]);
        assert_eq!(out.articles.len(), 2);
        assert_eq!(out.merged, 1);
        let x = &out.articles[0];
        assert_eq!(x.title, "First title");
        assert_eq!(x.published, Some(datetime!(2025-03-04 09:00 UTC)));
        assert_eq!(x.summary.as_deref(), Some("from the duplicate"));
        assert_eq!(out.articles[1].link, "https://s.example/y");
    }

    #[test]
    fn earliest_seen_non_null_date_fills_gap() {
        let a = art("https://s.example/x", "t");
        let mut b = art("https://s.example/x", "t");
        b.published = Some(datetime!(2025-03-01 00:00 UTC));
        let mut c = art("https://s.example/x", "t");
        c.published = Some(datetime!(2025-03-02 00:00 UTC));
        let out = dedupe(vec![a, b, c]);
        assert_eq!(out.articles[0].published, Some(datetime!(2025-03-01 00:00 UTC)));
    }

    #[test]
    fn idempotent_and_unique() {
        let input = vec![
            art("https://s.example/a", "a"),
            art("https://s.example/b", "b"),
            art("https://s.example/a", "a2"),
            art("https://s.example/c", "c"),
            art("https://s.example/b", "b2"),
        ];
        let once = dedupe(input).articles;
        let twice = dedupe(once.clone()).articles;
        assert_eq!(once, twice);
        let links: HashSet<_> = once.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links.len(), once.len());
    }

    #[test]
    fn seed_is_carried_and_keeps_first_fetch_date() {
        let fresh = vec![art("https://s.example/a", "fresh a")];
        let mut old_a = art("https://s.example/a", "old a");
        old_a.fetched = date!(2025 - 03 - 01);
        old_a.drawbacks = Some("kept".into());
        let mut old_b = art("https://s.example/b", "old b");
        old_b.fetched = date!(2025 - 02 - 28);

        let out = dedupe_with_seed(fresh, vec![old_a, old_b]);
        assert_eq!(out.articles.len(), 2);
        assert_eq!(out.carried, 1);
        assert_eq!(out.articles[0].title, "fresh a");
        assert_eq!(out.articles[0].fetched, date!(2025 - 03 - 01));
        assert_eq!(out.articles[0].drawbacks.as_deref(), Some("kept"));
        assert_eq!(out.articles[1].title, "old b");
    }
}
