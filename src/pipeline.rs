use anyhow::{Context, Result};
use std::time::Duration;
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::history::PriorRun;
use crate::news::{
    Article, Enricher, Fetcher, RankedArticles, SourceOutcome, build_enricher, dedupe_with_seed,
    enrich_all, normalize_entry, rank,
};

/// Aggregate counts for one run; per-item failures only surface here.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub entries_seen: usize,
    pub entries_dropped: usize,
    pub duplicates_merged: usize,
    pub seeded: usize,
    pub carried_over: usize,
    pub enriched: usize,
    pub enrichment_failed: usize,
    pub enrichment_skipped: usize,
}

#[derive(Debug)]
pub struct RunOutput {
    pub ranked: RankedArticles,
    pub stats: RunStats,
}

/// Fetch every configured source and run the full pipeline.
///
/// `now` is the run's reference time; its offset decides the `fetched`
/// date. Source failures never fail the run.
pub async fn run(cfg: &RuntimeConfig, now: OffsetDateTime, seed: PriorRun) -> Result<RunOutput> {
    let fetcher = Fetcher::new(&cfg.fetch).context("building http client")?;
    let enricher = build_enricher(&cfg.enrichment).context("building enricher")?;
    info!(sources = cfg.feeds.len(), enricher = enricher.name(), "starting run");
    let outcomes = fetcher.fetch_all(&cfg.feeds).await;
    Ok(process(cfg, outcomes, now, seed, enricher.as_ref()).await)
}

/// Everything after fetching: normalize, dedupe, enrich, rank.
pub async fn process(
    cfg: &RuntimeConfig,
    outcomes: Vec<SourceOutcome>,
    now: OffsetDateTime,
    seed: PriorRun,
    enricher: &dyn Enricher,
) -> RunOutput {
    let today = now.date();
    let (fresh, mut stats) = normalize_outcomes(outcomes, today);

    let seed = seed.retain_recent(today, cfg.archive.retention_days);
    stats.seeded = seed.len();
    let deduped = dedupe_with_seed(fresh, seed.into_articles());
    stats.duplicates_merged = deduped.merged;
    stats.carried_over = deduped.carried;

    let (articles, enrich_stats) = enrich_all(
        enricher,
        deduped.articles,
        cfg.enrichment.concurrency,
        Duration::from_secs(cfg.enrichment.timeout_secs),
    )
    .await;
    stats.enriched = enrich_stats.enriched;
    stats.enrichment_failed = enrich_stats.failed;
    stats.enrichment_skipped = enrich_stats.skipped;

    let ranked = rank(articles, now, &cfg.ranking);
    info!(
        sources_ok = stats.sources_ok,
        sources_failed = stats.sources_failed,
        entries = stats.entries_seen,
        dropped = stats.entries_dropped,
        merged = stats.duplicates_merged,
        carried = stats.carried_over,
        enriched = stats.enriched,
        enrichment_failed = stats.enrichment_failed,
        enrichment_skipped = stats.enrichment_skipped,
        recent = ranked.recent.len(),
        older = ranked.older.len(),
        "run complete"
    );
    RunOutput { ranked, stats }
}

/// Flatten fetch outcomes into articles in registry order, dropping
/// entries that cannot be normalized.
pub fn normalize_outcomes(outcomes: Vec<SourceOutcome>, today: Date) -> (Vec<Article>, RunStats) {
    let mut stats = RunStats::default();
    let mut articles = Vec::new();
    for outcome in outcomes {
        if outcome.result.is_ok() {
            stats.sources_ok += 1;
        } else {
            stats.sources_failed += 1;
        }
        let (source, feed) = outcome.into_feed();
        for entry in feed.entries {
            stats.entries_seen += 1;
            match normalize_entry(entry, &source, feed.base.as_ref(), today) {
                Ok(article) => articles.push(article),
                Err(err) => {
                    stats.entries_dropped += 1;
                    debug!(source = %source.name, error = %err, "dropping entry");
                }
            }
        }
    }
    (articles, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedSource;
    use crate::error::SourceFetchError;
    use crate::news::{Category, FetchedFeed, RawEntry};
    use crate::error::EnrichmentFailure;
    use crate::news::Enrichment;
    use crate::news::enrich::NoopEnricher;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-03-05 12:00 UTC);

    fn entry(title: &str, link: &str, published: Option<OffsetDateTime>) -> RawEntry {
        RawEntry {
            title: Some(title.into()),
            link: Some(link.into()),
            published,
            body: None,
        }
    }

    fn ok(source: FeedSource, entries: Vec<RawEntry>) -> SourceOutcome {
        SourceOutcome {
            source,
            result: Ok(FetchedFeed { entries, base: None }),
        }
    }

    #[tokio::test]
    async fn duplicate_links_within_a_source_collapse() {
        let snowflake = FeedSource::new("Snowflake Blog", "https://www.snowflake.com/feed/", Category::Vendor);
        let outcomes = vec![ok(
            snowflake,
            vec![
                entry("Cortex GA", "https://www.snowflake.com/blog/cortex?utm_source=rss", None),
                entry(
                    "Cortex GA (updated)",
                    "https://www.snowflake.com/blog/cortex",
                    Some(datetime!(2025-03-05 08:00 UTC)),
                ),
            ],
        )];
        let cfg = RuntimeConfig::default();
        let out = process(&cfg, outcomes, NOW, PriorRun::default(), &NoopEnricher).await;
        assert_eq!(out.ranked.len(), 1);
        assert_eq!(out.stats.duplicates_merged, 1);
        let a = &out.ranked.recent[0];
        assert_eq!(a.title, "Cortex GA");
        assert_eq!(a.published, Some(datetime!(2025-03-05 08:00 UTC)));
    }

    #[tokio::test]
    async fn failed_source_contributes_nothing() {
        let good = FeedSource::new("KDnuggets", "https://www.kdnuggets.com/feed", Category::Industry);
        let bad = FeedSource::new("Slow Blog", "https://slow.example/feed", Category::Vendor);
        let outcomes = vec![
            SourceOutcome {
                source: bad,
                result: Err(SourceFetchError::Timeout(20)),
            },
            ok(good, vec![entry("Trends", "https://www.kdnuggets.com/trends", Some(NOW))]),
        ];
        let cfg = RuntimeConfig::default();
        let out = process(&cfg, outcomes, NOW, PriorRun::default(), &NoopEnricher).await;
        assert_eq!(out.stats.sources_failed, 1);
        assert_eq!(out.stats.sources_ok, 1);
        assert_eq!(out.ranked.len(), 1);
        assert_eq!(out.ranked.recent[0].source, "KDnuggets");
    }

    #[test]
    fn bad_entries_are_counted() {
        let src = FeedSource::new("A", "https://a.example/feed", Category::Vendor);
        let outcomes = vec![ok(
            src,
            vec![
                entry("", "https://a.example/1", None),
                RawEntry {
                    title: Some("no link".into()),
                    ..RawEntry::default()
                },
                entry("fine", "https://a.example/2", None),
            ],
        )];
        let (articles, stats) = normalize_outcomes(outcomes, NOW.date());
        assert_eq!(articles.len(), 1);
        assert_eq!(stats.entries_seen, 3);
        assert_eq!(stats.entries_dropped, 2);
        assert_eq!(articles[0].fetched, NOW.date());
    }

    #[tokio::test]
    async fn seeded_articles_with_annotations_skip_enrichment() {
        struct Counting(AtomicUsize);
        #[async_trait]
        impl Enricher for Counting {
            fn name(&self) -> &'static str {
                "counting"
            }
            async fn enrich(&self, _article: &Article) -> Result<Enrichment, EnrichmentFailure> {
                self.0.fetch_add(1, AtomicOrdering::SeqCst);
                Ok(Enrichment {
                    summary: Some("fresh summary".into()),
                    drawbacks: Some("fresh drawback".into()),
                })
            }
        }

        let archived: Vec<Article> = (0..20)
            .map(|n| Article {
                title: format!("archived {n}"),
                link: format!("https://www.kdnuggets.com/archive/{n}"),
                source: "KDnuggets".into(),
                category: Category::Industry,
                published: Some(datetime!(2025-02-01 08:00 UTC)),
                fetched: datetime!(2025-02-01 08:00 UTC).date(),
                summary: Some("from an earlier run".into()),
                drawbacks: Some("from an earlier run".into()),
                body: None,
            })
            .collect();
        let src = FeedSource::new("KDnuggets", "https://www.kdnuggets.com/feed", Category::Industry);
        let outcomes = vec![ok(src, vec![entry("Today", "https://www.kdnuggets.com/today", Some(NOW))])];
        let cfg = RuntimeConfig::default();
        let counter = Counting(AtomicUsize::new(0));
        let out = process(&cfg, outcomes, NOW, PriorRun::from_articles(archived), &counter).await;

        assert_eq!(counter.0.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(out.stats.carried_over, 20);
        assert_eq!(out.stats.enrichment_skipped, 20);
        assert_eq!(out.stats.enriched, 1);
        assert!(
            out.ranked
                .older
                .iter()
                .all(|a| a.summary.as_deref() == Some("from an earlier run"))
        );
    }

    #[tokio::test]
    async fn empty_registry_yields_empty_ranking() {
        let cfg = RuntimeConfig::from(crate::config::AppConfig::default());
        let out = process(&cfg, Vec::new(), NOW, PriorRun::default(), &NoopEnricher).await;
        assert!(out.ranked.is_empty());
        assert_eq!(out.stats, RunStats::default());
    }
}
