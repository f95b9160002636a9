pub mod dedup;
pub mod enrich;
pub mod fetch;
mod model;
pub mod normalize;
pub mod rank;

pub use dedup::{Deduplicated, dedupe, dedupe_with_seed};
pub use enrich::{DynEnricher, EnrichStats, Enricher, Enrichment, build_enricher, enrich_all};
pub use fetch::{FetchedFeed, Fetcher, SourceOutcome};
pub use model::{Article, Category, RawEntry};
pub use normalize::{normalize_entry, normalize_link};
pub use rank::{RankedArticles, is_recent, rank};
