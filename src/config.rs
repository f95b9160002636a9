use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{env, fs, path::Path, path::PathBuf};

use crate::error::ConfigError;
use crate::news::Category;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub max_items: Option<usize>,
}

impl FeedSource {
    pub fn new(name: &str, url: &str, category: Category) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category,
            max_items: None,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    pub recency_days: u32,
    pub home_limit: usize,
    pub priority_sources: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            recency_days: 2,
            home_limit: 10,
            priority_sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            concurrency: 8,
            user_agent: concat!("analytics-digest/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStrategy {
    None,
    #[default]
    Heuristic,
    Generative,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub strategy: EnrichmentStrategy,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub concurrency: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            strategy: EnrichmentStrategy::default(),
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4o-mini".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 15,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Seeded articles first fetched more than this many days ago are dropped.
    pub retention_days: Option<u32>,
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub title: Option<String>,
    #[serde(default)]
    pub feeds: Vec<FeedSource>,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub feeds: Vec<FeedSource>,
    pub ranking: RankingConfig,
    pub fetch: FetchConfig,
    pub enrichment: EnrichmentConfig,
    pub archive: ArchiveConfig,
}

pub const DEFAULT_TITLE: &str = "Daily Analytics Digest";

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from(AppConfig {
            feeds: builtin_sources(),
            ..AppConfig::default()
        })
    }
}

impl From<AppConfig> for RuntimeConfig {
    fn from(parsed: AppConfig) -> Self {
        Self {
            title: parsed.title.unwrap_or_else(|| DEFAULT_TITLE.into()),
            feeds: parsed.feeds,
            ranking: parsed.ranking,
            fetch: parsed.fetch,
            enrichment: parsed.enrichment,
            archive: parsed.archive,
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for f in &self.feeds {
            if f.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("feed with url {:?} has no name", f.url)));
            }
            if f.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("feed {:?} has no url", f.name)));
            }
            if f.max_items == Some(0) {
                return Err(ConfigError::Invalid(format!("feed {:?}: max_items must be > 0", f.name)));
            }
            if !names.insert(f.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate feed name {:?}", f.name)));
            }
        }
        if self.ranking.home_limit == 0 {
            return Err(ConfigError::Invalid("ranking.home_limit must be > 0".into()));
        }
        if self.fetch.concurrency == 0 || self.enrichment.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be > 0".into()));
        }
        if self.fetch.timeout_secs == 0 || self.enrichment.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be > 0".into()));
        }
        Ok(())
    }
}

/// Resolve the run configuration.
///
/// An explicit path may point at a `config.toml`, a local RSS/Atom file, or
/// a feed URL; the latter two become a single-source registry. Without an
/// override the user config file is tried, then the built-in registry.
pub fn load(config_override: Option<String>) -> Result<RuntimeConfig, ConfigError> {
    let cfg = match config_override {
        Some(path_str) => load_override(path_str)?,
        None => match default_config_path() {
            Some(path) if path.is_file() => read_toml(&path)?,
            _ => RuntimeConfig::default(),
        },
    };
    cfg.validate()?;
    Ok(cfg)
}

fn load_override(path_str: String) -> Result<RuntimeConfig, ConfigError> {
    let p = PathBuf::from(&path_str);
    if p.is_file() {
        if path_str.to_ascii_lowercase().ends_with(".toml") {
            return read_toml(&p);
        }
        let bytes = fs::read(&p).map_err(|source| ConfigError::Read {
            path: p.clone(),
            source,
        })?;
        if feed_rs::parser::parse(bytes.as_slice()).is_err() {
            return Err(ConfigError::Invalid(format!(
                "{} is neither a .toml config nor an RSS/Atom feed",
                p.display()
            )));
        }
        let name = p
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("local-feed")
            .to_string();
        return Ok(single_source(FeedSource::new(&name, &path_str, Category::default())));
    }
    if path_str.starts_with("http://") || path_str.starts_with("https://") {
        return Ok(single_source(FeedSource::new("Custom", &path_str, Category::default())));
    }
    Err(ConfigError::Read {
        path: p,
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such config file"),
    })
}

fn single_source(feed: FeedSource) -> RuntimeConfig {
    RuntimeConfig::from(AppConfig {
        feeds: vec![feed],
        ..AppConfig::default()
    })
}

pub fn read_toml(path: &Path) -> Result<RuntimeConfig, ConfigError> {
    let txt = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_toml(&txt, path)
}

fn parse_toml(txt: &str, path: &Path) -> Result<RuntimeConfig, ConfigError> {
    let parsed: AppConfig = toml::from_str(txt).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parsed.into())
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let mut p = PathBuf::from(xdg);
        p.push("analytics-digest");
        p.push("config.toml");
        return Some(p);
    }
    if let Ok(home) = env::var("HOME") {
        let mut p = PathBuf::from(home);
        p.push(".config");
        p.push("analytics-digest");
        p.push("config.toml");
        return Some(p);
    }
    None
}

/// Registry used when no config file is supplied.
pub fn builtin_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new("Snowflake Blog", "https://www.snowflake.com/feed/", Category::Vendor)
            .with_max_items(5),
        FeedSource::new("Databricks Blog", "https://www.databricks.com/feed", Category::Vendor)
            .with_max_items(5),
        FeedSource::new("dbt Labs Blog", "https://www.getdbt.com/blog/rss.xml", Category::Vendor)
            .with_max_items(5),
        FeedSource::new("Tableau Blog", "https://www.tableau.com/blog/feed", Category::Vendor)
            .with_max_items(5),
        FeedSource::new(
            "Google Cloud Data Analytics",
            "https://cloudblog.withgoogle.com/products/data-analytics/rss/",
            Category::Vendor,
        )
        .with_max_items(5),
        FeedSource::new("KDnuggets", "https://www.kdnuggets.com/feed", Category::Industry)
            .with_max_items(5),
        FeedSource::new(
            "InfoWorld Analytics",
            "https://www.infoworld.com/category/analytics/index.rss",
            Category::Industry,
        )
        .with_max_items(5),
        FeedSource::new(
            "Towards Data Science",
            "https://towardsdatascience.com/feed",
            Category::Industry,
        )
        .with_max_items(5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(txt: &str) -> Result<RuntimeConfig, ConfigError> {
        parse_toml(txt, Path::new("test.toml"))
    }

    #[test]
    fn full_config_parses() {
        let cfg = parse(
            r#"
            title = "Competitor Watch"

            [[feeds]]
            name = "Snowflake Blog"
            url = "https://www.snowflake.com/feed/"
            category = "vendor"
            max_items = 3

            [[feeds]]
            name = "KDnuggets"
            url = "https://www.kdnuggets.com/feed"
            category = "industry"

            [ranking]
            recency_days = 3
            priority_sources = ["Snowflake Blog"]

            [enrichment]
            strategy = "none"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.title, "Competitor Watch");
        assert_eq!(cfg.feeds.len(), 2);
        assert_eq!(cfg.feeds[0].max_items, Some(3));
        assert_eq!(cfg.feeds[1].category, Category::Industry);
        assert_eq!(cfg.feeds[1].max_items, None);
        assert_eq!(cfg.ranking.recency_days, 3);
        assert_eq!(cfg.ranking.home_limit, 10);
        assert_eq!(cfg.enrichment.strategy, EnrichmentStrategy::None);
        assert_eq!(cfg.fetch.concurrency, 8);
        cfg.validate().unwrap();
    }

    #[test]
    fn category_defaults_to_vendor() {
        let cfg = parse(
            r#"
            [[feeds]]
            name = "Looker"
            url = "https://example.com/rss"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.feeds[0].category, Category::Vendor);
    }

    #[test]
    fn unknown_category_is_a_parse_error() {
        let err = parse(
            r#"
            [[feeds]]
            name = "Mystery"
            url = "https://example.com/rss"
            category = "gossip"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn empty_config_is_valid() {
        let cfg = parse("").unwrap();
        assert!(cfg.feeds.is_empty());
        cfg.validate().unwrap();
    }

    #[test]
    fn duplicate_names_and_zero_caps_are_rejected() {
        let dup = parse(
            r#"
            [[feeds]]
            name = "A"
            url = "https://a.example/rss"
            [[feeds]]
            name = "A"
            url = "https://b.example/rss"
            "#,
        )
        .unwrap();
        assert!(matches!(dup.validate(), Err(ConfigError::Invalid(_))));

        let zero = parse(
            r#"
            [[feeds]]
            name = "A"
            url = "https://a.example/rss"
            max_items = 0
            "#,
        )
        .unwrap();
        assert!(matches!(zero.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn builtin_registry_is_valid() {
        RuntimeConfig::default().validate().unwrap();
        assert!(builtin_sources().iter().any(|f| f.category == Category::Industry));
    }

    #[test]
    fn example_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml");
        let cfg = load(Some(path.into())).unwrap();
        assert_eq!(cfg.feeds.len(), 3);
        assert_eq!(cfg.archive.retention_days, Some(30));
    }

    #[test]
    fn local_feed_file_becomes_single_source() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/kdnuggets_atom.xml");
        let cfg = load(Some(path.into())).unwrap();
        assert_eq!(cfg.feeds.len(), 1);
        assert_eq!(cfg.feeds[0].name, "kdnuggets_atom");
        assert_eq!(cfg.feeds[0].url, path);
    }

    #[test]
    fn unrecognized_override_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeds.yaml");
        fs::write(&path, "feeds:\n  - name: Snowflake Blog\n    url: https://www.snowflake.com/feed/\n").unwrap();
        let err = load(Some(path.display().to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_override_path_is_fatal() {
        let err = load(Some("/definitely/not/here.toml".into())).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
