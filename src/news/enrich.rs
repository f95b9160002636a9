//! Optional summary and "potential drawback" annotations.
//!
//! The strategy is picked once from configuration and handed to the
//! pipeline as a trait object; later stages only ever see the optional
//! `summary`/`drawbacks` fields on [`Article`].

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

use super::model::{Article, Category};
use crate::config::{EnrichmentConfig, EnrichmentStrategy};
use crate::error::EnrichmentFailure;
use crate::util::sanitize::{excerpt, plain_text, truncate_chars};

const SUMMARY_SENTENCES: usize = 2;
const MAX_SUMMARY_CHARS: usize = 400;
const MAX_DRAWBACK_CHARS: usize = 200;

/// Fields an enricher proposes for one article. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub summary: Option<String>,
    pub drawbacks: Option<String>,
}

impl Enrichment {
    fn apply(self, article: &mut Article) {
        if let Some(s) = self.summary {
            article.summary = Some(s);
        }
        if let Some(d) = self.drawbacks {
            article.drawbacks = Some(d);
        }
    }
}

#[async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &'static str;
    async fn enrich(&self, article: &Article) -> Result<Enrichment, EnrichmentFailure>;
}

pub type DynEnricher = Arc<dyn Enricher>;

pub fn build_enricher(cfg: &EnrichmentConfig) -> Result<DynEnricher, reqwest::Error> {
    Ok(match cfg.strategy {
        EnrichmentStrategy::None => Arc::new(NoopEnricher),
        EnrichmentStrategy::Heuristic => Arc::new(HeuristicEnricher),
        EnrichmentStrategy::Generative => Arc::new(GenerativeEnricher::new(cfg)?),
    })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichStats {
    pub enriched: usize,
    pub failed: usize,
    /// Articles that already carried both fields, typically from the seed.
    pub skipped: usize,
}

/// Run `enricher` over every article, preserving order. Failures and
/// timeouts leave the article untouched; this never fails. Articles that
/// already have a summary and a drawback are not sent to the enricher.
pub async fn enrich_all(
    enricher: &dyn Enricher,
    articles: Vec<Article>,
    concurrency: usize,
    timeout: Duration,
) -> (Vec<Article>, EnrichStats) {
    let results: Vec<(Article, Option<Result<Enrichment, EnrichmentFailure>>)> = stream::iter(articles)
        .map(|article| async move {
            if is_complete(&article) {
                return (article, None);
            }
            let res = match tokio::time::timeout(timeout, enricher.enrich(&article)).await {
                Ok(res) => res,
                Err(_) => Err(EnrichmentFailure::Timeout(timeout.as_secs())),
            };
            (article, Some(res))
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut stats = EnrichStats::default();
    let mut out = Vec::with_capacity(results.len());
    for (mut article, res) in results {
        match res {
            None => stats.skipped += 1,
            Some(Ok(e)) => {
                if e != Enrichment::default() {
                    stats.enriched += 1;
                }
                e.apply(&mut article);
            }
            Some(Err(err)) => {
                stats.failed += 1;
                warn!(enricher = enricher.name(), link = %article.link, error = %err, "enrichment failed");
            }
        }
        out.push(article);
    }
    (out, stats)
}

fn is_complete(article: &Article) -> bool {
    article.summary.is_some() && article.drawbacks.is_some()
}

pub struct NoopEnricher;

#[async_trait]
impl Enricher for NoopEnricher {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn enrich(&self, _article: &Article) -> Result<Enrichment, EnrichmentFailure> {
        Ok(Enrichment::default())
    }
}

/// Excerpt of the entry body plus a keyword-templated drawback.
pub struct HeuristicEnricher;

#[async_trait]
impl Enricher for HeuristicEnricher {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn enrich(&self, article: &Article) -> Result<Enrichment, EnrichmentFailure> {
        let summary = match &article.summary {
            Some(_) => None,
            None => article
                .body
                .as_deref()
                .and_then(|b| excerpt(b, SUMMARY_SENTENCES))
                .map(|s| truncate_chars(&s, MAX_SUMMARY_CHARS)),
        };
        let effective = summary.as_deref().or(article.summary.as_deref());
        let drawback = suggest_drawback(&article.title, effective, article.category);
        Ok(Enrichment {
            summary,
            drawbacks: Some(drawback.to_string()),
        })
    }
}

struct DrawbackRule {
    pattern: &'static str,
    phrase: &'static str,
}

const DRAWBACK_RULES: &[DrawbackRule] = &[
    DrawbackRule {
        pattern: r"(?i)\b(?:security|breach\w*|privacy)\b",
        phrase: "May raise security and compliance concerns.",
    },
    DrawbackRule {
        pattern: r"(?i)\b(?:ai|machine learning|automation)\b",
        phrase: "Could require significant compute resources and expert oversight.",
    },
    DrawbackRule {
        pattern: r"(?i)\b(?:cloud|saas)\b",
        phrase: "Relies on external infrastructure and possible vendor lock-in.",
    },
    DrawbackRule {
        pattern: r"(?i)\b(?:partnerships?|integrations?)\b",
        phrase: "Integration complexity and potential data silos.",
    },
];

fn drawback_regexes() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        DRAWBACK_RULES
            .iter()
            .map(|r| Regex::new(r.pattern).expect("static regex"))
            .collect()
    })
}

/// First matching keyword rule over title and summary, else a default
/// keyed by category.
pub fn suggest_drawback(title: &str, summary: Option<&str>, category: Category) -> &'static str {
    let text = format!("{} {}", title, summary.unwrap_or(""));
    for (rule, re) in DRAWBACK_RULES.iter().zip(drawback_regexes()) {
        if re.is_match(&text) {
            return rule.phrase;
        }
    }
    match category {
        Category::Vendor => "Consider cost, adoption effort, and governance implications.",
        Category::Industry => "Trend may not translate directly into near-term product decisions.",
    }
}

/// Free-form text from an OpenAI-compatible chat completions endpoint.
pub struct GenerativeEnricher {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key_env: String,
    api_key: Option<String>,
}

impl GenerativeEnricher {
    pub fn new(cfg: &EnrichmentConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("analytics-digest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        let api_key = std::env::var(&cfg.api_key_env).ok().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!(var = %cfg.api_key_env, "api key not set; generative enrichment will be skipped");
        }
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key_env: cfg.api_key_env.clone(),
            api_key,
        })
    }

    fn prompt(article: &Article) -> String {
        format!(
            "Source: {}\nCategory: {}\nTitle: {}\nText: {}",
            article.source,
            article.category,
            article.title,
            article.body.as_deref().unwrap_or("")
        )
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

#[derive(Deserialize)]
struct Generated {
    summary: Option<String>,
    #[serde(alias = "drawbacks")]
    drawback: Option<String>,
}

const SYSTEM_PROMPT: &str = "You brief analytics product managers. Reply with ONLY a JSON object \
{\"summary\": \"<=2 plain sentences\", \"drawback\": \"one plain sentence naming a potential drawback\"}. \
No markdown, no HTML.";

#[async_trait]
impl Enricher for GenerativeEnricher {
    fn name(&self) -> &'static str {
        "generative"
    }

    async fn enrich(&self, article: &Article) -> Result<Enrichment, EnrichmentFailure> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EnrichmentFailure::MissingApiKey(self.api_key_env.clone()))?;
        let user = Self::prompt(article);
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.2,
            max_tokens: 200,
        };
        let resp: Resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let content = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EnrichmentFailure::Malformed("no choices".into()))?;
        debug!(link = %article.link, "completion received");
        parse_completion(&content)
    }
}

/// Parse the model's JSON reply, tolerating a surrounding code fence.
pub fn parse_completion(content: &str) -> Result<Enrichment, EnrichmentFailure> {
    let trimmed = content.trim();
    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &trimmed[s..=e],
        _ => return Err(EnrichmentFailure::Malformed(truncate_chars(trimmed, 80))),
    };
    let g: Generated = serde_json::from_str(json)
        .map_err(|e| EnrichmentFailure::Malformed(e.to_string()))?;
    let clean = |s: Option<String>, max: usize| {
        s.map(|v| plain_text(&v))
            .filter(|v| !v.is_empty())
            .map(|v| truncate_chars(&v, max))
    };
    let out = Enrichment {
        summary: clean(g.summary, MAX_SUMMARY_CHARS),
        drawbacks: clean(g.drawback, MAX_DRAWBACK_CHARS),
    };
    if out == Enrichment::default() {
        return Err(EnrichmentFailure::Malformed("empty fields".into()));
    }
    Ok(out)
}
