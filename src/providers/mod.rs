use crate::config::Config;
use crate::content::{ContentItem, ContentType, Question};
use crate::error::PipelineError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Declares an HTTP-backed provider with an overridable base URL.
macro_rules! http_provider {
    ($name:ident, $default_url:expr) => {
        pub struct $name {
            http: reqwest::Client,
            base_url: String,
        }

        impl $name {
            pub const DEFAULT_URL: &'static str = $default_url;

            pub fn new(http: reqwest::Client) -> Self {
                Self::with_base_url(http, Self::DEFAULT_URL)
            }

            pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
                Self {
                    http,
                    base_url: base_url.into(),
                }
            }
        }
    };
}

pub mod fallback;
pub mod question;
pub mod quote;

/// Maximum number of multiple-choice options kept on a question.
pub const MAX_OPTIONS: usize = 4;

/// One upstream content source.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    fn name(&self) -> &str;
    fn content_type(&self) -> ContentType;
    async fn fetch(&self) -> anyhow::Result<ContentItem>;
}

/// Anything that can hand out the next candidate item for a content type.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn next_item(&self, kind: ContentType) -> ContentItem;
}

/// Ordered providers per content type, backed by the built-in fallback pools.
///
/// Quote providers are tried in registration order. Question providers are
/// shuffled on every call. A provider that errors, times out or returns an
/// item without text counts as a miss and the next one is tried. When every
/// provider misses, a random pool item is returned, so `fetch` never fails.
pub struct ProviderChain {
    quote_providers: Vec<Arc<dyn ContentProvider>>,
    question_providers: Vec<Arc<dyn ContentProvider>>,
    timeout: Duration,
}

impl ProviderChain {
    pub fn new(timeout: Duration) -> Self {
        Self {
            quote_providers: Vec::new(),
            question_providers: Vec::new(),
            timeout,
        }
    }

    /// The built-in providers, minus any disabled in `providers.toml`.
    pub fn with_defaults(http: reqwest::Client, config: &Config) -> Self {
        let mut chain = Self::new(config.request_timeout);
        let providers: Vec<Arc<dyn ContentProvider>> = vec![
            Arc::new(quote::ZenQuotes::new(http.clone())),
            Arc::new(quote::Quotable::new(http.clone())),
            Arc::new(quote::FavQs::new(http.clone())),
            Arc::new(question::OpenTriviaDb::new(http.clone())),
            Arc::new(question::TriviaApi::new(http.clone())),
            Arc::new(question::NumbersApi::new(http.clone())),
            Arc::new(question::AdviceSlip::new(http)),
        ];

        for provider in providers {
            if config.is_provider_enabled(provider.name()) {
                chain.register(provider);
            } else {
                info!("Provider chain: '{}' disabled by configuration", provider.name());
            }
        }
        chain
    }

    pub fn register(&mut self, provider: Arc<dyn ContentProvider>) {
        match provider.content_type() {
            ContentType::Quote => self.quote_providers.push(provider),
            ContentType::Question => self.question_providers.push(provider),
        }
    }

    /// The order providers will be tried in for one call.
    pub fn providers_for(&self, kind: ContentType) -> Vec<Arc<dyn ContentProvider>> {
        match kind {
            ContentType::Quote => self.quote_providers.clone(),
            ContentType::Question => {
                let mut providers = self.question_providers.clone();
                providers.shuffle(&mut rand::thread_rng());
                providers
            }
        }
    }

    pub async fn fetch(&self, kind: ContentType) -> ContentItem {
        debug!("Provider chain: fetching {}...", kind);

        for provider in self.providers_for(kind) {
            match self.try_provider(provider.as_ref(), kind).await {
                Ok(item) => {
                    info!("Provider chain: {} fetched from {}", kind, provider.name());
                    return normalize(item);
                }
                Err(miss) => warn!("Provider chain: {}", miss),
            }
        }

        warn!("Provider chain: all {} providers missed, using fallback pool", kind);
        normalize(fallback::random_item(kind))
    }

    async fn try_provider(
        &self,
        provider: &dyn ContentProvider,
        kind: ContentType,
    ) -> Result<ContentItem, PipelineError> {
        let miss = |reason: String| PipelineError::ProviderMiss {
            provider: provider.name().to_string(),
            reason,
        };

        let item = timeout(self.timeout, provider.fetch())
            .await
            .map_err(|_| miss(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| miss(e.to_string()))?;

        if item.content_type() != kind {
            return Err(miss(format!("returned a {} instead of a {}", item.content_type(), kind)));
        }
        if !item.is_usable() {
            return Err(miss("returned an item without text".to_string()));
        }
        Ok(item)
    }
}

#[async_trait]
impl ContentSource for ProviderChain {
    async fn next_item(&self, kind: ContentType) -> ContentItem {
        self.fetch(kind).await
    }
}

async fn get_json<T: serde::de::DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
) -> anyhow::Result<T> {
    use anyhow::Context as _;

    let body = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    serde_json::from_str(&body).with_context(|| format!("Unexpected response shape from {}", url))
}

/// Decodes the HTML entities trivia APIs are known to emit.
pub fn decode_html_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

fn normalize(item: ContentItem) -> ContentItem {
    match item {
        ContentItem::Quote(quote) => ContentItem::Quote(quote),
        ContentItem::Question(question) => ContentItem::Question(normalize_question(question)),
    }
}

fn normalize_question(question: Question) -> Question {
    let correct_answer = question.correct_answer.map(|a| decode_html_entities(&a));
    let options = question.options.map(|options| {
        let decoded = options.iter().map(|o| decode_html_entities(o)).collect();
        shuffle_options(decoded, correct_answer.as_deref())
    });

    Question {
        text: decode_html_entities(&question.text),
        category: decode_html_entities(&question.category),
        correct_answer,
        options,
        ..question
    }
}

/// Caps the options at `MAX_OPTIONS`, always keeping the correct answer, and
/// shuffles them so the answer's position carries no signal.
pub fn shuffle_options(options: Vec<String>, correct: Option<&str>) -> Vec<String> {
    let mut kept: Vec<String> = match correct {
        Some(answer) if options.iter().any(|o| o == answer) => {
            let mut kept: Vec<String> = options
                .into_iter()
                .filter(|o| o != answer)
                .take(MAX_OPTIONS - 1)
                .collect();
            kept.push(answer.to_string());
            kept
        }
        _ => options.into_iter().take(MAX_OPTIONS).collect(),
    };
    kept.shuffle(&mut rand::thread_rng());
    kept
}
