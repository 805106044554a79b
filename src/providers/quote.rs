use crate::content::{ContentItem, ContentType, Quote};
use crate::providers::{get_json, ContentProvider};
use async_trait::async_trait;
use serde::Deserialize;

fn author_or_unknown(author: Option<String>) -> String {
    author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

// --- ZenQuotes ---

#[derive(Deserialize)]
struct ZenQuoteEntry {
    q: String,
    a: Option<String>,
}

http_provider!(ZenQuotes, "https://zenquotes.io");

#[async_trait]
impl ContentProvider for ZenQuotes {
    fn name(&self) -> &str {
        "ZenQuotes"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Quote
    }

    async fn fetch(&self) -> anyhow::Result<ContentItem> {
        let url = format!("{}/api/random", self.base_url);
        let entries: Vec<ZenQuoteEntry> = get_json(&self.http, &url).await?;
        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("ZenQuotes returned an empty list"))?;

        Ok(ContentItem::Quote(Quote {
            text: entry.q,
            author: author_or_unknown(entry.a),
            source: self.name().to_string(),
        }))
    }
}

// --- Quotable ---

#[derive(Deserialize)]
struct QuotableResponse {
    content: String,
    author: Option<String>,
}

http_provider!(Quotable, "https://api.quotable.io");

#[async_trait]
impl ContentProvider for Quotable {
    fn name(&self) -> &str {
        "Quotable"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Quote
    }

    async fn fetch(&self) -> anyhow::Result<ContentItem> {
        let url = format!("{}/random", self.base_url);
        let response: QuotableResponse = get_json(&self.http, &url).await?;

        Ok(ContentItem::Quote(Quote {
            text: response.content,
            author: author_or_unknown(response.author),
            source: self.name().to_string(),
        }))
    }
}

// --- FavQs ---

#[derive(Deserialize)]
struct FavQsResponse {
    quote: FavQsQuote,
}

#[derive(Deserialize)]
struct FavQsQuote {
    body: String,
    author: Option<String>,
}

http_provider!(FavQs, "https://favqs.com");

#[async_trait]
impl ContentProvider for FavQs {
    fn name(&self) -> &str {
        "FavQs"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Quote
    }

    async fn fetch(&self) -> anyhow::Result<ContentItem> {
        let url = format!("{}/api/qotd", self.base_url);
        let response: FavQsResponse = get_json(&self.http, &url).await?;

        Ok(ContentItem::Quote(Quote {
            text: response.quote.body,
            author: author_or_unknown(response.quote.author),
            source: self.name().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FALLBACK_SOURCE;
    use crate::providers::ProviderChain;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quote_of(item: ContentItem) -> Quote {
        match item {
            ContentItem::Quote(q) => q,
            other => panic!("expected a quote, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zenquotes_parses_first_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/random"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"q": "Stay hungry.", "a": "Steve Jobs", "h": "<blockquote/>"}
            ])))
            .mount(&server)
            .await;

        let provider = ZenQuotes::with_base_url(reqwest::Client::new(), server.uri());
        let quote = quote_of(provider.fetch().await.unwrap());
        assert_eq!(quote.text, "Stay hungry.");
        assert_eq!(quote.author, "Steve Jobs");
        assert_eq!(quote.source, "ZenQuotes");
    }

    #[tokio::test]
    async fn test_quotable_missing_author_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/random"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "Be kind."})))
            .mount(&server)
            .await;

        let provider = Quotable::with_base_url(reqwest::Client::new(), server.uri());
        let quote = quote_of(provider.fetch().await.unwrap());
        assert_eq!(quote.text, "Be kind.");
        assert_eq!(quote.author, "Unknown");
    }

    #[tokio::test]
    async fn test_favqs_parses_nested_quote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/qotd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "qotd_date": "2026-01-01",
                "quote": {"body": "Less is more.", "author": "Mies"}
            })))
            .mount(&server)
            .await;

        let provider = FavQs::with_base_url(reqwest::Client::new(), server.uri());
        let quote = quote_of(provider.fetch().await.unwrap());
        assert_eq!(quote.text, "Less is more.");
        assert_eq!(quote.source, "FavQs");
    }

    #[tokio::test]
    async fn test_malformed_and_failing_upstreams_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/random"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/random"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/qotd"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        assert!(ZenQuotes::with_base_url(http.clone(), server.uri()).fetch().await.is_err());
        assert!(Quotable::with_base_url(http.clone(), server.uri()).fetch().await.is_err());
        assert!(FavQs::with_base_url(http, server.uri()).fetch().await.is_err());
    }

    #[tokio::test]
    async fn test_chain_skips_broken_quote_provider() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/random"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/random"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"content": "Second best.", "author": "B"})),
            )
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let mut chain = ProviderChain::new(Duration::from_secs(2));
        chain.register(Arc::new(ZenQuotes::with_base_url(http.clone(), server.uri())));
        chain.register(Arc::new(Quotable::with_base_url(http, server.uri())));

        let item = chain.fetch(ContentType::Quote).await;
        assert_eq!(item.primary_text(), "Second best.");
    }

    #[tokio::test]
    async fn test_chain_falls_back_when_upstream_is_slow() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/random"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"q": "Too late.", "a": "Slow"}]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let mut chain = ProviderChain::new(Duration::from_millis(50));
        chain.register(Arc::new(ZenQuotes::with_base_url(reqwest::Client::new(), server.uri())));

        let item = chain.fetch(ContentType::Quote).await;
        assert_eq!(item.source(), FALLBACK_SOURCE);
    }
}
