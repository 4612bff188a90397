use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use super::dto::{decode_quotes, Quote};
use super::error::QuoteError;

/// Source of current prices for a set of symbols.
#[async_trait]
pub trait QuoteClient: Send + Sync {
    async fn fetch_quotes(&self, symbols: &[String], api_key: &str) -> Result<Vec<Quote>, QuoteError>;
}

/// Twelve Data `/quote` endpoint.
#[derive(Clone)]
pub struct TwelveDataClient {
    client: Client,
    base_url: String,
    max_body_bytes: usize,
}

impl TwelveDataClient {
    pub fn new(base_url: &str, timeout: Duration, max_body_bytes: usize) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build quote http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_body_bytes,
        })
    }
}

/// Buffer the body, failing as soon as it grows past `limit`.
async fn read_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, QuoteError> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(QuoteError::TooLarge { limit });
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(QuoteError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[async_trait]
impl QuoteClient for TwelveDataClient {
    async fn fetch_quotes(&self, symbols: &[String], api_key: &str) -> Result<Vec<Quote>, QuoteError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let joined = symbols.join(",");
        debug!(symbols = %joined, "requesting quotes");

        let response = self
            .client
            .get(format!("{}/quote", self.base_url))
            .header("accept", "application/json")
            .query(&[("symbol", joined.as_str()), ("apikey", api_key)])
            .send()
            .await?;

        let status = response.status();
        let body = read_capped(response, self.max_body_bytes).await;
        if !status.is_success() {
            let excerpt: String = body
                .map(|b| String::from_utf8_lossy(&b).chars().take(200).collect())
                .unwrap_or_default();
            return Err(QuoteError::Status {
                status: status.as_u16(),
                body: excerpt,
            });
        }

        let body = body?;
        let quotes = decode_quotes(&String::from_utf8_lossy(&body))?;
        debug!(requested = symbols.len(), received = quotes.len(), "quotes decoded");
        Ok(quotes)
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{extract::Query, http::StatusCode, routing::get, Router};

    use super::*;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{}", addr)
    }

    async fn twelve_data(Query(q): Query<HashMap<String, String>>) -> (StatusCode, String) {
        if q.get("apikey").map(String::as_str) != Some("good-key") {
            return (
                StatusCode::OK,
                r#"{"code":401,"message":"invalid api key","status":"error"}"#.into(),
            );
        }
        let symbols: Vec<&str> = q.get("symbol").map(|s| s.split(',').collect()).unwrap_or_default();
        let body = if symbols.len() == 1 {
            format!(r#"{{"symbol":"{}","name":"Apple","close":"150.00"}}"#, symbols[0])
        } else {
            let entries: Vec<String> = symbols
                .iter()
                .map(|s| {
                    if *s == "MSFT" {
                        format!(r#""{s}":{{"symbol":"{s}","name":"Microsoft"}}"#)
                    } else {
                        format!(r#""{s}":{{"symbol":"{s}","name":"{s} Inc","close":"10.5"}}"#)
                    }
                })
                .collect();
            format!("{{{}}}", entries.join(","))
        };
        (StatusCode::OK, body)
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn fetches_single_quote() {
        let base = spawn_upstream(Router::new().route("/quote", get(twelve_data))).await;
        let client = TwelveDataClient::new(&base, Duration::from_secs(5), 64 * 1024).expect("client");
        let quotes = client
            .fetch_quotes(&symbols(&["AAPL"]), "good-key")
            .await
            .expect("quotes");
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].symbol, "AAPL");
        assert_eq!(quotes[0].name.as_deref(), Some("Apple"));
        assert_eq!(quotes[0].price, 150.0);
    }

    #[tokio::test]
    async fn fetches_batch_and_skips_missing_close() {
        let base = spawn_upstream(Router::new().route("/quote", get(twelve_data))).await;
        let client = TwelveDataClient::new(&format!("{base}/"), Duration::from_secs(5), 64 * 1024).expect("client");
        let mut quotes = client
            .fetch_quotes(&symbols(&["AAPL", "MSFT", "TSLA"]), "good-key")
            .await
            .expect("quotes");
        quotes.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        let got: Vec<&str> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(got, vec!["AAPL", "TSLA"]);
    }

    #[tokio::test]
    async fn provider_error_body_is_an_error() {
        let base = spawn_upstream(Router::new().route("/quote", get(twelve_data))).await;
        let client = TwelveDataClient::new(&base, Duration::from_secs(5), 64 * 1024).expect("client");
        let err = client
            .fetch_quotes(&symbols(&["AAPL"]), "bad-key")
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::Provider { code: Some(401), .. }));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/quote",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = spawn_upstream(router).await;
        let client = TwelveDataClient::new(&base, Duration::from_secs(5), 64 * 1024).expect("client");
        let err = client
            .fetch_quotes(&symbols(&["AAPL"]), "good-key")
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let router = Router::new().route(
            "/quote",
            get(|| async { format!(r#"{{"symbol":"AAPL","close":"1","pad":"{}"}}"#, "x".repeat(4096)) }),
        );
        let base = spawn_upstream(router).await;
        let client = TwelveDataClient::new(&base, Duration::from_secs(5), 1024).expect("client");
        let err = client
            .fetch_quotes(&symbols(&["AAPL"]), "good-key")
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::TooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn oversized_error_page_still_reports_status() {
        let router = Router::new().route(
            "/quote",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "x".repeat(4096)) }),
        );
        let base = spawn_upstream(router).await;
        let client = TwelveDataClient::new(&base, Duration::from_secs(5), 1024).expect("client");
        let err = client
            .fetch_quotes(&symbols(&["AAPL"]), "good-key")
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::Status { status: 503, ref body } if body.is_empty()));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let router = Router::new().route(
            "/quote",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "{}"
            }),
        );
        let base = spawn_upstream(router).await;
        let client = TwelveDataClient::new(&base, Duration::from_millis(200), 64 * 1024).expect("client");
        let err = client
            .fetch_quotes(&symbols(&["AAPL"]), "good-key")
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::Timeout));
    }

    #[tokio::test]
    async fn empty_symbol_list_skips_the_request() {
        let client = TwelveDataClient::new("http://127.0.0.1:9", Duration::from_secs(1), 64 * 1024).expect("client");
        let quotes = client.fetch_quotes(&[], "good-key").await.expect("no request");
        assert!(quotes.is_empty());
    }
}
