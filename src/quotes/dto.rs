use std::collections::BTreeMap;

use serde::{de::IgnoredAny, Deserialize, Serialize};
use serde_json::Value;

use super::error::QuoteError;

/// A current price for one symbol, ready to be written to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub name: Option<String>,
    pub price: f64,
}

/// Body of a quote API call. The provider answers with a bare quote object
/// when one symbol was requested and with a map keyed by symbol otherwise;
/// failures come back as an error object, often with a 200 status.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QuoteResponse {
    Error(ProviderError),
    Single(SingleQuote),
    Batch(BTreeMap<String, BatchEntry>),
}

#[derive(Debug, Deserialize)]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[allow(dead_code)]
    status: ErrorStatus,
}

#[derive(Debug, Deserialize)]
enum ErrorStatus {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Deserialize)]
pub struct SingleQuote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub close: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Quote(BatchQuote),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
pub struct BatchQuote {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub close: Option<Value>,
}

impl QuoteResponse {
    pub fn parse(body: &str) -> Result<Self, QuoteError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Flatten into quotes, dropping entries without a usable price.
    pub fn into_quotes(self) -> Result<Vec<Quote>, QuoteError> {
        match self {
            QuoteResponse::Error(e) => Err(QuoteError::Provider {
                code: e.code,
                message: e.message,
            }),
            QuoteResponse::Single(q) => Ok(parse_price(q.close.as_ref())
                .map(|price| Quote {
                    symbol: q.symbol,
                    name: non_empty(q.name),
                    price,
                })
                .into_iter()
                .collect()),
            QuoteResponse::Batch(entries) => Ok(entries
                .into_iter()
                .filter_map(|(symbol, entry)| match entry {
                    BatchEntry::Quote(q) => parse_price(q.close.as_ref()).map(|price| Quote {
                        symbol,
                        name: non_empty(q.name),
                        price,
                    }),
                    BatchEntry::Other(_) => None,
                })
                .collect()),
        }
    }
}

pub fn decode_quotes(body: &str) -> Result<Vec<Quote>, QuoteError> {
    QuoteResponse::parse(body)?.into_quotes()
}

fn parse_price(close: Option<&Value>) -> Option<f64> {
    let price = match close? {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    price.is_finite().then_some(price)
}

fn non_empty(name: Option<String>) -> Option<String> {
    name.filter(|n| !n.trim().is_empty())
}

/// Request body for an explicit refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub symbols: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_quote_decodes() {
        let quotes = decode_quotes(r#"{"symbol":"AAPL","name":"Apple","close":"150.00"}"#)
            .expect("decode");
        assert_eq!(
            quotes,
            vec![Quote {
                symbol: "AAPL".into(),
                name: Some("Apple".into()),
                price: 150.0,
            }]
        );
    }

    #[test]
    fn single_quote_without_close_yields_nothing() {
        let quotes = decode_quotes(r#"{"symbol":"AAPL","name":"Apple"}"#).expect("decode");
        assert!(quotes.is_empty());
    }

    #[test]
    fn batch_skips_entry_without_close() {
        let body = r#"{
            "AAPL": {"symbol":"AAPL","name":"Apple Inc","close":"189.25","exchange":"NASDAQ"},
            "MSFT": {"symbol":"MSFT","name":"Microsoft Corp"},
            "TSLA": {"symbol":"TSLA","name":"Tesla Inc","close":"not-a-number"}
        }"#;
        let quotes = decode_quotes(body).expect("decode");
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].symbol, "AAPL");
        assert_eq!(quotes[0].name.as_deref(), Some("Apple Inc"));
        assert_eq!(quotes[0].price, 189.25);
    }

    #[test]
    fn batch_skips_per_symbol_errors() {
        let body = r#"{
            "AAPL": {"symbol":"AAPL","name":"Apple Inc","close":"189.25"},
            "NOPE": {"code":404,"message":"symbol not found","status":"error"},
            "ODD": "unexpected"
        }"#;
        let quotes = decode_quotes(body).expect("decode");
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].symbol, "AAPL");
    }

    #[test]
    fn numeric_close_is_accepted() {
        let quotes = decode_quotes(r#"{"symbol":"VOO","close":412.5}"#).expect("decode");
        assert_eq!(quotes[0].price, 412.5);
        assert_eq!(quotes[0].name, None);
    }

    #[test]
    fn provider_error_is_reported() {
        let err = decode_quotes(
            r#"{"code":401,"message":"**apikey** parameter is incorrect","status":"error"}"#,
        )
        .unwrap_err();
        match err {
            QuoteError::Provider { code, message } => {
                assert_eq!(code, Some(401));
                assert!(message.contains("apikey"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(decode_quotes("<html>"), Err(QuoteError::Decode(_))));
        assert!(matches!(decode_quotes("[1,2]"), Err(QuoteError::Decode(_))));
    }

    #[test]
    fn refresh_request_defaults_to_no_symbols() {
        let req: RefreshRequest = serde_json::from_str("{}").expect("decode");
        assert!(req.symbols.is_empty());
    }
}
