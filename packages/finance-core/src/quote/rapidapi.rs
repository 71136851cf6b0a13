//! Yahoo Finance through RapidAPI, used as the fallback quote source.
//!
//! The response shape varies between symbols and API revisions, so fields are
//! located with ordered extraction rules instead of a fixed schema.

use super::{decimal_from_value, fetch_json, http_client, lookup, ProviderError, QuoteProvider};
use crate::types::Quote;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;

/// Default RapidAPI Yahoo Finance base URL.
pub const RAPIDAPI_YAHOO_URL: &str = "https://yahoo-finance15.p.rapidapi.com";

const RAPIDAPI_HOST: &str = "yahoo-finance15.p.rapidapi.com";

/// Key paths tried in order for the price. First non-zero value wins.
pub const PRICE_RULES: &[&[&str]] = &[
    &["quote", "regularMarketPrice"],
    &["quote", "regularMarketPreviousClose"],
    &["price", "regularMarketPrice"],
    &["price", "regularMarketPreviousClose"],
];

/// Key paths tried in order for the market capitalization.
pub const MARKET_CAP_RULES: &[&[&str]] = &[&["quote", "marketCap"], &["price", "marketCap"]];

/// Secondary provider: price and market cap only.
#[derive(Debug, Clone)]
pub struct RapidApiYahooProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl RapidApiYahooProvider {
    /// Create a provider with the given key and per-request timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            base_url: RAPIDAPI_YAHOO_URL.to_string(),
        })
    }

    /// Point the provider at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl QuoteProvider for RapidApiYahooProvider {
    fn name(&self) -> &'static str {
        "rapidapi_yahoo"
    }

    fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let url = format!(
            "{}/api/yahoo/qu/quote/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        );
        let request = self
            .client
            .get(url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", RAPIDAPI_HOST);

        let payload = fetch_json(request)?;
        Ok(parse_quote(symbol, &payload))
    }
}

/// Normalize a RapidAPI Yahoo payload using [`PRICE_RULES`] and [`MARKET_CAP_RULES`].
pub fn parse_quote(symbol: &str, payload: &Value) -> Quote {
    Quote {
        price: extract(payload, PRICE_RULES),
        market_cap: extract(payload, MARKET_CAP_RULES),
        ..Quote::empty(symbol)
    }
}

fn extract(payload: &Value, rules: &[&[&str]]) -> Option<Decimal> {
    rules.iter().find_map(|path| {
        lookup(payload, path)
            .and_then(decimal_from_value)
            .filter(|value| !value.is_zero())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_quote_container_plain_numbers() {
        let payload = json!({
            "quote": {"regularMarketPrice": 189.98, "marketCap": 2950000000000u64}
        });

        let quote = parse_quote("AAPL", &payload);
        assert_eq!(quote.price, Some(dec!(189.98)));
        assert_eq!(quote.market_cap, Some(dec!(2950000000000)));
        assert_eq!(quote.price_to_earnings, None);
    }

    #[test]
    fn test_price_container_raw_wrappers() {
        let payload = json!({
            "price": {
                "regularMarketPrice": {"raw": 412.3, "fmt": "412.30"},
                "marketCap": {"raw": 3060000000000u64, "fmt": "3.06T"}
            }
        });

        let quote = parse_quote("MSFT", &payload);
        assert_eq!(quote.price, Some(dec!(412.3)));
        assert_eq!(quote.market_cap, Some(dec!(3060000000000)));
    }

    #[test]
    fn test_previous_close_when_market_price_missing() {
        let payload = json!({
            "quote": {"regularMarketPrice": null, "regularMarketPreviousClose": "55.10"}
        });
        assert_eq!(parse_quote("X", &payload).price, Some(dec!(55.10)));

        let payload = json!({"quote": {"regularMarketPrice": 0, "regularMarketPreviousClose": 54}});
        assert_eq!(parse_quote("X", &payload).price, Some(dec!(54)));
    }

    #[test]
    fn test_unknown_shapes_yield_empty_quote() {
        for payload in [
            json!(null),
            json!([{"regularMarketPrice": 10}]),
            json!({"message": "You are not subscribed to this API."}),
            json!({"quote": "n/a"}),
            json!({"quote": {"regularMarketPrice": {"fmt": "10.00"}}}),
        ] {
            let quote = parse_quote("X", &payload);
            assert_eq!(quote, Quote::empty("X"), "payload: {payload}");
        }
    }

    #[test]
    fn test_rules_are_ordered() {
        let payload = json!({
            "quote": {"regularMarketPrice": 1},
            "price": {"regularMarketPrice": 2}
        });
        assert_eq!(parse_quote("X", &payload).price, Some(dec!(1)));
    }

    fn provider(server: &mockito::Server) -> RapidApiYahooProvider {
        RapidApiYahooProvider::new("secret", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.url())
    }

    #[test]
    fn test_fetch_sends_path_and_headers() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/yahoo/qu/quote/AAPL")
            .match_header("x-rapidapi-key", "secret")
            .match_header("x-rapidapi-host", RAPIDAPI_HOST)
            .with_body(r#"{"quote": {"regularMarketPrice": 189.5, "marketCap": 2950000000000}}"#)
            .create();

        let quote = provider(&server).fetch("AAPL").unwrap();

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, Some(dec!(189.5)));
        assert_eq!(quote.market_cap, Some(dec!(2950000000000)));
        assert_eq!(quote.price_to_earnings, None);
        mock.assert();
    }

    #[test]
    fn test_error_status() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/yahoo/qu/quote/AAPL")
            .with_status(429)
            .create();

        assert!(matches!(
            provider(&server).fetch("AAPL"),
            Err(ProviderError::Status(429))
        ));
    }

    #[test]
    fn test_non_json_body_yields_no_price() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/yahoo/qu/quote/AAPL")
            .with_body("<html>maintenance</html>")
            .create();

        let quote = provider(&server).fetch("AAPL").unwrap();
        assert!(!quote.has_price());
    }
}
