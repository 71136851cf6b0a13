//! Alpha Vantage: live price (`GLOBAL_QUOTE`) plus fundamentals (`OVERVIEW`).

use super::{decimal_from_value, fetch_json, http_client, lookup, ProviderError, QuoteProvider};
use crate::types::Quote;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

/// Alpha Vantage query endpoint.
pub const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Keys Alpha Vantage uses to report throttling or bad requests with a 200 status.
const NOTICE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// Primary provider: quote and fundamentals.
#[derive(Debug, Clone)]
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageProvider {
    /// Create a provider with the given key and per-request timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            base_url: ALPHA_VANTAGE_URL.to_string(),
        })
    }

    /// Point the provider at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn query(&self, function: &str, symbol: &str) -> Result<Value, ProviderError> {
        let request = self.client.get(&self.base_url).query(&[
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ]);
        fetch_json(request)
    }
}

impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let payload = self.query("GLOBAL_QUOTE", symbol)?;
        let mut quote = parse_global_quote(symbol, &payload);

        if !quote.has_price() {
            return Err(match notice(&payload) {
                Some(message) => ProviderError::Refused(message),
                None => ProviderError::MissingPrice,
            });
        }

        // Fundamentals are best effort once we have a price.
        match self.query("OVERVIEW", symbol) {
            Ok(overview) => apply_overview(&mut quote, &overview),
            Err(e) => tracing::debug!(symbol, error = %e, "Alpha Vantage overview unavailable"),
        }

        Ok(quote)
    }
}

/// Normalize a `GLOBAL_QUOTE` payload.
pub fn parse_global_quote(symbol: &str, payload: &Value) -> Quote {
    Quote {
        price: lookup(payload, &["Global Quote", "05. price"]).and_then(decimal_from_value),
        ..Quote::empty(symbol)
    }
}

/// Fill market cap and P/E from an `OVERVIEW` payload. Existing values are kept
/// when the payload lacks them.
pub fn apply_overview(quote: &mut Quote, payload: &Value) {
    if let Some(market_cap) = payload
        .get("MarketCapitalization")
        .and_then(decimal_from_value)
    {
        quote.market_cap = Some(market_cap);
    }

    let pe = ["PERatio", "PE"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(decimal_from_value));
    if let Some(pe) = pe {
        quote.price_to_earnings = Some(pe);
    }
}

fn notice(payload: &Value) -> Option<String> {
    NOTICE_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
