//! Quote provider adapters.
//!
//! Each provider turns one external API's response into a [`Quote`]. Parsing is
//! pure: fields the provider does not supply stay `None`, and payloads that are
//! not JSON produce an empty quote. Only the HTTP exchange itself can fail.

mod alpha_vantage;
mod rapidapi;

pub use alpha_vantage::{apply_overview, parse_global_quote, AlphaVantageProvider, ALPHA_VANTAGE_URL};
pub use rapidapi::{parse_quote, RapidApiYahooProvider, MARKET_CAP_RULES, PRICE_RULES, RAPIDAPI_YAHOO_URL};

use crate::types::Quote;
use reqwest::blocking::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

const USER_AGENT: &str = concat!("finance-core/", env!("CARGO_PKG_VERSION"));

/// A source of quotes for a symbol.
pub trait QuoteProvider {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch and normalize a quote. The symbol is already normalized.
    fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError>;
}

/// Failure of a single provider. Never escapes the resolver.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("provider refused the request: {0}")]
    Refused(String),

    #[error("no price in response")]
    MissingPrice,
}

/// Build the blocking HTTP client shared by the providers.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Send a request and decode the body as JSON.
///
/// Transport errors and non-2xx statuses are errors. A body that is not JSON
/// decodes to `Value::Null` so adapters produce an empty quote.
pub(crate) fn fetch_json(request: RequestBuilder) -> Result<Value, ProviderError> {
    let response = request.header("Accept", "application/json").send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }

    let body = response.text()?;
    Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
}

/// Read a decimal from a JSON value.
///
/// Accepts numbers, numeric strings and `{"raw": <number>}` wrappers.
/// Anything else (including `"None"` and `"-"`) is absent.
pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        Value::Object(map) => map.get("raw").and_then(decimal_from_value),
        _ => None,
    }
}

/// Follow a path of object keys.
pub(crate) fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake providers for resolver and report tests.

    use super::*;
    use std::cell::Cell;

    pub enum Behavior {
        Price(Decimal),
        NoPrice,
        Status(u16),
    }

    /// Provider returning a fixed outcome and counting calls.
    pub struct FakeProvider {
        pub name: &'static str,
        pub behavior: Behavior,
        pub calls: Cell<usize>,
    }

    impl FakeProvider {
        pub fn price(name: &'static str, price: Decimal) -> Self {
            Self::new(name, Behavior::Price(price))
        }

        pub fn failing(name: &'static str) -> Self {
            Self::new(name, Behavior::Status(503))
        }

        pub fn empty(name: &'static str) -> Self {
            Self::new(name, Behavior::NoPrice)
        }

        fn new(name: &'static str, behavior: Behavior) -> Self {
            Self {
                name,
                behavior,
                calls: Cell::new(0),
            }
        }
    }

    impl QuoteProvider for FakeProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            match self.behavior {
                Behavior::Price(price) => Ok(Quote {
                    price: Some(price),
                    ..Quote::empty(symbol)
                }),
                Behavior::NoPrice => Ok(Quote::empty(symbol)),
                Behavior::Status(code) => Err(ProviderError::Status(code)),
            }
        }
    }

    /// Shares a fake between the test and the resolver that owns it.
    impl<P: QuoteProvider + ?Sized> QuoteProvider for std::rc::Rc<P> {
        fn name(&self) -> &'static str {
            (**self).name()
        }

        fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError> {
            (**self).fetch(symbol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_from_value_shapes() {
        assert_eq!(decimal_from_value(&json!(187.44)), Some(dec!(187.44)));
        assert_eq!(decimal_from_value(&json!(3000000000000u64)), Some(dec!(3000000000000)));
        assert_eq!(decimal_from_value(&json!("187.4400")), Some(dec!(187.44)));
        assert_eq!(decimal_from_value(&json!({"raw": 12.5, "fmt": "12.50"})), Some(dec!(12.5)));
    }

    #[test]
    fn test_decimal_from_value_absent() {
        assert_eq!(decimal_from_value(&json!("None")), None);
        assert_eq!(decimal_from_value(&json!("-")), None);
        assert_eq!(decimal_from_value(&json!("")), None);
        assert_eq!(decimal_from_value(&json!(null)), None);
        assert_eq!(decimal_from_value(&json!([1, 2])), None);
        assert_eq!(decimal_from_value(&json!({"fmt": "1.2T"})), None);
    }

    #[test]
    fn test_lookup_path() {
        let value = json!({"a": {"b": {"c": 1}}});
        assert_eq!(lookup(&value, &["a", "b", "c"]), Some(&json!(1)));
        assert_eq!(lookup(&value, &["a", "x"]), None);
        assert_eq!(lookup(&json!("text"), &["a"]), None);
    }
}
