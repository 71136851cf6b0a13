//! Runtime settings for providers and the ledger.

use crate::{Error, Result};
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable names recognized by [`Settings::from_env`].
pub mod keys {
    pub const ALPHA_VANTAGE_KEY: &str = "ALPHA_VANTAGE_KEY";
    pub const RAPIDAPI_KEY: &str = "RAPIDAPI_KEY";
    pub const NEWSAPI_KEY: &str = "NEWSAPI_KEY";
    pub const NEWSAPI_COUNTRY: &str = "NEWSAPI_COUNTRY";
    pub const INITIAL_CASH: &str = "INITIAL_CASH";
    pub const PORTFOLIO_FILE: &str = "PORTFOLIO_FILE";
}

const DEFAULT_INITIAL_CASH: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);
const DEFAULT_NEWS_COUNTRY: &str = "us";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Credentials, paths and limits passed explicitly to the resolver, store and news client.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Primary quote + fundamentals provider key
    pub alpha_vantage_key: Option<String>,
    /// Secondary quote provider key
    pub rapidapi_key: Option<String>,
    /// News search key
    pub newsapi_key: Option<String>,
    /// Default locale for headline searches
    pub news_country: String,
    /// Cash given to a freshly created ledger
    pub initial_cash: Decimal,
    /// Location of the ledger file
    pub ledger_path: PathBuf,
    /// Per-request timeout for external providers
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha_vantage_key: None,
            rapidapi_key: None,
            newsapi_key: None,
            news_country: DEFAULT_NEWS_COUNTRY.to_string(),
            initial_cash: DEFAULT_INITIAL_CASH,
            ledger_path: Self::default_ledger_path(),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let initial_cash = match get(keys::INITIAL_CASH) {
            Some(raw) => parse_initial_cash(&raw)?,
            None => DEFAULT_INITIAL_CASH,
        };

        Ok(Self {
            alpha_vantage_key: get(keys::ALPHA_VANTAGE_KEY),
            rapidapi_key: get(keys::RAPIDAPI_KEY),
            newsapi_key: get(keys::NEWSAPI_KEY),
            news_country: get(keys::NEWSAPI_COUNTRY)
                .unwrap_or_else(|| DEFAULT_NEWS_COUNTRY.to_string()),
            initial_cash,
            ledger_path: get(keys::PORTFOLIO_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(Self::default_ledger_path),
            request_timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Get the default ledger file path.
    ///
    /// Default path: `~/.finance-agent/portfolio.json`
    pub fn default_ledger_path() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".finance-agent/portfolio.json"))
            .unwrap_or_else(|| PathBuf::from("portfolio.json"))
    }

    /// Override the ledger path.
    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = path.into();
        self
    }

    /// Override the initial cash balance.
    pub fn with_initial_cash(mut self, cash: Decimal) -> Self {
        self.initial_cash = cash;
        self
    }
}

fn parse_initial_cash(raw: &str) -> Result<Decimal> {
    let cash = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| Error::Config(format!("{} must be a number, got {raw:?}: {e}", keys::INITIAL_CASH)))?;

    if cash.is_sign_negative() {
        return Err(Error::Config(format!(
            "{} must not be negative, got {raw}",
            keys::INITIAL_CASH
        )));
    }
    Ok(cash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();

        assert_eq!(settings.alpha_vantage_key, None);
        assert_eq!(settings.rapidapi_key, None);
        assert_eq!(settings.newsapi_key, None);
        assert_eq!(settings.news_country, "us");
        assert_eq!(settings.initial_cash, dec!(10000));
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert!(settings.ledger_path.ends_with("portfolio.json"));
    }

    #[test]
    fn test_reads_all_keys() {
        let settings = Settings::from_lookup(lookup(&[
            ("ALPHA_VANTAGE_KEY", "av"),
            ("RAPIDAPI_KEY", "rapid"),
            ("NEWSAPI_KEY", "news"),
            ("NEWSAPI_COUNTRY", "fr"),
            ("INITIAL_CASH", "2500.50"),
            ("PORTFOLIO_FILE", "/tmp/ledger.json"),
        ]))
        .unwrap();

        assert_eq!(settings.alpha_vantage_key.as_deref(), Some("av"));
        assert_eq!(settings.rapidapi_key.as_deref(), Some("rapid"));
        assert_eq!(settings.newsapi_key.as_deref(), Some("news"));
        assert_eq!(settings.news_country, "fr");
        assert_eq!(settings.initial_cash, dec!(2500.50));
        assert_eq!(settings.ledger_path, PathBuf::from("/tmp/ledger.json"));
    }

    #[test]
    fn test_blank_key_is_unset() {
        let settings = Settings::from_lookup(lookup(&[("ALPHA_VANTAGE_KEY", "  ")])).unwrap();
        assert_eq!(settings.alpha_vantage_key, None);
    }

    #[test]
    fn test_invalid_initial_cash() {
        let result = Settings::from_lookup(lookup(&[("INITIAL_CASH", "lots")]));
        assert!(matches!(result, Err(Error::Config(_))));

        let result = Settings::from_lookup(lookup(&[("INITIAL_CASH", "-5")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_scientific_initial_cash() {
        let settings = Settings::from_lookup(lookup(&[("INITIAL_CASH", "1e4")])).unwrap();
        assert_eq!(settings.initial_cash, dec!(10000));
    }
}
