//! Price resolution across quote providers in priority order.

use crate::config::Settings;
use crate::quote::{AlphaVantageProvider, QuoteProvider, RapidApiYahooProvider};
use crate::types::{normalize_symbol, Quote};
use crate::{Error, Result};

/// Tries each provider in order and returns the first quote with a price.
pub struct PriceResolver {
    providers: Vec<Box<dyn QuoteProvider>>,
}

impl std::fmt::Debug for PriceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceResolver")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl PriceResolver {
    /// Create a resolver over explicit providers, highest priority first.
    pub fn new(providers: Vec<Box<dyn QuoteProvider>>) -> Self {
        Self { providers }
    }

    /// Build the configured providers: Alpha Vantage first, then RapidAPI Yahoo.
    ///
    /// Providers without a credential are left out.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut providers: Vec<Box<dyn QuoteProvider>> = Vec::new();

        if let Some(key) = &settings.alpha_vantage_key {
            providers.push(Box::new(AlphaVantageProvider::new(
                key.clone(),
                settings.request_timeout,
            )?));
        }
        if let Some(key) = &settings.rapidapi_key {
            providers.push(Box::new(RapidApiYahooProvider::new(
                key.clone(),
                settings.request_timeout,
            )?));
        }

        if providers.is_empty() {
            tracing::warn!("No quote provider configured; price lookups will fail");
        }

        Ok(Self::new(providers))
    }

    /// Names of the configured providers in priority order.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve the current quote for a symbol.
    ///
    /// Fails with [`Error::PriceUnavailable`] when every provider failed, none
    /// returned a price, or no provider is configured.
    pub fn resolve(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol);
        let last = self.providers.len().saturating_sub(1);

        for (idx, provider) in self.providers.iter().enumerate() {
            let error = match provider.fetch(&symbol) {
                Ok(quote) if quote.has_price() => {
                    tracing::debug!(symbol = %symbol, provider = provider.name(), "Resolved price");
                    return Ok(quote);
                }
                Ok(_) => "no price in response".to_string(),
                Err(e) => e.to_string(),
            };

            if idx < last {
                tracing::info!(
                    symbol = %symbol,
                    provider = provider.name(),
                    error = %error,
                    "Quote provider failed, falling back"
                );
            } else {
                tracing::error!(
                    symbol = %symbol,
                    provider = provider.name(),
                    error = %error,
                    "Last quote provider failed"
                );
            }
        }

        Err(Error::PriceUnavailable(symbol))
    }
}
