//! Agent-facing tool surface.
//!
//! Thin wrappers over the resolver, executor and reporter that shape results
//! the way the agents consume them.

use crate::config::Settings;
use crate::executor::InvestmentExecutor;
use crate::ledger::{JsonFileStore, LedgerStore};
use crate::news::{Article, NewsClient, Topic};
use crate::report::{PortfolioReport, PortfolioReporter};
use crate::resolver::PriceResolver;
use crate::types::{Ledger, Quote};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `get_financial_data` result. Absent values serialize as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialData {
    pub symbol: String,
    pub price: Option<Decimal>,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<Decimal>,
    #[serde(rename = "PER")]
    pub per: Option<Decimal>,
}

impl From<Quote> for FinancialData {
    fn from(quote: Quote) -> Self {
        Self {
            symbol: quote.symbol,
            price: quote.price,
            market_cap: quote.market_cap,
            per: quote.price_to_earnings,
        }
    }
}

/// Status of an `execute_investment` call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// `execute_investment` result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestmentOutcome {
    pub status: OutcomeStatus,
    pub message: String,
}

impl InvestmentOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// The four agent tools over one ledger store.
#[derive(Debug)]
pub struct FinanceTools<S = JsonFileStore> {
    executor: InvestmentExecutor<S>,
    resolver: PriceResolver,
    news: Option<NewsClient>,
}

impl FinanceTools<JsonFileStore> {
    /// Wire the file-backed ledger and every configured provider.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.newsapi_key.is_none() {
            tracing::warn!("NEWSAPI_KEY not set; search_news will fail until configured");
        }
        if settings.alpha_vantage_key.is_none() {
            tracing::info!("ALPHA_VANTAGE_KEY not set; quotes will use the RapidAPI fallback only");
        }

        Ok(Self::new(
            JsonFileStore::from_settings(settings),
            PriceResolver::from_settings(settings)?,
            NewsClient::from_settings(settings)?,
        ))
    }
}

impl<S: LedgerStore> FinanceTools<S> {
    pub fn new(store: S, resolver: PriceResolver, news: Option<NewsClient>) -> Self {
        Self {
            executor: InvestmentExecutor::new(store),
            resolver,
            news,
        }
    }

    /// Get the ledger store.
    pub fn store(&self) -> &S {
        self.executor.store()
    }

    /// Current ledger contents (initializes it when missing).
    pub fn ledger(&self) -> Result<Ledger> {
        self.store().read()
    }

    /// Search news articles (at most five).
    pub fn search_news(&self, query: &str, topic: &str) -> Result<Vec<Article>> {
        let news = self.news.as_ref().ok_or(Error::NotConfigured("NEWSAPI_KEY"))?;
        news.search(query, Topic::from(topic))
    }

    /// Price, market cap and P/E for a symbol.
    pub fn get_financial_data(&self, symbol: &str) -> Result<FinancialData> {
        self.resolver.resolve(symbol).map(FinancialData::from)
    }

    /// Buy shares. Rejected orders are returned as an error outcome; a failure
    /// to persist the ledger is returned as `Err`.
    pub fn execute_investment(
        &self,
        symbol: &str,
        quantity: i64,
        price: Decimal,
        rationale: &str,
    ) -> Result<InvestmentOutcome> {
        match self.executor.execute(symbol, quantity, price, rationale) {
            Ok(fill) => Ok(InvestmentOutcome::success(fill.message())),
            Err(e) if e.is_rejection() => Ok(InvestmentOutcome::error(e.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Structured portfolio valuation.
    pub fn portfolio_report(&self) -> Result<PortfolioReport> {
        PortfolioReporter::new(self.store(), &self.resolver).generate()
    }

    /// Human-readable portfolio summary.
    pub fn get_portfolio_report(&self) -> Result<String> {
        Ok(self.portfolio_report()?.to_string())
    }
}
