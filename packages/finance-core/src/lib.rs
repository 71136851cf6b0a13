//! Finance Core - Portfolio ledger and price resolution for agent tools.
//!
//! This crate provides the state and pricing behind the finance agent tools:
//!
//! - **Ledger**: Durable cash, positions and transaction history with atomic writes
//! - **Price resolution**: Quote providers tried in priority order with fallback
//! - **Execution**: Buy orders with funds validation and cost averaging
//! - **Reporting**: Live portfolio valuation that degrades to average cost
//! - **News**: Headline search for the analyst agents
//!
//! # Example
//!
//! ```rust,no_run
//! use finance_core::{Settings, FinanceTools};
//!
//! let settings = Settings::from_env()?;
//! let tools = FinanceTools::from_settings(&settings)?;
//!
//! let outcome = tools.execute_investment("AAPL", 10, "150.00".parse().unwrap(), "long term")?;
//! println!("{}", outcome.message);
//!
//! println!("{}", tools.get_portfolio_report()?);
//! # Ok::<(), finance_core::Error>(())
//! ```

pub mod config;
pub mod executor;
pub mod ledger;
pub mod news;
pub mod quote;
pub mod report;
pub mod resolver;
pub mod tools;
pub mod types;

use rust_decimal::Decimal;
use std::path::PathBuf;
use types::fmt_money;

// Re-export commonly used types
pub use types::{ApiResponse, Ledger, Position, Quote, Transaction};

// Re-export main functionality
pub use config::Settings;
pub use executor::{Fill, InvestmentExecutor};
pub use ledger::{JsonFileStore, LedgerStore, MemoryStore};
pub use news::{Article, NewsClient, Topic};
pub use quote::{AlphaVantageProvider, ProviderError, QuoteProvider, RapidApiYahooProvider};
pub use report::{PortfolioReport, PortfolioReporter, PriceOrigin, ReportLine};
pub use resolver::PriceResolver;
pub use tools::{FinanceTools, FinancialData, InvestmentOutcome};

/// Error types for finance-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Insufficient cash: need ${}, available ${}", fmt_money(.needed), fmt_money(.available))]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("Could not retrieve financial data for symbol: {0}")]
    PriceUnavailable(String),

    #[error("Failed to persist ledger to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("News request failed: {0}")]
    News(#[source] quote::ProviderError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether the error is a rejected order rather than a failure of the system.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::InsufficientFunds { .. })
    }
}

/// Result type for finance-core operations.
pub type Result<T> = std::result::Result<T, Error>;
