//! Finance CLI - Command line access to the agent finance tools.
//!
//! Prints JSON envelopes on stdout for the agent bridge; logs go to stderr.

use clap::{Parser, Subcommand};
use finance_core::{ApiResponse, FinanceTools, Settings};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "finance")]
#[command(about = "Finance agent tools - quotes, news, simulated portfolio")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get price, market cap and P/E for a symbol
    Quote {
        /// Stock symbol
        symbol: String,
    },
    /// Buy shares with ledger cash
    Buy {
        /// Stock symbol
        #[arg(short, long)]
        symbol: String,
        /// Number of shares
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        quantity: i64,
        /// Price per share
        #[arg(short, long, allow_negative_numbers = true)]
        price: Decimal,
        /// Reason for the trade
        #[arg(short, long, default_value = "")]
        rationale: String,
    },
    /// Portfolio valuation report
    Report {
        /// Emit the structured report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the raw ledger
    Ledger,
    /// Search news headlines
    News {
        /// Search keywords
        query: String,
        /// technology, finance, or anything else for a general search
        #[arg(short, long, default_value = "")]
        topic: String,
    },
    /// Validate configuration and create the ledger if missing
    Init,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let tools = FinanceTools::from_settings(&settings)?;

    let output = match cli.command {
        Commands::Quote { symbol } => respond(tools.get_financial_data(&symbol)),
        Commands::Buy {
            symbol,
            quantity,
            price,
            rationale,
        } => respond(tools.execute_investment(&symbol, quantity, price, &rationale)),
        Commands::Report { json: true } => respond(tools.portfolio_report()),
        Commands::Report { json: false } => {
            respond(tools.get_portfolio_report().map(|report| json!({ "report": report })))
        }
        Commands::Ledger => respond(tools.ledger()),
        Commands::News { query, topic } => respond(
            tools
                .search_news(&query, &topic)
                .map(|articles| json!({ "articles": articles })),
        ),
        Commands::Init => respond(tools.ledger().map(|ledger| {
            tracing::info!(path = %settings.ledger_path.display(), "Ledger ready");
            json!({
                "ledger_path": settings.ledger_path,
                "cash": ledger.cash,
                "position_count": ledger.position_count(),
                "transaction_count": ledger.transactions.len(),
            })
        })),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn respond<T: Serialize>(result: finance_core::Result<T>) -> ApiResponse<serde_json::Value> {
    match result.and_then(|data| Ok(serde_json::to_value(data)?)) {
        Ok(value) => ApiResponse::ok(value),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ApiResponse::err(e.to_string())
        }
    }
}
