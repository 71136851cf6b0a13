//! Portfolio valuation report.
//!
//! Every position is priced through the resolver. When a price cannot be
//! resolved the position is valued at its average cost, so a readable ledger
//! always produces a report.

use crate::ledger::LedgerStore;
use crate::resolver::PriceResolver;
use crate::types::{fmt_money, fmt_money_grouped, Ledger, Quote};
use crate::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a line's current price came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceOrigin {
    Live,
    AverageCost,
}

/// Valuation of one position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportLine {
    pub symbol: String,
    pub quantity: u64,
    pub avg_price: Decimal,
    pub current_price: Decimal,
    /// quantity * current_price
    pub value: Decimal,
    pub origin: PriceOrigin,
}

/// Cash, positions and approximate total value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioReport {
    pub cash: Decimal,
    pub lines: Vec<ReportLine>,
    /// Cost basis of all positions
    pub total_cost: Decimal,
    /// cash + sum of line values
    pub total_value: Decimal,
    pub generated_at: DateTime<Utc>,
}

impl PortfolioReport {
    /// Value a ledger using `price_of` for current prices.
    ///
    /// Any lookup error, or a quote without a price, falls back to the
    /// position's average cost.
    pub fn build<F>(ledger: &Ledger, price_of: F) -> Self
    where
        F: Fn(&str) -> Result<Quote>,
    {
        let lines: Vec<ReportLine> = ledger
            .positions
            .iter()
            .map(|(symbol, position)| {
                let live = match price_of(symbol) {
                    Ok(quote) => quote.price.filter(|p| *p > Decimal::ZERO),
                    Err(e) => {
                        tracing::warn!(symbol = %symbol, error = %e, "Using average cost for valuation");
                        None
                    }
                };
                let (current_price, origin) = match live {
                    Some(price) => (price, PriceOrigin::Live),
                    None => (position.avg_price, PriceOrigin::AverageCost),
                };

                ReportLine {
                    symbol: symbol.clone(),
                    quantity: position.quantity,
                    avg_price: position.avg_price,
                    current_price,
                    value: Decimal::from(position.quantity) * current_price,
                    origin,
                }
            })
            .collect();

        let total_value = ledger.cash + lines.iter().map(|l| l.value).sum::<Decimal>();

        Self {
            cash: ledger.cash,
            lines,
            total_cost: ledger.total_cost(),
            total_value,
            generated_at: Utc::now(),
        }
    }

    /// Number of positions valued at average cost.
    pub fn fallback_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.origin == PriceOrigin::AverageCost)
            .count()
    }
}

impl fmt::Display for PortfolioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cash: ${}", fmt_money_grouped(&self.cash))?;
        writeln!(f, "Positions:")?;
        for line in &self.lines {
            writeln!(
                f,
                "- {}: qty={}, avg=${}, current=${}, value=${}",
                line.symbol,
                line.quantity,
                fmt_money(&line.avg_price),
                fmt_money(&line.current_price),
                fmt_money_grouped(&line.value)
            )?;
        }
        write!(f, "Total portfolio approx: ${}", fmt_money_grouped(&self.total_value))
    }
}

/// Builds reports from a ledger store and a price resolver.
#[derive(Debug)]
pub struct PortfolioReporter<'a, S> {
    store: &'a S,
    resolver: &'a PriceResolver,
}

impl<'a, S: LedgerStore> PortfolioReporter<'a, S> {
    pub fn new(store: &'a S, resolver: &'a PriceResolver) -> Self {
        Self { store, resolver }
    }

    /// Read the ledger and value it. Fails only when the ledger cannot be read.
    pub fn generate(&self) -> Result<PortfolioReport> {
        let ledger = self.store.read()?;
        Ok(PortfolioReport::build(&ledger, |symbol| {
            self.resolver.resolve(symbol)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryStore;
    use crate::quote::testing::FakeProvider;
    use crate::types::Position;
    use crate::Error;
    use rust_decimal_macros::dec;

    fn ledger() -> Ledger {
        let mut ledger = Ledger::with_cash(dec!(12345.6));
        ledger
            .positions
            .insert("ABC".to_string(), Position::new(10, dec!(5.00)));
        ledger
            .positions
            .insert("XYZ".to_string(), Position::new(200, dec!(12.3456)));
        ledger
    }

    #[test]
    fn test_live_prices() {
        let report = PortfolioReport::build(&ledger(), |symbol| {
            Ok(Quote {
                price: Some(if symbol == "ABC" { dec!(5.50) } else { dec!(10) }),
                ..Quote::empty(symbol)
            })
        });

        assert_eq!(report.lines[0].value, dec!(55.00));
        assert_eq!(report.lines[1].value, dec!(2000));
        assert_eq!(report.total_value, dec!(12345.6) + dec!(55) + dec!(2000));
        assert_eq!(report.fallback_count(), 0);
    }

    #[test]
    fn test_all_providers_down_uses_average_cost() {
        let store = MemoryStore::with_ledger(ledger());
        let resolver = PriceResolver::new(vec![
            Box::new(FakeProvider::failing("primary")),
            Box::new(FakeProvider::failing("secondary")),
        ]);

        let report = PortfolioReporter::new(&store, &resolver).generate().unwrap();

        assert_eq!(report.fallback_count(), 2);
        for line in &report.lines {
            assert_eq!(line.current_price, line.avg_price);
        }
        let expected = dec!(12345.6) + dec!(10) * dec!(5.00) + dec!(200) * dec!(12.3456);
        assert_eq!(report.total_value, expected);
    }

    #[test]
    fn test_no_providers_configured_still_reports() {
        let store = MemoryStore::with_ledger(ledger());
        let resolver = PriceResolver::new(Vec::new());

        let report = PortfolioReporter::new(&store, &resolver).generate().unwrap();
        assert_eq!(report.fallback_count(), 2);
    }

    #[test]
    fn test_quote_without_price_falls_back() {
        let report = PortfolioReport::build(&ledger(), |symbol| {
            if symbol == "ABC" {
                Ok(Quote::empty(symbol))
            } else {
                Err(Error::PriceUnavailable(symbol.to_string()))
            }
        });
        assert_eq!(report.fallback_count(), 2);
    }

    #[test]
    fn test_render() {
        let report = PortfolioReport::build(&ledger(), |symbol| {
            if symbol == "ABC" {
                Ok(Quote {
                    price: Some(dec!(5.5)),
                    ..Quote::empty(symbol)
                })
            } else {
                Err(Error::PriceUnavailable(symbol.to_string()))
            }
        });

        let expected = "\
Cash: $12,345.60
Positions:
- ABC: qty=10, avg=$5.00, current=$5.50, value=$55.00
- XYZ: qty=200, avg=$12.35, current=$12.35, value=$2,469.12
Total portfolio approx: $14,869.72";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_empty_ledger() {
        let report = PortfolioReport::build(&Ledger::with_cash(dec!(100)), |_| {
            panic!("no positions to price")
        });

        assert_eq!(report.total_value, dec!(100));
        assert_eq!(
            report.to_string(),
            "Cash: $100.00\nPositions:\nTotal portfolio approx: $100.00"
        );
    }
}
