//! Deterministic synthetic order flow
//!
//! Everything is a pure function of the tick index, so two sessions driven for
//! the same ticks carry the same orders and fills.

use crate::error::EncodingError;
use crate::fix::{ExecutionReport, NewOrderSingle, Price, Side, Symbol};

pub const DEFAULT_SYMBOLS: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "TSLA", "AMZN"];

#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    symbols: Vec<Symbol>,
}

impl Default for SyntheticMarket {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOLS.iter().map(Symbol::new).collect())
    }
}

impl SyntheticMarket {
    /// `symbols` must be non-empty; configuration validation enforces this
    pub fn new(symbols: Vec<Symbol>) -> Self {
        SyntheticMarket { symbols }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Order for tick `i`: `ORD{1000+i}`, round-robin symbol, side alternating
    /// by tick, qty `50 + (10i mod 200)`, price `100 + (2i mod 50)`
    pub fn order_for_tick(&self, tick: u32) -> NewOrderSingle {
        let i = u64::from(tick);
        NewOrderSingle {
            cl_ord_id: format!("ORD{}", 1000 + i),
            symbol: self.symbols[tick as usize % self.symbols.len()].clone(),
            side: if tick % 2 == 0 { Side::Buy } else { Side::Sell },
            order_qty: 50 + (i * 10) % 200,
            price: Price::from_i64(100 + ((i * 2) % 50) as i64),
        }
    }

    /// Partial fill of tick `i`'s order: `25 + (5i mod 100)` at the limit price
    pub fn execution_for_tick(&self, tick: u32) -> Result<ExecutionReport, EncodingError> {
        let order = self.order_for_tick(tick);
        let executed = 25 + (u64::from(tick) * 5) % 100;
        ExecutionReport::fill(&order, executed, order.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_order() {
        let market = SyntheticMarket::default();
        let order = market.order_for_tick(0);
        assert_eq!(order.cl_ord_id, "ORD1000");
        assert_eq!(order.symbol.as_str(), "AAPL");
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.order_qty, 50);
        assert_eq!(order.price.to_fix_string(), "100.00");
    }

    #[test]
    fn test_round_robin_and_alternating_side() {
        let market = SyntheticMarket::default();
        let order = market.order_for_tick(3);
        assert_eq!(order.symbol.as_str(), "TSLA");
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.order_qty, 80);
        assert_eq!(order.price.to_fix_string(), "106.00");
        assert_eq!(market.order_for_tick(5).symbol.as_str(), "AAPL");
    }

    #[test]
    fn test_execution_correlates_with_order() {
        let market = SyntheticMarket::default();
        let report = market.execution_for_tick(3).unwrap();
        let order = market.order_for_tick(3);
        assert_eq!(report.order_id, order.cl_ord_id);
        assert_eq!(report.symbol, order.symbol);
        assert_eq!(report.executed_qty, 40);
        assert_eq!(report.leaves_qty().unwrap(), 40);
    }

    #[test]
    fn test_fills_never_exceed_order() {
        let market = SyntheticMarket::default();
        for tick in 0..1000 {
            let report = market.execution_for_tick(tick).unwrap();
            assert!(report.executed_qty <= report.order_qty);
        }
    }

    #[test]
    fn test_custom_symbols() {
        let market = SyntheticMarket::new(vec![Symbol::new("EURUSD")]);
        assert_eq!(market.order_for_tick(7).symbol.as_str(), "EURUSD");
    }
}
