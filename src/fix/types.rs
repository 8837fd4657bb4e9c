//! Typed message bodies and the value types they carry

use rust_decimal::Decimal;
use std::fmt;

use super::message::{FixBody, FixField, MessageKind};
use super::tags;
use crate::error::EncodingError;

/// Instrument symbol using Arc<str> for cheap cloning
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(std::sync::Arc<str>);

impl Symbol {
    pub fn new(s: impl AsRef<str>) -> Self {
        Symbol(std::sync::Arc::from(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side (54) value
    pub fn fix_value(self) -> &'static str {
        match self {
            Side::Buy => "1",
            Side::Sell => "2",
        }
    }
}

/// Limit price, always rendered with exactly two decimals
///
/// # Example
/// ```
/// use fix_mock_server::fix::Price;
/// assert_eq!(Price::from_i64(100).to_fix_string(), "100.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Self {
        Price(value)
    }

    pub fn from_i64(value: i64) -> Self {
        Price(Decimal::from(value))
    }

    pub fn inner(self) -> Decimal {
        self.0
    }

    pub fn to_fix_string(self) -> String {
        format!("{:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fix_string())
    }
}

/// Logon (35=A)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logon {
    pub heart_bt_int: u32,
}

impl FixBody for Logon {
    fn kind(&self) -> MessageKind {
        MessageKind::Logon
    }

    fn fields(&self) -> Result<Vec<FixField>, EncodingError> {
        Ok(vec![
            FixField::new(tags::ENCRYPT_METHOD, tags::ENCRYPT_METHOD_NONE),
            FixField::new(tags::HEART_BT_INT, self.heart_bt_int.to_string()),
        ])
    }
}

/// Heartbeat (35=0), header only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heartbeat;

impl FixBody for Heartbeat {
    fn kind(&self) -> MessageKind {
        MessageKind::Heartbeat
    }

    fn fields(&self) -> Result<Vec<FixField>, EncodingError> {
        Ok(Vec::new())
    }
}

/// New Order Single (35=D), always a limit order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderSingle {
    pub cl_ord_id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub order_qty: u64,
    pub price: Price,
}

impl FixBody for NewOrderSingle {
    fn kind(&self) -> MessageKind {
        MessageKind::NewOrderSingle
    }

    fn fields(&self) -> Result<Vec<FixField>, EncodingError> {
        Ok(vec![
            FixField::new(tags::CL_ORD_ID, self.cl_ord_id.as_str()),
            FixField::new(tags::SYMBOL, self.symbol.as_str()),
            FixField::new(tags::SIDE, self.side.fix_value()),
            FixField::new(tags::ORDER_QTY, self.order_qty.to_string()),
            FixField::new(tags::ORD_TYPE, tags::ord_type::LIMIT),
            FixField::new(tags::PRICE, self.price.to_fix_string()),
        ])
    }
}

/// Execution Report (35=8) for a fill against an order
///
/// `executed_qty` must not exceed `order_qty`; [`ExecutionReport::fill`]
/// rejects reports that break this rather than clamping LeavesQty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub order_id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub order_qty: u64,
    pub price: Price,
    pub executed_qty: u64,
    pub last_px: Price,
}

impl ExecutionReport {
    /// Report a fill of `executed_qty` at `last_px` against `order`
    pub fn fill(
        order: &NewOrderSingle,
        executed_qty: u64,
        last_px: Price,
    ) -> Result<Self, EncodingError> {
        if executed_qty > order.order_qty {
            return Err(EncodingError::InvalidQuantity {
                ordered: order.order_qty,
                executed: executed_qty,
            });
        }
        Ok(ExecutionReport {
            order_id: order.cl_ord_id.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            order_qty: order.order_qty,
            price: order.price,
            executed_qty,
            last_px,
        })
    }

    pub fn leaves_qty(&self) -> Result<u64, EncodingError> {
        self.order_qty
            .checked_sub(self.executed_qty)
            .ok_or(EncodingError::InvalidQuantity {
                ordered: self.order_qty,
                executed: self.executed_qty,
            })
    }

    fn ord_status(&self, leaves: u64) -> &'static str {
        if self.executed_qty == 0 {
            tags::ord_status::NEW
        } else if leaves == 0 {
            tags::ord_status::FILLED
        } else {
            tags::ord_status::PARTIALLY_FILLED
        }
    }

    fn exec_type(&self) -> &'static str {
        if self.executed_qty == 0 {
            tags::exec_type::NEW
        } else {
            tags::exec_type::TRADE
        }
    }
}

impl FixBody for ExecutionReport {
    fn kind(&self) -> MessageKind {
        MessageKind::ExecutionReport
    }

    fn fields(&self) -> Result<Vec<FixField>, EncodingError> {
        let leaves = self.leaves_qty()?;
        Ok(vec![
            FixField::new(tags::ORDER_ID, self.order_id.as_str()),
            FixField::new(tags::SYMBOL, self.symbol.as_str()),
            FixField::new(tags::SIDE, self.side.fix_value()),
            FixField::new(tags::ORDER_QTY, self.order_qty.to_string()),
            FixField::new(tags::ORD_TYPE, tags::ord_type::LIMIT),
            FixField::new(tags::PRICE, self.price.to_fix_string()),
            FixField::new(tags::ORD_STATUS, self.ord_status(leaves)),
            FixField::new(tags::EXEC_TYPE, self.exec_type()),
            FixField::new(tags::LEAVES_QTY, leaves.to_string()),
            FixField::new(tags::CUM_QTY, self.executed_qty.to_string()),
            FixField::new(tags::LAST_QTY, self.executed_qty.to_string()),
            FixField::new(tags::LAST_PX, self.last_px.to_fix_string()),
        ])
    }
}
