//! Message building blocks: fields, kinds and the standard header

use chrono::{DateTime, Utc};
use std::fmt;

use super::tags;
use crate::error::EncodingError;

/// A single `tag=value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixField {
    pub tag: u32,
    pub value: String,
}

impl FixField {
    pub fn new(tag: u32, value: impl Into<String>) -> Self {
        FixField {
            tag,
            value: value.into(),
        }
    }
}

/// Message kinds the server emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Logon,
    Heartbeat,
    NewOrderSingle,
    ExecutionReport,
}

const LOGON_TAGS: &[u32] = &[tags::ENCRYPT_METHOD, tags::HEART_BT_INT];

const HEARTBEAT_TAGS: &[u32] = &[];

const NEW_ORDER_SINGLE_TAGS: &[u32] = &[
    tags::CL_ORD_ID,
    tags::SYMBOL,
    tags::SIDE,
    tags::ORDER_QTY,
    tags::ORD_TYPE,
    tags::PRICE,
];

const EXECUTION_REPORT_TAGS: &[u32] = &[
    tags::ORDER_ID,
    tags::SYMBOL,
    tags::SIDE,
    tags::ORDER_QTY,
    tags::ORD_TYPE,
    tags::PRICE,
    tags::ORD_STATUS,
    tags::EXEC_TYPE,
    tags::LEAVES_QTY,
    tags::CUM_QTY,
    tags::LAST_QTY,
    tags::LAST_PX,
];

impl MessageKind {
    /// MsgType (35) value
    pub fn msg_type(self) -> &'static str {
        match self {
            MessageKind::Logon => tags::msg_type::LOGON,
            MessageKind::Heartbeat => tags::msg_type::HEARTBEAT,
            MessageKind::NewOrderSingle => tags::msg_type::NEW_ORDER_SINGLE,
            MessageKind::ExecutionReport => tags::msg_type::EXECUTION_REPORT,
        }
    }

    /// Required body tags, in the order they go on the wire
    pub fn body_tags(self) -> &'static [u32] {
        match self {
            MessageKind::Logon => LOGON_TAGS,
            MessageKind::Heartbeat => HEARTBEAT_TAGS,
            MessageKind::NewOrderSingle => NEW_ORDER_SINGLE_TAGS,
            MessageKind::ExecutionReport => EXECUTION_REPORT_TAGS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Logon => "Logon",
            MessageKind::Heartbeat => "Heartbeat",
            MessageKind::NewOrderSingle => "NewOrderSingle",
            MessageKind::ExecutionReport => "ExecutionReport",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Standard header values that follow MsgType
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header<'a> {
    pub sender_comp_id: &'a str,
    pub target_comp_id: &'a str,
    pub msg_seq_num: u64,
    pub sending_time: DateTime<Utc>,
}

/// A typed message body that renders into its body fields
pub trait FixBody {
    fn kind(&self) -> MessageKind;

    /// Body fields in any order; the encoder puts them in canonical order
    fn fields(&self) -> Result<Vec<FixField>, EncodingError>;
}
