//! FIX 4.2 tag numbers and enumerated values used by the mock server

/// BeginString value for the single supported dialect
pub const BEGIN_STRING_VALUE: &str = "FIX.4.2";

/// Separator between fields. Human-readable, not SOH.
pub const FIELD_DELIMITER: u8 = b'|';

/// Terminator after the last field of every message
pub const MESSAGE_TERMINATOR: u8 = b'\n';

// Framing
pub const BEGIN_STRING: u32 = 8;
pub const BODY_LENGTH: u32 = 9;
pub const CHECKSUM: u32 = 10;

// Header
pub const MSG_TYPE: u32 = 35;
pub const SENDER_COMP_ID: u32 = 49;
pub const TARGET_COMP_ID: u32 = 56;
pub const MSG_SEQ_NUM: u32 = 34;
pub const SENDING_TIME: u32 = 52;

// Logon
pub const ENCRYPT_METHOD: u32 = 98;
pub const HEART_BT_INT: u32 = 108;

// Orders and executions
pub const CL_ORD_ID: u32 = 11;
pub const ORDER_ID: u32 = 37;
pub const SYMBOL: u32 = 55;
pub const SIDE: u32 = 54;
pub const ORDER_QTY: u32 = 38;
pub const ORD_TYPE: u32 = 40;
pub const PRICE: u32 = 44;
pub const ORD_STATUS: u32 = 39;
pub const EXEC_TYPE: u32 = 150;
pub const LEAVES_QTY: u32 = 151;
pub const CUM_QTY: u32 = 14;
pub const LAST_QTY: u32 = 32;
pub const LAST_PX: u32 = 31;

/// MsgType (35) values
pub mod msg_type {
    pub const HEARTBEAT: &str = "0";
    pub const LOGON: &str = "A";
    pub const NEW_ORDER_SINGLE: &str = "D";
    pub const EXECUTION_REPORT: &str = "8";
}

/// OrdType (40) values
pub mod ord_type {
    pub const LIMIT: &str = "2";
}

/// OrdStatus (39) values
pub mod ord_status {
    pub const NEW: &str = "0";
    pub const PARTIALLY_FILLED: &str = "1";
    pub const FILLED: &str = "2";
}

/// ExecType (150) values
pub mod exec_type {
    pub const NEW: &str = "0";
    pub const TRADE: &str = "2";
}

/// EncryptMethod (98): none
pub const ENCRYPT_METHOD_NONE: &str = "0";
