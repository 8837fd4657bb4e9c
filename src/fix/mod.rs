//! FIX 4.2 tag-value encoding
//!
//! - [`tags`]: tag numbers and enumerated values
//! - [`message`]: fields, message kinds and the standard header
//! - [`types`]: typed message bodies
//! - [`encoder`]: framing with BodyLength and Checksum

pub mod encoder;
pub mod message;
pub mod tags;
pub mod types;

pub use encoder::{checksum, encode, encode_message, format_sending_time};
pub use message::{FixBody, FixField, Header, MessageKind};
pub use types::{ExecutionReport, Heartbeat, Logon, NewOrderSingle, Price, Side, Symbol};
