//! FIX Mock Server
//!
//! A mock FIX 4.2 counterparty for exercising client connectivity. Every
//! accepted TCP connection gets its own session: a Logon, then a bounded
//! schedule of Heartbeats, New-Order-Singles and Execution-Reports with
//! gap-free sequence numbers, valid BodyLength and Checksum.

pub mod config;
pub mod error;
pub mod fix;
pub mod server;
pub mod session;

pub use config::Config;
pub use error::{ConfigurationError, ConnectionError, EncodingError};
pub use server::{ConnectionManager, ShutdownHandle};
pub use session::{EmissionSchedule, SessionContext};
