//! TCP listener and per-connection session tasks

pub mod manager;
pub mod registry;

pub use manager::{ConnectionManager, ShutdownHandle};
pub use registry::SessionRegistry;
