//! Per-connection session: sequence numbers, schedule and emission

pub mod context;
pub mod emitter;
pub mod market;
pub mod schedule;
pub mod sequence;

pub use context::{Outbound, SessionContext};
pub use emitter::{
    CloseReason, EmissionEvent, EmissionSink, MemorySink, Outcome, RecordedEmission,
    ScheduledEmitter, Session, SessionReport, SessionState, TracingSink,
};
pub use market::SyntheticMarket;
pub use schedule::{EmissionSchedule, TickPlan};
pub use sequence::SequenceCounter;
