//! Outbound MsgSeqNum counter, one per session

/// Strictly increasing sequence numbers starting at 1.
///
/// Owned by a single session task, so no synchronization. Sessions are
/// bounded, so there is no wraparound handling.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    last: u64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume and return the next sequence number
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// The number the next call to [`next`](Self::next) will return
    pub fn peek(&self) -> u64 {
        self.last + 1
    }

    /// Last number handed out, 0 if none yet
    pub fn last(&self) -> u64 {
        self.last
    }
}
