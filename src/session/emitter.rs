//! Per-connection scheduled emission
//!
//! A session moves through three states:
//!
//! - `LoggedOn`: Logon is sent as soon as the emitter starts
//! - `Running`: one batch of messages per tick
//! - `Closed`: tick bound reached, write failed, or shutdown observed
//!
//! Shutdown is observed at every tick boundary and before every write.

use chrono::Utc;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::context::{Outbound, SessionContext};
use super::sequence::SequenceCounter;
use crate::error::ConnectionError;
use crate::fix::{FixBody, MessageKind};

/// Payload characters shown in log lines
const LOG_PAYLOAD_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOn,
    Running,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Every tick was emitted
    Completed,
    /// The peer went away or stopped reading
    WriteFailed,
    /// Server shutdown was requested
    Shutdown,
}

/// Runtime state of one accepted connection
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub peer: SocketAddr,
    sequence: SequenceCounter,
    state: SessionState,
}

impl Session {
    pub fn new(id: u64, peer: SocketAddr) -> Self {
        Session {
            id,
            peer,
            sequence: SequenceCounter::new(),
            state: SessionState::LoggedOn,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_seq_num(&self) -> u64 {
        self.sequence.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Failed,
}

/// One attempted send
#[derive(Debug)]
pub struct EmissionEvent<'a> {
    pub session_id: u64,
    pub peer: SocketAddr,
    pub kind: MessageKind,
    pub seq_num: u64,
    pub payload: &'a [u8],
    pub outcome: Outcome,
}

impl EmissionEvent<'_> {
    /// Payload as text, cut to `max_chars` and without the trailing newline
    pub fn truncated_payload(&self, max_chars: usize) -> String {
        String::from_utf8_lossy(self.payload)
            .trim_end_matches('\n')
            .chars()
            .take(max_chars)
            .collect()
    }
}

/// Observer for every send attempt
pub trait EmissionSink: Send + Sync {
    fn record(&self, event: &EmissionEvent<'_>);
}

/// Logs each send through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EmissionSink for TracingSink {
    fn record(&self, event: &EmissionEvent<'_>) {
        match event.outcome {
            Outcome::Sent => info!(
                "Sent {} #{} to {}: {}",
                event.kind,
                event.seq_num,
                event.peer,
                event.truncated_payload(LOG_PAYLOAD_CHARS)
            ),
            Outcome::Failed => warn!(
                "Failed to send {} #{} to {}",
                event.kind, event.seq_num, event.peer
            ),
        }
    }
}

/// An owned copy of an [`EmissionEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEmission {
    pub session_id: u64,
    pub kind: MessageKind,
    pub seq_num: u64,
    pub payload: Vec<u8>,
    pub outcome: Outcome,
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RecordedEmission>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEmission> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn events_for(&self, session_id: u64) -> Vec<RecordedEmission> {
        self.events()
            .into_iter()
            .filter(|e| e.session_id == session_id)
            .collect()
    }
}

impl EmissionSink for MemorySink {
    fn record(&self, event: &EmissionEvent<'_>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEmission {
                session_id: event.session_id,
                kind: event.kind,
                seq_num: event.seq_num,
                payload: event.payload.to_vec(),
                outcome: event.outcome,
            });
        }
    }
}

/// Summary returned when a session closes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub session_id: u64,
    pub peer: SocketAddr,
    pub messages_sent: u64,
    pub last_seq_num: u64,
    pub ticks_completed: u32,
    /// State the session ended in, always `Closed` once `run` returns
    pub state: SessionState,
    pub reason: CloseReason,
}

/// Drives one session's Logon and tick schedule over a writer
pub struct ScheduledEmitter {
    session: Session,
    ctx: Arc<SessionContext>,
    messages_sent: u64,
    ticks_completed: u32,
}

impl ScheduledEmitter {
    pub fn new(session: Session, ctx: Arc<SessionContext>) -> Self {
        ScheduledEmitter {
            session,
            ctx,
            messages_sent: 0,
            ticks_completed: 0,
        }
    }

    /// Run the session to completion.
    ///
    /// Returns when every tick has been emitted, a write fails, or `shutdown`
    /// flips to `true` (or its sender is dropped).
    pub async fn run<W>(mut self, writer: &mut W, mut shutdown: watch::Receiver<bool>) -> SessionReport
    where
        W: AsyncWrite + Unpin,
    {
        info!(
            "Session {} started for {}",
            self.session.id, self.session.peer
        );

        let logon = self.ctx.logon();
        if let Err(reason) = self.send(writer, &logon, &mut shutdown).await {
            return self.close(reason);
        }
        self.session.state = SessionState::Running;

        let period = self.ctx.schedule.tick_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for tick in 0..self.ctx.schedule.tick_count {
            tokio::select! {
                biased;
                _ = shutdown.changed() => return self.close(CloseReason::Shutdown),
                _ = ticker.tick() => {}
            }

            debug!("Session {} tick {}", self.session.id, tick);
            for message in self.ctx.tick_messages(tick) {
                let body = match message {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(
                            "Session {} skipped a message on tick {}: {}",
                            self.session.id, tick, e
                        );
                        continue;
                    }
                };
                if let Err(reason) = self.send(writer, &body, &mut shutdown).await {
                    return self.close(reason);
                }
            }
            self.ticks_completed += 1;
        }

        self.close(CloseReason::Completed)
    }

    /// Encode and write one message. `Err` means the session must close.
    async fn send<W>(
        &mut self,
        writer: &mut W,
        body: &Outbound,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), CloseReason>
    where
        W: AsyncWrite + Unpin,
    {
        if *shutdown.borrow_and_update() {
            return Err(CloseReason::Shutdown);
        }

        let encoded = self
            .ctx
            .encode_next(&mut self.session.sequence, body, Utc::now());
        let (seq_num, bytes) = match encoded {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(
                    "Session {} could not encode {}: {}",
                    self.session.id,
                    body.kind(),
                    e
                );
                return Ok(());
            }
        };

        let result = self.write(writer, &bytes).await;
        let outcome = if result.is_ok() {
            Outcome::Sent
        } else {
            Outcome::Failed
        };
        self.ctx.sink.record(&EmissionEvent {
            session_id: self.session.id,
            peer: self.session.peer,
            kind: body.kind(),
            seq_num,
            payload: &bytes,
            outcome,
        });

        match result {
            Ok(()) => {
                self.messages_sent += 1;
                Ok(())
            }
            Err(e) => {
                warn!("Session {} to {}: {}", self.session.id, self.session.peer, e);
                Err(CloseReason::WriteFailed)
            }
        }
    }

    async fn write<W>(&self, writer: &mut W, bytes: &[u8]) -> Result<(), ConnectionError>
    where
        W: AsyncWrite + Unpin,
    {
        let limit = self.ctx.schedule.tick_interval;
        match timeout(limit, write_message(writer, bytes)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ConnectionError::Write(e)),
            Err(_) => Err(ConnectionError::WriteTimeout(limit)),
        }
    }

    fn close(mut self, reason: CloseReason) -> SessionReport {
        self.session.state = SessionState::Closed;
        info!(
            "Session {} closed ({:?}) for {}: {} messages, last seq {}",
            self.session.id,
            reason,
            self.session.peer,
            self.messages_sent,
            self.session.last_seq_num()
        );
        SessionReport {
            session_id: self.session.id,
            peer: self.session.peer,
            messages_sent: self.messages_sent,
            last_seq_num: self.session.last_seq_num(),
            ticks_completed: self.ticks_completed,
            state: self.session.state(),
            reason,
        }
    }
}

async fn write_message<W>(writer: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await
}
