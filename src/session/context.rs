//! Shared, read-only inputs for every session and the messages they produce

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::emitter::{EmissionSink, TracingSink};
use super::market::SyntheticMarket;
use super::schedule::EmissionSchedule;
use super::sequence::SequenceCounter;
use crate::config::Config;
use crate::error::EncodingError;
use crate::fix::{
    encode_message, ExecutionReport, FixBody, FixField, Header, Heartbeat, Logon, MessageKind,
    NewOrderSingle,
};

/// One outbound message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Logon(Logon),
    Heartbeat(Heartbeat),
    NewOrder(NewOrderSingle),
    Execution(ExecutionReport),
}

impl FixBody for Outbound {
    fn kind(&self) -> MessageKind {
        match self {
            Outbound::Logon(body) => body.kind(),
            Outbound::Heartbeat(body) => body.kind(),
            Outbound::NewOrder(body) => body.kind(),
            Outbound::Execution(body) => body.kind(),
        }
    }

    fn fields(&self) -> Result<Vec<FixField>, EncodingError> {
        match self {
            Outbound::Logon(body) => body.fields(),
            Outbound::Heartbeat(body) => body.fields(),
            Outbound::NewOrder(body) => body.fields(),
            Outbound::Execution(body) => body.fields(),
        }
    }
}

/// Everything a session needs besides its socket and sequence counter.
/// Built once at startup and shared by all sessions behind an `Arc`.
pub struct SessionContext {
    pub sender_comp_id: String,
    pub target_comp_id: String,
    pub heart_bt_int: u32,
    pub schedule: EmissionSchedule,
    pub market: SyntheticMarket,
    pub sink: Arc<dyn EmissionSink>,
}

impl SessionContext {
    pub fn from_config(config: &Config, sink: Arc<dyn EmissionSink>) -> Self {
        SessionContext {
            sender_comp_id: config.session.sender_comp_id.clone(),
            target_comp_id: config.session.target_comp_id.clone(),
            heart_bt_int: config.session.heart_bt_int,
            schedule: config.schedule.emission_schedule(),
            market: SyntheticMarket::new(config.schedule.symbols()),
            sink,
        }
    }

    /// Defaults with the given schedule, logging through `tracing`
    pub fn with_schedule(schedule: EmissionSchedule) -> Self {
        let mut ctx = Self::from_config(&Config::default(), Arc::new(TracingSink));
        ctx.schedule = schedule;
        ctx
    }

    pub fn with_sink(mut self, sink: Arc<dyn EmissionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn logon(&self) -> Outbound {
        Outbound::Logon(Logon {
            heart_bt_int: self.heart_bt_int,
        })
    }

    /// Bodies due on `tick`, in send order
    pub fn tick_messages(&self, tick: u32) -> Vec<Result<Outbound, EncodingError>> {
        let plan = self.schedule.plan(tick);
        let mut messages = vec![Ok(Outbound::Heartbeat(Heartbeat))];
        if plan.new_order {
            messages.push(Ok(Outbound::NewOrder(self.market.order_for_tick(tick))));
        }
        if plan.execution_report {
            messages.push(self.market.execution_for_tick(tick).map(Outbound::Execution));
        }
        messages
    }

    /// Encode `body` with the next sequence number.
    ///
    /// The number is only consumed when encoding succeeds.
    pub fn encode_next(
        &self,
        sequence: &mut SequenceCounter,
        body: &Outbound,
        sending_time: DateTime<Utc>,
    ) -> Result<(u64, Vec<u8>), EncodingError> {
        let header = Header {
            sender_comp_id: &self.sender_comp_id,
            target_comp_id: &self.target_comp_id,
            msg_seq_num: sequence.peek(),
            sending_time,
        };
        let bytes = encode_message(&header, body)?;
        Ok((sequence.next(), bytes))
    }

    /// Every message one full session would carry, without I/O or waiting.
    /// All messages share `sending_time`.
    pub fn render_session(&self, sending_time: DateTime<Utc>) -> Vec<Result<Vec<u8>, EncodingError>> {
        let mut sequence = SequenceCounter::new();
        let mut rendered = vec![self
            .encode_next(&mut sequence, &self.logon(), sending_time)
            .map(|(_, bytes)| bytes)];

        for tick in 0..self.schedule.tick_count {
            for body in self.tick_messages(tick) {
                rendered.push(
                    body.and_then(|b| self.encode_next(&mut sequence, &b, sending_time))
                        .map(|(_, bytes)| bytes),
                );
            }
        }
        rendered
    }
}
