//! Deterministic per-tick emission plan

use std::time::Duration;

/// A fixed number of ticks at a fixed interval.
///
/// Every tick emits a Heartbeat. Tick `i` also emits a New Order Single when
/// `i % order_every == 0` and an Execution Report when
/// `i % execution_every == 0`, in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionSchedule {
    pub tick_count: u32,
    pub tick_interval: Duration,
    pub order_every: u32,
    pub execution_every: u32,
}

impl Default for EmissionSchedule {
    fn default() -> Self {
        EmissionSchedule {
            tick_count: 60,
            tick_interval: Duration::from_secs(5),
            order_every: 2,
            execution_every: 3,
        }
    }
}

impl EmissionSchedule {
    pub fn with_tick_count(mut self, tick_count: u32) -> Self {
        self.tick_count = tick_count;
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// What tick `tick` sends
    pub fn plan(&self, tick: u32) -> TickPlan {
        TickPlan {
            tick,
            new_order: self.order_every > 0 && tick % self.order_every == 0,
            execution_report: self.execution_every > 0 && tick % self.execution_every == 0,
        }
    }

    /// Message counts over the whole schedule: (heartbeats, orders, executions)
    pub fn totals(&self) -> (u32, u32, u32) {
        (0..self.tick_count)
            .map(|tick| self.plan(tick))
            .fold((0, 0, 0), |(hb, nos, er), plan| {
                (
                    hb + 1,
                    nos + plan.new_order as u32,
                    er + plan.execution_report as u32,
                )
            })
    }
}

/// Messages due on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub tick: u32,
    pub new_order: bool,
    pub execution_report: bool,
}
