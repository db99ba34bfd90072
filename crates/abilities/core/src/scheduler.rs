//! Deferred tasks with cancellation tokens.
//!
//! The engine never owns a thread or a clock. Effect containers schedule
//! [`TimerTask`]s through the [`Scheduler`] trait and the world pops due tasks
//! while advancing simulation time. [`TimerQueue`] is the deterministic
//! tick-based implementation used by default.

use std::collections::{BTreeMap, HashMap};

use crate::common::Tick;
use crate::effects::EffectHandle;

/// Cancellation token for a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerId(pub u64);

/// Work a timer performs when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTask {
    /// The effect reached the end of its duration.
    Expire(EffectHandle),
    /// The effect's period elapsed.
    Period(EffectHandle),
}

impl TimerTask {
    pub fn handle(&self) -> EffectHandle {
        match self {
            TimerTask::Expire(handle) | TimerTask::Period(handle) => *handle,
        }
    }
}

/// Time source and deferred-task queue the engine runs on.
///
/// Delays are expressed in ticks relative to [`now`](Scheduler::now).
/// Cancellation is idempotent: cancelling a fired, cancelled or unknown timer
/// returns `false` and has no effect.
pub trait Scheduler: Send {
    fn now(&self) -> Tick;

    fn schedule_once(&mut self, delay: u64, task: TimerTask) -> TimerId;

    /// Schedules `task` every `period` ticks, first firing at `now + period`.
    fn schedule_repeating(&mut self, period: u64, task: TimerTask) -> TimerId;

    fn cancel(&mut self, id: TimerId) -> bool;

    /// Next deadline of a pending timer.
    fn deadline(&self, id: TimerId) -> Option<Tick>;

    /// Removes and returns the earliest task due at or before `until`,
    /// moving the clock to its deadline. Repeating tasks are re-armed.
    fn pop_due(&mut self, until: Tick) -> Option<(TimerId, TimerTask)>;

    /// Moves the clock forward. Never moves it backwards.
    fn advance_to(&mut self, to: Tick);

    fn pending(&self) -> usize;
}

#[derive(Clone, Debug)]
struct TimerEntry {
    task: TimerTask,
    deadline: Tick,
    seq: u64,
    period: Option<u64>,
}

/// Deterministic timer queue keyed by `(deadline, scheduling sequence)`.
///
/// Timers due at the same tick fire in the order they were (re-)armed.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Tick,
    next_id: u64,
    next_seq: u64,
    order: BTreeMap<(Tick, u64), TimerId>,
    entries: HashMap<TimerId, TimerEntry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn arm(&mut self, delay: u64, task: TimerTask, period: Option<u64>) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let deadline = self.now + delay;
        let seq = self.bump_seq();
        self.order.insert((deadline, seq), id);
        self.entries.insert(
            id,
            TimerEntry {
                task,
                deadline,
                seq,
                period,
            },
        );
        tracing::trace!(timer = id.0, %deadline, ?task, "timer armed");
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> Tick {
        self.now
    }

    fn schedule_once(&mut self, delay: u64, task: TimerTask) -> TimerId {
        self.arm(delay, task, None)
    }

    fn schedule_repeating(&mut self, period: u64, task: TimerTask) -> TimerId {
        let period = period.max(1);
        self.arm(period, task, Some(period))
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                self.order.remove(&(entry.deadline, entry.seq));
                tracing::trace!(timer = id.0, "timer cancelled");
                true
            }
            None => false,
        }
    }

    fn deadline(&self, id: TimerId) -> Option<Tick> {
        self.entries.get(&id).map(|entry| entry.deadline)
    }

    fn pop_due(&mut self, until: Tick) -> Option<(TimerId, TimerTask)> {
        let (&(deadline, seq), &id) = self.order.first_key_value()?;
        if deadline > until {
            return None;
        }
        self.order.remove(&(deadline, seq));
        self.now = self.now.max(deadline);

        let entry = self.entries.get(&id)?.clone();
        match entry.period {
            Some(period) => {
                let next_deadline = deadline + period;
                let next_seq = self.bump_seq();
                self.order.insert((next_deadline, next_seq), id);
                if let Some(slot) = self.entries.get_mut(&id) {
                    slot.deadline = next_deadline;
                    slot.seq = next_seq;
                }
            }
            None => {
                self.entries.remove(&id);
            }
        }
        tracing::trace!(timer = id.0, %deadline, task = ?entry.task, "timer fired");
        Some((id, entry.task))
    }

    fn advance_to(&mut self, to: Tick) {
        self.now = self.now.max(to);
    }

    fn pending(&self) -> usize {
        self.entries.len()
    }
}
