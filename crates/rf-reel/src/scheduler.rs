//! Scheduler abstraction over timers, intervals and rendering frames
//!
//! The controller never waits. It arms tasks on a [`Scheduler`] and the host
//! calls [`ReelAnimationController::dispatch`](crate::ReelAnimationController::dispatch)
//! when one fires. The browser binds this to `setTimeout` / `setInterval` /
//! `requestAnimationFrame`; tests use [`VirtualScheduler`].

use serde::{Deserialize, Serialize};

/// Handle of an armed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle(pub u64);

/// Work the controller schedules for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReelTask {
    /// Periodic random redraw of a spinning reel
    Shuffle { reel: usize },
    /// Staggered stop of one reel
    StopReel { reel: usize },
    /// Terminal stop has settled, start the frame wait
    Settle,
    /// Rendering frame callback; evaluation runs when `remaining` is 0
    FrameSettled { remaining: u8 },
    /// Return strips to the neutral transform
    ResetStrips,
    /// Auto-hide the win banner
    HideMessage,
}

/// Host timer loop
pub trait Scheduler {
    /// Current time (ms)
    fn now_ms(&self) -> f64;

    /// Fire `task` once after `delay_ms`
    fn set_timeout(&mut self, delay_ms: f64, task: ReelTask) -> TaskHandle;

    /// Fire `task` every `period_ms` until cancelled
    fn set_interval(&mut self, period_ms: f64, task: ReelTask) -> TaskHandle;

    /// Fire `task` on the next rendering frame
    fn request_frame(&mut self, task: ReelTask) -> TaskHandle;

    /// Cancel an armed task. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TaskHandle);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingKind {
    Timeout,
    Interval { period_ms: f64 },
    Frame,
}

#[derive(Debug, Clone)]
struct Pending {
    handle: TaskHandle,
    due_ms: f64,
    /// Arm order; breaks ties between tasks due at the same instant
    seq: u64,
    kind: PendingKind,
    task: ReelTask,
}

/// Deterministic scheduler with a manually advanced clock
///
/// Tasks due at the same instant fire in the order they were armed, like a
/// browser macrotask queue. Frames land on a fixed cadence (16 ms default).
#[derive(Debug, Clone)]
pub struct VirtualScheduler {
    now_ms: f64,
    frame_interval_ms: f64,
    next_handle: u64,
    next_seq: u64,
    pending: Vec<Pending>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::with_frame_interval(16.0)
    }

    /// Scheduler with a custom frame cadence (ms)
    pub fn with_frame_interval(frame_interval_ms: f64) -> Self {
        Self {
            now_ms: 0.0,
            frame_interval_ms: frame_interval_ms.max(f64::EPSILON),
            next_handle: 1,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Number of armed tasks
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Is this handle still armed?
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    /// Armed tasks, in firing order
    pub fn pending_tasks(&self) -> Vec<(TaskHandle, ReelTask)> {
        let mut pending: Vec<&Pending> = self.pending.iter().collect();
        pending.sort_by(|a, b| Self::order(a, b));
        pending.iter().map(|p| (p.handle, p.task)).collect()
    }

    /// Due time of the next task
    pub fn next_due_ms(&self) -> Option<f64> {
        self.next_index().map(|i| self.pending[i].due_ms)
    }

    /// Pop the next task due at or before `until_ms`, moving the clock to
    /// its due time. Intervals are re-armed under the same handle.
    pub fn pop_due(&mut self, until_ms: f64) -> Option<(TaskHandle, ReelTask)> {
        let index = self.next_index()?;
        if self.pending[index].due_ms > until_ms {
            return None;
        }

        let due_ms = self.pending[index].due_ms;
        self.now_ms = self.now_ms.max(due_ms);

        match self.pending[index].kind {
            PendingKind::Interval { period_ms } => {
                let seq = self.bump_seq();
                let entry = &mut self.pending[index];
                entry.due_ms = due_ms + period_ms;
                entry.seq = seq;
                Some((entry.handle, entry.task))
            }
            PendingKind::Timeout | PendingKind::Frame => {
                let entry = self.pending.remove(index);
                Some((entry.handle, entry.task))
            }
        }
    }

    /// Move the clock forward without firing anything
    pub fn advance_clock(&mut self, to_ms: f64) {
        self.now_ms = self.now_ms.max(to_ms);
    }

    fn arm(&mut self, due_ms: f64, kind: PendingKind, task: ReelTask) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        let seq = self.bump_seq();
        self.pending.push(Pending {
            handle,
            due_ms,
            seq,
            kind,
            task,
        });
        handle
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn next_index(&self) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| Self::order(a, b))
            .map(|(i, _)| i)
    }

    fn order(a: &Pending, b: &Pending) -> std::cmp::Ordering {
        a.due_ms
            .partial_cmp(&b.due_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.seq.cmp(&b.seq))
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for VirtualScheduler {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }

    fn set_timeout(&mut self, delay_ms: f64, task: ReelTask) -> TaskHandle {
        let due = self.now_ms + delay_ms.max(0.0);
        self.arm(due, PendingKind::Timeout, task)
    }

    fn set_interval(&mut self, period_ms: f64, task: ReelTask) -> TaskHandle {
        let period_ms = period_ms.max(f64::EPSILON);
        let due = self.now_ms + period_ms;
        self.arm(due, PendingKind::Interval { period_ms }, task)
    }

    fn request_frame(&mut self, task: ReelTask) -> TaskHandle {
        let frame = (self.now_ms / self.frame_interval_ms).floor() + 1.0;
        let due = frame * self.frame_interval_ms;
        self.arm(due, PendingKind::Frame, task)
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.pending.retain(|p| p.handle != handle);
    }
}
