//! Timed task queue driven by the engine's monotonic clock
//!
//! Deadlines are offsets from engine creation. Tasks with equal deadlines
//! fire in the order they were scheduled.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

/// Work the engine defers to a later point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {
    /// One step of the gravity loop
    Gravity,
    /// End of the line-clear flash: remove rows, score, spawn
    ClearRows,
}

/// Priority queue of pending tasks
#[derive(Debug, Default, Clone)]
pub struct Timers {
    heap: BinaryHeap<Reverse<(Duration, u64, Task)>>,
    seq: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to fire at `at`
    pub fn schedule(&mut self, at: Duration, task: Task) {
        self.seq += 1;
        self.heap.push(Reverse((at, self.seq, task)));
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse((at, _, _))| *at)
    }

    /// Remove and return the earliest task if it is due at `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, Task)> {
        if self.next_deadline()? > now {
            return None;
        }
        self.heap.pop().map(|Reverse((at, _, task))| (at, task))
    }

    /// Drop every pending task
    pub fn cancel_all(&mut self) {
        self.heap.clear();
    }

    /// Whether a task of this kind is pending
    pub fn is_pending(&self, task: Task) -> bool {
        self.heap.iter().any(|Reverse((_, _, t))| *t == task)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut timers = Timers::new();
        timers.schedule(ms(800), Task::Gravity);
        timers.schedule(ms(300), Task::ClearRows);
        assert_eq!(timers.next_deadline(), Some(ms(300)));

        assert_eq!(timers.pop_due(ms(1000)), Some((ms(300), Task::ClearRows)));
        assert_eq!(timers.pop_due(ms(1000)), Some((ms(800), Task::Gravity)));
        assert_eq!(timers.pop_due(ms(1000)), None);
    }

    #[test]
    fn test_not_due_yet() {
        let mut timers = Timers::new();
        timers.schedule(ms(500), Task::Gravity);
        assert_eq!(timers.pop_due(ms(499)), None);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(ms(500)), Some((ms(500), Task::Gravity)));
    }

    #[test]
    fn test_ties_keep_schedule_order() {
        let mut timers = Timers::new();
        timers.schedule(ms(100), Task::Gravity);
        timers.schedule(ms(100), Task::ClearRows);
        assert_eq!(timers.pop_due(ms(100)).map(|(_, t)| t), Some(Task::Gravity));
        assert_eq!(timers.pop_due(ms(100)).map(|(_, t)| t), Some(Task::ClearRows));
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = Timers::new();
        timers.schedule(ms(100), Task::Gravity);
        timers.schedule(ms(300), Task::ClearRows);
        assert!(timers.is_pending(Task::ClearRows));
        timers.cancel_all();
        assert!(timers.is_empty());
        assert!(!timers.is_pending(Task::ClearRows));
        assert_eq!(timers.next_deadline(), None);
    }
}
