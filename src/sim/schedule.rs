//! Deferred tasks keyed by simulation time
//!
//! Timed effects (attack landing, hit recovery, corpse cleanup, projectile
//! expiry) are queued here from inside a tick and drained at the start of a
//! later tick. Tasks are tied to the entity they touch so removing an entity
//! can drop everything still pending for it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

/// Entity a task refers to, for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTarget {
    Enemy(u32),
    Projectile(u32),
}

/// Deferred state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Attack animation finished: damage the player
    StrikePlayer { enemy: u32, damage: u32 },
    /// Hit stagger over: back to Idle at normal speed
    RecoverFromHit { enemy: u32 },
    /// Death animation over: drop the corpse from the live set
    RemoveEnemy { enemy: u32 },
    /// Projectile flew its full lifetime without hitting anything
    ExpireProjectile { projectile: u32 },
    /// Random zombie ambience
    AmbientSound,
}

impl Task {
    pub fn target(&self) -> Option<TaskTarget> {
        match *self {
            Task::StrikePlayer { enemy, .. }
            | Task::RecoverFromHit { enemy }
            | Task::RemoveEnemy { enemy } => Some(TaskTarget::Enemy(enemy)),
            Task::ExpireProjectile { projectile } => Some(TaskTarget::Projectile(projectile)),
            Task::AmbientSound => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scheduled {
    due_ms: u64,
    /// Insertion order, breaks ties between tasks due on the same millisecond
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed so the max-heap pops the earliest task first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Time-ordered task queue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    queue: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run `delay_ms` after `now_ms`
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled {
            due_ms: now_ms.saturating_add(delay_ms),
            seq,
            task,
        });
    }

    /// Remove and return every task due at or before `now_ms`, earliest first
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<Task> {
        let mut due = Vec::new();
        while self.queue.peek().is_some_and(|s| s.due_ms <= now_ms) {
            if let Some(s) = self.queue.pop() {
                due.push(s.task);
            }
        }
        due
    }

    /// Drop pending tasks matching `pred`, returning how many were dropped
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&Task) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|s| !pred(&s.task));
        before - self.queue.len()
    }

    /// Drop every pending task that refers to `target`
    pub fn cancel_target(&mut self, target: TaskTarget) -> usize {
        self.cancel_where(|t| t.target() == Some(target))
    }

    /// Whether any pending task matches `pred`
    pub fn any(&self, mut pred: impl FnMut(&Task) -> bool) -> bool {
        self.queue.iter().any(|s| pred(&s.task))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
