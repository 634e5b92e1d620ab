//! # Worker mailbox: one arrival-ordered queue of control and work items.
//!
//! ```text
//! push_control(Load/Unload) ──┐
//!                             ├──► [queue: arrival order] ──► pop(): front first
//! push_work(request) ─────────┘
//!     LatestOnly: the waiting request (if any) is removed before appending
//! ```
//!
//! Control commands are never replaced: a `LatestOnly` preview request must not
//! discard the model load it depends on. Work never overtakes an earlier
//! `Unload`, and an `Unload` never overtakes earlier work.

use std::collections::VecDeque;

use super::discipline::QueueDiscipline;
use crate::events::ModelConfig;

/// Model lifecycle command.
#[derive(Debug, Clone)]
pub(crate) enum Control {
    Load(ModelConfig),
    Unload,
}

/// One dequeued unit.
#[derive(Debug)]
pub(crate) enum Job<R> {
    Control(Control),
    Work(R),
}

pub(crate) struct Mailbox<R> {
    discipline: QueueDiscipline,
    queue: VecDeque<Job<R>>,
}

impl<R> Mailbox<R> {
    pub fn new(discipline: QueueDiscipline) -> Self {
        Self {
            discipline,
            queue: VecDeque::new(),
        }
    }

    pub fn push_control(&mut self, control: Control) {
        self.queue.push_back(Job::Control(control));
    }

    /// Queues a work request; returns the request it replaced under `LatestOnly`.
    pub fn push_work(&mut self, request: R) -> Option<R> {
        let replaced = match self.discipline {
            QueueDiscipline::LatestOnly => self
                .queue
                .iter()
                .position(|job| matches!(job, Job::Work(_)))
                .and_then(|at| self.queue.remove(at))
                .and_then(|job| match job {
                    Job::Work(old) => Some(old),
                    Job::Control(_) => None,
                }),
            QueueDiscipline::Fifo | QueueDiscipline::Direct => None,
        };
        self.queue.push_back(Job::Work(request));
        replaced
    }

    pub fn pop(&mut self) -> Option<Job<R>> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drops everything still waiting; returns how many items were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.len();
        self.queue.clear();
        n
    }
}
