//! Transient notices raised by page actions.

use std::collections::VecDeque;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Error => "error",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: Level,
    pub message: String,
}

/// Bounded FIFO; the oldest notice is dropped once `capacity` is reached.
#[derive(Clone, Debug)]
pub struct Toasts {
    queue: VecDeque<Notice>,
    capacity: usize,
    next_id: u64,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::with_capacity(5)
    }
}

impl Toasts {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) -> u64 {
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
        }
        let id = self.next_id;
        self.next_id += 1;
        self.queue.push_back(Notice {
            id,
            level,
            message: message.into(),
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(Level::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(Level::Error, message)
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.queue.len();
        self.queue.retain(|n| n.id != id);
        self.queue.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }
}
