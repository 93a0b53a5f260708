// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskToken(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Frame,
    Timer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub token: TaskToken,
    pub kind: TaskKind,
    pub at: Duration,
}

pub trait FrameHost {
    fn request_frame(&mut self) -> TaskToken;
    fn cancel_frame(&mut self, token: TaskToken);
}

pub trait TimerHost {
    fn set_interval(&mut self, period: Duration) -> TaskToken;
    fn clear_interval(&mut self, token: TaskToken);
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    token: TaskToken,
    kind: TaskKind,
    due: Duration,
    period: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct Scheduler {
    now: Duration,
    frame_period: Duration,
    next_id: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new(frame_period: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            frame_period: frame_period.max(Duration::from_micros(1)),
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn frame_period(&self) -> Duration {
        self.frame_period
    }

    pub fn advance_to(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.due).min()
    }

    #[cfg(test)]
    pub fn is_pending(&self, token: TaskToken) -> bool {
        self.entries.iter().any(|e| e.token == token)
    }

    #[cfg(test)]
    pub fn pending(&self, kind: TaskKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    // Intervals re-arm one period on; ticks already in the past collapse.
    pub fn pop_due(&mut self) -> Option<Fired> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= self.now)
            .min_by_key(|(_, e)| (e.due, e.token))
            .map(|(i, _)| i)?;

        let entry = self.entries[idx];
        match entry.period {
            Some(period) => {
                let mut due = entry.due + period;
                if due < self.now {
                    due = self.now + period;
                }
                self.entries[idx].due = due;
            }
            None => {
                self.entries.swap_remove(idx);
            }
        }

        Some(Fired {
            token: entry.token,
            kind: entry.kind,
            at: entry.due,
        })
    }

    fn push(&mut self, kind: TaskKind, due: Duration, period: Option<Duration>) -> TaskToken {
        let token = TaskToken(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            token,
            kind,
            due,
            period,
        });
        token
    }

    fn cancel(&mut self, token: TaskToken) {
        self.entries.retain(|e| e.token != token);
    }
}

impl FrameHost for Scheduler {
    fn request_frame(&mut self) -> TaskToken {
        let due = self.now + self.frame_period;
        self.push(TaskKind::Frame, due, None)
    }

    fn cancel_frame(&mut self, token: TaskToken) {
        self.cancel(token);
    }
}

impl TimerHost for Scheduler {
    fn set_interval(&mut self, period: Duration) -> TaskToken {
        let period = period.max(Duration::from_millis(1));
        let due = self.now + period;
        self.push(TaskKind::Timer, due, Some(period))
    }

    fn clear_interval(&mut self, token: TaskToken) {
        self.cancel(token);
    }
}
