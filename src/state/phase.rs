//! Crawl lifecycle phases driven by the supervisor
//!
//! Valid transitions: `Idle → Seeding → Running → Draining → Stopped`. A run
//! that drains normally still passes through `Draining` for its final flush.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Nothing loaded yet
    Idle,

    /// Loading ledger and queue, seeding if empty
    Seeding,

    /// Worker pool and timers active
    Running,

    /// Pool stopping; state being flushed
    Draining,

    /// Final flush and checkpoint written
    Stopped,
}

impl CrawlPhase {
    /// Returns true if `next` may follow this phase
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Seeding)
                | (Self::Seeding, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Stopped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
