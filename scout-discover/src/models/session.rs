//! Discovery session state machine
//!
//! `Idle → Running → {Completed, Stopped}`. A session that ran past its
//! deadline still ends `Completed`; the `timed_out` flag tells them apart.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscoveryState {
    /// Created, `discover` not yet called
    Idle,
    /// Expanding the seed and fetching candidates
    Running,
    /// Batch loop finished (possibly after the deadline passed)
    Completed,
    /// Ended by an external stop
    Stopped,
}

/// Mutable per-session control state, owned by the engine
#[derive(Debug, Clone)]
pub struct SessionState {
    pub state: DiscoveryState,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Monotonic start, used for the deadline and elapsed time
    pub started: Option<Instant>,
    pub deadline: Option<Instant>,
    pub max_duration: Option<Duration>,
    pub result_cap: usize,
    pub timed_out: bool,
}

impl SessionState {
    pub fn new(result_cap: usize, max_duration: Option<Duration>) -> Self {
        Self {
            state: DiscoveryState::Idle,
            started_at: None,
            ended_at: None,
            started: None,
            deadline: None,
            max_duration,
            result_cap,
            timed_out: false,
        }
    }

    /// `Idle → Running`: stamp start time and arm the deadline
    pub fn start(&mut self) {
        let now = Instant::now();
        self.state = DiscoveryState::Running;
        self.started_at = Some(Utc::now());
        self.started = Some(now);
        // A deadline past the end of the clock is no deadline
        self.deadline = self.max_duration.and_then(|d| now.checked_add(d));
        self.timed_out = false;
    }

    /// Move to a terminal state
    pub fn finish(&mut self, state: DiscoveryState) {
        self.state = state;
        self.ended_at = Some(Utc::now());
    }

    pub fn is_running(&self) -> bool {
        self.state == DiscoveryState::Running
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, DiscoveryState::Completed | DiscoveryState::Stopped)
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_arms_deadline() {
        let mut session = SessionState::new(10, Some(Duration::from_secs(60)));
        assert_eq!(session.state, DiscoveryState::Idle);
        assert!(session.deadline.is_none());

        session.start();
        assert!(session.is_running());
        assert!(session.deadline.is_some());
        assert!(!session.deadline_passed());
    }

    #[test]
    fn test_no_deadline_never_passes() {
        let mut session = SessionState::new(10, None);
        session.start();
        assert!(!session.deadline_passed());
    }

    #[test]
    fn test_zero_deadline_passes_immediately() {
        let mut session = SessionState::new(10, Some(Duration::ZERO));
        session.start();
        assert!(session.deadline_passed());
    }

    #[test]
    fn test_unrepresentable_deadline_never_passes() {
        let mut session = SessionState::new(10, Some(Duration::MAX));
        session.start();
        assert!(session.deadline.is_none());
        assert!(!session.deadline_passed());
    }

    #[test]
    fn test_finish_is_terminal() {
        let mut session = SessionState::new(1, None);
        session.start();
        session.finish(DiscoveryState::Stopped);
        assert!(session.is_terminal());
        assert!(!session.is_running());
        assert!(session.ended_at.is_some());
    }
}
