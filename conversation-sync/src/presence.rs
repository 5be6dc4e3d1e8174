//! Presence inference with a single decay timer.
//!
//! Arming replaces any pending deadline, so there is never more than one active timer.
//! The deadline is checked lazily against [`tokio::time::Instant`], which lets tests drive it
//! with a paused clock.

use std::time::Duration;

use tokio::time::Instant;

use crate::types::Presence;

/// Online without further inbound messages decays to offline after this long.
pub const ONLINE_TIMEOUT: Duration = Duration::from_secs(20);
/// After the customer stops typing, online decays to offline after this long.
pub const TYPING_STOPPED_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Default)]
pub struct PresenceTracker {
    state: Presence,
    decay_at: Option<Instant>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presence as of now, honoring an elapsed deadline.
    pub fn current(&self) -> Presence {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Presence {
        match self.decay_at {
            Some(deadline) if now >= deadline => Presence::Offline,
            _ => self.state,
        }
    }

    /// Pending decay deadline, if a timer is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.decay_at
    }

    /// Online, decaying to offline after `timeout`. Re-arms the timer.
    pub fn online_for(&mut self, timeout: Duration) {
        self.state = Presence::Online;
        self.decay_at = Some(Instant::now() + timeout);
    }

    /// Typing holds until the next typing or message event.
    pub fn typing(&mut self) {
        self.state = Presence::Typing;
        self.decay_at = None;
    }

    /// Offline with no timer armed.
    pub fn reset(&mut self) {
        self.state = Presence::Offline;
        self.decay_at = None;
    }

    /// Applies an elapsed deadline; returns true if presence changed.
    pub fn settle(&mut self) -> bool {
        match self.decay_at {
            Some(deadline) if Instant::now() >= deadline => {
                let changed = self.state != Presence::Offline;
                self.reset();
                changed
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_online_decays_after_timeout() {
        let mut p = PresenceTracker::new();
        p.online_for(ONLINE_TIMEOUT);
        tokio::time::advance(Duration::from_secs(19)).await;
        assert_eq!(p.current(), Presence::Online);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(p.current(), Presence::Offline);
        assert!(p.settle());
        assert!(p.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_replaces_deadline() {
        let mut p = PresenceTracker::new();
        p.online_for(ONLINE_TIMEOUT);
        tokio::time::advance(Duration::from_secs(15)).await;
        p.online_for(ONLINE_TIMEOUT);
        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(p.current(), Presence::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_has_no_timer() {
        let mut p = PresenceTracker::new();
        p.online_for(ONLINE_TIMEOUT);
        p.typing();
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(p.current(), Presence::Typing);
        assert!(!p.settle());
    }
}
