//! Single-slot transient status messages

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub text: String,
    shown_at: Instant,
}

/// Holds at most one message. A new message replaces the current one, and a
/// message disappears once `ttl` has elapsed since it was shown.
#[derive(Debug, Clone)]
pub struct MessageSlot {
    current: Option<StatusMessage>,
    ttl: Duration,
}

impl MessageSlot {
    pub fn new(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    pub fn show(&mut self, kind: MessageKind, text: impl Into<String>, now: Instant) {
        self.current = Some(StatusMessage {
            kind,
            text: text.into(),
            shown_at: now,
        });
    }

    /// The visible message at `now`, if any
    pub fn current(&self, now: Instant) -> Option<&StatusMessage> {
        self.current
            .as_ref()
            .filter(|m| now.saturating_duration_since(m.shown_at) < self.ttl)
    }

    /// Drop the message once it has expired
    pub fn tick(&mut self, now: Instant) {
        if self.current(now).is_none() {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_expires_after_ttl() {
        let mut slot = MessageSlot::new(Duration::from_secs(5));
        let t0 = Instant::now();
        slot.show(MessageKind::Success, "saved", t0);

        assert!(slot.current(t0 + Duration::from_millis(4999)).is_some());
        assert!(slot.current(t0 + Duration::from_secs(5)).is_none());

        slot.tick(t0 + Duration::from_secs(6));
        assert!(slot.current(t0).is_none());
    }

    #[test]
    fn test_new_message_replaces_old() {
        let mut slot = MessageSlot::new(Duration::from_secs(5));
        let t0 = Instant::now();
        slot.show(MessageKind::Error, "first", t0);
        slot.show(MessageKind::Info, "second", t0 + Duration::from_secs(4));

        // The replacement restarts the clock
        let visible = slot.current(t0 + Duration::from_secs(8)).unwrap();
        assert_eq!(visible.text, "second");
        assert_eq!(visible.kind, MessageKind::Info);
    }
}
