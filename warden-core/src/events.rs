//! Detection events for external observers.
//!
//! Publishing never blocks the packet path: a full or closed channel drops the
//! event and bumps a counter instead.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

use crate::check::CheckKind;
use crate::check::violation::Severity;
use crate::player::ConnectionId;

/// A violation that passed the punished gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionEvent {
    /// Offending connection.
    pub connection: ConnectionId,
    /// Display name at detection time.
    pub player_name: String,
    /// Which check fired.
    pub kind: Option<CheckKind>,
    /// Escalation level.
    pub severity: Severity,
    /// Check-provided detail.
    pub debug_info: String,
    /// Violation counter after this violation.
    pub violations: u32,
    /// Wall-clock time of the detection.
    pub at_millis: u64,
}

/// Sending half of the detection event channel.
#[derive(Debug)]
pub struct EventSink {
    sender: Sender<DetectionEvent>,
    dropped: AtomicU64,
}

impl EventSink {
    /// Creates a bounded channel. A capacity of zero is raised to one.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, Receiver<DetectionEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                dropped: AtomicU64::new(0),
            },
            receiver,
        )
    }

    /// Publishes without waiting.
    pub fn publish(&self, event: DetectionEvent) {
        if let Err(err) = self.sender.try_send(event) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            match err {
                TrySendError::Full(event) => {
                    log::debug!(
                        "Detection event queue full, dropping event for {}",
                        event.player_name
                    );
                }
                TrySendError::Closed(_) => {}
            }
        }
    }

    /// Number of events dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn event(violations: u32) -> DetectionEvent {
        DetectionEvent {
            connection: ConnectionId(Uuid::nil()),
            player_name: String::from("Steve"),
            kind: Some(CheckKind::InvalidMove),
            severity: Severity::Kick,
            debug_info: String::new(),
            violations,
            at_millis: 0,
        }
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (sink, mut receiver) = EventSink::channel(1);
        sink.publish(event(1));
        sink.publish(event(2));
        assert_eq!(sink.dropped(), 1);
        assert_eq!(receiver.try_recv().map(|e| e.violations).ok(), Some(1));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn closed_queue_drops() {
        let (sink, receiver) = EventSink::channel(4);
        drop(receiver);
        sink.publish(event(1));
        assert_eq!(sink.dropped(), 1);
    }
}
