//! The seam between the detection engine and a live network connection.
//!
//! The trait is object-safe so the host server can plug in its real connection
//! type while tests and trace replay use recording implementations.

use thiserror::Error;

use crate::check::alert::AlertMessage;

/// An error raised when the host fails to act on a connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The connection was already closed.
    #[error("connection already closed")]
    Closed,
    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

/// An object-safe handle to a player's connection.
///
/// Every method is called from the packet path and must not block: implementations
/// are expected to enqueue outbound data and return.
pub trait NetworkConnection: Send + Sync {
    /// Sends a plain system chat line (legacy `§` formatting allowed).
    fn send_system_message(&self, message: &str);

    /// Sends a clickable staff alert.
    fn send_alert(&self, alert: &AlertMessage);

    /// Disconnects the player with a reason.
    fn disconnect_with_reason(&self, reason: &str) -> Result<(), ConnectionError>;

    /// Returns the current latency in milliseconds.
    fn latency(&self) -> i32;

    /// Whether the player holds the given permission node.
    fn has_permission(&self, permission: &str) -> bool;
}
