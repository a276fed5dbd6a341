//! The outcome of a single detected anomaly.

use std::fmt;

/// How a violation is escalated. Ordered by escalation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Drop the packet, nothing else.
    Mitigate,
    /// Drop the packet and disconnect the player.
    Kick,
    /// Drop the packet, ban and disconnect the player.
    Ban,
}

impl Severity {
    /// Past-tense description used in console lines and alerts.
    #[must_use]
    pub const fn friendly_message(self) -> &'static str {
        match self {
            Self::Mitigate => "mitigated",
            Self::Kick => "kicked",
            Self::Ban => "banned",
        }
    }

    /// Whether this severity ends the connection.
    #[must_use]
    pub const fn punishes(self) -> bool {
        !matches!(self, Self::Mitigate)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.friendly_message())
    }
}

/// One detected anomaly. Built fresh by a check and consumed by
/// [`DetectionBase::report_violation`](super::detection::DetectionBase::report_violation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Escalation level.
    pub severity: Severity,
    /// Human readable detail, may be empty.
    pub debug_info: String,
}

impl Violation {
    /// Creates a violation.
    #[must_use]
    pub fn new(severity: Severity, debug_info: impl Into<String>) -> Self {
        Self {
            severity,
            debug_info: debug_info.into(),
        }
    }

    /// A `Mitigate` violation.
    #[must_use]
    pub fn mitigate(debug_info: impl Into<String>) -> Self {
        Self::new(Severity::Mitigate, debug_info)
    }

    /// A `Kick` violation.
    #[must_use]
    pub fn kick(debug_info: impl Into<String>) -> Self {
        Self::new(Severity::Kick, debug_info)
    }

    /// A `Ban` violation.
    #[must_use]
    pub fn ban(debug_info: impl Into<String>) -> Self {
        Self::new(Severity::Ban, debug_info)
    }
}
