//! The violation lifecycle shared by every check.

use warden_utils::template::shorten;

use super::alert::{self, AlertMessage, MAX_DEBUG_CHARS};
use super::violation::Violation;
use super::{CheckContext, CheckKind, PacketEvent};
use crate::config::keys;
use crate::events::DetectionEvent;

/// Violation state of one check on one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionBase {
    kind: Option<CheckKind>,
    violations: u32,
}

impl DetectionBase {
    /// Creates the state for a check of the given kind.
    #[must_use]
    pub const fn new(kind: Option<CheckKind>) -> Self {
        Self {
            kind,
            violations: 0,
        }
    }

    /// The check's identity.
    #[must_use]
    pub const fn kind(&self) -> Option<CheckKind> {
        self.kind
    }

    /// Violations recorded so far.
    #[must_use]
    pub const fn violations(&self) -> u32 {
        self.violations
    }

    /// Overwrites the violation counter.
    pub const fn set_violations(&mut self, violations: u32) {
        self.violations = violations;
    }

    /// Handles one detected anomaly.
    ///
    /// The packet is cancelled unconditionally. Nothing else happens once the
    /// connection is punished. Otherwise the counter is bumped, a
    /// [`DetectionEvent`] is published, the violation is logged and broadcast to
    /// staff and, unless it is a mitigation, the connection is punished.
    pub fn report_violation<P>(
        &mut self,
        ctx: CheckContext<'_>,
        event: &mut PacketEvent<P>,
        violation: Violation,
    ) {
        event.cancel();

        let player = ctx.player;
        if player.is_punished() {
            return;
        }

        self.violations = self.violations.saturating_add(1);

        ctx.warden.events().publish(DetectionEvent {
            connection: player.id(),
            player_name: player.name().to_owned(),
            kind: self.kind,
            severity: violation.severity,
            debug_info: violation.debug_info.clone(),
            violations: self.violations,
            at_millis: ctx.now_millis(),
        });

        self.console_log(ctx, &violation);

        let alert = AlertMessage::build(
            ctx.config(),
            player,
            self.kind,
            &violation,
            self.violations,
        );
        alert::broadcast(ctx.warden.registry(), violation.severity, &alert);

        if violation.severity.punishes() {
            if let Some(kind) = self.kind {
                ctx.warden.kick_stats().record(kind);
            }
            let punishments = ctx.warden.punishments();
            punishments.block_address_if_enabled(ctx.config(), player, violation.severity);
            punishments.punish(ctx.config(), player, violation.severity);
        }
    }

    fn console_log(&self, ctx: CheckContext<'_>, violation: &Violation) {
        if !violation.severity.punishes()
            || !ctx.config().get_bool(keys::LOG_VIOLATION_TO_CONSOLE, true)
        {
            return;
        }

        let debug = if violation.debug_info.is_empty() {
            String::from("No debug available")
        } else {
            shorten(&violation.debug_info, MAX_DEBUG_CHARS)
        };
        let (name, id) = self
            .kind
            .map_or(("", 0), |kind| (kind.friendly_name(), kind.id()));

        log::info!(
            "Player {} got {} sending a protocol packet",
            ctx.player.name(),
            violation.severity.friendly_message()
        );
        log::info!("Debug information: {debug}");
        log::info!("Check Information: {name}/{id} - VL: {}", self.violations);
    }
}
