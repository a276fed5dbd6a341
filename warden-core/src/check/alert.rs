//! Staff alerts.

use std::sync::Arc;

use warden_utils::template::{Template, shorten};

use super::CheckKind;
use super::violation::{Severity, Violation};
use crate::config::{ConfigStore, keys};
use crate::player::PlayerState;
use crate::registry::ConnectionRegistry;

/// Default prefix substituted for `{prefix}`.
pub const DEFAULT_PREFIX: &str = "&7(&b&lWarden&7)&r";
const DEFAULT_STAFF_ALERT: &str =
    "{prefix} &b{username} &8┃ &f{mitigation} &b{checkname} &8┃ &3x{violations}";
const DEFAULT_ALERT_CONTENT: &str = " &7Username: &b{username}{n} &7Version: &b{clientVersion}{n} \
     &7Brand: &b{brand}{n} &7Exist since: &b{ticksExisted}{n} &7Game mode: &b{gameMode}{n} \
     &7Tag: &b{tags}{n} &7Debug info: &b{debugInfo}{n}{n} {alertNote}";
const DEFAULT_ALERT_COMMAND: &str = "/tp {username}";
const DEFAULT_ALERT_NOTE: &str = "&fClick to teleport";

/// Longest debug text shown in alerts and console lines.
pub const MAX_DEBUG_CHARS: usize = 50;

/// A clickable chat line shown to staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    /// The visible line.
    pub headline: String,
    /// Text shown when hovering the line.
    pub hover: String,
    /// Command run when clicking the line.
    pub click_command: String,
}

impl AlertMessage {
    /// Renders the configured layouts for one violation of `subject`.
    #[must_use]
    pub fn build(
        config: &ConfigStore,
        subject: &PlayerState,
        kind: Option<CheckKind>,
        violation: &Violation,
        violations: u32,
    ) -> Self {
        let prefix = config.get_string(keys::PREFIX, DEFAULT_PREFIX);
        let username = subject.name();
        let check_name = kind.map_or("", CheckKind::friendly_name);

        let headline = Template::new(config.get_string(keys::STAFF_ALERT, DEFAULT_STAFF_ALERT))
            .replace_prefix(prefix)
            .replace("{username}", username)
            .replace("{mitigation}", violation.severity.friendly_message())
            .replace("{checkname}", check_name)
            .replace("{violations}", violations.to_string())
            .colorize()
            .into_string();

        let note = Template::new(config.get_string(keys::ALERT_COMMAND_NOTE, DEFAULT_ALERT_NOTE))
            .replace_prefix(prefix)
            .colorize()
            .into_string();

        let hover = Template::new(config.get_string(keys::ALERT_CONTENT, DEFAULT_ALERT_CONTENT))
            .replace("{username}", username)
            .replace("{clientVersion}", &subject.identity.client_version)
            .replace("{brand}", subject.brand())
            .replace("{ticksExisted}", format!("{} ticks", subject.ticks_existed()))
            .replace("{gameMode}", subject.game_mode().name())
            .replace("{tags}", check_name.to_lowercase())
            .replace("{debugInfo}", shorten(&violation.debug_info, MAX_DEBUG_CHARS))
            .replace_prefix(prefix)
            .colorize()
            .replace("{alertNote}", note)
            .into_string();

        let click_command =
            Template::new(config.get_string(keys::ALERT_COMMAND, DEFAULT_ALERT_COMMAND))
                .replace("{username}", username)
                .into_string();

        Self {
            headline,
            hover,
            click_command,
        }
    }
}

/// Sends `alert` to every connection that opted in for `severity`.
///
/// Mitigations go to viewers with mitigation alerts enabled, everything else to
/// viewers with regular alerts enabled.
pub fn broadcast(registry: &ConnectionRegistry, severity: Severity, alert: &AlertMessage) {
    let mut recipients: Vec<Arc<PlayerState>> = Vec::new();
    registry.for_each(|viewer| {
        let setting = if severity == Severity::Mitigate {
            &viewer.mitigation_settings
        } else {
            &viewer.alert_settings
        };
        if setting.enabled() {
            recipients.push(Arc::clone(viewer));
        }
        true
    });

    for viewer in recipients {
        viewer.connection().send_alert(alert);
    }
}
