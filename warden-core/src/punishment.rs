//! Enforcement of kicks, bans and address blocks.

use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashSet;
use uuid::Uuid;
use warden_protocol::PacketError;
use warden_utils::locks::SyncRwLock;
use warden_utils::template::Template;

use crate::check::alert::DEFAULT_PREFIX;
use crate::check::violation::Severity;
use crate::config::{ConfigStore, keys};
use crate::player::PlayerState;

const DEFAULT_KICK_MESSAGE: &str = "{prefix} &cYou have been kicked for suspicious activity";
const DEFAULT_BAN_MESSAGE: &str = "{prefix} &cYou have been banned for suspicious activity";
const DEFAULT_EXCEPTION_MESSAGE: &str = "{prefix} &cInvalid packet received, please reconnect";

/// Addresses refused at connect time.
///
/// Writers copy the set and swap it in, so readers always see a complete
/// snapshot without taking a lock.
#[derive(Debug, Default)]
pub struct AddressBlockList {
    addresses: ArcSwap<FxHashSet<IpAddr>>,
}

impl AddressBlockList {
    /// Adds an address. Returns `false` if it was already blocked.
    pub fn add(&self, address: IpAddr) -> bool {
        let mut inserted = false;
        self.addresses.rcu(|current| {
            let mut next = FxHashSet::clone(current);
            inserted = next.insert(address);
            next
        });
        inserted
    }

    /// Whether the address is blocked.
    pub fn is_blocked(&self, address: &IpAddr) -> bool {
        self.addresses.load().contains(address)
    }

    /// Number of blocked addresses.
    pub fn len(&self) -> usize {
        self.addresses.load().len()
    }

    /// Whether no address is blocked.
    pub fn is_empty(&self) -> bool {
        self.addresses.load().is_empty()
    }

    /// A consistent view of the whole list.
    pub fn snapshot(&self) -> Arc<FxHashSet<IpAddr>> {
        self.addresses.load_full()
    }
}

/// Profiles banned during this process lifetime.
#[derive(Debug, Default)]
pub struct BanList {
    banned: SyncRwLock<FxHashSet<Uuid>>,
}

impl BanList {
    /// Bans a profile. Returns `false` if it was already banned.
    pub fn add(&self, id: Uuid) -> bool {
        self.banned.write().insert(id)
    }

    /// Whether the profile is banned.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.banned.read().contains(id)
    }

    /// Number of banned profiles.
    pub fn len(&self) -> usize {
        self.banned.read().len()
    }

    /// Whether nobody is banned.
    pub fn is_empty(&self) -> bool {
        self.banned.read().is_empty()
    }
}

/// Turns severities into actions on the connection.
#[derive(Debug, Default)]
pub struct PunishmentDispatch {
    blocked_addresses: AddressBlockList,
    bans: BanList,
}

impl PunishmentDispatch {
    /// Creates a dispatcher with empty lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The address block list.
    #[must_use]
    pub const fn blocked_addresses(&self) -> &AddressBlockList {
        &self.blocked_addresses
    }

    /// The ban list.
    #[must_use]
    pub const fn bans(&self) -> &BanList {
        &self.bans
    }

    /// Blocks the player's IP when `severity` is a ban, bans are enabled and
    /// `block-connections-after-ban` is on.
    pub fn block_address_if_enabled(
        &self,
        config: &ConfigStore,
        player: &PlayerState,
        severity: Severity,
    ) {
        if severity != Severity::Ban
            || !config.get_bool(keys::BAN_ENABLED, true)
            || !config.get_bool(keys::BLOCK_CONNECTIONS_AFTER_BAN, true)
        {
            return;
        }
        let address = player.identity.address.ip();
        if self.blocked_addresses.add(address) {
            log::info!("Blocked address {address} of {}", player.name());
        }
    }

    /// Moves the player into the punished state and enforces `severity`.
    ///
    /// Only the first call for a connection has an effect. A ban with the ban
    /// feature disabled is enforced as a kick. A failed disconnect is logged and
    /// not retried; the player stays punished either way.
    pub fn punish(&self, config: &ConfigStore, player: &PlayerState, severity: Severity) {
        if !severity.punishes() || !player.mark_punished() {
            return;
        }

        let severity = if severity == Severity::Ban && !config.get_bool(keys::BAN_ENABLED, true) {
            Severity::Kick
        } else {
            severity
        };

        let (key, default) = match severity {
            Severity::Ban => {
                self.bans.add(player.id().0);
                (keys::BAN_MESSAGE, DEFAULT_BAN_MESSAGE)
            }
            _ => (keys::KICK_MESSAGE, DEFAULT_KICK_MESSAGE),
        };
        let reason = render(config, key, default);

        if let Err(e) = player.connection().disconnect_with_reason(&reason) {
            log::error!("Failed to disconnect {} after {severity}: {e}", player.name());
        }
    }

    /// Disconnects a player whose packet could not be decoded.
    pub fn exception_disconnect(&self, config: &ConfigStore, player: &PlayerState, error: &PacketError) {
        if !player.mark_punished() {
            return;
        }
        log::warn!("Disconnecting {}: {error}", player.name());
        let reason = render(config, keys::EXCEPTION_MESSAGE, DEFAULT_EXCEPTION_MESSAGE);
        if let Err(e) = player.connection().disconnect_with_reason(&reason) {
            log::error!("Failed to disconnect {}: {e}", player.name());
        }
    }
}

fn render(config: &ConfigStore, key: &str, default: &str) -> String {
    Template::new(config.get_string(key, default))
        .replace_prefix(config.get_string(keys::PREFIX, DEFAULT_PREFIX))
        .colorize()
        .into_string()
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn block_list_deduplicates() {
        let list = AddressBlockList::default();
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
        assert!(list.add(ip));
        assert!(!list.add(ip));
        assert!(list.is_blocked(&ip));
        assert_eq!(list.len(), 1);
        assert!(list.snapshot().contains(&ip));
    }

    #[test]
    fn concurrent_writers_keep_every_address() {
        let list = Arc::new(AddressBlockList::default());
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let list = Arc::clone(&list);
                std::thread::spawn(move || {
                    for j in 0..32u8 {
                        list.add(IpAddr::V4(Ipv4Addr::new(10, 0, i, j)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(list.len(), 8 * 32);
    }

    #[test]
    fn render_substitutes_prefix() {
        let mut config = ConfigStore::default();
        config.set(keys::PREFIX, "&7[W]");
        config.set(keys::KICK_MESSAGE, "{prefix} bye");
        assert_eq!(render(&config, keys::KICK_MESSAGE, ""), "§7[W] bye");
    }
}
