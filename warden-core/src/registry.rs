//! The set of live connections.

use std::sync::Arc;
use std::time::Duration;

use crate::player::{ConnectionId, PlayerState};
use crate::scheduler::Scheduler;
use crate::update::UpdateChecker;

/// Delay between joining and the update notice, five ticks.
pub const UPDATE_CHECK_DELAY: Duration = Duration::from_millis(250);
/// Permission required to see update notices.
pub const UPDATE_PERMISSION: &str = "warden.update";

/// Concurrent map of every live connection.
///
/// Network callbacks insert and remove entries while alert broadcasts and
/// scheduled tasks iterate; `scc` buckets keep those from serializing on a
/// single lock.
pub struct ConnectionRegistry {
    players: Arc<scc::HashMap<ConnectionId, Arc<PlayerState>>>,
    scheduler: Scheduler,
    updates: Option<Arc<UpdateChecker>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry. Without an update checker no update notice is
    /// ever scheduled.
    #[must_use]
    pub fn new(scheduler: Scheduler, updates: Option<Arc<UpdateChecker>>) -> Self {
        Self {
            players: Arc::new(scc::HashMap::new()),
            scheduler,
            updates,
        }
    }

    /// Registers a connection, replacing any stale entry with the same id.
    pub fn on_connect(&self, state: Arc<PlayerState>) {
        let id = state.id();
        self.players.upsert_sync(id, state);
        self.schedule_update_notice(id);
    }

    /// Removes a connection. Returns the removed state, if it was registered.
    pub fn on_disconnect(&self, id: ConnectionId) -> Option<Arc<PlayerState>> {
        self.players.remove_sync(&id).map(|(_, state)| state)
    }

    /// Looks up a connection by id.
    pub fn get(&self, id: ConnectionId) -> Option<Arc<PlayerState>> {
        self.players.read_sync(&id, |_, state| Arc::clone(state))
    }

    /// Looks up a connection by entity id.
    pub fn by_entity_id(&self, entity_id: i32) -> Option<Arc<PlayerState>> {
        self.find(|state| state.identity.entity_id == entity_id)
    }

    /// Looks up a connection by name, ignoring ASCII case.
    pub fn by_name(&self, name: &str) -> Option<Arc<PlayerState>> {
        self.find(|state| state.name().eq_ignore_ascii_case(name))
    }

    /// Calls `f` for every connection until it returns `false`.
    pub fn for_each(&self, mut f: impl FnMut(&Arc<PlayerState>) -> bool) {
        self.players.iter_sync(|_, state| f(state));
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn find(&self, mut predicate: impl FnMut(&PlayerState) -> bool) -> Option<Arc<PlayerState>> {
        let mut found = None;
        self.for_each(|state| {
            if predicate(state) {
                found = Some(Arc::clone(state));
                return false;
            }
            true
        });
        found
    }

    fn schedule_update_notice(&self, id: ConnectionId) {
        let Some(updates) = self.updates.clone() else {
            return;
        };
        let players = Arc::clone(&self.players);
        self.scheduler.run_after(UPDATE_CHECK_DELAY, async move {
            let latest = match updates.latest_version().await {
                Ok(latest) => latest,
                Err(e) => {
                    log::debug!("Update check failed: {e}");
                    return;
                }
            };
            if !updates.is_outdated(&latest) {
                return;
            }
            let Some(state) = players.read_async(&id, |_, state| Arc::clone(state)).await else {
                return;
            };
            if !state.identity.operator || !state.connection().has_permission(UPDATE_PERMISSION) {
                return;
            }
            let connection = state.connection();
            connection.send_system_message("§7A newer version of §bWarden §7is available.");
            connection.send_system_message(&format!(
                "§7You are running §c{}§7, the latest release is §a{latest}§7.",
                updates.local_version()
            ));
        });
    }
}
