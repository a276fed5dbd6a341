//! Lock aliases used throughout the workspace.
//!
//! Everything synchronous goes through `parking_lot`; the aliases keep call sites
//! independent of the backing implementation.

/// A non-async mutex.
pub type SyncMutex<T> = parking_lot::Mutex<T>;
/// Guard returned by [`SyncMutex::lock`].
pub type SyncMutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;
/// A non-async reader-writer lock.
pub type SyncRwLock<T> = parking_lot::RwLock<T>;
/// Read guard returned by [`SyncRwLock::read`].
pub type SyncRwLockReadGuard<'a, T> = parking_lot::RwLockReadGuard<'a, T>;
/// Write guard returned by [`SyncRwLock::write`].
pub type SyncRwLockWriteGuard<'a, T> = parking_lot::RwLockWriteGuard<'a, T>;
