// src/coordinator.rs
//! Shared/exclusive discipline between content ciphering and key rotation
//!
//! Many non-privileged tasks (encrypt/decrypt) may run at once; a privileged
//! task (key rotation) runs alone. The policy is write-preferring and
//! fail-fast: while an exclusive holder is active, new shared acquisitions
//! are refused with [`ConcurrencyError::Busy`] instead of queueing, and
//! shared holders already in flight are left to finish undisturbed. Only
//! competing exclusive acquisitions block, on a condition variable.

use parking_lot::{Condvar, Mutex};

use crate::error::ConcurrencyError;

#[derive(Debug, Default)]
struct LockState {
    shared: usize,
    exclusive: bool,
}

#[derive(Debug, Default)]
pub struct ConcurrencyCoordinator {
    state: Mutex<LockState>,
    exclusive_released: Condvar,
}

impl ConcurrencyCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants shared access unless a privileged task holds exclusivity, in
    /// which case the caller fails fast and may retry later.
    pub fn acquire_shared(&self) -> Result<SharedGuard<'_>, ConcurrencyError> {
        let mut state = self.state.lock();
        if state.exclusive {
            return Err(ConcurrencyError::Busy);
        }
        state.shared += 1;
        Ok(SharedGuard { coordinator: self })
    }

    /// Grants exclusive access, blocking while another privileged task holds
    /// it. Shared holders granted earlier are not waited for; new arrivals
    /// are refused until the returned guard is dropped.
    pub fn acquire_exclusive(&self) -> ExclusiveGuard<'_> {
        let mut state = self.state.lock();
        while state.exclusive {
            self.exclusive_released.wait(&mut state);
        }
        state.exclusive = true;
        ExclusiveGuard { coordinator: self }
    }

    #[cfg(test)]
    fn snapshot(&self) -> (usize, bool) {
        let state = self.state.lock();
        (state.shared, state.exclusive)
    }
}

/// Shared access to the active key generation; released on drop.
#[must_use]
pub struct SharedGuard<'a> {
    coordinator: &'a ConcurrencyCoordinator,
}

impl Drop for SharedGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.state.lock().shared -= 1;
    }
}

/// Exclusive access to the active key generation; released on drop.
#[must_use]
pub struct ExclusiveGuard<'a> {
    coordinator: &'a ConcurrencyCoordinator,
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.state.lock().exclusive = false;
        self.coordinator.exclusive_released.notify_all();
    }
}
