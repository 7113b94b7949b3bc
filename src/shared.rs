//! Thread-safe handle to a single driver.
//!
//! `SharedDriver` serializes every pin write behind one mutex so a second
//! thread (the interrupt handler) can never interleave its shutdown with a
//! half-applied motor command.
//!
//! # Example
//!
//! ```rust
//! use tb6612_bringup::{hal::SimGpio, MotorId, PinMap, SharedDriver, Tb6612};
//!
//! let shared = SharedDriver::new(Tb6612::new(SimGpio::new(), PinMap::default()));
//! shared.with_driver(|d| d.initialize()).unwrap();
//!
//! let handler = shared.clone();
//! std::thread::spawn(move || {
//!     handler.shutdown();
//! })
//! .join()
//! .unwrap();
//!
//! assert!(!shared.state().enabled);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::driver::{DriverState, Tb6612};
use crate::error::ShutdownReport;
use crate::traits::Gpio;

/// Cloneable, mutex-guarded [`Tb6612`].
///
/// Uses `Mutex` (not `RwLock`): nearly every access writes pins.
/// A poisoned lock is recovered; shutdown still runs after a panic on
/// another thread.
pub struct SharedDriver<G: Gpio> {
    inner: Arc<Mutex<Tb6612<G>>>,
}

impl<G: Gpio> Clone for SharedDriver<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: Gpio> SharedDriver<G> {
    /// Wrap a driver.
    pub fn new(driver: Tb6612<G>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(driver)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tb6612<G>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the driver.
    ///
    /// The closure pattern keeps the lock scoped to one logical operation.
    pub fn with_driver<R>(&self, f: impl FnOnce(&mut Tb6612<G>) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Snapshot of the driver state.
    pub fn state(&self) -> DriverState {
        self.lock().state()
    }

    /// Run [`Tb6612::shutdown`] under the lock.
    pub fn shutdown(&self) -> ShutdownReport {
        self.lock().shutdown()
    }
}
