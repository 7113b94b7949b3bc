//! Wall-clock delay.

use std::thread;
use std::time::Duration;

use crate::traits::Delay;

/// [`Delay`] backed by `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}
