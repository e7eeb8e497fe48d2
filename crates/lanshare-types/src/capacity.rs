use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::TypeError;

/// Maximum retained count for a store or the history log.
///
/// Reads are a single atomic load and may observe a value that is one
/// `set` behind. Writes are serialized through `write_lock`, so two
/// concurrent `set` calls never interleave.
pub struct Capacity {
    value: AtomicUsize,
    write_lock: Mutex<()>,
}

impl Capacity {
    /// Smallest accepted capacity.
    pub const MIN: usize = 1;
    /// Largest accepted capacity.
    pub const MAX: usize = 100;

    /// Create a controller with the given initial value.
    pub fn new(initial: i64) -> Result<Self, TypeError> {
        let value = Self::validate(initial)?;
        Ok(Self {
            value: AtomicUsize::new(value),
            write_lock: Mutex::new(()),
        })
    }

    /// Check that `value` lies in `[MIN, MAX]` and narrow it to `usize`.
    pub fn validate(value: i64) -> Result<usize, TypeError> {
        let out_of_range = || TypeError::OutOfRange {
            value,
            min: Self::MIN,
            max: Self::MAX,
        };
        let narrowed = usize::try_from(value).map_err(|_| out_of_range())?;
        if !(Self::MIN..=Self::MAX).contains(&narrowed) {
            return Err(out_of_range());
        }
        Ok(narrowed)
    }

    /// Current limit.
    pub fn get(&self) -> usize {
        self.value.load(Ordering::Acquire)
    }

    /// Replace the limit. Out-of-range values leave it unchanged.
    pub fn set(&self, value: i64) -> Result<(), TypeError> {
        let value = Self::validate(value)?;
        let _guard = self.write_lock.lock().expect("capacity lock poisoned");
        self.value.store(value, Ordering::Release);
        Ok(())
    }
}

impl fmt::Debug for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capacity").field(&self.get()).finish()
    }
}
