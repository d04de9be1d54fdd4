//! Monotonic time source
//!
//! Used to enforce the minimum spacing between two commands sent to the
//! controller.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary fixed origin
    ///
    /// Must never go backwards.
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `earlier`, saturating at zero
    fn elapsed_since(&self, earlier: u64) -> u64 {
        self.now_ms().saturating_sub(earlier)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
