//! monotonic tick source
//!
//! every delay in this crate is measured in ticks of a single free-running clock
//! with the default [`Timing`](crate::Timing) one tick is one microsecond
//!
//! ticks wrap
//! all comparisons go through [`Tick::elapsed_since`], which is exact for any
//! interval shorter than half the range (about 35 minutes at 1 MHz), far longer than the
//! longest wait the driver ever does

use core::sync::atomic::{AtomicU32, Ordering};

/// a point in time, in ticks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick(pub u32);

impl Tick {
    /// ticks passed since `earlier`, correct across wraparound
    pub const fn elapsed_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    pub const fn wrapping_add(self, ticks: u32) -> Tick {
        Tick(self.0.wrapping_add(ticks))
    }

    /// `true` once at least `ticks` have passed since `earlier`
    pub const fn has_elapsed(self, earlier: Tick, ticks: u32) -> bool {
        self.elapsed_since(earlier) >= ticks
    }
}

/// anything that can tell the current time
pub trait TickSource {
    fn now(&self) -> Tick;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// overflow count of a hardware timer
///
/// put one in a `static` and call [`increment`](Self::increment) from the timer's overflow
/// interrupt. the interrupt is the only writer, so a plain load/store pair is enough and
/// works on cores without atomic read-modify-write
#[derive(Debug, Default)]
pub struct OverflowCounter(AtomicU32);

impl OverflowCounter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// call once per counter wrap, from interrupt context
    pub fn increment(&self) {
        let v = self.0.load(Ordering::Relaxed);
        self.0.store(v.wrapping_add(1), Ordering::Release);
    }

    pub fn load(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }
}

/// a hardware counter register that counts up and wraps, raising an interrupt on wrap
pub trait FreeRunningCounter {
    /// raw counts per tick, i.e. the prescaler between the counter and engine time
    const COUNTS_PER_TICK: u32;
    /// counter modulus, `1 << 16` for a 16 bit timer
    const COUNTS_PER_OVERFLOW: u32;

    /// current value of the counter register
    fn count(&self) -> u32;

    /// whether the timer has wrapped but the interrupt has not run yet
    ///
    /// reading the hardware's overflow flag here makes reads taken with interrupts masked
    /// monotonic too
    /// timers that can't tell may keep the default
    fn overflow_pending(&self) -> bool {
        false
    }
}

/// combines an [`OverflowCounter`] and a [`FreeRunningCounter`] into one wide tick count
pub struct OverflowClock<'a, R> {
    overflows: &'a OverflowCounter,
    counter: R,
}

impl<'a, R: FreeRunningCounter> OverflowClock<'a, R> {
    const TICKS_PER_OVERFLOW: u32 = R::COUNTS_PER_OVERFLOW / R::COUNTS_PER_TICK;

    pub fn new(overflows: &'a OverflowCounter, counter: R) -> Self {
        Self { overflows, counter }
    }

    pub fn release(self) -> R {
        self.counter
    }
}

impl<R: FreeRunningCounter> TickSource for OverflowClock<'_, R> {
    fn now(&self) -> Tick {
        // count and pending flag are only consistent with `before` if no overflow
        // interrupt ran while they were read, retry until both overflow reads agree
        loop {
            let before = self.overflows.load();
            let count = self.counter.count();
            let pending = self.counter.overflow_pending();
            if self.overflows.load() != before {
                continue;
            }

            // wrapped while the interrupt was masked, the small count belongs to the
            // next period
            let overflows = if pending && count < R::COUNTS_PER_OVERFLOW / 2 {
                before.wrapping_add(1)
            } else {
                before
            };

            return Tick(
                overflows
                    .wrapping_mul(Self::TICKS_PER_OVERFLOW)
                    .wrapping_add(count / R::COUNTS_PER_TICK)
            );
        }
    }
}
