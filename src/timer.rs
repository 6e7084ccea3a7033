//! Tick source and blocking delays
//!
//! The host core never owns a timer interrupt. It only reads a monotonic
//! tick counter and asks for blocking millisecond delays; the surrounding
//! firmware supplies both through [`Timer`].

/// Monotonic tick source with a blocking delay
pub trait Timer: Sync {
    /// Current tick count. Wraps around on overflow.
    fn ticks(&self) -> u32;

    /// Tick frequency in Hz
    fn tick_rate_hz(&self) -> u32 {
        1_000
    }

    /// Block the calling context for at least `ms` milliseconds
    fn ms_delay(&self, ms: u32);

    /// Convert a millisecond interval to ticks of this timer
    fn ms_to_ticks(&self, ms: u32) -> u32 {
        ms_to_ticks(ms, self.tick_rate_hz())
    }

    /// Ticks elapsed since `since`, tolerant of counter wrap
    fn ticks_since(&self, since: u32) -> u32 {
        self.ticks().wrapping_sub(since)
    }
}

/// Convert milliseconds to ticks at `tick_rate_hz`, rounding down
pub const fn ms_to_ticks(ms: u32, tick_rate_hz: u32) -> u32 {
    ((ms as u64 * tick_rate_hz as u64) / 1_000) as u32
}

/// SysTick driven timer for Cortex-M targets
///
/// Call [`SysTickTimer::on_tick`] from the SysTick exception handler,
/// configured to fire at `tick_rate_hz`.
///
/// ```ignore
/// static TIMER: SysTickTimer = SysTickTimer::new(600_000_000, 1_000);
///
/// #[exception]
/// fn SysTick() {
///     TIMER.on_tick();
/// }
/// ```
#[cfg(feature = "cortex-m")]
pub struct SysTickTimer {
    ticks: core::sync::atomic::AtomicU32,
    cpu_hz: u32,
    tick_rate_hz: u32,
}

#[cfg(feature = "cortex-m")]
impl SysTickTimer {
    /// Create a timer for a core clocked at `cpu_hz`
    pub const fn new(cpu_hz: u32, tick_rate_hz: u32) -> Self {
        Self {
            ticks: core::sync::atomic::AtomicU32::new(0),
            cpu_hz,
            tick_rate_hz,
        }
    }

    /// Advance the tick counter. Safe to call from interrupt context.
    #[inline(always)]
    pub fn on_tick(&self) {
        self.ticks
            .fetch_add(1, core::sync::atomic::Ordering::Relaxed);
    }
}

#[cfg(feature = "cortex-m")]
impl Timer for SysTickTimer {
    fn ticks(&self) -> u32 {
        self.ticks.load(core::sync::atomic::Ordering::Relaxed)
    }

    fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    fn ms_delay(&self, ms: u32) {
        // One millisecond at a time keeps the cycle count inside u32
        let cycles_per_ms = self.cpu_hz / 1_000;
        for _ in 0..ms {
            cortex_m::asm::delay(cycles_per_ms);
        }
    }
}
