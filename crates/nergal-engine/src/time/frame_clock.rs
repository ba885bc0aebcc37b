use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Scaled, clamped seconds since the previous tick. Feed this to simulation.
    pub dt: f32,

    /// Clamped seconds since the previous tick, ignoring the time scale.
    pub real_dt: f32,

    /// Scaled seconds accumulated since the clock was created.
    pub elapsed: f64,

    pub frame_index: u64,
}

/// Produces [`FrameTime`] snapshots with clamped deltas.
///
/// Deltas are clamped to `[dt_min, dt_max]` (0.1 ms and 250 ms by default) so
/// a debugger pause or a minimised window does not blow up the simulation.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    time_scale: f32,
    elapsed: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
            time_scale: 1.0,
            elapsed: 0.0,
        }
    }

    /// Multiplier applied to `dt`. Negative values are treated as zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Resets the baseline, e.g. after the window was suspended.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Samples the wall clock and advances by the time since the last tick.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let raw = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance(raw)
    }

    /// Advances by an explicit duration without touching the wall clock.
    pub fn advance(&mut self, raw: Duration) -> FrameTime {
        let real_dt = raw.clamp(self.dt_min, self.dt_max).as_secs_f32();
        let dt = real_dt * self.time_scale;
        self.elapsed += dt as f64;

        let ft = FrameTime {
            dt,
            real_dt,
            elapsed: self.elapsed,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
