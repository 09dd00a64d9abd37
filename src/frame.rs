use std::time::Instant;

/// Longest delta handed to tasks; larger gaps (occluded window, debugger) are clamped
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    pub time: f32,
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Turns redraw instants into frame information, one item per redraw
pub struct FrameClock {
    frame_number: u64,
    last_frame_time: Instant,
    time: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            frame_number: 0,
            last_frame_time: start,
            time: 0.0,
        }
    }

    /// Accumulated animation time (sum of clamped deltas)
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Produce the frame for a redraw observed at `now`
    pub fn tick_at(&mut self, now: Instant) -> FrameInfo {
        let delta = now
            .saturating_duration_since(self.last_frame_time)
            .as_secs_f32()
            .min(MAX_FRAME_DELTA);
        self.time += delta;

        let info = FrameInfo::new(self.frame_number, self.time, delta);

        self.frame_number += 1;
        self.last_frame_time = now;

        info
    }

    /// Forget the time spent paused so the next delta starts from `now`
    pub fn resume_at(&mut self, now: Instant) {
        self.last_frame_time = now;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clock_measures_delta() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        let frame = clock.tick_at(start + Duration::from_millis(16));
        assert_eq!(frame.number, 0);
        assert!((frame.delta - 0.016).abs() < 1e-4);

        let frame = clock.tick_at(start + Duration::from_millis(48));
        assert_eq!(frame.number, 1);
        assert!((frame.delta - 0.032).abs() < 1e-4);
        assert!((frame.time - 0.048).abs() < 1e-4);
    }

    #[test]
    fn clock_clamps_long_pauses() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        let frame = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(frame.delta, MAX_FRAME_DELTA);
        assert_eq!(clock.time(), MAX_FRAME_DELTA);
    }

    #[test]
    fn clock_resume_discards_paused_time() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        clock.tick_at(start + Duration::from_millis(10));

        clock.resume_at(start + Duration::from_secs(3));
        let frame = clock.tick_at(start + Duration::from_secs(3) + Duration::from_millis(20));
        assert!((frame.delta - 0.020).abs() < 1e-4);
    }
}
