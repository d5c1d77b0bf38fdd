/// Fixed timestep accumulator.
/// Turns variable frame times into a whole number of constant physics ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// Length of one physics tick in milliseconds.
    tick_ms: f32,
    /// Frame times above this are clamped before accumulation.
    max_frame_ms: f32,
    /// Time carried over from previous frames, always below one tick after `accumulate`.
    accumulator_ms: f32,
}

impl FixedTimestep {
    pub fn new(tick_ms: f32, max_frame_ms: f32) -> Self {
        Self {
            tick_ms,
            max_frame_ms,
            accumulator_ms: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed ticks to run.
    pub fn accumulate(&mut self, frame_ms: f32) -> u32 {
        let frame_ms = if frame_ms.is_finite() { frame_ms.max(0.0) } else { 0.0 };
        // Cap to prevent spiral of death after a stall
        let clamped = if frame_ms > self.max_frame_ms {
            log::debug!("Frame of {:.2} ms clamped to {:.2} ms", frame_ms, self.max_frame_ms);
            self.max_frame_ms
        } else {
            frame_ms
        };
        self.accumulator_ms += clamped;
        let steps = (self.accumulator_ms / self.tick_ms) as u32;
        self.accumulator_ms -= steps as f32 * self.tick_ms;
        // Guard against float drift leaving a tiny negative remainder
        if self.accumulator_ms < 0.0 {
            self.accumulator_ms = 0.0;
        }
        steps
    }

    /// Milliseconds waiting for the next tick.
    pub fn pending_ms(&self) -> f32 {
        self.accumulator_ms
    }

    /// The fixed tick in milliseconds.
    pub fn tick_ms(&self) -> f32 {
        self.tick_ms
    }

    /// The fixed tick in seconds.
    pub fn tick_seconds(&self) -> f32 {
        self.tick_ms / 1000.0
    }

    /// Drop any carried-over time.
    pub fn reset(&mut self) {
        self.accumulator_ms = 0.0;
    }
}
