use std::time::{Duration, Instant};

/// Longest step a measured clock reports; a stalled window resumes smoothly.
const MAX_STEP: Duration = Duration::from_millis(250);

/// Timing for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Sum of every `dt` reported so far.
    pub elapsed: f64,
    pub frame_index: u64,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Measured { last: Instant, max: Duration },
    Fixed(f32),
}

/// Produces one `FrameTime` per presented frame.
///
/// `FrameClock::fixed` never reads the wall clock, so a sequence of ticks
/// is the same on every run.
#[derive(Debug, Clone)]
pub struct FrameClock {
    step: Step,
    elapsed: f64,
    frames: u64,
}

impl FrameClock {
    pub fn measured() -> Self {
        Self::measured_with_cap(MAX_STEP)
    }

    pub fn measured_with_cap(max: Duration) -> Self {
        Self {
            step: Step::Measured {
                last: Instant::now(),
                max,
            },
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Every tick reports `dt` seconds. Negative values become 0.
    pub fn fixed(dt: f32) -> Self {
        Self {
            step: Step::Fixed(dt.max(0.0)),
            elapsed: 0.0,
            frames: 0,
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        let dt = match &mut self.step {
            Step::Measured { last, max } => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(*last).min(*max);
                *last = now;
                dt.as_secs_f32()
            }
            Step::Fixed(dt) => *dt,
        };

        self.elapsed += f64::from(dt);
        let time = FrameTime {
            dt,
            elapsed: self.elapsed,
            frame_index: self.frames,
        };
        self.frames += 1;
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::measured()
    }
}
