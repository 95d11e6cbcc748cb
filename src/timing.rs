use std::time::{Duration, Instant};

use spin_sleep::SpinSleeper;

/// Paces the host loop in frames. Each frame runs a batch of instructions
/// and one timer tick, so instruction and timer rates stay independent.
pub struct Timing {
    pub tickrate: u64,
    pub framerate: u64,
    next_frame: Instant,
    sleeper: SpinSleeper,
}

impl Timing {
    pub fn new(tickrate: u64, framerate: u64) -> Self {
        let mut timing = Self {
            tickrate,
            framerate,
            next_frame: Instant::now(),
            sleeper: SpinSleeper::default(),
        };
        let frame = timing.frame_duration();
        timing.next_frame += frame;
        timing
    }

    /// Instructions to run in one frame. Rates that do not divide evenly
    /// are spread over frames by the caller through `frame_index`.
    pub fn steps_in_frame(&self, frame_index: u64) -> u64 {
        let framerate = self.framerate.max(1);
        let done = self.tickrate * frame_index / framerate;
        let target = self.tickrate * (frame_index + 1) / framerate;
        target - done
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.framerate.max(1))
    }

    /// Sleeps until the next frame is due and schedules the one after.
    pub fn wait_for_frame(&mut self) {
        let now = Instant::now();
        if self.next_frame > now {
            // accounts for platform dependent sleep resolution
            self.sleeper.sleep(self.next_frame - now);
            let frame = self.frame_duration();
            self.next_frame += frame;
        } else {
            // Running behind, don't try to catch up with a burst of frames
            self.next_frame = now + self.frame_duration();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Timing;
    use std::time::{Duration, Instant};

    #[test]
    fn steps_in_frame_test() {
        let timing = Timing::new(600, 60);
        assert!((0..60).all(|frame| timing.steps_in_frame(frame) == 10));

        // 250 / 60 alternates between 4 and 5 but adds up over a second
        let timing = Timing::new(250, 60);
        let total: u64 = (0..60).map(|frame| timing.steps_in_frame(frame)).sum();
        assert_eq!(total, 250);
        assert!((0..60).all(|frame| (4..=5).contains(&timing.steps_in_frame(frame))));
    }

    #[test]
    fn frame_duration_test() {
        let timing = Timing::new(500, 50);
        assert_eq!(timing.frame_duration(), Duration::from_millis(20));
    }

    #[test]
    fn wait_for_frame_test() {
        let mut timing = Timing::new(500, 200);
        let start = Instant::now();
        timing.wait_for_frame();
        timing.wait_for_frame();
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
