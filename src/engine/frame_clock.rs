/// Frame timing for the engine's run loop
///
/// Counts ticks, keeps a rolling FPS average and, when a target rate is set,
/// sleeps away whatever is left of each frame's time budget.
use std::time::{Duration, Instant};

/// FPS tracking window (average over last N frames)
const FPS_WINDOW_SIZE: usize = 60;

/// Frame timing state
pub struct FrameClock {
    /// Time budget per frame, `None` runs uncapped
    target_frame_time: Option<Duration>,

    /// Start of the current frame
    frame_start: Instant,

    /// Time when the clock was created
    start_time: Instant,

    /// Frame timing history for FPS calculation
    frame_times: Vec<Duration>,

    /// Completed frames
    frame_count: u64,

    /// Current FPS (updated periodically)
    current_fps: f32,

    /// Duration of the last completed frame, including pacing
    last_frame_time: Duration,
}

impl FrameClock {
    /// Create a clock. A `target_fps` of `None` or zero disables pacing.
    pub fn new(target_fps: Option<u32>) -> Self {
        let now = Instant::now();
        Self {
            target_frame_time: target_fps
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / fps as f64)),
            frame_start: now,
            start_time: now,
            frame_times: Vec::with_capacity(FPS_WINDOW_SIZE),
            frame_count: 0,
            current_fps: 0.0,
            last_frame_time: Duration::ZERO,
        }
    }

    /// Mark the start of a frame
    pub fn begin_frame(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Finish the frame, sleeping if it came in under budget
    pub fn end_frame(&mut self) {
        if let Some(budget) = self.target_frame_time {
            let spent = self.frame_start.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }

        let frame_time = self.frame_start.elapsed();
        self.last_frame_time = frame_time;
        self.frame_count += 1;

        self.frame_times.push(frame_time);
        if self.frame_times.len() > FPS_WINDOW_SIZE {
            self.frame_times.remove(0);
        }

        // Update FPS counter every 10 frames
        if self.frame_count % 10 == 0 {
            self.update_fps();
        }
    }

    pub fn target_frame_time(&self) -> Option<Duration> {
        self.target_frame_time
    }

    /// Duration of the last completed frame in seconds
    pub fn delta_secs(&self) -> f32 {
        self.last_frame_time.as_secs_f32()
    }

    pub fn fps(&self) -> f32 {
        self.current_fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total elapsed time since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn update_fps(&mut self) {
        if self.frame_times.is_empty() {
            self.current_fps = 0.0;
            return;
        }

        let total: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total / self.frame_times.len() as u32;

        self.current_fps = if avg_frame_time.as_secs_f32() > 0.0 {
            1.0 / avg_frame_time.as_secs_f32()
        } else {
            0.0
        };
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(None)
    }
}
