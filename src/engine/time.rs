use std::time::Instant;

const REPORT_INTERVAL: f32 = 1.0;

pub struct FrameTimer {
    last: Instant,
    pub dt: f32,
    pub frame: u64,
    report_accum: f32,
    report_frames: u32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            dt: 0.0,
            frame: 0,
            report_accum: 0.0,
            report_frames: 0,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.advance(now.duration_since(self.last).as_secs_f32());
        self.last = now;
    }

    fn advance(&mut self, dt: f32) {
        self.dt = dt;
        self.frame += 1;
        self.report_accum += dt;
        self.report_frames += 1;
    }

    /// Average frames per second over the last reporting interval, once per
    /// interval.
    pub fn take_fps_report(&mut self) -> Option<f32> {
        if self.report_accum < REPORT_INTERVAL {
            return None;
        }
        let fps = self.report_frames as f32 / self.report_accum;
        self.report_accum = 0.0;
        self.report_frames = 0;
        Some(fps)
    }
}
