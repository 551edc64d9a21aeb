/// Longest step a single frame may advance the scene, in seconds.
pub const MAX_FRAME_DT: f32 = 0.1;

/// Turns playback position and wall time into a per-frame step.
///
/// While the soundtrack plays its position is authoritative, including frames
/// where the element has not refreshed it yet: those advance by 0 and the next
/// refresh covers the whole interval. Paused or silent playback falls back to
/// the wall clock.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last_wall: Option<f64>,
    last_playback: Option<f64>,
    max_dt: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_DT)
    }
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            last_wall: None,
            last_playback: None,
            max_dt: max_dt.max(0.0),
        }
    }

    /// Seconds to advance this frame, in `[0, max_dt]`.
    ///
    /// `playback` is the audio position, `playing` whether it is running.
    pub fn tick(&mut self, wall_now: f64, playback: Option<f64>, playing: bool) -> f32 {
        let wall_dt = self.last_wall.map(|prev| wall_now - prev);
        let playback_dt = match (self.last_playback, playback) {
            (Some(prev), Some(now)) => Some(now - prev),
            _ => None,
        };
        self.last_wall = Some(wall_now);
        self.last_playback = playback;

        let dt = match (playing, playback_dt) {
            // backward seek
            (_, Some(d)) if d < 0.0 => 0.0,
            (true, Some(d)) => d,
            _ => wall_dt.unwrap_or(0.0),
        };
        if dt.is_finite() {
            (dt as f32).clamp(0.0, self.max_dt)
        } else {
            0.0
        }
    }

    /// Forget the baseline so the next tick returns 0 (after a resume).
    pub fn reset(&mut self) {
        self.last_wall = None;
        self.last_playback = None;
    }
}
