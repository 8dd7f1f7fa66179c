/// Full speed: the throttle never engages.
pub const MAX_SPEED: u8 = 100;

/// How the line hook throttles execution at a given speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedPolicy {
    /// Lines to run before yielding; `None` never yields.
    pub lines_per_chunk: Option<u32>,
    /// Advisory wait before the host resumes after a yield.
    pub delay_ms: u64,
}

impl SpeedPolicy {
    /// Maps a speed in `0..=100` (clamped) to a policy. 100 never yields,
    /// 0 stops on every line, and in between slower means smaller chunks
    /// and longer delays: 1 gives 1 line/198 ms, 50 gives 11 lines/100 ms,
    /// 99 gives 20 lines/2 ms.
    pub fn for_speed(speed: u8) -> Self {
        match speed.min(MAX_SPEED) {
            MAX_SPEED => Self {
                lines_per_chunk: None,
                delay_ms: 0,
            },
            0 => Self {
                lines_per_chunk: Some(1),
                delay_ms: 0,
            },
            speed => Self {
                lines_per_chunk: Some(u32::from(speed) / 5 + 1),
                delay_ms: u64::from(MAX_SPEED - speed) * 2,
            },
        }
    }
}

impl Default for SpeedPolicy {
    fn default() -> Self {
        Self::for_speed(MAX_SPEED)
    }
}
