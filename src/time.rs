use std::time::{Duration, Instant};

use bevy_ecs::{schedule::ShouldRun, system::ResMut};

/// Frame limiter: lets the frame stage run once `frame_dt` of real time has
/// passed and hands that time to the update stage.
pub fn frame_criteria(mut time: ResMut<TimeResource>) -> ShouldRun {
    let elapsed = time.last_frame.elapsed();
    if time.register_frame(elapsed) {
        time.last_frame = Instant::now();
        ShouldRun::Yes
    } else {
        ShouldRun::No
    }
}

/// Runs the update stage once per whole `update_dt` of unsimulated time.
pub fn update_criteria(mut time: ResMut<TimeResource>) -> ShouldRun {
    if time.consume_step() {
        ShouldRun::YesAndCheckAgain
    } else {
        ShouldRun::No
    }
}

#[derive(Clone, Debug)]
pub struct TimeResource {
    // target delta time
    pub update_dt: Duration,
    pub frame_dt: Duration, // actual dt will be variable

    pub ingame_time: Duration,

    pub last_frame: Instant,
    pub unsimulated_time: Duration, // real time passed that hasn't been simulated yet
}

impl TimeResource {
    pub fn new(update_dt: Duration, frame_dt: Duration) -> Self {
        Self {
            update_dt,
            frame_dt,

            ingame_time: Duration::default(),
            last_frame: Instant::now(),
            unsimulated_time: Duration::default(),
        }
    }

    /// Accrues `elapsed` if a frame is due. Returns whether it was.
    pub fn register_frame(&mut self, elapsed: Duration) -> bool {
        if elapsed >= self.frame_dt {
            self.unsimulated_time += elapsed;
            true
        } else {
            false
        }
    }

    /// Moves one `update_dt` from unsimulated to in-game time if available.
    pub fn consume_step(&mut self) -> bool {
        let dt = self.update_dt;
        if self.unsimulated_time >= dt {
            self.unsimulated_time -= dt;
            self.ingame_time += dt;
            true
        } else {
            false
        }
    }
}
