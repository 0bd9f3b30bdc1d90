//! # Frame Loop
//!
//! One [`FrameLoop::tick`] per redraw advances the scene: shadows are marked
//! stale, held keys move the camera, the spinner turns, the orbit damping is
//! applied and the camera uniform is rebuilt for the render call.
//!
//! The loop also keeps a short history of frame intervals for the FPS
//! readout in the UI.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::gfx::backend::SceneBackend;
use crate::gfx::camera::CameraUniform;
use crate::interaction::movement::{apply_camera_movement, MovementOutcome};
use crate::scene::SceneContext;

const MAX_FRAME_SAMPLES: usize = 120;

/// What a single tick did
#[derive(Debug, Clone, Copy)]
pub struct FrameTick {
    pub movement: MovementOutcome,
    pub orbited: bool,
    pub camera_uniform: CameraUniform,
}

pub struct FrameLoop {
    started: Instant,
    last_tick: Option<Instant>,
    frame_times: VecDeque<Duration>,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(started: Instant) -> Self {
        Self {
            started,
            last_tick: None,
            frame_times: VecDeque::with_capacity(MAX_FRAME_SAMPLES),
            frames: 0,
        }
    }

    /// Advances the scene using wall-clock time
    pub fn tick<B: SceneBackend + ?Sized>(&mut self, ctx: &mut SceneContext, backend: &mut B) -> FrameTick {
        self.tick_at(ctx, backend, Instant::now())
    }

    /// Advances the scene as of `now`
    pub fn tick_at<B: SceneBackend + ?Sized>(
        &mut self,
        ctx: &mut SceneContext,
        backend: &mut B,
        now: Instant,
    ) -> FrameTick {
        self.record_frame(now);

        backend.mark_shadows_stale();

        let movement = apply_camera_movement(&mut ctx.camera, &ctx.input, &ctx.config.camera);

        let elapsed = now.saturating_duration_since(self.started);
        ctx.props.spin(elapsed.as_secs_f32(), backend);

        let orbited = ctx.orbit.update(&mut ctx.camera);
        ctx.camera.update_view_proj();

        FrameTick {
            movement,
            orbited,
            camera_uniform: ctx.camera.uniform,
        }
    }

    fn record_frame(&mut self, now: Instant) {
        if let Some(last) = self.last_tick {
            if self.frame_times.len() >= MAX_FRAME_SAMPLES {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back(now.saturating_duration_since(last));
        }
        self.last_tick = Some(now);
        self.frames += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Average frame time over the recent history, in milliseconds
    pub fn average_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let total: Duration = self.frame_times.iter().sum();
        total.as_secs_f32() * 1000.0 / self.frame_times.len() as f32
    }

    pub fn fps(&self) -> f32 {
        let frame_time_ms = self.average_frame_time_ms();
        if frame_time_ms > 0.0 {
            1000.0 / frame_time_ms
        } else {
            0.0
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}
