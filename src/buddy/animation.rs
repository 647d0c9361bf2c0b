use crate::error::BuddyError;

/// Time-driven frame selector over a fixed, looping frame list.
#[derive(Debug, Clone)]
pub struct AnimationClock<F> {
    frames: Vec<F>,
    fps: f32,
    elapsed: f64,
}

impl<F> AnimationClock<F> {
    /// Fails on an empty frame list or a non-positive frame rate, so
    /// `current_index` never divides by zero.
    pub fn new(frames: Vec<F>, fps: f32) -> Result<Self, BuddyError> {
        if frames.is_empty() {
            return Err(BuddyError::Asset("animation has no frames".into()));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(BuddyError::Asset(format!("invalid animation frame rate {fps}")));
        }
        Ok(Self {
            frames,
            fps,
            elapsed: 0.0,
        })
    }

    pub fn advance(&mut self, dt: f64) {
        self.elapsed += dt;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Seconds until the animation loops.
    pub fn period(&self) -> f64 {
        self.frames.len() as f64 / self.fps as f64
    }

    pub fn current_index(&self) -> usize {
        let tick = (self.elapsed * self.fps as f64).floor() as i64;
        tick.rem_euclid(self.frames.len() as i64) as usize
    }

    pub fn current(&self) -> &F {
        &self.frames[self.current_index()]
    }
}
