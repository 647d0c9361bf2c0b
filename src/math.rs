use glam::Vec2;

/// Component-wise tolerance for "settled" position comparisons.
pub const FUZZY_EPSILON: f32 = 0.1;

/// Screen-space helpers on top of `glam::Vec2`.
pub trait Vec2Ext {
    /// Both components within [`FUZZY_EPSILON`] of `other`.
    fn fuzzy_eq(self, other: Vec2) -> bool;
}

impl Vec2Ext for Vec2 {
    fn fuzzy_eq(self, other: Vec2) -> bool {
        let d = (self - other).abs();
        d.x < FUZZY_EPSILON && d.y < FUZZY_EPSILON
    }
}

/// Vector of `length` pointing at `angle` radians.
pub fn from_polar(angle: f32, length: f32) -> Vec2 {
    Vec2::from_angle(angle) * length
}

/// Random offset strictly inside a circle of `radius`.
pub fn random_in_radius(rng: &mut fastrand::Rng, radius: f32) -> Vec2 {
    let angle = rng.f32() * std::f32::consts::TAU;
    let magnitude = rng.f32() * radius;
    from_polar(angle, magnitude)
}

/// Axis-aligned screen rectangle (top-left origin, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }
}
