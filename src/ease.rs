//! Easing curve for window transitions. Input is normalized progress,
//! nominally in [0, 1]; values outside that range are not clamped.

use std::f32::consts::PI;

pub fn in_out_sine(t: f32) -> f32 {
    0.5 - 0.5 * (t * PI).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        assert!(in_out_sine(0.0).abs() < 1e-6);
        assert!((in_out_sine(1.0) - 1.0).abs() < 1e-6);
        assert!((in_out_sine(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn in_out_sine_is_monotonic() {
        let mut prev = in_out_sine(0.0);
        for i in 1..=1000 {
            let v = in_out_sine(i as f32 / 1000.0);
            assert!(v >= prev, "dropped at step {i}: {v} < {prev}");
            prev = v;
        }
    }
}
