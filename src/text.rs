use glam::Vec2;

/// Font asset reference handed to the text layout service and the painter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub name: &'static str,
    /// Pixel height of one em.
    pub size: f32,
}

impl FontSpec {
    pub fn space_mono() -> Self {
        Self {
            name: "SpaceMono",
            size: 14.0,
        }
    }
}

/// Turns a string into the pixel extent it needs when painted.
pub trait TextLayout {
    fn measure(&self, text: &str, font: &FontSpec) -> Vec2;
}

/// Advance width of a monospace glyph, in ems.
const MONO_ADVANCE: f32 = 0.62;
/// Line height, in ems.
const MONO_LINE_HEIGHT: f32 = 1.3;

/// Metrics-only layout for monospace fonts: every glyph has the same advance.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoLayout;

impl TextLayout for MonoLayout {
    fn measure(&self, text: &str, font: &FontSpec) -> Vec2 {
        let lines = text.lines().count().max(1);
        let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        Vec2::new(
            (widest as f32 * font.size * MONO_ADVANCE).ceil(),
            (lines as f32 * font.size * MONO_LINE_HEIGHT).ceil(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_follows_longest_line() {
        let font = FontSpec { name: "test", size: 10.0 };
        let one = MonoLayout.measure("HELLO", &font);
        assert_eq!(one, Vec2::new(31.0, 13.0));

        let two = MonoLayout.measure("HI\nINTERLOPER", &font);
        assert_eq!(two, Vec2::new(62.0, 26.0));
    }

    #[test]
    fn empty_text_still_has_a_line() {
        let size = MonoLayout.measure("", &FontSpec::space_mono());
        assert_eq!(size.x, 0.0);
        assert!(size.y > 0.0);
    }
}
