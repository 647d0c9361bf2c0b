use std::f32::consts::TAU;

use super::dialog::Dialogue;
use crate::error::BuddyError;
use crate::text::FontSpec;

/// One pose of the procedural companion sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteFrame {
    /// Vertical offset of the body in pixels (positive = down).
    pub bob: f32,
    /// Horizontal stretch / vertical squash, roughly -0.1..0.1.
    pub squash: f32,
    /// 1.0 = eyes open, 0.0 = closed.
    pub eyes_open: f32,
}

/// Colors and silhouette of a skin, linear RGBA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Look {
    pub body: [f32; 4],
    pub accent: [f32; 4],
    pub ears: bool,
}

/// Everything that makes one companion type different from another.
/// The behavior engine is the same for all of them.
#[derive(Debug, Clone)]
pub struct Skin {
    pub name: &'static str,
    pub frames: Vec<SpriteFrame>,
    pub fps: f32,
    pub look: Look,
    pub dialogue: Dialogue,
    pub voice_cues: Vec<String>,
    pub font: FontSpec,
}

const FRAME_COUNT: usize = 40;
const FRAME_RATE: f32 = 10.0;
const TALK_SOUNDS: usize = 8;

const CHATTER: &[&[&str]] = &[
    &["HELLO AGAIN"],
    &["HI INTERLOPER"],
    &["HELLO!", "IS THE AUTH LAYER STILL DISSOCIATED?", "I MISS THEM"],
    &["INTERLOPER!", "WELCOME", "BUT ALSO DO NOT BOTHER ME", "VERY BUSY"],
];
const TOUCHED: &[&[&str]] = &[&["HI INTERLOPER!"], &["HELLO!"], &["HI!"]];
const MOVED: &[&[&str]] = &[&["OK I'LL BE HERE"]];

pub const BUILTIN_SKINS: &[&str] = &["funfriend", "catfriend"];

/// A breathing loop with a blink near the end.
fn breathing_frames(bob_amplitude: f32) -> Vec<SpriteFrame> {
    (0..FRAME_COUNT)
        .map(|i| {
            let phase = i as f32 / FRAME_COUNT as f32 * TAU;
            SpriteFrame {
                bob: phase.sin() * bob_amplitude,
                squash: (phase * 2.0).cos() * 0.04,
                eyes_open: if (36..38).contains(&i) { 0.1 } else { 1.0 },
            }
        })
        .collect()
}

fn talk_sounds() -> Vec<String> {
    (1..=TALK_SOUNDS).map(|i| format!("sfx/talk{i}.ogg")).collect()
}

impl Skin {
    pub fn funfriend() -> Self {
        Self {
            name: "funfriend",
            frames: breathing_frames(3.0),
            fps: FRAME_RATE,
            look: Look {
                body: [0.95, 0.93, 0.88, 1.0],
                accent: [0.08, 0.08, 0.1, 1.0],
                ears: false,
            },
            dialogue: Dialogue::new(CHATTER, MOVED, TOUCHED),
            voice_cues: talk_sounds(),
            font: FontSpec::space_mono(),
        }
    }

    pub fn catfriend() -> Self {
        Self {
            name: "catfriend",
            frames: breathing_frames(2.0),
            look: Look {
                body: [1.0, 0.65, 0.2, 1.0],
                accent: [0.1, 0.06, 0.02, 1.0],
                ears: true,
            },
            ..Self::funfriend()
        }
    }

    pub fn by_name(name: &str) -> Result<Self, BuddyError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "funfriend" => Ok(Self::funfriend()),
            "catfriend" => Ok(Self::catfriend()),
            _ => Err(BuddyError::UnknownSkin(name.to_string())),
        }
    }

    pub fn voice_cue(&self, rng: &mut fastrand::Rng) -> Option<&str> {
        if self.voice_cues.is_empty() {
            return None;
        }
        Some(&self.voice_cues[rng.usize(0..self.voice_cues.len())])
    }
}
