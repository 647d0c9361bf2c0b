pub mod animation;
pub mod dialog;
pub mod skin;

use std::sync::Arc;

use glam::Vec2;

use self::animation::AnimationClock;
use self::dialog::{DialogKind, Speech};
use self::skin::{Skin, SpriteFrame};
use crate::ease;
use crate::error::BuddyError;
use crate::math::{self, Vec2Ext};
use crate::window::{
    Content, CursorStyle, Effect, InputEvent, PointerButton, WindowBackend, WindowDesc, WindowKey,
    WindowRole,
};

/// Seconds the companion stays put after being let go.
pub const STAY_STILL_AFTER_HELD: f32 = 1.0;
/// Seconds between idle wander hops.
pub const WANDER_TIME: f32 = 4.0;
/// Max distance of a wander hop from the anchor.
pub const WANDER_RADIUS: f32 = 40.0;
pub const WANDER_DURATION: f64 = 4.0;
/// Per-axis cursor distance beyond which a speaking companion follows.
pub const FOLLOW_DIST: f32 = 120.0;
pub const FOLLOW_DURATION: f64 = 1.0;
/// Drag distance separating a "moved" reaction from a "touched" one.
pub const MOVED_THRESHOLD: f32 = 50.0;
/// Window edge relative to the configured sprite size.
pub const WINDOW_SCALE: f32 = 1.3;

const IDLE_CHATTER_MIN: f32 = 45.0;
const IDLE_CHATTER_MAX: f32 = 120.0;

/// Derived movement mode; recomputed every tick, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Wander,
    Follow,
}

/// In-flight eased move between two window positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Vec2,
    pub to: Vec2,
    pub elapsed: f64,
    pub duration: f64,
}

impl Transition {
    pub fn in_flight(&self) -> bool {
        self.duration != 0.0 && self.elapsed <= self.duration
    }

    pub fn position(&self) -> Vec2 {
        let progress = (self.elapsed / self.duration).min(1.0) as f32;
        let a = ease::in_out_sine(progress);
        self.from * (1.0 - a) + self.to * a
    }
}

/// Held pointer: cursor offset inside the window at press time.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Grab {
    offset: Vec2,
}

/// One tick's worth of observations about the companion's window.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    pub dt: f32,
    /// Actual top-left corner of the window right now.
    pub window_pos: Vec2,
    /// Cursor relative to the window's top-left corner.
    pub cursor: Vec2,
    pub events: &'a [InputEvent],
}

/// Behavior engine of one companion window.
pub struct Companion {
    skin: Arc<Skin>,
    sprite_size: f32,
    animation: AnimationClock<SpriteFrame>,

    /// Last intentional resting point; wander hops are offsets from here.
    anchor: Vec2,
    transition: Option<Transition>,

    grab: Option<Grab>,
    /// Window position when the current drag gesture began.
    drag_start: Vec2,
    settle_timer: f32,
    pending_settle_check: bool,

    wander_timer: f32,
    idle_chatter_timer: f32,
    speech: Speech,
}

impl Companion {
    /// Stationary at `anchor` with a pre-spoken chatter group, so nothing is
    /// said until something happens.
    pub fn new(
        skin: Arc<Skin>,
        sprite_size: f32,
        anchor: Vec2,
        rng: &mut fastrand::Rng,
    ) -> Result<Self, BuddyError> {
        let animation = AnimationClock::new(skin.frames.clone(), skin.fps)?;
        let preloaded = skin
            .dialogue
            .pick(DialogKind::Chatter, rng)
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        Ok(Self {
            sprite_size,
            animation,
            anchor,
            transition: None,
            grab: None,
            drag_start: anchor,
            settle_timer: 0.0,
            pending_settle_check: false,
            wander_timer: WANDER_TIME,
            idle_chatter_timer: idle_chatter_delay(rng),
            speech: Speech::finished(preloaded),
            skin,
        })
    }

    /// Open the companion's window at a random spot on the primary display.
    pub fn spawn<B: WindowBackend + ?Sized>(
        skin: Arc<Skin>,
        sprite_size: u32,
        backend: &mut B,
        rng: &mut fastrand::Rng,
    ) -> Result<(WindowKey, Self), BuddyError> {
        let edge = window_edge(sprite_size);
        let desc = WindowDesc {
            title: format!("??_{}__??", skin.name.to_ascii_uppercase()),
            size: Vec2::splat(edge),
            role: WindowRole::Companion,
            click_through: false,
        };
        let key = backend.create_window(&desc)?;

        let monitor = backend.primary_monitor();
        let pos = (monitor.min + monitor.size * Vec2::new(rng.f32(), rng.f32())).floor();
        backend.set_position(key, pos);

        let companion = match Self::new(skin, sprite_size as f32, pos, rng) {
            Ok(c) => c,
            Err(e) => {
                backend.close(key);
                return Err(e);
            }
        };
        log::info!(
            "Spawned {} at ({:.0}, {:.0}), window {}px, {} frames looping every {:.1}s",
            companion.skin.name,
            pos.x,
            pos.y,
            edge,
            companion.animation.len(),
            companion.animation.period()
        );
        Ok((key, companion))
    }

    pub fn skin(&self) -> &Skin {
        &self.skin
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    #[cfg(test)]
    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    #[cfg(test)]
    pub fn is_moving(&self) -> bool {
        self.transition.is_some_and(|t| t.in_flight())
    }

    pub fn speaking(&self) -> bool {
        self.speech.speaking()
    }

    #[cfg(test)]
    pub fn speech(&self) -> &Speech {
        &self.speech
    }

    pub fn behavior(&self) -> Behavior {
        if self.speaking() {
            Behavior::Follow
        } else {
            Behavior::Wander
        }
    }

    pub fn content(&self) -> Content<'_> {
        Content::Sprite {
            frame: self.animation.current(),
            look: &self.skin.look,
            sprite_size: self.sprite_size,
            time: self.animation.elapsed() as f32,
        }
    }

    /// Advance the state machine by one frame.
    pub fn update(
        &mut self,
        input: &TickInput<'_>,
        rng: &mut fastrand::Rng,
        effects: &mut Vec<Effect>,
    ) {
        self.animation.advance(input.dt as f64);

        for event in input.events {
            self.handle_input(*event, input, rng, effects);
        }

        self.update_position(input, rng, effects);

        if let Some(text) = self.speech.tick(input.dt) {
            log::debug!("{} says {text:?}", self.skin.name);
            effects.push(Effect::Say {
                text,
                font: self.skin.font,
            });
            self.voice(rng, effects);
        }
    }

    /// Start an eased move from `current` to `destination`. Unless
    /// `set_anchor` is false, the destination becomes the new anchor.
    pub fn goto(
        &mut self,
        current: Vec2,
        destination: Vec2,
        duration: f64,
        set_anchor: bool,
        effects: &mut Vec<Effect>,
    ) {
        if set_anchor {
            self.anchor = destination;
        }
        if duration <= 0.0 {
            self.transition = None;
            effects.push(Effect::MoveTo(destination));
            return;
        }
        self.transition = Some(Transition {
            from: current,
            to: destination,
            elapsed: 0.0,
            duration,
        });
    }

    /// Queue a random group of `kind` as the active speech.
    pub fn say_group(&mut self, kind: DialogKind, rng: &mut fastrand::Rng) {
        let Some(lines) = self.skin.dialogue.pick(kind, rng) else {
            return;
        };
        log::info!("{} starts {kind:?} dialogue ({} lines)", self.skin.name, lines.len());
        self.speech.start(lines.to_vec());
    }

    fn handle_input(
        &mut self,
        event: InputEvent,
        input: &TickInput<'_>,
        rng: &mut fastrand::Rng,
        effects: &mut Vec<Effect>,
    ) {
        match event {
            InputEvent::Press(PointerButton::Left) => {
                self.voice(rng, effects);
                self.transition = None;
                self.grab = Some(Grab {
                    offset: input.cursor,
                });
                if self.settle_timer <= 0.0 {
                    self.drag_start = input.window_pos;
                    log::info!(
                        "Began holding at ({:.0}, {:.0})",
                        self.drag_start.x,
                        self.drag_start.y
                    );
                }
                self.settle_timer = STAY_STILL_AFTER_HELD;
                effects.push(Effect::Cursor(CursorStyle::Move));
            }
            InputEvent::Release(PointerButton::Left) => {
                if self.grab.take().is_some() {
                    effects.push(Effect::Cursor(CursorStyle::Arrow));
                }
            }
            InputEvent::Escape => effects.push(Effect::Close),
            _ => {}
        }
    }

    fn update_position(
        &mut self,
        input: &TickInput<'_>,
        rng: &mut fastrand::Rng,
        effects: &mut Vec<Effect>,
    ) {
        if let Some(grab) = self.grab {
            self.anchor = input.window_pos - grab.offset + input.cursor;
            effects.push(Effect::MoveTo(self.anchor));
            return;
        }

        self.settle_timer = (self.settle_timer - input.dt).max(0.0);
        if self.settle_timer > 0.0 {
            self.pending_settle_check = true;
            return;
        }

        self.update_movement(input, rng, effects);

        if std::mem::take(&mut self.pending_settle_check) && !self.speaking() {
            let kind = if self.anchor.distance(self.drag_start) > MOVED_THRESHOLD {
                DialogKind::Moved
            } else {
                DialogKind::Touched
            };
            self.say_group(kind, rng);
        }

        if !self.speaking() {
            self.idle_chatter_timer -= input.dt;
            if self.idle_chatter_timer <= 0.0 {
                self.idle_chatter_timer = idle_chatter_delay(rng);
                self.say_group(DialogKind::Chatter, rng);
            }
        }
    }

    fn update_movement(
        &mut self,
        input: &TickInput<'_>,
        rng: &mut fastrand::Rng,
        effects: &mut Vec<Effect>,
    ) {
        match self.transition.as_mut() {
            Some(t) if t.in_flight() => {
                t.elapsed += input.dt as f64;
                effects.push(Effect::MoveTo(t.position()));
                self.wander_timer = WANDER_TIME;
                return;
            }
            Some(t) => {
                // Land on the destination if the window was held back on the way.
                if !input.window_pos.fuzzy_eq(t.to) {
                    effects.push(Effect::MoveTo(t.to));
                }
                self.transition = None;
            }
            None => {}
        }

        match self.behavior() {
            Behavior::Wander => {
                self.wander_timer -= input.dt;
                if self.wander_timer <= 0.0 {
                    let target = self.anchor + math::random_in_radius(rng, WANDER_RADIUS);
                    self.goto(input.window_pos, target, WANDER_DURATION, false, effects);
                }
            }
            Behavior::Follow => {
                let c = input.cursor;
                let mut target = input.window_pos;
                let mut pulled = false;
                if c.x.abs() > FOLLOW_DIST {
                    target.x += c.x - FOLLOW_DIST * c.x.signum();
                    pulled = true;
                }
                if c.y.abs() > FOLLOW_DIST {
                    target.y += c.y - FOLLOW_DIST * c.y.signum();
                    pulled = true;
                }
                if pulled {
                    self.goto(input.window_pos, target, FOLLOW_DURATION, true, effects);
                }
            }
        }
    }

    fn voice(&self, rng: &mut fastrand::Rng, effects: &mut Vec<Effect>) {
        if let Some(cue) = self.skin.voice_cue(rng) {
            effects.push(Effect::Voice(cue.to_string()));
        }
    }
}

/// Window edge length for a sprite of `sprite_size` pixels.
pub fn window_edge(sprite_size: u32) -> f32 {
    (sprite_size as f32 * WINDOW_SCALE).floor()
}

fn idle_chatter_delay(rng: &mut fastrand::Rng) -> f32 {
    IDLE_CHATTER_MIN + rng.f32() * (IDLE_CHATTER_MAX - IDLE_CHATTER_MIN)
}
