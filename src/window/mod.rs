pub mod native;
pub mod registry;

#[cfg(test)]
pub mod fake;

use glam::Vec2;

use crate::buddy::skin::{Look, SpriteFrame};
use crate::error::BuddyError;
use crate::math::Rect;
use crate::text::FontSpec;

/// Opaque handle to one backend window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowKey(pub u64);

/// What a window is for; decides how the backend paints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRole {
    Companion,
    Chatter,
}

/// Creation parameters. Every window is borderless, transparent and
/// always on top.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDesc {
    pub title: String,
    pub size: Vec2,
    pub role: WindowRole,
    /// Let pointer input fall through to whatever is underneath.
    pub click_through: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Input delivered to a window since its last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Press(PointerButton),
    Release(PointerButton),
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Arrow,
    Move,
}

/// Requests a window makes of the frame loop during its update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Move this window's top-left corner.
    MoveTo(Vec2),
    /// Open a chatter bubble above this window.
    Say { text: String, font: FontSpec },
    Voice(String),
    Cursor(CursorStyle),
    Close,
}

/// What to paint into a window this frame.
#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    Sprite {
        frame: &'a SpriteFrame,
        look: &'a Look,
        sprite_size: f32,
        time: f32,
    },
    Text {
        text: &'a str,
        font: &'a FontSpec,
    },
}

/// The windowing services the frame loop consumes. Positions are screen
/// pixels of the window's top-left corner; queries on a closed or unknown
/// window return `None`.
pub trait WindowBackend {
    fn create_window(&mut self, desc: &WindowDesc) -> Result<WindowKey, BuddyError>;

    /// Destroy the native window. Closing twice is a no-op.
    fn close(&mut self, key: WindowKey);

    fn position(&self, key: WindowKey) -> Option<Vec2>;

    fn set_position(&mut self, key: WindowKey, pos: Vec2);

    fn size(&self, key: WindowKey) -> Option<Vec2>;

    fn rect(&self, key: WindowKey) -> Option<Rect> {
        Some(Rect::new(self.position(key)?, self.size(key)?))
    }

    /// Cursor position relative to the window's top-left corner.
    fn cursor_position(&self, key: WindowKey) -> Option<Vec2>;

    /// Drain input queued for `key` since the last call.
    fn take_input(&mut self, key: WindowKey) -> Vec<InputEvent>;

    fn should_close(&self, key: WindowKey) -> bool;

    fn set_cursor_style(&mut self, key: WindowKey, style: CursorStyle);

    /// Screen rectangle of the primary display.
    fn primary_monitor(&self) -> Rect;

    /// Pump platform events once per frame.
    fn poll_events(&mut self) {}

    /// Paint `content` and swap the window's buffers.
    fn present(&mut self, key: WindowKey, content: &Content<'_>);
}
