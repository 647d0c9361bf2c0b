use std::collections::BTreeMap;

use glam::Vec2;

use super::{Content, CursorStyle, InputEvent, WindowBackend, WindowDesc, WindowKey, WindowRole};
use crate::error::BuddyError;
use crate::math::Rect;

/// A window as the in-memory backend remembers it.
#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub desc: WindowDesc,
    pub pos: Vec2,
    pub open: bool,
    pub close_requested: bool,
    pub input: Vec<InputEvent>,
    pub cursor_style: CursorStyle,
    pub presented: u32,
    pub last_text: Option<String>,
}

/// Display-less backend: windows are records, the cursor is a field.
pub struct FakeBackend {
    pub windows: BTreeMap<WindowKey, FakeWindow>,
    /// Absolute cursor position.
    pub cursor: Vec2,
    pub monitor: Rect,
    pub polls: u32,
    pub fail_creation: bool,
    next_key: u64,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            windows: BTreeMap::new(),
            cursor: Vec2::ZERO,
            monitor: Rect::new(Vec2::ZERO, Vec2::new(1920.0, 1080.0)),
            polls: 0,
            fail_creation: false,
            next_key: 1,
        }
    }

    pub fn push_input(&mut self, key: WindowKey, event: InputEvent) {
        if let Some(w) = self.windows.get_mut(&key) {
            w.input.push(event);
        }
    }

    pub fn window(&self, key: WindowKey) -> &FakeWindow {
        &self.windows[&key]
    }

    /// Open windows with the given role, in creation order.
    pub fn open_with_role(&self, role: WindowRole) -> Vec<WindowKey> {
        self.windows
            .iter()
            .filter(|(_, w)| w.open && w.desc.role == role)
            .map(|(k, _)| *k)
            .collect()
    }

    fn open_window(&self, key: WindowKey) -> Option<&FakeWindow> {
        self.windows.get(&key).filter(|w| w.open)
    }
}

impl WindowBackend for FakeBackend {
    fn create_window(&mut self, desc: &WindowDesc) -> Result<WindowKey, BuddyError> {
        if self.fail_creation {
            return Err(BuddyError::Gpu("fake backend refuses to create windows".into()));
        }
        let key = WindowKey(self.next_key);
        self.next_key += 1;
        self.windows.insert(
            key,
            FakeWindow {
                desc: desc.clone(),
                pos: Vec2::ZERO,
                open: true,
                close_requested: false,
                input: Vec::new(),
                cursor_style: CursorStyle::Arrow,
                presented: 0,
                last_text: None,
            },
        );
        Ok(key)
    }

    fn close(&mut self, key: WindowKey) {
        if let Some(w) = self.windows.get_mut(&key) {
            w.open = false;
        }
    }

    fn position(&self, key: WindowKey) -> Option<Vec2> {
        self.open_window(key).map(|w| w.pos)
    }

    fn set_position(&mut self, key: WindowKey, pos: Vec2) {
        if let Some(w) = self.windows.get_mut(&key).filter(|w| w.open) {
            w.pos = pos;
        }
    }

    fn size(&self, key: WindowKey) -> Option<Vec2> {
        self.open_window(key).map(|w| w.desc.size)
    }

    fn cursor_position(&self, key: WindowKey) -> Option<Vec2> {
        self.open_window(key).map(|w| self.cursor - w.pos)
    }

    fn take_input(&mut self, key: WindowKey) -> Vec<InputEvent> {
        self.windows
            .get_mut(&key)
            .map(|w| std::mem::take(&mut w.input))
            .unwrap_or_default()
    }

    fn should_close(&self, key: WindowKey) -> bool {
        self.windows.get(&key).is_some_and(|w| w.close_requested)
    }

    fn set_cursor_style(&mut self, key: WindowKey, style: CursorStyle) {
        if let Some(w) = self.windows.get_mut(&key) {
            w.cursor_style = style;
        }
    }

    fn primary_monitor(&self) -> Rect {
        self.monitor
    }

    fn poll_events(&mut self) {
        self.polls += 1;
    }

    fn present(&mut self, key: WindowKey, content: &Content<'_>) {
        if let Some(w) = self.windows.get_mut(&key).filter(|w| w.open) {
            w.presented += 1;
            if let Content::Text { text, .. } = content {
                w.last_text = Some(text.to_string());
            }
        }
    }
}
