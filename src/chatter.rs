use glam::Vec2;

use crate::error::BuddyError;
use crate::text::{FontSpec, TextLayout};
use crate::window::{Content, Effect, WindowBackend, WindowDesc, WindowKey, WindowRole};

/// Margin between the text and the bubble edge, on every side.
pub const PADDING: f32 = 10.0;
/// Vertical space left between stacked bubbles.
pub const BUMP_GAP: f32 = 10.0;
/// Seconds a bubble stays up.
pub const DEFAULT_LIFETIME: f32 = 6.0;
/// How far above the speaker's top edge a new bubble is centered.
pub const ANCHOR_LIFT: f32 = 20.0;

/// A transient speech bubble, optionally glued to a parent window.
#[derive(Debug, Clone)]
pub struct ChatterWindow {
    key: WindowKey,
    text: String,
    font: FontSpec,
    size: Vec2,
    time_to_live: f32,
    /// Lookup handle only; the parent may close at any time.
    parent: Option<WindowKey>,
    /// From the parent's center to this bubble's center.
    offset: Vec2,
}

impl ChatterWindow {
    /// Open a bubble for `text` centered on `anchor`.
    pub fn create<B: WindowBackend + ?Sized>(
        text: &str,
        font: FontSpec,
        anchor: Vec2,
        duration: f32,
        parent: Option<WindowKey>,
        layout: &dyn TextLayout,
        backend: &mut B,
    ) -> Result<Self, BuddyError> {
        let size = layout.measure(text, &font) + Vec2::splat(PADDING * 2.0);
        let desc = WindowDesc {
            title: "chatter".to_string(),
            size,
            role: WindowRole::Chatter,
            click_through: true,
        };
        let key = backend.create_window(&desc)?;
        backend.set_position(key, (anchor - size * 0.5).floor());

        let parent_center = parent.and_then(|p| backend.rect(p)).map(|r| r.center());
        let (parent, offset) = match parent_center {
            Some(center) => (parent, anchor - center),
            None => (None, Vec2::ZERO),
        };

        log::debug!("Chatter {:?} opened for {text:?}", key);
        Ok(Self {
            key,
            text: text.to_string(),
            font,
            size,
            time_to_live: duration,
            parent,
            offset,
        })
    }

    pub fn key(&self) -> WindowKey {
        self.key
    }

    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[cfg(test)]
    pub fn parent(&self) -> Option<WindowKey> {
        self.parent
    }

    #[cfg(test)]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    #[cfg(test)]
    pub fn time_to_live(&self) -> f32 {
        self.time_to_live
    }

    pub fn content(&self) -> Content<'_> {
        Content::Text {
            text: &self.text,
            font: &self.font,
        }
    }

    /// Count down, then either expire or stick to the parent.
    pub fn update<B: WindowBackend + ?Sized>(
        &mut self,
        dt: f32,
        backend: &mut B,
        effects: &mut Vec<Effect>,
    ) {
        // Bubbles are click-through; anything delivered anyway is noise.
        backend.take_input(self.key);

        self.time_to_live -= dt;
        if self.time_to_live <= 0.0 {
            effects.push(Effect::Close);
            return;
        }

        let Some(parent) = self.parent else {
            return;
        };
        match backend.rect(parent) {
            Some(rect) => effects.push(Effect::MoveTo(self.top_left(rect.center()))),
            None => {
                log::debug!("Chatter {:?} lost its parent, staying put", self.key);
                self.parent = None;
            }
        }
    }

    /// Make room for a newer bubble below this one.
    pub fn bump<B: WindowBackend + ?Sized>(&mut self, backend: &mut B) {
        let shift = self.size.y + BUMP_GAP;
        self.offset.y -= shift;
        if let Some(rect) = self.parent.and_then(|p| backend.rect(p)) {
            backend.set_position(self.key, self.top_left(rect.center()));
        } else if let Some(pos) = backend.position(self.key) {
            backend.set_position(self.key, pos - Vec2::new(0.0, shift));
        }
    }

    fn top_left(&self, parent_center: Vec2) -> Vec2 {
        (parent_center + self.offset - self.size * 0.5).floor()
    }
}
