use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::{CursorIcon, Window, WindowId, WindowLevel};

use super::{
    Content, CursorStyle, InputEvent, PointerButton, WindowBackend, WindowDesc, WindowKey,
    WindowRole,
};
use crate::error::BuddyError;
use crate::math::Rect;
use crate::render::{GpuContext, WindowSurface};

/// Used when winit reports no monitor at all.
const FALLBACK_SCREEN: Vec2 = Vec2::new(1280.0, 720.0);

struct NativeWindow {
    surface: WindowSurface,
    window: Arc<Window>,
    role: WindowRole,
    /// Last position we set or were told about.
    pos: Vec2,
    cursor: ScreenCursor,
    input: Vec<InputEvent>,
    close_requested: bool,
    /// Windows start hidden and appear on their first present, once placed.
    shown: bool,
}

/// Cursor as last seen over a window, kept in screen pixels so it stays
/// right when the window moves under a pointer that doesn't.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ScreenCursor(Vec2);

impl ScreenCursor {
    fn moved(&mut self, window_pos: Vec2, local: Vec2) {
        self.0 = window_pos + local;
    }

    fn relative_to(self, window_pos: Vec2) -> Vec2 {
        self.0 - window_pos
    }
}

fn to_vec2(p: PhysicalPosition<i32>) -> Vec2 {
    Vec2::new(p.x as f32, p.y as f32)
}

fn map_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Left),
        MouseButton::Right => Some(PointerButton::Right),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Every native window plus the GPU context they share. Lives in the app
/// across event loop callbacks.
#[derive(Default)]
pub struct WindowTable {
    windows: HashMap<WindowKey, NativeWindow>,
    ids: HashMap<WindowId, WindowKey>,
    gpu: Option<GpuContext>,
    next_key: u64,
}

impl WindowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a winit event against the window it belongs to.
    pub fn handle_event(&mut self, id: WindowId, event: &WindowEvent) {
        let Some(key) = self.ids.get(&id).copied() else {
            return;
        };
        let Some(w) = self.windows.get_mut(&key) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => w.close_requested = true,
            WindowEvent::Moved(pos) => w.pos = to_vec2(*pos),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &self.gpu {
                    w.surface.resize(gpu, size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let origin = w.window.outer_position().map(to_vec2).unwrap_or(w.pos);
                let local = Vec2::new(position.x as f32, position.y as f32);
                w.cursor.moved(origin, local);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = map_button(*button) else {
                    return;
                };
                w.input.push(match state {
                    ElementState::Pressed => InputEvent::Press(button),
                    ElementState::Released => InputEvent::Release(button),
                });
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && !event.repeat
                    && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                w.input.push(InputEvent::Escape);
            }
            _ => {}
        }
    }

    /// Create a surface for `window`, bringing the GPU up on first use.
    fn attach_surface(
        &mut self,
        window: &Arc<Window>,
        role: WindowRole,
    ) -> Result<WindowSurface, BuddyError> {
        let (gpu, surface) = match self.gpu.take() {
            Some(gpu) => {
                let surface = gpu.create_surface(window.clone());
                (gpu, surface)
            }
            None => {
                let (gpu, surface) = GpuContext::new(window.clone())?;
                log::info!("wgpu initialized");
                (gpu, Ok(surface))
            }
        };
        let gpu = self.gpu.insert(gpu);
        Ok(WindowSurface::new(gpu, surface?, window, role))
    }
}

/// The window table viewed through the backend contract for the duration
/// of one event loop callback.
pub struct WinitBackend<'a> {
    pub event_loop: &'a ActiveEventLoop,
    pub table: &'a mut WindowTable,
}

impl WindowBackend for WinitBackend<'_> {
    fn create_window(&mut self, desc: &WindowDesc) -> Result<WindowKey, BuddyError> {
        let attrs = Window::default_attributes()
            .with_title(desc.title.clone())
            .with_inner_size(PhysicalSize::new(
                desc.size.x.max(1.0) as u32,
                desc.size.y.max(1.0) as u32,
            ))
            .with_decorations(false)
            .with_resizable(false)
            .with_visible(false)
            .with_window_level(WindowLevel::AlwaysOnTop);
        // On Windows with_transparent sets WS_EX_LAYERED, which conflicts with
        // DirectComposition. Transparency there comes from DxgiFromVisual.
        #[cfg(not(windows))]
        let attrs = attrs.with_transparent(true);

        let window = Arc::new(self.event_loop.create_window(attrs)?);

        #[cfg(windows)]
        crate::platform::win32::setup_overlay(&window, desc.click_through);
        #[cfg(not(windows))]
        if desc.click_through {
            if let Err(e) = window.set_cursor_hittest(false) {
                log::debug!("Click-through unsupported here: {e}");
            }
        }

        let surface = self.table.attach_surface(&window, desc.role)?;

        let key = WindowKey(self.table.next_key);
        self.table.next_key += 1;
        let pos = window.outer_position().map(to_vec2).unwrap_or(Vec2::ZERO);

        log::info!(
            "Created {:?} window {:?} ({}x{})",
            desc.role,
            key,
            desc.size.x,
            desc.size.y
        );

        self.table.ids.insert(window.id(), key);
        self.table.windows.insert(
            key,
            NativeWindow {
                surface,
                window,
                role: desc.role,
                pos,
                cursor: ScreenCursor::default(),
                input: Vec::new(),
                close_requested: false,
                shown: false,
            },
        );
        Ok(key)
    }

    fn close(&mut self, key: WindowKey) {
        if let Some(w) = self.table.windows.remove(&key) {
            self.table.ids.remove(&w.window.id());
            log::debug!("Destroyed {:?} window {:?}", w.role, key);
        }
    }

    fn position(&self, key: WindowKey) -> Option<Vec2> {
        let w = self.table.windows.get(&key)?;
        Some(w.window.outer_position().map(to_vec2).unwrap_or(w.pos))
    }

    fn set_position(&mut self, key: WindowKey, pos: Vec2) {
        if let Some(w) = self.table.windows.get_mut(&key) {
            w.window.set_outer_position(PhysicalPosition::new(
                pos.x.round() as i32,
                pos.y.round() as i32,
            ));
            w.pos = pos;
        }
    }

    fn size(&self, key: WindowKey) -> Option<Vec2> {
        let size = self.table.windows.get(&key)?.window.inner_size();
        Some(Vec2::new(size.width as f32, size.height as f32))
    }

    fn cursor_position(&self, key: WindowKey) -> Option<Vec2> {
        // Winit only reports the cursor inside our windows; Win32 can see
        // it anywhere, which following needs.
        #[cfg(windows)]
        let cursor = ScreenCursor(crate::platform::win32::get_mouse_pos());
        #[cfg(not(windows))]
        let cursor = self.table.windows.get(&key)?.cursor;
        Some(cursor.relative_to(self.position(key)?))
    }

    fn take_input(&mut self, key: WindowKey) -> Vec<InputEvent> {
        self.table
            .windows
            .get_mut(&key)
            .map(|w| std::mem::take(&mut w.input))
            .unwrap_or_default()
    }

    fn should_close(&self, key: WindowKey) -> bool {
        self.table
            .windows
            .get(&key)
            .is_some_and(|w| w.close_requested)
    }

    fn set_cursor_style(&mut self, key: WindowKey, style: CursorStyle) {
        if let Some(w) = self.table.windows.get(&key) {
            w.window.set_cursor(match style {
                CursorStyle::Arrow => CursorIcon::Default,
                CursorStyle::Move => CursorIcon::Move,
            });
        }
    }

    fn primary_monitor(&self) -> Rect {
        let monitor = self
            .event_loop
            .primary_monitor()
            .or_else(|| self.event_loop.available_monitors().next());
        match monitor {
            Some(m) => {
                let size = m.size();
                Rect::new(
                    to_vec2(m.position()),
                    Vec2::new(size.width as f32, size.height as f32),
                )
            }
            None => {
                log::warn!("No monitor reported, assuming {FALLBACK_SCREEN}");
                Rect::new(Vec2::ZERO, FALLBACK_SCREEN)
            }
        }
    }

    fn present(&mut self, key: WindowKey, content: &Content<'_>) {
        let table = &mut *self.table;
        let (Some(gpu), Some(w)) = (table.gpu.as_ref(), table.windows.get_mut(&key)) else {
            return;
        };
        w.surface.draw(gpu, &w.window, content);
        if !w.shown {
            w.window.set_visible(true);
            w.shown = true;
        }
    }
}
