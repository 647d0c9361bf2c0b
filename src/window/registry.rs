use glam::Vec2;

use super::{Content, Effect, WindowBackend, WindowKey};
use crate::buddy::{Companion, TickInput};
use crate::chatter::{ChatterWindow, ANCHOR_LIFT, DEFAULT_LIFETIME};
use crate::text::{FontSpec, TextLayout};
use crate::voice::VoiceSink;

/// Longest frame the simulation will step in one go.
pub const MAX_FRAME_DT: f32 = 0.25;

/// Everything the frame loop can drive.
pub enum AppWindow {
    Companion(Box<Companion>),
    Chatter(ChatterWindow),
}

impl AppWindow {
    pub fn content(&self) -> Content<'_> {
        match self {
            AppWindow::Companion(c) => c.content(),
            AppWindow::Chatter(c) => c.content(),
        }
    }
}

/// Shared collaborators handed to every window update.
pub struct Services {
    pub rng: fastrand::Rng,
    pub text: Box<dyn TextLayout>,
    pub voice: Box<dyn VoiceSink>,
}

struct Entry {
    key: WindowKey,
    closed: bool,
    window: AppWindow,
}

/// Owns every live window. Additions and removals requested during a frame
/// are queued and merged at the start of the next one.
#[derive(Default)]
pub struct Registry {
    active: Vec<Entry>,
    pending_add: Vec<Entry>,
    pending_remove: Vec<WindowKey>,
    effects: Vec<Effect>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_add(&mut self, key: WindowKey, window: AppWindow) {
        self.pending_add.push(Entry {
            key,
            closed: false,
            window,
        });
    }

    /// Windows currently in the active set, closed-but-unmerged included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[cfg(test)]
    pub fn chatters(&self) -> impl Iterator<Item = &ChatterWindow> {
        self.entries().filter_map(|e| match &e.window {
            AppWindow::Chatter(c) => Some(c),
            AppWindow::Companion(_) => None,
        })
    }

    #[cfg(test)]
    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.active
            .iter()
            .chain(self.pending_add.iter())
            .filter(|e| !e.closed)
    }

    fn merge_pending(&mut self) {
        for entry in self.pending_add.drain(..) {
            if self.active.iter().any(|e| e.key == entry.key) {
                log::warn!("Window {:?} registered twice, ignoring", entry.key);
                continue;
            }
            self.active.push(entry);
        }
        if !self.pending_remove.is_empty() {
            let remove = std::mem::take(&mut self.pending_remove);
            self.active.retain(|e| !remove.contains(&e.key));
        }
    }

    /// Run one frame over every window. Returns `false` once no windows
    /// are left and the loop should end.
    pub fn run_frame<B: WindowBackend + ?Sized>(
        &mut self,
        dt: f32,
        backend: &mut B,
        services: &mut Services,
    ) -> bool {
        self.merge_pending();
        if self.active.is_empty() {
            return false;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        backend.poll_events();

        for i in 0..self.active.len() {
            if self.active[i].closed {
                continue;
            }
            let key = self.active[i].key;
            if backend.should_close(key) {
                self.close(key, backend);
                continue;
            }

            let mut effects = std::mem::take(&mut self.effects);
            match &mut self.active[i].window {
                AppWindow::Companion(companion) => {
                    let events = backend.take_input(key);
                    let input = TickInput {
                        dt,
                        window_pos: backend.position(key).unwrap_or(companion.anchor()),
                        cursor: backend.cursor_position(key).unwrap_or(Vec2::ZERO),
                        events: &events,
                    };
                    companion.update(&input, &mut services.rng, &mut effects);
                }
                AppWindow::Chatter(chatter) => chatter.update(dt, backend, &mut effects),
            }

            for effect in effects.drain(..) {
                self.apply(i, effect, backend, services);
            }
            self.effects = effects;

            let entry = &self.active[i];
            if !entry.closed {
                backend.present(key, &entry.window.content());
            }
        }
        true
    }

    /// Close `key` now and drop it at the next frame boundary. Closing a
    /// window twice is a no-op.
    pub fn close<B: WindowBackend + ?Sized>(&mut self, key: WindowKey, backend: &mut B) {
        if let Some(entry) = self.active.iter_mut().find(|e| e.key == key) {
            if entry.closed {
                return;
            }
            entry.closed = true;
            backend.close(key);
            self.pending_remove.push(key);
            if let AppWindow::Companion(c) = &entry.window {
                log::info!("Closed {} ({:?})", c.skin().name, key);
            }
        } else if let Some(i) = self.pending_add.iter().position(|e| e.key == key) {
            // Never merged, so there is nothing to defer.
            self.pending_add.remove(i);
            backend.close(key);
            log::debug!("Closed {key:?} before its first frame");
        }
    }

    fn apply<B: WindowBackend + ?Sized>(
        &mut self,
        i: usize,
        effect: Effect,
        backend: &mut B,
        services: &mut Services,
    ) {
        let entry = &self.active[i];
        if entry.closed {
            return;
        }
        let key = entry.key;
        match effect {
            Effect::MoveTo(pos) => backend.set_position(key, pos),
            Effect::Say { text, font } => self.say(key, &text, font, backend, services),
            Effect::Voice(cue) => services.voice.play(&cue),
            Effect::Cursor(style) => backend.set_cursor_style(key, style),
            Effect::Close => self.close(key, backend),
        }
    }

    /// Pop a bubble above `speaker` and push every older bubble up.
    pub fn say<B: WindowBackend + ?Sized>(
        &mut self,
        speaker: WindowKey,
        text: &str,
        font: FontSpec,
        backend: &mut B,
        services: &mut Services,
    ) {
        let Some(rect) = backend.rect(speaker) else {
            log::warn!("{speaker:?} spoke without a window, dropping {text:?}");
            return;
        };

        let anchor = Vec2::new(rect.center().x, rect.min.y - ANCHOR_LIFT);
        let chatter = match ChatterWindow::create(
            text,
            font,
            anchor,
            DEFAULT_LIFETIME,
            Some(speaker),
            services.text.as_ref(),
            backend,
        ) {
            Ok(chatter) => chatter,
            Err(e) => {
                log::warn!("Failed to open chatter window: {e}");
                return;
            }
        };

        for entry in self.active.iter_mut().chain(self.pending_add.iter_mut()) {
            if let (false, AppWindow::Chatter(older)) = (entry.closed, &mut entry.window) {
                older.bump(backend);
            }
        }
        self.queue_add(chatter.key(), AppWindow::Chatter(chatter));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use crate::buddy::dialog::DialogKind;
    use crate::buddy::skin::Skin;
    use crate::text::MonoLayout;
    use crate::window::fake::FakeBackend;
    use crate::window::{InputEvent, PointerButton, WindowRole};

    #[derive(Clone, Default)]
    struct RecordingVoice(Rc<RefCell<Vec<String>>>);

    impl VoiceSink for RecordingVoice {
        fn play(&mut self, cue: &str) {
            self.0.borrow_mut().push(cue.to_string());
        }
    }

    fn services(seed: u64) -> (Services, RecordingVoice) {
        let voice = RecordingVoice::default();
        let services = Services {
            rng: fastrand::Rng::with_seed(seed),
            text: Box::new(MonoLayout),
            voice: Box::new(voice.clone()),
        };
        (services, voice)
    }

    fn spawn(
        registry: &mut Registry,
        backend: &mut FakeBackend,
        services: &mut Services,
    ) -> WindowKey {
        let (key, companion) =
            Companion::spawn(Arc::new(Skin::funfriend()), 75, backend, &mut services.rng).unwrap();
        registry.queue_add(key, AppWindow::Companion(Box::new(companion)));
        key
    }

    fn run(
        registry: &mut Registry,
        backend: &mut FakeBackend,
        services: &mut Services,
        seconds: f32,
    ) {
        let ticks = (seconds / 0.05).round() as usize;
        for _ in 0..ticks {
            registry.run_frame(0.05, backend, services);
        }
    }

    #[test]
    fn empty_registry_stops_the_loop() {
        let mut backend = FakeBackend::new();
        let (mut services, _) = services(1);
        let mut registry = Registry::new();
        assert!(!registry.run_frame(0.016, &mut backend, &mut services));
        assert_eq!(backend.polls, 0);
    }

    #[test]
    fn duplicate_adds_are_merged_once() {
        let mut backend = FakeBackend::new();
        let (mut services, _) = services(2);
        let mut registry = Registry::new();
        let key = spawn(&mut registry, &mut backend, &mut services);
        let (_, twin) = Companion::spawn(
            Arc::new(Skin::funfriend()),
            75,
            &mut backend,
            &mut services.rng,
        )
        .unwrap();
        registry.queue_add(key, AppWindow::Companion(Box::new(twin)));

        assert!(registry.run_frame(0.016, &mut backend, &mut services));
        assert_eq!(registry.len(), 1);
        assert_eq!(backend.polls, 1);
        assert_eq!(backend.window(key).presented, 1);
    }

    #[test]
    fn escape_closes_and_removal_is_deferred() {
        let mut backend = FakeBackend::new();
        let (mut services, _) = services(3);
        let mut registry = Registry::new();
        let key = spawn(&mut registry, &mut backend, &mut services);
        registry.run_frame(0.016, &mut backend, &mut services);

        backend.push_input(key, InputEvent::Escape);
        assert!(registry.run_frame(0.016, &mut backend, &mut services));
        assert!(!backend.window(key).open);
        // Still listed until the next frame boundary, but never presented again.
        assert_eq!(registry.len(), 1);
        assert_eq!(backend.window(key).presented, 1);

        assert!(!registry.run_frame(0.016, &mut backend, &mut services));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn backend_close_request_skips_update() {
        let mut backend = FakeBackend::new();
        let (mut services, _) = services(4);
        let mut registry = Registry::new();
        let key = spawn(&mut registry, &mut backend, &mut services);

        backend.windows.get_mut(&key).unwrap().close_requested = true;
        registry.run_frame(0.016, &mut backend, &mut services);
        assert!(!backend.window(key).open);
        assert_eq!(backend.window(key).presented, 0);

        // Closing again is harmless.
        registry.close(key, &mut backend);
        assert!(!registry.run_frame(0.016, &mut backend, &mut services));
    }

    #[test]
    fn click_produces_one_touched_bubble() {
        let mut backend = FakeBackend::new();
        let (mut services, voice) = services(5);
        let mut registry = Registry::new();
        let key = spawn(&mut registry, &mut backend, &mut services);
        backend.cursor = backend.rect(key).unwrap().center();
        registry.run_frame(0.05, &mut backend, &mut services);

        backend.push_input(key, InputEvent::Press(PointerButton::Left));
        registry.run_frame(0.05, &mut backend, &mut services);
        assert_eq!(voice.0.borrow().len(), 1);
        backend.push_input(key, InputEvent::Release(PointerButton::Left));
        registry.run_frame(0.05, &mut backend, &mut services);

        run(&mut registry, &mut backend, &mut services, 0.5);
        assert!(backend.open_with_role(WindowRole::Chatter).is_empty());

        run(&mut registry, &mut backend, &mut services, 1.0);
        let bubbles = backend.open_with_role(WindowRole::Chatter);
        assert_eq!(bubbles.len(), 1);

        let text = registry.chatters().next().unwrap().text().to_string();
        let touched = Skin::funfriend().dialogue.groups(DialogKind::Touched).to_vec();
        assert!(touched.iter().any(|g| g[0] == text));
        assert_eq!(backend.window(bubbles[0]).last_text.as_deref(), Some(text.as_str()));
        // One cue for the press, one for the spoken line.
        assert_eq!(voice.0.borrow().len(), 2);

        // The bubble sits above the companion and retires after its lifetime.
        let companion = backend.rect(key).unwrap();
        let bubble = backend.rect(bubbles[0]).unwrap();
        assert!(bubble.center().y < companion.min.y);
        run(&mut registry, &mut backend, &mut services, DEFAULT_LIFETIME + 0.5);
        assert!(backend.open_with_role(WindowRole::Chatter).is_empty());
        assert_eq!(registry.chatters().count(), 0);
    }

    #[test]
    fn concurrent_bubbles_stack_without_overlap() {
        let mut backend = FakeBackend::new();
        let (mut services, _) = services(6);
        let mut registry = Registry::new();
        let key = spawn(&mut registry, &mut backend, &mut services);
        registry.run_frame(0.05, &mut backend, &mut services);

        let font = FontSpec::space_mono();
        for line in ["HELLO!", "IS THE AUTH LAYER STILL DISSOCIATED?", "I MISS THEM"] {
            registry.say(key, line, font, &mut backend, &mut services);
            registry.run_frame(0.05, &mut backend, &mut services);
        }

        let offsets: Vec<f32> = registry.chatters().map(|c| c.offset().y).collect();
        assert_eq!(offsets.len(), 3);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));

        let rects: Vec<_> = backend
            .open_with_role(WindowRole::Chatter)
            .into_iter()
            .map(|k| backend.rect(k).unwrap())
            .collect();
        for pair in rects.windows(2) {
            assert!(pair[0].min.y + pair[0].size.y <= pair[1].min.y);
        }
    }

    #[test]
    fn bubble_freezes_when_speaker_closes() {
        let mut backend = FakeBackend::new();
        let (mut services, _) = services(7);
        let mut registry = Registry::new();
        let key = spawn(&mut registry, &mut backend, &mut services);
        registry.run_frame(0.05, &mut backend, &mut services);

        registry.say(key, "HI!", FontSpec::space_mono(), &mut backend, &mut services);
        registry.run_frame(0.05, &mut backend, &mut services);
        let bubble = backend.open_with_role(WindowRole::Chatter)[0];
        let pos = backend.window(bubble).pos;

        registry.close(key, &mut backend);
        run(&mut registry, &mut backend, &mut services, 2.0);
        assert!(backend.window(bubble).open);
        assert_eq!(backend.window(bubble).pos, pos);
        assert!(registry.chatters().all(|c| c.parent().is_none()));

        run(&mut registry, &mut backend, &mut services, DEFAULT_LIFETIME);
        assert!(!backend.window(bubble).open);
        assert!(!registry.run_frame(0.05, &mut backend, &mut services));
    }

    #[test]
    fn oversized_frames_are_clamped() {
        let mut backend = FakeBackend::new();
        let (mut services, _) = services(8);
        let mut registry = Registry::new();
        let key = spawn(&mut registry, &mut backend, &mut services);
        registry.run_frame(0.05, &mut backend, &mut services);

        registry.say(key, "HI!", FontSpec::space_mono(), &mut backend, &mut services);
        registry.run_frame(0.0, &mut backend, &mut services);
        // A 10s stall only costs the bubble a quarter second.
        registry.run_frame(10.0, &mut backend, &mut services);
        let ttl = registry.chatters().next().unwrap().time_to_live();
        assert!((ttl - (DEFAULT_LIFETIME - MAX_FRAME_DT)).abs() < 1e-4);
    }

    #[test]
    fn closing_before_first_frame_drops_the_window() {
        let mut backend = FakeBackend::new();
        let (mut services, _) = services(9);
        let mut registry = Registry::new();
        let key = spawn(&mut registry, &mut backend, &mut services);

        registry.close(key, &mut backend);
        assert!(!backend.window(key).open);
        registry.close(key, &mut backend);

        assert!(!registry.run_frame(0.016, &mut backend, &mut services));
        assert_eq!(registry.len(), 0);
        assert_eq!(backend.window(key).presented, 0);
    }

    #[test]
    fn failed_bubble_leaves_existing_ones_alone() {
        let mut backend = FakeBackend::new();
        let (mut services, _) = services(10);
        let mut registry = Registry::new();
        let key = spawn(&mut registry, &mut backend, &mut services);
        registry.run_frame(0.05, &mut backend, &mut services);

        registry.say(key, "HI!", FontSpec::space_mono(), &mut backend, &mut services);
        registry.run_frame(0.05, &mut backend, &mut services);
        let bubble = backend.open_with_role(WindowRole::Chatter)[0];
        let offset = registry.chatters().next().unwrap().offset();
        let pos = backend.window(bubble).pos;

        backend.fail_creation = true;
        registry.say(key, "ANYONE?", FontSpec::space_mono(), &mut backend, &mut services);
        assert!(registry.run_frame(0.05, &mut backend, &mut services));

        assert_eq!(registry.chatters().count(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(backend.open_with_role(WindowRole::Chatter), vec![bubble]);
        assert_eq!(registry.chatters().next().unwrap().offset(), offset);
        // Still glued to a companion that hasn't moved.
        assert_eq!(backend.window(bubble).pos, pos);
    }
}
