use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::buddy::skin::{Skin, BUILTIN_SKINS};
use crate::buddy::Companion;
use crate::cli::Args;
use crate::config::AppConfig;
use crate::error::BuddyError;
use crate::text::MonoLayout;
use crate::voice;
use crate::window::native::{WindowTable, WinitBackend};
use crate::window::registry::{AppWindow, Registry, Services};

/// Target frame interval (seconds).
const FRAME_INTERVAL: f64 = 1.0 / 60.0;
/// How often to log FPS (seconds).
const FPS_LOG_INTERVAL: f64 = 5.0;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    last_log_time: Instant,
    frame_time_sum: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    frames_since_log: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            last_log_time: Instant::now(),
            frame_time_sum: 0.0,
            frame_time_min: f64::MAX,
            frame_time_max: 0.0,
            frames_since_log: 0,
        }
    }

    fn record_frame(&mut self, dt: f64, windows: usize) {
        self.frame_count += 1;
        self.frames_since_log += 1;
        self.frame_time_sum += dt;
        self.frame_time_min = self.frame_time_min.min(dt);
        self.frame_time_max = self.frame_time_max.max(dt);

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= FPS_LOG_INTERVAL {
            let avg_ms = (self.frame_time_sum / self.frames_since_log as f64) * 1000.0;
            let fps = self.frames_since_log as f64 / elapsed;
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | windows: {} | total frames: {}",
                fps,
                avg_ms,
                self.frame_time_min * 1000.0,
                self.frame_time_max * 1000.0,
                windows,
                self.frame_count,
            );
            self.last_log_time = Instant::now();
            self.frame_time_sum = 0.0;
            self.frame_time_min = f64::MAX;
            self.frame_time_max = 0.0;
            self.frames_since_log = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state.
struct App {
    config: AppConfig,
    skins: Vec<Arc<Skin>>,

    table: WindowTable,
    registry: Registry,
    services: Services,

    // Frame pacing
    last_frame_time: Option<Instant>,
    next_frame: Option<Instant>,
    frame_stats: FrameStats,

    started: bool,
    /// Startup failure to report once the event loop returns.
    fatal: Option<BuddyError>,
}

impl App {
    fn new(config: AppConfig, skins: Vec<Arc<Skin>>) -> Self {
        let services = Services {
            rng: fastrand::Rng::new(),
            text: Box::new(MonoLayout),
            voice: voice::open_default(config.sound.asset_dir.clone(), config.sound.volume),
        };
        Self {
            config,
            skins,
            table: WindowTable::new(),
            registry: Registry::new(),
            services,
            last_frame_time: None,
            next_frame: None,
            frame_stats: FrameStats::new(),
            started: false,
            fatal: None,
        }
    }

    /// Spawn one companion per configured skin. Only fails if none came up.
    fn spawn_companions(&mut self, event_loop: &ActiveEventLoop) -> Result<(), BuddyError> {
        let mut backend = WinitBackend {
            event_loop,
            table: &mut self.table,
        };
        let mut spawned = 0;
        let mut last_err = None;

        for skin in &self.skins {
            match Companion::spawn(
                skin.clone(),
                self.config.window.companion_size,
                &mut backend,
                &mut self.services.rng,
            ) {
                Ok((key, companion)) => {
                    self.registry
                        .queue_add(key, AppWindow::Companion(Box::new(companion)));
                    spawned += 1;
                }
                Err(e) => {
                    log::error!("Failed to spawn {}: {e}", skin.name);
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if spawned == 0 => Err(e),
            _ => {
                log::info!("Spawned {spawned} companion(s)");
                Ok(())
            }
        }
    }

    fn run_frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = self
            .last_frame_time
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame_time = Some(now);
        self.frame_stats.record_frame(dt, self.registry.len());

        let mut backend = WinitBackend {
            event_loop,
            table: &mut self.table,
        };
        if !self
            .registry
            .run_frame(dt as f32, &mut backend, &mut self.services)
        {
            log::info!("All windows closed, exiting");
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        if let Err(e) = self.spawn_companions(event_loop) {
            self.fatal = Some(e);
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now()));
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.started || event_loop.exiting() {
            return;
        }

        let now = Instant::now();
        if let Some(next) = self.next_frame {
            if now < next {
                event_loop.set_control_flow(ControlFlow::WaitUntil(next));
                return;
            }
        }

        let next = now + Duration::from_secs_f64(FRAME_INTERVAL);
        self.next_frame = Some(next);
        self.run_frame(event_loop);
        event_loop.set_control_flow(ControlFlow::WaitUntil(next));
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        self.table.handle_event(window_id, &event);
    }
}

/// Entry point: parse arguments, load config, run the event loop.
pub fn run() -> Result<(), BuddyError> {
    let args = Args::parse();
    if args.list_skins {
        for name in BUILTIN_SKINS {
            println!("{name}");
        }
        return Ok(());
    }

    let config = AppConfig::load_or_default(&args.config)?.with_overrides(&args.skins, args.size);
    config.validate()?;
    let skins = config.skins()?.into_iter().map(Arc::new).collect();

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, skins);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
