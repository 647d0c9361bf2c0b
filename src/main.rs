mod app;
mod buddy;
mod chatter;
mod cli;
mod config;
mod ease;
mod error;
mod math;
mod platform;
mod render;
mod text;
mod voice;
mod window;

fn main() {
    env_logger::init();
    log::info!("DeskBuddy starting up");

    if let Err(e) = app::run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
