use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML (written with defaults if missing)
    #[arg(long, default_value = "deskbuddy.toml")]
    pub config: PathBuf,

    /// Companion type to spawn; repeat for several (overrides config)
    #[arg(long = "skin", value_name = "NAME")]
    pub skins: Vec<String>,

    /// Companion sprite size in pixels (overrides config)
    #[arg(long, value_name = "PX")]
    pub size: Option<u32>,

    /// Print the built-in companion types and exit
    #[arg(long, default_value_t = false)]
    pub list_skins: bool,
}
