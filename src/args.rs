use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings XML file (default: the user config directory)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Drive hand tracking from a recorded JSON-lines landmark file
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Restart the replay file when it ends
    #[arg(long, default_value_t = false)]
    pub loop_replay: bool,

    /// Start with hand tracking off
    #[arg(long, default_value_t = false)]
    pub no_hands: bool,

    /// Camera index for live tracking (overrides the settings file)
    #[arg(short, long)]
    pub camera: Option<u32>,

    /// Run without a window for this many seconds, then exit
    #[arg(long)]
    pub headless: Option<f64>,

    /// Log as JSON
    #[arg(long, default_value_t = false)]
    pub log_json: bool,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the available cameras and exit
    #[cfg(feature = "webcam")]
    #[arg(long, default_value_t = false)]
    pub list_cameras: bool,

    /// Write the effective settings to the settings path and exit
    #[arg(long, default_value_t = false)]
    pub write_settings: bool,
}
