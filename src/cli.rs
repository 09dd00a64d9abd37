// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "fish-flow")]
#[command(about = "A fish swimming along a curve over a landscape", long_about = None)]
pub struct Cli {
    /// Fish model, http(s) URL or local .glb path
    #[arg(long)]
    pub fish: Option<String>,

    /// Landscape model, http(s) URL or local .glb path
    #[arg(long)]
    pub landscape: Option<String>,

    /// JSON settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Seconds before a model fetch is abandoned
    #[arg(long = "fetch-timeout")]
    pub fetch_timeout: Option<f64>,

    /// Advance the fish by elapsed time instead of once per frame
    #[arg(long = "real-time", default_value = "false")]
    pub real_time: bool,

    /// Stop animating when a task fails instead of skipping it
    #[arg(long = "halt-on-task-error", default_value = "false")]
    pub halt_on_task_error: bool,

    /// Disable UI elements
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,
}
