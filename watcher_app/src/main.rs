//! Render-farm watcher
//!
//! Loads the pipeline configuration, verifies the renderer is reachable,
//! then polls the watched tree for job markers until killed.
//!
//! Usage: `lux_watcher [config.toml]`

use lux_pipeline::config::{Config, PipelineConfig};
use lux_pipeline::jobs;
use lux_pipeline::render::check_renderer;

fn main() {
    lux_pipeline::foundation::logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match PipelineConfig::load_from_file(&path) {
            Ok(config) => {
                log::info!("loaded configuration from {path}");
                config
            }
            Err(err) => {
                log::error!("unable to load configuration from {path}: {err}");
                std::process::exit(1);
            }
        },
        None => {
            log::info!("no configuration file given; using defaults");
            PipelineConfig::default()
        }
    };

    if let Err(err) = check_renderer(&config.renderer) {
        log::error!("{err}");
        std::process::exit(1);
    }

    jobs::watch(&config);
}
