pub mod types;
pub mod config;
pub mod error;
pub mod format;
pub mod output;
pub mod catalog;
pub mod bus;
pub mod teams;
pub mod maps;
pub mod live;
pub mod custom;
pub mod scoreboard;
pub mod console;

#[cfg(test)]
mod test_support;

use config::*;
use output::OutputWriter;
use scoreboard::Scoreboard;

use std::fs;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub fn run() {
    let root = app_root();
    load_env_file(&root);
    let config = load_config(&root);
    let paths = AppPaths::resolve(&root, &config);

    // Initialize tracing with a daily rolling file
    fs::create_dir_all(&paths.logs).ok();
    let file_appender = tracing_appender::rolling::daily(&paths.logs, "scoreboard.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!(
        root = %paths.root.display(),
        output = %paths.output.display(),
        "Overlay scoreboard starting"
    );

    let writer = OutputWriter::new(&paths.output, &paths.assets);
    let state = load_state(&paths.save_file);
    let mut board = Scoreboard::from_saved(writer, state);

    if !env_flag_true("SCOREBOARD_REDRAW_ONLY") {
        console::run_stdio(&mut board, &paths.save_file);
    }

    if let Err(e) = save_state(&paths.save_file, &board.export()) {
        error!(error = %e, "failed to save state on exit");
    }
    info!("Overlay scoreboard stopped");
}
