//! Process bootstrap: env file, config, tracing — in that order, matching
//! how a hosting binary is expected to start a Docshelf session.

use anyhow::Result;
use core_types::config::{AppConfig, load_or_create_config};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// Load the environment and config, then install tracing. Returns the
/// resolved config and the appender guard to keep alive.
pub fn bootstrap(config_path: Option<&Path>) -> Result<(AppConfig, Option<WorkerGuard>)> {
    dotenvy::dotenv().ok();
    let cfg = load_or_create_config(config_path)?;
    let guard = crate::logging::init_tracing(&cfg.logging)?;
    Ok((cfg, guard))
}
