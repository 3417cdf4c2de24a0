use std::path::Path;
use tracing::debug;

use crate::error::LabError;
use crate::models::Config;

pub const HOST_ENV: &str = "LAB_CORE_HOST";
pub const TOKEN_ENV: &str = "LAB_CORE_TOKEN";

/// Load configuration from the working directory with environment overrides
pub fn load_config(project_root: &Path) -> Result<Config, LabError> {
    let host = non_empty_env(HOST_ENV);
    let token = non_empty_env(TOKEN_ENV);
    load_config_with(project_root, host, token)
}

/// Load configuration with explicit overrides instead of reading the environment
pub fn load_config_with(
    project_root: &Path,
    host: Option<String>,
    token: Option<String>,
) -> Result<Config, LabError> {
    let config = Config::load_from_dir(project_root)?;
    let config = config.with_overrides(host, token);

    debug!(
        "Configuration loaded: host={}, token={}, timeout={}s, poll={}ms",
        config.gitlab.host,
        if config.gitlab.token.is_some() { "set" } else { "unset" },
        config.gitlab.timeout_seconds,
        config.trace.poll_interval_ms
    );

    Ok(config)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
