//! Optional env file holding API keys and the port.

use std::path::Path;

use super::ConfigError;

/// Env file read at startup when present.
pub const DEFAULT_ENV_FILE: &str = "config/config.env";

/// Load variables from `path` into the process environment.
///
/// Variables already set are left alone. A missing file is not an error;
/// returns whether a file was loaded.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no env file");
        return Ok(false);
    }

    dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded env file");
    Ok(true)
}
