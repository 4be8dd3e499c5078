//! Configuration file loading.
//!
//! Search order:
//! 1. `--config PATH` (must exist)
//! 2. `pl2py.toml` in the working directory
//! 3. built-in defaults

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use pl2py_driver::Metadata;
use pl2py_model::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LOCAL_CONFIG: &str = "pl2py.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translate: Options,
    pub front_matter: Metadata,
}

pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_in(explicit_path, Path::new("."))
}

fn load_config_in(explicit_path: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = dir.join(LOCAL_CONFIG);
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(&local_config);
    }

    debug!("No configuration file found, using default configuration");
    Ok(Config::default())
}

fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
