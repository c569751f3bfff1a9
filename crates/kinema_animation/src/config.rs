//! Default options
//!
//! Process-wide defaults are written once at configuration time and read
//! when an [`Animator`](crate::Animator) is created, which snapshots them.
//! Animators can also be configured from a TOML document:
//!
//! ```toml
//! [defaults]
//! duration = 0.5
//! ease = "powerOut(2)"
//! ```

use std::path::Path;
use std::sync::{OnceLock, RwLock};

use kinema_core::KinemaError;
use serde::Deserialize;
use thiserror::Error;

use crate::options::ControllerOptions;

static GLOBAL_DEFAULTS: OnceLock<RwLock<ControllerOptions>> = OnceLock::new();

fn global() -> &'static RwLock<ControllerOptions> {
    GLOBAL_DEFAULTS.get_or_init(|| RwLock::new(ControllerOptions::default()))
}

/// Merge `options` into the process-wide defaults
pub fn set_global_defaults(options: &ControllerOptions) {
    if let Ok(mut defaults) = global().write() {
        *defaults = defaults.merge(options);
    }
}

/// Snapshot of the process-wide defaults
pub fn global_defaults() -> ControllerOptions {
    global()
        .read()
        .map(|defaults| defaults.clone())
        .unwrap_or_default()
}

pub fn reset_global_defaults() {
    if let Ok(mut defaults) = global().write() {
        *defaults = ControllerOptions::default();
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for KinemaError {
    fn from(err: ConfigError) -> Self {
        KinemaError::Config(err.to_string())
    }
}

/// Animator configuration file
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Options layered below every controller the animator creates
    pub defaults: ControllerOptions,
}

impl AnimatorConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a configuration file; `.json` files are read as JSON, anything
    /// else as TOML
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&raw),
            _ => Self::from_toml_str(&raw),
        }
    }
}
