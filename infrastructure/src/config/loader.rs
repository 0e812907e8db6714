//! Configuration file loader with multi-source merging

use super::file_config::{ConfigValidationError, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const PROJECT_FILES: [&str; 2] = ["warden.toml", ".warden.toml"];

/// Environment prefix; `WARDEN_CONFIRMATION__MODE=auto_approve` sets
/// `confirmation.mode`.
const ENV_PREFIX: &str = "WARDEN_";

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] Box<figment::Error>),

    #[error(transparent)]
    Invalid(#[from] ConfigValidationError),
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. `WARDEN_*` environment variables
    /// 2. Explicit config path (if provided; must exist)
    /// 3. Project root: `./warden.toml` or `./.warden.toml`
    /// 4. Global: `<config dir>/warden/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let mut sources: Vec<PathBuf> = Vec::new();
        if let Some(global) = Self::global_config_path().filter(|p| p.exists()) {
            sources.push(global);
        }
        if let Some(project) = Self::project_config_path() {
            sources.push(project);
        }
        if let Some(path) = config_path {
            sources.push(path.to_path_buf());
        }

        let config: FileConfig = Self::figment(&sources)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate only the given files, in increasing priority.
    pub fn load_files(paths: &[PathBuf]) -> Result<FileConfig, ConfigError> {
        let config: FileConfig = Self::figment(paths).extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn figment(paths: &[PathBuf]) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        for path in paths {
            debug!(path = %path.display(), "Merging config file");
            figment = figment.merge(Toml::file(path));
        }
        figment
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Global config file path (`$XDG_CONFIG_HOME/warden/config.toml` on
    /// Linux), whether or not it exists.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("warden").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&Path>) {
        println!("Configuration sources (in priority order):");

        if let Some(path) = config_path {
            let marker = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:<7}] Explicit: {}", marker, path.display());
        }

        match Self::project_config_path() {
            Some(path) => println!("  [FOUND  ] Project:  {}", path.display()),
            None => println!("  [       ] Project:  ./warden.toml or ./.warden.toml"),
        }

        if let Some(path) = Self::global_config_path() {
            let marker = if path.exists() { "FOUND" } else { "" };
            println!("  [{:<7}] Global:   {}", marker, path.display());
        }

        println!("  [       ] Default:  built-in defaults");
    }
}
