//! Server configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use matpack_core::{Error, Result};

/// Default location of the read-only simulation data root.
pub const DEFAULT_DATA_ROOT: &str = "/data/ML/big-data-full";

/// Configuration for the Matpack API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server port.
    pub http_port: u16,

    /// Enable debug mode (pretty logs, relaxed validation).
    pub debug: bool,

    /// Read-only simulation data root gating scheduling and downloads.
    pub data_root: PathBuf,

    /// Path of the persisted registry JSON file.
    pub registry_path: PathBuf,

    /// Directory for archive staging and finished ZIP files.
    pub staging_root: PathBuf,

    /// Seconds after which a scheduled phase reports DONE.
    pub status_threshold_secs: i64,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            debug: false,
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            registry_path: PathBuf::from("/var/lib/matpack/registry.json"),
            staging_root: std::env::temp_dir().join("matpack-staging"),
            status_threshold_secs: matpack_data::DEFAULT_STATUS_THRESHOLD_SECS,
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. `["*"]` allows any origin (debug only).
    pub allowed_origins: Vec<String>,
    /// Preflight cache max age in seconds.
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
        }
    }
}

impl Config {
    /// Loads configuration from `MATPACK_*` environment variables, starting
    /// from defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable is present but cannot be
    /// parsed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = env_u16("MATPACK_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(debug) = env_bool("MATPACK_DEBUG")? {
            config.debug = debug;
        }
        if let Some(root) = env_string("MATPACK_DATA_ROOT") {
            config.data_root = PathBuf::from(root);
        }
        if let Some(path) = env_string("MATPACK_REGISTRY_PATH") {
            config.registry_path = PathBuf::from(path);
        }
        if let Some(root) = env_string("MATPACK_STAGING_ROOT") {
            config.staging_root = PathBuf::from(root);
        }
        if let Some(secs) = env_i64("MATPACK_STATUS_THRESHOLD_SECS")? {
            if secs <= 0 {
                return Err(Error::InvalidInput(
                    "MATPACK_STATUS_THRESHOLD_SECS must be greater than 0".to_string(),
                ));
            }
            config.status_threshold_secs = secs;
        }
        if let Some(origins) = env_string("MATPACK_CORS_ALLOWED_ORIGINS") {
            config.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(max_age) = env_u64("MATPACK_CORS_MAX_AGE_SECONDS")? {
            config.cors.max_age_seconds = max_age;
        }

        Ok(config)
    }

    /// Validates configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if a production (non-debug) configuration points at a
    /// missing data root or allows wildcard CORS.
    pub fn validate(&self) -> Result<()> {
        // Enforce "no wildcard in production" for CORS.
        if !self.debug
            && self
                .cors
                .allowed_origins
                .iter()
                .any(|origin| origin == "*")
        {
            return Err(Error::InvalidInput(
                "cors.allowed_origins cannot include '*' when debug=false".to_string(),
            ));
        }

        if !self.debug && !self.data_root.is_dir() {
            return Err(Error::InvalidInput(format!(
                "data_root does not exist: {} (required when debug=false)",
                self.data_root.display()
            )));
        }

        if self.status_threshold_secs <= 0 {
            return Err(Error::InvalidInput(
                "status_threshold_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u16(name: &str) -> Result<Option<u16>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u16>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u16: {e}")))
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u64>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u64: {e}")))
}

fn env_i64(name: &str) -> Result<Option<i64>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<i64>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be an i64: {e}")))
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(Some(true)),
        "false" | "0" | "no" | "n" => Ok(Some(false)),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http_port, 8080);
        assert!(!config.debug);
        assert_eq!(config.data_root, PathBuf::from(DEFAULT_DATA_ROOT));
        assert_eq!(config.status_threshold_secs, 300);
        assert!(config.cors.allowed_origins.is_empty());
    }

    #[test]
    fn test_validate_rejects_wildcard_cors_in_prod() {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            debug: false,
            data_root: root.path().to_path_buf(),
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
                max_age_seconds: 3600,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_allows_wildcard_cors_in_debug() {
        let config = Config {
            debug: true,
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
                max_age_seconds: 3600,
            },
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_data_root_in_prod() {
        let config = Config {
            debug: false,
            data_root: PathBuf::from("/definitely/not/a/real/path"),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
