// error.rs — error types for mesh construction and configuration

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PanoramaError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum PanoramaError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_display() {
        let err = PanoramaError::InvalidParameter("divisions must be even, got 5".into());
        assert_eq!(err.to_string(), "invalid parameter: divisions must be even, got 5");
    }

    #[test]
    fn config_error_converts() {
        let err: PanoramaError = ConfigError::Validation("inertia out of range".into()).into();
        assert!(matches!(err, PanoramaError::Config(ConfigError::Validation(_))));
        assert!(err.to_string().contains("inertia out of range"));
    }

    #[test]
    fn parse_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(err.to_string().starts_with("config parse error"));
    }
}
