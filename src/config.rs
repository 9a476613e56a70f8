use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub drawing: DrawingConfig,
    #[serde(default)]
    pub comments: CommentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingConfig {
    /// How many times one draw may re-sample after a candidate fails the
    /// late eligibility re-check before giving up.
    pub max_selection_attempts: u32,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            max_selection_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommentConfig {
    /// Classify donation comment language when a detector backend is
    /// compiled in. Off by default.
    #[serde(default)]
    pub detect_language: bool,
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Read the config file if present, otherwise fall back to
        // environment variables entirely.
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| AppError::ConfigError(format!("failed to parse {config_path}: {e}")))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // Without a config file the database URL must come from the
                // environment.
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    AppError::ConfigError(format!(
                        "DATABASE_URL is not set and {config_path} was not found"
                    ))
                })?;

                Config {
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    drawing: DrawingConfig {
                        max_selection_attempts: get_env_parse("DRAW_MAX_SELECTION_ATTEMPTS", 5u32),
                    },
                    comments: CommentConfig {
                        detect_language: get_env_parse("COMMENT_DETECT_LANGUAGE", false),
                    },
                }
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "failed to read {config_path}: {e}"
                )));
            }
        };

        // Environment overrides apply even when the file exists.
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("DRAW_MAX_SELECTION_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            config.drawing.max_selection_attempts = n;
        }
        if let Ok(v) = env::var("COMMENT_DETECT_LANGUAGE")
            && let Ok(b) = v.parse()
        {
            config.comments.detect_language = b;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_section_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            url = "postgres://localhost/tracker"
            max_connections = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.drawing.max_selection_attempts, 5);
        assert!(!config.comments.detect_language);
    }

    #[test]
    fn test_full_toml_round_trips() {
        let config: Config = toml::from_str(
            r#"
            [database]
            url = "postgres://localhost/tracker"
            max_connections = 20

            [drawing]
            max_selection_attempts = 8

            [comments]
            detect_language = true
            "#,
        )
        .unwrap();
        assert_eq!(config.drawing.max_selection_attempts, 8);
        assert!(config.comments.detect_language);
    }
}
