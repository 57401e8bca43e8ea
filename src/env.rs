use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://tutoria.db";
const CONFIG_FILE: &str = "config.json";

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

/// What to do when one step of a multi-step write or composed read fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubStepPolicy {
    Abort,
    #[default]
    SkipAndLog,
}

impl SubStepPolicy {
    /// Returns the error under `Abort`, logs and swallows it under `SkipAndLog`.
    pub fn handle(self, err: AppError, step: &str) -> Result<(), AppError> {
        match self {
            SubStepPolicy::Abort => Err(err),
            SubStepPolicy::SkipAndLog => {
                warn!(error = %err, step = %step, "Sub-step failed, skipping");
                Ok(())
            }
        }
    }
}

impl FromStr for SubStepPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(SubStepPolicy::Abort),
            "skip" | "skip-and-log" => Ok(SubStepPolicy::SkipAndLog),
            other => Err(AppError::Internal(format!(
                "Unknown sub-step failure policy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SubStepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubStepPolicy::Abort => write!(f, "abort"),
            SubStepPolicy::SkipAndLog => write!(f, "skip-and-log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub substep_policy: SubStepPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            substep_policy: SubStepPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = match dotenvy::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => database_url_from_config_file(Path::new(CONFIG_FILE))?
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        };

        let substep_policy = match dotenvy::var("SUBSTEP_FAILURE_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => SubStepPolicy::default(),
        };

        Ok(Self {
            database_url,
            substep_policy,
        })
    }
}

/// Reads the `db_url` key of a JSON config file, if the file exists.
pub fn database_url_from_config_file(path: &Path) -> Result<Option<String>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let data = std::fs::read_to_string(path)
        .map_err(|e| AppError::Internal(format!("Error reading {}: {}", path.display(), e)))?;
    let config: serde_json::Value = serde_json::from_str(&data)
        .map_err(|e| AppError::Internal(format!("Error parsing {}: {}", path.display(), e)))?;

    Ok(config
        .get("db_url")
        .and_then(|v| v.as_str())
        .map(String::from))
}
