use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{StudyAccession, parse_hold_date};
use crate::error::EnaError;

pub const DEFAULT_CONFIG_FILE: &str = "ena-sub.json";

/// Optional per-project defaults; command-line flags always win.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub study: Option<String>,
    #[serde(default)]
    pub checklist: Option<String>,
    #[serde(default)]
    pub hold_until: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub study: Option<StudyAccession>,
    pub checklist: Option<String>,
    pub hold_until: Option<NaiveDate>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `ena-sub.json` from the working directory, or the explicit path
    /// when given. A missing default file yields empty defaults; a missing
    /// explicit file is an error.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, EnaError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| EnaError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| EnaError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, EnaError> {
        let study = config
            .study
            .map(|value| value.parse::<StudyAccession>())
            .transpose()?;
        let hold_until = config
            .hold_until
            .as_deref()
            .map(parse_hold_date)
            .transpose()?;

        Ok(ResolvedConfig {
            study,
            checklist: config.checklist,
            hold_until,
        })
    }
}
