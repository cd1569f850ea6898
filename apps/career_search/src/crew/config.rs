use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// One entry of `configs/agents.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

/// One entry of `configs/tasks.yml`. Either field may carry `{query}` / `{output_schema}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub description: String,
    pub expected_output: String,
}

/// Loads a YAML mapping of identifier → entry. Not cached; every caller reads the file.
pub fn load_config<T: DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<HashMap<String, T>, AppError> {
    let path = path.as_ref();
    let load_error = |reason: String| AppError::ConfigLoad {
        path: path.display().to_string(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    serde_yaml::from_str(&raw).map_err(|e| load_error(e.to_string()))
}
