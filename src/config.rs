use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_PASSING_MARK: f64 = 10.0;
pub const DEFAULT_GRADE_SCALE: f64 = 20.0;
pub const CONFIG_ENV: &str = "GRADEBOOKD_CONFIG";

/// How term rows are matched to students when building annual results and
/// student reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StudentJoin {
    /// Match on display name. Two students sharing a name collide.
    #[default]
    DisplayName,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineConfig {
    pub passing_mark: f64,
    pub grade_scale: f64,
    pub student_join: StudentJoin,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            passing_mark: DEFAULT_PASSING_MARK,
            grade_scale: DEFAULT_GRADE_SCALE,
            student_join: StudentJoin::DisplayName,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("gradeScale must be a positive number")]
    BadScale,
    #[error("passingMark must be within 0..=gradeScale")]
    BadPassingMark,
    #[error("{0}")]
    BadPatch(String),
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grade_scale.is_finite() || self.grade_scale <= 0.0 {
            return Err(ConfigError::BadScale);
        }
        if !self.passing_mark.is_finite()
            || self.passing_mark < 0.0
            || self.passing_mark > self.grade_scale
        {
            return Err(ConfigError::BadPassingMark);
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: EngineConfig = toml::from_str(text).context("parse engine config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Startup config: the file named by `GRADEBOOKD_CONFIG` if it parses,
    /// defaults otherwise.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        let path = std::path::PathBuf::from(path);
        match Self::load(&path) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "loaded engine config");
                cfg
            }
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::warn!(path = %path.display(), error = %reason, "ignoring engine config");
                Self::default()
            }
        }
    }

    /// Applies a partial camelCase patch. Nothing changes unless the merged
    /// result validates.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>) -> Result<(), ConfigError> {
        let mut merged = serde_json::to_value(*self)
            .map_err(|e| ConfigError::BadPatch(e.to_string()))?;
        let Some(obj) = merged.as_object_mut() else {
            return Err(ConfigError::BadPatch("config must be an object".into()));
        };
        for (k, v) in patch {
            if !obj.contains_key(k) {
                return Err(ConfigError::BadPatch(format!("unknown config field: {}", k)));
            }
            obj.insert(k.clone(), v.clone());
        }
        let next: EngineConfig =
            serde_json::from_value(merged).map_err(|e| ConfigError::BadPatch(e.to_string()))?;
        next.validate()?;
        *self = next;
        Ok(())
    }
}
