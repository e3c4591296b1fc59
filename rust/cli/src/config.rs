//! Series configuration loading.
//!
//! A file is parsed as TOML or JSON by extension, then environment
//! overrides are applied on top:
//!
//! - `GREENBENCH_SEEDS`: comma-separated seed list
//! - `GREENBENCH_DECISION_MS`: per-decision budget in milliseconds

use std::fs;
use std::path::Path;

use greenbench_engine::runner::SeriesConfig;
use serde::Serialize;

pub const ENV_SEEDS: &str = "GREENBENCH_SEEDS";
pub const ENV_DECISION_MS: &str = "GREENBENCH_DECISION_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    File,
    Env,
}

/// Where the overridable fields came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSources {
    pub seeds: ValueSource,
    pub decision_ms: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            seeds: ValueSource::File,
            decision_ms: ValueSource::File,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: SeriesConfig,
    pub sources: ConfigSources,
}

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<toml::de::Error> for LoadError {
    fn from(e: toml::de::Error) -> Self {
        LoadError::Toml(e)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Json(e)
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "cannot read config: {}", e),
            LoadError::Toml(e) => write!(f, "invalid TOML: {}", e),
            LoadError::Json(e) => write!(f, "invalid JSON: {}", e),
            LoadError::Invalid(msg) => f.write_str(msg),
        }
    }
}

impl From<LoadError> for crate::error::CliError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::Io(io) => crate::error::CliError::Io(io),
            other => crate::error::CliError::Config(other.to_string()),
        }
    }
}

/// Parses `text` as TOML unless `path` ends in `.json`.
pub fn parse_series_config(path: &Path, text: &str) -> Result<SeriesConfig, LoadError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(toml::from_str(text)?)
    }
}

/// Loads `path` and applies the process environment.
pub fn load_with_sources(path: &Path) -> Result<ConfigResolved, LoadError> {
    let text = fs::read_to_string(path)?;
    let config = parse_series_config(path, &text)?;
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Applies overrides read through `lookup`. Empty values are ignored.
pub fn apply_overrides<F>(mut config: SeriesConfig, lookup: F) -> Result<ConfigResolved, LoadError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut sources = ConfigSources::default();

    if let Some(raw) = lookup(ENV_SEEDS)
        && !raw.trim().is_empty()
    {
        config.seeds = parse_seed_list(&raw)?;
        sources.seeds = ValueSource::Env;
    }
    if let Some(raw) = lookup(ENV_DECISION_MS)
        && !raw.trim().is_empty()
    {
        config.decision_ms = raw
            .trim()
            .parse()
            .map_err(|_| LoadError::Invalid(format!("{} must be an integer", ENV_DECISION_MS)))?;
        sources.decision_ms = ValueSource::Env;
    }

    Ok(ConfigResolved { config, sources })
}

pub fn parse_seed_list(raw: &str) -> Result<Vec<u64>, LoadError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| LoadError::Invalid(format!("invalid seed {:?} in {}", s, ENV_SEEDS)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const TOML: &str = r#"
mode = "hu"
seeds = [1, 2]
hands_per_seed = 10
replicas = 2
blinds = { sb = 50, bb = 100 }

[opponent_mix]
"tag-hu" = 1.0
"#;

    #[test]
    fn toml_defaults_fill_optional_fields() {
        let cfg = parse_series_config(&PathBuf::from("series.toml"), TOML).unwrap();
        assert_eq!(cfg.seeds, vec![1, 2]);
        assert_eq!(cfg.stacks_bb, 100);
        assert_eq!(cfg.decision_ms, 60_000);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let cfg = parse_series_config(&PathBuf::from("series.toml"), TOML).unwrap();
        let resolved = apply_overrides(cfg, |key| match key {
            ENV_SEEDS => Some("7, 8,9".into()),
            ENV_DECISION_MS => Some("250".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(resolved.config.seeds, vec![7, 8, 9]);
        assert_eq!(resolved.config.decision_ms, 250);
        assert_eq!(resolved.sources.seeds, ValueSource::Env);
    }

    #[test]
    fn bad_override_is_rejected() {
        let cfg = parse_series_config(&PathBuf::from("series.toml"), TOML).unwrap();
        let err = apply_overrides(cfg, |key| (key == ENV_SEEDS).then(|| "1,x".to_string()));
        assert!(matches!(err, Err(LoadError::Invalid(_))));
    }
}
