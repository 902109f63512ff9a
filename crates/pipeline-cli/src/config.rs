//! Environment configuration and file loading.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pipeline_core::{FeatureTerrain, SearchConfig, TerrainFeatures};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// JSON `SearchConfig` overriding the engine defaults.
    pub search_config_path: Option<PathBuf>,
    /// JSON terrain description replacing the built-in sample region.
    pub terrain_path: Option<PathBuf>,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            search_config_path: lookup("PIPELINE_SEARCH_CONFIG")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            terrain_path: lookup("PIPELINE_TERRAIN_FILE")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            log_json: lookup("PIPELINE_LOG_JSON")
                .map(|s| is_truthy(&s))
                .unwrap_or(false),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Engine defaults, or the given JSON file laid over them.
pub fn load_search_config(path: Option<&Path>) -> Result<SearchConfig> {
    let Some(path) = path else {
        return Ok(SearchConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading search config {}", path.display()))?;
    let config = SearchConfig::from_json(&json)
        .with_context(|| format!("parsing search config {}", path.display()))?;
    tracing::info!("Loaded search config from {}", path.display());
    Ok(config)
}

/// The built-in sample region, or the features described in the given file.
pub fn load_terrain(path: Option<&Path>) -> Result<FeatureTerrain> {
    let Some(path) = path else {
        return Ok(FeatureTerrain::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading terrain file {}", path.display()))?;
    let features = TerrainFeatures::from_json(&json)
        .with_context(|| format!("parsing terrain file {}", path.display()))?;
    tracing::info!(
        roads = features.roads.len(),
        rivers = features.rivers.len(),
        restricted = features.restricted_zones.len(),
        "Loaded terrain from {}",
        path.display()
    );
    Ok(FeatureTerrain::new(features))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn reads_paths_and_log_format() {
        let config = Config::from_lookup(lookup(&[
            ("PIPELINE_SEARCH_CONFIG", "/etc/pipeline/search.json"),
            ("PIPELINE_TERRAIN_FILE", "terrain.json"),
            ("PIPELINE_LOG_JSON", "TRUE"),
        ]));
        assert_eq!(config.search_config_path, Some(PathBuf::from("/etc/pipeline/search.json")));
        assert_eq!(config.terrain_path, Some(PathBuf::from("terrain.json")));
        assert!(config.log_json);
    }

    #[test]
    fn unrecognised_flag_value_is_false() {
        let config = Config::from_lookup(lookup(&[("PIPELINE_LOG_JSON", "maybe"), ("PIPELINE_TERRAIN_FILE", "")]));
        assert!(!config.log_json);
        assert_eq!(config.terrain_path, None);
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        assert_eq!(load_search_config(None).expect("defaults"), SearchConfig::default());
        assert!(!load_terrain(None).expect("sample region").features().roads.is_empty());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = load_search_config(Some(Path::new("/nonexistent/search.json"))).expect_err("missing file");
        assert!(err.to_string().contains("reading search config"));
    }

    #[test]
    fn loads_search_config_file() {
        let path = env::temp_dir().join(format!("pipeline-cli-search-{}.json", std::process::id()));
        fs::write(&path, r#"{ "max_iterations": 500 }"#).expect("write temp config");
        let config = load_search_config(Some(&path));
        let _ = fs::remove_file(&path);
        let config = config.expect("parsed");
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.grid_step_deg, SearchConfig::default().grid_step_deg);
    }
}
