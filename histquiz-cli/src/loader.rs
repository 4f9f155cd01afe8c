//! File-system data loading for the terminal front end.
use anyhow::{Context, Result};
use histquiz_game::{
    BundledLoader, DataError, DataLoader, EngineConfig, ScenarioData, SemanticNetwork,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Data {
        path: PathBuf,
        #[source]
        source: DataError,
    },
}

fn read(path: &Path) -> Result<String, LoaderError> {
    fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads scenario and network JSON from disk, falling back to the bundled
/// assets for any path left unset.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    scenario: Option<PathBuf>,
    network: Option<PathBuf>,
    skip_network: bool,
}

impl FsLoader {
    #[must_use]
    pub const fn new(scenario: Option<PathBuf>, network: Option<PathBuf>) -> Self {
        Self {
            scenario,
            network,
            skip_network: false,
        }
    }

    /// Do not load any semantic network, bundled or otherwise.
    #[must_use]
    pub const fn without_network(mut self) -> Self {
        self.skip_network = true;
        self
    }

    pub fn describe(&self) -> String {
        let scenario = self
            .scenario
            .as_ref()
            .map_or_else(|| "bundled".to_string(), |p| p.display().to_string());
        let network = if self.skip_network {
            "none".to_string()
        } else {
            self.network
                .as_ref()
                .map_or_else(|| "bundled".to_string(), |p| p.display().to_string())
        };
        format!("scenario: {scenario}, network: {network}")
    }
}

impl DataLoader for FsLoader {
    type Error = LoaderError;

    fn load_scenario_data(&self) -> Result<ScenarioData, Self::Error> {
        let Some(path) = &self.scenario else {
            return BundledLoader
                .load_scenario_data()
                .map_err(|source| LoaderError::Data {
                    path: PathBuf::from("<bundled scenario>"),
                    source,
                });
        };
        log::debug!("loading scenario data from {}", path.display());
        ScenarioData::from_json(&read(path)?).map_err(|source| LoaderError::Data {
            path: path.clone(),
            source,
        })
    }

    fn load_network_data(&self) -> Result<Option<SemanticNetwork>, Self::Error> {
        if self.skip_network {
            return Ok(None);
        }
        let Some(path) = &self.network else {
            return BundledLoader
                .load_network_data()
                .map_err(|source| LoaderError::Data {
                    path: PathBuf::from("<bundled network>"),
                    source,
                });
        };
        log::debug!("loading semantic network from {}", path.display());
        SemanticNetwork::from_json(&read(path)?)
            .map(Some)
            .map_err(|source| LoaderError::Data {
                path: path.clone(),
                source,
            })
    }
}

/// Load an engine config file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "histquiz-{label}-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn falls_back_to_bundled_assets() {
        let loader = FsLoader::default();
        let scenario = loader.load_scenario_data().unwrap();
        assert!(scenario.nodes.iter().any(|node| node.id == "start"));
        assert!(loader.load_network_data().unwrap().is_some());
        assert!(
            FsLoader::default()
                .without_network()
                .load_network_data()
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn reads_scenario_from_disk() {
        let path = temp_file(
            "scenario",
            r#"{ "nodes": [ { "id": "start", "description": "d", "choices": [] } ] }"#,
        );
        let loader = FsLoader::new(Some(path), None);
        assert_eq!(loader.load_scenario_data().unwrap().nodes.len(), 1);
    }

    #[test]
    fn reports_missing_and_malformed_files() {
        let missing = FsLoader::new(Some(PathBuf::from("/definitely/not/here.json")), None);
        assert!(matches!(
            missing.load_scenario_data(),
            Err(LoaderError::Io { .. })
        ));

        let path = temp_file("broken", r#"{ "nodes": "nope" }"#);
        let broken = FsLoader::new(Some(path), None);
        assert!(matches!(
            broken.load_scenario_data(),
            Err(LoaderError::Data { .. })
        ));
    }

    #[test]
    fn config_defaults_without_path() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
        let path = temp_file("config", r#"{ "advance_delay_ms": 10 }"#);
        assert_eq!(load_config(Some(&path)).unwrap().advance_delay_ms, 10);
    }
}
