// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Network config discovery

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::NetworkConfig;
use crate::CniError;

const CONFIG_EXTENSIONS: &[&str] = &["conf", "json"];

#[derive(Debug, Clone)]
pub struct CniLoader {
    pub config_dir: PathBuf,
}

impl CniLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Every `*.conf` / `*.json` config in `config_dir`, sorted by file name.
    pub fn network_configs(&self) -> Result<Vec<NetworkConfig>, CniError> {
        let mut files = config_files(&self.config_dir).map_err(CniError::LoadConfig)?;
        files.sort();

        let mut configs = Vec::with_capacity(files.len());
        for path in files {
            let bytes = fs::read(&path).map_err(CniError::LoadConfig)?;
            let config = NetworkConfig::from_bytes(bytes).map_err(|source| CniError::ParseConfig {
                path: path.display().to_string(),
                source,
            })?;
            debug!(path = %path.display(), name = %config.network.name, "Loaded network config");
            configs.push(config);
        }

        Ok(configs)
    }
}

fn config_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetConf;

    fn net_conf(name: &str, plugin_type: &str) -> NetConf {
        NetConf {
            name: name.to_string(),
            plugin_type: plugin_type.to_string(),
        }
    }

    #[test]
    fn test_missing_dir() {
        let loader = CniLoader::new("/thisdoesnot/exist");

        let err = loader.network_configs().unwrap_err();

        assert!(err.to_string().starts_with("error loading config: "));
    }

    #[test]
    fn test_empty_dir() {
        let dir = tempfile::tempdir().unwrap();

        let configs = CniLoader::new(dir.path()).network_configs().unwrap();

        assert!(configs.is_empty());
    }

    #[test]
    fn test_loads_configs_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo.conf"), r#"{ "name": "mynet", "type": "bridge" }"#).unwrap();
        fs::write(dir.path().join("bar.conf"), r#"{ "name": "mynet2", "type": "vxlan" }"#).unwrap();
        fs::write(dir.path().join("README.md"), "not a config").unwrap();

        let configs = CniLoader::new(dir.path()).network_configs().unwrap();

        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].network, net_conf("mynet2", "vxlan"));
        assert_eq!(configs[1].network, net_conf("mynet", "bridge"));
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.conf"), "{").unwrap();

        let err = CniLoader::new(dir.path()).network_configs().unwrap_err();

        assert!(matches!(err, CniError::ParseConfig { .. }));
    }
}
