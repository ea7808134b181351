//! Configuration loading from nxbench.toml
//!
//! Archive paths can be specified in an `nxbench.toml` file, discovered by
//! walking up from the current directory. Everything is defaulted, so the
//! file is optional; `--archive` overrides it either way.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file name searched for in the working directory and its
/// ancestors.
pub const CONFIG_FILE: &str = "nxbench.toml";

/// nxbench configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BenchConfig {
    /// Archive paths per format.
    #[serde(default)]
    pub archives: ArchivesConfig,
}

/// Paths to the archives each library opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivesConfig {
    /// Archive opened by `renx`.
    #[serde(default = "default_nx_path")]
    pub nx: PathBuf,
    /// Archive opened by `rewz` and `ml`.
    #[serde(default = "default_wz_path")]
    pub wz: PathBuf,
}

impl Default for ArchivesConfig {
    fn default() -> Self {
        Self {
            nx: default_nx_path(),
            wz: default_wz_path(),
        }
    }
}

fn default_nx_path() -> PathBuf {
    PathBuf::from("PKG4.nx")
}

fn default_wz_path() -> PathBuf {
    PathBuf::from("PKG1.wz")
}

impl BenchConfig {
    /// Find and load `nxbench.toml`, walking up from `start`. Returns the
    /// defaults when no file exists.
    pub fn discover(start: &Path) -> anyhow::Result<Self> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let text = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("failed to read {}", candidate.display()))?;
                let config = toml::from_str(&text)
                    .with_context(|| format!("invalid {}", candidate.display()))?;
                return Ok(config);
            }
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.archives.nx, PathBuf::from("PKG4.nx"));
        assert_eq!(config.archives.wz, PathBuf::from("PKG1.wz"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: BenchConfig = toml::from_str("[archives]\nnx = \"/data/base.nx\"\n").unwrap();
        assert_eq!(config.archives.nx, PathBuf::from("/data/base.nx"));
        assert_eq!(config.archives.wz, PathBuf::from("PKG1.wz"));
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[archives]\nwz = \"deep.wz\"\n",
        )
        .unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = BenchConfig::discover(&nested).unwrap();
        assert_eq!(config.archives.wz, PathBuf::from("deep.wz"));
    }

    #[test]
    fn test_discover_without_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BenchConfig::discover(dir.path()).unwrap();
        assert_eq!(config.archives.nx, PathBuf::from("PKG4.nx"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[archives\n").unwrap();
        assert!(BenchConfig::discover(dir.path()).is_err());
    }
}
