// ABOUTME: Configuration types and parsing for gantry.yml.
// ABOUTME: Handles YAML parsing, discovery, and directory defaults.

mod init;
mod probe;
mod retention;

pub use init::init_config;
pub use probe::ProbeConfig;
pub use retention::RetentionConfig;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::ProjectName;

pub const CONFIG_FILENAME: &str = "gantry.yml";
pub const CONFIG_FILENAME_ALT: &str = "gantry.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".gantry/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_project_name")]
    pub project: ProjectName,

    /// Name handed to the process supervisor on restart. Defaults to the
    /// project name.
    #[serde(default)]
    pub service: Option<String>,

    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    pub probe: ProbeConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    /// Shell command run after every pointer switch. When absent the
    /// supervisor step is a no-op.
    #[serde(default)]
    pub restart_cmd: Option<String>,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".gantry/state")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(".gantry/artifacts")
}

fn deserialize_project_name<'de, D>(deserializer: D) -> std::result::Result<ProjectName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ProjectName::new(&s).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Name handed to the supervisor, falling back to the project name.
    pub fn service_name(&self) -> &str {
        self.service.as_deref().unwrap_or(self.project.as_str())
    }

    pub fn template() -> Self {
        Config {
            project: ProjectName::new("my-app").expect("template name is valid"),
            service: None,
            state_dir: default_state_dir(),
            artifacts_dir: default_artifacts_dir(),
            probe: ProbeConfig::immediate("curl -fsS http://localhost:8080/healthz"),
            retention: RetentionConfig::default(),
            restart_cmd: None,
        }
    }
}
