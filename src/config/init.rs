// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates gantry.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ProjectName;

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, project: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let name = match project {
        Some(p) => ProjectName::new(p).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => ProjectName::new("my-app").expect("default name is valid"),
    };

    std::fs::write(&config_path, generate_template_yaml(&name))?;
    Ok(())
}

fn generate_template_yaml(project: &ProjectName) -> String {
    format!(
        r#"project: {project}
# service: {project}.service   # supervisor unit, defaults to the project name
state_dir: .gantry/state
artifacts_dir: .gantry/artifacts
probe:
  cmd: curl -fsS http://localhost:8080/healthz
  interval: 10s
  timeout: 5s
  retries: 3
  # start_period: 30s
  verify_timeout: 2m
retention:
  keep_count: 3
# restart_cmd: systemctl restart {project}.service
"#
    )
}
