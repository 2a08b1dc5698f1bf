//! Provisioner basado en comandos externos.
//!
//! Instala primero el intérprete de la tupla y luego cada dependencia
//! aplicable, en el orden declarado. Lo que converge se anota en
//! `<work_dir>/<slug>/installed.json`; una segunda ejecución salta lo anotado.

use log::{debug, info, warn};
use matrix_core::{Provisioner, Stage, StageError};
use matrix_domain::{ConfigurationTuple, DependencySpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{run_with_timeout, tuple_env, CommandTemplate, Placeholders};

pub const MANIFEST_FILE: &str = "installed.json";

/// Registro de lo instalado en el prefijo de una tupla.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallManifest {
    pub runtime: Option<String>,
    #[serde(default)]
    pub packages: Vec<String>,
}

impl InstallManifest {
    /// Lee el manifest; un archivo ausente equivale a un prefijo vacío.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(std::io::Error::other),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let raw = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, raw)
    }

    pub fn has_package(&self, spec: &str) -> bool {
        self.packages.iter().any(|p| p == spec)
    }
}

/// Directorio de trabajo de una tupla.
pub fn tuple_prefix(work_dir: &Path, tuple: &ConfigurationTuple) -> PathBuf {
    work_dir.join(tuple.id().slug())
}

pub struct CommandProvisioner {
    work_dir: PathBuf,
    install_runtime: CommandTemplate,
    install_package: CommandTemplate,
    timeout: Duration,
}

impl CommandProvisioner {
    pub fn new(work_dir: impl Into<PathBuf>,
               install_runtime: CommandTemplate,
               install_package: CommandTemplate,
               timeout: Duration)
               -> Self {
        Self { work_dir: work_dir.into(),
               install_runtime,
               install_package,
               timeout }
    }

    fn exec(&self,
            template: &CommandTemplate,
            vars: &Placeholders,
            tuple: &ConfigurationTuple,
            prefix: &Path,
            dependency: &str)
            -> Result<(), StageError> {
        let fail = |detail: String| StageError::Provision { tuple: tuple.id().to_string(),
                                                             dependency: dependency.to_string(),
                                                             detail };
        let mut cmd = template.to_command(vars, Some(prefix));
        cmd.envs(tuple_env(&tuple.id(), prefix));
        let output = run_with_timeout(cmd, self.timeout).map_err(|e| e.into_stage_error(Stage::Provisioning, fail))?;
        if output.success() {
            Ok(())
        } else {
            let code = output.exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
            Err(fail(format!("exit {code}: {}", output.combined().trim_end())))
        }
    }
}

impl Provisioner for CommandProvisioner {
    fn provision(&self, tuple: &ConfigurationTuple, deps: &[DependencySpec]) -> Result<(), StageError> {
        let prefix = tuple_prefix(&self.work_dir, tuple);
        let manifest_path = prefix.join(MANIFEST_FILE);
        let io_fail = |what: &str, e: std::io::Error| StageError::Provision { tuple: tuple.id().to_string(),
                                                                              dependency: what.to_string(),
                                                                              detail: e.to_string() };
        fs::create_dir_all(&prefix).map_err(|e| io_fail("<prefix>", e))?;
        let mut manifest = InstallManifest::load(&manifest_path).map_err(|e| io_fail(MANIFEST_FILE, e))?;
        let base = Placeholders::for_tuple(tuple, &prefix);

        let runtime = tuple.runtime_version().to_string();
        if manifest.runtime.as_deref() == Some(runtime.as_str()) {
            debug!("[{tuple}] runtime {runtime} already present");
        } else {
            info!("[{tuple}] installing runtime {runtime}");
            self.exec(&self.install_runtime, &base, tuple, &prefix, &format!("runtime {runtime}"))
                .inspect_err(|e| warn!("[{tuple}] {e}"))?;
            manifest.runtime = Some(runtime);
            manifest.save(&manifest_path).map_err(|e| io_fail(MANIFEST_FILE, e))?;
        }

        for dep in deps.iter().filter(|d| d.applies_to(tuple)) {
            let spec = dep.install_spec();
            if manifest.has_package(&spec) {
                debug!("[{tuple}] {spec} already installed");
                continue;
            }
            info!("[{tuple}] installing {spec}");
            let vars = base.clone()
                           .with("name", dep.name.as_str())
                           .with("requirement", dep.requirement.clone().unwrap_or_default())
                           .with("spec", spec.as_str());
            self.exec(&self.install_package, &vars, tuple, &prefix, &dep.name)
                .inspect_err(|e| warn!("[{tuple}] {e}"))?;
            manifest.packages.push(spec);
            manifest.save(&manifest_path).map_err(|e| io_fail(MANIFEST_FILE, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manifest_is_empty() {
        let path = std::env::temp_dir().join(format!("no-such-{}", std::process::id())).join(MANIFEST_FILE);
        assert_eq!(InstallManifest::load(&path).unwrap(), InstallManifest::default());
    }

    #[test]
    fn manifest_deserializes_without_packages() {
        let m: InstallManifest = serde_json::from_str(r#"{"runtime":"2.7"}"#).unwrap();
        assert_eq!(m.runtime.as_deref(), Some("2.7"));
        assert!(!m.has_package("numpy"));
    }
}
