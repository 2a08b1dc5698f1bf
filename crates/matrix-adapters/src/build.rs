//! Build Invoker basado en un comando externo.

use log::{debug, info, warn};
use matrix_core::{Artifact, BuildInvoker, Stage, StageError, ToolchainContext};
use matrix_domain::ConfigurationTuple;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::command::{run_with_timeout, tuple_env, CommandTemplate, Placeholders};
use crate::provision::tuple_prefix;

/// Toolchain activado para un único comando.
///
/// Las variables sólo llegan al entorno del proceso hijo; el entorno del
/// proceso actual nunca se modifica. El contexto se consume al crear el guard
/// y se libera al salir de su scope, en cualquier camino.
pub struct ActivatedToolchain {
    context: ToolchainContext,
    label: String,
}

impl ActivatedToolchain {
    pub fn acquire(context: ToolchainContext, label: impl Into<String>) -> Self {
        let label = label.into();
        debug!("[{label}] activating {}", context.toolchain());
        Self { context, label }
    }

    pub fn apply(&self, cmd: &mut Command) {
        cmd.envs(self.context.variables());
    }

    pub fn toolchain(&self) -> &str {
        self.context.toolchain()
    }
}

impl Drop for ActivatedToolchain {
    fn drop(&mut self) {
        debug!("[{}] released {}", self.label, self.context.toolchain());
    }
}

pub struct CommandBuildInvoker {
    work_dir: PathBuf,
    build: CommandTemplate,
    source_dir: Option<PathBuf>,
    timeout: Duration,
}

impl CommandBuildInvoker {
    pub fn new(work_dir: impl Into<PathBuf>, build: CommandTemplate, timeout: Duration) -> Self {
        Self { work_dir: work_dir.into(),
               build,
               source_dir: None,
               timeout }
    }

    /// Directorio desde el que se lanza el build (por defecto, el actual).
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    /// Directorio del artifact de una tupla.
    pub fn artifact_dir(prefix: &Path) -> PathBuf {
        prefix.join("build")
    }
}

impl BuildInvoker for CommandBuildInvoker {
    fn build(&self, tuple: &ConfigurationTuple, context: ToolchainContext) -> Result<Artifact, StageError> {
        let prefix = tuple_prefix(&self.work_dir, tuple);
        let artifact_dir = Self::artifact_dir(&prefix);
        fs::create_dir_all(&artifact_dir).map_err(|e| StageError::Build { exit_code: None,
                                                                          output: format!("{}: {e}", artifact_dir.display()) })?;

        let activation = ActivatedToolchain::acquire(context, tuple.id().to_string());
        let vars = Placeholders::for_tuple(tuple, &prefix).with("artifact", artifact_dir.display().to_string());
        let mut cmd = self.build.to_command(&vars, self.source_dir.as_deref());
        cmd.envs(tuple_env(&tuple.id(), &prefix));
        activation.apply(&mut cmd);
        info!("[{tuple}] building with {}", activation.toolchain());

        let output = run_with_timeout(cmd, self.timeout).map_err(|e| {
                                                            e.into_stage_error(Stage::Building, |detail| StageError::Build { exit_code: None,
                                                                                                                             output: detail })
                                                        })?;
        drop(activation);

        if !output.success() {
            warn!("[{tuple}] build exited with {:?}", output.exit_code);
            return Err(StageError::Build { exit_code: output.exit_code,
                                           output: output.combined() });
        }
        Ok(Artifact { tuple: tuple.id(),
                      location: artifact_dir,
                      build_output: output.combined() })
    }
}
