//! Archivo de matriz (JSON): tuplas, dependencias, comandos externos,
//! timeouts y toolchains adicionales.

use matrix_adapters::{CommandBuildInvoker, CommandProvisioner, CommandTemplate, CommandTestRunner, TableToolchainResolver,
                      ToolchainEntry, ToolchainTable};
use matrix_core::{StageSet, StageTimeouts};
use matrix_domain::{ConfigurationTuple, DependencySpec, EnvironmentDescriptor};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::AppError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixFile {
    pub configurations: Vec<ConfigurationTuple>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    pub commands: Commands,
    /// Checkout del proyecto: cwd de los comandos de build y test.
    /// Relativo al cwd del proceso; sin él se usa el cwd tal cual.
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    /// Resumen JSON de tests, relativo al prefijo de cada tupla.
    #[serde(default)]
    pub test_summary: Option<PathBuf>,
    #[serde(default)]
    pub timeouts: TimeoutOverrides,
    #[serde(default)]
    pub toolchains: Vec<ToolchainEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commands {
    pub install_runtime: CommandTemplate,
    pub install_package: CommandTemplate,
    pub build: CommandTemplate,
    pub test: CommandTemplate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutOverrides {
    pub provision_secs: Option<u64>,
    pub build_secs: Option<u64>,
    pub test_secs: Option<u64>,
}

impl TimeoutOverrides {
    pub fn apply(&self, base: StageTimeouts) -> StageTimeouts {
        StageTimeouts { provision: self.provision_secs.map(Duration::from_secs).unwrap_or(base.provision),
                        build: self.build_secs.map(Duration::from_secs).unwrap_or(base.build),
                        test: self.test_secs.map(Duration::from_secs).unwrap_or(base.test) }
    }
}

impl MatrixFile {
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Valida y construye el descriptor; cualquier error es fatal para la
    /// matriz completa.
    pub fn descriptor(&self) -> Result<EnvironmentDescriptor, AppError> {
        Ok(EnvironmentDescriptor::new(self.configurations.clone(), self.dependencies.clone())?)
    }

    /// Tabla fijada más las entradas del archivo (que la reemplazan).
    pub fn toolchain_table(&self) -> Result<ToolchainTable, AppError> {
        let user = ToolchainTable::from_entries(self.toolchains.clone())?;
        Ok(ToolchainTable::pinned().merged_with(&user))
    }

    /// Construye los cuatro stages. `work_dir` se vuelve absoluto para que
    /// `{prefix}` no dependa del cwd del comando.
    pub fn stage_set(&self, work_dir: &Path, timeouts: StageTimeouts) -> Result<StageSet, AppError> {
        let work_dir = absolute(work_dir)?;
        fs::create_dir_all(&work_dir)?;
        let timeouts = self.timeouts.apply(timeouts);
        let provisioner = CommandProvisioner::new(&work_dir,
                                                  self.commands.install_runtime.clone(),
                                                  self.commands.install_package.clone(),
                                                  timeouts.provision);
        let resolver = TableToolchainResolver::new(self.toolchain_table()?);
        let mut builder = CommandBuildInvoker::new(&work_dir, self.commands.build.clone(), timeouts.build);
        let mut tests = CommandTestRunner::new(&work_dir, self.commands.test.clone(), timeouts.test);
        if let Some(summary) = &self.test_summary {
            tests = tests.with_summary_file(summary);
        }
        if let Some(source) = &self.source_dir {
            let source = absolute(source)?;
            if !source.is_dir() {
                return Err(AppError::Config(format!("source_dir no existe: {}", source.display())));
            }
            builder = builder.in_dir(&source);
            tests = tests.in_dir(source);
        }
        Ok(StageSet::new(provisioner, resolver, builder, tests))
    }
}

fn absolute(path: &Path) -> Result<PathBuf, AppError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
