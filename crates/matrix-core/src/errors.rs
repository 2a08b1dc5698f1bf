//! Taxonomía de errores de stage.
//!
//! Todos los errores son locales a una tupla: se registran en su
//! `PipelineEntry` y nunca abortan tuplas hermanas.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stage::Stage;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StageError {
    #[error("no toolchain mapping for runtime {runtime_version} ({architecture}-bit)")]
    UnsupportedConfiguration { runtime_version: String, architecture: u32 },
    #[error("provisioning {tuple} failed on '{dependency}': {detail}")]
    Provision { tuple: String, dependency: String, detail: String },
    #[error("build failed (exit code {exit_code:?})")]
    Build { exit_code: Option<i32>, output: String },
    #[error("{} test(s) failed", failing.len().max(1))]
    Test { failing: Vec<String>, output: String },
    #[error("{stage} exceeded its {limit_ms}ms timeout")]
    Timeout { stage: Stage, limit_ms: u64 },
    #[error("cancelled before stage started")]
    Cancelled,
    #[error("internal: {0}")]
    Internal(String),
}

impl StageError {
    /// Etiqueta corta para la tabla resumen.
    pub fn label(&self) -> &'static str {
        match self {
            StageError::UnsupportedConfiguration { .. } => "UnsupportedConfiguration",
            StageError::Provision { .. } => "ProvisionError",
            StageError::Build { .. } => "BuildError",
            StageError::Test { .. } => "TestError",
            StageError::Timeout { .. } => "Timeout",
            StageError::Cancelled => "Cancelled",
            StageError::Internal(_) => "Internal",
        }
    }
}
