//! Test Runner basado en un comando externo.
//!
//! El resumen de la suite sale, por prioridad, de un JSON
//! `{ "passed", "failed", "failing" }` escrito por el comando en la ruta
//! configurada, o de las líneas `FAILED <id>` / `PASSED <id>` de stdout.

use log::{info, warn};
use matrix_core::{Artifact, Stage, StageError, TestReport, TestRunner};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{run_with_timeout, tuple_env, CommandTemplate, Placeholders};

pub struct CommandTestRunner {
    work_dir: PathBuf,
    test: CommandTemplate,
    summary_file: Option<PathBuf>,
    source_dir: Option<PathBuf>,
    timeout: Duration,
}

impl CommandTestRunner {
    pub fn new(work_dir: impl Into<PathBuf>, test: CommandTemplate, timeout: Duration) -> Self {
        Self { work_dir: work_dir.into(),
               test,
               summary_file: None,
               source_dir: None,
               timeout }
    }

    /// Ruta del resumen JSON, relativa al prefijo de la tupla.
    pub fn with_summary_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_file = Some(path.into());
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    fn read_summary(&self, prefix: &Path) -> Option<TestReport> {
        let path = prefix.join(self.summary_file.as_ref()?);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("ignoring malformed test summary {}: {e}", path.display());
                None
            }
        }
    }
}

/// Cuenta las líneas `PASSED <id>` y recoge los ids de `FAILED <id>`.
pub fn parse_stdout_summary(stdout: &str) -> TestReport {
    let mut report = TestReport::default();
    for line in stdout.lines().map(str::trim) {
        if let Some(id) = line.strip_prefix("FAILED ") {
            report.failing.push(id.trim().to_string());
            report.failed += 1;
        } else if line.starts_with("PASSED ") {
            report.passed += 1;
        }
    }
    report
}

impl TestRunner for CommandTestRunner {
    fn run_tests(&self, artifact: &Artifact) -> Result<TestReport, StageError> {
        let prefix = self.work_dir.join(artifact.tuple.slug());
        if let Some(summary) = &self.summary_file {
            // Un resumen viejo de otra corrida no debe contar.
            let _ = fs::remove_file(prefix.join(summary));
        }
        let vars = Placeholders::for_id(&artifact.tuple, &prefix).with("artifact", artifact.location.display().to_string());
        let mut cmd = self.test.to_command(&vars, self.source_dir.as_deref());
        cmd.envs(tuple_env(&artifact.tuple, &prefix));
        cmd.env("MATRIX_ARTIFACT", &artifact.location);
        info!("[{}] running tests", artifact.tuple);

        let output = run_with_timeout(cmd, self.timeout).map_err(|e| {
                                                            e.into_stage_error(Stage::Testing, |detail| StageError::Test { failing: vec![],
                                                                                                                           output: detail })
                                                        })?;
        let report = self.read_summary(&prefix).unwrap_or_else(|| parse_stdout_summary(&output.stdout));

        if !output.success() || !report.is_success() {
            warn!("[{}] {} test(s) failed (exit {:?})", artifact.tuple, report.failed, output.exit_code);
            return Err(StageError::Test { failing: report.failing,
                                          output: output.combined() });
        }
        Ok(report)
    }
}
