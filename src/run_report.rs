//! Salida de `run`: resumen en stdout y reporte JSON opcional.

use log::error;
use matrix_core::PipelineResult;
use std::fs;
use std::path::Path;

use crate::errors::AppError;

pub fn write_report(path: &Path, result: &PipelineResult) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
}

/// Escribe el reporte (si se pidió) y devuelve el código de salida de la
/// matriz. Para entonces las tuplas ya corrieron: un reporte que no se pudo
/// escribir se registra pero no cambia el código.
pub fn finish_run(result: &PipelineResult, report: Option<&Path>) -> i32 {
    if let Some(path) = report {
        if let Err(e) = write_report(path, result) {
            error!("report not written: {e}");
            eprintln!("[matrixflow] report not written: {e}");
        }
    }
    result.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_is_written_as_json() {
        let path = std::env::temp_dir().join(format!("matrixflow-report-{}.json", std::process::id()));
        assert_eq!(finish_run(&PipelineResult::new(), Some(&path)), 0);
        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&raw).unwrap()["entries"], serde_json::json!([]));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unwritable_report_is_an_error_but_keeps_exit_code() {
        let path = std::env::temp_dir().join("matrixflow-no-such-dir").join("sub").join("report.json");
        assert!(matches!(write_report(&path, &PipelineResult::new()), Err(AppError::Config(_))));
        assert_eq!(finish_run(&PipelineResult::new(), Some(&path)), 0);
    }
}
