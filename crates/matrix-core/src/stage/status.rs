use serde::Serialize;

/// Estado de un stage dentro de la ejecución de una tupla.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running`
/// - `Running` -> `FinishedOk`
/// - `Running` -> `Failed`
/// - `Pending` -> `Skipped` (un stage previo falló o se canceló)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageStatus {
    Pending,
    Running,
    FinishedOk,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StageStatus::FinishedOk | StageStatus::Failed | StageStatus::Skipped)
    }
}
