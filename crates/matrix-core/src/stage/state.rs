use serde::{Deserialize, Serialize};
use std::fmt;

use super::Stage;
use crate::errors::StageError;

/// Estado de la máquina por tupla:
/// `Pending → Provisioning → Resolving → Building → Testing → {Succeeded | Failed(stage, reason)}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TupleState {
    Pending,
    Running(Stage),
    Succeeded,
    Failed { stage: Stage, reason: StageError },
}

impl TupleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TupleState::Succeeded | TupleState::Failed { .. })
    }

    /// Transición al stage siguiente. Sólo se avanza de forma lineal: desde
    /// `Pending` al primer stage y desde cada stage al inmediatamente
    /// posterior; tras `Testing` la tupla termina en `Succeeded`.
    pub fn advance(&self) -> Result<TupleState, StageError> {
        match self {
            TupleState::Pending => Ok(TupleState::Running(Stage::Provisioning)),
            TupleState::Running(stage) => Ok(stage.next().map(TupleState::Running).unwrap_or(TupleState::Succeeded)),
            terminal => Err(StageError::Internal(format!("cannot advance terminal state {terminal}"))),
        }
    }

    /// Registra el fallo del stage en curso. Desde `Pending` sólo se admite la
    /// cancelación (se atribuye al primer stage).
    pub fn fail(&self, reason: StageError) -> Result<TupleState, StageError> {
        match self {
            TupleState::Running(stage) => Ok(TupleState::Failed { stage: *stage, reason }),
            TupleState::Pending if reason == StageError::Cancelled => {
                Ok(TupleState::Failed { stage: Stage::Provisioning, reason })
            }
            other => Err(StageError::Internal(format!("cannot fail from state {other}"))),
        }
    }
}

impl fmt::Display for TupleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TupleState::Pending => f.write_str("Pending"),
            TupleState::Running(s) => write!(f, "{s}"),
            TupleState::Succeeded => f.write_str("Succeeded"),
            TupleState::Failed { stage, reason } => write!(f, "Failed({stage}, {})", reason.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_walk_ends_in_succeeded() {
        let mut s = TupleState::Pending;
        let mut seen = vec![];
        while !s.is_terminal() {
            s = s.advance().unwrap();
            seen.push(s.to_string());
        }
        assert_eq!(seen, vec!["Provisioning", "Resolving", "Building", "Testing", "Succeeded"]);
        assert!(s.advance().is_err());
    }

    #[test]
    fn fail_records_current_stage() {
        let s = TupleState::Running(Stage::Resolving);
        let f = s.fail(StageError::UnsupportedConfiguration { runtime_version: "3.9".into(),
                                                              architecture: 64 })
                 .unwrap();
        assert_eq!(f.to_string(), "Failed(Resolving, UnsupportedConfiguration)");
        assert!(TupleState::Succeeded.fail(StageError::Cancelled).is_err());
        assert!(TupleState::Pending.fail(StageError::Internal("x".into())).is_err());
    }
}
