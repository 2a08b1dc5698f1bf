use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Límite de tiempo de cada llamada externa. `Resolving` no ejecuta nada
/// externo y no tiene límite propio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimeouts {
    pub provision: Duration,
    pub build: Duration,
    pub test: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self { provision: Duration::from_secs(900),
               build: Duration::from_secs(1800),
               test: Duration::from_secs(1800) }
    }
}
