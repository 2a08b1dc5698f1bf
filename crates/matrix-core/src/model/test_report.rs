use serde::{Deserialize, Serialize};

/// Conteos agregados de la suite de tests de una tupla.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub passed: u32,
    pub failed: u32,
    /// Identificadores de los tests fallidos (vacío si todo pasó).
    #[serde(default)]
    pub failing: Vec<String>,
}

impl TestReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.failing.is_empty()
    }
}
