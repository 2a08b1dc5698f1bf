use matrix_domain::TupleId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resultado de un build exitoso: dónde quedó el árbol compilado y la salida
/// capturada del comando.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub tuple: TupleId,
    pub location: PathBuf,
    pub build_output: String,
}
