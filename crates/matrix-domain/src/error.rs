use thiserror::Error;

/// Errores del dominio de la matriz (descriptor, tuplas, dependencias).
///
/// Todos son fatales para el pipeline completo: se detectan antes de que
/// empiece cualquier tupla.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Error de validación: {0}")]
    Validation(String),

    #[error("Tupla duplicada en el descriptor: {0}")]
    DuplicateTuple(String),
}
