use matrix_domain::DomainError;
use thiserror::Error;

/// Errores fatales de la aplicación: impiden empezar la matriz.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Archivo de matriz inválido: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Descriptor inválido: {0}")]
    Domain(#[from] DomainError),
    #[error("Uso incorrecto: {0}")]
    Usage(String),
}

impl AppError {
    /// Código de salida para errores que ocurren antes de ejecutar tuplas.
    pub const EXIT_CODE: i32 = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_variant_format() {
        let err = AppError::Config("MATRIXFLOW_JOBS".into());
        assert_eq!(err.to_string(), "Error de configuración: MATRIXFLOW_JOBS");
    }

    #[test]
    fn test_io_variant_from() {
        let io_err = std::io::Error::other("falló IO");
        let err: AppError = io_err.into();
        assert_eq!(err.to_string(), "Error en IO: falló IO");
    }

    #[test]
    fn test_domain_variant_from() {
        let err: AppError = DomainError::DuplicateTuple("2.7-32".into()).into();
        assert_eq!(err.to_string(), "Descriptor inválido: Tupla duplicada en el descriptor: 2.7-32");
    }
}
