//! Constantes del motor core.
//!
//! `ENGINE_VERSION` forma parte del input de los fingerprints: un cambio de
//! versión del motor invalida los fingerprints aunque la matriz no cambie.

/// Versión lógica del motor. Mantener estable mientras no haya cambios
/// incompatibles en el orden de stages o en el formato de eventos.
pub const ENGINE_VERSION: &str = "M1.0";
