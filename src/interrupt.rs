//! Ctrl-C durante `run`: la primera señal pide cancelación cooperativa
//! (cada tupla cierra su stage actual y el reporte se imprime); la segunda
//! aborta el proceso.
//!
//! Los comandos externos corren en su propio grupo de procesos, así que el
//! SIGINT de la terminal sólo llega a matrixflow.

use log::warn;
use matrix_core::CancellationToken;

/// Código de salida convencional de un proceso terminado por SIGINT.
pub const ABORT_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Primer Ctrl-C: se marcó el token.
    Cancelled,
    /// El token ya estaba marcado: salir sin esperar.
    Abort,
}

/// Reacción a una interrupción sobre `token`.
pub fn on_interrupt(token: &CancellationToken) -> InterruptAction {
    if token.is_cancelled() {
        return InterruptAction::Abort;
    }
    token.cancel();
    InterruptAction::Cancelled
}

/// Instala el handler del proceso. Sólo puede instalarse una vez; un error
/// deja la matriz sin cancelación por señal, pero no impide correrla.
pub fn install(token: CancellationToken) {
    let result = ctrlc::set_handler(move || match on_interrupt(&token) {
        InterruptAction::Cancelled => {
            warn!("interrupt received: finishing running stages, press Ctrl-C again to abort");
        }
        InterruptAction::Abort => {
            warn!("second interrupt: aborting");
            std::process::exit(ABORT_EXIT_CODE);
        }
    });
    if let Err(e) = result {
        warn!("could not install Ctrl-C handler: {e}");
    }
}
