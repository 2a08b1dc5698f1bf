//! Cancelación cooperativa de la matriz.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Bandera compartida entre el operador y los workers. Cancelar no
/// interrumpe la llamada externa en curso: cada tupla termina su stage actual
/// y se detiene antes de empezar el siguiente.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
