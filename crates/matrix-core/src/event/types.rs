//! Tipos de evento de una ejecución de tupla y estructura `TupleEvent`.
//!
//! Rol en el pipeline:
//! - Cada ejecución de tupla (identificada por un `run_id`) emite eventos
//!   append-only.
//! - El `TupleRepository` reconstruye el estado (stage alcanzado, estado
//!   terminal) haciendo replay de estos eventos.
//! - El enum `TupleEventKind` es el contrato observable del motor; se
//!   serializa tal cual en el reporte JSON.
use chrono::{DateTime, Utc};
use matrix_domain::TupleId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StageError;
use crate::stage::Stage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TupleEventKind {
    /// Primer evento de un `run_id`: fija la tupla y cuántas dependencias le
    /// aplican.
    RunInitialized { tuple: TupleId, dependency_count: usize },
    /// Un stage comenzó. No implica éxito.
    StageStarted { stage: Stage },
    /// Un stage terminó correctamente. `detail` lleva datos ligeros del stage
    /// (toolchain resuelto, conteos de tests...).
    StageFinished {
        stage: Stage,
        fingerprint: String,
        detail: serde_json::Value,
    },
    /// Un stage terminó con error. La tupla no continúa (stop-on-failure).
    StageFailed {
        stage: Stage,
        error: StageError,
        fingerprint: String,
    },
    /// Cancelación cooperativa: `stage` es el primer stage que no llegó a
    /// empezar.
    RunCancelled { stage: Stage },
    /// Cierre exitoso con el fingerprint agregado de los stages.
    RunCompleted { run_fingerprint: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleEvent {
    pub seq: u64,
    pub run_id: Uuid,
    pub kind: TupleEventKind,
    pub ts: DateTime<Utc>, // metadato (no entra en fingerprint)
}
