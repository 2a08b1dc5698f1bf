//! Estado reconstruido de una ejecución de tupla (`TupleInstance`).
//!
//! El repositorio aplica un replay lineal: consume los eventos en orden y
//! actualiza el estado de cada stage. El reporte final (stage alcanzado,
//! estado terminal) sale siempre de aquí, nunca de estructuras mutables del
//! driver.
use chrono::{DateTime, Utc};
use matrix_domain::TupleId;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::StageError;
use crate::event::{TupleEvent, TupleEventKind};
use crate::stage::{Stage, StageStatus, TupleState};

#[derive(Debug, Clone)]
pub struct TupleInstance {
    pub run_id: Uuid,
    pub tuple: Option<TupleId>,
    pub stages: Vec<StageSlot>,
    pub state: TupleState,
    pub run_fingerprint: Option<String>,
}

impl TupleInstance {
    /// Último stage que llegó a empezar (o el stage cancelado).
    pub fn stage_reached(&self) -> Option<Stage> {
        match &self.state {
            TupleState::Pending => None,
            TupleState::Running(stage) => Some(*stage),
            TupleState::Succeeded => Some(Stage::Testing),
            TupleState::Failed { stage, .. } => Some(*stage),
        }
    }

    pub fn slot(&self, stage: Stage) -> &StageSlot {
        &self.stages[stage.index()]
    }
}

/// Estado de un stage en la instancia.
#[derive(Debug, Clone, Serialize)]
pub struct StageSlot {
    pub stage: Stage,
    pub status: StageStatus,
    pub fingerprint: Option<String>,
    pub error: Option<StageError>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StageSlot {
    /// Milisegundos entre inicio y fin; `None` si el stage no terminó.
    pub fn duration_ms(&self) -> Option<i64> {
        if !self.status.is_terminal() {
            return None;
        }
        Some((self.finished_at? - self.started_at?).num_milliseconds())
    }
}

/// Trait para reconstruir (`replay`) el estado de una ejecución a partir de eventos.
pub trait TupleRepository {
    fn load(&self, run_id: Uuid, events: &[TupleEvent]) -> TupleInstance;
}

#[derive(Debug, Default)]
pub struct InMemoryTupleRepository;

impl InMemoryTupleRepository {
    pub fn new() -> Self {
        Self
    }
}

fn skip_pending(stages: &mut [StageSlot]) {
    for slot in stages.iter_mut().filter(|s| s.status == StageStatus::Pending) {
        slot.status = StageStatus::Skipped;
    }
}

impl TupleRepository for InMemoryTupleRepository {
    fn load(&self, run_id: Uuid, events: &[TupleEvent]) -> TupleInstance {
        let mut stages: Vec<StageSlot> = Stage::ORDER.iter()
                                                     .map(|s| StageSlot { stage: *s,
                                                                          status: StageStatus::Pending,
                                                                          fingerprint: None,
                                                                          error: None,
                                                                          started_at: None,
                                                                          finished_at: None })
                                                     .collect();
        let mut tuple = None;
        let mut state = TupleState::Pending;
        let mut run_fingerprint = None;
        for ev in events {
            match &ev.kind {
                TupleEventKind::RunInitialized { tuple: t, .. } => tuple = Some(t.clone()),
                TupleEventKind::StageStarted { stage } => {
                    let slot = &mut stages[stage.index()];
                    slot.status = StageStatus::Running;
                    slot.started_at = Some(ev.ts);
                    state = TupleState::Running(*stage);
                }
                TupleEventKind::StageFinished { stage, fingerprint, .. } => {
                    let slot = &mut stages[stage.index()];
                    slot.status = StageStatus::FinishedOk;
                    slot.fingerprint = Some(fingerprint.clone());
                    slot.finished_at = Some(ev.ts);
                }
                TupleEventKind::StageFailed { stage, error, fingerprint } => {
                    let slot = &mut stages[stage.index()];
                    slot.status = StageStatus::Failed;
                    slot.fingerprint = Some(fingerprint.clone());
                    slot.error = Some(error.clone());
                    slot.finished_at = Some(ev.ts);
                    state = TupleState::Failed { stage: *stage,
                                                 reason: error.clone() };
                    skip_pending(&mut stages);
                }
                TupleEventKind::RunCancelled { stage } => {
                    state = TupleState::Failed { stage: *stage,
                                                 reason: StageError::Cancelled };
                    skip_pending(&mut stages);
                }
                TupleEventKind::RunCompleted { run_fingerprint: fp } => {
                    state = TupleState::Succeeded;
                    run_fingerprint = Some(fp.clone());
                }
            }
        }
        TupleInstance { run_id,
                        tuple,
                        stages,
                        state,
                        run_fingerprint }
    }
}
