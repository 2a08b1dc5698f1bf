//! Matrix Driver: recorre el descriptor y ejecuta el pipeline de cada tupla.

use log::{info, warn};
use matrix_domain::EnvironmentDescriptor;
use rayon::prelude::*;

use super::pipeline::{run_tuple, TupleRun};
use super::{CancellationToken, ExecutionMode, MatrixDriverBuilder};
use crate::event::{EventStore, InMemoryEventStore};
use crate::ports::StageSet;
use crate::repo::{InMemoryTupleRepository, TupleRepository};
use crate::report::{Outcome, PipelineEntry, PipelineResult};

/// Orquestador de la matriz.
///
/// Procesa cada tupla exactamente una vez y de forma independiente: el fallo
/// de una tupla sólo queda registrado en su entrada del `PipelineResult`.
/// El orden del reporte es siempre el orden del descriptor, también en modo
/// paralelo.
pub struct MatrixDriver<E = InMemoryEventStore, R = InMemoryTupleRepository>
    where E: EventStore,
          R: TupleRepository
{
    pub(super) descriptor: EnvironmentDescriptor,
    pub(super) stages: StageSet,
    pub(super) mode: ExecutionMode,
    pub(super) cancel: CancellationToken,
    pub(super) event_store: E,
    pub(super) repository: R,
}

impl MatrixDriver<InMemoryEventStore, InMemoryTupleRepository> {
    /// Builder con stores en memoria.
    pub fn builder(descriptor: EnvironmentDescriptor, stages: StageSet) -> MatrixDriverBuilder {
        MatrixDriverBuilder::new(descriptor, stages)
    }
}

impl<E, R> MatrixDriver<E, R>
    where E: EventStore,
          R: TupleRepository
{
    /// Crea un driver con los stores proporcionados.
    pub fn new_with_stores(descriptor: EnvironmentDescriptor,
                           stages: StageSet,
                           mode: ExecutionMode,
                           cancel: CancellationToken,
                           event_store: E,
                           repository: R)
                           -> Self {
        Self { descriptor,
               stages,
               mode,
               cancel,
               event_store,
               repository }
    }

    pub fn descriptor(&self) -> &EnvironmentDescriptor {
        &self.descriptor
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    /// Token para cancelar la matriz desde otro hilo.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ejecuta todas las tuplas y devuelve el resultado agregado.
    pub fn run(&mut self) -> PipelineResult {
        let runs = self.execute();
        let mut result = PipelineResult::new();
        for (tuple, run) in self.descriptor.list_configurations().iter().zip(runs) {
            self.event_store.import(run.events);
            let events = self.event_store.list(run.run_id);
            let instance = self.repository.load(run.run_id, &events);
            let outcome = Outcome::from_state(&instance.state);
            info!("[{tuple}] outcome: {outcome:?} ({})", instance.state);
            result.push(PipelineEntry { tuple: tuple.id(),
                                        run_id: run.run_id,
                                        outcome,
                                        stage_reached: instance.stage_reached(),
                                        state: instance.state,
                                        stages: instance.stages,
                                        toolchain: run.toolchain,
                                        test_report: run.test_report,
                                        run_fingerprint: instance.run_fingerprint,
                                        events });
        }
        result
    }

    fn execute(&self) -> Vec<TupleRun> {
        let tuples = self.descriptor.list_configurations();
        let deps = self.descriptor.dependencies();
        let stages = &self.stages;
        let cancel = &self.cancel;
        match self.mode {
            ExecutionMode::Sequential => tuples.iter().map(|t| run_tuple(t, deps, stages, cancel)).collect(),
            ExecutionMode::Parallel { jobs } => {
                let jobs = jobs.max(1);
                match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                    Ok(pool) => pool.install(|| tuples.par_iter().map(|t| run_tuple(t, deps, stages, cancel)).collect()),
                    Err(e) => {
                        warn!("could not start {jobs} worker(s), running sequentially: {e}");
                        tuples.iter().map(|t| run_tuple(t, deps, stages, cancel)).collect()
                    }
                }
            }
        }
    }
}
