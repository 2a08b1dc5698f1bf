//! Ejecución lineal de una tupla.
//!
//! Cada tupla usa su propio `InMemoryEventStore` y su propio
//! `ToolchainContext`; nada mutable se comparte con otras tuplas. El driver
//! importa los eventos resultantes en su store al terminar.

use log::{debug, info, warn};
use matrix_domain::{ConfigurationTuple, DependencySpec};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::constants::ENGINE_VERSION;
use crate::engine::CancellationToken;
use crate::errors::StageError;
use crate::event::{EventStore, InMemoryEventStore, TupleEvent, TupleEventKind};
use crate::hashing::hash_value;
use crate::model::TestReport;
use crate::ports::StageSet;
use crate::stage::{Stage, TupleState};

/// Salida de una ejecución de tupla antes de agregarse al reporte.
pub(crate) struct TupleRun {
    pub run_id: Uuid,
    pub events: Vec<TupleEvent>,
    pub toolchain: Option<String>,
    pub test_report: Option<TestReport>,
}

/// Marca que la tupla se detuvo; el motivo ya quedó registrado como evento.
struct Halt;

struct TupleRunner<'a> {
    tuple: &'a ConfigurationTuple,
    run_id: Uuid,
    store: InMemoryEventStore,
    state: TupleState,
    cancel: &'a CancellationToken,
    stage_fingerprints: Vec<String>,
}

impl<'a> TupleRunner<'a> {
    fn fingerprint(&self, stage: Stage, payload: Value) -> String {
        hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "tuple": self.tuple.id().to_string(),
            "stage": stage,
            "payload": payload,
        }))
    }

    /// Entra en `stage`, salvo que se haya pedido cancelación.
    fn enter(&mut self, stage: Stage) -> Result<(), Halt> {
        if self.cancel.is_cancelled() {
            info!("[{}] cancelled before {stage}", self.tuple);
            self.store.append_kind(self.run_id, TupleEventKind::RunCancelled { stage });
            self.state = TupleState::Failed { stage,
                                              reason: StageError::Cancelled };
            return Err(Halt);
        }
        match self.state.advance() {
            Ok(next) if next == TupleState::Running(stage) => self.state = next,
            other => {
                let err = StageError::Internal(format!("out-of-order transition to {stage}: {other:?}"));
                let fingerprint = self.fingerprint(stage, json!(err.label()));
                self.store.append_kind(self.run_id, TupleEventKind::StageFailed { stage,
                                                                                  error: err.clone(),
                                                                                  fingerprint });
                self.state = TupleState::Failed { stage, reason: err };
                return Err(Halt);
            }
        }
        info!("[{}] {stage}", self.tuple);
        self.store.append_kind(self.run_id, TupleEventKind::StageStarted { stage });
        Ok(())
    }

    /// Registra el resultado del stage en curso.
    fn complete<T>(&mut self,
                   stage: Stage,
                   result: Result<T, StageError>,
                   detail: impl FnOnce(&T) -> Value)
                   -> Result<T, Halt> {
        match result {
            Ok(value) => {
                let detail = detail(&value);
                let fingerprint = self.fingerprint(stage, detail.clone());
                self.stage_fingerprints.push(fingerprint.clone());
                self.store.append_kind(self.run_id, TupleEventKind::StageFinished { stage,
                                                                                    fingerprint,
                                                                                    detail });
                Ok(value)
            }
            Err(error) => {
                warn!("[{}] {stage} failed: {error}", self.tuple);
                let fingerprint = self.fingerprint(stage, json!(error.label()));
                self.store.append_kind(self.run_id, TupleEventKind::StageFailed { stage,
                                                                                  error: error.clone(),
                                                                                  fingerprint });
                self.state = self.state
                                 .fail(error.clone())
                                 .unwrap_or(TupleState::Failed { stage, reason: error });
                Err(Halt)
            }
        }
    }

    fn finish(&mut self) {
        self.state = TupleState::Succeeded;
        let run_fingerprint = hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "tuple": self.tuple.id().to_string(),
            "stage_fingerprints": self.stage_fingerprints,
        }));
        info!("[{}] succeeded", self.tuple);
        self.store.append_kind(self.run_id, TupleEventKind::RunCompleted { run_fingerprint });
    }
}

/// Ejecuta `Provisioning → Resolving → Building → Testing` para una tupla,
/// deteniéndose en el primer error. Nunca reintenta.
pub(crate) fn run_tuple(tuple: &ConfigurationTuple,
                        deps: &[DependencySpec],
                        stages: &StageSet,
                        cancel: &CancellationToken)
                        -> TupleRun {
    let run_id = Uuid::new_v4();
    let applicable: Vec<&str> = deps.iter().filter(|d| d.applies_to(tuple)).map(|d| d.name.as_str()).collect();
    let mut runner = TupleRunner { tuple,
                                   run_id,
                                   store: InMemoryEventStore::default(),
                                   state: TupleState::Pending,
                                   cancel,
                                   stage_fingerprints: Vec::new() };
    runner.store.append_kind(run_id, TupleEventKind::RunInitialized { tuple: tuple.id(),
                                                                      dependency_count: applicable.len() });
    debug!("[{tuple}] run {run_id}, dependencies: {applicable:?}");

    let mut toolchain = None;
    let mut test_report = None;
    let _ = (|| -> Result<(), Halt> {
        runner.enter(Stage::Provisioning)?;
        let provisioned = stages.provisioner.provision(tuple, deps);
        runner.complete(Stage::Provisioning, provisioned, |_| json!({ "dependencies": applicable }))?;

        runner.enter(Stage::Resolving)?;
        let resolved = stages.resolver.resolve(tuple);
        let context = runner.complete(Stage::Resolving, resolved, |ctx| {
                                json!({ "toolchain": ctx.toolchain(), "context_fingerprint": ctx.fingerprint() })
                            })?;
        toolchain = Some(context.toolchain().to_string());

        runner.enter(Stage::Building)?;
        let built = stages.builder.build(tuple, context);
        let artifact = runner.complete(Stage::Building, built, |a| json!({ "location": a.location }))?;

        runner.enter(Stage::Testing)?;
        let tested = stages.tests.run_tests(&artifact).and_then(|report| {
                                                           if report.is_success() {
                                                               Ok(report)
                                                           } else {
                                                               Err(StageError::Test { failing: report.failing,
                                                                                      output: String::new() })
                                                           }
                                                       });
        let report = runner.complete(Stage::Testing, tested, |r| json!(r))?;
        test_report = Some(report);

        runner.finish();
        Ok(())
    })();

    TupleRun { run_id,
               events: runner.store.list(run_id),
               toolchain,
               test_report }
}
