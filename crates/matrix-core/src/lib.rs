//! matrix-core: motor lineal de la matriz de builds.
//!
//! Cada tupla de la matriz recorre `Provisioning → Resolving → Building →
//! Testing` de forma determinista y aislada; el `MatrixDriver` agrega el
//! resultado de todas las tuplas en un `PipelineResult` ordenado.
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod model;
pub mod ports;
pub mod repo;
pub mod report;
pub mod stage;

pub use engine::{CancellationToken, ExecutionMode, MatrixDriver};
pub use errors::StageError;
pub use event::{EventStore, InMemoryEventStore, TupleEvent, TupleEventKind};
pub use model::{Artifact, StageTimeouts, TestReport, ToolchainContext};
pub use ports::{BuildInvoker, Provisioner, StageSet, TestRunner, ToolchainResolver};
pub use repo::{InMemoryTupleRepository, TupleInstance, TupleRepository};
pub use report::{Outcome, PipelineEntry, PipelineResult};
pub use stage::{Stage, StageStatus, TupleState};
