//! Builder para `MatrixDriver`.
//!
//! ```ignore
//! let mut driver = MatrixDriver::builder(descriptor, stages)
//!     .parallel(4)
//!     .cancellation(token)
//!     .build();
//! let result = driver.run();
//! ```

use matrix_domain::EnvironmentDescriptor;

use super::{CancellationToken, ExecutionMode, MatrixDriver};
use crate::event::InMemoryEventStore;
use crate::ports::StageSet;
use crate::repo::InMemoryTupleRepository;

pub struct MatrixDriverBuilder {
    descriptor: EnvironmentDescriptor,
    stages: StageSet,
    mode: ExecutionMode,
    cancel: CancellationToken,
}

impl MatrixDriverBuilder {
    pub fn new(descriptor: EnvironmentDescriptor, stages: StageSet) -> Self {
        Self { descriptor,
               stages,
               mode: ExecutionMode::Sequential,
               cancel: CancellationToken::new() }
    }

    /// Una tarea por tupla con hasta `jobs` workers.
    #[inline]
    pub fn parallel(mut self, jobs: usize) -> Self {
        self.mode = ExecutionMode::Parallel { jobs };
        self
    }

    #[inline]
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Usa un token externo (p. ej. compartido con el manejador del operador).
    #[inline]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn build(self) -> MatrixDriver<InMemoryEventStore, InMemoryTupleRepository> {
        MatrixDriver::new_with_stores(self.descriptor,
                                      self.stages,
                                      self.mode,
                                      self.cancel,
                                      InMemoryEventStore::default(),
                                      InMemoryTupleRepository::new())
    }
}
