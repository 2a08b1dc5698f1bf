//! Engine module: Matrix Driver, builder, cancelación y pipeline por tupla.

pub mod builder;
pub mod cancel;
pub mod driver;
mod pipeline;

pub use builder::MatrixDriverBuilder;
pub use cancel::CancellationToken;
pub use driver::MatrixDriver;

/// Modo de planificación de tuplas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// Una tarea por tupla sobre un pool de `jobs` hilos.
    Parallel { jobs: usize },
}
