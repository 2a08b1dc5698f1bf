//! Puertos de los cuatro stages.
//!
//! El motor sólo conoce estos traits; las implementaciones concretas (comandos
//! externos, tabla de toolchains) viven en `matrix-adapters`. Todas deben ser
//! `Send + Sync` para poder ejecutar tuplas en paralelo, y no deben guardar
//! estado mutable compartido entre tuplas.

use matrix_domain::{ConfigurationTuple, DependencySpec};

use crate::errors::StageError;
use crate::model::{Artifact, TestReport, ToolchainContext};

/// Instala el intérprete y las dependencias aplicables de una tupla.
pub trait Provisioner: Send + Sync {
    /// Instala el intérprete y cada dependencia cuyo predicado se cumple para
    /// `tuple`, en orden. Debe ser idempotente y detenerse en el primer fallo.
    fn provision(&self, tuple: &ConfigurationTuple, deps: &[DependencySpec]) -> Result<(), StageError>;
}

/// Resolución pura tupla → contexto de toolchain.
pub trait ToolchainResolver: Send + Sync {
    fn resolve(&self, tuple: &ConfigurationTuple) -> Result<ToolchainContext, StageError>;
}

/// Ejecuta el build nativo dentro del contexto resuelto.
pub trait BuildInvoker: Send + Sync {
    /// Recibe el contexto por valor: queda consumido al terminar el build.
    fn build(&self, tuple: &ConfigurationTuple, context: ToolchainContext) -> Result<Artifact, StageError>;
}

/// Ejecuta la suite de tests contra el artifact construido.
pub trait TestRunner: Send + Sync {
    fn run_tests(&self, artifact: &Artifact) -> Result<TestReport, StageError>;
}

/// Agrupa las cuatro implementaciones que usa el driver.
pub struct StageSet {
    pub provisioner: Box<dyn Provisioner>,
    pub resolver: Box<dyn ToolchainResolver>,
    pub builder: Box<dyn BuildInvoker>,
    pub tests: Box<dyn TestRunner>,
}

impl StageSet {
    pub fn new(provisioner: impl Provisioner + 'static,
               resolver: impl ToolchainResolver + 'static,
               builder: impl BuildInvoker + 'static,
               tests: impl TestRunner + 'static)
               -> Self {
        Self { provisioner: Box::new(provisioner),
               resolver: Box::new(resolver),
               builder: Box::new(builder),
               tests: Box::new(tests) }
    }
}
