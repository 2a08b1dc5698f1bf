//! matrix-adapters: implementaciones concretas de los stages.
//!
//! Los colaboradores externos (instalador, build, tests) se ejecutan como
//! comandos opacos; la resolución de toolchains es una tabla en memoria.
pub mod build;
pub mod command;
pub mod provision;
pub mod test_runner;
pub mod toolchain;

pub use build::{ActivatedToolchain, CommandBuildInvoker};
pub use command::{CommandError, CommandOutput, CommandTemplate, Placeholders};
pub use provision::{CommandProvisioner, InstallManifest};
pub use test_runner::CommandTestRunner;
pub use toolchain::{TableToolchainResolver, ToolchainEntry, ToolchainTable};
