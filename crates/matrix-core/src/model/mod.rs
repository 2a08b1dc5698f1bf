//! Modelos intercambiados entre stages (ToolchainContext, Artifact, TestReport, StageTimeouts).

pub mod artifact;
pub mod test_report;
pub mod timeouts;
pub mod toolchain;

pub use artifact::Artifact;
pub use test_report::TestReport;
pub use timeouts::StageTimeouts;
pub use toolchain::ToolchainContext;
