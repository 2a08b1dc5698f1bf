// matrix-domain library entry point
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod tuple;
pub use dependency::{Condition, DependencySpec};
pub use descriptor::EnvironmentDescriptor;
pub use error::DomainError;
pub use tuple::{Architecture, ConfigurationTuple, RuntimeVersion, TupleId};
