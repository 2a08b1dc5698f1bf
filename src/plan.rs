//! `matrixflow plan`: vista previa de la matriz sin ejecutar nada.

use matrix_adapters::TableToolchainResolver;
use matrix_core::ToolchainResolver;
use matrix_domain::EnvironmentDescriptor;
use std::fmt::Write as _;

/// Una línea por tupla: id, toolchain resuelto y dependencias aplicables.
pub fn render_plan(descriptor: &EnvironmentDescriptor, resolver: &TableToolchainResolver) -> String {
    let mut out = String::new();
    for tuple in descriptor.list_configurations() {
        let toolchain = match resolver.resolve(tuple) {
            Ok(ctx) => ctx.toolchain().to_string(),
            Err(e) => format!("<{e}>"),
        };
        let deps: Vec<String> = descriptor.applicable_dependencies(tuple).iter().map(|d| d.install_spec()).collect();
        let deps = if deps.is_empty() { "-".to_string() } else { deps.join(", ") };
        let _ = writeln!(out, "{:<8} toolchain={toolchain}  deps={deps}", tuple.id().to_string());
    }
    let _ = writeln!(out, "{} tuple(s)", descriptor.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_domain::{Condition, ConfigurationTuple, DependencySpec, RuntimeVersion};

    #[test]
    fn plan_lists_toolchains_and_gated_dependencies() {
        let descriptor =
            EnvironmentDescriptor::new(vec![ConfigurationTuple::parse("2.7", 32).unwrap(), ConfigurationTuple::parse("3.9", 64).unwrap()],
                                       vec![DependencySpec::new("numpy"),
                                            DependencySpec::new("mock").when(Condition::RuntimeVersion(RuntimeVersion::parse("2.7").unwrap()))])
            .unwrap();
        let plan = render_plan(&descriptor, &TableToolchainResolver::pinned());
        let lines: Vec<&str> = plan.lines().collect();
        assert_eq!(lines[0], "2.7-32   toolchain=msvc-9.0  deps=numpy, mock");
        assert!(lines[1].starts_with("3.9-64   toolchain=<"));
        assert!(lines[1].ends_with("deps=numpy"));
        assert_eq!(lines[2], "2 tuple(s)");
    }
}
