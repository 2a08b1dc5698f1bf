//! Contexto de toolchain resuelto para una tupla.
//!
//! Es un mapeo nombre → valor de variables de entorno derivado de forma
//! determinista de la tupla. El `ToolchainResolver` lo materializa sin
//! ejecutar nada; el `BuildInvoker` lo recibe por valor y es su único dueño
//! durante un build. No implementa `Clone` para que no pueda compartirse
//! entre tuplas.
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;

use crate::hashing::hash_value;

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ToolchainContext {
    toolchain: String,
    variables: IndexMap<String, String>,
}

impl ToolchainContext {
    pub fn new(toolchain: impl Into<String>) -> Self {
        Self { toolchain: toolchain.into(),
               variables: IndexMap::new() }
    }

    /// Añade (o reemplaza) una variable conservando el orden de inserción.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn toolchain(&self) -> &str {
        &self.toolchain
    }

    pub fn variables(&self) -> &IndexMap<String, String> {
        &self.variables
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Fingerprint estable: independiente del orden de inserción.
    pub fn fingerprint(&self) -> String {
        hash_value(&json!({ "toolchain": self.toolchain, "variables": self.variables }))
    }
}
