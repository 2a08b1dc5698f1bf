// dependency.rs
use crate::tuple::{Architecture, ConfigurationTuple, RuntimeVersion};
use serde::{Deserialize, Serialize};

/// Predicado sobre los campos de una `ConfigurationTuple`.
///
/// Las instalaciones condicionales de la matriz se expresan como datos en
/// lugar de ramas dispersas por el pipeline, de modo que cada condición se
/// puede evaluar (y testear) de forma aislada.
///
/// Formato JSON (externally tagged):
/// `"always"`, `{"runtime_version": "2.7"}`, `{"runtime_version_in": ["3.3", "3.4"]}`,
/// `{"architecture": 64}`, `{"flag": "slow"}`, `{"all": [..]}`, `{"any": [..]}`,
/// `{"not": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Always,
    /// Coincidencia por prefijo de componentes (`2.7` cubre `2.7.18`).
    RuntimeVersion(RuntimeVersion),
    RuntimeVersionIn(Vec<RuntimeVersion>),
    Architecture(Architecture),
    Flag(String),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn evaluate(&self, tuple: &ConfigurationTuple) -> bool {
        match self {
            Condition::Always => true,
            Condition::RuntimeVersion(v) => tuple.runtime_version().matches_prefix(v),
            Condition::RuntimeVersionIn(vs) => vs.iter().any(|v| tuple.runtime_version().matches_prefix(v)),
            Condition::Architecture(a) => tuple.architecture() == *a,
            Condition::Flag(f) => tuple.has_flag(f),
            Condition::All(cs) => cs.iter().all(|c| c.evaluate(tuple)),
            Condition::Any(cs) => cs.iter().any(|c| c.evaluate(tuple)),
            Condition::Not(c) => !c.evaluate(tuple),
        }
    }
}

/// Dependencia de terceros declarada en la matriz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: String,
    /// Restricción de versión opcional, pasada tal cual al instalador
    /// (`">=1.9"`, `"==0.19.1"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
    #[serde(default, rename = "when")]
    pub condition: Condition,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               requirement: None,
               condition: Condition::Always }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = Some(requirement.into());
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn applies_to(&self, tuple: &ConfigurationTuple) -> bool {
        self.condition.evaluate(tuple)
    }

    /// Texto entregado al instalador de paquetes: `nombre` + restricción.
    pub fn install_spec(&self) -> String {
        match &self.requirement {
            Some(req) => format!("{}{}", self.name, req),
            None => self.name.clone(),
        }
    }
}
