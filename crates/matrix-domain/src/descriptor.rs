// descriptor.rs
use crate::{ConfigurationTuple, DependencySpec, DomainError};
use indexmap::IndexSet;

/// Tabla estática de la matriz: tuplas en orden de declaración más el
/// conjunto de dependencias declarado.
///
/// El orden sólo determina el orden del reporte; las tuplas son lógicamente
/// independientes. Se valida en la construcción, antes de ejecutar nada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDescriptor {
    configurations: Vec<ConfigurationTuple>,
    dependencies: Vec<DependencySpec>,
}

impl EnvironmentDescriptor {
    /// Crea el descriptor validando la matriz.
    ///
    /// # Errores
    /// - `DomainError::Validation` si la matriz está vacía o alguna
    ///   dependencia no tiene nombre.
    /// - `DomainError::DuplicateTuple` si dos tuplas comparten identidad.
    pub fn new<I>(configurations: I, dependencies: Vec<DependencySpec>) -> Result<Self, DomainError>
        where I: IntoIterator<Item = ConfigurationTuple>
    {
        let configurations: Vec<ConfigurationTuple> = configurations.into_iter().collect();
        if configurations.is_empty() {
            return Err(DomainError::Validation("La matriz no puede estar vacía".to_string()));
        }
        let mut seen = IndexSet::new();
        for t in &configurations {
            if !seen.insert(t.id()) {
                return Err(DomainError::DuplicateTuple(t.id().to_string()));
            }
        }
        for d in &dependencies {
            if d.name.trim().is_empty() {
                return Err(DomainError::Validation("Dependencia sin nombre".to_string()));
            }
        }
        Ok(Self { configurations,
                  dependencies })
    }

    pub fn list_configurations(&self) -> &[ConfigurationTuple] {
        &self.configurations
    }

    pub fn dependencies(&self) -> &[DependencySpec] {
        &self.dependencies
    }

    /// Dependencias cuyo predicado se cumple para `tuple`, en orden declarado.
    pub fn applicable_dependencies(&self, tuple: &ConfigurationTuple) -> Vec<&DependencySpec> {
        self.dependencies.iter().filter(|d| d.applies_to(tuple)).collect()
    }

    /// Sub-matriz con las tuplas cuya identidad aparece en `ids`, conservando
    /// el orden declarado. Devuelve error si algún id no existe.
    pub fn retain_ids(&self, ids: &[String]) -> Result<Self, DomainError> {
        for id in ids {
            if !self.configurations.iter().any(|t| t.id().to_string() == *id) {
                return Err(DomainError::Validation(format!("Tupla desconocida: {id}")));
            }
        }
        let filtered = self.configurations
                           .iter()
                           .filter(|t| ids.contains(&t.id().to_string()))
                           .cloned();
        Self::new(filtered, self.dependencies.clone())
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}
