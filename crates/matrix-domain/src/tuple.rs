// tuple.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Versión del intérprete (p. ej. `"2.7"` o `"3.4.3"`).
///
/// Se valida al construirse: componentes numéricos separados por puntos y al
/// menos `major.minor`. El valor original se conserva tal cual para pasarlo a
/// los instaladores externos.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuntimeVersion {
    raw: String,
    components: Vec<u32>,
}

impl RuntimeVersion {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation("La versión del runtime no puede estar vacía".to_string()));
        }
        let mut components = Vec::new();
        for part in trimmed.split('.') {
            let n = part.parse::<u32>()
                        .map_err(|_| DomainError::Validation(format!("Versión de runtime inválida: {trimmed}")))?;
            components.push(n);
        }
        if components.len() < 2 {
            return Err(DomainError::Validation(format!("La versión debe tener al menos major.minor: {trimmed}")));
        }
        Ok(Self { raw: trimmed.to_string(),
                  components })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u32 {
        self.components[0]
    }

    /// Par `(major, minor)` usado como clave de la tabla de toolchains.
    pub fn major_minor(&self) -> (u32, u32) {
        (self.components[0], self.components[1])
    }

    /// `true` si `prefix` coincide componente a componente con el inicio de
    /// esta versión (`"2.7"` encaja con `"2.7.18"`, no con `"2.70"`).
    pub fn matches_prefix(&self, prefix: &RuntimeVersion) -> bool {
        prefix.components.len() <= self.components.len()
        && prefix.components.iter().zip(&self.components).all(|(a, b)| a == b)
    }
}

impl TryFrom<String> for RuntimeVersion {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RuntimeVersion> for String {
    fn from(v: RuntimeVersion) -> Self {
        v.raw
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Arquitectura del procesador. Se serializa como el entero `32` o `64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Architecture {
    X86,
    X64,
}

impl Architecture {
    pub fn bits(self) -> u32 {
        match self {
            Architecture::X86 => 32,
            Architecture::X64 => 64,
        }
    }

    /// Nombre de CPU tal como lo esperan las herramientas del SDK.
    pub fn cpu_name(self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
        }
    }
}

impl TryFrom<u32> for Architecture {
    type Error = DomainError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            32 => Ok(Architecture::X86),
            64 => Ok(Architecture::X64),
            other => Err(DomainError::Validation(format!("Arquitectura no soportada: {other} (se espera 32 o 64)"))),
        }
    }
}

impl From<Architecture> for u32 {
    fn from(a: Architecture) -> Self {
        a.bits()
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Identidad de una tupla: `(runtime_version, architecture)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TupleId {
    pub runtime_version: RuntimeVersion,
    pub architecture: Architecture,
}

impl TupleId {
    /// Forma apta para nombres de directorio (`py2.7-x86`).
    pub fn slug(&self) -> String {
        format!("py{}-{}", self.runtime_version, self.architecture.cpu_name())
    }
}

impl fmt::Display for TupleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.runtime_version, self.architecture)
    }
}

/// Una combinación (versión, arquitectura) de la matriz. Inmutable una vez
/// definida en el descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationTuple {
    runtime_version: RuntimeVersion,
    architecture: Architecture,
    #[serde(default)]
    extra_flags: BTreeSet<String>,
}

impl ConfigurationTuple {
    pub fn new(runtime_version: RuntimeVersion, architecture: Architecture) -> Self {
        Self { runtime_version,
               architecture,
               extra_flags: BTreeSet::new() }
    }

    /// Atajo para tests y tablas estáticas.
    pub fn parse(version: &str, bits: u32) -> Result<Self, DomainError> {
        Ok(Self::new(RuntimeVersion::parse(version)?, Architecture::try_from(bits)?))
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.extra_flags.extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn runtime_version(&self) -> &RuntimeVersion {
        &self.runtime_version
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn extra_flags(&self) -> &BTreeSet<String> {
        &self.extra_flags
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.extra_flags.contains(flag)
    }

    pub fn id(&self) -> TupleId {
        TupleId { runtime_version: self.runtime_version.clone(),
                  architecture: self.architecture }
    }
}

impl fmt::Display for ConfigurationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.runtime_version, self.architecture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_version_requires_major_minor() {
        assert!(RuntimeVersion::parse("3").is_err());
        assert!(RuntimeVersion::parse("").is_err());
        assert!(RuntimeVersion::parse("3.x").is_err());
        let v = RuntimeVersion::parse(" 3.4.3 ").unwrap();
        assert_eq!(v.as_str(), "3.4.3");
        assert_eq!(v.major_minor(), (3, 4));
    }

    #[test]
    fn prefix_match_is_component_wise() {
        let full = RuntimeVersion::parse("2.7.18").unwrap();
        assert!(full.matches_prefix(&RuntimeVersion::parse("2.7").unwrap()));
        assert!(!RuntimeVersion::parse("2.70").unwrap().matches_prefix(&RuntimeVersion::parse("2.7").unwrap()));
        assert!(!RuntimeVersion::parse("2.7").unwrap().matches_prefix(&full));
    }

    #[test]
    fn architecture_serializes_as_bits() {
        let t = ConfigurationTuple::parse("2.7", 32).unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["architecture"], 32);
        assert_eq!(json["runtime_version"], "2.7");

        let bad = serde_json::json!({ "runtime_version": "2.7", "architecture": 16 });
        assert!(serde_json::from_value::<ConfigurationTuple>(bad).is_err());
    }

    #[test]
    fn identity_ignores_flags() {
        let a = ConfigurationTuple::parse("3.4", 64).unwrap();
        let b = a.clone().with_flags(["slow"]);
        assert_eq!(a.id(), b.id());
        assert_eq!(b.id().to_string(), "3.4-64");
        assert_eq!(b.id().slug(), "py3.4-x64");
    }
}
