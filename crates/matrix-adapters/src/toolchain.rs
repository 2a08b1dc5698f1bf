//! Tabla de toolchains fijados y su resolver.
//!
//! Cada par `(major.minor, arquitectura)` apunta a exactamente un toolchain.
//! No hay "usar el más reciente": un par ausente es
//! `StageError::UnsupportedConfiguration`.

use indexmap::IndexMap;
use log::debug;
use matrix_core::{StageError, ToolchainContext, ToolchainResolver};
use matrix_domain::{Architecture, ConfigurationTuple, DomainError, RuntimeVersion};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

type TableKey = ((u32, u32), Architecture);

static PINNED: Lazy<ToolchainTable> = Lazy::new(pinned_table);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainEntry {
    pub runtime_version: RuntimeVersion,
    pub architecture: Architecture,
    pub toolchain: String,
    #[serde(default)]
    pub variables: IndexMap<String, String>,
}

impl ToolchainEntry {
    fn key(&self) -> TableKey {
        (self.runtime_version.major_minor(), self.architecture)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainTable {
    entries: IndexMap<TableKey, ToolchainEntry>,
}

impl ToolchainTable {
    /// Tabla por defecto para extensiones nativas de CPython en Windows.
    pub fn pinned() -> &'static ToolchainTable {
        &PINNED
    }

    /// Construye una tabla rechazando pares repetidos.
    pub fn from_entries(entries: Vec<ToolchainEntry>) -> Result<Self, DomainError> {
        let mut table = Self::default();
        for entry in entries {
            let key = entry.key();
            if table.entries.contains_key(&key) {
                return Err(DomainError::Validation(format!("Toolchain duplicado para {}.{}-{}",
                                                           key.0 .0, key.0 .1, key.1)));
            }
            table.entries.insert(key, entry);
        }
        Ok(table)
    }

    /// Copia de `self` con las entradas de `overrides` reemplazando o
    /// añadiendo pares.
    pub fn merged_with(&self, overrides: &ToolchainTable) -> ToolchainTable {
        let mut merged = self.clone();
        for (key, entry) in &overrides.entries {
            merged.entries.insert(*key, entry.clone());
        }
        merged
    }

    pub fn lookup(&self, runtime_version: &RuntimeVersion, architecture: Architecture) -> Option<&ToolchainEntry> {
        self.entries.get(&(runtime_version.major_minor(), architecture))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolver puro sobre una `ToolchainTable`.
#[derive(Debug, Clone)]
pub struct TableToolchainResolver {
    table: ToolchainTable,
}

impl TableToolchainResolver {
    pub fn new(table: ToolchainTable) -> Self {
        Self { table }
    }

    pub fn pinned() -> Self {
        Self::new(ToolchainTable::pinned().clone())
    }

    pub fn table(&self) -> &ToolchainTable {
        &self.table
    }
}

impl ToolchainResolver for TableToolchainResolver {
    fn resolve(&self, tuple: &ConfigurationTuple) -> Result<ToolchainContext, StageError> {
        let entry = self.table
                        .lookup(tuple.runtime_version(), tuple.architecture())
                        .ok_or_else(|| StageError::UnsupportedConfiguration { runtime_version: tuple.runtime_version().to_string(),
                                                                              architecture: tuple.architecture().bits() })?;
        let context = entry.variables
                           .iter()
                           .fold(ToolchainContext::new(&entry.toolchain).with_var("MATRIX_TOOLCHAIN", &entry.toolchain),
                                 |ctx, (k, v)| ctx.with_var(k, v));
        debug!("[{tuple}] toolchain {} -> {:?}", entry.toolchain, context.variables());
        Ok(context)
    }
}

fn pinned_table() -> ToolchainTable {
    const SDK_70: Option<&str> = Some("v7.0");
    const SDK_71: Option<&str> = Some("v7.1");
    let rows = [("2.6", "msvc-9.0", SDK_70),
                ("2.7", "msvc-9.0", SDK_70),
                ("3.2", "msvc-9.0", SDK_70),
                ("3.3", "msvc-10.0", SDK_71),
                ("3.4", "msvc-10.0", SDK_71),
                ("3.5", "msvc-14.0", None),
                ("3.6", "msvc-14.0", None)];
    let mut table = ToolchainTable::default();
    for (version, toolchain, sdk) in rows {
        for arch in [Architecture::X86, Architecture::X64] {
            if let Ok(runtime_version) = RuntimeVersion::parse(version) {
                let entry = pinned_entry(runtime_version, arch, toolchain, sdk);
                table.entries.insert(entry.key(), entry);
            }
        }
    }
    table
}

fn pinned_entry(runtime_version: RuntimeVersion, arch: Architecture, toolchain: &str, sdk: Option<&str>) -> ToolchainEntry {
    let machine = match arch {
        Architecture::X86 => "/MACHINE:X86",
        Architecture::X64 => "/MACHINE:X64",
    };
    let mut variables = IndexMap::new();
    variables.insert("TARGET_CPU".to_string(), arch.cpu_name().to_string());
    variables.insert("CC".to_string(), "cl.exe".to_string());
    variables.insert("LDFLAGS".to_string(), machine.to_string());
    if let Some(sdk) = sdk {
        let root = format!(r"C:\Program Files\Microsoft SDKs\Windows\{sdk}");
        let lib = match arch {
            Architecture::X86 => format!(r"{root}\Lib"),
            Architecture::X64 => format!(r"{root}\Lib\x64"),
        };
        variables.insert("DISTUTILS_USE_SDK".to_string(), "1".to_string());
        variables.insert("MSSdk".to_string(), "1".to_string());
        variables.insert("WINDOWS_SDK_VERSION".to_string(), sdk.to_string());
        variables.insert("INCLUDE".to_string(), format!(r"{root}\Include"));
        variables.insert("LIB".to_string(), lib);
    }
    ToolchainEntry { runtime_version,
                     architecture: arch,
                     toolchain: toolchain.to_string(),
                     variables }
}
