//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//! El archivo de matriz y los flags de la CLI tienen prioridad sobre estos valores.
use dotenvy::dotenv;
use log::LevelFilter;
use matrix_core::StageTimeouts;
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Raíz de los prefijos por tupla.
    pub work_dir: PathBuf,
    pub parallel: bool,
    /// Workers en modo paralelo; `None` = uno por tupla.
    pub jobs: Option<usize>,
    pub log_level: LevelFilter,
    pub timeouts: StageTimeouts,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { work_dir: PathBuf::from(".matrixflow"),
               parallel: false,
               jobs: None,
               log_level: LevelFilter::Info,
               timeouts: StageTimeouts::default() }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero leyendo de `lookup`. Valores ilegibles se
    /// ignoran y queda el default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            lookup(key).and_then(|v| v.trim().parse::<u64>().ok())
                       .map(Duration::from_secs)
                       .unwrap_or(fallback)
        };
        Self { work_dir: lookup("MATRIXFLOW_WORK_DIR").filter(|v| !v.trim().is_empty())
                                                      .map(PathBuf::from)
                                                      .unwrap_or(defaults.work_dir),
               parallel: lookup("MATRIXFLOW_PARALLEL").and_then(|v| parse_bool(&v)).unwrap_or(defaults.parallel),
               jobs: lookup("MATRIXFLOW_JOBS").and_then(|v| v.trim().parse().ok()).filter(|n: &usize| *n > 0),
               log_level: lookup("MATRIXFLOW_LOG").and_then(|v| v.trim().parse().ok()).unwrap_or(defaults.log_level),
               timeouts: StageTimeouts { provision: secs("MATRIXFLOW_PROVISION_TIMEOUT_SECS", defaults.timeouts.provision),
                                         build: secs("MATRIXFLOW_BUILD_TIMEOUT_SECS", defaults.timeouts.build),
                                         test: secs("MATRIXFLOW_TEST_TIMEOUT_SECS", defaults.timeouts.test) } }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
