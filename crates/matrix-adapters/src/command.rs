//! Ejecución de colaboradores externos como comandos opacos.
//!
//! El core sólo mira (código de salida, stdout, stderr). Cada llamada tiene un
//! límite de tiempo: al vencer se mata al hijo junto con todo su grupo de
//! procesos y se devuelve `CommandError::TimedOut`, que cada adapter traduce
//! al fallo de su stage.

use indexmap::IndexMap;
use log::debug;
use matrix_core::{Stage, StageError};
use matrix_domain::{ConfigurationTuple, TupleId};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Máximo de bytes capturados por stream; el resto se descarta.
const OUTPUT_CAP: usize = 1024 * 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command line")]
    Empty,
    #[error("could not start '{program}': {source}")]
    Spawn { program: String, source: std::io::Error },
    #[error("'{program}' timed out after {limit_ms}ms")]
    TimedOut { program: String, limit_ms: u64 },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Traduce el error al fallo del stage. Los timeouts conservan su
    /// categoría; el resto se construye con `otherwise`.
    pub fn into_stage_error(self, stage: Stage, otherwise: impl FnOnce(String) -> StageError) -> StageError {
        match self {
            CommandError::TimedOut { limit_ms, .. } => StageError::Timeout { stage, limit_ms },
            other => otherwise(other.to_string()),
        }
    }
}

/// Línea de comando con placeholders `{nombre}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CommandTemplate {
    argv: Vec<String>,
}

impl CommandTemplate {
    pub fn new<I, S>(argv: I) -> Result<Self, CommandError>
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(CommandError::Empty);
        }
        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn render(&self, vars: &Placeholders) -> Vec<String> {
        self.argv.iter().map(|a| vars.substitute(a)).collect()
    }

    /// Construye el `Command` sin ejecutarlo.
    pub fn to_command(&self, vars: &Placeholders, cwd: Option<&Path>) -> Command {
        let argv = self.render(vars);
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl TryFrom<Vec<String>> for CommandTemplate {
    type Error = CommandError;

    fn try_from(argv: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(argv)
    }
}

impl From<CommandTemplate> for Vec<String> {
    fn from(t: CommandTemplate) -> Self {
        t.argv
    }
}

/// Valores para los placeholders de una tupla.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: IndexMap<&'static str, String>,
}

impl Placeholders {
    pub fn for_id(id: &TupleId, prefix: &Path) -> Self {
        Self::default().with("version", id.runtime_version.as_str())
                       .with("arch", id.architecture.cpu_name())
                       .with("bits", id.architecture.bits().to_string())
                       .with("prefix", prefix.display().to_string())
    }

    pub fn for_tuple(tuple: &ConfigurationTuple, prefix: &Path) -> Self {
        let flags: Vec<&str> = tuple.extra_flags().iter().map(String::as_str).collect();
        Self::for_id(&tuple.id(), prefix).with("flags", flags.join(","))
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Reemplaza `{clave}` en una sola pasada; el texto insertado no se
    /// vuelve a examinar y las claves desconocidas quedan literales.
    pub fn substitute(&self, arg: &str) -> String {
        let mut out = String::with_capacity(arg.len());
        let mut rest = arg;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = tail.find('}').and_then(|close| self.values.get(&tail[1..close]).map(|v| (v, close)));
            match value {
                Some((v, close)) => {
                    out.push_str(v);
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Variables que reciben todos los comandos de una tupla.
pub fn tuple_env(id: &TupleId, prefix: &Path) -> [(&'static str, String); 3] {
    [("MATRIX_RUNTIME_VERSION", id.runtime_version.to_string()),
     ("MATRIX_ARCH", id.architecture.bits().to_string()),
     ("MATRIX_PREFIX", prefix.display().to_string())]
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout seguido de stderr, para adjuntar a errores.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}{}", self.stdout, self.stderr)
        }
    }
}

/// Ejecuta `cmd` capturando stdout/stderr y respetando `timeout`.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<CommandOutput, CommandError> {
    let program = cmd.get_program().to_string_lossy().to_string();
    debug!("exec {:?}", cmd);
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    own_process_group(&mut cmd);
    let mut child = cmd.spawn()
                       .map_err(|source| CommandError::Spawn { program: program.clone(),
                                                               source })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_thread = thread::spawn(move || stdout.map(|s| read_capped(s, OUTPUT_CAP)).unwrap_or_default());
    let stderr_thread = thread::spawn(move || stderr.map(|s| read_capped(s, OUTPUT_CAP)).unwrap_or_default());

    let (status, timed_out) = wait_with_deadline(&mut child, timeout)?;
    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();
    if timed_out {
        return Err(CommandError::TimedOut { program,
                                            limit_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX) });
    }
    Ok(CommandOutput { exit_code: status.code(),
                       stdout: String::from_utf8_lossy(&stdout).into_owned(),
                       stderr: String::from_utf8_lossy(&stderr).into_owned() })
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<(ExitStatus, bool), CommandError> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            kill_process_group(child);
            let status = child.wait()?;
            return Ok((status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// El hijo lidera su propio grupo: un timeout alcanza también a los procesos
/// que lance, y el SIGINT de la terminal no llega a ellos.
#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    match libc::pid_t::try_from(child.id()) {
        // SAFETY: killpg sólo recibe enteros; el pgid es el pid del hijo, que
        // aún no fue recolectado por wait.
        Ok(pgid) => unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        },
        Err(_) => {
            let _ = child.kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}

fn read_capped<R: Read>(mut reader: R, cap: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = cap.saturating_sub(buf.len());
                buf.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn placeholders_are_substituted() {
        let tuple = ConfigurationTuple::parse("2.7", 32).unwrap().with_flags(["a", "b"]);
        let vars = Placeholders::for_tuple(&tuple, &PathBuf::from("/tmp/env")).with("name", "numpy");
        let t = CommandTemplate::new(["conda", "install", "python={version}", "--prefix={prefix}", "{name}", "{flags}-{bits}"]).unwrap();
        assert_eq!(t.render(&vars),
                   vec!["conda", "install", "python=2.7", "--prefix=/tmp/env", "numpy", "a,b-32"]);
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let vars = Placeholders::default().with("name", "{version}")
                                          .with("version", "2.7");
        assert_eq!(vars.substitute("{name}=={version} {unknown} {"), "{version}==2.7 {unknown} {");
        assert_eq!(vars.substitute("{{version}}"), "{2.7}");
    }

    #[test]
    fn empty_template_is_rejected() {
        assert!(matches!(CommandTemplate::new(Vec::<String>::new()), Err(CommandError::Empty)));
        assert!(serde_json::from_str::<CommandTemplate>(r#"[" "]"#).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err 1>&2; exit 3"]);
        let out = run_with_timeout(cmd, Duration::from_secs(10)).unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.success());
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.combined(), "out\nerr\n");
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_the_child() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exec sleep 5"]);
        let started = Instant::now();
        let err = run_with_timeout(cmd, Duration::from_millis(200)).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        let stage_err = err.into_stage_error(Stage::Building, StageError::Internal);
        assert_eq!(stage_err,
                   StageError::Timeout { stage: Stage::Building,
                                         limit_ms: 200 });
        assert_eq!(stage_err.to_string(), "Building exceeded its 200ms timeout");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cmd = Command::new("definitely-not-a-real-installer-binary");
        assert!(matches!(run_with_timeout(cmd, Duration::from_secs(1)), Err(CommandError::Spawn { .. })));
    }
}
