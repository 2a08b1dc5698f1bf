//! Parseo de argumentos de `matrixflow`.

use matrix_core::ExecutionMode;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::errors::AppError;

pub const USAGE: &str = "\
Uso:
  matrixflow run <matrix.json> [--parallel] [--jobs N] [--only <tupla>]... [--report <out.json>]
  matrixflow plan <matrix.json>
  matrixflow resolve <version> <bits>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub matrix: PathBuf,
    pub parallel: bool,
    pub jobs: Option<usize>,
    /// Ids `version-bits` a ejecutar; vacío = todas.
    pub only: Vec<String>,
    pub report: Option<PathBuf>,
}

impl RunOptions {
    /// CLI > entorno. `--jobs` implica modo paralelo.
    pub fn execution_mode(&self, config: &AppConfig, tuples: usize) -> ExecutionMode {
        let jobs = self.jobs.or(config.jobs);
        if self.parallel || self.jobs.is_some() || config.parallel {
            ExecutionMode::Parallel { jobs: jobs.unwrap_or(tuples).max(1) }
        } else {
            ExecutionMode::Sequential
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run(RunOptions),
    Plan { matrix: PathBuf },
    Resolve { version: String, bits: u32 },
    Help,
}

/// `args` sin el nombre del programa.
pub fn parse_args(args: &[String]) -> Result<CliCommand, AppError> {
    let usage = |msg: &str| AppError::Usage(msg.to_string());
    let Some(command) = args.first() else {
        return Err(usage("falta el comando"));
    };
    match command.as_str() {
        "run" => {
            let mut matrix: Option<PathBuf> = None;
            let mut opts = RunOptions { matrix: PathBuf::new(),
                                        parallel: false,
                                        jobs: None,
                                        only: vec![],
                                        report: None };
            let mut i = 1;
            while i < args.len() {
                match args[i].as_str() {
                    "--parallel" => opts.parallel = true,
                    "--jobs" => {
                        i += 1;
                        let n = args.get(i)
                                    .and_then(|v| v.parse::<usize>().ok())
                                    .filter(|n| *n > 0)
                                    .ok_or_else(|| usage("--jobs espera un entero positivo"))?;
                        opts.jobs = Some(n);
                    }
                    "--only" => {
                        i += 1;
                        opts.only.push(args.get(i).ok_or_else(|| usage("--only espera un id de tupla"))?.clone());
                    }
                    "--report" => {
                        i += 1;
                        opts.report = Some(PathBuf::from(args.get(i).ok_or_else(|| usage("--report espera una ruta"))?));
                    }
                    flag if flag.starts_with("--") => return Err(usage(&format!("flag desconocido {flag}"))),
                    path if matrix.is_none() => matrix = Some(PathBuf::from(path)),
                    extra => return Err(usage(&format!("argumento inesperado {extra}"))),
                }
                i += 1;
            }
            opts.matrix = matrix.ok_or_else(|| usage("falta <matrix.json>"))?;
            Ok(CliCommand::Run(opts))
        }
        "plan" => match args.get(1..) {
            Some([path]) => Ok(CliCommand::Plan { matrix: PathBuf::from(path) }),
            _ => Err(usage("plan espera exactamente <matrix.json>")),
        },
        "resolve" => match args.get(1..) {
            Some([version, bits]) => {
                let bits = bits.parse().map_err(|_| usage("<bits> debe ser 32 o 64"))?;
                Ok(CliCommand::Resolve { version: version.clone(),
                                         bits })
            }
            _ => Err(usage("resolve espera <version> <bits>")),
        },
        "help" | "--help" | "-h" => Ok(CliCommand::Help),
        other => Err(usage(&format!("comando desconocido {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn run_with_all_flags() {
        let cmd = parse_args(&args(&["run", "m.json", "--jobs", "3", "--only", "2.7-32", "--only", "3.4-64", "--report", "r.json"])).unwrap();
        let CliCommand::Run(opts) = cmd else { panic!("expected run") };
        assert_eq!(opts.matrix, PathBuf::from("m.json"));
        assert_eq!(opts.jobs, Some(3));
        assert_eq!(opts.only, vec!["2.7-32", "3.4-64"]);
        assert_eq!(opts.report, Some(PathBuf::from("r.json")));
        assert_eq!(opts.execution_mode(&AppConfig::default(), 5), ExecutionMode::Parallel { jobs: 3 });
    }

    #[test]
    fn sequential_unless_asked() {
        let CliCommand::Run(opts) = parse_args(&args(&["run", "m.json"])).unwrap() else { panic!("expected run") };
        assert_eq!(opts.execution_mode(&AppConfig::default(), 4), ExecutionMode::Sequential);
        let env = AppConfig { parallel: true,
                              ..AppConfig::default() };
        assert_eq!(opts.execution_mode(&env, 4), ExecutionMode::Parallel { jobs: 4 });
    }

    #[test]
    fn usage_errors() {
        for bad in [vec![], vec!["run"], vec!["run", "m.json", "--jobs", "0"], vec!["run", "a", "b"], vec!["plan"],
                    vec!["resolve", "2.7"], vec!["resolve", "2.7", "x"], vec!["deploy"]]
        {
            assert!(matches!(parse_args(&args(&bad)), Err(AppError::Usage(_))), "{bad:?}");
        }
    }

    #[test]
    fn resolve_and_plan() {
        assert_eq!(parse_args(&args(&["resolve", "3.4", "64"])).unwrap(),
                   CliCommand::Resolve { version: "3.4".into(),
                                         bits: 64 });
        assert_eq!(parse_args(&args(&["plan", "m.json"])).unwrap(),
                   CliCommand::Plan { matrix: PathBuf::from("m.json") });
    }
}
