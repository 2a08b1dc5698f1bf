use log::error;
use matrix_adapters::TableToolchainResolver;
use matrix_core::{MatrixDriver, PipelineResult, ToolchainResolver};
use matrix_domain::ConfigurationTuple;
use matrixflow::cli::{parse_args, CliCommand, RunOptions, USAGE};
use matrixflow::interrupt;
use matrixflow::plan::render_plan;
use matrixflow::run_report::finish_run;
use matrixflow::{AppError, MatrixFile, CONFIG};

fn main() {
    let config = &*CONFIG;
    let _ = matrixflow::logging::init(config.log_level);
    let args: Vec<String> = std::env::args().skip(1).collect();

    let code = match parse_args(&args).and_then(dispatch) {
        Ok(code) => code,
        Err(e @ AppError::Usage(_)) => {
            eprintln!("{e}\n{USAGE}");
            AppError::EXIT_CODE
        }
        Err(e) => {
            error!("{e}");
            eprintln!("[matrixflow] {e}");
            AppError::EXIT_CODE
        }
    };
    std::process::exit(code);
}

fn dispatch(command: CliCommand) -> Result<i32, AppError> {
    match command {
        CliCommand::Run(opts) => {
            let result = run(&opts)?;
            print!("{}", result.render_summary());
            Ok(finish_run(&result, opts.report.as_deref()))
        }
        CliCommand::Plan { matrix } => {
            let file = MatrixFile::load(&matrix)?;
            let descriptor = file.descriptor()?;
            let resolver = TableToolchainResolver::new(file.toolchain_table()?);
            print!("{}", render_plan(&descriptor, &resolver));
            Ok(0)
        }
        CliCommand::Resolve { version, bits } => {
            let tuple = ConfigurationTuple::parse(&version, bits)?;
            match TableToolchainResolver::pinned().resolve(&tuple) {
                Ok(ctx) => {
                    println!("{}", ctx.toolchain());
                    for (k, v) in ctx.variables() {
                        println!("{k}={v}");
                    }
                    Ok(0)
                }
                Err(e) => {
                    eprintln!("{e}");
                    Ok(1)
                }
            }
        }
        CliCommand::Help => {
            println!("{USAGE}");
            Ok(0)
        }
    }
}

fn run(opts: &RunOptions) -> Result<PipelineResult, AppError> {
    let config = &*CONFIG;
    let file = MatrixFile::load(&opts.matrix)?;
    let mut descriptor = file.descriptor()?;
    if !opts.only.is_empty() {
        descriptor = descriptor.retain_ids(&opts.only)?;
    }
    let mode = opts.execution_mode(config, descriptor.len());
    let stages = file.stage_set(&config.work_dir, config.timeouts)?;
    let mut driver = MatrixDriver::builder(descriptor, stages).mode(mode).build();
    interrupt::install(driver.cancellation_token());
    Ok(driver.run())
}
