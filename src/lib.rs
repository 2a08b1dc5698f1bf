//! matrixflow: orquestador de builds sobre una matriz de entornos.
//!
//! Este crate une las piezas de los crates del workspace:
//! - `config` lee el entorno (.env) una sola vez.
//! - `matrix_file` carga el archivo de matriz y construye los stages.
//! - `cli` y `plan` implementan la interfaz de línea de comandos.
//! - `logging` instala el backend de `log` usado por el binario.
//! - `interrupt` traduce Ctrl-C en cancelación de la matriz.
//! - `run_report` cierra `run`: reporte JSON y código de salida.

pub mod cli;
pub mod config;
pub mod errors;
pub mod interrupt;
pub mod logging;
pub mod matrix_file;
pub mod plan;
pub mod run_report;

pub use config::{AppConfig, CONFIG};
pub use errors::AppError;
pub use matrix_file::MatrixFile;
