//! Stages del pipeline por tupla y su máquina de estados.
//!
//! Cada tupla avanza linealmente por `Stage::ORDER`; el estado observable de
//! la tupla es un `TupleState` y el de cada stage un `StageStatus`.

mod state;
mod status;

pub use state::TupleState;
pub use status::StageStatus;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Provisioning,
    Resolving,
    Building,
    Testing,
}

impl Stage {
    /// Orden fijo de ejecución.
    pub const ORDER: [Stage; 4] = [Stage::Provisioning, Stage::Resolving, Stage::Building, Stage::Testing];

    pub fn index(self) -> usize {
        match self {
            Stage::Provisioning => 0,
            Stage::Resolving => 1,
            Stage::Building => 2,
            Stage::Testing => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Stage> {
        Stage::ORDER.get(i).copied()
    }

    pub fn next(self) -> Option<Stage> {
        Stage::from_index(self.index() + 1)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Provisioning => "Provisioning",
            Stage::Resolving => "Resolving",
            Stage::Building => "Building",
            Stage::Testing => "Testing",
        };
        f.write_str(s)
    }
}
