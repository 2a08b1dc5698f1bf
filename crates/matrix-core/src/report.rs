//! Resultado agregado de la matriz.
//!
//! `PipelineResult` es append-only: una entrada por tupla, en el orden del
//! descriptor, independientemente del resultado de las demás.
use matrix_domain::TupleId;
use serde::Serialize;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::errors::StageError;
use crate::event::TupleEvent;
use crate::model::TestReport;
use crate::repo::StageSlot;
use crate::stage::{Stage, TupleState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Success,
    ProvisionFailed,
    ResolveFailed,
    BuildFailed,
    TestFailed,
    Cancelled,
}

impl Outcome {
    pub fn from_state(state: &TupleState) -> Outcome {
        match state {
            TupleState::Succeeded => Outcome::Success,
            TupleState::Failed { reason: StageError::Cancelled, .. } => Outcome::Cancelled,
            TupleState::Failed { stage, .. } => match stage {
                Stage::Provisioning => Outcome::ProvisionFailed,
                Stage::Resolving => Outcome::ResolveFailed,
                Stage::Building => Outcome::BuildFailed,
                Stage::Testing => Outcome::TestFailed,
            },
            // Una tupla sin estado terminal no llegó a completarse.
            TupleState::Pending | TupleState::Running(_) => Outcome::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineEntry {
    pub tuple: TupleId,
    pub run_id: Uuid,
    pub outcome: Outcome,
    pub state: TupleState,
    pub stage_reached: Option<Stage>,
    /// Estado y tiempos por stage, reconstruidos por replay.
    pub stages: Vec<StageSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_report: Option<TestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_fingerprint: Option<String>,
    pub events: Vec<TupleEvent>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResult {
    entries: Vec<PipelineEntry>,
}

impl PipelineResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PipelineEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[PipelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` sólo si todas las tuplas terminaron en `Succeeded`.
    pub fn is_success(&self) -> bool {
        self.entries.iter().all(|e| e.outcome == Outcome::Success)
    }

    /// Código de salida del proceso: 0 sii todas las tuplas tuvieron éxito.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Tabla resumen (tupla → stage alcanzado → resultado) para el operador.
    pub fn render_summary(&self) -> String {
        let rows: Vec<[String; 5]> = self.entries
                                         .iter()
                                         .map(|e| {
                                             let stage = e.stage_reached.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
                                             let detail = match &e.state {
                                                 TupleState::Failed { reason, .. } => reason.to_string(),
                                                 _ => e.test_report
                                                       .as_ref()
                                                       .map(|r| format!("{} passed", r.passed))
                                                       .unwrap_or_default(),
                                             };
                                             [e.tuple.to_string(), stage, format!("{:?}", e.outcome), e.elapsed_label(), detail]
                                         })
                                         .collect();
        let header = ["TUPLE", "STAGE REACHED", "OUTCOME", "TIME", "DETAIL"];
        let mut widths = header.map(str::len);
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }
        let mut out = String::new();
        let mut line = |cells: [&str; 5]| {
            let _ = writeln!(out,
                             "{:<w0$}  {:<w1$}  {:<w2$}  {:<w3$}  {}",
                             cells[0],
                             cells[1],
                             cells[2],
                             cells[3],
                             cells[4],
                             w0 = widths[0],
                             w1 = widths[1],
                             w2 = widths[2],
                             w3 = widths[3]);
        };
        line(header);
        for row in &rows {
            line([&row[0], &row[1], &row[2], &row[3], &row[4]]);
        }
        let failed = self.entries.iter().filter(|e| e.outcome != Outcome::Success).count();
        let _ = writeln!(out, "{} tuple(s), {} failed", self.entries.len(), failed);
        out
    }
}

impl PipelineEntry {
    /// Suma de la duración de los stages terminados.
    pub fn elapsed_ms(&self) -> i64 {
        self.stages.iter().filter_map(StageSlot::duration_ms).sum()
    }

    fn elapsed_label(&self) -> String {
        if self.stages.iter().all(|s| s.duration_ms().is_none()) {
            "-".to_string()
        } else {
            format!("{:.1}s", self.elapsed_ms() as f64 / 1000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_domain::ConfigurationTuple;

    fn entry(v: &str, state: TupleState) -> PipelineEntry {
        PipelineEntry { tuple: ConfigurationTuple::parse(v, 64).unwrap().id(),
                        run_id: Uuid::new_v4(),
                        outcome: Outcome::from_state(&state),
                        stage_reached: None,
                        stages: vec![],
                        state,
                        toolchain: None,
                        test_report: None,
                        run_fingerprint: None,
                        events: vec![] }
    }

    #[test]
    fn outcome_mapping() {
        let timeout = TupleState::Failed { stage: Stage::Building,
                                           reason: StageError::Timeout { stage: Stage::Building,
                                                                         limit_ms: 1000 } };
        assert_eq!(Outcome::from_state(&timeout), Outcome::BuildFailed);
        let cancelled = TupleState::Failed { stage: Stage::Testing,
                                             reason: StageError::Cancelled };
        assert_eq!(Outcome::from_state(&cancelled), Outcome::Cancelled);
    }

    #[test]
    fn exit_code_and_summary() {
        let mut r = PipelineResult::new();
        r.push(entry("2.7", TupleState::Succeeded));
        assert_eq!(r.exit_code(), 0);
        r.push(entry("3.9",
                     TupleState::Failed { stage: Stage::Resolving,
                                          reason: StageError::UnsupportedConfiguration { runtime_version: "3.9".into(),
                                                                                         architecture: 64 } }));
        assert_eq!(r.exit_code(), 1);
        let table = r.render_summary();
        assert!(table.starts_with("TUPLE"));
        assert!(table.contains("3.9-64"));
        assert!(table.contains("ResolveFailed"));
        assert!(table.ends_with("2 tuple(s), 1 failed\n"));
    }

    #[test]
    fn elapsed_time_sums_finished_stages() {
        use crate::stage::StageStatus;
        use chrono::{Duration, TimeZone, Utc};

        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let slot = |stage, status, start: i64, end: Option<i64>| StageSlot { stage,
                                                                             status,
                                                                             fingerprint: None,
                                                                             error: None,
                                                                             started_at: Some(t0 + Duration::milliseconds(start)),
                                                                             finished_at: end.map(|ms| t0 + Duration::milliseconds(ms)) };
        let mut e = entry("2.7", TupleState::Succeeded);
        e.stages = vec![slot(Stage::Provisioning, StageStatus::FinishedOk, 0, Some(1500)),
                        slot(Stage::Building, StageStatus::Failed, 2000, Some(3000)),
                        slot(Stage::Testing, StageStatus::Running, 3000, None)];
        assert_eq!(e.elapsed_ms(), 2500);

        let mut r = PipelineResult::new();
        r.push(e);
        r.push(entry("3.4", TupleState::Succeeded));
        let table = r.render_summary();
        assert!(table.lines().next().is_some_and(|h| h.contains("TIME")));
        assert!(table.lines().nth(1).is_some_and(|l| l.contains("2.5s")));
        assert!(table.lines().nth(2).is_some_and(|l| l.contains("  -  ")));
    }
}
