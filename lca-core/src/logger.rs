use csv::Writer;
use serde::Serialize;
use std::fs;
use std::io;

/// One row of the Monte-Carlo iteration log: enough to reconstruct the
/// shape of an iteration without re-running it.
#[derive(Debug, Serialize)]
struct IterationLogEntry {
    iteration: u64,
    succeeded: bool,
    flow_totals_json: String,
    impact_totals_json: String,
    total_cost: f64,
}

/// Writes one CSV row per Monte-Carlo iteration, mirroring the shape of a
/// time-series logger: a cheap, append-only audit trail a caller can
/// replay or plot externally without the core depending on a charting
/// crate.
pub struct IterationLogger {
    writer: Writer<fs::File>,
}

impl IterationLogger {
    pub fn new(path: &str) -> Result<Self, io::Error> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log_iteration(
        &mut self,
        iteration: u64,
        succeeded: bool,
        flow_totals: &[f64],
        impact_totals: &[f64],
        total_cost: f64,
    ) -> Result<(), anyhow::Error> {
        let entry = IterationLogEntry {
            iteration,
            succeeded,
            flow_totals_json: serde_json::to_string(flow_totals)?,
            impact_totals_json: serde_json::to_string(impact_totals)?,
            total_cost,
        };
        self.writer.serialize(entry)?;
        self.writer.flush()?;
        Ok(())
    }
}
