use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sim::params::PidGains;
use crate::tune::{Axis, GainSet};

/// Outcome of one simulated autotune session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub axis: Axis,
    pub level: u8,
    pub duration_s: f64,
    /// FF that exactly cancels the simulated airframe's authority.
    pub ideal_ff: f32,
    pub initial: PidGains,
    /// Live controller gains after leaving autotune.
    pub final_live: PidGains,
    pub durable: PidGains,
    pub restore: GainSet,
    pub last_save: GainSet,
    /// Number of tuner decisions (adjustments and discards).
    pub decisions: u32,
    pub actions: BTreeMap<String, u32>,
    pub durable_writes: usize,
    pub shape_writes: usize,
}

/// Write the summary as pretty-printed JSON.
pub fn write_summary<W: Write>(mut writer: W, summary: &SessionSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_summary_file(path: &Path, summary: &SessionSummary) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_summary(file, summary)
}
