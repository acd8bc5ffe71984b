use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::sim::TraceRow;
use crate::telemetry::{CsvTelemetry, TelemetrySink, TuneRecord};

/// Write simulation trace rows as CSV.
///
/// Columns: time, attitude_cmd, attitude, rate, desired_rate, surface,
///          ff, p, i, d, dmod, state
pub fn write_trace<W: Write>(writer: W, trace: &[TraceRow]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    for row in trace {
        w.serialize(row)?;
    }
    w.flush()?;
    Ok(())
}

/// Write the trace to a CSV file at the given path.
pub fn write_trace_file(path: &Path, trace: &[TraceRow]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_trace(file, trace)
}

/// Write already-collected telemetry records to a CSV file.
pub fn write_telemetry_file(path: &Path, records: &[TuneRecord]) -> Result<()> {
    let mut sink = CsvTelemetry::create(path)?;
    for r in records {
        sink.write_record(r)?;
    }
    sink.into_inner()?.flush()?;
    Ok(())
}
