//! Fixed-schema autotune telemetry.
//!
//! A session emits at most one [`TuneRecord`] every 40 ms. Sinks are
//! best-effort: a failed write is reported back to the session, which logs it
//! and carries on.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use serde::Serialize;

use crate::error::{Result, TuneError};

/// One telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TuneRecord {
    pub time_us: u64,
    pub axis: u8,
    pub state: u8,
    pub actuator: f32,
    pub desired_rate: f32,
    pub actual_rate: f32,
    pub ff_single: f32,
    pub ff: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub action: u8,
    pub rmax: f32,
    pub tau: f32,
}

pub trait TelemetrySink {
    fn write_record(&mut self, record: &TuneRecord) -> Result<()>;
}

// ---------------------------------------------------------------------------
// CSV encoder
// ---------------------------------------------------------------------------

/// Writes records as CSV rows with a header derived from the field names.
pub struct CsvTelemetry<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvTelemetry<W> {
    pub fn new(inner: W) -> Self {
        Self { writer: csv::Writer::from_writer(inner) }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| TuneError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
    }
}

impl CsvTelemetry<std::fs::File> {
    pub fn create(path: &std::path::Path) -> Result<Self> {
        Ok(Self::new(std::fs::File::create(path)?))
    }
}

impl<W: Write> TelemetrySink for CsvTelemetry<W> {
    fn write_record(&mut self, record: &TuneRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory recorder
// ---------------------------------------------------------------------------

/// Collects records in memory. Clones share the same buffer, so one handle
/// can be given to a session while another reads the results.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    records: Rc<RefCell<Vec<TuneRecord>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TuneRecord> {
        self.records.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl TelemetrySink for Recorder {
    fn write_record(&mut self, record: &TuneRecord) -> Result<()> {
        self.records.borrow_mut().push(*record);
        Ok(())
    }
}
