use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::SweepError;
use crate::record::SweepRecord;

/// Append-only destination for sweep records.
///
/// Every `emit` must reach the underlying writer before it returns, so rows
/// already emitted survive a later fatal error.
pub trait RecordSink {
    fn emit(&mut self, record: &SweepRecord) -> Result<(), SweepError>;
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn emit(&mut self, record: &SweepRecord) -> Result<(), SweepError> {
        (**self).emit(record)
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn emit(&mut self, record: &SweepRecord) -> Result<(), SweepError> {
        (**self).emit(record)
    }
}

/// Emits to both sinks, first to second.
impl<A: RecordSink, B: RecordSink> RecordSink for (A, B) {
    fn emit(&mut self, record: &SweepRecord) -> Result<(), SweepError> {
        self.0.emit(record)?;
        self.1.emit(record)
    }
}

/// Collects records in memory.
impl RecordSink for Vec<SweepRecord> {
    fn emit(&mut self, record: &SweepRecord) -> Result<(), SweepError> {
        self.push(record.clone());
        Ok(())
    }
}

fn create_file(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(BufWriter::new(file))
}

/// `|field|...|field|\r\n` rows.
#[derive(Debug)]
pub struct PipeSink<W: Write> {
    writer: W,
}

impl<W: Write> PipeSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl PipeSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        create_file(path.as_ref()).map(Self::new)
    }
}

impl<W: Write> RecordSink for PipeSink<W> {
    fn emit(&mut self, record: &SweepRecord) -> Result<(), SweepError> {
        write!(self.writer, "{}\r\n", record.pipe_row())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        create_file(path.as_ref()).map(Self::new)
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &SweepRecord) -> Result<(), SweepError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
