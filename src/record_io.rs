//! Delimited record input and incremental record output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::protocol::Record;

/// Destination for processed records.
pub trait RecordSink {
    fn write_record(&mut self, record: &Record) -> Result<(), String>;
    /// Pushes buffered records to the underlying file.
    fn flush(&mut self) -> Result<(), String>;
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads every record of a delimited file. No row is treated as a header.
///
/// Empty lines come back as records with no fields so that row numbers match
/// the physical lines of the input.
pub fn read_records(path: &Path, delimiter: u8) -> Result<Vec<Record>, String> {
    let contents = std::fs::read(path)
        .map_err(|err| format!("failed to open input {}: {err}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(contents.as_slice());

    let mut records: Vec<Record> = Vec::new();
    let mut row = csv::StringRecord::new();
    let mut consumed = if contents.starts_with(UTF8_BOM) {
        UTF8_BOM.len()
    } else {
        0
    };
    loop {
        let has_row = reader.read_record(&mut row).map_err(|err| {
            format!(
                "failed to read record {} of {}: {err}",
                records.len(),
                path.display()
            )
        })?;
        let next_consumed = usize::try_from(reader.position().byte())
            .unwrap_or(contents.len())
            .clamp(consumed, contents.len());
        let previous_ended_with_cr = consumed > 0 && contents[consumed - 1] == b'\r';
        let blank_lines =
            skipped_blank_lines(&contents[consumed..next_consumed], previous_ended_with_cr);
        records.extend(std::iter::repeat_with(Record::new).take(blank_lines));
        consumed = next_consumed;

        if !has_row {
            break;
        }
        records.push(row.iter().map(ToOwned::to_owned).collect());
    }
    Ok(records)
}

/// Counts the empty lines the csv reader stepped over at the start of `chunk`.
///
/// A record never starts with a line break, so every leading break is an
/// empty line, except the `\n` of a CRLF whose `\r` ended the previous chunk.
fn skipped_blank_lines(chunk: &[u8], previous_ended_with_cr: bool) -> usize {
    let mut breaks = 0usize;
    let mut index = 0;
    while let Some(&byte) = chunk.get(index) {
        match byte {
            b'\r' => {
                breaks += 1;
                if chunk.get(index + 1) == Some(&b'\n') {
                    index += 1;
                }
            }
            b'\n' => breaks += 1,
            _ => break,
        }
        index += 1;
    }
    if previous_ended_with_cr && chunk.first() == Some(&b'\n') {
        breaks = breaks.saturating_sub(1);
    }
    breaks
}

/// `RecordSink` that writes csv-quoted rows using the input delimiter.
///
/// A record with no fields is written as an empty line.
pub struct CsvRecordSink<W: Write> {
    output: BufWriter<W>,
    delimiter: u8,
}

impl CsvRecordSink<File> {
    /// Creates (or truncates) the file at `path`.
    pub fn create(path: &Path, delimiter: u8) -> Result<Self, String> {
        let file = File::create(path)
            .map_err(|err| format!("failed to create output {}: {err}", path.display()))?;
        Ok(Self::from_writer(file, delimiter))
    }
}

impl<W: Write> CsvRecordSink<W> {
    pub fn from_writer(inner: W, delimiter: u8) -> Self {
        Self {
            output: BufWriter::new(inner),
            delimiter,
        }
    }

    fn encode(&self, record: &Record) -> Result<Vec<u8>, String> {
        if record.is_empty() {
            return Ok(b"\n".to_vec());
        }
        let mut encoder = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .buffer_capacity(256)
            .from_writer(Vec::new());
        encoder
            .write_record(record)
            .map_err(|err| format!("failed to write record: {err}"))?;
        encoder
            .into_inner()
            .map_err(|err| format!("failed to write record: {}", err.error()))
    }
}

impl<W: Write> RecordSink for CsvRecordSink<W> {
    fn write_record(&mut self, record: &Record) -> Result<(), String> {
        let line = self.encode(record)?;
        self.output
            .write_all(&line)
            .map_err(|err| format!("failed to write record: {err}"))
    }

    fn flush(&mut self) -> Result<(), String> {
        self.output
            .flush()
            .map_err(|err| format!("failed to flush output: {err}"))
    }
}

/// Quarantine file next to `dest_path`: `genre.csv` becomes `genre_failed.csv`.
pub fn default_quarantine_path(dest_path: &Path) -> PathBuf {
    let stem = dest_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let file_name = match dest_path.extension() {
        Some(extension) => format!("{stem}_failed.{}", extension.to_string_lossy()),
        None => format!("{stem}_failed"),
    };
    dest_path.with_file_name(file_name)
}
