// src/csv.rs
//! Delimited-text adapters: batched reading and result writing.

use std::fs::OpenOptions;
use std::io::{self, BufRead, BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::error::Error;
use crate::record::{Record, FIELDS_PER_ROW};

/// Lazily yields bounded batches of raw rows from one delimited source.
///
/// Each line splits on the delimiter into at most [`FIELDS_PER_ROW`] fields;
/// text after the fifth field is ignored. Blank lines are skipped. Batches
/// carry at most `batch_rows` rows; the final batch may be smaller and the
/// end of input is signaled by the iterator finishing. A read error ends the
/// stream and must be treated as fatal by the consumer.
pub struct BatchReader<R> {
    reader: R,
    delimiter: char,
    batch_rows: usize,
    line: String,
    done: bool,
}

impl<R: BufRead> BatchReader<R> {
    pub fn new(reader: R, delimiter: char, batch_rows: usize) -> Self {
        Self {
            reader,
            delimiter,
            batch_rows: batch_rows.max(1),
            line: String::new(),
            done: false,
        }
    }

    fn read_row(&mut self) -> io::Result<Option<Vec<String>>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let line = self.line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            let fields = line
                .split(self.delimiter)
                .take(FIELDS_PER_ROW)
                .map(str::to_owned)
                .collect();
            return Ok(Some(fields));
        }
    }
}

impl<R: BufRead> Iterator for BatchReader<R> {
    type Item = io::Result<Vec<Vec<String>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut batch = Vec::with_capacity(self.batch_rows);
        while batch.len() < self.batch_rows {
            match self.read_row() {
                Ok(Some(row)) => batch.push(row),
                Ok(None) => {
                    self.done = true;
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

/// Writes the final records as delimiter-joined lines.
pub struct RecordWriter {
    overwrite: bool,
    delimiter: char,
}

impl RecordWriter {
    pub fn new(overwrite: bool, delimiter: char) -> Self {
        Self { overwrite, delimiter }
    }

    /// Write all records to `path`. Without the overwrite flag an existing
    /// destination yields [`Error::OutputExists`]; the check rides on
    /// `create_new`, so there is no window between check and create.
    pub fn write(&self, path: &Path, records: &[Record]) -> Result<(), Error> {
        let mut opts = OpenOptions::new();
        opts.write(true);
        if self.overwrite {
            opts.create(true).truncate(true);
        } else {
            opts.create_new(true);
        }

        let file = opts.open(path).map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                Error::OutputExists(path.to_path_buf())
            } else {
                Error::OutputWrite { path: path.to_path_buf(), source: e }
            }
        })?;

        let mut out = BufWriter::new(file);
        let d = self.delimiter;
        for r in records {
            writeln!(out, "{}{d}{}{d}{}{d}{}{d}{}", r.id, r.name, r.condition, r.state, r.price)
                .map_err(|e| Error::OutputWrite { path: path.to_path_buf(), source: e })?;
        }
        out.flush()
            .map_err(|e| Error::OutputWrite { path: path.to_path_buf(), source: e })
    }
}
