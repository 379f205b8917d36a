//! Row-oriented text I/O for code sequences.
//!
//! Rows have the form `key CODE CODE …` with decimal codes. Bytes
//! configured as delimiters are remapped to the delimiter sentinel while
//! reading.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use crate::{CodeUnit, DELIMITER, PieceCodes, TrainerSpec};

/// Errors encountered reading code rows.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// Reading failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A token could not be parsed as a code.
    #[error("cannot parse {token:?} as a code on line {line}")]
    InvalidCode { line: usize, token: String },
}

/// Reader for `key CODE CODE …` rows.
///
/// Yields the key and the parsed code sequence per non-empty line.
pub struct RowReader<R> {
    reader:    R,
    delimiter: Vec<u8>,
    line:      usize,
}
impl<R: BufRead> RowReader<R> {
    /// Creates a row reader without delimiter remapping.
    pub fn new(reader: R) -> Self {
        Self::with_delimiter(reader, &[])
    }

    /// Creates a row reader remapping the given bytes to the delimiter
    /// sentinel.
    pub fn with_delimiter(reader: R, delimiter: &[u8]) -> Self {
        Self {
            reader,
            delimiter: delimiter.to_vec(),
            line: 0,
        }
    }

    fn parse(&self, line: &str) -> Result<(String, PieceCodes), RowError> {
        let mut tokens = line.split_whitespace();
        let key = tokens.next().unwrap_or_default().to_string();
        let mut codes = PieceCodes::new();
        for token in tokens {
            if token.len() == 1 && self.delimiter.contains(&token.as_bytes()[0]) {
                codes.push(DELIMITER);
                continue;
            }
            let code = token.parse::<CodeUnit>().map_err(|_| RowError::InvalidCode {
                line:  self.line,
                token: token.to_string(),
            })?;
            codes.push(code);
        }
        Ok((key, codes))
    }
}
impl<R: BufRead> Iterator for RowReader<R> {
    type Item = Result<(String, PieceCodes), RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut line = String::new();
            self.line += 1;
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(error) => return Some(Err(error.into())),
            }
            if line.trim().is_empty() {
                continue;
            }
            return Some(self.parse(&line));
        }
    }
}

/// Writer for `key VALUE VALUE …` rows.
pub struct RowWriter<W> {
    writer: W,
}
impl<W: Write> RowWriter<W> {
    /// Creates a row writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a row of decimal codes.
    pub fn write_codes(&mut self, key: &str, codes: &[CodeUnit]) -> std::io::Result<()> {
        write!(self.writer, "{}", key)?;
        for code in codes {
            write!(self.writer, " {}", code)?;
        }
        writeln!(self.writer)
    }

    /// Writes a row of formatted pieces.
    pub fn write_pieces(&mut self, key: &str, pieces: &[String]) -> std::io::Result<()> {
        write!(self.writer, "{}", key)?;
        for piece in pieces {
            write!(self.writer, " {}", piece)?;
        }
        writeln!(self.writer)
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Iterator over the corpus rows of every input file of a training
/// configuration, in order, with keys dropped.
pub(crate) struct CorpusReader {
    files:     Vec<String>,
    delimiter: Vec<u8>,
    index:     usize,
    current:   Option<RowReader<BufReader<File>>>,
}
impl CorpusReader {
    pub fn new(spec: &TrainerSpec) -> Self {
        Self {
            files:     spec.input.clone(),
            delimiter: spec.delimiter_bytes().to_vec(),
            index:     0,
            current:   None,
        }
    }
}
impl Iterator for CorpusReader {
    type Item = Result<PieceCodes, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reader) = &mut self.current {
                match reader.next() {
                    Some(Ok((_, codes))) => return Some(Ok(codes)),
                    Some(Err(error)) => return Some(Err(error)),
                    None => self.current = None,
                }
            }
            if self.index >= self.files.len() {
                return None;
            }
            let path = &self.files[self.index];
            self.index += 1;
            log::info!("Loading corpus: {}", path);
            match File::open(path) {
                Ok(file) => {
                    self.current =
                        Some(RowReader::with_delimiter(BufReader::new(file), &self.delimiter));
                }
                Err(error) => return Some(Err(error.into())),
            }
        }
    }
}
