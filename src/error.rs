/*
MIT License
Copyright (c) 2021 Germán Molina
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use crate::Float;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A flat description of what went wrong, without the context
/// (i.e., the file) in which it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file does not exist or cannot be opened
    FileNotFound,
    /// A header line could not be understood
    MalformedHeader,
    /// A unit is unknown, or cannot be converted into the one we need
    UnknownOrIncompatibleUnit,
    /// A data line could not be understood
    MalformedDataLine,
    /// Time points are not strictly increasing
    NonMonotonicOrDuplicateTimestamp,
    /// A row has the wrong number of columns
    ColumnCountMismatch,
    /// A series was meant to be cyclic but it is not
    AnnualCyclicConstraintViolation,
    /// A gap in hourly data cannot be filled
    InconsistentGapFill,
    /// The number of rows is not what it should be
    RowCountMismatch,
    /// Time requested is out of the range covered by the data
    TimeOutOfRange,
    /// A surface that was never registered
    InvalidSurfaceId,
    /// A spline could not be built
    SplineConstructionFailure,
    /// The format is unknown or the operation is not supported by the format
    UnsupportedFormat,
    /// A binary file is corrupt
    InvalidBinaryData,
    /// Reading or writing failed
    Io,
    /// Options could not be parsed
    Options,
}

/// The error returned by everything in this crate that can fail.
///
/// Errors coming out of parsers are wrapped into [`ClimateError::InFile`] so
/// that the file in which they happened is known. Printing the error
/// prints the whole chain.
#[derive(Debug, Error)]
pub enum ClimateError {
    /// The file does not exist or is not accessible
    #[error("climate data file '{}' does not exist or is not accessible", .0.display())]
    FileNotFound(PathBuf),

    /// A header line is wrong
    #[error("bad header in line {line}: {message}")]
    MalformedHeader {
        /// Line number, starting from 1
        line: usize,
        /// What is wrong
        message: String,
    },

    /// Unknown unit, or unit with the wrong dimensions
    #[error("unknown or incompatible unit: {0}")]
    UnknownOrIncompatibleUnit(String),

    /// A data line is wrong
    #[error("invalid format in line {line}: {message}")]
    MalformedDataLine {
        /// Line number, starting from 1
        line: usize,
        /// What is wrong
        message: String,
    },

    /// Time points must be strictly increasing
    #[error("time point in line {line} is not larger than the previous one")]
    NonMonotonicOrDuplicateTimestamp {
        /// Line number, starting from 1
        line: usize,
    },

    /// Wrong number of columns
    #[error("expected {expected} columns but found {found} in line {line}")]
    ColumnCountMismatch {
        /// Line number, starting from 1
        line: usize,
        /// The number of columns that should be there
        expected: usize,
        /// The number of columns found
        found: usize,
    },

    /// The data does not fulfil the requirements for being used cyclically
    #[error("data cannot be used cyclically: {0}")]
    AnnualCyclicConstraintViolation(String),

    /// A hole in hourly data is bounded by two different values
    #[error("missing hourly values after {time_before} s, and previous value '{value_before}' and next value '{value_after}' (at {time_after} s) differ")]
    InconsistentGapFill {
        /// Time of the last value before the gap
        time_before: Float,
        /// Time of the first value after the gap
        time_after: Float,
        /// Value before the gap
        value_before: Float,
        /// Value after the gap
        value_after: Float,
    },

    /// Wrong number of rows
    #[error("expected {expected} rows of data but found {found}")]
    RowCountMismatch {
        /// The number of rows that should be there
        expected: usize,
        /// The number of rows found
        found: usize,
    },

    /// Time is not covered by non-cyclic data
    #[error("time point {seconds_of_year} s of year {year} is out of range: data covers {first} s to {last} s counted from the start year {start_year}")]
    TimeOutOfRange {
        /// The year requested
        year: i32,
        /// The time of the year requested
        seconds_of_year: Float,
        /// First time point in the data
        first: Float,
        /// Last time point in the data
        last: Float,
        /// The year in which the data starts
        start_year: i32,
    },

    /// Asked for a surface that does not exist
    #[error("invalid surface ID {0}")]
    InvalidSurfaceId(usize),

    /// A spline could not be built
    #[error("could not build linear spline: {0}")]
    SplineConstructionFailure(String),

    /// Format not known, or not able to do what was asked
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Corrupt binary data
    #[error("invalid binary data: {0}")]
    InvalidBinaryData(String),

    /// Input/Output
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Options are not valid JSON
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),

    /// Something went wrong while processing a file
    #[error("error reading '{}': {source}", path.display())]
    InFile {
        /// The file
        path: PathBuf,
        /// What went wrong
        #[source]
        source: Box<ClimateError>,
    },
}

impl ClimateError {
    /// Wraps the error with the file in which it happened.
    pub fn in_file<P: AsRef<Path>>(self, path: P) -> Self {
        ClimateError::InFile {
            path: path.as_ref().to_path_buf(),
            source: Box::new(self),
        }
    }

    /// The kind of the innermost error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClimateError::FileNotFound(_) => ErrorKind::FileNotFound,
            ClimateError::MalformedHeader { .. } => ErrorKind::MalformedHeader,
            ClimateError::UnknownOrIncompatibleUnit(_) => ErrorKind::UnknownOrIncompatibleUnit,
            ClimateError::MalformedDataLine { .. } => ErrorKind::MalformedDataLine,
            ClimateError::NonMonotonicOrDuplicateTimestamp { .. } => {
                ErrorKind::NonMonotonicOrDuplicateTimestamp
            }
            ClimateError::ColumnCountMismatch { .. } => ErrorKind::ColumnCountMismatch,
            ClimateError::AnnualCyclicConstraintViolation(_) => {
                ErrorKind::AnnualCyclicConstraintViolation
            }
            ClimateError::InconsistentGapFill { .. } => ErrorKind::InconsistentGapFill,
            ClimateError::RowCountMismatch { .. } => ErrorKind::RowCountMismatch,
            ClimateError::TimeOutOfRange { .. } => ErrorKind::TimeOutOfRange,
            ClimateError::InvalidSurfaceId(_) => ErrorKind::InvalidSurfaceId,
            ClimateError::SplineConstructionFailure(_) => ErrorKind::SplineConstructionFailure,
            ClimateError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ClimateError::InvalidBinaryData(_) => ErrorKind::InvalidBinaryData,
            ClimateError::Io(_) => ErrorKind::Io,
            ClimateError::Options(_) => ErrorKind::Options,
            ClimateError::InFile { source, .. } => source.kind(),
        }
    }

    /// The innermost file in which the error happened, if known
    pub fn file(&self) -> Option<&Path> {
        match self {
            ClimateError::InFile { path, source } => source.file().or(Some(path.as_path())),
            ClimateError::FileNotFound(path) => Some(path.as_path()),
            _ => None,
        }
    }

    /// The line in which the error happened, if known
    pub fn line(&self) -> Option<usize> {
        match self {
            ClimateError::MalformedHeader { line, .. }
            | ClimateError::MalformedDataLine { line, .. }
            | ClimateError::NonMonotonicOrDuplicateTimestamp { line }
            | ClimateError::ColumnCountMismatch { line, .. } => Some(*line),
            ClimateError::InFile { source, .. } => source.line(),
            _ => None,
        }
    }
}

/// Adds the file to errors coming out of a `Result`
pub(crate) trait InFile<T> {
    /// Wraps the error, if any, with the path to the file
    fn in_file<P: AsRef<Path>>(self, path: P) -> Result<T, ClimateError>;
}

impl<T> InFile<T> for Result<T, ClimateError> {
    fn in_file<P: AsRef<Path>>(self, path: P) -> Result<T, ClimateError> {
        self.map_err(|e| e.in_file(path))
    }
}
