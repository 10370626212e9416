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

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{bbsr, c6b, epw, wac, ClimateDataSet};
use crate::error::{ClimateError, InFile};
use crate::Float;

/// The formats of climate files that can be read by the
/// [`super::ClimateDataLoader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimateFileFormat {
    /// EnergyPlus Weather files (`.epw`)
    Epw,
    /// WAC files (`.wac`)
    Wac,
    /// The binary format (`.c6b`)
    C6b,
    /// Test Reference Years of the BBSR (`.dat`)
    BbsrDat,
}

impl ClimateFileFormat {
    /// Chooses the format based on the extension of the file (case insensitive)
    pub fn from_path(path: &Path) -> Result<Self, ClimateError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "epw" => Ok(Self::Epw),
            "wac" => Ok(Self::Wac),
            "c6b" => Ok(Self::C6b),
            "dat" => Ok(Self::BbsrDat),
            _ => Err(ClimateError::UnsupportedFormat(format!(
                "unknown climate data file extension '{}'",
                ext
            ))),
        }
    }

    /// Reads a file in this format.
    pub fn read(self, path: &Path, header_only: bool) -> Result<ClimateDataSet, ClimateError> {
        let file = File::open(path).map_err(|_| ClimateError::FileNotFound(path.to_path_buf()))?;
        let mut reader = BufReader::new(file);
        match self {
            Self::Epw => epw::parse(reader, header_only),
            Self::Wac => wac::parse(reader, header_only),
            Self::C6b => c6b::parse(&mut reader, header_only),
            Self::BbsrDat => bbsr::parse(reader, header_only),
        }
        .in_file(path)
    }
}

/// Reads the next line of a text file; `line` is its number, for error messages.
pub(crate) fn header_line<I>(lines: &mut I, line: usize) -> Result<String, ClimateError>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    match lines.next() {
        Some(l) => Ok(l?),
        None => Err(ClimateError::MalformedHeader {
            line,
            message: "unexpected end of file".into(),
        }),
    }
}

/// Parses a number in a header line
pub(crate) fn header_number(token: &str, line: usize, what: &str) -> Result<Float, ClimateError> {
    token
        .trim()
        .parse::<Float>()
        .map_err(|_| ClimateError::MalformedHeader {
            line,
            message: format!("invalid {} '{}'", what, token.trim()),
        })
}

/// Parses a number in a data line
pub(crate) fn data_number(token: &str, line: usize) -> Result<Float, ClimateError> {
    token
        .trim()
        .parse::<Float>()
        .map_err(|_| ClimateError::MalformedDataLine {
            line,
            message: format!("'{}' is not a number", token.trim()),
        })
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_from_path() {
        assert_eq!(
            ClimateFileFormat::from_path(Path::new("a/b/Berlin.EPW")).unwrap(),
            ClimateFileFormat::Epw
        );
        assert_eq!(
            ClimateFileFormat::from_path(Path::new("Potsdam.c6b")).unwrap(),
            ClimateFileFormat::C6b
        );
        assert_eq!(
            ClimateFileFormat::from_path(Path::new("TRY2015_Zone1.dat")).unwrap(),
            ClimateFileFormat::BbsrDat
        );
        assert_eq!(
            ClimateFileFormat::from_path(Path::new("Dresden.wac")).unwrap(),
            ClimateFileFormat::Wac
        );
        let e = ClimateFileFormat::from_path(Path::new("climate.xlsx")).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnsupportedFormat);
        let e = ClimateFileFormat::from_path(Path::new("climate")).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_missing_file() {
        let e = ClimateFileFormat::Epw
            .read(Path::new("not/a/real/file.epw"), false)
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::FileNotFound);
    }
}
