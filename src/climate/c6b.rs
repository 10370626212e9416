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

//! The binary `c6b` format. All numbers are little endian.
//!
//! | Content | Type |
//! |---|---|
//! | [`MAGIC_FIRST_NUMBER`], [`MAGIC_SECOND_NUMBER`] | `u32`, `u32` |
//! | Version (major in the lowest byte, minor in the next one) | `u32` |
//! | Reserved (always 0) | `u32` |
//! | Number of `KEY=value` strings | `u32` |
//! | The strings (length followed by the bytes) | `u32`, `[u8]` |
//! | One vector per channel (length followed by the values) | `u32`, `[f64]` |
//! | Time points (optional) | `u32`, `[f64]` |
//!
//! Missing values are stored as `-9999`.

use std::fs::File;
use std::io::{BufWriter, ErrorKind as IoErrorKind, Read, Write};
use std::path::Path;

use tracing::warn;

use super::{ClimateDataLoader, ClimateDataSet, ClimateHeader, NUM_COMPONENTS};
use crate::error::{ClimateError, InFile};
use crate::Float;

/// First word of every `c6b` file
pub const MAGIC_FIRST_NUMBER: u32 = 0x4243_4943;

/// Second word of every `c6b` file
pub const MAGIC_SECOND_NUMBER: u32 = 0x0036_4243;

const MAJOR_VERSION: u32 = 1;
const MINOR_VERSION: u32 = 0;

/// Longest header string accepted
const MAX_STRING_LENGTH: usize = 2000;

/// Longest vector accepted
const MAX_VECTOR_LENGTH: usize = 10_000_000;

const MISSING_VALUE: i64 = -9999;

const KEYWORDS: [&str; 10] = [
    "COUNTRY",
    "CITY",
    "WMO",
    "SOURCE",
    "TIMEZONE",
    "LATITUDE",
    "LONGITUDE",
    "STARTYEAR",
    "ELEVATION",
    "COMMENT",
];

fn invalid<T>(message: impl Into<String>) -> Result<T, ClimateError> {
    Err(ClimateError::InvalidBinaryData(message.into()))
}

/// Reads a `u32`. Returns `None` if the file ends exactly before it.
fn read_u32_or_eof<R: Read>(reader: &mut R) -> Result<Option<u32>, ClimateError> {
    let mut buf = [0_u8; 4];
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) if read == 0 => return Ok(None),
            Ok(0) => return invalid("unexpected end of file"),
            Ok(n) => read += n,
            Err(e) if e.kind() == IoErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Some(u32::from_le_bytes(buf)))
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, ClimateError> {
    match read_u32_or_eof(reader)? {
        Some(v) => Ok(v),
        None => invalid("unexpected end of file"),
    }
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), ClimateError> {
    reader.read_exact(buf).or_else(|e| {
        if e.kind() == IoErrorKind::UnexpectedEof {
            invalid("unexpected end of file")
        } else {
            Err(e.into())
        }
    })
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, ClimateError> {
    let len = read_u32(reader)? as usize;
    if len > MAX_STRING_LENGTH {
        return invalid(format!(
            "header string of length {} exceeds the limit of {}",
            len, MAX_STRING_LENGTH
        ));
    }
    let mut buf = vec![0_u8; len];
    read_exact(reader, &mut buf)?;
    String::from_utf8(buf).or_else(|_| invalid("header string is not valid UTF-8"))
}

fn read_values<R: Read>(reader: &mut R, len: u32) -> Result<Vec<Float>, ClimateError> {
    let len = len as usize;
    if len > MAX_VECTOR_LENGTH {
        return invalid(format!(
            "vector of length {} exceeds the limit of {}",
            len, MAX_VECTOR_LENGTH
        ));
    }
    let mut buf = vec![0_u8; len * 8];
    read_exact(reader, &mut buf)?;
    let values = buf
        .chunks_exact(8)
        .map(|c| {
            let mut word = [0_u8; 8];
            word.copy_from_slice(c);
            f64::from_le_bytes(word) as Float
        })
        .collect();
    Ok(values)
}

fn apply_keyword(header: &mut ClimateHeader, entry: &str) -> Result<(), ClimateError> {
    let (key, value) = match entry.split_once('=') {
        Some((k, v)) => (k.trim(), v.trim()),
        // A comment may be stored without '='
        None if entry.trim() == "COMMENT" => ("COMMENT", ""),
        None => return invalid(format!("invalid key-value entry '{}'", entry)),
    };
    if key != "COMMENT" && value.contains('=') {
        return invalid(format!("invalid key-value entry '{}'", entry));
    }
    let number = |v: &str| -> Result<Option<Float>, ClimateError> {
        if v.is_empty() {
            return Ok(None);
        }
        match v.parse::<Float>() {
            Ok(x) => Ok(Some(x)),
            Err(_) => invalid(format!("invalid number in entry '{}'", entry)),
        }
    };
    match key {
        "COUNTRY" => header.country = value.to_string(),
        "CITY" => header.city = value.to_string(),
        "WMO" => header.wmo_code = value.to_string(),
        "SOURCE" => header.source = value.to_string(),
        "COMMENT" => header.comment = value.to_string(),
        "TIMEZONE" => {
            if let Some(tz) = number(value)? {
                header.time_zone = tz as i32
            }
        }
        "STARTYEAR" => {
            if let Some(y) = number(value)? {
                header.start_year = y as i32
            }
        }
        "LATITUDE" => header.latitude_deg = number(value)?,
        "LONGITUDE" => header.longitude_deg = number(value)?,
        "ELEVATION" => header.elevation = number(value)?,
        _ => warn!("Ignoring unknown keyword '{}' in c6b header", key),
    }
    Ok(())
}

/// Parses a `c6b` file
pub fn parse<R: Read>(reader: &mut R, header_only: bool) -> Result<ClimateDataSet, ClimateError> {
    if read_u32(reader)? != MAGIC_FIRST_NUMBER {
        return invalid("wrong first magic number");
    }
    if read_u32(reader)? != MAGIC_SECOND_NUMBER {
        return invalid("wrong second magic number");
    }
    let version = read_u32(reader)?;
    let major = version & 0xff;
    if major != MAJOR_VERSION {
        return invalid(format!(
            "unsupported file version {}.{}",
            major,
            (version >> 8) & 0xff
        ));
    }
    // reserved
    read_u32(reader)?;

    let mut header = ClimateHeader::default();
    let n_keywords = read_u32(reader)?;
    for _ in 0..n_keywords {
        let entry = read_string(reader)?;
        apply_keyword(&mut header, &entry)?;
    }
    if header.city.is_empty() {
        warn!("Missing CITY name in c6b file");
        header.city = "---".to_string();
    }

    let mut data_set = ClimateDataSet {
        header,
        ..ClimateDataSet::default()
    };
    if header_only {
        return Ok(data_set);
    }

    for c in 0..NUM_COMPONENTS {
        let len = read_u32(reader)?;
        let values = read_values(reader, len)?;
        if c > 0 && values.len() != data_set.data[0].len() {
            return invalid(format!(
                "data vector #{} has length {}, but previous vectors have length {}",
                c,
                values.len(),
                data_set.data[0].len()
            ));
        }
        data_set.data[c] = values
            .into_iter()
            .map(|v| if v as i64 == MISSING_VALUE { None } else { Some(v) })
            .collect();
    }
    if let Some(len) = read_u32_or_eof(reader)? {
        data_set.time_points = read_values(reader, len)?;
    }

    Ok(data_set)
}

fn write_string<W: Write>(out: &mut W, s: &str) -> Result<(), ClimateError> {
    if s.len() > MAX_STRING_LENGTH {
        return invalid(format!("header string '{}' is too long", s));
    }
    out.write_all(&(s.len() as u32).to_le_bytes())?;
    out.write_all(s.as_bytes())?;
    Ok(())
}

fn write_values<W, I>(out: &mut W, len: usize, values: I) -> Result<(), ClimateError>
where
    W: Write,
    I: Iterator<Item = Float>,
{
    out.write_all(&(len as u32).to_le_bytes())?;
    for v in values {
        out.write_all(&(v as f64).to_le_bytes())?;
    }
    Ok(())
}

impl ClimateDataLoader {
    /// Writes the data in the binary `c6b` format
    pub fn write_climate_data_c6b<P: AsRef<Path>>(&self, path: P) -> Result<(), ClimateError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.write_c6b(&mut out).in_file(path)
    }

    fn write_c6b<W: Write>(&self, out: &mut W) -> Result<(), ClimateError> {
        let version = MAJOR_VERSION | (MINOR_VERSION << 8);
        for word in [MAGIC_FIRST_NUMBER, MAGIC_SECOND_NUMBER, version, 0] {
            out.write_all(&word.to_le_bytes())?;
        }

        let h = &self.header;
        let optional = |v: Option<Float>| v.map(|v| v.to_string()).unwrap_or_default();
        let values = [
            h.country.clone(),
            h.city.clone(),
            h.wmo_code.clone(),
            h.source.clone(),
            h.time_zone.to_string(),
            optional(h.latitude_deg),
            optional(h.longitude_deg),
            h.start_year.to_string(),
            optional(h.elevation),
            h.comment.clone(),
        ];
        out.write_all(&(KEYWORDS.len() as u32).to_le_bytes())?;
        for (key, value) in KEYWORDS.iter().zip(values.iter()) {
            write_string(out, &format!("{}={}", key, value))?;
        }

        for c in super::ClimateComponent::ALL {
            let data = self.data(c);
            let values = data.iter().map(|v| v.unwrap_or(MISSING_VALUE as Float));
            write_values(out, data.len(), values)?;
        }
        let time_points = self.time_points();
        write_values(out, time_points.len(), time_points.iter().copied())?;
        out.flush()?;
        Ok(())
    }
}
