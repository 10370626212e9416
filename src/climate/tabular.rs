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
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ClimateComponent, ClimateDataLoader};
use crate::error::{ClimateError, InFile};
use crate::units::Unit;
use crate::Float;

/// The value written in tables in place of missing data
pub const MISSING_VALUE: Float = -9999.;

/// A single time series read from a file, with its unit and
/// the name of the quantity it represents
#[derive(Debug, Clone)]
pub struct TaggedSeries {
    /// The name of the quantity (e.g., `Temperature`)
    pub quantity: String,
    /// The unit of the values
    pub unit: Unit,
    /// The time points, in seconds
    pub time_points: Vec<Float>,
    /// The values
    pub values: Vec<Float>,
    /// Comments found in the file
    pub comment: String,
}

/// Splits `file.tsv?3` into `file.tsv` and `3`. Without suffix, the
/// column is 1 (i.e., the first column after time).
pub fn split_column_suffix(path: &Path) -> (PathBuf, usize) {
    let s = path.to_string_lossy();
    if let Some((file, column)) = s.rsplit_once('?') {
        if let Ok(column) = column.trim().parse::<usize>() {
            return (PathBuf::from(file), column);
        }
    }
    (path.to_path_buf(), 1)
}

/// Splits `Temperature [C]` into `Temperature` and `C`. The unit is
/// empty if there are no brackets.
pub fn split_caption(caption: &str) -> (String, String) {
    let caption = caption.trim();
    if let (Some(open), Some(close)) = (caption.rfind('['), caption.rfind(']')) {
        if open < close {
            let name = caption[..open].trim().to_string();
            let unit = caption[open + 1..close].trim().to_string();
            return (name, unit);
        }
    }
    (caption.to_string(), String::new())
}

/// Parses a table whose first line contains captions like
/// `Time [h]    Temperature [C]    ...`, separated by tabs (or commas, if
/// there are no tabs). The first column is time.
pub fn parse_tagged_table<R: BufRead>(reader: R, column: usize) -> Result<TaggedSeries, ClimateError> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(l) => l?,
        None => {
            return Err(ClimateError::MalformedHeader {
                line: 1,
                message: "empty file".into(),
            })
        }
    };
    let separator = if header.contains('\t') { '\t' } else { ',' };
    let captions: Vec<(String, String)> = header.split(separator).map(split_caption).collect();
    let n_columns = captions.len();
    if n_columns < 2 || column == 0 || column >= n_columns {
        return Err(ClimateError::MalformedHeader {
            line: 1,
            message: format!(
                "cannot use column {} of a table with {} columns",
                column, n_columns
            ),
        });
    }

    let time_unit = Unit::from_name(&captions[0].1)?;
    let (quantity, unit) = &captions[column];
    let unit = if unit.is_empty() {
        Unit::from_name("-")?
    } else {
        Unit::from_name(unit)?
    };
    let seconds = Unit::from_name("s")?;

    let mut time_points = Vec::new();
    let mut values = Vec::new();
    for (i, line) in lines.enumerate() {
        let line_number = i + 2;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split(separator).collect();
        if tokens.len() != n_columns {
            return Err(ClimateError::ColumnCountMismatch {
                line: line_number,
                expected: n_columns,
                found: tokens.len(),
            });
        }
        let parse = |s: &str| -> Result<Float, ClimateError> {
            s.trim()
                .parse::<Float>()
                .map_err(|_| ClimateError::MalformedDataLine {
                    line: line_number,
                    message: format!("'{}' is not a number", s),
                })
        };
        let t = time_unit.convert(parse(tokens[0])?, &seconds)?;
        if let Some(last) = time_points.last() {
            if t <= *last {
                return Err(ClimateError::NonMonotonicOrDuplicateTimestamp { line: line_number });
            }
        }
        time_points.push(t);
        values.push(parse(tokens[column])?);
    }

    Ok(TaggedSeries {
        quantity: quantity.clone(),
        unit,
        time_points,
        values,
        comment: String::new(),
    })
}

/// Reads a table from a file, accepting a `?column` suffix in the path
pub fn read_tagged_table<P: AsRef<Path>>(path: P) -> Result<TaggedSeries, ClimateError> {
    let (file_path, column) = split_column_suffix(path.as_ref());
    let file = File::open(&file_path).map_err(|_| ClimateError::FileNotFound(file_path.clone()))?;
    parse_tagged_table(BufReader::new(file), column).in_file(&file_path)
}

impl ClimateDataLoader {
    /// Writes the data as a tab separated table. Missing
    /// values are written as `-9999`.
    pub fn write_climate_data_tsv<P: AsRef<Path>>(&self, path: P) -> Result<(), ClimateError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.write_tsv(&mut out).in_file(path)
    }

    fn write_tsv<W: Write>(&self, out: &mut W) -> Result<(), ClimateError> {
        let hourly = self.time_points().is_empty();
        write!(out, "{}", if hourly { "Time [h]" } else { "Time [d]" })?;
        for c in ClimateComponent::ALL {
            write!(out, "\t{} [{}]", c, c.unit())?;
        }
        writeln!(out)?;

        let n = self.data(ClimateComponent::Temperature).len();
        for i in 0..n {
            if hourly {
                write!(out, "{}", i + 1)?;
            } else {
                write!(out, "{}", self.time_points()[i] / 86400.)?;
            }
            for c in ClimateComponent::ALL {
                write!(out, "\t{}", self.data(c)[i].unwrap_or(MISSING_VALUE))?;
            }
            writeln!(out)?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::climate::{ClimateDataSet, ClimateHeader, HOURS_PER_YEAR};
    use crate::error::ErrorKind;
    use validate::assert_close;

    #[test]
    fn test_split_suffix() {
        let (p, c) = split_column_suffix(Path::new("some/dir/file.tsv?3"));
        assert_eq!(p, PathBuf::from("some/dir/file.tsv"));
        assert_eq!(c, 3);
        let (p, c) = split_column_suffix(Path::new("some/dir/file.tsv"));
        assert_eq!(p, PathBuf::from("some/dir/file.tsv"));
        assert_eq!(c, 1);
    }

    #[test]
    fn test_split_caption() {
        assert_eq!(
            split_caption(" Relative Humidity [%] "),
            ("Relative Humidity".to_string(), "%".to_string())
        );
        assert_eq!(split_caption("Hour"), ("Hour".to_string(), String::new()));
    }

    #[test]
    fn test_parse() -> Result<(), ClimateError> {
        let table = "Time [h]\tTemperature [C]\tPressure [hPa]\n0\t10\t1013\n1\t12\t1012\n\n2\t14\t1011\n";
        let s = parse_tagged_table(table.as_bytes(), 2)?;
        assert_eq!(s.quantity, "Pressure");
        assert_eq!(s.unit.name(), "hPa");
        assert_eq!(s.time_points, vec![0., 3600., 7200.]);
        assert_close!(s.values[2], 1011.);

        let s = parse_tagged_table("Time [d],Rain\n0,1\n0.5,2".as_bytes(), 1)?;
        assert_eq!(s.unit.name(), "-");
        assert_close!(s.time_points[1], 43200.);
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        let e = parse_tagged_table("Time [h]\tT [C]\n0\t1\n1".as_bytes(), 1).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ColumnCountMismatch);
        assert_eq!(e.line(), Some(3));

        let e = parse_tagged_table("Time [h]\tT [C]\n0\t1\n0\t2".as_bytes(), 1).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NonMonotonicOrDuplicateTimestamp);

        let e = parse_tagged_table("Time [h]\tT [C]\n0\tabc".as_bytes(), 1).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedDataLine);

        let e = parse_tagged_table("Time [h]\tT [C]\n0\t1".as_bytes(), 2).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedHeader);

        let e = parse_tagged_table("Time [parsecs]\tT [C]\n0\t1".as_bytes(), 1).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnknownOrIncompatibleUnit);
    }

    #[test]
    fn test_write_and_read_back() -> Result<(), ClimateError> {
        let mut ds = ClimateDataSet::hourly(ClimateHeader::default());
        *ds.channel_mut(ClimateComponent::WindVelocity) =
            (0..HOURS_PER_YEAR).map(|i| Some((i % 10) as Float)).collect();
        let mut loader = ClimateDataLoader::new();
        loader.load(ds)?;

        let path = std::env::temp_dir().join("climate_write_and_read_back.tsv");
        loader.write_climate_data_tsv(&path)?;

        let column = ClimateComponent::WindVelocity.index() + 1;
        let s = read_tagged_table(format!("{}?{}", path.display(), column))?;
        assert_eq!(s.quantity, "WindVelocity");
        assert_eq!(s.values.len(), HOURS_PER_YEAR);
        assert_close!(s.time_points[0], 3600.);
        assert_close!(s.values[13], 3.);

        let s = read_tagged_table(format!("{}?1", path.display()))?;
        assert_close!(s.values[0], MISSING_VALUE);
        Ok(())
    }
}
