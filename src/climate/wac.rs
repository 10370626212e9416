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

//! WAC files are tab separated tables with a header like this:
//!
//! ```text
//! WAC
//! 10          # number of header lines, counting this one
//! Dresden     # city
//! Comment
//! 13.75       # longitude
//! 51.05       # latitude
//! 112         # elevation
//! 1           # time zone
//! 1           # time step, in hours
//! 8760        # number of rows
//! 11          # number of columns
//! TA  HREL  ISGH  ISD ...
//! ```
//!
//! Values in the header are the first (tab separated) token of each line.

use std::io::BufRead;

use calendar::Date;

use super::formats::{data_number, header_line, header_number};
use super::{ClimateComponent, ClimateDataSet, ClimateHeader, HOURS_PER_YEAR, NUM_COMPONENTS};
use crate::error::ClimateError;
use crate::solar_radiation::SolarRadiationModel;
use crate::{Float, SECONDS_PER_YEAR};

/// The number of header lines (after line 2) that carry metadata
const METADATA_LINES: usize = 9;

/// Where each quantity is in a row
#[derive(Debug, Default)]
struct Columns {
    channels: [Option<usize>; NUM_COMPONENTS],
    global_radiation: Option<usize>,
    time: Option<usize>,
}

impl Columns {
    fn from_captions(line: &str) -> Self {
        let mut columns = Columns::default();
        for (i, caption) in line.split('\t').map(|c| c.trim()).enumerate() {
            let channel = match caption {
                "TA" => ClimateComponent::Temperature,
                "HREL" => ClimateComponent::RelativeHumidity,
                // Horizontal, converted after reading
                "ISDH" => ClimateComponent::DirectRadiationNormal,
                "ISD" => ClimateComponent::DiffuseRadiationHorizontal,
                "WS" | "WV" => ClimateComponent::WindVelocity,
                "WD" => ClimateComponent::WindDirection,
                "RN" => ClimateComponent::Rain,
                "ILAH" => ClimateComponent::LongWaveCounterRadiation,
                "PSTA" => ClimateComponent::AirPressure,
                "ISGH" => {
                    columns.global_radiation = Some(i);
                    continue;
                }
                "TIME" => {
                    columns.time = Some(i);
                    continue;
                }
                _ => continue,
            };
            columns.channels[channel.index()] = Some(i);
        }
        columns
    }
}

/// Factor applied to each channel when reading
fn factor(c: ClimateComponent) -> Float {
    match c {
        // fraction to %
        ClimateComponent::RelativeHumidity => 100.,
        // hPa to Pa
        ClimateComponent::AirPressure => 100.,
        _ => 1.,
    }
}

/// Parses `yyyy-MM-dd hh:mm` (or `yyyy MM dd hh`, when `with_minutes` is false).
/// Returns the year and the seconds since the beginning of it.
fn parse_date_time(token: &str, line: usize, with_minutes: bool) -> Result<(i32, Float), ClimateError> {
    let bad = || ClimateError::MalformedDataLine {
        line,
        message: format!("invalid date/time '{}'", token.trim()),
    };
    let s = token.replace([':', '-'], " ");
    let fields: Vec<&str> = s.split_whitespace().collect();
    let expected = if with_minutes { 5 } else { 4 };
    if fields.len() < expected {
        return Err(bad());
    }
    let mut numbers = [0_i64; 5];
    for (n, f) in numbers.iter_mut().zip(fields.iter().take(expected)) {
        *n = f.parse().map_err(|_| bad())?;
    }
    let [year, month, day, hour, minute] = numbers;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(bad());
    }
    let date = Date {
        month: month as u8,
        day: day as u8,
        hour: 0.,
    };
    let day_of_year = date.day_of_year();
    // Rejects days beyond the end of the month (e.g., February 30)
    let midday = Date::from_day_of_year(day_of_year + 0.5);
    if midday.month != date.month || midday.day != date.day {
        return Err(bad());
    }
    let seconds = day_of_year * 86400. + hour as Float * 3600. + minute as Float * 60.;
    Ok((year as i32, seconds))
}

/// Parses a WAC file
pub fn parse<R: BufRead>(reader: R, header_only: bool) -> Result<ClimateDataSet, ClimateError> {
    let mut lines = reader.lines();

    let tag = header_line(&mut lines, 1)?;
    if !tag.contains("WAC") {
        return Err(ClimateError::MalformedHeader {
            line: 1,
            message: "invalid file format, expected WAC in line 1".into(),
        });
    }
    let count_line = header_line(&mut lines, 2)?;
    let header_count = count_line
        .split_whitespace()
        .next()
        .and_then(|t| t.parse::<usize>().ok())
        .ok_or_else(|| ClimateError::MalformedHeader {
            line: 2,
            message: "could not read the number of header lines".into(),
        })?;
    if header_count < METADATA_LINES + 1 {
        return Err(ClimateError::MalformedHeader {
            line: 2,
            message: format!(
                "expected at least {} header lines, found {}",
                METADATA_LINES + 1,
                header_count
            ),
        });
    }
    let mut metadata = Vec::with_capacity(header_count - 1);
    for line in 3..=header_count + 1 {
        metadata.push(header_line(&mut lines, line)?);
    }
    let first_token = |i: usize| metadata[i].split('\t').next().unwrap_or("");
    let number = |i: usize, what: &str| header_number(first_token(i), i + 3, what);

    let mut time_zone = number(5, "time zone")? as i32;
    if time_zone > 12 {
        time_zone -= 24;
    }
    let header = ClimateHeader {
        city: metadata[0].trim().to_string(),
        comment: metadata[1].to_string(),
        longitude_deg: Some(number(2, "longitude")?),
        latitude_deg: Some(number(3, "latitude")?),
        elevation: Some(number(4, "elevation")?),
        time_zone,
        ..ClimateHeader::default()
    };
    let time_step = number(6, "time step")?;
    let n_rows = number(7, "number of rows")? as usize;
    let n_columns = number(8, "number of columns")? as usize;

    let caption_line_number = header_count + 2;
    let captions = header_line(&mut lines, caption_line_number)?;
    let mut columns = Columns::from_captions(&captions);

    let cyclic = time_step == 1. && n_rows == HOURS_PER_YEAR;
    if columns.time.is_none() && !cyclic {
        return Err(ClimateError::MalformedHeader {
            line: caption_line_number,
            message: "files without a TIME column must have 8760 rows at 1 h intervals".into(),
        });
    }
    let direct = ClimateComponent::DirectRadiationNormal.index();
    let diffuse = ClimateComponent::DiffuseRadiationHorizontal.index();
    if let Some(global) = columns.global_radiation {
        if columns.channels[diffuse].is_none() {
            return Err(ClimateError::MalformedHeader {
                line: caption_line_number,
                message: "diffuse radiation (ISD) is required when global radiation (ISGH) is given"
                    .into(),
            });
        }
        columns.channels[direct] = Some(global);
    } else if columns.channels[direct].is_none() {
        return Err(ClimateError::MalformedHeader {
            line: caption_line_number,
            message: "either direct (ISDH) or global (ISGH) radiation is required".into(),
        });
    }

    if header_only {
        return Ok(ClimateDataSet {
            header,
            ..ClimateDataSet::default()
        });
    }

    let mut data_set = ClimateDataSet {
        header,
        ..ClimateDataSet::default()
    };
    for channel in data_set.data.iter_mut() {
        channel.reserve(n_rows);
    }

    for row in 0..n_rows {
        let line_number = caption_line_number + row + 1;
        let line = match lines.next() {
            Some(l) => l?,
            None => {
                return Err(ClimateError::RowCountMismatch {
                    expected: n_rows,
                    found: row,
                })
            }
        };
        let line = line.trim();
        if line.is_empty() {
            return Err(ClimateError::MalformedDataLine {
                line: line_number,
                message: format!("empty line, expected {} rows of data", n_rows),
            });
        }
        let tokens: Vec<&str> = line.split('\t').collect();
        if tokens.len() != n_columns {
            return Err(ClimateError::ColumnCountMismatch {
                line: line_number,
                expected: n_columns,
                found: tokens.len(),
            });
        }

        match (cyclic, columns.time) {
            (true, Some(time)) if row == 0 => {
                let (year, _) = parse_date_time(tokens[time], line_number, false)?;
                data_set.header.start_year = year;
            }
            (false, Some(time)) => {
                let (year, seconds) = parse_date_time(tokens[time], line_number, true)?;
                if row == 0 {
                    data_set.header.start_year = year;
                }
                let t = (year - data_set.header.start_year) as Float * SECONDS_PER_YEAR + seconds;
                if let Some(last) = data_set.time_points.last() {
                    if t <= *last {
                        return Err(ClimateError::NonMonotonicOrDuplicateTimestamp {
                            line: line_number,
                        });
                    }
                }
                data_set.time_points.push(t);
            }
            _ => {}
        }

        for c in ClimateComponent::ALL {
            let value = match columns.channels[c.index()] {
                Some(i) => Some(data_number(tokens[i], line_number)? * factor(c)),
                None => None,
            };
            data_set.data[c.index()].push(value);
        }

        if columns.global_radiation.is_some() {
            if let (Some(global), Some(d)) = (data_set.data[direct][row], data_set.data[diffuse][row]) {
                let v = global - d;
                if v < 0. {
                    return Err(ClimateError::MalformedDataLine {
                        line: line_number,
                        message: "global radiation must not be smaller than diffuse radiation".into(),
                    });
                }
                data_set.data[direct][row] = Some(v);
            }
        }
    }

    // Direct radiation is still horizontal
    let mut converter = SolarRadiationModel::for_location(&data_set.header);
    let time_points = data_set.time_points.clone();
    for (k, v) in data_set.data[direct].iter_mut().enumerate() {
        if let Some(horizontal) = v {
            let t = match time_points.get(k) {
                Some(t) => *t,
                // middle of the hour
                None => (k + 1) as Float * 3600. - 1800.,
            };
            *v = Some(converter.convert_horizontal_to_normal_radiation(t, *horizontal));
        }
    }

    Ok(data_set)
}
