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
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use calendar::Date;

use super::formats::{data_number, header_line, header_number};
use super::{ClimateComponent, ClimateDataLoader, ClimateDataSet, ClimateHeader, HOURS_PER_YEAR};
use crate::error::{ClimateError, InFile};
use crate::solar_radiation::SolarRadiationModel;
use crate::Float;

/// The number of lines before the data starts
const HEADER_LINES: usize = 8;

/// Minimum number of fields in a line of data
const MIN_FIELDS: usize = 22;

/// Where to find each channel in a line of data, and the value
/// used in EPW files for indicating that it is missing.
const FIELDS: [(ClimateComponent, usize, Float); 8] = [
    (ClimateComponent::Temperature, 6, 99.9),
    (ClimateComponent::RelativeHumidity, 8, 999.),
    (ClimateComponent::AirPressure, 9, 999999.),
    (ClimateComponent::LongWaveCounterRadiation, 12, 9999.),
    (ClimateComponent::DirectRadiationNormal, 14, 9999.),
    (ClimateComponent::DiffuseRadiationHorizontal, 15, 9999.),
    (ClimateComponent::WindDirection, 20, 999.),
    (ClimateComponent::WindVelocity, 21, 999.),
];

/// Liquid precipitation depth, in mm (i.e., l/m2 during the hour)
const RAIN_FIELD: usize = 33;
const RAIN_MISSING: Float = 999.;

fn missing_if(v: Float, sentinel: Float) -> Option<Float> {
    if (v - sentinel).abs() < 1e-6 {
        None
    } else {
        Some(v)
    }
}

/// Parses an EPW file
pub fn parse<R: BufRead>(reader: R, header_only: bool) -> Result<ClimateDataSet, ClimateError> {
    let mut lines = reader.lines();

    let location = header_line(&mut lines, 1)?;
    let tokens: Vec<&str> = location.trim().split(',').map(|t| t.trim()).collect();
    if tokens.len() < 10 {
        return Err(ClimateError::MalformedHeader {
            line: 1,
            message: format!(
                "expected at least 10 fields in LOCATION, found {}",
                tokens.len()
            ),
        });
    }
    let mut header = ClimateHeader {
        city: tokens[1].to_string(),
        country: tokens[3].to_string(),
        source: tokens[4].to_string(),
        wmo_code: tokens[5].to_string(),
        latitude_deg: Some(header_number(tokens[6], 1, "latitude")?),
        longitude_deg: Some(header_number(tokens[7], 1, "longitude")?),
        time_zone: header_number(tokens[8], 1, "time zone")? as i32,
        elevation: Some(header_number(tokens[9], 1, "elevation")?),
        ..ClimateHeader::default()
    };

    // DESIGN CONDITIONS, TYPICAL/EXTREME PERIODS, GROUND TEMPERATURES
    // and HOLIDAYS/DAYLIGHT SAVINGS
    for line in 2..=5 {
        header_line(&mut lines, line)?;
    }
    let mut comments = Vec::new();
    for line in 6..=7 {
        let l = header_line(&mut lines, line)?;
        if let Some((_, c)) = l.split_once(',') {
            let c = c.trim();
            if !c.is_empty() {
                comments.push(c.to_string());
            }
        }
    }
    header.comment = comments.join("\n");
    // DATA PERIODS
    header_line(&mut lines, HEADER_LINES)?;

    if header_only {
        return Ok(ClimateDataSet {
            header,
            ..ClimateDataSet::default()
        });
    }

    let mut data_set = ClimateDataSet::hourly(header);
    for hour in 0..HOURS_PER_YEAR {
        let line_number = HEADER_LINES + hour + 1;
        let line = match lines.next() {
            Some(l) => l?,
            None => {
                return Err(ClimateError::RowCountMismatch {
                    expected: HOURS_PER_YEAR,
                    found: hour,
                })
            }
        };
        let tokens: Vec<&str> = line.trim().split(',').collect();
        if tokens.len() < MIN_FIELDS {
            return Err(ClimateError::ColumnCountMismatch {
                line: line_number,
                expected: MIN_FIELDS,
                found: tokens.len(),
            });
        }
        if hour == 0 {
            data_set.header.start_year = data_number(tokens[0], line_number)? as i32;
        }
        for (c, field, sentinel) in FIELDS {
            let v = data_number(tokens[field], line_number)?;
            data_set.data[c.index()][hour] = missing_if(v, sentinel);
        }
        if let Some(rain) = tokens.get(RAIN_FIELD) {
            if !rain.trim().is_empty() {
                let v = data_number(rain, line_number)?;
                data_set.data[ClimateComponent::Rain.index()][hour] = missing_if(v, RAIN_MISSING);
            }
        }
    }
    Ok(data_set)
}

/// Dew point temperature (C) using the Magnus formula
fn dew_point(temperature: Float, relative_humidity: Float) -> Option<Float> {
    if relative_humidity <= 0.0 {
        return None;
    }
    let (b, c) = (17.62, 243.12);
    let gamma = (relative_humidity / 100.).ln() + b * temperature / (c + temperature);
    Some(c * gamma / (b - gamma))
}

impl ClimateDataLoader {
    /// Writes the data in EPW format. Only hourly data can be written.
    ///
    /// Global horizontal radiation is calculated from direct normal and diffuse
    /// horizontal radiation at the middle of each hour. Fields
    /// that are not known are written as missing.
    pub fn write_climate_data_epw<P: AsRef<Path>>(&self, path: P) -> Result<(), ClimateError> {
        let path = path.as_ref();
        if !self.time_points().is_empty() {
            return Err(ClimateError::UnsupportedFormat(
                "climate data with custom time points cannot be saved as EPW".into(),
            ))
            .in_file(path);
        }
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.write_epw(&mut out).in_file(path)
    }

    fn write_epw<W: Write>(&self, out: &mut W) -> Result<(), ClimateError> {
        let h = &self.header;
        writeln!(
            out,
            "LOCATION,{},-,{},{},{},{},{},{},{}",
            h.city,
            h.country,
            h.source,
            h.wmo_code,
            h.latitude_deg.unwrap_or(0.0),
            h.longitude_deg.unwrap_or(0.0),
            h.time_zone,
            h.elevation.unwrap_or(0.0)
        )?;
        writeln!(out, "DESIGN CONDITIONS,0")?;
        writeln!(out, "TYPICAL/EXTREME PERIODS,0")?;
        writeln!(out, "GROUND TEMPERATURES,0")?;
        writeln!(out, "HOLIDAYS/DAYLIGHT SAVINGS,No,0,0,0")?;
        let mut comments = h.comment.lines();
        writeln!(out, "COMMENTS 1,{}", comments.next().unwrap_or(""))?;
        writeln!(out, "COMMENTS 2,{}", comments.next().unwrap_or(""))?;
        writeln!(out, "DATA PERIODS,1,1,Data,Tuesday,1/1,12/31")?;

        let mut model = SolarRadiationModel::for_location(h);
        let data_source = "B8E7B8B8?9?0?0?0?0?0?0B8B8B8B8?0?0F8F8A7E7";
        let value = |c: ClimateComponent, i: usize| self.data(c)[i];
        let or_missing = |v: Option<Float>, missing: &str| match v {
            Some(v) => format!("{}", v),
            None => missing.to_string(),
        };

        for i in 0..HOURS_PER_YEAR {
            // Middle of the hour, so that the date never falls on a day boundary
            let date = Date::from_day_of_year((i as Float + 0.5) / 24.);
            let temperature = value(ClimateComponent::Temperature, i);
            let rh = value(ClimateComponent::RelativeHumidity, i);
            let dew = match (temperature, rh) {
                (Some(t), Some(rh)) => dew_point(t, rh),
                _ => None,
            };
            let dni = value(ClimateComponent::DirectRadiationNormal, i);
            let dhi = value(ClimateComponent::DiffuseRadiationHorizontal, i);
            let global = match (dni, dhi) {
                (Some(dni), Some(dhi)) => {
                    let t = i as Float * 3600. + 1800.;
                    Some(model.convert_normal_to_horizontal_radiation(t, dni) + dhi)
                }
                _ => None,
            };

            write!(
                out,
                "{},{},{},{},60,{}",
                h.start_year,
                date.month,
                date.day,
                i % 24 + 1,
                data_source
            )?;
            write!(out, ",{}", or_missing(temperature, "99.9"))?;
            write!(out, ",{}", or_missing(dew, "99.9"))?;
            write!(out, ",{}", or_missing(rh, "999"))?;
            write!(
                out,
                ",{}",
                or_missing(value(ClimateComponent::AirPressure, i), "999999")
            )?;
            // Extraterrestrial horizontal and direct normal radiation
            write!(out, ",9999,9999")?;
            write!(
                out,
                ",{}",
                or_missing(value(ClimateComponent::LongWaveCounterRadiation, i), "9999")
            )?;
            write!(out, ",{}", or_missing(global, "9999"))?;
            write!(out, ",{}", or_missing(dni, "9999"))?;
            write!(out, ",{}", or_missing(dhi, "9999"))?;
            // Illuminances and zenith luminance
            write!(out, ",999999,999999,999999,9999")?;
            write!(
                out,
                ",{}",
                or_missing(value(ClimateComponent::WindDirection, i), "999")
            )?;
            write!(
                out,
                ",{}",
                or_missing(value(ClimateComponent::WindVelocity, i), "999")
            )?;
            // Sky cover, visibility, ceiling height, present weather,
            // precipitable water, aerosol optical depth, snow depth,
            // days since last snowfall and albedo
            write!(out, ",99,99,9999,99999,0,999999999,999,.999,999,99,999")?;
            write!(
                out,
                ",{}",
                or_missing(value(ClimateComponent::Rain, i), "999")
            )?;
            // Liquid precipitation quantity
            writeln!(out, ",99")?;
        }
        out.flush()?;
        Ok(())
    }
}
