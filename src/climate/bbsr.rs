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

//! Test Reference Years published by the BBSR/DWD. The header
//! looks like this:
//!
//! ```text
//! Koordinatensystem : Lambert konform konisch
//! Rechtswert        : 4062500 Meter
//! Hochwert          : 2574500 Meter
//! Hoehenlage        : 241 Meter ueber NN
//! ...
//!     RW      HW MM DD HH     t    p  WR   WG N    x  RF    B    D   A    E IL
//! ***
//! ```
//!
//! followed by 8760 rows with 17 values each.

use std::io::BufRead;

use super::formats::{data_number, header_line, header_number};
use super::{ClimateComponent, ClimateDataSet, ClimateHeader, HOURS_PER_YEAR};
use crate::error::ClimateError;
use crate::solar_radiation::SolarRadiationModel;
use crate::{Float, PI};

const HEADER_END: &str = "***";

const N_COLUMNS: usize = 17;

/// Reads the value in `label : value unit`
fn header_value(line: &str, line_number: usize) -> Result<Float, ClimateError> {
    let value = line
        .split_once(':')
        .and_then(|(_, v)| v.split_whitespace().next())
        .ok_or_else(|| ClimateError::MalformedHeader {
            line: line_number,
            message: format!("expected 'label : value unit', found '{}'", line.trim()),
        })?;
    header_number(value, line_number, "value")
}

/// Converts coordinates in the Lambert conformal conic projection used for
/// these files (ETRS89-LCC, EPSG:3034) into longitude and latitude, in degrees.
pub fn lambert_to_longitude_latitude(easting: Float, northing: Float) -> (Float, Float) {
    // GRS80
    let a: Float = 6_378_137.;
    let f: Float = 1. / 298.257_222_101;
    let e = (2. * f - f * f).sqrt();

    let lat_1 = (35. as Float).to_radians();
    let lat_2 = (65. as Float).to_radians();
    let lat_0 = (52. as Float).to_radians();
    let lon_0 = (10. as Float).to_radians();
    let false_easting = 4_000_000.;
    let false_northing = 2_800_000.;

    let m = |phi: Float| phi.cos() / (1. - (e * phi.sin()).powi(2)).sqrt();
    let t = |phi: Float| {
        let es = e * phi.sin();
        (PI / 4. - phi / 2.).tan() / ((1. - es) / (1. + es)).powf(e / 2.)
    };

    let n = (m(lat_1).ln() - m(lat_2).ln()) / (t(lat_1).ln() - t(lat_2).ln());
    let big_f = m(lat_1) / (n * t(lat_1).powf(n));
    let r_0 = a * big_f * t(lat_0).powf(n);

    let dx = easting - false_easting;
    let dy = r_0 - (northing - false_northing);
    let r = n.signum() * (dx * dx + dy * dy).sqrt();
    let theta = dx.atan2(dy);
    let t_prime = (r / (a * big_f)).powf(1. / n);

    let mut phi = PI / 2. - 2. * t_prime.atan();
    for _ in 0..15 {
        let es = e * phi.sin();
        let next = PI / 2. - 2. * (t_prime * ((1. - es) / (1. + es)).powf(e / 2.)).atan();
        let done = (next - phi).abs() < 1e-12;
        phi = next;
        if done {
            break;
        }
    }
    let lambda = theta / n + lon_0;
    (lambda.to_degrees(), phi.to_degrees())
}

/// Parses a BBSR Test Reference Year (`.dat`)
pub fn parse<R: BufRead>(reader: R, header_only: bool) -> Result<ClimateDataSet, ClimateError> {
    let mut lines = reader.lines();

    header_line(&mut lines, 1)?;
    let easting = header_value(&header_line(&mut lines, 2)?, 2)?;
    let northing = header_value(&header_line(&mut lines, 3)?, 3)?;
    let elevation = header_value(&header_line(&mut lines, 4)?, 4)?;

    let (longitude, latitude) = lambert_to_longitude_latitude(easting, northing);
    let header = ClimateHeader {
        city: "BBSR".into(),
        comment: "Import from BBSR-Data".into(),
        country: "Germany".into(),
        source: "DWD/BBSR TRY 2017".into(),
        longitude_deg: Some(longitude),
        latitude_deg: Some(latitude),
        elevation: Some(elevation),
        time_zone: 1,
        ..ClimateHeader::default()
    };

    let mut line_number = 4;
    let mut found = false;
    for line in lines.by_ref() {
        line_number += 1;
        if line?.contains(HEADER_END) {
            found = true;
            break;
        }
    }
    if !found {
        return Err(ClimateError::MalformedHeader {
            line: line_number,
            message: format!("missing '{}' line at the end of the header", HEADER_END),
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
        channel.reserve(HOURS_PER_YEAR);
    }

    let mut push = |c: ClimateComponent, v: Option<Float>| data_set.data[c.index()].push(v);
    let mut rows = 0;
    for line in lines {
        line_number += 1;
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != N_COLUMNS {
            return Err(ClimateError::ColumnCountMismatch {
                line: line_number,
                expected: N_COLUMNS,
                found: tokens.len(),
            });
        }
        let mut v = [0.; N_COLUMNS];
        for (v, token) in v.iter_mut().zip(tokens.iter()) {
            *v = data_number(token, line_number)?;
        }
        rows += 1;

        push(ClimateComponent::Temperature, Some(v[5]));
        push(ClimateComponent::RelativeHumidity, Some(v[11]));
        // Horizontal, converted below
        push(ClimateComponent::DirectRadiationNormal, Some(v[12]));
        push(ClimateComponent::DiffuseRadiationHorizontal, Some(v[13]));
        push(ClimateComponent::WindDirection, Some(v[7]));
        push(ClimateComponent::WindVelocity, Some(v[8]));
        push(ClimateComponent::LongWaveCounterRadiation, Some(v[14]));
        // hPa
        push(ClimateComponent::AirPressure, Some(v[6] * 100.));
        push(ClimateComponent::Rain, None);
    }
    if rows != HOURS_PER_YEAR {
        return Err(ClimateError::RowCountMismatch {
            expected: HOURS_PER_YEAR,
            found: rows,
        });
    }

    let mut converter = SolarRadiationModel::for_location(&data_set.header);
    let direct = data_set.channel_mut(ClimateComponent::DirectRadiationNormal);
    for (k, v) in direct.iter_mut().enumerate() {
        if let Some(horizontal) = v {
            // middle of the hour
            let t = (k + 1) as Float * 3600. - 1800.;
            *v = Some(converter.convert_horizontal_to_normal_radiation(t, *horizontal));
        }
    }
    Ok(data_set)
}
