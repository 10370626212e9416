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

//! A `ccd` file holds a single quantity. It looks like this:
//!
//! ```text
//! # Comments start with '#'
//! TEMPER   C
//! 0  01:00:00   -2.5
//! 0  02:00:00   -2.8   # trailing comments are fine
//! ...
//! ```
//!
//! That is, a line with the quantity and its unit followed by lines with
//! the day, the time of the day and the value.
//!
//! A directory of `ccd` files may also have a `description.xml` with the
//! location of the data:
//!
//! ```text
//! <ClimateDataLocation>
//!     <Position latitude="51.05" longitude="13.74" altitude="112"/>
//!     <TimeZone>1</TimeZone>
//!     <Description langid="en">Dresden, Germany</Description>
//!     <Description langid="de">Dresden, Deutschland</Description>
//!     <Source>DWD</Source>
//! </ClimateDataLocation>
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::tabular::TaggedSeries;
use super::{
    expand_to_annual_hourly_data, ClimateComponent, ClimateDataSet, ClimateHeader,
    HOURS_PER_YEAR, NUM_COMPONENTS,
};
use crate::error::{ClimateError, InFile};
use crate::solar_radiation::SolarRadiationModel;
use crate::units::Unit;
use crate::Float;

/// The name of the file of each channel when reading
/// a directory of `ccd` files
pub const CCD_FILE_NAMES: [&str; NUM_COMPONENTS] = [
    "Temperature.ccd",
    "RelativeHumidity.ccd",
    "DirectRadiation.ccd",
    "DiffuseRadiation.ccd",
    "WindDirection.ccd",
    "WindVelocity.ccd",
    "SkyRadiation.ccd",
    "TotalPressure.ccd",
    "VerticalRain.ccd",
];

/// The name of the file with the location of a directory of `ccd` files
pub const CCD_DESCRIPTION_FILE: &str = "description.xml";

/// An XML element: its attributes, its text and where it ends
struct Element<'a> {
    start: usize,
    attributes: &'a str,
    text_start: usize,
    text: &'a str,
    end: usize,
}

/// Finds the first `<tag ...>` element at or after `from`
fn find_element<'a>(xml: &'a str, tag: &str, from: usize) -> Option<Element<'a>> {
    let open = format!("<{}", tag);
    let mut cursor = from;
    loop {
        let start = cursor + xml.get(cursor..)?.find(&open)?;
        let after_name = start + open.len();
        cursor = after_name;
        match xml[after_name..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => {}
            _ => continue,
        }
        let close = after_name + xml[after_name..].find('>')?;
        if xml[..close].ends_with('/') {
            return Some(Element {
                start,
                attributes: &xml[after_name..close - 1],
                text_start: close + 1,
                text: "",
                end: close + 1,
            });
        }
        let end_tag = format!("</{}>", tag);
        let text_end = close + 1 + xml[close + 1..].find(&end_tag)?;
        return Some(Element {
            start,
            attributes: &xml[after_name..close],
            text_start: close + 1,
            text: &xml[close + 1..text_end],
            end: text_end + end_tag.len(),
        });
    }
}

/// The value of `name="value"` (or `name='value'`) within the attributes of an element
fn find_attribute<'a>(attributes: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = attributes;
    loop {
        let eq = rest.find('=')?;
        let key = rest[..eq].trim();
        let value = rest[eq + 1..].trim_start();
        let quote = value.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let close = value[1..].find(quote)?;
        if key == name {
            return Some(&value[1..close + 1]);
        }
        rest = &value[close + 2..];
    }
}

fn unescape(text: &str) -> String {
    text.trim()
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Parses the contents of a `description.xml` file into `header`.
///
/// Latitude, longitude and a description with the city and the country are
/// required. A missing altitude is taken as 0 and a missing time zone as 1.
/// The city and the country are taken from the English description when there
/// are several, and the source is left untouched if not given.
pub fn parse_ccd_description(xml: &str, header: &mut ClimateHeader) -> Result<(), ClimateError> {
    let line_of = |offset: usize| xml[..offset].matches('\n').count() + 1;
    let bad = |offset: usize, message: &str| ClimateError::MalformedHeader {
        line: line_of(offset),
        message: message.to_string(),
    };

    let root = find_element(xml, "ClimateDataLocation", 0)
        .ok_or_else(|| bad(0, "expected 'ClimateDataLocation' as root element"))?;
    let body = root.text;
    let at = |e: &Element| root.text_start + e.start;

    let position = find_element(body, "Position", 0)
        .ok_or_else(|| bad(root.start, "expected element 'Position'"))?;
    let angle = |name: &str| -> Result<Float, ClimateError> {
        let value = find_attribute(position.attributes, name).ok_or_else(|| {
            bad(
                at(&position),
                &format!("expected attribute '{}' in 'Position'", name),
            )
        })?;
        value
            .trim()
            .parse::<Float>()
            .map_err(|_| bad(at(&position), &format!("invalid {} '{}'", name, value)))
    };
    let latitude = angle("latitude")?;
    let longitude = angle("longitude")?;
    let elevation = match find_attribute(position.attributes, "altitude") {
        Some(_) => angle("altitude")?,
        None => {
            warn!("No 'altitude' in 'Position' in the description of the climate data... using 0");
            0.
        }
    };

    let time_zone = match find_element(body, "TimeZone", 0) {
        Some(e) => e
            .text
            .trim()
            .parse::<i32>()
            .map_err(|_| bad(at(&e), &format!("invalid time zone '{}'", e.text.trim())))?,
        None => {
            warn!("No 'TimeZone' in the description of the climate data... using 1");
            1
        }
    };

    let mut place: Option<(String, String)> = None;
    let mut cursor = 0;
    while let Some(e) = find_element(body, "Description", cursor) {
        cursor = e.end;
        let lang = find_attribute(e.attributes, "langid")
            .ok_or_else(|| bad(at(&e), "expected attribute 'langid' in 'Description'"))?;
        let text = unescape(e.text);
        let mut tokens = text.split(',');
        let (city, country) = match (tokens.next(), tokens.next()) {
            (Some(city), Some(country)) => (city.trim().to_string(), country.trim().to_string()),
            _ => return Err(bad(at(&e), "expected 'city, country' in 'Description'")),
        };
        if place.is_none() || lang == "en" {
            place = Some((city, country));
        }
    }
    let (city, country) =
        place.ok_or_else(|| bad(root.start, "expected element 'Description'"))?;

    header.latitude_deg = Some(latitude);
    header.longitude_deg = Some(longitude);
    header.elevation = Some(elevation);
    header.time_zone = time_zone;
    header.city = city;
    header.country = country;
    if let Some(source) = find_element(body, "Source", 0) {
        header.source = unescape(source.text);
    }
    Ok(())
}

/// Parses the contents of a `ccd` file
pub fn parse_ccd<R: BufRead>(reader: R) -> Result<TaggedSeries, ClimateError> {
    let mut lines = reader.lines().enumerate();
    let mut comment = String::new();

    let mut header = None;
    for (i, line) in lines.by_ref() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(c) = line.strip_prefix('#') {
            let c = c.trim();
            if !c.is_empty() {
                comment.push_str(c);
                comment.push('\n');
            }
            continue;
        }
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(quantity), Some(unit)) => {
                header = Some((quantity.to_string(), Unit::from_name(unit)?));
                break;
            }
            _ => {
                return Err(ClimateError::MalformedHeader {
                    line: i + 1,
                    message: format!("expected 'quantity unit', found '{}'", line),
                })
            }
        }
    }
    let (quantity, unit) = header.ok_or_else(|| ClimateError::MalformedHeader {
        line: 1,
        message: "no quantity and unit found".into(),
    })?;

    let mut time_points: Vec<Float> = Vec::new();
    let mut values = Vec::new();
    for (i, line) in lines {
        let line_number = i + 1;
        let line = line?;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let content = content.replace(':', " ");
        let tokens: Vec<&str> = content.split_whitespace().collect();
        let bad_line = || ClimateError::MalformedDataLine {
            line: line_number,
            message: format!("expected 'day hh:mm:ss value', found '{}'", line),
        };
        if tokens.len() != 5 {
            return Err(bad_line());
        }
        let mut t = 0.0;
        for (token, factor) in tokens[..4].iter().zip([86400., 3600., 60., 1.]) {
            let v: i64 = token.parse().map_err(|_| bad_line())?;
            t += v as Float * factor;
        }
        let v: Float = tokens[4].parse().map_err(|_| bad_line())?;

        if let Some(last) = time_points.last() {
            if t <= *last {
                return Err(ClimateError::NonMonotonicOrDuplicateTimestamp { line: line_number });
            }
        }
        time_points.push(t);
        values.push(v);
    }

    Ok(TaggedSeries {
        quantity,
        unit,
        time_points,
        values,
        comment,
    })
}

/// Reads a `ccd` file
pub fn read_ccd_file<P: AsRef<Path>>(path: P) -> Result<TaggedSeries, ClimateError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|_| ClimateError::FileNotFound(path.to_path_buf()))?;
    parse_ccd(BufReader::new(file)).in_file(path)
}

/// Reads one `ccd` file per channel from a directory (see [`CCD_FILE_NAMES`]).
///
/// Data is expanded into hourly values and converted into the units of each channel.
/// Direct radiation is given on a horizontal plane in these files, so `converter` is
/// used for calculating direct normal radiation. The header of the result is that of
/// the loader in `converter`.
///
/// If the directory has a [`CCD_DESCRIPTION_FILE`], the header of `converter` is
/// updated with it (and the sun moved to the new location) before any data is read.
/// Otherwise, the source of the data is the directory itself.
///
/// Missing files (including the description) are not an error: they are
/// returned in the second element of the tuple and their channel is left
/// without data.
pub fn read_ccd_directory(
    directory: &Path,
    converter: &mut SolarRadiationModel,
) -> Result<(ClimateDataSet, Vec<PathBuf>), ClimateError> {
    let mut skipped = Vec::new();
    let description = directory.join(CCD_DESCRIPTION_FILE);
    let mut header = converter.climate.header.clone();
    header.source = directory.display().to_string();
    if description.is_file() {
        debug!("Reading '{}'", description.display());
        let xml = std::fs::read_to_string(&description)
            .map_err(ClimateError::from)
            .in_file(&description)?;
        parse_ccd_description(&xml, &mut header)
            .in_file(&description)
            .in_file(directory)?;
    } else {
        warn!(
            "Climate data description '{}' not found... keeping the current location",
            description.display()
        );
        skipped.push(description);
    }
    converter.climate.header = header.clone();
    converter.update_location();

    let mut data_set = ClimateDataSet::hourly(header);

    for c in ClimateComponent::ALL {
        let path = directory.join(CCD_FILE_NAMES[c.index()]);
        if !path.is_file() {
            warn!(
                "Climate data file '{}' not found... no {} data will be used",
                path.display(),
                c
            );
            skipped.push(path);
            continue;
        }
        debug!("Reading '{}'", path.display());
        let values = read_channel(&path, c, converter)
            .in_file(&path)
            .in_file(directory)?;
        *data_set.channel_mut(c) = values;
    }

    Ok((data_set, skipped))
}

fn read_channel(
    path: &Path,
    c: ClimateComponent,
    converter: &mut SolarRadiationModel,
) -> Result<Vec<Option<Float>>, ClimateError> {
    let series = parse_ccd(BufReader::new(File::open(path)?))?;
    match ClimateComponent::from_quantity(&series.quantity) {
        Some(q) if q != c => warn!(
            "File '{}' contains {} but it is used as {}",
            path.display(),
            q,
            c
        ),
        _ => {}
    }

    let (times, values) = expand_to_annual_hourly_data(&series.time_points, &series.values)?;
    debug_assert_eq!(values.len(), HOURS_PER_YEAR);

    let mut values: Vec<Option<Float>> = values.into_iter().map(Some).collect();
    let target = Unit::from_name(c.unit())?;
    series.unit.convert_series(&mut values, &target)?;

    if c == ClimateComponent::DirectRadiationNormal {
        for (v, t) in values.iter_mut().zip(times.iter()) {
            if let Some(v) = v {
                *v = converter.convert_horizontal_to_normal_radiation(*t, *v);
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::ErrorKind;
    use validate::assert_close;

    #[test]
    fn test_parse() -> Result<(), ClimateError> {
        let file = "# Created by hand\n#\n\nTEMPER   C\n0 01:00:00 -2.5\n\n0 02:00:00\t-2.8 # cold\n# a comment\n1 00:00:00 3\n";
        let s = parse_ccd(file.as_bytes())?;
        assert_eq!(s.quantity, "TEMPER");
        assert_eq!(s.unit.name(), "C");
        assert_eq!(s.comment, "Created by hand\n");
        assert_eq!(s.time_points, vec![3600., 7200., 86400.]);
        assert_close!(s.values[1], -2.8);
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        let e = parse_ccd("TEMPER\n".as_bytes()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedHeader);
        assert_eq!(e.line(), Some(1));

        let e = parse_ccd("TEMPER  Lumens\n".as_bytes()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnknownOrIncompatibleUnit);

        let e = parse_ccd("TEMPER C\n0 01:00:00 1\n0 01:00 2\n".as_bytes()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedDataLine);
        assert_eq!(e.line(), Some(3));

        let e = parse_ccd("TEMPER C\n0 01:00:00 1,5\n".as_bytes()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedDataLine);

        let e = parse_ccd("TEMPER C\n0 02:00:00 1\n0 01:00:00 2\n".as_bytes()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NonMonotonicOrDuplicateTimestamp);
        assert_eq!(e.line(), Some(3));
    }

    const DESCRIPTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ClimateDataLocation>
    <Position latitude="51.05" longitude='13.74' altitude="112"/>
    <TimeZone> 1 </TimeZone>
    <Description langid="de">Dresden, Deutschland</Description>
    <Description langid="en">Dresden, Germany</Description>
    <Source>Deutscher Wetterdienst &amp; TU Dresden</Source>
</ClimateDataLocation>
"#;

    #[test]
    fn test_parse_description() -> Result<(), ClimateError> {
        let mut header = ClimateHeader::default();
        parse_ccd_description(DESCRIPTION, &mut header)?;
        assert_close!(header.latitude_deg.unwrap(), 51.05);
        assert_close!(header.longitude_deg.unwrap(), 13.74);
        assert_close!(header.elevation.unwrap(), 112.);
        assert_eq!(header.time_zone, 1);
        assert_eq!(header.city, "Dresden");
        assert_eq!(header.country, "Germany");
        assert_eq!(header.source, "Deutscher Wetterdienst & TU Dresden");
        Ok(())
    }

    #[test]
    fn test_parse_description_defaults() -> Result<(), ClimateError> {
        let xml = "<ClimateDataLocation>\n<Position latitude=\"-41.3\" longitude=\"174.78\"></Position>\n<Description langid=\"mi\">Te Whanganui-a-Tara, Aotearoa</Description>\n</ClimateDataLocation>";
        let mut header = ClimateHeader {
            source: "somewhere".into(),
            time_zone: 12,
            ..ClimateHeader::default()
        };
        parse_ccd_description(xml, &mut header)?;
        assert_close!(header.latitude_deg.unwrap(), -41.3);
        assert_close!(header.elevation.unwrap(), 0.);
        assert_eq!(header.time_zone, 1);
        assert_eq!(header.city, "Te Whanganui-a-Tara");
        assert_eq!(header.country, "Aotearoa");
        assert_eq!(header.source, "somewhere");
        Ok(())
    }

    #[test]
    fn test_parse_description_errors() {
        let mut header = ClimateHeader::default();
        let e = parse_ccd_description("<Location></Location>", &mut header).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedHeader);
        assert_eq!(e.line(), Some(1));

        let xml = DESCRIPTION.replace("latitude=\"51.05\" ", "");
        let e = parse_ccd_description(&xml, &mut header).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedHeader);
        assert_eq!(e.line(), Some(3));

        let xml = DESCRIPTION.replace("Dresden, Germany", "Dresden");
        let e = parse_ccd_description(&xml, &mut header).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedHeader);
        assert_eq!(e.line(), Some(6));

        let xml = DESCRIPTION.replace("<TimeZone> 1 </TimeZone>", "<TimeZone>CET</TimeZone>");
        let e = parse_ccd_description(&xml, &mut header).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedHeader);
        assert_eq!(e.line(), Some(4));

        // Nothing is changed on failure
        assert_eq!(header, ClimateHeader::default());
    }

    #[test]
    fn test_missing_file() {
        let e = read_ccd_file("surely/this/does/not/exist.ccd").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::FileNotFound);
    }
}
