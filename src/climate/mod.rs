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

use std::fmt;
use std::ops::{BitOr, BitOrAssign, Index};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ClimateError, InFile};
use crate::linear_spline::LinearSpline;
use crate::units::Unit;
use crate::{Float, SECONDS_PER_YEAR};

/// Helpers for checking and expanding time series
pub mod time_series;
pub use time_series::{
    check_for_valid_cyclic_data, expand_to_annual_hourly_data, interpolate_cyclic_data,
};

mod formats;
pub use formats::ClimateFileFormat;

/// EnergyPlus Weather files
pub mod epw;

/// WAC files
pub mod wac;

/// The binary climate format
pub mod c6b;

/// Test Reference Years of the BBSR (Germany)
pub mod bbsr;

/// Directories of `ccd` files, one per channel.
pub mod ccd;

/// Tab separated tables with `Name [unit]` captions
pub mod tabular;

/// The number of channels in a climate data set
pub const NUM_COMPONENTS: usize = 9;

/// The number of hourly values in a year
pub const HOURS_PER_YEAR: usize = 8760;

/// The year assigned to the data when the file does not say
pub const DEFAULT_START_YEAR: i32 = 2007;

/// The channels of climate data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimateComponent {
    /// Air temperature, in C
    Temperature = 0,
    /// Relative humidity, in %
    RelativeHumidity = 1,
    /// Direct solar radiation on a plane normal to the sun, in W/m2
    DirectRadiationNormal = 2,
    /// Diffuse solar radiation on a horizontal plane, in W/m2
    DiffuseRadiationHorizontal = 3,
    /// Wind direction, in Deg (0 is North, 90 is East)
    WindDirection = 4,
    /// Wind velocity, in m/s
    WindVelocity = 5,
    /// Long wave radiation from the sky, in W/m2
    LongWaveCounterRadiation = 6,
    /// Air pressure, in Pa
    AirPressure = 7,
    /// Rain on a horizontal plane, in l/m2h
    Rain = 8,
}

impl ClimateComponent {
    /// All the channels, in order
    pub const ALL: [ClimateComponent; NUM_COMPONENTS] = [
        ClimateComponent::Temperature,
        ClimateComponent::RelativeHumidity,
        ClimateComponent::DirectRadiationNormal,
        ClimateComponent::DiffuseRadiationHorizontal,
        ClimateComponent::WindDirection,
        ClimateComponent::WindVelocity,
        ClimateComponent::LongWaveCounterRadiation,
        ClimateComponent::AirPressure,
        ClimateComponent::Rain,
    ];

    /// The position of this channel in per-channel arrays
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The unit in which this channel is stored
    pub fn unit(self) -> &'static str {
        match self {
            ClimateComponent::Temperature => "C",
            ClimateComponent::RelativeHumidity => "%",
            ClimateComponent::DirectRadiationNormal => "W/m2",
            ClimateComponent::DiffuseRadiationHorizontal => "W/m2",
            ClimateComponent::WindDirection => "Deg",
            ClimateComponent::WindVelocity => "m/s",
            ClimateComponent::LongWaveCounterRadiation => "W/m2",
            ClimateComponent::AirPressure => "Pa",
            ClimateComponent::Rain => "l/m2h",
        }
    }

    /// The value reported by the loader when the data is missing
    pub fn default_value(self) -> Float {
        match self {
            ClimateComponent::Temperature => 20.0,
            ClimateComponent::RelativeHumidity => 80.0,
            ClimateComponent::AirPressure => 101325.0,
            _ => 0.0,
        }
    }

    /// The range of plausible values. Values out of this
    /// range are flagged as invalid in the [`QualityBits`]
    pub fn valid_range(self) -> (Float, Float) {
        match self {
            ClimateComponent::Temperature => (-100., 100.),
            ClimateComponent::RelativeHumidity => (0., 100.),
            ClimateComponent::DirectRadiationNormal
            | ClimateComponent::DiffuseRadiationHorizontal
            | ClimateComponent::LongWaveCounterRadiation => (0., 1500.),
            ClimateComponent::WindDirection => (0., 360.),
            ClimateComponent::WindVelocity => (0., 120.),
            ClimateComponent::AirPressure => (0., 200000.),
            ClimateComponent::Rain => (0., 100.),
        }
    }

    /// Whether hourly values of this channel are averages over the
    /// hour (`true`) or values at the end of the hour (`false`)
    pub fn is_hourly_mean(self) -> bool {
        matches!(
            self,
            ClimateComponent::DirectRadiationNormal
                | ClimateComponent::DiffuseRadiationHorizontal
                | ClimateComponent::Rain
        )
    }

    /// Recognizes the names used for quantities in `ccd` files and
    /// other material databases.
    pub fn from_quantity(quantity: &str) -> Option<Self> {
        let c = match quantity.trim() {
            "Temperature" | "TEMPER" | "Temper" => ClimateComponent::Temperature,
            "RelativeHumidity" | "RELHUM" | "RelHum" => ClimateComponent::RelativeHumidity,
            "RainFluxHorizontal" | "HORRAIN" | "VertRain" => ClimateComponent::Rain,
            "WindDirection" | "WINDDIR" | "WindDir" => ClimateComponent::WindDirection,
            "WindVelocity" | "WINDVEL" | "WindVel" => ClimateComponent::WindVelocity,
            "LWRadiationSkyEmission" | "SKYEMISS" | "SkyRad" => {
                ClimateComponent::LongWaveCounterRadiation
            }
            "SWRadiationDirect" | "DIRRAD" | "DirRad" => ClimateComponent::DirectRadiationNormal,
            "SWRadiationDiffuse" | "DIFRAD" | "DifRad" => {
                ClimateComponent::DiffuseRadiationHorizontal
            }
            "GasPressure" | "GASPRESS" => ClimateComponent::AirPressure,
            _ => return None,
        };
        Some(c)
    }
}

impl fmt::Display for ClimateComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Descriptive information of the climate data: where it was measured,
/// where it comes from, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateHeader {
    /// The name of the city
    #[serde(default)]
    pub city: String,

    /// The name of the country
    #[serde(default)]
    pub country: String,

    /// The code of the weather station
    #[serde(default)]
    pub wmo_code: String,

    /// The source of the data
    #[serde(default)]
    pub source: String,

    /// Free text
    #[serde(default)]
    pub comment: String,

    /// Latitude in degrees (North is positive)
    pub latitude_deg: Option<Float>,

    /// Longitude in degrees (East is positive)
    pub longitude_deg: Option<Float>,

    /// Elevation above sea level, in m
    pub elevation: Option<Float>,

    /// Time zone, in hours from UTC (e.g., Berlin is 1)
    #[serde(default)]
    pub time_zone: i32,

    /// The year of the first value of data
    #[serde(default = "default_start_year")]
    pub start_year: i32,
}

fn default_start_year() -> i32 {
    DEFAULT_START_YEAR
}

impl Default for ClimateHeader {
    fn default() -> Self {
        Self {
            city: String::new(),
            country: String::new(),
            wmo_code: String::new(),
            source: String::new(),
            comment: String::new(),
            latitude_deg: None,
            longitude_deg: None,
            elevation: None,
            time_zone: 0,
            start_year: DEFAULT_START_YEAR,
        }
    }
}

/// What every parser produces: the header and the data of
/// each channel. Missing values are `None`.
#[derive(Debug, Clone, Default)]
pub struct ClimateDataSet {
    /// Descriptive information
    pub header: ClimateHeader,

    /// The values of each channel, indexed by [`ClimateComponent::index`]
    pub data: [Vec<Option<Float>>; NUM_COMPONENTS],

    /// The time points of the data, in seconds from the beginning of
    /// the start year. Empty means "one value per hour of the year".
    pub time_points: Vec<Float>,
}

impl ClimateDataSet {
    /// A data set with one missing value per hour of the year in every channel
    pub fn hourly(header: ClimateHeader) -> Self {
        Self {
            header,
            data: std::array::from_fn(|_| vec![None; HOURS_PER_YEAR]),
            time_points: Vec::new(),
        }
    }

    /// The data of a channel
    pub fn channel(&self, c: ClimateComponent) -> &[Option<Float>] {
        &self.data[c.index()]
    }

    /// The data of a channel, mutable
    pub fn channel_mut(&mut self, c: ClimateComponent) -> &mut Vec<Option<Float>> {
        &mut self.data[c.index()]
    }
}

/// Summary of the quality of the data of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct QualityBits(u8);

impl QualityBits {
    /// Nothing wrong
    pub const ALL_VALID: QualityBits = QualityBits(0);
    /// There is no data (i.e., all values are missing, or zero, or there are no values at all)
    pub const ALL_DATA_MISSING: QualityBits = QualityBits(1);
    /// Some values are missing
    pub const SOME_DATA_MISSING: QualityBits = QualityBits(2);
    /// Some values are out of range
    pub const SOME_DATA_INVALID: QualityBits = QualityBits(4);

    /// The raw bitmask
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Checks whether all the flags in `other` are set
    pub fn contains(self, other: QualityBits) -> bool {
        self.0 & other.0 == other.0
    }

    /// No flag is set
    pub fn is_valid(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for QualityBits {
    type Output = QualityBits;
    fn bitor(self, rhs: QualityBits) -> QualityBits {
        QualityBits(self.0 | rhs.0)
    }
}

impl BitOrAssign for QualityBits {
    fn bitor_assign(&mut self, rhs: QualityBits) {
        self.0 |= rhs.0
    }
}

/// The quality of the data of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelQuality {
    /// The flags
    pub bits: QualityBits,
    /// The first row with a missing value
    pub first_missing_row: Option<usize>,
    /// The first row with a value out of range
    pub first_invalid_row: Option<usize>,
}

impl Default for ChannelQuality {
    fn default() -> Self {
        Self {
            bits: QualityBits::ALL_DATA_MISSING,
            first_missing_row: None,
            first_invalid_row: None,
        }
    }
}

impl ChannelQuality {
    /// Inspects the data of a channel.
    ///
    /// A channel in which all values are exactly zero is reported as
    /// [`QualityBits::ALL_DATA_MISSING`], as old binary files used zeroes
    /// for unknown data.
    pub fn compute(component: ClimateComponent, data: &[Option<Float>]) -> Self {
        let (min, max) = component.valid_range();
        let mut ret = ChannelQuality {
            bits: QualityBits::ALL_VALID,
            first_missing_row: None,
            first_invalid_row: None,
        };
        let mut n_missing = 0;
        let mut n_invalid = 0;
        let mut n_zero = 0;
        for (row, v) in data.iter().enumerate() {
            match v {
                None => {
                    n_missing += 1;
                    ret.first_missing_row.get_or_insert(row);
                }
                Some(v) => {
                    if *v == 0.0 {
                        n_zero += 1;
                    }
                    if *v < min || *v > max {
                        n_invalid += 1;
                        ret.first_invalid_row.get_or_insert(row);
                    }
                }
            }
        }

        if data.is_empty() || n_missing == data.len() || n_zero == data.len() {
            ret.bits = QualityBits::ALL_DATA_MISSING;
        }
        if n_missing > 0 {
            ret.bits |= QualityBits::SOME_DATA_MISSING;
        }
        if n_invalid > 0 {
            ret.bits |= QualityBits::SOME_DATA_INVALID;
        }
        ret
    }
}

/// The values of all channels at the last time set
/// in the [`ClimateDataLoader`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSample([Float; NUM_COMPONENTS]);

impl Default for CurrentSample {
    fn default() -> Self {
        let mut v = [0.0; NUM_COMPONENTS];
        v[ClimateComponent::Temperature.index()] = 5.0;
        v[ClimateComponent::RelativeHumidity.index()] = 10.0;
        Self(v)
    }
}

impl Index<ClimateComponent> for CurrentSample {
    type Output = Float;
    fn index(&self, c: ClimateComponent) -> &Float {
        &self.0[c.index()]
    }
}

impl CurrentSample {
    /// The value of a channel
    pub fn get(&self, c: ClimateComponent) -> Float {
        self.0[c.index()]
    }
}

/// Interpolates between two samples; `alpha` is the weight of `a`.
/// Missing values contaminate the result unless their weight is zero.
fn blend(a: Option<Float>, b: Option<Float>, alpha: Float) -> Option<Float> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a * alpha + b * (1. - alpha)),
        (Some(a), None) if alpha >= 1. => Some(a),
        (None, Some(b)) if alpha <= 0. => Some(b),
        _ => None,
    }
}

/// Which values to interpolate, and how.
#[derive(Debug, Clone, Copy)]
struct Bracket {
    i1: usize,
    i2: usize,
    alpha: Float,
}

/// Holds a whole year of climate data and interpolates it in time.
///
/// This object has a single writer: calling [`ClimateDataLoader::set_time`]
/// updates the [`CurrentSample`] which is then read through
/// [`ClimateDataLoader::current`].
#[derive(Debug, Clone, Default)]
pub struct ClimateDataLoader {
    /// Descriptive information of the data
    pub header: ClimateHeader,

    data: [Vec<Option<Float>>; NUM_COMPONENTS],

    /// Empty if data is hourly
    time_points: Vec<Float>,

    quality: [ChannelQuality; NUM_COMPONENTS],

    overrides: [Option<LinearSpline>; NUM_COMPONENTS],

    current: CurrentSample,
}

impl ClimateDataLoader {
    /// Creates an empty loader. All the channels are flagged as
    /// [`QualityBits::ALL_DATA_MISSING`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a climate file, choosing the format from its extension.
    /// If `header_only` is `true`, only the [`ClimateHeader`] is read
    /// and the data is left untouched.
    pub fn read_climate_data<P: AsRef<Path>>(
        &mut self,
        path: P,
        header_only: bool,
    ) -> Result<(), ClimateError> {
        let path = path.as_ref();
        let format = ClimateFileFormat::from_path(path).in_file(path)?;
        let data_set = format.read(path, header_only)?;
        if header_only {
            self.header = data_set.header;
            return Ok(());
        }
        self.load(data_set).in_file(path)?;
        info!(
            "Read {:?} climate data for '{}' from '{}'",
            format,
            self.header.city,
            path.display()
        );
        Ok(())
    }

    /// Replaces the data in the loader. Fails if the channels do not have
    /// consistent lengths or the time points are not strictly increasing.
    pub fn load(&mut self, data_set: ClimateDataSet) -> Result<(), ClimateError> {
        let ClimateDataSet {
            header,
            data,
            time_points,
        } = data_set;

        let expected = if time_points.is_empty() {
            HOURS_PER_YEAR
        } else {
            time_points.len()
        };
        if let Some(bad) = data.iter().find(|d| d.len() != expected) {
            return Err(ClimateError::RowCountMismatch {
                expected,
                found: bad.len(),
            });
        }
        if let Some(i) = time_points.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ClimateError::NonMonotonicOrDuplicateTimestamp { line: i + 2 });
        }

        self.header = header;
        self.data = data;
        self.time_points = time_points;
        self.compute_quality_bits();
        Ok(())
    }

    /// Recomputes the [`QualityBits`] of every channel
    pub fn compute_quality_bits(&mut self) {
        for c in ClimateComponent::ALL {
            let q = ChannelQuality::compute(c, &self.data[c.index()]);
            if q.bits.contains(QualityBits::ALL_DATA_MISSING) {
                warn!("There is no {} data in the climate data", c);
            }
            self.quality[c.index()] = q;
        }
    }

    /// The data of a channel. Missing values are `None`
    pub fn data(&self, c: ClimateComponent) -> &[Option<Float>] {
        &self.data[c.index()]
    }

    /// The time points of the data. Empty if the data is hourly.
    pub fn time_points(&self) -> &[Float] {
        &self.time_points
    }

    /// The quality of the data of a channel
    pub fn quality(&self, c: ClimateComponent) -> ChannelQuality {
        self.quality[c.index()]
    }

    /// The values calculated in the last call to `set_time()`
    pub fn current(&self) -> &CurrentSample {
        &self.current
    }

    /// Checks that time points, if any, are strictly increasing
    pub fn has_valid_time_points(&self) -> bool {
        self.time_points.windows(2).all(|w| w[0] < w[1])
    }

    /// Whether the data repeats every year
    pub fn is_cyclic(&self) -> bool {
        self.time_points.is_empty() || check_for_valid_cyclic_data(&self.time_points).is_ok()
    }

    /// Sets (or removes) a series that replaces the data of a channel.
    /// The `x` of the spline are seconds. If they can be used cyclically,
    /// the series is repeated every year.
    pub fn set_override(&mut self, c: ClimateComponent, spline: Option<LinearSpline>) {
        self.overrides[c.index()] = spline;
    }

    /// The override of a channel, if any
    pub fn override_series(&self, c: ClimateComponent) -> Option<&LinearSpline> {
        self.overrides[c.index()].as_ref()
    }

    /// Reads the override of a channel from a `ccd` file or from a tab separated
    /// table (the latter supports the `?column` suffix). Values are converted into the
    /// unit of the channel.
    pub fn read_override_file<P: AsRef<Path>>(
        &mut self,
        c: ClimateComponent,
        path: P,
    ) -> Result<(), ClimateError> {
        let path = path.as_ref();
        let is_ccd = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("ccd"))
            .unwrap_or(false);
        let series = if is_ccd {
            ccd::read_ccd_file(path)?
        } else {
            tabular::read_tagged_table(path)?
        };
        let target = Unit::from_name(c.unit())?;
        let mut values: Vec<Option<Float>> = series.values.into_iter().map(Some).collect();
        series
            .unit
            .convert_series(&mut values, &target)
            .in_file(path)?;
        let values: Vec<Float> = values.into_iter().flatten().collect();
        let spline = LinearSpline::new(series.time_points, values).in_file(path)?;
        self.set_override(c, Some(spline));
        Ok(())
    }

    fn hourly_brackets(t: Float) -> (Bracket, Bracket) {
        let last = HOURS_PER_YEAR - 1;

        // Values at the end of each hour
        let instant = if t < 3600. {
            Bracket {
                i1: last,
                i2: 0,
                alpha: 1. - t / 3600.,
            }
        } else {
            let i1 = (t / 3600.).floor() as usize - 1;
            let i2 = i1 + 1;
            Bracket {
                i1,
                i2,
                alpha: 1. - (t - i2 as Float * 3600.) / 3600.,
            }
        };

        // Hourly averages, located at the middle of each hour
        let t_shift = if t >= SECONDS_PER_YEAR - 1800. {
            t - SECONDS_PER_YEAR
        } else {
            t
        };
        let mean = if t_shift < 1800. {
            Bracket {
                i1: last,
                i2: 0,
                alpha: 1. - (t_shift + 1800.) / 3600.,
            }
        } else {
            let i1 = ((t - 1800.) / 3600.).floor() as usize;
            Bracket {
                i1,
                i2: i1 + 1,
                alpha: 1. - (t - 1800. - i1 as Float * 3600.) / 3600.,
            }
        };

        (instant, mean)
    }

    fn explicit_bracket(&self, t: Float) -> Bracket {
        let tp = &self.time_points;
        let i = tp.partition_point(|x| *x < t);
        if i == 0 {
            Bracket {
                i1: 0,
                i2: 0,
                alpha: 1.,
            }
        } else if i == tp.len() {
            Bracket {
                i1: tp.len() - 1,
                i2: tp.len() - 1,
                alpha: 1.,
            }
        } else {
            Bracket {
                i1: i - 1,
                i2: i,
                alpha: 1. - (t - tp[i - 1]) / (tp[i] - tp[i - 1]),
            }
        }
    }

    /// Interpolates the data at a certain time of a certain year.
    ///
    /// Hourly data is always cyclic. Temperature, humidity, wind, pressure and
    /// long wave radiation are interpreted as values at the end of each hour, while
    /// solar radiation and rain are interpreted as hourly averages.
    ///
    /// Data with explicit time points is interpolated linearly (and held
    /// constant beyond the first and last points). If it cannot be used
    /// cyclically, `year` and `seconds_of_year` must fall within the data.
    ///
    /// Missing values are replaced by [`ClimateComponent::default_value`]. On
    /// error, the previous [`CurrentSample`] is kept.
    pub fn set_time(&mut self, year: i32, seconds_of_year: Float) -> Result<(), ClimateError> {
        let (t, instant, mean) = if self.time_points.is_empty() {
            let t = seconds_of_year.rem_euclid(SECONDS_PER_YEAR);
            let (instant, mean) = Self::hourly_brackets(t);
            (t, instant, mean)
        } else {
            let t = if self.is_cyclic() {
                seconds_of_year.rem_euclid(SECONDS_PER_YEAR)
            } else {
                let t = seconds_of_year
                    + SECONDS_PER_YEAR * (year - self.header.start_year) as Float;
                let first = self.time_points[0];
                let last = self.time_points[self.time_points.len() - 1];
                if t < first || t > last {
                    return Err(ClimateError::TimeOutOfRange {
                        year,
                        seconds_of_year,
                        first,
                        last,
                        start_year: self.header.start_year,
                    });
                }
                t
            };
            let b = self.explicit_bracket(t);
            (t, b, b)
        };

        let mut values = [0.0; NUM_COMPONENTS];
        for c in ClimateComponent::ALL {
            let i = c.index();
            values[i] = match &self.overrides[i] {
                Some(spline) => {
                    if check_for_valid_cyclic_data(spline.x()).is_ok() {
                        interpolate_cyclic_data(spline, t)
                    } else {
                        spline.value(t)
                    }
                }
                None => {
                    let b = if c.is_hourly_mean() { mean } else { instant };
                    let d = &self.data[i];
                    let v1 = d.get(b.i1).copied().flatten();
                    let v2 = d.get(b.i2).copied().flatten();
                    blend(v1, v2, b.alpha).unwrap_or_else(|| c.default_value())
                }
            };
        }
        self.current = CurrentSample(values);
        Ok(())
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::ErrorKind;
    use validate::assert_close;

    fn constant_data_set(c: ClimateComponent, v: Float) -> ClimateDataSet {
        let mut ds = ClimateDataSet::hourly(ClimateHeader::default());
        *ds.channel_mut(c) = vec![Some(v); HOURS_PER_YEAR];
        ds
    }

    #[test]
    fn test_from_quantity() {
        assert_eq!(
            ClimateComponent::from_quantity("TEMPER"),
            Some(ClimateComponent::Temperature)
        );
        assert_eq!(
            ClimateComponent::from_quantity("SkyRad"),
            Some(ClimateComponent::LongWaveCounterRadiation)
        );
        assert_eq!(
            ClimateComponent::from_quantity("VertRain"),
            Some(ClimateComponent::Rain)
        );
        assert_eq!(ClimateComponent::from_quantity("Banana"), None);
    }

    #[test]
    fn test_quality_bits() {
        let c = ClimateComponent::Temperature;
        let q = ChannelQuality::compute(c, &[]);
        assert!(q.bits.contains(QualityBits::ALL_DATA_MISSING));

        let q = ChannelQuality::compute(c, &[None, None]);
        assert!(q.bits.contains(QualityBits::ALL_DATA_MISSING));
        assert!(q.bits.contains(QualityBits::SOME_DATA_MISSING));
        assert_eq!(q.first_missing_row, Some(0));

        let q = ChannelQuality::compute(c, &[Some(0.), Some(0.)]);
        assert!(q.bits.contains(QualityBits::ALL_DATA_MISSING));

        let q = ChannelQuality::compute(c, &[Some(1.), None, Some(200.), Some(-300.)]);
        assert!(!q.bits.contains(QualityBits::ALL_DATA_MISSING));
        assert!(q.bits.contains(QualityBits::SOME_DATA_MISSING));
        assert!(q.bits.contains(QualityBits::SOME_DATA_INVALID));
        assert_eq!(q.first_missing_row, Some(1));
        assert_eq!(q.first_invalid_row, Some(2));

        let q = ChannelQuality::compute(c, &[Some(1.), Some(0.)]);
        assert!(q.bits.is_valid());
    }

    #[test]
    fn test_new_loader_has_no_data() {
        let loader = ClimateDataLoader::new();
        for c in ClimateComponent::ALL {
            assert_eq!(loader.quality(c).bits, QualityBits::ALL_DATA_MISSING);
        }
        assert_close!(loader.current()[ClimateComponent::Temperature], 5.);
        assert_close!(loader.current()[ClimateComponent::RelativeHumidity], 10.);

        let mut loader = loader;
        loader.set_time(2007, 1000.).unwrap();
        assert_close!(loader.current()[ClimateComponent::Temperature], 5.);
    }

    #[test]
    fn test_constant_hourly() -> Result<(), ClimateError> {
        let mut loader = ClimateDataLoader::new();
        loader.load(constant_data_set(ClimateComponent::Temperature, 20.))?;
        loader.set_time(2020, 0.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 20.);
        loader.set_time(2020, 4380. * 3600.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 20.);
        assert!(loader.quality(ClimateComponent::Temperature).bits.is_valid());
        Ok(())
    }

    #[test]
    fn test_hourly_interpolation() -> Result<(), ClimateError> {
        let mut ds = ClimateDataSet::hourly(ClimateHeader::default());
        let ramp: Vec<Option<Float>> = (0..HOURS_PER_YEAR).map(|i| Some(i as Float)).collect();
        *ds.channel_mut(ClimateComponent::Temperature) = ramp.clone();
        *ds.channel_mut(ClimateComponent::DiffuseRadiationHorizontal) = ramp;

        let mut loader = ClimateDataLoader::new();
        loader.load(ds)?;

        // Value at the end of the first hour (i.e., sample 0)... and halfway through the fourth.
        loader.set_time(2020, 3600.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 0.);
        loader.set_time(2020, 3. * 3600. + 1800.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 2.5);

        // Averages are located in the middle of the hour
        loader.set_time(2020, 1800.)?;
        assert_close!(
            loader.current()[ClimateComponent::DiffuseRadiationHorizontal],
            0.
        );
        loader.set_time(2020, 3600.)?;
        assert_close!(
            loader.current()[ClimateComponent::DiffuseRadiationHorizontal],
            0.5
        );

        // Wrap around the beginning of the year
        loader.set_time(2020, 1800.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 0.5 * 8759.);
        loader.set_time(2020, 0.)?;
        assert_close!(
            loader.current()[ClimateComponent::DiffuseRadiationHorizontal],
            0.5 * 8759.
        );
        Ok(())
    }

    #[test]
    fn test_periodicity() -> Result<(), ClimateError> {
        let mut ds = ClimateDataSet::hourly(ClimateHeader::default());
        for c in ClimateComponent::ALL {
            *ds.channel_mut(c) = (0..HOURS_PER_YEAR)
                .map(|i| Some(((i * 7 + c.index()) % 23) as Float))
                .collect();
        }
        let mut loader = ClimateDataLoader::new();
        loader.load(ds)?;

        for t in [0., 1200., 3600., 5000., 86400. * 100. + 123., SECONDS_PER_YEAR - 1.] {
            loader.set_time(2020, t)?;
            let a = *loader.current();
            loader.set_time(2020, t + SECONDS_PER_YEAR)?;
            let b = *loader.current();
            assert_eq!(a, b);
        }
        Ok(())
    }

    #[test]
    fn test_explicit_time_points() -> Result<(), ClimateError> {
        let mut ds = ClimateDataSet::default();
        ds.time_points = vec![0., 86400.];
        for c in ClimateComponent::ALL {
            *ds.channel_mut(c) = vec![None, None];
        }
        *ds.channel_mut(ClimateComponent::Temperature) = vec![Some(10.), Some(20.)];
        *ds.channel_mut(ClimateComponent::DirectRadiationNormal) = vec![Some(100.), Some(300.)];

        let mut loader = ClimateDataLoader::new();
        loader.load(ds)?;
        assert!(loader.is_cyclic());

        loader.set_time(2020, 43200.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 15.);
        // All channels use the same interpolation
        assert_close!(
            loader.current()[ClimateComponent::DirectRadiationNormal],
            200.
        );

        // Clamped
        loader.set_time(2020, 2. * 86400.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 20.);

        // Missing values
        assert_close!(loader.current()[ClimateComponent::AirPressure], 101325.);
        Ok(())
    }

    #[test]
    fn test_time_out_of_range() -> Result<(), ClimateError> {
        let n = 3 * 365;
        let mut ds = ClimateDataSet::default();
        ds.header.start_year = 2010;
        ds.time_points = (0..n).map(|i| i as Float * 86400.).collect();
        for c in ClimateComponent::ALL {
            *ds.channel_mut(c) = (0..n).map(|i| Some(i as Float)).collect();
        }
        let mut loader = ClimateDataLoader::new();
        loader.load(ds)?;
        assert!(!loader.is_cyclic());

        // Second year of data, day 10.5
        loader.set_time(2011, 10.5 * 86400.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 375.5);

        let e = loader.set_time(2020, 0.).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::TimeOutOfRange);
        let e = loader.set_time(2009, 0.).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::TimeOutOfRange);

        // The previous value is kept
        assert_close!(loader.current()[ClimateComponent::Temperature], 375.5);
        Ok(())
    }

    #[test]
    fn test_all_missing() -> Result<(), ClimateError> {
        let mut loader = ClimateDataLoader::new();
        loader.load(ClimateDataSet::hourly(ClimateHeader::default()))?;
        for c in ClimateComponent::ALL {
            assert!(loader.quality(c).bits.contains(QualityBits::ALL_DATA_MISSING));
        }
        for t in [0., 1000., 3600. * 4000.5] {
            loader.set_time(2020, t)?;
            for c in ClimateComponent::ALL {
                assert_close!(loader.current()[c], c.default_value());
            }
        }
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<(), ClimateError> {
        let mut loader = ClimateDataLoader::new();
        loader.load(constant_data_set(ClimateComponent::Temperature, 20.))?;

        // Non-cyclic: plain evaluation
        let spline = LinearSpline::new(vec![0., 2. * SECONDS_PER_YEAR], vec![0., 10.])?;
        loader.set_override(ClimateComponent::Temperature, Some(spline));
        loader.set_time(2020, SECONDS_PER_YEAR / 2.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 2.5);

        // Cyclic: wraps between the last and the first values
        let spline = LinearSpline::new(vec![3600., SECONDS_PER_YEAR - 3600.], vec![0., 10.])?;
        loader.set_override(ClimateComponent::Temperature, Some(spline));
        loader.set_time(2020, 0.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 5.);

        loader.set_override(ClimateComponent::Temperature, None);
        loader.set_time(2020, 0.)?;
        assert_close!(loader.current()[ClimateComponent::Temperature], 20.);
        Ok(())
    }

    #[test]
    fn test_load_checks() {
        let mut loader = ClimateDataLoader::new();
        let mut ds = ClimateDataSet::hourly(ClimateHeader::default());
        ds.channel_mut(ClimateComponent::Rain).pop();
        let e = loader.load(ds).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::RowCountMismatch);

        let mut ds = ClimateDataSet::default();
        ds.time_points = vec![0., 10., 10.];
        for c in ClimateComponent::ALL {
            *ds.channel_mut(c) = vec![Some(1.); 3];
        }
        let e = loader.load(ds).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NonMonotonicOrDuplicateTimestamp);
    }

    #[test]
    fn test_has_valid_time_points() {
        let mut loader = ClimateDataLoader::new();
        assert!(loader.has_valid_time_points());

        loader.time_points = vec![0., 10., 20.];
        assert!(loader.has_valid_time_points());

        // Repeated points are rejected by load(), so they are not valid either
        loader.time_points = vec![0., 10., 10.];
        assert!(!loader.has_valid_time_points());

        loader.time_points = vec![0., 20., 10.];
        assert!(!loader.has_valid_time_points());
    }

    #[test]
    fn test_blend() {
        assert_eq!(blend(Some(1.), Some(3.), 0.5), Some(2.));
        assert_eq!(blend(Some(1.), None, 1.), Some(1.));
        assert_eq!(blend(None, Some(3.), 0.), Some(3.));
        assert_eq!(blend(Some(1.), None, 0.5), None);
        assert_eq!(blend(None, None, 0.5), None);
    }
}
