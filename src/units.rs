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

use crate::error::ClimateError;
use crate::{Float, PI};

/// The physical dimension of a [`Unit`]. Only units with the
/// same dimension can be converted into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Base unit is K
    Temperature,
    /// Base unit is `---` (i.e., a fraction between 0 and 1)
    Fraction,
    /// Base unit is W/m2
    Irradiance,
    /// Base unit is rad
    Angle,
    /// Base unit is m/s
    Velocity,
    /// Base unit is Pa
    Pressure,
    /// Base unit is kg/m2s
    RainFlux,
    /// Base unit is s
    Time,
}

/// A unit of measurement. A value `v` in this unit equals
/// `v * factor + offset` in the base unit of its [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    name: &'static str,
    dimension: Dimension,
    factor: Float,
    offset: Float,
}

const fn unit(name: &'static str, dimension: Dimension, factor: Float, offset: Float) -> Unit {
    Unit {
        name,
        dimension,
        factor,
        offset,
    }
}

const KNOWN_UNITS: [Unit; 37] = [
    unit("K", Dimension::Temperature, 1., 0.),
    unit("C", Dimension::Temperature, 1., 273.15),
    unit("F", Dimension::Temperature, 5. / 9., 273.15 - 32. * 5. / 9.),
    unit("---", Dimension::Fraction, 1., 0.),
    unit("-", Dimension::Fraction, 1., 0.),
    unit("1", Dimension::Fraction, 1., 0.),
    unit("%", Dimension::Fraction, 0.01, 0.),
    unit("W/m2", Dimension::Irradiance, 1., 0.),
    unit("kW/m2", Dimension::Irradiance, 1000., 0.),
    unit("J/m2h", Dimension::Irradiance, 1. / 3600., 0.),
    unit("kJ/m2h", Dimension::Irradiance, 1000. / 3600., 0.),
    unit("MJ/m2h", Dimension::Irradiance, 1e6 / 3600., 0.),
    unit("rad", Dimension::Angle, 1., 0.),
    unit("Deg", Dimension::Angle, PI / 180., 0.),
    unit("deg", Dimension::Angle, PI / 180., 0.),
    unit("m/s", Dimension::Velocity, 1., 0.),
    unit("km/h", Dimension::Velocity, 1. / 3.6, 0.),
    unit("Pa", Dimension::Pressure, 1., 0.),
    unit("hPa", Dimension::Pressure, 100., 0.),
    unit("mbar", Dimension::Pressure, 100., 0.),
    unit("kPa", Dimension::Pressure, 1000., 0.),
    unit("bar", Dimension::Pressure, 1e5, 0.),
    unit("kg/m2s", Dimension::RainFlux, 1., 0.),
    unit("l/m2s", Dimension::RainFlux, 1., 0.),
    unit("kg/m2h", Dimension::RainFlux, 1. / 3600., 0.),
    unit("l/m2h", Dimension::RainFlux, 1. / 3600., 0.),
    unit("mm/h", Dimension::RainFlux, 1. / 3600., 0.),
    unit("l/m2d", Dimension::RainFlux, 1. / 86400., 0.),
    unit("mm/d", Dimension::RainFlux, 1. / 86400., 0.),
    unit("s", Dimension::Time, 1., 0.),
    unit("min", Dimension::Time, 60., 0.),
    unit("h", Dimension::Time, 3600., 0.),
    unit("d", Dimension::Time, 86400., 0.),
    unit("a", Dimension::Time, 365. * 86400., 0.),
    unit("ms", Dimension::Time, 1e-3, 0.),
    unit("W/m²", Dimension::Irradiance, 1., 0.),
    unit("°C", Dimension::Temperature, 1., 273.15),
];

impl Unit {
    /// Finds a unit by its name (e.g., `"W/m2"`).
    pub fn from_name(name: &str) -> Result<Self, ClimateError> {
        let name = name.trim();
        KNOWN_UNITS
            .iter()
            .find(|u| u.name == name)
            .copied()
            .ok_or_else(|| ClimateError::UnknownOrIncompatibleUnit(format!("unknown unit '{}'", name)))
    }

    /// The name of the unit
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The physical dimension of the unit
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Converts a value from this unit into `target`
    pub fn convert(&self, value: Float, target: &Unit) -> Result<Float, ClimateError> {
        self.check_compatible(target)?;
        Ok(self.convert_unchecked(value, target))
    }

    /// Converts a whole series, leaving missing values missing.
    pub fn convert_series(
        &self,
        values: &mut [Option<Float>],
        target: &Unit,
    ) -> Result<(), ClimateError> {
        self.check_compatible(target)?;
        if self == target {
            return Ok(());
        }
        values
            .iter_mut()
            .flatten()
            .for_each(|v| *v = self.convert_unchecked(*v, target));
        Ok(())
    }

    fn check_compatible(&self, target: &Unit) -> Result<(), ClimateError> {
        if self.dimension != target.dimension {
            return Err(ClimateError::UnknownOrIncompatibleUnit(format!(
                "cannot convert from '{}' into '{}'",
                self.name, target.name
            )));
        }
        Ok(())
    }

    fn convert_unchecked(&self, value: Float, target: &Unit) -> Float {
        let base = value * self.factor + self.offset;
        (base - target.offset) / target.factor
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::ErrorKind;
    use validate::assert_close;

    #[test]
    fn test_from_name() -> Result<(), ClimateError> {
        let u = Unit::from_name(" W/m2 ")?;
        assert_eq!(u.name(), "W/m2");
        assert_eq!(u.dimension(), Dimension::Irradiance);

        let e = Unit::from_name("furlongs/fortnight").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnknownOrIncompatibleUnit);
        Ok(())
    }

    #[test]
    fn test_convert() -> Result<(), ClimateError> {
        let c = Unit::from_name("C")?;
        let k = Unit::from_name("K")?;
        let f = Unit::from_name("F")?;
        assert_close!(c.convert(20., &k)?, 293.15, 1e-9);
        assert_close!(f.convert(212., &c)?, 100., 1e-9);

        let hpa = Unit::from_name("hPa")?;
        let pa = Unit::from_name("Pa")?;
        assert_close!(hpa.convert(1013.25, &pa)?, 101325., 1e-6);

        let kj = Unit::from_name("kJ/m2h")?;
        let w = Unit::from_name("W/m2")?;
        assert_close!(kj.convert(3600., &w)?, 1000., 1e-9);

        let d = Unit::from_name("d")?;
        let s = Unit::from_name("s")?;
        assert_close!(d.convert(1.5, &s)?, 129600., 1e-9);
        Ok(())
    }

    #[test]
    fn test_incompatible() -> Result<(), ClimateError> {
        let c = Unit::from_name("C")?;
        let pa = Unit::from_name("Pa")?;
        let e = c.convert(1., &pa).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnknownOrIncompatibleUnit);
        Ok(())
    }

    #[test]
    fn test_convert_series() -> Result<(), ClimateError> {
        let from = Unit::from_name("---")?;
        let to = Unit::from_name("%")?;
        let mut v = vec![Some(0.5), None, Some(1.0)];
        from.convert_series(&mut v, &to)?;
        assert_close!(v[0].unwrap(), 50., 1e-9);
        assert!(v[1].is_none());
        assert_close!(v[2].unwrap(), 100., 1e-9);
        Ok(())
    }
}
