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

use crate::{Float, PI};

/// Calculates the position of the sun in the sky, based on
/// the apparent solar time.
///
/// All angles are in Radians. The azimuth is measured clockwise
/// from North (i.e., East is `PI/2`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SunPositionModel {
    /// Latitude of the site. South is negative, North is positive.
    pub latitude: Float,

    /// Longitude of the site. East is positive.
    pub longitude: Float,

    /// Elevation of the sun over the horizon, in `[-PI/2, PI/2]`
    pub elevation: Float,

    /// Azimuth of the sun, in `[0, 2*PI)`
    pub azimuth: Float,

    /// Declination of the sun
    pub declination: Float,
}

impl SunPositionModel {
    /// Creates a new model for a location given in degrees
    pub fn new(latitude_deg: Float, longitude_deg: Float) -> Self {
        Self {
            latitude: latitude_deg.to_radians(),
            longitude: longitude_deg.to_radians(),
            ..Self::default()
        }
    }

    /// Declination (in Radians) on a day of the year (starting with 1)
    pub fn declination(n: Float) -> Float {
        (23.45 as Float).to_radians() * (2. * PI * (284. + n) / 365.).sin()
    }

    /// Hour angle (in Radians) at a time given in days since
    /// the beginning of the year. It is 0 at noon and negative in the morning.
    pub fn hour_angle(td: Float) -> Float {
        let solar_hour = 24. * td.fract();
        ((solar_hour - 12.) * 15.).to_radians()
    }

    /// Updates the position of the sun. `apparent_solar_time` is in
    /// seconds since the beginning of the year.
    pub fn set_time(&mut self, apparent_solar_time: Float) {
        let td = apparent_solar_time / (24. * 3600.);

        let delta = Self::declination(td + 1.);
        let omega = Self::hour_angle(td);

        let (sin_phi, cos_phi) = self.latitude.sin_cos();
        let (sin_delta, cos_delta) = delta.sin_cos();
        let cos_omega = omega.cos();

        let sin_elevation = (sin_phi * sin_delta + cos_phi * cos_delta * cos_omega).clamp(-1., 1.);
        self.elevation = sin_elevation.asin();

        let y = -cos_delta * omega.sin();
        let x = cos_phi * sin_delta - sin_phi * cos_delta * cos_omega;
        let mut azimuth = y.atan2(x);
        if azimuth < 0. {
            azimuth += 2. * PI;
        }
        self.azimuth = azimuth;
        self.declination = delta;
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use validate::assert_close;

    #[test]
    fn test_declination() {
        // Solstices and equinoxes, more or less
        assert_close!(SunPositionModel::declination(172.).to_degrees(), 23.45, 0.1);
        assert_close!(SunPositionModel::declination(355.).to_degrees(), -23.45, 0.1);
        assert_close!(SunPositionModel::declination(81.).to_degrees(), 0., 0.5);
    }

    #[test]
    fn test_noon() {
        let mut sun = SunPositionModel::new(52., 13.);
        // Noon of June 21st
        sun.set_time((171. + 0.5) * 86400.);
        assert_close!(sun.azimuth.to_degrees(), 180., 1e-6);
        let expected = 90. - 52. + sun.declination.to_degrees();
        assert_close!(sun.elevation.to_degrees(), expected, 1e-6);
        assert!(sun.declination > 0.);
    }

    #[test]
    fn test_morning_and_afternoon() {
        let mut sun = SunPositionModel::new(52., 13.);
        let day = 171. * 86400.;

        sun.set_time(day + 9. * 3600.);
        let (morning_elevation, morning_azimuth) = (sun.elevation, sun.azimuth);
        assert!(morning_azimuth > 0. && morning_azimuth < PI);

        sun.set_time(day + 15. * 3600.);
        assert!(sun.azimuth > PI && sun.azimuth < 2. * PI);
        // Symmetric around noon (declination changes a bit during the day)
        assert_close!(sun.elevation, morning_elevation, 1e-3);
        assert_close!(sun.azimuth, 2. * PI - morning_azimuth, 1e-3);
    }

    #[test]
    fn test_night() {
        let mut sun = SunPositionModel::new(52., 13.);
        sun.set_time(10. * 86400.);
        assert!(sun.elevation < 0.);
        assert!(sun.azimuth >= 0. && sun.azimuth < 2. * PI);

        // Midnight, southern hemisphere
        let mut sun = SunPositionModel::new(-52., 13.);
        sun.set_time(171. * 86400.);
        assert!(sun.elevation < 0.);
    }
}
