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

//! The anisotropic sky model from Perez, R., Ineichen, P., Seals, R.,
//! Michalsky, J. and Stewart, R. (1990), "Modeling daylight availability and
//! irradiance components from direct and global irradiance"

use crate::{Float, PI};

/// Next to equation 1 of the paper
const KAPPA: Float = 1.041;

/// Upper limits of the sky clearness categories. The last one has no limit.
const CLEARNESS_LIMITS: [Float; 7] = [1.065, 1.230, 1.5, 1.95, 2.8, 4.5, 6.2];

/// Brightness coefficients `(f11, f12, f13, f21, f22, f23)` for each
/// sky clearness category
const COEFFICIENTS: [[Float; 6]; 8] = [
    [-0.0083, 0.5877, -0.0621, -0.0596, 0.0721, -0.0220],
    [0.1299, 0.6826, -0.1514, -0.0189, 0.0660, -0.0289],
    [0.3297, 0.4869, -0.2211, 0.0554, -0.0640, -0.0261],
    [0.5682, 0.1875, -0.2951, 0.1089, -0.1519, -0.0140],
    [0.8730, -0.3920, -0.3616, 0.2256, -0.4620, 0.0012],
    [1.1329, -1.2367, -0.4118, 0.2878, -0.8230, 0.0559],
    [1.0602, -1.5999, -0.3589, 0.2648, -1.1272, 0.1311],
    [0.6777, -0.3279, -0.2504, 0.1561, -1.3765, 0.2506],
];

/// Sky clearness (Equation 1 of the paper)
pub fn sky_clearness(diffuse_horizontal: Float, direct_normal: Float, solar_zenith: Float) -> Float {
    let z3 = solar_zenith.powi(3);
    ((diffuse_horizontal + direct_normal) / diffuse_horizontal + KAPPA * z3) / (1. + KAPPA * z3)
}

/// The index of the row of [`COEFFICIENTS`] to use
pub fn clearness_category(clearness: Float) -> usize {
    CLEARNESS_LIMITS
        .iter()
        .position(|limit| clearness < *limit)
        .unwrap_or(CLEARNESS_LIMITS.len())
}

/// Relative optical air mass (Kasten and Young), corrected by air pressure (in Pa)
pub fn air_mass(solar_zenith: Float, pressure: Float) -> Float {
    let m = 1. / (solar_zenith.cos() + 0.50572 * (96.07995 - solar_zenith.to_degrees()).powf(-1.6364));
    m * pressure / 101325.
}

/// Extraterrestrial radiation (W/m2) on a day of the year (starting at 1)
pub fn extraterrestrial_radiation(day_of_year: Float) -> Float {
    let b = 2. * PI * day_of_year / 365.;
    1367.
        * (1.00011
            + 0.034221 * b.cos()
            + 0.00128 * b.sin()
            + 0.000719 * (2. * b).cos()
            + 0.000077 * (2. * b).sin())
}

/// Diffuse radiation (W/m2) reaching a tilted surface from the sky.
///
/// * `inclination` and `incidence` are the inclination of the surface and the
///   incidence angle of the sun on it
/// * `solar_zenith` is the zenith angle of the sun, which must be over the horizon
/// * `day` is the (zero-based) day of the year, in apparent solar time
/// * `pressure` is the air pressure, in Pa
pub fn diffuse_radiation(
    inclination: Float,
    incidence: Float,
    solar_zenith: Float,
    day: Float,
    diffuse_horizontal: Float,
    direct_normal: Float,
    pressure: Float,
) -> Float {
    if diffuse_horizontal <= 0. {
        return 0.;
    }
    debug_assert!((0. ..=PI / 2. + 1e-9).contains(&solar_zenith));

    // rounding errors may make this slightly negative
    let a = incidence.cos().max(0.);
    let b = (85. as Float).to_radians().cos().max(solar_zenith.cos());
    let r_b = a / b;

    let m = air_mass(solar_zenith, pressure);
    let delta = diffuse_horizontal * m / extraterrestrial_radiation(day.floor() + 1.);
    let epsilon = sky_clearness(diffuse_horizontal, direct_normal, solar_zenith);

    let [f11, f12, f13, f21, f22, f23] = COEFFICIENTS[clearness_category(epsilon)];
    let f1 = (f11 + f12 * delta + solar_zenith * f13).max(0.);
    let f2 = f21 + f22 * delta + solar_zenith * f23;

    diffuse_horizontal
        * ((1. - f1) * (1. + inclination.cos()) * 0.5 + f1 * r_b + f2 * inclination.sin())
}
