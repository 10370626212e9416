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

#![deny(missing_docs)]

//! This is [SIMPLE's](https://www.simplesim.tools) climate boundary condition module. It is responsible for:
//!
//! * **Reading weather files**: EPW, WAC, BBSR Test Reference Years, the binary `c6b` format and directories of
//! `ccd` files are all normalized into the same nine-channel annual series (temperature, relative humidity, direct
//! normal and diffuse horizontal radiation, wind direction and velocity, long wave counter radiation, air pressure
//! and rain). Missing values are tracked per channel, and can be inspected through the quality bits of each channel.
//! * **Calculating the position of the sun**: A simple closed-form ephemeris driven by the apparent solar time.
//! * **Calculating Incident Solar Radiation in each surface**: Surfaces are described only by their orientation and
//! inclination, so this is a pure sky-model calculation (isotropic, or Perez) with no shading whatsoever.
//!
//! The whole thing is driven from outside. Someone calls [`SolarRadiationModel::set_time`] once per timestep and
//! then reads the results through [`SolarRadiationModel::radiation_load`].

/// The kind of Floating point number used in the
/// library... the `"float"` feature means it becomes `f32`
/// and `f64` is used otherwise.
#[cfg(feature = "float")]
pub type Float = f32;
/// Well, Pi.
#[cfg(feature = "float")]
pub const PI: Float = std::f32::consts::PI;

/// The kind of Floating point number used in the
/// library... the `"float"` feature means it becomes `f32`
/// and `f64` is used otherwise.
#[cfg(not(feature = "float"))]
pub type Float = f64;

/// Well, Pi.
#[cfg(not(feature = "float"))]
pub const PI: Float = std::f64::consts::PI;

/// The number of seconds in a (non-leap) year, which is the period
/// of every cyclic climate series.
pub const SECONDS_PER_YEAR: Float = 365. * 24. * 3600.;

/// The errors that can come out of this crate
pub mod error;
pub use error::{ClimateError, ErrorKind};

/// A linear spline, used for overriding climate data and for
/// tabulated functions of time in general.
pub mod linear_spline;
pub use linear_spline::{Extrapolation, LinearSpline};

/// Units of measurement and conversions between them.
pub mod units;

/// The climate data, its formats and the loader that interpolates it in time.
pub mod climate;
pub use climate::{ClimateComponent, ClimateDataLoader, ClimateHeader, QualityBits};

/// Calculates the position of the Sun
pub mod sun_position;
pub use sun_position::SunPositionModel;

/// Options of the radiation model
pub mod options;
pub use options::{ClearSkyModel, SolarRadiationOptions};

mod perez;

/// The main export of this module: A model for calculating
/// the solar radiation on surfaces.
pub mod solar_radiation;
pub use solar_radiation::{RadiationLoad, SolarRadiationModel};
