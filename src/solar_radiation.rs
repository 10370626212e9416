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

use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use calendar::Date;

use crate::climate::{ccd, ClimateComponent, ClimateDataLoader, ClimateHeader};
use crate::error::{ClimateError, InFile};
use crate::linear_spline::LinearSpline;
use crate::options::{ClearSkyModel, SolarRadiationOptions};
use crate::perez;
use crate::sun_position::SunPositionModel;
use crate::{Float, PI, SECONDS_PER_YEAR};

/// Surfaces whose orientation and inclination differ by less than
/// this (in Radians) are the same surface
const SAME_SURFACE_TOLERANCE: Float = 1e-5;

/// Solar constant used for limiting normal radiation, in W/m2
const SOLAR_CONSTANT: Float = 1366.1;

/// ASHRAE optical depths, given on January 1st, on the 21st of each month
/// and at the end of the year
const ASHRAE_OPTICAL_DEPTH: [Float; 14] = [
    0.142, 0.142, 0.144, 0.156, 0.180, 0.196, 0.205, 0.207, 0.201, 0.177, 0.160, 0.149, 0.142,
    0.142,
];

/// The solar radiation reaching a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiationLoad {
    /// Direct solar radiation, in W/m2 of surface
    pub direct: Float,

    /// Diffuse solar radiation (from the sky and the ground), in W/m2 of surface
    pub diffuse: Float,

    /// The angle between the normal of the surface and the sun, in Radians
    pub incidence_angle: Float,
}

impl Default for RadiationLoad {
    fn default() -> Self {
        Self {
            direct: 0.,
            diffuse: 0.,
            incidence_angle: 0.,
        }
    }
}

/// Goes smoothly from 0 (at `x <= 0`) to 1 (at `x >= eps`)
fn scale2(x: Float, eps: Float) -> Float {
    if x <= 0. {
        0.
    } else if x >= eps {
        1.
    } else {
        0.5 - 0.5 * (PI * x / eps).cos()
    }
}

fn is_flat(inclination: Float) -> bool {
    inclination.abs() < SAME_SURFACE_TOLERANCE
}

/// Everything needed for calculating the radiation on a surface at a certain time
struct SkyState {
    elevation: Float,
    azimuth: Float,
    direct_normal: Float,
    diffuse_horizontal: Float,
    pressure: Float,
    /// Day of the year (with decimals), in apparent solar time
    day: Float,
    albedo: Float,
    perez_enabled: bool,
}

impl SkyState {
    fn isotropic_diffuse(&self, inclination: Float, ground_reflected: Float) -> (Float, Float) {
        let cos_half = (0.5 * inclination).cos();
        let to_sky = cos_half * cos_half;
        let to_ground = 1. - to_sky;
        (
            to_sky * self.diffuse_horizontal,
            self.albedo * to_ground * ground_reflected,
        )
    }

    fn night_load(&self, inclination: Float) -> RadiationLoad {
        let mut load = RadiationLoad {
            direct: 0.,
            diffuse: 0.,
            incidence_angle: PI / 2.,
        };
        // Some diffuse radiation may remain after sunset
        if self.perez_enabled || self.diffuse_horizontal == 0. {
            return load;
        }
        load.diffuse = if is_flat(inclination) {
            self.diffuse_horizontal
        } else {
            let (sky, ground) = self.isotropic_diffuse(inclination, self.diffuse_horizontal);
            sky + ground
        };
        load
    }

    fn load(&self, orientation: Float, inclination: Float) -> RadiationLoad {
        if self.elevation <= 0. {
            return self.night_load(inclination);
        }
        let direct_normal = scale2(self.elevation, 1e-4) * self.direct_normal;
        let (sin_elevation, cos_elevation) = self.elevation.sin_cos();
        let direct_horizontal = sin_elevation * direct_normal;
        let direct_vertical = cos_elevation * direct_normal;

        if is_flat(inclination) {
            return RadiationLoad {
                direct: direct_horizontal,
                diffuse: self.diffuse_horizontal,
                incidence_angle: PI / 2. - self.elevation,
            };
        }

        let (sin_inclination, cos_inclination) = inclination.sin_cos();
        let normal_vertical = sin_inclination * (self.azimuth - orientation).cos();
        let cos_incidence =
            (cos_inclination * sin_elevation + normal_vertical * cos_elevation).min(1.);

        let (direct, incidence_angle) = if cos_incidence >= 0. {
            (
                cos_inclination * direct_horizontal + normal_vertical * direct_vertical,
                cos_incidence.acos(),
            )
        } else {
            (0., PI / 2.)
        };

        let (isotropic_sky, ground) =
            self.isotropic_diffuse(inclination, self.diffuse_horizontal + direct_horizontal);
        let sky = if self.perez_enabled {
            perez::diffuse_radiation(
                inclination,
                incidence_angle,
                PI / 2. - self.elevation,
                self.day,
                self.diffuse_horizontal,
                direct_normal,
                self.pressure,
            )
        } else {
            isotropic_sky
        };

        RadiationLoad {
            direct,
            diffuse: sky + ground,
            incidence_angle,
        }
    }
}

/// Calculates the solar radiation reaching surfaces of arbitrary orientation
/// and inclination, based on the data in a [`ClimateDataLoader`].
///
/// Usage is: register surfaces with [`SolarRadiationModel::add_surface`],
/// call [`SolarRadiationModel::set_time`] and then ask for the
/// [`RadiationLoad`] of each surface.
#[derive(Debug, Clone)]
pub struct SolarRadiationModel {
    /// The position of the sun at the last time set
    pub sun_position: SunPositionModel,

    /// The climate data
    pub climate: ClimateDataLoader,

    /// The options
    pub options: SolarRadiationOptions,

    /// Orientation and inclination of each surface
    surfaces: Vec<(Float, Float)>,

    /// The results for each surface
    loads: Vec<RadiationLoad>,

    local_mean_time: Float,
    apparent_solar_time: Float,

    optical_depth: LinearSpline,
}

impl Default for SolarRadiationModel {
    fn default() -> Self {
        Self::new(ClimateDataLoader::default(), SolarRadiationOptions::default())
    }
}

impl SolarRadiationModel {
    /// Creates a new model. The location of the sun is taken from the
    /// header of `climate`.
    pub fn new(climate: ClimateDataLoader, options: SolarRadiationOptions) -> Self {
        let mut x = Vec::with_capacity(ASHRAE_OPTICAL_DEPTH.len());
        x.push(0.);
        // The table is given for the 21st of each month
        for month in 1..=12 {
            let date = Date {
                month,
                day: 21,
                hour: 0.,
            };
            x.push(date.day_of_year() * 86400.);
        }
        x.push(SECONDS_PER_YEAR);

        let header = &climate.header;
        let sun_position = SunPositionModel::new(
            header.latitude_deg.unwrap_or(0.),
            header.longitude_deg.unwrap_or(0.),
        );
        Self {
            sun_position,
            climate,
            options,
            surfaces: Vec::new(),
            loads: Vec::new(),
            local_mean_time: 0.,
            apparent_solar_time: 0.,
            optical_depth: LinearSpline::from_table(&x, &ASHRAE_OPTICAL_DEPTH),
        }
    }

    /// Creates a model without climate data, used for converting between
    /// horizontal and normal radiation at a location
    pub fn for_location(header: &ClimateHeader) -> Self {
        let mut climate = ClimateDataLoader::new();
        climate.header = header.clone();
        Self::new(climate, SolarRadiationOptions::default())
    }

    pub(crate) fn update_location(&mut self) {
        let header = &self.climate.header;
        self.sun_position.latitude = header.latitude_deg.unwrap_or(0.).to_radians();
        self.sun_position.longitude = header.longitude_deg.unwrap_or(0.).to_radians();
    }

    /// Reads a climate file (see [`ClimateDataLoader::read_climate_data`]) and
    /// moves the sun to its location
    pub fn read_climate_data<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ClimateError> {
        self.climate.read_climate_data(path, false)?;
        self.update_location();
        Ok(())
    }

    /// Reads a directory of `ccd` files (see [`ccd::read_ccd_directory`]). The
    /// location comes from the `description.xml` of the directory or, if there is
    /// none, from the current header. Returns the files that were not found.
    pub fn read_climate_data_ccd_directory<P: AsRef<Path>>(
        &mut self,
        directory: P,
    ) -> Result<Vec<PathBuf>, ClimateError> {
        let directory = directory.as_ref();
        let (data_set, skipped) = ccd::read_ccd_directory(directory, self)?;
        self.climate.load(data_set).in_file(directory)?;
        Ok(skipped)
    }

    /// Registers a surface and returns its ID. Angles are in Radians; the orientation is
    /// measured clockwise from North and an inclination of 0 is a flat roof.
    ///
    /// A surface that is (almost) the same as one registered before gets the same ID.
    pub fn add_surface(&mut self, orientation: Float, inclination: Float) -> usize {
        if let Some(i) = self.surfaces.iter().position(|(o, i)| {
            (o - orientation).abs() < SAME_SURFACE_TOLERANCE
                && (i - inclination).abs() < SAME_SURFACE_TOLERANCE
        }) {
            return i;
        }
        self.surfaces.push((orientation, inclination));
        self.loads.push(RadiationLoad::default());
        self.surfaces.len() - 1
    }

    /// The number of surfaces registered
    pub fn n_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    /// The local mean time at the last time set
    pub fn current_local_mean_time(&self) -> Float {
        self.local_mean_time
    }

    /// The apparent solar time at the last time set
    pub fn current_apparent_solar_time(&self) -> Float {
        self.apparent_solar_time
    }

    /// Corrects the local standard time (seconds of the year) by the deviation of
    /// the longitude from the meridian of the time zone
    pub fn local_mean_time(&self, seconds_of_year: Float) -> Float {
        let time_zone = self.climate.header.time_zone;
        let mut deviation = time_zone as Float * 15. - self.sun_position.longitude.to_degrees();
        if time_zone.abs() == 12 {
            if deviation >= 345. {
                deviation -= 360.;
            } else if deviation <= -345. {
                deviation += 360.;
            }
        }
        // 4 minutes per degree
        let t = seconds_of_year.rem_euclid(SECONDS_PER_YEAR) - 4. * 60. * deviation;
        t.rem_euclid(SECONDS_PER_YEAR)
    }

    /// Corrects the local mean time (seconds of the year) with the equation of time
    pub fn apparent_solar_time(local_mean_time: Float) -> Float {
        let td = local_mean_time / 86400.;
        let b = 2. * PI * (td - 81.) / 365.;
        let correction = (9.87 * (2. * b).sin() - 7.53 * b.cos() - 1.5 * b.sin()) * 60.;
        (local_mean_time + correction).rem_euclid(SECONDS_PER_YEAR)
    }

    fn move_sun(&mut self, seconds_of_year: Float) {
        self.local_mean_time = self.local_mean_time(seconds_of_year);
        self.apparent_solar_time = Self::apparent_solar_time(self.local_mean_time);
        self.sun_position.set_time(self.apparent_solar_time);
    }

    /// Updates the climate data, the position of the sun and the radiation on every
    /// surface. If the climate data cannot be calculated, nothing changes.
    pub fn set_time(&mut self, year: i32, seconds_of_year: Float) -> Result<(), ClimateError> {
        self.climate.set_time(year, seconds_of_year)?;
        self.move_sun(seconds_of_year);

        let current = self.climate.current();
        let sky = SkyState {
            elevation: self.sun_position.elevation,
            azimuth: self.sun_position.azimuth,
            direct_normal: current[ClimateComponent::DirectRadiationNormal],
            diffuse_horizontal: current[ClimateComponent::DiffuseRadiationHorizontal],
            pressure: current[ClimateComponent::AirPressure],
            day: self.apparent_solar_time / 86400.,
            albedo: self.options.albedo,
            perez_enabled: self.options.perez_enabled,
        };

        #[cfg(not(feature = "parallel"))]
        let surfaces = self.surfaces.iter();
        #[cfg(feature = "parallel")]
        let surfaces = self.surfaces.par_iter();

        self.loads = surfaces.map(|(o, i)| sky.load(*o, *i)).collect();
        Ok(())
    }

    /// The radiation on a surface at the last time set
    pub fn radiation_load(&self, surface_id: usize) -> Result<RadiationLoad, ClimateError> {
        self.loads
            .get(surface_id)
            .copied()
            .ok_or(ClimateError::InvalidSurfaceId(surface_id))
    }

    /// Calculates direct normal radiation from direct horizontal radiation
    /// (both in W/m2) at a certain time (local standard time, in seconds of the year).
    ///
    /// The result is limited by the clear sky model in the options (or by the
    /// extraterrestrial radiation), and it is zero at night.
    pub fn convert_horizontal_to_normal_radiation(
        &mut self,
        seconds_of_year: Float,
        direct_horizontal: Float,
    ) -> Float {
        self.move_sun(seconds_of_year);
        let elevation = self.sun_position.elevation;
        if elevation <= 0. || direct_horizontal == 0. {
            return 0.;
        }

        let td = self.apparent_solar_time / 86400.;
        let extraterrestrial = SOLAR_CONSTANT * (1. + 0.033 * (2. * PI * td / 365.).cos());
        let normal = direct_horizontal / elevation.sin();

        match self.options.clear_sky_model {
            ClearSkyModel::AshraeClearSky => {
                let depth = self.optical_depth.value(self.apparent_solar_time);
                // exp() of very negative numbers is zero anyway
                let clear_sky = if elevation > 1e-3 {
                    extraterrestrial * (-depth / elevation.sin()).exp()
                } else {
                    0.
                };
                normal.min(clear_sky)
            }
            ClearSkyModel::None => normal.min(extraterrestrial),
        }
    }

    /// Calculates direct horizontal radiation from direct normal radiation
    /// (both in W/m2) at a certain time (local standard time, in seconds of the year)
    pub fn convert_normal_to_horizontal_radiation(
        &mut self,
        seconds_of_year: Float,
        direct_normal: Float,
    ) -> Float {
        self.move_sun(seconds_of_year);
        let elevation = self.sun_position.elevation;
        if elevation <= 0. || direct_normal <= 0. {
            return 0.;
        }
        elevation.sin() * scale2(elevation, 1e-4) * direct_normal
    }
}
