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
use crate::Float;
use serde::{Deserialize, Serialize};

/// The model used for limiting direct normal radiation when it
/// is calculated from direct horizontal radiation
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearSkyModel {
    /// The ASHRAE clear sky model, with monthly optical depths
    #[default]
    AshraeClearSky,

    /// Only the extraterrestrial radiation limits the result
    None,
}

fn default_albedo() -> Float {
    0.2
}

/// Options for the [`crate::SolarRadiationModel`]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarRadiationOptions {
    /// The reflectance of the ground
    #[serde(default = "default_albedo")]
    pub albedo: Float,

    /// See [`ClearSkyModel`]
    #[serde(default)]
    pub clear_sky_model: ClearSkyModel,

    /// Use the anisotropic Perez model for the diffuse radiation
    /// coming from the sky. Otherwise, the sky is isotropic.
    #[serde(default)]
    pub perez_enabled: bool,
}

impl Default for SolarRadiationOptions {
    fn default() -> Self {
        Self {
            albedo: default_albedo(),
            clear_sky_model: ClearSkyModel::default(),
            perez_enabled: false,
        }
    }
}

impl SolarRadiationOptions {
    /// Reads the options from a JSON string. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, ClimateError> {
        Ok(serde_json::from_str(json)?)
    }
}
