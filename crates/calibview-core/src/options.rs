//! Visualization options carried by a calibration file.

use serde::{Deserialize, Serialize};

use crate::config::ConfigObject;
use crate::error::{CalibviewError, Result};

/// Scale parameters that control how calibration data is drawn.
///
/// Every field is optional in the file; missing fields take the defaults
/// below, which reproduce a millimeter-scale world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationOptions {
    /// Factor converting meters to display units.
    pub unit_scale: f64,

    /// Frustum size relative to the unit scale.
    pub frustum_scale_factor: f64,

    /// Camera marker radius, in display units.
    pub camera_marker_radius: f64,

    /// Length of each world axis, in display units.
    pub axis_length: f64,

    /// Length of each axis arrowhead wing, in display units.
    pub axis_arrow_size: f64,
}

impl Default for VisualizationOptions {
    fn default() -> Self {
        Self {
            unit_scale: 1000.0,
            frustum_scale_factor: 0.7,
            camera_marker_radius: 20.0,
            axis_length: 1500.0,
            axis_arrow_size: 300.0,
        }
    }
}

impl VisualizationOptions {
    /// Decodes a `visualization` block.
    ///
    /// Absent keys keep their defaults; present ones follow the same number
    /// rules as every other configuration field.
    pub fn from_config(obj: &ConfigObject<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            unit_scale: obj.number_or("unit_scale", defaults.unit_scale)?,
            frustum_scale_factor: obj
                .number_or("frustum_scale_factor", defaults.frustum_scale_factor)?,
            camera_marker_radius: obj
                .number_or("camera_marker_radius", defaults.camera_marker_radius)?,
            axis_length: obj.number_or("axis_length", defaults.axis_length)?,
            axis_arrow_size: obj.number_or("axis_arrow_size", defaults.axis_arrow_size)?,
        })
    }

    /// Checks that every parameter is finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        let params = [
            ("unit_scale", self.unit_scale),
            ("frustum_scale_factor", self.frustum_scale_factor),
            ("camera_marker_radius", self.camera_marker_radius),
            ("axis_length", self.axis_length),
            ("axis_arrow_size", self.axis_arrow_size),
        ];
        for (key, value) in params {
            if !value.is_finite() || value <= 0.0 {
                return Err(CalibviewError::InvalidParameter {
                    key: format!("visualization.{key}"),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Uniform scale applied to the frustum node.
    pub fn frustum_scale(&self) -> f64 {
        self.frustum_scale_factor * self.unit_scale
    }

    /// Marker radius expressed in the frustum node's local units.
    ///
    /// After the frustum scale is applied the rendered radius equals
    /// [`camera_marker_radius`](Self::camera_marker_radius).
    pub fn frustum_marker_radius(&self) -> f64 {
        self.camera_marker_radius / self.frustum_scale()
    }
}
