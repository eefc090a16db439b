//! Camera calibration data (extrinsics, intrinsics and visualization options).

use std::path::Path;

use glam::{DMat3, DMat4, DVec2, DVec3};
use serde::Serialize;

use crate::config::{ConfigDocument, ConfigObject};
use crate::error::Result;
use crate::options::VisualizationOptions;

/// Largest tolerated deviation of `R * R^T` from identity before a warning.
pub const ORTHONORMALITY_TOLERANCE: f64 = 1e-3;

/// Camera intrinsics parameters.
///
/// Distortion coefficients are reported only; nothing in the scene applies them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraIntrinsics {
    /// Principal point (cx, cy) in pixels.
    pub principal_point: DVec2,
    /// Focal length (fx, fy) in pixels.
    pub focal_length: DVec2,
    /// Radial distortion coefficients k1..k6.
    pub radial_distortion: [f64; 6],
    /// Tangential distortion coefficients p1, p2.
    pub tangential_distortion: [f64; 2],
}

impl CameraIntrinsics {
    fn decode(obj: &ConfigObject<'_>) -> Result<Self> {
        let principal_point = DVec2::new(
            obj.require_number("principal_point_x")?,
            obj.require_number("principal_point_y")?,
        );
        let focal_length = DVec2::new(
            obj.require_number("focal_length_x")?,
            obj.require_number("focal_length_y")?,
        );

        let mut radial_distortion = [0.0; 6];
        radial_distortion.copy_from_slice(&obj.numbers("radial_distortion", 6)?);
        let mut tangential_distortion = [0.0; 2];
        tangential_distortion.copy_from_slice(&obj.numbers("tangential_distortion", 2)?);

        Ok(Self {
            principal_point,
            focal_length,
            radial_distortion,
            tangential_distortion,
        })
    }
}

/// Parsed calibration of one vehicle camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationData {
    /// Rotation part of the extrinsics. `rotation.row(i)` is row `i` of the file.
    ///
    /// Not guaranteed to be orthonormal.
    pub rotation: DMat3,
    /// Camera center in the vehicle's local frame, in meters.
    pub translation: DVec3,
    /// Optical parameters.
    pub intrinsics: CameraIntrinsics,
    /// Scale parameters for drawing.
    pub visualization: VisualizationOptions,
}

impl CalibrationData {
    /// Creates calibration data from already decoded parts.
    pub fn new(
        rotation: DMat3,
        translation: DVec3,
        intrinsics: CameraIntrinsics,
        visualization: VisualizationOptions,
    ) -> Self {
        Self {
            rotation,
            translation,
            intrinsics,
            visualization,
        }
    }

    /// Loads a calibration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the file cannot be read, and `MissingField`,
    /// `MalformedNumber`, `MalformedArray` or `InvalidParameter` when a required
    /// value is absent or unusable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let doc = ConfigDocument::load(path)?;
        Self::from_document(&doc)
    }

    /// Decodes calibration data from a parsed document.
    pub fn from_document(doc: &ConfigDocument) -> Result<Self> {
        let root = doc.root()?;

        // Four rows of three: rotation rows 0-2, translation in row 3.
        let e = root.numbers("extrinsics", 12)?;
        let rotation = DMat3::from_cols(
            DVec3::new(e[0], e[1], e[2]),
            DVec3::new(e[3], e[4], e[5]),
            DVec3::new(e[6], e[7], e[8]),
        )
        .transpose();
        let translation = DVec3::new(e[9], e[10], e[11]);

        let intrinsics = CameraIntrinsics::decode(&root.object("intrinsics")?)?;

        let visualization = match root.optional_object("visualization")? {
            Some(obj) => VisualizationOptions::from_config(&obj)?,
            None => VisualizationOptions::default(),
        };
        visualization.validate()?;

        let calibration = Self::new(rotation, translation, intrinsics, visualization);

        let error = calibration.orthonormality_error();
        if error > ORTHONORMALITY_TOLERANCE {
            log::warn!(
                "rotation matrix in {} is not orthonormal (max |R*R^T - I| = {error:.6}); using it as-is",
                doc.path().display()
            );
        }

        calibration.log_summary();
        Ok(calibration)
    }

    /// Camera center in meters (the translation vector).
    pub fn camera_center(&self) -> DVec3 {
        self.translation
    }

    /// Full 4x4 extrinsics `[R | t]`.
    pub fn extrinsics_matrix(&self) -> DMat4 {
        DMat4::from_cols(
            self.rotation.x_axis.extend(0.0),
            self.rotation.y_axis.extend(0.0),
            self.rotation.z_axis.extend(0.0),
            self.translation.extend(1.0),
        )
    }

    /// Optical axis direction, the third row of the rotation.
    pub fn optical_axis(&self) -> DVec3 {
        self.rotation.row(2)
    }

    /// Largest absolute entry of `R * R^T - I`.
    pub fn orthonormality_error(&self) -> f64 {
        let deviation = self.rotation * self.rotation.transpose() - DMat3::IDENTITY;
        deviation
            .to_cols_array()
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Rotation angle of `R` in degrees.
    ///
    /// The `acos` argument is clamped, so slightly non-orthonormal matrices
    /// still give a finite angle.
    pub fn rotation_angle_degrees(&self) -> f64 {
        let r = &self.rotation;
        let trace = r.x_axis.x + r.y_axis.y + r.z_axis.z;
        ((trace - 1.0) * 0.5).clamp(-1.0, 1.0).acos().to_degrees()
    }

    fn log_summary(&self) {
        log::info!("Rotation matrix (R):");
        for i in 0..3 {
            let row = self.rotation.row(i);
            log::info!("[{:12.8}, {:12.8}, {:12.8}]", row.x, row.y, row.z);
        }
        let t = self.translation;
        log::info!("Translation vector (t): [{:12.8}, {:12.8}, {:12.8}]", t.x, t.y, t.z);

        log::debug!("Extrinsics matrix (4x4):");
        let m = self.extrinsics_matrix();
        for i in 0..4 {
            let row = m.row(i);
            log::debug!(
                "[{:12.8}, {:12.8}, {:12.8}, {:12.8}]",
                row.x,
                row.y,
                row.z,
                row.w
            );
        }

        let k = &self.intrinsics;
        log::info!(
            "Intrinsics: f = ({:.3}, {:.3}), c = ({:.3}, {:.3})",
            k.focal_length.x,
            k.focal_length.y,
            k.principal_point.x,
            k.principal_point.y
        );
        log::debug!(
            "Distortion: radial = {:?}, tangential = {:?}",
            k.radial_distortion,
            k.tangential_distortion
        );
        log::debug!(
            "Rotation angle: {:.3} deg, optical axis: {:?}",
            self.rotation_angle_degrees(),
            self.optical_axis()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalibviewError;

    const CALIBRATION: &str = r#"{
        "extrinsics": [
            [-0.9655356639799625, -0.09616767134251294, -0.2418537982770954],
            [-0.08291905700679839, 0.9944737910417899, -0.06439796753550224],
            [0.24671054027465514, -0.042124276560735585, -0.9681736540454445],
            [-0.39774068678243776, 0.023064699630140467, 0.5953452132457162]
        ],
        "intrinsics": {
            "principal_point_x": 640.5,
            "principal_point_y": 360.25,
            "focal_length_x": 900.0,
            "focal_length_y": 905.0,
            "radial_distortion": [0.1, -0.02, 0.003, 0.0, 0.0, 0.0],
            "tangential_distortion": [0.001, -0.002]
        },
        "visualization": { "unit_scale": 1000.0, "frustum_scale_factor": 0.7 }
    }"#;

    fn parse(text: &str) -> Result<CalibrationData> {
        CalibrationData::from_document(&ConfigDocument::parse("calibration.json", text)?)
    }

    #[test]
    fn test_parse_extrinsics_rows() {
        let c = parse(CALIBRATION).unwrap();
        assert!((c.rotation.row(0).x - -0.965_535_663_979_962_5).abs() < 1e-12);
        assert!((c.rotation.row(1).y - 0.994_473_791_041_789_9).abs() < 1e-12);
        assert!((c.rotation.row(2).z - -0.968_173_654_045_444_5).abs() < 1e-12);
        let t = DVec3::new(
            -0.397_740_686_782_437_76,
            0.023_064_699_630_140_467,
            0.595_345_213_245_716_2,
        );
        assert!((c.translation - t).length() < 1e-12);
        assert_eq!(c.camera_center(), c.translation);
        assert!(c.orthonormality_error() < ORTHONORMALITY_TOLERANCE);
    }

    #[test]
    fn test_parse_intrinsics() {
        let c = parse(CALIBRATION).unwrap();
        assert_eq!(c.intrinsics.principal_point, DVec2::new(640.5, 360.25));
        assert_eq!(c.intrinsics.focal_length, DVec2::new(900.0, 905.0));
        assert_eq!(c.intrinsics.radial_distortion[2], 0.003);
        assert_eq!(c.intrinsics.tangential_distortion, [0.001, -0.002]);
        assert_eq!(c.visualization.camera_marker_radius, 20.0);
    }

    #[test]
    fn test_flat_extrinsics() {
        let text = CALIBRATION.replace(
            r#""extrinsics": ["#,
            r#""extrinsics": [1, 0, 0, 0, 1, 0, 0, 0, 1, 1, 2, 3], "unused": ["#,
        );
        let c = parse(&text).unwrap();
        assert_eq!(c.rotation, DMat3::IDENTITY);
        assert_eq!(c.translation, DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_extrinsics_matrix_layout() {
        let c = parse(CALIBRATION).unwrap();
        let m = c.extrinsics_matrix();
        assert_eq!(m.row(0).w, c.translation.x);
        assert_eq!(m.row(3), glam::DVec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(m.row(2).x, c.rotation.row(2).x);
    }

    #[test]
    fn test_missing_intrinsic_field() {
        let text = CALIBRATION.replace(r#""focal_length_y": 905.0,"#, "");
        match parse(&text).unwrap_err() {
            CalibviewError::MissingField { key, .. } => {
                assert_eq!(key, "intrinsics.focal_length_y");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_extrinsics() {
        let text = CALIBRATION.replace(
            "[-0.39774068678243776, 0.023064699630140467, 0.5953452132457162]",
            "[0.0, 0.0]",
        );
        assert!(matches!(
            parse(&text).unwrap_err(),
            CalibviewError::MalformedArray { expected: 12, actual: 11, .. }
        ));
    }

    #[test]
    fn test_malformed_number() {
        let text = CALIBRATION.replace("640.5", r#""six-forty""#);
        assert!(matches!(
            parse(&text).unwrap_err(),
            CalibviewError::MalformedNumber { .. }
        ));
    }

    #[test]
    fn test_invalid_visualization() {
        let text = CALIBRATION.replace(r#""frustum_scale_factor": 0.7"#, r#""frustum_scale_factor": -1.0"#);
        assert!(matches!(
            parse(&text).unwrap_err(),
            CalibviewError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn test_visualization_number_rules() {
        let text = CALIBRATION.replace(r#""unit_scale": 1000.0"#, r#""unit_scale": "1000""#);
        assert_eq!(parse(&text).unwrap().visualization.unit_scale, 1000.0);

        let text = CALIBRATION.replace(r#""unit_scale": 1000.0"#, r#""unit_scale": "abc""#);
        match parse(&text).unwrap_err() {
            CalibviewError::MalformedNumber { key, .. } => {
                assert_eq!(key, "visualization.unit_scale");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = CalibrationData::load("/nonexistent/calibration.json").unwrap_err();
        assert!(matches!(err, CalibviewError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_non_orthonormal_rotation_is_tolerated() {
        let text = CALIBRATION.replace("-0.9655356639799625", "3.5");
        let c = parse(&text).unwrap();
        assert!(c.orthonormality_error() > ORTHONORMALITY_TOLERANCE);
        assert!(c.rotation_angle_degrees().is_finite());
    }

    #[test]
    fn test_rotation_angle() {
        let mut c = parse(CALIBRATION).unwrap();
        c.rotation = DMat3::IDENTITY;
        assert!(c.rotation_angle_degrees().abs() < 1e-9);
        c.rotation = DMat3::from_rotation_y(std::f64::consts::PI);
        assert!((c.rotation_angle_degrees() - 180.0).abs() < 1e-6);
        assert!((c.optical_axis() - DVec3::new(0.0, 0.0, -1.0)).length() < 1e-9);
    }
}
