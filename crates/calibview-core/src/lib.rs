//! Geometry engine for calibview.
//!
//! This crate turns three small configuration files into the world-space
//! entities of a camera calibration check:
//! - [`CalibrationData`]: camera extrinsics, intrinsics and drawing scales
//! - [`CarModelConfig`]: the vehicle mesh and its [`TransformChain`]
//! - [`ViewingZoneSet`]: up to twenty labelled quadrilaterals around the vehicle
//! - [`compose`]: combines the above into an immutable [`ComposedScene`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Zone ids are bounded by ZONE_COUNT
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod calibration;
pub mod car_model;
pub mod config;
pub mod error;
pub mod options;
pub mod scene;
pub mod transform;
pub mod viewing_zone;

pub use calibration::{CalibrationData, CameraIntrinsics};
pub use car_model::{available_models, CarModelConfig};
pub use config::{read_config, ConfigDocument, ConfigObject};
pub use error::{CalibviewError, Result};
pub use options::VisualizationOptions;
pub use scene::{
    compose, AxesGeometry, CameraPlacement, ComposedScene, ComposedZone, ExclusionReason,
    FrustumShape, LineSegment, ZONE_FRAME_CONTRACT,
};
pub use transform::{TransformChain, TransformStep};
pub use viewing_zone::{ViewingZone, ViewingZoneSet, ZoneId, ZONE_COUNT};

// Re-export glam types for convenience
pub use glam::{DMat3, DMat4, DVec3, DVec4};
